use crate::fee::context::{DayCount, FeeContext};
use crate::fee::table::{BulkTier, Escalation};
use rust_decimal::Decimal;
use std::fmt;
use std::fmt::{Display, Formatter};

/// 사용자별 합계 단계에서만 적용되는 다권 연체 할인의 이름
pub const BULK_DISCOUNT: &str = "bulk_discount";

/// 전략 파이프라인을 구성하는 규칙
///
/// 각 규칙은 이전 규칙이 만든 [`Tally`]를 받아 새 [`Tally`]를 만든다.
/// 일수 변환 규칙(`WeekendExclusion`, `GracePeriod`)은 일수만, 나머지는 금액만 바꾼다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    WeekendExclusion,
    GracePeriod,
    BaseFee,
    ProgressiveEscalation,
    UserDiscount,
    FeeCap,
}

impl Rule {
    pub fn name(&self) -> &'static str {
        match self {
            Rule::WeekendExclusion => "weekend_exclusion",
            Rule::GracePeriod => "grace_period",
            Rule::BaseFee => "base_fee",
            Rule::ProgressiveEscalation => "progressive_escalation",
            Rule::UserDiscount => "user_discount",
            Rule::FeeCap => "fee_cap",
        }
    }

    pub fn apply(&self, context: &FeeContext, tally: Tally) -> Tally {
        let tariff = context.tariff();
        match self {
            Rule::WeekendExclusion => Tally { days: weekend_exclusion(context), ..tally },
            Rule::GracePeriod => Tally {
                days: grace_period(tally.days, context.grace_window().unwrap_or(0)),
                ..tally
            },
            Rule::BaseFee => Tally { amount: base_fee(tariff.rate, tally.days), ..tally },
            Rule::ProgressiveEscalation => Tally {
                amount: progressive_escalation(tally.days, tally.amount, tariff.rate, context.escalation()),
                ..tally
            },
            Rule::UserDiscount => Tally { amount: user_discount(tariff.discount, tally.amount), ..tally },
            Rule::FeeCap => Tally { amount: fee_cap(tally.amount, tariff.cap), ..tally },
        }
    }
}

impl Display for Rule {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 파이프라인을 따라 전달되는 중간 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub days: DayCount,
    pub amount: Decimal,
}

impl Tally {
    pub fn new(days: DayCount) -> Self {
        Self { days, amount: Decimal::ZERO }
    }
}

/// `days * rate`
pub fn base_fee(rate: Decimal, days: DayCount) -> Decimal {
    Decimal::from(days) * rate
}

/// 사용자 유형별 할인율을 곱한다. 할인이 없는 유형의 할인율은 1이다.
pub fn user_discount(factor: Decimal, amount: Decimal) -> Decimal {
    amount * factor
}

/// 처음 `window`일은 청구하지 않는다.
pub fn grace_period(days: DayCount, window: u32) -> DayCount {
    days.saturating_sub(window)
}

/// `threshold_days`를 넘는 일수를 하루 요금의 `multiplier`배로 다시 계산한다.
///
/// 금액 전체에 배수를 곱하는 것이 아니라 하루 요금으로부터 새로 계산하며,
/// 기준 일수 이하일 때는 전달받은 금액을 그대로 반환한다.
///
/// # Example
/// ```
/// use book_fee_rust::fee::context::DayCount;
/// use book_fee_rust::fee::rule::progressive_escalation;
/// use book_fee_rust::fee::table::Escalation;
/// use rust_decimal_macros::dec;
///
/// let amount = progressive_escalation(DayCount::new(10), dec!(2.50), dec!(0.25), Escalation::default());
/// assert_eq!(amount, dec!(2.875));
/// ```
pub fn progressive_escalation(days: DayCount, amount: Decimal, rate: Decimal, escalation: Escalation) -> Decimal {
    if days.get() <= escalation.threshold_days {
        return amount;
    }

    let threshold = Decimal::from(escalation.threshold_days);
    let beyond = Decimal::from(days.get() - escalation.threshold_days);
    rate * threshold + rate * escalation.multiplier * beyond
}

/// 연체 일수를 평일 일수로 바꾼다. 금액에는 관여하지 않는다.
pub fn weekend_exclusion(context: &FeeContext) -> DayCount {
    context.weekday_days()
}

/// 상한이 없으면 금액을 그대로 반환한다.
pub fn fee_cap(amount: Decimal, cap: Option<Decimal>) -> Decimal {
    match cap {
        Some(cap) => amount.min(cap),
        None => amount,
    }
}

/// 조건을 만족하는 구간 중 `min_other_overdue`가 가장 큰 구간
pub fn bulk_tier(other_overdue_count: usize, tiers: &[BulkTier]) -> Option<&BulkTier> {
    tiers.iter()
        .filter(|tier| other_overdue_count >= tier.min_other_overdue)
        .max_by_key(|tier| tier.min_other_overdue)
}

/// [`bulk_tier`]로 찾은 구간의 할인율을 적용한다.
pub fn bulk_discount(amount: Decimal, other_overdue_count: usize, tiers: &[BulkTier]) -> Decimal {
    bulk_tier(other_overdue_count, tiers).map_or(amount, |tier| amount * tier.factor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fee::table::FeeTable;
    use crate::item::{Category, UserType};
    use rust_decimal_macros::dec;

    fn tiers() -> Vec<BulkTier> {
        vec![
            BulkTier { min_other_overdue: 2, factor: dec!(0.9) },
            BulkTier { min_other_overdue: 1, factor: dec!(0.95) },
        ]
    }

    #[test]
    fn base_fee_multiplies_days_by_rate() {
        assert_eq!(base_fee(dec!(0.25), DayCount::new(10)), dec!(2.50));
        assert_eq!(base_fee(dec!(1.25), DayCount::new(5)), dec!(6.25));
        assert_eq!(base_fee(dec!(0.25), DayCount::ZERO), Decimal::ZERO);
    }

    #[test]
    fn user_discount_applies_factor() {
        assert_eq!(user_discount(dec!(0.5), dec!(10.0)), dec!(5.0));
        assert_eq!(user_discount(dec!(0.0), dec!(10.0)), Decimal::ZERO);
    }

    #[test]
    fn grace_period_never_goes_below_zero() {
        assert_eq!(grace_period(DayCount::new(5), 3), DayCount::new(2));
        assert_eq!(grace_period(DayCount::new(3), 3), DayCount::ZERO);
        assert_eq!(grace_period(DayCount::new(1), 3), DayCount::ZERO);
    }

    #[test]
    fn progressive_escalation_keeps_amount_up_to_threshold() {
        let escalation = Escalation::default();
        assert_eq!(progressive_escalation(DayCount::new(7), dec!(1.75), dec!(0.25), escalation), dec!(1.75));
        assert_eq!(progressive_escalation(DayCount::new(10), dec!(99), dec!(1.25), escalation), dec!(14.375));
    }

    #[test]
    fn fee_cap_limits_amount() {
        assert_eq!(fee_cap(dec!(75.0), Some(dec!(50.0))), dec!(50.0));
        assert_eq!(fee_cap(dec!(2.5), Some(dec!(15.0))), dec!(2.5));
        assert_eq!(fee_cap(dec!(75.0), None), dec!(75.0));
    }

    #[test]
    fn bulk_discount_picks_highest_matching_tier() {
        assert_eq!(bulk_discount(dec!(30.0), 2, &tiers()), dec!(27.0));
        assert_eq!(bulk_discount(dec!(30.0), 1, &tiers()), dec!(28.5));
        assert_eq!(bulk_discount(dec!(30.0), 0, &tiers()), dec!(30.0));
        assert_eq!(bulk_discount(dec!(30.0), 5, &[]), dec!(30.0));
    }

    #[test]
    fn bulk_tier_matches_regardless_of_amount() {
        let tiers = tiers();
        assert_eq!(bulk_tier(3, &tiers).map(|t| t.factor), Some(dec!(0.9)));
        assert_eq!(bulk_tier(0, &tiers), None);
        assert_eq!(bulk_discount(Decimal::ZERO, 3, &tiers), Decimal::ZERO);
    }

    #[test]
    fn day_rules_leave_amount_untouched() {
        let table = FeeTable::default().with_grace(3);
        let context = FeeContext::resolve(
            &table, Category::Standard, UserType::Regular, DayCount::new(10), DayCount::new(6), 0,
        ).unwrap();
        let tally = Tally { days: DayCount::new(10), amount: dec!(1.00) };

        let excluded = Rule::WeekendExclusion.apply(&context, tally);
        assert_eq!(excluded, Tally { days: DayCount::new(6), amount: dec!(1.00) });

        let graced = Rule::GracePeriod.apply(&context, excluded);
        assert_eq!(graced, Tally { days: DayCount::new(3), amount: dec!(1.00) });
    }
}
