use crate::item::{Category, UserType};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::collections::HashMap;

/// 하루 요금의 상한
pub const MAX_RATE: Decimal = dec!(1000000);

/// 사용자 할인율의 상한
pub const MAX_DISCOUNT: Decimal = dec!(100);

/// 누진 배수의 상한
pub const MAX_MULTIPLIER: Decimal = dec!(1000);

/// 연체료 상한으로 설정할 수 있는 최대 금액
pub const MAX_CAP: Decimal = dec!(1000000000000);

/// 유예 기간 설정
///
/// 활성화 되면 모든 전략의 `base_fee` 직전에 `grace_period` 규칙이 추가된다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Grace {
    pub enabled: bool,
    pub window: u32,
}

impl Default for Grace {
    fn default() -> Self {
        Self { enabled: false, window: 3 }
    }
}

/// 누진 연체료 설정, `threshold_days`를 넘는 일수는 하루 요금에 `multiplier`를 곱한 값으로 계산된다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Escalation {
    pub threshold_days: u32,
    pub multiplier: Decimal,
}

impl Default for Escalation {
    fn default() -> Self {
        Self { threshold_days: 7, multiplier: dec!(1.5) }
    }
}

/// 다권 연체 할인 구간, 같은 이용자의 다른 연체 건수가 `min_other_overdue` 이상이면 합계에 `factor`를 곱한다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct BulkTier {
    pub min_other_overdue: usize,
    pub factor: Decimal,
}

/// 연체료 계산에 사용하는 요율표
///
/// 엔진 생성 시 주입되며 이후로는 변경되지 않는다. 설정 파일에서 읽거나 [`FeeTable::default`]를 기준으로
/// `with_*` 함수들로 필요한 값만 바꿔서 사용한다.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FeeTable {
    rates: HashMap<Category, Decimal>,
    discounts: HashMap<UserType, Decimal>,
    caps: HashMap<Category, Decimal>,
    global_cap: Option<Decimal>,
    grace: Grace,
    escalation: Escalation,
    bulk_tiers: Vec<BulkTier>,
}

impl Default for FeeTable {
    fn default() -> Self {
        let rates = HashMap::from([
            (Category::Standard, dec!(0.25)),
            (Category::Reference, dec!(0.50)),
            (Category::NewRelease, dec!(1.00)),
            (Category::Children, dec!(0.10)),
            (Category::Textbook, dec!(1.25)),
        ]);
        let discounts = HashMap::from([
            (UserType::Regular, dec!(1.0)),
            (UserType::Student, dec!(0.5)),
            (UserType::Senior, dec!(0.5)),
            (UserType::Staff, dec!(0.0)),
            (UserType::Faculty, dec!(0.2)),
        ]);
        let caps = Category::ALL.iter()
            .map(|category| (*category, dec!(15.00)))
            .collect();

        Self {
            rates,
            discounts,
            caps,
            global_cap: Some(dec!(50.00)),
            grace: Grace::default(),
            escalation: Escalation::default(),
            bulk_tiers: vec![BulkTier { min_other_overdue: 2, factor: dec!(0.9) }],
        }
    }
}

impl FeeTable {
    /// 빈 요율표, 모든 분류와 사용자 유형이 등록되지 않은 상태이다.
    pub fn empty() -> Self {
        Self {
            rates: HashMap::new(),
            discounts: HashMap::new(),
            caps: HashMap::new(),
            global_cap: None,
            grace: Grace::default(),
            escalation: Escalation::default(),
            bulk_tiers: Vec::new(),
        }
    }

    pub fn with_rate(mut self, category: Category, rate: Decimal) -> Self {
        self.rates.insert(category, rate);
        self
    }

    pub fn with_discount(mut self, user_type: UserType, factor: Decimal) -> Self {
        self.discounts.insert(user_type, factor);
        self
    }

    pub fn with_cap(mut self, category: Category, cap: Decimal) -> Self {
        self.caps.insert(category, cap);
        self
    }

    pub fn without_cap(mut self, category: Category) -> Self {
        self.caps.remove(&category);
        self
    }

    pub fn with_global_cap(mut self, cap: Option<Decimal>) -> Self {
        self.global_cap = cap;
        self
    }

    pub fn with_grace(mut self, window: u32) -> Self {
        self.grace = Grace { enabled: true, window };
        self
    }

    pub fn with_escalation(mut self, escalation: Escalation) -> Self {
        self.escalation = escalation;
        self
    }

    pub fn with_bulk_tiers(mut self, tiers: Vec<BulkTier>) -> Self {
        self.bulk_tiers = tiers;
        self
    }

    pub fn rate(&self, category: Category) -> Option<Decimal> {
        self.rates.get(&category).copied()
    }

    pub fn discount(&self, user_type: UserType) -> Option<Decimal> {
        self.discounts.get(&user_type).copied()
    }

    /// 분류별 상한이 우선이며 없으면 전체 상한을 사용한다. 둘 다 없으면 상한이 없다.
    pub fn cap(&self, category: Category) -> Option<Decimal> {
        self.caps.get(&category).copied().or(self.global_cap)
    }

    pub fn grace(&self) -> Grace {
        self.grace
    }

    pub fn escalation(&self) -> Escalation {
        self.escalation
    }

    pub fn bulk_tiers(&self) -> &[BulkTier] {
        &self.bulk_tiers
    }

    /// 금액이 음수가 되거나 계산 중 범위를 넘을 수 있는 값이 있는지 검사한다.
    pub fn validate(&self) -> Result<(), String> {
        for (category, rate) in &self.rates {
            check_rate(*rate).map_err(|e| format!("rate of {} {}", category, e))?;
        }
        for (user_type, factor) in &self.discounts {
            check_discount(*factor).map_err(|e| format!("discount of {} {}", user_type, e))?;
        }
        for (category, cap) in &self.caps {
            check_cap(*cap).map_err(|e| format!("cap of {} {}", category, e))?;
        }
        if let Some(cap) = self.global_cap {
            check_cap(cap).map_err(|e| format!("global cap {}", e))?;
        }
        check_multiplier(self.escalation.multiplier)
            .map_err(|e| format!("escalation multiplier {}", e))?;
        for tier in &self.bulk_tiers {
            check_bulk_factor(tier.factor).map_err(|e| format!("bulk discount factor {}", e))?;
        }
        Ok(())
    }
}

fn check_range(value: Decimal, min: Decimal, max: Decimal) -> Result<(), String> {
    if value < min || value > max {
        return Err(format!("must be between {} and {}: {}", min, max, value));
    }
    Ok(())
}

pub fn check_rate(rate: Decimal) -> Result<(), String> {
    check_range(rate, Decimal::ZERO, MAX_RATE)
}

pub fn check_discount(factor: Decimal) -> Result<(), String> {
    check_range(factor, Decimal::ZERO, MAX_DISCOUNT)
}

pub fn check_cap(cap: Decimal) -> Result<(), String> {
    check_range(cap, Decimal::ZERO, MAX_CAP)
}

pub fn check_multiplier(multiplier: Decimal) -> Result<(), String> {
    check_range(multiplier, Decimal::ONE, MAX_MULTIPLIER)
}

pub fn check_bulk_factor(factor: Decimal) -> Result<(), String> {
    check_range(factor, Decimal::ZERO, Decimal::ONE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_covers_every_category_and_user_type() {
        let table = FeeTable::default();
        for category in Category::ALL {
            assert!(table.rate(category).is_some(), "{} has no rate", category);
            assert_eq!(table.cap(category), Some(dec!(15.00)));
        }
        for user_type in UserType::ALL {
            assert!(table.discount(user_type).is_some(), "{} has no discount", user_type);
        }
        assert_eq!(table.validate(), Ok(()));
    }

    #[test]
    fn cap_falls_back_to_global_ceiling() {
        let table = FeeTable::default().without_cap(Category::Textbook);
        assert_eq!(table.cap(Category::Textbook), Some(dec!(50.00)));

        let table = table.with_global_cap(None);
        assert_eq!(table.cap(Category::Textbook), None);
        assert_eq!(table.cap(Category::Standard), Some(dec!(15.00)));
    }

    #[test]
    fn validate_rejects_negative_rate_and_bad_bulk_factor() {
        let table = FeeTable::default().with_rate(Category::Standard, dec!(-0.25));
        assert!(table.validate().is_err());

        let table = FeeTable::default()
            .with_bulk_tiers(vec![BulkTier { min_other_overdue: 1, factor: dec!(1.2) }]);
        assert!(table.validate().is_err());
    }

    #[test]
    fn validate_rejects_values_that_would_overflow() {
        let table = FeeTable::default().with_rate(Category::Standard, Decimal::MAX);
        assert!(table.validate().unwrap_err().starts_with("rate of standard"));

        let table = FeeTable::default()
            .with_escalation(Escalation { threshold_days: 7, multiplier: dec!(1000000) });
        assert!(table.validate().is_err());

        let table = FeeTable::default().with_discount(UserType::Faculty, dec!(1000));
        assert!(table.validate().is_err());

        let table = FeeTable::default().with_global_cap(Some(MAX_CAP + Decimal::ONE));
        assert!(table.validate().is_err());

        let table = FeeTable::default().with_rate(Category::Textbook, MAX_RATE);
        assert_eq!(table.validate(), Ok(()));
    }

    #[test]
    fn deserializes_partial_table_over_defaults() {
        let json = r#"{
            "rates": {"standard": "0.30", "reference": "0.60"},
            "grace": {"enabled": true},
            "bulk_tiers": [
                {"min_other_overdue": 1, "factor": "0.95"},
                {"min_other_overdue": 2, "factor": "0.9"}
            ]
        }"#;
        let table: FeeTable = serde_json::from_str(json).unwrap();

        assert_eq!(table.rate(Category::Standard), Some(dec!(0.30)));
        assert_eq!(table.rate(Category::Textbook), None);
        assert_eq!(table.discount(UserType::Student), Some(dec!(0.5)));
        assert_eq!(table.grace(), Grace { enabled: true, window: 3 });
        assert_eq!(table.bulk_tiers().len(), 2);
    }
}
