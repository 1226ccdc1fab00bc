use crate::calendar;
use crate::fee::FeeError;
use crate::fee::table::{check_cap, check_discount, check_multiplier, check_rate, Escalation, FeeTable};
use crate::item::{Category, UserType};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::fmt;
use std::fmt::{Display, Formatter};

/// 연체 일수
///
/// 규칙들은 날짜 차이(`chrono::TimeDelta`)가 아닌 이 타입만 입력으로 받는다.
/// 부호가 있는 일수는 [`DayCount::try_from`]을 통해서만 변환되며 음수는 거부된다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayCount(u32);

impl DayCount {
    pub const ZERO: DayCount = DayCount(0);

    pub const fn new(days: u32) -> Self {
        Self(days)
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    pub const fn saturating_sub(self, days: u32) -> Self {
        Self(self.0.saturating_sub(days))
    }
}

impl TryFrom<i64> for DayCount {
    type Error = FeeError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if value < 0 {
            return Err(FeeError::InvalidContext(format!("negative day count: {}", value)));
        }

        u32::try_from(value)
            .map(DayCount)
            .map_err(|_| FeeError::InvalidContext(format!("day count out of range: {}", value)))
    }
}

impl From<DayCount> for Decimal {
    fn from(value: DayCount) -> Self {
        Decimal::from(value.0)
    }
}

impl Display for DayCount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 요율표에서 분류와 사용자 유형으로 찾아낸 값들
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tariff {
    pub rate: Decimal,
    pub discount: Decimal,
    pub cap: Option<Decimal>,
}

/// 연체료 1건을 계산하기 위한 입력값
///
/// 계산 1회마다 만들어지고 버려진다. 생성 시점에 요율표 조회와 일수 변환이 모두 끝나므로
/// 이후 규칙 적용 단계에서는 실패하지 않는다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeContext {
    category: Category,
    user_type: UserType,
    days: DayCount,
    weekday_days: DayCount,
    other_overdue_count: usize,
    grace_window: Option<u32>,
    escalation: Escalation,
    tariff: Tariff,
}

impl FeeContext {
    /// 이미 변환된 일수로 컨텍스트를 만든다.
    ///
    /// # Errors
    /// - 요율표에 분류의 하루 요금이 없으면 [`FeeError::UnknownCategory`]
    /// - 요율표에 사용자 유형의 할인율이 없으면 [`FeeError::UnknownUserType`]
    /// - 평일 일수가 전체 일수보다 크면 [`FeeError::InvalidContext`]
    /// - 요율, 할인율, 상한, 누진 배수가 허용 범위를 벗어나면 [`FeeError::InvalidContext`]
    pub fn resolve(
        table: &FeeTable,
        category: Category,
        user_type: UserType,
        days: DayCount,
        weekday_days: DayCount,
        other_overdue_count: usize,
    ) -> Result<Self, FeeError> {
        let rate = table.rate(category)
            .ok_or_else(|| FeeError::UnknownCategory(category.to_string()))?;
        let discount = table.discount(user_type)
            .ok_or_else(|| FeeError::UnknownUserType(user_type.to_string()))?;

        if weekday_days > days {
            return Err(FeeError::InvalidContext(format!(
                "weekday count {} exceeds overdue days {}",
                weekday_days, days
            )));
        }

        let cap = table.cap(category);
        let escalation = table.escalation();
        check_rate(rate)
            .map_err(|e| FeeError::InvalidContext(format!("rate of {} {}", category, e)))?;
        check_discount(discount)
            .map_err(|e| FeeError::InvalidContext(format!("discount of {} {}", user_type, e)))?;
        if let Some(cap) = cap {
            check_cap(cap).map_err(|e| FeeError::InvalidContext(format!("cap of {} {}", category, e)))?;
        }
        check_multiplier(escalation.multiplier)
            .map_err(|e| FeeError::InvalidContext(format!("escalation multiplier {}", e)))?;

        let grace = table.grace();
        Ok(Self {
            category,
            user_type,
            days,
            weekday_days,
            other_overdue_count,
            grace_window: grace.enabled.then_some(grace.window),
            escalation,
            tariff: Tariff { rate, discount, cap },
        })
    }

    /// 반납 기한과 기준일로 컨텍스트를 만든다. 날짜 차이를 일수로 바꾸는 곳은 여기 한 곳뿐이다.
    pub fn from_dates(
        table: &FeeTable,
        category: Category,
        user_type: UserType,
        due_date: NaiveDate,
        reference_date: NaiveDate,
        other_overdue_count: usize,
    ) -> Result<Self, FeeError> {
        let days = DayCount::try_from(calendar::overdue_days(due_date, reference_date))?;
        let weekday_days = DayCount::try_from(calendar::weekday_overdue_days(due_date, reference_date))?;

        Self::resolve(table, category, user_type, days, weekday_days, other_overdue_count)
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn user_type(&self) -> UserType {
        self.user_type
    }

    pub fn days(&self) -> DayCount {
        self.days
    }

    pub fn weekday_days(&self) -> DayCount {
        self.weekday_days
    }

    pub fn other_overdue_count(&self) -> usize {
        self.other_overdue_count
    }

    /// 유예 기간이 적용되면 유예 일수를 반환한다.
    pub fn grace_window(&self) -> Option<u32> {
        self.grace_window
    }

    pub fn escalation(&self) -> Escalation {
        self.escalation
    }

    pub fn tariff(&self) -> Tariff {
        self.tariff
    }
}
