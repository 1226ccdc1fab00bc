pub mod context;
pub mod rule;
pub mod strategy;
pub mod table;

use crate::fee::context::{DayCount, FeeContext};
use crate::fee::rule::{bulk_tier, BULK_DISCOUNT};
use crate::fee::strategy::StrategyName;
use crate::fee::table::{check_bulk_factor, FeeTable};
use crate::item::{Book, Checkout, ItemError, Loan, User};
use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt;
use std::fmt::{Display, Formatter};
use tracing::debug;

/// 연체료 계산 중 발생하는 에러 열거
///
/// 모든 에러는 계산 진입 시점의 검증 단계에서만 발생하며 규칙 적용 중에는 발생하지 않는다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeeError {
    /// 정의되지 않은 정책 이름
    UnknownStrategy(String),

    /// 호출 규약 위반, 대출 기록과 도서/이용자가 맞지 않거나 일수가 음수가 됨
    InvalidContext(String),

    /// 요율표에 없는 도서 분류
    UnknownCategory(String),

    /// 요율표에 없는 사용자 유형
    UnknownUserType(String),
}

impl Display for FeeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            FeeError::UnknownStrategy(s) => write!(f, "Unknown strategy: {}", s),
            FeeError::InvalidContext(s) => write!(f, "Invalid context: {}", s),
            FeeError::UnknownCategory(s) => write!(f, "Unknown category: {}", s),
            FeeError::UnknownUserType(s) => write!(f, "Unknown user type: {}", s),
        }
    }
}

impl std::error::Error for FeeError {}

impl From<ItemError> for FeeError {
    fn from(value: ItemError) -> Self {
        match value {
            ItemError::UnknownCategory(s) => FeeError::UnknownCategory(s),
            ItemError::UnknownUserType(s) => FeeError::UnknownUserType(s),
            other => FeeError::InvalidContext(other.to_string()),
        }
    }
}

/// 금액을 센트 단위로 반올림한다. (0.005는 올림)
pub fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// 대출 1건의 연체료 계산 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeResult {
    strategy: StrategyName,
    amount: Decimal,
    overdue_days: DayCount,
    billed_days: DayCount,
    rules: Vec<&'static str>,
}

impl FeeResult {
    pub fn new(
        strategy: StrategyName,
        amount: Decimal,
        overdue_days: DayCount,
        billed_days: DayCount,
        rules: Vec<&'static str>,
    ) -> Self {
        Self { strategy, amount, overdue_days, billed_days, rules }
    }

    pub fn strategy(&self) -> StrategyName {
        self.strategy
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// 실제 달력 기준 연체 일수
    pub fn overdue_days(&self) -> DayCount {
        self.overdue_days
    }

    /// 주말 제외, 유예 기간 등 일수 규칙을 거친 뒤 청구된 일수
    pub fn billed_days(&self) -> DayCount {
        self.billed_days
    }

    /// 적용된 규칙의 이름, 적용 순서대로 정렬되어 있다.
    pub fn rules(&self) -> &[&'static str] {
        &self.rules
    }
}

/// 이용자 1명의 연체료 합계
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserTotal {
    user_id: String,
    strategy: StrategyName,
    overdue_count: usize,
    subtotal: Decimal,
    amount: Decimal,
    rules: Vec<&'static str>,
}

impl UserTotal {
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn strategy(&self) -> StrategyName {
        self.strategy
    }

    pub fn overdue_count(&self) -> usize {
        self.overdue_count
    }

    /// 다권 연체 할인 전 합계
    pub fn subtotal(&self) -> Decimal {
        self.subtotal
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn bulk_discount_applied(&self) -> bool {
        self.rules.contains(&BULK_DISCOUNT)
    }

    /// 합계 단계에서 적용된 규칙
    pub fn rules(&self) -> &[&'static str] {
        &self.rules
    }
}

/// 연체료 계산기
///
/// 요율표는 생성 시점에 주입되며 계산 사이에 어떤 상태도 남기지 않는다.
///
/// # Example
/// ```
/// use book_fee_rust::fee::FeeEngine;
/// use book_fee_rust::fee::table::FeeTable;
/// use book_fee_rust::item::{Book, Category, Checkout, User, UserType};
/// use chrono::NaiveDate;
/// use rust_decimal_macros::dec;
///
/// let book = Book::new("978-0-234567-89-0", "Fiction Novel", Category::Standard).unwrap();
/// let user = User::new("U004", "Dave Regular", UserType::Regular).unwrap();
/// let checkout = Checkout::new(
///     book.isbn(),
///     user.id(),
///     NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
///     NaiveDate::from_ymd_opt(2025, 9, 15).unwrap(),
/// ).unwrap();
///
/// let engine = FeeEngine::new(FeeTable::default());
/// let today = NaiveDate::from_ymd_opt(2025, 9, 25).unwrap();
/// let result = engine.compute_fee("standard", &checkout, &book, &user, today, 0).unwrap();
/// assert_eq!(result.amount(), dec!(2.50));
/// ```
#[derive(Debug, Clone)]
pub struct FeeEngine {
    table: FeeTable,
}

impl FeeEngine {
    pub fn new(table: FeeTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &FeeTable {
        &self.table
    }

    /// 대출 1건의 연체료를 계산한다.
    ///
    /// 반납된 대출은 반납일을, 아니면 `reference_date`를 기준일로 사용한다.
    /// 입력 검증은 이 함수 진입 시 한 번만 이루어진다.
    ///
    /// # Errors
    /// - 정의되지 않은 정책 이름이면 [`FeeError::UnknownStrategy`]
    /// - 대출 기록의 ISBN, 이용자 아이디가 전달된 도서, 이용자와 다르면 [`FeeError::InvalidContext`]
    /// - 요율표에 분류나 사용자 유형이 없으면 [`FeeError::UnknownCategory`], [`FeeError::UnknownUserType`]
    pub fn compute_fee(
        &self,
        strategy_name: &str,
        checkout: &Checkout,
        book: &Book,
        user: &User,
        reference_date: NaiveDate,
        other_overdue_count: usize,
    ) -> Result<FeeResult, FeeError> {
        let strategy = StrategyName::try_from(strategy_name)?;

        if checkout.isbn() != book.isbn() {
            return Err(FeeError::InvalidContext(format!(
                "checkout of {} does not refer to book {}",
                checkout.isbn(), book.isbn()
            )));
        }
        if checkout.user_id() != user.id() {
            return Err(FeeError::InvalidContext(format!(
                "checkout by {} does not refer to user {}",
                checkout.user_id(), user.id()
            )));
        }

        let context = FeeContext::from_dates(
            &self.table,
            book.category(),
            user.user_type(),
            checkout.due_date(),
            checkout.reference_date(reference_date),
            other_overdue_count,
        )?;

        Ok(strategy.evaluate(&context))
    }

    /// 이용자가 반납하지 않은 연체 대출들의 연체료를 합산하고 다권 연체 할인을 한 번 적용한다.
    ///
    /// 각 대출은 `연체 건수 - 1`을 다른 연체 건수로 사용해 계산되며, 할인은 합계에만 적용된다.
    /// 한 건이라도 계산에 실패하면 합계 없이 에러를 반환한다.
    pub fn compute_user_total(
        &self,
        user: &User,
        loans: &[Loan<'_>],
        strategy_name: &str,
        reference_date: NaiveDate,
    ) -> Result<UserTotal, FeeError> {
        let strategy = StrategyName::try_from(strategy_name)?;

        let overdue: Vec<&Loan<'_>> = loans.iter()
            .filter(|loan| !loan.checkout.is_returned() && loan.checkout.is_overdue(reference_date))
            .collect();
        let other_overdue_count = overdue.len().saturating_sub(1);

        let mut subtotal = Decimal::ZERO;
        for loan in &overdue {
            let result = self.compute_fee(
                strategy_name,
                loan.checkout,
                loan.book,
                user,
                reference_date,
                other_overdue_count,
            )?;
            subtotal = subtotal.checked_add(result.amount())
                .ok_or_else(|| FeeError::InvalidContext(format!("subtotal of {} overflowed", user.id())))?;
        }

        // 금액이 0이어도 구간에 해당하면 할인이 적용된 것으로 기록한다
        let (discounted, rules) = match bulk_tier(other_overdue_count, self.table.bulk_tiers()) {
            Some(tier) => {
                check_bulk_factor(tier.factor)
                    .map_err(|e| FeeError::InvalidContext(format!("bulk discount factor {}", e)))?;
                (subtotal * tier.factor, vec![BULK_DISCOUNT])
            }
            None => (subtotal, Vec::new()),
        };
        let amount = round_currency(discounted);

        debug!(
            user_id = user.id(),
            strategy = %strategy,
            overdue_count = overdue.len(),
            subtotal = %subtotal,
            amount = %amount,
            "User total computed"
        );

        Ok(UserTotal {
            user_id: user.id().to_owned(),
            strategy,
            overdue_count: overdue.len(),
            subtotal,
            amount,
            rules,
        })
    }
}
