use crate::fee::strategy::StrategyName;
use crate::fee::{FeeEngine, FeeError};
use crate::item::library::Library;
use crate::item::{Category, ItemError, Loan, UserType};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_with::{serde_as, DisplayFromStr};
use std::collections::HashMap;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::io;
use tracing::{info, warn};

/// 연체 대출 1건의 정책별 연체료, 한 줄에 한 대출씩 평탄한 형태로 기록된다.
#[serde_as]
#[derive(Debug, Clone, Serialize)]
pub struct ReportRow {
    pub user_id: String,
    pub user_name: String,
    pub user_type: UserType,
    pub isbn: String,
    pub title: String,
    pub category: Category,
    pub due_date: NaiveDate,
    pub days_overdue: u32,

    /// 유예 기간을 제외하고 청구된 일수 (주말 제외 전)
    pub days_after_grace: u32,
    #[serde_as(as = "DisplayFromStr")]
    pub base_rate: Decimal,
    #[serde_as(as = "DisplayFromStr")]
    pub user_discount_factor: Decimal,
    #[serde_as(as = "DisplayFromStr")]
    pub standard_fee: Decimal,
    #[serde_as(as = "DisplayFromStr")]
    pub progressive_fee: Decimal,
    #[serde_as(as = "DisplayFromStr")]
    pub weekend_exclusive_fee: Decimal,
}

impl ReportRow {
    pub fn fee(&self, strategy: StrategyName) -> Decimal {
        match strategy {
            StrategyName::Standard => self.standard_fee,
            StrategyName::Progressive => self.progressive_fee,
            StrategyName::WeekendExclusive => self.weekend_exclusive_fee,
        }
    }
}

/// 이용자 1명의 정책별 연체료 합계 (다권 연체 할인 적용 후)
#[serde_as]
#[derive(Debug, Clone, Serialize)]
pub struct UserTotalRow {
    pub user_id: String,
    pub user_name: String,
    pub user_type: UserType,
    pub overdue_count: usize,
    #[serde_as(as = "DisplayFromStr")]
    pub standard_total: Decimal,
    #[serde_as(as = "DisplayFromStr")]
    pub progressive_total: Decimal,
    #[serde_as(as = "DisplayFromStr")]
    pub weekend_exclusive_total: Decimal,
}

impl UserTotalRow {
    pub fn total(&self, strategy: StrategyName) -> Decimal {
        match strategy {
            StrategyName::Standard => self.standard_total,
            StrategyName::Progressive => self.progressive_total,
            StrategyName::WeekendExclusive => self.weekend_exclusive_total,
        }
    }

    fn set_total(&mut self, strategy: StrategyName, amount: Decimal) {
        match strategy {
            StrategyName::Standard => self.standard_total = amount,
            StrategyName::Progressive => self.progressive_total = amount,
            StrategyName::WeekendExclusive => self.weekend_exclusive_total = amount,
        }
    }
}

/// 계산에 실패해 리포트에서 제외된 항목
#[derive(Debug, Clone, Serialize)]
pub struct FlaggedEntry {
    pub user_id: String,
    pub isbn: Option<String>,
    pub reason: String,
}

#[derive(Serialize)]
#[serde(tag = "record", rename_all = "snake_case")]
enum Record<'a> {
    Checkout(&'a ReportRow),
    UserTotal(&'a UserTotalRow),
    Flagged(&'a FlaggedEntry),
}

/// 기준일 현재 연체 중인 대출에 대한 리포트
#[derive(Debug, Clone)]
pub struct OverdueReport {
    reference_date: NaiveDate,
    rows: Vec<ReportRow>,
    totals: Vec<UserTotalRow>,
    flagged: Vec<FlaggedEntry>,
}

impl OverdueReport {
    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date
    }

    pub fn rows(&self) -> &[ReportRow] {
        &self.rows
    }

    pub fn totals(&self) -> &[UserTotalRow] {
        &self.totals
    }

    pub fn flagged(&self) -> &[FlaggedEntry] {
        &self.flagged
    }

    /// 사람이 읽기 위한 표 형태로 출력한다.
    pub fn render_table(&self) -> String {
        self.to_string()
    }

    /// 한 줄에 레코드 하나씩 JSON으로 출력한다. 금액은 소수 문자열로 기록된다.
    pub fn write_json_lines<W: io::Write>(&self, mut writer: W) -> io::Result<()> {
        let records = self.rows.iter().map(Record::Checkout)
            .chain(self.totals.iter().map(Record::UserTotal))
            .chain(self.flagged.iter().map(Record::Flagged));

        for record in records {
            serde_json::to_writer(&mut writer, &record)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()
    }
}

impl Display for OverdueReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "Overdue report as of {}", self.reference_date)?;
        write!(f, "{:<6} {:<20} {:<28} {:<12} {:<10} {:>5}", "User", "Name", "Book", "Category", "Due", "Days")?;
        for strategy in StrategyName::ALL {
            write!(f, " {:>18}", strategy.to_string())?;
        }
        writeln!(f)?;

        for row in &self.rows {
            write!(
                f,
                "{:<6} {:<20} {:<28} {:<12} {:<10} {:>5}",
                row.user_id,
                truncate(&row.user_name, 20),
                truncate(&row.title, 28),
                row.category.to_string(),
                row.due_date.format("%Y-%m-%d").to_string(),
                row.days_overdue,
            )?;
            for strategy in StrategyName::ALL {
                write!(f, " {:>18}", format!("{:.2}", row.fee(strategy)))?;
            }
            writeln!(f)?;
        }

        if !self.totals.is_empty() {
            write!(f, "\nUser totals\n")?;
            for total in &self.totals {
                write!(f, "{:<6} {:<20} {:>3} overdue", total.user_id, truncate(&total.user_name, 20), total.overdue_count)?;
                for strategy in StrategyName::ALL {
                    write!(f, "  {}: {:.2}", strategy, total.total(strategy))?;
                }
                writeln!(f)?;
            }
        }

        if !self.flagged.is_empty() {
            write!(f, "\nSkipped\n")?;
            for entry in &self.flagged {
                writeln!(
                    f,
                    "{:<6} {:<20} {}",
                    entry.user_id,
                    entry.isbn.as_deref().unwrap_or("-"),
                    entry.reason
                )?;
            }
        }

        Ok(())
    }
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_owned();
    }
    let mut truncated: String = s.chars().take(width.saturating_sub(1)).collect();
    truncated.push('~');
    truncated
}

/// 모든 정책으로 연체 대출의 연체료와 이용자별 합계를 계산한다.
///
/// 계산에 실패한 대출이나 이용자는 전체 리포트를 중단하지 않고 [`FlaggedEntry`]로 기록된다.
pub fn build_report(
    library: &Library,
    engine: &FeeEngine,
    reference_date: NaiveDate,
) -> Result<OverdueReport, ItemError> {
    let overdue = library.overdue_loans(reference_date)?;

    let mut overdue_per_user: HashMap<&str, usize> = HashMap::new();
    for loan in &overdue {
        *overdue_per_user.entry(loan.checkout.user_id()).or_insert(0) += 1;
    }

    let mut rows = Vec::with_capacity(overdue.len());
    let mut flagged = Vec::new();
    for loan in &overdue {
        let other_overdue_count = overdue_per_user
            .get(loan.checkout.user_id())
            .map_or(0, |count| count.saturating_sub(1));

        match report_row(library, engine, loan, reference_date, other_overdue_count) {
            Ok(row) => rows.push(row),
            Err(err) => {
                warn!(
                    isbn = loan.checkout.isbn(),
                    user_id = loan.checkout.user_id(),
                    error = %err,
                    "Checkout skipped"
                );
                flagged.push(FlaggedEntry {
                    user_id: loan.checkout.user_id().to_owned(),
                    isbn: Some(loan.checkout.isbn().to_owned()),
                    reason: err.to_string(),
                });
            }
        }
    }

    let mut totals = Vec::new();
    for user in library.users() {
        if !overdue_per_user.contains_key(user.id()) {
            continue;
        }

        let loans = library.loans_of(user.id())?;
        let mut row = UserTotalRow {
            user_id: user.id().to_owned(),
            user_name: user.name().to_owned(),
            user_type: user.user_type(),
            overdue_count: 0,
            standard_total: Decimal::ZERO,
            progressive_total: Decimal::ZERO,
            weekend_exclusive_total: Decimal::ZERO,
        };
        let computed: Result<(), FeeError> = StrategyName::ALL.iter().try_for_each(|strategy| {
            let total = engine.compute_user_total(user, &loans, &strategy.to_string(), reference_date)?;
            row.overdue_count = total.overdue_count();
            row.set_total(*strategy, total.amount());
            Ok(())
        });

        match computed {
            Ok(()) => totals.push(row),
            Err(err) => {
                warn!(user_id = user.id(), error = %err, "User total skipped");
                flagged.push(FlaggedEntry {
                    user_id: user.id().to_owned(),
                    isbn: None,
                    reason: err.to_string(),
                });
            }
        }
    }

    info!(
        reference_date = %reference_date,
        rows = rows.len(),
        users = totals.len(),
        flagged = flagged.len(),
        "Overdue report built"
    );

    Ok(OverdueReport { reference_date, rows, totals, flagged })
}

fn report_row(
    library: &Library,
    engine: &FeeEngine,
    loan: &Loan<'_>,
    reference_date: NaiveDate,
    other_overdue_count: usize,
) -> Result<ReportRow, FeeError> {
    let user = library.find_user(loan.checkout.user_id())
        .ok_or_else(|| FeeError::InvalidContext(format!("user {} is not registered", loan.checkout.user_id())))?;
    let fee = |strategy: StrategyName| engine.compute_fee(
        &strategy.to_string(),
        loan.checkout,
        loan.book,
        user,
        reference_date,
        other_overdue_count,
    );

    let standard = fee(StrategyName::Standard)?;
    let progressive = fee(StrategyName::Progressive)?;
    let weekend_exclusive = fee(StrategyName::WeekendExclusive)?;

    let category = loan.book.category();
    let user_type = user.user_type();
    let base_rate = engine.table().rate(category)
        .ok_or_else(|| FeeError::UnknownCategory(category.to_string()))?;
    let user_discount_factor = engine.table().discount(user_type)
        .ok_or_else(|| FeeError::UnknownUserType(user_type.to_string()))?;

    Ok(ReportRow {
        user_id: user.id().to_owned(),
        user_name: user.name().to_owned(),
        user_type,
        isbn: loan.book.isbn().to_owned(),
        title: loan.book.title().to_owned(),
        category,
        due_date: loan.checkout.due_date(),
        days_overdue: standard.overdue_days().get(),
        days_after_grace: standard.billed_days().get(),
        base_rate,
        user_discount_factor,
        standard_fee: standard.amount(),
        progressive_fee: progressive.amount(),
        weekend_exclusive_fee: weekend_exclusive.amount(),
    })
}
