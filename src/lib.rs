use chrono::NaiveDate;
use std::fmt;
use std::fmt::Formatter;

pub mod calendar;
pub mod config;
pub mod fee;
pub mod item;
pub mod report;

pub use fee::{FeeEngine, FeeError, FeeResult, UserTotal};

#[derive(Debug)]
pub enum ArgumentError {
    InvalidArgument(String),
}

impl fmt::Display for ArgumentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ArgumentError::InvalidArgument(s) => write!(f, "Invalid argument: {}", s),
        }
    }
}

impl std::error::Error for ArgumentError {}

/// `YYYY-MM-DD` 형식의 날짜를 읽는다.
pub fn parse_date(s: &str) -> Result<NaiveDate, ArgumentError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| ArgumentError::InvalidArgument(format!("Invalid date {}: {}", s, e)))
}

/// 기준일이 주어지지 않았을 때 사용할 오늘 날짜 (로컬 시간 기준)
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_date_accepts_iso_dates_only() {
        assert_eq!(parse_date("2025-09-15").unwrap(), NaiveDate::from_ymd_opt(2025, 9, 15).unwrap());
        assert!(parse_date("15/09/2025").is_err());
        assert!(parse_date("2025-02-30").is_err());
    }
}
