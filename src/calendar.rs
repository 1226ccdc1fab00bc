use chrono::{Datelike, Days, NaiveDate, Weekday};

/// 반납 기한(`due`) 이후 기준일(`reference`)까지 지난 일수를 반환한다.
///
/// 기준일이 반납 기한과 같거나 이전이면 0을 반환하며 음수는 반환하지 않는다.
///
/// # Example
/// ```
/// use book_fee_rust::calendar::overdue_days;
/// use chrono::NaiveDate;
///
/// let due = NaiveDate::from_ymd_opt(2025, 9, 15).unwrap();
/// let reference = NaiveDate::from_ymd_opt(2025, 9, 25).unwrap();
/// assert_eq!(overdue_days(due, reference), 10);
/// assert_eq!(overdue_days(reference, due), 0);
/// ```
pub fn overdue_days(due: NaiveDate, reference: NaiveDate) -> i64 {
    (reference - due).num_days().max(0)
}

/// 반납 기한 다음 날부터 기준일까지(기준일 포함) 평일(월~금)의 수를 반환한다.
///
/// 구간에 주말이 없으면 [`overdue_days`]와 같은 값을 반환한다.
///
/// # Example
/// ```
/// use book_fee_rust::calendar::weekday_overdue_days;
/// use chrono::NaiveDate;
///
/// // 금요일 반납 기한, 다음 주 월요일 기준
/// let due = NaiveDate::from_ymd_opt(2025, 9, 12).unwrap();
/// let reference = NaiveDate::from_ymd_opt(2025, 9, 15).unwrap();
/// assert_eq!(weekday_overdue_days(due, reference), 1);
/// ```
pub fn weekday_overdue_days(due: NaiveDate, reference: NaiveDate) -> i64 {
    let total = overdue_days(due, reference);
    let full_weeks = total / 7;
    let remainder = total % 7;

    // 나머지 일수는 최대 6일이므로 직접 센다
    let start = due + Days::new((full_weeks * 7) as u64);
    let remainder_weekdays = (1..=remainder)
        .filter_map(|offset| start.checked_add_days(Days::new(offset as u64)))
        .filter(|date| !is_weekend(date.weekday()))
        .count() as i64;

    full_weeks * 5 + remainder_weekdays
}

fn is_weekend(weekday: Weekday) -> bool {
    matches!(weekday, Weekday::Sat | Weekday::Sun)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn overdue_days_is_zero_on_or_before_due_date() {
        let due = date(2025, 9, 15);
        assert_eq!(overdue_days(due, due), 0);
        assert_eq!(overdue_days(due, date(2025, 9, 1)), 0);
    }

    #[test]
    fn weekday_overdue_days_skips_saturday_and_sunday() {
        // 2025-09-12 금요일
        let due = date(2025, 9, 12);
        assert_eq!(weekday_overdue_days(due, date(2025, 9, 13)), 0);
        assert_eq!(weekday_overdue_days(due, date(2025, 9, 14)), 0);
        assert_eq!(weekday_overdue_days(due, date(2025, 9, 15)), 1);
        assert_eq!(weekday_overdue_days(due, date(2025, 9, 19)), 5);
        assert_eq!(weekday_overdue_days(due, date(2025, 9, 26)), 10);
    }

    #[test]
    fn weekday_overdue_days_matches_overdue_days_inside_a_week() {
        // 2025-09-15 월요일, 금요일까지 주말 없음
        let due = date(2025, 9, 15);
        let reference = date(2025, 9, 19);
        assert_eq!(weekday_overdue_days(due, reference), overdue_days(due, reference));
    }

    #[test]
    fn weekday_overdue_days_is_zero_before_due_date() {
        let due = date(2025, 9, 15);
        assert_eq!(weekday_overdue_days(due, date(2025, 9, 1)), 0);
    }

    #[test]
    fn weekday_overdue_days_counts_multiple_weeks() {
        // 2025-09-17 수요일 + 16일 = 2025-10-03 금요일
        let due = date(2025, 9, 17);
        let reference = date(2025, 10, 3);
        let brute = (1..=16)
            .map(|i| due + Days::new(i))
            .filter(|d| !is_weekend(d.weekday()))
            .count() as i64;
        assert_eq!(weekday_overdue_days(due, reference), brute);
    }
}
