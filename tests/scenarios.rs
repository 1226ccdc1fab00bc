use book_fee_rust::fee::context::DayCount;
use book_fee_rust::fee::table::{BulkTier, FeeTable};
use book_fee_rust::fee::{FeeEngine, FeeError};
use book_fee_rust::item::library::Library;
use book_fee_rust::item::{Book, Category, Checkout, Loan, User, UserType};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn standard_book() -> Book {
    Book::new("978-0-234567-89-0", "Fiction Novel", Category::Standard).unwrap()
}

/// 2025-09-15 반납 기한, 2025-09-25 기준으로 10일 연체
fn ten_days_overdue(book: &Book, user: &User) -> Checkout {
    Checkout::new(book.isbn(), user.id(), date(2025, 9, 1), date(2025, 9, 15)).unwrap()
}

#[test]
fn standard_strategy_for_regular_user() {
    let book = standard_book();
    let user = User::new("U004", "Dave Regular", UserType::Regular).unwrap();
    let checkout = ten_days_overdue(&book, &user);
    let engine = FeeEngine::new(FeeTable::default());

    let result = engine.compute_fee("Standard", &checkout, &book, &user, date(2025, 9, 25), 0).unwrap();

    assert_eq!(result.amount(), dec!(2.50));
    assert_eq!(result.overdue_days(), DayCount::new(10));
    assert_eq!(result.rules(), ["base_fee", "user_discount", "fee_cap"]);
}

#[test]
fn progressive_strategy_escalates_beyond_seven_days() {
    let book = standard_book();
    let user = User::new("U004", "Dave Regular", UserType::Regular).unwrap();
    let checkout = ten_days_overdue(&book, &user);
    let engine = FeeEngine::new(FeeTable::default());

    let result = engine.compute_fee("Progressive", &checkout, &book, &user, date(2025, 9, 25), 0).unwrap();

    // 1.75 + 3 * 0.375 = 2.875
    assert_eq!(result.amount(), dec!(2.88));
    assert_eq!(
        result.rules(),
        ["base_fee", "progressive_escalation", "user_discount", "fee_cap"]
    );
}

#[test]
fn student_discount_halves_the_fee() {
    let book = standard_book();
    let user = User::new("U001", "Alice Student", UserType::Student).unwrap();
    let checkout = ten_days_overdue(&book, &user);
    let engine = FeeEngine::new(FeeTable::default());

    let result = engine.compute_fee("standard", &checkout, &book, &user, date(2025, 9, 25), 0).unwrap();

    assert_eq!(result.amount(), dec!(1.25));
}

#[test]
fn weekend_exclusive_bills_only_monday_after_friday_due_date() {
    let book = standard_book();
    let user = User::new("U004", "Dave Regular", UserType::Regular).unwrap();
    // 2025-09-12 금요일 반납 기한, 2025-09-15 월요일 기준
    let checkout = Checkout::new(book.isbn(), user.id(), date(2025, 8, 29), date(2025, 9, 12)).unwrap();
    let engine = FeeEngine::new(FeeTable::default());

    let result = engine.compute_fee("Weekend-Exclusive", &checkout, &book, &user, date(2025, 9, 15), 0).unwrap();

    assert_eq!(result.overdue_days(), DayCount::new(3));
    assert_eq!(result.billed_days(), DayCount::new(1));
    assert_eq!(result.amount(), dec!(0.25));
    assert_eq!(
        result.rules(),
        ["weekend_exclusion", "base_fee", "user_discount", "fee_cap"]
    );
}

#[test]
fn bulk_discount_applies_once_to_user_total() {
    let mut library = Library::new();
    for (isbn, title) in [
        ("978-0-234567-89-0", "Fiction Novel"),
        ("978-0-234567-89-1", "Fiction Novel II"),
        ("978-0-234567-89-2", "Fiction Novel III"),
    ] {
        library.add_book(Book::new(isbn, title, Category::Standard).unwrap()).unwrap();
    }
    library.add_user(User::new("U004", "Dave Regular", UserType::Regular).unwrap()).unwrap();
    for isbn in ["978-0-234567-89-0", "978-0-234567-89-1", "978-0-234567-89-2"] {
        library.checkout_book(isbn, "U004", date(2025, 9, 1), 14).unwrap();
    }

    let engine = FeeEngine::new(FeeTable::default());
    let user = library.find_user("U004").unwrap();
    let loans = library.loans_of("U004").unwrap();
    // 8일 연체 * 0.25 = 2.00, 3권
    let total = engine.compute_user_total(user, &loans, "standard", date(2025, 9, 23)).unwrap();

    assert_eq!(total.overdue_count(), 3);
    assert_eq!(total.subtotal(), dec!(6.00));
    assert_eq!(total.amount(), dec!(5.40));
    assert!(total.bulk_discount_applied());
}

#[test]
fn per_checkout_fee_is_not_bulk_discounted() {
    let book = standard_book();
    let user = User::new("U004", "Dave Regular", UserType::Regular).unwrap();
    let checkout = Checkout::new(book.isbn(), user.id(), date(2025, 9, 1), date(2025, 9, 15)).unwrap();
    let engine = FeeEngine::new(FeeTable::default());

    let result = engine.compute_fee("standard", &checkout, &book, &user, date(2025, 9, 23), 5).unwrap();

    assert_eq!(result.amount(), dec!(2.00));
    assert!(!result.rules().contains(&"bulk_discount"));
}

#[test]
fn second_bulk_tier_can_be_configured() {
    let book_a = Book::new("978-0-234567-89-0", "Fiction Novel", Category::Standard).unwrap();
    let book_b = Book::new("978-0-234567-89-1", "Fiction Novel II", Category::Standard).unwrap();
    let user = User::new("U004", "Dave Regular", UserType::Regular).unwrap();
    let first = Checkout::new(book_a.isbn(), user.id(), date(2025, 9, 1), date(2025, 9, 15)).unwrap();
    let second = Checkout::new(book_b.isbn(), user.id(), date(2025, 9, 1), date(2025, 9, 15)).unwrap();
    let loans = [
        Loan { checkout: &first, book: &book_a },
        Loan { checkout: &second, book: &book_b },
    ];

    let table = FeeTable::default().with_bulk_tiers(vec![
        BulkTier { min_other_overdue: 1, factor: dec!(0.95) },
        BulkTier { min_other_overdue: 2, factor: dec!(0.9) },
    ]);
    let engine = FeeEngine::new(table);
    let total = engine.compute_user_total(&user, &loans, "standard", date(2025, 9, 23)).unwrap();

    // (2.00 + 2.00) * 0.95
    assert_eq!(total.amount(), dec!(3.80));
}

#[test]
fn unknown_strategy_is_rejected() {
    let book = standard_book();
    let user = User::new("U004", "Dave Regular", UserType::Regular).unwrap();
    let checkout = ten_days_overdue(&book, &user);
    let engine = FeeEngine::new(FeeTable::default());

    let result = engine.compute_fee("flat", &checkout, &book, &user, date(2025, 9, 25), 0);
    assert_eq!(result, Err(FeeError::UnknownStrategy("flat".to_owned())));

    let loans = [Loan { checkout: &checkout, book: &book }];
    let total = engine.compute_user_total(&user, &loans, "flat", date(2025, 9, 25));
    assert_eq!(total, Err(FeeError::UnknownStrategy("flat".to_owned())));
}

#[test]
fn grace_period_waives_first_days_when_enabled() {
    let book = standard_book();
    let user = User::new("U004", "Dave Regular", UserType::Regular).unwrap();
    let checkout = ten_days_overdue(&book, &user);
    let engine = FeeEngine::new(FeeTable::default().with_grace(3));

    let within = engine.compute_fee("standard", &checkout, &book, &user, date(2025, 9, 18), 0).unwrap();
    assert_eq!(within.amount(), Decimal::ZERO);

    let after = engine.compute_fee("standard", &checkout, &book, &user, date(2025, 9, 25), 0).unwrap();
    assert_eq!(after.amount(), dec!(1.75));
    assert_eq!(after.rules(), ["grace_period", "base_fee", "user_discount", "fee_cap"]);
}

#[test]
fn staff_pay_nothing() {
    let book = Book::new("978-0-987654-32-1", "Harry Potter", Category::NewRelease).unwrap();
    let user = User::new("U003", "Carol Staff", UserType::Staff).unwrap();
    let checkout = ten_days_overdue(&book, &user);
    let engine = FeeEngine::new(FeeTable::default());

    let result = engine.compute_fee("progressive", &checkout, &book, &user, date(2025, 9, 25), 0).unwrap();
    assert_eq!(result.amount(), Decimal::ZERO);
}
