use crate::item::{Book, Category, Checkout, ItemError, Loan, User, UserType};
use chrono::{Days, NaiveDate};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, info};

/// 대출 기간이 지정되지 않았을 때 사용할 기본 대출 기간(일)
pub const DEF_LOAN_PERIOD_DAYS: u32 = 14;

/// 메모리에 도서, 이용자, 대출 기록을 보관하는 도서관 카탈로그
#[derive(Debug, Default)]
pub struct Library {
    books: HashMap<String, Book>,
    users: HashMap<String, User>,
    checkouts: Vec<Checkout>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_book(&mut self, book: Book) -> Result<&Book, ItemError> {
        if self.books.contains_key(book.isbn()) {
            return Err(ItemError::Duplicated(book.isbn().to_owned()));
        }

        info!(isbn = book.isbn(), category = %book.category(), "Book registered");
        let isbn = book.isbn().to_owned();
        Ok(self.books.entry(isbn).or_insert(book))
    }

    pub fn add_user(&mut self, user: User) -> Result<&User, ItemError> {
        if self.users.contains_key(user.id()) {
            return Err(ItemError::Duplicated(user.id().to_owned()));
        }

        info!(user_id = user.id(), user_type = %user.user_type(), "User registered");
        let id = user.id().to_owned();
        Ok(self.users.entry(id).or_insert(user))
    }

    /// 도서를 대출한다. 반납 기한은 대출일에 `loan_period_days`를 더한 날짜이다.
    pub fn checkout_book(
        &mut self,
        isbn: &str,
        user_id: &str,
        checkout_date: NaiveDate,
        loan_period_days: u32,
    ) -> Result<&Checkout, ItemError> {
        let due_date = due_date_after(checkout_date, loan_period_days)?;
        self.add_checkout(Checkout::new(isbn, user_id, checkout_date, due_date)?)
    }

    /// 이미 만들어진 대출 기록을 등록한다. 도서와 이용자는 미리 등록되어 있어야 한다.
    pub fn add_checkout(&mut self, checkout: Checkout) -> Result<&Checkout, ItemError> {
        if !self.books.contains_key(checkout.isbn()) {
            return Err(ItemError::NotFound(format!("book {}", checkout.isbn())));
        }
        if !self.users.contains_key(checkout.user_id()) {
            return Err(ItemError::NotFound(format!("user {}", checkout.user_id())));
        }

        debug!(
            isbn = checkout.isbn(),
            user_id = checkout.user_id(),
            due_date = %checkout.due_date(),
            "Checkout registered"
        );
        let index = self.checkouts.len();
        self.checkouts.push(checkout);
        Ok(&self.checkouts[index])
    }

    /// 이용자가 대출 중인 도서를 반납 처리한다. 같은 도서를 여러번 대출한 경우 가장 먼저 대출한 기록이 반납된다.
    pub fn return_book(
        &mut self,
        isbn: &str,
        user_id: &str,
        return_date: NaiveDate,
    ) -> Result<&Checkout, ItemError> {
        let checkout = self.checkouts.iter_mut()
            .find(|c| c.isbn() == isbn && c.user_id() == user_id && !c.is_returned())
            .ok_or_else(|| ItemError::NotFound(format!("open checkout of {} by {}", isbn, user_id)))?;

        checkout.mark_returned(return_date)?;
        info!(isbn, user_id, return_date = %return_date, "Book returned");
        Ok(checkout)
    }

    pub fn find_book(&self, isbn: &str) -> Option<&Book> {
        self.books.get(isbn)
    }

    pub fn find_user(&self, user_id: &str) -> Option<&User> {
        self.users.get(user_id)
    }

    /// 아이디 순으로 정렬된 모든 이용자
    pub fn users(&self) -> Vec<&User> {
        let mut users: Vec<&User> = self.users.values().collect();
        users.sort_by(|a, b| a.id().cmp(b.id()));
        users
    }

    pub fn checkouts(&self) -> &[Checkout] {
        &self.checkouts
    }

    /// 이용자의 모든 대출 기록을 도서 정보와 함께 반환한다.
    pub fn loans_of(&self, user_id: &str) -> Result<Vec<Loan<'_>>, ItemError> {
        self.checkouts.iter()
            .filter(|c| c.user_id() == user_id)
            .map(|c| self.loan(c))
            .collect()
    }

    /// 기준일에 반납되지 않은 채 연체 중인 대출 기록을 등록 순서대로 반환한다.
    pub fn overdue_loans(&self, reference_date: NaiveDate) -> Result<Vec<Loan<'_>>, ItemError> {
        self.checkouts.iter()
            .filter(|c| !c.is_returned() && c.is_overdue(reference_date))
            .map(|c| self.loan(c))
            .collect()
    }

    fn loan<'a>(&'a self, checkout: &'a Checkout) -> Result<Loan<'a>, ItemError> {
        let book = self.books.get(checkout.isbn())
            .ok_or_else(|| ItemError::NotFound(format!("book {}", checkout.isbn())))?;
        Ok(Loan { checkout, book })
    }
}

fn due_date_after(checkout_date: NaiveDate, loan_period_days: u32) -> Result<NaiveDate, ItemError> {
    checkout_date
        .checked_add_days(Days::new(u64::from(loan_period_days)))
        .ok_or_else(|| ItemError::InvalidDates(format!(
            "loan period of {} days from {} is out of range",
            loan_period_days, checkout_date
        )))
}

/// JSON 카탈로그 파일 형태
#[derive(Debug, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub books: Vec<BookRecord>,
    #[serde(default)]
    pub users: Vec<UserRecord>,
    #[serde(default)]
    pub checkouts: Vec<CheckoutRecord>,
}

#[derive(Debug, Deserialize)]
pub struct BookRecord {
    pub isbn: String,
    pub title: String,
    pub category: String,
}

#[derive(Debug, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub user_type: String,
}

/// 반납 기한(`due_date`)이 없으면 대출일에 `loan_period_days`(기본 14일)를 더해 계산한다.
#[derive(Debug, Deserialize)]
pub struct CheckoutRecord {
    pub isbn: String,
    pub user_id: String,
    pub checkout_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub loan_period_days: Option<u32>,
    pub return_date: Option<NaiveDate>,
}

impl TryFrom<CatalogFile> for Library {
    type Error = ItemError;

    fn try_from(file: CatalogFile) -> Result<Self, Self::Error> {
        let mut library = Library::new();

        for record in file.books {
            let category = Category::try_from(record.category.as_str())?;
            library.add_book(Book::new(&record.isbn, &record.title, category)?)?;
        }

        for record in file.users {
            let user_type = UserType::try_from(record.user_type.as_str())?;
            library.add_user(User::new(&record.id, &record.name, user_type)?)?;
        }

        for record in file.checkouts {
            let due_date = match record.due_date {
                Some(due_date) => due_date,
                None => due_date_after(
                    record.checkout_date,
                    record.loan_period_days.unwrap_or(DEF_LOAN_PERIOD_DAYS),
                )?,
            };

            let mut checkout = Checkout::new(&record.isbn, &record.user_id, record.checkout_date, due_date)?;
            if let Some(return_date) = record.return_date {
                checkout.mark_returned(return_date)?;
            }
            library.add_checkout(checkout)?;
        }

        Ok(library)
    }
}
