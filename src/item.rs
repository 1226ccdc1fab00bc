pub mod library;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::sync::LazyLock;

static ISBN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[0-9]{9}[0-9Xx]|[0-9]{13})$").expect("isbn pattern must compile")
});

/// Item 모듈에서 사용할 에러 열거
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemError {
    /// 알 수 없는 도서 분류 코드
    UnknownCategory(String),

    /// 알 수 없는 사용자 유형 코드
    UnknownUserType(String),

    /// 형식에 맞지 않는 식별자 (ISBN, 사용자 아이디)
    InvalidIdentifier(String),

    /// 대출일, 반납 기한, 반납일의 선후 관계가 맞지 않음
    InvalidDates(String),

    /// 이미 등록된 식별자
    Duplicated(String),

    /// 등록되지 않은 도서, 사용자 혹은 대출
    NotFound(String),
}

impl Display for ItemError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ItemError::UnknownCategory(s) => write!(f, "Unknown category: {}", s),
            ItemError::UnknownUserType(s) => write!(f, "Unknown user type: {}", s),
            ItemError::InvalidIdentifier(s) => write!(f, "Invalid identifier: {}", s),
            ItemError::InvalidDates(s) => write!(f, "Invalid dates: {}", s),
            ItemError::Duplicated(s) => write!(f, "Already registered: {}", s),
            ItemError::NotFound(s) => write!(f, "Not found: {}", s),
        }
    }
}

impl std::error::Error for ItemError {}

fn normalize_code(value: &str) -> String {
    value.trim().to_lowercase().replace(['-', ' '], "_")
}

/// 도서 분류, 분류에 따라 하루당 연체료가 달라진다.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Category {
    Standard,
    Reference,
    NewRelease,
    Children,
    Textbook,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Standard,
        Category::Reference,
        Category::NewRelease,
        Category::Children,
        Category::Textbook,
    ];
}

impl TryFrom<&str> for Category {
    type Error = ItemError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match normalize_code(value).as_str() {
            "standard" | "regular" => Ok(Category::Standard),
            "reference" => Ok(Category::Reference),
            "new_release" | "newrelease" | "bestseller" => Ok(Category::NewRelease),
            "children" => Ok(Category::Children),
            "textbook" => Ok(Category::Textbook),
            _ => Err(ItemError::UnknownCategory(value.to_owned())),
        }
    }
}

impl TryFrom<String> for Category {
    type Error = ItemError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Category::try_from(value.as_str())
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        value.to_string()
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Category::Standard => write!(f, "standard"),
            Category::Reference => write!(f, "reference"),
            Category::NewRelease => write!(f, "new_release"),
            Category::Children => write!(f, "children"),
            Category::Textbook => write!(f, "textbook"),
        }
    }
}

/// 사용자 유형, 유형에 따라 연체료 할인율이 달라진다.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum UserType {
    Regular,
    Student,
    Senior,
    Staff,
    Faculty,
}

impl UserType {
    pub const ALL: [UserType; 5] = [
        UserType::Regular,
        UserType::Student,
        UserType::Senior,
        UserType::Staff,
        UserType::Faculty,
    ];
}

impl TryFrom<&str> for UserType {
    type Error = ItemError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match normalize_code(value).as_str() {
            "regular" => Ok(UserType::Regular),
            "student" => Ok(UserType::Student),
            "senior" => Ok(UserType::Senior),
            "staff" => Ok(UserType::Staff),
            "faculty" => Ok(UserType::Faculty),
            _ => Err(ItemError::UnknownUserType(value.to_owned())),
        }
    }
}

impl TryFrom<String> for UserType {
    type Error = ItemError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        UserType::try_from(value.as_str())
    }
}

impl From<UserType> for String {
    fn from(value: UserType) -> Self {
        value.to_string()
    }
}

impl Display for UserType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            UserType::Regular => write!(f, "regular"),
            UserType::Student => write!(f, "student"),
            UserType::Senior => write!(f, "senior"),
            UserType::Staff => write!(f, "staff"),
            UserType::Faculty => write!(f, "faculty"),
        }
    }
}

/// 도서
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Book {
    isbn: String,
    title: String,
    category: Category,
}

impl Book {
    /// ISBN은 하이픈을 제외하고 10자리(마지막 자리 `X` 허용) 혹은 13자리 숫자여야 한다.
    pub fn new(isbn: &str, title: &str, category: Category) -> Result<Self, ItemError> {
        let isbn = isbn.trim();
        let compact = isbn.replace('-', "");
        if isbn.starts_with('-') || isbn.ends_with('-') || !ISBN_PATTERN.is_match(&compact) {
            return Err(ItemError::InvalidIdentifier(isbn.to_owned()));
        }

        Ok(Self {
            isbn: isbn.to_owned(),
            title: title.to_owned(),
            category,
        })
    }

    pub fn isbn(&self) -> &str {
        &self.isbn
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn category(&self) -> Category {
        self.category
    }
}

/// 도서관 이용자
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct User {
    id: String,
    name: String,
    user_type: UserType,
}

impl User {
    pub fn new(id: &str, name: &str, user_type: UserType) -> Result<Self, ItemError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(ItemError::InvalidIdentifier("user id must not be blank".to_owned()));
        }

        Ok(Self {
            id: id.to_owned(),
            name: name.to_owned(),
            user_type,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn user_type(&self) -> UserType {
        self.user_type
    }
}

/// 대출 기록
///
/// 도서와 이용자는 식별자로만 참조한다. 반납 기한과 반납일은 대출일보다 앞설 수 없다.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Checkout {
    isbn: String,
    user_id: String,
    checkout_date: NaiveDate,
    due_date: NaiveDate,
    return_date: Option<NaiveDate>,
}

impl Checkout {
    pub fn new(
        isbn: &str,
        user_id: &str,
        checkout_date: NaiveDate,
        due_date: NaiveDate,
    ) -> Result<Self, ItemError> {
        if due_date < checkout_date {
            return Err(ItemError::InvalidDates(format!(
                "due date {} is before checkout date {}",
                due_date, checkout_date
            )));
        }

        Ok(Self {
            isbn: isbn.to_owned(),
            user_id: user_id.to_owned(),
            checkout_date,
            due_date,
            return_date: None,
        })
    }

    pub fn isbn(&self) -> &str {
        &self.isbn
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn checkout_date(&self) -> NaiveDate {
        self.checkout_date
    }

    pub fn due_date(&self) -> NaiveDate {
        self.due_date
    }

    pub fn return_date(&self) -> Option<NaiveDate> {
        self.return_date
    }

    pub fn is_returned(&self) -> bool {
        self.return_date.is_some()
    }

    /// 연체 여부를 판단할 기준일, 반납된 경우 반납일이고 아니면 `now`이다.
    pub fn reference_date(&self, now: NaiveDate) -> NaiveDate {
        self.return_date.unwrap_or(now)
    }

    pub fn is_overdue(&self, now: NaiveDate) -> bool {
        self.reference_date(now) > self.due_date
    }

    pub fn mark_returned(&mut self, return_date: NaiveDate) -> Result<(), ItemError> {
        if return_date < self.checkout_date {
            return Err(ItemError::InvalidDates(format!(
                "return date {} is before checkout date {}",
                return_date, self.checkout_date
            )));
        }
        if self.return_date.is_some() {
            return Err(ItemError::InvalidDates(format!(
                "checkout of {} by {} is already returned",
                self.isbn, self.user_id
            )));
        }

        self.return_date = Some(return_date);
        Ok(())
    }
}

/// 대출 기록과 대출된 도서의 묶음, 연체료 계산에 필요한 정보를 함께 전달한다.
#[derive(Debug, Clone, Copy)]
pub struct Loan<'a> {
    pub checkout: &'a Checkout,
    pub book: &'a Book,
}
