//! Library Context - Value Objects

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::LibraryError;

/// 书库条目唯一标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserBookId(Uuid);

impl UserBookId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for UserBookId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserBookId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 阅读记录唯一标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 用户标识（不能为 nil UUID）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    pub fn new(uuid: Uuid) -> Result<Self, LibraryError> {
        if uuid.is_nil() {
            return Err(LibraryError::invalid_argument("用户 ID 不能为空"));
        }
        Ok(Self(uuid))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 外部书籍标识（ISBN 或其他目录 ID）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookId(String);

impl BookId {
    pub fn new(id: impl AsRef<str>) -> Result<Self, LibraryError> {
        let id = id.as_ref().trim();
        if id.is_empty() {
            return Err(LibraryError::invalid_argument("书籍 ID 不能为空"));
        }
        Ok(Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BookId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 阅读状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingStatus {
    /// 想读
    ToRead,
    /// 在读
    Reading,
    /// 已读完（终态）
    Finished,
    /// 搁置
    OnHold,
    /// 弃读
    Dropped,
}

impl ReadingStatus {
    pub const ALL: [ReadingStatus; 5] = [
        ReadingStatus::ToRead,
        ReadingStatus::Reading,
        ReadingStatus::Finished,
        ReadingStatus::OnHold,
        ReadingStatus::Dropped,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingStatus::ToRead => "to_read",
            ReadingStatus::Reading => "reading",
            ReadingStatus::Finished => "finished",
            ReadingStatus::OnHold => "on_hold",
            ReadingStatus::Dropped => "dropped",
        }
    }

    /// 解析状态字符串，接受常见别名，大小写不敏感
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "to_read" | "toread" | "to-read" => Some(ReadingStatus::ToRead),
            "reading" | "currently-reading" | "currently_reading" => Some(ReadingStatus::Reading),
            "finished" | "read" | "completed" => Some(ReadingStatus::Finished),
            "on_hold" | "onhold" | "on-hold" => Some(ReadingStatus::OnHold),
            "dropped" | "abandoned" => Some(ReadingStatus::Dropped),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ReadingStatus::ToRead => "To Read",
            ReadingStatus::Reading => "Currently Reading",
            ReadingStatus::Finished => "Finished",
            ReadingStatus::OnHold => "On Hold",
            ReadingStatus::Dropped => "Dropped",
        }
    }
}

impl std::fmt::Display for ReadingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// 构造 BookInfo 的原始输入
#[derive(Debug, Clone, Default)]
pub struct BookDetails {
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub publisher: Option<String>,
    pub publication_year: Option<i32>,
    pub total_pages: Option<i32>,
    pub genre: Option<String>,
    pub description: Option<String>,
    pub cover_image_url: Option<String>,
}

impl BookDetails {
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            ..Default::default()
        }
    }

    pub fn with_total_pages(mut self, pages: i32) -> Self {
        self.total_pages = Some(pages);
        self
    }

    pub fn with_isbn(mut self, isbn: impl Into<String>) -> Self {
        self.isbn = Some(isbn.into());
        self
    }
}

/// 书籍信息（不可变）
///
/// 不变量:
/// - title、author 非空
/// - publication_year 在 [1000, 今年 + 10] 之间
/// - total_pages > 0
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookInfo {
    title: String,
    author: String,
    isbn: Option<String>,
    publisher: Option<String>,
    publication_year: Option<i32>,
    total_pages: Option<i32>,
    genre: Option<String>,
    description: Option<String>,
    cover_image_url: Option<String>,
}

impl BookInfo {
    pub fn new(details: BookDetails) -> Result<Self, LibraryError> {
        let title = details.title.trim();
        if title.is_empty() {
            return Err(LibraryError::invalid_argument("书名不能为空"));
        }

        let author = details.author.trim();
        if author.is_empty() {
            return Err(LibraryError::invalid_argument("作者不能为空"));
        }

        if let Some(year) = details.publication_year {
            let max_year = Utc::now().year() + 10;
            if !(1000..=max_year).contains(&year) {
                return Err(LibraryError::invalid_argument(format!(
                    "出版年份必须在 1000 到 {} 之间",
                    max_year
                )));
            }
        }

        if let Some(pages) = details.total_pages {
            if pages <= 0 {
                return Err(LibraryError::invalid_argument("总页数必须为正数"));
            }
        }

        Ok(Self {
            title: title.to_string(),
            author: author.to_string(),
            isbn: clean(details.isbn),
            publisher: clean(details.publisher),
            publication_year: details.publication_year,
            total_pages: details.total_pages,
            genre: clean(details.genre),
            description: clean(details.description),
            cover_image_url: clean(details.cover_image_url),
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn isbn(&self) -> Option<&str> {
        self.isbn.as_deref()
    }

    pub fn publisher(&self) -> Option<&str> {
        self.publisher.as_deref()
    }

    pub fn publication_year(&self) -> Option<i32> {
        self.publication_year
    }

    pub fn total_pages(&self) -> Option<i32> {
        self.total_pages
    }

    pub fn genre(&self) -> Option<&str> {
        self.genre.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn cover_image_url(&self) -> Option<&str> {
        self.cover_image_url.as_deref()
    }

    pub fn to_details(&self) -> BookDetails {
        BookDetails {
            title: self.title.clone(),
            author: self.author.clone(),
            isbn: self.isbn.clone(),
            publisher: self.publisher.clone(),
            publication_year: self.publication_year,
            total_pages: self.total_pages,
            genre: self.genre.clone(),
            description: self.description.clone(),
            cover_image_url: self.cover_image_url.clone(),
        }
    }
}

impl std::fmt::Display for BookInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} by {}", self.title, self.author)
    }
}

/// 去除首尾空白，空串视为缺失
fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// 阅读进度
///
/// 不变量:
/// - page_number >= 0
/// - total_pages（若存在）> 0 且 page_number <= total_pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    page_number: i32,
    total_pages: Option<i32>,
}

impl Progress {
    /// 未知总页数的进度
    pub fn from_page(page_number: i32) -> Result<Self, LibraryError> {
        Self::build(page_number, None)
    }

    pub fn from_page_of(page_number: i32, total_pages: i32) -> Result<Self, LibraryError> {
        Self::build(page_number, Some(total_pages))
    }

    /// 按百分比换算页码，四舍六入五成双
    pub fn from_percentage(percentage: f64, total_pages: i32) -> Result<Self, LibraryError> {
        if !(0.0..=100.0).contains(&percentage) {
            return Err(LibraryError::invalid_argument("百分比必须在 0 到 100 之间"));
        }
        if total_pages <= 0 {
            return Err(LibraryError::invalid_argument("总页数必须为正数"));
        }
        let page_number = (percentage / 100.0 * f64::from(total_pages)).round_ties_even() as i32;
        Self::build(page_number, Some(total_pages))
    }

    pub(crate) fn with_total(page_number: i32, total_pages: Option<i32>) -> Result<Self, LibraryError> {
        Self::build(page_number, total_pages)
    }

    fn build(page_number: i32, total_pages: Option<i32>) -> Result<Self, LibraryError> {
        if page_number < 0 {
            return Err(LibraryError::invalid_argument("页码不能为负数"));
        }
        if let Some(total) = total_pages {
            if total <= 0 {
                return Err(LibraryError::invalid_argument("总页数必须为正数"));
            }
            if page_number > total {
                return Err(LibraryError::invalid_argument(format!(
                    "页码 {} 超出总页数 {}",
                    page_number, total
                )));
            }
        }
        Ok(Self {
            page_number,
            total_pages,
        })
    }

    pub fn page_number(&self) -> i32 {
        self.page_number
    }

    pub fn total_pages(&self) -> Option<i32> {
        self.total_pages
    }

    /// 完成百分比，保留两位小数
    pub fn percentage(&self) -> Option<f64> {
        self.total_pages.map(|total| {
            let raw = f64::from(self.page_number) / f64::from(total) * 100.0;
            (raw * 100.0).round_ties_even() / 100.0
        })
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.total_pages, Some(total) if self.page_number >= total)
    }
}

impl std::fmt::Display for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.total_pages, self.percentage()) {
            (Some(total), Some(pct)) => {
                write!(f, "Page {} of {} ({:.1}%)", self.page_number, total, pct)
            }
            _ => write!(f, "Page {}", self.page_number),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_percentage() {
        let progress = Progress::from_page_of(50, 200).unwrap();
        assert_eq!(progress.percentage(), Some(25.0));
        assert!(!progress.is_complete());

        let third = Progress::from_page_of(1, 3).unwrap();
        assert_eq!(third.percentage(), Some(33.33));

        let two_thirds = Progress::from_page_of(2, 3).unwrap();
        assert_eq!(two_thirds.percentage(), Some(66.67));
    }

    #[test]
    fn test_progress_complete() {
        let progress = Progress::from_page_of(300, 300).unwrap();
        assert!(progress.is_complete());
        assert_eq!(progress.percentage(), Some(100.0));

        let unknown_total = Progress::from_page(500).unwrap();
        assert!(!unknown_total.is_complete());
        assert_eq!(unknown_total.percentage(), None);
    }

    #[test]
    fn test_progress_rejects_invalid_pages() {
        assert!(matches!(
            Progress::from_page(-1),
            Err(LibraryError::InvalidArgument(_))
        ));
        assert!(matches!(
            Progress::from_page_of(5, 3),
            Err(LibraryError::InvalidArgument(_))
        ));
        assert!(matches!(
            Progress::from_page_of(0, 0),
            Err(LibraryError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_progress_from_percentage() {
        let progress = Progress::from_percentage(50.0, 300).unwrap();
        assert_eq!(progress.page_number(), 150);

        // 2.5 -> 2（银行家舍入）
        let tie = Progress::from_percentage(50.0, 5).unwrap();
        assert_eq!(tie.page_number(), 2);

        assert!(Progress::from_percentage(100.5, 100).is_err());
        assert!(Progress::from_percentage(-0.1, 100).is_err());
        assert!(Progress::from_percentage(10.0, 0).is_err());
    }

    #[test]
    fn test_progress_display() {
        assert_eq!(
            Progress::from_page_of(1, 3).unwrap().to_string(),
            "Page 1 of 3 (33.3%)"
        );
        assert_eq!(Progress::from_page(42).unwrap().to_string(), "Page 42");
    }

    #[test]
    fn test_book_info_trims_and_drops_blank_fields() {
        let info = BookInfo::new(BookDetails {
            title: "  Dune ".to_string(),
            author: " Frank Herbert".to_string(),
            isbn: Some("   ".to_string()),
            genre: Some(" Science Fiction ".to_string()),
            total_pages: Some(412),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(info.title(), "Dune");
        assert_eq!(info.author(), "Frank Herbert");
        assert_eq!(info.isbn(), None);
        assert_eq!(info.genre(), Some("Science Fiction"));
        assert_eq!(info.total_pages(), Some(412));
    }

    #[test]
    fn test_book_info_validation() {
        assert!(BookInfo::new(BookDetails::new(" ", "Author")).is_err());
        assert!(BookInfo::new(BookDetails::new("Title", "")).is_err());
        assert!(BookInfo::new(BookDetails::new("Title", "Author").with_total_pages(0)).is_err());

        let mut details = BookDetails::new("Title", "Author");
        details.publication_year = Some(999);
        assert!(BookInfo::new(details.clone()).is_err());

        details.publication_year = Some(Utc::now().year() + 11);
        assert!(BookInfo::new(details.clone()).is_err());

        details.publication_year = Some(1937);
        assert!(BookInfo::new(details).is_ok());
    }

    #[test]
    fn test_book_info_structural_equality() {
        let a = BookInfo::new(BookDetails::new("Title", "Author").with_total_pages(10)).unwrap();
        let b = BookInfo::new(BookDetails::new(" Title ", "Author").with_total_pages(10)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_reading_status_aliases() {
        assert_eq!(ReadingStatus::from_str("to-read"), Some(ReadingStatus::ToRead));
        assert_eq!(ReadingStatus::from_str("ToRead"), Some(ReadingStatus::ToRead));
        assert_eq!(
            ReadingStatus::from_str("currently-reading"),
            Some(ReadingStatus::Reading)
        );
        assert_eq!(ReadingStatus::from_str("completed"), Some(ReadingStatus::Finished));
        assert_eq!(ReadingStatus::from_str("On-Hold"), Some(ReadingStatus::OnHold));
        assert_eq!(ReadingStatus::from_str("abandoned"), Some(ReadingStatus::Dropped));
        assert_eq!(ReadingStatus::from_str("paused"), None);

        for status in ReadingStatus::ALL {
            assert_eq!(ReadingStatus::from_str(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_identifier_validation() {
        assert!(UserId::new(Uuid::nil()).is_err());
        assert!(BookId::new("   ").is_err());
        assert_eq!(BookId::new(" 978-1 ").unwrap().as_str(), "978-1");
    }
}
