//! SQLite UserBook Repository
//!
//! 聚合存两张表：user_books 一行，reading_sessions 每条记录一行。
//! 时间统一存为微秒精度的 RFC3339 UTC 字符串，可直接按字符串比较排序。

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use sqlx::FromRow;
use std::collections::HashMap;
use uuid::Uuid;

use super::DbPool;
use crate::application::ports::{Page, PagedQuery, RepositoryError, UserBookRepositoryPort};
use crate::domain::library::{
    BookDetails, BookInfo, ReadingStatus, SessionId, SessionSnapshot, UserBook, UserBookId,
    UserBookSnapshot,
};

const USER_BOOK_COLUMNS: &str = "id, user_id, book_id, title, author, isbn, publisher, \
     publication_year, total_pages, genre, description, cover_image_url, status, current_page, \
     added_date, started_date, finished_date, personal_notes, personal_rating, version";

const SESSION_COLUMNS: &str =
    "id, user_book_id, seq, start_date, end_date, start_page, end_page, notes, created_at";

/// IN 子句每批的最大参数数
const IN_BATCH_SIZE: usize = 500;

/// SQLite UserBook Repository
pub struct SqliteUserBookRepository {
    pool: DbPool,
}

impl SqliteUserBookRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn db_err(e: sqlx::Error) -> RepositoryError {
    RepositoryError::DatabaseError(e.to_string())
}

fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(value: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::SerializationError(e.to_string()))
}

fn parse_opt_ts(value: Option<&str>) -> Result<Option<DateTime<Utc>>, RepositoryError> {
    value.map(parse_ts).transpose()
}

fn parse_uuid(value: &str) -> Result<Uuid, RepositoryError> {
    Uuid::parse_str(value).map_err(|e| RepositoryError::SerializationError(e.to_string()))
}

/// 整数列收窄到领域类型，越界视为数据损坏
fn narrow<T>(column: &str, value: i64) -> Result<T, RepositoryError>
where
    T: TryFrom<i64, Error = std::num::TryFromIntError>,
{
    T::try_from(value).map_err(|e| {
        RepositoryError::SerializationError(format!("{} out of range ({}): {}", column, value, e))
    })
}

fn narrow_opt<T>(column: &str, value: Option<i64>) -> Result<Option<T>, RepositoryError>
where
    T: TryFrom<i64, Error = std::num::TryFromIntError>,
{
    value.map(|v| narrow(column, v)).transpose()
}

/// 将搜索词转成 LIKE 模式，转义 % 和 _
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[derive(FromRow)]
struct UserBookRow {
    id: String,
    user_id: String,
    book_id: String,
    title: String,
    author: String,
    isbn: Option<String>,
    publisher: Option<String>,
    publication_year: Option<i64>,
    total_pages: Option<i64>,
    genre: Option<String>,
    description: Option<String>,
    cover_image_url: Option<String>,
    status: String,
    current_page: i64,
    added_date: String,
    started_date: Option<String>,
    finished_date: Option<String>,
    personal_notes: Option<String>,
    personal_rating: Option<i64>,
    version: i64,
}

#[derive(FromRow)]
struct SessionRow {
    id: String,
    user_book_id: String,
    #[allow(dead_code)]
    seq: i64,
    start_date: String,
    end_date: Option<String>,
    start_page: i64,
    end_page: i64,
    notes: Option<String>,
    created_at: String,
}

impl TryFrom<SessionRow> for SessionSnapshot {
    type Error = RepositoryError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        Ok(SessionSnapshot {
            id: SessionId::from_uuid(parse_uuid(&row.id)?),
            start_date: parse_ts(&row.start_date)?,
            end_date: parse_opt_ts(row.end_date.as_deref())?,
            start_page: narrow("start_page", row.start_page)?,
            end_page: narrow("end_page", row.end_page)?,
            notes: row.notes,
            created_at: parse_ts(&row.created_at)?,
        })
    }
}

impl UserBookRow {
    fn into_aggregate(self, sessions: Vec<SessionRow>) -> Result<UserBook, RepositoryError> {
        let invalid = |e: crate::domain::library::LibraryError| {
            RepositoryError::SerializationError(e.to_string())
        };

        let book_info = BookInfo::new(BookDetails {
            title: self.title,
            author: self.author,
            isbn: self.isbn,
            publisher: self.publisher,
            publication_year: narrow_opt("publication_year", self.publication_year)?,
            total_pages: narrow_opt("total_pages", self.total_pages)?,
            genre: self.genre,
            description: self.description,
            cover_image_url: self.cover_image_url,
        })
        .map_err(invalid)?;

        let status = ReadingStatus::from_str(&self.status).ok_or_else(|| {
            RepositoryError::SerializationError(format!("Unknown status: {}", self.status))
        })?;

        let personal_rating = narrow_opt("personal_rating", self.personal_rating)?;

        let sessions = sessions
            .into_iter()
            .map(SessionSnapshot::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        UserBook::restore(UserBookSnapshot {
            id: UserBookId::from_uuid(parse_uuid(&self.id)?),
            book_id: self.book_id,
            user_id: parse_uuid(&self.user_id)?,
            book_info,
            status,
            current_page: narrow("current_page", self.current_page)?,
            added_date: parse_ts(&self.added_date)?,
            started_date: parse_opt_ts(self.started_date.as_deref())?,
            finished_date: parse_opt_ts(self.finished_date.as_deref())?,
            personal_notes: self.personal_notes,
            personal_rating,
            sessions,
            version: narrow("version", self.version)?,
        })
        .map_err(invalid)
    }
}

/// 列表查询的动态 WHERE 条件，所有参数都按字符串绑定
struct Filter {
    clauses: Vec<&'static str>,
    binds: Vec<String>,
}

impl Filter {
    fn for_user(user_id: Uuid) -> Self {
        Self {
            clauses: vec!["user_id = ?"],
            binds: vec![user_id.to_string()],
        }
    }

    fn status(mut self, status: ReadingStatus) -> Self {
        self.clauses.push("status = ?");
        self.binds.push(status.as_str().to_string());
        self
    }

    /// 在书名、作者、类型和笔记中匹配
    fn search(mut self, term: &str) -> Self {
        self.clauses.push(
            "(LOWER(title) LIKE ? ESCAPE '\\' OR LOWER(author) LIKE ? ESCAPE '\\' \
             OR LOWER(COALESCE(genre, '')) LIKE ? ESCAPE '\\' \
             OR LOWER(COALESCE(personal_notes, '')) LIKE ? ESCAPE '\\')",
        );
        let pattern = like_pattern(term);
        for _ in 0..4 {
            self.binds.push(pattern.clone());
        }
        self
    }

    fn author(mut self, author: &str) -> Self {
        self.clauses.push("LOWER(author) LIKE ? ESCAPE '\\'");
        self.binds.push(like_pattern(author));
        self
    }

    fn sql(&self) -> String {
        self.clauses.join(" AND ")
    }
}

impl SqliteUserBookRepository {
    async fn fetch_where(
        &self,
        filter: Filter,
        order_by: &str,
    ) -> Result<Vec<UserBook>, RepositoryError> {
        let query = format!(
            "SELECT {} FROM user_books WHERE {} ORDER BY {}",
            USER_BOOK_COLUMNS,
            filter.sql(),
            order_by
        );

        let mut sql_query = sqlx::query_as::<_, UserBookRow>(&query);
        for value in &filter.binds {
            sql_query = sql_query.bind(value);
        }

        let rows = sql_query.fetch_all(&self.pool).await.map_err(db_err)?;
        self.load_aggregates(rows).await
    }

    async fn count_where(&self, filter: &Filter) -> Result<u64, RepositoryError> {
        let query = format!("SELECT COUNT(*) FROM user_books WHERE {}", filter.sql());

        let mut sql_query = sqlx::query_as::<_, (i64,)>(&query);
        for value in &filter.binds {
            sql_query = sql_query.bind(value);
        }

        let (count,) = sql_query.fetch_one(&self.pool).await.map_err(db_err)?;
        narrow("count", count)
    }

    /// 批量加载阅读记录并组装聚合，保持 rows 的顺序
    async fn load_aggregates(&self, rows: Vec<UserBookRow>) -> Result<Vec<UserBook>, RepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut sessions_by_book: HashMap<String, Vec<SessionRow>> = HashMap::new();
        let ids: Vec<&str> = rows.iter().map(|row| row.id.as_str()).collect();

        for chunk in ids.chunks(IN_BATCH_SIZE) {
            // 构建 IN 子句的占位符
            let placeholders: Vec<&str> = chunk.iter().map(|_| "?").collect();
            let query = format!(
                "SELECT {} FROM reading_sessions WHERE user_book_id IN ({}) ORDER BY user_book_id, seq",
                SESSION_COLUMNS,
                placeholders.join(", ")
            );

            let mut sql_query = sqlx::query_as::<_, SessionRow>(&query);
            for id in chunk {
                sql_query = sql_query.bind(*id);
            }

            let session_rows = sql_query.fetch_all(&self.pool).await.map_err(db_err)?;
            for session in session_rows {
                sessions_by_book
                    .entry(session.user_book_id.clone())
                    .or_default()
                    .push(session);
            }
        }

        rows.into_iter()
            .map(|row| {
                let sessions = sessions_by_book.remove(&row.id).unwrap_or_default();
                row.into_aggregate(sessions)
            })
            .collect()
    }

    async fn insert_sessions(
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        book: &UserBook,
    ) -> Result<(), RepositoryError> {
        // 阅读记录只追加不修改，已存在的直接跳过
        for (seq, session) in book.reading_sessions().iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO reading_sessions
                    (id, user_book_id, seq, start_date, end_date, start_page, end_page, notes, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(session.id().to_string())
            .bind(book.id().to_string())
            .bind(seq as i64)
            .bind(format_ts(session.start_date()))
            .bind(session.end_date().map(format_ts))
            .bind(i64::from(session.start_page()))
            .bind(i64::from(session.end_page()))
            .bind(session.notes())
            .bind(format_ts(session.created_at()))
            .execute(&mut **tx)
            .await
            .map_err(db_err)?;
        }
        Ok(())
    }
}

#[async_trait]
impl UserBookRepositoryPort for SqliteUserBookRepository {
    async fn get_by_id(&self, id: UserBookId) -> Result<Option<UserBook>, RepositoryError> {
        let query = format!("SELECT {} FROM user_books WHERE id = ?", USER_BOOK_COLUMNS);
        let row: Option<UserBookRow> = sqlx::query_as(&query)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        match row {
            Some(row) => Ok(self.load_aggregates(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn get_by_user_and_book(
        &self,
        user_id: Uuid,
        book_id: &str,
    ) -> Result<Option<UserBook>, RepositoryError> {
        let query = format!(
            "SELECT {} FROM user_books WHERE user_id = ? AND book_id = ?",
            USER_BOOK_COLUMNS
        );
        let row: Option<UserBookRow> = sqlx::query_as(&query)
            .bind(user_id.to_string())
            .bind(book_id.trim())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        match row {
            Some(row) => Ok(self.load_aggregates(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<UserBook>, RepositoryError> {
        self.fetch_where(Filter::for_user(user_id), "added_date DESC")
            .await
    }

    async fn add(&self, book: &UserBook) -> Result<(), RepositoryError> {
        let info = book.book_info();
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let query = format!(
            "INSERT INTO user_books ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            USER_BOOK_COLUMNS
        );
        sqlx::query(&query)
            .bind(book.id().to_string())
            .bind(book.user_id().to_string())
            .bind(book.book_id().as_str())
            .bind(info.title())
            .bind(info.author())
            .bind(info.isbn())
            .bind(info.publisher())
            .bind(info.publication_year().map(i64::from))
            .bind(info.total_pages().map(i64::from))
            .bind(info.genre())
            .bind(info.description())
            .bind(info.cover_image_url())
            .bind(book.status().as_str())
            .bind(i64::from(book.current_progress().page_number()))
            .bind(format_ts(book.added_date()))
            .bind(book.started_date().map(format_ts))
            .bind(book.finished_date().map(format_ts))
            .bind(book.personal_notes())
            .bind(book.personal_rating().map(i64::from))
            .bind(book.version() as i64)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db) = &e {
                    if db.is_unique_violation() {
                        return RepositoryError::Duplicate(format!(
                            "Book {} already in library of user {}",
                            book.book_id(),
                            book.user_id()
                        ));
                    }
                }
                db_err(e)
            })?;

        Self::insert_sessions(&mut tx, book).await?;
        tx.commit().await.map_err(db_err)?;

        tracing::debug!(user_book_id = %book.id(), "UserBook inserted");
        Ok(())
    }

    async fn update(&self, book: &UserBook) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        // 只更新可变字段，版本号不匹配说明已被其他请求修改
        let result = sqlx::query(
            r#"
            UPDATE user_books
            SET status = ?, current_page = ?, started_date = ?, finished_date = ?,
                personal_notes = ?, personal_rating = ?, version = version + 1
            WHERE id = ? AND version = ?
            "#,
        )
        .bind(book.status().as_str())
        .bind(i64::from(book.current_progress().page_number()))
        .bind(book.started_date().map(format_ts))
        .bind(book.finished_date().map(format_ts))
        .bind(book.personal_notes())
        .bind(book.personal_rating().map(i64::from))
        .bind(book.id().to_string())
        .bind(book.version() as i64)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            let (exists,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM user_books WHERE id = ?")
                .bind(book.id().to_string())
                .fetch_one(&mut *tx)
                .await
                .map_err(db_err)?;

            return Err(if exists == 0 {
                RepositoryError::NotFound(format!("UserBook {}", book.id()))
            } else {
                tracing::warn!(
                    user_book_id = %book.id(),
                    version = book.version(),
                    "Optimistic concurrency conflict"
                );
                RepositoryError::Conflict(format!(
                    "UserBook {} was modified by another request",
                    book.id()
                ))
            });
        }

        Self::insert_sessions(&mut tx, book).await?;
        tx.commit().await.map_err(db_err)?;

        Ok(())
    }

    async fn delete(&self, id: UserBookId) -> Result<(), RepositoryError> {
        // 使用事务确保原子性
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        sqlx::query("DELETE FROM reading_sessions WHERE user_book_id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        let result = sqlx::query("DELETE FROM user_books WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("UserBook {}", id)));
        }

        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn find_by_status(
        &self,
        user_id: Uuid,
        status: ReadingStatus,
    ) -> Result<Vec<UserBook>, RepositoryError> {
        self.fetch_where(Filter::for_user(user_id).status(status), "added_date DESC")
            .await
    }

    async fn find_recently_finished(
        &self,
        user_id: Uuid,
        days: u32,
    ) -> Result<Vec<UserBook>, RepositoryError> {
        let mut filter = Filter::for_user(user_id).status(ReadingStatus::Finished);
        filter.clauses.push("finished_date >= ?");
        filter
            .binds
            .push(format_ts(Utc::now() - Duration::days(i64::from(days))));

        self.fetch_where(filter, "finished_date DESC").await
    }

    async fn find_by_rating(&self, user_id: Uuid, rating: u8) -> Result<Vec<UserBook>, RepositoryError> {
        let mut filter = Filter::for_user(user_id);
        filter.clauses.push("personal_rating = ?");
        filter.binds.push(rating.to_string());

        self.fetch_where(filter, "added_date DESC").await
    }

    async fn search(&self, user_id: Uuid, term: &str) -> Result<Vec<UserBook>, RepositoryError> {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return Ok(Vec::new());
        }
        self.fetch_where(Filter::for_user(user_id).search(&term), "added_date DESC")
            .await
    }

    async fn find_by_author(&self, user_id: Uuid, author: &str) -> Result<Vec<UserBook>, RepositoryError> {
        let author = author.trim().to_lowercase();
        if author.is_empty() {
            return Ok(Vec::new());
        }
        self.fetch_where(Filter::for_user(user_id).author(&author), "added_date DESC")
            .await
    }

    async fn find_by_date_range(
        &self,
        user_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<UserBook>, RepositoryError> {
        let mut filter = Filter::for_user(user_id);
        filter.clauses.push("added_date >= ?");
        filter.clauses.push("added_date <= ?");
        filter.binds.push(format_ts(from));
        filter.binds.push(format_ts(to));

        self.fetch_where(filter, "added_date DESC").await
    }

    async fn count_by_user(&self, user_id: Uuid) -> Result<u64, RepositoryError> {
        self.count_where(&Filter::for_user(user_id)).await
    }

    async fn count_by_status(
        &self,
        user_id: Uuid,
        status: ReadingStatus,
    ) -> Result<u64, RepositoryError> {
        self.count_where(&Filter::for_user(user_id).status(status))
            .await
    }

    async fn exists(&self, user_id: Uuid, book_id: &str) -> Result<bool, RepositoryError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM user_books WHERE user_id = ? AND book_id = ?")
                .bind(user_id.to_string())
                .bind(book_id.trim())
                .fetch_one(&self.pool)
                .await
                .map_err(db_err)?;

        Ok(count > 0)
    }

    async fn find_paged(
        &self,
        user_id: Uuid,
        query: &PagedQuery,
    ) -> Result<Page<UserBook>, RepositoryError> {
        let mut filter = Filter::for_user(user_id);
        if let Some(status) = query.status {
            filter = filter.status(status);
        }
        if let Some(term) = query.search_term() {
            filter = filter.search(&term);
        }

        let total_count = self.count_where(&filter).await?;
        if total_count == 0 {
            return Ok(Page::empty(query.page, query.page_size));
        }

        let order = format!(
            "added_date DESC LIMIT {} OFFSET {}",
            query.page_size,
            query.offset()
        );
        let items = self.fetch_where(filter, &order).await?;

        Ok(Page::new(items, total_count, query.page, query.page_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::sqlite::{create_pool, run_migrations, DatabaseConfig};

    async fn repo() -> SqliteUserBookRepository {
        let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&pool).await.unwrap();
        SqliteUserBookRepository::new(pool)
    }

    fn new_book(book_id: &str, title: &str, author: &str, user_id: Uuid) -> UserBook {
        let details = BookDetails {
            genre: Some("Fantasy".to_string()),
            publication_year: Some(1937),
            ..BookDetails::new(title, author).with_total_pages(300).with_isbn("978-0-544-00341-5")
        };
        UserBook::new(book_id, user_id, BookInfo::new(details).unwrap(), None).unwrap()
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("100%_done"), "%100\\%\\_done%");
    }

    #[tokio::test]
    async fn test_add_and_load_with_sessions() {
        let repo = repo().await;
        let user_id = Uuid::new_v4();
        let mut book = new_book("hobbit", "The Hobbit", "J.R.R. Tolkien", user_id);
        repo.add(&book).await.unwrap();

        let start = Utc::now() - Duration::hours(3);
        book.start_reading(Some(start)).unwrap();
        book.log_reading_session(start, 0, 40, Some(start + Duration::minutes(45)), Some("ch1".into()))
            .unwrap();
        book.log_reading_session(start + Duration::hours(1), 40, 90, None, None)
            .unwrap();
        book.rate_book(4).unwrap();
        repo.update(&book).await.unwrap();

        let loaded = repo.get_by_id(book.id()).await.unwrap().unwrap();
        assert_eq!(loaded.status(), ReadingStatus::Reading);
        assert_eq!(loaded.current_progress().page_number(), 90);
        assert_eq!(loaded.reading_sessions().len(), 2);
        assert_eq!(loaded.reading_sessions()[0].notes(), Some("ch1"));
        assert_eq!(loaded.reading_sessions()[1].start_page(), 40);
        assert_eq!(loaded.total_reading_time(), Duration::minutes(45));
        assert_eq!(loaded.personal_rating(), Some(4));
        assert_eq!(loaded.book_info().genre(), Some("Fantasy"));
        assert_eq!(loaded.book_info().publication_year(), Some(1937));
        assert_eq!(loaded.version(), 1);
        assert!(loaded.domain_events().is_empty());

        let by_book = repo.get_by_user_and_book(user_id, " hobbit ").await.unwrap();
        assert_eq!(by_book.map(|b| b.id()), Some(book.id()));
    }

    #[tokio::test]
    async fn test_out_of_range_columns_rejected() {
        let repo = repo().await;
        let mut book = new_book("wide", "A", "B", Uuid::new_v4());
        book.start_reading(None).unwrap();
        book.log_reading_session(Utc::now(), 0, 10, None, None).unwrap();
        repo.add(&book).await.unwrap();

        sqlx::query("UPDATE reading_sessions SET end_page = ? WHERE user_book_id = ?")
            .bind(i64::from(i32::MAX) + 1)
            .bind(book.id().to_string())
            .execute(&repo.pool)
            .await
            .unwrap();

        let result = repo.get_by_id(book.id()).await;
        assert!(matches!(result, Err(RepositoryError::SerializationError(_))));

        sqlx::query("UPDATE user_books SET current_page = ? WHERE id = ?")
            .bind(-(1_i64 << 40))
            .bind(book.id().to_string())
            .execute(&repo.pool)
            .await
            .unwrap();
        sqlx::query("DELETE FROM reading_sessions WHERE user_book_id = ?")
            .bind(book.id().to_string())
            .execute(&repo.pool)
            .await
            .unwrap();

        let result = repo.get_by_id(book.id()).await;
        assert!(matches!(result, Err(RepositoryError::SerializationError(_))));
    }

    #[tokio::test]
    async fn test_duplicate_book_rejected() {
        let repo = repo().await;
        let user_id = Uuid::new_v4();
        repo.add(&new_book("dup", "A", "B", user_id)).await.unwrap();

        let result = repo.add(&new_book("dup", "A", "B", user_id)).await;
        assert!(matches!(result, Err(RepositoryError::Duplicate(_))));
        assert!(repo.exists(user_id, "dup").await.unwrap());
        assert!(!repo.exists(Uuid::new_v4(), "dup").await.unwrap());
    }

    #[tokio::test]
    async fn test_stale_update_conflicts() {
        let repo = repo().await;
        let book = new_book("x", "A", "B", Uuid::new_v4());
        repo.add(&book).await.unwrap();

        let mut first = repo.get_by_id(book.id()).await.unwrap().unwrap();
        let mut second = repo.get_by_id(book.id()).await.unwrap().unwrap();

        first.update_personal_notes(Some("first".into()));
        repo.update(&first).await.unwrap();

        second.rate_book(2).unwrap();
        let result = repo.update(&second).await;
        assert!(matches!(result, Err(RepositoryError::Conflict(_))));

        let stored = repo.get_by_id(book.id()).await.unwrap().unwrap();
        assert_eq!(stored.personal_notes(), Some("first"));
        assert_eq!(stored.personal_rating(), None);
    }

    #[tokio::test]
    async fn test_update_missing_book_is_not_found() {
        let repo = repo().await;
        let book = new_book("ghost", "A", "B", Uuid::new_v4());
        let result = repo.update(&book).await;
        assert!(matches!(result, Err(RepositoryError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_search_and_filters() {
        let repo = repo().await;
        let user_id = Uuid::new_v4();
        repo.add(&new_book("1", "The Hobbit", "J.R.R. Tolkien", user_id)).await.unwrap();
        repo.add(&new_book("2", "Dune", "Frank Herbert", user_id)).await.unwrap();
        let mut noted = new_book("3", "Emma", "Jane Austen", user_id);
        noted.update_personal_notes(Some("Gift from 100% good friend".into()));
        repo.add(&noted).await.unwrap();
        repo.add(&new_book("4", "The Hobbit", "J.R.R. Tolkien", Uuid::new_v4()))
            .await
            .unwrap();

        assert_eq!(repo.search(user_id, "  HOBBIT ").await.unwrap().len(), 1);
        assert_eq!(repo.search(user_id, "fantasy").await.unwrap().len(), 3);
        assert_eq!(repo.search(user_id, "100%").await.unwrap().len(), 1);
        assert!(repo.search(user_id, "  ").await.unwrap().is_empty());
        assert_eq!(repo.find_by_author(user_id, "herbert").await.unwrap().len(), 1);
        assert_eq!(repo.count_by_user(user_id).await.unwrap(), 3);
        assert_eq!(
            repo.count_by_status(user_id, ReadingStatus::ToRead).await.unwrap(),
            3
        );

        let all = repo.find_by_user(user_id).await.unwrap();
        assert_eq!(all[0].book_info().title(), "Emma");

        let range = repo
            .find_by_date_range(user_id, Utc::now() - Duration::hours(1), Utc::now())
            .await
            .unwrap();
        assert_eq!(range.len(), 3);
    }

    #[tokio::test]
    async fn test_recently_finished_ordered_by_finish_date() {
        let repo = repo().await;
        let user_id = Uuid::new_v4();

        for (id, days_ago) in [("old", 60), ("a", 5), ("b", 1)] {
            let mut book = new_book(id, id, "Author", user_id);
            book.mark_as_finished(Some(Utc::now() - Duration::days(days_ago)))
                .unwrap();
            repo.add(&book).await.unwrap();
        }

        let recent = repo.find_recently_finished(user_id, 30).await.unwrap();
        let ids: Vec<&str> = recent.iter().map(|b| b.book_id().as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_find_paged() {
        let repo = repo().await;
        let user_id = Uuid::new_v4();
        for i in 0..5 {
            repo.add(&new_book(&i.to_string(), &format!("Book {}", i), "Author", user_id))
                .await
                .unwrap();
        }

        let query = PagedQuery {
            page: 2,
            page_size: 2,
            ..Default::default()
        };
        let page = repo.find_paged(user_id, &query).await.unwrap();
        assert_eq!(page.total_count, 5);
        assert_eq!(page.items.len(), 2);
        assert!(page.has_next());

        let filtered = PagedQuery {
            status: Some(ReadingStatus::Finished),
            ..Default::default()
        };
        let empty = repo.find_paged(user_id, &filtered).await.unwrap();
        assert_eq!(empty.total_count, 0);
    }

    #[tokio::test]
    async fn test_delete_removes_sessions() {
        let repo = repo().await;
        let mut book = new_book("x", "A", "B", Uuid::new_v4());
        book.start_reading(None).unwrap();
        book.log_reading_session(Utc::now(), 0, 10, None, None).unwrap();
        repo.add(&book).await.unwrap();

        repo.delete(book.id()).await.unwrap();
        assert!(repo.get_by_id(book.id()).await.unwrap().is_none());

        let (orphans,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM reading_sessions")
            .fetch_one(&repo.pool)
            .await
            .unwrap();
        assert_eq!(orphans, 0);

        let again = repo.delete(book.id()).await;
        assert!(matches!(again, Err(RepositoryError::NotFound(_))));
    }
}
