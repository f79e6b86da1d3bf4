//! SQLite Database - 数据库连接和迁移

use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};
use std::path::Path;

/// 数据库配置
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// 数据库连接串
    pub database_url: String,
    /// 最大连接数
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite:./data/reading_tracker.db?mode=rwc".to_string(),
            max_connections: 5,
        }
    }
}

impl DatabaseConfig {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            database_url: format!("sqlite:{}?mode=rwc", path.as_ref().display()),
            max_connections: 5,
        }
    }

    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections.max(1);
        self
    }

    /// 内存数据库只能用单连接，否则每个连接各是一个库
    pub fn in_memory() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 1,
        }
    }
}

/// 数据库连接池
pub type DbPool = Pool<Sqlite>;

/// 创建数据库连接池
pub async fn create_pool(config: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;

    // WAL 模式，读写互不阻塞
    sqlx::query("PRAGMA journal_mode=WAL")
        .execute(&pool)
        .await?;

    sqlx::query("PRAGMA busy_timeout=5000")
        .execute(&pool)
        .await?;

    sqlx::query("PRAGMA synchronous=NORMAL")
        .execute(&pool)
        .await?;

    tracing::info!(
        max_connections = config.max_connections,
        "SQLite pool created with WAL mode and busy_timeout=5000ms"
    );

    Ok(pool)
}

/// 运行数据库迁移
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    // user_books: 聚合根，version 用于乐观锁
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_books (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            book_id TEXT NOT NULL,
            title TEXT NOT NULL,
            author TEXT NOT NULL,
            isbn TEXT,
            publisher TEXT,
            publication_year INTEGER,
            total_pages INTEGER,
            genre TEXT,
            description TEXT,
            cover_image_url TEXT,
            status TEXT NOT NULL DEFAULT 'to_read',
            current_page INTEGER NOT NULL DEFAULT 0,
            added_date TEXT NOT NULL,
            started_date TEXT,
            finished_date TEXT,
            personal_notes TEXT,
            personal_rating INTEGER,
            version INTEGER NOT NULL DEFAULT 0,
            UNIQUE (user_id, book_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // reading_sessions: 按 seq 保持记录顺序
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS reading_sessions (
            id TEXT PRIMARY KEY,
            user_book_id TEXT NOT NULL,
            seq INTEGER NOT NULL,
            start_date TEXT NOT NULL,
            end_date TEXT,
            start_page INTEGER NOT NULL,
            end_page INTEGER NOT NULL,
            notes TEXT,
            created_at TEXT NOT NULL,
            FOREIGN KEY (user_book_id) REFERENCES user_books(id) ON DELETE CASCADE,
            UNIQUE (user_book_id, seq)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_user_books_user_status
        ON user_books(user_id, status)
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_user_books_user_added
        ON user_books(user_id, added_date)
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_reading_sessions_user_book_id
        ON reading_sessions(user_book_id)
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database migrations completed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&pool).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('user_books', 'reading_sessions')",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_file_database_url() {
        let config = DatabaseConfig::new("/tmp/books.db").with_max_connections(0);
        assert_eq!(config.database_url, "sqlite:/tmp/books.db?mode=rwc");
        assert_eq!(config.max_connections, 1);
    }
}
