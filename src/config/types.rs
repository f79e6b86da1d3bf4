//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use uuid::Uuid;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 数据库配置
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Google Books 配置
    #[serde(default)]
    pub google_books: GoogleBooksSettings,

    /// 缓存配置
    #[serde(default)]
    pub cache: CacheConfig,

    /// 书库配置
    #[serde(default)]
    pub library: LibraryConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 数据库配置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// 数据库文件路径
    #[serde(default = "default_db_path")]
    pub path: String,

    /// 最大连接数
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// 启动时执行迁移
    #[serde(default = "default_true")]
    pub auto_migrate: bool,

    /// 书库为空时写入示例数据
    #[serde(default)]
    pub seed_data: bool,
}

fn default_db_path() -> String {
    "data/reading_tracker.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_true() -> bool {
    true
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            max_connections: default_max_connections(),
            auto_migrate: true,
            seed_data: false,
        }
    }
}

impl DatabaseConfig {
    /// 获取数据库 URL
    pub fn database_url(&self) -> String {
        format!("sqlite:{}?mode=rwc", self.path)
    }
}

/// Google Books 配置
///
/// 关闭时使用内置的静态书目
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleBooksSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_google_books_url")]
    pub base_url: String,

    #[serde(default)]
    pub api_key: Option<String>,

    /// 请求超时时间（秒）
    #[serde(default = "default_google_books_timeout")]
    pub timeout_secs: u64,

    /// 网络错误或超时时的重试次数
    #[serde(default = "default_google_books_retries")]
    pub max_retries: u32,

    /// 未指定时的搜索结果数
    #[serde(default = "default_max_results")]
    pub default_max_results: u32,

    /// 单次请求允许的最大结果数
    #[serde(default = "default_max_results_limit")]
    pub max_results_limit: u32,
}

fn default_google_books_url() -> String {
    "https://www.googleapis.com/books/v1/volumes".to_string()
}

fn default_google_books_timeout() -> u64 {
    10
}

fn default_google_books_retries() -> u32 {
    1
}

fn default_max_results() -> u32 {
    10
}

fn default_max_results_limit() -> u32 {
    40
}

impl Default for GoogleBooksSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_google_books_url(),
            api_key: None,
            timeout_secs: default_google_books_timeout(),
            max_retries: default_google_books_retries(),
            default_max_results: default_max_results(),
            max_results_limit: default_max_results_limit(),
        }
    }
}

/// 缓存配置（秒）
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// 默认绝对过期时间
    #[serde(default = "default_cache_ttl")]
    pub default_ttl_secs: u64,

    /// 滑动过期时间，0 表示关闭
    #[serde(default = "default_sliding")]
    pub sliding_secs: u64,

    #[serde(default = "default_user_book_ttl")]
    pub user_book_ttl_secs: u64,

    #[serde(default = "default_search_ttl")]
    pub search_ttl_secs: u64,

    #[serde(default = "default_isbn_ttl")]
    pub isbn_ttl_secs: u64,

    /// 过期条目清理间隔，0 表示不清理
    #[serde(default = "default_purge_interval")]
    pub purge_interval_secs: u64,
}

fn default_cache_ttl() -> u64 {
    15 * 60
}

fn default_sliding() -> u64 {
    5 * 60
}

fn default_user_book_ttl() -> u64 {
    30 * 60
}

fn default_search_ttl() -> u64 {
    2 * 60 * 60
}

fn default_isbn_ttl() -> u64 {
    24 * 60 * 60
}

fn default_purge_interval() -> u64 {
    10 * 60
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_ttl_secs: default_cache_ttl(),
            sliding_secs: default_sliding(),
            user_book_ttl_secs: default_user_book_ttl(),
            search_ttl_secs: default_search_ttl(),
            isbn_ttl_secs: default_isbn_ttl(),
            purge_interval_secs: default_purge_interval(),
        }
    }
}

/// 书库配置
#[derive(Debug, Clone, Deserialize)]
pub struct LibraryConfig {
    /// 当前用户 ID（无认证）
    #[serde(default = "default_user_id")]
    pub default_user_id: Uuid,

    /// 年度阅读目标（本）
    #[serde(default = "default_yearly_goal")]
    pub yearly_goal: u32,
}

/// 固定的默认用户
pub const DEFAULT_USER_ID: Uuid = Uuid::from_u128(0x12345678_1234_1234_1234_123456789012);

fn default_user_id() -> Uuid {
    DEFAULT_USER_ID
}

fn default_yearly_goal() -> u32 {
    12
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            default_user_id: DEFAULT_USER_ID,
            yearly_goal: default_yearly_goal(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.database.path, "data/reading_tracker.db");
        assert!(config.database.auto_migrate);
        assert!(!config.database.seed_data);
        assert_eq!(config.google_books.max_results_limit, 40);
        assert_eq!(config.cache.search_ttl_secs, 7200);
        assert_eq!(config.library.yearly_goal, 12);
    }

    #[test]
    fn test_default_user_id() {
        assert_eq!(
            DEFAULT_USER_ID.to_string(),
            "12345678-1234-1234-1234-123456789012"
        );
    }

    #[test]
    fn test_server_addr() {
        let config = ServerConfig::default();
        assert_eq!(config.addr(), "0.0.0.0:5000");
    }

    #[test]
    fn test_database_url() {
        let config = DatabaseConfig::default();
        assert_eq!(
            config.database_url(),
            "sqlite:data/reading_tracker.db?mode=rwc"
        );
    }
}
