//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::{AppConfig, DEFAULT_USER_ID};

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 环境变量前缀
const ENV_PREFIX: &str = "READING_TRACKER";

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `READING_TRACKER_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `READING_TRACKER_SERVER__PORT=8080`
/// - `READING_TRACKER_DATABASE__PATH=/data/reading_tracker.db`
/// - `READING_TRACKER_GOOGLE_BOOKS__API_KEY=...`
/// - `READING_TRACKER_LIBRARY__YEARLY_GOAL=24`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 5000)?
        .set_default("database.path", "data/reading_tracker.db")?
        .set_default("database.max_connections", 5)?
        .set_default("database.auto_migrate", true)?
        .set_default("database.seed_data", false)?
        .set_default("google_books.enabled", true)?
        .set_default(
            "google_books.base_url",
            "https://www.googleapis.com/books/v1/volumes",
        )?
        .set_default("google_books.timeout_secs", 10)?
        .set_default("google_books.max_retries", 1)?
        .set_default("google_books.default_max_results", 10)?
        .set_default("google_books.max_results_limit", 40)?
        .set_default("cache.enabled", true)?
        .set_default("cache.default_ttl_secs", 15 * 60)?
        .set_default("cache.sliding_secs", 5 * 60)?
        .set_default("cache.user_book_ttl_secs", 30 * 60)?
        .set_default("cache.search_ttl_secs", 2 * 60 * 60)?
        .set_default("cache.isbn_ttl_secs", 24 * 60 * 60)?
        .set_default("cache.purge_interval_secs", 10 * 60)?
        .set_default("library.default_user_id", DEFAULT_USER_ID.to_string())?
        .set_default("library.yearly_goal", 12)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级）
    // 注意: 环境变量名会被转换为小写
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.database.path.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "Database path cannot be empty".to_string(),
        ));
    }

    if config.database.max_connections == 0 {
        return Err(ConfigError::ValidationError(
            "Database max_connections must be at least 1".to_string(),
        ));
    }

    let books = &config.google_books;
    if books.enabled && books.base_url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "Google Books base_url cannot be empty when enabled".to_string(),
        ));
    }
    if !(1..=40).contains(&books.max_results_limit) {
        return Err(ConfigError::ValidationError(
            "Google Books max_results_limit must be between 1 and 40".to_string(),
        ));
    }
    if books.default_max_results == 0 || books.default_max_results > books.max_results_limit {
        return Err(ConfigError::ValidationError(format!(
            "Google Books default_max_results must be between 1 and {}",
            books.max_results_limit
        )));
    }

    if config.cache.enabled && config.cache.default_ttl_secs == 0 {
        return Err(ConfigError::ValidationError(
            "Cache default_ttl_secs cannot be 0 when cache is enabled".to_string(),
        ));
    }

    if config.library.default_user_id.is_nil() {
        return Err(ConfigError::ValidationError(
            "Library default_user_id cannot be the nil UUID".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}", config.server.addr());
    tracing::info!("Database: {}", config.database.path);
    tracing::info!("Database Max Connections: {}", config.database.max_connections);
    tracing::info!("Auto Migrate: {}", config.database.auto_migrate);
    tracing::info!("Seed Sample Data: {}", config.database.seed_data);
    tracing::info!("Google Books Enabled: {}", config.google_books.enabled);
    if config.google_books.enabled {
        tracing::info!("Google Books URL: {}", config.google_books.base_url);
        tracing::info!(
            "Google Books API Key: {}",
            if config.google_books.api_key.is_some() { "set" } else { "not set" }
        );
        tracing::info!("Google Books Timeout: {}s", config.google_books.timeout_secs);
    }
    tracing::info!("Cache Enabled: {}", config.cache.enabled);
    if config.cache.enabled {
        tracing::info!(
            "Cache TTL: {}s (sliding {}s)",
            config.cache.default_ttl_secs,
            config.cache.sliding_secs
        );
    }
    tracing::info!("Default User: {}", config.library.default_user_id);
    tracing::info!("Yearly Goal: {} books", config.library.yearly_goal);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}
