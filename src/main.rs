//! Reading Tracker - 个人阅读追踪服务
//!
//! 启动流程：配置 -> 日志 -> 数据库 -> 仓储/缓存 -> 书目检索 -> HTTP

use std::sync::Arc;
use std::time::Duration;

use reading_tracker::application::{BookSearchPort, UserBookRepositoryPort};
use reading_tracker::config::{load_config, print_config, AppConfig};
use reading_tracker::domain::library::{BookInfo, UserBook};
use reading_tracker::infrastructure::adapters::book_search::{
    CachedBookSearch, GoogleBooksClient, GoogleBooksConfig, StaticBookCatalog,
};
use reading_tracker::infrastructure::events::EventPublisher;
use reading_tracker::infrastructure::http::{AppState, HttpServer, LibrarySettings, ServerConfig};
use reading_tracker::infrastructure::memory::InMemoryCache;
use reading_tracker::infrastructure::persistence::sqlite::{
    create_pool, run_migrations, seed_sample_data, DatabaseConfig,
};
use reading_tracker::infrastructure::persistence::{
    CachedUserBookRepository, SqliteUserBookRepository,
};

/// 过期缓存清理函数
type Purger = Box<dyn Fn() -> usize + Send + Sync>;

fn init_tracing(config: &AppConfig) {
    let log_filter = format!(
        "{},reading_tracker={},tower_http=debug,sqlx=warn",
        config.log.level, config.log.level
    );
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if config.log.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn cache<V: Clone + Send + Sync>(config: &AppConfig) -> Arc<InMemoryCache<V>> {
    let sliding = match config.cache.sliding_secs {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    };
    InMemoryCache::new(Duration::from_secs(config.cache.default_ttl_secs), sliding).arc()
}

fn build_book_search(
    config: &AppConfig,
    purgers: &mut Vec<Purger>,
) -> anyhow::Result<Arc<dyn BookSearchPort>> {
    let settings = &config.google_books;
    let source: Arc<dyn BookSearchPort> = if settings.enabled {
        let mut client_config = GoogleBooksConfig::new(&settings.base_url)
            .with_timeout(settings.timeout_secs);
        client_config.max_results_limit = settings.max_results_limit;
        client_config.max_retries = settings.max_retries;
        if let Some(key) = &settings.api_key {
            client_config = client_config.with_api_key(key);
        }
        Arc::new(GoogleBooksClient::new(client_config)?)
    } else {
        tracing::info!("Google Books disabled, using the built-in catalog");
        Arc::new(StaticBookCatalog::with_sample_books())
    };

    if !config.cache.enabled {
        return Ok(source);
    }

    let searches = cache::<Vec<BookInfo>>(config);
    let isbns = cache::<BookInfo>(config);
    {
        let searches = searches.clone();
        let isbns = isbns.clone();
        purgers.push(Box::new(move || searches.purge_expired() + isbns.purge_expired()));
    }

    Ok(Arc::new(
        CachedBookSearch::new(source, searches, isbns).with_ttls(
            Duration::from_secs(config.cache.search_ttl_secs),
            Duration::from_secs(config.cache.isbn_ttl_secs),
        ),
    ))
}

fn build_repository(
    config: &AppConfig,
    sqlite: Arc<SqliteUserBookRepository>,
    purgers: &mut Vec<Purger>,
) -> Arc<dyn UserBookRepositoryPort> {
    if !config.cache.enabled {
        return sqlite;
    }

    let books = cache::<UserBook>(config);
    let lists = cache::<Vec<UserBook>>(config);
    {
        let books = books.clone();
        let lists = lists.clone();
        purgers.push(Box::new(move || books.purge_expired() + lists.purge_expired()));
    }

    Arc::new(
        CachedUserBookRepository::new(sqlite, books, lists)
            .with_ttl(Duration::from_secs(config.cache.user_book_ttl_secs)),
    )
}

/// 定期清理过期缓存条目
fn spawn_cache_purge(interval_secs: u64, purgers: Vec<Purger>) {
    if interval_secs == 0 || purgers.is_empty() {
        return;
    }

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let purged: usize = purgers.iter().map(|purge| purge()).sum();
            tracing::debug!(purged = purged, "Cache purge completed");
        }
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Reading Tracker starting");
    print_config(&config);

    // 确保数据目录存在
    if let Some(parent) = std::path::Path::new(&config.database.path).parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    // 初始化数据库
    let db_config = DatabaseConfig {
        database_url: config.database.database_url(),
        max_connections: config.database.max_connections,
    };
    let pool = create_pool(&db_config).await?;
    if config.database.auto_migrate {
        run_migrations(&pool).await?;
    }

    let mut purgers: Vec<Purger> = Vec::new();

    // 仓储（可选缓存装饰）
    let sqlite_repo = Arc::new(SqliteUserBookRepository::new(pool.clone()));
    let repo = build_repository(&config, sqlite_repo, &mut purgers);

    let user_id = config.library.default_user_id;
    if config.database.seed_data {
        let seeded = seed_sample_data(repo.as_ref(), user_id).await?;
        tracing::info!(seeded = seeded, "Sample data seeding finished");
    }

    // 书目检索
    let book_search = build_book_search(&config, &mut purgers)?;

    spawn_cache_purge(config.cache.purge_interval_secs, purgers);

    // 事件发布器
    let event_publisher = EventPublisher::new().arc();

    let settings = LibrarySettings {
        current_user_id: user_id,
        yearly_goal: config.library.yearly_goal,
        default_max_results: config.google_books.default_max_results,
    };
    let state = AppState::new(settings, repo, book_search, event_publisher);

    let server_config = ServerConfig::new(&config.server.host, config.server.port);
    let server = HttpServer::new(server_config, state);

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    pool.close().await;
    tracing::info!("Server shutdown complete");

    Ok(())
}
