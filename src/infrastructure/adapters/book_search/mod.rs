//! Book Search Adapters - 书目检索实现

mod cached;
mod google_books;
mod static_catalog;

pub use cached::{CachedBookSearch, DEFAULT_ISBN_TTL, DEFAULT_SEARCH_TTL};
pub use google_books::{GoogleBooksClient, GoogleBooksConfig};
pub use static_catalog::StaticBookCatalog;
