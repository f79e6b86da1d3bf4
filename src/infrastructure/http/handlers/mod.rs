//! HTTP Handlers

mod book_search;
mod ping;
mod statistics;
mod user_books;

pub use book_search::*;
pub use ping::*;
pub use statistics::*;
pub use user_books::*;
