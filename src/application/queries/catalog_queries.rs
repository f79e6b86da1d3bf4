//! Catalog Queries - 外部书目检索

/// 按关键字搜索书目
#[derive(Debug, Clone)]
pub struct SearchCatalog {
    pub query: String,
    pub max_results: Option<u32>,
}

/// 按 ISBN 查找书目
#[derive(Debug, Clone)]
pub struct GetCatalogBookByIsbn {
    pub isbn: String,
}
