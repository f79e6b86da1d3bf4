//! Library Context - Errors

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LibraryError {
    /// 参数不合法（值对象校验失败）
    #[error("无效的参数: {0}")]
    InvalidArgument(String),

    /// 当前状态下不允许的操作
    #[error("无效的操作: {0}")]
    InvalidOperation(String),
}

impl LibraryError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation(message.into())
    }
}
