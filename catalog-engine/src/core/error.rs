//! 统一错误处理
//!
//! 错误分类对应引擎的失败语义：
//!
//! | 分类 | 说明 |
//! |------|------|
//! | Validation | 输入缺失 / 格式错误 / 超出范围 |
//! | NotFound | 商品、属性、值、店铺或变体不存在 |
//! | PermissionDenied | 全局 / 店铺归属越权 |
//! | Conflict | 变体键或属性值重复 |
//! | ExternalService | 索引服务不可达 (对调用方永远非致命) |
//! | Database | 文档存储错误 |

use thiserror::Error;

use crate::db::repository::RepoError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn permission(msg: impl Into<String>) -> Self {
        Self::PermissionDenied(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// 冲突或校验错误对文档存储无副作用
    ///
    /// 事务协调器用它判断失败是否需要文件补偿之外的处理
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => Self::NotFound(msg),
            RepoError::Duplicate(msg) => Self::Conflict(msg),
            RepoError::Validation(msg) => Self::Validation(msg),
            RepoError::Database(msg) => Self::Database(msg),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

/// 引擎操作的 Result 类型别名
pub type AppResult<T> = std::result::Result<T, AppError>;
