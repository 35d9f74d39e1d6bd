//! 积分服务错误类型
//!
//! 定义服务层的业务错误和系统错误

use thiserror::Error;

use crate::models::{ContentRef, ContentStatus};

/// 积分服务错误类型
#[derive(Debug, Error)]
pub enum EcoPointsError {
    // === 积分发放相关错误 ===
    #[error("无效的积分发放: points={points}，发放积分必须为正整数")]
    InvalidAward { points: i64 },

    #[error("用户不存在: {0}")]
    UserNotFound(String),

    #[error("用户已存在: {0}")]
    UserAlreadyExists(String),

    // === 审核相关错误 ===
    #[error("内容不存在: {0}")]
    ContentNotFound(ContentRef),

    #[error("内容不处于待审核状态: {content}, current_status={current}")]
    NotPending {
        content: ContentRef,
        current: ContentStatus,
    },

    #[error("内容尚未审核通过: {0}")]
    ContentNotApproved(ContentRef),

    #[error("权限不足: {operation}")]
    Forbidden { operation: String },

    // === 活动相关错误 ===
    #[error("用户已参与该活动: campaign_id={campaign_id}, user_id={user_id}")]
    AlreadyJoined { campaign_id: i64, user_id: String },

    // === 系统错误 ===
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JSON 序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("缓存错误: {0}")]
    Cache(String),

    #[error("内部错误: {0}")]
    Internal(String),

    #[error("参数校验失败: {0}")]
    Validation(String),
}

/// 积分服务 Result 类型别名
pub type Result<T> = std::result::Result<T, EcoPointsError>;

impl EcoPointsError {
    /// 检查是否为可重试的错误
    ///
    /// 积分发放和审核迁移都是整体原子提交，数据库错误时整体重试是安全的
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Cache(_))
    }

    /// 检查是否为业务错误（非系统错误）
    pub fn is_business_error(&self) -> bool {
        !matches!(
            self,
            Self::Database(_) | Self::Serialization(_) | Self::Cache(_) | Self::Internal(_)
        )
    }

    /// 获取错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAward { .. } => "INVALID_AWARD",
            Self::UserNotFound(_) => "USER_NOT_FOUND",
            Self::UserAlreadyExists(_) => "USER_ALREADY_EXISTS",
            Self::ContentNotFound(_) => "CONTENT_NOT_FOUND",
            Self::NotPending { .. } => "NOT_PENDING",
            Self::ContentNotApproved(_) => "CONTENT_NOT_APPROVED",
            Self::Forbidden { .. } => "FORBIDDEN",
            Self::AlreadyJoined { .. } => "ALREADY_JOINED",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Cache(_) => "CACHE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Validation(_) => "VALIDATION_ERROR",
        }
    }
}

impl From<eco_shared::error::SharedError> for EcoPointsError {
    fn from(err: eco_shared::error::SharedError) -> Self {
        use eco_shared::error::SharedError;

        match err {
            SharedError::Database(e) => Self::Database(e),
            SharedError::CacheSerialization(e) => Self::Serialization(e),
            SharedError::Redis(e) => Self::Cache(e.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}
