//! 客户端错误分类
//!
//! 传输层只负责分类与上报，不产生任何状态副作用。

use thiserror::Error;

/// 传输层错误（请求未能得到 HTTP 响应）
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    #[error("request build failed: {0}")]
    RequestBuild(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("response read failed: {0}")]
    ResponseRead(String),
}

/// API 调用错误，按 HTTP 状态分类
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// 401：凭据无效或缺失
    #[error("authentication required")]
    Unauthorized,
    /// 403
    #[error("forbidden: {message}")]
    Forbidden { message: String },
    /// 404
    #[error("not found: {message}")]
    NotFound { message: String },
    /// 422：字段级校验错误，`errors` 原样保留给 UI
    #[error("validation failed")]
    Validation { errors: serde_json::Value },
    /// 其他非 2xx 状态（含 5xx）
    #[error("server responded with {status}: {message}")]
    Status { status: u16, message: String },
    #[error(transparent)]
    Network(#[from] TransportError),
    /// 响应体无法解析为期望的类型
    #[error("invalid response payload: {0}")]
    Decode(String),
    /// 请求体无法序列化
    #[error("invalid request payload: {0}")]
    Encode(String),
}

impl ApiError {
    /// 对应的 HTTP 状态码（非 HTTP 错误返回 `None`）
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized => Some(401),
            ApiError::Forbidden { .. } => Some(403),
            ApiError::NotFound { .. } => Some(404),
            ApiError::Validation { .. } => Some(422),
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Network(_) | ApiError::Decode(_) | ApiError::Encode(_) => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
