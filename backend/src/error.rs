use std::fmt;

use coursedesk_shared::protocol::EdgeErrorBody;
use serde::{Deserialize, Serialize};

// =========================================================
// 错误状态枚举
// =========================================================

/// 错误状态枚举
/// 包含错误对应的语义（状态码）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeErrorStatus {
    /// 400: 支付网关未配置（无记录、未启用或公钥为空）
    NotConfigured,
    /// 500: 运行时配置缺失（变量或密钥）
    Config,
    /// 500: 设置表无法访问或返回非 2xx
    Upstream,
    /// 500: 设置表返回的数据无法解析
    Serialization,
}

impl EdgeErrorStatus {
    pub fn status_code(&self) -> u16 {
        match self {
            EdgeErrorStatus::NotConfigured => 400,
            EdgeErrorStatus::Config | EdgeErrorStatus::Upstream | EdgeErrorStatus::Serialization => {
                500
            }
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            EdgeErrorStatus::NotConfigured => "PAYMENT_NOT_CONFIGURED",
            EdgeErrorStatus::Config => "MISSING_CONFIGURATION",
            EdgeErrorStatus::Upstream => "SETTINGS_UNAVAILABLE",
            EdgeErrorStatus::Serialization => "MALFORMED_SETTINGS",
        }
    }
}

// =========================================================
// 错误上下文追踪
// =========================================================

/// 结构化的错误追踪片段
/// 记录错误发生时的操作和相关细节
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorSpan {
    /// 操作名称，如 "settings.fetch"
    pub operation: String,
    /// 额外的细节信息，如表名、provider 等
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ErrorSpan {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            detail: None,
        }
    }

    pub fn with_detail(operation: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            detail: Some(detail.into()),
        }
    }
}

// =========================================================
// 核心错误类型
// =========================================================

/// 边缘函数错误
///
/// - status: 错误类型/语义
/// - message: 错误消息（4xx 时原样返回给客户端）
/// - source: 原始错误（可选，用于错误链）
/// - spans: 结构化的调用追踪栈（只写日志，不返回给客户端）
#[derive(Debug)]
pub struct EdgeError {
    pub status: EdgeErrorStatus,
    pub message: String,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
    spans: Vec<ErrorSpan>,
}

impl EdgeError {
    pub fn new(status: EdgeErrorStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            source: None,
            spans: Vec::new(),
        }
    }

    // --- Convenience constructors ---

    pub fn not_configured(message: impl Into<String>) -> Self {
        Self::new(EdgeErrorStatus::NotConfigured, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(EdgeErrorStatus::Config, message)
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::new(EdgeErrorStatus::Upstream, message)
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(EdgeErrorStatus::Serialization, message)
    }

    // --- Context builders ---

    /// 添加操作追踪（无额外细节）
    pub fn in_op(mut self, operation: impl Into<String>) -> Self {
        self.spans.push(ErrorSpan::new(operation));
        self
    }

    /// 添加操作追踪（带额外细节）
    pub fn in_op_with(mut self, operation: impl Into<String>, detail: impl Into<String>) -> Self {
        self.spans.push(ErrorSpan::with_detail(operation, detail));
        self
    }

    /// 设置原始错误源
    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // --- Accessors ---

    pub fn status_code(&self) -> u16 {
        self.status.status_code()
    }

    pub fn error_code(&self) -> &'static str {
        self.status.error_code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn spans(&self) -> &[ErrorSpan] {
        &self.spans
    }

    /// 返回给客户端的错误体，5xx 不暴露内部细节
    pub fn to_body(&self) -> EdgeErrorBody {
        let error = if self.status_code() >= 500 {
            "Internal Server Error".to_string()
        } else {
            self.message.clone()
        };
        EdgeErrorBody { error }
    }
}

// =========================================================
// Display & Error trait 实现
// =========================================================

impl fmt::Display for EdgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.error_code(), self.message)?;

        if !self.spans.is_empty() {
            write!(f, " | trace: ")?;
            for (i, span) in self.spans.iter().enumerate() {
                if i > 0 {
                    write!(f, " -> ")?;
                }
                write!(f, "{}", span.operation)?;
                if let Some(detail) = &span.detail {
                    write!(f, "({})", detail)?;
                }
            }
        }
        Ok(())
    }
}

impl std::error::Error for EdgeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

pub type EdgeResult<T> = std::result::Result<T, EdgeError>;

// =========================================================
// 类型转换实现
// =========================================================

impl From<worker::Error> for EdgeError {
    fn from(e: worker::Error) -> Self {
        EdgeError::upstream(e.to_string())
    }
}

impl From<serde_json::Error> for EdgeError {
    fn from(e: serde_json::Error) -> Self {
        EdgeError::serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(EdgeError::not_configured("x").status_code(), 400);
        assert_eq!(EdgeError::config("x").status_code(), 500);
        assert_eq!(EdgeError::upstream("x").status_code(), 500);
        assert_eq!(EdgeError::serialization("x").status_code(), 500);
    }

    #[test]
    fn test_display_includes_trace() {
        let err = EdgeError::upstream("connection reset")
            .in_op_with("settings.fetch", "payment_settings")
            .in_op("payment_key.lookup");
        assert_eq!(
            err.to_string(),
            "[SETTINGS_UNAVAILABLE] connection reset | trace: settings.fetch(payment_settings) -> payment_key.lookup"
        );
        assert_eq!(err.spans().len(), 2);
    }

    #[test]
    fn test_body_hides_internal_detail() {
        let client_err = EdgeError::not_configured("Paystack is not configured");
        assert_eq!(client_err.to_body().error, "Paystack is not configured");

        let server_err = EdgeError::upstream("secret host unreachable");
        assert_eq!(server_err.to_body().error, "Internal Server Error");
    }

    #[test]
    fn test_source_is_preserved() {
        let parse = serde_json::from_str::<u8>("x").unwrap_err();
        let err = EdgeError::serialization("bad row").with_source(parse);
        assert!(std::error::Error::source(&err).is_some());
    }
}
