//! 翻译模块统一错误处理
//!
//! 提供结构化错误类型和重试判定

use std::collections::BTreeSet;
use std::fmt;

use thiserror::Error;

/// 校验失败的具体原因
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// 返回的ID集合与发送的ID集合不一致
    #[error("ID Mismatch. Missing: {}, Extra: {}", format_ids(.missing), format_ids(.extra))]
    IdMismatch {
        missing: BTreeSet<String>,
        extra: BTreeSet<String>,
    },

    /// 同一个ID在返回结果中出现了多次
    #[error("ID Duplicated: {}", format_ids(.0))]
    Duplicated(BTreeSet<String>),

    /// 其他校验器拒绝了译文
    #[error("译文被拒绝: {0}")]
    Rejected(String),
}

fn format_ids(ids: &BTreeSet<String>) -> String {
    let joined: Vec<&str> = ids.iter().map(String::as_str).collect();
    format!("{{{}}}", joined.join(", "))
}

/// 翻译错误类型
#[derive(Error, Debug)]
pub enum TranslationError {
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 服务端返回了非2xx状态码
    #[error("HTTP错误 {status}: {body}")]
    Http { status: u16, body: String },

    /// 网络错误
    #[error("网络错误: {0}")]
    Network(String),

    /// 译文校验失败
    #[error("校验失败: {0}")]
    Validation(#[from] ValidationError),

    /// 响应无法解析
    #[error("响应格式错误: {0}")]
    MalformedResponse(String),

    /// 缓存错误
    #[error("缓存错误: {0}")]
    Cache(String),

    /// 文档加载或解析错误
    #[error("文档错误: {0}")]
    Document(String),

    /// 骨架中存在占位符，但译文中缺少对应片段
    #[error("缺少片段译文: {0}")]
    MissingFragment(String),

    /// 译文中的片段ID在骨架中不存在
    #[error("骨架中不存在片段: {0}")]
    UnknownFragment(String),

    /// IO错误
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),
}

impl TranslationError {
    /// 检查错误是否可重试
    ///
    /// 只有限流 (429)、服务端错误 (5xx) 和校验失败会被重试。
    pub fn is_retryable(&self) -> bool {
        match self {
            TranslationError::Http { status, .. } => *status == 429 || (500..600).contains(status),
            TranslationError::Validation(_) => true,
            _ => false,
        }
    }

    /// 获取错误类别
    pub fn category(&self) -> ErrorCategory {
        match self {
            TranslationError::Config(_) => ErrorCategory::Configuration,
            TranslationError::Http { status: 429, .. } => ErrorCategory::RateLimit,
            TranslationError::Http { .. } => ErrorCategory::Service,
            TranslationError::Network(_) => ErrorCategory::Network,
            TranslationError::Validation(_) => ErrorCategory::Validation,
            TranslationError::MalformedResponse(_) => ErrorCategory::Parsing,
            TranslationError::Cache(_) => ErrorCategory::Cache,
            TranslationError::Document(_)
            | TranslationError::MissingFragment(_)
            | TranslationError::UnknownFragment(_) => ErrorCategory::Document,
            TranslationError::Io(_) => ErrorCategory::Io,
        }
    }

    /// 获取错误的严重程度
    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Configuration | ErrorCategory::Cache => ErrorSeverity::Critical,
            ErrorCategory::RateLimit | ErrorCategory::Validation => ErrorSeverity::Warning,
            _ => ErrorSeverity::Error,
        }
    }
}

/// 错误严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    Warning,
    Error,
    Critical,
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Configuration,
    Network,
    RateLimit,
    Service,
    Validation,
    Parsing,
    Cache,
    Document,
    Io,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCategory::Configuration => "configuration",
            ErrorCategory::Network => "network",
            ErrorCategory::RateLimit => "rate-limit",
            ErrorCategory::Service => "service",
            ErrorCategory::Validation => "validation",
            ErrorCategory::Parsing => "parsing",
            ErrorCategory::Cache => "cache",
            ErrorCategory::Document => "document",
            ErrorCategory::Io => "io",
        };
        f.write_str(name)
    }
}

impl From<reqwest::Error> for TranslationError {
    fn from(error: reqwest::Error) -> Self {
        match error.status() {
            Some(status) => TranslationError::Http {
                status: status.as_u16(),
                body: error.to_string(),
            },
            None if error.is_decode() => TranslationError::MalformedResponse(error.to_string()),
            None => TranslationError::Network(error.to_string()),
        }
    }
}

impl From<serde_json::Error> for TranslationError {
    fn from(error: serde_json::Error) -> Self {
        TranslationError::MalformedResponse(format!("JSON解析错误: {}", error))
    }
}

impl From<toml::de::Error> for TranslationError {
    fn from(error: toml::de::Error) -> Self {
        TranslationError::Config(format!("TOML解析错误: {}", error))
    }
}

impl From<redb::Error> for TranslationError {
    fn from(error: redb::Error) -> Self {
        TranslationError::Cache(error.to_string())
    }
}

macro_rules! redb_error_into_cache {
    ($($source:ty),* $(,)?) => {
        $(
            impl From<$source> for TranslationError {
                fn from(error: $source) -> Self {
                    TranslationError::Cache(error.to_string())
                }
            }
        )*
    };
}

redb_error_into_cache!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);

impl From<zip::result::ZipError> for TranslationError {
    fn from(error: zip::result::ZipError) -> Self {
        TranslationError::Document(format!("EPUB容器错误: {}", error))
    }
}

impl From<quick_xml::Error> for TranslationError {
    fn from(error: quick_xml::Error) -> Self {
        TranslationError::Document(format!("XML解析错误: {}", error))
    }
}

/// 错误结果类型别名
pub type TranslationResult<T> = Result<T, TranslationError>;

/// 错误处理助手函数
pub mod helpers {
    use super::*;

    /// 按严重程度记录错误
    pub fn log_error(error: &TranslationError) {
        match error.severity() {
            ErrorSeverity::Warning => {
                tracing::warn!(category = %error.category(), "翻译警告: {}", error)
            }
            ErrorSeverity::Error => {
                tracing::error!(category = %error.category(), "翻译错误: {}", error)
            }
            ErrorSeverity::Critical => {
                tracing::error!(category = %error.category(), "翻译严重错误: {}", error)
            }
        }
    }

    /// 创建配置错误
    pub fn config_error<T: fmt::Display>(msg: T) -> TranslationError {
        TranslationError::Config(msg.to_string())
    }

    /// 创建缓存错误
    pub fn cache_error<T: fmt::Display>(msg: T) -> TranslationError {
        TranslationError::Cache(msg.to_string())
    }

    /// 创建文档错误
    pub fn document_error<T: fmt::Display>(msg: T) -> TranslationError {
        TranslationError::Document(msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_retryable_statuses() {
        let rate_limited = TranslationError::Http { status: 429, body: String::new() };
        let server_error = TranslationError::Http { status: 503, body: String::new() };
        let bad_request = TranslationError::Http { status: 400, body: String::new() };

        assert!(rate_limited.is_retryable());
        assert!(server_error.is_retryable());
        assert!(!bad_request.is_retryable());
        assert_eq!(rate_limited.category(), ErrorCategory::RateLimit);
    }

    #[test]
    fn test_validation_is_retryable_but_parsing_is_not() {
        let mismatch = TranslationError::from(ValidationError::IdMismatch {
            missing: ids(&["REF_001"]),
            extra: ids(&["REF_999"]),
        });
        let malformed = TranslationError::MalformedResponse("not json".to_string());
        let network = TranslationError::Network("connection refused".to_string());

        assert!(mismatch.is_retryable());
        assert!(!malformed.is_retryable());
        assert!(!network.is_retryable());
    }

    #[test]
    fn test_mismatch_message_lists_ids() {
        let error = ValidationError::IdMismatch {
            missing: ids(&["REF_001"]),
            extra: ids(&["REF_999"]),
        };

        assert_eq!(
            error.to_string(),
            "ID Mismatch. Missing: {REF_001}, Extra: {REF_999}"
        );
    }

    #[test]
    fn test_cache_errors_are_critical() {
        let error = helpers::cache_error("disk full");
        assert_eq!(error.severity(), ErrorSeverity::Critical);
        assert!(!error.is_retryable());
    }
}
