//! 统一的环境变量管理系统
//!
//! 提供类型安全、可验证的环境变量访问

use std::env;
use std::fmt;
use std::time::Duration;

/// 环境变量解析错误
#[derive(Debug, Clone)]
pub struct EnvError {
    pub variable: String,
    pub message: String,
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Environment variable '{}': {}", self.variable, self.message)
    }
}

impl std::error::Error for EnvError {}

pub type EnvResult<T> = Result<T, EnvError>;

/// 环境变量访问器特性
pub trait EnvVar<T> {
    const NAME: &'static str;
    const DEFAULT: Option<T>;
    const DESCRIPTION: &'static str;

    fn parse(value: &str) -> EnvResult<T>;

    fn get() -> EnvResult<T> {
        match env::var(Self::NAME) {
            Ok(value) => Self::parse(&value),
            Err(_) => {
                if let Some(default) = Self::DEFAULT {
                    Ok(default)
                } else {
                    Err(EnvError {
                        variable: Self::NAME.to_string(),
                        message: "Required environment variable not set".to_string(),
                    })
                }
            }
        }
    }

    fn get_or_default(default: T) -> T {
        Self::get().unwrap_or(default)
    }
}

/// 核心环境变量定义
pub mod core {
    use super::*;

    /// 日志级别
    pub struct LogLevel;
    impl EnvVar<String> for LogLevel {
        const NAME: &'static str = "EPUB_TRANSLATOR_LOG_LEVEL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Log level: trace, debug, info, warn, error";

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("info".to_string()),
            }
        }

        fn parse(value: &str) -> EnvResult<String> {
            match value.to_lowercase().as_str() {
                "trace" | "debug" | "info" | "warn" | "error" => Ok(value.to_lowercase()),
                _ => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!(
                        "Invalid log level '{}'. Use: trace, debug, info, warn, error",
                        value
                    ),
                }),
            }
        }
    }
}

/// 翻译服务端相关环境变量
pub mod provider {
    use super::*;

    /// API 密钥
    pub struct ApiKey;
    impl EnvVar<String> for ApiKey {
        const NAME: &'static str = "OPENROUTER_APIKEY";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "API key for the OpenRouter chat completions endpoint";

        fn parse(value: &str) -> EnvResult<String> {
            let key = value.trim();
            if key.is_empty() {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "API key cannot be empty".to_string(),
                });
            }
            Ok(key.to_string())
        }
    }

    /// API 基础地址
    pub struct BaseUrl;
    impl EnvVar<String> for BaseUrl {
        const NAME: &'static str = "EPUB_TRANSLATOR_BASE_URL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Base URL of the OpenAI-compatible provider API";

        fn parse(value: &str) -> EnvResult<String> {
            let url = value.trim().trim_end_matches('/');
            if url.starts_with("http://") || url.starts_with("https://") {
                Ok(url.to_string())
            } else {
                Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "API URL must start with http:// or https://".to_string(),
                })
            }
        }
    }

    /// 模型标识
    pub struct Model;
    impl EnvVar<String> for Model {
        const NAME: &'static str = "EPUB_TRANSLATOR_MODEL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Model identifier used for requests and cache keys";

        fn parse(value: &str) -> EnvResult<String> {
            let model = value.trim();
            if model.is_empty() {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Model cannot be empty".to_string(),
                });
            }
            Ok(model.to_string())
        }
    }

    /// 批次大小
    pub struct BatchSize;
    impl EnvVar<usize> for BatchSize {
        const NAME: &'static str = "EPUB_TRANSLATOR_BATCH_SIZE";
        const DEFAULT: Option<usize> = None;
        const DESCRIPTION: &'static str = "Maximum fragments per provider request";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_positive_usize(value, Self::NAME, 1, 1000)
        }
    }

    /// 批次间隔
    pub struct BatchDelay;
    impl EnvVar<Duration> for BatchDelay {
        const NAME: &'static str = "EPUB_TRANSLATOR_BATCH_DELAY_MS";
        const DEFAULT: Option<Duration> = None;
        const DESCRIPTION: &'static str = "Pause between consecutive chunks in milliseconds";

        fn parse(value: &str) -> EnvResult<Duration> {
            let millis: u64 = value.parse().map_err(|_| EnvError {
                variable: Self::NAME.to_string(),
                message: "Must be a valid number of milliseconds".to_string(),
            })?;

            if millis > 600_000 {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Delay too long (max 600000 ms)".to_string(),
                });
            }

            Ok(Duration::from_millis(millis))
        }
    }

    /// 最大尝试次数
    pub struct MaxAttempts;
    impl EnvVar<u32> for MaxAttempts {
        const NAME: &'static str = "EPUB_TRANSLATOR_MAX_ATTEMPTS";
        const DEFAULT: Option<u32> = None;
        const DESCRIPTION: &'static str = "Maximum attempts per chunk before giving up";

        fn parse(value: &str) -> EnvResult<u32> {
            parse_positive_usize(value, Self::NAME, 1, 20).map(|n| n as u32)
        }
    }
}

/// 存储相关环境变量
pub mod storage {
    use super::*;

    /// 缓存数据库路径
    pub struct DatabasePath;
    impl EnvVar<String> for DatabasePath {
        const NAME: &'static str = "EPUB_TRANSLATOR_DATABASE_PATH";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Path of the on-disk translation cache";

        fn parse(value: &str) -> EnvResult<String> {
            let path = value.trim();
            if path.is_empty() {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Path cannot be empty".to_string(),
                });
            }
            Ok(path.to_string())
        }
    }

    /// 默认是否使用缓存
    pub struct UseCache;
    impl EnvVar<bool> for UseCache {
        const NAME: &'static str = "EPUB_TRANSLATOR_USE_CACHE";
        const DEFAULT: Option<bool> = Some(true);
        const DESCRIPTION: &'static str = "Resolve fragments from the cache before calling the provider";

        fn parse(value: &str) -> EnvResult<bool> {
            parse_bool(value, Self::NAME)
        }
    }
}

/// 辅助函数
fn parse_bool(value: &str, var_name: &str) -> EnvResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "enabled" => Ok(true),
        "false" | "0" | "no" | "off" | "disabled" => Ok(false),
        _ => Err(EnvError {
            variable: var_name.to_string(),
            message: format!(
                "Invalid boolean value '{}'. Use: true/false, 1/0, yes/no, on/off, enabled/disabled",
                value
            ),
        }),
    }
}

fn parse_positive_usize(value: &str, var_name: &str, min: usize, max: usize) -> EnvResult<usize> {
    let num: usize = value.trim().parse().map_err(|_| EnvError {
        variable: var_name.to_string(),
        message: "Must be a valid positive number".to_string(),
    })?;

    if num < min {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} is below minimum {}", num, min),
        });
    }

    if num > max {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} exceeds maximum {}", num, max),
        });
    }

    Ok(num)
}

/// 环境变量文档生成器
pub fn generate_env_docs() -> String {
    let mut docs = String::new();
    docs.push_str("# Environment Variables Documentation\n\n");

    docs.push_str("## Core Configuration\n\n");
    docs.push_str(&format!(
        "- `{}`: {}\n",
        core::LogLevel::NAME,
        core::LogLevel::DESCRIPTION
    ));

    docs.push_str("\n## Provider Configuration\n\n");
    for (name, description) in [
        (provider::ApiKey::NAME, provider::ApiKey::DESCRIPTION),
        (provider::BaseUrl::NAME, provider::BaseUrl::DESCRIPTION),
        (provider::Model::NAME, provider::Model::DESCRIPTION),
        (provider::BatchSize::NAME, provider::BatchSize::DESCRIPTION),
        (provider::BatchDelay::NAME, provider::BatchDelay::DESCRIPTION),
        (provider::MaxAttempts::NAME, provider::MaxAttempts::DESCRIPTION),
    ] {
        docs.push_str(&format!("- `{}`: {}\n", name, description));
    }

    docs.push_str("\n## Storage Configuration\n\n");
    docs.push_str(&format!(
        "- `{}`: {}\n",
        storage::DatabasePath::NAME,
        storage::DatabasePath::DESCRIPTION
    ));
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        storage::UseCache::NAME,
        storage::UseCache::DESCRIPTION,
        storage::UseCache::DEFAULT
    ));

    docs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(core::LogLevel::parse("DEBUG").unwrap(), "debug");
        assert!(core::LogLevel::parse("loud").is_err());
    }

    #[test]
    fn test_boolean_parsing() {
        assert!(storage::UseCache::parse("true").unwrap());
        assert!(storage::UseCache::parse("YES").unwrap());
        assert!(!storage::UseCache::parse("0").unwrap());
        assert!(!storage::UseCache::parse("off").unwrap());

        assert!(storage::UseCache::parse("maybe").is_err());
    }

    #[test]
    fn test_url_validation() {
        assert_eq!(
            provider::BaseUrl::parse("https://openrouter.ai/api/v1/").unwrap(),
            "https://openrouter.ai/api/v1"
        );
        assert!(provider::BaseUrl::parse("ftp://example.com").is_err());
    }

    #[test]
    fn test_numeric_validation() {
        assert_eq!(provider::BatchSize::parse("80").unwrap(), 80);
        assert!(provider::BatchSize::parse("0").is_err());
        assert!(provider::MaxAttempts::parse("50").is_err());
        assert_eq!(
            provider::BatchDelay::parse("250").unwrap(),
            Duration::from_millis(250)
        );
    }

    #[test]
    fn test_docs_mention_every_variable() {
        let docs = generate_env_docs();
        assert!(docs.contains("OPENROUTER_APIKEY"));
        assert!(docs.contains("EPUB_TRANSLATOR_DATABASE_PATH"));
    }
}
