//! 配置管理器
//!
//! 提供统一的配置接口，支持文件配置、环境变量和默认值。
//! 配置值显式传入各组件的构造函数，不存在全局配置。

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::constants;
use crate::translation::error::{TranslationError, TranslationResult};

/// 重试策略配置
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    /// 指数退避的基数（第一次等待前的乘数）
    pub initial_wait_ms: u64,
    pub min_wait_ms: u64,
    pub max_wait_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: constants::DEFAULT_MAX_ATTEMPTS,
            initial_wait_ms: constants::DEFAULT_INITIAL_WAIT_MS,
            min_wait_ms: constants::DEFAULT_MIN_WAIT_MS,
            max_wait_ms: constants::DEFAULT_MAX_WAIT_MS,
        }
    }
}

/// 翻译配置
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TranslatorConfig {
    // 服务端配置
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub request_timeout_secs: u64,

    // 持久化配置
    pub database_path: String,

    // 提取配置
    pub target_tags: Vec<String>,
    pub placeholder_prefix: String,
    pub placeholder_width: usize,
    pub strict_rebuild: bool,

    // 批次配置
    pub batch_size: usize,
    pub batch_delay_ms: u64,

    pub retry: RetryConfig,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: constants::DEFAULT_BASE_URL.to_string(),
            model: constants::DEFAULT_MODEL.to_string(),
            request_timeout_secs: constants::DEFAULT_REQUEST_TIMEOUT_SECS,

            database_path: constants::DEFAULT_DATABASE_PATH.to_string(),

            target_tags: constants::DEFAULT_TARGET_TAGS
                .iter()
                .map(|tag| tag.to_string())
                .collect(),
            placeholder_prefix: constants::DEFAULT_PLACEHOLDER_PREFIX.to_string(),
            placeholder_width: constants::DEFAULT_PLACEHOLDER_WIDTH,
            strict_rebuild: false,

            batch_size: constants::DEFAULT_BATCH_SIZE,
            batch_delay_ms: constants::DEFAULT_BATCH_DELAY_MS,

            retry: RetryConfig::default(),
        }
    }
}

impl TranslatorConfig {
    /// 验证配置
    pub fn validate(&self) -> TranslationResult<()> {
        if self.batch_size == 0 {
            return Err(TranslationError::Config("批次大小不能为0".to_string()));
        }

        if self.target_tags.is_empty() {
            return Err(TranslationError::Config("目标标签列表不能为空".to_string()));
        }

        if self.placeholder_prefix.trim().is_empty() {
            return Err(TranslationError::Config("占位符前缀不能为空".to_string()));
        }

        if self.placeholder_width == 0 || self.placeholder_width > constants::MAX_PLACEHOLDER_WIDTH {
            return Err(TranslationError::Config(format!(
                "占位符宽度必须在 1..={} 之间",
                constants::MAX_PLACEHOLDER_WIDTH
            )));
        }

        if self.retry.max_attempts == 0 {
            return Err(TranslationError::Config("最大尝试次数不能为0".to_string()));
        }

        if self.retry.min_wait_ms > self.retry.max_wait_ms {
            return Err(TranslationError::Config(
                "最小等待时间不能大于最大等待时间".to_string(),
            ));
        }

        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(TranslationError::Config(format!(
                "API地址必须以 http:// 或 https:// 开头: {}",
                self.base_url
            )));
        }

        Ok(())
    }

    /// 应用环境变量覆盖
    pub fn apply_env_overrides(&mut self) {
        use crate::env::{provider, storage, EnvVar};

        if let Ok(api_key) = provider::ApiKey::get() {
            self.api_key = Some(api_key);
        }

        if let Ok(base_url) = provider::BaseUrl::get() {
            tracing::info!("环境变量覆盖 API URL: {}", base_url);
            self.base_url = base_url;
        }

        if let Ok(model) = provider::Model::get() {
            self.model = model;
        }

        if let Ok(batch_size) = provider::BatchSize::get() {
            self.batch_size = batch_size;
        }

        if let Ok(delay) = provider::BatchDelay::get() {
            self.batch_delay_ms = delay.as_millis() as u64;
        }

        if let Ok(attempts) = provider::MaxAttempts::get() {
            self.retry.max_attempts = attempts;
        }

        if let Ok(path) = storage::DatabasePath::get() {
            self.database_path = shellexpand::tilde(&path).into_owned();
        }
    }

    /// 转换为Duration类型
    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// 配置管理器
pub struct ConfigManager {
    config: TranslatorConfig,
    source: Option<PathBuf>,
}

impl ConfigManager {
    /// 从默认搜索路径加载配置
    pub fn load() -> TranslationResult<Self> {
        Self::load_dotenv();

        for path in constants::CONFIG_PATHS {
            let expanded = shellexpand::tilde(path);
            let candidate = Path::new(expanded.as_ref());
            if candidate.exists() {
                return Self::from_file(candidate);
            }
        }

        tracing::info!("未找到配置文件，使用默认配置");
        Self::finish(TranslatorConfig::default(), None)
    }

    /// 从指定文件加载配置
    pub fn from_file(path: &Path) -> TranslationResult<Self> {
        Self::load_dotenv();
        tracing::info!("加载配置文件: {}", path.display());

        let content = std::fs::read_to_string(path).map_err(|e| {
            TranslationError::Config(format!("读取配置文件失败 {}: {}", path.display(), e))
        })?;
        let config: TranslatorConfig = toml::from_str(&content)?;

        Self::finish(config, Some(path.to_path_buf()))
    }

    fn finish(mut config: TranslatorConfig, source: Option<PathBuf>) -> TranslationResult<Self> {
        config.apply_env_overrides();
        config.validate()?;
        Ok(Self { config, source })
    }

    /// 获取配置
    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    /// 配置来源文件（若有）
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn into_config(self) -> TranslatorConfig {
        self.config
    }

    /// 加载 .env 文件
    fn load_dotenv() {
        for env_file in constants::ENV_FILES {
            if Path::new(env_file).exists() && dotenv::from_filename(env_file).is_ok() {
                tracing::debug!("已加载环境变量文件: {}", env_file);
                break;
            }
        }
    }

    /// 生成示例配置文件
    pub fn generate_example_config(path: &Path) -> TranslationResult<()> {
        let content = toml::to_string_pretty(&TranslatorConfig::default())
            .map_err(|e| TranslationError::Config(format!("序列化配置失败: {}", e)))?;

        std::fs::write(path, content)?;
        Ok(())
    }
}
