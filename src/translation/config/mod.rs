//! 翻译配置管理模块
//!
//! 提供显式的配置值，支持环境变量、配置文件和默认值

pub mod manager;

// 重新导出主要类型
pub use manager::{ConfigManager, RetryConfig, TranslatorConfig};

/// 配置常量
pub mod constants {
    // 服务端设置
    pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
    pub const DEFAULT_MODEL: &str = "mistralai/devstral-2512:free";
    pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;

    // 持久化设置
    pub const DEFAULT_DATABASE_PATH: &str = "translations_cache.db";

    // 提取设置
    pub const DEFAULT_TARGET_TAGS: &[&str] = &[
        "p", "h1", "h2", "h3", "h4", "h5", "h6", "li", "blockquote", "dt", "dd", "caption",
    ];
    pub const DEFAULT_PLACEHOLDER_PREFIX: &str = "REF_";
    pub const DEFAULT_PLACEHOLDER_WIDTH: usize = 6;
    pub const MAX_PLACEHOLDER_WIDTH: usize = 12;

    // 批次处理相关
    pub const DEFAULT_BATCH_SIZE: usize = 80;
    pub const DEFAULT_BATCH_DELAY_MS: u64 = 3000;

    // 重试相关
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
    pub const DEFAULT_INITIAL_WAIT_MS: u64 = 1000;
    pub const DEFAULT_MIN_WAIT_MS: u64 = 4000;
    pub const DEFAULT_MAX_WAIT_MS: u64 = 60_000;

    // 配置文件搜索路径
    pub const CONFIG_PATHS: &[&str] = &[
        "epub-translator.toml",
        ".epub-translator.toml",
        "~/.config/epub-translator/config.toml",
        "/etc/epub-translator/config.toml",
    ];

    pub const ENV_FILES: &[&str] = &[".env.local", ".env"];
}

/// 便利函数
pub fn config_file_exists() -> bool {
    constants::CONFIG_PATHS
        .iter()
        .any(|path| std::path::Path::new(shellexpand::tilde(path).as_ref()).exists())
}
