//! 翻译模块
//!
//! 采用清晰的模块化架构：
//! - **core**: 远程客户端、重试策略和编排服务
//! - **pipeline**: 批次划分和译文校验
//! - **storage**: 译文缓存
//! - **config**: 配置管理
//! - **error**: 错误处理
//!
//! # 基本用法
//!
//! ```rust,no_run
//! use epub_translator::translation::{
//!     ConfigManager, FragmentList, OpenRouterClient, RedbCache, TranslationService,
//! };
//!
//! # fn example(fragments: FragmentList) -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigManager::load()?.into_config();
//! let mut client = OpenRouterClient::new(&config)?;
//! client.fetch_model_prices();
//!
//! let cache = RedbCache::open(&config.database_path)?;
//! let mut service = TranslationService::new(client, cache);
//! let translated = service.translate("book.epub", &fragments, "spanish", true)?;
//! # let _ = translated;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// 子模块声明
// ============================================================================

/// 配置管理模块
pub mod config;

/// 核心模块 - 客户端、重试和编排服务
pub mod core;

/// 错误处理模块 - 统一的错误类型和处理机制
pub mod error;

/// 数据模型 - 片段、片段列表和用量统计
pub mod model;

/// 文本处理管道模块 - 批次划分和校验
pub mod pipeline;

/// 系统提示词
pub mod prompts;

/// 存储管理模块
pub mod storage;

/// token 估算
pub mod tokens;

// ============================================================================
// 核心API导出
// ============================================================================

pub use config::{constants, ConfigManager, RetryConfig, TranslatorConfig};

pub use self::core::{ModelPrices, OpenRouterClient, RetryPolicy, TranslationService, TranslatorClient};

pub use error::{
    ErrorCategory, ErrorSeverity, TranslationError, TranslationResult, ValidationError,
};

pub use model::{Fragment, FragmentList, UsageStatistics};

pub use pipeline::{
    CompositeValidator, IdAlignmentValidator, LengthRatioValidator, TranslationValidator,
};

pub use storage::{CacheRepository, MemoryCache, RedbCache};

pub use tokens::{estimate_cost, HeuristicEstimator, TokenEstimator};
