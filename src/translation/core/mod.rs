//! 翻译核心模块
//!
//! 远程客户端、重试策略和编排服务

pub mod client;
pub mod retry;
pub mod service;

pub use client::{ModelPrices, OpenRouterClient, TranslatorClient};
pub use retry::RetryPolicy;
pub use service::TranslationService;
