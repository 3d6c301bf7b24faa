//! # EPUB Translator Library
//!
//! 把 EPUB/HTML 文档中的文本片段交给远程模型翻译，并在保留全部标记结构的前提下
//! 重建文档。
//!
//! ## 模块组织
//!
//! - `core` - 端到端翻译流程
//! - `env` - 类型化的环境变量
//! - `epub` - EPUB 容器读取
//! - `parsers` - HTML 结构提取与重建
//! - `translation` - 客户端、缓存、编排服务和配置

pub mod core;
pub mod env;
pub mod epub;
pub mod parsers;
pub mod translation;

// Re-export commonly used items for convenience
pub use crate::core::{translate_document, DocumentOutcome, DocumentRequest};
pub use parsers::{Skeleton, StructureProcessor};
