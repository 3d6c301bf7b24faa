//! # 解析器模块
//!
//! - `html` - HTML文档解析、结构提取与重建、序列化

pub mod html;

// Re-export commonly used items for convenience
pub use html::{decode_markup, PlaceholderFormat, Skeleton, StructureProcessor};
