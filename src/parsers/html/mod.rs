//! HTML解析和处理模块
//!
//! - `dom`: 解析、编码检测和基础DOM操作
//! - `placeholder`: 占位符格式
//! - `extractor`: 结构提取与重建
//! - `serializer`: 最小转义的序列化

pub mod dom;
pub mod extractor;
pub mod placeholder;
pub mod serializer;

pub use dom::{decode_markup, find_element, fragment_root, parse_markup, sniff_charset, ParseMode};
pub use extractor::{Skeleton, StructureProcessor};
pub use placeholder::PlaceholderFormat;
pub use serializer::{serialize_children, serialize_node};
