//! 翻译管道模块
//!
//! 提供批次划分和译文校验

pub mod batch;
pub mod validators;

// 重新导出主要类型
pub use batch::{plan_chunks, render_user_payload, Chunk};
pub use validators::{
    CompositeValidator, IdAlignmentValidator, LengthRatioValidator, TranslationValidator,
};
