//! 存储模块
//!
//! 提供缓存和持久化存储功能。

pub mod cache;

pub use cache::{CacheRepository, MemoryCache, RedbCache};
