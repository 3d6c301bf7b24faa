//! 翻译缓存模块
//!
//! 以 `(document_id, model_id, fragment_id)` 为复合键保存译文。
//! 这里没有业务逻辑：未命中返回 `None`，只有存储层故障才返回错误。

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::RwLock;

use redb::{Database, ReadableTableMetadata, TableDefinition};

use crate::translation::error::{helpers::cache_error, TranslationResult};
use crate::translation::model::Fragment;

/// 单表布局，主键顺序为 (fragment id, document id, model id)
const TRANSLATIONS: TableDefinition<(&str, &str, &str), &str> =
    TableDefinition::new("translations");

// ============================================================================
// 核心接口
// ============================================================================

/// 缓存仓库
pub trait CacheRepository {
    /// 精确查找，未命中返回 `Ok(None)`
    fn get(
        &self,
        document_id: &str,
        model_id: &str,
        fragment_id: &str,
    ) -> TranslationResult<Option<String>>;

    /// 批量写入，已有的键被覆盖
    fn save_batch(
        &self,
        document_id: &str,
        model_id: &str,
        fragments: &[Fragment],
    ) -> TranslationResult<()>;
}

impl<T: CacheRepository + ?Sized> CacheRepository for &T {
    fn get(
        &self,
        document_id: &str,
        model_id: &str,
        fragment_id: &str,
    ) -> TranslationResult<Option<String>> {
        (**self).get(document_id, model_id, fragment_id)
    }

    fn save_batch(
        &self,
        document_id: &str,
        model_id: &str,
        fragments: &[Fragment],
    ) -> TranslationResult<()> {
        (**self).save_batch(document_id, model_id, fragments)
    }
}

// ============================================================================
// redb 实现
// ============================================================================

/// 基于 redb 的持久化缓存
pub struct RedbCache {
    db: Database,
}

impl RedbCache {
    /// 打开（或创建）数据库文件，并确保表存在
    pub fn open(path: impl AsRef<Path>) -> TranslationResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let db = Database::create(path)?;

        let write_txn = db.begin_write()?;
        write_txn.open_table(TRANSLATIONS)?;
        write_txn.commit()?;

        tracing::debug!("缓存数据库已打开: {}", path.display());
        Ok(Self { db })
    }

    /// 缓存条目总数
    pub fn len(&self) -> TranslationResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TRANSLATIONS)?;
        Ok(table.len()?)
    }

    pub fn is_empty(&self) -> TranslationResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl CacheRepository for RedbCache {
    fn get(
        &self,
        document_id: &str,
        model_id: &str,
        fragment_id: &str,
    ) -> TranslationResult<Option<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TRANSLATIONS)?;
        let value = table
            .get((fragment_id, document_id, model_id))?
            .map(|guard| guard.value().to_string());
        Ok(value)
    }

    fn save_batch(
        &self,
        document_id: &str,
        model_id: &str,
        fragments: &[Fragment],
    ) -> TranslationResult<()> {
        if fragments.is_empty() {
            return Ok(());
        }

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(TRANSLATIONS)?;
            for fragment in fragments {
                table.insert(
                    (fragment.id.as_str(), document_id, model_id),
                    fragment.text.as_str(),
                )?;
            }
        }
        write_txn.commit()?;

        tracing::debug!(
            "已缓存 {} 个片段 (document={}, model={})",
            fragments.len(),
            document_id,
            model_id
        );
        Ok(())
    }
}

// ============================================================================
// 内存实现
// ============================================================================

type MemoryKey = (String, String, String);

/// 进程内缓存，进程退出即丢失
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<MemoryKey, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheRepository for MemoryCache {
    fn get(
        &self,
        document_id: &str,
        model_id: &str,
        fragment_id: &str,
    ) -> TranslationResult<Option<String>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| cache_error("内存缓存读锁中毒"))?;
        let key = (
            document_id.to_string(),
            model_id.to_string(),
            fragment_id.to_string(),
        );
        Ok(entries.get(&key).cloned())
    }

    fn save_batch(
        &self,
        document_id: &str,
        model_id: &str,
        fragments: &[Fragment],
    ) -> TranslationResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| cache_error("内存缓存写锁中毒"))?;
        for fragment in fragments {
            entries.insert(
                (
                    document_id.to_string(),
                    model_id.to_string(),
                    fragment.id.clone(),
                ),
                fragment.text.clone(),
            );
        }
        Ok(())
    }
}
