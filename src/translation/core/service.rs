//! 翻译编排服务
//!
//! 先查缓存，未命中的片段一次性交给客户端，把新结果写回缓存，
//! 最后按输入顺序返回全部片段。

use std::collections::HashMap;

use super::client::TranslatorClient;
use crate::translation::error::TranslationResult;
use crate::translation::model::{Fragment, FragmentList};
use crate::translation::storage::CacheRepository;

/// 翻译服务
pub struct TranslationService<C, R> {
    client: C,
    cache: R,
}

impl<C, R> TranslationService<C, R>
where
    C: TranslatorClient,
    R: CacheRepository,
{
    pub fn new(client: C, cache: R) -> Self {
        Self { client, cache }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut C {
        &mut self.client
    }

    pub fn cache(&self) -> &R {
        &self.cache
    }

    pub fn into_parts(self) -> (C, R) {
        (self.client, self.cache)
    }

    /// 翻译片段列表，返回顺序与输入一致
    ///
    /// 模型标识在调用开始时读取一次，整个调用期间的缓存读写都使用它。
    /// 缓存读写失败直接返回错误，不会退化为全部远程翻译。
    pub fn translate(
        &mut self,
        document_id: &str,
        fragments: &FragmentList,
        target_language: &str,
        use_cache: bool,
    ) -> TranslationResult<FragmentList> {
        let model_id = self.client.model().to_string();

        let mut resolved: Vec<Fragment> = Vec::with_capacity(fragments.len());
        let mut needed: Vec<Fragment> = Vec::new();

        if use_cache {
            for fragment in fragments {
                match self.cache.get(document_id, &model_id, &fragment.id)? {
                    Some(text) => resolved.push(fragment.with_text(text)),
                    None => needed.push(fragment.clone()),
                }
            }
        } else {
            needed.extend(fragments.iter().cloned());
        }

        tracing::info!(
            document = document_id,
            model = %model_id,
            cached = resolved.len(),
            needed = needed.len(),
            "缓存查询完成"
        );

        if !needed.is_empty() {
            let translated = self.client.translate_batch(&needed, target_language)?;
            self.cache.save_batch(document_id, &model_id, &translated)?;
            resolved.extend(translated);
        }

        Ok(restore_order(fragments, resolved))
    }
}

/// 按输入中的位置排序；输入中不存在的ID排在最后
fn restore_order(original: &FragmentList, mut resolved: Vec<Fragment>) -> FragmentList {
    let positions: HashMap<&str, usize> = original
        .iter()
        .enumerate()
        .map(|(index, fragment)| (fragment.id.as_str(), index))
        .collect();

    for fragment in &resolved {
        if !positions.contains_key(fragment.id.as_str()) {
            tracing::warn!("结果中出现了未请求的片段: {}", fragment.id);
        }
    }

    resolved.sort_by_key(|fragment| {
        positions
            .get(fragment.id.as_str())
            .copied()
            .unwrap_or(usize::MAX)
    });
    FragmentList::new(resolved)
}
