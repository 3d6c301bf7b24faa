//! 端到端翻译流程
//!
//! 提取 → （可选截断）→ 编排翻译 → 重建。

use crate::parsers::StructureProcessor;
use crate::translation::core::{TranslationService, TranslatorClient};
use crate::translation::error::TranslationResult;
use crate::translation::model::FragmentList;
use crate::translation::storage::CacheRepository;
use crate::translation::tokens::{HeuristicEstimator, TokenEstimator};

/// 未指定输出路径时写入的文件
pub const DEFAULT_OUTPUT_PATH: &str = "translated_chapter.html";

/// 单个文档的翻译参数
#[derive(Debug, Clone, Copy)]
pub struct DocumentRequest<'a> {
    /// 缓存命名空间，通常是输入文件路径
    pub document_id: &'a str,
    pub target_language: &'a str,
    pub use_cache: bool,
    /// 只翻译前 N 个片段，其余保留原文
    pub limit: Option<usize>,
}

impl<'a> DocumentRequest<'a> {
    pub fn new(document_id: &'a str, target_language: &'a str) -> Self {
        Self {
            document_id,
            target_language,
            use_cache: true,
            limit: None,
        }
    }
}

/// [`translate_document`] 的结果
#[derive(Debug, Clone)]
pub struct DocumentOutcome {
    /// 重建后的标记
    pub html: String,
    /// 按文档顺序排列的全部片段，包括未翻译而原样保留的
    pub fragments: FragmentList,
    /// 发送翻译部分的预估 token 数
    pub estimated_tokens: usize,
}

/// 翻译一个标记文档
pub fn translate_document<C, R>(
    markup: &str,
    request: &DocumentRequest<'_>,
    processor: &StructureProcessor,
    service: &mut TranslationService<C, R>,
) -> TranslationResult<DocumentOutcome>
where
    C: TranslatorClient,
    R: CacheRepository,
{
    let (skeleton, extracted) = processor.extract_structure(markup)?;
    tracing::info!("提取了 {} 个片段", extracted.len());

    let (head, tail) = split_at_limit(extracted, request.limit);
    if !tail.is_empty() {
        tracing::info!("仅翻译前 {} 个片段，其余 {} 个保留原文", head.len(), tail.len());
    }

    let estimated_tokens = HeuristicEstimator::default().count_fragments(&head);
    tracing::info!("预计发送 {} 个token", estimated_tokens);

    let translated = service.translate(
        request.document_id,
        &head,
        request.target_language,
        request.use_cache,
    )?;

    let mut fragments = translated.elements;
    fragments.extend(tail);
    let fragments = FragmentList::new(fragments);

    let html = processor.rebuild_html(skeleton, &fragments)?;

    Ok(DocumentOutcome {
        html,
        fragments,
        estimated_tokens,
    })
}

fn split_at_limit(fragments: FragmentList, limit: Option<usize>) -> (FragmentList, FragmentList) {
    let mut head = fragments.elements;
    let tail = match limit {
        Some(limit) if limit < head.len() => head.split_off(limit),
        _ => Vec::new(),
    };
    (FragmentList::new(head), FragmentList::new(tail))
}
