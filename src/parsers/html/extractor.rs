//! 结构提取与重建
//!
//! 提取阶段把每个目标块级元素的内部标记替换为占位符文本节点，得到骨架和
//! 有序的片段列表；重建阶段把译文解析为标记，替换骨架中的占位符。
//!
//! ```rust
//! use epub_translator::parsers::html::StructureProcessor;
//! use epub_translator::translation::TranslatorConfig;
//!
//! let processor = StructureProcessor::new(&TranslatorConfig::default()).unwrap();
//! let (skeleton, fragments) = processor
//!     .extract_structure("<div><h1>Title</h1><p>Paragraph 1</p><p></p></div>")
//!     .unwrap();
//!
//! assert_eq!(fragments.len(), 2);
//! let html = processor.rebuild_html(skeleton, &fragments).unwrap();
//! assert_eq!(html, "<div><h1>Title</h1><p>Paragraph 1</p><p></p></div>");
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;

use markup5ever_rcdom::{Handle, NodeData, RcDom};

use super::dom::{
    create_text_node, fragment_root, get_node_name, get_parent_node, parse_fragment_nodes,
    parse_markup, replace_children, replace_node, text_content, text_node_value, ParseMode,
};
use super::placeholder::PlaceholderFormat;
use super::serializer::serialize_children;
use crate::translation::config::TranslatorConfig;
use crate::translation::error::{TranslationError, TranslationResult};
use crate::translation::model::{Fragment, FragmentList};

/// 提取后的文档骨架
///
/// 由一次请求独占，重建时被消费。
pub struct Skeleton {
    dom: RcDom,
    mode: ParseMode,
}

impl Skeleton {
    pub fn mode(&self) -> ParseMode {
        self.mode
    }

    /// 遍历与序列化的起点
    fn root(&self) -> Handle {
        match self.mode {
            ParseMode::Document => self.dom.document.clone(),
            ParseMode::Fragment => {
                fragment_root(&self.dom).unwrap_or_else(|| self.dom.document.clone())
            }
        }
    }

    pub fn serialize(&self) -> TranslationResult<String> {
        Ok(serialize_children(&self.root())?)
    }
}

impl fmt::Display for Skeleton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let html = self.serialize().map_err(|_| fmt::Error)?;
        f.write_str(&html)
    }
}

impl fmt::Debug for Skeleton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Skeleton").field("mode", &self.mode).finish()
    }
}

/// 结构提取/重建器
#[derive(Debug, Clone)]
pub struct StructureProcessor {
    target_tags: HashSet<String>,
    placeholder: PlaceholderFormat,
    strict: bool,
}

impl StructureProcessor {
    pub fn new(config: &TranslatorConfig) -> TranslationResult<Self> {
        let placeholder =
            PlaceholderFormat::new(&config.placeholder_prefix, config.placeholder_width)?;

        Ok(Self {
            target_tags: config
                .target_tags
                .iter()
                .map(|tag| tag.to_ascii_lowercase())
                .collect(),
            placeholder,
            strict: config.strict_rebuild,
        })
    }

    /// 严格模式下，重建时遇到缺失或未知的片段直接报错
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn placeholder(&self) -> &PlaceholderFormat {
        &self.placeholder
    }

    /// 将标记拆解为骨架和待翻译片段
    pub fn extract_structure(&self, html: &str) -> TranslationResult<(Skeleton, FragmentList)> {
        let (dom, mode) = parse_markup(html);
        let skeleton = Skeleton { dom, mode };

        let mut targets = Vec::new();
        self.collect_targets(&skeleton.root(), &mut targets);

        let mut elements = Vec::with_capacity(targets.len());
        for (index, element) in targets.iter().enumerate() {
            let id = self.placeholder.format(index + 1);
            let text = serialize_children(element)?.trim().to_string();

            replace_children(element, vec![create_text_node(&id)]);
            elements.push(Fragment::new(id, text));
        }

        tracing::debug!(
            fragments = elements.len(),
            mode = ?mode,
            "提取完成"
        );

        Ok((skeleton, FragmentList::new(elements)))
    }

    /// 用译文替换骨架中的占位符并序列化
    pub fn rebuild_html(
        &self,
        skeleton: Skeleton,
        translated: &FragmentList,
    ) -> TranslationResult<String> {
        let mut placeholders = HashMap::new();
        self.collect_placeholders(&skeleton.root(), &mut placeholders);

        let mut seen = HashSet::new();
        let mut unknown = Vec::new();
        for fragment in translated {
            if !seen.insert(fragment.id.as_str()) {
                continue;
            }
            match placeholders.remove(fragment.id.as_str()) {
                Some(node) => substitute(&node, &fragment.text),
                None => unknown.push(fragment.id.clone()),
            }
        }

        if !unknown.is_empty() {
            if self.strict {
                return Err(TranslationError::UnknownFragment(unknown.join(", ")));
            }
            tracing::warn!(count = unknown.len(), "忽略骨架中不存在的片段: {:?}", unknown);
        }

        if !placeholders.is_empty() {
            let mut missing: Vec<String> = placeholders.into_keys().collect();
            missing.sort();
            if self.strict {
                return Err(TranslationError::MissingFragment(missing.join(", ")));
            }
            tracing::warn!(count = missing.len(), "以下占位符没有译文，保留原样: {:?}", missing);
        }

        skeleton.serialize()
    }

    fn is_target(&self, node: &Handle) -> bool {
        get_node_name(node).is_some_and(|name| self.target_tags.contains(name))
    }

    /// 收集最内层的目标元素；包含其他目标元素的容器会被继续向下遍历
    fn collect_targets(&self, node: &Handle, out: &mut Vec<Handle>) {
        for child in node.children.borrow().iter() {
            if self.is_target(child) {
                if text_content(child).trim().is_empty() {
                    continue;
                }
                if !self.contains_target(child) {
                    out.push(child.clone());
                    continue;
                }
            }
            self.collect_targets(child, out);
        }
    }

    fn contains_target(&self, node: &Handle) -> bool {
        node.children
            .borrow()
            .iter()
            .any(|child| self.is_target(child) || self.contains_target(child))
    }

    fn collect_placeholders(&self, node: &Handle, out: &mut HashMap<String, Handle>) {
        for child in node.children.borrow().iter() {
            match &child.data {
                NodeData::Text { .. } => {
                    if let Some(value) = text_node_value(child) {
                        if self.placeholder.matches(&value) {
                            out.entry(value).or_insert_with(|| child.clone());
                        }
                    }
                }
                _ => self.collect_placeholders(child, out),
            }
        }
    }
}

/// 将占位符文本节点替换为解析后的译文节点
fn substitute(placeholder: &Handle, translated_text: &str) {
    let Some(parent) = get_parent_node(placeholder) else {
        return;
    };

    let context = get_node_name(&parent).unwrap_or("body").to_string();
    let nodes = parse_fragment_nodes(&context, translated_text);
    replace_node(&parent, placeholder, nodes);
}
