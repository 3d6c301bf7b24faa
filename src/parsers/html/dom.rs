use std::cell::RefCell;
use std::rc::{Rc, Weak};

use encoding_rs::Encoding;
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::{namespace_url, ns, parse_document, parse_fragment, LocalName, ParseOpts, QualName};
use markup5ever_rcdom::{Handle, Node, NodeData, RcDom};
use regex::bytes::Regex;

/// 标记的解析方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    /// 完整文档，序列化时包含 html/head/body
    Document,
    /// body 上下文中的片段，不补全外层元素
    Fragment,
}

/// 根据内容选择解析方式
pub fn detect_parse_mode(html: &str) -> ParseMode {
    let lowered = html.to_ascii_lowercase();
    if lowered.contains("<html") || lowered.contains("<!doctype") {
        ParseMode::Document
    } else {
        ParseMode::Fragment
    }
}

/// 将标记解析为 DOM
pub fn parse_markup(html: &str) -> (RcDom, ParseMode) {
    let mode = detect_parse_mode(html);
    let dom = match mode {
        ParseMode::Document => parse_document(RcDom::default(), ParseOpts::default()).one(html),
        ParseMode::Fragment => fragment_dom("body", html),
    };
    (dom, mode)
}

fn fragment_dom(context: &str, html: &str) -> RcDom {
    parse_fragment(
        RcDom::default(),
        ParseOpts::default(),
        QualName::new(None, ns!(html), LocalName::from(context)),
        Vec::new(),
    )
    .one(html)
}

/// 在给定父元素的上下文中解析行内标记，返回脱离原树的节点
pub fn parse_fragment_nodes(context: &str, html: &str) -> Vec<Handle> {
    let dom = fragment_dom(context, html);
    let root = dom.document.children.borrow().first().cloned();

    match root {
        Some(root) => {
            let nodes = std::mem::take(&mut *root.children.borrow_mut());
            for node in &nodes {
                node.parent.set(None);
            }
            nodes
        }
        None => Vec::new(),
    }
}

/// 片段模式下的根节点（解析器生成的 html 元素）
pub fn fragment_root(dom: &RcDom) -> Option<Handle> {
    dom.document
        .children
        .borrow()
        .iter()
        .find(|child| matches!(child.data, NodeData::Element { .. }))
        .cloned()
}

/// 解码原始字节，优先使用显式编码，其次使用 `<meta charset>`，最后使用 UTF-8
pub fn decode_markup(data: &[u8], document_encoding: Option<&str>) -> String {
    let label = document_encoding
        .map(str::to_string)
        .or_else(|| sniff_charset(data));

    if let Some(encoding) = label.and_then(|label| Encoding::for_label(label.as_bytes())) {
        let (string, _, _) = encoding.decode(data);
        string.into_owned()
    } else {
        String::from_utf8_lossy(data).into_owned()
    }
}

/// 从文档开头查找字符集声明
pub fn sniff_charset(data: &[u8]) -> Option<String> {
    let head = &data[..data.len().min(2048)];
    let re = Regex::new(r#"(?i-u)<meta[^>]*charset\s*=\s*["']?([a-z0-9_:.-]+)"#).ok()?;
    if let Some(captures) = re.captures(head) {
        return captures
            .get(1)
            .map(|m| String::from_utf8_lossy(m.as_bytes()).to_string());
    }

    let xml_re = Regex::new(r#"(?i-u)<\?xml[^>]*encoding\s*=\s*["']([a-z0-9_:.-]+)"#).ok()?;
    xml_re
        .captures(head)
        .and_then(|captures| captures.get(1))
        .map(|m| String::from_utf8_lossy(m.as_bytes()).to_string())
}

/// 获取节点名称
pub fn get_node_name(node: &Handle) -> Option<&'_ str> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.as_ref()),
        _ => None,
    }
}

/// 深度优先查找第一个指定名称的元素
pub fn find_element(node: &Handle, name: &str) -> Option<Handle> {
    if get_node_name(node) == Some(name) {
        return Some(node.clone());
    }
    node.children
        .borrow()
        .iter()
        .find_map(|child| find_element(child, name))
}

/// 获取父节点，不破坏原有的父指针
pub fn get_parent_node(child: &Handle) -> Option<Handle> {
    let weak = child.parent.take();
    let parent = weak.as_ref().and_then(Weak::upgrade);
    child.parent.set(weak);
    parent
}

/// 拼接节点下所有文本
pub fn text_content(node: &Handle) -> String {
    let mut text = String::new();
    collect_text(node, &mut text);
    text
}

fn collect_text(node: &Handle, buf: &mut String) {
    match &node.data {
        NodeData::Text { contents } => buf.push_str(&contents.borrow()),
        _ => {
            for child in node.children.borrow().iter() {
                collect_text(child, buf);
            }
        }
    }
}

/// 创建文本节点
pub fn create_text_node(text: &str) -> Handle {
    Node::new(NodeData::Text {
        contents: RefCell::new(StrTendril::from_slice(text)),
    })
}

/// 独立文本节点的内容
pub fn text_node_value(node: &Handle) -> Option<String> {
    match &node.data {
        NodeData::Text { contents } => Some(contents.borrow().to_string()),
        _ => None,
    }
}

/// 用新节点列表替换元素的全部子节点
pub fn replace_children(parent: &Handle, new_children: Vec<Handle>) {
    for child in &new_children {
        child.parent.set(Some(Rc::downgrade(parent)));
    }

    let old_children = std::mem::replace(&mut *parent.children.borrow_mut(), new_children);
    for child in &old_children {
        child.parent.set(None);
    }
}

/// 在父节点中用新节点列表替换某个子节点，返回是否找到该子节点
pub fn replace_node(parent: &Handle, target: &Handle, replacements: Vec<Handle>) -> bool {
    let mut children = parent.children.borrow_mut();
    let Some(index) = children.iter().position(|child| Rc::ptr_eq(child, target)) else {
        return false;
    };

    for node in &replacements {
        node.parent.set(Some(Rc::downgrade(parent)));
    }
    let _removed: Vec<Handle> = children.splice(index..index + 1, replacements).collect();
    target.parent.set(None);
    true
}
