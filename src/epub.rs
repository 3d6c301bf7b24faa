//! EPUB 文档加载
//!
//! EPUB 是一个 ZIP 容器：`META-INF/container.xml` 指向 OPF 包文件，
//! OPF 的 manifest 列出全部资源。这里按 manifest 顺序读取所有
//! `application/xhtml+xml` 条目，只保留每个文档 `<body>` 的内容，
//! 用换行连接成一个字符串。

use std::fs;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use percent_encoding::percent_decode_str;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use zip::ZipArchive;

use crate::parsers::decode_markup;
use crate::parsers::html::{find_element, fragment_root, parse_markup, serialize_children, ParseMode};
use crate::translation::error::{helpers::document_error, TranslationResult};

const CONTAINER_PATH: &str = "META-INF/container.xml";
const XHTML_MEDIA_TYPE: &str = "application/xhtml+xml";

/// manifest 中的一个条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestItem {
    pub id: String,
    /// 相对于容器根目录的路径
    pub path: String,
    pub media_type: String,
}

/// 读取 EPUB 文件中的全部 XHTML 文档
pub fn load_epub_content(path: impl AsRef<Path>) -> TranslationResult<String> {
    let bytes = fs::read(path.as_ref())?;
    load_epub_from_bytes(&bytes)
}

/// 从内存中的 EPUB 数据读取全部 XHTML 文档
pub fn load_epub_from_bytes(data: &[u8]) -> TranslationResult<String> {
    let mut archive = ZipArchive::new(Cursor::new(data))?;

    let container = read_entry(&mut archive, CONTAINER_PATH)?;
    let package_path = find_package_path(&container)?;
    let package = read_entry(&mut archive, &package_path)?;

    let documents: Vec<ManifestItem> = parse_manifest(&package, &package_path)?
        .into_iter()
        .filter(|item| item.media_type == XHTML_MEDIA_TYPE)
        .collect();

    tracing::info!("EPUB 包含 {} 个 XHTML 文档", documents.len());

    let mut contents = Vec::with_capacity(documents.len());
    for item in &documents {
        let bytes = read_entry_bytes(&mut archive, &item.path)?;
        contents.push(document_body(&decode_markup(&bytes, None))?);
    }

    Ok(contents.join("\n"))
}

/// 根据扩展名加载待翻译文档：`.epub` 读取容器，其余当作 HTML 文本
pub fn load_document(path: impl AsRef<Path>) -> TranslationResult<String> {
    let path = path.as_ref();
    let is_epub = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("epub"));

    if is_epub {
        load_epub_content(path)
    } else {
        let bytes = fs::read(path)?;
        Ok(decode_markup(&bytes, None))
    }
}

/// 章节的 `<body>` 内容；head、XML 声明和外层元素都被丢弃
fn document_body(markup: &str) -> TranslationResult<String> {
    let (dom, mode) = parse_markup(markup);
    let container = match mode {
        ParseMode::Document => find_element(&dom.document, "body"),
        ParseMode::Fragment => fragment_root(&dom),
    };

    match container {
        Some(node) => Ok(serialize_children(&node)?.trim().to_string()),
        None => Ok(String::new()),
    }
}

fn read_entry_bytes<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> TranslationResult<Vec<u8>> {
    let mut file = archive
        .by_name(name)
        .map_err(|e| document_error(format!("EPUB 中缺少 {}: {}", name, e)))?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)?;
    Ok(buf)
}

fn read_entry<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> TranslationResult<String> {
    let bytes = read_entry_bytes(archive, name)?;
    String::from_utf8(bytes).map_err(|e| document_error(format!("{} 不是有效的UTF-8: {}", name, e)))
}

/// 从 container.xml 中找到第一个 rootfile 的 full-path
fn find_package_path(container: &str) -> TranslationResult<String> {
    let mut reader = Reader::from_str(container);
    reader.trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) | Event::Empty(ref e) if e.local_name().as_ref() == b"rootfile" => {
                if let Some(path) = get_attribute(e, "full-path")? {
                    return Ok(path);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Err(document_error("container.xml 中没有 rootfile"))
}

/// 解析 OPF manifest，路径解析为容器内的绝对路径
fn parse_manifest(package: &str, package_path: &str) -> TranslationResult<Vec<ManifestItem>> {
    let base_dir = package_path
        .rsplit_once('/')
        .map(|(dir, _)| dir)
        .unwrap_or("");

    let mut reader = Reader::from_str(package);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut items = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) | Event::Empty(ref e) if e.local_name().as_ref() == b"item" => {
                let href = get_attribute(e, "href")?;
                let media_type = get_attribute(e, "media-type")?;
                if let (Some(href), Some(media_type)) = (href, media_type) {
                    items.push(ManifestItem {
                        id: get_attribute(e, "id")?.unwrap_or_default(),
                        path: resolve_href(base_dir, &href),
                        media_type,
                    });
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(items)
}

fn get_attribute(e: &BytesStart<'_>, name: &str) -> TranslationResult<Option<String>> {
    for attr in e.attributes().flatten() {
        if attr.key.local_name().as_ref() == name.as_bytes() {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// 解码 href 并相对 OPF 目录解析，处理 `.` 和 `..`
fn resolve_href(base_dir: &str, href: &str) -> String {
    let decoded = percent_decode_str(href).decode_utf8_lossy();
    let href = decoded.split('#').next().unwrap_or_default();

    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in href.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}
