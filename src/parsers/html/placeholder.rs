//! 占位符格式
//!
//! 占位符是前缀加定宽补零的序号，例如 `REF_000001`。它作为独立文本节点
//! 留在骨架中，重建时按格式识别。

use regex::Regex;

use crate::translation::error::{TranslationError, TranslationResult};

#[derive(Debug, Clone)]
pub struct PlaceholderFormat {
    prefix: String,
    width: usize,
    pattern: Regex,
}

impl PlaceholderFormat {
    pub fn new(prefix: &str, width: usize) -> TranslationResult<Self> {
        if prefix.trim().is_empty() || width == 0 {
            return Err(TranslationError::Config(format!(
                "无效的占位符格式: 前缀 {:?}, 宽度 {}",
                prefix, width
            )));
        }

        // 序号超过宽度时位数会增加，仍需识别
        let pattern = Regex::new(&format!("^{}[0-9]{{{},}}$", regex::escape(prefix), width))
            .map_err(|e| TranslationError::Config(format!("占位符正则无效: {}", e)))?;

        Ok(Self {
            prefix: prefix.to_string(),
            width,
            pattern,
        })
    }

    /// 生成第 `index` 个占位符（从1开始）
    pub fn format(&self, index: usize) -> String {
        format!("{}{:0width$}", self.prefix, index, width = self.width)
    }

    pub fn matches(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_is_zero_padded() {
        let format = PlaceholderFormat::new("REF_", 6).unwrap();
        assert_eq!(format.format(1), "REF_000001");
        assert_eq!(format.format(123456), "REF_123456");
        assert_eq!(format.format(1234567), "REF_1234567");
    }

    #[test]
    fn test_matches_only_whole_placeholders() {
        let format = PlaceholderFormat::new("REF_", 6).unwrap();
        assert!(format.matches("REF_000042"));
        assert!(format.matches("REF_1234567"));
        assert!(!format.matches("REF_42"));
        assert!(!format.matches(" REF_000042"));
        assert!(!format.matches("See REF_000042"));
    }

    #[test]
    fn test_prefix_is_escaped() {
        let format = PlaceholderFormat::new("[id].", 3).unwrap();
        assert!(format.matches("[id].007"));
        assert!(!format.matches("xidy007"));
    }

    #[test]
    fn test_rejects_blank_prefix() {
        assert!(PlaceholderFormat::new("  ", 6).is_err());
        assert!(PlaceholderFormat::new("REF_", 0).is_err());
    }
}
