//! 翻译数据模型
//!
//! 片段 (`Fragment`) 是提取器、客户端和缓存之间共享的数据契约。

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// 一个可翻译的文本片段
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fragment {
    /// 用于重建文档的唯一标识，不可修改
    pub id: String,
    /// 片段的内部标记，可能包含 `<i>`、`<b>` 等行内标签
    pub text: String,
}

impl Fragment {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }

    /// 保留ID，替换文本
    pub fn with_text(&self, text: impl Into<String>) -> Self {
        Self {
            id: self.id.clone(),
            text: text.into(),
        }
    }
}

/// 有序片段列表
///
/// 提取时的顺序即请求和响应的权威顺序。序列化形状与服务端
/// 结构化输出一致：`{"elements": [{"id": ..., "text": ...}]}`。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentList {
    pub elements: Vec<Fragment>,
}

impl FragmentList {
    pub fn new(elements: Vec<Fragment>) -> Self {
        Self { elements }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Fragment> {
        self.elements.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().map(|fragment| fragment.id.as_str())
    }

    /// 按ID查找片段
    pub fn get(&self, id: &str) -> Option<&Fragment> {
        self.elements.iter().find(|fragment| fragment.id == id)
    }

    /// 结构化输出所用的严格 JSON Schema
    pub fn json_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "elements": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "id": {
                                "type": "string",
                                "description": "Unique identifier for reconstruction. Do not modify."
                            },
                            "text": {
                                "type": "string",
                                "description": "Translated text keeping formatting tags like <i> or <b>"
                            }
                        },
                        "required": ["id", "text"],
                        "additionalProperties": false
                    }
                }
            },
            "required": ["elements"],
            "additionalProperties": false
        })
    }
}

impl From<Vec<Fragment>> for FragmentList {
    fn from(elements: Vec<Fragment>) -> Self {
        Self { elements }
    }
}

impl IntoIterator for FragmentList {
    type Item = Fragment;
    type IntoIter = std::vec::IntoIter<Fragment>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.into_iter()
    }
}

impl<'a> IntoIterator for &'a FragmentList {
    type Item = &'a Fragment;
    type IntoIter = std::slice::Iter<'a, Fragment>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

/// 单次编排运行内累计的用量统计
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageStatistics {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
    pub total_cost_usd: f64,
}

impl UsageStatistics {
    /// 累加一次调用的用量，价格单位为美元/百万token
    pub fn add_usage(
        &mut self,
        prompt: u64,
        completion: u64,
        price_prompt_1m: f64,
        price_completion_1m: f64,
    ) {
        self.prompt_tokens += prompt;
        self.completion_tokens += completion;
        self.total_tokens += prompt + completion;
        self.total_cost_usd += prompt as f64 * (price_prompt_1m / 1_000_000.0)
            + completion as f64 * (price_completion_1m / 1_000_000.0);
    }
}
