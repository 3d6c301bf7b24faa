// 集成测试公共模块
//
// 提供测试辅助工具和共享功能

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::json;

use epub_translator::translation::{
    Fragment, FragmentList, RetryConfig, TranslationResult, TranslatorClient, TranslatorConfig,
};

/// 一个典型的章节片段
pub const SAMPLE_CHAPTER: &str = concat!(
    "<section class=\"chapter\">",
    "<h2 id=\"c1\">Chapter One</h2>",
    "<p>It was a <em>dark</em> and stormy night.</p>",
    "<p><img src=\"storm.png\" alt=\"storm\"></p>",
    "<blockquote><p>Quoted line.</p></blockquote>",
    "<ul><li>First</li><li>Second &amp; last</li></ul>",
    "</section>"
);

/// 指向 mock 服务器、等待时间缩短到毫秒级的配置
pub fn test_config(base_url: &str) -> TranslatorConfig {
    TranslatorConfig {
        api_key: Some("test-key".to_string()),
        base_url: base_url.to_string(),
        model: "mock-model".to_string(),
        request_timeout_secs: 5,
        batch_delay_ms: 0,
        retry: RetryConfig {
            max_attempts: 3,
            initial_wait_ms: 1,
            min_wait_ms: 1,
            max_wait_ms: 5,
        },
        ..TranslatorConfig::default()
    }
}

pub fn fragments(count: usize) -> Vec<Fragment> {
    (1..=count)
        .map(|i| Fragment::new(format!("REF_{:06}", i), format!("Sentence number {}.", i)))
        .collect()
}

/// 构造 chat/completions 响应体
pub fn completion_body(elements: &[(&str, &str)], prompt_tokens: u64, completion_tokens: u64) -> String {
    let list = FragmentList::new(
        elements
            .iter()
            .map(|(id, text)| Fragment::new(*id, *text))
            .collect(),
    );
    let content = serde_json::to_string(&list).unwrap();

    json!({
        "id": "gen-test",
        "model": "mock-model",
        "choices": [
            { "index": 0, "message": { "role": "assistant", "content": content } }
        ],
        "usage": {
            "prompt_tokens": prompt_tokens,
            "completion_tokens": completion_tokens,
            "total_tokens": prompt_tokens + completion_tokens
        }
    })
    .to_string()
}

/// 记录每次调用的假客户端，译文为 `[<lang>] <text>`
#[derive(Clone)]
pub struct MockTranslator {
    model: String,
    calls: Rc<RefCell<Vec<Vec<String>>>>,
}

impl MockTranslator {
    pub fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
            calls: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// 每次调用发送的片段ID
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.borrow().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl TranslatorClient for MockTranslator {
    fn model(&self) -> &str {
        &self.model
    }

    fn translate_batch(
        &mut self,
        fragments: &[Fragment],
        target_language: &str,
    ) -> TranslationResult<Vec<Fragment>> {
        self.calls
            .borrow_mut()
            .push(fragments.iter().map(|f| f.id.clone()).collect());

        Ok(fragments
            .iter()
            .map(|f| f.with_text(format!("[{}] {}", target_language, f.text)))
            .collect())
    }
}
