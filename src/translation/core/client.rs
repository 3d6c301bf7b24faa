//! 远程翻译客户端
//!
//! [`OpenRouterClient`] 把片段按块发送到 OpenAI 兼容的 `chat/completions`
//! 接口，要求结构化 JSON 输出，并对每块执行重试和ID对齐校验。
//! 任一块重试耗尽时整个调用失败，之前成功的块结果被丢弃。

use std::thread;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};

use super::retry::RetryPolicy;
use crate::translation::config::TranslatorConfig;
use crate::translation::error::{TranslationError, TranslationResult};
use crate::translation::model::{Fragment, FragmentList, UsageStatistics};
use crate::translation::pipeline::{plan_chunks, Chunk, IdAlignmentValidator, TranslationValidator};
use crate::translation::prompts;

/// 批量翻译客户端
pub trait TranslatorClient {
    /// 当前使用的模型标识，同时作为缓存键的一部分
    fn model(&self) -> &str;

    /// 翻译一组片段，返回的ID集合与输入一致
    fn translate_batch(
        &mut self,
        fragments: &[Fragment],
        target_language: &str,
    ) -> TranslationResult<Vec<Fragment>>;
}

impl<T: TranslatorClient + ?Sized> TranslatorClient for &mut T {
    fn model(&self) -> &str {
        (**self).model()
    }

    fn translate_batch(
        &mut self,
        fragments: &[Fragment],
        target_language: &str,
    ) -> TranslationResult<Vec<Fragment>> {
        (**self).translate_batch(fragments, target_language)
    }
}

/// 模型价格，单位为美元/百万token
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ModelPrices {
    pub prompt_per_1m: f64,
    pub completion_per_1m: f64,
}

#[derive(Debug, Default, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
struct TokenUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

/// OpenRouter（及兼容接口）客户端
pub struct OpenRouterClient {
    http: reqwest::blocking::Client,
    api_key: String,
    base_url: String,
    model: String,
    batch_size: usize,
    batch_delay: Duration,
    retry: RetryPolicy,
    prices: ModelPrices,
    prices_loaded: bool,
    validator: Box<dyn TranslationValidator>,
    usage: UsageStatistics,
}

impl OpenRouterClient {
    /// 根据配置创建客户端，缺少 API 密钥时返回配置错误
    pub fn new(config: &TranslatorConfig) -> TranslationResult<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                TranslationError::Config("未设置 API 密钥 (OPENROUTER_APIKEY)".to_string())
            })?
            .to_string();

        let http = reqwest::blocking::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| TranslationError::Config(format!("无法创建HTTP客户端: {}", e)))?;

        Ok(Self {
            http,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            batch_size: config.batch_size.max(1),
            batch_delay: config.batch_delay(),
            retry: RetryPolicy::new(&config.retry),
            prices: ModelPrices::default(),
            prices_loaded: false,
            validator: Box::new(IdAlignmentValidator),
            usage: UsageStatistics::default(),
        })
    }

    /// 替换默认的ID对齐校验器
    pub fn with_validator(mut self, validator: impl TranslationValidator + 'static) -> Self {
        self.validator = Box::new(validator);
        self
    }

    pub fn usage(&self) -> &UsageStatistics {
        &self.usage
    }

    pub fn prices(&self) -> ModelPrices {
        self.prices
    }

    /// 获取当前模型的价格，每个客户端只请求一次
    ///
    /// 请求失败或找不到模型时价格保持为0。
    pub fn fetch_model_prices(&mut self) {
        if self.prices_loaded {
            return;
        }
        self.prices_loaded = true;

        match self.request_prices() {
            Ok(Some(prices)) => {
                tracing::info!(
                    "已加载 {} 的价格: ${}/1M prompt | ${}/1M completion",
                    self.model,
                    prices.prompt_per_1m,
                    prices.completion_per_1m
                );
                self.prices = prices;
            }
            Ok(None) => tracing::warn!("价格列表中没有模型 {}，费用按0计算", self.model),
            Err(e) => tracing::warn!("获取模型价格失败，费用按0计算: {}", e),
        }
    }

    fn request_prices(&self) -> TranslationResult<Option<ModelPrices>> {
        let response = self
            .http
            .get(format!("{}/models", self.base_url))
            .bearer_auth(&self.api_key)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(TranslationError::Http {
                status: status.as_u16(),
                body: response.text().unwrap_or_default(),
            });
        }

        let catalog: Value = serde_json::from_str(&response.text()?)?;
        let entry = catalog["data"]
            .as_array()
            .and_then(|models| models.iter().find(|m| m["id"] == self.model.as_str()));

        Ok(entry.map(|model| ModelPrices {
            prompt_per_1m: price_value(&model["pricing"]["prompt"]),
            completion_per_1m: price_value(&model["pricing"]["completion"]),
        }))
    }

    /// 发送一个块并校验结果，不修改用量统计
    fn send_chunk(
        &self,
        chunk: &Chunk<'_>,
        system_prompt: &str,
        attempt: u32,
    ) -> TranslationResult<(Vec<Fragment>, TokenUsage)> {
        let payload = chunk.user_payload();
        tracing::debug!(
            attempt,
            fragments = chunk.len(),
            payload_bytes = payload.len(),
            "发送第 {}/{} 批",
            chunk.number,
            chunk.total
        );

        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": payload }
            ],
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": "translation_map",
                    "strict": true,
                    "schema": FragmentList::json_schema()
                }
            }
        });

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(TranslationError::Http {
                status: status.as_u16(),
                body: response.text().unwrap_or_default(),
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&response.text()?)?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                TranslationError::MalformedResponse(
                    "响应缺少 choices[0].message.content".to_string(),
                )
            })?;

        let translated: FragmentList =
            serde_json::from_str(strip_code_fence(&content)).map_err(|e| {
                tracing::error!("译文内容无法解析: {}", content);
                TranslationError::MalformedResponse(format!("译文内容不是有效的片段列表: {}", e))
            })?;

        self.validator.validate(chunk.fragments, &translated)?;

        Ok((translated.elements, parsed.usage.unwrap_or_default()))
    }
}

impl TranslatorClient for OpenRouterClient {
    fn model(&self) -> &str {
        &self.model
    }

    fn translate_batch(
        &mut self,
        fragments: &[Fragment],
        target_language: &str,
    ) -> TranslationResult<Vec<Fragment>> {
        let system_prompt = prompts::system_prompt(target_language);
        let chunks = plan_chunks(fragments, self.batch_size);
        let mut translated = Vec::with_capacity(fragments.len());

        for chunk in &chunks {
            tracing::info!(
                "处理第 {}/{} 批 ({} 个片段)",
                chunk.number,
                chunk.total,
                chunk.len()
            );

            let (elements, usage) = self
                .retry
                .retry(|attempt| self.send_chunk(chunk, &system_prompt, attempt))?;

            self.usage.add_usage(
                usage.prompt_tokens,
                usage.completion_tokens,
                self.prices.prompt_per_1m,
                self.prices.completion_per_1m,
            );
            tracing::info!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "批次用量"
            );
            translated.extend(elements);

            if !chunk.is_last() && !self.batch_delay.is_zero() {
                tracing::debug!("等待 {:?} 以避免触发限流", self.batch_delay);
                thread::sleep(self.batch_delay);
            }
        }

        Ok(translated)
    }
}

/// 价格字段可能是数字字符串或数字
fn price_value(value: &Value) -> f64 {
    match value {
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// 部分模型会把 JSON 包在 Markdown 代码块里
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
