//! token 估算
//!
//! 在发送前粗略估计一个片段列表会消耗多少 token，用于成本预估日志。

use crate::translation::model::FragmentList;

/// JSON 包装和系统提示词的额外开销
const OVERHEAD_MARGIN: f64 = 1.1;

/// token 估算器
pub trait TokenEstimator {
    /// 估算单段文本的 token 数
    fn count(&self, text: &str) -> usize;

    /// 估算整个片段列表，每个片段按 `"<id>: <text>"` 计数，再加 10% 余量
    fn count_fragments(&self, fragments: &FragmentList) -> usize {
        let raw: usize = fragments
            .iter()
            .map(|fragment| self.count(&format!("{}: {}", fragment.id, fragment.text)))
            .sum();
        (raw as f64 * OVERHEAD_MARGIN) as usize
    }
}

/// 按字符数估算：约4个字符一个 token
#[derive(Debug, Clone, Copy)]
pub struct HeuristicEstimator {
    pub chars_per_token: usize,
}

impl Default for HeuristicEstimator {
    fn default() -> Self {
        Self { chars_per_token: 4 }
    }
}

impl TokenEstimator for HeuristicEstimator {
    fn count(&self, text: &str) -> usize {
        text.chars().count().div_ceil(self.chars_per_token.max(1))
    }
}

/// 输入和输出各算一次的预估成本（美元）
pub fn estimate_cost(tokens: usize, price_per_1m: f64) -> f64 {
    (tokens as f64 * 2.0 / 1_000_000.0) * price_per_1m
}
