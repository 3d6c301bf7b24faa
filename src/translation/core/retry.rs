//! 重试策略
//!
//! 指数退避：第 n 次失败后等待 `clamp(initial * 2^(n-1), min, max)`，
//! 最多尝试 `max_attempts` 次。等待直接阻塞当前线程。

use std::thread;
use std::time::Duration;

use crate::translation::config::RetryConfig;
use crate::translation::error::{TranslationError, TranslationResult};

/// 带上下限的指数退避重试
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_wait: Duration,
    min_wait: Duration,
    max_wait: Duration,
}

impl RetryPolicy {
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_wait: Duration::from_millis(config.initial_wait_ms),
            min_wait: Duration::from_millis(config.min_wait_ms),
            max_wait: Duration::from_millis(config.max_wait_ms.max(config.min_wait_ms)),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// 第 `attempt` 次（从1开始）失败后的等待时间
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let factor = 1u32 << exponent;
        let wait = self.initial_wait.saturating_mul(factor);
        wait.clamp(self.min_wait, self.max_wait)
    }

    /// 执行操作，失败且可重试时阻塞等待后重新尝试
    ///
    /// 重试耗尽后返回最后一次的错误。
    pub fn retry<T, F>(&self, operation: F) -> TranslationResult<T>
    where
        F: FnMut(u32) -> TranslationResult<T>,
    {
        self.retry_if(operation, TranslationError::is_retryable)
    }

    /// 同 [`retry`](Self::retry)，使用自定义的重试判定
    pub fn retry_if<T, F, P>(&self, mut operation: F, is_retryable: P) -> TranslationResult<T>
    where
        F: FnMut(u32) -> TranslationResult<T>,
        P: Fn(&TranslationError) -> bool,
    {
        let mut attempt = 1;
        loop {
            match operation(attempt) {
                Ok(value) => return Ok(value),
                Err(error) if attempt < self.max_attempts && is_retryable(&error) => {
                    let wait = self.backoff(attempt);
                    tracing::warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        wait_ms = wait.as_millis() as u64,
                        "请求失败，等待后重试: {}",
                        error
                    );
                    thread::sleep(wait);
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(&RetryConfig::default())
    }
}
