//! 译文校验器
//!
//! 客户端只依赖 [`TranslationValidator`] 这一能力。多个校验器可以通过
//! [`CompositeValidator`] 按顺序组合，第一个失败即返回。

use std::collections::BTreeSet;

use crate::translation::error::ValidationError;
use crate::translation::model::{Fragment, FragmentList};

/// 校验服务端返回的片段集合
pub trait TranslationValidator {
    fn validate(
        &self,
        original: &[Fragment],
        translated: &FragmentList,
    ) -> Result<(), ValidationError>;
}

/// 校验返回的ID集合与发送的ID集合完全一致，且每个ID只出现一次
#[derive(Debug, Clone, Copy, Default)]
pub struct IdAlignmentValidator;

impl TranslationValidator for IdAlignmentValidator {
    fn validate(
        &self,
        original: &[Fragment],
        translated: &FragmentList,
    ) -> Result<(), ValidationError> {
        let sent: BTreeSet<&str> = original.iter().map(|f| f.id.as_str()).collect();
        let mut received = BTreeSet::new();
        let mut duplicated = BTreeSet::new();
        for id in translated.ids() {
            if !received.insert(id) {
                duplicated.insert(id.to_string());
            }
        }

        if sent != received {
            return Err(ValidationError::IdMismatch {
                missing: sent.difference(&received).map(|id| id.to_string()).collect(),
                extra: received.difference(&sent).map(|id| id.to_string()).collect(),
            });
        }

        if !duplicated.is_empty() {
            return Err(ValidationError::Duplicated(duplicated));
        }

        Ok(())
    }
}

/// 拒绝长度明显异常的译文（通常是模型截断或复读）
#[derive(Debug, Clone, Copy)]
pub struct LengthRatioValidator {
    pub max_ratio: f64,
    /// 原文短于该字符数时不检查
    pub min_chars: usize,
}

impl Default for LengthRatioValidator {
    fn default() -> Self {
        Self {
            max_ratio: 4.0,
            min_chars: 20,
        }
    }
}

impl TranslationValidator for LengthRatioValidator {
    fn validate(
        &self,
        original: &[Fragment],
        translated: &FragmentList,
    ) -> Result<(), ValidationError> {
        for source in original {
            let source_len = source.text.chars().count();
            if source_len < self.min_chars {
                continue;
            }
            let Some(target) = translated.get(&source.id) else {
                continue;
            };

            let ratio = target.text.chars().count() as f64 / source_len as f64;
            if ratio > self.max_ratio || ratio < 1.0 / self.max_ratio {
                return Err(ValidationError::Rejected(format!(
                    "{} 的译文长度比例异常: {:.2}",
                    source.id, ratio
                )));
            }
        }
        Ok(())
    }
}

/// 依次执行多个校验器
#[derive(Default)]
pub struct CompositeValidator {
    validators: Vec<Box<dyn TranslationValidator>>,
}

impl CompositeValidator {
    pub fn new(validators: Vec<Box<dyn TranslationValidator>>) -> Self {
        Self { validators }
    }

    pub fn with(mut self, validator: impl TranslationValidator + 'static) -> Self {
        self.validators.push(Box::new(validator));
        self
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}

impl TranslationValidator for CompositeValidator {
    fn validate(
        &self,
        original: &[Fragment],
        translated: &FragmentList,
    ) -> Result<(), ValidationError> {
        for validator in &self.validators {
            validator.validate(original, translated)?;
        }
        Ok(())
    }
}
