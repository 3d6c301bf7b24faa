//! 批次划分
//!
//! 把片段列表切分为固定大小的块，并生成每块发送给服务端的用户消息。

use crate::translation::model::Fragment;

/// 一个待发送的块
#[derive(Debug, Clone, Copy)]
pub struct Chunk<'a> {
    /// 从1开始的块序号
    pub number: usize,
    pub total: usize,
    pub fragments: &'a [Fragment],
}

impl<'a> Chunk<'a> {
    pub fn is_last(&self) -> bool {
        self.number == self.total
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// 用户消息：每行一个 `"<id>: <text>"`
    pub fn user_payload(&self) -> String {
        render_user_payload(self.fragments)
    }
}

/// 按固定大小划分片段；`batch_size` 为0时视为1
pub fn plan_chunks(fragments: &[Fragment], batch_size: usize) -> Vec<Chunk<'_>> {
    let size = batch_size.max(1);
    let total = fragments.len().div_ceil(size);

    fragments
        .chunks(size)
        .enumerate()
        .map(|(index, slice)| Chunk {
            number: index + 1,
            total,
            fragments: slice,
        })
        .collect()
}

pub fn render_user_payload(fragments: &[Fragment]) -> String {
    fragments
        .iter()
        .map(|fragment| format!("{}: {}", fragment.id, fragment.text))
        .collect::<Vec<_>>()
        .join("\n")
}
