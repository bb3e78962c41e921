//! 批量处理条目
//!
//! 条目只在内存中存在：入队时创建，调用方清空列表时丢弃。

use bytes::Bytes;
use serde::Serialize;

/// 待处理的输入文件
///
/// 由调用方持有，调度器只读取。`data` 为 `Bytes`，克隆开销很小。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub name: String,
    pub data: Bytes,
}

impl InputFile {
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }

    /// 文件大小（字节）
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// 条目状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

impl BatchStatus {
    /// 是否为终止状态
    pub fn is_terminal(self) -> bool {
        matches!(self, BatchStatus::Completed | BatchStatus::Error)
    }
}

/// 单个批量处理条目
///
/// 不变量：
/// - `result` 只在 `Completed` 时存在，`error_message` 只在 `Error` 时存在
/// - `progress == 100` 当且仅当 `status == Completed`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchItem {
    pub id: String,
    pub input: InputFile,
    pub status: BatchStatus,
    pub progress: u8,
    pub result: Option<Bytes>,
    pub error_message: Option<String>,
}

impl BatchItem {
    /// 创建新的待处理条目
    pub fn pending(input: InputFile) -> Self {
        Self {
            id: generate_item_id(),
            input,
            status: BatchStatus::Pending,
            progress: 0,
            result: None,
            error_message: None,
        }
    }

    pub(crate) fn mark_processing(&mut self) {
        self.status = BatchStatus::Processing;
        self.progress = 0;
        self.result = None;
        self.error_message = None;
    }

    /// 处理中的进度上报：不回退，且在完成前最多到 99
    pub(crate) fn report_progress(&mut self, progress: u8) {
        if self.status != BatchStatus::Processing {
            return;
        }
        let clamped = progress.min(99);
        if clamped > self.progress {
            self.progress = clamped;
        }
    }

    pub(crate) fn mark_completed(&mut self, result: Bytes) {
        self.status = BatchStatus::Completed;
        self.progress = 100;
        self.result = Some(result);
        self.error_message = None;
    }

    pub(crate) fn mark_error(&mut self, message: String) {
        self.status = BatchStatus::Error;
        if self.progress >= 100 {
            self.progress = 99;
        }
        self.result = None;
        self.error_message = Some(message);
    }

    /// 被中断的条目退回待处理，下次 `start()` 会重新处理
    pub(crate) fn reset_pending(&mut self) {
        if self.status == BatchStatus::Processing {
            self.status = BatchStatus::Pending;
            self.progress = 0;
        }
    }
}

fn generate_item_id() -> String {
    format!("batch_{}", uuid::Uuid::new_v4().simple())
}
