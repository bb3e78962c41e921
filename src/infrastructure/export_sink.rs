//! 导出目标 - 基础设施层
//!
//! 调度器只负责决定"导出哪些结果、叫什么名字"，落地方式由 `ExportSink` 决定。

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::ExportError;

/// 导出能力
#[async_trait]
pub trait ExportSink: Send + Sync {
    async fn export(&self, filename: &str, data: Bytes) -> Result<(), ExportError>;
}

/// 写入本地目录：先写临时文件再重命名，避免留下半个文件
pub struct DirectoryExportSink {
    dir: PathBuf,
}

impl DirectoryExportSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl ExportSink for DirectoryExportSink {
    async fn export(&self, filename: &str, data: Bytes) -> Result<(), ExportError> {
        let dir = self.dir.clone();
        let filename = filename.to_string();
        tokio::task::spawn_blocking(move || write_atomic(&dir, &filename, &data))
            .await
            .map_err(|e| ExportError::Io(std::io::Error::other(e.to_string())))?
    }
}

fn write_atomic(dir: &Path, filename: &str, data: &[u8]) -> Result<(), ExportError> {
    let target = dir.join(filename);
    let shown = target.display().to_string();

    std::fs::create_dir_all(dir).map_err(|e| ExportError::write_failed(&shown, e))?;
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| ExportError::write_failed(&shown, e))?;
    tmp.write_all(data)
        .and_then(|_| tmp.flush())
        .map_err(|e| ExportError::write_failed(&shown, e))?;
    tmp.persist(&target)
        .map_err(|e| ExportError::write_failed(&shown, e.error))?;

    debug!("已导出: {} ({} 字节)", shown, data.len());
    Ok(())
}

/// 收集到内存，供测试和上层自行处理
#[derive(Default)]
pub struct MemoryExportSink {
    files: Mutex<Vec<(String, Bytes)>>,
}

impl MemoryExportSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已导出的文件（按导出顺序）
    pub fn files(&self) -> Vec<(String, Bytes)> {
        self.files.lock().clone()
    }
}

#[async_trait]
impl ExportSink for MemoryExportSink {
    async fn export(&self, filename: &str, data: Bytes) -> Result<(), ExportError> {
        self.files.lock().push((filename.to_string(), data));
        Ok(())
    }
}
