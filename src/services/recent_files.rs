//! 最近文件记录 - 业务能力层
//!
//! 有上限的"最近处理过的文件"列表，最新的在前。
//! 可选地持久化到一个 JSON 文件；持久化失败只记日志，不影响内存中的列表。

use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::models::RecentFileEntry;

/// 默认容量
pub const DEFAULT_CAPACITY: usize = 10;

pub struct RecentFilesLedger {
    entries: Mutex<Vec<RecentFileEntry>>,
    capacity: usize,
    path: Option<PathBuf>,
}

impl RecentFilesLedger {
    /// 从 JSON 文件恢复；文件不存在或损坏时从空列表开始
    pub fn open(path: impl Into<PathBuf>, capacity: usize) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<Vec<RecentFileEntry>>(&content) {
                Ok(mut entries) => {
                    entries.truncate(capacity.max(1));
                    entries
                }
                Err(e) => {
                    warn!("⚠️ 最近文件记录损坏，已忽略: {} ({})", path.display(), e);
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                warn!("⚠️ 读取最近文件记录失败: {} ({})", path.display(), e);
                Vec::new()
            }
        };

        Self {
            entries: Mutex::new(entries),
            capacity: capacity.max(1),
            path: Some(path),
        }
    }

    /// 不落盘的列表
    pub fn in_memory(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            capacity: capacity.max(1),
            path: None,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 记录一次处理；同名同工具的旧记录会被替换
    pub fn add(
        &self,
        name: &str,
        size: u64,
        tool_used: &str,
        tool_name: Option<&str>,
    ) -> RecentFileEntry {
        let entry = RecentFileEntry::new(name, size, tool_used, tool_name.map(str::to_string));
        let snapshot = {
            let mut entries = self.entries.lock();
            entries.retain(|e| !(e.name == entry.name && e.tool_used == entry.tool_used));
            entries.insert(0, entry.clone());
            entries.truncate(self.capacity);
            entries.clone()
        };
        self.persist(&snapshot);
        entry
    }

    pub fn remove(&self, id: &str) {
        let snapshot = {
            let mut entries = self.entries.lock();
            entries.retain(|e| e.id != id);
            entries.clone()
        };
        self.persist(&snapshot);
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
        self.persist(&[]);
    }

    /// 最新的在前
    pub fn list(&self) -> Vec<RecentFileEntry> {
        self.entries.lock().clone()
    }

    fn persist(&self, entries: &[RecentFileEntry]) {
        let Some(path) = &self.path else {
            return;
        };
        if let Err(e) = write_json_atomic(path, entries) {
            warn!("⚠️ 保存最近文件记录失败: {} ({})", path.display(), e);
        } else {
            debug!("最近文件记录已保存 ({} 条)", entries.len());
        }
    }
}

fn write_json_atomic(path: &Path, entries: &[RecentFileEntry]) -> anyhow::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let json = serde_json::to_vec_pretty(entries)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(&json)?;
    tmp.flush()?;
    tmp.persist(path)?;
    Ok(())
}

/// 文件大小的可读形式，例如 `1.5 MB`
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}
