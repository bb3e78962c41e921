//! 项目（会话）状态
//!
//! 持久化一个工具会话的配置和进度，刷新/重启后可以继续。
//! 只保存文件的轻量描述，不保存文件内容本身。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// 项目状态
///
/// `in_progress → paused → in_progress → completed`，`completed` 为终止状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    InProgress,
    Paused,
    Completed,
}

impl ProjectStatus {
    /// 与序列化结果一致的字符串，用于索引查询
    pub fn as_str(self) -> &'static str {
        match self {
            ProjectStatus::InProgress => "in_progress",
            ProjectStatus::Paused => "paused",
            ProjectStatus::Completed => "completed",
        }
    }

    /// 是否为未完成状态
    pub fn is_incomplete(self) -> bool {
        !matches!(self, ProjectStatus::Completed)
    }
}

/// 文件描述信息
///
/// `extra` 用于保存工具自定义的标记（如页码范围、旋转角度）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFileMetadata {
    pub name: String,
    pub size: u64,
    #[serde(rename = "type", default)]
    pub mime_type: String,
    #[serde(default)]
    pub last_modified: i64,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl ProjectFileMetadata {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
            mime_type: String::new(),
            last_modified: 0,
            extra: Map::new(),
        }
    }

    pub fn with_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    /// 添加工具自定义标记
    pub fn with_marker(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// 持久化的项目记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectState {
    pub id: String,
    pub name: String,
    pub tool_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    pub status: ProjectStatus,
    #[serde(default)]
    pub options: Map<String, JsonValue>,
    #[serde(default)]
    pub file_metadata: Vec<ProjectFileMetadata>,
    pub progress: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProjectState {
    /// 新建项目：`in_progress`，进度 0
    pub fn new(
        name: impl Into<String>,
        tool_id: impl Into<String>,
        tool_name: Option<String>,
        options: Map<String, JsonValue>,
        file_metadata: Vec<ProjectFileMetadata>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: generate_project_id(),
            name: name.into(),
            tool_id: tool_id.into(),
            tool_name,
            status: ProjectStatus::InProgress,
            options,
            file_metadata,
            progress: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// 合并补丁并刷新 `updated_at`
    ///
    /// `id` / `created_at` 不可修改；`completed` 之后状态不再变化且进度固定为 100。
    pub fn apply(&mut self, patch: &ProjectPatch, now: DateTime<Utc>) {
        let was_completed = self.status == ProjectStatus::Completed;

        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(tool_id) = &patch.tool_id {
            self.tool_id = tool_id.clone();
        }
        if let Some(tool_name) = &patch.tool_name {
            self.tool_name = tool_name.clone();
        }
        if let Some(status) = patch.status {
            if !was_completed {
                self.status = status;
            }
        }
        if let Some(options) = &patch.options {
            self.options = options.clone();
        }
        if let Some(file_metadata) = &patch.file_metadata {
            self.file_metadata = file_metadata.clone();
        }
        if let Some(progress) = patch.progress {
            self.progress = progress.min(100);
        }

        if self.status == ProjectStatus::Completed {
            self.progress = 100;
        }
        self.updated_at = now.max(self.updated_at);
    }
}

/// 项目的局部更新
///
/// 字段为 `None` 表示保持不变；`tool_name: Some(None)` 表示清除工具名。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub tool_id: Option<String>,
    pub tool_name: Option<Option<String>>,
    pub status: Option<ProjectStatus>,
    pub options: Option<Map<String, JsonValue>>,
    pub file_metadata: Option<Vec<ProjectFileMetadata>>,
    pub progress: Option<u8>,
}

impl ProjectPatch {
    pub fn status(status: ProjectStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn progress(progress: u8) -> Self {
        Self {
            progress: Some(progress),
            ..Default::default()
        }
    }

    pub fn with_progress(mut self, progress: u8) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_options(mut self, options: Map<String, JsonValue>) -> Self {
        self.options = Some(options);
        self
    }
}

fn generate_project_id() -> String {
    format!("project_{}", uuid::Uuid::new_v4().simple())
}
