use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 最近处理过的文件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentFileEntry {
    pub id: String,
    pub name: String,
    pub size: u64,
    pub tool_used: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl RecentFileEntry {
    pub fn new(
        name: impl Into<String>,
        size: u64,
        tool_used: impl Into<String>,
        tool_name: Option<String>,
    ) -> Self {
        Self {
            id: format!("recent_{}", uuid::Uuid::new_v4().simple()),
            name: name.into(),
            size,
            tool_used: tool_used.into(),
            tool_name,
            timestamp: Utc::now(),
        }
    }
}
