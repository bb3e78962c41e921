//! 记录存储抽象 - 基础设施层
//!
//! 以字符串 `id` 为键的 JSON 文档集合，只暴露项目存储需要的几个操作。
//! 每个操作在单条记录级别是原子的；同一 `id` 的并发写入以最后一次为准。

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::error::StoreError;

/// 嵌入式数据库能力
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// 写入（或覆盖）一条记录，记录必须包含字符串 `id`
    async fn put(&self, record: JsonValue) -> Result<(), StoreError>;

    async fn get(&self, id: &str) -> Result<Option<JsonValue>, StoreError>;

    async fn get_all(&self) -> Result<Vec<JsonValue>, StoreError>;

    /// 按顶层字段等值查询，如 `("toolId", "merge-pdf")`
    async fn get_all_by_index(
        &self,
        field: &str,
        value: &str,
    ) -> Result<Vec<JsonValue>, StoreError>;

    async fn delete(&self, id: &str) -> Result<(), StoreError>;

    async fn clear(&self) -> Result<(), StoreError>;
}

/// 取出记录的 `id`
pub(crate) fn record_id(record: &JsonValue) -> Result<String, StoreError> {
    record
        .get("id")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or(StoreError::MissingId)
}
