use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value as JsonValue;

use crate::error::StoreError;
use crate::infrastructure::record_store::{record_id, RecordStore};

/// 纯内存记录存储，保持插入顺序
///
/// 用于测试，以及不需要跨进程保留的临时会话。
#[derive(Default)]
pub struct MemoryRecordStore {
    records: Mutex<Vec<(String, JsonValue)>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn put(&self, record: JsonValue) -> Result<(), StoreError> {
        let id = record_id(&record)?;
        let mut records = self.records.lock();
        records.retain(|(existing, _)| existing != &id);
        records.push((id, record));
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<JsonValue>, StoreError> {
        Ok(self
            .records
            .lock()
            .iter()
            .find(|(existing, _)| existing == id)
            .map(|(_, record)| record.clone()))
    }

    async fn get_all(&self) -> Result<Vec<JsonValue>, StoreError> {
        Ok(self.records.lock().iter().map(|(_, r)| r.clone()).collect())
    }

    async fn get_all_by_index(
        &self,
        field: &str,
        value: &str,
    ) -> Result<Vec<JsonValue>, StoreError> {
        Ok(self
            .records
            .lock()
            .iter()
            .filter(|(_, r)| r.get(field).and_then(|v| v.as_str()) == Some(value))
            .map(|(_, r)| r.clone())
            .collect())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.records.lock().retain(|(existing, _)| existing != id);
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.records.lock().clear();
        Ok(())
    }
}
