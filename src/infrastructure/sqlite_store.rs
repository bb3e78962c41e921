use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value as JsonValue;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::infrastructure::record_store::{record_id, RecordStore};

const PRAGMAS: &str = "PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;
PRAGMA busy_timeout = 5000;";

/// SQLite 记录存储
///
/// 每个实例对应一张表（一个 object store）。连接由 `parking_lot::Mutex` 保护，
/// 所有查询都放到 `spawn_blocking` 上执行，避免阻塞 tokio 工作线程。
pub struct SqliteRecordStore {
    conn: Arc<Mutex<Connection>>,
    table: Arc<str>,
    path: PathBuf,
}

impl SqliteRecordStore {
    /// 打开（或创建）数据库文件中的一张记录表
    pub fn open(path: &Path, table: &str) -> Result<Self, StoreError> {
        validate_table_name(table)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(PRAGMAS)?;
        create_table(&conn, table)?;

        info!(path = %path.display(), table, "数据库已打开");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            table: Arc::from(table),
            path: path.to_owned(),
        })
    }

    /// 内存数据库（测试 / 临时会话）
    pub fn in_memory(table: &str) -> Result<Self, StoreError> {
        validate_table_name(table)?;

        let conn = Connection::open_in_memory()?;
        create_table(&conn, table)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            table: Arc::from(table),
            path: PathBuf::from(":memory:"),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 在阻塞线程池中使用连接
    async fn with_conn<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection, &str) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        let table = self.table.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock();
            f(&conn, &table)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn put(&self, record: JsonValue) -> Result<(), StoreError> {
        let id = record_id(&record)?;
        let data = serde_json::to_string(&record)?;
        self.with_conn(move |conn, table| {
            conn.execute(
                &format!("INSERT OR REPLACE INTO {table} (id, data) VALUES (?1, ?2)"),
                params![id, data],
            )?;
            debug!(table, id = %id, "记录已写入");
            Ok(())
        })
        .await
    }

    async fn get(&self, id: &str) -> Result<Option<JsonValue>, StoreError> {
        let id = id.to_string();
        self.with_conn(move |conn, table| {
            let data: Option<String> = conn
                .query_row(
                    &format!("SELECT data FROM {table} WHERE id = ?1"),
                    params![id],
                    |row| row.get(0),
                )
                .optional()?;
            match data {
                Some(data) => Ok(Some(serde_json::from_str(&data)?)),
                None => Ok(None),
            }
        })
        .await
    }

    async fn get_all(&self) -> Result<Vec<JsonValue>, StoreError> {
        self.with_conn(|conn, table| {
            let mut stmt = conn.prepare(&format!("SELECT data FROM {table} ORDER BY rowid"))?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
            decode_rows(rows)
        })
        .await
    }

    async fn get_all_by_index(
        &self,
        field: &str,
        value: &str,
    ) -> Result<Vec<JsonValue>, StoreError> {
        let path = format!("$.{field}");
        let value = value.to_string();
        self.with_conn(move |conn, table| {
            let mut stmt = conn.prepare(&format!(
                "SELECT data FROM {table} WHERE json_extract(data, ?1) = ?2 ORDER BY rowid"
            ))?;
            let rows = stmt.query_map(params![path, value], |row| row.get::<_, String>(0))?;
            decode_rows(rows)
        })
        .await
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let id = id.to_string();
        self.with_conn(move |conn, table| {
            conn.execute(&format!("DELETE FROM {table} WHERE id = ?1"), params![id])?;
            Ok(())
        })
        .await
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.with_conn(|conn, table| {
            conn.execute(&format!("DELETE FROM {table}"), [])?;
            Ok(())
        })
        .await
    }
}

fn create_table(conn: &Connection, table: &str) -> Result<(), StoreError> {
    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {table} (
            id   TEXT PRIMARY KEY NOT NULL,
            data TEXT NOT NULL
        );"
    ))?;
    Ok(())
}

/// 表名会被拼进 SQL，只允许字母、数字和下划线
fn validate_table_name(table: &str) -> Result<(), StoreError> {
    let valid = !table.is_empty()
        && table
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !table.starts_with(|c: char| c.is_ascii_digit());
    if valid {
        Ok(())
    } else {
        Err(StoreError::Unavailable(format!("非法表名: {table}")))
    }
}

fn decode_rows<I>(rows: I) -> Result<Vec<JsonValue>, StoreError>
where
    I: Iterator<Item = rusqlite::Result<String>>,
{
    let mut records = Vec::new();
    for row in rows {
        records.push(serde_json::from_str(&row?)?);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn put_get_roundtrip_and_overwrite() {
        let store = SqliteRecordStore::in_memory("projects").unwrap();
        store.put(json!({"id": "p1", "name": "a"})).await.unwrap();
        store.put(json!({"id": "p1", "name": "b"})).await.unwrap();

        let got = store.get("p1").await.unwrap().unwrap();
        assert_eq!(got["name"], json!("b"));
        assert_eq!(store.get_all().await.unwrap().len(), 1);
        assert!(store.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn index_query_matches_top_level_field() {
        let store = SqliteRecordStore::in_memory("projects").unwrap();
        store.put(json!({"id": "1", "toolId": "merge-pdf"})).await.unwrap();
        store.put(json!({"id": "2", "toolId": "split-pdf"})).await.unwrap();
        store.put(json!({"id": "3", "toolId": "merge-pdf"})).await.unwrap();

        let merged = store.get_all_by_index("toolId", "merge-pdf").await.unwrap();
        let ids: Vec<_> = merged.iter().map(|r| r["id"].clone()).collect();
        assert_eq!(ids, vec![json!("1"), json!("3")]);
    }

    #[tokio::test]
    async fn delete_and_clear() {
        let store = SqliteRecordStore::in_memory("projects").unwrap();
        store.put(json!({"id": "1"})).await.unwrap();
        store.put(json!({"id": "2"})).await.unwrap();

        store.delete("1").await.unwrap();
        assert!(store.get("1").await.unwrap().is_none());
        store.clear().await.unwrap();
        assert!(store.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn record_without_id_is_rejected() {
        let store = SqliteRecordStore::in_memory("projects").unwrap();
        let err = store.put(json!({"name": "x"})).await.unwrap_err();
        assert!(matches!(err, StoreError::MissingId));
    }

    #[test]
    fn rejects_unsafe_table_names() {
        assert!(SqliteRecordStore::in_memory("projects; DROP").is_err());
        assert!(SqliteRecordStore::in_memory("1abc").is_err());
    }

    #[tokio::test]
    async fn file_database_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("projects.db");
        {
            let store = SqliteRecordStore::open(&path, "projects").unwrap();
            store.put(json!({"id": "keep"})).await.unwrap();
        }
        let store = SqliteRecordStore::open(&path, "projects").unwrap();
        assert!(store.get("keep").await.unwrap().is_some());
        assert_eq!(store.path(), path.as_path());
    }
}
