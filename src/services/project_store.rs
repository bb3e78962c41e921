//! 项目存储服务 - 业务能力层
//!
//! 把工具会话保存到嵌入式数据库，支持列出、按工具筛选、筛选未完成项目、
//! 局部更新和删除。
//!
//! ## 失败语义
//! - 数据库可用性只在 `open` 时检测一次；不可用时所有写操作直接返回，查询返回空
//! - 单次操作失败只记录到 `last_error`，不向外抛出，内存中的状态保持不变

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use serde_json::{Map, Value as JsonValue};
use tracing::{debug, error, info, warn};

use crate::error::StoreError;
use crate::infrastructure::{MemoryRecordStore, RecordStore, SqliteRecordStore};
use crate::models::{ProjectFileMetadata, ProjectPatch, ProjectState, ProjectStatus};

/// 项目记录所在的表
pub const PROJECTS_TABLE: &str = "projects";

/// 项目存储
pub struct ProjectStore {
    backend: Option<Arc<dyn RecordStore>>,
    current: Mutex<Option<ProjectState>>,
    projects: Mutex<Vec<ProjectState>>,
    last_error: Mutex<Option<String>>,
}

impl ProjectStore {
    /// 打开数据库文件；失败时降级为"不可用"而不是报错
    pub fn open(path: &Path) -> Self {
        match SqliteRecordStore::open(path, PROJECTS_TABLE) {
            Ok(store) => Self::with_backend(Arc::new(store)),
            Err(e) => {
                warn!("⚠️ 项目数据库不可用，进度将不会被保存: {}", e);
                Self::unavailable()
            }
        }
    }

    /// 使用指定的存储后端
    pub fn with_backend(backend: Arc<dyn RecordStore>) -> Self {
        Self {
            backend: Some(backend),
            current: Mutex::new(None),
            projects: Mutex::new(Vec::new()),
            last_error: Mutex::new(None),
        }
    }

    /// 纯内存存储
    pub fn in_memory() -> Self {
        Self::with_backend(Arc::new(MemoryRecordStore::new()))
    }

    /// 不可用的存储：所有操作都是空操作
    pub fn unavailable() -> Self {
        Self {
            backend: None,
            current: Mutex::new(None),
            projects: Mutex::new(Vec::new()),
            last_error: Mutex::new(None),
        }
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    /// 最近一次失败的描述
    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }

    /// 当前加载的项目
    pub fn current(&self) -> Option<ProjectState> {
        self.current.lock().clone()
    }

    /// 最近一次 `refresh` 得到的项目列表
    pub fn projects(&self) -> Vec<ProjectState> {
        self.projects.lock().clone()
    }

    // ========== 增删改查 ==========

    /// 新建项目并设为当前项目
    pub async fn create(
        &self,
        name: &str,
        tool_id: &str,
        tool_name: Option<&str>,
        options: Option<Map<String, JsonValue>>,
        file_metadata: Option<Vec<ProjectFileMetadata>>,
    ) -> Option<ProjectState> {
        let backend = self.backend.as_ref()?;
        let project = ProjectState::new(
            name,
            tool_id,
            tool_name.map(str::to_string),
            options.unwrap_or_default(),
            file_metadata.unwrap_or_default(),
        );

        let saved = async {
            backend.put(serde_json::to_value(&project)?).await?;
            Ok::<_, StoreError>(())
        }
        .await;

        match saved {
            Ok(()) => {
                info!("✓ 已创建项目 {} ({})", project.name, project.id);
                *self.current.lock() = Some(project.clone());
                self.clear_error();
                self.refresh().await;
                Some(project)
            }
            Err(e) => {
                self.record_error("创建项目失败", &e);
                None
            }
        }
    }

    /// 读取项目，不存在时返回 `None`
    pub async fn get(&self, id: &str) -> Option<ProjectState> {
        let backend = self.backend.as_ref()?;
        match fetch_project(backend.as_ref(), id).await {
            Ok(project) => project,
            Err(e) => {
                self.record_error("读取项目失败", &e);
                None
            }
        }
    }

    /// 读取项目并设为当前项目
    pub async fn load(&self, id: &str) -> Option<ProjectState> {
        let project = self.get(id).await?;
        debug!("加载项目 {} ({:?})", project.id, project.status);
        *self.current.lock() = Some(project.clone());
        self.clear_error();
        Some(project)
    }

    /// 局部更新；项目不存在时返回 `None`
    pub async fn update(&self, id: &str, patch: &ProjectPatch) -> Option<ProjectState> {
        let backend = self.backend.as_ref()?;

        let result = async {
            let Some(mut project) = fetch_project(backend.as_ref(), id).await? else {
                return Ok(None);
            };
            project.apply(patch, Utc::now());
            backend.put(serde_json::to_value(&project)?).await?;
            Ok::<_, StoreError>(Some(project))
        }
        .await;

        match result {
            Ok(Some(project)) => {
                {
                    let mut current = self.current.lock();
                    if current.as_ref().is_some_and(|c| c.id == project.id) {
                        *current = Some(project.clone());
                    }
                }
                self.clear_error();
                self.refresh().await;
                Some(project)
            }
            Ok(None) => {
                debug!("更新被忽略，项目不存在: {}", id);
                None
            }
            Err(e) => {
                self.record_error("保存项目失败", &e);
                None
            }
        }
    }

    /// 更新当前项目
    pub async fn save_current(&self, patch: &ProjectPatch) -> Option<ProjectState> {
        let id = self.current.lock().as_ref().map(|p| p.id.clone())?;
        self.update(&id, patch).await
    }

    /// 暂停当前项目
    pub async fn pause(&self) -> Option<ProjectState> {
        self.save_current(&ProjectPatch::status(ProjectStatus::Paused))
            .await
    }

    /// 完成当前项目（进度置为 100），并解除当前项目
    pub async fn complete(&self) -> Option<ProjectState> {
        let patch = ProjectPatch::status(ProjectStatus::Completed).with_progress(100);
        let project = self.save_current(&patch).await;
        *self.current.lock() = None;
        project
    }

    pub async fn delete(&self, id: &str) {
        let Some(backend) = self.backend.as_ref() else {
            return;
        };
        match backend.delete(id).await {
            Ok(()) => {
                {
                    let mut current = self.current.lock();
                    if current.as_ref().is_some_and(|c| c.id == id) {
                        *current = None;
                    }
                }
                self.clear_error();
                self.refresh().await;
            }
            Err(e) => self.record_error("删除项目失败", &e),
        }
    }

    pub async fn clear_all(&self) {
        let Some(backend) = self.backend.as_ref() else {
            return;
        };
        match backend.clear().await {
            Ok(()) => {
                self.projects.lock().clear();
                *self.current.lock() = None;
                self.clear_error();
            }
            Err(e) => self.record_error("清空项目失败", &e),
        }
    }

    // ========== 查询 ==========

    /// 全部项目，最近更新的在前
    pub async fn list_all(&self) -> Vec<ProjectState> {
        let Some(backend) = self.backend.as_ref() else {
            return Vec::new();
        };
        match backend.get_all().await.and_then(decode_projects) {
            Ok(projects) => projects,
            Err(e) => {
                warn!("读取项目列表失败: {}", e);
                Vec::new()
            }
        }
    }

    pub async fn list_by_tool(&self, tool_id: &str) -> Vec<ProjectState> {
        let Some(backend) = self.backend.as_ref() else {
            return Vec::new();
        };
        match backend
            .get_all_by_index("toolId", tool_id)
            .await
            .and_then(decode_projects)
        {
            Ok(projects) => projects,
            Err(e) => {
                warn!("按工具读取项目失败 ({}): {}", tool_id, e);
                Vec::new()
            }
        }
    }

    /// 状态为 `in_progress` 或 `paused` 的项目
    pub async fn list_incomplete(&self) -> Vec<ProjectState> {
        let Some(backend) = self.backend.as_ref() else {
            return Vec::new();
        };

        let mut records = Vec::new();
        for status in [ProjectStatus::InProgress, ProjectStatus::Paused] {
            match backend.get_all_by_index("status", status.as_str()).await {
                Ok(mut found) => records.append(&mut found),
                Err(e) => {
                    warn!("读取未完成项目失败: {}", e);
                    return Vec::new();
                }
            }
        }

        match decode_projects(records) {
            Ok(projects) => projects
                .into_iter()
                .filter(|p| p.status.is_incomplete())
                .collect(),
            Err(e) => {
                warn!("读取未完成项目失败: {}", e);
                Vec::new()
            }
        }
    }

    /// 重新读取项目列表缓存
    pub async fn refresh(&self) {
        let Some(backend) = self.backend.as_ref() else {
            return;
        };
        match backend.get_all().await.and_then(decode_projects) {
            Ok(projects) => *self.projects.lock() = projects,
            Err(e) => self.record_error("刷新项目列表失败", &e),
        }
    }

    // ========== 错误记录 ==========

    fn record_error(&self, action: &str, err: &StoreError) {
        error!("{}: {}", action, err);
        *self.last_error.lock() = Some(format!("{action}: {err}"));
    }

    fn clear_error(&self) {
        *self.last_error.lock() = None;
    }
}

async fn fetch_project(
    backend: &dyn RecordStore,
    id: &str,
) -> Result<Option<ProjectState>, StoreError> {
    match backend.get(id).await? {
        Some(record) => Ok(Some(serde_json::from_value(record)?)),
        None => Ok(None),
    }
}

fn decode_projects(records: Vec<JsonValue>) -> Result<Vec<ProjectState>, StoreError> {
    let mut projects = records
        .into_iter()
        .map(serde_json::from_value::<ProjectState>)
        .collect::<Result<Vec<_>, _>>()?;
    projects.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    Ok(projects)
}
