//! 重型模块加载协调 - 业务能力层
//!
//! 按名字懒加载重型处理模块：
//! - 并发的 `load()` 共享同一次进行中的拉取，不会重复下载
//! - 拉取在独立任务中执行，调用方放弃等待也不影响状态落定
//! - 失败不缓存，下一次显式 `load()` 会重新拉取
//! - 支持分组（如 `both`）和带防抖的预加载（悬停 / 聚焦时触发）

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::LoaderError;
use crate::models::LibraryLoadState;

/// 已加载的模块，由调用方自行 downcast
pub type ModuleHandle = Arc<dyn Any + Send + Sync>;

/// 默认预加载延迟
pub const DEFAULT_PRELOAD_DELAY: Duration = Duration::from_millis(200);

/// 模块拉取能力
#[async_trait]
pub trait ModuleFetcher: Send + Sync {
    async fn fetch(&self, name: &str) -> anyhow::Result<ModuleHandle>;
}

/// 把闭包包装成 `ModuleFetcher`
pub fn fetcher_fn<F, Fut>(f: F) -> Arc<dyn ModuleFetcher>
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<ModuleHandle>> + Send + 'static,
{
    Arc::new(FnFetcher(f))
}

struct FnFetcher<F>(F);

#[async_trait]
impl<F, Fut> ModuleFetcher for FnFetcher<F>
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<ModuleHandle>> + Send + 'static,
{
    async fn fetch(&self, name: &str) -> anyhow::Result<ModuleHandle> {
        (self.0)(name.to_string()).await
    }
}

type LoadFuture = Shared<BoxFuture<'static, Result<ModuleHandle, LoaderError>>>;

enum Slot {
    Unloaded,
    Loading(LoadFuture),
    Loaded(ModuleHandle),
    Failed(String),
}

impl Slot {
    fn state(&self) -> LibraryLoadState {
        match self {
            Slot::Unloaded => LibraryLoadState::Unloaded,
            Slot::Loading(_) => LibraryLoadState::Loading,
            Slot::Loaded(_) => LibraryLoadState::Loaded,
            Slot::Failed(_) => LibraryLoadState::Error,
        }
    }
}

struct ModuleEntry {
    fetcher: Arc<dyn ModuleFetcher>,
    slot: Slot,
    /// 当前加载尝试的编号，0 表示尚未加载
    attempt: u64,
}

struct Inner {
    modules: Mutex<HashMap<String, ModuleEntry>>,
    groups: Mutex<HashMap<String, Vec<String>>>,
    preload: Mutex<Option<JoinHandle<()>>>,
    preload_delay: Duration,
    next_attempt: AtomicU64,
}

impl Inner {
    fn finish(&self, name: &str, attempt: u64, result: &Result<ModuleHandle, LoaderError>) {
        let mut modules = self.modules.lock();
        let Some(entry) = modules.get_mut(name) else {
            return;
        };
        // 只落定同一次尝试；模块被重新注册后，旧任务的结果直接丢弃
        if entry.attempt != attempt || !matches!(entry.slot, Slot::Loading(_)) {
            debug!("丢弃过期的加载结果: {} (#{})", name, attempt);
            return;
        }
        entry.slot = match result {
            Ok(handle) => {
                info!("✓ 模块已加载: {}", name);
                Slot::Loaded(handle.clone())
            }
            Err(e) => {
                warn!("⚠️ 模块加载失败: {}", e);
                Slot::Failed(e.to_string())
            }
        };
    }
}

enum Attempt {
    Ready(ModuleHandle),
    Pending(LoadFuture),
}

/// 模块加载协调器
///
/// 可以随意 clone，所有副本共享同一份注册表和状态。
#[derive(Clone)]
pub struct ModuleLoader {
    inner: Arc<Inner>,
}

impl Default for ModuleLoader {
    fn default() -> Self {
        Self::new(DEFAULT_PRELOAD_DELAY)
    }
}

impl ModuleLoader {
    pub fn new(preload_delay: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                modules: Mutex::new(HashMap::new()),
                groups: Mutex::new(HashMap::new()),
                preload: Mutex::new(None),
                preload_delay,
                next_attempt: AtomicU64::new(1),
            }),
        }
    }

    /// 注册模块；重复注册会重置为未加载
    pub fn register(&self, name: impl Into<String>, fetcher: Arc<dyn ModuleFetcher>) {
        let name = name.into();
        debug!("注册模块: {}", name);
        self.inner.modules.lock().insert(
            name,
            ModuleEntry {
                fetcher,
                slot: Slot::Unloaded,
                attempt: 0,
            },
        );
    }

    /// 注册分组，加载分组时等待所有成员
    pub fn register_group<I, S>(&self, name: impl Into<String>, members: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let members = members.into_iter().map(Into::into).collect();
        self.inner.groups.lock().insert(name.into(), members);
    }

    /// 加载模块或分组
    pub async fn load(&self, name: &str) -> Result<(), LoaderError> {
        let members = self.inner.groups.lock().get(name).cloned();
        match members {
            Some(members) => {
                futures::future::try_join_all(members.iter().map(|m| self.load_module(m)))
                    .await?;
                Ok(())
            }
            None => self.load_module(name).await.map(|_| ()),
        }
    }

    /// 加载单个模块并返回句柄
    pub async fn load_module(&self, name: &str) -> Result<ModuleHandle, LoaderError> {
        match self.begin(name)? {
            Attempt::Ready(handle) => Ok(handle),
            Attempt::Pending(load) => load.await,
        }
    }

    fn begin(&self, name: &str) -> Result<Attempt, LoaderError> {
        let mut modules = self.inner.modules.lock();
        let entry = modules
            .get_mut(name)
            .ok_or_else(|| LoaderError::UnknownModule(name.to_string()))?;

        match &entry.slot {
            Slot::Loaded(handle) => return Ok(Attempt::Ready(handle.clone())),
            Slot::Loading(load) => return Ok(Attempt::Pending(load.clone())),
            Slot::Unloaded | Slot::Failed(_) => {}
        }

        let attempt = self.inner.next_attempt.fetch_add(1, Ordering::Relaxed);
        debug!("开始加载模块: {} (#{})", name, attempt);
        let fetcher = entry.fetcher.clone();
        let inner = self.inner.clone();
        let module = name.to_string();
        let task = tokio::spawn(async move {
            let result = fetcher
                .fetch(&module)
                .await
                .map_err(|e| LoaderError::fetch_failed(&module, format!("{e:#}")));
            inner.finish(&module, attempt, &result);
            result
        });

        let inner = self.inner.clone();
        let module = name.to_string();
        let load = async move {
            match task.await {
                Ok(result) => result,
                Err(e) => {
                    // 拉取任务 panic：同样落定为失败
                    let result = Err(LoaderError::fetch_failed(&module, e.to_string()));
                    inner.finish(&module, attempt, &result);
                    result
                }
            }
        }
        .boxed()
        .shared();

        entry.slot = Slot::Loading(load.clone());
        entry.attempt = attempt;
        Ok(Attempt::Pending(load))
    }

    /// 所有已注册模块的状态快照
    pub fn status(&self) -> BTreeMap<String, LibraryLoadState> {
        self.inner
            .modules
            .lock()
            .iter()
            .map(|(name, entry)| (name.clone(), entry.slot.state()))
            .collect()
    }

    pub fn state(&self, name: &str) -> Option<LibraryLoadState> {
        self.inner.modules.lock().get(name).map(|e| e.slot.state())
    }

    /// 模块或分组是否已全部加载
    pub fn is_loaded(&self, name: &str) -> bool {
        let members = self.inner.groups.lock().get(name).cloned();
        let modules = self.inner.modules.lock();
        let loaded = |m: &str| matches!(modules.get(m).map(|e| &e.slot), Some(Slot::Loaded(_)));
        match members {
            Some(members) => members.iter().all(|m| loaded(m)),
            None => loaded(name),
        }
    }

    /// 已加载模块的句柄
    pub fn module(&self, name: &str) -> Option<ModuleHandle> {
        match self.inner.modules.lock().get(name).map(|e| &e.slot) {
            Some(Slot::Loaded(handle)) => Some(handle.clone()),
            _ => None,
        }
    }

    /// 最近一次加载失败的原因
    pub fn last_failure(&self, name: &str) -> Option<String> {
        match self.inner.modules.lock().get(name).map(|e| &e.slot) {
            Some(Slot::Failed(message)) => Some(message.clone()),
            _ => None,
        }
    }

    // ========== 预加载 ==========

    /// 延迟 `delay` 后在后台加载，新的预加载会取代尚未触发的旧预加载
    pub fn start_preload(&self, name: &str, delay: Duration) {
        let loader = self.clone();
        let target = name.to_string();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = loader.load(&target).await {
                debug!("预加载失败（已忽略）: {}", e);
            }
        });

        if let Some(previous) = self.inner.preload.lock().replace(handle) {
            previous.abort();
        }
    }

    /// 取消尚未触发的预加载；已经开始的拉取不受影响
    pub fn cancel_preload(&self) {
        if let Some(pending) = self.inner.preload.lock().take() {
            pending.abort();
        }
    }

    /// 悬停 / 聚焦：按默认延迟预加载
    pub fn on_hover(&self, name: &str) {
        self.start_preload(name, self.inner.preload_delay);
    }

    /// 离开 / 失焦
    pub fn on_leave(&self) {
        self.cancel_preload();
    }
}
