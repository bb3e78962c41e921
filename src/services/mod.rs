//! 业务能力层（Services Layer）
//!
//! ## 模块划分
//!
//! - `project_store`：项目（会话）持久化，支持断点续做
//! - `module_loader`：重型模块的懒加载、去重和预加载
//! - `recent_files`：最近处理过的文件
//!
//! 本层不持有调度逻辑，只向编排层提供能力。

pub mod module_loader;
pub mod project_store;
pub mod recent_files;

pub use module_loader::{fetcher_fn, ModuleFetcher, ModuleHandle, ModuleLoader};
pub use project_store::ProjectStore;
pub use recent_files::{format_file_size, RecentFilesLedger};
