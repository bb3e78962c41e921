//! # Doc Batch Kit
//!
//! 文档批处理的任务编排核心：批量调度、可恢复的项目状态、重型模块懒加载
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（数据库连接、导出目录），只暴露能力
//! - `RecordStore` - 以 id 为键的 JSON 记录存储（SQLite / 内存）
//! - `ExportSink` - 导出目标（目录 / 内存）
//! - `build_zip` - 打包导出
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `ProjectStore` - 项目持久化与断点续做
//! - `ModuleLoader` - 模块懒加载、去重、预加载
//! - `RecentFilesLedger` - 最近处理过的文件
//!
//! ### ③ 编排层（Orchestration）
//! - `orchestrator/batch_scheduler` - 有界并发的批量调度器
//! - `orchestrator/app` - 串联扫描、调度、项目快照与导出
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{
    BatchItem, BatchStatus, InputFile, LibraryLoadState, ProjectFileMetadata, ProjectPatch,
    ProjectState, ProjectStatus, RecentFileEntry,
};
pub use orchestrator::{
    processor_fn, App, BatchObserver, BatchOptions, BatchScheduler, BatchSummary, Processor,
    ProgressSink,
};
pub use services::{ModuleLoader, ProjectStore, RecentFilesLedger};
