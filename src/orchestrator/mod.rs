//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量调度和流程串联，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_scheduler` - 批量调度器
//! - 管理条目生命周期（pending → processing → completed / error）
//! - 控制并发数量（Semaphore）
//! - 协作式取消（CancellationToken）
//! - 汇总进度、导出结果
//!
//! ### `app` - 应用主结构
//! - 持有模块加载器、项目存储、最近文件记录和调度器
//! - 扫描输入目录、写回项目进度、打包导出
//!
//! ## 层次关系
//!
//! ```text
//! app (扫描输入 / 项目快照 / 导出)
//!     ↓
//! batch_scheduler (处理 Vec<BatchItem>)
//!     ↓
//! Processor (调用方提供，可依赖 services::ModuleLoader)
//!     ↓
//! infrastructure (RecordStore / ExportSink / zip)
//! ```

pub mod app;
pub mod batch_scheduler;

pub use app::App;
pub use batch_scheduler::{
    processor_fn, BatchObserver, BatchOptions, BatchScheduler, BatchSummary, Processor,
    ProgressSink,
};
