//! 基础设施层
//!
//! 持有稀缺资源（数据库连接、导出目录），只向上暴露能力。

pub mod archive;
pub mod export_sink;
pub mod memory_store;
pub mod record_store;
pub mod sqlite_store;

pub use archive::{build_zip, file_stem};
pub use export_sink::{DirectoryExportSink, ExportSink, MemoryExportSink};
pub use memory_store::MemoryRecordStore;
pub use record_store::RecordStore;
pub use sqlite_store::SqliteRecordStore;
