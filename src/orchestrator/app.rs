//! 应用主结构 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：日志文件、模块加载器、项目存储、最近文件记录
//! 2. **批量加载**：扫描输入目录，把所有文件入队
//! 3. **项目快照**：处理前创建项目，结束后写回进度并完成 / 暂停
//! 4. **导出**：把已完成的结果打包到输出目录
//! 5. **全局统计**：输出成功 / 失败数量

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use serde_json::{json, Map};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::DirectoryExportSink;
use crate::models::{BatchStatus, InputFile, ProjectFileMetadata, ProjectPatch};
use crate::orchestrator::batch_scheduler::{BatchOptions, BatchScheduler, BatchSummary, Processor};
use crate::services::{ModuleLoader, ProjectStore, RecentFilesLedger};
use crate::utils::logging;

/// 应用主结构
pub struct App {
    config: Config,
    loader: ModuleLoader,
    projects: ProjectStore,
    recent_files: RecentFilesLedger,
    scheduler: Arc<BatchScheduler>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        logging::init_log_file(&config.output_log_file)?;
        logging::log_startup(config.max_concurrent);

        let loader = ModuleLoader::new(Duration::from_millis(config.preload_delay_ms));

        let projects = ProjectStore::open(Path::new(&config.database_path));
        if projects.is_available() {
            info!("✓ 项目数据库: {}", config.database_path);
        }

        let recent_files =
            RecentFilesLedger::open(&config.recent_files_path, config.recent_files_capacity);
        let scheduler = Arc::new(BatchScheduler::new(BatchOptions::from(&config)));

        Ok(Self {
            config,
            loader,
            projects,
            recent_files,
            scheduler,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn loader(&self) -> &ModuleLoader {
        &self.loader
    }

    pub fn projects(&self) -> &ProjectStore {
        &self.projects
    }

    pub fn recent_files(&self) -> &RecentFilesLedger {
        &self.recent_files
    }

    /// 共享的调度器，可用于在运行中取消
    pub fn scheduler(&self) -> Arc<BatchScheduler> {
        self.scheduler.clone()
    }

    /// 运行应用主逻辑
    ///
    /// 没有待处理文件或调度器已在运行时返回 `None`。
    pub async fn run(&self, tool_id: &str, processor: Arc<dyn Processor>) -> Result<Option<BatchSummary>> {
        let inputs = self.load_inputs().await?;
        if inputs.is_empty() {
            warn!("⚠️ 没有找到待处理的文件，程序结束");
            return Ok(None);
        }
        logging::log_files_loaded(inputs.len(), self.config.max_concurrent);

        let file_metadata = inputs
            .iter()
            .map(|input| {
                ProjectFileMetadata::new(&input.name, input.size()).with_type(guess_mime(&input.name))
            })
            .collect();
        self.scheduler.add_items(inputs);

        let project = self
            .projects
            .create(
                &format!("批量处理 {}", chrono::Local::now().format("%Y-%m-%d %H:%M")),
                tool_id,
                None,
                Some(self.project_options()),
                Some(file_metadata),
            )
            .await;

        let Some(summary) = self.scheduler.start(processor).await else {
            return Ok(None);
        };

        for item in summary.items.iter().filter(|i| i.status == BatchStatus::Completed) {
            self.recent_files.add(&item.input.name, item.input.size(), tool_id, None);
        }

        if project.is_some() {
            self.projects
                .save_current(&ProjectPatch::progress(self.scheduler.overall_progress()))
                .await;
            if summary.cancelled || summary.pending() > 0 {
                self.projects.pause().await;
            } else {
                self.projects.complete().await;
            }
        }

        if let Some(path) = self.export_results().await? {
            info!("📁 结果已保存至: {}", path.display());
        }

        logging::print_final_stats(
            summary.completed(),
            summary.failed(),
            summary.items.len(),
            &self.config.output_log_file,
        );

        Ok(Some(summary))
    }

    /// 把已完成的结果打包到输出目录，返回压缩包路径
    pub async fn export_results(&self) -> AppResult<Option<PathBuf>> {
        let sink = DirectoryExportSink::new(&self.config.output_folder);
        let exported = self
            .scheduler
            .download_as_zip(Some(&self.config.zip_filename), &sink)
            .await?;
        Ok(exported.map(|name| sink.dir().join(name)))
    }

    /// 把已完成的结果逐个导出到输出目录，文件名带 `download_prefix` 前缀
    pub async fn export_files(&self) -> AppResult<usize> {
        let sink = DirectoryExportSink::new(&self.config.output_folder);
        let exported = self
            .scheduler
            .download_all(Some(&self.config.download_prefix), &sink)
            .await?;
        Ok(exported)
    }

    /// 扫描输入目录（按文件名排序）
    async fn load_inputs(&self) -> Result<Vec<InputFile>> {
        info!("\n📁 正在扫描待处理的文件...");
        let folder = Path::new(&self.config.input_folder);
        if !folder.exists() {
            warn!("⚠️ 输入目录不存在: {}", folder.display());
            return Ok(Vec::new());
        }

        let mut paths = Vec::new();
        let mut entries = tokio::fs::read_dir(folder).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                paths.push(entry.path());
            }
        }
        paths.sort();

        let mut inputs = Vec::with_capacity(paths.len());
        for path in paths {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            match tokio::fs::read(&path).await {
                Ok(data) => inputs.push(InputFile::new(name, data)),
                Err(e) => warn!("⚠️ 读取文件失败，已跳过: {} ({})", path.display(), e),
            }
        }
        Ok(inputs)
    }

    fn project_options(&self) -> Map<String, serde_json::Value> {
        let mut options = Map::new();
        options.insert("maxConcurrent".into(), json!(self.config.max_concurrent));
        options.insert("outputExtension".into(), json!(self.config.output_extension));
        options
    }
}

fn guess_mime(name: &str) -> &'static str {
    let lower = name.to_ascii_lowercase();
    if lower.ends_with(".pdf") {
        "application/pdf"
    } else if lower.ends_with(".png") {
        "image/png"
    } else if lower.ends_with(".jpg") || lower.ends_with(".jpeg") {
        "image/jpeg"
    } else {
        "application/octet-stream"
    }
}
