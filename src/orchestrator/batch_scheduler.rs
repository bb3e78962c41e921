//! 批量调度器 - 编排层
//!
//! ## 职责
//!
//! 对一组文件执行同一个处理操作：
//! 1. **入队**：`add_items` 按到达顺序追加待处理条目
//! 2. **并发控制**：使用 Semaphore 限制同时处理的条目数
//! 3. **失败隔离**：单个条目的错误（包括 panic）只记录在该条目上
//! 4. **协作式取消**：`cancel()` 停止启动新条目，进行中的条目继续完成
//! 5. **导出**：逐个导出或打包成一个 zip
//!
//! ## 设计特点
//!
//! - 条目更新按 id 定位；处理中被移除的条目，其结果会被静默丢弃
//! - 不重试；再次 `start()` 只处理仍为 `pending` 的条目
//! - 处理器只拿到输入文件和进度回调，看不到调度器本身

use std::any::Any;
use std::collections::VecDeque;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::FutureExt;
use parking_lot::Mutex;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::ExportError;
use crate::infrastructure::{build_zip, file_stem, ExportSink};
use crate::models::{BatchItem, BatchStatus, InputFile};
use crate::utils::{logging, truncate_text};

/// 逐个导出时的默认文件名前缀
pub const DEFAULT_DOWNLOAD_PREFIX: &str = "processed";
/// 默认压缩包文件名
pub const DEFAULT_ZIP_FILENAME: &str = "batch_processed.zip";

/// 调度参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOptions {
    /// 同时处理的条目数，至少为 1
    pub max_concurrent: usize,
    /// 导出文件扩展名
    pub output_extension: String,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            max_concurrent: 2,
            output_extension: "pdf".to_string(),
        }
    }
}

impl BatchOptions {
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent;
        self
    }
}

impl From<&Config> for BatchOptions {
    fn from(config: &Config) -> Self {
        Self {
            max_concurrent: config.max_concurrent,
            output_extension: config.output_extension.clone(),
        }
    }
}

/// 处理器：把一个输入文件转换成结果
///
/// 实现方可以通过 `ProgressSink` 上报进度。返回错误或 panic 都只影响当前条目。
#[async_trait]
pub trait Processor: Send + Sync {
    async fn process(&self, input: &InputFile, progress: ProgressSink) -> anyhow::Result<Bytes>;
}

/// 把闭包包装成 `Processor`
pub fn processor_fn<F, Fut>(f: F) -> Arc<dyn Processor>
where
    F: Fn(InputFile, ProgressSink) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Bytes>> + Send + 'static,
{
    Arc::new(FnProcessor(f))
}

struct FnProcessor<F>(F);

#[async_trait]
impl<F, Fut> Processor for FnProcessor<F>
where
    F: Fn(InputFile, ProgressSink) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Bytes>> + Send + 'static,
{
    async fn process(&self, input: &InputFile, progress: ProgressSink) -> anyhow::Result<Bytes> {
        (self.0)(input.clone(), progress).await
    }
}

/// 单个条目的进度回调
#[derive(Clone)]
pub struct ProgressSink {
    items: Arc<Mutex<Vec<BatchItem>>>,
    id: String,
}

impl ProgressSink {
    /// 上报进度（0-100）；不会回退，完成前最多显示 99
    pub fn report(&self, progress: u8) {
        update_item(&self.items, &self.id, |item| item.report_progress(progress));
    }

    pub fn item_id(&self) -> &str {
        &self.id
    }
}

/// 批次事件回调，方法均有空的默认实现
pub trait BatchObserver: Send + Sync {
    fn on_item_complete(&self, _item: &BatchItem) {}
    fn on_item_error(&self, _item: &BatchItem, _message: &str) {}
    fn on_all_complete(&self, _items: &[BatchItem]) {}
}

/// 一次 `start()` 的结果
#[derive(Debug, Clone)]
pub struct BatchSummary {
    /// 结束时的条目快照
    pub items: Vec<BatchItem>,
    /// 是否因取消而提前结束
    pub cancelled: bool,
}

impl BatchSummary {
    pub fn completed(&self) -> usize {
        count_status(&self.items, BatchStatus::Completed)
    }

    pub fn failed(&self) -> usize {
        count_status(&self.items, BatchStatus::Error)
    }

    pub fn pending(&self) -> usize {
        count_status(&self.items, BatchStatus::Pending)
    }
}

/// 批量调度器
///
/// 需要在 `start()` 进行中调用 `cancel()` 时，用 `Arc` 共享。
pub struct BatchScheduler {
    items: Arc<Mutex<Vec<BatchItem>>>,
    running: AtomicBool,
    cancel: Mutex<CancellationToken>,
    options: BatchOptions,
    observer: Option<Arc<dyn BatchObserver>>,
}

impl BatchScheduler {
    pub fn new(mut options: BatchOptions) -> Self {
        if options.max_concurrent == 0 {
            warn!("⚠️ max_concurrent 不能为 0，已调整为 1");
            options.max_concurrent = 1;
        }
        Self {
            items: Arc::new(Mutex::new(Vec::new())),
            running: AtomicBool::new(false),
            cancel: Mutex::new(CancellationToken::new()),
            options,
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn BatchObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    // ========== 条目管理 ==========

    /// 追加待处理条目，返回新条目的 id
    pub fn add_items(&self, inputs: Vec<InputFile>) -> Vec<String> {
        if inputs.is_empty() {
            return Vec::new();
        }
        let new_items: Vec<BatchItem> = inputs.into_iter().map(BatchItem::pending).collect();
        let ids = new_items.iter().map(|i| i.id.clone()).collect();
        debug!("入队 {} 个文件", new_items.len());
        self.items.lock().extend(new_items);
        ids
    }

    /// 移除条目；处理中的条目随后的结果会被丢弃
    pub fn remove_item(&self, id: &str) {
        self.items.lock().retain(|item| item.id != id);
    }

    pub fn clear(&self) {
        self.items.lock().clear();
    }

    /// 条目快照（入队顺序）
    pub fn items(&self) -> Vec<BatchItem> {
        self.items.lock().clone()
    }

    pub fn item(&self, id: &str) -> Option<BatchItem> {
        self.items.lock().iter().find(|i| i.id == id).cloned()
    }

    pub fn is_processing(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// 所有条目进度的平均值（四舍五入），没有条目时为 0
    pub fn overall_progress(&self) -> u8 {
        let items = self.items.lock();
        if items.is_empty() {
            return 0;
        }
        let sum: u32 = items.iter().map(|i| u32::from(i.progress)).sum();
        (f64::from(sum) / items.len() as f64).round() as u8
    }

    pub fn completed_count(&self) -> usize {
        count_status(&self.items.lock(), BatchStatus::Completed)
    }

    pub fn error_count(&self) -> usize {
        count_status(&self.items.lock(), BatchStatus::Error)
    }

    // ========== 调度 ==========

    /// 处理所有 `pending` 条目
    ///
    /// 已经在运行时直接返回 `None`。全部启动的条目结束后返回结果快照。
    pub async fn start(&self, processor: Arc<dyn Processor>) -> Option<BatchSummary> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("⚠️ 批量处理已在进行中，忽略本次启动");
            return None;
        }
        // 调用方放弃等待时（超时、select!、任务被中止）同样复位
        let run_guard = RunGuard {
            running: &self.running,
            items: self.items.clone(),
        };

        let token = CancellationToken::new();
        *self.cancel.lock() = token.clone();

        let (mut queue, total) = {
            let items = self.items.lock();
            let queue: VecDeque<String> = items
                .iter()
                .filter(|i| i.status == BatchStatus::Pending)
                .map(|i| i.id.clone())
                .collect();
            (queue, items.len())
        };
        logging::log_batch_start(queue.len(), total);

        let semaphore = Arc::new(Semaphore::new(self.options.max_concurrent));
        let mut tasks = JoinSet::new();

        while let Some(id) = queue.pop_front() {
            // 等待空位；取消后不再启动新条目
            let permit = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                permit = semaphore.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let input = {
                let mut items = self.items.lock();
                match items.iter_mut().find(|i| i.id == id) {
                    Some(item) if item.status == BatchStatus::Pending => {
                        item.mark_processing();
                        item.input.clone()
                    }
                    _ => {
                        debug!("跳过已移除的条目: {}", id);
                        continue;
                    }
                }
            };

            let items = self.items.clone();
            let processor = processor.clone();
            let observer = self.observer.clone();
            tasks.spawn(async move {
                let _permit = permit;
                run_item(items, id, input, processor, observer).await;
            });
        }

        // 等待进行中的条目结束
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                error!("条目任务异常退出: {}", e);
            }
        }

        let cancelled = token.is_cancelled();
        let items = self.items();
        drop(run_guard);

        let completed = count_status(&items, BatchStatus::Completed);
        let failed = count_status(&items, BatchStatus::Error);
        logging::log_batch_complete(completed, failed, items.len());
        if cancelled {
            info!(
                "⏹️ 批量处理已取消，{} 个条目未开始",
                items.iter().filter(|i| !i.status.is_terminal()).count()
            );
        }

        if let Some(observer) = &self.observer {
            observer.on_all_complete(&items);
        }

        Some(BatchSummary { items, cancelled })
    }

    /// 取消当前批次；不中断进行中的条目，空闲时无效果
    pub fn cancel(&self) {
        if self.is_processing() {
            info!("正在取消批量处理...");
        }
        self.cancel.lock().cancel();
    }

    // ========== 导出 ==========

    /// 逐个导出已完成的结果：`{prefix}_{文件名}_{序号}.{扩展名}`
    pub async fn download_all(
        &self,
        prefix: Option<&str>,
        sink: &dyn ExportSink,
    ) -> Result<usize, ExportError> {
        let prefix = prefix.unwrap_or(DEFAULT_DOWNLOAD_PREFIX);
        let results = self.completed_results();

        for (index, (name, data)) in results.iter().enumerate() {
            let filename = format!(
                "{}_{}_{}.{}",
                prefix,
                file_stem(name),
                index + 1,
                self.options.output_extension
            );
            sink.export(&filename, data.clone()).await?;
        }

        info!("📥 已导出 {} 个文件", results.len());
        Ok(results.len())
    }

    /// 打包已完成的结果，条目名 `{文件名}_processed_{序号}.{扩展名}`
    ///
    /// 没有已完成的条目时不导出，返回 `None`。
    pub async fn download_as_zip(
        &self,
        zip_name: Option<&str>,
        sink: &dyn ExportSink,
    ) -> Result<Option<String>, ExportError> {
        let results = self.completed_results();
        if results.is_empty() {
            debug!("没有已完成的条目，跳过打包");
            return Ok(None);
        }

        let entries: Vec<(String, Bytes)> = results
            .into_iter()
            .enumerate()
            .map(|(index, (name, data))| {
                let entry = format!(
                    "{}_processed_{}.{}",
                    file_stem(&name),
                    index + 1,
                    self.options.output_extension
                );
                (entry, data)
            })
            .collect();

        let archive = build_zip(&entries)?;
        let zip_name = zip_name.unwrap_or(DEFAULT_ZIP_FILENAME).to_string();
        sink.export(&zip_name, archive).await?;

        info!("📦 已打包 {} 个文件: {}", entries.len(), zip_name);
        Ok(Some(zip_name))
    }

    fn completed_results(&self) -> Vec<(String, Bytes)> {
        self.items
            .lock()
            .iter()
            .filter(|i| i.status == BatchStatus::Completed)
            .filter_map(|i| i.result.clone().map(|data| (i.input.name.clone(), data)))
            .collect()
    }
}

/// 运行标记的复位守卫
///
/// 正常结束时在汇总前释放；`start()` 的 future 被提前丢弃时，
/// `JoinSet` 会中止进行中的任务，这里把它们的条目退回 `pending`。
struct RunGuard<'a> {
    running: &'a AtomicBool,
    items: Arc<Mutex<Vec<BatchItem>>>,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        let mut interrupted = 0;
        for item in self.items.lock().iter_mut() {
            if item.status == BatchStatus::Processing {
                item.reset_pending();
                interrupted += 1;
            }
        }
        if interrupted > 0 {
            warn!("⚠️ 批量处理被中断，{} 个条目已退回待处理", interrupted);
        }
        self.running.store(false, Ordering::SeqCst);
    }
}

async fn run_item(
    items: Arc<Mutex<Vec<BatchItem>>>,
    id: String,
    input: InputFile,
    processor: Arc<dyn Processor>,
    observer: Option<Arc<dyn BatchObserver>>,
) {
    let sink = ProgressSink {
        items: items.clone(),
        id: id.clone(),
    };

    let outcome = AssertUnwindSafe(processor.process(&input, sink))
        .catch_unwind()
        .await;
    let result = match outcome {
        Ok(Ok(data)) => Ok(data),
        Ok(Err(e)) => Err(error_text(format!("{e:#}"))),
        Err(panic) => Err(error_text(panic_message(panic.as_ref()))),
    };

    let failure = result.as_ref().err().cloned();
    let updated = update_item(&items, &id, move |item| match result {
        Ok(data) => item.mark_completed(data),
        Err(message) => item.mark_error(message),
    });

    let Some(item) = updated else {
        debug!("条目已被移除，丢弃结果: {}", id);
        return;
    };

    match failure {
        None => {
            info!("✓ [{}] 处理完成", truncate_text(&item.input.name, 40));
            if let Some(observer) = &observer {
                observer.on_item_complete(&item);
            }
        }
        Some(message) => {
            error!(
                "❌ [{}] 处理失败: {}",
                truncate_text(&item.input.name, 40),
                message
            );
            if let Some(observer) = &observer {
                observer.on_item_error(&item, &message);
            }
        }
    }
}

/// 按 id 更新条目，条目不存在时什么也不做
fn update_item<F>(items: &Mutex<Vec<BatchItem>>, id: &str, f: F) -> Option<BatchItem>
where
    F: FnOnce(&mut BatchItem),
{
    let mut items = items.lock();
    let item = items.iter_mut().find(|i| i.id == id)?;
    f(item);
    Some(item.clone())
}

fn error_text(message: String) -> String {
    if message.trim().is_empty() {
        "处理失败".to_string()
    } else {
        message
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("处理器 panic: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("处理器 panic: {s}")
    } else {
        "处理器 panic".to_string()
    }
}

fn count_status(items: &[BatchItem], status: BatchStatus) -> usize {
    items.iter().filter(|i| i.status == status).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::MemoryExportSink;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn inputs(n: usize) -> Vec<InputFile> {
        (1..=n)
            .map(|i| InputFile::new(format!("doc{i}.pdf"), format!("content {i}").into_bytes()))
            .collect()
    }

    fn echo_after(delay: Duration) -> Arc<dyn Processor> {
        processor_fn(move |input, progress| async move {
            progress.report(50);
            tokio::time::sleep(delay).await;
            Ok(input.data)
        })
    }

    #[derive(Default)]
    struct Recorder {
        completed: Mutex<Vec<String>>,
        errors: Mutex<Vec<(String, String)>>,
        finished: Mutex<Option<Vec<BatchItem>>>,
    }

    impl BatchObserver for Recorder {
        fn on_item_complete(&self, item: &BatchItem) {
            self.completed.lock().push(item.input.name.clone());
        }
        fn on_item_error(&self, item: &BatchItem, message: &str) {
            self.errors
                .lock()
                .push((item.input.name.clone(), message.to_string()));
        }
        fn on_all_complete(&self, items: &[BatchItem]) {
            *self.finished.lock() = Some(items.to_vec());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn launches_in_fifo_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let seen = order.clone();
        let processor = processor_fn(move |input, _| {
            let seen = seen.clone();
            async move {
                seen.lock().push(input.name.clone());
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok(input.data)
            }
        });

        let scheduler = BatchScheduler::new(BatchOptions::default().with_max_concurrent(1));
        scheduler.add_items(inputs(3));
        scheduler.start(processor).await.unwrap();

        assert_eq!(*order.lock(), vec!["doc1.pdf", "doc2.pdf", "doc3.pdf"]);
    }

    #[tokio::test(start_paused = true)]
    async fn second_start_while_running_is_ignored() {
        let scheduler = Arc::new(BatchScheduler::new(BatchOptions::default()));
        scheduler.add_items(inputs(2));

        let running = {
            let scheduler = scheduler.clone();
            tokio::spawn(async move { scheduler.start(echo_after(Duration::from_millis(100))).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(scheduler.is_processing());
        assert!(scheduler.start(echo_after(Duration::ZERO)).await.is_none());

        let summary = running.await.unwrap().unwrap();
        assert_eq!(summary.completed(), 2);
        assert!(!scheduler.is_processing());
    }

    #[tokio::test(start_paused = true)]
    async fn progress_is_clamped_until_completion() {
        let processor = processor_fn(|input, progress| async move {
            progress.report(50);
            tokio::time::sleep(Duration::from_millis(10)).await;
            progress.report(30);
            tokio::time::sleep(Duration::from_millis(10)).await;
            progress.report(120);
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok(input.data)
        });
        let scheduler = Arc::new(BatchScheduler::new(BatchOptions::default()));
        let id = scheduler.add_items(inputs(1)).remove(0);

        let running = {
            let scheduler = scheduler.clone();
            tokio::spawn(async move { scheduler.start(processor).await })
        };
        tokio::time::sleep(Duration::from_millis(15)).await;
        assert_eq!(scheduler.item(&id).unwrap().progress, 50);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(scheduler.item(&id).unwrap().progress, 99);
        assert_eq!(scheduler.item(&id).unwrap().status, BatchStatus::Processing);

        running.await.unwrap();
        assert_eq!(scheduler.item(&id).unwrap().progress, 100);
        assert_eq!(scheduler.overall_progress(), 100);
    }

    #[tokio::test(start_paused = true)]
    async fn removed_in_flight_item_is_not_resurrected() {
        let scheduler = Arc::new(BatchScheduler::new(BatchOptions::default()));
        let ids = scheduler.add_items(inputs(2));

        let running = {
            let scheduler = scheduler.clone();
            tokio::spawn(async move { scheduler.start(echo_after(Duration::from_millis(50))).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        scheduler.remove_item(&ids[0]);

        let summary = running.await.unwrap().unwrap();
        assert_eq!(summary.items.len(), 1);
        assert_eq!(summary.items[0].id, ids[1]);
        assert!(scheduler.item(&ids[0]).is_none());
    }

    #[tokio::test]
    async fn panic_becomes_item_error() {
        let processor = processor_fn(|input, _| async move {
            if input.name == "doc2.pdf" {
                panic!("corrupt xref table");
            }
            Ok(input.data)
        });
        let recorder = Arc::new(Recorder::default());
        let scheduler =
            BatchScheduler::new(BatchOptions::default()).with_observer(recorder.clone());
        scheduler.add_items(inputs(3));

        let summary = scheduler.start(processor).await.unwrap();
        assert_eq!(summary.completed(), 2);
        assert_eq!(summary.failed(), 1);

        let errors = recorder.errors.lock().clone();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].0, "doc2.pdf");
        assert!(errors[0].1.contains("corrupt xref table"));
        assert!(!scheduler.is_processing());
    }

    #[tokio::test]
    async fn restart_only_consumes_pending_items() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let processor = processor_fn(move |input, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if input.name == "doc1.pdf" {
                    anyhow::bail!("encrypted document");
                }
                Ok(input.data)
            }
        });
        let scheduler = BatchScheduler::new(BatchOptions::default());
        scheduler.add_items(inputs(2));
        scheduler.start(processor.clone()).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        scheduler.add_items(inputs(1));
        let summary = scheduler.start(processor).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 失败的条目不会被自动重试
        assert_eq!(summary.failed(), 2);
        assert_eq!(summary.completed(), 1);
        assert_eq!(scheduler.error_count(), 2);
    }

    #[tokio::test]
    async fn download_all_names_and_numbers_completed_results() {
        let processor = processor_fn(|input, _| async move {
            if input.name == "doc2.pdf" {
                anyhow::bail!("unsupported");
            }
            Ok(input.data)
        });
        let scheduler = BatchScheduler::new(BatchOptions::default());
        scheduler.add_items(inputs(3));
        scheduler.start(processor).await.unwrap();

        let sink = MemoryExportSink::new();
        assert_eq!(scheduler.download_all(None, &sink).await.unwrap(), 2);
        let names: Vec<_> = sink.files().into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["processed_doc1_1.pdf", "processed_doc3_2.pdf"]);

        let sink = MemoryExportSink::new();
        scheduler.download_all(Some("merged"), &sink).await.unwrap();
        assert_eq!(sink.files()[0].0, "merged_doc1_1.pdf");
    }

    #[tokio::test]
    async fn zip_is_skipped_when_nothing_completed() {
        let scheduler = BatchScheduler::new(BatchOptions::default());
        scheduler.add_items(inputs(2));
        let sink = MemoryExportSink::new();
        assert!(scheduler.download_as_zip(None, &sink).await.unwrap().is_none());
        assert!(sink.files().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_start_releases_running_flag() {
        let scheduler = BatchScheduler::new(BatchOptions::default());
        scheduler.add_items(inputs(3));

        let timed_out = tokio::time::timeout(
            Duration::from_millis(50),
            scheduler.start(echo_after(Duration::from_millis(1000))),
        )
        .await;
        assert!(timed_out.is_err());
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert!(!scheduler.is_processing());
        assert!(scheduler
            .items()
            .iter()
            .all(|i| i.status == BatchStatus::Pending && i.progress == 0));

        let summary = scheduler
            .start(echo_after(Duration::from_millis(10)))
            .await
            .expect("中断后应能重新启动");
        assert_eq!(summary.completed(), 3);
    }

    #[test]
    fn zero_concurrency_is_raised_to_one() {
        let scheduler = BatchScheduler::new(BatchOptions::default().with_max_concurrent(0));
        assert_eq!(scheduler.options().max_concurrent, 1);
        assert!(scheduler.add_items(Vec::new()).is_empty());
        assert_eq!(scheduler.overall_progress(), 0);
    }
}
