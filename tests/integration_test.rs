use std::io::{Cursor, Read};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use doc_batch_kit::config::Config;
use doc_batch_kit::infrastructure::{MemoryExportSink, SqliteRecordStore};
use doc_batch_kit::services::{fetcher_fn, ModuleHandle};
use doc_batch_kit::utils::logging;
use doc_batch_kit::{
    processor_fn, App, BatchItem, BatchObserver, BatchOptions, BatchScheduler, BatchStatus,
    InputFile, ModuleLoader, ProjectFileMetadata, ProjectPatch, ProjectStatus, ProjectStore,
};
use parking_lot::Mutex;

fn inputs(n: usize) -> Vec<InputFile> {
    (1..=n)
        .map(|i| InputFile::new(format!("scan_{i}.pdf"), format!("%PDF-1.7 #{i}").into_bytes()))
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_five_files_two_at_a_time() {
    logging::init(false);

    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let processor = {
        let in_flight = in_flight.clone();
        let peak = peak.clone();
        processor_fn(move |input, progress| {
            let in_flight = in_flight.clone();
            let peak = peak.clone();
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                progress.report(40);
                tokio::time::sleep(Duration::from_millis(100)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok(input.data)
            }
        })
    };

    let scheduler = BatchScheduler::new(BatchOptions::default().with_max_concurrent(2));
    scheduler.add_items(inputs(5));
    let summary = scheduler.start(processor).await.expect("调度器不应处于运行中");

    assert_eq!(summary.completed(), 5);
    assert!(summary.items.iter().all(|i| i.progress == 100));
    assert_eq!(scheduler.overall_progress(), 100);
    assert_eq!(peak.load(Ordering::SeqCst), 2, "同时处理的数量不应超过上限");

    let sink = MemoryExportSink::new();
    let zip_name = scheduler.download_as_zip(None, &sink).await.unwrap();
    assert_eq!(zip_name.as_deref(), Some("batch_processed.zip"));

    let files = sink.files();
    assert_eq!(files.len(), 1);
    let mut archive = zip::ZipArchive::new(Cursor::new(files[0].1.to_vec())).unwrap();
    assert_eq!(archive.len(), 5);
    let mut content = String::new();
    archive
        .by_name("scan_3_processed_3.pdf")
        .unwrap()
        .read_to_string(&mut content)
        .unwrap();
    assert_eq!(content, "%PDF-1.7 #3");
}

#[derive(Default)]
struct FinishedItems(Mutex<Option<Vec<BatchItem>>>);

impl BatchObserver for FinishedItems {
    fn on_all_complete(&self, items: &[BatchItem]) {
        *self.0.lock() = Some(items.to_vec());
    }
}

#[tokio::test]
async fn test_failure_is_isolated_to_one_item() {
    let processor = processor_fn(|input, _| async move {
        if input.name == "scan_2.pdf" {
            anyhow::bail!("密码保护的文档");
        }
        Ok(input.data)
    });
    let finished = Arc::new(FinishedItems::default());
    let scheduler = BatchScheduler::new(BatchOptions::default()).with_observer(finished.clone());
    scheduler.add_items(inputs(3));
    scheduler.start(processor).await.unwrap();

    let items = finished.0.lock().clone().expect("完成回调应被触发");
    assert_eq!(items.len(), 3);
    assert_eq!(items[0].status, BatchStatus::Completed);
    assert_eq!(items[1].status, BatchStatus::Error);
    assert_eq!(items[1].error_message.as_deref(), Some("密码保护的文档"));
    assert!(items[1].result.is_none());
    assert_eq!(items[2].status, BatchStatus::Completed);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_stops_new_launches() {
    let scheduler = Arc::new(BatchScheduler::new(BatchOptions::default()));
    scheduler.add_items(inputs(5));
    let processor = processor_fn(|input, _| async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        Ok(input.data)
    });

    let running = {
        let scheduler = scheduler.clone();
        tokio::spawn(async move { scheduler.start(processor).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    scheduler.cancel();
    // 取消后仍在运行，直到进行中的条目结束
    assert!(scheduler.is_processing());

    let summary = running.await.unwrap().unwrap();
    assert!(summary.cancelled);
    assert_eq!(summary.completed(), 2);
    assert_eq!(summary.pending(), 3);
    assert!(summary
        .items
        .iter()
        .all(|i| i.status != BatchStatus::Processing));
}

#[tokio::test(start_paused = true)]
async fn test_processors_share_one_module_fetch() {
    let fetches = Arc::new(AtomicUsize::new(0));
    let loader = ModuleLoader::default();
    {
        let fetches = fetches.clone();
        loader.register(
            "pdf-lib",
            fetcher_fn(move |name| {
                let fetches = fetches.clone();
                async move {
                    fetches.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(300)).await;
                    Ok(Arc::new(name) as ModuleHandle)
                }
            }),
        );
    }

    let processor = {
        let loader = loader.clone();
        processor_fn(move |input, _| {
            let loader = loader.clone();
            async move {
                loader.load("pdf-lib").await?;
                Ok(input.data)
            }
        })
    };

    let scheduler = BatchScheduler::new(BatchOptions::default().with_max_concurrent(3));
    scheduler.add_items(inputs(4));
    let summary = scheduler.start(processor).await.unwrap();

    assert_eq!(summary.completed(), 4);
    assert_eq!(fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_project_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("projects.db");

    let created = {
        let store = ProjectStore::open(&db_path);
        assert!(store.is_available());
        let files = vec![ProjectFileMetadata::new("contract.pdf", 2048)
            .with_type("application/pdf")
            .with_marker("pages", "1-3")];
        let created = store
            .create("合同拆分", "split-pdf", Some("Split PDF"), None, Some(files))
            .await
            .unwrap();
        store.pause().await.unwrap();
        created
    };

    let store = ProjectStore::open(&db_path);
    let got = store.get(&created.id).await.unwrap();
    assert_eq!(got.status, ProjectStatus::Paused);
    assert_eq!(got.id, created.id);
    assert_eq!(got.created_at, created.created_at);
    assert_eq!(got.file_metadata[0].extra["pages"], "1-3");
}

#[tokio::test]
async fn test_incomplete_and_tool_queries() {
    let store = ProjectStore::with_backend(Arc::new(SqliteRecordStore::in_memory("projects").unwrap()));

    let a = store.create("a", "merge-pdf", None, None, None).await.unwrap();
    let b = store.create("b", "ocr", None, None, None).await.unwrap();
    let c = store.create("c", "merge-pdf", None, None, None).await.unwrap();

    store.update(&b.id, &ProjectPatch::status(ProjectStatus::Paused)).await.unwrap();
    store.load(&c.id).await.unwrap();
    store.complete().await.unwrap();

    let mut incomplete: Vec<_> = store.list_incomplete().await.into_iter().map(|p| p.id).collect();
    incomplete.sort();
    let mut expected = vec![a.id.clone(), b.id.clone()];
    expected.sort();
    assert_eq!(incomplete, expected);

    let merge: Vec<_> = store.list_by_tool("merge-pdf").await;
    assert_eq!(merge.len(), 2);
    assert!(merge.iter().all(|p| p.tool_id == "merge-pdf"));

    // 已完成的项目不会被改回未完成
    let still_done = store
        .update(&c.id, &ProjectPatch::status(ProjectStatus::InProgress).with_progress(10))
        .await
        .unwrap();
    assert_eq!(still_done.status, ProjectStatus::Completed);
    assert_eq!(still_done.progress, 100);

    store.delete(&a.id).await;
    assert_eq!(store.list_all().await.len(), 2);
    store.clear_all().await;
    assert!(store.list_all().await.is_empty());
}

#[tokio::test]
async fn test_app_runs_input_folder_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input");
    std::fs::create_dir_all(&input).unwrap();
    for i in 1..=3 {
        std::fs::write(input.join(format!("page_{i}.pdf")), format!("page {i}")).unwrap();
    }

    let path = |name: &str| dir.path().join(name).to_string_lossy().into_owned();
    let config = Config {
        input_folder: path("input"),
        output_folder: path("output"),
        database_path: path("data/projects.db"),
        recent_files_path: path("data/recent.json"),
        output_log_file: path("output.txt"),
        download_prefix: "compressed".to_string(),
        ..Config::default()
    };

    let app = App::initialize(config).await.unwrap();
    let processor = processor_fn(|input, progress| async move {
        progress.report(80);
        Ok(input.data)
    });
    let summary = app.run("compress", processor).await.unwrap().unwrap();

    assert_eq!(summary.completed(), 3);
    assert!(dir.path().join("output").join("batch_processed.zip").exists());

    assert_eq!(app.export_files().await.unwrap(), 3);
    let single = dir.path().join("output").join("compressed_page_2_2.pdf");
    assert_eq!(std::fs::read_to_string(single).unwrap(), "page 2");

    let projects = app.projects().list_by_tool("compress").await;
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].status, ProjectStatus::Completed);
    assert_eq!(projects[0].file_metadata.len(), 3);
    assert!(app.projects().current().is_none());

    let recent = app.recent_files().list();
    assert_eq!(recent.len(), 3);
    assert_eq!(recent[0].name, "page_3.pdf");
}
