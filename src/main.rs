use std::sync::Arc;

use anyhow::Result;
use doc_batch_kit::services::{fetcher_fn, ModuleHandle};
use doc_batch_kit::utils::logging;
use doc_batch_kit::{processor_fn, App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::load()?;

    // 初始化日志
    logging::init(config.verbose_logging);

    let app = App::initialize(config).await?;

    // 演示用模块：直接返回一个空句柄
    let loader = app.loader().clone();
    for name in ["pdf-lib", "pdfjs"] {
        loader.register(
            name,
            fetcher_fn(|name| async move { Ok(Arc::new(name) as ModuleHandle) }),
        );
    }
    loader.register_group("both", ["pdf-lib", "pdfjs"]);
    loader.on_hover("both");

    // 原样输出：只演示调度、进度和导出
    let processor = processor_fn(move |input, progress| {
        let loader = loader.clone();
        async move {
            loader.load("pdf-lib").await?;
            progress.report(50);
            Ok(input.data)
        }
    });

    app.run("passthrough", processor).await?;

    Ok(())
}
