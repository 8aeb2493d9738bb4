//! Voxclone - 多用户声音克隆服务
//!
//! 启动流程: 配置 → 日志 → 存储 → 合成引擎（启动时构造一次）→ HTTP

use std::sync::Arc;
use std::time::Duration;

use voxclone::application::{
    ScreenOptions, SynthesisAdapter, SynthesisConfig, TtsEnginePort, VoiceCatalogPort,
};
use voxclone::config::{load_config, print_config, EngineKind, LogConfig};
use voxclone::infrastructure::adapters::{
    FakeTtsClient, FakeTtsClientConfig, FileOutputStorage, HttpTtsClient, HttpTtsClientConfig,
    JsonVoiceCatalog, WavTranscoder,
};
use voxclone::infrastructure::http::{AppState, HttpServer, ServerConfig};

fn init_tracing(log: &LogConfig) {
    let log_filter = format!("{},voxclone={},tower_http=debug", log.level, log.level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if log.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config.log);

    tracing::info!("Voxclone {} - multi-user voice cloner", env!("CARGO_PKG_VERSION"));
    print_config(&config);

    // 存储（目录不存在时自动创建）
    let catalog = Arc::new(JsonVoiceCatalog::new(&config.storage.voices_dir).await?);
    let outputs = Arc::new(FileOutputStorage::new(&config.storage.outputs_dir).await?);

    // 合成结果过期清理，第一次在启动时执行
    if config.storage.output_expire_secs > 0 {
        let outputs = outputs.clone();
        let max_age = Duration::from_secs(config.storage.output_expire_secs);
        let interval = Duration::from_secs(config.storage.gc_interval_secs);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                match outputs.prune_expired(max_age).await {
                    Ok(0) => {}
                    Ok(removed) => tracing::info!(removed, "Pruned expired outputs"),
                    Err(e) => tracing::warn!(error = %e, "Failed to prune outputs"),
                }
            }
        });
    }

    let scan = catalog.scan().await?;
    tracing::info!(
        voices = scan.records.len(),
        skipped = scan.skipped.len(),
        "Voice catalog loaded"
    );

    // 合成引擎，进程内只构造一次
    let engine: Arc<dyn TtsEnginePort> = match config.tts.engine {
        EngineKind::Http => Arc::new(HttpTtsClient::new(
            HttpTtsClientConfig::new(&config.tts.url).with_timeout(config.tts.timeout_secs),
        )?),
        EngineKind::Fake => Arc::new(FakeTtsClient::new(FakeTtsClientConfig::default())),
    };

    if engine.health_check().await {
        tracing::info!(engine = %config.tts.engine, "Synthesis engine ready");
    } else {
        tracing::warn!(
            engine = %config.tts.engine,
            url = %config.tts.url,
            "Synthesis engine not reachable, generation will fail until it is up"
        );
    }

    let synthesis = Arc::new(SynthesisAdapter::new(
        engine,
        SynthesisConfig {
            timeout: Duration::from_secs(config.synthesis.timeout_secs),
            ..Default::default()
        },
    ));

    let state = AppState::new(
        catalog,
        synthesis,
        outputs,
        Arc::new(WavTranscoder::new()),
        ScreenOptions {
            languages: config.synthesis.languages.clone(),
            default_language: config.synthesis.default_language.clone(),
            default_text: config.synthesis.default_text.clone(),
            compressed_format: config.audio.compressed_format,
        },
        config.audio.bitrate,
    );

    let mut server_config = ServerConfig::new(&config.server.host, config.server.port)
        .with_max_body_size(config.storage.max_upload_size as usize);
    if config.server.static_files.enabled {
        server_config = server_config.with_static_files(
            &config.server.static_files.path,
            &config.server.static_files.dir,
        );
    }

    let server = HttpServer::new(server_config, state);

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
