use anyhow::Result;
use clap::Parser;

use netwarden_core::config::NetwardenConfig;
use netwarden_core::error::{ConfigError, NetwardenError};
use netwarden_eve_pipeline::{
    EvePipeline, MemoryAlertStore, MemoryDailyCache, MemoryDeviceDirectory, MemorySearchIndex,
    PipelineConfig,
};

mod cli;
mod logging;

use cli::DaemonCli;

#[tokio::main]
async fn main() -> Result<()> {
    let args = DaemonCli::parse();

    // 설정 로드: 기본 경로에 파일이 없으면 기본값 + 환경변수로 기동
    let mut config = match NetwardenConfig::load(&args.config).await {
        Ok(config) => config,
        Err(NetwardenError::Config(ConfigError::FileNotFound { path })) => {
            eprintln!("config file not found at {path}, using defaults");
            let mut config = NetwardenConfig::default();
            config.apply_env_overrides();
            config
        }
        Err(e) => return Err(anyhow::anyhow!("failed to load config: {}", e)),
    };

    // CLI 인자가 설정 파일과 환경변수보다 우선
    if let Some(level) = args.log_level {
        config.general.log_level = level;
    }
    if let Some(format) = args.log_format {
        config.general.log_format = format;
    }
    if let Some(eve_log) = args.eve_log {
        config.pipeline.eve_log_path = eve_log.display().to_string();
    }
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {}", e))?;

    if args.validate {
        println!("configuration ok: {}", args.config.display());
        return Ok(());
    }

    logging::init_tracing(&config.general)?;
    netwarden_core::metrics::describe_all();
    tracing::info!("netwarden-daemon starting");

    if !config.pipeline.enabled {
        tracing::warn!("eve pipeline disabled in config, nothing to do");
        return Ok(());
    }

    // 인메모리 싱크 구성 (외부 저장소 어댑터는 trait 경계 너머의 관심사)
    let store = MemoryAlertStore::new();
    let index = MemorySearchIndex::new();
    let cache = MemoryDailyCache::new();
    let directory = MemoryDeviceDirectory::new();

    let mut pipeline = EvePipeline::builder(store.clone(), index, cache, directory)
        .config(PipelineConfig::from_core(&config.pipeline))
        .build()
        .map_err(|e| anyhow::anyhow!("failed to build eve pipeline: {}", e))?;

    // 실시간 피드: 영속된 알림을 로그로 노출
    let mut feed = pipeline.subscribe();
    let feed_task = tokio::spawn(async move {
        while let Some(alert) = feed.recv().await {
            tracing::info!(
                alert_id = alert.id.unwrap_or(-1),
                severity = %alert.severity,
                signature = %alert.signature,
                source_ip = %alert.source_ip,
                dest_ip = %alert.dest_ip,
                "live alert"
            );
        }
    });

    pipeline
        .start()
        .map_err(|e| anyhow::anyhow!("failed to start eve pipeline: {}", e))?;
    tracing::info!(
        path = %config.pipeline.eve_log_path,
        "eve pipeline started"
    );

    // 종료 시그널 대기
    tracing::info!("netwarden-daemon running");
    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");

    // 우아한 종료: 테일러 정지 -> 펌프 드레인 -> 피드 종료
    if let Err(e) = pipeline.stop().await {
        tracing::error!(error = %e, "failed to stop eve pipeline");
    }
    // 피드 태스크는 자신의 구독을 소유하므로 직접 중단시킨다
    feed_task.abort();
    let _ = feed_task.await;

    tracing::info!(
        alerts_stored = store.len(),
        "netwarden-daemon shut down"
    );
    Ok(())
}
