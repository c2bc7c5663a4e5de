//! EVE 파이프라인 — 테일러, 코디네이터, 싱크를 하나의 생명주기로 묶습니다.
//!
//! # 아키텍처
//!
//! ```text
//! eve.json ──> LogTailer ──(mpsc)──> pump task ──> EveProcessor
//!                                                   ├─ AlertStore (권위)
//!                                                   ├─ SearchIndex
//!                                                   ├─ AlertBroadcaster ──> 구독자들
//!                                                   └─ DailyCache
//! ```
//!
//! # 생명주기
//! `builder()` -> `build()` -> `start()` -> (`subscribe()` / 처리) -> `stop()`
//!
//! `stop()`은 테일러를 먼저 멈춘 뒤 펌프 태스크가 채널에 남은 라인을
//! 모두 소비할 때까지 기다립니다. 반환 후에는 어떤 싱크 쓰기도,
//! 어떤 구독자 전달도 일어나지 않습니다.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::task::JoinHandle;
use tracing::{error, info};

use netwarden_core::error::PipelineError;
use netwarden_core::sink::{AlertStore, DailyCache, DeviceDirectory, SearchIndex};

use crate::broadcast::{AlertBroadcaster, AlertSubscription};
use crate::config::PipelineConfig;
use crate::error::EvePipelineError;
use crate::processor::{EveProcessor, LineOutcome};
use crate::tailer::{LogTailer, RawLine, TailerConfig, TailerHandle};

/// 파이프라인 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// 생성됨, 아직 시작 전
    Initialized,
    /// 테일러와 펌프 태스크 실행 중
    Running,
    /// 정지됨 (재시작 가능)
    Stopped,
}

impl PipelineState {
    /// 상태 이름을 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineState::Initialized => "initialized",
            PipelineState::Running => "running",
            PipelineState::Stopped => "stopped",
        }
    }
}

/// EVE 수집 파이프라인
///
/// 싱크 구현에 대해 제네릭합니다. 기본 구성은
/// [`sink`](crate::sink) 모듈의 인메모리 구현을 사용합니다.
pub struct EvePipeline<S, X, C, D>
where
    S: AlertStore + Clone + 'static,
    X: SearchIndex + Clone + 'static,
    C: DailyCache + Clone + 'static,
    D: DeviceDirectory + Clone + 'static,
{
    config: PipelineConfig,
    state: PipelineState,
    processor: Arc<EveProcessor<S, X, C, D>>,
    broadcaster: AlertBroadcaster,
    tailer: Option<TailerHandle>,
    pump: Option<JoinHandle<()>>,
    processed: Arc<AtomicU64>,
    discarded: Arc<AtomicU64>,
}

impl<S, X, C, D> EvePipeline<S, X, C, D>
where
    S: AlertStore + Clone + 'static,
    X: SearchIndex + Clone + 'static,
    C: DailyCache + Clone + 'static,
    D: DeviceDirectory + Clone + 'static,
{
    /// 파이프라인 빌더를 생성합니다.
    pub fn builder(store: S, index: X, cache: C, directory: D) -> EvePipelineBuilder<S, X, C, D> {
        EvePipelineBuilder {
            store,
            index,
            cache,
            directory,
            config: PipelineConfig::default(),
        }
    }

    /// 파이프라인을 시작합니다.
    ///
    /// 테일러 태스크와 펌프 태스크를 스폰합니다. 이미 실행 중이면
    /// [`PipelineError::AlreadyRunning`]을 반환합니다.
    pub fn start(&mut self) -> Result<(), PipelineError> {
        if self.state == PipelineState::Running {
            return Err(PipelineError::AlreadyRunning);
        }

        info!(
            path = %self.config.eve_log_path.display(),
            poll_interval_ms = self.config.poll_interval_ms,
            "starting eve pipeline"
        );

        let tailer_config = TailerConfig {
            path: self.config.eve_log_path.clone(),
            poll_interval: self.config.poll_interval(),
            read_from_start: self.config.read_from_start,
            channel_capacity: self.config.line_channel_capacity,
        };
        let (mut rx, tailer) = LogTailer::spawn(tailer_config);

        let processor = Arc::clone(&self.processor);
        let processed = Arc::clone(&self.processed);
        let discarded = Arc::clone(&self.discarded);
        let pump = tokio::spawn(async move {
            while let Some(raw) = rx.recv().await {
                match processor.process_line(&raw).await {
                    LineOutcome::Completed => {
                        processed.fetch_add(1, Ordering::Relaxed);
                    }
                    LineOutcome::Discarded => {
                        discarded.fetch_add(1, Ordering::Relaxed);
                    }
                    LineOutcome::Failed => {
                        error!("alert dropped after persistence failure");
                    }
                }
            }
        });

        self.tailer = Some(tailer);
        self.pump = Some(pump);
        self.state = PipelineState::Running;
        Ok(())
    }

    /// 파이프라인을 정지합니다.
    ///
    /// 테일러를 먼저 멈추고, 펌프가 채널에 남은 라인을 모두 처리할
    /// 때까지 기다립니다. 실행 중이 아니면
    /// [`PipelineError::NotRunning`]을 반환합니다.
    pub async fn stop(&mut self) -> Result<(), PipelineError> {
        if self.state != PipelineState::Running {
            return Err(PipelineError::NotRunning);
        }

        // 테일러 정지가 채널 송신측을 닫고, 펌프는 드레인 후 자연 종료
        if let Some(tailer) = self.tailer.take() {
            tailer.stop().await;
        }
        // 펌프의 JoinError는 태스크 패닉을 뜻하므로 채널 에러와 구분
        if let Some(pump) = self.pump.take() {
            pump.await
                .map_err(|e| PipelineError::TaskFailed(e.to_string()))?;
        }

        self.state = PipelineState::Stopped;
        info!(
            processed = self.processed.load(Ordering::Relaxed),
            discarded = self.discarded.load(Ordering::Relaxed),
            "eve pipeline stopped"
        );
        Ok(())
    }

    /// 실시간 알림 구독을 등록합니다.
    ///
    /// 구독은 파이프라인 시작 전에도 등록할 수 있으며, 등록 이후
    /// 영속된 알림만 수신합니다.
    pub fn subscribe(&self) -> AlertSubscription {
        self.broadcaster.subscribe()
    }

    /// 한 라인을 파이프라인에 직접 주입합니다 (테일러 우회).
    pub async fn process_line(&self, line: &str) -> LineOutcome {
        let outcome = self.processor.process_line(&RawLine::from(line)).await;
        match outcome {
            LineOutcome::Completed => {
                self.processed.fetch_add(1, Ordering::Relaxed);
            }
            LineOutcome::Discarded => {
                self.discarded.fetch_add(1, Ordering::Relaxed);
            }
            LineOutcome::Failed => {}
        }
        outcome
    }

    /// 여러 라인을 입력 순서대로 직접 주입합니다.
    pub async fn process_lines(&self, lines: &[&str]) -> Vec<LineOutcome> {
        let mut outcomes = Vec::with_capacity(lines.len());
        for line in lines {
            outcomes.push(self.process_line(line).await);
        }
        outcomes
    }

    /// 현재 상태를 반환합니다.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// 영속 완료된 알림 수를 반환합니다.
    pub fn processed_count(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    /// 폐기된 라인 수를 반환합니다.
    pub fn discarded_count(&self) -> u64 {
        self.discarded.load(Ordering::Relaxed)
    }

    /// 현재 구독자 수를 반환합니다.
    pub fn subscriber_count(&self) -> usize {
        self.broadcaster.subscriber_count()
    }
}

/// EVE 파이프라인 빌더
pub struct EvePipelineBuilder<S, X, C, D>
where
    S: AlertStore + Clone + 'static,
    X: SearchIndex + Clone + 'static,
    C: DailyCache + Clone + 'static,
    D: DeviceDirectory + Clone + 'static,
{
    store: S,
    index: X,
    cache: C,
    directory: D,
    config: PipelineConfig,
}

impl<S, X, C, D> EvePipelineBuilder<S, X, C, D>
where
    S: AlertStore + Clone + 'static,
    X: SearchIndex + Clone + 'static,
    C: DailyCache + Clone + 'static,
    D: DeviceDirectory + Clone + 'static,
{
    /// 파이프라인 설정을 지정합니다.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// 설정을 검증하고 파이프라인을 조립합니다.
    pub fn build(self) -> Result<EvePipeline<S, X, C, D>, EvePipelineError> {
        self.config.validate()?;

        let broadcaster = AlertBroadcaster::new(self.config.subscriber_buffer);
        let processor = Arc::new(EveProcessor::new(
            self.store,
            self.index,
            self.cache,
            self.directory,
            broadcaster.clone(),
            self.config.sink_timeout(),
        ));

        Ok(EvePipeline {
            config: self.config,
            state: PipelineState::Initialized,
            processor,
            broadcaster,
            tailer: None,
            pump: None,
            processed: Arc::new(AtomicU64::new(0)),
            discarded: Arc::new(AtomicU64::new(0)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::sink::{
        MemoryAlertStore, MemoryDailyCache, MemoryDeviceDirectory, MemorySearchIndex,
    };

    const ALERT_LINE: &str = r#"{"event_type":"alert","timestamp":"2024-01-01T10:00:00Z","src_ip":"1.2.3.4","dest_ip":"5.6.7.8","src_port":443,"dest_port":51000,"proto":"TCP","alert":{"signature":"ET SCAN","category":"scan","signature_id":123,"gid":1,"action":"allowed","severity":2}}"#;

    fn build_pipeline() -> (
        EvePipeline<MemoryAlertStore, MemorySearchIndex, MemoryDailyCache, MemoryDeviceDirectory>,
        MemoryAlertStore,
    ) {
        let store = MemoryAlertStore::new();
        let pipeline = EvePipeline::builder(
            store.clone(),
            MemorySearchIndex::new(),
            MemoryDailyCache::new(),
            MemoryDeviceDirectory::new(),
        )
        .build()
        .unwrap();
        (pipeline, store)
    }

    #[tokio::test]
    async fn starts_in_initialized_state() {
        let (pipeline, _) = build_pipeline();
        assert_eq!(pipeline.state(), PipelineState::Initialized);
        assert_eq!(pipeline.state().as_str(), "initialized");
    }

    #[tokio::test]
    async fn double_start_is_rejected() {
        let (mut pipeline, _) = build_pipeline();
        pipeline.start().unwrap();
        assert!(matches!(
            pipeline.start(),
            Err(PipelineError::AlreadyRunning)
        ));
        pipeline.stop().await.unwrap();
    }

    #[tokio::test]
    async fn stop_without_start_is_rejected() {
        let (mut pipeline, _) = build_pipeline();
        assert!(matches!(
            pipeline.stop().await,
            Err(PipelineError::NotRunning)
        ));
    }

    #[tokio::test]
    async fn lifecycle_start_stop_restart() {
        let (mut pipeline, _) = build_pipeline();
        pipeline.start().unwrap();
        assert_eq!(pipeline.state(), PipelineState::Running);
        pipeline.stop().await.unwrap();
        assert_eq!(pipeline.state(), PipelineState::Stopped);
        // 정지 후 재시작 가능
        pipeline.start().unwrap();
        assert_eq!(pipeline.state(), PipelineState::Running);
        pipeline.stop().await.unwrap();
    }

    #[tokio::test]
    async fn direct_injection_updates_counters() {
        let (pipeline, store) = build_pipeline();

        let outcomes = pipeline
            .process_lines(&[ALERT_LINE, "{broken", r#"{"event_type":"flow"}"#])
            .await;
        assert_eq!(
            outcomes,
            vec![
                LineOutcome::Completed,
                LineOutcome::Discarded,
                LineOutcome::Discarded,
            ]
        );
        assert_eq!(pipeline.processed_count(), 1);
        assert_eq!(pipeline.discarded_count(), 2);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn subscription_before_start_receives_alerts() {
        let (pipeline, _) = build_pipeline();
        let mut sub = pipeline.subscribe();
        assert_eq!(pipeline.subscriber_count(), 1);

        pipeline.process_line(ALERT_LINE).await;
        let alert = sub.recv().await.unwrap();
        assert_eq!(alert.signature, "ET SCAN");
    }

    #[tokio::test]
    async fn builder_rejects_invalid_config() {
        let result = EvePipeline::builder(
            MemoryAlertStore::new(),
            MemorySearchIndex::new(),
            MemoryDailyCache::new(),
            MemoryDeviceDirectory::new(),
        )
        .config(PipelineConfig {
            poll_interval_ms: 0,
            ..Default::default()
        })
        .build();
        assert!(result.is_err());
    }
}
