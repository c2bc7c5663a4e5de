//! 라인 처리 코디네이터 — 파싱, 상관관계, 영속, 분배를 순차 실행합니다.
//!
//! 한 라인의 처리 단계:
//! 1. 파싱/정규화 (실패 시 라인 폐기, 파이프라인은 계속)
//! 2. 목적지 IP 기준 디바이스 상관관계 (best-effort)
//! 3. 권위 저장소 영속 (실패 시 해당 알림의 후속 분배 전체 생략)
//! 4. 분배: 검색 인덱스 + 실시간 브로드캐스트 + 일별 캐시 (동시 실행,
//!    각자 독립적으로 실패 가능, 저장된 알림에는 영향 없음)
//!
//! # 격리 규약
//! 분배 싱크 하나의 실패는 다른 싱크의 전달을 막지 않으며, 파이프라인을
//! 중단시키지 않습니다. 모든 싱크 호출에는 타임아웃이 걸립니다.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use netwarden_core::metrics::{
    ALERTS_PERSISTED_TOTAL, DISTRIBUTION_FAILURES_TOTAL, EVE_REJECTED_TOTAL, LABEL_SINK,
    PERSIST_FAILURES_TOTAL,
};
use netwarden_core::sink::{AlertStore, DailyCache, DeviceDirectory, SearchIndex};
use netwarden_core::types::{Alert, DayKey};

use crate::broadcast::AlertBroadcaster;
use crate::parser::EveParser;
use crate::tailer::RawLine;

/// 한 라인의 처리 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    /// 파싱 거부 (alert 아님, 손상된 JSON, 공백 라인)
    Discarded,
    /// 영속 실패 — 분배는 수행되지 않음
    Failed,
    /// 영속 완료 — 분배까지 시도됨
    Completed,
}

/// EVE 라인 처리기
///
/// 싱크 구현에 대해 제네릭하며, 복제가 저렴합니다(싱크는 자체적으로
/// `Arc`를 공유). 파이프라인 태스크와 직접 호출 양쪽에서 사용됩니다.
#[derive(Clone)]
pub struct EveProcessor<S, X, C, D> {
    parser: EveParser,
    store: S,
    index: X,
    cache: C,
    directory: D,
    broadcaster: AlertBroadcaster,
    sink_timeout: Duration,
}

impl<S, X, C, D> EveProcessor<S, X, C, D>
where
    S: AlertStore,
    X: SearchIndex,
    C: DailyCache,
    D: DeviceDirectory,
{
    /// 새 처리기를 생성합니다.
    pub fn new(
        store: S,
        index: X,
        cache: C,
        directory: D,
        broadcaster: AlertBroadcaster,
        sink_timeout: Duration,
    ) -> Self {
        Self {
            parser: EveParser::new(),
            store,
            index,
            cache,
            directory,
            broadcaster,
            sink_timeout,
        }
    }

    /// 한 라인을 끝까지 처리합니다.
    pub async fn process_line(&self, raw: &RawLine) -> LineOutcome {
        if raw.is_blank() {
            return LineOutcome::Discarded;
        }

        let mut alert = match self.parser.parse(raw) {
            Ok(alert) => alert,
            Err(rejection) => {
                debug!(%rejection, "line discarded");
                metrics::counter!(EVE_REJECTED_TOTAL).increment(1);
                return LineOutcome::Discarded;
            }
        };

        // 상관관계는 best-effort: 조회 실패는 알림 처리를 막지 않는다
        match self.directory.lookup_by_address(&alert.dest_ip).await {
            Ok(device) => alert.device = device,
            Err(e) => {
                warn!(dest_ip = %alert.dest_ip, error = %e, "device lookup failed");
            }
        }

        // 권위 쓰기: 여기서 실패하면 분배 없이 라인 종료
        let saved = match timeout(self.sink_timeout, self.store.save(alert)).await {
            Ok(Ok(saved)) => saved,
            Ok(Err(e)) => {
                error!(error = %e, "alert persistence failed");
                metrics::counter!(PERSIST_FAILURES_TOTAL).increment(1);
                return LineOutcome::Failed;
            }
            Err(_) => {
                error!(timeout_ms = self.sink_timeout.as_millis() as u64, "alert persistence timed out");
                metrics::counter!(PERSIST_FAILURES_TOTAL).increment(1);
                return LineOutcome::Failed;
            }
        };

        metrics::counter!(ALERTS_PERSISTED_TOTAL).increment(1);
        info!(
            alert_id = saved.id.unwrap_or(-1),
            signature = %saved.signature,
            severity = %saved.severity,
            source_ip = %saved.source_ip,
            dest_ip = %saved.dest_ip,
            "alert persisted"
        );

        let alert = Arc::new(saved);

        // 분배 단계는 서로 독립적이며 동시 실행
        tokio::join!(
            self.index_alert(&alert),
            self.broadcast_alert(&alert),
            self.cache_alert(&alert),
        );

        LineOutcome::Completed
    }

    /// 여러 라인을 입력 순서대로 처리합니다.
    pub async fn process_lines(&self, lines: &[RawLine]) -> Vec<LineOutcome> {
        let mut outcomes = Vec::with_capacity(lines.len());
        for raw in lines {
            outcomes.push(self.process_line(raw).await);
        }
        outcomes
    }

    /// 구독자 팬아웃용 브로드캐스터 핸들을 반환합니다.
    pub fn broadcaster(&self) -> &AlertBroadcaster {
        &self.broadcaster
    }

    async fn index_alert(&self, alert: &Arc<Alert>) {
        if !self.index.available().await {
            warn!("search index unavailable, skipping indexing");
            metrics::counter!(DISTRIBUTION_FAILURES_TOTAL, LABEL_SINK => "index").increment(1);
            return;
        }

        let external_id = match timeout(self.sink_timeout, self.index.index(alert)).await {
            Ok(Ok(external_id)) => external_id,
            Ok(Err(e)) => {
                warn!(error = %e, "search indexing failed");
                metrics::counter!(DISTRIBUTION_FAILURES_TOTAL, LABEL_SINK => "index").increment(1);
                return;
            }
            Err(_) => {
                warn!("search indexing timed out");
                metrics::counter!(DISTRIBUTION_FAILURES_TOTAL, LABEL_SINK => "index").increment(1);
                return;
            }
        };

        // 역참조 기록은 best-effort: 실패해도 저장된 알림과 인덱스 문서는 유효
        let Some(alert_id) = alert.id else {
            return;
        };
        match timeout(
            self.sink_timeout,
            self.store.set_search_id(alert_id, external_id.clone()),
        )
        .await
        {
            Ok(Ok(())) => {
                debug!(alert_id, search_id = %external_id, "search id recorded");
            }
            Ok(Err(e)) => {
                warn!(alert_id, error = %e, "failed to record search id");
            }
            Err(_) => {
                warn!(alert_id, "recording search id timed out");
            }
        }
    }

    async fn broadcast_alert(&self, alert: &Arc<Alert>) {
        let delivered = self.broadcaster.publish(Arc::clone(alert));
        debug!(delivered, "alert broadcast");
    }

    async fn cache_alert(&self, alert: &Arc<Alert>) {
        let key = DayKey::from_alert(alert);
        match timeout(self.sink_timeout, self.cache.append(key, alert)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(day = %key, error = %e, "daily cache append failed");
                metrics::counter!(DISTRIBUTION_FAILURES_TOTAL, LABEL_SINK => "cache").increment(1);
            }
            Err(_) => {
                warn!(day = %key, "daily cache append timed out");
                metrics::counter!(DISTRIBUTION_FAILURES_TOTAL, LABEL_SINK => "cache").increment(1);
            }
        }
    }
}
