//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`
//! 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//! - 접두어: `netwarden_`
//! - 접미어: `_total` (counter), 없음 (gauge)

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 싱크 레이블 키 (store, index, cache, broadcast)
pub const LABEL_SINK: &str = "sink";

// ─── EVE 파이프라인 메트릭 ──────────────────────────────────────────

/// 테일러가 전달한 라인 수 (counter)
pub const EVE_LINES_TOTAL: &str = "netwarden_eve_lines_total";

/// 파서가 거부한 라인 수 (counter)
pub const EVE_REJECTED_TOTAL: &str = "netwarden_eve_rejected_total";

/// 저장소에 영속된 알림 수 (counter)
pub const ALERTS_PERSISTED_TOTAL: &str = "netwarden_alerts_persisted_total";

/// 저장소 쓰기 실패 수 (counter)
pub const PERSIST_FAILURES_TOTAL: &str = "netwarden_persist_failures_total";

/// 분배 단계 실패 수 (counter, label: sink)
pub const DISTRIBUTION_FAILURES_TOTAL: &str = "netwarden_distribution_failures_total";

/// 구독자에게 전달된 알림 수 (counter)
pub const BROADCAST_DELIVERED_TOTAL: &str = "netwarden_broadcast_delivered_total";

/// 현재 구독자 수 (gauge)
pub const SUBSCRIBERS: &str = "netwarden_subscribers";

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// `metrics::describe_counter!()`, `describe_gauge!()`를 호출하여
/// 레코더의 HELP 텍스트를 설정합니다.
///
/// 이 함수는 전역 레코더 설치 후 한 번만 호출해야 합니다.
/// 일반적으로 `netwarden-daemon`의 시작 시점에서 호출합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge};

    describe_counter!(
        EVE_LINES_TOTAL,
        "Total number of raw lines delivered by the EVE log tailer"
    );
    describe_counter!(
        EVE_REJECTED_TOTAL,
        "Total number of lines rejected by the EVE parser (malformed or non-alert)"
    );
    describe_counter!(
        ALERTS_PERSISTED_TOTAL,
        "Total number of alerts persisted to the durable store"
    );
    describe_counter!(
        PERSIST_FAILURES_TOTAL,
        "Total number of failed durable store writes"
    );
    describe_counter!(
        DISTRIBUTION_FAILURES_TOTAL,
        "Total number of distribution failures per sink (index, cache)"
    );
    describe_counter!(
        BROADCAST_DELIVERED_TOTAL,
        "Total number of alerts delivered to live subscribers"
    );
    describe_gauge!(SUBSCRIBERS, "Number of currently registered live subscribers");
}
