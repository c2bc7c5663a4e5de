//! 도메인 타입 — 시스템 전역에서 사용되는 공통 타입
//!
//! 파이프라인의 모든 단계가 공유하는 데이터 구조를 정의합니다.
//! 중심 타입은 [`Alert`]로, EVE 로그 한 줄을 정규화한 결과이며
//! 저장소/검색 인덱스/일별 캐시/실시간 브로드캐스트가 모두 이 타입을 소비합니다.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// 심각도 레벨
///
/// 보안 알림의 심각도를 나타냅니다.
/// `Ord` 구현으로 심각도 비교가 가능합니다 (`Low < Medium < High < Critical`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// 낮은 심각도
    Low,
    /// 중간 심각도 (기본값)
    Medium,
    /// 높은 심각도
    High,
    /// 치명적 — 즉시 대응 필요
    Critical,
}

impl Default for Severity {
    fn default() -> Self {
        Self::Medium
    }
}

impl Severity {
    /// Suricata EVE 심각도 코드를 변환합니다.
    ///
    /// EVE 코드: 1 = high, 2 = medium, 3 = low.
    /// 알 수 없는 코드(결측 포함)는 Medium으로 매핑하며, 절대 실패하지 않습니다.
    pub fn from_eve_code(code: i64) -> Self {
        match code {
            1 => Self::High,
            2 => Self::Medium,
            3 => Self::Low,
            _ => Self::Medium,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "Low"),
            Self::Medium => write!(f, "Medium"),
            Self::High => write!(f, "High"),
            Self::Critical => write!(f, "Critical"),
        }
    }
}

/// 정규화된 보안 알림
///
/// EVE 로그 한 줄에서 파싱된 canonical 레코드입니다.
/// 생성 시점에는 `id`가 없으며, 저장소 쓰기가 성공했을 때 정확히 한 번 부여됩니다.
/// `search_id`는 검색 인덱싱 성공 후 최대 한 번 설정됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    /// 저장소가 부여한 식별자 (미영속 상태에서는 None)
    pub id: Option<i64>,
    /// 이벤트 발생 시각 (파싱 불가 시 수집 시각)
    pub timestamp: DateTime<Utc>,
    /// 출발지 주소 (알 수 없으면 빈 문자열, 결측 불가)
    pub source_ip: String,
    /// 목적지 주소 (알 수 없으면 빈 문자열, 결측 불가)
    pub dest_ip: String,
    /// 출발지 포트
    pub source_port: u16,
    /// 목적지 포트
    pub dest_port: u16,
    /// 전송 프로토콜 (TCP, UDP 등)
    pub protocol: String,
    /// 시그니처 텍스트
    pub signature: String,
    /// 분류 텍스트
    pub category: String,
    /// 심각도
    pub severity: Severity,
    /// 시그니처 ID
    pub signature_id: u64,
    /// 제너레이터 ID
    pub generator_id: u64,
    /// 센서가 취한 조치 (allowed, blocked 등)
    pub action: String,
    /// 페이로드 발췌 (있을 경우 원문 그대로)
    pub payload: Option<String>,
    /// 상관된 디바이스 (목적지 주소 기준, best-effort)
    pub device: Option<Device>,
    /// 검색 인덱스 외부 식별자 (인덱싱 성공 후 최대 한 번 설정)
    pub search_id: Option<String>,
}

impl Alert {
    /// 알림이 저장소에 영속되었는지 확인합니다.
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {}:{} -> {}:{} ({})",
            self.severity,
            self.signature,
            self.source_ip,
            self.source_port,
            self.dest_ip,
            self.dest_port,
            self.category,
        )
    }
}

/// 알려진 디바이스 레코드
///
/// 디바이스 디렉토리에서 조회한 읽기 전용 정보입니다.
/// 파이프라인은 디바이스 레코드를 생성하거나 변경하지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// 디바이스 식별자
    pub id: i64,
    /// IP 주소
    pub ip_address: String,
    /// MAC 주소
    pub mac_address: String,
    /// 호스트명
    pub hostname: String,
    /// 제조사
    pub vendor: String,
    /// 상태 (up, down 등)
    pub state: String,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.hostname, self.ip_address)
    }
}

/// 일별 캐시 파티션 키
///
/// 알림 자체의 이벤트 타임스탬프가 속한 달력 날짜에서 유도됩니다.
/// 수집(벽시계) 시각이 아니라는 점이 중요합니다: 어제 발생한 알림은
/// 오늘 수집되더라도 어제 파티션에 들어갑니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DayKey(pub NaiveDate);

impl DayKey {
    /// 알림의 이벤트 타임스탬프에서 키를 유도합니다.
    pub fn from_alert(alert: &Alert) -> Self {
        Self(alert.timestamp.date_naive())
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "daily_threats:{}", self.0.format("%Y-%m-%d"))
    }
}
