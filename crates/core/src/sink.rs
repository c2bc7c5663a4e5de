//! 싱크 trait — 영속된 알림을 소비하는 외부 협력자의 좁은 인터페이스
//!
//! 파이프라인은 네 개의 외부 협력자를 capability 단위의 trait으로만 바라봅니다.
//! 구체 구현(데이터베이스, 검색 엔진, 캐시 서버)은 이 크레이트 밖에 있으며,
//! 파이프라인 코디네이터는 모든 싱크 호출을 동일한 경계에서 감싸
//! 실패 격리를 구조적으로 보장합니다.
//!
//! 각 trait은 네이티브 `async fn`을 사용하며, 제네릭(정적 디스패치)으로
//! 코디네이터에 주입됩니다.

use crate::error::{CacheError, DirectoryError, IndexError, StorageError};
use crate::types::{Alert, DayKey, Device};

/// 내구성 있는 알림 저장소
///
/// `save`는 파이프라인에서 유일하게 권위 있는 동기 쓰기입니다.
/// 성공 시 식별자가 부여된 알림을 돌려주며, 식별자는 이후 불변입니다.
pub trait AlertStore: Send + Sync {
    /// 알림을 저장하고 식별자가 부여된 사본을 반환합니다.
    fn save(&self, alert: Alert) -> impl Future<Output = Result<Alert, StorageError>> + Send;

    /// 이미 저장된 알림에 검색 인덱스 식별자를 기록합니다.
    ///
    /// 인덱싱 성공 후의 best-effort 2차 쓰기입니다. 늦게 읽는 쪽이
    /// 이 쓰기를 언제 관측하는지는 보장하지 않습니다 (eventually consistent).
    fn set_search_id(
        &self,
        alert_id: i64,
        search_id: String,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;
}

/// 검색 인덱스
pub trait SearchIndex: Send + Sync {
    /// 알림을 인덱싱하고 외부 문서 식별자를 반환합니다.
    fn index(&self, alert: &Alert) -> impl Future<Output = Result<String, IndexError>> + Send;

    /// 인덱스가 현재 사용 가능한지 확인합니다.
    fn available(&self) -> impl Future<Output = bool> + Send;
}

/// 일별 캐시
///
/// 키는 알림 자체의 이벤트 날짜에서 유도된 [`DayKey`]입니다.
pub trait DailyCache: Send + Sync {
    /// 해당 날짜 파티션에 알림을 추가합니다.
    fn append(
        &self,
        key: DayKey,
        alert: &Alert,
    ) -> impl Future<Output = Result<(), CacheError>> + Send;
}

/// 디바이스 디렉토리 — 주소 기준 읽기 전용 조회
///
/// 파이프라인은 디바이스 레코드를 절대 생성하거나 변경하지 않습니다.
pub trait DeviceDirectory: Send + Sync {
    /// 주소가 정확히 일치하는 디바이스를 조회합니다.
    fn lookup_by_address(
        &self,
        address: &str,
    ) -> impl Future<Output = Result<Option<Device>, DirectoryError>> + Send;
}
