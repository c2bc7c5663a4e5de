//! 인메모리 싱크 — trait 경계를 검증하는 참조 구현
//!
//! 모든 구현은 내부적으로 `Arc`를 공유하므로 복제가 저렴하며,
//! 파이프라인에 넘긴 뒤에도 원본 핸들로 내용을 관찰할 수 있습니다.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::debug;

use netwarden_core::error::{CacheError, DirectoryError, IndexError, StorageError};
use netwarden_core::sink::{AlertStore, DailyCache, DeviceDirectory, SearchIndex};
use netwarden_core::types::{Alert, DayKey, Device};

/// 인메모리 알림 저장소
///
/// 식별자는 1부터 시작하는 단조 증가 시퀀스로 부여됩니다.
#[derive(Clone, Default)]
pub struct MemoryAlertStore {
    inner: Arc<StoreInner>,
}

#[derive(Default)]
struct StoreInner {
    alerts: Mutex<Vec<Alert>>,
    next_id: AtomicI64,
}

impl MemoryAlertStore {
    /// 새 저장소를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 식별자로 알림을 조회합니다.
    pub fn get(&self, id: i64) -> Option<Alert> {
        self.inner
            .alerts
            .lock()
            .expect("store lock poisoned")
            .iter()
            .find(|a| a.id == Some(id))
            .cloned()
    }

    /// 저장된 알림 수를 반환합니다.
    pub fn len(&self) -> usize {
        self.inner.alerts.lock().expect("store lock poisoned").len()
    }

    /// 저장소가 비어 있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 최근 저장된 알림을 최신순으로 반환합니다.
    pub fn recent(&self, limit: usize) -> Vec<Alert> {
        let alerts = self.inner.alerts.lock().expect("store lock poisoned");
        alerts.iter().rev().take(limit).cloned().collect()
    }
}

impl AlertStore for MemoryAlertStore {
    async fn save(&self, mut alert: Alert) -> Result<Alert, StorageError> {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        alert.id = Some(id);
        self.inner
            .alerts
            .lock()
            .expect("store lock poisoned")
            .push(alert.clone());
        Ok(alert)
    }

    async fn set_search_id(&self, alert_id: i64, search_id: String) -> Result<(), StorageError> {
        let mut alerts = self.inner.alerts.lock().expect("store lock poisoned");
        let alert = alerts
            .iter_mut()
            .find(|a| a.id == Some(alert_id))
            .ok_or(StorageError::NotFound(alert_id))?;
        // 최대 한 번만 설정: 이미 있으면 최초 값을 유지
        if alert.search_id.is_none() {
            alert.search_id = Some(search_id);
        } else {
            debug!(alert_id, "search id already set, keeping first value");
        }
        Ok(())
    }
}

/// 인메모리 검색 인덱스
///
/// 외부 식별자로 UUID v4 문자열을 부여합니다. `set_available(false)`로
/// 인덱스 정지를 흉내낼 수 있습니다.
#[derive(Clone, Default)]
pub struct MemorySearchIndex {
    inner: Arc<IndexInner>,
}

struct IndexInner {
    documents: Mutex<HashMap<String, Alert>>,
    available: AtomicBool,
}

impl Default for IndexInner {
    fn default() -> Self {
        Self {
            documents: Mutex::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }
}

impl MemorySearchIndex {
    /// 새 인덱스를 생성합니다 (초기 상태: 사용 가능).
    pub fn new() -> Self {
        Self::default()
    }

    /// 인덱스 사용 가능 여부를 설정합니다.
    pub fn set_available(&self, available: bool) {
        self.inner.available.store(available, Ordering::Relaxed);
    }

    /// 인덱싱된 문서 수를 반환합니다.
    pub fn len(&self) -> usize {
        self.inner
            .documents
            .lock()
            .expect("index lock poisoned")
            .len()
    }

    /// 인덱스가 비어 있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 외부 식별자로 문서를 조회합니다.
    pub fn get(&self, external_id: &str) -> Option<Alert> {
        self.inner
            .documents
            .lock()
            .expect("index lock poisoned")
            .get(external_id)
            .cloned()
    }
}

impl SearchIndex for MemorySearchIndex {
    async fn index(&self, alert: &Alert) -> Result<String, IndexError> {
        if !self.inner.available.load(Ordering::Relaxed) {
            return Err(IndexError::Unavailable("index is offline".to_owned()));
        }
        let external_id = uuid::Uuid::new_v4().to_string();
        self.inner
            .documents
            .lock()
            .expect("index lock poisoned")
            .insert(external_id.clone(), alert.clone());
        Ok(external_id)
    }

    async fn available(&self) -> bool {
        self.inner.available.load(Ordering::Relaxed)
    }
}

/// 인메모리 일별 캐시
///
/// [`DayKey`]별 리스트에 알림을 추가합니다 (Redis list의 rpush에 해당).
#[derive(Clone, Default)]
pub struct MemoryDailyCache {
    inner: Arc<Mutex<HashMap<DayKey, Vec<Alert>>>>,
}

impl MemoryDailyCache {
    /// 새 캐시를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 해당 날짜 파티션의 알림을 반환합니다.
    pub fn partition(&self, key: DayKey) -> Vec<Alert> {
        self.inner
            .lock()
            .expect("cache lock poisoned")
            .get(&key)
            .cloned()
            .unwrap_or_default()
    }

    /// 파티션 수를 반환합니다.
    pub fn partition_count(&self) -> usize {
        self.inner.lock().expect("cache lock poisoned").len()
    }
}

impl DailyCache for MemoryDailyCache {
    async fn append(&self, key: DayKey, alert: &Alert) -> Result<(), CacheError> {
        self.inner
            .lock()
            .expect("cache lock poisoned")
            .entry(key)
            .or_default()
            .push(alert.clone());
        Ok(())
    }
}

/// 인메모리 디바이스 디렉토리
///
/// 주소 기준 정확 일치 조회만 제공합니다. 파이프라인은 이 디렉토리에
/// 쓰지 않으며, 시드는 생성 시점에만 주입됩니다.
#[derive(Clone, Default)]
pub struct MemoryDeviceDirectory {
    devices: Arc<HashMap<String, Device>>,
}

impl MemoryDeviceDirectory {
    /// 빈 디렉토리를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 디바이스 목록으로 디렉토리를 생성합니다.
    pub fn with_devices(devices: impl IntoIterator<Item = Device>) -> Self {
        Self {
            devices: Arc::new(
                devices
                    .into_iter()
                    .map(|d| (d.ip_address.clone(), d))
                    .collect(),
            ),
        }
    }
}

impl DeviceDirectory for MemoryDeviceDirectory {
    async fn lookup_by_address(&self, address: &str) -> Result<Option<Device>, DirectoryError> {
        Ok(self.devices.get(address).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use netwarden_core::types::Severity;

    fn sample_alert() -> Alert {
        Alert {
            id: None,
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap(),
            source_ip: "1.2.3.4".to_owned(),
            dest_ip: "5.6.7.8".to_owned(),
            source_port: 443,
            dest_port: 51000,
            protocol: "TCP".to_owned(),
            signature: "ET SCAN".to_owned(),
            category: "scan".to_owned(),
            severity: Severity::Medium,
            signature_id: 123,
            generator_id: 1,
            action: "allowed".to_owned(),
            payload: None,
            device: None,
            search_id: None,
        }
    }

    #[tokio::test]
    async fn store_assigns_sequential_ids() {
        let store = MemoryAlertStore::new();
        let first = store.save(sample_alert()).await.unwrap();
        let second = store.save(sample_alert()).await.unwrap();
        assert_eq!(first.id, Some(1));
        assert_eq!(second.id, Some(2));
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn store_set_search_id_once() {
        let store = MemoryAlertStore::new();
        let saved = store.save(sample_alert()).await.unwrap();
        let id = saved.id.unwrap();

        store.set_search_id(id, "es-1".to_owned()).await.unwrap();
        assert_eq!(store.get(id).unwrap().search_id.as_deref(), Some("es-1"));

        // 두 번째 설정은 무시되고 최초 값 유지
        store.set_search_id(id, "es-2".to_owned()).await.unwrap();
        assert_eq!(store.get(id).unwrap().search_id.as_deref(), Some("es-1"));
    }

    #[tokio::test]
    async fn store_set_search_id_unknown_alert_fails() {
        let store = MemoryAlertStore::new();
        let result = store.set_search_id(42, "es-1".to_owned()).await;
        assert!(matches!(result, Err(StorageError::NotFound(42))));
    }

    #[tokio::test]
    async fn store_recent_returns_latest_first() {
        let store = MemoryAlertStore::new();
        for signature in ["a", "b", "c"] {
            let mut alert = sample_alert();
            alert.signature = signature.to_owned();
            store.save(alert).await.unwrap();
        }
        let recent = store.recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].signature, "c");
        assert_eq!(recent[1].signature, "b");
    }

    #[tokio::test]
    async fn index_assigns_external_id() {
        let index = MemorySearchIndex::new();
        assert!(index.available().await);
        let external_id = index.index(&sample_alert()).await.unwrap();
        assert!(!external_id.is_empty());
        assert_eq!(index.len(), 1);
        assert!(index.get(&external_id).is_some());
    }

    #[tokio::test]
    async fn index_unavailable_rejects() {
        let index = MemorySearchIndex::new();
        index.set_available(false);
        assert!(!index.available().await);
        let result = index.index(&sample_alert()).await;
        assert!(matches!(result, Err(IndexError::Unavailable(_))));
        assert!(index.is_empty());
    }

    #[tokio::test]
    async fn cache_appends_to_day_partition() {
        let cache = MemoryDailyCache::new();
        let alert = sample_alert();
        let key = DayKey::from_alert(&alert);
        cache.append(key, &alert).await.unwrap();
        cache.append(key, &alert).await.unwrap();
        assert_eq!(cache.partition(key).len(), 2);
        assert_eq!(cache.partition_count(), 1);
    }

    #[tokio::test]
    async fn directory_exact_match_only() {
        let directory = MemoryDeviceDirectory::with_devices([Device {
            id: 1,
            ip_address: "5.6.7.8".to_owned(),
            mac_address: "aa:bb:cc:dd:ee:ff".to_owned(),
            hostname: "server-01".to_owned(),
            vendor: "Dell".to_owned(),
            state: "up".to_owned(),
        }]);

        let hit = directory.lookup_by_address("5.6.7.8").await.unwrap();
        assert_eq!(hit.unwrap().hostname, "server-01");

        let miss = directory.lookup_by_address("5.6.7.9").await.unwrap();
        assert!(miss.is_none());
    }
}
