//! 실시간 브로드캐스터 — 영속된 알림을 모든 구독자에게 팬아웃합니다.
//!
//! 프레임워크 수준의 암묵적 이벤트 버스 대신, 코디네이터가 직접 소유하고
//! 호출하는 명시적 publish/subscribe 허브입니다.
//!
//! # 전달 규약
//! - 구독 시점 이후에 발행된 알림만 수신합니다 (히스토리 재생 없음)
//! - 구독자별 전달 순서는 발행 순서와 일치합니다
//! - 한 구독자에 대한 전달은 다른 구독자를 막지 않습니다 (`try_send`)
//! - 전달 실패(연결 종료, 버퍼 가득 참)는 해당 구독자만 제거합니다
//!
//! # 동시성
//! 구독자 집합은 짧은 `std::sync::Mutex`로 보호되며, 발행은
//! snapshot-and-iterate 방식입니다: 락 안에서 송신 핸들을 복사하고,
//! 락 밖에서 전달합니다. 발행 중의 subscribe/unsubscribe는 진행 중인
//! 전달을 손상시키지 않습니다.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::{debug, warn};

use netwarden_core::metrics::{BROADCAST_DELIVERED_TOTAL, SUBSCRIBERS};
use netwarden_core::types::Alert;

/// 허브 내부 공유 상태
struct Shared {
    /// 구독자 ID -> 송신 핸들
    subscribers: Mutex<HashMap<u64, mpsc::Sender<Arc<Alert>>>>,
    /// 다음 구독자 ID
    next_id: AtomicU64,
    /// 구독자별 전송 버퍼 크기
    buffer: usize,
}

impl Shared {
    fn remove(&self, id: u64) -> bool {
        let removed = self
            .subscribers
            .lock()
            .expect("subscriber lock poisoned")
            .remove(&id)
            .is_some();
        if removed {
            metrics::gauge!(SUBSCRIBERS).decrement(1.0);
        }
        removed
    }
}

/// 알림 브로드캐스터
///
/// 복제가 저렴하며(`Arc` 내부 공유), 모든 복제본은 같은 구독자 집합을
/// 바라봅니다.
#[derive(Clone)]
pub struct AlertBroadcaster {
    shared: Arc<Shared>,
}

impl AlertBroadcaster {
    /// 구독자별 버퍼 크기로 새 허브를 생성합니다.
    pub fn new(buffer: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                subscribers: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                buffer,
            }),
        }
    }

    /// 새 구독자를 등록하고 수신 핸들을 반환합니다.
    ///
    /// 반환된 구독은 등록 이후 발행된 알림만 수신합니다.
    pub fn subscribe(&self) -> AlertSubscription {
        let (tx, rx) = mpsc::channel(self.shared.buffer);
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        self.shared
            .subscribers
            .lock()
            .expect("subscriber lock poisoned")
            .insert(id, tx);
        metrics::gauge!(SUBSCRIBERS).increment(1.0);
        debug!(subscriber = id, "observer subscribed");
        AlertSubscription {
            id,
            rx,
            shared: Arc::clone(&self.shared),
        }
    }

    /// 알림을 현재 등록된 모든 구독자에게 전달합니다.
    ///
    /// 전달에 실패한 구독자(연결 종료 또는 버퍼 가득 참)는 등록 해제되고
    /// 자원이 해제됩니다. 성공적으로 전달된 구독자 수를 반환합니다.
    pub fn publish(&self, alert: Arc<Alert>) -> usize {
        // 스냅샷: 락을 잡은 채로 전달하지 않는다
        let snapshot: Vec<(u64, mpsc::Sender<Arc<Alert>>)> = {
            let subscribers = self
                .shared
                .subscribers
                .lock()
                .expect("subscriber lock poisoned");
            subscribers
                .iter()
                .map(|(id, tx)| (*id, tx.clone()))
                .collect()
        };

        let mut delivered = 0usize;
        let mut failed: Vec<u64> = Vec::new();
        for (id, tx) in snapshot {
            match tx.try_send(Arc::clone(&alert)) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(subscriber = id, "observer lagging, unsubscribing");
                    failed.push(id);
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    debug!(subscriber = id, "observer gone, unsubscribing");
                    failed.push(id);
                }
            }
        }

        for id in failed {
            self.shared.remove(id);
        }

        metrics::counter!(BROADCAST_DELIVERED_TOTAL).increment(delivered as u64);
        delivered
    }

    /// 구독자를 등록 해제합니다. 멱등적입니다.
    pub fn unsubscribe(&self, id: u64) -> bool {
        self.shared.remove(id)
    }

    /// 현재 구독자 수를 반환합니다.
    pub fn subscriber_count(&self) -> usize {
        self.shared
            .subscribers
            .lock()
            .expect("subscriber lock poisoned")
            .len()
    }
}

/// 한 구독자의 수신 핸들
///
/// 구독 이후 발행된 알림의 무한, 재시작 불가능한 시퀀스를 제공합니다.
/// 드롭 시 자동으로 등록 해제됩니다.
pub struct AlertSubscription {
    id: u64,
    rx: mpsc::Receiver<Arc<Alert>>,
    shared: Arc<Shared>,
}

impl AlertSubscription {
    /// 구독자 ID를 반환합니다.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// 다음 알림을 수신합니다.
    ///
    /// 구독이 해제되었고 버퍼가 비었으면 `None`을 반환합니다.
    pub async fn recv(&mut self) -> Option<Arc<Alert>> {
        self.rx.recv().await
    }

    /// 대기 없이 다음 알림을 시도 수신합니다 (테스트 편의).
    pub fn try_recv(&mut self) -> Option<Arc<Alert>> {
        self.rx.try_recv().ok()
    }
}

impl Drop for AlertSubscription {
    fn drop(&mut self) {
        self.shared.remove(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use netwarden_core::types::Severity;

    fn sample_alert(signature: &str) -> Arc<Alert> {
        Arc::new(Alert {
            id: Some(1),
            timestamp: Utc::now(),
            source_ip: "1.2.3.4".to_owned(),
            dest_ip: "5.6.7.8".to_owned(),
            source_port: 1,
            dest_port: 2,
            protocol: "TCP".to_owned(),
            signature: signature.to_owned(),
            category: "test".to_owned(),
            severity: Severity::Medium,
            signature_id: 1,
            generator_id: 1,
            action: "allowed".to_owned(),
            payload: None,
            device: None,
            search_id: None,
        })
    }

    #[tokio::test]
    async fn subscriber_receives_published_alert() {
        let hub = AlertBroadcaster::new(8);
        let mut sub = hub.subscribe();

        let delivered = hub.publish(sample_alert("sig-a"));
        assert_eq!(delivered, 1);

        let received = sub.recv().await.unwrap();
        assert_eq!(received.signature, "sig-a");
    }

    #[tokio::test]
    async fn late_subscriber_gets_no_history() {
        let hub = AlertBroadcaster::new(8);
        hub.publish(sample_alert("before"));

        let mut sub = hub.subscribe();
        assert!(sub.try_recv().is_none());

        hub.publish(sample_alert("after"));
        assert_eq!(sub.recv().await.unwrap().signature, "after");
    }

    #[tokio::test]
    async fn delivery_order_matches_publish_order() {
        let hub = AlertBroadcaster::new(8);
        let mut sub = hub.subscribe();

        hub.publish(sample_alert("one"));
        hub.publish(sample_alert("two"));
        hub.publish(sample_alert("three"));

        assert_eq!(sub.recv().await.unwrap().signature, "one");
        assert_eq!(sub.recv().await.unwrap().signature, "two");
        assert_eq!(sub.recv().await.unwrap().signature, "three");
    }

    #[tokio::test]
    async fn dropped_subscriber_is_removed_on_publish() {
        let hub = AlertBroadcaster::new(8);
        let sub_a = hub.subscribe();
        let mut sub_b = hub.subscribe();
        assert_eq!(hub.subscriber_count(), 2);

        drop(sub_a);
        // Drop이 즉시 등록 해제
        assert_eq!(hub.subscriber_count(), 1);

        // 남은 구독자는 계속 수신
        let delivered = hub.publish(sample_alert("still-works"));
        assert_eq!(delivered, 1);
        assert_eq!(sub_b.recv().await.unwrap().signature, "still-works");
    }

    #[tokio::test]
    async fn lagging_subscriber_is_unsubscribed_without_blocking_others() {
        let hub = AlertBroadcaster::new(1);
        let mut slow = hub.subscribe();
        let mut fast = hub.subscribe();

        // slow의 버퍼(1)를 채움
        assert_eq!(hub.publish(sample_alert("fill")), 2);
        // slow는 소비하지 않음 -> 다음 발행에서 탈락
        assert_eq!(fast.recv().await.unwrap().signature, "fill");

        let delivered = hub.publish(sample_alert("second"));
        assert_eq!(delivered, 1);
        assert_eq!(hub.subscriber_count(), 1);
        assert_eq!(fast.recv().await.unwrap().signature, "second");

        // 탈락한 구독자는 버퍼에 남은 것만 보고 종료
        assert_eq!(slow.recv().await.unwrap().signature, "fill");
        assert!(slow.recv().await.is_none());
        // 이미 제거된 구독의 드롭은 멱등적
        drop(slow);
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let hub = AlertBroadcaster::new(8);
        let sub = hub.subscribe();
        let id = sub.id();
        // rx는 살아있지만 강제로 해제
        assert!(hub.unsubscribe(id));
        assert!(!hub.unsubscribe(id));
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn publish_with_no_subscribers_is_noop() {
        let hub = AlertBroadcaster::new(8);
        assert_eq!(hub.publish(sample_alert("nobody")), 0);
    }

    #[tokio::test]
    async fn concurrent_subscribe_during_publish_is_safe() {
        let hub = AlertBroadcaster::new(64);
        let mut handles = Vec::new();
        for _ in 0..8 {
            let hub = hub.clone();
            handles.push(tokio::spawn(async move {
                for _ in 0..50 {
                    let sub = hub.subscribe();
                    hub.publish(sample_alert("churn"));
                    drop(sub);
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(hub.subscriber_count(), 0);
    }
}
