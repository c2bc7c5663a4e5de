//! # netwarden-eve-pipeline
//!
//! Suricata EVE 로그 수집/정규화/영속/분배 파이프라인입니다.
//!
//! ```text
//! eve.json ──> tailer ──> parser ──> processor ─┬─> AlertStore (권위)
//!                                               ├─> SearchIndex
//!                                               ├─> AlertBroadcaster ──> 구독자
//!                                               └─> DailyCache
//! ```
//!
//! ## 모듈 구성
//! - [`tailer`]: 파일 폴링, 로테이션/축소 복구, 라인 스트림
//! - [`parser`]: EVE JSON -> canonical `Alert` 정규화
//! - [`processor`]: 라인 단위 파싱-상관관계-영속-분배 코디네이터
//! - [`broadcast`]: 실시간 구독자 팬아웃 허브
//! - [`sink`]: 인메모리 싱크 참조 구현
//! - [`pipeline`]: 전체 생명주기 (start/stop/subscribe)
//! - [`config`]: 파이프라인 설정과 빌더
//! - [`error`]: 파이프라인 에러 타입
//!
//! ## 실패 정책
//! 알림 단위 실패는 해당 알림에서 끝납니다. 파서 거부와 분배 싱크
//! 실패는 스트림을 멈추지 않으며, 권위 저장소 실패만 해당 알림의
//! 분배를 생략시킵니다.

pub mod broadcast;
pub mod config;
pub mod error;
pub mod parser;
pub mod pipeline;
pub mod processor;
pub mod sink;
pub mod tailer;

pub use broadcast::{AlertBroadcaster, AlertSubscription};
pub use config::{PipelineConfig, PipelineConfigBuilder};
pub use error::EvePipelineError;
pub use parser::{EveParser, ParseRejection};
pub use pipeline::{EvePipeline, EvePipelineBuilder, PipelineState};
pub use processor::{EveProcessor, LineOutcome};
pub use sink::{MemoryAlertStore, MemoryDailyCache, MemoryDeviceDirectory, MemorySearchIndex};
pub use tailer::{LogTailer, RawLine, TailerConfig, TailerHandle};
