//! Netwarden 공통 크레이트 — 도메인 타입, 싱크 trait, 에러, 설정
//!
//! # 모듈 구성
//!
//! - [`types`]: [`Alert`], [`Severity`], [`Device`], [`DayKey`] 등 도메인 타입
//! - [`sink`]: 저장소/검색 인덱스/일별 캐시/디바이스 디렉토리 capability trait
//! - [`error`]: 도메인 에러 타입과 실패 정책
//! - [`config`]: `netwarden.toml` 파싱, 환경변수 오버라이드, 검증
//! - [`metrics`]: 메트릭 이름 상수

pub mod config;
pub mod error;
pub mod metrics;
pub mod sink;
pub mod types;

// --- 주요 타입 re-export ---

// 에러
pub use error::{
    CacheError, ConfigError, DirectoryError, IndexError, NetwardenError, PipelineError,
    StorageError,
};

// 설정
pub use config::{EvePipelineSection, GeneralConfig, NetwardenConfig};

// 싱크 trait
pub use sink::{AlertStore, DailyCache, DeviceDirectory, SearchIndex};

// 도메인 타입
pub use types::{Alert, DayKey, Device, Severity};
