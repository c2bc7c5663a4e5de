//! 인메모리 싱크 구현
//!
//! core의 싱크 trait([`AlertStore`](netwarden_core::sink::AlertStore) 등)에 대한
//! 참조 구현입니다. 데몬의 기본 구성과 통합 테스트에서 사용됩니다.
//! 외부 데이터베이스/검색 엔진/캐시 서버 어댑터는 trait 경계 너머의
//! 별도 관심사입니다.

pub mod memory;

pub use memory::{MemoryAlertStore, MemoryDailyCache, MemoryDeviceDirectory, MemorySearchIndex};
