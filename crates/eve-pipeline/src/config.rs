//! EVE 파이프라인 설정
//!
//! [`PipelineConfig`]는 core의 [`EvePipelineSection`](netwarden_core::config::EvePipelineSection)을
//! 기반으로 파이프라인 전용 설정을 제공합니다.
//!
//! # 사용 예시
//! ```ignore
//! use netwarden_core::config::NetwardenConfig;
//! use netwarden_eve_pipeline::config::PipelineConfig;
//!
//! let core_config = NetwardenConfig::default();
//! let config = PipelineConfig::from_core(&core_config.pipeline);
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::EvePipelineError;

/// EVE 파이프라인 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// 감시할 EVE 로그 파일 경로
    pub eve_log_path: PathBuf,
    /// 파일 상태 체크 주기 (밀리초)
    pub poll_interval_ms: u64,
    /// true이면 파일의 현재 시작점부터 읽음 (기존 알림 재처리)
    pub read_from_start: bool,
    /// 싱크 호출별 타임아웃 (밀리초)
    ///
    /// 느린 싱크 하나가 폴 루프를 무한정 붙잡지 못하게 합니다.
    pub sink_timeout_ms: u64,
    /// 구독자별 전송 버퍼 크기
    pub subscriber_buffer: usize,
    /// 테일러 -> 코디네이터 라인 채널 용량
    pub line_channel_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            eve_log_path: PathBuf::from("/var/log/suricata/eve.json"),
            poll_interval_ms: 1000,
            read_from_start: false,
            sink_timeout_ms: 5000,
            subscriber_buffer: 256,
            line_channel_capacity: 1024,
        }
    }
}

impl PipelineConfig {
    /// core의 `EvePipelineSection`에서 파이프라인 설정을 생성합니다.
    pub fn from_core(core: &netwarden_core::config::EvePipelineSection) -> Self {
        Self {
            eve_log_path: PathBuf::from(&core.eve_log_path),
            poll_interval_ms: core.poll_interval_ms,
            read_from_start: core.read_from_start,
            sink_timeout_ms: core.sink_timeout_ms,
            subscriber_buffer: core.subscriber_buffer,
            line_channel_capacity: core.line_channel_capacity,
        }
    }

    /// 폴 주기를 `Duration`으로 반환합니다.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// 싱크 타임아웃을 `Duration`으로 반환합니다.
    pub fn sink_timeout(&self) -> Duration {
        Duration::from_millis(self.sink_timeout_ms)
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), EvePipelineError> {
        if self.eve_log_path.as_os_str().is_empty() {
            return Err(EvePipelineError::Config {
                field: "eve_log_path".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }
        if self.poll_interval_ms == 0 {
            return Err(EvePipelineError::Config {
                field: "poll_interval_ms".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }
        if self.sink_timeout_ms == 0 {
            return Err(EvePipelineError::Config {
                field: "sink_timeout_ms".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }
        if self.subscriber_buffer == 0 {
            return Err(EvePipelineError::Config {
                field: "subscriber_buffer".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }
        if self.line_channel_capacity == 0 {
            return Err(EvePipelineError::Config {
                field: "line_channel_capacity".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }
        Ok(())
    }
}

/// 파이프라인 설정 빌더
#[derive(Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 감시할 EVE 로그 경로를 설정합니다.
    pub fn eve_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.eve_log_path = path.into();
        self
    }

    /// 폴 주기(밀리초)를 설정합니다.
    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms;
        self
    }

    /// 파일 시작점부터 읽을지 설정합니다.
    pub fn read_from_start(mut self, from_start: bool) -> Self {
        self.config.read_from_start = from_start;
        self
    }

    /// 싱크 타임아웃(밀리초)을 설정합니다.
    pub fn sink_timeout_ms(mut self, ms: u64) -> Self {
        self.config.sink_timeout_ms = ms;
        self
    }

    /// 구독자 버퍼 크기를 설정합니다.
    pub fn subscriber_buffer(mut self, buffer: usize) -> Self {
        self.config.subscriber_buffer = buffer;
        self
    }

    /// 라인 채널 용량을 설정합니다.
    pub fn line_channel_capacity(mut self, capacity: usize) -> Self {
        self.config.line_channel_capacity = capacity;
        self
    }

    /// 설정을 검증하고 `PipelineConfig`를 생성합니다.
    pub fn build(self) -> Result<PipelineConfig, EvePipelineError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
