//! 설정 관리 — netwarden.toml 파싱 및 런타임 설정
//!
//! [`NetwardenConfig`]는 모든 섹션의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`NETWARDEN_PIPELINE_EVE_LOG_PATH=/var/log/suricata/eve.json` 형식)
//! 3. 설정 파일 (`netwarden.toml`)
//! 4. 기본값 (`Default` 구현)

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, NetwardenError};

/// Netwarden 통합 설정
///
/// `netwarden.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetwardenConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// EVE 수집 파이프라인 설정
    #[serde(default)]
    pub pipeline: EvePipelineSection,
}

impl NetwardenConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, NetwardenError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, NetwardenError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                NetwardenError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                NetwardenError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, NetwardenError> {
        toml::from_str(toml_str).map_err(|e| {
            NetwardenError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `NETWARDEN_{SECTION}_{FIELD}`
    pub fn apply_env_overrides(&mut self) {
        override_string(&mut self.general.log_level, "NETWARDEN_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "NETWARDEN_GENERAL_LOG_FORMAT");

        override_bool(&mut self.pipeline.enabled, "NETWARDEN_PIPELINE_ENABLED");
        override_string(
            &mut self.pipeline.eve_log_path,
            "NETWARDEN_PIPELINE_EVE_LOG_PATH",
        );
        override_u64(
            &mut self.pipeline.poll_interval_ms,
            "NETWARDEN_PIPELINE_POLL_INTERVAL_MS",
        );
        override_bool(
            &mut self.pipeline.read_from_start,
            "NETWARDEN_PIPELINE_READ_FROM_START",
        );
        override_u64(
            &mut self.pipeline.sink_timeout_ms,
            "NETWARDEN_PIPELINE_SINK_TIMEOUT_MS",
        );
        override_usize(
            &mut self.pipeline.subscriber_buffer,
            "NETWARDEN_PIPELINE_SUBSCRIBER_BUFFER",
        );
        override_usize(
            &mut self.pipeline.line_channel_capacity,
            "NETWARDEN_PIPELINE_LINE_CHANNEL_CAPACITY",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), NetwardenError> {
        self.general.validate()?;
        self.pipeline.validate()?;
        Ok(())
    }
}

/// 일반 설정 (로깅)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 출력 형식 ("json" 또는 "pretty")
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

impl GeneralConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        const FORMATS: &[&str] = &["json", "pretty"];
        if !FORMATS.contains(&self.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("'{}' is not one of {:?}", self.log_format, FORMATS),
            });
        }
        Ok(())
    }
}

/// EVE 수집 파이프라인 섹션
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvePipelineSection {
    /// 활성화 여부
    pub enabled: bool,
    /// 감시할 EVE 로그 파일 경로
    pub eve_log_path: String,
    /// 파일 상태 체크 주기 (밀리초)
    pub poll_interval_ms: u64,
    /// true이면 파일의 현재 시작점부터 읽음 (기존 알림 재처리)
    pub read_from_start: bool,
    /// 싱크 호출별 타임아웃 (밀리초)
    pub sink_timeout_ms: u64,
    /// 구독자별 전송 버퍼 크기
    pub subscriber_buffer: usize,
    /// 테일러 -> 코디네이터 라인 채널 용량
    pub line_channel_capacity: usize,
}

impl Default for EvePipelineSection {
    fn default() -> Self {
        Self {
            enabled: true,
            eve_log_path: "/var/log/suricata/eve.json".to_owned(),
            poll_interval_ms: 1000,
            read_from_start: false,
            sink_timeout_ms: 5000,
            subscriber_buffer: 256,
            line_channel_capacity: 1024,
        }
    }
}

impl EvePipelineSection {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.eve_log_path.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "pipeline.eve_log_path".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "pipeline.poll_interval_ms".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }
        if self.sink_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "pipeline.sink_timeout_ms".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }
        if self.subscriber_buffer == 0 {
            return Err(ConfigError::InvalidValue {
                field: "pipeline.subscriber_buffer".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }
        if self.line_channel_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "pipeline.line_channel_capacity".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }
        Ok(())
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, key: &str) {
    if let Ok(value) = std::env::var(key) {
        *target = value;
    }
}

fn override_bool(target: &mut bool, key: &str) {
    if let Ok(value) = std::env::var(key) {
        match value.parse() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(env = key, value, "ignoring invalid boolean override"),
        }
    }
}

fn override_u64(target: &mut u64, key: &str) {
    if let Ok(value) = std::env::var(key) {
        match value.parse() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(env = key, value, "ignoring invalid integer override"),
        }
    }
}

fn override_usize(target: &mut usize, key: &str) {
    if let Ok(value) = std::env::var(key) {
        match value.parse() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(env = key, value, "ignoring invalid integer override"),
        }
    }
}
