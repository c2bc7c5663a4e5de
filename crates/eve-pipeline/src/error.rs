//! EVE 파이프라인 에러 타입
//!
//! [`EvePipelineError`]는 파이프라인 조립과 테일러 내부에서 발생하는
//! 에러를 표현합니다. `From<EvePipelineError> for NetwardenError` 변환이
//! 구현되어 있어 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.
//!
//! 알림 단위의 실패(파서 거부, 싱크 실패)는 에러로 전파되지 않고
//! 코디네이터가 그 자리에서 소비합니다. 여기의 에러들은 파이프라인
//! 자체를 구성하거나 중단할 때만 나타납니다.

use netwarden_core::error::{NetwardenError, PipelineError};

/// EVE 파이프라인 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum EvePipelineError {
    /// 테일러 에러 (파일 I/O 등)
    #[error("tailer error: {path}: {reason}")]
    Tailer {
        /// 감시 중이던 파일 경로
        path: String,
        /// 에러 사유
        reason: String,
    },

    /// 채널 통신 에러
    #[error("channel error: {0}")]
    Channel(String),

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<EvePipelineError> for NetwardenError {
    fn from(err: EvePipelineError) -> Self {
        NetwardenError::Pipeline(PipelineError::InitFailed(err.to_string()))
    }
}
