//! 에러 타입 — 도메인별 에러 정의
//!
//! 실패 정책 요약:
//! - [`StorageError`]: 해당 알림 하나만 중단 (권위 있는 쓰기 실패)
//! - [`IndexError`], [`CacheError`]: 로그만 남기고 계속 (싱크별 격리)
//! - [`DirectoryError`]: 상관 관계만 포기하고 계속 (best-effort)
//!
//! 어떤 에러도 수집 스트림 자체를 종료시키지 않습니다.

/// Netwarden 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum NetwardenError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 파이프라인 생명주기 에러
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// 저장소 에러
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// 검색 인덱스 에러
    #[error("index error: {0}")]
    Index(#[from] IndexError),

    /// 일별 캐시 에러
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 파이프라인 생명주기 에러
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// 이미 실행 중
    #[error("pipeline already running")]
    AlreadyRunning,

    /// 실행 중이 아님
    #[error("pipeline not running")]
    NotRunning,

    /// 채널 전송 실패
    #[error("channel send failed: {0}")]
    ChannelSend(String),

    /// 파이프라인 태스크 비정상 종료 (패닉 또는 강제 중단)
    #[error("pipeline task failed: {0}")]
    TaskFailed(String),

    /// 파이프라인 초기화 실패
    #[error("pipeline init failed: {0}")]
    InitFailed(String),
}

/// 저장소 에러
///
/// 저장소 쓰기는 권위 있는 동기 단계이므로, 이 에러는
/// 해당 알림의 처리를 그 자리에서 중단시킵니다 (스트림은 계속).
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// 연결 실패
    #[error("storage connection failed: {0}")]
    Connection(String),

    /// 쓰기 실패
    #[error("storage write failed: {0}")]
    Write(String),

    /// 존재하지 않는 알림 참조
    #[error("alert not found: id {0}")]
    NotFound(i64),
}

/// 검색 인덱스 에러
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// 인덱스 사용 불가 (연결 실패, 타임아웃 등)
    #[error("search index unavailable: {0}")]
    Unavailable(String),
}

/// 일별 캐시 에러
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// 캐시 사용 불가 (연결 실패, 타임아웃 등)
    #[error("daily cache unavailable: {0}")]
    Unavailable(String),
}

/// 디바이스 디렉토리 에러
///
/// 디렉토리 조회는 엄격하게 best-effort입니다. 이 에러는 항상
/// 삼켜지고 알림은 디바이스 참조 없이 진행됩니다.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    /// 조회 실패
    #[error("device lookup failed: {0}")]
    Lookup(String),
}
