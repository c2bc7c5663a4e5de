//! 파일 테일러 — EVE 로그 파일을 `tail -f` 방식으로 추적합니다.
//!
//! 지정된 파일을 주기적으로 폴링하여 새로 추가된 라인을 수집합니다.
//! 결과는 취소 가능하고 재시작 불가능한 무한 라인 시퀀스
//! (`mpsc::Receiver<RawLine>`)로 노출됩니다.
//!
//! # 복구 경로
//! - 파일 없음: 경고 후 폴링 유지, 파일이 생기면 그 시점부터 수집
//! - 로테이션: inode 변경 감지 (Unix), 새 파일을 처음부터 읽음
//! - 축소(truncation): 길이가 오프셋보다 작아지면 처음부터 다시 읽음
//!
//! 복구 경로는 모두 스트림 내부에서 처리되며 소비자에게 노출되지 않습니다.
//!
//! # 전달 보장
//! 관측 시점 기준 at-least-once입니다. 테일러가 읽기 전에 로테이션으로
//! 사라진 라인은 유실될 수 있으며, 이는 문서화된 한계이지 버그가 아닙니다.

use std::path::PathBuf;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, SeekFrom};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use netwarden_core::metrics::EVE_LINES_TOTAL;

/// 테일러 설정
#[derive(Debug, Clone)]
pub struct TailerConfig {
    /// 감시할 파일 경로
    pub path: PathBuf,
    /// 파일 상태 체크 주기
    pub poll_interval: Duration,
    /// true이면 첫 관측 시 파일의 현재 시작점부터 읽음
    pub read_from_start: bool,
    /// 라인 채널 용량
    pub channel_capacity: usize,
}

impl Default for TailerConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/var/log/suricata/eve.json"),
            poll_interval: Duration::from_millis(1000),
            read_from_start: false,
            channel_capacity: 1024,
        }
    }
}

/// 테일러가 전달하는 원시 라인
///
/// 파서가 소비하는 중간 데이터 형식입니다. `received_at`은 파싱 불가능한
/// 타임스탬프의 대체값으로 사용됩니다.
#[derive(Debug, Clone)]
pub struct RawLine {
    /// 라인 바이트 (개행 문자 제외)
    pub data: Bytes,
    /// 수집 시각
    pub received_at: DateTime<Utc>,
}

impl RawLine {
    /// 새 RawLine을 생성합니다.
    pub fn new(data: Bytes) -> Self {
        Self {
            data,
            received_at: Utc::now(),
        }
    }

    /// 공백으로만 이루어진 라인인지 확인합니다.
    pub fn is_blank(&self) -> bool {
        self.data.iter().all(u8::is_ascii_whitespace)
    }
}

impl From<&str> for RawLine {
    fn from(text: &str) -> Self {
        Self::new(Bytes::copy_from_slice(text.as_bytes()))
    }
}

/// 실행 중인 테일러의 제어 핸들
///
/// 핸들을 통해서만 테일러를 정지할 수 있습니다. [`TailerHandle::stop`]이
/// 반환되면 이후 어떤 라인도 전달되지 않음이 보장됩니다.
pub struct TailerHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl TailerHandle {
    /// 테일러를 정지하고 폴링 태스크가 종료될 때까지 기다립니다.
    ///
    /// 파일 핸들이 해제되고 채널 송신측이 닫힙니다.
    pub async fn stop(self) {
        self.cancel.cancel();
        let _ = self.task.await;
    }
}

/// 파일 테일러
pub struct LogTailer;

impl LogTailer {
    /// 테일러 태스크를 스폰하고 라인 수신 채널과 제어 핸들을 반환합니다.
    ///
    /// 수신측이 드롭되면 테일러는 다음 전달 시도에서 스스로 종료합니다.
    pub fn spawn(config: TailerConfig) -> (mpsc::Receiver<RawLine>, TailerHandle) {
        let (tx, rx) = mpsc::channel(config.channel_capacity);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run(config, tx, cancel.clone()));
        (rx, TailerHandle { cancel, task })
    }
}

/// 현재 추적 중인 파일의 상태
struct FileState {
    /// 소비한 바이트 오프셋 (pending에 보관 중인 부분 라인 포함)
    offset: u64,
    /// 파일 inode (Unix 전용 로테이션 감지)
    #[cfg(unix)]
    inode: u64,
}

/// 폴링 루프 본체
async fn run(config: TailerConfig, tx: mpsc::Sender<RawLine>, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(config.poll_interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let mut state: Option<FileState> = None;
    // 개행으로 끝나지 않은 꼬리 바이트 (다음 폴에서 이어 붙임)
    let mut pending: Vec<u8> = Vec::new();
    let mut missing_logged = false;

    info!(path = %config.path.display(), "tailer started");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!(path = %config.path.display(), "tailer cancelled");
                break;
            }
            _ = interval.tick() => {
                if poll_once(&config, &mut state, &mut pending, &tx, &mut missing_logged)
                    .await
                    .is_err()
                {
                    // 수신측 드롭 — 더 이상 전달할 곳이 없음
                    debug!(path = %config.path.display(), "line receiver dropped, tailer exiting");
                    break;
                }
            }
        }
    }

    info!(path = %config.path.display(), "tailer stopped");
}

/// 수신측이 닫혔음을 알리는 내부 표지
struct ReceiverClosed;

/// 한 번의 폴: 파일 상태를 확인하고 새 라인을 전달합니다.
async fn poll_once(
    config: &TailerConfig,
    state: &mut Option<FileState>,
    pending: &mut Vec<u8>,
    tx: &mpsc::Sender<RawLine>,
    missing_logged: &mut bool,
) -> Result<(), ReceiverClosed> {
    let meta = match tokio::fs::metadata(&config.path).await {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            // 복구 가능한 상태: 파일이 생길 때까지 폴링 유지
            if !*missing_logged {
                warn!(
                    path = %config.path.display(),
                    "eve log file not found, will keep polling"
                );
                *missing_logged = true;
            }
            if state.take().is_some() {
                info!(path = %config.path.display(), "eve log file disappeared");
                pending.clear();
            }
            return Ok(());
        }
        Err(e) => {
            warn!(path = %config.path.display(), error = %e, "failed to stat eve log file");
            return Ok(());
        }
    };

    // 부재 중 생성된 파일의 내용은 전부 테일러 시작 이후의 것이므로
    // 처음부터 읽는다
    let was_missing = *missing_logged;
    if was_missing {
        info!(path = %config.path.display(), "eve log file appeared");
        *missing_logged = false;
    }

    let len = meta.len();
    #[cfg(unix)]
    let inode = {
        use std::os::unix::fs::MetadataExt;
        meta.ino()
    };

    let offset = match state.as_ref() {
        Some(prev) => {
            #[cfg(unix)]
            let rotated = prev.inode != inode;
            #[cfg(not(unix))]
            let rotated = false;

            if rotated {
                info!(path = %config.path.display(), "eve log file rotated, reading new file from start");
                pending.clear();
                0
            } else if len < prev.offset {
                info!(path = %config.path.display(), "eve log file truncated, resuming from start");
                pending.clear();
                0
            } else {
                prev.offset
            }
        }
        // 첫 관측: 기본은 현재 끝부터 (read_from_start이거나
        // 테일러 시작 후 생성된 파일이면 처음부터)
        None => {
            if config.read_from_start || was_missing {
                0
            } else {
                len
            }
        }
    };

    let mut offset = offset;
    if len > offset {
        match read_range(&config.path, offset, len).await {
            Ok(chunk) => {
                offset += chunk.len() as u64;
                pending.extend_from_slice(&chunk);
                deliver_complete_lines(pending, tx).await?;
            }
            Err(e) => {
                warn!(path = %config.path.display(), error = %e, "failed to read eve log file");
                // 다음 폴에서 같은 오프셋부터 재시도
            }
        }
    }

    *state = Some(FileState {
        offset,
        #[cfg(unix)]
        inode,
    });
    Ok(())
}

/// 파일의 `[offset, end)` 구간을 읽습니다.
async fn read_range(path: &PathBuf, offset: u64, end: u64) -> std::io::Result<Vec<u8>> {
    let mut file = File::open(path).await?;
    file.seek(SeekFrom::Start(offset)).await?;
    let mut buf = Vec::with_capacity((end - offset) as usize);
    file.take(end - offset).read_to_end(&mut buf).await?;
    Ok(buf)
}

/// pending 버퍼에서 완성된 라인들을 잘라 전달합니다.
///
/// 개행으로 끝나지 않은 꼬리는 버퍼에 남겨 다음 폴에서 이어 붙입니다.
/// 공백뿐인 라인은 여기서 걸러져 파서에 도달하지 않습니다.
async fn deliver_complete_lines(
    pending: &mut Vec<u8>,
    tx: &mpsc::Sender<RawLine>,
) -> Result<(), ReceiverClosed> {
    while let Some(pos) = pending.iter().position(|&b| b == b'\n') {
        let mut line: Vec<u8> = pending.drain(..=pos).collect();
        line.pop(); // '\n'
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        if line.iter().all(|b| b.is_ascii_whitespace()) {
            continue;
        }
        let raw = RawLine::new(Bytes::from(line));
        if tx.send(raw).await.is_err() {
            return Err(ReceiverClosed);
        }
        metrics::counter!(EVE_LINES_TOTAL).increment(1);
    }
    Ok(())
}
