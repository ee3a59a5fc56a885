//! 파일 어펜더 엔티티
//!
//! 하나의 목적지 파일에 대한 파일 핸들, 쓰기 큐, 쓰기 루프, 유휴 검사
//! 태스크를 소유합니다. 파일 핸들은 쓰기 루프만 접근하므로 한 목적지
//! 내의 라인 순서가 보존됩니다.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs::OpenOptions;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::{mpsc, watch, Mutex, RwLock};
use tokio::time::{interval, Instant};
use tracing::{debug, error};

use crate::config::FanoutConfig;
use crate::error::AppenderError;
use crate::event::LogEvent;
use crate::registry::AppenderRegistry;

/// 어펜더 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppenderState {
    /// 이벤트 수신 및 처리 중
    Active,
    /// 종료 신호 수신, 큐 드레인 중
    Closing,
    /// 파일 핸들 해제됨 (최종 상태)
    Closed,
}

/// 쓰기 루프 명령
#[derive(Debug)]
enum AppenderCommand {
    /// 로그 이벤트 한 건 기록
    Write(LogEvent),
    /// 큐를 드레인하고 종료
    Shutdown,
}

/// 파일 어펜더
///
/// 목적지당 정확히 하나 존재하며, 레지스트리가 생성과 제거를 관리합니다.
pub struct FileAppender {
    /// 해석된 목적지 경로 (불변 식별자)
    path: PathBuf,
    /// 쓰기 큐 송신측 (유계, 가득 차면 송신자가 블로킹됨)
    sender: mpsc::Sender<AppenderCommand>,
    /// 마지막 성공 쓰기 시각 (쓰기 루프가 갱신, 유휴 검사가 읽음)
    last_use: Arc<RwLock<Instant>>,
    /// 현재 상태
    state: Arc<RwLock<AppenderState>>,
    /// 쓰기 루프 핸들 (드레인 완료 대기용)
    writer_handle: Mutex<Option<tokio::task::JoinHandle<()>>>,
    /// 유휴 검사 태스크 중지 신호
    close_tx: watch::Sender<bool>,
}

impl FileAppender {
    /// 목적지 파일을 열고 쓰기 루프를 시작
    ///
    /// 부모 디렉토리를 생성하고 파일을 append 모드로 엽니다. 실패 시
    /// 아무 태스크도 시작되지 않으며 에러가 그대로 반환됩니다.
    pub(crate) async fn open(path: PathBuf, config: &FanoutConfig) -> Result<Self, AppenderError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppenderError::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| AppenderError::FileOpen {
                path: path.clone(),
                source: e,
            })?;

        let (sender, receiver) = mpsc::channel(config.queue_capacity);
        let last_use = Arc::new(RwLock::new(Instant::now()));
        let state = Arc::new(RwLock::new(AppenderState::Active));
        let (close_tx, _) = watch::channel(false);

        let writer_handle = tokio::spawn(Self::write_loop(
            path.clone(),
            BufWriter::new(file),
            receiver,
            last_use.clone(),
            state.clone(),
        ));

        debug!(path = %path.display(), "파일 어펜더 열림");

        Ok(Self {
            path,
            sender,
            last_use,
            state,
            writer_handle: Mutex::new(Some(writer_handle)),
            close_tx,
        })
    }

    /// 목적지 경로 반환
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 현재 상태 반환
    pub async fn state(&self) -> AppenderState {
        *self.state.read().await
    }

    /// 마지막 성공 쓰기 이후 경과 시간
    pub async fn idle_for(&self) -> Duration {
        self.last_use.read().await.elapsed()
    }

    /// 이벤트를 쓰기 큐에 넣음
    ///
    /// 큐가 가득 차면 공간이 생길 때까지 블로킹됩니다 (백프레셔).
    /// 큐가 이미 닫혔으면 이벤트를 돌려주어 호출자가 새 어펜더로
    /// 재시도할 수 있게 합니다.
    pub async fn enqueue(&self, event: LogEvent) -> Result<(), LogEvent> {
        match self.sender.send(AppenderCommand::Write(event)).await {
            Ok(()) => Ok(()),
            Err(mpsc::error::SendError(cmd)) => match cmd {
                AppenderCommand::Write(event) => Err(event),
                // enqueue는 Write만 전송함
                AppenderCommand::Shutdown => Ok(()),
            },
        }
    }

    /// 어펜더 종료: 큐 드레인 후 파일 핸들 해제
    ///
    /// 쓰기 루프가 남은 이벤트를 모두 기록하고 종료할 때까지 대기합니다.
    /// 두 번째 호출부터는 no-op입니다.
    pub(crate) async fn close(&self) {
        {
            let mut state = self.state.write().await;
            if *state != AppenderState::Active {
                return;
            }
            *state = AppenderState::Closing;
        }

        // 유휴 검사 태스크 중지
        let _ = self.close_tx.send(true);

        // 쓰기 루프가 이미 끝났으면 송신은 실패하며, 그대로 진행
        let _ = self.sender.send(AppenderCommand::Shutdown).await;

        let handle = self.writer_handle.lock().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!(path = %self.path.display(), error = %e, "쓰기 루프 종료 대기 실패");
            }
        }
    }

    /// 유휴 검사 태스크 시작
    ///
    /// 주기마다 마지막 쓰기 이후 경과 시간을 확인하고, 임계값을 넘으면
    /// 레지스트리를 통해 스스로를 제거합니다. 제거 판정은 레지스트리
    /// 잠금 아래에서 다시 수행되므로 신규 조회와 경합하지 않습니다.
    pub(crate) fn spawn_idle_task(self: &Arc<Self>, registry: Arc<AppenderRegistry>) {
        let appender = Arc::clone(self);
        let mut close_rx = self.close_tx.subscribe();
        let check_interval = registry.config().idle_check_interval;

        tokio::spawn(async move {
            let mut ticker = interval(check_interval);
            // interval의 첫 틱은 즉시 반환되므로 소비
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if registry.evict_if_idle(&appender).await {
                            break;
                        }
                    }
                    _ = close_rx.changed() => break,
                }
            }
        });
    }

    /// 백그라운드 쓰기 루프
    ///
    /// 이 루프만 파일 핸들을 소유합니다. 종료 명령을 받으면 큐에 남은
    /// 이벤트를 모두 기록한 뒤 플러시하고 핸들을 해제합니다.
    async fn write_loop(
        path: PathBuf,
        mut writer: BufWriter<tokio::fs::File>,
        mut receiver: mpsc::Receiver<AppenderCommand>,
        last_use: Arc<RwLock<Instant>>,
        state: Arc<RwLock<AppenderState>>,
    ) {
        while let Some(cmd) = receiver.recv().await {
            match cmd {
                AppenderCommand::Write(event) => {
                    Self::append_line(&path, &mut writer, &event, &last_use).await;
                }
                AppenderCommand::Shutdown => {
                    // 신규 송신을 차단하고 큐에 남은 이벤트를 드레인
                    receiver.close();
                    while let Ok(cmd) = receiver.try_recv() {
                        if let AppenderCommand::Write(event) = cmd {
                            Self::append_line(&path, &mut writer, &event, &last_use).await;
                        }
                    }
                    break;
                }
            }
        }

        if let Err(e) = writer.flush().await {
            AppenderError::Write {
                path: path.clone(),
                source: e,
            }
            .log("write_loop_flush");
        }

        *state.write().await = AppenderState::Closed;
        debug!(path = %path.display(), "쓰기 루프 종료, 파일 핸들 해제됨");
    }

    /// 한 줄을 기록하고 성공 시에만 마지막 쓰기 시각을 갱신
    ///
    /// 쓰기 실패는 진단 싱크로 보고되고 해당 이벤트는 유실됩니다.
    /// 루프는 계속 실행됩니다.
    async fn append_line(
        path: &Path,
        writer: &mut BufWriter<tokio::fs::File>,
        event: &LogEvent,
        last_use: &RwLock<Instant>,
    ) {
        let line = event.format_line();

        let result = async {
            writer.write_all(line.as_bytes()).await?;
            writer.flush().await
        }
        .await;

        match result {
            Ok(()) => {
                *last_use.write().await = Instant::now();
            }
            Err(e) => {
                AppenderError::Write {
                    path: path.to_path_buf(),
                    source: e,
                }
                .log("write_loop");
            }
        }
    }
}
