//! 이벤트 라우터
//!
//! 인바운드 이벤트 채널의 단일 소비자입니다. 이벤트마다 목적지 경로를
//! 해석하고 해당 어펜더의 큐로 전달합니다. 개별 이벤트의 실패가 루프를
//! 끝내지 않습니다.

use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use crate::error::AppenderError;
use crate::event::LogEvent;
use crate::path;
use crate::registry::AppenderRegistry;

/// 이벤트 라우터
pub struct EventRouter {
    registry: Arc<AppenderRegistry>,
}

impl EventRouter {
    /// 주입된 레지스트리로 라우터 생성
    pub fn new(registry: Arc<AppenderRegistry>) -> Self {
        Self { registry }
    }

    /// 라우터 루프 실행
    ///
    /// 인바운드 채널이 닫히거나 종료 신호가 올 때까지 실행됩니다. 종료
    /// 신호를 받으면 채널에 남은 이벤트를 드레인한 뒤 반환합니다.
    pub async fn run(self, mut receiver: mpsc::Receiver<LogEvent>, mut close_rx: watch::Receiver<bool>) {
        info!("이벤트 라우터 시작됨");

        loop {
            tokio::select! {
                maybe = receiver.recv() => {
                    match maybe {
                        Some(event) => self.route(event).await,
                        None => break,
                    }
                }
                _ = close_rx.changed() => {
                    // 신규 송신을 차단하고 남은 이벤트를 드레인
                    receiver.close();
                    while let Ok(event) = receiver.try_recv() {
                        self.route(event).await;
                    }
                    break;
                }
            }
        }

        info!("이벤트 라우터 종료됨");
    }

    /// 이벤트 한 건 처리 (감독 경계)
    ///
    /// 실패는 진단 싱크에 기록되고 해당 이벤트만 유실됩니다.
    async fn route(&self, event: LogEvent) {
        if let Err(e) = self.dispatch(event).await {
            e.log("event_router");
        }
    }

    async fn dispatch(&self, event: LogEvent) -> Result<(), AppenderError> {
        let path = path::resolve(&event);
        let appender = self.registry.get_or_create(&path).await?;

        match appender.enqueue(event).await {
            Ok(()) => Ok(()),
            // 유휴 제거와 경합하여 큐가 닫힌 경우, 새 어펜더로 한 번 재시도
            Err(event) => {
                debug!(path = %path.display(), "닫힌 어펜더와 경합, 재생성 후 재시도");
                let appender = self.registry.get_or_create(&path).await?;
                appender
                    .enqueue(event)
                    .await
                    .map_err(|_| AppenderError::QueueClosed { path })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FanoutConfig;
    use crate::event::LogLevel;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::time::sleep;

    fn test_router() -> (EventRouter, Arc<AppenderRegistry>) {
        let registry = Arc::new(AppenderRegistry::new(FanoutConfig::default()));
        (EventRouter::new(registry.clone()), registry)
    }

    fn event_for(temp_dir: &TempDir, name: &str, message: &str) -> LogEvent {
        let template = temp_dir
            .path()
            .join("logs/%name/%date.log")
            .to_string_lossy()
            .into_owned();
        LogEvent::new(template, name, "s1", LogLevel::Info, message)
    }

    #[tokio::test]
    async fn test_dispatch_routes_to_separate_files() {
        let temp_dir = TempDir::new().unwrap();
        let (router, registry) = test_router();

        router
            .dispatch(event_for(&temp_dir, "api", "from api"))
            .await
            .unwrap();
        router
            .dispatch(event_for(&temp_dir, "worker", "from worker"))
            .await
            .unwrap();

        sleep(Duration::from_millis(100)).await;
        assert_eq!(registry.len().await, 2);

        let date = chrono::Utc::now().format("%Y%m%d").to_string();
        let api_log = temp_dir.path().join(format!("logs/api/{}.log", date));
        let worker_log = temp_dir.path().join(format!("logs/worker/{}.log", date));

        let api_content = tokio::fs::read_to_string(&api_log).await.unwrap();
        assert!(api_content.contains("from api"));
        let worker_content = tokio::fs::read_to_string(&worker_log).await.unwrap();
        assert!(worker_content.contains("from worker"));

        registry.shutdown().await;
    }

    #[tokio::test]
    async fn test_router_survives_bad_destination() {
        let temp_dir = TempDir::new().unwrap();
        let (router, registry) = test_router();

        // 디렉토리 자리를 일반 파일로 막아 생성 실패 유도
        let blocker = temp_dir.path().join("blocked");
        tokio::fs::write(&blocker, b"file").await.unwrap();

        let (sender, receiver) = mpsc::channel(16);
        let (_close_tx, close_rx) = watch::channel(false);
        let handle = tokio::spawn(router.run(receiver, close_rx));

        let bad_template = blocker.join("%name.log").to_string_lossy().into_owned();
        let bad = LogEvent::new(bad_template, "api", "s1", LogLevel::Info, "lost");
        sender.send(bad).await.unwrap();

        // 실패한 이벤트 이후에도 라우터는 계속 동작함
        let good = event_for(&temp_dir, "api", "still alive");
        sender.send(good).await.unwrap();
        sleep(Duration::from_millis(200)).await;

        assert_eq!(registry.len().await, 1);
        let date = chrono::Utc::now().format("%Y%m%d").to_string();
        let content = tokio::fs::read_to_string(temp_dir.path().join(format!("logs/api/{}.log", date)))
            .await
            .unwrap();
        assert!(content.contains("still alive"));

        drop(sender);
        handle.await.unwrap();
        registry.shutdown().await;
    }

    #[tokio::test]
    async fn test_dispatch_reopens_after_eviction() {
        let temp_dir = TempDir::new().unwrap();
        let (router, registry) = test_router();
        let event = event_for(&temp_dir, "api", "reopened");
        let path = crate::path::resolve(&event);

        // 어펜더가 제거된 뒤에는 이전 핸들로 쓸 수 없음
        let appender = registry.get_or_create(&path).await.unwrap();
        registry.shutdown().await;
        assert!(appender.enqueue(event.clone()).await.is_err());

        // dispatch는 새 어펜더를 만들어 기록에 성공해야 함
        router.dispatch(event).await.unwrap();
        sleep(Duration::from_millis(100)).await;

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(content.contains("reopened"));

        registry.shutdown().await;
    }
}
