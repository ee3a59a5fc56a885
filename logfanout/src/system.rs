//! 팬아웃 시스템 파사드
//!
//! 인바운드 채널, 라우터 태스크, 레지스트리를 하나로 묶어 관리합니다.
//! 전역 싱글톤 대신 명시적으로 생성하여 소유하고, 종료 시 모든 어펜더를
//! 드레인합니다.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex, RwLock};
use tracing::info;

use crate::config::FanoutConfig;
use crate::error::AppenderError;
use crate::event::LogEvent;
use crate::registry::AppenderRegistry;
use crate::router::EventRouter;

/// 팬아웃 시스템 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanoutState {
    /// 실행 중
    Running,
    /// 종료됨
    Shutdown,
}

/// 팬아웃 시스템
pub struct FanoutSystem {
    registry: Arc<AppenderRegistry>,
    sender: mpsc::Sender<LogEvent>,
    close_tx: watch::Sender<bool>,
    router_handle: Mutex<Option<tokio::task::JoinHandle<()>>>,
    state: RwLock<FanoutState>,
}

impl FanoutSystem {
    /// 새 팬아웃 시스템 생성 및 라우터 시작
    ///
    /// tokio 런타임 안에서 호출해야 합니다.
    pub fn new(config: FanoutConfig) -> Result<Self> {
        config.validate().context("팬아웃 설정 유효성 검증 실패")?;

        let registry = Arc::new(AppenderRegistry::new(config.clone()));
        let (sender, receiver) = mpsc::channel(config.inbound_capacity);
        let (close_tx, close_rx) = watch::channel(false);

        let router = EventRouter::new(registry.clone());
        let router_handle = tokio::spawn(router.run(receiver, close_rx));

        info!(
            queue_capacity = config.queue_capacity,
            idle_threshold = ?config.idle_threshold,
            "로그 팬아웃 시스템 시작됨"
        );

        Ok(Self {
            registry,
            sender,
            close_tx,
            router_handle: Mutex::new(Some(router_handle)),
            state: RwLock::new(FanoutState::Running),
        })
    }

    /// 인바운드 채널 송신측 반환
    ///
    /// 로깅 파사드가 이벤트를 밀어 넣는 용도로 복제해 쓸 수 있습니다.
    pub fn sender(&self) -> mpsc::Sender<LogEvent> {
        self.sender.clone()
    }

    /// 이벤트 한 건 전달 (fire-and-forget)
    pub async fn dispatch(&self, event: LogEvent) -> Result<(), AppenderError> {
        self.sender
            .send(event)
            .await
            .map_err(|_| AppenderError::RouterClosed)
    }

    /// 레지스트리 반환 (진단 및 테스트용)
    pub fn registry(&self) -> &Arc<AppenderRegistry> {
        &self.registry
    }

    /// 시스템 상태 반환
    pub async fn get_state(&self) -> FanoutState {
        *self.state.read().await
    }

    /// 시스템 종료
    ///
    /// 라우터가 인바운드 채널을 드레인하고 종료할 때까지 기다린 뒤, 모든
    /// 어펜더를 드레인하고 파일 핸들을 닫습니다. 종료 전에 전달된 이벤트는
    /// 모두 디스크에 기록됩니다. 두 번째 호출부터는 no-op입니다.
    pub async fn shutdown(&self) -> Result<()> {
        {
            let mut state = self.state.write().await;
            if *state == FanoutState::Shutdown {
                return Ok(());
            }
            *state = FanoutState::Shutdown;
        }

        let _ = self.close_tx.send(true);

        let handle = self.router_handle.lock().await.take();
        if let Some(handle) = handle {
            handle.await.context("라우터 태스크 종료 대기 실패")?;
        }

        self.registry.shutdown().await;

        info!("로그 팬아웃 시스템 종료됨");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::LogLevel;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::time::sleep;

    fn test_event(temp_dir: &TempDir, message: &str) -> LogEvent {
        let template = temp_dir
            .path()
            .join("logs/%name.log")
            .to_string_lossy()
            .into_owned();
        LogEvent::new(template, "api", "s1", LogLevel::Info, message)
    }

    #[tokio::test]
    async fn test_system_dispatch_and_shutdown() {
        let temp_dir = TempDir::new().unwrap();
        let system = FanoutSystem::new(FanoutConfig::default()).unwrap();
        assert_eq!(system.get_state().await, FanoutState::Running);

        system.dispatch(test_event(&temp_dir, "hello")).await.unwrap();
        system.shutdown().await.unwrap();

        // 종료 전에 전달된 이벤트는 디스크에 있어야 함
        let content = tokio::fs::read_to_string(temp_dir.path().join("logs/api.log"))
            .await
            .unwrap();
        assert!(content.contains("hello"));
        assert_eq!(system.get_state().await, FanoutState::Shutdown);
    }

    #[tokio::test]
    async fn test_dispatch_after_shutdown_fails() {
        let temp_dir = TempDir::new().unwrap();
        let system = FanoutSystem::new(FanoutConfig::default()).unwrap();

        system.shutdown().await.unwrap();

        let result = system.dispatch(test_event(&temp_dir, "late")).await;
        assert!(matches!(result, Err(AppenderError::RouterClosed)));
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let system = FanoutSystem::new(FanoutConfig::default()).unwrap();
        system.shutdown().await.unwrap();
        system.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let config = FanoutConfig {
            queue_capacity: 0,
            ..Default::default()
        };
        assert!(FanoutSystem::new(config).is_err());
    }

    #[tokio::test]
    async fn test_sender_clone_delivers_events() {
        let temp_dir = TempDir::new().unwrap();
        let system = FanoutSystem::new(FanoutConfig::default()).unwrap();

        let sender = system.sender();
        sender.send(test_event(&temp_dir, "via sender")).await.unwrap();
        sleep(Duration::from_millis(100)).await;

        assert!(system.registry().len().await >= 1);
        system.shutdown().await.unwrap();

        let content = tokio::fs::read_to_string(temp_dir.path().join("logs/api.log"))
            .await
            .unwrap();
        assert!(content.contains("via sender"));
    }
}
