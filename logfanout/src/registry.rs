//! 어펜더 레지스트리
//!
//! 해석된 경로 → 어펜더 매핑을 관리합니다. 생성과 제거는 하나의 잠금을
//! 공유하므로, 조회가 철거 중인 어펜더를 돌려받는 일이 없습니다.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::appender::FileAppender;
use crate::config::FanoutConfig;
use crate::error::AppenderError;

/// 어펜더 레지스트리
///
/// 경로당 어펜더는 항상 최대 하나입니다. 명시적으로 생성하여 라우터와
/// 어펜더에 주입되며, 전역 상태를 사용하지 않습니다.
pub struct AppenderRegistry {
    config: FanoutConfig,
    appenders: Mutex<HashMap<PathBuf, Arc<FileAppender>>>,
}

impl AppenderRegistry {
    /// 새 레지스트리 생성
    pub fn new(config: FanoutConfig) -> Self {
        Self {
            config,
            appenders: Mutex::new(HashMap::new()),
        }
    }

    /// 레지스트리 설정 반환
    pub fn config(&self) -> &FanoutConfig {
        &self.config
    }

    /// 경로에 대한 어펜더를 반환하고, 없으면 생성
    ///
    /// 잠금을 쥔 호출자 하나만 생성을 수행하므로, 같은 경로에 대한 동시
    /// 첫 조회들은 승자가 끝날 때까지 대기한 뒤 같은 어펜더를 받습니다.
    /// 생성 실패 시 레지스트리에는 아무것도 등록되지 않으며, 이후 호출이
    /// 재시도할 수 있습니다.
    pub async fn get_or_create(
        self: &Arc<Self>,
        path: &Path,
    ) -> Result<Arc<FileAppender>, AppenderError> {
        let mut appenders = self.appenders.lock().await;

        if let Some(existing) = appenders.get(path) {
            return Ok(existing.clone());
        }

        let appender = Arc::new(FileAppender::open(path.to_path_buf(), &self.config).await?);
        appender.spawn_idle_task(Arc::clone(self));
        appenders.insert(path.to_path_buf(), appender.clone());

        debug!(path = %path.display(), total = appenders.len(), "어펜더 등록됨");
        Ok(appender)
    }

    /// 유휴 어펜더 제거 (유휴 검사 태스크의 진입점)
    ///
    /// 잠금 아래에서 유휴 시간을 다시 판정합니다. 그 사이 쓰기가 있었으면
    /// 제거를 중단합니다. 반환값이 `true`이면 이 어펜더의 생애가 끝난
    /// 것이므로 유휴 검사 태스크는 종료해야 합니다.
    pub async fn evict_if_idle(&self, appender: &Arc<FileAppender>) -> bool {
        let path = appender.path().to_path_buf();

        {
            let mut appenders = self.appenders.lock().await;

            match appenders.get(&path) {
                // 이미 제거되었거나 다른 어펜더로 교체됨
                Some(current) if !Arc::ptr_eq(current, appender) => return true,
                None => return true,
                Some(_) => {}
            }

            if appender.idle_for().await < self.config.idle_threshold {
                return false;
            }

            appenders.remove(&path);
        }

        // 잠금 해제 후 드레인. 같은 경로의 신규 이벤트는 즉시 새 어펜더를
        // 생성할 수 있고, 이쪽은 남은 큐를 기록하고 핸들을 닫는다.
        appender.close().await;
        debug!(path = %path.display(), "유휴 어펜더 제거됨");
        true
    }

    /// 등록된 어펜더 수
    pub async fn len(&self) -> usize {
        self.appenders.lock().await.len()
    }

    /// 레지스트리가 비어 있는지 확인
    pub async fn is_empty(&self) -> bool {
        self.appenders.lock().await.is_empty()
    }

    /// 경로가 등록되어 있는지 확인
    pub async fn contains(&self, path: &Path) -> bool {
        self.appenders.lock().await.contains_key(path)
    }

    /// 모든 어펜더를 제거하고 드레인 (시스템 종료 경로)
    pub async fn shutdown(&self) {
        let drained: Vec<(PathBuf, Arc<FileAppender>)> = {
            let mut appenders = self.appenders.lock().await;
            appenders.drain().collect()
        };

        for (path, appender) in drained {
            debug!(path = %path.display(), "어펜더 종료 중");
            appender.close().await;
        }
    }
}
