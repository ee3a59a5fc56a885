//! 팬아웃 설정 관리
//!
//! 큐 크기와 유휴 제거 정책 등 팬아웃 시스템의 설정 파라미터를 담당합니다.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 팬아웃 시스템 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FanoutConfig {
    /// 목적지별 쓰기 큐 크기 (기본값: 1000)
    ///
    /// 큐가 가득 차면 라우터는 해당 목적지에 대해 블로킹됩니다 (백프레셔).
    pub queue_capacity: usize,

    /// 인바운드 이벤트 채널 크기 (기본값: 10000)
    pub inbound_capacity: usize,

    /// 유휴 제거 임계값 (기본값: 10분)
    ///
    /// 마지막 쓰기 이후 이 시간이 지난 어펜더는 레지스트리에서 제거되고
    /// 파일 핸들이 닫힙니다.
    pub idle_threshold: Duration,

    /// 유휴 검사 주기 (기본값: 1분)
    pub idle_check_interval: Duration,
}

impl Default for FanoutConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1000,
            inbound_capacity: 10_000,
            idle_threshold: Duration::from_secs(600),
            idle_check_interval: Duration::from_secs(60),
        }
    }
}

impl FanoutConfig {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("FANOUT_QUEUE_CAPACITY") {
            if let Ok(size) = val.parse() {
                config.queue_capacity = size;
            }
        }

        if let Ok(val) = std::env::var("FANOUT_INBOUND_CAPACITY") {
            if let Ok(size) = val.parse() {
                config.inbound_capacity = size;
            }
        }

        if let Ok(val) = std::env::var("FANOUT_IDLE_THRESHOLD_SECS") {
            if let Ok(secs) = val.parse::<u64>() {
                config.idle_threshold = Duration::from_secs(secs);
            }
        }

        if let Ok(val) = std::env::var("FANOUT_IDLE_CHECK_SECS") {
            if let Ok(secs) = val.parse::<u64>() {
                config.idle_check_interval = Duration::from_secs(secs);
            }
        }

        config
    }

    /// 설정 유효성 검증
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.queue_capacity == 0 {
            return Err(anyhow::anyhow!("queue_capacity must be greater than 0"));
        }

        if self.inbound_capacity == 0 {
            return Err(anyhow::anyhow!("inbound_capacity must be greater than 0"));
        }

        if self.idle_threshold.is_zero() {
            return Err(anyhow::anyhow!("idle_threshold must be greater than 0"));
        }

        if self.idle_check_interval.is_zero() {
            return Err(anyhow::anyhow!(
                "idle_check_interval must be greater than 0"
            ));
        }

        Ok(())
    }
}
