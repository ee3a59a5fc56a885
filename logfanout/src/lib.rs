//! 비동기 로그 이벤트 팬아웃 시스템
//!
//! 하나의 인바운드 이벤트 스트림을 받아 이벤트 메타데이터로 계산된
//! 목적지 파일들에 나누어 기록합니다.
//!
//! # 주요 기능
//! - **동적 목적지 해석**: 세션/날짜/레벨/이름/PID 자리표시자 치환
//! - **목적지별 단일 어펜더**: 경합 없는 지연 생성, 파일당 하나의 핸들
//! - **순서 보존**: 한 목적지 안에서 큐 순서 그대로 기록
//! - **유휴 제거**: 일정 시간 쓰기가 없는 어펜더는 자동으로 닫힘
//! - **장애 격리**: 잘못된 이벤트나 목적지가 파이프라인을 멈추지 않음
//!
//! # 사용 예시
//! ```rust,no_run
//! use logfanout::{init_fanout, LogEvent, LogLevel};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let system = init_fanout(None)?;
//!
//!     let event = LogEvent::new(
//!         "./logs/%name/%date.log",
//!         "api",
//!         "sess-1",
//!         LogLevel::Info,
//!         "서버 시작",
//!     );
//!     system.dispatch(event).await?;
//!
//!     system.shutdown().await?;
//!     Ok(())
//! }
//! ```

pub mod appender;
pub mod config;
pub mod error;
pub mod event;
pub mod path;
pub mod registry;
pub mod router;
pub mod system;

pub use appender::{AppenderState, FileAppender};
pub use config::FanoutConfig;
pub use error::{AppenderError, ErrorSeverity};
pub use event::{LogEvent, LogLevel};
pub use registry::AppenderRegistry;
pub use router::EventRouter;
pub use system::{FanoutState, FanoutSystem};

use anyhow::Result;

/// 팬아웃 시스템 초기화 헬퍼
///
/// 설정을 지정하지 않으면 환경변수(`FANOUT_*`)와 기본값을 사용합니다.
/// tokio 런타임 안에서 호출해야 합니다.
pub fn init_fanout(config: Option<FanoutConfig>) -> Result<FanoutSystem> {
    let config = config.unwrap_or_else(FanoutConfig::from_env);
    FanoutSystem::new(config)
}
