//! 로그 팬아웃 시스템 사용 예제
//!
//! 이 예제는 하나의 이벤트 스트림이 이름/날짜/레벨별 파일로 나뉘어
//! 기록되는 과정을 보여줍니다.

use anyhow::Result;
use logfanout::{init_fanout, FanoutConfig, LogEvent, LogLevel};
use std::time::Duration;
use tokio::time::sleep;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .init();

    println!("📁 로그 팬아웃 시스템 예제 시작");

    // === 예제 1: 기본 사용법 ===
    println!("\n📝 예제 1: 이름/날짜별 파일 분리");
    basic_fanout_example().await?;

    // === 예제 2: 레벨별 분리와 호출자 태그 ===
    println!("\n🔍 예제 2: 레벨별 분리와 호출자 태그");
    level_split_example().await?;

    // === 예제 3: 유휴 제거 ===
    println!("\n⏲️ 예제 3: 유휴 어펜더 자동 제거");
    idle_eviction_example().await?;

    println!("\n✅ 모든 예제 완료! ./logs 디렉토리에서 생성된 파일을 확인하세요.");
    Ok(())
}

/// 예제 1: 여러 컴포넌트의 이벤트가 각자의 파일로 기록됨
async fn basic_fanout_example() -> Result<()> {
    let system = init_fanout(None)?;

    for name in ["api", "worker", "scheduler"] {
        for i in 0..3 {
            let event = LogEvent::new(
                "./logs/%name/%date.log",
                name,
                "sess-1",
                LogLevel::Info,
                format!("{} 이벤트 {}", name, i),
            );
            system.dispatch(event).await?;
        }
    }

    system.shutdown().await?;
    println!("   ✓ logs/api, logs/worker, logs/scheduler 아래에 날짜별 파일 생성됨");
    Ok(())
}

/// 예제 2: 레벨 자리표시자와 호출자 태그
async fn level_split_example() -> Result<()> {
    let system = init_fanout(None)?;

    let event = LogEvent::new(
        "./logs/bylevel/%level.log",
        "api",
        "sess-2",
        LogLevel::Info,
        "요청 처리 완료",
    );
    system.dispatch(event).await?;

    // Info가 아닌 레벨에서는 호출자 태그가 라인에 포함됨
    let event = LogEvent::new(
        "./logs/bylevel/%level.log",
        "api",
        "sess-2",
        LogLevel::Error,
        "요청 처리 실패",
    )
    .with_caller("handler.rs:87");
    system.dispatch(event).await?;

    system.shutdown().await?;
    println!("   ✓ logs/bylevel/info.log, logs/bylevel/error.log 생성됨");
    Ok(())
}

/// 예제 3: 짧은 유휴 임계값으로 자동 제거 관찰
async fn idle_eviction_example() -> Result<()> {
    let config = FanoutConfig {
        idle_threshold: Duration::from_millis(300),
        idle_check_interval: Duration::from_millis(100),
        ..Default::default()
    };
    let system = init_fanout(Some(config))?;

    let event = LogEvent::new(
        "./logs/idle/%name.log",
        "shortlived",
        "sess-3",
        LogLevel::Info,
        "마지막 이벤트",
    );
    system.dispatch(event).await?;

    sleep(Duration::from_millis(150)).await;
    println!("   어펜더 수 (쓰기 직후): {}", system.registry().len().await);

    sleep(Duration::from_millis(600)).await;
    println!("   어펜더 수 (유휴 제거 후): {}", system.registry().len().await);

    system.shutdown().await?;
    Ok(())
}
