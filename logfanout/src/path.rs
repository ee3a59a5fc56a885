//! 목적지 경로 해석
//!
//! 이벤트 메타데이터로 경로 템플릿의 자리표시자를 치환하여 절대 경로를
//! 계산합니다. 해석은 최선 노력 방식으로, 실패하지 않습니다.

use std::path::PathBuf;

use crate::event::LogEvent;

/// 이벤트의 템플릿으로 목적지 경로를 해석
pub fn resolve(event: &LogEvent) -> PathBuf {
    resolve_template(&event.template, event)
}

/// 지정된 템플릿으로 목적지 경로를 해석
///
/// 인식되는 자리표시자: `%session`, `%date`(YYYYMMDD), `%year`, `%mm`,
/// `%dd`, `%hh`, `%mi`, `%ss`, `%level`(소문자), `%name`, `%pid`.
/// 인식되지 않는 자리표시자는 그대로 통과합니다.
pub fn resolve_template(template: &str, event: &LogEvent) -> PathBuf {
    let ts = event.timestamp;

    // 긴 이름 우선으로 치환 (%session이 %ss보다 먼저)
    let pairs = [
        ("%session", sanitize_component(&event.session)),
        ("%level", event.level.as_lower().to_string()),
        ("%date", ts.format("%Y%m%d").to_string()),
        ("%year", ts.format("%Y").to_string()),
        ("%name", sanitize_component(&event.name)),
        ("%pid", std::process::id().to_string()),
        ("%mm", ts.format("%m").to_string()),
        ("%dd", ts.format("%d").to_string()),
        ("%hh", ts.format("%H").to_string()),
        ("%mi", ts.format("%M").to_string()),
        ("%ss", ts.format("%S").to_string()),
    ];

    let mut resolved = template.to_string();
    for (placeholder, value) in &pairs {
        resolved = resolved.replace(placeholder, value);
    }

    to_absolute(PathBuf::from(resolved))
}

/// 호출자 제어 값의 경로 제어 문자 제거
///
/// 세션 ID와 소스 이름은 파일 경로에 직접 삽입되므로, 디렉토리 탈출에
/// 쓰일 수 있는 문자를 `_`로 치환합니다.
fn sanitize_component(value: &str) -> String {
    let mut cleaned: String = value
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    while cleaned.contains("..") {
        cleaned = cleaned.replace("..", "_");
    }

    cleaned
}

/// 상대 경로를 현재 작업 디렉토리 기준 절대 경로로 변환
fn to_absolute(path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        std::env::current_dir()
            .map(|dir| dir.join(&path))
            .unwrap_or(path)
    }
}
