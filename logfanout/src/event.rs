//! 로그 이벤트와 출력 라인 형식화
//!
//! 외부 로깅 파사드가 생성하는 불변 이벤트 레코드와 파일에 기록되는
//! 한 줄 형식을 정의합니다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 로그 레벨 열거형 (정규화된 형태)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LogLevel {
    /// 상세한 추적 정보
    Trace = 0,
    /// 디버깅 정보
    Debug = 1,
    /// 일반 정보
    Info = 2,
    /// 경고 상황
    Warn = 3,
    /// 오류 상황
    Error = 4,
    /// 시스템 중단 수준 오류
    Fatal = 5,
}

impl LogLevel {
    /// 로그 레벨을 대문자 문자열로 변환
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Fatal => "FATAL",
        }
    }

    /// 경로 자리표시자 치환에 쓰이는 소문자 형태
    pub fn as_lower(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Fatal => "fatal",
        }
    }

    /// 출력 라인에 쓰이는 한 글자 레벨 문자
    pub fn level_char(&self) -> char {
        match self {
            LogLevel::Trace => 'T',
            LogLevel::Debug => 'D',
            LogLevel::Info => 'I',
            LogLevel::Warn => 'W',
            LogLevel::Error => 'E',
            LogLevel::Fatal => 'F',
        }
    }
}

impl FromStr for LogLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "TRACE" => Ok(LogLevel::Trace),
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            "FATAL" => Ok(LogLevel::Fatal),
            _ => Err(()),
        }
    }
}

/// 구조화된 로그 이벤트
///
/// 외부에서 생성되어 팬아웃 코어로 전달되는 불변 레코드입니다.
/// 코어는 이벤트를 소비만 하고 변경하지 않습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    /// 목적지 경로 템플릿 (예: `./logs/%name/%date.log`)
    pub template: String,

    /// 세션 ID (호출자 제어 자유 텍스트)
    pub session: String,

    /// 이벤트 발생 시각
    pub timestamp: DateTime<Utc>,

    /// 정규화된 로그 레벨
    pub level: LogLevel,

    /// 파사드가 생성한 원본 레벨 문자열
    pub raw_level: String,

    /// 논리적 소스 이름 (호출자 제어 자유 텍스트)
    pub name: String,

    /// 로그 메시지
    pub message: String,

    /// 호출자 태그 (선택적)
    pub caller: String,
}

impl LogEvent {
    /// 새 로그 이벤트 생성
    pub fn new<S1, S2, S3, S4>(template: S1, name: S2, session: S3, level: LogLevel, message: S4) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
        S4: Into<String>,
    {
        Self {
            template: template.into(),
            session: session.into(),
            timestamp: Utc::now(),
            level,
            raw_level: level.as_str().to_string(),
            name: name.into(),
            message: message.into(),
            caller: String::new(),
        }
    }

    /// 호출자 태그 설정
    pub fn with_caller<S: Into<String>>(mut self, caller: S) -> Self {
        self.caller = caller.into();
        self
    }

    /// 이벤트 시각 설정 (기본값은 생성 시점)
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// 원본 레벨 문자열 설정
    pub fn with_raw_level<S: Into<String>>(mut self, raw_level: S) -> Self {
        self.raw_level = raw_level.into();
        self
    }

    /// 출력 라인의 레벨 문자
    ///
    /// 원본 레벨 문자열의 첫 글자를 사용하고, 비어 있으면 정규화된
    /// 레벨에서 유도합니다.
    pub fn level_char(&self) -> char {
        self.raw_level
            .chars()
            .next()
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or_else(|| self.level.level_char())
    }

    /// 파일에 기록되는 한 줄 형식
    ///
    /// `[name][session][levelchar][caller-tag]: message` + CRLF.
    /// 호출자 태그는 Info가 아닌 레벨에서만, 비어 있지 않을 때 포함됩니다.
    pub fn format_line(&self) -> String {
        let tag = if self.level != LogLevel::Info && !self.caller.is_empty() {
            format!("[{}]", self.caller)
        } else {
            String::new()
        };

        format!(
            "[{}][{}][{}]{}: {}\r\n",
            self.name,
            self.session,
            self.level_char(),
            tag,
            self.message
        )
    }
}
