//! Appender Error Management
//!
//! 팬아웃 코어에서 발생하는 모든 에러를 체계적으로 관리합니다.
//! 에러는 코어 외부로 전파되지 않고 진단 싱크(tracing)로 보고됩니다.

use std::path::PathBuf;
use thiserror::Error;
use tracing::{error, info, warn};

/// 팬아웃 코어 에러 정의
#[derive(Error, Debug)]
pub enum AppenderError {
    #[error("로그 디렉토리 생성 실패: {path}: {source}")]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("로그 파일 열기 실패: {path}: {source}")]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("로그 라인 작성 실패: {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("어펜더 쓰기 큐가 닫힘: {path}")]
    QueueClosed { path: PathBuf },

    #[error("이벤트 라우터가 이미 종료됨")]
    RouterClosed,
}

/// 에러 심각도 레벨
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Critical, // 시스템 장애
    High,     // 목적지 생성 실패
    Medium,   // 개별 이벤트 유실
    Low,      // 경합으로 인한 일시적 실패
}

impl AppenderError {
    /// 에러의 심각도를 반환합니다.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            AppenderError::DirectoryCreate { .. } | AppenderError::FileOpen { .. } => {
                ErrorSeverity::High
            }
            AppenderError::Write { .. } | AppenderError::RouterClosed => ErrorSeverity::Medium,
            AppenderError::QueueClosed { .. } => ErrorSeverity::Low,
        }
    }

    /// 에러를 진단 싱크에 기록합니다.
    ///
    /// 심각도에 따라 적절한 로깅 레벨을 사용합니다.
    pub fn log(&self, context: &str) {
        match self.severity() {
            ErrorSeverity::Critical | ErrorSeverity::High => {
                error!("{} - {}", context, self);
            }
            ErrorSeverity::Medium => {
                warn!("{} - {}", context, self);
            }
            ErrorSeverity::Low => {
                info!("{} - {}", context, self);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_mapping() {
        let err = AppenderError::FileOpen {
            path: PathBuf::from("/logs/a.log"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.severity(), ErrorSeverity::High);

        let err = AppenderError::QueueClosed {
            path: PathBuf::from("/logs/a.log"),
        };
        assert_eq!(err.severity(), ErrorSeverity::Low);

        assert_eq!(AppenderError::RouterClosed.severity(), ErrorSeverity::Medium);
    }

    #[test]
    fn test_error_display_contains_path() {
        let err = AppenderError::DirectoryCreate {
            path: PathBuf::from("/readonly/logs"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/readonly/logs"));
        assert!(msg.contains("denied"));
    }
}
