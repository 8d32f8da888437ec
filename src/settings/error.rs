use std::fmt;
use crate::rewrite::RewriteError;

#[derive(Debug)]
pub enum SettingsError {
    EnvVarInvalid {
        var_name: String,
        value: String,
        reason: String,
    },
    FileError {
        path: String,
        error: std::io::Error,
    },
    ParseError {
        source: toml::de::Error,
    },
    JsonParseError {
        source: serde_json::Error,
    },
    UnsupportedFormat {
        path: String,
    },
    InvalidRules {
        source: RewriteError,
    },
    WatchError(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EnvVarInvalid { var_name, value, reason } =>
                write!(f, "환경 변수 {} 값 {} 오류: {}", var_name, value, reason),
            Self::FileError { path, error } =>
                write!(f, "설정 파일 {} 오류: {}", path, error),
            Self::ParseError { source } =>
                write!(f, "설정 파싱 오류: {}", source),
            Self::JsonParseError { source } =>
                write!(f, "JSON 설정 파싱 오류: {}", source),
            Self::UnsupportedFormat { path } =>
                write!(f, "지원하지 않는 설정 파일 형식: {}", path),
            Self::InvalidRules { source } =>
                write!(f, "헤더 규칙 오류: {}", source),
            Self::WatchError(msg) =>
                write!(f, "설정 파일 감시 오류: {}", msg),
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ParseError { source } => Some(source),
            Self::JsonParseError { source } => Some(source),
            Self::FileError { error, .. } => Some(error),
            Self::InvalidRules { source } => Some(source),
            _ => None,
        }
    }
}

impl From<RewriteError> for SettingsError {
    fn from(source: RewriteError) -> Self {
        Self::InvalidRules { source }
    }
}
