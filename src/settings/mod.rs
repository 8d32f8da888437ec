use std::{env, fs, path::Path};
use serde::Deserialize;
use tracing::info;
use crate::middleware::HeadersConfig;
use crate::rewrite::{RuleSet, RuleStore};

mod error;
pub mod logging;
mod server;
mod watcher;

pub use error::SettingsError;
pub use logging::{LogFormat, LogOutput, LogSettings};
pub use server::{parse_env_var, ServerSettings};
pub use watcher::{ConfigEvent, ConfigWatcher};

pub type Result<T> = std::result::Result<T, SettingsError>;

/// 설정 파일 경로를 지정하는 환경 변수
pub const CONFIG_FILE_ENV: &str = "PROXY_CONFIG_FILE";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    // 서버 설정
    #[serde(default)]
    pub server: ServerSettings,

    // 로깅 설정
    #[serde(default)]
    pub logging: LogSettings,

    /// 헤더 재작성 규칙
    #[serde(default)]
    pub headers: HeadersConfig,
}

impl Settings {
    /// `PROXY_CONFIG_FILE`이 있으면 그 파일에서, 없으면 환경 변수에서 읽습니다.
    ///
    /// 검증 과정에서 컴파일한 규칙 집합을 함께 반환합니다.
    pub fn load() -> Result<(Self, RuleSet)> {
        match env::var(CONFIG_FILE_ENV) {
            Ok(config_path) => Self::from_file(config_path),
            Err(_) => Self::from_env(),
        }
    }

    /// 확장자(`.toml`/`.json`)에 따라 설정 파일을 읽고 검증합니다.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<(Self, RuleSet)> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| SettingsError::FileError {
            path: path.to_string_lossy().to_string(),
            error: e,
        })?;

        let settings: Self = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => toml::from_str(&content)
                .map_err(|e| SettingsError::ParseError { source: e })?,
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| SettingsError::JsonParseError { source: e })?,
            _ => {
                return Err(SettingsError::UnsupportedFormat {
                    path: path.to_string_lossy().to_string(),
                })
            }
        };

        let rules = settings.validate()?;
        Ok((settings, rules))
    }

    /// 환경 변수로 서버/로깅 설정만 구성합니다. 헤더 규칙은 비어 있습니다.
    pub fn from_env() -> Result<(Self, RuleSet)> {
        let settings = Self {
            server: ServerSettings::from_env()?,
            logging: LogSettings::from_env()?,
            headers: HeadersConfig::default(),
        };

        let rules = settings.validate()?;
        Ok((settings, rules))
    }

    /// 설정 유효성 검증. 헤더 규칙은 실제로 컴파일해 확인하고 그 결과를 반환합니다.
    pub fn validate(&self) -> Result<RuleSet> {
        self.server.validate()?;
        Ok(self.headers.compile()?)
    }
}

/// 설정 파일을 다시 읽어 규칙 집합을 통째로 교체합니다.
///
/// 실패하면 저장소는 그대로 두고 에러를 반환합니다. 성공하면 규칙 수를 반환합니다.
/// 파일을 동기적으로 읽으므로 비동기 태스크에서는 `spawn_blocking`으로 호출합니다.
pub fn reload_rules<P: AsRef<Path>>(path: P, store: &RuleStore) -> Result<usize> {
    let (_, rules) = Settings::from_file(path.as_ref())?;
    let count = rules.rules().len();

    store.replace(rules);
    info!(path = %path.as_ref().display(), rules = count, "헤더 규칙 재적재 완료");
    Ok(count)
}
