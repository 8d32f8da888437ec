use serde::{Deserialize, Deserializer};
use std::str::FromStr;
use tracing::Level;
use super::{server::parse_env_var, SettingsError};

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Invalid log format: {}", s)),
        }
    }
}

/// 로그 출력 대상. `stdout`이 아니면 파일 경로로 취급
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LogOutput {
    #[default]
    Stdout,
    File(String),
}

impl FromStr for LogOutput {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Err("빈 로그 출력 경로".to_string()),
            out if out.eq_ignore_ascii_case("stdout") => Ok(LogOutput::Stdout),
            path => Ok(LogOutput::File(path.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for LogOutput {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LogSettings {
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default = "default_level", deserialize_with = "deserialize_level")]
    pub level: Level,
    #[serde(default)]
    pub output: LogOutput,
}

fn default_level() -> Level {
    Level::INFO
}

fn deserialize_level<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Level, D::Error> {
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
}

impl LogSettings {
    pub fn from_env() -> Result<Self, SettingsError> {
        Ok(Self {
            format: parse_env_var("PROXY_LOG_FORMAT", LogFormat::default)?,
            level: parse_env_var("PROXY_LOG_LEVEL", default_level)?,
            output: parse_env_var("PROXY_LOG_OUTPUT", LogOutput::default)?,
        })
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: default_level(),
            output: LogOutput::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_settings_from_toml() {
        let settings: LogSettings = toml::from_str(r#"
            format = "json"
            level = "debug"
            output = "/var/log/rproxy.log"
        "#).unwrap();

        assert_eq!(settings.format, LogFormat::Json);
        assert_eq!(settings.level, Level::DEBUG);
        assert_eq!(settings.output, LogOutput::File("/var/log/rproxy.log".to_string()));
    }

    #[test]
    fn test_log_settings_defaults() {
        let settings: LogSettings = toml::from_str("").unwrap();
        assert_eq!(settings, LogSettings::default());
    }

    #[test]
    fn test_invalid_level_is_rejected() {
        let result: Result<LogSettings, _> = toml::from_str(r#"level = "loud""#);
        assert!(result.is_err());
    }
}
