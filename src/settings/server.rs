use serde::Deserialize;
use std::env;
use std::net::SocketAddr;
use super::SettingsError;

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ServerSettings {
    /// HTTP 포트 (기본값: 8080)
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// 요청을 전달할 업스트림 주소 (기본값: 127.0.0.1:3000)
    #[serde(default = "default_upstream")]
    pub upstream: SocketAddr,
}

fn default_http_port() -> u16 { 8080 }
fn default_upstream() -> SocketAddr { SocketAddr::from(([127, 0, 0, 1], 3000)) }

pub fn parse_env_var<T: std::str::FromStr, F: FnOnce() -> T>(name: &str, default: F) -> Result<T, SettingsError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(val) => val.parse().map_err(|e: T::Err| SettingsError::EnvVarInvalid {
            var_name: name.to_string(),
            value: val,
            reason: e.to_string(),
        }),
        Err(env::VarError::NotPresent) => Ok(default()),
        Err(e) => Err(SettingsError::EnvVarInvalid {
            var_name: name.to_string(),
            value: "".to_string(),
            reason: e.to_string(),
        }),
    }
}

impl ServerSettings {
    pub fn from_env() -> Result<Self, SettingsError> {
        let settings = Self {
            http_port: parse_env_var("PROXY_HTTP_PORT", default_http_port)?,
            upstream: parse_env_var("PROXY_UPSTREAM", default_upstream)?,
        };

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.http_port == 0 {
            return Err(SettingsError::EnvVarInvalid {
                var_name: "PROXY_HTTP_PORT".to_string(),
                value: self.http_port.to_string(),
                reason: "포트는 0이 될 수 없습니다".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            http_port: default_http_port(),
            upstream: default_upstream(),
        }
    }
}
