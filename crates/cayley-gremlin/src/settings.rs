//! Endpoint configuration.
//!
//! Values come from (lowest to highest precedence) built-in defaults, an
//! optional JSON settings file named by `CAYLEY_SETTINGS`, and the
//! `CAYLEY_*` environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

pub const SETTINGS_FILE_ENV: &str = "CAYLEY_SETTINGS";
pub const PROTO_ENV: &str = "CAYLEY_PROTO";
pub const HOST_ENV: &str = "CAYLEY_HOST";
pub const PORT_ENV: &str = "CAYLEY_PORT";
pub const VERSION_ENV: &str = "CAYLEY_VERSION";
pub const TIMEOUT_ENV: &str = "CAYLEY_TIMEOUT_SECS";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub proto: String,
    pub host: String,
    pub port: u16,
    pub version: String,
    /// Request timeout for the HTTP transport; `None` leaves the client default.
    pub timeout: Option<Duration>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            proto: "http".to_string(),
            host: "localhost".to_string(),
            port: 64210,
            version: "v1".to_string(),
            timeout: None,
        }
    }
}

/// On-disk shape: the same keys as the environment, all optional. Numbers may
/// be given as JSON numbers or strings.
#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    #[serde(rename = "CAYLEY_PROTO")]
    proto: Option<String>,
    #[serde(rename = "CAYLEY_HOST")]
    host: Option<String>,
    #[serde(rename = "CAYLEY_PORT")]
    port: Option<serde_json::Value>,
    #[serde(rename = "CAYLEY_VERSION")]
    version: Option<String>,
    #[serde(rename = "CAYLEY_TIMEOUT_SECS")]
    timeout_secs: Option<serde_json::Value>,
}

impl Settings {
    /// `<proto>://<host>:<port>/api/<version>/query/gremlin`
    pub fn query_url(&self) -> String {
        format!(
            "{}://{}:{}/api/{}/query/gremlin",
            self.proto, self.host, self.port, self.version
        )
    }

    /// Load from the process environment.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` in place of the environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = match lookup(SETTINGS_FILE_ENV).filter(|p| !p.trim().is_empty()) {
            Some(path) => Self::from_file(Path::new(path.trim()))?,
            None => Self::default(),
        };
        settings.apply_overrides(&lookup)?;
        Ok(settings)
    }

    /// Load a JSON settings file on top of the defaults.
    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: SettingsFile =
            serde_json::from_str(&text).map_err(|source| SettingsError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let mut settings = Self::default();
        if let Some(proto) = file.proto {
            settings.proto = proto;
        }
        if let Some(host) = file.host {
            settings.host = host;
        }
        if let Some(version) = file.version {
            settings.version = version;
        }
        if let Some(port) = file.port {
            settings.port = parse_port(&json_scalar(&port))?;
        }
        if let Some(timeout) = file.timeout_secs {
            settings.timeout = Some(parse_timeout(&json_scalar(&timeout))?);
        }
        Ok(settings)
    }

    fn apply_overrides<F>(&mut self, lookup: &F) -> Result<(), SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(proto) = lookup(PROTO_ENV) {
            self.proto = proto;
        }
        if let Some(host) = lookup(HOST_ENV) {
            self.host = host;
        }
        if let Some(version) = lookup(VERSION_ENV) {
            self.version = version;
        }
        if let Some(port) = lookup(PORT_ENV) {
            self.port = parse_port(&port)?;
        }
        if let Some(timeout) = lookup(TIMEOUT_ENV) {
            self.timeout = Some(parse_timeout(&timeout)?);
        }
        Ok(())
    }
}

fn json_scalar(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn parse_port(raw: &str) -> Result<u16, SettingsError> {
    raw.trim().parse().map_err(|e: std::num::ParseIntError| SettingsError::Invalid {
        key: PORT_ENV,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

fn parse_timeout(raw: &str) -> Result<Duration, SettingsError> {
    let secs: u64 = raw.trim().parse().map_err(|e: std::num::ParseIntError| {
        SettingsError::Invalid {
            key: TIMEOUT_ENV,
            value: raw.to_string(),
            reason: e.to_string(),
        }
    })?;
    Ok(Duration::from_secs(secs))
}
