//! Configuration management for sfget.
//!
//! Two layers feed a download:
//!
//! 1. [`Config`], an optional defaults file (`config.toml`) holding the
//!    tunables that rarely change between runs.
//! 2. [`DownloadRequest`], the raw per-run parameters collected by the CLI.
//!
//! [`DownloadConfig::resolve`] merges both, validates the result and hands
//! back an immutable value that the connector and the transfer engine borrow.
//!
//! ## Configuration File Locations
//!
//! | Platform | Path |
//! |----------|------|
//! | Linux | `~/.config/sfget/config.toml` |
//! | macOS | `~/Library/Application Support/sfget/config.toml` |
//! | Windows | `%APPDATA%\sfget\config.toml` |
//!
//! ## Example
//!
//! ```toml
//! [transfer]
//! report_interval = "2s"
//! chunk_size = 65536
//!
//! [connection]
//! port = 2222
//! timeout = "30s"
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::connection::parse_host;
use crate::error::{Error, Result};

/// Defaults file contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Transfer settings
    pub transfer: TransferConfig,
    /// Connection settings
    pub connection: ConnectionConfig,
}

/// Transfer configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Time between two progress lines
    #[serde(with = "humantime_serde")]
    pub report_interval: Duration,
    /// Copy buffer size in bytes
    pub chunk_size: usize,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            report_interval: Duration::from_secs(crate::DEFAULT_REPORT_INTERVAL_SECS),
            chunk_size: crate::DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Connection configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// SSH port used when the host string carries none
    pub port: u16,
    /// Upper bound for establishing the session
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            port: crate::DEFAULT_SSH_PORT,
            timeout: Duration::from_secs(crate::DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// If the configuration file doesn't exist, returns the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from an explicit path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config: {e}")))?;

        toml::from_str(&content).map_err(|e| Error::Config(format!("Failed to parse config: {e}")))
    }

    /// Get the default configuration directory path.
    #[must_use]
    pub fn config_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "sfget").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the full path to the configuration file.
    #[must_use]
    pub fn config_path() -> PathBuf {
        Self::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("config.toml")
    }
}

/// Raw per-run parameters, as collected from the command line.
///
/// `None` means "not given"; optional values then fall back to [`Config`].
#[derive(Debug, Clone, Default)]
pub struct DownloadRequest {
    /// `host` or `host:port`
    pub host: Option<String>,
    /// Remote user
    pub user: Option<String>,
    /// Password for the remote user
    pub password: Option<String>,
    /// Absolute path of the file on the remote side
    pub remote_path: Option<String>,
    /// Absolute path of the local file
    pub local_path: Option<PathBuf>,
    /// Progress interval in seconds
    pub report_interval_secs: Option<u64>,
    /// Connection timeout in seconds
    pub timeout_secs: Option<u64>,
    /// Copy buffer size in bytes
    pub chunk_size: Option<usize>,
}

/// Fully resolved, validated parameters of one download.
#[derive(Clone)]
pub struct DownloadConfig {
    /// Remote host name or address, without port
    pub host: String,
    /// Remote SSH port
    pub port: u16,
    /// Remote user
    pub user: String,
    password: String,
    /// Absolute path of the file on the remote side
    pub remote_path: String,
    /// Absolute path of the local file
    pub local_path: PathBuf,
    /// Time between two progress lines
    pub report_interval: Duration,
    /// Upper bound for establishing the session
    pub connect_timeout: Duration,
    /// Copy buffer size in bytes
    pub chunk_size: usize,
}

impl DownloadConfig {
    /// Merge a request with the file defaults and validate the result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] naming the first offending parameter.
    pub fn resolve(request: DownloadRequest, defaults: &Config) -> Result<Self> {
        let host_str = required(request.host, "host")?;
        let user = required(request.user, "user")?;
        let password = required(request.password, "password")?;
        let remote_path = required(request.remote_path, "remote-file")?;
        let local_path = request
            .local_path
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| invalid("local-file", "parameter is required"))?;

        let (host, port) = parse_host(&host_str)?;
        let port = port.unwrap_or(defaults.connection.port);

        if !remote_path.starts_with('/') {
            return Err(invalid("remote-file", "must be an absolute path"));
        }
        if !local_path.is_absolute() {
            return Err(invalid("local-file", "must be an absolute path"));
        }

        let report_interval = request
            .report_interval_secs
            .map_or(defaults.transfer.report_interval, Duration::from_secs);
        if report_interval.is_zero() {
            return Err(invalid("secs", "must be greater than zero"));
        }

        let connect_timeout = request
            .timeout_secs
            .map_or(defaults.connection.timeout, Duration::from_secs);
        if connect_timeout.is_zero() {
            return Err(invalid("timeout", "must be greater than zero"));
        }

        let chunk_size = request.chunk_size.unwrap_or(defaults.transfer.chunk_size);
        if chunk_size == 0 {
            return Err(invalid("chunk-size", "must be greater than zero"));
        }

        Ok(Self {
            host,
            port,
            user,
            password,
            remote_path,
            local_path,
            report_interval,
            connect_timeout,
            chunk_size,
        })
    }

    /// Password for the remote user.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }

    /// `host:port` string, with brackets around IPv6 literals.
    #[must_use]
    pub fn address(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl fmt::Display for DownloadConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "host: {} user: {} password: {} remote file: {} local file: {} interval: {} timeout: {}",
            self.address(),
            self.user,
            mask(&self.password),
            self.remote_path,
            self.local_path.display(),
            humantime::format_duration(self.report_interval),
            humantime::format_duration(self.connect_timeout),
        )
    }
}

impl fmt::Debug for DownloadConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &mask(&self.password))
            .field("remote_path", &self.remote_path)
            .field("local_path", &self.local_path)
            .field("report_interval", &self.report_interval)
            .field("connect_timeout", &self.connect_timeout)
            .field("chunk_size", &self.chunk_size)
            .finish()
    }
}

fn mask(secret: &str) -> String {
    "*".repeat(secret.chars().count().min(8))
}

fn required(value: Option<String>, key: &str) -> Result<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| invalid(key, "parameter is required"))
}

fn invalid(key: &str, reason: &str) -> Error {
    Error::InvalidConfig {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn full_request() -> DownloadRequest {
        DownloadRequest {
            host: Some("files.example.com".to_string()),
            user: Some("alice".to_string()),
            password: Some("hunter22".to_string()),
            remote_path: Some("/srv/data/image.iso".to_string()),
            local_path: Some(PathBuf::from("/tmp/image.iso")),
            ..Default::default()
        }
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();

        assert_eq!(config.connection.port, 22);
        assert_eq!(config.connection.timeout, Duration::from_secs(10));
        assert_eq!(config.transfer.report_interval, Duration::from_secs(1));
        assert_eq!(config.transfer.chunk_size, crate::DEFAULT_CHUNK_SIZE);
    }

    #[test]
    fn test_config_deserialization_partial() {
        let partial_toml = r#"
[connection]
timeout = "1m"
"#;

        let config: Config = toml::from_str(partial_toml).expect("parse partial config");

        assert_eq!(config.connection.timeout, Duration::from_secs(60));
        assert_eq!(config.connection.port, 22);
        assert_eq!(config.transfer.report_interval, Duration::from_secs(1));
    }

    #[test]
    fn test_config_durations_accept_humantime_units() {
        let config: Config = toml::from_str(
            r#"
[transfer]
report_interval = "500ms"

[connection]
timeout = "1h"
"#,
        )
        .expect("parse humantime durations");

        assert_eq!(config.transfer.report_interval, Duration::from_millis(500));
        assert_eq!(config.connection.timeout, Duration::from_secs(3600));

        let config: Config =
            toml::from_str("[connection]\ntimeout = \"1m 30s\"\n").expect("compound duration");
        assert_eq!(config.connection.timeout, Duration::from_secs(90));
    }

    #[test]
    fn test_display_keeps_sub_second_interval() {
        let mut defaults = Config::default();
        defaults.transfer.report_interval = Duration::from_millis(500);

        let config = DownloadConfig::resolve(full_request(), &defaults).unwrap();
        let shown = config.to_string();
        assert!(shown.contains("interval: 500ms"), "{shown}");
        assert!(shown.contains("timeout: 10s"), "{shown}");
    }

    #[test]
    fn test_config_load_missing_file_is_default() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::load_from(&temp_dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.connection.port, 22);
    }

    #[test]
    fn test_config_load_garbage_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[transfer\nchunk_size = ").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_humantime_duration_serialization() {
        let toml_str = toml::to_string_pretty(&Config::default()).expect("serialize");
        assert!(toml_str.contains("report_interval = \"1s\""));
        assert!(toml_str.contains("timeout = \"10s\""));
    }

    #[test]
    fn test_config_path() {
        assert!(Config::config_path().ends_with("config.toml"));
    }

    #[test]
    fn test_resolve_applies_defaults() {
        let config = DownloadConfig::resolve(full_request(), &Config::default()).unwrap();

        assert_eq!(config.host, "files.example.com");
        assert_eq!(config.port, 22);
        assert_eq!(config.report_interval, Duration::from_secs(1));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.password(), "hunter22");
    }

    #[test]
    fn test_resolve_flags_override_file() {
        let mut defaults = Config::default();
        defaults.connection.port = 2200;
        defaults.transfer.report_interval = Duration::from_secs(5);

        let mut request = full_request();
        request.host = Some("10.0.0.5:2222".to_string());
        request.report_interval_secs = Some(3);

        let config = DownloadConfig::resolve(request, &defaults).unwrap();
        assert_eq!(config.port, 2222);
        assert_eq!(config.report_interval, Duration::from_secs(3));
        assert_eq!(config.address(), "10.0.0.5:2222");
    }

    #[test]
    fn test_resolve_port_from_file_when_host_has_none() {
        let mut defaults = Config::default();
        defaults.connection.port = 2200;

        let config = DownloadConfig::resolve(full_request(), &defaults).unwrap();
        assert_eq!(config.port, 2200);
    }

    #[test]
    fn test_resolve_missing_required() {
        for key in ["host", "user", "password", "remote-file", "local-file"] {
            let mut request = full_request();
            match key {
                "host" => request.host = None,
                "user" => request.user = Some("  ".to_string()),
                "password" => request.password = None,
                "remote-file" => request.remote_path = None,
                _ => request.local_path = None,
            }

            let err = DownloadConfig::resolve(request, &Config::default()).unwrap_err();
            match err {
                Error::InvalidConfig { key: k, .. } => assert_eq!(k, key),
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn test_resolve_rejects_relative_paths() {
        let mut request = full_request();
        request.remote_path = Some("data/image.iso".to_string());
        assert!(DownloadConfig::resolve(request, &Config::default()).is_err());

        let mut request = full_request();
        request.local_path = Some(PathBuf::from("image.iso"));
        assert!(DownloadConfig::resolve(request, &Config::default()).is_err());
    }

    #[test]
    fn test_resolve_rejects_zero_values() {
        let mut request = full_request();
        request.report_interval_secs = Some(0);
        assert!(DownloadConfig::resolve(request, &Config::default()).is_err());

        let mut request = full_request();
        request.timeout_secs = Some(0);
        assert!(DownloadConfig::resolve(request, &Config::default()).is_err());

        let mut request = full_request();
        request.chunk_size = Some(0);
        assert!(DownloadConfig::resolve(request, &Config::default()).is_err());
    }

    #[test]
    fn test_display_masks_password() {
        let config = DownloadConfig::resolve(full_request(), &Config::default()).unwrap();
        let shown = config.to_string();
        let debugged = format!("{config:?}");

        assert!(!shown.contains("hunter22"));
        assert!(!debugged.contains("hunter22"));
        assert!(shown.contains("********"));
        assert!(shown.contains("/srv/data/image.iso"));
    }

    #[test]
    fn test_ipv6_address_brackets() {
        let mut request = full_request();
        request.host = Some("[::1]:2222".to_string());
        let config = DownloadConfig::resolve(request, &Config::default()).unwrap();
        assert_eq!(config.host, "::1");
        assert_eq!(config.address(), "[::1]:2222");
    }
}
