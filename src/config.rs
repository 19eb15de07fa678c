//! Node configuration, read once from a TOML file at startup

use crate::connectivity::RetryPolicy;
use crate::link::Credentials;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use smarthome_shared::policy::{CONNECT_POLL_INTERVAL_MS, MAX_CONNECT_ATTEMPTS, OTA_PORT};
use smarthome_shared::VersionInfo;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "SMART_HOME_CONFIG";

/// Config file used when neither an argument nor the env var names one
pub const DEFAULT_CONFIG_PATH: &str = "smart-home-node.toml";

/// Which [`NetworkLink`](crate::link::NetworkLink) the node associates through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LinkMode {
    /// In-process link, always reachable
    #[default]
    Simulated,
    /// Hold a TCP connection to `network.gateway`
    Tcp,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub mode: LinkMode,
    pub ssid: String,
    pub password: String,
    /// Gateway address (host:port) for the TCP link
    pub gateway: String,
    pub connect_timeout_ms: u64,
    pub max_attempts: u32,
    pub poll_interval_ms: u64,
    /// Defaults to `max_attempts × poll_interval_ms`
    pub reconnect_cooldown_ms: Option<u64>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            mode: LinkMode::default(),
            ssid: "SmartHomeNet".into(),
            password: String::new(),
            gateway: "127.0.0.1:8883".into(),
            connect_timeout_ms: 2_000,
            max_attempts: MAX_CONNECT_ATTEMPTS,
            poll_interval_ms: CONNECT_POLL_INTERVAL_MS,
            reconnect_cooldown_ms: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OtaConfig {
    pub enabled: bool,
    pub hostname: String,
    pub password: String,
    pub port: u16,
    pub staging_dir: PathBuf,
    /// Longest wait for the header or the next image chunk
    pub receive_timeout_ms: u64,
}

impl Default for OtaConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            hostname: "smart-home-mcu".into(),
            password: "admin".into(),
            port: OTA_PORT,
            staging_dir: PathBuf::from("ota-staging"),
            receive_timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FirmwareConfig {
    pub version: String,
    pub enable_rollback: bool,
}

impl Default for FirmwareConfig {
    fn default() -> Self {
        Self {
            version: "1.0.0".into(),
            enable_rollback: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".into(),
            // The firmware serves on 80; hosts default to an unprivileged port
            port: 8080,
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: LogLevel,
}

/// Values served by the simulated board
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// `None` makes the read fail
    pub temperature: Option<f32>,
    pub humidity: Option<f32>,
    /// Status polls before the simulated link associates
    pub associate_after: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            temperature: Some(24.0),
            humidity: Some(60.0),
            associate_after: 2,
        }
    }
}

/// Complete node configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub device_id: String,
    pub loop_interval_ms: u64,
    pub network: NetworkConfig,
    pub ota: OtaConfig,
    pub firmware: FirmwareConfig,
    pub server: ServerConfig,
    pub log: LogConfig,
    pub simulation: SimulationConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            device_id: "node-001".into(),
            loop_interval_ms: 50,
            network: NetworkConfig::default(),
            ota: OtaConfig::default(),
            firmware: FirmwareConfig::default(),
            server: ServerConfig::default(),
            log: LogConfig::default(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl NodeConfig {
    /// Resolve the config path: explicit argument, then env, then default
    pub fn resolve_path(arg: Option<String>) -> PathBuf {
        arg.or_else(|| std::env::var(CONFIG_ENV).ok())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    /// Load a config file. `Ok(None)` means the file does not exist.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()))
            }
        };

        Self::from_toml_str(&text)
            .with_context(|| format!("Failed to parse {}", path.display()))
            .map(Some)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the runtime cannot honour
    pub fn validate(&self) -> Result<()> {
        if self.loop_interval_ms == 0 {
            bail!("loop_interval_ms must be at least 1");
        }
        if self.network.connect_timeout_ms == 0 {
            bail!("network.connect_timeout_ms must be at least 1");
        }
        if self.ota.receive_timeout_ms == 0 {
            bail!("ota.receive_timeout_ms must be at least 1");
        }
        if self.network.reconnect_cooldown_ms.is_none()
            && self.attempt_window().is_none()
        {
            bail!(
                "network.max_attempts ({}) × network.poll_interval_ms ({}) is out of range",
                self.network.max_attempts,
                self.network.poll_interval_ms
            );
        }
        Ok(())
    }

    /// Longest time one association attempt can take
    fn attempt_window(&self) -> Option<Duration> {
        Duration::from_millis(self.network.poll_interval_ms).checked_mul(self.network.max_attempts)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        let poll_interval = Duration::from_millis(self.network.poll_interval_ms);
        let reconnect_cooldown = match self.network.reconnect_cooldown_ms {
            Some(ms) => Duration::from_millis(ms),
            None => self.attempt_window().unwrap_or(Duration::MAX),
        };

        RetryPolicy {
            max_attempts: self.network.max_attempts,
            poll_interval,
            reconnect_cooldown,
        }
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            ssid: self.network.ssid.clone(),
            password: self.network.password.clone(),
        }
    }

    pub fn version_info(&self) -> VersionInfo {
        VersionInfo::new(self.firmware.version.clone(), self.firmware.enable_rollback)
    }

    /// Never zero, which `tokio::time::interval` rejects
    pub fn loop_interval(&self) -> Duration {
        Duration::from_millis(self.loop_interval_ms.max(1))
    }

    pub fn receive_timeout(&self) -> Duration {
        Duration::from_millis(self.ota.receive_timeout_ms.max(1))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.network.connect_timeout_ms)
    }
}
