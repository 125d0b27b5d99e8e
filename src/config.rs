use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, WatchError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote console connection
    #[serde(default)]
    pub rcon: RconConfig,

    /// Notification endpoint
    #[serde(default)]
    pub webhook: WebhookConfig,

    /// Polling behaviour
    #[serde(default)]
    pub scan: ScanConfig,

    /// Verbose logging
    #[serde(default)]
    pub debug: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RconConfig {
    /// `host:port` of the remote console
    #[serde(default)]
    pub address: String,

    #[serde(default)]
    pub password: String,

    /// Per read/write/connect timeout in seconds
    #[serde(default = "default_io_timeout")]
    pub io_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    #[serde(default)]
    pub url: String,

    /// Per request timeout in seconds
    #[serde(default = "default_webhook_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
}

fn default_io_timeout() -> u64 {
    10
}

fn default_webhook_timeout() -> u64 {
    10
}

fn default_interval() -> u64 {
    5
}

impl Default for RconConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            password: String::new(),
            io_timeout_secs: default_io_timeout(),
        }
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout_secs: default_webhook_timeout(),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
        }
    }
}

impl Config {
    /// Load from an explicit path, or from the first default location that
    /// exists. No file at a default location yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => {
                if !p.exists() {
                    return Err(WatchError::ConfigParse(format!(
                        "config file not found: {}",
                        p.display()
                    )));
                }
                p.to_path_buf()
            }
            None => match Self::default_paths().into_iter().find(|p| p.exists()) {
                Some(p) => p,
                None => return Ok(Self::default()),
            },
        };

        tracing::debug!("loading config from {:?}", config_path);
        let content = std::fs::read_to_string(&config_path)?;
        serde_yml::from_str(&content)
            .map_err(|e| WatchError::ConfigParse(format!("{}: {}", config_path.display(), e)))
    }

    fn default_paths() -> Vec<PathBuf> {
        vec![
            dirs::config_dir().map(|c| c.join("playerwatch/config.yml")),
            Some(PathBuf::from("./playerwatch.yml")),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn sample() -> Self {
        Config {
            rcon: RconConfig {
                address: "127.0.0.1:27015".to_string(),
                password: "change-me".to_string(),
                io_timeout_secs: default_io_timeout(),
            },
            webhook: WebhookConfig {
                url: "https://discord.com/api/webhooks/<id>/<token>".to_string(),
                timeout_secs: default_webhook_timeout(),
            },
            scan: ScanConfig::default(),
            debug: false,
        }
    }

    /// Reject anything the scan loop cannot run with
    pub fn validate(&self) -> Result<()> {
        let address = self.rcon.address.trim();
        if address.is_empty() {
            return Err(WatchError::configuration("rcon.address", "must not be empty"));
        }
        match address.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => {}
            _ => {
                return Err(WatchError::configuration(
                    "rcon.address",
                    format!("expected host:port, got {:?}", address),
                ))
            }
        }

        if self.rcon.password.is_empty() {
            return Err(WatchError::configuration("rcon.password", "must not be empty"));
        }

        if self.webhook.url.trim().is_empty() {
            return Err(WatchError::configuration("webhook.url", "must not be empty"));
        }
        let url = Url::parse(self.webhook.url.trim())
            .map_err(|e| WatchError::configuration("webhook.url", e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(WatchError::configuration(
                "webhook.url",
                format!("unsupported scheme {:?}", url.scheme()),
            ));
        }

        if self.scan.interval_secs == 0 {
            return Err(WatchError::configuration("scan.interval_secs", "must be positive"));
        }
        if self.rcon.io_timeout_secs == 0 {
            return Err(WatchError::configuration("rcon.io_timeout_secs", "must be positive"));
        }
        if self.webhook.timeout_secs == 0 {
            return Err(WatchError::configuration("webhook.timeout_secs", "must be positive"));
        }

        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.scan.interval_secs)
    }

    pub fn io_timeout(&self) -> Duration {
        Duration::from_secs(self.rcon.io_timeout_secs)
    }

    pub fn webhook_timeout(&self) -> Duration {
        Duration::from_secs(self.webhook.timeout_secs)
    }
}
