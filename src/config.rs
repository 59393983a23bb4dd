// src/config.rs
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::rabbitmq::backoff::{ExponentialBackoff, FixedInterval, ReconnectPolicy};
use crate::rabbitmq::errors::RabbitMQError;

/// Connection parameters for the broker.
///
/// Immutable once a publisher has been built from it. When `uri` is set it
/// wins over the individual fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokerConfig {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default = "default_scheme")]
    pub scheme: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default = "default_password")]
    pub password: String,
    #[serde(default = "default_vhost")]
    pub vhost: String,
}

/// Everything the `fanout-publisher` binary needs to run one publisher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublisherSettings {
    pub exchange: String,
    #[serde(default)]
    pub broker: BrokerConfig,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default)]
    pub reconnect: ReconnectSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum ReconnectSettings {
    Fixed {
        #[serde(default = "default_interval_ms")]
        interval_ms: u64,
    },
    Exponential {
        #[serde(default = "default_initial_ms")]
        initial_ms: u64,
        #[serde(default = "default_max_ms")]
        max_ms: u64,
    },
}

// Default values
fn default_scheme() -> String { "amqp".to_string() }
fn default_host() -> String { "localhost".to_string() }
fn default_port() -> u16 { 5672 }
fn default_username() -> String { "guest".to_string() }
fn default_password() -> String { "guest".to_string() }
fn default_vhost() -> String { "/".to_string() }
fn default_queue_capacity() -> usize { 1024 }
fn default_interval_ms() -> u64 { 2000 }
fn default_initial_ms() -> u64 { 1000 }
fn default_max_ms() -> u64 { 30000 }

impl Default for BrokerConfig {
    fn default() -> Self {
        BrokerConfig {
            uri: None,
            scheme: default_scheme(),
            host: default_host(),
            port: default_port(),
            username: default_username(),
            password: default_password(),
            vhost: default_vhost(),
        }
    }
}

impl Default for ReconnectSettings {
    fn default() -> Self {
        ReconnectSettings::Fixed {
            interval_ms: default_interval_ms(),
        }
    }
}

impl ReconnectSettings {
    pub fn to_policy(&self) -> Box<dyn ReconnectPolicy> {
        match *self {
            ReconnectSettings::Fixed { interval_ms } => {
                Box::new(FixedInterval::new(Duration::from_millis(interval_ms)))
            }
            ReconnectSettings::Exponential { initial_ms, max_ms } => Box::new(
                ExponentialBackoff::new(
                    Duration::from_millis(initial_ms),
                    Duration::from_millis(max_ms),
                ),
            ),
        }
    }
}

impl BrokerConfig {
    /// Full AMQP URL including credentials. The vhost is encoded as a single
    /// path segment, so the default vhost "/" renders as "%2F".
    pub fn url(&self) -> Result<String, RabbitMQError> {
        if let Some(uri) = self.uri.as_deref().filter(|uri| !uri.is_empty()) {
            return Ok(Url::parse(uri)?.to_string());
        }

        if self.host.is_empty() {
            return Err(RabbitMQError::InvalidUrl("host cannot be empty".to_string()));
        }

        let mut url = Url::parse(&format!("{}://{}:{}", self.scheme, self.host, self.port))?;
        url.set_username(&self.username)
            .map_err(|_| RabbitMQError::InvalidUrl("cannot carry a username".to_string()))?;
        url.set_password(Some(&self.password))
            .map_err(|_| RabbitMQError::InvalidUrl("cannot carry a password".to_string()))?;
        url.path_segments_mut()
            .map_err(|_| RabbitMQError::InvalidUrl("cannot carry a vhost".to_string()))?
            .clear()
            .push(&self.vhost);

        Ok(url.to_string())
    }

    /// Credential-free rendering of the broker address, safe for logs.
    pub fn endpoint(&self) -> String {
        match self.url().ok().and_then(|url| Url::parse(&url).ok()) {
            Some(mut url) => {
                let _ = url.set_password(None);
                let _ = url.set_username("");
                url.to_string()
            }
            None => format!("{}://{}:{}", self.scheme, self.host, self.port),
        }
    }

    /// Loads `.env` if present and reads the `RABBITMQ_*` variables.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("RABBITMQ_PORT") {
            Some(val) => val
                .parse()
                .with_context(|| format!("RABBITMQ_PORT is not a valid port: {}", val))?,
            None => default_port(),
        };

        Ok(BrokerConfig {
            uri: lookup("RABBITMQ_URI"),
            scheme: lookup("RABBITMQ_SCHEME").unwrap_or_else(default_scheme),
            host: lookup("RABBITMQ_HOST").unwrap_or_else(default_host),
            port,
            username: lookup("RABBITMQ_USER").unwrap_or_else(default_username),
            password: lookup("RABBITMQ_PASSWORD").unwrap_or_else(default_password),
            vhost: lookup("RABBITMQ_VHOST").unwrap_or_else(default_vhost),
        })
    }
}

impl PublisherSettings {
    pub fn new(exchange: impl Into<String>, broker: BrokerConfig) -> Self {
        PublisherSettings {
            exchange: exchange.into(),
            broker,
            queue_capacity: default_queue_capacity(),
            reconnect: ReconnectSettings::default(),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.exchange.is_empty() {
            return Err(anyhow!("Configuration error: exchange cannot be empty"));
        }
        if self.queue_capacity == 0 {
            return Err(anyhow!("Configuration error: queue_capacity must be at least 1"));
        }
        self.broker
            .url()
            .context("Configuration error: broker settings do not form a valid URL")?;
        Ok(())
    }
}

pub fn find_config_file() -> Result<PathBuf> {
    let locations = [
        ("Current directory", Path::new("fanout-publisher.json")),
        ("Current directory (alternative)", Path::new("config/fanout-publisher.json")),
    ];

    for (location_name, path) in locations.iter() {
        if path.exists() {
            debug!("Found config file in {}: {}", location_name, path.display());
            return Ok(path.to_path_buf());
        }
    }

    if let Some(home_dir) = home::home_dir() {
        let home_config = home_dir.join(".fanout-publisher.json");
        if home_config.exists() {
            debug!("Found config file in home directory: {}", home_config.display());
            return Ok(home_config);
        }
    }

    Err(anyhow!("Could not find fanout-publisher.json in the current directory, config/ or the home directory"))
}

pub fn load_settings(path: &Path) -> Result<PublisherSettings> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file at {}", path.display()))?;

    let settings: PublisherSettings = serde_json::from_str(&content)
        .context("Configuration file contains invalid JSON or missing required fields")?;

    settings.validate()?;
    Ok(settings)
}
