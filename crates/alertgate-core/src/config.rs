//! Configuration management for AlertGate

use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Config endpoint used when none is configured
pub const DEFAULT_CONFIG_ENDPOINT: &str = "/api/v1/alerts";

/// Environment variable prefix, e.g. `ALERTGATE__REMOTE__URL`
pub const ENV_PREFIX: &str = "ALERTGATE";

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote Alertmanager configuration
    pub remote: RemoteAlertmanagerConfig,

    /// Organization the gateway acts for
    pub org_id: i64,

    /// Local configuration storage
    pub storage: StorageConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from defaults, an optional file and the environment.
    ///
    /// Environment variables use the `ALERTGATE` prefix and `__` as the
    /// section separator, e.g. `ALERTGATE__REMOTE__TENANT_ID=t1`.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }

        builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(config::Config::try_deserialize)
            .map_err(|e| Error::config(e.to_string()))
    }
}

/// Connection settings for the remote Alertmanager
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteAlertmanagerConfig {
    /// Base URL of the remote Alertmanager
    pub url: String,
    /// Tenant sent in the `X-Scope-OrgID` header
    pub tenant_id: String,
    /// Basic auth password, only used together with a tenant id
    pub basic_auth_password: String,
    /// Path of the configuration endpoint, relative to the backend root
    pub config_endpoint: String,
    /// Readiness protocol timings
    pub readiness: ReadinessConfig,
    /// Alert delivery tuning
    pub dispatcher: DispatcherConfig,
}

impl RemoteAlertmanagerConfig {
    /// Create a config with default timings
    pub fn new(
        url: impl Into<String>,
        tenant_id: impl Into<String>,
        basic_auth_password: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            tenant_id: tenant_id.into(),
            basic_auth_password: basic_auth_password.into(),
            ..Self::default()
        }
    }

    /// Configured endpoint, or the default one when empty
    pub fn config_endpoint(&self) -> &str {
        if self.config_endpoint.is_empty() {
            DEFAULT_CONFIG_ENDPOINT
        } else {
            &self.config_endpoint
        }
    }

    /// Check the timings and queue sizes used by the gateway
    pub fn validate(&self) -> Result<()> {
        self.readiness.validate()?;
        self.dispatcher.validate()
    }
}

impl Default for RemoteAlertmanagerConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            tenant_id: String::new(),
            basic_auth_password: String::new(),
            config_endpoint: DEFAULT_CONFIG_ENDPOINT.to_string(),
            readiness: ReadinessConfig::default(),
            dispatcher: DispatcherConfig::default(),
        }
    }
}

impl fmt::Debug for RemoteAlertmanagerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let password = if self.basic_auth_password.is_empty() {
            ""
        } else {
            "[redacted]"
        };

        f.debug_struct("RemoteAlertmanagerConfig")
            .field("url", &self.url)
            .field("tenant_id", &self.tenant_id)
            .field("basic_auth_password", &password)
            .field("config_endpoint", &self.config_endpoint)
            .field("readiness", &self.readiness)
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}

/// Readiness protocol timings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadinessConfig {
    /// How often the dispatcher is polled for discovered targets
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    /// Upper bound for target discovery after a successful probe
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl ReadinessConfig {
    /// Reject timings the readiness timers cannot run with
    pub fn validate(&self) -> Result<()> {
        positive_duration("readiness.poll_interval", self.poll_interval)?;
        schedulable_duration("readiness.timeout", self.timeout)
    }
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Alert dispatcher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Maximum number of queued alerts before the oldest are dropped
    pub queue_capacity: usize,
    /// Maximum number of alerts posted in one request
    pub max_batch_size: usize,
    /// How often pending target changes are applied
    #[serde(with = "humantime_serde")]
    pub discovery_interval: Duration,
    /// Timeout for a single delivery request
    #[serde(with = "humantime_serde")]
    pub send_timeout: Duration,
}

impl DispatcherConfig {
    /// Reject settings the dispatcher loop cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.queue_capacity == 0 {
            return Err(Error::config("dispatcher.queue_capacity must be greater than zero"));
        }
        positive_duration("dispatcher.discovery_interval", self.discovery_interval)?;
        positive_duration("dispatcher.send_timeout", self.send_timeout)
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 10_000,
            max_batch_size: 64,
            discovery_interval: Duration::from_millis(500),
            send_timeout: Duration::from_secs(10),
        }
    }
}

fn positive_duration(name: &str, value: Duration) -> Result<()> {
    if value.is_zero() {
        return Err(Error::config(format!("{name} must be greater than zero")));
    }
    schedulable_duration(name, value)
}

fn schedulable_duration(name: &str, value: Duration) -> Result<()> {
    if Instant::now().checked_add(value).is_none() {
        return Err(Error::config(format!("{name} is too large: {value:?}")));
    }
    Ok(())
}

/// Local configuration storage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the last applied configuration per organization
    pub dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let dir = directories::ProjectDirs::from("dev", "alertgate", "alertgate")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("./data"));

        Self { dir }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Log format (json or pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
