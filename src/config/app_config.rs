use std::time::Duration;

use serde::Deserialize;

use crate::infrastructure::observability::MetricsConfig;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub guard: GuardConfig,
    #[serde(default)]
    pub throttle: ThrottleConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Guard chain settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Upper bound on each credential or ownership lookup
    pub lookup_timeout_ms: u64,
    /// Report resources owned by other accounts as 404
    pub conceal_foreign_resources: bool,
    /// 0 disables the credential cache
    pub credential_cache_ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    pub sweep_interval_secs: u64,
}

/// Keys and sample data loaded into the in-memory stores at startup
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    pub keys: Vec<BootstrapKey>,
    pub demo_data: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapKey {
    pub id: String,
    pub account_id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Random part of the key, after the `bsk_<env>_` prefix
    pub secret: String,
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            lookup_timeout_ms: 2_000,
            conceal_foreign_resources: true,
            credential_cache_ttl_secs: 30,
        }
    }
}

impl GuardConfig {
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }

    pub fn credential_cache_ttl(&self) -> Option<Duration> {
        (self.credential_cache_ttl_secs > 0)
            .then(|| Duration::from_secs(self.credential_cache_ttl_secs))
    }
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: 300,
        }
    }
}

impl ThrottleConfig {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
