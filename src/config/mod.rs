//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, BootstrapConfig, BootstrapKey, GuardConfig, LogFormat, LoggingConfig,
    ServerConfig, ThrottleConfig,
};
