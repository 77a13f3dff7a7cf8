//! Configuration for the DL kernel.

use std::time::Duration;

use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;

use crate::network_type::PrefixPolicy;

/// Main configuration structure for the kernel.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub kernel: KernelConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Network types registered at start-up.
    #[serde(default)]
    pub network_types: Vec<NetworkTypeConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KernelConfig {
    #[serde(default = "default_name")]
    pub name: String,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
        }
    }
}

/// Host gateway configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct GatewayConfig {
    /// Upper bound on waiting for a data request reply. Unset waits forever.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl GatewayConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RegistryConfig {
    #[serde(default)]
    pub prefix_policy: PrefixPolicy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// A network type declared in configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkTypeConfig {
    pub identifier: String,
    /// Runtime type name prefixes of models this type owns.
    /// Example: `["keras.engine.training.Model", "tensorflow.python.keras."]`
    pub backend_module_names: Vec<String>,
}

// Default values
fn default_name() -> String {
    "dl-kernel".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Configuration sources (in order of precedence):
    /// 1. Environment variables (DLKERNEL__SECTION__KEY format)
    /// 2. dl-kernel.toml file (if present)
    /// 3. Built-in defaults
    pub fn load() -> Result<Self, ConfigError> {
        let config = ConfigLoader::builder()
            // Set defaults
            .set_default("kernel.name", default_name())?
            .set_default("logging.level", default_log_level())?
            // Load from dl-kernel.toml if exists
            .add_source(File::with_name("dl-kernel").required(false))
            // Override with environment variables (DLKERNEL__SECTION__KEY format)
            .add_source(
                Environment::with_prefix("DLKERNEL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
