//! Relay configuration loader.
//!
//! Reads `config.toml` from the data directory (`~/.meterchat/` in production)
//! and deserializes it into [`RelayConfig`]. Falls back to defaults when the
//! file is missing or malformed. The provider API key is resolved separately
//! from the environment and never stored in the config struct.

use std::path::{Path, PathBuf};

use meterchat_types::config::RelayConfig;
use secrecy::SecretString;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "METERCHAT_DATA_DIR";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not set; it must hold the provider API key")]
    MissingApiKey(String),

    #[error("cannot determine a home directory; set {DATA_DIR_ENV}")]
    NoHomeDir,
}

/// Resolve the data directory: `METERCHAT_DATA_DIR`, else `~/.meterchat`.
pub fn resolve_data_dir() -> Result<PathBuf, ConfigError> {
    data_dir_from(std::env::var(DATA_DIR_ENV).ok(), dirs::home_dir())
}

fn data_dir_from(
    env_value: Option<String>,
    home: Option<PathBuf>,
) -> Result<PathBuf, ConfigError> {
    match env_value.filter(|v| !v.is_empty()) {
        Some(dir) => Ok(PathBuf::from(dir)),
        None => home
            .map(|h| h.join(".meterchat"))
            .ok_or(ConfigError::NoHomeDir),
    }
}

/// Load relay configuration from `{data_dir}/config.toml`.
///
/// - Missing file: [`RelayConfig::default()`].
/// - Unreadable or unparsable file: logs a warning, returns the default.
pub async fn load_relay_config(data_dir: &Path) -> RelayConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return RelayConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return RelayConfig::default();
        }
    };

    match toml::from_str::<RelayConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            RelayConfig::default()
        }
    }
}

/// Read the provider API key from the variable named in the config.
pub fn load_api_key(config: &RelayConfig) -> Result<SecretString, ConfigError> {
    let var = &config.provider.api_key_env;
    api_key_from(std::env::var(var).ok(), var)
}

fn api_key_from(value: Option<String>, var: &str) -> Result<SecretString, ConfigError> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(SecretString::from)
        .ok_or_else(|| ConfigError::MissingApiKey(var.to_string()))
}
