//! Relay configuration types.
//!
//! `RelayConfig` is the top-level `config.toml`. Every field has a default so
//! an empty (or missing) file yields a working local setup. Secrets are not
//! stored here: the provider API key is read from the environment variable
//! named by `provider.api_key_env`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub budget: BudgetConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Route model id (the `<model>` in `/chat/<model>`) -> upstream model id.
    #[serde(default = "default_models")]
    pub models: BTreeMap<String, String>,
}

impl RelayConfig {
    /// Resolve a route model id to the upstream model id.
    pub fn resolve_model(&self, route_model: &str) -> Option<&str> {
        self.models.get(route_model).map(String::as_str)
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            session: SessionConfig::default(),
            budget: BudgetConfig::default(),
            provider: ProviderConfig::default(),
            models: default_models(),
        }
    }
}

fn default_models() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("gpt-3-turbo".to_string(), "gpt-3.5-turbo".to_string()),
        ("gpt-3.5-turbo".to_string(), "gpt-3.5-turbo".to_string()),
    ])
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Sliding TTL; every save pushes expiry this far into the future.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// How often `serve` sweeps expired sessions out of the store.
    #[serde(default = "default_purge_interval_secs")]
    pub purge_interval_secs: u64,
}

fn default_ttl_secs() -> u64 {
    24 * 3600
}

fn default_cookie_name() -> String {
    "session_id".to_string()
}

fn default_purge_interval_secs() -> u64 {
    3600
}

impl SessionConfig {
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.ttl_secs as i64)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            cookie_name: default_cookie_name(),
            purge_interval_secs: default_purge_interval_secs(),
        }
    }
}

/// How the output-token ceiling of an admitted call is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "lowercase")]
pub enum OutputCeiling {
    /// A fixed small cap, independent of balance.
    Fixed { tokens: u32 },
    /// Whatever the balance leaves after the prompt estimate.
    Dynamic,
}

impl Default for OutputCeiling {
    fn default() -> Self {
        OutputCeiling::Fixed { tokens: 50 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetConfig {
    /// Balance granted to a newly registered user.
    #[serde(default = "default_balance")]
    pub default_balance: u64,
    #[serde(default = "default_chars_per_token")]
    pub chars_per_token: u32,
    /// Keep the user's message in history when the budget gate rejects it.
    #[serde(default)]
    pub persist_on_reject: bool,
    /// Keep the user's message in history when the provider call fails.
    #[serde(default = "default_true")]
    pub persist_on_upstream_failure: bool,
    #[serde(default)]
    pub output_ceiling: OutputCeiling,
}

fn default_balance() -> u64 {
    1000
}

fn default_chars_per_token() -> u32 {
    4
}

fn default_true() -> bool {
    true
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            default_balance: default_balance(),
            chars_per_token: default_chars_per_token(),
            persist_on_reject: false,
            persist_on_upstream_failure: true,
            output_ceiling: OutputCeiling::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            api_key_env: default_api_key_env(),
        }
    }
}
