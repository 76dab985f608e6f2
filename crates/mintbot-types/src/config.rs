//! Configuration types for mintbot.
//!
//! `ConfigFile` mirrors `config.toml`; every field has a default so an empty
//! or missing file is valid. `MintbotConfig` is the resolved view after
//! environment overrides, with credentials wrapped in `SecretString`.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_TELEGRAM_API: &str = "https://api.telegram.org";
pub const DEFAULT_PINNING_ENDPOINT: &str = "https://api.nft.storage";
pub const DEFAULT_IPFS_GATEWAY: &str = "https://ipfs.io/ipfs/";
pub const DEFAULT_RPC_URL: &str = "https://api.mainnet-beta.solana.com";
pub const DEFAULT_CLUSTER: &str = "mainnet";
pub const DEFAULT_OPENAI_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TRENDS_URL: &str = "https://api.dexscreener.com/latest/dex/search?q=chain:solana";

/// Top-level `config.toml` layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub telegram: TelegramSection,
    #[serde(default)]
    pub pinning: PinningSection,
    #[serde(default)]
    pub ledger: LedgerSection,
    #[serde(default)]
    pub ideas: IdeaSection,
    #[serde(default)]
    pub session: SessionSection,
    #[serde(default)]
    pub http: HttpSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramSection {
    #[serde(default)]
    pub bot_token: Option<String>,
    #[serde(default = "default_telegram_api")]
    pub api_base: String,
    /// Long-poll timeout for `getUpdates`, in seconds.
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
}

impl Default for TelegramSection {
    fn default() -> Self {
        Self {
            bot_token: None,
            api_base: default_telegram_api(),
            poll_timeout_secs: default_poll_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PinningSection {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_pinning_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_ipfs_gateway")]
    pub gateway: String,
}

impl Default for PinningSection {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: default_pinning_endpoint(),
            gateway: default_ipfs_gateway(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSection {
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    /// Cluster name used in explorer links.
    #[serde(default = "default_cluster")]
    pub cluster: String,
    #[serde(default = "default_confirm_timeout")]
    pub confirm_timeout_secs: u64,
}

impl Default for LedgerSection {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            cluster: default_cluster(),
            confirm_timeout_secs: default_confirm_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdeaSection {
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default = "default_openai_base")]
    pub openai_base_url: String,
    #[serde(default = "default_openai_model")]
    pub model: String,
    #[serde(default = "default_trends_url")]
    pub trends_url: String,
}

impl Default for IdeaSection {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_base_url: default_openai_base(),
            model: default_openai_model(),
            trends_url: default_trends_url(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionSection {
    /// Remove sessions idle for longer than this. Unset means sessions never
    /// expire.
    #[serde(default)]
    pub idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSection {
    #[serde(default = "default_http_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub port: u16,
    /// When set, requests must carry `Authorization: Bearer <key>`.
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            host: default_http_host(),
            port: default_http_port(),
            api_key: None,
        }
    }
}

fn default_telegram_api() -> String {
    DEFAULT_TELEGRAM_API.to_string()
}

fn default_poll_timeout() -> u64 {
    30
}

fn default_pinning_endpoint() -> String {
    DEFAULT_PINNING_ENDPOINT.to_string()
}

fn default_ipfs_gateway() -> String {
    DEFAULT_IPFS_GATEWAY.to_string()
}

fn default_rpc_url() -> String {
    DEFAULT_RPC_URL.to_string()
}

fn default_cluster() -> String {
    DEFAULT_CLUSTER.to_string()
}

fn default_confirm_timeout() -> u64 {
    60
}

fn default_openai_base() -> String {
    DEFAULT_OPENAI_BASE.to_string()
}

fn default_openai_model() -> String {
    DEFAULT_OPENAI_MODEL.to_string()
}

fn default_trends_url() -> String {
    DEFAULT_TRENDS_URL.to_string()
}

fn default_http_host() -> String {
    "127.0.0.1".to_string()
}

fn default_http_port() -> u16 {
    8080
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Fully resolved configuration (file values overlaid with environment).
#[derive(Debug)]
pub struct MintbotConfig {
    pub telegram: TelegramConfig,
    pub pinning: PinningConfig,
    pub ledger: LedgerSection,
    pub ideas: IdeaConfig,
    pub session: SessionSection,
    pub http: HttpConfig,
}

#[derive(Debug)]
pub struct TelegramConfig {
    pub bot_token: Option<SecretString>,
    pub api_base: String,
    pub poll_timeout_secs: u64,
}

impl TelegramConfig {
    /// The bot token, required before polling starts.
    pub fn require_bot_token(&self) -> Result<&SecretString, ConfigError> {
        self.bot_token.as_ref().ok_or(ConfigError::Missing("BOT_TOKEN"))
    }
}

#[derive(Debug)]
pub struct PinningConfig {
    pub api_key: Option<SecretString>,
    pub endpoint: String,
    pub gateway: String,
}

#[derive(Debug)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
    pub api_key: Option<SecretString>,
}

#[derive(Debug)]
pub struct IdeaConfig {
    /// Presence of this key selects the enhanced idea strategy.
    pub openai_api_key: Option<SecretString>,
    pub openai_base_url: String,
    pub model: String,
    pub trends_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_empty_uses_defaults() {
        let config: ConfigFile = toml::from_str("").unwrap();
        assert_eq!(config.telegram.api_base, DEFAULT_TELEGRAM_API);
        assert_eq!(config.telegram.poll_timeout_secs, 30);
        assert_eq!(config.pinning.endpoint, DEFAULT_PINNING_ENDPOINT);
        assert_eq!(config.ledger.rpc_url, DEFAULT_RPC_URL);
        assert_eq!(config.ledger.cluster, "mainnet");
        assert_eq!(config.ideas.model, "gpt-4o-mini");
        assert!(config.session.idle_timeout_secs.is_none());
        assert_eq!(config.http.port, 8080);
    }

    #[test]
    fn test_config_file_partial_sections() {
        let toml_str = r#"
[ledger]
rpc_url = "https://api.devnet.solana.com"
cluster = "devnet"

[session]
idle_timeout_secs = 900
"#;
        let config: ConfigFile = toml::from_str(toml_str).unwrap();
        assert_eq!(config.ledger.rpc_url, "https://api.devnet.solana.com");
        assert_eq!(config.ledger.cluster, "devnet");
        assert_eq!(config.ledger.confirm_timeout_secs, 60);
        assert_eq!(config.session.idle_timeout_secs, Some(900));
        assert!(config.pinning.api_key.is_none());
    }

    #[test]
    fn test_require_bot_token() {
        let mut telegram = TelegramConfig {
            bot_token: None,
            api_base: DEFAULT_TELEGRAM_API.to_string(),
            poll_timeout_secs: 30,
        };
        assert!(matches!(
            telegram.require_bot_token(),
            Err(ConfigError::Missing("BOT_TOKEN"))
        ));
        telegram.bot_token = Some(SecretString::from("123:abc"));
        assert!(telegram.require_bot_token().is_ok());
    }
}
