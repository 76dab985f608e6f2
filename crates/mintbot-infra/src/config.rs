//! Configuration loader for mintbot.
//!
//! Reads `config.toml` (by default `{config_dir}/mintbot/config.toml`),
//! then overlays environment variables. A `.env` file in the working
//! directory is loaded first, so it behaves like real environment.

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use secrecy::SecretString;

use mintbot_types::config::{
    ConfigFile, HttpConfig, IdeaConfig, MintbotConfig, PinningConfig, TelegramConfig,
};
use mintbot_types::error::ConfigError;

/// `{config_dir}/mintbot/config.toml`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("mintbot").join("config.toml"))
}

/// Read and parse a config file.
///
/// - A missing file yields [`ConfigFile::default()`].
/// - An unreadable or malformed file is an error.
pub async fn load_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(ConfigFile::default());
        }
        Err(err) => {
            return Err(ConfigError::Io {
                path: path.display().to_string(),
                reason: err.to_string(),
            });
        }
    };

    toml::from_str(&content).map_err(|err| ConfigError::Invalid {
        key: "config.toml",
        reason: err.to_string(),
    })
}

/// Overlay environment values (read through `env`) on a parsed file.
///
/// Empty environment values count as unset.
pub fn resolve<F>(file: ConfigFile, env: F) -> Result<MintbotConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| env(key).filter(|v| !v.trim().is_empty());

    let telegram = TelegramConfig {
        bot_token: lookup("BOT_TOKEN")
            .or(file.telegram.bot_token)
            .map(SecretString::from),
        api_base: lookup("TELEGRAM_API_BASE").unwrap_or(file.telegram.api_base),
        poll_timeout_secs: file.telegram.poll_timeout_secs,
    };

    let pinning = PinningConfig {
        api_key: lookup("NFT_STORAGE_API_KEY")
            .or(file.pinning.api_key)
            .map(SecretString::from),
        endpoint: lookup("PINNING_ENDPOINT").unwrap_or(file.pinning.endpoint),
        gateway: lookup("IPFS_GATEWAY").unwrap_or(file.pinning.gateway),
    };

    let mut ledger = file.ledger;
    if let Some(url) = lookup("SOLANA_RPC_URL") {
        ledger.rpc_url = url;
    }
    if let Some(cluster) = lookup("SOLANA_CLUSTER") {
        ledger.cluster = cluster;
    }
    if let Some(secs) = parsed(&lookup, "SOLANA_CONFIRM_TIMEOUT_SECS")? {
        ledger.confirm_timeout_secs = secs;
    }

    let ideas = IdeaConfig {
        openai_api_key: lookup("OPENAI_API_KEY")
            .or(file.ideas.openai_api_key)
            .map(SecretString::from),
        openai_base_url: lookup("OPENAI_BASE_URL").unwrap_or(file.ideas.openai_base_url),
        model: lookup("OPENAI_MODEL").unwrap_or(file.ideas.model),
        trends_url: lookup("DEXSCREENER_URL").unwrap_or(file.ideas.trends_url),
    };

    let mut session = file.session;
    if let Some(secs) = parsed(&lookup, "SESSION_IDLE_TIMEOUT_SECS")? {
        session.idle_timeout_secs = Some(secs);
    }
    if session.idle_timeout_secs == Some(0) {
        return Err(ConfigError::Invalid {
            key: "SESSION_IDLE_TIMEOUT_SECS",
            reason: "must be greater than zero".to_string(),
        });
    }

    let http = HttpConfig {
        host: lookup("MINTBOT_HTTP_HOST").unwrap_or(file.http.host),
        port: parsed(&lookup, "MINTBOT_HTTP_PORT")?.unwrap_or(file.http.port),
        api_key: lookup("MINTBOT_HTTP_API_KEY")
            .or(file.http.api_key)
            .map(SecretString::from),
    };

    Ok(MintbotConfig {
        telegram,
        pinning,
        ledger,
        ideas,
        session,
        http,
    })
}

/// Load `.env`, the config file at `path` (or the default location), and
/// the process environment.
pub async fn load_config(path: Option<&Path>) -> Result<MintbotConfig, ConfigError> {
    let _ = dotenvy::dotenv();

    let file = match path.map(Path::to_path_buf).or_else(default_config_path) {
        Some(path) => load_config_file(&path).await?,
        None => ConfigFile::default(),
    };
    resolve(file, |key| std::env::var(key).ok())
}

fn parsed<T, F>(lookup: F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| raw.trim().parse::<T>())
        .transpose()
        .map_err(|err| ConfigError::Invalid {
            key,
            reason: err.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[tokio::test]
    async fn load_config_file_missing_returns_default() {
        let tmp = TempDir::new().unwrap();
        let file = load_config_file(&tmp.path().join("config.toml")).await.unwrap();
        assert!(file.telegram.bot_token.is_none());
        assert_eq!(file.http.port, 8080);
    }

    #[tokio::test]
    async fn load_config_file_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        tokio::fs::write(
            &path,
            r#"
[telegram]
bot_token = "123:file"

[ledger]
rpc_url = "https://api.devnet.solana.com"
cluster = "devnet"

[session]
idle_timeout_secs = 900
"#,
        )
        .await
        .unwrap();

        let file = load_config_file(&path).await.unwrap();
        assert_eq!(file.telegram.bot_token.as_deref(), Some("123:file"));
        assert_eq!(file.ledger.cluster, "devnet");
        assert_eq!(file.session.idle_timeout_secs, Some(900));
    }

    #[tokio::test]
    async fn load_config_file_malformed_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        tokio::fs::write(&path, "[ledger\nrpc_url = ").await.unwrap();

        let err = load_config_file(&path).await.unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "config.toml", .. }));
    }

    #[test]
    fn resolve_without_env_keeps_file_values() {
        let config = resolve(ConfigFile::default(), env(&[])).unwrap();
        assert!(config.telegram.bot_token.is_none());
        assert!(config.pinning.api_key.is_none());
        assert!(config.ideas.openai_api_key.is_none());
        assert_eq!(config.ledger.cluster, "mainnet");
        assert!(config.session.idle_timeout_secs.is_none());
    }

    #[test]
    fn resolve_env_overrides_file() {
        let mut file = ConfigFile::default();
        file.telegram.bot_token = Some("123:file".to_string());

        let config = resolve(
            file,
            env(&[
                ("BOT_TOKEN", "123:env"),
                ("NFT_STORAGE_API_KEY", "pin-key"),
                ("SOLANA_RPC_URL", "http://localhost:8899"),
                ("SOLANA_CLUSTER", "devnet"),
                ("OPENAI_MODEL", "gpt-4.1-mini"),
                ("SESSION_IDLE_TIMEOUT_SECS", "600"),
                ("MINTBOT_HTTP_PORT", "9090"),
                ("MINTBOT_HTTP_API_KEY", "http-key"),
            ]),
        )
        .unwrap();

        assert_eq!(
            config.telegram.bot_token.as_ref().unwrap().expose_secret(),
            "123:env"
        );
        assert_eq!(config.pinning.api_key.as_ref().unwrap().expose_secret(), "pin-key");
        assert_eq!(config.ledger.rpc_url, "http://localhost:8899");
        assert_eq!(config.ledger.cluster, "devnet");
        assert_eq!(config.ideas.model, "gpt-4.1-mini");
        assert_eq!(config.session.idle_timeout_secs, Some(600));
        assert_eq!(config.http.port, 9090);
        assert_eq!(config.http.api_key.as_ref().unwrap().expose_secret(), "http-key");
    }

    #[test]
    fn resolve_blank_env_counts_as_unset() {
        let mut file = ConfigFile::default();
        file.pinning.api_key = Some("from-file".to_string());

        let config = resolve(file, env(&[("NFT_STORAGE_API_KEY", "  ")])).unwrap();
        assert_eq!(
            config.pinning.api_key.as_ref().unwrap().expose_secret(),
            "from-file"
        );
    }

    #[test]
    fn resolve_rejects_unparseable_numbers() {
        let err = resolve(ConfigFile::default(), env(&[("MINTBOT_HTTP_PORT", "http")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "MINTBOT_HTTP_PORT", .. }));
    }

    #[test]
    fn resolve_rejects_zero_idle_timeout() {
        let err = resolve(
            ConfigFile::default(),
            env(&[("SESSION_IDLE_TIMEOUT_SECS", "0")]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }
}
