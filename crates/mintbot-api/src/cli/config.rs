//! `mintbot config` -- show the resolved configuration.
//!
//! Credentials are shown only as their last four characters.

use anyhow::Result;
use console::style;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use mintbot_types::config::MintbotConfig;
use mintbot_types::secret::mask_secret;

#[derive(Debug, Serialize)]
struct ConfigView {
    bot_token: Option<String>,
    telegram_api_base: String,
    pinning_api_key: Option<String>,
    pinning_endpoint: String,
    ipfs_gateway: String,
    solana_rpc_url: String,
    solana_cluster: String,
    confirm_timeout_secs: u64,
    openai_api_key: Option<String>,
    openai_model: String,
    trends_url: String,
    session_idle_timeout_secs: Option<u64>,
    http_bind: String,
    http_api_key: Option<String>,
}

fn masked(secret: &Option<SecretString>) -> Option<String> {
    secret.as_ref().map(|s| mask_secret(s.expose_secret()))
}

impl ConfigView {
    fn new(config: &MintbotConfig) -> Self {
        Self {
            bot_token: masked(&config.telegram.bot_token),
            telegram_api_base: config.telegram.api_base.clone(),
            pinning_api_key: masked(&config.pinning.api_key),
            pinning_endpoint: config.pinning.endpoint.clone(),
            ipfs_gateway: config.pinning.gateway.clone(),
            solana_rpc_url: config.ledger.rpc_url.clone(),
            solana_cluster: config.ledger.cluster.clone(),
            confirm_timeout_secs: config.ledger.confirm_timeout_secs,
            openai_api_key: masked(&config.ideas.openai_api_key),
            openai_model: config.ideas.model.clone(),
            trends_url: config.ideas.trends_url.clone(),
            session_idle_timeout_secs: config.session.idle_timeout_secs,
            http_bind: format!("{}:{}", config.http.host, config.http.port),
            http_api_key: masked(&config.http.api_key),
        }
    }
}

pub fn show_config(config: &MintbotConfig, json: bool) -> Result<()> {
    let view = ConfigView::new(config);

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    let unset = || style("(not set)").dim().to_string();
    let secret = |v: &Option<String>| v.clone().unwrap_or_else(unset);

    println!();
    println!("  {} mintbot v{}", style("⚙").bold(), env!("CARGO_PKG_VERSION"));
    println!();
    println!("  {}", style("Telegram").bold());
    println!("    bot token:      {}", secret(&view.bot_token));
    println!("    api base:       {}", view.telegram_api_base);
    println!("  {}", style("Pinning").bold());
    println!("    api key:        {}", secret(&view.pinning_api_key));
    println!("    endpoint:       {}", view.pinning_endpoint);
    println!("    gateway:        {}", view.ipfs_gateway);
    println!("  {}", style("Solana").bold());
    println!("    rpc url:        {}", view.solana_rpc_url);
    println!("    cluster:        {}", view.solana_cluster);
    println!("    confirm within: {}s", view.confirm_timeout_secs);
    println!("  {}", style("Ideas").bold());
    println!("    openai api key: {}", secret(&view.openai_api_key));
    println!("    model:          {}", view.openai_model);
    println!("    trends url:     {}", view.trends_url);
    println!("  {}", style("Sessions").bold());
    println!(
        "    idle timeout:   {}",
        view.session_idle_timeout_secs
            .map(|s| format!("{s}s"))
            .unwrap_or_else(|| "never".to_string())
    );
    println!("  {}", style("HTTP").bold());
    println!("    bind:           {}", view.http_bind);
    println!("    api key:        {}", secret(&view.http_api_key));
    println!();
    Ok(())
}
