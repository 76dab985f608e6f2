//! Trending Solana tokens from the DexScreener search API.

use std::time::Duration;

use serde::Deserialize;

use mintbot_core::idea::MAX_SEEDS;
use mintbot_core::ports::TrendSource;
use mintbot_types::error::IdeaError;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    pairs: Option<Vec<Pair>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Pair {
    base_token: Option<BaseToken>,
}

#[derive(Debug, Deserialize)]
struct BaseToken {
    symbol: Option<String>,
    name: Option<String>,
}

#[derive(Debug)]
pub struct DexScreenerTrends {
    client: reqwest::Client,
    url: String,
}

impl DexScreenerTrends {
    pub fn new(url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("failed to create reqwest client");

        Self {
            client,
            url: url.into(),
        }
    }
}

impl TrendSource for DexScreenerTrends {
    async fn trend_seeds(&self) -> Result<Vec<String>, IdeaError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| IdeaError::Unavailable(e.to_string()))?;

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| IdeaError::Parse(e.to_string()))?;
        Ok(seeds_from(body))
    }
}

/// Base token symbol (or name) of the first pairs, blanks dropped.
fn seeds_from(response: SearchResponse) -> Vec<String> {
    response
        .pairs
        .unwrap_or_default()
        .into_iter()
        .take(MAX_SEEDS)
        .filter_map(|pair| {
            let token = pair.base_token?;
            [token.symbol, token.name]
                .into_iter()
                .flatten()
                .map(|s| s.trim().to_string())
                .find(|s| !s.is_empty())
        })
        .collect()
}
