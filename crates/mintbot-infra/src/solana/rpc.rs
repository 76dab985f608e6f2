//! Minimal Solana JSON-RPC client over reqwest.
//!
//! Every call uses `confirmed` commitment. Transactions are submitted as
//! base64 and polled with `getSignatureStatuses` until confirmed, rejected,
//! or the confirmation timeout elapses.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use mintbot_types::error::LedgerError;

use super::pubkey::Pubkey;
use super::transaction::Transaction;

const COMMITMENT: &str = "confirmed";
const POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// Responses wrapped in `{ context, value }`.
#[derive(Debug, Deserialize)]
struct WithContext<T> {
    value: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LatestBlockhash {
    blockhash: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureStatus {
    pub confirmation_status: Option<String>,
    pub err: Option<Value>,
}

pub struct RpcClient {
    client: reqwest::Client,
    url: String,
    confirm_timeout: Duration,
}

impl RpcClient {
    pub fn new(url: impl Into<String>, confirm_timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to create reqwest client");

        Self {
            client,
            url: url.into(),
            confirm_timeout,
        }
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, LedgerError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method,
            params,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| LedgerError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LedgerError::Transport(format!("HTTP {status}: {body}")));
        }

        let parsed: JsonRpcResponse<T> = response
            .json()
            .await
            .map_err(|e| LedgerError::Rpc(format!("{method}: malformed response: {e}")))?;

        if let Some(error) = parsed.error {
            return Err(LedgerError::Rpc(format!(
                "{method}: {} ({})",
                error.message, error.code
            )));
        }
        parsed
            .result
            .ok_or_else(|| LedgerError::Rpc(format!("{method}: empty result")))
    }

    pub async fn latest_blockhash(&self) -> Result<[u8; 32], LedgerError> {
        let response: WithContext<LatestBlockhash> = self
            .call("getLatestBlockhash", json!([{ "commitment": COMMITMENT }]))
            .await?;
        let blockhash = Pubkey::from_base58(&response.value.blockhash)
            .map_err(|_| LedgerError::Rpc("getLatestBlockhash: malformed blockhash".to_string()))?;
        Ok(blockhash.0)
    }

    pub async fn minimum_balance_for_rent_exemption(&self, size: u64) -> Result<u64, LedgerError> {
        self.call("getMinimumBalanceForRentExemption", json!([size]))
            .await
    }

    pub async fn account_exists(&self, address: &Pubkey) -> Result<bool, LedgerError> {
        let response: WithContext<Option<Value>> = self
            .call(
                "getAccountInfo",
                json!([address.to_base58(), { "encoding": "base64", "commitment": COMMITMENT }]),
            )
            .await?;
        Ok(response.value.is_some())
    }

    /// Submit `tx` and wait until it is confirmed. Returns the signature.
    pub async fn send_and_confirm(&self, tx: &Transaction) -> Result<String, LedgerError> {
        let encoded = STANDARD.encode(tx.serialize());
        let signature: String = self
            .call(
                "sendTransaction",
                json!([encoded, { "encoding": "base64", "preflightCommitment": COMMITMENT }]),
            )
            .await
            .map_err(|e| match e {
                LedgerError::Rpc(message) => LedgerError::Rejected(message),
                other => other,
            })?;
        tracing::debug!(signature = %signature, "transaction submitted");

        self.confirm(&signature).await?;
        tracing::debug!(signature = %signature, "transaction confirmed");
        Ok(signature)
    }

    async fn confirm(&self, signature: &str) -> Result<(), LedgerError> {
        let deadline = tokio::time::Instant::now() + self.confirm_timeout;
        loop {
            let response: WithContext<Vec<Option<SignatureStatus>>> = self
                .call(
                    "getSignatureStatuses",
                    json!([[signature], { "searchTransactionHistory": true }]),
                )
                .await?;

            if let Some(Some(status)) = response.value.into_iter().next() {
                if let Some(done) = confirmation(&status) {
                    return done.map_err(|reason| {
                        LedgerError::Rejected(format!("{signature}: {reason}"))
                    });
                }
            }

            if tokio::time::Instant::now() >= deadline {
                return Err(LedgerError::ConfirmationTimeout(signature.to_string()));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

/// `Some(Ok)` once confirmed, `Some(Err)` if the transaction failed, `None`
/// while still pending.
fn confirmation(status: &SignatureStatus) -> Option<Result<(), String>> {
    if let Some(err) = &status.err {
        return Some(Err(err.to_string()));
    }
    match status.confirmation_status.as_deref() {
        Some("confirmed" | "finalized") => Some(Ok(())),
        _ => None,
    }
}
