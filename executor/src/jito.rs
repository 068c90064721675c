use anyhow::Result;
use rand::seq::SliceRandom;
use serde::Deserialize;
use serde_json::{json, Value};
use solana_sdk::{pubkey::Pubkey, transaction::Transaction};
use std::time::Duration;
use tracing::debug;

use sniper_core::RelayKind;
use strategy::ports::Relay;

use crate::error::RelayError;

/// Official Jito tip accounts
pub const JITO_TIP_ACCOUNTS: [Pubkey; 8] = [
    solana_sdk::pubkey!("96gYZGLnJYVFmbjzopPSU6QiEV5fGqZNyN9nmNhvrZU5"),
    solana_sdk::pubkey!("HFqU5x63VTqvQss8hp11i4wVV8bD44PuyAC8eF6S7yBz"),
    solana_sdk::pubkey!("Cw8CFyM9FkoMi7K7Crf6HNQqf4uEMzpKw6QNghXLvLkY"),
    solana_sdk::pubkey!("ADaUMid9yfUytqMBgopwjb2DTLSokTSzL1zt6iGPaS49"),
    solana_sdk::pubkey!("DfXygSm4jCyNCybVYYK6DwvWqjKee8pbDmJGcLWNDXjh"),
    solana_sdk::pubkey!("ADuUkR4vqLUMWXxW9gh6D6L8pMSawimctcNZ5pGwDcEt"),
    solana_sdk::pubkey!("DttWaMuVvTiduZRnguLF7jNxTgiMBZ1hyAumKUiL2KRL"),
    solana_sdk::pubkey!("3AVi9Tg9Uo68tJfuvoKvqKNWKkC5wPdSSdeBnizKZ6jT"),
];

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

/// Jito block engine over its JSON-RPC HTTP API. The privileged path sends a
/// single-transaction bundle instead of a plain transaction.
pub struct JitoRelay {
    http: reqwest::Client,
    block_engine_url: String,
}

impl JitoRelay {
    pub fn new(block_engine_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            block_engine_url: block_engine_url.trim_end_matches('/').to_string(),
        })
    }

    /// Endpoint URL and JSON-RPC body for a submission.
    pub fn request(&self, tx: &Transaction, as_bundle: bool) -> Result<(String, Value), RelayError> {
        let encoded = bs58::encode(bincode::serialize(tx)?).into_string();
        Ok(if as_bundle {
            (
                format!("{}/api/v1/bundles", self.block_engine_url),
                json!({ "jsonrpc": "2.0", "id": 1, "method": "sendBundle", "params": [[encoded]] }),
            )
        } else {
            (
                format!("{}/api/v1/transactions", self.block_engine_url),
                json!({ "jsonrpc": "2.0", "id": 1, "method": "sendTransaction", "params": [encoded] }),
            )
        })
    }

    async fn send(&self, tx: &Transaction, as_bundle: bool) -> Result<String, RelayError> {
        let (url, body) = self.request(tx, as_bundle)?;
        let response: JsonRpcResponse = self.http.post(&url).json(&body).send().await?.json().await?;

        if let Some(error) = response.error {
            return Err(RelayError::Rejected {
                code: error.code,
                message: error.message,
            });
        }
        let id = response.result.ok_or(RelayError::MissingSignature)?;
        debug!("Jito accepted {} ({})", id, if as_bundle { "bundle" } else { "transaction" });
        Ok(id)
    }
}

#[async_trait::async_trait]
impl Relay for JitoRelay {
    fn kind(&self) -> RelayKind {
        RelayKind::Jito
    }

    fn tip_account(&self) -> Option<Pubkey> {
        JITO_TIP_ACCOUNTS.choose(&mut rand::thread_rng()).copied()
    }

    async fn submit(&self, tx: &Transaction, privileged: bool) -> Result<String> {
        Ok(self.send(tx, privileged).await?)
    }
}
