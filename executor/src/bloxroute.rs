use anyhow::Result;
use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;
use serde_json::{json, Value};
use solana_sdk::{pubkey::Pubkey, transaction::Transaction};
use std::time::Duration;
use tracing::debug;

use sniper_core::constants::BLOXROUTE_TIP_ACCOUNT;
use sniper_core::RelayKind;
use strategy::ports::Relay;

use crate::error::RelayError;

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    #[serde(default)]
    signature: String,
}

/// bloXroute trader API. The privileged path routes through staked RPCs.
pub struct BloxrouteRelay {
    http: reqwest::Client,
    url: String,
    auth_header: String,
}

impl BloxrouteRelay {
    pub fn new(url: &str, auth_header: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            url: url.to_string(),
            auth_header: auth_header.to_string(),
        })
    }

    pub fn request_body(tx: &Transaction, use_staked_rpcs: bool) -> Result<Value, RelayError> {
        let raw = bincode::serialize(tx)?;
        Ok(json!({
            "transaction": { "content": general_purpose::STANDARD.encode(raw) },
            "skipPreFlight": true,
            "frontRunningProtection": false,
            "useStakedRPCs": use_staked_rpcs,
        }))
    }

    async fn send(&self, tx: &Transaction, use_staked_rpcs: bool) -> Result<String, RelayError> {
        let body = Self::request_body(tx, use_staked_rpcs)?;
        let response: SubmitResponse = self
            .http
            .post(&self.url)
            .header("Authorization", &self.auth_header)
            .json(&body)
            .send()
            .await?
            .json()
            .await?;

        if response.signature.is_empty() {
            return Err(RelayError::MissingSignature);
        }
        debug!("bloXroute accepted {}", response.signature);
        Ok(response.signature)
    }
}

#[async_trait::async_trait]
impl Relay for BloxrouteRelay {
    fn kind(&self) -> RelayKind {
        RelayKind::Bloxroute
    }

    fn tip_account(&self) -> Option<Pubkey> {
        Some(BLOXROUTE_TIP_ACCOUNT)
    }

    async fn submit(&self, tx: &Transaction, privileged: bool) -> Result<String> {
        Ok(self.send(tx, privileged).await?)
    }
}
