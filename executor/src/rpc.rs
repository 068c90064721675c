//! Plain RPC submission, used as a relay of last resort and as an optional
//! mirror of every submission.

use anyhow::Result;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::RpcSendTransactionConfig;
use solana_sdk::{commitment_config::CommitmentLevel, pubkey::Pubkey, transaction::Transaction};
use std::sync::Arc;
use tracing::info;

use sniper_core::RelayKind;
use strategy::ports::Relay;

use crate::error::RelayError;

pub struct RpcRelay {
    client: Arc<RpcClient>,
}

impl RpcRelay {
    pub fn new(client: Arc<RpcClient>) -> Self {
        Self { client }
    }

    /// Send without preflight or confirmation.
    pub fn send_config() -> RpcSendTransactionConfig {
        RpcSendTransactionConfig {
            skip_preflight: true,
            preflight_commitment: Some(CommitmentLevel::Processed),
            max_retries: Some(0),
            ..RpcSendTransactionConfig::default()
        }
    }

    async fn send(&self, tx: &Transaction) -> Result<String, RelayError> {
        let signature = self
            .client
            .send_transaction_with_config(tx, Self::send_config())
            .await?;
        info!("Transaction sent (no confirmation): {}", signature);
        Ok(signature.to_string())
    }
}

#[async_trait::async_trait]
impl Relay for RpcRelay {
    fn kind(&self) -> RelayKind {
        RelayKind::Rpc
    }

    fn tip_account(&self) -> Option<Pubkey> {
        None
    }

    async fn submit(&self, tx: &Transaction, _privileged: bool) -> Result<String> {
        Ok(self.send(tx).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_config_skips_preflight() {
        let config = RpcRelay::send_config();
        assert!(config.skip_preflight);
        assert_eq!(config.max_retries, Some(0));
    }
}
