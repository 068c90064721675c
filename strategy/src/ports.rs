// Port definitions for the collaborators the decision core talks to.
// Concrete adapters live in the executor and engine crates.

use anyhow::Result;
use solana_sdk::{hash::Hash, pubkey::Pubkey, signature::Signature, transaction::Transaction};
use std::sync::Arc;

use sniper_core::{ComputeBudget, RaydiumPoolKeys, RelayKind, Side};

/// Resolves pool keys and live liquidity for a Raydium pool.
#[async_trait::async_trait]
pub trait PoolKeyProvider: Send + Sync {
    async fn pool_keys(&self, amm_id: &Pubkey) -> Result<RaydiumPoolKeys>;

    /// Current wrapped-SOL balance of the pool's SOL vault, in lamports
    async fn sol_reserve(&self, keys: &RaydiumPoolKeys) -> Result<u64>;
}

/// Fetches address lookup table contents for v0 transactions.
#[async_trait::async_trait]
pub trait LookupTableProvider: Send + Sync {
    async fn addresses(&self, table: &Pubkey) -> Result<Arc<Vec<Pubkey>>>;
}

/// Asks the stream client to subscribe to a single pool's transactions.
/// Must not block.
pub trait PoolWatcher: Send + Sync {
    fn watch_pool(&self, amm_id: Pubkey);
}

#[derive(Debug, Clone, Copy)]
pub struct SwapOptions {
    pub recent_blockhash: Hash,
    /// Account that receives `ComputeBudget::tip_lamports`, if any
    pub tip_account: Option<Pubkey>,
}

/// Builds and signs a complete Raydium swap transaction.
pub trait SwapBuilder: Send + Sync {
    #[allow(clippy::too_many_arguments)]
    fn build_swap(
        &self,
        keys: &RaydiumPoolKeys,
        wsol_account: &Pubkey,
        compute: &ComputeBudget,
        options: &SwapOptions,
        amount: u64,
        min_amount_out: u64,
        side: Side,
    ) -> Result<(Vec<Signature>, Transaction)>;

    fn payer(&self) -> Pubkey;
}

/// A transaction submission endpoint.
#[async_trait::async_trait]
pub trait Relay: Send + Sync {
    fn kind(&self) -> RelayKind;

    /// Account the relay expects tips to be paid to
    fn tip_account(&self) -> Option<Pubkey>;

    /// Submit a signed transaction. `privileged` selects the relay's fast path.
    async fn submit(&self, tx: &Transaction, privileged: bool) -> Result<String>;
}
