use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use sniper_core::constants::{OPENBOOK_PROGRAM, RAYDIUM_V4_PROGRAM};
use sniper_core::instruction::decode;
use sniper_core::telemetry::{DECODE_ERRORS, RESOLVE_ERRORS};
use sniper_core::{AmmInstruction, IntentOrigin, RawEvent, RawInstruction, RelayRoute, Side, TradeIntent};

use crate::blockhash::LatestBlockhash;
use crate::config::StrategyConfig;
use crate::decision::TradeDecisionEngine;
use crate::ports::{LookupTableProvider, PoolKeyProvider};
use crate::sink::IntentSink;
use crate::tracker::{TrackerStatus, TrackerStore};

// Account positions inside Raydium instructions
const INITIALIZE2_AMM_POSITION: usize = 4;
const WITHDRAW_AMM_POSITION: usize = 1;
const SWAP_AMM_POSITION: usize = 1;
const SWAP_MARKET_PROGRAM_POSITION: usize = 7;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("instruction has no account at position {position} (has {len})")]
    MissingPosition { position: usize, len: usize },
    #[error("account index {0} is past the static and loaded keys")]
    OutOfRange(usize),
    #[error("invalid account key {0}")]
    InvalidKey(String),
    #[error("lookup table {table}: {reason}")]
    LookupTable { table: String, reason: String },
}

/// Source, destination and signer of a SwapBaseIn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapParticipants {
    pub source: Pubkey,
    pub destination: Pubkey,
    pub signer: Pubkey,
}

/// Per-event decode → track → decide pipeline shared by every worker.
pub struct EventPipeline {
    config: Arc<StrategyConfig>,
    blockhash: Arc<LatestBlockhash>,
    tracker: TrackerStore,
    decision: TradeDecisionEngine,
    pools: Arc<dyn PoolKeyProvider>,
    lookup_tables: Arc<dyn LookupTableProvider>,
    sink: IntentSink,
}

impl EventPipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Arc<StrategyConfig>,
        blockhash: Arc<LatestBlockhash>,
        tracker: TrackerStore,
        decision: TradeDecisionEngine,
        pools: Arc<dyn PoolKeyProvider>,
        lookup_tables: Arc<dyn LookupTableProvider>,
        sink: IntentSink,
    ) -> Self {
        Self {
            config,
            blockhash,
            tracker,
            decision,
            pools,
            lookup_tables,
            sink,
        }
    }

    pub async fn process_event(&self, event: &RawEvent) {
        if !event.recent_blockhash.is_empty() && !self.blockhash.update(&event.recent_blockhash) {
            debug!("{} | unparseable recent blockhash", event.signature);
        }

        for ix in &event.instructions {
            let Some(program_id) = event
                .account_keys
                .get(ix.program_id_index as usize)
                .and_then(|k| Pubkey::from_str(k).ok())
            else {
                continue;
            };
            if program_id != RAYDIUM_V4_PROGRAM {
                continue;
            }

            let decoded = match decode(&program_id, &ix.data) {
                Ok(decoded) => decoded,
                Err(e) => {
                    DECODE_ERRORS.inc();
                    debug!("{} | skipping instruction: {}", event.signature, e);
                    continue;
                }
            };

            match decoded {
                AmmInstruction::Initialize2 { .. } => {
                    info!("🆕 Initialize2 | {} | {}", event.source, event.signature);
                    self.on_initialize2(event, ix).await;
                }
                AmmInstruction::Withdraw { .. } => {
                    info!("💧 Withdraw | {} | {}", event.source, event.signature);
                    self.on_withdraw(event, ix).await;
                }
                AmmInstruction::SwapBaseIn { .. } => self.on_swap_base_in(event, ix).await,
                AmmInstruction::SwapBaseOut { .. } => {}
                AmmInstruction::Unknown { tag } => {
                    debug!("{} | unhandled AMM instruction tag {}", event.signature, tag)
                }
            }
        }
    }

    /// Pubkey of the account at `position` in `ix`, following address lookup
    /// tables for indexes past the static keys.
    pub async fn resolve_account(
        &self,
        event: &RawEvent,
        ix: &RawInstruction,
        position: usize,
    ) -> Result<Pubkey, ResolveError> {
        let index = *ix.accounts.get(position).ok_or(ResolveError::MissingPosition {
            position,
            len: ix.accounts.len(),
        })? as usize;

        if let Some(key) = event.account_keys.get(index) {
            return Pubkey::from_str(key).map_err(|_| ResolveError::InvalidKey(key.clone()));
        }

        // Loaded addresses: every table's writable indexes, then every table's readonly ones
        let loaded_index = index - event.account_keys.len();
        let (table, table_index) = event
            .address_table_lookups
            .iter()
            .flat_map(|l| l.writable_indexes.iter().map(move |i| (&l.account_key, *i)))
            .chain(
                event
                    .address_table_lookups
                    .iter()
                    .flat_map(|l| l.readonly_indexes.iter().map(move |i| (&l.account_key, *i))),
            )
            .nth(loaded_index)
            .ok_or(ResolveError::OutOfRange(index))?;

        let table_key = Pubkey::from_str(table).map_err(|_| ResolveError::InvalidKey(table.clone()))?;
        let addresses = self
            .lookup_tables
            .addresses(&table_key)
            .await
            .map_err(|e| ResolveError::LookupTable {
                table: table.clone(),
                reason: e.to_string(),
            })?;

        addresses
            .get(table_index as usize)
            .copied()
            .ok_or(ResolveError::OutOfRange(index))
    }

    async fn resolve_or_skip(&self, event: &RawEvent, ix: &RawInstruction, position: usize) -> Option<Pubkey> {
        match self.resolve_account(event, ix, position).await {
            Ok(key) => Some(key),
            Err(e) => {
                RESOLVE_ERRORS.inc();
                warn!("⚠️ {} | account {}: {}", event.signature, position, e);
                None
            }
        }
    }

    async fn on_initialize2(&self, event: &RawEvent, ix: &RawInstruction) {
        let Some(amm_id) = self.resolve_or_skip(event, ix, INITIALIZE2_AMM_POSITION).await else {
            return;
        };

        match self.tracker.pause(&amm_id) {
            Ok(true) => info!("⏸️ {} | Paused because of initialize2", amm_id),
            Ok(false) => {}
            Err(e) => warn!("⚠️ {} | {} | pause failed: {}", amm_id, event.signature, e),
        }
    }

    async fn on_withdraw(&self, event: &RawEvent, ix: &RawInstruction) {
        let Some(amm_id) = self.resolve_or_skip(event, ix, WITHDRAW_AMM_POSITION).await else {
            return;
        };

        let keys = match self.pools.pool_keys(&amm_id).await {
            Ok(keys) => keys,
            Err(e) => {
                warn!("⚠️ {} | {} | pool keys unavailable: {}", amm_id, event.signature, e);
                return;
            }
        };

        // Let the withdrawal settle before re-reading liquidity
        tokio::time::sleep(self.config.buy_delay).await;

        let reserve = match self.pools.sol_reserve(&keys).await {
            Ok(reserve) => reserve,
            Err(e) => {
                warn!("⚠️ {} | {} | reserve unavailable: {}", amm_id, event.signature, e);
                return;
            }
        };

        if reserve < self.config.withdraw_reserve_threshold {
            match self.tracker.status(&amm_id) {
                Ok(TrackerStatus::Paused) => {
                    if let Err(e) = self.tracker.unpause(&amm_id) {
                        warn!("⚠️ {} | unpause failed: {}", amm_id, e);
                    } else {
                        info!("▶️ {} | UNPAUSED tracking (reserve {} lamports)", amm_id, reserve);
                    }
                    return;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("⚠️ {} | {} | tracker read failed: {}", amm_id, event.signature, e);
                    return;
                }
            }
        }

        self.sink.emit(TradeIntent {
            origin: IntentOrigin::WithdrawEntry,
            pool_keys: keys,
            side: Side::Buy,
            amount: self.config.buy_amount_lamports,
            min_amount_out: 0,
            compute: self.config.withdraw_compute,
            routes: vec![RelayRoute::new(self.config.buy_relay, false)],
            trigger: Some(event.signature.clone()),
        });
    }

    /// Positions shift by one when the swap carries the OpenBook program account.
    async fn swap_participants(&self, event: &RawEvent, ix: &RawInstruction) -> Option<SwapParticipants> {
        let market_program = self.resolve_or_skip(event, ix, SWAP_MARKET_PROGRAM_POSITION).await?;
        let (source, destination, signer) = if market_program == OPENBOOK_PROGRAM {
            (15, 16, 17)
        } else {
            (14, 15, 16)
        };

        if signer >= ix.accounts.len() {
            warn!("⚠️ {} | invalid account count ({})", event.signature, ix.accounts.len());
            return None;
        }

        Some(SwapParticipants {
            source: self.resolve_or_skip(event, ix, source).await?,
            destination: self.resolve_or_skip(event, ix, destination).await?,
            signer: self.resolve_or_skip(event, ix, signer).await?,
        })
    }

    async fn on_swap_base_in(&self, event: &RawEvent, ix: &RawInstruction) {
        let Some(amm_id) = self.resolve_or_skip(event, ix, SWAP_AMM_POSITION).await else {
            return;
        };
        let Some(participants) = self.swap_participants(event, ix).await else {
            return;
        };

        let keys = match self.pools.pool_keys(&amm_id).await {
            Ok(keys) => keys,
            Err(e) => {
                debug!("{} | {} | pool keys unavailable: {}", amm_id, event.signature, e);
                return;
            }
        };

        debug!(
            "{} | swap {} -> {} by {}",
            amm_id, participants.source, participants.destination, participants.signer
        );
        self.decision.on_swap(&keys, &participants.signer, event);
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod pipeline_tests;
