use num_bigint::{BigInt, BigUint, Sign};
use num_traits::ToPrimitive;
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;
use tracing::{debug, info, warn};

use sniper_core::balance::balance_delta;
use sniper_core::constants::{RAYDIUM_AMM_AUTHORITY, WSOL_MINT};
use sniper_core::{IntentOrigin, RaydiumPoolKeys, RawEvent, Side, TradeIntent};

use crate::config::StrategyConfig;
use crate::ledger::{ChunkLedger, LedgerError};
use crate::ports::PoolWatcher;
use crate::sink::IntentSink;
use crate::sniper::find_tier;
use crate::tracker::{TrackerStatus, TrackerStore};

/// Signed balance movement of the pool's vaults in one transaction.
/// Negative `token` means tokens left the pool (someone bought).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolDelta {
    pub token: BigInt,
    pub sol: BigInt,
}

impl PoolDelta {
    pub fn from_event(keys: &RaydiumPoolKeys, event: &RawEvent) -> Result<Self, num_bigint::ParseBigIntError> {
        let owner = RAYDIUM_AMM_AUTHORITY.to_string();
        let token_mint = keys.token_mint().to_string();
        let sol_mint = WSOL_MINT.to_string();
        Ok(Self {
            token: balance_delta(&event.pre_token_balances, &event.post_token_balances, &token_mint, &owner)?,
            sol: balance_delta(&event.pre_token_balances, &event.post_token_balances, &sol_mint, &owner)?,
        })
    }

    pub fn is_buy_pressure(&self) -> bool {
        self.token.sign() == Sign::Minus
    }

    pub fn token_magnitude(&self) -> BigUint {
        self.token.magnitude().clone()
    }

    pub fn sol_magnitude(&self) -> BigUint {
        self.sol.magnitude().clone()
    }
}

/// Turns decoded SwapBaseIn events into tracker/ledger updates and trade intents.
pub struct TradeDecisionEngine {
    config: Arc<StrategyConfig>,
    tracker: TrackerStore,
    ledger: ChunkLedger,
    watcher: Arc<dyn PoolWatcher>,
    sink: IntentSink,
}

impl TradeDecisionEngine {
    pub fn new(
        config: Arc<StrategyConfig>,
        tracker: TrackerStore,
        ledger: ChunkLedger,
        watcher: Arc<dyn PoolWatcher>,
        sink: IntentSink,
    ) -> Self {
        Self {
            config,
            tracker,
            ledger,
            watcher,
            sink,
        }
    }

    pub fn on_swap(&self, keys: &RaydiumPoolKeys, signer: &Pubkey, event: &RawEvent) {
        let pool = keys.amm_id;
        let delta = match PoolDelta::from_event(keys, event) {
            Ok(delta) => delta,
            Err(e) => {
                warn!("⚠️ {} | {} | unreadable token balances: {}", pool, event.signature, e);
                return;
            }
        };

        if *signer == self.config.bot_identity {
            self.on_self_fill(&pool, &delta.token_magnitude(), event);
            return;
        }

        if !delta.is_buy_pressure() {
            return;
        }

        let sol = delta.sol_magnitude();
        self.machine_gun(&pool, &sol, event);
        self.sniper(keys, &sol, event);
    }

    fn on_self_fill(&self, pool: &Pubkey, amount: &BigUint, event: &RawEvent) {
        match self.ledger.get(pool) {
            Ok(None) => match self.ledger.create(pool, amount.clone(), self.config.chunk_splitter) {
                Ok(chunk) => {
                    if let Err(e) = self.tracker.set_status(pool, TrackerStatus::TrackedBoth) {
                        warn!("⚠️ {} | chunk created but tracker update failed: {}", pool, e);
                    }
                    self.watcher.watch_pool(*pool);
                    info!("📌 {} | Tracked | total={} chunk={}", pool, chunk.total, chunk.chunk_size);
                }
                Err(LedgerError::AlreadyExists(_)) => {
                    debug!("{} | lost chunk creation race, applying as debit", pool);
                    if !event.is_failed() {
                        self.debit(pool, amount, event);
                    }
                }
                Err(e) => warn!("⚠️ {} | {} | chunk creation failed: {}", pool, event.signature, e),
            },
            Ok(Some(chunk)) if chunk.is_exhausted() => {
                info!("{} | no tokens remaining, untracking", pool);
                self.untrack(pool);
            }
            Ok(Some(_)) => {
                if !event.is_failed() {
                    self.debit(pool, amount, event);
                }
            }
            Err(e) => warn!("⚠️ {} | {} | chunk read failed: {}", pool, event.signature, e),
        }
    }

    fn debit(&self, pool: &Pubkey, amount: &BigUint, event: &RawEvent) {
        match self.ledger.debit(pool, amount) {
            Ok(chunk) => debug!("{} | debited {} | remaining {}", pool, amount, chunk.remaining),
            Err(e @ LedgerError::Overdraw { .. }) => {
                warn!("⚠️ {} | {} | {}; forcing untrack", pool, event.signature, e);
                self.untrack(pool);
            }
            Err(e) => warn!("⚠️ {} | {} | debit of {} failed: {}", pool, event.signature, amount, e),
        }
    }

    fn untrack(&self, pool: &Pubkey) {
        if let Err(e) = self.tracker.untrack(pool) {
            warn!("⚠️ {} | untrack failed: {}", pool, e);
        }
    }

    /// Large buy pressure from anyone enables batch exits on the pool.
    fn machine_gun(&self, pool: &Pubkey, sol: &BigUint, event: &RawEvent) -> bool {
        if *sol <= BigUint::from(self.config.machine_gun_min_trigger) {
            return false;
        }

        match self.tracker.status(pool) {
            Ok(TrackerStatus::TrackedBoth) => false,
            Ok(_) => match self.tracker.set_status(pool, TrackerStatus::TrackedBoth) {
                Ok(()) => {
                    info!("🔫 {} | {} | Set Burst ({} lamports)", pool, event.source, sol);
                    true
                }
                Err(e) => {
                    warn!("⚠️ {} | {} | burst tracking failed: {}", pool, event.signature, e);
                    false
                }
            },
            Err(e) => {
                warn!("⚠️ {} | {} | tracker read failed: {}", pool, event.signature, e);
                false
            }
        }
    }

    fn sniper(&self, keys: &RaydiumPoolKeys, sol: &BigUint, event: &RawEvent) -> bool {
        let pool = keys.amm_id;
        if *sol <= BigUint::from(self.config.sniper_min_entry) {
            return false;
        }

        info!(
            "👀 {} | {} | Potential entry {} lamports (slot {}) | {}",
            pool, event.source, sol, event.slot, event.signature
        );

        let Some(tier) = find_tier(&self.config.tiers, sol) else {
            debug!("{} | no tier for {} lamports", pool, sol);
            return false;
        };
        if !tier.enabled {
            debug!("{} | {} lamports falls in a reserved tier", pool, sol);
            return false;
        }
        let Some(compute) = tier.compute_budget(sol, self.config.sniper_compute_units) else {
            warn!("⚠️ {} | {} | priority fee for {} lamports overflows", pool, event.signature, sol);
            return false;
        };

        let (side, amount) = match self.ledger.get(&pool) {
            Ok(Some(chunk)) if chunk.is_exhausted() => {
                info!("{} | Juice out", pool);
                return false;
            }
            Ok(Some(chunk)) => {
                let sell = chunk.next_sell();
                match sell.to_u64() {
                    Some(amount) => (Side::Sell, amount),
                    None => {
                        warn!("⚠️ {} | sell size {} does not fit in u64", pool, sell);
                        return false;
                    }
                }
            }
            Ok(None) => (Side::Buy, self.config.buy_amount_lamports),
            Err(e) => {
                warn!("⚠️ {} | {} | chunk read failed: {}", pool, event.signature, e);
                return false;
            }
        };

        self.sink.emit(TradeIntent {
            origin: IntentOrigin::Sniper,
            pool_keys: keys.clone(),
            side,
            amount,
            min_amount_out: tier.min_amount_out,
            compute,
            routes: vec![tier.route()],
            trigger: Some(event.signature.clone()),
        })
    }
}

#[cfg(test)]
#[path = "decision_tests.rs"]
mod decision_tests;
