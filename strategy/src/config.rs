use solana_sdk::pubkey::Pubkey;
use std::time::Duration;

use sniper_core::{ComputeBudget, RelayKind};

use crate::dedup::DEFAULT_DEDUP_TTL;
use crate::sniper::{default_tiers, SniperTier};
use crate::tracker::DEFAULT_STALE_WINDOW;

pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Static tuning for the decision core. Built once by the binary.
#[derive(Debug, Clone)]
pub struct StrategyConfig {
    /// Signer identity used to recognize our own fills
    pub bot_identity: Pubkey,

    // Heuristic thresholds (lamports of SOL movement)
    pub machine_gun_min_trigger: u64,
    pub sniper_min_entry: u64,
    pub sniper_compute_units: u32,
    pub tiers: Vec<SniperTier>,

    pub chunk_splitter: u32,
    pub stale_window: Duration,
    pub dedup_ttl: Duration,
    /// 0 means two workers per available core
    pub worker_count: usize,

    pub batch_interval: Duration,
    pub batch_compute: ComputeBudget,
    pub batch_min_amount_out: u64,

    pub buy_delay: Duration,
    pub buy_amount_lamports: u64,
    pub buy_relay: RelayKind,
    pub withdraw_reserve_threshold: u64,
    pub withdraw_compute: ComputeBudget,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            bot_identity: Pubkey::default(),
            machine_gun_min_trigger: 100_000_000,
            sniper_min_entry: 10_000_000,
            sniper_compute_units: 45_000,
            tiers: default_tiers(),
            chunk_splitter: 10,
            stale_window: DEFAULT_STALE_WINDOW,
            dedup_ttl: DEFAULT_DEDUP_TTL,
            worker_count: 0,
            batch_interval: Duration::from_millis(2_000),
            batch_compute: ComputeBudget {
                micro_lamports: 1_005,
                units: 45_000,
                tip_lamports: 0,
            },
            batch_min_amount_out: 50_000,
            buy_delay: Duration::from_millis(1_000),
            buy_amount_lamports: 100_000,
            buy_relay: RelayKind::Bloxroute,
            withdraw_reserve_threshold: LAMPORTS_PER_SOL,
            withdraw_compute: ComputeBudget {
                micro_lamports: 500_000,
                units: 85_000,
                tip_lamports: 0,
            },
        }
    }
}

impl StrategyConfig {
    pub fn effective_workers(&self) -> usize {
        if self.worker_count > 0 {
            self.worker_count
        } else {
            num_cpus::get().max(1) * 2
        }
    }
}
