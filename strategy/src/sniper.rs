//! Tiered fee schedule for the sniper heuristic.
//!
//! A tier covers `(lower_exclusive, upper_inclusive]` lamports of observed SOL
//! movement. The priority fee is a percentage of that movement, computed in
//! arbitrary precision and narrowed to `u64` only at the end.

use num_bigint::BigUint;
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};

use sniper_core::{ComputeBudget, RelayKind, RelayRoute};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SniperTier {
    pub lower_exclusive: u64,
    /// `None` means unbounded
    #[serde(default)]
    pub upper_inclusive: Option<u64>,
    /// Priority fee as a percentage of the triggering SOL amount
    pub fee_percent: u32,
    pub tip_lamports: u64,
    pub min_amount_out: u64,
    pub relay: RelayKind,
    #[serde(default)]
    pub privileged: bool,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl SniperTier {
    pub fn contains(&self, amount: &BigUint) -> bool {
        if *amount <= BigUint::from(self.lower_exclusive) {
            return false;
        }
        match self.upper_inclusive {
            Some(upper) => *amount <= BigUint::from(upper),
            None => true,
        }
    }

    /// Micro-lamports per compute unit for a trigger of `amount` lamports.
    pub fn priority_fee(&self, amount: &BigUint) -> Option<u64> {
        (amount * BigUint::from(self.fee_percent) / BigUint::from(100u32)).to_u64()
    }

    pub fn compute_budget(&self, amount: &BigUint, units: u32) -> Option<ComputeBudget> {
        Some(ComputeBudget {
            micro_lamports: self.priority_fee(amount)?,
            units,
            tip_lamports: self.tip_lamports,
        })
    }

    pub fn route(&self) -> RelayRoute {
        RelayRoute::new(self.relay, self.privileged)
    }
}

/// Two live tiers on bloXroute's staked path, plus a reserved Jito tier for
/// large triggers that stays disabled until it is calibrated.
pub fn default_tiers() -> Vec<SniperTier> {
    vec![
        SniperTier {
            lower_exclusive: 5_000_000,
            upper_inclusive: Some(30_000_000),
            fee_percent: 77,
            tip_lamports: 1_000_000,
            min_amount_out: 400_000,
            relay: RelayKind::Bloxroute,
            privileged: true,
            enabled: true,
        },
        SniperTier {
            lower_exclusive: 30_000_000,
            upper_inclusive: Some(50_000_000),
            fee_percent: 57,
            tip_lamports: 1_000_000,
            min_amount_out: 400_000,
            relay: RelayKind::Bloxroute,
            privileged: true,
            enabled: true,
        },
        SniperTier {
            lower_exclusive: 50_000_000,
            upper_inclusive: None,
            fee_percent: 0,
            tip_lamports: 0,
            min_amount_out: 0,
            relay: RelayKind::Jito,
            privileged: true,
            enabled: false,
        },
    ]
}

/// First tier containing `amount`, enabled or not.
pub fn find_tier<'a>(tiers: &'a [SniperTier], amount: &BigUint) -> Option<&'a SniperTier> {
    tiers.iter().find(|t| t.contains(amount))
}
