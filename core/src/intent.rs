use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

use crate::raydium::RaydiumPoolKeys;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

/// Compute-budget parameters attached to every outbound swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ComputeBudget {
    /// Priority fee in micro-lamports per compute unit
    pub micro_lamports: u64,
    pub units: u32,
    /// Flat tip transferred to the relay's tip account, 0 for none
    pub tip_lamports: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelayKind {
    Bloxroute,
    Jito,
    Rpc,
}

impl std::fmt::Display for RelayKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelayKind::Bloxroute => write!(f, "bloxroute"),
            RelayKind::Jito => write!(f, "jito"),
            RelayKind::Rpc => write!(f, "rpc"),
        }
    }
}

impl std::str::FromStr for RelayKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bloxroute" => Ok(RelayKind::Bloxroute),
            "jito" => Ok(RelayKind::Jito),
            "rpc" => Ok(RelayKind::Rpc),
            other => Err(format!("unknown relay: {}", other)),
        }
    }
}

/// Where to send a transaction and whether to use the relay's privileged path
/// (staked RPCs on bloXroute, bundles on Jito).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayRoute {
    pub relay: RelayKind,
    pub privileged: bool,
}

impl RelayRoute {
    pub fn new(relay: RelayKind, privileged: bool) -> Self {
        Self { relay, privileged }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntentOrigin {
    Sniper,
    WithdrawEntry,
    BatchExit,
}

impl std::fmt::Display for IntentOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntentOrigin::Sniper => write!(f, "sniper"),
            IntentOrigin::WithdrawEntry => write!(f, "withdraw_entry"),
            IntentOrigin::BatchExit => write!(f, "batch_exit"),
        }
    }
}

/// A fully parameterized request to build and submit one swap.
#[derive(Debug, Clone)]
pub struct TradeIntent {
    pub origin: IntentOrigin,
    pub pool_keys: RaydiumPoolKeys,
    pub side: Side,
    pub amount: u64,
    pub min_amount_out: u64,
    pub compute: ComputeBudget,
    /// Every route is submitted concurrently; the first one also picks the tip account
    pub routes: Vec<RelayRoute>,
    /// Signature of the event that triggered this intent, if any
    pub trigger: Option<String>,
}

impl TradeIntent {
    pub fn pool(&self) -> Pubkey {
        self.pool_keys.amm_id
    }
}
