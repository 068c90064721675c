pub mod balance;
pub mod event;
pub mod instruction;
pub mod intent;
pub mod raydium;
pub mod telemetry;

pub use event::{AddressTableLookup, RawEvent, RawInstruction, TokenBalance};
pub use instruction::{AmmInstruction, DecodeError};
pub use intent::{ComputeBudget, IntentOrigin, RelayKind, RelayRoute, Side, TradeIntent};
pub use raydium::RaydiumPoolKeys;

pub mod constants {
    use solana_sdk::pubkey::Pubkey;

    pub const RAYDIUM_V4_PROGRAM: Pubkey = solana_sdk::pubkey!("675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8");

    /// PDA of `[b"amm authority"]` under the AMM program; owns every pool vault.
    pub const RAYDIUM_AMM_AUTHORITY: Pubkey = solana_sdk::pubkey!("5Q544fKrFoe6tsEbD7S8EmxGTJYAKtTVhAW5Q5pge4j1");

    pub const OPENBOOK_PROGRAM: Pubkey = solana_sdk::pubkey!("srmqPvymJeFKQ4zGQed1GFppgkRHL9kaELCbyksJtPX");

    pub const WSOL_MINT: Pubkey = solana_sdk::pubkey!("So11111111111111111111111111111111111111112");

    pub const BLOXROUTE_TIP_ACCOUNT: Pubkey = solana_sdk::pubkey!("HWEoBxYs7ssKuudEjzjmpfJVX7Dvi7wescFsVx2L5yoY");
}

/// Current unix time in seconds.
pub fn unix_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}
