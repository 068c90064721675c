//! In-memory ports and event builders shared by the strategy tests.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use solana_sdk::pubkey::Pubkey;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use sniper_core::constants::{OPENBOOK_PROGRAM, RAYDIUM_AMM_AUTHORITY, RAYDIUM_V4_PROGRAM, WSOL_MINT};
use sniper_core::{AddressTableLookup, RaydiumPoolKeys, RawEvent, RawInstruction, TokenBalance};

use crate::ports::{LookupTableProvider, PoolKeyProvider, PoolWatcher};

pub const TOKEN_VAULT_START: i64 = 1_000_000_000_000;
pub const SOL_VAULT_START: i64 = 50_000_000_000;

#[derive(Default)]
pub struct MockPools {
    pub keys: DashMap<Pubkey, RaydiumPoolKeys>,
    pub reserves: DashMap<Pubkey, u64>,
}

impl MockPools {
    pub fn with_pool(self, keys: RaydiumPoolKeys, reserve: u64) -> Self {
        self.reserves.insert(keys.amm_id, reserve);
        self.keys.insert(keys.amm_id, keys);
        self
    }
}

#[async_trait]
impl PoolKeyProvider for MockPools {
    async fn pool_keys(&self, amm_id: &Pubkey) -> Result<RaydiumPoolKeys> {
        self.keys
            .get(amm_id)
            .map(|k| k.value().clone())
            .ok_or_else(|| anyhow!("unknown pool {}", amm_id))
    }

    async fn sol_reserve(&self, keys: &RaydiumPoolKeys) -> Result<u64> {
        self.reserves
            .get(&keys.amm_id)
            .map(|r| *r)
            .ok_or_else(|| anyhow!("no reserve for {}", keys.amm_id))
    }
}

#[derive(Default)]
pub struct MockLookupTables {
    pub tables: DashMap<Pubkey, Arc<Vec<Pubkey>>>,
    pub fetches: AtomicUsize,
}

#[async_trait]
impl LookupTableProvider for MockLookupTables {
    async fn addresses(&self, table: &Pubkey) -> Result<Arc<Vec<Pubkey>>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.tables
            .get(table)
            .map(|t| Arc::clone(&t))
            .ok_or_else(|| anyhow!("unknown table {}", table))
    }
}

#[derive(Default)]
pub struct RecordingWatcher {
    pub watched: Mutex<Vec<Pubkey>>,
}

impl PoolWatcher for RecordingWatcher {
    fn watch_pool(&self, amm_id: Pubkey) {
        self.watched.lock().push(amm_id);
    }
}

fn vault_balance(index: u32, mint: &Pubkey, amount: i64) -> TokenBalance {
    TokenBalance {
        account_index: index,
        mint: mint.to_string(),
        owner: RAYDIUM_AMM_AUTHORITY.to_string(),
        amount: amount.to_string(),
    }
}

fn swap_data(amount_in: u64, min_out: u64) -> Vec<u8> {
    let mut data = vec![9u8];
    data.extend_from_slice(&amount_in.to_le_bytes());
    data.extend_from_slice(&min_out.to_le_bytes());
    data
}

fn event(signature: &str, account_keys: Vec<Pubkey>, ix: RawInstruction) -> RawEvent {
    RawEvent {
        signature: signature.to_string(),
        recent_blockhash: solana_sdk::hash::Hash::new_unique().to_string(),
        slot: 250_000_000,
        source: "test".to_string(),
        account_keys: account_keys.iter().map(|k| k.to_string()).collect(),
        instructions: vec![ix],
        ..Default::default()
    }
}

/// A SwapBaseIn routed through OpenBook. Deltas are from the pool's side:
/// a buy is `token_delta < 0, sol_delta > 0`.
pub fn swap_event(keys: &RaydiumPoolKeys, signer: &Pubkey, token_delta: i64, sol_delta: i64) -> RawEvent {
    let account_keys = vec![
        spl_token_program(),
        keys.amm_id,
        keys.amm_authority,
        keys.amm_open_orders,
        keys.amm_target_orders,
        keys.coin_vault,
        keys.pc_vault,
        OPENBOOK_PROGRAM,
        keys.serum_market,
        keys.serum_bids,
        keys.serum_asks,
        keys.serum_event_queue,
        keys.serum_coin_vault,
        keys.serum_pc_vault,
        keys.serum_vault_signer,
        Pubkey::new_unique(),
        Pubkey::new_unique(),
        *signer,
        RAYDIUM_V4_PROGRAM,
    ];
    let ix = RawInstruction {
        program_id_index: 18,
        accounts: (0u8..18).collect(),
        data: swap_data(1_000_000, 0),
    };

    let mut event = event(&format!("swap-{}", Pubkey::new_unique()), account_keys, ix);
    let token_mint = keys.token_mint();
    event.pre_token_balances = vec![
        vault_balance(5, &token_mint, TOKEN_VAULT_START),
        vault_balance(6, &WSOL_MINT, SOL_VAULT_START),
    ];
    event.post_token_balances = vec![
        vault_balance(5, &token_mint, TOKEN_VAULT_START + token_delta),
        vault_balance(6, &WSOL_MINT, SOL_VAULT_START + sol_delta),
    ];
    event
}

/// SwapBaseIn whose pool id (position 1) is loaded through an address lookup table.
pub fn swap_event_via_lookup(table: &Pubkey, table_index: u8, signer: &Pubkey) -> RawEvent {
    let account_keys = vec![*signer, RAYDIUM_V4_PROGRAM];
    let mut accounts = vec![0u8; 18];
    // Index 2 is the first loaded address after the two static keys
    accounts[1] = 2;
    let ix = RawInstruction {
        program_id_index: 1,
        accounts,
        data: swap_data(1, 0),
    };
    let mut event = event("lookup-swap", account_keys, ix);
    event.address_table_lookups = vec![AddressTableLookup {
        account_key: table.to_string(),
        writable_indexes: vec![table_index],
        readonly_indexes: vec![],
    }];
    event
}

pub fn withdraw_event(amm_id: &Pubkey) -> RawEvent {
    let account_keys = vec![spl_token_program(), *amm_id, RAYDIUM_V4_PROGRAM];
    let mut data = vec![4u8];
    data.extend_from_slice(&1_000u64.to_le_bytes());
    let ix = RawInstruction {
        program_id_index: 2,
        accounts: vec![0, 1, 0, 0],
        data,
    };
    event(&format!("withdraw-{}", amm_id), account_keys, ix)
}

pub fn initialize2_event(amm_id: &Pubkey) -> RawEvent {
    let account_keys = vec![spl_token_program(), *amm_id, RAYDIUM_V4_PROGRAM];
    let mut data = vec![1u8, 254];
    data.extend_from_slice(&1_700_000_000u64.to_le_bytes());
    data.extend_from_slice(&5_000_000_000u64.to_le_bytes());
    data.extend_from_slice(&1_000_000_000u64.to_le_bytes());
    let ix = RawInstruction {
        program_id_index: 2,
        accounts: vec![0, 0, 0, 0, 1],
        data,
    };
    event(&format!("init-{}", amm_id), account_keys, ix)
}

fn spl_token_program() -> Pubkey {
    solana_sdk::pubkey!("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA")
}
