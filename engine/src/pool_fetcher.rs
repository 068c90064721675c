use anyhow::{anyhow, Result};
use dashmap::DashMap;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;
use tracing::{debug, info};

use sniper_core::raydium::{AmmInfo, MarketStateV3};
use sniper_core::RaydiumPoolKeys;
use strategy::ports::{LookupTableProvider, PoolKeyProvider};

/// Header preceding the address list in a lookup table account.
const LOOKUP_TABLE_META_SIZE: usize = 56;

/// Decode the addresses stored in an address lookup table account.
pub fn parse_lookup_table(data: &[u8]) -> Result<Vec<Pubkey>> {
    if data.len() < LOOKUP_TABLE_META_SIZE {
        return Err(anyhow!("lookup table data too small: {} bytes", data.len()));
    }
    let body = &data[LOOKUP_TABLE_META_SIZE..];
    if body.len() % 32 != 0 {
        return Err(anyhow!("lookup table body not a multiple of 32: {} bytes", body.len()));
    }
    Ok(body
        .chunks_exact(32)
        .map(|chunk| {
            let mut buf = [0u8; 32];
            buf.copy_from_slice(chunk);
            Pubkey::new_from_array(buf)
        })
        .collect())
}

/// Zero-copy decode of the AMM and market accounts into swap keys.
pub fn decode_pool_keys(amm_id: &Pubkey, amm_data: &[u8], market_data: &[u8]) -> Result<RaydiumPoolKeys> {
    if amm_data.len() < AmmInfo::LEN {
        return Err(anyhow!("{} | account data too small for AmmInfo", amm_id));
    }
    if market_data.len() < MarketStateV3::LEN {
        return Err(anyhow!("{} | market data too small for MarketStateV3", amm_id));
    }
    let amm: &AmmInfo = bytemuck::try_from_bytes(&amm_data[..AmmInfo::LEN])
        .map_err(|e| anyhow!("{} | failed to cast Raydium layout: {}", amm_id, e))?;
    let market: &MarketStateV3 = bytemuck::try_from_bytes(&market_data[..MarketStateV3::LEN])
        .map_err(|e| anyhow!("{} | failed to cast market layout: {}", amm_id, e))?;

    RaydiumPoolKeys::from_accounts(*amm_id, amm, market)
        .ok_or_else(|| anyhow!("{} | cannot derive market vault signer", amm_id))
}

/// RPC-backed pool key and lookup table resolution. Both are immutable once
/// created, so results are cached for the process lifetime.
pub struct RpcPoolFetcher {
    rpc: Arc<RpcClient>,
    keys: DashMap<Pubkey, RaydiumPoolKeys>,
    tables: DashMap<Pubkey, Arc<Vec<Pubkey>>>,
}

impl RpcPoolFetcher {
    pub fn new(rpc: Arc<RpcClient>) -> Self {
        Self {
            rpc,
            keys: DashMap::new(),
            tables: DashMap::new(),
        }
    }
}

#[async_trait::async_trait]
impl PoolKeyProvider for RpcPoolFetcher {
    async fn pool_keys(&self, amm_id: &Pubkey) -> Result<RaydiumPoolKeys> {
        if let Some(keys) = self.keys.get(amm_id) {
            return Ok(keys.value().clone());
        }

        info!("🔍 Fetching full keys for Pool: {}", amm_id);
        let amm_account = self.rpc.get_account(amm_id).await?;
        if amm_account.data.len() < AmmInfo::LEN {
            return Err(anyhow!("{} | account data too small for AmmInfo", amm_id));
        }
        let market_id = bytemuck::from_bytes::<AmmInfo>(&amm_account.data[..AmmInfo::LEN]).market_id();
        let market_account = self.rpc.get_account(&market_id).await?;

        let keys = decode_pool_keys(amm_id, &amm_account.data, &market_account.data)?;
        self.keys.insert(*amm_id, keys.clone());
        Ok(keys)
    }

    async fn sol_reserve(&self, keys: &RaydiumPoolKeys) -> Result<u64> {
        let balance = self.rpc.get_token_account_balance(&keys.sol_vault()).await?;
        let reserve = balance.amount.parse::<u64>()?;
        debug!("{} | SOL reserve {}", keys.amm_id, reserve);
        Ok(reserve)
    }
}

#[async_trait::async_trait]
impl LookupTableProvider for RpcPoolFetcher {
    async fn addresses(&self, table: &Pubkey) -> Result<Arc<Vec<Pubkey>>> {
        if let Some(addresses) = self.tables.get(table) {
            return Ok(Arc::clone(addresses.value()));
        }
        let account = self.rpc.get_account(table).await?;
        let addresses = Arc::new(parse_lookup_table(&account.data)?);
        self.tables.insert(*table, Arc::clone(&addresses));
        Ok(addresses)
    }
}
