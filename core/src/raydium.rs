use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

use crate::constants::{RAYDIUM_AMM_AUTHORITY, WSOL_MINT};

/// Raydium V4 `AmmInfo` account (752 bytes). Only the fields the bot reads
/// are exposed.
#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct AmmInfo {
    pub data: [u8; 752],
}

unsafe impl Zeroable for AmmInfo {}
unsafe impl Pod for AmmInfo {}

impl AmmInfo {
    pub const LEN: usize = 752;

    #[inline(always)]
    fn key_at(&self, offset: usize) -> Pubkey {
        let mut buf = [0u8; 32];
        buf.copy_from_slice(&self.data[offset..offset + 32]);
        Pubkey::new_from_array(buf)
    }

    #[inline(always)]
    fn u64_at(&self, offset: usize) -> u64 {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&self.data[offset..offset + 8]);
        u64::from_le_bytes(buf)
    }

    #[inline(always)]
    pub fn status(&self) -> u64 {
        self.u64_at(0)
    }

    #[inline(always)]
    pub fn nonce(&self) -> u64 {
        self.u64_at(8)
    }

    #[inline(always)]
    pub fn base_vault(&self) -> Pubkey {
        self.key_at(336)
    }

    #[inline(always)]
    pub fn quote_vault(&self) -> Pubkey {
        self.key_at(368)
    }

    #[inline(always)]
    pub fn base_mint(&self) -> Pubkey {
        self.key_at(400)
    }

    #[inline(always)]
    pub fn quote_mint(&self) -> Pubkey {
        self.key_at(432)
    }

    #[inline(always)]
    pub fn lp_mint(&self) -> Pubkey {
        self.key_at(464)
    }

    #[inline(always)]
    pub fn open_orders(&self) -> Pubkey {
        self.key_at(496)
    }

    #[inline(always)]
    pub fn market_id(&self) -> Pubkey {
        self.key_at(528)
    }

    #[inline(always)]
    pub fn market_program_id(&self) -> Pubkey {
        self.key_at(560)
    }

    #[inline(always)]
    pub fn target_orders(&self) -> Pubkey {
        self.key_at(592)
    }

    #[inline(always)]
    pub fn lp_amount(&self) -> u64 {
        self.u64_at(720)
    }
}

/// Serum V3 / OpenBook Market Layout (388 bytes)
#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct MarketStateV3 {
    pub data: [u8; 388],
}

unsafe impl Zeroable for MarketStateV3 {}
unsafe impl Pod for MarketStateV3 {}

impl MarketStateV3 {
    pub const LEN: usize = 388;

    #[inline(always)]
    fn key_at(&self, offset: usize) -> Pubkey {
        let mut buf = [0u8; 32];
        buf.copy_from_slice(&self.data[offset..offset + 32]);
        Pubkey::new_from_array(buf)
    }

    #[inline(always)]
    pub fn vault_signer_nonce(&self) -> u64 {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&self.data[45..53]);
        u64::from_le_bytes(buf)
    }

    #[inline(always)]
    pub fn coin_vault(&self) -> Pubkey {
        self.key_at(117)
    }

    #[inline(always)]
    pub fn pc_vault(&self) -> Pubkey {
        self.key_at(165)
    }

    #[inline(always)]
    pub fn event_queue(&self) -> Pubkey {
        self.key_at(253)
    }

    #[inline(always)]
    pub fn bids(&self) -> Pubkey {
        self.key_at(285)
    }

    #[inline(always)]
    pub fn asks(&self) -> Pubkey {
        self.key_at(317)
    }
}

/// All pool-side accounts required for a Raydium V4 swap.
/// The user accounts are supplied separately at build time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaydiumPoolKeys {
    pub amm_id: Pubkey,
    pub amm_authority: Pubkey,
    pub amm_open_orders: Pubkey,
    pub amm_target_orders: Pubkey,
    pub coin_vault: Pubkey,
    pub pc_vault: Pubkey,
    pub coin_mint: Pubkey,
    pub pc_mint: Pubkey,
    pub serum_program_id: Pubkey,
    pub serum_market: Pubkey,
    pub serum_bids: Pubkey,
    pub serum_asks: Pubkey,
    pub serum_event_queue: Pubkey,
    pub serum_coin_vault: Pubkey,
    pub serum_pc_vault: Pubkey,
    pub serum_vault_signer: Pubkey,
}

impl RaydiumPoolKeys {
    /// Assemble pool keys from the decoded AMM and market accounts.
    /// Returns `None` when the market's vault signer cannot be derived.
    pub fn from_accounts(amm_id: Pubkey, amm: &AmmInfo, market: &MarketStateV3) -> Option<Self> {
        let market_id = amm.market_id();
        let market_program = amm.market_program_id();
        let serum_vault_signer = Pubkey::create_program_address(
            &[market_id.as_ref(), &market.vault_signer_nonce().to_le_bytes()],
            &market_program,
        )
        .ok()?;

        Some(Self {
            amm_id,
            amm_authority: RAYDIUM_AMM_AUTHORITY,
            amm_open_orders: amm.open_orders(),
            amm_target_orders: amm.target_orders(),
            coin_vault: amm.base_vault(),
            pc_vault: amm.quote_vault(),
            coin_mint: amm.base_mint(),
            pc_mint: amm.quote_mint(),
            serum_program_id: market_program,
            serum_market: market_id,
            serum_bids: market.bids(),
            serum_asks: market.asks(),
            serum_event_queue: market.event_queue(),
            serum_coin_vault: market.coin_vault(),
            serum_pc_vault: market.pc_vault(),
            serum_vault_signer,
        })
    }

    /// The traded token: whichever side of the pair is not wrapped SOL.
    pub fn token_mint(&self) -> Pubkey {
        if self.coin_mint == WSOL_MINT {
            self.pc_mint
        } else {
            self.coin_mint
        }
    }

    /// The pool vault holding wrapped SOL.
    pub fn sol_vault(&self) -> Pubkey {
        if self.coin_mint == WSOL_MINT {
            self.coin_vault
        } else {
            self.pc_vault
        }
    }

    pub fn is_sol_pair(&self) -> bool {
        self.coin_mint == WSOL_MINT || self.pc_mint == WSOL_MINT
    }

    #[cfg(any(test, feature = "test-utils"))]
    pub fn mock(amm_id: Pubkey, token_mint: Pubkey) -> Self {
        Self {
            amm_id,
            amm_authority: RAYDIUM_AMM_AUTHORITY,
            amm_open_orders: Pubkey::new_unique(),
            amm_target_orders: Pubkey::new_unique(),
            coin_vault: Pubkey::new_unique(),
            pc_vault: Pubkey::new_unique(),
            coin_mint: token_mint,
            pc_mint: WSOL_MINT,
            serum_program_id: crate::constants::OPENBOOK_PROGRAM,
            serum_market: Pubkey::new_unique(),
            serum_bids: Pubkey::new_unique(),
            serum_asks: Pubkey::new_unique(),
            serum_event_queue: Pubkey::new_unique(),
            serum_coin_vault: Pubkey::new_unique(),
            serum_pc_vault: Pubkey::new_unique(),
            serum_vault_signer: Pubkey::new_unique(),
        }
    }
}
