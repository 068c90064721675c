//! Raydium V4 AMM swap transaction builder.
//!
//! Produces a complete signed transaction: compute budget, idempotent creation
//! of the token account, the 18-account swap, and an optional relay tip.
//! The account ordering of the swap is fixed by the AMM program.

use anyhow::Result;
use solana_sdk::{
    compute_budget::ComputeBudgetInstruction,
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    system_instruction,
    transaction::Transaction,
};
use spl_associated_token_account::{
    get_associated_token_address, instruction::create_associated_token_account_idempotent,
};
use std::sync::Arc;

use sniper_core::constants::RAYDIUM_V4_PROGRAM;
use sniper_core::instruction::SWAP_BASE_IN_TAG;
use sniper_core::{ComputeBudget, RaydiumPoolKeys, Side};
use strategy::ports::{SwapBuilder, SwapOptions};

/// Build a Raydium V4 `SwapBaseIn` instruction.
pub fn build_raydium_swap_base_in(
    pool_keys: &RaydiumPoolKeys,
    user_source_token: Pubkey,
    user_destination_token: Pubkey,
    user_owner: Pubkey,
    amount_in: u64,
    min_amount_out: u64,
) -> Instruction {
    let mut data = Vec::with_capacity(17);
    data.push(SWAP_BASE_IN_TAG);
    data.extend_from_slice(&amount_in.to_le_bytes());
    data.extend_from_slice(&min_amount_out.to_le_bytes());

    let accounts = vec![
        // 0. Token program
        AccountMeta::new_readonly(spl_token::ID, false),
        // 1-6. AMM side
        AccountMeta::new(pool_keys.amm_id, false),
        AccountMeta::new_readonly(pool_keys.amm_authority, false),
        AccountMeta::new(pool_keys.amm_open_orders, false),
        AccountMeta::new(pool_keys.amm_target_orders, false),
        AccountMeta::new(pool_keys.coin_vault, false),
        AccountMeta::new(pool_keys.pc_vault, false),
        // 7-14. Order book side
        AccountMeta::new_readonly(pool_keys.serum_program_id, false),
        AccountMeta::new(pool_keys.serum_market, false),
        AccountMeta::new(pool_keys.serum_bids, false),
        AccountMeta::new(pool_keys.serum_asks, false),
        AccountMeta::new(pool_keys.serum_event_queue, false),
        AccountMeta::new(pool_keys.serum_coin_vault, false),
        AccountMeta::new(pool_keys.serum_pc_vault, false),
        AccountMeta::new_readonly(pool_keys.serum_vault_signer, false),
        // 15-17. User side
        AccountMeta::new(user_source_token, false),
        AccountMeta::new(user_destination_token, false),
        AccountMeta::new_readonly(user_owner, true),
    ];

    Instruction {
        program_id: RAYDIUM_V4_PROGRAM,
        accounts,
        data,
    }
}

/// Signs swaps with the bot's keypair.
pub struct RaydiumSwapBuilder {
    payer: Arc<Keypair>,
}

impl RaydiumSwapBuilder {
    pub fn new(payer: Arc<Keypair>) -> Self {
        Self { payer }
    }

    pub fn instructions(
        &self,
        keys: &RaydiumPoolKeys,
        wsol_account: &Pubkey,
        compute: &ComputeBudget,
        tip_account: Option<Pubkey>,
        amount: u64,
        min_amount_out: u64,
        side: Side,
    ) -> Vec<Instruction> {
        let owner = self.payer.pubkey();
        let token_mint = keys.token_mint();
        let token_account = get_associated_token_address(&owner, &token_mint);

        let (source, destination) = match side {
            Side::Buy => (*wsol_account, token_account),
            Side::Sell => (token_account, *wsol_account),
        };

        let mut ixs = vec![
            ComputeBudgetInstruction::set_compute_unit_limit(compute.units),
            ComputeBudgetInstruction::set_compute_unit_price(compute.micro_lamports),
            create_associated_token_account_idempotent(&owner, &owner, &token_mint, &spl_token::ID),
            build_raydium_swap_base_in(keys, source, destination, owner, amount, min_amount_out),
        ];

        if let Some(tip_account) = tip_account.filter(|_| compute.tip_lamports > 0) {
            ixs.push(system_instruction::transfer(&owner, &tip_account, compute.tip_lamports));
        }
        ixs
    }
}

impl SwapBuilder for RaydiumSwapBuilder {
    fn build_swap(
        &self,
        keys: &RaydiumPoolKeys,
        wsol_account: &Pubkey,
        compute: &ComputeBudget,
        options: &SwapOptions,
        amount: u64,
        min_amount_out: u64,
        side: Side,
    ) -> Result<(Vec<Signature>, Transaction)> {
        if !keys.is_sol_pair() {
            anyhow::bail!("{} | pool is not paired with SOL", keys.amm_id);
        }

        let ixs = self.instructions(
            keys,
            wsol_account,
            compute,
            options.tip_account,
            amount,
            min_amount_out,
            side,
        );
        let tx = Transaction::new_signed_with_payer(
            &ixs,
            Some(&self.payer.pubkey()),
            &[&*self.payer],
            options.recent_blockhash,
        );
        Ok((tx.signatures.clone(), tx))
    }

    fn payer(&self) -> Pubkey {
        self.payer.pubkey()
    }
}
