use anyhow::Result;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    instruction::Instruction,
    pubkey::Pubkey,
    signature::Keypair,
    signer::Signer,
    system_instruction,
    transaction::Transaction,
};
use spl_associated_token_account::get_associated_token_address;
use spl_associated_token_account::instruction::create_associated_token_account_idempotent;
use std::sync::Arc;
use tracing::info;

/// Startup bootstrap of the wrapped-SOL token account every swap settles through.
pub struct WalletManager {
    rpc: Arc<RpcClient>,
}

impl WalletManager {
    pub fn new(rpc: Arc<RpcClient>) -> Self {
        Self { rpc }
    }

    pub fn wsol_account(owner: &Pubkey) -> Pubkey {
        get_associated_token_address(owner, &spl_token::native_mint::id())
    }

    /// Instructions that create the WSOL account when missing and wrap
    /// `wrap_lamports` of native SOL into it.
    pub fn wsol_instructions(owner: &Pubkey, create: bool, wrap_lamports: u64) -> Result<Vec<Instruction>> {
        let wsol_mint = spl_token::native_mint::id();
        let ata = Self::wsol_account(owner);
        let mut instructions = Vec::new();

        if create {
            instructions.push(create_associated_token_account_idempotent(
                owner,
                owner,
                &wsol_mint,
                &spl_token::id(),
            ));
        }
        if wrap_lamports > 0 {
            instructions.push(system_instruction::transfer(owner, &ata, wrap_lamports));
            instructions.push(spl_token::instruction::sync_native(&spl_token::id(), &ata)?);
        }
        Ok(instructions)
    }

    /// Ensure the payer's WSOL account exists (and is topped up when asked).
    /// Returns the account address.
    pub async fn ensure_wsol_account(&self, payer: &Keypair, wrap_lamports: u64) -> Result<Pubkey> {
        let owner = payer.pubkey();
        let ata = Self::wsol_account(&owner);
        let exists = self.rpc.get_account(&ata).await.is_ok();

        let instructions = Self::wsol_instructions(&owner, !exists, wrap_lamports)?;
        if instructions.is_empty() {
            info!("✅ WSOL account ready: {}", ata);
            return Ok(ata);
        }

        if !exists {
            info!("📦 Creating WSOL account: {}", ata);
        }
        if wrap_lamports > 0 {
            info!("💧 Wrapping {} lamports into {}", wrap_lamports, ata);
        }
        let blockhash = self.rpc.get_latest_blockhash().await?;
        let tx = Transaction::new_signed_with_payer(&instructions, Some(&owner), &[payer], blockhash);
        let signature = self.rpc.send_and_confirm_transaction(&tx).await?;
        info!("✅ WSOL account ready: {} ({})", ata, signature);
        Ok(ata)
    }
}
