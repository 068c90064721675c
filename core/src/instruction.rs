//! Raydium AMM v4 instruction decoding.
//!
//! The first byte of the instruction data is the instruction tag. Integer
//! fields follow in little-endian order. Trailing bytes past the last field
//! are ignored, matching the on-chain unpacker.

use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

use crate::constants::RAYDIUM_V4_PROGRAM;

pub const INITIALIZE2_TAG: u8 = 1;
pub const WITHDRAW_TAG: u8 = 4;
pub const SWAP_BASE_IN_TAG: u8 = 9;
pub const SWAP_BASE_OUT_TAG: u8 = 11;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmmInstruction {
    Initialize2 {
        nonce: u8,
        open_time: u64,
        init_pc_amount: u64,
        init_coin_amount: u64,
    },
    Withdraw {
        amount: u64,
    },
    SwapBaseIn {
        amount_in: u64,
        minimum_amount_out: u64,
    },
    SwapBaseOut {
        max_amount_in: u64,
        amount_out: u64,
    },
    Unknown {
        tag: u8,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("empty instruction data")]
    Empty,
    #[error("instruction tag {tag} truncated: need {needed} bytes, got {got}")]
    Truncated { tag: u8, needed: usize, got: usize },
    #[error("instruction belongs to program {0}, not the AMM")]
    ForeignProgram(Pubkey),
}

impl AmmInstruction {
    pub fn name(&self) -> &'static str {
        match self {
            AmmInstruction::Initialize2 { .. } => "Initialize2",
            AmmInstruction::Withdraw { .. } => "Withdraw",
            AmmInstruction::SwapBaseIn { .. } => "SwapBaseIn",
            AmmInstruction::SwapBaseOut { .. } => "SwapBaseOut",
            AmmInstruction::Unknown { .. } => "Unknown",
        }
    }
}

/// Decode one instruction addressed to `program_id`.
pub fn decode(program_id: &Pubkey, data: &[u8]) -> Result<AmmInstruction, DecodeError> {
    if *program_id != RAYDIUM_V4_PROGRAM {
        return Err(DecodeError::ForeignProgram(*program_id));
    }

    let (&tag, rest) = data.split_first().ok_or(DecodeError::Empty)?;
    let mut reader = Reader { tag, rest };

    let ix = match tag {
        INITIALIZE2_TAG => {
            reader.require(1 + 8 * 3)?;
            AmmInstruction::Initialize2 {
                nonce: reader.u8(),
                open_time: reader.u64(),
                init_pc_amount: reader.u64(),
                init_coin_amount: reader.u64(),
            }
        }
        WITHDRAW_TAG => {
            reader.require(8)?;
            AmmInstruction::Withdraw { amount: reader.u64() }
        }
        SWAP_BASE_IN_TAG => {
            reader.require(16)?;
            AmmInstruction::SwapBaseIn {
                amount_in: reader.u64(),
                minimum_amount_out: reader.u64(),
            }
        }
        SWAP_BASE_OUT_TAG => {
            reader.require(16)?;
            AmmInstruction::SwapBaseOut {
                max_amount_in: reader.u64(),
                amount_out: reader.u64(),
            }
        }
        other => AmmInstruction::Unknown { tag: other },
    };

    Ok(ix)
}

struct Reader<'a> {
    tag: u8,
    rest: &'a [u8],
}

impl<'a> Reader<'a> {
    // Bounds are checked once up front so the field readers can slice freely.
    fn require(&self, needed: usize) -> Result<(), DecodeError> {
        if self.rest.len() < needed {
            return Err(DecodeError::Truncated {
                tag: self.tag,
                needed: needed + 1,
                got: self.rest.len() + 1,
            });
        }
        Ok(())
    }

    fn u8(&mut self) -> u8 {
        let (v, rest) = self.rest.split_at(1);
        self.rest = rest;
        v[0]
    }

    fn u64(&mut self) -> u64 {
        let (v, rest) = self.rest.split_at(8);
        self.rest = rest;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(v);
        u64::from_le_bytes(buf)
    }
}

#[cfg(test)]
#[path = "instruction_tests.rs"]
mod instruction_tests;
