use num_bigint::BigUint;
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;
use thiserror::Error;

use crate::kv::{KvStore, StoreError};

const KEY_PREFIX: &str = "chunk:";

/// Remaining position in one pool's token, sold off `chunk_size` at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenChunk {
    pub total: BigUint,
    pub remaining: BigUint,
    pub chunk_size: BigUint,
}

impl TokenChunk {
    pub fn is_exhausted(&self) -> bool {
        self.remaining.is_zero()
    }

    /// Size of the next sell: one chunk, or whatever is left when less than
    /// a chunk remains. A position too small to split sells in one go.
    pub fn next_sell(&self) -> BigUint {
        if self.chunk_size.is_zero() || self.remaining < self.chunk_size {
            self.remaining.clone()
        } else {
            self.chunk_size.clone()
        }
    }
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("{0} | chunk already exists")]
    AlreadyExists(Pubkey),
    #[error("chunk splitter must be at least 1")]
    InvalidSplitter,
    #[error("{0} | no chunk recorded")]
    NotFound(Pubkey),
    #[error("{pool} | debit of {requested} exceeds remaining {remaining}")]
    Overdraw {
        pool: Pubkey,
        remaining: BigUint,
        requested: BigUint,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct ChunkLedger {
    kv: Arc<dyn KvStore>,
}

impl ChunkLedger {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    fn key(pool: &Pubkey) -> String {
        format!("{}{}", KEY_PREFIX, pool)
    }

    /// First creation wins; a second attempt for the same pool is `AlreadyExists`.
    pub fn create(&self, pool: &Pubkey, total: BigUint, splitter: u32) -> Result<TokenChunk, LedgerError> {
        if splitter == 0 {
            return Err(LedgerError::InvalidSplitter);
        }

        let chunk = TokenChunk {
            chunk_size: &total / BigUint::from(splitter),
            remaining: total.clone(),
            total,
        };
        let encoded = serde_json::to_string(&chunk).map_err(StoreError::from)?;

        let mut created = false;
        self.kv.update(&Self::key(pool), &mut |current| match current {
            Some(existing) => Some(existing.to_owned()),
            None => {
                created = true;
                Some(encoded.clone())
            }
        })?;

        if created {
            Ok(chunk)
        } else {
            Err(LedgerError::AlreadyExists(*pool))
        }
    }

    pub fn get(&self, pool: &Pubkey) -> Result<Option<TokenChunk>, LedgerError> {
        match self.kv.get(&Self::key(pool))? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw).map_err(StoreError::from)?)),
            None => Ok(None),
        }
    }

    /// Atomically subtract `amount` from `remaining`. Overdrawing leaves the
    /// entry untouched.
    pub fn debit(&self, pool: &Pubkey, amount: &BigUint) -> Result<TokenChunk, LedgerError> {
        let mut outcome: Result<TokenChunk, LedgerError> = Err(LedgerError::NotFound(*pool));

        self.kv.update(&Self::key(pool), &mut |current| {
            let raw = current?;
            let mut chunk: TokenChunk = match serde_json::from_str(raw) {
                Ok(chunk) => chunk,
                Err(e) => {
                    outcome = Err(StoreError::from(e).into());
                    return Some(raw.to_owned());
                }
            };

            if *amount > chunk.remaining {
                outcome = Err(LedgerError::Overdraw {
                    pool: *pool,
                    remaining: chunk.remaining.clone(),
                    requested: amount.clone(),
                });
                return Some(raw.to_owned());
            }

            chunk.remaining -= amount;
            match serde_json::to_string(&chunk) {
                Ok(next) => {
                    outcome = Ok(chunk);
                    Some(next)
                }
                Err(e) => {
                    outcome = Err(StoreError::from(e).into());
                    Some(raw.to_owned())
                }
            }
        })?;

        outcome
    }
}
