use parking_lot::RwLock;
use solana_sdk::hash::Hash;
use std::str::FromStr;

/// Most recent blockhash observed on the stream. Last write wins.
#[derive(Default)]
pub struct LatestBlockhash {
    inner: RwLock<Option<Hash>>,
}

impl LatestBlockhash {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when `encoded` is not a valid base58 hash.
    pub fn update(&self, encoded: &str) -> bool {
        match Hash::from_str(encoded) {
            Ok(hash) => {
                *self.inner.write() = Some(hash);
                true
            }
            Err(_) => false,
        }
    }

    pub fn set(&self, hash: Hash) {
        *self.inner.write() = Some(hash);
    }

    pub fn get(&self) -> Option<Hash> {
        *self.inner.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_until_first_update() {
        let latest = LatestBlockhash::new();
        assert!(latest.get().is_none());

        let hash = Hash::new_unique();
        assert!(latest.update(&hash.to_string()));
        assert_eq!(latest.get(), Some(hash));

        assert!(!latest.update("not-a-hash"));
        assert_eq!(latest.get(), Some(hash));
    }
}
