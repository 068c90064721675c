use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_DEDUP_TTL: Duration = Duration::from_secs(60);

/// Short-lived "seen" markers keyed by transaction signature.
///
/// Every successful insertion schedules exactly one removal after the TTL,
/// whatever happens to the event afterwards.
#[derive(Clone)]
pub struct DedupCache {
    seen: Arc<DashMap<String, ()>>,
    ttl: Duration,
}

impl DedupCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            seen: Arc::new(DashMap::new()),
            ttl,
        }
    }

    /// Records `signature` and returns `true` if it had not been seen within the TTL.
    pub fn should_process(&self, signature: &str) -> bool {
        match self.seen.entry(signature.to_string()) {
            Entry::Occupied(_) => return false,
            Entry::Vacant(entry) => {
                entry.insert(());
            }
        }

        let seen = Arc::clone(&self.seen);
        let key = signature.to_string();
        let ttl = self.ttl;
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tokio::time::sleep(ttl).await;
                    seen.remove(&key);
                });
            }
            Err(_) => warn!("⚠️ {} | no runtime to schedule dedup expiry", signature),
        }
        true
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

impl Default for DedupCache {
    fn default() -> Self {
        Self::new(DEFAULT_DEDUP_TTL)
    }
}
