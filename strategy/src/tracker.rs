use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use sniper_core::telemetry::TRACKER_TRANSITIONS;
use sniper_core::unix_now;

use crate::kv::{KvStore, StoreError};

const KEY_PREFIX: &str = "tracker:";

/// Default eviction window for TrackedBoth pools that stopped seeing activity.
pub const DEFAULT_STALE_WINDOW: Duration = Duration::from_secs(8 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TrackerStatus {
    #[default]
    Untracked,
    /// Watched, not traded
    TrackedTriggerOnly,
    /// Watched and eligible for batch exits
    TrackedBoth,
    /// Suspended, e.g. the pool was re-initialized
    Paused,
}

impl TrackerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackerStatus::Untracked => "untracked",
            TrackerStatus::TrackedTriggerOnly => "tracked_trigger_only",
            TrackerStatus::TrackedBoth => "tracked_both",
            TrackerStatus::Paused => "paused",
        }
    }

    pub fn is_tracked(&self) -> bool {
        matches!(self, TrackerStatus::TrackedTriggerOnly | TrackerStatus::TrackedBoth)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerRecord {
    pub status: TrackerStatus,
    pub last_updated: i64,
}

impl TrackerRecord {
    pub fn is_stale(&self, now: i64, window: Duration) -> bool {
        now.saturating_sub(self.last_updated) > window.as_secs() as i64
    }
}

/// Per-pool tracking state. A missing record is `Untracked`.
#[derive(Clone)]
pub struct TrackerStore {
    kv: Arc<dyn KvStore>,
}

impl TrackerStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    fn key(pool: &Pubkey) -> String {
        format!("{}{}", KEY_PREFIX, pool)
    }

    pub fn get(&self, pool: &Pubkey) -> Result<Option<TrackerRecord>, StoreError> {
        match self.kv.get(&Self::key(pool))? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn status(&self, pool: &Pubkey) -> Result<TrackerStatus, StoreError> {
        Ok(self.get(pool)?.map(|r| r.status).unwrap_or_default())
    }

    /// Unconditional overwrite.
    pub fn set_status(&self, pool: &Pubkey, status: TrackerStatus) -> Result<(), StoreError> {
        self.set_status_at(pool, status, unix_now())
    }

    pub fn set_status_at(&self, pool: &Pubkey, status: TrackerStatus, now: i64) -> Result<(), StoreError> {
        let record = TrackerRecord {
            status,
            last_updated: now,
        };
        self.kv.set(&Self::key(pool), serde_json::to_string(&record)?)?;
        TRACKER_TRANSITIONS.with_label_values(&[status.as_str()]).inc();
        Ok(())
    }

    pub fn untrack(&self, pool: &Pubkey) -> Result<(), StoreError> {
        self.set_status(pool, TrackerStatus::Untracked)
    }

    /// TrackedTriggerOnly/TrackedBoth → Paused. Returns whether a transition happened.
    pub fn pause(&self, pool: &Pubkey) -> Result<bool, StoreError> {
        self.transition(pool, |s| s.is_tracked(), TrackerStatus::Paused)
    }

    /// Paused → Untracked. Returns whether a transition happened.
    pub fn unpause(&self, pool: &Pubkey) -> Result<bool, StoreError> {
        self.transition(pool, |s| s == TrackerStatus::Paused, TrackerStatus::Untracked)
    }

    fn transition(
        &self,
        pool: &Pubkey,
        allowed: impl Fn(TrackerStatus) -> bool,
        to: TrackerStatus,
    ) -> Result<bool, StoreError> {
        let now = unix_now();
        let mut changed = false;
        let mut codec_err = None;

        self.kv.update(&Self::key(pool), &mut |current| {
            let record = match current.map(serde_json::from_str::<TrackerRecord>) {
                Some(Ok(r)) => Some(r),
                Some(Err(e)) => {
                    codec_err = Some(e);
                    return current.map(str::to_owned);
                }
                None => None,
            };
            let status = record.map(|r| r.status).unwrap_or_default();
            if !allowed(status) {
                return current.map(str::to_owned);
            }
            changed = true;
            serde_json::to_string(&TrackerRecord {
                status: to,
                last_updated: now,
            })
            .ok()
        })?;

        if let Some(e) = codec_err {
            return Err(e.into());
        }
        if changed {
            TRACKER_TRANSITIONS.with_label_values(&[to.as_str()]).inc();
        }
        Ok(changed)
    }

    /// Every pool currently in `status`, with its record.
    pub fn tracked_with(&self, status: TrackerStatus) -> Result<Vec<(Pubkey, TrackerRecord)>, StoreError> {
        let mut out = Vec::new();
        for (key, raw) in self.kv.scan_prefix(KEY_PREFIX)? {
            let Ok(pool) = Pubkey::from_str(&key[KEY_PREFIX.len()..]) else {
                continue;
            };
            let record: TrackerRecord = serde_json::from_str(&raw)?;
            if record.status == status {
                out.push((pool, record));
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryKv;

    fn store() -> TrackerStore {
        TrackerStore::new(Arc::new(MemoryKv::new()))
    }

    #[test]
    fn test_absent_is_untracked() {
        let tracker = store();
        let pool = Pubkey::new_unique();
        assert!(tracker.get(&pool).unwrap().is_none());
        assert_eq!(tracker.status(&pool).unwrap(), TrackerStatus::Untracked);
    }

    #[test]
    fn test_set_status_overwrites_and_stamps() {
        let tracker = store();
        let pool = Pubkey::new_unique();
        tracker.set_status_at(&pool, TrackerStatus::TrackedBoth, 100).unwrap();
        tracker.set_status_at(&pool, TrackerStatus::TrackedTriggerOnly, 200).unwrap();

        let record = tracker.get(&pool).unwrap().unwrap();
        assert_eq!(record.status, TrackerStatus::TrackedTriggerOnly);
        assert_eq!(record.last_updated, 200);
    }

    #[test]
    fn test_pause_only_from_tracked() {
        let tracker = store();
        let pool = Pubkey::new_unique();

        // Untracked: no-op, and no record is created
        assert!(!tracker.pause(&pool).unwrap());
        assert!(tracker.get(&pool).unwrap().is_none());

        tracker.set_status(&pool, TrackerStatus::TrackedTriggerOnly).unwrap();
        assert!(tracker.pause(&pool).unwrap());
        assert_eq!(tracker.status(&pool).unwrap(), TrackerStatus::Paused);

        // Already paused: no-op, timestamp untouched
        tracker.set_status_at(&pool, TrackerStatus::Paused, 5).unwrap();
        assert!(!tracker.pause(&pool).unwrap());
        assert_eq!(tracker.get(&pool).unwrap().unwrap().last_updated, 5);

        tracker.set_status(&pool, TrackerStatus::TrackedBoth).unwrap();
        assert!(tracker.pause(&pool).unwrap());
    }

    #[test]
    fn test_unpause_only_from_paused() {
        let tracker = store();
        let pool = Pubkey::new_unique();
        assert!(!tracker.unpause(&pool).unwrap());

        for status in [TrackerStatus::TrackedTriggerOnly, TrackerStatus::TrackedBoth] {
            tracker.set_status(&pool, status).unwrap();
            assert!(!tracker.unpause(&pool).unwrap());
            assert_eq!(tracker.status(&pool).unwrap(), status);
        }

        tracker.set_status(&pool, TrackerStatus::Paused).unwrap();
        assert!(tracker.unpause(&pool).unwrap());
        assert_eq!(tracker.status(&pool).unwrap(), TrackerStatus::Untracked);
    }

    #[test]
    fn test_tracked_with_filters_by_status() {
        let tracker = store();
        let a = Pubkey::new_unique();
        let b = Pubkey::new_unique();
        tracker.set_status(&a, TrackerStatus::TrackedBoth).unwrap();
        tracker.set_status(&b, TrackerStatus::Paused).unwrap();

        let both = tracker.tracked_with(TrackerStatus::TrackedBoth).unwrap();
        assert_eq!(both.len(), 1);
        assert_eq!(both[0].0, a);
    }

    #[test]
    fn test_staleness_window() {
        let record = TrackerRecord {
            status: TrackerStatus::TrackedBoth,
            last_updated: 1_000,
        };
        assert!(!record.is_stale(1_000 + 480, DEFAULT_STALE_WINDOW));
        assert!(record.is_stale(1_000 + 481, DEFAULT_STALE_WINDOW));
    }
}
