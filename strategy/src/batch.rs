use num_traits::ToPrimitive;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use sniper_core::telemetry::{BATCH_TICKS, TRACKED_POOLS};
use sniper_core::{unix_now, IntentOrigin, RelayKind, RelayRoute, Side, TradeIntent};

use crate::blockhash::LatestBlockhash;
use crate::config::StrategyConfig;
use crate::ledger::ChunkLedger;
use crate::ports::PoolKeyProvider;
use crate::sink::IntentSink;
use crate::tracker::{TrackerStatus, TrackerStore};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickSummary {
    pub evicted: usize,
    pub emitted: usize,
    pub skipped: usize,
}

/// Time-based forced liquidation of every TrackedBoth pool, one chunk per tick.
pub struct BatchExitScheduler {
    config: Arc<StrategyConfig>,
    tracker: TrackerStore,
    ledger: ChunkLedger,
    pools: Arc<dyn PoolKeyProvider>,
    blockhash: Arc<LatestBlockhash>,
    sink: IntentSink,
}

impl BatchExitScheduler {
    pub fn new(
        config: Arc<StrategyConfig>,
        tracker: TrackerStore,
        ledger: ChunkLedger,
        pools: Arc<dyn PoolKeyProvider>,
        blockhash: Arc<LatestBlockhash>,
        sink: IntentSink,
    ) -> Self {
        Self {
            config,
            tracker,
            ledger,
            pools,
            blockhash,
            sink,
        }
    }

    /// Run forever. Each tick gets its own task so a slow tick never delays the next.
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!("⏱️ Batch exit every {:?}", self.config.batch_interval);
            let mut interval = tokio::time::interval(self.config.batch_interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let scheduler = Arc::clone(&self);
                tokio::spawn(async move {
                    scheduler.tick(unix_now()).await;
                });
            }
        })
    }

    pub async fn tick(&self, now: i64) -> TickSummary {
        let mut summary = TickSummary::default();
        if self.blockhash.get().is_none() {
            debug!("batch tick skipped, no blockhash yet");
            return summary;
        }
        BATCH_TICKS.inc();

        let tracked = match self.tracker.tracked_with(TrackerStatus::TrackedBoth) {
            Ok(tracked) => tracked,
            Err(e) => {
                warn!("⚠️ batch tick: cannot list tracked pools: {}", e);
                return summary;
            }
        };
        TRACKED_POOLS.set(tracked.len() as i64);

        for (pool, record) in tracked {
            if record.is_stale(now, self.config.stale_window) {
                info!("🧹 {} | Remove from tracking (idle since {})", pool, record.last_updated);
                match self.tracker.untrack(&pool) {
                    Ok(()) => summary.evicted += 1,
                    Err(e) => warn!("⚠️ {} | eviction failed: {}", pool, e),
                }
                continue;
            }

            let amount = match self.ledger.get(&pool) {
                Ok(Some(chunk)) if chunk.is_exhausted() => {
                    debug!("{} | No more juice", pool);
                    None
                }
                Ok(Some(chunk)) => {
                    let sell = chunk.next_sell();
                    let amount = sell.to_u64();
                    if amount.is_none() {
                        warn!("⚠️ {} | sell size {} does not fit in u64", pool, sell);
                    }
                    amount
                }
                Ok(None) => {
                    debug!("{} | tracked without a chunk", pool);
                    None
                }
                Err(e) => {
                    warn!("⚠️ {} | chunk read failed: {}", pool, e);
                    None
                }
            };
            let Some(amount) = amount else {
                summary.skipped += 1;
                continue;
            };

            let keys = match self.pools.pool_keys(&pool).await {
                Ok(keys) => keys,
                Err(e) => {
                    warn!("⚠️ {} | pool keys unavailable for batch exit: {}", pool, e);
                    summary.skipped += 1;
                    continue;
                }
            };

            let emitted = self.sink.emit(TradeIntent {
                origin: IntentOrigin::BatchExit,
                pool_keys: keys,
                side: Side::Sell,
                amount,
                min_amount_out: self.config.batch_min_amount_out,
                compute: self.config.batch_compute,
                routes: vec![
                    RelayRoute::new(RelayKind::Bloxroute, false),
                    RelayRoute::new(RelayKind::Jito, false),
                ],
                trigger: None,
            });
            if emitted {
                summary.emitted += 1;
            }
        }

        summary
    }
}
