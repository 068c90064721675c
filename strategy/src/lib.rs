pub mod batch;
pub mod blockhash;
pub mod config;
pub mod decision;
pub mod dedup;
pub mod dispatch;
pub mod kv;
pub mod ledger;
pub mod pipeline;
pub mod ports;
pub mod sink;
pub mod sniper;
pub mod tracker;

#[cfg(test)]
mod test_support;

pub use batch::BatchExitScheduler;
pub use blockhash::LatestBlockhash;
pub use config::StrategyConfig;
pub use decision::TradeDecisionEngine;
pub use dedup::DedupCache;
pub use dispatch::DispatchPool;
pub use kv::{KvStore, MemoryKv};
pub use ledger::{ChunkLedger, TokenChunk};
pub use pipeline::EventPipeline;
pub use sink::IntentSink;
pub use tracker::{TrackerStatus, TrackerStore};
