use std::env;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use dotenvy::dotenv;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::signature::{read_keypair_file, Signer};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use executor::{BloxrouteRelay, JitoRelay, RaydiumSwapBuilder, RpcRelay, Submitter};
use sniper_core::RawEvent;
use strategy::ports::{PoolWatcher, Relay};
use strategy::{
    BatchExitScheduler, ChunkLedger, DedupCache, DispatchPool, EventPipeline, IntentSink,
    LatestBlockhash, MemoryKv, TradeDecisionEngine, TrackerStore,
};

mod config;
mod pool_fetcher;
mod stream;
mod telemetry;
mod wallet_manager;

use crate::pool_fetcher::RpcPoolFetcher;
use crate::stream::MempoolStream;
use crate::wallet_manager::WalletManager;

/// Console plus a non-blocking daily file. The guard must outlive main.
fn init_tracing() -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let log_dir = env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string());
    std::fs::create_dir_all(&log_dir)?;
    let file_appender = tracing_appender::rolling::daily(&log_dir, "sniper.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking_file).with_ansi(false))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let _log_guard = init_tracing()?;

    info!("🚀 Sniper Bootstrapping [Composition Root]...");

    let config = match config::BotConfig::new() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("❌ CRITICAL: Failed to load config: {}", e);
            std::process::exit(1);
        }
    };
    let sources = config.sources().map_err(|e| anyhow!(e))?;
    info!("✅ Config Loaded & Validated: RPC={}, streams={}", config.rpc_url, sources.len());

    let key_path = if config.keypair_path.is_empty() {
        format!("{}/.config/solana/id.json", env::var("HOME")?)
    } else {
        config.keypair_path.clone()
    };
    let payer = Arc::new(
        read_keypair_file(&key_path).map_err(|e| anyhow!("Failed to read keypair {}: {}", key_path, e))?,
    );
    info!("🔑 Identity: {}", payer.pubkey());

    if let Err(e) = sniper_core::telemetry::init_metrics() {
        warn!("⚠️ Metrics registration failed: {}", e);
    }
    if let Some(port) = config.metrics_port {
        tokio::spawn(async move {
            if let Err(e) = telemetry::serve_metrics(port).await {
                error!("❌ Metrics server stopped: {}", e);
            }
        });
    }

    // Infrastructure
    let rpc = Arc::new(RpcClient::new_with_commitment(
        config.rpc_url.clone(),
        CommitmentConfig::confirmed(),
    ));
    let wsol_account = WalletManager::new(Arc::clone(&rpc))
        .ensure_wsol_account(&payer, config.wrap_lamports)
        .await?;
    info!("WSOL Associated Token Account {}", wsol_account);

    let blockhash = Arc::new(LatestBlockhash::new());
    match rpc.get_latest_blockhash().await {
        Ok(hash) => blockhash.set(hash),
        Err(e) => warn!("⚠️ No initial blockhash, waiting for the stream: {}", e),
    }

    let fetcher = Arc::new(RpcPoolFetcher::new(Arc::clone(&rpc)));
    let (event_tx, event_rx) = mpsc::unbounded_channel::<RawEvent>();
    let stream = MempoolStream::new(sources, event_tx);
    let watcher: Arc<dyn PoolWatcher> = Arc::new(stream.watcher());

    // Domain services
    let strategy_config = Arc::new(config.strategy(payer.pubkey()).map_err(|e| anyhow!(e))?);
    let kv = Arc::new(MemoryKv::new());
    let tracker = TrackerStore::new(kv.clone());
    let ledger = ChunkLedger::new(kv);
    let (sink, intent_rx) = IntentSink::channel();

    let decision = TradeDecisionEngine::new(
        Arc::clone(&strategy_config),
        tracker.clone(),
        ledger.clone(),
        watcher,
        sink.clone(),
    );
    let pipeline = Arc::new(EventPipeline::new(
        Arc::clone(&strategy_config),
        Arc::clone(&blockhash),
        tracker.clone(),
        decision,
        fetcher.clone(),
        fetcher.clone(),
        sink.clone(),
    ));
    let _workers = DispatchPool::new(
        strategy_config.effective_workers(),
        DedupCache::new(strategy_config.dedup_ttl),
        pipeline,
    )
    .spawn(event_rx);

    let _batch = Arc::new(BatchExitScheduler::new(
        Arc::clone(&strategy_config),
        tracker,
        ledger,
        fetcher,
        Arc::clone(&blockhash),
        sink,
    ))
    .spawn();

    // Execution
    let mut relays: Vec<Arc<dyn Relay>> = vec![Arc::new(JitoRelay::new(&config.jito_url)?)];
    if let Some(auth) = &config.bloxroute_auth_header {
        relays.push(Arc::new(BloxrouteRelay::new(&config.bloxroute_url, auth)?));
    }
    let mut submitter = Submitter::new(
        Arc::new(RaydiumSwapBuilder::new(Arc::clone(&payer))),
        relays,
        blockhash,
        wsol_account,
    );
    if config.rpc_mirror {
        info!("🪞 Mirroring every submission through RPC");
        submitter = submitter.with_mirror(Arc::new(RpcRelay::new(Arc::clone(&rpc))));
    }
    let _submitter = Arc::new(submitter).spawn(intent_rx);

    let _streams = stream.spawn();
    info!("🔥 Sniper IGNITION. Waiting for mempool events...");

    tokio::signal::ctrl_c().await?;
    info!("👋 Shutdown signal received (Ctrl+C). Goodbye!");
    Ok(())
}
