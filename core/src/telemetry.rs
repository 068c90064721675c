use lazy_static::lazy_static;
use prometheus::{Counter, CounterVec, Encoder, Histogram, HistogramOpts, IntGauge, Opts, Registry, TextEncoder};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // Ingestion
    pub static ref EVENTS_RECEIVED: CounterVec = CounterVec::new(
        Opts::new("mempool_events_received_total", "Raw mempool events pulled off the queue"),
        &["source"]
    ).unwrap();

    pub static ref EVENTS_DUPLICATE: Counter = Counter::new(
        "mempool_events_duplicate_total",
        "Events skipped because their signature was already seen"
    ).unwrap();

    pub static ref DECODE_ERRORS: Counter = Counter::new(
        "instruction_decode_errors_total",
        "AMM instructions that failed to decode"
    ).unwrap();

    pub static ref RESOLVE_ERRORS: Counter = Counter::new(
        "account_resolve_errors_total",
        "Events skipped because an account index could not be resolved"
    ).unwrap();

    pub static ref EVENT_LATENCY: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "event_processing_ms",
            "Time from dequeue to pipeline completion"
        ).buckets(vec![0.1, 0.5, 1.0, 5.0, 25.0, 100.0, 1000.0])
    ).unwrap();

    // State
    pub static ref TRACKER_TRANSITIONS: CounterVec = CounterVec::new(
        Opts::new("tracker_transitions_total", "AMM tracker status transitions"),
        &["status"]
    ).unwrap();

    pub static ref TRACKED_POOLS: IntGauge = IntGauge::new(
        "tracked_pools",
        "Pools in TrackedBoth at the last batch tick"
    ).unwrap();

    // Decisions and execution
    pub static ref INTENTS_EMITTED: CounterVec = CounterVec::new(
        Opts::new("trade_intents_total", "Trade intents emitted"),
        &["origin", "side"]
    ).unwrap();

    pub static ref RELAY_SUBMISSIONS: CounterVec = CounterVec::new(
        Opts::new("relay_submissions_total", "Relay submissions by outcome"),
        &["relay", "outcome"]
    ).unwrap();

    pub static ref BATCH_TICKS: Counter = Counter::new(
        "batch_exit_ticks_total",
        "Batch exit scheduler ticks that ran"
    ).unwrap();

    pub static ref STREAM_CONNECTED: IntGauge = IntGauge::new(
        "stream_connected",
        "Mempool stream connection status (1=connected, 0=disconnected)"
    ).unwrap();
}

pub fn init_metrics() -> Result<(), prometheus::Error> {
    REGISTRY.register(Box::new(EVENTS_RECEIVED.clone()))?;
    REGISTRY.register(Box::new(EVENTS_DUPLICATE.clone()))?;
    REGISTRY.register(Box::new(DECODE_ERRORS.clone()))?;
    REGISTRY.register(Box::new(RESOLVE_ERRORS.clone()))?;
    REGISTRY.register(Box::new(EVENT_LATENCY.clone()))?;
    REGISTRY.register(Box::new(TRACKER_TRANSITIONS.clone()))?;
    REGISTRY.register(Box::new(TRACKED_POOLS.clone()))?;
    REGISTRY.register(Box::new(INTENTS_EMITTED.clone()))?;
    REGISTRY.register(Box::new(RELAY_SUBMISSIONS.clone()))?;
    REGISTRY.register(Box::new(BATCH_TICKS.clone()))?;
    REGISTRY.register(Box::new(STREAM_CONNECTED.clone()))?;
    Ok(())
}

/// Render the registry in the prometheus text exposition format.
pub fn gather_text() -> String {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        return format!("# encode error: {}\n", e);
    }
    String::from_utf8(buffer).unwrap_or_default()
}
