use super::*;
use crate::kv::MemoryKv;
use crate::ledger::ChunkLedger;
use crate::test_support::{
    initialize2_event, swap_event, swap_event_via_lookup, withdraw_event, MockLookupTables, MockPools,
    RecordingWatcher,
};
use num_bigint::BigUint;
use sniper_core::{RaydiumPoolKeys, RelayKind};
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

struct Harness {
    pipeline: EventPipeline,
    tracker: TrackerStore,
    ledger: ChunkLedger,
    blockhash: Arc<LatestBlockhash>,
    tables: Arc<MockLookupTables>,
    intents: UnboundedReceiver<TradeIntent>,
    bot: Pubkey,
    keys: RaydiumPoolKeys,
}

fn harness(reserve: u64) -> Harness {
    let bot = Pubkey::new_unique();
    let keys = RaydiumPoolKeys::mock(Pubkey::new_unique(), Pubkey::new_unique());
    let config = Arc::new(StrategyConfig {
        bot_identity: bot,
        buy_delay: Duration::from_millis(250),
        ..StrategyConfig::default()
    });

    let kv = Arc::new(MemoryKv::new());
    let tracker = TrackerStore::new(kv.clone());
    let ledger = ChunkLedger::new(kv);
    let blockhash = Arc::new(LatestBlockhash::new());
    let pools = Arc::new(MockPools::default().with_pool(keys.clone(), reserve));
    let tables = Arc::new(MockLookupTables::default());
    let (sink, intents) = IntentSink::channel();

    let decision = TradeDecisionEngine::new(
        config.clone(),
        tracker.clone(),
        ledger.clone(),
        Arc::new(RecordingWatcher::default()),
        sink.clone(),
    );
    let pipeline = EventPipeline::new(
        config,
        blockhash.clone(),
        tracker.clone(),
        decision,
        pools,
        tables.clone(),
        sink,
    );

    Harness {
        pipeline,
        tracker,
        ledger,
        blockhash,
        tables,
        intents,
        bot,
        keys,
    }
}

#[tokio::test]
async fn test_untracked_pool_buy_pressure_fires_sniper() {
    let mut h = harness(10_000_000_000);
    let trader = Pubkey::new_unique();

    h.pipeline
        .process_event(&swap_event(&h.keys, &trader, -8_000_000, 20_000_000))
        .await;

    let intent = h.intents.try_recv().unwrap();
    assert_eq!(intent.origin, IntentOrigin::Sniper);
    assert_eq!(intent.compute.micro_lamports, 15_400_000);
    assert_eq!(intent.compute.tip_lamports, 1_000_000);
    assert_eq!(intent.min_amount_out, 400_000);
    assert!(h.intents.try_recv().is_err());
    assert_eq!(h.tracker.status(&h.keys.amm_id).unwrap(), TrackerStatus::Untracked);
}

#[tokio::test]
async fn test_own_fill_creates_chunk_through_pipeline() {
    let mut h = harness(10_000_000_000);
    let bot = h.bot;

    h.pipeline
        .process_event(&swap_event(&h.keys, &bot, -1_000_000_000, 300_000_000))
        .await;

    let chunk = h.ledger.get(&h.keys.amm_id).unwrap().unwrap();
    assert_eq!(chunk.total, BigUint::from(1_000_000_000u64));
    assert_eq!(chunk.chunk_size, BigUint::from(100_000_000u64));
    assert_eq!(h.tracker.status(&h.keys.amm_id).unwrap(), TrackerStatus::TrackedBoth);
    assert!(h.intents.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_withdraw_draining_paused_pool_unpauses_without_buying() {
    let mut h = harness(200_000_000);
    h.tracker.set_status(&h.keys.amm_id, TrackerStatus::Paused).unwrap();

    h.pipeline.process_event(&withdraw_event(&h.keys.amm_id)).await;

    assert_eq!(h.tracker.status(&h.keys.amm_id).unwrap(), TrackerStatus::Untracked);
    assert!(h.intents.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_withdraw_with_liquidity_left_buys() {
    let mut h = harness(5_000_000_000);
    h.tracker.set_status(&h.keys.amm_id, TrackerStatus::Paused).unwrap();

    let started = tokio::time::Instant::now();
    h.pipeline.process_event(&withdraw_event(&h.keys.amm_id)).await;
    assert!(started.elapsed() >= Duration::from_millis(250));

    assert_eq!(h.tracker.status(&h.keys.amm_id).unwrap(), TrackerStatus::Paused);
    let intent = h.intents.try_recv().unwrap();
    assert_eq!(intent.origin, IntentOrigin::WithdrawEntry);
    assert_eq!(intent.side, Side::Buy);
    assert_eq!(intent.amount, 100_000);
    assert_eq!(intent.min_amount_out, 0);
    assert_eq!(intent.compute.micro_lamports, 500_000);
    assert_eq!(intent.compute.units, 85_000);
    assert_eq!(intent.routes, vec![RelayRoute::new(RelayKind::Bloxroute, false)]);
}

#[tokio::test(start_paused = true)]
async fn test_withdraw_on_unknown_pool_is_skipped() {
    let mut h = harness(0);
    h.pipeline.process_event(&withdraw_event(&Pubkey::new_unique())).await;
    assert!(h.intents.try_recv().is_err());
}

#[tokio::test]
async fn test_initialize2_pauses_tracked_pool_only() {
    let h = harness(0);
    let tracked = h.keys.amm_id;
    let untracked = Pubkey::new_unique();
    h.tracker.set_status(&tracked, TrackerStatus::TrackedTriggerOnly).unwrap();

    h.pipeline.process_event(&initialize2_event(&tracked)).await;
    h.pipeline.process_event(&initialize2_event(&untracked)).await;

    assert_eq!(h.tracker.status(&tracked).unwrap(), TrackerStatus::Paused);
    assert!(h.tracker.get(&untracked).unwrap().is_none());
}

#[tokio::test]
async fn test_blockhash_updated_from_every_event() {
    let h = harness(0);
    let event = initialize2_event(&Pubkey::new_unique());
    h.pipeline.process_event(&event).await;
    assert_eq!(h.blockhash.get().unwrap().to_string(), event.recent_blockhash);
}

#[tokio::test]
async fn test_malformed_instructions_are_skipped() {
    let mut h = harness(10_000_000_000);
    let trader = Pubkey::new_unique();

    let mut truncated = swap_event(&h.keys, &trader, -8_000_000, 20_000_000);
    truncated.instructions[0].data.truncate(5);
    h.pipeline.process_event(&truncated).await;

    let mut short_accounts = swap_event(&h.keys, &trader, -8_000_000, 20_000_000);
    short_accounts.instructions[0].accounts.truncate(12);
    h.pipeline.process_event(&short_accounts).await;

    let mut foreign = swap_event(&h.keys, &trader, -8_000_000, 20_000_000);
    foreign.instructions[0].program_id_index = 0;
    h.pipeline.process_event(&foreign).await;

    assert!(h.intents.try_recv().is_err());
}

#[tokio::test]
async fn test_resolve_account_through_lookup_table() {
    let h = harness(0);
    let table = Pubkey::new_unique();
    let target = Pubkey::new_unique();
    let mut addresses: Vec<Pubkey> = (0..5).map(|_| Pubkey::new_unique()).collect();
    addresses[3] = target;
    h.tables.tables.insert(table, Arc::new(addresses));

    let event = swap_event_via_lookup(&table, 3, &Pubkey::new_unique());
    let ix = &event.instructions[0];

    let resolved = h.pipeline.resolve_account(&event, ix, 1).await.unwrap();
    assert_eq!(resolved, target);
    assert_eq!(h.tables.fetches.load(Ordering::SeqCst), 1);

    // Position 0 is a static key
    let signer = h.pipeline.resolve_account(&event, ix, 0).await.unwrap();
    assert_eq!(signer.to_string(), event.account_keys[0]);
}

#[tokio::test]
async fn test_loaded_addresses_list_writable_before_readonly() {
    let h = harness(0);
    let (first, second) = (Pubkey::new_unique(), Pubkey::new_unique());
    let a: Vec<Pubkey> = (0..4).map(|_| Pubkey::new_unique()).collect();
    let b: Vec<Pubkey> = (0..4).map(|_| Pubkey::new_unique()).collect();
    h.tables.tables.insert(first, Arc::new(a.clone()));
    h.tables.tables.insert(second, Arc::new(b.clone()));

    let mut event = swap_event_via_lookup(&first, 0, &Pubkey::new_unique());
    event.address_table_lookups = vec![
        sniper_core::AddressTableLookup {
            account_key: first.to_string(),
            writable_indexes: vec![1],
            readonly_indexes: vec![2],
        },
        sniper_core::AddressTableLookup {
            account_key: second.to_string(),
            writable_indexes: vec![3],
            readonly_indexes: vec![0],
        },
    ];
    // Static keys occupy 0 and 1; loaded order is a[1], b[3], a[2], b[0]
    event.instructions[0].accounts = vec![2, 3, 4, 5, 6];
    let ix = event.instructions[0].clone();

    let mut resolved = Vec::new();
    for position in 0..4 {
        resolved.push(h.pipeline.resolve_account(&event, &ix, position).await.unwrap());
    }
    assert_eq!(resolved, vec![a[1], b[3], a[2], b[0]]);

    assert!(matches!(
        h.pipeline.resolve_account(&event, &ix, 4).await,
        Err(ResolveError::OutOfRange(6))
    ));
    assert!(matches!(
        h.pipeline.resolve_account(&event, &ix, 9).await,
        Err(ResolveError::MissingPosition { position: 9, len: 5 })
    ));
}
