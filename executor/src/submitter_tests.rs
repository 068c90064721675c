use super::*;
use parking_lot::Mutex;
use solana_sdk::{hash::Hash, signature::Signature, transaction::Transaction};
use std::time::Duration;

use sniper_core::{ComputeBudget, IntentOrigin, RaydiumPoolKeys};

#[derive(Default)]
struct RecordingBuilder {
    tips: Mutex<Vec<Option<Pubkey>>>,
}

impl SwapBuilder for RecordingBuilder {
    fn build_swap(
        &self,
        _keys: &RaydiumPoolKeys,
        _wsol_account: &Pubkey,
        _compute: &ComputeBudget,
        options: &SwapOptions,
        _amount: u64,
        _min_amount_out: u64,
        _side: Side,
    ) -> Result<(Vec<Signature>, Transaction)> {
        self.tips.lock().push(options.tip_account);
        Ok((vec![Signature::new_unique()], Transaction::default()))
    }

    fn payer(&self) -> Pubkey {
        Pubkey::default()
    }
}

struct MockRelay {
    kind: RelayKind,
    tip: Option<Pubkey>,
    fail: bool,
    calls: Mutex<Vec<bool>>,
}

impl MockRelay {
    fn new(kind: RelayKind, fail: bool) -> Arc<Self> {
        Arc::new(Self {
            kind,
            tip: Some(Pubkey::new_unique()),
            fail,
            calls: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait::async_trait]
impl Relay for MockRelay {
    fn kind(&self) -> RelayKind {
        self.kind
    }

    fn tip_account(&self) -> Option<Pubkey> {
        self.tip
    }

    async fn submit(&self, _tx: &Transaction, privileged: bool) -> Result<String> {
        self.calls.lock().push(privileged);
        if self.fail {
            Err(anyhow!("connection refused"))
        } else {
            Ok("accepted".to_string())
        }
    }
}

fn intent(routes: Vec<RelayRoute>) -> TradeIntent {
    TradeIntent {
        origin: IntentOrigin::BatchExit,
        pool_keys: RaydiumPoolKeys::mock(Pubkey::new_unique(), Pubkey::new_unique()),
        side: Side::Sell,
        amount: 1_000,
        min_amount_out: 50_000,
        compute: ComputeBudget {
            micro_lamports: 1_005,
            units: 45_000,
            tip_lamports: 0,
        },
        routes,
        trigger: None,
    }
}

fn blockhash() -> Arc<LatestBlockhash> {
    let latest = Arc::new(LatestBlockhash::new());
    latest.set(Hash::new_unique());
    latest
}

#[tokio::test]
async fn test_fans_out_to_every_route() {
    let builder = Arc::new(RecordingBuilder::default());
    let blox = MockRelay::new(RelayKind::Bloxroute, false);
    let jito = MockRelay::new(RelayKind::Jito, true);
    let submitter = Submitter::new(
        builder.clone(),
        vec![blox.clone(), jito.clone()],
        blockhash(),
        Pubkey::new_unique(),
    );

    let outcomes = submitter
        .execute(&intent(vec![
            RelayRoute::new(RelayKind::Bloxroute, false),
            RelayRoute::new(RelayKind::Jito, true),
        ]))
        .await
        .unwrap();

    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().any(|o| o.relay == RelayKind::Bloxroute && o.result.is_ok()));
    assert!(outcomes.iter().any(|o| o.relay == RelayKind::Jito && o.result.is_err()));
    assert_eq!(*blox.calls.lock(), vec![false]);
    assert_eq!(*jito.calls.lock(), vec![true]);

    // Tip goes to the first route's relay
    assert_eq!(*builder.tips.lock(), vec![blox.tip]);
}

#[tokio::test]
async fn test_missing_blockhash_abandons_intent() {
    let blox = MockRelay::new(RelayKind::Bloxroute, false);
    let submitter = Submitter::new(
        Arc::new(RecordingBuilder::default()),
        vec![blox.clone()],
        Arc::new(LatestBlockhash::new()),
        Pubkey::new_unique(),
    );

    let result = submitter
        .execute(&intent(vec![RelayRoute::new(RelayKind::Bloxroute, true)]))
        .await;
    assert!(result.is_err());
    assert!(blox.calls.lock().is_empty());
}

#[tokio::test]
async fn test_unconfigured_route_is_skipped() {
    let blox = MockRelay::new(RelayKind::Bloxroute, false);
    let submitter = Submitter::new(
        Arc::new(RecordingBuilder::default()),
        vec![blox.clone()],
        blockhash(),
        Pubkey::new_unique(),
    );

    let outcomes = submitter
        .execute(&intent(vec![
            RelayRoute::new(RelayKind::Jito, false),
            RelayRoute::new(RelayKind::Bloxroute, false),
        ]))
        .await
        .unwrap();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].relay, RelayKind::Bloxroute);

    let none = submitter
        .execute(&intent(vec![RelayRoute::new(RelayKind::Jito, false)]))
        .await;
    assert!(none.is_err());
}

#[tokio::test]
async fn test_mirror_receives_every_transaction() {
    let blox = MockRelay::new(RelayKind::Bloxroute, false);
    let mirror = MockRelay::new(RelayKind::Rpc, false);
    let submitter = Submitter::new(
        Arc::new(RecordingBuilder::default()),
        vec![blox.clone()],
        blockhash(),
        Pubkey::new_unique(),
    )
    .with_mirror(mirror.clone());

    let outcomes = submitter
        .execute(&intent(vec![RelayRoute::new(RelayKind::Bloxroute, true)]))
        .await
        .unwrap();
    assert_eq!(outcomes.len(), 2);
    assert_eq!(*mirror.calls.lock(), vec![false]);
}

#[tokio::test]
async fn test_spawned_worker_drains_queue() {
    let blox = MockRelay::new(RelayKind::Bloxroute, false);
    let submitter = Arc::new(Submitter::new(
        Arc::new(RecordingBuilder::default()),
        vec![blox.clone()],
        blockhash(),
        Pubkey::new_unique(),
    ));

    let (sink, rx) = strategy::IntentSink::channel();
    let handle = submitter.spawn(rx);
    for _ in 0..3 {
        assert!(sink.emit(intent(vec![RelayRoute::new(RelayKind::Bloxroute, false)])));
    }

    for _ in 0..50 {
        if blox.calls.lock().len() == 3 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(blox.calls.lock().len(), 3);

    drop(sink);
    handle.await.unwrap();
}
