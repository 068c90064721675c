use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{info, warn};

use sniper_core::telemetry::INTENTS_EMITTED;
use sniper_core::{Side, TradeIntent};

/// Sending half of the unbounded intent queue. Never blocks.
#[derive(Clone)]
pub struct IntentSink {
    tx: UnboundedSender<TradeIntent>,
}

impl IntentSink {
    pub fn channel() -> (Self, UnboundedReceiver<TradeIntent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn emit(&self, intent: TradeIntent) -> bool {
        let side = match intent.side {
            Side::Buy => "buy",
            Side::Sell => "sell",
        };
        INTENTS_EMITTED
            .with_label_values(&[&intent.origin.to_string(), side])
            .inc();
        info!(
            "🎯 {} | {} {} amount={} min_out={} cu_price={} tip={}",
            intent.pool(),
            intent.origin,
            side.to_uppercase(),
            intent.amount,
            intent.min_amount_out,
            intent.compute.micro_lamports,
            intent.compute.tip_lamports
        );

        if let Err(e) = self.tx.send(intent) {
            warn!("⚠️ {} | intent queue closed, dropping {} intent", e.0.pool(), e.0.origin);
            return false;
        }
        true
    }
}
