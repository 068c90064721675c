use anyhow::{anyhow, Result};
use futures_util::future::join_all;
use solana_sdk::pubkey::Pubkey;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use sniper_core::telemetry::RELAY_SUBMISSIONS;
use sniper_core::{RelayKind, RelayRoute, Side, TradeIntent};
use strategy::ports::{Relay, SwapBuilder, SwapOptions};
use strategy::LatestBlockhash;

/// Result of one relay submission.
#[derive(Debug)]
pub struct RouteOutcome {
    pub relay: RelayKind,
    pub result: Result<String>,
}

/// Drains trade intents, builds each swap once, and submits it to every
/// route of the intent concurrently.
pub struct Submitter {
    builder: Arc<dyn SwapBuilder>,
    relays: HashMap<RelayKind, Arc<dyn Relay>>,
    blockhash: Arc<LatestBlockhash>,
    wsol_account: Pubkey,
    mirror: Option<Arc<dyn Relay>>,
}

impl Submitter {
    pub fn new(
        builder: Arc<dyn SwapBuilder>,
        relays: Vec<Arc<dyn Relay>>,
        blockhash: Arc<LatestBlockhash>,
        wsol_account: Pubkey,
    ) -> Self {
        let relays = relays.into_iter().map(|r| (r.kind(), r)).collect();
        Self {
            builder,
            relays,
            blockhash,
            wsol_account,
            mirror: None,
        }
    }

    /// Also send every transaction through `mirror`, outside the routed set.
    pub fn with_mirror(mut self, mirror: Arc<dyn Relay>) -> Self {
        self.mirror = Some(mirror);
        self
    }

    pub fn spawn(self: Arc<Self>, mut rx: UnboundedReceiver<TradeIntent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(intent) = rx.recv().await {
                let submitter = self.clone();
                tokio::spawn(async move {
                    if let Err(e) = submitter.execute(&intent).await {
                        error!(
                            "❌ {} | {} {} amount={} abandoned: {}",
                            intent.pool(),
                            intent.origin,
                            side_label(intent.side),
                            intent.amount,
                            e
                        );
                    }
                });
            }
            warn!("Intent queue closed, submitter stopping");
        })
    }

    fn relay(&self, kind: RelayKind) -> Option<&Arc<dyn Relay>> {
        self.relays.get(&kind)
    }

    /// Build and submit one intent. Fails only when no transaction could be
    /// built; individual relay failures are reported in the outcomes.
    pub async fn execute(&self, intent: &TradeIntent) -> Result<Vec<RouteOutcome>> {
        let recent_blockhash = self
            .blockhash
            .get()
            .ok_or_else(|| anyhow!("no blockhash observed yet"))?;

        let routes: Vec<(RelayRoute, Arc<dyn Relay>)> = intent
            .routes
            .iter()
            .filter_map(|route| match self.relay(route.relay) {
                Some(relay) => Some((*route, relay.clone())),
                None => {
                    warn!("⚠️ {} | relay {} not configured, skipping route", intent.pool(), route.relay);
                    None
                }
            })
            .collect();
        if routes.is_empty() && self.mirror.is_none() {
            return Err(anyhow!("no configured relay for routes {:?}", intent.routes));
        }

        let options = SwapOptions {
            recent_blockhash,
            tip_account: routes.first().and_then(|(_, relay)| relay.tip_account()),
        };
        let (signatures, tx) = self.builder.build_swap(
            &intent.pool_keys,
            &self.wsol_account,
            &intent.compute,
            &options,
            intent.amount,
            intent.min_amount_out,
            intent.side,
        )?;

        let signature = signatures
            .first()
            .map(|s| s.to_string())
            .unwrap_or_default();
        info!(
            "{} | {} | {} | {}",
            intent.pool(),
            side_label(intent.side),
            intent.origin,
            signature
        );

        let mut sends: Vec<(RelayRoute, Arc<dyn Relay>)> = routes;
        if let Some(mirror) = &self.mirror {
            sends.push((RelayRoute::new(mirror.kind(), false), mirror.clone()));
        }

        let tx = &tx;
        let outcomes = join_all(sends.into_iter().map(|(route, relay)| async move {
            let result = relay.submit(tx, route.privileged).await;
            RouteOutcome {
                relay: route.relay,
                result,
            }
        }))
        .await;

        for outcome in &outcomes {
            let relay = outcome.relay.to_string();
            match &outcome.result {
                Ok(id) => {
                    RELAY_SUBMISSIONS.with_label_values(&[&relay, "ok"]).inc();
                    info!("🚀 {} | {} accepted {} ({})", intent.pool(), relay, signature, id);
                }
                Err(e) => {
                    RELAY_SUBMISSIONS.with_label_values(&[&relay, "error"]).inc();
                    error!(
                        "❌ {} | {} rejected {} amount={}: {}",
                        intent.pool(),
                        relay,
                        signature,
                        intent.amount,
                        e
                    );
                }
            }
        }

        Ok(outcomes)
    }
}

fn side_label(side: Side) -> &'static str {
    match side {
        Side::Buy => "BUY",
        Side::Sell => "SELL",
    }
}

#[cfg(test)]
#[path = "submitter_tests.rs"]
mod submitter_tests;
