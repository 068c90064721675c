use dashmap::DashSet;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use tracing::{debug, error, info, warn};

use sniper_core::constants::RAYDIUM_V4_PROGRAM;
use sniper_core::telemetry::STREAM_CONNECTED;
use sniper_core::RawEvent;
use strategy::ports::PoolWatcher;

use crate::config::StreamSource;

const MAX_RETRY_SECS: u64 = 60;

fn subscribe_request(id: u64, accounts: &[String]) -> Value {
    json!({
        "jsonrpc": "2.0", "id": id, "method": "transactionSubscribe",
        "params": [{ "accounts": accounts, "failed": false }, { "commitment": "processed" }]
    })
}

/// Extract the transaction carried by a notification frame, tagged with the
/// source it arrived on. Subscription acks and other frames yield `None`.
pub fn parse_notification(text: &str, source: &str) -> Option<RawEvent> {
    let frame: Value = serde_json::from_str(text).ok()?;
    if frame.get("method").and_then(|m| m.as_str()) != Some("transactionNotification") {
        return None;
    }
    let result = frame.get("params")?.get("result")?.clone();
    let mut event: RawEvent = match serde_json::from_value(result) {
        Ok(event) => event,
        Err(e) => {
            debug!("[{}] undecodable notification: {}", source, e);
            return None;
        }
    };
    if event.source.is_empty() {
        event.source = source.to_string();
    }
    Some(event)
}

/// Mempool subscription client. One connection per source, each feeding the
/// shared event queue and carrying every per-pool subscription.
pub struct MempoolStream {
    sources: Vec<StreamSource>,
    events: UnboundedSender<RawEvent>,
    watched: Arc<DashSet<Pubkey>>,
    subscribers: Vec<UnboundedSender<Pubkey>>,
    pending: Vec<UnboundedReceiver<Pubkey>>,
}

/// Cloneable handle that adds pools to every live connection.
#[derive(Clone)]
pub struct StreamWatcher {
    watched: Arc<DashSet<Pubkey>>,
    subscribers: Vec<UnboundedSender<Pubkey>>,
}

impl PoolWatcher for StreamWatcher {
    fn watch_pool(&self, amm_id: Pubkey) {
        if !self.watched.insert(amm_id) {
            return;
        }
        info!("👀 {} | subscribing to pool transactions", amm_id);
        for tx in &self.subscribers {
            let _ = tx.send(amm_id);
        }
    }
}

impl MempoolStream {
    pub fn new(sources: Vec<StreamSource>, events: UnboundedSender<RawEvent>) -> Self {
        let (subscribers, pending) = sources.iter().map(|_| mpsc::unbounded_channel()).unzip();
        Self {
            sources,
            events,
            watched: Arc::new(DashSet::new()),
            subscribers,
            pending,
        }
    }

    pub fn watcher(&self) -> StreamWatcher {
        StreamWatcher {
            watched: Arc::clone(&self.watched),
            subscribers: self.subscribers.clone(),
        }
    }

    pub fn spawn(self) -> Vec<JoinHandle<()>> {
        let watched = self.watched;
        let events = self.events;
        self.sources
            .into_iter()
            .zip(self.pending)
            .map(|(source, subscriptions)| {
                let connection = SourceConnection {
                    source,
                    events: events.clone(),
                    watched: Arc::clone(&watched),
                };
                tokio::spawn(connection.run(subscriptions))
            })
            .collect()
    }
}

struct SourceConnection {
    source: StreamSource,
    events: UnboundedSender<RawEvent>,
    watched: Arc<DashSet<Pubkey>>,
}

impl SourceConnection {
    async fn run(self, mut subscriptions: UnboundedReceiver<Pubkey>) {
        let name = self.source.name.as_str();
        info!("📡 [{}] Starting mempool stream: {}", name, self.source.url);
        let mut retry_delay = 2;

        loop {
            let (ws_stream, _) = match connect_async(self.source.url.as_str()).await {
                Ok(s) => {
                    retry_delay = 2;
                    s
                }
                Err(e) => {
                    let jitter = rand::random::<u64>() % 1000;
                    error!("❌ [{}] Stream connect failed: {}. Retrying in {}s...", name, e, retry_delay);
                    tokio::time::sleep(Duration::from_millis(retry_delay * 1000 + jitter)).await;
                    retry_delay = (retry_delay * 2).min(MAX_RETRY_SECS);
                    continue;
                }
            };
            STREAM_CONNECTED.inc();

            let (mut write, mut read) = ws_stream.split();
            let mut req_id = 1u64;

            // Program-wide subscription, then every pool watched so far
            let mut initial = vec![subscribe_request(req_id, &[RAYDIUM_V4_PROGRAM.to_string()])];
            for pool in self.watched.iter() {
                req_id += 1;
                initial.push(subscribe_request(req_id, &[pool.key().to_string()]));
            }
            for sub in initial {
                if let Err(e) = write.send(Message::Text(sub.to_string().into())).await {
                    error!("❌ [{}] Subscription send failed: {}", name, e);
                }
            }
            info!("👂 [{}] Stream ONLINE. {} pool subscriptions", name, req_id - 1);

            loop {
                tokio::select! {
                    Some(pool) = subscriptions.recv() => {
                        req_id += 1;
                        let sub = subscribe_request(req_id, &[pool.to_string()]);
                        if let Err(e) = write.send(Message::Text(sub.to_string().into())).await {
                            error!("❌ [{}] Failed pool sub send for {}: {}", name, pool, e);
                        }
                    }

                    msg = read.next() => {
                        match msg {
                            Some(Ok(Message::Text(text))) => {
                                if let Some(event) = parse_notification(&text, name) {
                                    if self.events.send(event).is_err() {
                                        warn!("[{}] Event queue closed, stopping stream", name);
                                        STREAM_CONNECTED.dec();
                                        return;
                                    }
                                }
                            }
                            Some(Ok(Message::Ping(payload))) => {
                                let _ = write.send(Message::Pong(payload)).await;
                            }
                            Some(Ok(Message::Close(_))) | Some(Err(_)) | None => {
                                warn!("📡 [{}] Stream DISRUPTED. Reconnecting...", name);
                                break;
                            }
                            _ => {}
                        }
                    }
                }
            }
            STREAM_CONNECTED.dec();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_notification_tags_source() {
        let text = r#"{"jsonrpc":"2.0","method":"transactionNotification","params":{"subscription":3,
            "result":{"signature":"sig1","recentBlockhash":"","accountKeys":["a"],"instructions":[]}}}"#;
        let event = parse_notification(text, "triton").unwrap();
        assert_eq!(event.signature, "sig1");
        assert_eq!(event.source, "triton");
    }

    #[test]
    fn test_ack_and_garbage_are_ignored() {
        assert!(parse_notification(r#"{"jsonrpc":"2.0","id":1,"result":42}"#, "x").is_none());
        assert!(parse_notification("not json", "x").is_none());
        let missing_fields = r#"{"method":"transactionNotification","params":{"result":{"slot":1}}}"#;
        assert!(parse_notification(missing_fields, "x").is_none());
    }

    #[test]
    fn test_watch_pool_fans_out_once() {
        let (events, _rx) = mpsc::unbounded_channel();
        let sources = vec![
            StreamSource { name: "a".into(), url: "wss://a".into() },
            StreamSource { name: "b".into(), url: "wss://b".into() },
        ];
        let mut stream = MempoolStream::new(sources, events);
        let watcher = stream.watcher();

        let pool = Pubkey::new_unique();
        watcher.watch_pool(pool);
        watcher.watch_pool(pool);

        for pending in stream.pending.iter_mut() {
            assert_eq!(pending.try_recv().unwrap(), pool);
            assert!(pending.try_recv().is_err());
        }
    }

    #[test]
    fn test_subscribe_request_shape() {
        let req = subscribe_request(7, &["pool".to_string()]);
        assert_eq!(req["method"], "transactionSubscribe");
        assert_eq!(req["id"], 7);
        assert_eq!(req["params"][0]["accounts"][0], "pool");
    }
}
