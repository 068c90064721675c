use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use sniper_core::telemetry::{EVENTS_DUPLICATE, EVENTS_RECEIVED, EVENT_LATENCY};
use sniper_core::RawEvent;

use crate::dedup::DedupCache;
use crate::pipeline::EventPipeline;

/// Fixed set of symmetric workers draining the shared event queue.
pub struct DispatchPool {
    workers: usize,
    dedup: DedupCache,
    pipeline: Arc<EventPipeline>,
}

impl DispatchPool {
    pub fn new(workers: usize, dedup: DedupCache, pipeline: Arc<EventPipeline>) -> Self {
        Self {
            workers: workers.max(1),
            dedup,
            pipeline,
        }
    }

    /// Spawn the workers. They exit once the queue is closed and drained.
    pub fn spawn(self, events: UnboundedReceiver<RawEvent>) -> Vec<JoinHandle<()>> {
        info!("🧵 Starting {} event workers", self.workers);
        let events = Arc::new(Mutex::new(events));

        (0..self.workers)
            .map(|id| {
                let events = Arc::clone(&events);
                let dedup = self.dedup.clone();
                let pipeline = Arc::clone(&self.pipeline);
                tokio::spawn(async move {
                    loop {
                        // Only the receive happens under the lock
                        let next = events.lock().await.recv().await;
                        let Some(event) = next else {
                            debug!("worker {} | queue closed", id);
                            break;
                        };
                        handle_event(&dedup, &pipeline, event).await;
                    }
                })
            })
            .collect()
    }
}

async fn handle_event(dedup: &DedupCache, pipeline: &EventPipeline, event: RawEvent) {
    EVENTS_RECEIVED.with_label_values(&[&event.source]).inc();
    if !dedup.should_process(&event.signature) {
        EVENTS_DUPLICATE.inc();
        return;
    }

    let started = Instant::now();
    pipeline.process_event(&event).await;
    EVENT_LATENCY.observe(started.elapsed().as_secs_f64() * 1_000.0);
}
