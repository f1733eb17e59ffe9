//! Visualisation fan-out: per-subscriber bounded outbox plus a small actor
//! that drains it to the transport. The engine tick only enqueues — it never
//! waits on a slow subscriber.
//!
//! The teacher embeds subscriber state directly in its long-lived WebSocket
//! handler (`handle_ws` in `uwb-simulator/main.rs`); here each subscriber
//! additionally owns a bounded mailbox so one slow browser tab can't stall
//! the others or the tick.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::sync::{mpsc, RwLock};
use tracing::{info, warn};

/// Per-subscriber outbox depth (§4.8).
pub const OUTBOX_CAPACITY: usize = 32;
/// A subscriber whose outbox is continuously full for this long is evicted.
const EVICTION_GRACE: Duration = Duration::from_secs(10);

pub type SubscriberId = u64;

struct Subscriber {
    tx: mpsc::Sender<Value>,
    drop_count: Arc<AtomicU64>,
    full_since: Option<Instant>,
}

/// Registry of connected duplex-stream subscribers.
#[derive(Clone)]
pub struct Fanout {
    subscribers: Arc<RwLock<HashMap<SubscriberId, Subscriber>>>,
    next_id: Arc<AtomicU64>,
}

pub struct Subscription {
    pub id: SubscriberId,
    pub rx: mpsc::Receiver<Value>,
    pub drop_count: Arc<AtomicU64>,
}

impl Default for Fanout {
    fn default() -> Self {
        Self::new()
    }
}

impl Fanout {
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Register a new subscriber and return its receiving half.
    pub async fn register(&self) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(OUTBOX_CAPACITY);
        let drop_count = Arc::new(AtomicU64::new(0));
        self.subscribers.write().await.insert(
            id,
            Subscriber { tx, drop_count: Arc::clone(&drop_count), full_since: None },
        );
        Subscription { id, rx, drop_count }
    }

    pub async fn unregister(&self, id: SubscriberId) {
        self.subscribers.write().await.remove(&id);
    }

    /// Non-blocking enqueue to every subscriber. Frames are dropped (and
    /// counted) for any subscriber whose outbox is full; a subscriber that
    /// stays full for [`EVICTION_GRACE`] is evicted.
    pub async fn broadcast(&self, frame: Value) {
        let mut subscribers = self.subscribers.write().await;
        let mut evicted = Vec::new();

        for (&id, sub) in subscribers.iter_mut() {
            match sub.tx.try_send(frame.clone()) {
                Ok(()) => sub.full_since = None,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    sub.drop_count.fetch_add(1, Ordering::Relaxed);
                    let since = *sub.full_since.get_or_insert_with(Instant::now);
                    if since.elapsed() >= EVICTION_GRACE {
                        evicted.push(id);
                    }
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    evicted.push(id);
                }
            }
        }

        for id in evicted {
            subscribers.remove(&id);
            warn!(subscriber_id = id, "subscriber evicted: outbox full for > 10s");
        }
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn registered_subscriber_receives_broadcast_frames() {
        let fanout = Fanout::new();
        let mut sub = fanout.register().await;
        fanout.broadcast(serde_json::json!({"type": "platform_update"})).await;
        let frame = sub.rx.recv().await.unwrap();
        assert_eq!(frame["type"], "platform_update");
    }

    #[tokio::test]
    async fn full_outbox_drops_and_counts_without_blocking() {
        let fanout = Fanout::new();
        let sub = fanout.register().await;
        for _ in 0..(OUTBOX_CAPACITY + 5) {
            fanout.broadcast(serde_json::json!({"type": "platform_update"})).await;
        }
        assert!(sub.drop_count.load(Ordering::Relaxed) > 0);
    }

    #[tokio::test]
    async fn unregister_removes_subscriber() {
        let fanout = Fanout::new();
        let sub = fanout.register().await;
        assert_eq!(fanout.subscriber_count().await, 1);
        fanout.unregister(sub.id).await;
        assert_eq!(fanout.subscriber_count().await, 0);
    }
}
