use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Topic(pub &'static str);

#[derive(Debug, Clone)]
pub struct EventEnvelope<T: Clone + Send + Sync + Debug + 'static> {
    pub topic: Topic,
    pub payload: T,
    pub ts_ms: u128,
}

/// Topic-keyed broadcast bus.
///
/// Each bus instance is owned by whoever creates it; there is no process-wide
/// bus. Besides per-topic receivers, `subscribe_all` yields every envelope
/// regardless of topic.
#[derive(Clone)]
pub struct EventBus<T: Clone + Send + Sync + Debug + 'static> {
    inner: Arc<RwLock<Inner<T>>>,
    all: broadcast::Sender<EventEnvelope<T>>,
    subscribe_buffer: usize,
}

struct Inner<T: Clone + Send + Sync + Debug + 'static> {
    topics: HashMap<&'static str, broadcast::Sender<EventEnvelope<T>>>,
}

impl<T: Clone + Send + Sync + Debug + 'static> Default for EventBus<T> {
    fn default() -> Self {
        Self::new(256)
    }
}

impl<T: Clone + Send + Sync + Debug + 'static> EventBus<T> {
    pub fn new(subscribe_buffer: usize) -> Self {
        let subscribe_buffer = subscribe_buffer.max(1);
        let (all, _rx) = broadcast::channel(subscribe_buffer);
        Self {
            inner: Arc::new(RwLock::new(Inner {
                topics: HashMap::new(),
            })),
            all,
            subscribe_buffer,
        }
    }

    async fn sender(&self, topic: Topic) -> broadcast::Sender<EventEnvelope<T>> {
        if let Some(tx) = self.inner.read().await.topics.get(topic.0) {
            return tx.clone();
        }
        let mut inner = self.inner.write().await;
        inner
            .topics
            .entry(topic.0)
            .or_insert_with(|| {
                info!(target: "event_bus", topic = topic.0, "created topic");
                broadcast::channel(self.subscribe_buffer).0
            })
            .clone()
    }

    /// Never blocks; an event with no live receivers is simply dropped
    pub async fn publish(&self, topic: Topic, payload: T) {
        let envelope = EventEnvelope {
            topic,
            payload,
            ts_ms: current_ts_ms(),
        };
        let tx = self.sender(topic).await;
        match tx.send(envelope.clone()) {
            Ok(receivers) => {
                debug!(target: "event_bus", topic = topic.0, receivers, "published")
            }
            Err(_) => trace!(target: "event_bus", topic = topic.0, "no topic subscribers"),
        }
        let _ = self.all.send(envelope);
    }

    pub async fn subscribe(&self, topic: Topic) -> broadcast::Receiver<EventEnvelope<T>> {
        self.sender(topic).await.subscribe()
    }

    pub fn subscribe_all(&self) -> broadcast::Receiver<EventEnvelope<T>> {
        self.all.subscribe()
    }
}

fn current_ts_ms() -> u128 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}
