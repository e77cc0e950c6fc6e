//! Per-application broadcast topics.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, broadcast};
use tracing::debug;

use crate::event::DeployEvent;

/// Events buffered per topic before slow subscribers start skipping.
const CHANNEL_CAPACITY: usize = 64;

/// Handle to one application's event feed.
///
/// Dropping the subscriber unsubscribes it; the topic itself is pruned
/// on the next publish once no subscribers remain.
pub struct Subscriber {
    app: String,
    rx: broadcast::Receiver<DeployEvent>,
}

impl Subscriber {
    /// Waits for the next event. Returns `None` once the topic closes.
    /// A subscriber that lagged behind skips the overwritten events and
    /// continues from the oldest retained one.
    pub async fn recv(&mut self) -> Option<DeployEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(app = %self.app, skipped, "subscriber lagged, catching up");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// The raw receiver, for adapters that need a `Stream`.
    pub fn into_inner(self) -> broadcast::Receiver<DeployEvent> {
        self.rx
    }
}

/// Thread-safe topic map. Cloning is cheap; clones share the topics.
#[derive(Clone, Default)]
pub struct DeployStream {
    topics: Arc<RwLock<HashMap<String, broadcast::Sender<DeployEvent>>>>,
}

impl DeployStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to `app`'s feed, creating the topic if needed.
    pub async fn subscribe(&self, app: &str) -> Subscriber {
        let mut topics = self.topics.write().await;
        let sender = topics
            .entry(app.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        Subscriber {
            app: app.to_string(),
            rx: sender.subscribe(),
        }
    }

    /// Publishes an event to its application's topic.
    ///
    /// Returns how many subscribers received it. Send errors are ignored:
    /// an event with no audience is simply dropped, and the then-empty
    /// topic is pruned.
    pub async fn publish(&self, event: DeployEvent) -> usize {
        let mut topics = self.topics.write().await;
        let Some(sender) = topics.get(&event.app) else {
            return 0;
        };
        let app = event.app.clone();
        let delivered = sender.send(event).unwrap_or(0);
        if sender.receiver_count() == 0 {
            topics.remove(&app);
            debug!(app = %app, "pruned topic with no subscribers");
        }
        delivered
    }

    /// Number of live topics (for observability).
    pub async fn topic_count(&self) -> usize {
        self.topics.read().await.len()
    }

    /// Number of subscribers on one topic.
    pub async fn subscriber_count(&self, app: &str) -> usize {
        let topics = self.topics.read().await;
        topics.get(app).map_or(0, |s| s.receiver_count())
    }
}
