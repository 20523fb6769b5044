use super::PlaybackProgress;
use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex,
};
use tokio::sync::mpsc as tokio_mpsc;
use tracing::info;

type SubscriptionId = u64;

struct Subscription {
    /// Only updates for this content item, or everything when None
    content_id: Option<String>,
    tx: tokio_mpsc::UnboundedSender<PlaybackProgress>,
}

impl Subscription {
    fn wants(&self, progress: &PlaybackProgress) -> bool {
        match &self.content_id {
            None => true,
            Some(wanted) => progress.content_id() == Some(wanted.as_str()),
        }
    }
}

/// Fan-out of playback updates to any number of subscribers
#[derive(Clone)]
pub struct PlaybackProgressHandle {
    subscriptions: Arc<Mutex<HashMap<SubscriptionId, Subscription>>>,
    next_id: Arc<AtomicU64>,
}

impl PlaybackProgressHandle {
    /// Spawn the dispatch task draining `progress_rx`
    pub fn new(
        mut progress_rx: tokio_mpsc::UnboundedReceiver<PlaybackProgress>,
        runtime_handle: tokio::runtime::Handle,
    ) -> Self {
        let subscriptions: Arc<Mutex<HashMap<SubscriptionId, Subscription>>> =
            Arc::new(Mutex::new(HashMap::new()));
        let dispatch_subscriptions = subscriptions.clone();

        runtime_handle.spawn(async move {
            while let Some(progress) = progress_rx.recv().await {
                let mut subs = dispatch_subscriptions.lock().unwrap();
                // A failed send means the receiver was dropped
                subs.retain(|_, subscription| {
                    !subscription.wants(&progress) || subscription.tx.send(progress.clone()).is_ok()
                });
            }
            info!("Playback progress channel closed, exiting");
        });

        Self {
            subscriptions,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Every update, for every content item
    pub fn subscribe_all(&self) -> tokio_mpsc::UnboundedReceiver<PlaybackProgress> {
        self.subscribe(None)
    }

    /// Updates about one content item only
    pub fn subscribe_content(
        &self,
        content_id: impl Into<String>,
    ) -> tokio_mpsc::UnboundedReceiver<PlaybackProgress> {
        self.subscribe(Some(content_id.into()))
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscriptions.lock().unwrap().len()
    }

    fn subscribe(
        &self,
        content_id: Option<String>,
    ) -> tokio_mpsc::UnboundedReceiver<PlaybackProgress> {
        let (tx, rx) = tokio_mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.subscriptions
            .lock()
            .unwrap()
            .insert(id, Subscription { content_id, tx });
        rx
    }
}
