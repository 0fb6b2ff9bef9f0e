use std::fmt::Debug;
use std::hash::Hash;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::trace;
use tracing::warn;

use crate::FanoutConfig;
use crate::ModifiedKeys;

/// Bounds for the logical ids subscriptions are keyed by
pub trait LogicalId: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> LogicalId for T where T: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

/// Notification for one mutation: which node keys it touched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent<I, K> {
    /// Logical id the event was emitted on
    pub id: I,
    /// Keys of every node whose value or neighbor list changed
    pub modified: ModifiedKeys<K>,
}

/// Outcome of one [`ChangeFanout::emit`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitReport {
    /// Subscribers that accepted the event
    pub delivered: usize,
    /// Subscribers whose buffer was full
    pub dropped: usize,
    /// Subscribers whose receiver was gone; they were pruned
    pub closed: usize,
}

struct Subscriber<I, K> {
    id: u64,
    sender: mpsc::Sender<ChangeEvent<I, K>>,
    dropped: Arc<AtomicU64>,
}

struct FanoutInner<I, K> {
    /// Subscribers grouped by logical id
    subscribers: DashMap<I, Vec<Subscriber<I, K>>>,
    /// Next subscription id (monotonically increasing)
    next_id: AtomicU64,
    config: FanoutConfig,
}

impl<I: LogicalId, K> FanoutInner<I, K> {
    /// Drops the subscriber's sender, removing the id's list once it is empty.
    ///
    /// `remove_if_mut` checks and removes under one shard lock, so a
    /// subscriber registered in between is never lost.
    fn unregister(
        &self,
        logical_id: &I,
        subscription_id: u64,
    ) -> bool {
        let mut found = false;
        self.subscribers.remove_if_mut(logical_id, |_, subscribers| {
            let before = subscribers.len();
            subscribers.retain(|s| s.id != subscription_id);
            found = subscribers.len() != before;
            subscribers.is_empty()
        });
        found
    }
}

/// Per-logical-id delivery of change events to every current subscriber.
///
/// Cloning is cheap and every clone shares the same subscriber table.
pub struct ChangeFanout<I, K> {
    inner: Arc<FanoutInner<I, K>>,
}

impl<I, K> Clone for ChangeFanout<I, K> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<I: LogicalId, K> Debug for ChangeFanout<I, K> {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("ChangeFanout")
            .field("watched_ids", &self.inner.subscribers.len())
            .field("next_id", &self.inner.next_id)
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl<I: LogicalId, K: Clone + Send + Sync + 'static> ChangeFanout<I, K> {
    pub fn new(config: FanoutConfig) -> Self {
        Self {
            inner: Arc::new(FanoutInner {
                subscribers: DashMap::new(),
                next_id: AtomicU64::new(1),
                config,
            }),
        }
    }

    /// Registers a new subscriber for `logical_id`.
    ///
    /// The returned subscription unsubscribes itself when dropped.
    pub fn subscribe(
        &self,
        logical_id: I,
    ) -> Subscription<I, K> {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let buffer_size = self.inner.config.subscriber_buffer_size;
        let (sender, receiver) = mpsc::channel(buffer_size);
        let dropped = Arc::new(AtomicU64::new(0));

        self.inner.subscribers.entry(logical_id.clone()).or_default().push(Subscriber {
            id,
            sender,
            dropped: Arc::clone(&dropped),
        });

        trace!(
            subscription_id = id,
            logical_id = ?logical_id,
            buffer_size,
            "Subscriber registered"
        );

        Subscription {
            guard: SubscriptionGuard {
                id,
                logical_id,
                dropped,
                fanout: Arc::clone(&self.inner),
            },
            receiver,
        }
    }

    /// Stops delivery to one subscriber and closes its sink.
    ///
    /// Returns false if it was already gone.
    pub fn unsubscribe(
        &self,
        logical_id: &I,
        subscription_id: u64,
    ) -> bool {
        let found = self.inner.unregister(logical_id, subscription_id);
        trace!(
            subscription_id,
            logical_id = ?logical_id,
            found,
            "Subscriber unregistered"
        );
        found
    }

    /// Delivers `modified` to every subscriber of `logical_id` without
    /// blocking. Subscribers with a full buffer miss this event; subscribers
    /// whose receiver is gone are pruned.
    pub fn emit(
        &self,
        logical_id: &I,
        modified: ModifiedKeys<K>,
    ) -> EmitReport {
        let mut report = EmitReport::default();

        {
            let Some(mut subscribers) = self.inner.subscribers.get_mut(logical_id) else {
                return report;
            };

            let event = ChangeEvent {
                id: logical_id.clone(),
                modified,
            };

            subscribers.retain(|subscriber| match subscriber.sender.try_send(event.clone()) {
                Ok(()) => {
                    report.delivered += 1;
                    true
                }
                Err(TrySendError::Full(_)) => {
                    report.dropped += 1;
                    let total = subscriber.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                    if self.inner.config.enable_metrics {
                        warn!(
                            subscription_id = subscriber.id,
                            logical_id = ?logical_id,
                            total_dropped = total,
                            "Subscriber buffer full, event dropped"
                        );
                    }
                    true
                }
                Err(TrySendError::Closed(_)) => {
                    report.closed += 1;
                    false
                }
            });
        }

        if report.closed > 0 {
            self.inner.subscribers.remove_if(logical_id, |_, subscribers| subscribers.is_empty());
        }

        trace!(
            logical_id = ?logical_id,
            delivered = report.delivered,
            dropped = report.dropped,
            closed = report.closed,
            "Event dispatched"
        );
        report
    }

    /// Number of live subscribers for `logical_id`
    pub fn subscriber_count(
        &self,
        logical_id: &I,
    ) -> usize {
        self.inner.subscribers.get(logical_id).map(|s| s.len()).unwrap_or(0)
    }

    /// Number of logical ids with at least one subscriber
    pub fn watched_id_count(&self) -> usize {
        self.inner.subscribers.len()
    }
}

/// A live subscription: the event receiver plus its unsubscribe guard.
pub struct Subscription<I: LogicalId, K> {
    guard: SubscriptionGuard<I, K>,
    receiver: mpsc::Receiver<ChangeEvent<I, K>>,
}

impl<I: LogicalId, K> Subscription<I, K> {
    pub fn id(&self) -> u64 {
        self.guard.id
    }

    pub fn logical_id(&self) -> &I {
        &self.guard.logical_id
    }

    /// Events dropped because this subscriber's buffer was full
    pub fn dropped_events(&self) -> u64 {
        self.guard.dropped_events()
    }

    /// Waits for the next event. `None` once unsubscribed and drained.
    pub async fn recv(&mut self) -> Option<ChangeEvent<I, K>> {
        self.receiver.recv().await
    }

    /// Returns the next queued event without waiting
    pub fn try_recv(&mut self) -> Option<ChangeEvent<I, K>> {
        self.receiver.try_recv().ok()
    }

    /// Splits into the raw receiver and the guard that keeps the
    /// subscription registered. Dropping the guard unsubscribes.
    pub fn into_receiver(self) -> (mpsc::Receiver<ChangeEvent<I, K>>, SubscriptionGuard<I, K>) {
        (self.receiver, self.guard)
    }
}

impl<I: LogicalId, K> Debug for Subscription<I, K> {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.guard.id)
            .field("logical_id", &self.guard.logical_id)
            .finish_non_exhaustive()
    }
}

/// Unsubscribes when dropped
pub struct SubscriptionGuard<I: LogicalId, K> {
    id: u64,
    logical_id: I,
    dropped: Arc<AtomicU64>,
    fanout: Arc<FanoutInner<I, K>>,
}

impl<I: LogicalId, K> SubscriptionGuard<I, K> {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn logical_id(&self) -> &I {
        &self.logical_id
    }

    pub fn dropped_events(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl<I: LogicalId, K> Drop for SubscriptionGuard<I, K> {
    fn drop(&mut self) {
        if self.fanout.unregister(&self.logical_id, self.id) {
            trace!(
                subscription_id = self.id,
                logical_id = ?self.logical_id,
                "Subscriber unregistered via guard"
            );
        }
    }
}
