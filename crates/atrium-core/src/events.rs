//! Observable event bus.
//!
//! Components that need to react to state changes subscribe explicitly and
//! hold a [`Subscription`] for as long as they are mounted. Dropping the
//! subscription (or calling [`EventBus::unsubscribe`]) detaches it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::sync::mpsc;

/// Identifier handed out for each subscription.
pub type SubscriptionId = u64;

struct BusInner<T> {
    next_id: AtomicU64,
    subscribers: Mutex<HashMap<SubscriptionId, mpsc::UnboundedSender<T>>>,
}

impl<T> BusInner<T> {
    fn subscribers(&self) -> MutexGuard<'_, HashMap<SubscriptionId, mpsc::UnboundedSender<T>>> {
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// A fan-out publisher of cloneable events.
///
/// Cloning the bus yields another handle to the same subscriber set.
pub struct EventBus<T> {
    inner: Arc<BusInner<T>>,
}

impl<T> Clone for EventBus<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Send + 'static> Default for EventBus<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + 'static> EventBus<T> {
    /// Creates a bus with no subscribers.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BusInner {
                next_id: AtomicU64::new(1),
                subscribers: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Registers a new subscriber.
    pub fn subscribe(&self) -> Subscription<T> {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::unbounded_channel();
        self.inner.subscribers().insert(id, sender);
        Subscription {
            id,
            receiver,
            bus: Arc::downgrade(&self.inner),
        }
    }

    /// Removes a subscriber. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.subscribers().remove(&id).is_some()
    }

    /// Delivers `event` to every live subscriber and returns how many
    /// received it. Subscribers whose receiver has been dropped are pruned.
    pub fn publish(&self, event: T) -> usize {
        let mut subscribers = self.inner.subscribers();
        subscribers.retain(|_, sender| sender.send(event.clone()).is_ok());
        subscribers.len()
    }

    /// Number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers().len()
    }
}

/// A live subscription to an [`EventBus`].
pub struct Subscription<T> {
    id: SubscriptionId,
    receiver: mpsc::UnboundedReceiver<T>,
    bus: Weak<BusInner<T>>,
}

impl<T> Subscription<T> {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Waits for the next event. Returns `None` once the bus is gone or this
    /// subscription was removed.
    pub async fn recv(&mut self) -> Option<T> {
        self.receiver.recv().await
    }

    /// Returns the next queued event without waiting.
    pub fn try_recv(&mut self) -> Option<T> {
        self.receiver.try_recv().ok()
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(inner) = self.bus.upgrade() {
            inner.subscribers().remove(&self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_reaches_all_subscribers() {
        let bus = EventBus::<u32>::new();
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        assert_eq!(bus.publish(7), 2);
        assert_eq!(a.try_recv(), Some(7));
        assert_eq!(b.try_recv(), Some(7));
    }

    #[test]
    fn test_drop_unsubscribes() {
        let bus = EventBus::<u32>::new();
        let sub = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        drop(sub);
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(bus.publish(1), 0);
    }

    #[test]
    fn test_explicit_unsubscribe() {
        let bus = EventBus::<&'static str>::new();
        let mut sub = bus.subscribe();

        assert!(bus.unsubscribe(sub.id()));
        assert!(!bus.unsubscribe(sub.id()));
        bus.publish("ignored");
        assert_eq!(sub.try_recv(), None);
    }

    #[tokio::test]
    async fn test_events_arrive_in_order() {
        let bus = EventBus::<u32>::new();
        let mut sub = bus.subscribe();
        for i in 0..5 {
            bus.publish(i);
        }
        for i in 0..5 {
            assert_eq!(sub.recv().await, Some(i));
        }
    }

    #[test]
    fn test_clone_shares_subscribers() {
        let bus = EventBus::<u8>::new();
        let other = bus.clone();
        let mut sub = bus.subscribe();

        other.publish(3);
        assert_eq!(sub.try_recv(), Some(3));
    }
}
