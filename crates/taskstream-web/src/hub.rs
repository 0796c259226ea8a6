//! Broadcast hub fanning change events out to WebSocket subscribers.
//!
//! One hub exists per filtered view. Publishers enqueue onto an unbounded
//! inbound queue; a dispatch task drains it and offers each event to every
//! registered subscriber's bounded delivery slot. A full slot drops that
//! event for that subscriber only — delivery is deliberately lossy, and
//! clients recover by reloading the full list. A slow client never delays
//! the others.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use taskstream_db::ChangeEvent;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// Capacity of each subscriber's delivery slot.
const SLOT_CAPACITY: usize = 32;

type SubscriberMap = Arc<Mutex<HashMap<u64, mpsc::Sender<ChangeEvent>>>>;

/// Receiving side of one subscription. Dropping it (or the connection that
/// owns it) closes the slot; the hub reaps closed slots during dispatch.
pub struct SubscriberHandle {
    id: u64,
    events: mpsc::Receiver<ChangeEvent>,
}

impl SubscriberHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Wait for the next event. Returns None once unregistered.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        self.events.recv().await
    }
}

/// In-process broadcaster for one view's change events.
#[derive(Clone)]
pub struct Hub {
    inbound: mpsc::UnboundedSender<ChangeEvent>,
    subscribers: SubscriberMap,
    next_id: Arc<AtomicU64>,
}

impl Hub {
    /// Create a hub and spawn its dispatch task. The task drains the inbound
    /// queue when the shutdown signal flips, then exits.
    pub fn spawn(shutdown: watch::Receiver<bool>) -> (Self, JoinHandle<()>) {
        let (inbound, inbound_rx) = mpsc::unbounded_channel();
        let subscribers: SubscriberMap = Arc::new(Mutex::new(HashMap::new()));

        let dispatch = tokio::spawn(dispatch_loop(inbound_rx, subscribers.clone(), shutdown));

        let hub = Self {
            inbound,
            subscribers,
            next_id: Arc::new(AtomicU64::new(0)),
        };
        (hub, dispatch)
    }

    /// Add a subscriber. Never fails; the set grows without bound.
    pub async fn register(&self) -> SubscriberHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (slot, events) = mpsc::channel(SLOT_CAPACITY);

        self.subscribers.lock().await.insert(id, slot);
        debug!(subscriber = id, "subscriber registered");

        SubscriberHandle { id, events }
    }

    /// Remove a subscriber. Idempotent; safe concurrently with dispatch.
    pub async fn unregister(&self, id: u64) {
        if self.subscribers.lock().await.remove(&id).is_some() {
            debug!(subscriber = id, "subscriber unregistered");
        }
    }

    /// Enqueue an event for fan-out. Never blocks the caller.
    pub fn publish(&self, event: ChangeEvent) {
        if self.inbound.send(event).is_err() {
            trace!("hub dispatch task gone, dropping event");
        }
    }

    /// Number of currently registered subscribers.
    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.lock().await.len()
    }
}

async fn dispatch_loop(
    mut inbound: mpsc::UnboundedReceiver<ChangeEvent>,
    subscribers: SubscriberMap,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            maybe = inbound.recv() => match maybe {
                Some(event) => deliver(&subscribers, event).await,
                None => break,
            },
            _ = shutdown.changed() => {
                // Drain whatever was already queued before exiting
                while let Ok(event) = inbound.try_recv() {
                    deliver(&subscribers, event).await;
                }
                break;
            }
        }
    }
    debug!("hub dispatch loop stopped");
}

/// Offer one event to every registered subscriber, reaping closed slots.
async fn deliver(subscribers: &SubscriberMap, event: ChangeEvent) {
    let mut subs = subscribers.lock().await;
    let mut closed = Vec::new();

    for (id, slot) in subs.iter() {
        match slot.try_send(event.clone()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                trace!(subscriber = id, "delivery slot full, dropping event");
            }
            Err(TrySendError::Closed(_)) => closed.push(*id),
        }
    }

    for id in closed {
        subs.remove(&id);
        debug!(subscriber = id, "reaped closed subscriber");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use taskstream_db::items::ItemRow;
    use tokio::time::timeout;

    fn event(n: usize) -> ChangeEvent {
        ChangeEvent::Delete { id: n.to_string() }
    }

    fn spawn_hub() -> (Hub, watch::Sender<bool>) {
        let (tx, rx) = watch::channel(false);
        let (hub, _dispatch) = Hub::spawn(rx);
        (hub, tx)
    }

    #[tokio::test]
    async fn every_subscriber_receives_all_events_in_order() {
        let (hub, _shutdown) = spawn_hub();
        let mut a = hub.register().await;
        let mut b = hub.register().await;

        for n in 0..10 {
            hub.publish(event(n));
        }

        for sub in [&mut a, &mut b] {
            for n in 0..10 {
                let got = timeout(Duration::from_secs(1), sub.recv())
                    .await
                    .expect("timed out")
                    .expect("hub closed slot");
                assert_eq!(got, event(n));
            }
        }
    }

    #[tokio::test]
    async fn unregistered_subscriber_gets_nothing_more() {
        let (hub, _shutdown) = spawn_hub();
        let mut sub = hub.register().await;
        let id = sub.id();

        hub.unregister(id).await;
        hub.unregister(id).await; // idempotent

        hub.publish(event(0));
        let got = timeout(Duration::from_secs(1), sub.recv())
            .await
            .expect("timed out");
        assert!(got.is_none());
        assert_eq!(hub.subscriber_count().await, 0);
    }

    #[tokio::test]
    async fn saturated_slot_drops_only_for_that_subscriber() {
        let (hub, _shutdown) = spawn_hub();
        let mut stalled = hub.register().await;
        let mut healthy = hub.register().await;

        // Fill both slots exactly, then drain only the healthy one
        for n in 0..SLOT_CAPACITY {
            hub.publish(event(n));
        }
        for n in 0..SLOT_CAPACITY {
            let got = timeout(Duration::from_secs(1), healthy.recv())
                .await
                .expect("timed out")
                .expect("hub closed slot");
            assert_eq!(got, event(n));
        }

        // These overflow the stalled slot and are dropped for it only
        for n in SLOT_CAPACITY..SLOT_CAPACITY + 16 {
            hub.publish(event(n));
        }
        for n in SLOT_CAPACITY..SLOT_CAPACITY + 16 {
            let got = timeout(Duration::from_secs(1), healthy.recv())
                .await
                .expect("timed out")
                .expect("hub closed slot");
            assert_eq!(got, event(n));
        }

        // The stalled subscriber kept what its slot buffered and nothing else
        for n in 0..SLOT_CAPACITY {
            assert_eq!(stalled.recv().await, Some(event(n)));
        }
        assert!(timeout(Duration::from_millis(100), stalled.recv())
            .await
            .is_err());
        assert_eq!(hub.subscriber_count().await, 2);
    }

    #[tokio::test]
    async fn dropped_handle_is_reaped_during_dispatch() {
        let (hub, _shutdown) = spawn_hub();
        let sub = hub.register().await;
        let mut witness = hub.register().await;
        drop(sub);

        hub.publish(event(0));
        assert!(timeout(Duration::from_secs(1), witness.recv())
            .await
            .expect("timed out")
            .is_some());
        assert_eq!(hub.subscriber_count().await, 1);
    }

    #[tokio::test]
    async fn register_unregister_race_with_publisher_never_deadlocks() {
        let (hub, _shutdown) = spawn_hub();

        let publisher = {
            let hub = hub.clone();
            tokio::spawn(async move {
                for n in 0..500 {
                    hub.publish(event(n));
                    tokio::task::yield_now().await;
                }
            })
        };

        let churn = {
            let hub = hub.clone();
            tokio::spawn(async move {
                for _ in 0..200 {
                    let sub = hub.register().await;
                    hub.unregister(sub.id()).await;
                }
            })
        };

        timeout(Duration::from_secs(5), async {
            publisher.await.unwrap();
            churn.await.unwrap();
        })
        .await
        .expect("hub deadlocked");

        assert_eq!(hub.subscriber_count().await, 0);
    }

    #[tokio::test]
    async fn insert_events_carry_the_item() {
        let (hub, _shutdown) = spawn_hub();
        let mut sub = hub.register().await;

        let item = ItemRow {
            id: "a".to_string(),
            text: "buy milk".to_string(),
            status: "active".to_string(),
            created: "2026-01-01T00:00:00+00:00".to_string(),
        };
        hub.publish(ChangeEvent::Insert { item: item.clone() });

        let got = timeout(Duration::from_secs(1), sub.recv())
            .await
            .expect("timed out")
            .expect("hub closed slot");
        assert_eq!(got, ChangeEvent::Insert { item });
    }
}
