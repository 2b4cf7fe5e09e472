//! Event registry: fan-out of realtime events to logical subscribers.
//!
//! A single connection's inbound traffic is multiplexed across many
//! independent subscribers by event kind. The registry outlives any one
//! transport: subscriptions registered here keep working across
//! disconnect/reconnect cycles because the connection task always
//! dispatches into the same registry instance.

use log::{debug, warn};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::mpsc;

use crate::models::connection_state::StateCell;
use crate::models::{ClientMessage, EventKind};

/// Callback invoked with the payload of each dispatched event.
pub type EventCallback = Arc<dyn Fn(&JsonValue) + Send + Sync>;

/// Outbound path installed by the connection task while a transport is up.
struct OutboundSink {
    tx: mpsc::Sender<ClientMessage>,
    state: Arc<StateCell>,
}

#[derive(Default)]
struct RegistryInner {
    /// Subscriber sets keyed by event kind. Each callback carries a unique
    /// token so a [`Subscription`] can remove exactly its own entry.
    subscribers: Mutex<HashMap<EventKind, HashMap<u64, EventCallback>>>,
    next_token: AtomicU64,
    outbound: Mutex<Option<OutboundSink>>,
}

/// Publish/subscribe multiplexer for realtime events.
///
/// Cloning is cheap and shares the same subscriber map; the client keeps
/// one registry per logical connection.
///
/// # Examples
///
/// ```rust
/// use paper_link::{EventKind, EventRegistry};
///
/// let registry = EventRegistry::new();
/// let subscription = registry.on(EventKind::JobCompleted, |payload| {
///     println!("job done: {}", payload);
/// });
///
/// registry.dispatch(
///     &EventKind::JobCompleted,
///     &serde_json::json!({"job_id": "j1"}),
/// );
///
/// subscription.unsubscribe();
/// ```
#[derive(Clone, Default)]
pub struct EventRegistry {
    inner: Arc<RegistryInner>,
}

impl EventRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for an event kind.
    ///
    /// The returned [`Subscription`] removes exactly this callback when
    /// dropped or explicitly unsubscribed; other subscribers to the same
    /// event are unaffected.
    pub fn on(
        &self,
        kind: impl Into<EventKind>,
        callback: impl Fn(&JsonValue) + Send + Sync + 'static,
    ) -> Subscription {
        let kind = kind.into();
        let token = self.inner.next_token.fetch_add(1, Ordering::Relaxed);
        {
            let mut subscribers = self.inner.subscribers.lock().unwrap();
            subscribers
                .entry(kind.clone())
                .or_default()
                .insert(token, Arc::new(callback));
        }
        Subscription {
            registry: Arc::downgrade(&self.inner),
            kind,
            token,
            removed: false,
        }
    }

    /// Deliver a payload to every subscriber currently registered for the
    /// event kind.
    ///
    /// Delivery iterates over a snapshot of the subscriber set, so a
    /// callback that subscribes or unsubscribes during dispatch cannot
    /// corrupt the in-progress iteration or cause double/skipped delivery.
    /// A panicking callback is caught and logged; the remaining callbacks
    /// still run and nothing propagates to the caller.
    pub fn dispatch(&self, kind: &EventKind, payload: &JsonValue) {
        let snapshot: Vec<EventCallback> = {
            let subscribers = self.inner.subscribers.lock().unwrap();
            subscribers
                .get(kind)
                .map(|set| set.values().cloned().collect())
                .unwrap_or_default()
        };

        if snapshot.is_empty() {
            debug!("[paper-link] No subscribers for '{}'", kind);
            return;
        }

        for callback in snapshot {
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| callback(payload))) {
                warn!(
                    "[paper-link] Subscriber for '{}' panicked during dispatch: {}",
                    kind,
                    panic_message(&panic)
                );
            }
        }
    }

    /// Send an application-level event to the server.
    ///
    /// Only transmits while the connection is up; otherwise the event is
    /// dropped with a log line (no queueing). Returns whether the event was
    /// handed to the transport.
    pub fn emit(&self, kind: impl Into<EventKind>, payload: JsonValue) -> bool {
        let kind = kind.into();
        let outbound = self.inner.outbound.lock().unwrap();
        match outbound.as_ref() {
            Some(sink) if sink.state.is_connected() => {
                let message = ClientMessage::Event {
                    event: kind.as_str().to_string(),
                    payload,
                };
                match sink.tx.try_send(message) {
                    Ok(()) => true,
                    Err(e) => {
                        warn!("[paper-link] Dropping '{}' emit: {}", kind, e);
                        false
                    },
                }
            },
            _ => {
                debug!("[paper-link] Dropping '{}' emit while disconnected", kind);
                false
            },
        }
    }

    /// Number of callbacks currently registered for an event kind.
    pub fn subscriber_count(&self, kind: &EventKind) -> usize {
        let subscribers = self.inner.subscribers.lock().unwrap();
        subscribers.get(kind).map(|set| set.len()).unwrap_or(0)
    }

    /// Whether any callback is registered for an event kind.
    pub fn has_subscribers(&self, kind: &EventKind) -> bool {
        self.subscriber_count(kind) > 0
    }

    /// Install the outbound path. Called by the connection task when a
    /// transport comes up; replaces any previous sink.
    pub(crate) fn bind_outbound(&self, tx: mpsc::Sender<ClientMessage>, state: Arc<StateCell>) {
        let mut outbound = self.inner.outbound.lock().unwrap();
        *outbound = Some(OutboundSink { tx, state });
    }

    /// Remove the outbound path. Called on explicit disconnect.
    pub(crate) fn unbind_outbound(&self) {
        let mut outbound = self.inner.outbound.lock().unwrap();
        *outbound = None;
    }
}

/// Best-effort extraction of a panic payload message.
fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Capability to remove one registered callback.
///
/// Removes its callback on [`unsubscribe`](Subscription::unsubscribe) or
/// drop. When the last callback for an event kind is removed, the event's
/// entry is removed from the registry entirely.
pub struct Subscription {
    registry: Weak<RegistryInner>,
    kind: EventKind,
    token: u64,
    removed: bool,
}

impl Subscription {
    /// The event kind this subscription listens to.
    pub fn kind(&self) -> &EventKind {
        &self.kind
    }

    /// Remove the callback now.
    pub fn unsubscribe(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        if self.removed {
            return;
        }
        self.removed = true;
        if let Some(inner) = self.registry.upgrade() {
            let mut subscribers = inner.subscribers.lock().unwrap();
            if let Some(set) = subscribers.get_mut(&self.kind) {
                set.remove(&self.token);
                if set.is_empty() {
                    subscribers.remove(&self.kind);
                }
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.remove();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_dispatch_invokes_each_subscriber_once() {
        let registry = EventRegistry::new();
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();

        let _sub = registry.on(EventKind::JobProgress, move |payload| {
            assert_eq!(payload["progress"], 40);
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        registry.dispatch(&EventKind::JobProgress, &json!({"progress": 40}));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe_removes_only_that_callback() {
        let registry = EventRegistry::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let first_clone = first.clone();
        let sub_a = registry.on("custom", move |_| {
            first_clone.fetch_add(1, Ordering::SeqCst);
        });
        let second_clone = second.clone();
        let _sub_b = registry.on("custom", move |_| {
            second_clone.fetch_add(1, Ordering::SeqCst);
        });

        sub_a.unsubscribe();
        registry.dispatch(&EventKind::parse("custom"), &JsonValue::Null);

        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_empty_event_entry_is_removed() {
        let registry = EventRegistry::new();
        let kind = EventKind::parse("ephemeral");
        let sub = registry.on(kind.clone(), |_| {});
        assert!(registry.has_subscribers(&kind));
        sub.unsubscribe();
        assert!(!registry.has_subscribers(&kind));
        assert!(registry.inner.subscribers.lock().unwrap().get(&kind).is_none());
    }

    #[test]
    fn test_drop_unsubscribes() {
        let registry = EventRegistry::new();
        {
            let _sub = registry.on(EventKind::Pong, |_| {});
            assert_eq!(registry.subscriber_count(&EventKind::Pong), 1);
        }
        assert_eq!(registry.subscriber_count(&EventKind::Pong), 0);
    }

    #[test]
    fn test_panicking_subscriber_does_not_block_others() {
        let registry = EventRegistry::new();
        let delivered = Arc::new(AtomicUsize::new(0));

        let delivered_a = delivered.clone();
        let _a = registry.on("evt", move |_| {
            delivered_a.fetch_add(1, Ordering::SeqCst);
        });
        let _b = registry.on("evt", |_| panic!("boom"));
        let delivered_c = delivered.clone();
        let _c = registry.on("evt", move |_| {
            delivered_c.fetch_add(1, Ordering::SeqCst);
        });

        registry.dispatch(&EventKind::parse("evt"), &JsonValue::Null);
        assert_eq!(delivered.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_subscribe_during_dispatch_sees_next_event_only() {
        let registry = EventRegistry::new();
        let late_calls = Arc::new(AtomicUsize::new(0));

        let registry_clone = registry.clone();
        let late_calls_clone = late_calls.clone();
        // Stash the late subscription so it survives past the dispatch.
        let stash: Arc<Mutex<Vec<Subscription>>> = Arc::new(Mutex::new(Vec::new()));
        let stash_clone = stash.clone();

        let _outer = registry.on("evt", move |_| {
            let late_calls_inner = late_calls_clone.clone();
            let sub = registry_clone.on("evt", move |_| {
                late_calls_inner.fetch_add(1, Ordering::SeqCst);
            });
            stash_clone.lock().unwrap().push(sub);
        });

        let kind = EventKind::parse("evt");
        registry.dispatch(&kind, &JsonValue::Null);
        // The mid-dispatch subscriber was not part of the snapshot.
        assert_eq!(late_calls.load(Ordering::SeqCst), 0);

        registry.dispatch(&kind, &JsonValue::Null);
        // It receives the next dispatch (once per stashed subscription).
        assert!(late_calls.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_emit_without_connection_is_dropped() {
        let registry = EventRegistry::new();
        assert!(!registry.emit(EventKind::Ping, json!({"timestamp": 1})));

        // Bound but disconnected: still dropped.
        let (tx, mut rx) = mpsc::channel(4);
        let state = Arc::new(StateCell::default());
        registry.bind_outbound(tx, state.clone());
        assert!(!registry.emit(EventKind::Ping, json!({"timestamp": 2})));

        // Connected: delivered.
        state.set(crate::models::ConnectionState::Connected);
        assert!(registry.emit(EventKind::Ping, json!({"timestamp": 3})));
        let msg = rx.recv().await.expect("message queued");
        match msg {
            ClientMessage::Event { event, payload } => {
                assert_eq!(event, "ping");
                assert_eq!(payload["timestamp"], 3);
            },
            other => panic!("unexpected outbound message: {:?}", other),
        }
    }
}
