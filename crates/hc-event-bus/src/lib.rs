//! Event bus with typed pub/sub for homecore
//!
//! This crate provides the EventBus, the in-process message broker that
//! decouples sensors, automation, devices and transports. Handlers run
//! synchronously on the publisher's thread.
//!
//! Subscriptions are keyed by event name *and* payload type: a handler
//! registered for `SensorEvent` under `"sensor.reading"` can only ever be
//! called with a `SensorEvent`. Publishing a different payload type under the
//! same name reaches none of those handlers.

use hc_core::{Context, Event, EventData, EventType};
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, trace, warn};

/// A unique identifier for a subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Raw numeric value
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

/// Typed handler as seen by subscribers
type Handler<T> = Arc<dyn Fn(&Event<T>) + Send + Sync>;

/// A registered handler with its payload type erased
#[derive(Clone)]
struct Subscriber {
    id: SubscriptionId,
    payload_type: TypeId,
    /// Always holds a `Handler<T>` where `TypeId::of::<T>() == payload_type`
    handler: Arc<dyn Any + Send + Sync>,
}

/// The event bus for publishing and subscribing to events
///
/// The subscriber table is only locked to register, remove or snapshot
/// subscribers. Handlers are invoked with no lock held, so they may
/// subscribe, unsubscribe or publish themselves.
pub struct EventBus {
    /// Subscribers per event name, in subscription order
    subscribers: RwLock<HashMap<EventType, Vec<Subscriber>>>,
    /// Counter for generating subscription IDs
    next_id: AtomicU64,
}

impl EventBus {
    /// Create a new, empty event bus
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Subscribe to events of payload type `T` published under `event_type`
    pub fn subscribe<T, F>(&self, event_type: impl Into<EventType>, handler: F) -> SubscriptionId
    where
        T: Send + Sync + 'static,
        F: Fn(&Event<T>) + Send + Sync + 'static,
    {
        let event_type = event_type.into();
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let handler: Handler<T> = Arc::new(handler);

        let subscriber = Subscriber {
            id,
            payload_type: TypeId::of::<T>(),
            handler: Arc::new(handler),
        };

        self.subscribers
            .write()
            .entry(event_type.clone())
            .or_default()
            .push(subscriber);

        debug!(event_type = %event_type, %id, "Subscribed");
        id
    }

    /// Subscribe to a typed event under its own name
    pub fn subscribe_typed<T, F>(&self, handler: F) -> SubscriptionId
    where
        T: EventData,
        F: Fn(&Event<T>) + Send + Sync + 'static,
    {
        self.subscribe(T::event_type(), handler)
    }

    /// Publish an event with a fresh context
    ///
    /// Returns the number of handlers that completed without panicking.
    pub fn publish<T>(&self, event_type: impl Into<EventType>, data: T) -> usize
    where
        T: Send + Sync + 'static,
    {
        self.publish_with_context(event_type, data, Context::new())
    }

    /// Publish an event carrying the given context
    pub fn publish_with_context<T>(
        &self,
        event_type: impl Into<EventType>,
        data: T,
        context: Context,
    ) -> usize
    where
        T: Send + Sync + 'static,
    {
        self.dispatch(Event::new(event_type, data, context))
    }

    /// Publish a typed event under its own name
    pub fn publish_typed<T: EventData>(&self, data: T) -> usize {
        self.publish_typed_with_context(data, Context::new())
    }

    /// Publish a typed event under its own name with the given context
    pub fn publish_typed_with_context<T: EventData>(&self, data: T, context: Context) -> usize {
        self.dispatch(Event::typed(data, context))
    }

    fn dispatch<T>(&self, event: Event<T>) -> usize
    where
        T: Send + Sync + 'static,
    {
        let payload_type = TypeId::of::<T>();

        // Snapshot under the lock, invoke outside it
        let snapshot: Vec<Subscriber> = match self.subscribers.read().get(&event.event_type) {
            Some(subs) => subs.clone(),
            None => {
                trace!(event_type = %event.event_type, "No subscribers");
                return 0;
            }
        };

        trace!(
            event_type = %event.event_type,
            subscribers = snapshot.len(),
            "Publishing event"
        );

        let mut delivered = 0;
        for subscriber in &snapshot {
            if subscriber.payload_type != payload_type {
                warn!(
                    event_type = %event.event_type,
                    id = %subscriber.id,
                    "Skipping subscriber registered for a different payload type"
                );
                continue;
            }

            let Some(handler) = subscriber.handler.downcast_ref::<Handler<T>>() else {
                error!(
                    event_type = %event.event_type,
                    id = %subscriber.id,
                    "Subscriber handler has unexpected type"
                );
                continue;
            };

            match panic::catch_unwind(AssertUnwindSafe(|| (**handler)(&event))) {
                Ok(()) => delivered += 1,
                Err(payload) => {
                    error!(
                        event_type = %event.event_type,
                        id = %subscriber.id,
                        panic = %panic_message(payload.as_ref()),
                        "Event handler panicked"
                    );
                }
            }
        }

        delivered
    }

    /// Remove a subscription
    ///
    /// Returns true if the subscription was found and removed.
    pub fn unsubscribe(&self, event_type: impl Into<EventType>, id: SubscriptionId) -> bool {
        let event_type = event_type.into();
        let mut subscribers = self.subscribers.write();

        let Some(subs) = subscribers.get_mut(&event_type) else {
            return false;
        };

        let before = subs.len();
        subs.retain(|s| s.id != id);
        let removed = subs.len() != before;

        if subs.is_empty() {
            subscribers.remove(&event_type);
        }

        if removed {
            debug!(event_type = %event_type, %id, "Unsubscribed");
        }
        removed
    }

    /// Remove all subscribers of one event name
    pub fn clear(&self, event_type: impl Into<EventType>) {
        let event_type = event_type.into();
        if self.subscribers.write().remove(&event_type).is_some() {
            debug!(event_type = %event_type, "Cleared subscribers");
        }
    }

    /// Remove every subscriber of every event name
    pub fn clear_all(&self) {
        self.subscribers.write().clear();
        debug!("Cleared all subscribers");
    }

    /// Number of subscribers registered under an event name
    pub fn subscriber_count(&self, event_type: impl Into<EventType>) -> usize {
        self.subscribers
            .read()
            .get(&event_type.into())
            .map_or(0, Vec::len)
    }

    /// Number of event names with at least one subscriber
    pub fn event_type_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Thread-safe wrapper for EventBus
pub type SharedEventBus = Arc<EventBus>;
