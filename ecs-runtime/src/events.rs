// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Topic-keyed publish/subscribe
//!
//! Systems and outside callers exchange notifications through an
//! [`EventBus`]. Handlers are registered per topic and invoked synchronously,
//! in subscription order, on the publishing thread.
//!
//! Publishing copies the handler list for the topic and releases the lock
//! before any handler runs, so a handler may itself subscribe, unsubscribe or
//! publish. Such changes apply from the next publish on.

use crate::ecs::systems::BreathEvent;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Canonical topic names
pub mod topics {
    /// Published by the breathing system whenever a lung changes
    pub const ENTITY_BREATHED: &str = "EntityBreathed";
}

/// Handle returned by [`EventBus::subscribe`]
///
/// Ids are unique for the lifetime of the bus that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Raw numeric value
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Event payloads carried on the world's bus
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A lung advanced one step
    Breathed(BreathEvent),
}

impl Event {
    /// Topic this event is published under
    pub fn topic(&self) -> &'static str {
        match self {
            Event::Breathed(_) => topics::ENTITY_BREATHED,
        }
    }
}

type Handler<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Synchronous publish/subscribe registry
pub struct EventBus<E> {
    subscribers: RwLock<HashMap<String, Vec<(SubscriptionId, Handler<E>)>>>,
    next_id: AtomicU64,
    _payload: PhantomData<fn(&E)>,
}

impl<E> EventBus<E> {
    /// Create a bus with no subscribers
    pub fn new() -> Self {
        EventBus {
            subscribers: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(0),
            _payload: PhantomData,
        }
    }

    /// Register `handler` for `topic`
    pub fn subscribe<F>(&self, topic: &str, handler: F) -> SubscriptionId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers
            .write()
            .entry(topic.to_string())
            .or_default()
            .push((id, Arc::new(handler)));
        log::debug!("subscription {} added to `{}`", id.0, topic);
        id
    }

    /// Remove a subscription
    ///
    /// Returns `false` if `id` is not subscribed to `topic`.
    pub fn unsubscribe(&self, topic: &str, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.write();
        let handlers = match subscribers.get_mut(topic) {
            Some(handlers) => handlers,
            None => return false,
        };
        let before = handlers.len();
        handlers.retain(|(existing, _)| *existing != id);
        let removed = handlers.len() != before;
        if handlers.is_empty() {
            subscribers.remove(topic);
        }
        if removed {
            log::debug!("subscription {} removed from `{}`", id.0, topic);
        }
        removed
    }

    /// Invoke every handler of `topic` once with `payload`
    ///
    /// Returns the number of handlers invoked.
    pub fn publish(&self, topic: &str, payload: &E) -> usize {
        let handlers: Vec<Handler<E>> = match self.subscribers.read().get(topic) {
            Some(handlers) => handlers.iter().map(|(_, h)| Arc::clone(h)).collect(),
            None => return 0,
        };
        for handler in &handlers {
            handler(payload);
        }
        handlers.len()
    }

    /// Number of handlers registered for `topic`
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.subscribers.read().get(topic).map_or(0, Vec::len)
    }

    /// Drop every subscription on every topic
    pub fn clear(&self) {
        self.subscribers.write().clear();
    }
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let subscribers = self.subscribers.read();
        let mut topics: Vec<(&String, usize)> =
            subscribers.iter().map(|(t, h)| (t, h.len())).collect();
        topics.sort();
        f.debug_struct("EventBus").field("topics", &topics).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    #[test]
    fn test_publish_reaches_each_subscriber_once() {
        let bus = EventBus::<u32>::new();
        let total = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let total = Arc::clone(&total);
            bus.subscribe("tick", move |n| {
                total.fetch_add(*n as usize, Ordering::SeqCst);
            });
        }

        assert_eq!(bus.publish("tick", &2), 3);
        assert_eq!(total.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn test_topics_are_exact_match() {
        let bus = EventBus::<()>::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        bus.subscribe("Entity", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(bus.publish("EntityBreathed", &()), 0);
        assert_eq!(bus.publish("entity", &()), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_handlers_run_in_subscription_order() {
        let bus = EventBus::<()>::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for i in 0..4 {
            let order = Arc::clone(&order);
            bus.subscribe("t", move |_| order.lock().unwrap().push(i));
        }
        bus.publish("t", &());
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_unsubscribe() {
        let bus = EventBus::<()>::new();
        let a = bus.subscribe("t", |_| {});
        let b = bus.subscribe("t", |_| {});
        assert_ne!(a, b);

        assert!(bus.unsubscribe("t", a));
        assert!(!bus.unsubscribe("t", a));
        assert!(!bus.unsubscribe("other", b));
        assert_eq!(bus.subscriber_count("t"), 1);
        assert_eq!(bus.publish("t", &()), 1);
    }

    #[test]
    fn test_handler_may_subscribe_during_publish() {
        let bus = Arc::new(EventBus::<()>::new());
        let inner = Arc::clone(&bus);
        bus.subscribe("t", move |_| {
            inner.subscribe("t", |_| {});
        });

        // The new subscriber is not part of the in-flight publish
        assert_eq!(bus.publish("t", &()), 1);
        assert_eq!(bus.subscriber_count("t"), 2);
    }

    #[test]
    fn test_event_topic() {
        use crate::ecs::components::LungState;
        use crate::ecs::Entity;

        let event = Event::Breathed(BreathEvent {
            entity: Entity::from_raw(0),
            state: LungState::Inhale,
            volume: 0.25,
        });
        assert_eq!(event.topic(), topics::ENTITY_BREATHED);
    }
}
