use serde_json::Value;
use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
};

use super::{ListenerScope, SignalBus, SignalListener, SignalTopic};

#[derive(Default)]
struct DataLayerInner {
    state: HashMap<SignalTopic, Value>,
    listeners: HashMap<SignalTopic, Vec<SignalListener>>,
}

/// In-process page data layer
///
/// Keeps the latest payload per topic so late listeners can catch up.
/// Listeners run synchronously on the publishing thread, in registration
/// order, outside the state lock. Delivery is serialized, so listeners see
/// changes in the order they were stored. A listener must not publish or
/// subscribe on the same layer from inside its callback.
#[derive(Default)]
pub struct DataLayer {
    inner: Mutex<DataLayerInner>,
    delivery: Mutex<()>,
}

impl DataLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest payload published under `topic`
    pub fn current(&self, topic: SignalTopic) -> Option<Value> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.state.get(&topic).cloned()
    }
}

impl SignalBus for DataLayer {
    fn subscribe(&self, topic: SignalTopic, scope: ListenerScope, listener: SignalListener) {
        let _delivery = self.delivery.lock().unwrap_or_else(PoisonError::into_inner);
        let replay = {
            let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            if scope != ListenerScope::Past {
                inner
                    .listeners
                    .entry(topic)
                    .or_default()
                    .push(listener.clone());
            }
            match scope {
                ListenerScope::Future => None,
                ListenerScope::Past | ListenerScope::All => inner.state.get(&topic).cloned(),
            }
        };

        if let Some(payload) = replay {
            tracing::trace!(topic = %topic, "Replaying current value to new listener");
            listener(&payload);
        }
    }

    fn publish(&self, topic: SignalTopic, payload: Value) {
        let _delivery = self.delivery.lock().unwrap_or_else(PoisonError::into_inner);
        let listeners = {
            let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            inner.state.insert(topic, payload.clone());
            inner.listeners.get(&topic).cloned().unwrap_or_default()
        };

        tracing::debug!(topic = %topic, listeners = listeners.len(), "Data layer change");

        for listener in listeners {
            listener(&payload);
        }
    }
}
