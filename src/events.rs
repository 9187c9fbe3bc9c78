//! Event bus: identity-keyed listener registry with ordered fan-out.
//!
//! Grounded on the registration/fan-out shape of
//! `state::events::EventBus`, but with the stricter identity and ordering
//! contract the core subsystems need: listeners are keyed by a
//! `(callback, user_data)` pair rather than subscribed to a broadcast
//! channel, duplicate registration is rejected, and a broadcast snapshots
//! its listener list up front so adds/removes during dispatch never affect
//! the in-flight delivery.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::message::Message;

/// A registered callback. Invoked synchronously during `broadcast`; must not
/// call back into the bus it is registered on.
pub type Callback = Arc<dyn Fn(&Message) + Send + Sync>;

/// Opaque identity for a registered listener, returned by `add_listener` so
/// the caller can later `remove_listener` the same registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerKey {
    callback_id: usize,
    user_data: usize,
}

impl ListenerKey {
    /// The caller-supplied `user_data` half of this key.
    #[must_use]
    pub fn user_data(&self) -> usize {
        self.user_data
    }
}

struct Listener {
    key: ListenerKey,
    callback: Callback,
}

/// Registry of listeners and fan-out broadcaster.
#[derive(Default)]
pub struct EventBus {
    listeners: Mutex<Vec<Listener>>,
    next_callback_id: AtomicUsize,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.listeners.lock().unwrap_or_else(|e| e.into_inner()).len();
        f.debug_struct("EventBus").field("listeners", &count).finish()
    }
}

impl EventBus {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener, returning its key.
    ///
    /// Each call allocates a fresh callback id, so two registrations of
    /// "the same" closure with the same `user_data` are never mistaken for
    /// duplicates — callers that want `AlreadyRegistered` semantics for a
    /// stable identity should retain and pass back the returned key via
    /// [`EventBus::add_listener_with_key`].
    pub fn add_listener(&self, user_data: usize, callback: Callback) -> ListenerKey {
        let callback_id = self.next_callback_id.fetch_add(1, Ordering::Relaxed);
        let key = ListenerKey { callback_id, user_data };
        self.add_listener_with_key(key, callback)
            .expect("freshly allocated callback_id cannot collide");
        key
    }

    /// Register a listener under an explicit key, failing if that exact
    /// `(callback_id, user_data)` pair is already registered.
    ///
    /// # Errors
    ///
    /// Returns [`AlreadyRegistered`](EventBusError::AlreadyRegistered) if a
    /// listener with this key is already present.
    pub fn add_listener_with_key(
        &self,
        key: ListenerKey,
        callback: Callback,
    ) -> Result<(), EventBusError> {
        let mut listeners = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
        if listeners.iter().any(|l| l.key == key) {
            return Err(EventBusError::AlreadyRegistered);
        }
        listeners.push(Listener { key, callback });
        Ok(())
    }

    /// Remove a previously registered listener. Returns `true` if present.
    pub fn remove_listener(&self, key: ListenerKey) -> bool {
        let mut listeners = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
        let before = listeners.len();
        listeners.retain(|l| l.key != key);
        listeners.len() != before
    }

    /// Number of currently registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Deliver `msg` to every listener registered at the moment of the call,
    /// in registration order. Listeners added or removed from within a
    /// callback do not affect this dispatch.
    pub fn broadcast(&self, msg: Message) {
        let snapshot: Vec<Callback> = {
            let listeners = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
            listeners.iter().map(|l| l.callback.clone()).collect()
        };
        for callback in snapshot {
            callback(&msg);
        }
    }
}

/// Errors from event bus registration.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EventBusError {
    /// The `(callback, user_data)` pair is already registered.
    #[error("listener already registered")]
    AlreadyRegistered,
}
