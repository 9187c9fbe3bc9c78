//! Request tracker: the per-async-operation handle with cancel/complete
//! semantics.
//!
//! State-machine shape is grounded on `receiver::session::SessionState`'s
//! `can_transition_to` validation pattern, narrowed to the tracker's single
//! one-way transition out of `Pending`.

use std::sync::{Arc, Mutex};

use crate::message::Message;

/// Request lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    /// Awaiting a terminal transition; `send_response` may still deliver.
    Pending,
    /// Terminated via `complete()`.
    Complete,
    /// Terminated via `cancel()`.
    Cancelled,
}

/// Callback invoked by the tracker; receives the delivered message and
/// returns whatever the caller's transport layer needs as an ack.
pub type RequestCallback = Box<dyn FnMut(&Message) -> bool + Send>;

struct Inner {
    state: RequestState,
    callback: RequestCallback,
    user_data: usize,
}

/// The handle bound to one multi-message asynchronous response.
///
/// Cloning a `Request` shares the same underlying state; every clone
/// observes the same transition.
#[derive(Clone)]
pub struct Request {
    inner: Arc<Mutex<Inner>>,
    /// Back-reference to the object the request was issued against (a
    /// player id, playlist id, or settings id); opaque to the tracker.
    parent_object_ref: Arc<str>,
}

impl Request {
    /// Create a new request in `Pending` state bound to `parent_object_ref`
    /// (e.g. a playlist or settings store id).
    pub fn new(parent_object_ref: impl Into<Arc<str>>, callback: RequestCallback) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state: RequestState::Pending,
                callback,
                user_data: 0,
            })),
            parent_object_ref: parent_object_ref.into(),
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> RequestState {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).state
    }

    /// The object this request was issued against.
    #[must_use]
    pub fn get_object(&self) -> &str {
        &self.parent_object_ref
    }

    /// Opaque caller data attached to the request.
    pub fn set_user_data(&self, user_data: usize) {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).user_data = user_data;
    }

    /// Read back the opaque caller data.
    #[must_use]
    pub fn get_user_data(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).user_data
    }

    /// Deliver one response message while `Pending`.
    ///
    /// Returns the callback's return value, or `false` if the request has
    /// already terminated (in which case the callback is not invoked).
    pub fn send_response(&self, msg: Message) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if inner.state != RequestState::Pending {
            return false;
        }
        (inner.callback)(&msg)
    }

    /// Terminate successfully. Invokes the callback once with the null
    /// sentinel if still `Pending`. A no-op (besides releasing the shared
    /// state) if already terminated.
    pub fn complete(&self) {
        self.terminate(RequestState::Complete);
    }

    /// Terminate via cancellation. Invokes the callback once with the null
    /// sentinel if still `Pending`.
    pub fn cancel(&self) {
        self.terminate(RequestState::Cancelled);
    }

    fn terminate(&self, to: RequestState) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if inner.state != RequestState::Pending {
            return;
        }
        inner.state = to;
        let null = Message::null();
        (inner.callback)(&null);
    }
}

/// Bookkeeping for every in-flight [`Request`] issued against one owning
/// object (a playlist, a settings store), so the owner can cancel
/// everything outstanding at once — e.g. when it is torn down.
#[derive(Default, Clone)]
pub struct RequestTracker {
    pending: Arc<Mutex<Vec<Request>>>,
}

impl RequestTracker {
    /// An empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `request`, first dropping any previously tracked requests that
    /// have already terminated.
    pub fn track(&self, request: Request) {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.retain(|r| r.state() == RequestState::Pending);
        pending.push(request);
    }

    /// Cancel every tracked request still `Pending`.
    pub fn cancel_all(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        for request in pending.drain(..) {
            request.cancel();
        }
    }

    /// Count of tracked requests still `Pending`.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|r| r.state() == RequestState::Pending)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting(calls: Arc<AtomicUsize>, last_null: Arc<Mutex<bool>>) -> RequestCallback {
        Box::new(move |msg: &Message| {
            calls.fetch_add(1, Ordering::SeqCst);
            *last_null.lock().unwrap() = msg.is_null();
            true
        })
    }

    #[test]
    fn lifecycle_matches_scenario_6() {
        let calls = Arc::new(AtomicUsize::new(0));
        let last_null = Arc::new(Mutex::new(false));
        let req = Request::new("playlist:default", counting(calls.clone(), last_null.clone()));

        assert!(req.send_response(Message::from_static(b"m1")));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!*last_null.lock().unwrap());

        assert!(req.send_response(Message::from_static(b"m2")));
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        req.complete();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(*last_null.lock().unwrap());
        assert_eq!(req.state(), RequestState::Complete);

        assert!(!req.send_response(Message::from_static(b"m3")));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn cancel_is_terminal_and_idempotent() {
        let calls = Arc::new(AtomicUsize::new(0));
        let last_null = Arc::new(Mutex::new(false));
        let req = Request::new("playlist:default", counting(calls.clone(), last_null.clone()));

        req.cancel();
        assert_eq!(req.state(), RequestState::Cancelled);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        req.cancel();
        req.complete();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn tracker_cancel_all_terminates_every_pending_request() {
        let calls = Arc::new(AtomicUsize::new(0));
        let last_null = Arc::new(Mutex::new(false));
        let tracker = RequestTracker::new();
        let a = Request::new("playlist:default", counting(calls.clone(), last_null.clone()));
        let b = Request::new("playlist:default", counting(calls.clone(), last_null.clone()));
        tracker.track(a.clone());
        tracker.track(b.clone());
        assert_eq!(tracker.pending_count(), 2);

        tracker.cancel_all();
        assert_eq!(a.state(), RequestState::Cancelled);
        assert_eq!(b.state(), RequestState::Cancelled);
        assert_eq!(tracker.pending_count(), 0);
    }
}
