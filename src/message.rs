//! Opaque control-message buffer and the pack/unpack seam.
//!
//! The wire encoding itself is out of scope: the core only ever touches
//! owned byte buffers produced and consumed by an external codec layer.
//! `Message` is that buffer; `MessagePayload` is the trait each in-scope
//! request/response/event type implements against it, mirroring how the
//! RTSP side treats `RtspRequest`/`RtspResponse` as its own wire boundary.

use std::sync::Arc;

/// An opaque, reference-counted, immutable byte buffer carrying one packed
/// control message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    bytes: Arc<[u8]>,
}

impl Message {
    /// Wrap an owned buffer.
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes: Arc::from(bytes) }
    }

    /// Wrap a `'static` byte slice without allocating a new buffer per call
    /// site (test and constant-message convenience).
    #[must_use]
    pub fn from_static(bytes: &'static [u8]) -> Self {
        Self { bytes: Arc::from(bytes) }
    }

    /// The null sentinel delivered to a request's callback on termination.
    #[must_use]
    pub fn null() -> Self {
        Self { bytes: Arc::from(&[][..]) }
    }

    /// Whether this is the null sentinel.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Raw bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Implemented by every request/response/event type exchanged across the
/// control wire seam so it can be packed into / unpacked from a [`Message`]
/// without the core depending on a concrete wire schema.
pub trait MessagePayload: Sized {
    /// Unpack error (codec-defined; e.g. malformed JSON, unknown variant).
    type Error: std::error::Error + Send + Sync + 'static;

    /// Pack into a message.
    fn pack(&self) -> Message;

    /// Unpack from a message.
    ///
    /// # Errors
    ///
    /// Returns an error if `msg` does not contain a well-formed payload.
    fn unpack(msg: &Message) -> Result<Self, Self::Error>;
}

/// `serde_json`-backed [`MessagePayload`] implementation, used by tests and
/// the demo binary so the crate is exercisable end-to-end without wiring a
/// real transport codec.
pub mod json {
    use super::{Message, MessagePayload};
    use serde::{Serialize, de::DeserializeOwned};

    impl<T> MessagePayload for T
    where
        T: Serialize + DeserializeOwned,
    {
        type Error = serde_json::Error;

        fn pack(&self) -> Message {
            // Bodies are small control messages; `unwrap` is not available
            // without widening the trait's error type for an infallible path,
            // so fall back to an empty message on an encoder bug.
            serde_json::to_vec(self)
                .map(Message::new)
                .unwrap_or_else(|_| Message::null())
        }

        fn unpack(msg: &Message) -> Result<Self, Self::Error> {
            serde_json::from_slice(msg.as_bytes())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_message_is_empty() {
        assert!(Message::null().is_null());
        assert!(!Message::from_static(b"x").is_null());
    }
}
