//! Negotiated stream parameters and socket handles for an in-flight RTSP
//! session. The concrete decode/transport pipeline this cluster used to
//! carry is out of scope; only the session-parameter shapes it fed are
//! kept, since `rtsp::session::RtspSession` borrows them directly.

pub mod session;

pub use session::{AudioCodec, SessionSockets, SessionState, StreamParameters};
