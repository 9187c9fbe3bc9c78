//! # melo
//!
//! A headless, networked media server core: an RTSP/AirPlay request engine,
//! a player registry with current-player arbitration, a hierarchical
//! playlist queue, a typed settings store, and an event fan-out bus.
//!
//! Decoding, the client-facing wire transport, the library database, module
//! browsers, mDNS advertisement payloads, and RAOP frame encryption are
//! external collaborators; this crate defines the seams they cross (an
//! opaque [`players::registry::Player`] trait, an opaque [`message::Message`]
//! buffer, a settings-file path, a negotiated stream-parameter struct) and
//! implements everything behind those seams.
//!
//! ## Example
//!
//! ```
//! use melo::players::registry::PlayerRegistry;
//! use melo::settings::SettingsRegistry;
//!
//! let players = PlayerRegistry::new();
//! let settings = SettingsRegistry::new();
//! assert_eq!(players.current_id(), None);
//! let _ = settings;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Crate-wide error type, composed from each subsystem's own error.
pub mod error;
/// Runtime configuration: bind address, client limits, device name, CLI.
pub mod config;
/// RAOP service advertisement (mDNS).
pub mod discovery;
/// Runtime-agnostic networking primitives.
pub mod net;
/// Negotiated stream parameters and socket handles for an in-flight RTSP
/// session.
pub mod receiver;
/// Cryptographic primitives, wire codecs, and protocol constants this crate
/// reuses from the AirPlay/RAOP protocol family.
pub mod protocol;

/// Identity-keyed listener registry and fan-out broadcast.
pub mod events;
/// Opaque control-message buffer and the pack/unpack seam.
pub mod message;
/// Per-async-operation handle with cancel/complete semantics.
pub mod request;
/// Typed settings groups and entries, persistence, validation.
pub mod settings;
/// Global player table, current-player arbitration, status broadcast.
pub mod players;
/// Hierarchical playback queue, cursor, shuffle, navigation.
pub mod playlist;
/// RTSP request engine: framing, method dispatch, auth, Apple-Challenge.
pub mod rtsp;
/// `Browser.Request`/`Browser.Response` wire glue and the `BrowserSource` seam.
pub mod browser;

pub use error::MeloError;
