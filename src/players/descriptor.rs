//! Player descriptor and mutable playback state.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Playback state machine value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlayState {
    /// No media loaded.
    #[default]
    None,
    /// Playing.
    Playing,
    /// Paused.
    Paused,
    /// Stopped (media loaded, not advancing).
    Stopped,
}

/// Network/decode stream state, independent of `PlayState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StreamState {
    /// Not loading or buffering.
    #[default]
    None,
    /// Initial load in progress.
    Loading,
    /// Re-buffering mid-stream.
    Buffering,
}

/// Immutable player identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerDescriptor {
    /// Unique id, the registry key.
    pub id: String,
    /// Human-readable display name.
    pub display_name: String,
    /// Longer description.
    pub description: String,
    /// Icon name or URL, player-implementation defined.
    pub icon: String,
}

/// Mutable fields tracked by the registry on behalf of a registered player.
#[derive(Debug, Clone, Default)]
pub struct PlayerMutableState {
    /// Playback state.
    pub state: PlayState,
    /// Stream state.
    pub stream_state: StreamState,
    /// Buffering percent, 0..100. Forced to 0 when `stream_state` is `None`.
    pub stream_percent: u8,
    /// Current media display name.
    pub media_name: String,
    /// Current media tags.
    pub tags: crate::players::tags::Tags,
    /// Total media duration.
    pub duration_ms: u64,
    /// Current playback position.
    pub position_ms: u64,
    /// The playlist entry this player was most recently told to play.
    pub playlist_entry_ref: Option<crate::playlist::entry::EntryId>,
    /// The entry the player currently reports as playing.
    pub current_entry_ref: Option<crate::playlist::entry::EntryId>,
    /// Volume, 0.0..=1.0.
    pub volume: f32,
    /// Mute flag (independent of `volume`; unmuting restores the prior
    /// linear volume rather than re-deriving it from a stored value).
    pub muted: bool,
    /// Whether a previous entry is available from the current cursor.
    pub has_previous: bool,
    /// Whether a next entry is available from the current cursor.
    pub has_next: bool,
}

impl fmt::Display for PlayerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.display_name, self.id)
    }
}
