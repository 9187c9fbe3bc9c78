//! Error types

/// Crate-wide error, composed from each subsystem's own error type.
///
/// Mirrors the error taxonomy: most variants surface as a specific RTSP
/// status or a specific response message rather than propagating as a
/// generic failure, so this enum exists mainly for library callers that want
/// a single type to match on (the demo binary, integration tests).
#[derive(Debug, thiserror::Error)]
pub enum MeloError {
    /// A request message could not be unpacked.
    #[error("malformed message")]
    MalformedMessage,

    /// A player, playlist, or settings id was not found.
    #[error("unknown id: {0}")]
    UnknownId(String),

    /// A settings validator rejected the pending transaction.
    #[error("validation rejected: {0}")]
    ValidationRejected(String),

    /// RTSP credentials were missing or invalid.
    #[error("authentication required")]
    AuthRequired,

    /// The RTSP server is at `max_clients` capacity.
    #[error("resource exhausted")]
    ResourceExhausted,

    /// An RTSP request failed to parse.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// A method completed without producing a response.
    #[error("not found")]
    NotFound,

    /// The player pipeline reported an error.
    #[error("playback error: {0}")]
    PlaybackError(String),

    /// The operation was cancelled.
    #[error("cancelled")]
    Cancelled,

    /// Settings subsystem error.
    #[error(transparent)]
    Settings(#[from] crate::settings::SettingsError),

    /// Playlist subsystem error.
    #[error(transparent)]
    Playlist(#[from] crate::playlist::PlaylistError),

    /// Player registry error.
    #[error(transparent)]
    Player(#[from] crate::players::PlayerError),

    /// RTSP engine error.
    #[error(transparent)]
    Rtsp(#[from] crate::rtsp::RtspError),

    /// I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
