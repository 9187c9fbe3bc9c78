//! Player registry: descriptors, mutable playback state, tag merging, and
//! the global table with current-player arbitration.

pub mod descriptor;
pub mod registry;
pub mod tags;

pub use descriptor::{PlayState, PlayerDescriptor, PlayerMutableState, StreamState};
pub use registry::{Player, PlayerError, PlayerEvent, PlayerRegistry, PlayerRequest, PlaylistController};
pub use tags::{MergeSkip, Tags};
