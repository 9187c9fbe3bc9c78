//! Player registry: global player table, current-player arbitration, status
//! broadcast, protected update operations, and client request dispatch.
//!
//! Grounded on `receiver::session_manager::SessionManager`'s single
//! current-entity-with-arbitration shape, generalized from "one active
//! session" to a table of many registered players plus one "current"
//! pointer, and from a direct RTSP-session type to the `Player` trait named
//! in the object-system design notes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use serde::{Deserialize, Serialize};

use crate::events::EventBus;
use crate::message::{Message, MessagePayload};
use crate::playlist::entry::EntryId;

use super::descriptor::{PlayState, PlayerDescriptor, PlayerMutableState, StreamState};
use super::tags::{MergeSkip, Tags};

/// Player registry errors.
#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    /// No player is registered under the requested id.
    #[error("unknown player: {0}")]
    UnknownId(String),
    /// `register` was called with an id already present.
    #[error("player already registered: {0}")]
    AlreadyRegistered(String),
}

/// The playback pipeline owned by a module, represented as an opaque trait
/// implementation; the registry owns only the descriptor, mutable state,
/// and this handle.
pub trait Player: Send + Sync {
    /// Start (or resume) playback of `path`.
    fn play(&self, path: &str);
    /// Request a playback state transition.
    fn set_state(&self, state: PlayState);
    /// Seek to an absolute position.
    fn set_position(&self, position_ms: u64);
    /// Query the last known position (used when exiting `Buffering`).
    fn get_position(&self) -> u64;
    /// Apply a gain change to the sink.
    fn set_volume(&self, volume: f32, muted: bool);
}

/// Implemented by whatever owns "the current playlist", so the registry can
/// trigger `play_next` on end-of-stream/error without depending on the
/// playlist engine's concrete type.
pub trait PlaylistController: Send + Sync {
    /// Advance the current playlist's cursor and play the result.
    /// Returns `false` if there is nothing to advance to.
    fn play_next(&self) -> bool;
}

struct RegisteredPlayer {
    descriptor: PlayerDescriptor,
    state: PlayerMutableState,
    player: Arc<dyn Player>,
}

/// `Player.Event` as defined on the control wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PlayerEvent {
    /// A player was registered.
    Add(PlayerDescriptor),
    /// A player was unregistered.
    Remove(PlayerDescriptor),
    /// Current media changed.
    Media { name: String, tags: Tags },
    /// Playback/stream status changed.
    Status { state: PlayState, stream_state: StreamState, value: u8 },
    /// Position/duration changed.
    Position { position_ms: u64, duration_ms: u64 },
    /// Volume/mute changed.
    Volume { volume: f32, muted: bool },
    /// A pipeline error occurred.
    Error { text: String },
    /// Prev/next availability changed.
    Playlist { has_previous: bool, has_next: bool },
}

/// `Player.Request` as defined on the control wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PlayerRequest {
    /// Set the current player's playback state.
    SetState(PlayState),
    /// Seek the current player.
    SetPosition(u64),
    /// Set the global volume.
    SetVolume(f32),
    /// Set the global mute flag.
    SetMute(bool),
    /// Play the previous entry on the current playlist.
    PlayPrevious,
    /// Play the next entry on the current playlist.
    PlayNext,
}

/// Global player table plus current-player arbitration.
pub struct PlayerRegistry {
    players: RwLock<HashMap<String, RegisteredPlayer>>,
    current: RwLock<Option<String>>,
    events: Arc<EventBus>,
    playlist_controller: Mutex<Option<Arc<dyn PlaylistController>>>,
    global_volume: RwLock<(f32, bool)>,
}

impl Default for PlayerRegistry {
    fn default() -> Self {
        Self {
            players: RwLock::new(HashMap::new()),
            current: RwLock::new(None),
            events: Arc::new(EventBus::new()),
            playlist_controller: Mutex::new(None),
            global_volume: RwLock::new((1.0, false)),
        }
    }
}

impl PlayerRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared event bus players/playlists broadcast status on.
    #[must_use]
    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// Wire in the controller used to advance the current playlist on
    /// end-of-stream/error.
    pub fn set_playlist_controller(&self, controller: Arc<dyn PlaylistController>) {
        *self.playlist_controller.lock().unwrap_or_else(|e| e.into_inner()) = Some(controller);
    }

    fn broadcast<T: MessagePayload>(&self, event: &T) {
        self.events.broadcast(event.pack());
    }

    /// Register a player, broadcasting `player.add`. Lazily creates the
    /// table on first use (a no-op with a `HashMap`, kept for parity with
    /// the spec's "first registration creates the hash lazily" wording).
    ///
    /// # Errors
    ///
    /// Returns [`PlayerError::AlreadyRegistered`] if `descriptor.id` is
    /// already present; duplicates are rejected rather than overwritten.
    pub fn register(
        &self,
        descriptor: PlayerDescriptor,
        player: Arc<dyn Player>,
    ) -> Result<(), PlayerError> {
        let mut players = self.players.write().unwrap_or_else(|e| e.into_inner());
        if players.contains_key(&descriptor.id) {
            tracing::warn!(id = %descriptor.id, "duplicate player registration rejected");
            return Err(PlayerError::AlreadyRegistered(descriptor.id));
        }
        let event_descriptor = descriptor.clone();
        players.insert(
            descriptor.id.clone(),
            RegisteredPlayer { descriptor, state: PlayerMutableState::default(), player },
        );
        drop(players);
        self.broadcast(&PlayerEvent::Add(event_descriptor));
        Ok(())
    }

    /// Unregister a player, broadcasting `player.remove`. Clears `current`
    /// if the removed player was current.
    pub fn unregister(&self, id: &str) {
        let removed = {
            let mut players = self.players.write().unwrap_or_else(|e| e.into_inner());
            players.remove(id)
        };
        let Some(removed) = removed else { return };

        let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
        if current.as_deref() == Some(id) {
            *current = None;
        }
        drop(current);
        self.broadcast(&PlayerEvent::Remove(removed.descriptor));
    }

    /// The current player's id, if any.
    #[must_use]
    pub fn current_id(&self) -> Option<String> {
        self.current.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn with_player<R>(&self, id: &str, f: impl FnOnce(&mut RegisteredPlayer) -> R) -> Option<R> {
        let mut players = self.players.write().unwrap_or_else(|e| e.into_inner());
        players.get_mut(id).map(f)
    }

    /// Replace media name and tags for `id`, broadcasting `media`.
    pub fn update_media(&self, id: &str, name: &str, tags: Tags, skip: MergeSkip) {
        let updated = self.with_player(id, |p| {
            p.state.media_name = name.to_string();
            p.state.tags.merge(&tags, skip);
            p.state.tags.clone()
        });
        if let Some(tags) = updated {
            self.broadcast(&PlayerEvent::Media { name: name.to_string(), tags });
        }
    }

    /// Merge `tags` into the player's current tags without changing the
    /// media name, broadcasting `media`.
    pub fn update_tags(&self, id: &str, tags: Tags, skip: MergeSkip) {
        let updated = self.with_player(id, |p| {
            p.state.tags.merge(&tags, skip);
            (p.state.media_name.clone(), p.state.tags.clone())
        });
        if let Some((name, tags)) = updated {
            self.broadcast(&PlayerEvent::Media { name, tags });
        }
    }

    /// Set playback and stream state together, broadcasting `status`.
    pub fn update_status(&self, id: &str, state: PlayState, stream_state: StreamState, percent: u8) {
        self.update_stream_state(id, stream_state, percent);
        self.update_state(id, state);
    }

    /// Set playback state only, broadcasting `status` with the current
    /// stream state.
    pub fn update_state(&self, id: &str, state: PlayState) {
        let snapshot = self.with_player(id, |p| {
            p.state.state = state;
            (p.state.state, p.state.stream_state, p.state.stream_percent)
        });
        if let Some((state, stream_state, percent)) = snapshot {
            self.broadcast(&PlayerEvent::Status { state, stream_state, value: percent });
        }
    }

    /// Set stream state and percent (clamped to 0..100, forced to 0 when
    /// `stream_state` is `None`), re-querying position when exiting
    /// `Buffering`, broadcasting `status`.
    pub fn update_stream_state(&self, id: &str, stream_state: StreamState, percent: u8) {
        let percent = percent.min(100);
        let was_buffering_player = self.with_player(id, |p| {
            let was_buffering = p.state.stream_state == StreamState::Buffering;
            p.state.stream_state = stream_state;
            p.state.stream_percent = if stream_state == StreamState::None { 0 } else { percent };
            (was_buffering, p.player.clone(), p.state.state, p.state.stream_percent)
        });
        if let Some((was_buffering, player, play_state, clamped_percent)) = was_buffering_player {
            if was_buffering && stream_state != StreamState::Buffering {
                let position = player.get_position();
                self.update_position(id, position);
            }
            self.broadcast(&PlayerEvent::Status {
                state: play_state,
                stream_state,
                value: clamped_percent,
            });
        }
    }

    /// Set position, broadcasting `position` with the current duration.
    pub fn update_position(&self, id: &str, position_ms: u64) {
        let duration = self.with_player(id, |p| {
            p.state.position_ms = position_ms;
            p.state.duration_ms
        });
        if let Some(duration_ms) = duration {
            self.broadcast(&PlayerEvent::Position { position_ms, duration_ms });
        }
    }

    /// Set position and duration together, broadcasting `position`.
    pub fn update_duration(&self, id: &str, position_ms: u64, duration_ms: u64) {
        let updated = self.with_player(id, |p| {
            p.state.position_ms = position_ms;
            p.state.duration_ms = duration_ms;
            true
        });
        if updated.is_some() {
            self.broadcast(&PlayerEvent::Position { position_ms, duration_ms });
        }
    }

    /// Set volume/mute, propagate to the sink, and persist via the
    /// coalescing delayed-save mechanism owned by the caller (the RTSP/
    /// settings wiring schedules the actual 10s-debounced save; the
    /// registry's job here is state + broadcast + sink propagation).
    pub fn update_volume(&self, id: &str, volume: f32, muted: bool) {
        let volume = volume.clamp(0.0, 1.0);
        let player = self.with_player(id, |p| {
            p.state.volume = volume;
            p.state.muted = muted;
            p.player.clone()
        });
        if let Some(player) = player {
            player.set_volume(volume, muted);
            *self.global_volume.write().unwrap_or_else(|e| e.into_inner()) = (volume, muted);
            self.broadcast(&PlayerEvent::Volume { volume, muted });
        }
    }

    /// Current-player arbitration: make `player_id` current, tear down the
    /// old current player's state, hand the new current player the supplied
    /// entry/media/tags, and invoke `play`.
    ///
    /// # Errors
    ///
    /// Returns [`PlayerError::UnknownId`] if `player_id` is not registered.
    pub fn play_media(
        &self,
        player_id: &str,
        path: &str,
        name: &str,
        tags: Tags,
        entry: EntryId,
    ) -> Result<(), PlayerError> {
        if !self.players.read().unwrap_or_else(|e| e.into_inner()).contains_key(player_id) {
            return Err(PlayerError::UnknownId(player_id.to_string()));
        }

        let old = {
            let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
            let old = current.clone();
            *current = Some(player_id.to_string());
            old
        };

        let is_new_player = old.as_deref() != Some(player_id);
        if is_new_player {
            if let Some(old_id) = old.as_deref() {
                if let Some(old_player) = self.with_player(old_id, |p| p.player.clone()) {
                    old_player.set_state(PlayState::None);
                    self.update_state(old_id, PlayState::None);
                }
            }
        }

        let new_player = self.with_player(player_id, |p| {
            p.state.playlist_entry_ref = Some(entry);
            p.state.current_entry_ref = Some(entry);
            p.state.media_name = name.to_string();
            p.state.tags = tags.clone();
            p.player.clone()
        });

        self.broadcast(&PlayerEvent::Media { name: name.to_string(), tags });
        self.update_status(player_id, PlayState::Playing, StreamState::Loading, 0);
        self.update_duration(player_id, 0, 0);

        if is_new_player {
            let (volume, muted) = *self.global_volume.read().unwrap_or_else(|e| e.into_inner());
            self.broadcast(&PlayerEvent::Volume { volume, muted });
        }

        if let Some(player) = new_player {
            player.play(path);
        }
        Ok(())
    }

    /// End-of-stream: try to advance the current playlist; fall back to
    /// `Stopped` if there is nothing to advance to.
    pub fn eos(&self, player_id: &str) {
        let advanced = self
            .playlist_controller
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_some_and(|c| c.play_next());
        if !advanced {
            self.update_state(player_id, PlayState::Stopped);
        }
    }

    /// Broadcast a pipeline error; if `player_id` is current and not
    /// already idle, attempt `play_next`, falling back to `Stopped`.
    pub fn error(&self, player_id: &str, message: &str) {
        self.broadcast(&PlayerEvent::Error { text: message.to_string() });

        let is_current = self.current_id().as_deref() == Some(player_id);
        let is_idle = self
            .with_player(player_id, |p| matches!(p.state.state, PlayState::None | PlayState::Stopped))
            .unwrap_or(true);

        if is_current && !is_idle {
            self.eos(player_id);
        }
    }

    /// Deliver a status-replay snapshot to a newly joined listener, in the
    /// order: every current player's `add`, then (for the current player)
    /// media/status/position, then global volume and playlist controls.
    pub fn replay_status_to(&self, deliver: impl Fn(Message)) {
        let players = self.players.read().unwrap_or_else(|e| e.into_inner());
        for registered in players.values() {
            deliver(PlayerEvent::Add(registered.descriptor.clone()).pack());
        }
        if let Some(current_id) = self.current_id() {
            if let Some(registered) = players.get(&current_id) {
                deliver(
                    PlayerEvent::Media {
                        name: registered.state.media_name.clone(),
                        tags: registered.state.tags.clone(),
                    }
                    .pack(),
                );
                deliver(
                    PlayerEvent::Status {
                        state: registered.state.state,
                        stream_state: registered.state.stream_state,
                        value: registered.state.stream_percent,
                    }
                    .pack(),
                );
                deliver(
                    PlayerEvent::Position {
                        position_ms: registered.state.position_ms,
                        duration_ms: registered.state.duration_ms,
                    }
                    .pack(),
                );
            }
        }
        drop(players);
        let (volume, muted) = *self.global_volume.read().unwrap_or_else(|e| e.into_inner());
        deliver(PlayerEvent::Volume { volume, muted }.pack());
    }

    /// Recompute and broadcast prev/next sibling availability for `id`.
    pub fn update_playlist_availability(&self, id: &str, has_previous: bool, has_next: bool) {
        let updated = self.with_player(id, |p| {
            p.state.has_previous = has_previous;
            p.state.has_next = has_next;
        });
        if updated.is_some() {
            self.broadcast(&PlayerEvent::Playlist { has_previous, has_next });
        }
    }

    /// Dispatch a `Player.Request` against the current player/playlist.
    pub fn handle_request(&self, request: &PlayerRequest) {
        let Some(current_id) = self.current_id() else { return };
        match request {
            PlayerRequest::SetState(state) => {
                if let Some(player) = self.with_player(&current_id, |p| p.player.clone()) {
                    player.set_state(*state);
                    self.update_state(&current_id, *state);
                }
            }
            PlayerRequest::SetPosition(position_ms) => {
                if let Some(player) = self.with_player(&current_id, |p| p.player.clone()) {
                    player.set_position(*position_ms);
                    self.update_position(&current_id, *position_ms);
                }
            }
            PlayerRequest::SetVolume(volume) => {
                let muted = self.global_volume.read().unwrap_or_else(|e| e.into_inner()).1;
                self.update_volume(&current_id, *volume, muted);
            }
            PlayerRequest::SetMute(muted) => {
                let volume = self.global_volume.read().unwrap_or_else(|e| e.into_inner()).0;
                self.update_volume(&current_id, volume, *muted);
            }
            PlayerRequest::PlayPrevious | PlayerRequest::PlayNext => {
                if let Some(controller) =
                    self.playlist_controller.lock().unwrap_or_else(|e| e.into_inner()).clone()
                {
                    controller.play_next();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct StubPlayer {
        position: AtomicU64,
    }

    impl Player for StubPlayer {
        fn play(&self, _path: &str) {}
        fn set_state(&self, _state: PlayState) {}
        fn set_position(&self, position_ms: u64) {
            self.position.store(position_ms, Ordering::SeqCst);
        }
        fn get_position(&self) -> u64 {
            self.position.load(Ordering::SeqCst)
        }
        fn set_volume(&self, _volume: f32, _muted: bool) {}
    }

    fn descriptor(id: &str) -> PlayerDescriptor {
        PlayerDescriptor {
            id: id.to_string(),
            display_name: id.to_string(),
            description: String::new(),
            icon: String::new(),
        }
    }

    #[test]
    fn duplicate_registration_rejected() {
        let registry = PlayerRegistry::new();
        let player: Arc<dyn Player> = Arc::new(StubPlayer { position: AtomicU64::new(0) });
        registry.register(descriptor("p"), player.clone()).unwrap();
        let err = registry.register(descriptor("p"), player).unwrap_err();
        assert!(matches!(err, PlayerError::AlreadyRegistered(id) if id == "p"));
    }

    #[test]
    fn unregister_clears_current() {
        let registry = PlayerRegistry::new();
        let player: Arc<dyn Player> = Arc::new(StubPlayer { position: AtomicU64::new(0) });
        registry.register(descriptor("p"), player).unwrap();
        registry
            .play_media("p", "/a", "A", Tags::default(), EntryId::from_raw(1))
            .unwrap();
        assert_eq!(registry.current_id().as_deref(), Some("p"));
        registry.unregister("p");
        assert_eq!(registry.current_id(), None);
    }

    #[test]
    fn play_media_on_unknown_player_fails() {
        let registry = PlayerRegistry::new();
        let err = registry
            .play_media("missing", "/a", "A", Tags::default(), EntryId::from_raw(1))
            .unwrap_err();
        assert!(matches!(err, PlayerError::UnknownId(id) if id == "missing"));
    }
}
