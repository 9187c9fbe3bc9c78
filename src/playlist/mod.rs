//! The playlist engine: a hierarchical, reference-counted queue with
//! current-cursor tracking, move/delete/shuffle with non-destructive
//! restore, and recursive next/previous navigation.
//!
//! Grounded on `control::queue::PlaybackQueue`'s ownership shape (one
//! queue, one cursor, events fanned out on every mutation), generalized to
//! the hierarchical, arena-backed tree described in the reference-counted-
//! mutable-graphs design note.

pub mod dispatch;
pub mod entry;
pub mod list;
pub mod navigate;
pub mod shuffle;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use serde::{Deserialize, Serialize};

use crate::events::EventBus;
use crate::message::{Message, MessagePayload};
use crate::players::registry::{PlayerRegistry, PlaylistController};
use crate::players::tags::Tags;
use crate::request::{Request, RequestTracker};

use entry::{Arena, Entry, EntryId};
use list::EntryList;
use shuffle::ShuffleBackup;

/// Playlist engine errors.
#[derive(Debug, thiserror::Error)]
pub enum PlaylistError {
    /// No entry exists at the given index path.
    #[error("no entry at that index path")]
    NotFound,
    /// A walk bottomed out at a non-playable entry with no playable
    /// sibling reachable within the traversal bound.
    #[error("nothing playable reachable from that position")]
    NothingPlayable,
    /// No playlist is registered under the requested id.
    #[error("unknown playlist: {0}")]
    UnknownPlaylist(String),
    /// A playlist with this id is already registered.
    #[error("playlist already registered: {0}")]
    AlreadyRegistered(String),
}

/// A flattened view of one entry, used on the wire and for `GetMediaList`
/// responses. `children` is populated one level deep; deeper levels are
/// fetched with a further `GetMediaList` against that entry's path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaEntry {
    /// Index within its parent list.
    pub index: usize,
    /// Index path from the playlist root to this entry's parent.
    pub parent_indices: Vec<usize>,
    /// Display name.
    pub name: String,
    /// Whether this entry can be handed to a player.
    pub playable: bool,
    /// Whether this entry participates in shuffling.
    pub sortable: bool,
    /// Media tags.
    pub tags: Tags,
    /// One level of children, if any.
    pub children: Vec<MediaEntry>,
}

/// A linear run of sibling indices: `{first_indices, length}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaRange {
    /// Index path to the first affected entry.
    pub first_indices: Vec<usize>,
    /// Number of consecutive siblings at that level.
    pub length: usize,
}

/// `Playlist.Event` as defined on the control wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PlaylistEvent {
    /// An entry was added.
    Add(MediaEntry),
    /// An entry was updated in place.
    Update(MediaEntry),
    /// Cursor moved; carries the full root-to-leaf index chain.
    Play { indices: Vec<usize> },
    /// A range was moved.
    Move { range: MediaRange, dest: Vec<usize> },
    /// A range was deleted.
    Delete { range: MediaRange },
    /// Shuffle was enabled or disabled.
    Shuffle(bool),
}

/// `Playlist.Request` as defined on the control wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PlaylistRequest {
    /// Fetch a page of the media list.
    GetMediaList { offset: usize, count: usize },
    /// Fetch the currently playing entry's index path.
    GetCurrent,
    /// Play the entry at this index path.
    Play { indices: Vec<usize> },
    /// Move a range to a destination index path.
    Move { range: MediaRange, dest: Vec<usize> },
    /// Delete a range.
    Delete { range: MediaRange },
    /// Enable or disable shuffle.
    Shuffle(bool),
}

/// `Playlist.Response` as defined on the control wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PlaylistResponse {
    /// A page of the media list.
    MediaList { items: Vec<MediaEntry>, offset: usize, count: usize },
    /// The current cursor's index path, if any.
    Current { indices: Option<Vec<usize>> },
    /// The request was accepted; effects are reported via events.
    Ok,
    /// The request failed.
    Error { text: String },
}

/// One hierarchical playback queue: entries, cursor, shuffle backup, and
/// its own event bus and request tracker, as laid out in the data model.
pub struct Playlist {
    id: String,
    arena: Mutex<Arena>,
    root: Mutex<EntryList>,
    shuffle_backup: Mutex<Option<ShuffleBackup>>,
    events: Arc<EventBus>,
    requests: RequestTracker,
    player_registry: Arc<PlayerRegistry>,
}

impl Playlist {
    /// Create an empty playlist bound to `player_registry` for arbitration
    /// on `play`/`play_next`/`play_previous`.
    #[must_use]
    pub fn new(id: impl Into<String>, player_registry: Arc<PlayerRegistry>) -> Self {
        Self {
            id: id.into(),
            arena: Mutex::new(Arena::new()),
            root: Mutex::new(EntryList::new()),
            shuffle_backup: Mutex::new(None),
            events: Arc::new(EventBus::new()),
            requests: RequestTracker::new(),
            player_registry,
        }
    }

    /// This playlist's id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// This playlist's event bus.
    #[must_use]
    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// Bookkeeping for in-flight requests dispatched against this playlist.
    #[must_use]
    pub fn requests(&self) -> &RequestTracker {
        &self.requests
    }

    fn broadcast<T: MessagePayload>(&self, event: &T) {
        self.events.broadcast(event.pack());
    }

    /// Append a playable leaf under the root, broadcasting `add`.
    pub fn add_media(&self, player_id: &str, path: &str, name: &str, tags: Option<Tags>) -> EntryId {
        let mut arena = self.arena.lock().unwrap_or_else(|e| e.into_inner());
        let mut root = self.root.lock().unwrap_or_else(|e| e.into_inner());

        let entry = Entry::leaf(player_id, path, name, tags.unwrap_or_default());
        let id = arena.insert(entry);

        let shuffled = self.shuffle_backup.lock().unwrap_or_else(|e| e.into_inner()).is_some();
        if shuffled {
            if let Some(e) = arena.get_mut(id) {
                e.flags.shuffle_added = true;
            }
        }
        root.append(&mut arena, id);

        let index = root.get_index(&arena, id).unwrap_or(0);
        let media = self.media_entry(&arena, id, index, &[]);
        drop(arena);
        drop(root);
        self.broadcast(&PlaylistEvent::Add(media));
        id
    }

    /// Build the wire `MediaEntry` for `id`, sitting at `index` within its
    /// enclosing list, whose own ancestors sit at `parent_indices`.
    fn media_entry(&self, arena: &Arena, id: EntryId, index: usize, parent_indices: &[usize]) -> MediaEntry {
        let entry = arena.get(id).expect("entry missing from arena");
        let mut child_prefix = parent_indices.to_vec();
        child_prefix.push(index);
        let children = entry
            .children
            .iter(arena)
            .enumerate()
            .map(|(i, child)| self.media_entry(arena, child, i, &child_prefix))
            .collect();
        MediaEntry {
            index,
            parent_indices: parent_indices.to_vec(),
            name: entry.display_name.clone(),
            playable: entry.flags.playable,
            sortable: entry.flags.sortable,
            tags: entry.tags.clone(),
            children,
        }
    }

    /// List up to `count` entries of the root starting at `offset`.
    #[must_use]
    pub fn get_media_list(&self, offset: usize, count: usize) -> Vec<MediaEntry> {
        let arena = self.arena.lock().unwrap_or_else(|e| e.into_inner());
        let root = self.root.lock().unwrap_or_else(|e| e.into_inner());
        (offset..)
            .take(count)
            .map_while(|i| root.nth(&arena, i).map(|id| (i, id)))
            .map(|(i, id)| self.media_entry(&arena, id, i, &[]))
            .collect()
    }

    /// Number of top-level entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.root.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Whether the root is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The current cursor's index path, if any.
    #[must_use]
    pub fn current_indices(&self) -> Option<Vec<usize>> {
        let arena = self.arena.lock().unwrap_or_else(|e| e.into_inner());
        let root = self.root.lock().unwrap_or_else(|e| e.into_inner());
        let chain = navigate::cursor_chain(&arena, &root);
        (!chain.is_empty()).then_some(chain)
    }

    /// Steps 1-6 of `play`: resolve `indices`, walk/ascend to a playable
    /// leaf, set the cursor chain, hand the entry to the player registry,
    /// and broadcast `play` plus the recomputed prev/next availability.
    ///
    /// # Errors
    ///
    /// Returns [`PlaylistError::NotFound`] if `indices` names nothing, or
    /// [`PlaylistError::NothingPlayable`] if no playable entry is reachable.
    pub fn play(&self, indices: &[usize]) -> Result<(), PlaylistError> {
        self.play_bounded(indices, None)
    }

    fn play_bounded(&self, indices: &[usize], limit: Option<usize>) -> Result<(), PlaylistError> {
        let mut arena = self.arena.lock().unwrap_or_else(|e| e.into_inner());
        let mut root = self.root.lock().unwrap_or_else(|e| e.into_inner());

        let resolved = navigate::resolve_playable(&mut arena, &root, indices, limit)
            .map_err(|()| PlaylistError::NothingPlayable)?;

        let Some((entry_id, chain)) = resolved else {
            navigate::clear_cursor_chain(&mut arena, &mut root);
            drop(arena);
            drop(root);
            self.broadcast(&PlaylistEvent::Play { indices: Vec::new() });
            return Ok(());
        };

        navigate::set_cursor_chain(&mut arena, &mut root, &chain);

        let entry = arena.get(entry_id).ok_or(PlaylistError::NotFound)?;
        let (player_id, path, name, tags) = (
            entry.player_id.clone().ok_or(PlaylistError::NothingPlayable)?,
            entry.path.clone().unwrap_or_default(),
            entry.display_name.clone(),
            entry.tags.clone(),
        );
        let availability = navigate::prev_next_availability(&arena, &root);

        drop(arena);
        drop(root);

        let _ = self.player_registry.play_media(&player_id, &path, &name, tags, entry_id);
        self.broadcast(&PlaylistEvent::Play { indices: chain });
        self.player_registry.update_playlist_availability(&player_id, availability.0, availability.1);
        Ok(())
    }

    /// Advance to the next entry in display order (the *previous* sibling
    /// by index — see [`navigate::play_next`]).
    pub fn play_next(&self) -> bool {
        self.step(navigate::play_next as fn(&mut Arena, &mut EntryList) -> Option<(EntryId, Vec<usize>)>)
    }

    /// Advance to the previous entry in display order (the *next* sibling
    /// by index — see [`navigate::play_previous`]).
    pub fn play_previous(&self) -> bool {
        self.step(navigate::play_previous as fn(&mut Arena, &mut EntryList) -> Option<(EntryId, Vec<usize>)>)
    }

    fn step(&self, walk: fn(&mut Arena, &mut EntryList) -> Option<(EntryId, Vec<usize>)>) -> bool {
        let outcome = {
            let mut arena = self.arena.lock().unwrap_or_else(|e| e.into_inner());
            let mut root = self.root.lock().unwrap_or_else(|e| e.into_inner());
            walk(&mut arena, &mut root)
        };
        let Some((_, chain)) = outcome else { return false };
        self.play_bounded(&chain, Some(chain.len() + 4)).is_ok()
    }

    /// Enable shuffle; a no-op (returns `false`) if already shuffled. Picks
    /// a fresh seed per call; see [`Self::set_shuffle_seeded`] to pin one.
    pub fn set_shuffle(&self, enable: bool) -> bool {
        self.set_shuffle_seeded(enable, rand::random())
    }

    /// Enable shuffle with an explicit seed, or disable it. Enabling twice
    /// with the same seed against the same list order produces the same
    /// permutation, which is what makes shuffle round-trips reproducible
    /// in tests; `set_shuffle` is the seed-picking convenience wrapper
    /// live callers use.
    pub fn set_shuffle_seeded(&self, enable: bool, seed: u64) -> bool {
        let mut arena = self.arena.lock().unwrap_or_else(|e| e.into_inner());
        let mut root = self.root.lock().unwrap_or_else(|e| e.into_inner());
        let mut backup = self.shuffle_backup.lock().unwrap_or_else(|e| e.into_inner());

        let changed = match (enable, backup.is_some()) {
            (true, false) => {
                *backup = Some(shuffle::enable(&mut arena, &mut root, seed));
                true
            }
            (false, true) => {
                let taken = backup.take().expect("checked Some above");
                shuffle::disable(&mut arena, &mut root, taken);
                true
            }
            _ => false,
        };

        drop(arena);
        drop(root);
        drop(backup);
        if changed {
            self.broadcast(&PlaylistEvent::Shuffle(enable));
        }
        changed
    }

    /// Whether shuffle is currently active.
    #[must_use]
    pub fn is_shuffled(&self) -> bool {
        self.shuffle_backup.lock().unwrap_or_else(|e| e.into_inner()).is_some()
    }

    /// Extract, then delete, the `length` siblings at `first_indices`,
    /// marking each `ShuffleDeleted` and releasing one reference.
    pub fn delete(&self, first_indices: &[usize], length: usize) {
        let Some((&first, prefix)) = first_indices.split_last() else { return };
        let mut arena = self.arena.lock().unwrap_or_else(|e| e.into_inner());
        let mut root = self.root.lock().unwrap_or_else(|e| e.into_inner());

        let mut detached = Vec::new();
        let mut cursor_in_range = None;
        let resolved = with_list_at(&mut arena, &mut root, prefix, |arena, list| {
            let (d, c) = list.extract_range(arena, first, length);
            detached = d;
            cursor_in_range = c;
        });
        if resolved.is_none() {
            return;
        }

        for id in &detached {
            if let Some(entry) = arena.get_mut(*id) {
                entry.flags.shuffle_deleted = true;
            }
            arena.release(*id);
        }
        if cursor_in_range.is_some() {
            navigate::clear_cursor_chain(&mut arena, &mut root);
        }

        drop(arena);
        drop(root);
        self.broadcast(&PlaylistEvent::Delete {
            range: MediaRange { first_indices: first_indices.to_vec(), length },
        });
    }

    /// Extract the `length` siblings at `first_indices` and re-insert them
    /// before `dest`.
    pub fn move_range(&self, first_indices: &[usize], length: usize, dest: &[usize]) {
        let Some((&first, prefix)) = first_indices.split_last() else { return };
        let mut arena = self.arena.lock().unwrap_or_else(|e| e.into_inner());
        let mut root = self.root.lock().unwrap_or_else(|e| e.into_inner());

        let mut detached = Vec::new();
        let resolved = with_list_at(&mut arena, &mut root, prefix, |arena, list| {
            let (d, _) = list.extract_range(arena, first, length);
            detached = d;
        });
        if resolved.is_none() {
            return;
        }

        match dest.split_last() {
            None => {
                let tail = root.len();
                with_list_at(&mut arena, &mut root, &[], |arena, list| {
                    list.splice_detached_at(arena, tail, &detached);
                });
            }
            Some((&dest_last, dest_prefix)) => {
                with_list_at(&mut arena, &mut root, dest_prefix, |arena, list| {
                    list.splice_detached_at(arena, dest_last, &detached);
                });
            }
        }

        drop(arena);
        drop(root);
        self.broadcast(&PlaylistEvent::Move {
            range: MediaRange { first_indices: first_indices.to_vec(), length },
            dest: dest.to_vec(),
        });
    }
}

/// Run `f` against the `EntryList` named by `prefix` (the root itself if
/// empty, otherwise the entry at that index path's `children`). `prefix`
/// entries are resolved before `f` runs, so `f` must not change any
/// ancestor's position.
fn with_list_at<R>(
    arena: &mut Arena,
    root: &mut EntryList,
    prefix: &[usize],
    f: impl FnOnce(&mut Arena, &mut EntryList) -> R,
) -> Option<R> {
    if prefix.is_empty() {
        return Some(f(arena, root));
    }
    let parent = navigate::resolve_indices(arena, root, prefix)?;
    let entry = arena.get_mut(parent)?;
    let list_ptr = std::ptr::addr_of_mut!(entry.children);
    // SAFETY: `list_ptr` points at a field of an arena slot that stays live
    // for the duration of `f` (neither `f` nor anything it calls inserts
    // into or reallocates the arena's backing storage).
    let list = unsafe { &mut *list_ptr };
    Some(f(arena, list))
}

/// Implements end-of-stream advancement for whichever playlist is current.
impl PlaylistController for PlaylistRegistry {
    fn play_next(&self) -> bool {
        self.current().is_some_and(|p| p.play_next())
    }
}

/// Process-wide table of playlists, with one "current".
pub struct PlaylistRegistry {
    playlists: RwLock<HashMap<String, Arc<Playlist>>>,
    current: RwLock<Option<String>>,
}

impl Default for PlaylistRegistry {
    fn default() -> Self {
        Self { playlists: RwLock::new(HashMap::new()), current: RwLock::new(None) }
    }
}

impl PlaylistRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `playlist`, making it current if none is yet.
    ///
    /// # Errors
    ///
    /// Returns [`PlaylistError::AlreadyRegistered`] if its id is already
    /// present.
    pub fn register(&self, playlist: Arc<Playlist>) -> Result<(), PlaylistError> {
        let id = playlist.id().to_string();
        let mut playlists = self.playlists.write().unwrap_or_else(|e| e.into_inner());
        if playlists.contains_key(&id) {
            return Err(PlaylistError::AlreadyRegistered(id));
        }
        playlists.insert(id.clone(), playlist);
        drop(playlists);

        let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
        if current.is_none() {
            *current = Some(id);
        }
        Ok(())
    }

    /// Look up a playlist by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<Playlist>> {
        self.playlists.read().unwrap_or_else(|e| e.into_inner()).get(id).cloned()
    }

    /// The current playlist, if any.
    #[must_use]
    pub fn current(&self) -> Option<Arc<Playlist>> {
        let id = self.current.read().unwrap_or_else(|e| e.into_inner()).clone()?;
        self.get(&id)
    }

    /// Make `id` current.
    ///
    /// # Errors
    ///
    /// Returns [`PlaylistError::UnknownPlaylist`] if `id` is not registered.
    pub fn set_current(&self, id: &str) -> Result<(), PlaylistError> {
        if !self.playlists.read().unwrap_or_else(|e| e.into_inner()).contains_key(id) {
            return Err(PlaylistError::UnknownPlaylist(id.to_string()));
        }
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = Some(id.to_string());
        Ok(())
    }
}
