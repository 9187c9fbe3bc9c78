//! Playlist entry nodes, stored in a per-playlist arena.
//!
//! The source models entries as a reference-counted doubly-linked
//! intrusive ring with a parent back-link — a cyclic graph. Per the
//! reference-counted-mutable-graphs design note, entries here are node
//! handles (`EntryId`, a generational index) in a per-playlist arena;
//! neighbour and parent edges are ids, not pointers, which keeps the graph
//! memory-safe without `Rc`/`RefCell` cycles. `ref_count` is retained on
//! the node itself for cross-module holders (a request callback, a
//! player's `current_entry_ref`) and gates arena removal.

use serde::{Deserialize, Serialize};

use crate::players::tags::Tags;

/// A stable, generational handle to an entry within one playlist's arena.
/// Never valid across different playlists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryId {
    index: u32,
    generation: u32,
}

impl EntryId {
    #[cfg(test)]
    pub(crate) fn from_raw(index: u32) -> Self {
        Self { index, generation: 0 }
    }
}

/// Entry behavior flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct EntryFlags {
    /// Has a `player_id`; a leaf that can be handed to a player.
    pub playable: bool,
    /// Participates in shuffling (folders may opt out).
    pub sortable: bool,
    /// Set during `enable_shuffle` on every entry re-inserted by the
    /// permutation walk; cleared once shuffle is disabled.
    pub shuffle_inserted: bool,
    /// Set on any entry added to the playlist while shuffle is active.
    pub shuffle_added: bool,
    /// Set on an entry removed by `delete` while detached, before release.
    pub shuffle_deleted: bool,
}

/// One playlist tree node.
#[derive(Debug, Clone)]
pub struct Entry {
    pub(crate) ref_count: u32,
    /// Player id this entry plays through; `None` marks a folder.
    pub player_id: Option<String>,
    /// Media path/URI; `None` for folders.
    pub path: Option<String>,
    /// Display name.
    pub display_name: String,
    /// Tags.
    pub tags: Tags,
    /// Flags.
    pub flags: EntryFlags,
    pub(crate) parent: Option<EntryId>,
    pub(crate) children: super::list::EntryList,
    pub(crate) prev: EntryId,
    pub(crate) next: EntryId,
}

impl Entry {
    /// A folder (non-playable) entry.
    #[must_use]
    pub fn folder(display_name: impl Into<String>) -> Self {
        Self::new(None, None, display_name, Tags::default())
    }

    /// A playable leaf entry.
    #[must_use]
    pub fn leaf(player_id: impl Into<String>, path: impl Into<String>, display_name: impl Into<String>, tags: Tags) -> Self {
        Self::new(Some(player_id.into()), Some(path.into()), display_name, tags)
    }

    fn new(player_id: Option<String>, path: Option<String>, display_name: impl Into<String>, tags: Tags) -> Self {
        let playable = player_id.is_some();
        Self {
            ref_count: 0,
            player_id,
            path,
            display_name: display_name.into(),
            tags,
            flags: EntryFlags { playable, sortable: true, ..EntryFlags::default() },
            parent: None,
            children: super::list::EntryList::new(),
            prev: EntryId { index: 0, generation: 0 },
            next: EntryId { index: 0, generation: 0 },
        }
    }
}

/// Per-playlist arena of entries, keyed by generational [`EntryId`].
#[derive(Debug, Default)]
pub struct Arena {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

#[derive(Debug)]
enum Slot {
    Occupied { generation: u32, entry: Entry },
    Free { generation: u32 },
}

impl Arena {
    /// Create an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new entry with `ref_count == 1`, returning its id.
    pub fn insert(&mut self, mut entry: Entry) -> EntryId {
        entry.ref_count = 1;
        entry.prev = EntryId { index: 0, generation: 0 };
        entry.next = EntryId { index: 0, generation: 0 };
        if let Some(index) = self.free.pop() {
            let Slot::Free { generation } = self.slots[index as usize] else {
                unreachable!("free list points at an occupied slot");
            };
            let id = EntryId { index, generation };
            self.slots[index as usize] = Slot::Occupied { generation, entry };
            entry_self_link(self, id);
            id
        } else {
            let index = u32::try_from(self.slots.len()).expect("arena index overflow");
            self.slots.push(Slot::Occupied { generation: 0, entry });
            let id = EntryId { index, generation: 0 };
            entry_self_link(self, id);
            id
        }
    }

    /// Borrow an entry.
    #[must_use]
    pub fn get(&self, id: EntryId) -> Option<&Entry> {
        match self.slots.get(id.index as usize) {
            Some(Slot::Occupied { generation, entry }) if *generation == id.generation => Some(entry),
            _ => None,
        }
    }

    /// Mutably borrow an entry.
    pub fn get_mut(&mut self, id: EntryId) -> Option<&mut Entry> {
        match self.slots.get_mut(id.index as usize) {
            Some(Slot::Occupied { generation, entry }) if *generation == id.generation => Some(entry),
            _ => None,
        }
    }

    /// Increment `ref_count`.
    pub fn add_ref(&mut self, id: EntryId) {
        if let Some(entry) = self.get_mut(id) {
            entry.ref_count += 1;
        }
    }

    /// Decrement `ref_count`; free the slot once it reaches zero.
    pub fn release(&mut self, id: EntryId) {
        let should_free = self.get_mut(id).is_some_and(|entry| {
            entry.ref_count = entry.ref_count.saturating_sub(1);
            entry.ref_count == 0
        });
        if should_free {
            let generation = id.generation.wrapping_add(1);
            self.slots[id.index as usize] = Slot::Free { generation };
            self.free.push(id.index);
        }
    }
}

fn entry_self_link(arena: &mut Arena, id: EntryId) {
    if let Some(entry) = arena.get_mut(id) {
        entry.prev = id;
        entry.next = id;
    }
}
