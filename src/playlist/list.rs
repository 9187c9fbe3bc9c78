//! Doubly-linked, circularly-terminated list primitives threading entries
//! that live in a playlist's [`Arena`](super::entry::Arena).
//!
//! The list is not a ring of distinct owners: ownership lives in each
//! entry's `ref_count`, the list merely threads `prev`/`next`/`parent`
//! ids. The head's `prev` is the tail; the tail's `next` is the head.

use super::entry::{Arena, EntryId};

/// `{head; count; current; current_index}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntryList {
    pub(crate) head: Option<EntryId>,
    pub(crate) count: usize,
    pub(crate) current: Option<EntryId>,
    pub(crate) current_index: usize,
}

impl EntryList {
    /// An empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries threaded into this list.
    #[must_use]
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The deepest-visible current entry at this level, if any.
    #[must_use]
    pub fn current(&self) -> Option<EntryId> {
        self.current
    }

    /// The current entry's index at this level.
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Insert `id` (already arena-linked to itself) at the head. If a
    /// current cursor exists, its index increases by one.
    pub fn prepend(&mut self, arena: &mut Arena, id: EntryId) {
        self.splice_in_before(arena, self.head, id);
        self.head = Some(id);
        self.count += 1;
        if self.current.is_some() {
            self.current_index += 1;
        }
    }

    /// Insert `id` at the tail.
    pub fn append(&mut self, arena: &mut Arena, id: EntryId) {
        self.splice_in_before(arena, self.head, id);
        if self.head.is_none() {
            self.head = Some(id);
        }
        self.count += 1;
    }

    /// Link a lone, self-looped node `id` into the ring immediately before
    /// `before` (a no-op, since `id` is already a valid sole-element ring,
    /// if `before` is `None`).
    fn splice_in_before(&mut self, arena: &mut Arena, before: Option<EntryId>, id: EntryId) {
        let Some(before) = before else { return };
        let prev = arena.get(before).expect("list entry missing from arena").prev;
        arena.get_mut(prev).expect("prev entry missing").next = id;
        arena.get_mut(before).expect("before entry missing").prev = id;
        let entry = arena.get_mut(id).expect("inserted entry missing");
        entry.prev = prev;
        entry.next = before;
    }

    /// Unlink `id` from the ring without changing its `ref_count`,
    /// resetting it to a sole-element ring. Caller fixes up
    /// `head`/`count`/`current`.
    fn unlink(&mut self, arena: &mut Arena, id: EntryId) {
        let (prev, next) = {
            let entry = arena.get(id).expect("entry missing from arena");
            (entry.prev, entry.next)
        };
        if prev != id {
            arena.get_mut(prev).expect("prev missing").next = next;
            arena.get_mut(next).expect("next missing").prev = prev;
        }
        let entry = arena.get_mut(id).expect("entry missing");
        entry.prev = id;
        entry.next = id;
    }

    /// Traverse to the `i`th entry (0-based) from whichever end is closer.
    #[must_use]
    pub fn nth(&self, arena: &Arena, i: usize) -> Option<EntryId> {
        if i >= self.count {
            return None;
        }
        let head = self.head?;
        if i * 2 <= self.count {
            let mut id = head;
            for _ in 0..i {
                id = arena.get(id).expect("list entry missing").next;
            }
            Some(id)
        } else {
            let tail = arena.get(head).expect("head missing").prev;
            let mut id = tail;
            for _ in 0..(self.count - 1 - i) {
                id = arena.get(id).expect("list entry missing").prev;
            }
            Some(id)
        }
    }

    /// Linear `O(count)` search for `id`'s index.
    #[must_use]
    pub fn get_index(&self, arena: &Arena, id: EntryId) -> Option<usize> {
        let head = self.head?;
        let mut cursor = head;
        for i in 0..self.count {
            if cursor == id {
                return Some(i);
            }
            cursor = arena.get(cursor).expect("list entry missing").next;
        }
        None
    }

    /// Unref every entry and empty the list.
    pub fn clear(&mut self, arena: &mut Arena) {
        let ids: Vec<EntryId> = self.iter(arena).collect();
        for id in ids {
            arena.release(id);
        }
        *self = Self::default();
    }

    /// Iterate entries head-to-tail.
    pub fn iter<'a>(&self, arena: &'a Arena) -> impl Iterator<Item = EntryId> + 'a {
        let mut cursor = self.head;
        let mut remaining = self.count;
        std::iter::from_fn(move || {
            if remaining == 0 {
                return None;
            }
            let id = cursor?;
            cursor = arena.get(id).map(|e| e.next);
            remaining -= 1;
            Some(id)
        })
    }

    /// Detach `length` consecutive siblings starting at index `first`,
    /// splicing the remaining neighbours together. Returns the detached
    /// entries in order and, if the cursor fell inside the range, its
    /// offset within the detached run.
    pub(crate) fn extract_range(
        &mut self,
        arena: &mut Arena,
        first: usize,
        length: usize,
    ) -> (Vec<EntryId>, Option<usize>) {
        let mut detached = Vec::with_capacity(length);
        let mut cursor_offset = None;

        for offset in 0..length {
            let Some(id) = self.nth(arena, first) else { break };
            if self.current == Some(id) {
                cursor_offset = Some(offset);
            }
            let next = arena.get(id).expect("entry missing").next;
            let was_sole = self.count == 1;
            self.unlink(arena, id);
            detached.push(id);
            self.count -= 1;
            if was_sole {
                self.head = None;
            } else if self.head == Some(id) {
                self.head = Some(next);
            }
        }

        if cursor_offset.is_some() {
            self.current = None;
            self.current_index = 0;
        } else if let Some(current) = self.current {
            self.current_index = self.get_index(arena, current).unwrap_or(0);
        }

        (detached, cursor_offset)
    }

    /// Insert a previously-detached run of self-looped entries, in order,
    /// before index `at` (or at the tail if `at >= len`).
    pub(crate) fn splice_detached_at(&mut self, arena: &mut Arena, at: usize, run: &[EntryId]) {
        if run.is_empty() {
            return;
        }
        let anchor = self.nth(arena, at);
        for &id in run {
            if let Some(anchor_id) = anchor.or(self.head) {
                self.splice_in_before(arena, Some(anchor_id), id);
            }
            if self.head.is_none() {
                self.head = Some(id);
            }
            self.count += 1;
        }
        if at == 0 {
            self.head = Some(run[0]);
        }
        if let Some(current) = self.current {
            self.current_index = self.get_index(arena, current).unwrap_or(self.current_index);
        }
    }
}
