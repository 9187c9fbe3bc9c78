//! Recursive next/previous navigation over the hierarchical cursor chain.
//!
//! The cursor is a *chain*: a root entry list has a `current`; that entry
//! may in turn point, via `children.current`, to a child; recursion
//! bottoms out at a node with no `children.current`. The outward-visible
//! "current" is the deepest node in that chain.

use super::entry::{Arena, EntryId};
use super::list::EntryList;

/// The ordered indices, one per level root-to-leaf, locating the deepest
/// current entry.
#[must_use]
pub fn cursor_chain(arena: &Arena, root: &EntryList) -> Vec<usize> {
    let mut chain = Vec::new();
    let mut list = *root;
    while let Some(current) = list.current() {
        chain.push(list.current_index());
        let Some(entry) = arena.get(current) else { break };
        if entry.children.is_empty() || entry.children.current().is_none() {
            break;
        }
        list = entry.children;
    }
    chain
}

/// Resolve an index path (root to leaf) to an entry id.
#[must_use]
pub fn resolve_indices(arena: &Arena, root: &EntryList, indices: &[usize]) -> Option<EntryId> {
    let mut list = *root;
    let mut id = None;
    for &i in indices {
        id = list.nth(arena, i);
        let entry = arena.get(id?)?;
        list = entry.children;
    }
    id
}

/// Walk to the deepest last child (tail of the tail, recursively) starting
/// from `start`.
#[must_use]
pub fn last_leaf(arena: &Arena, start: EntryId) -> EntryId {
    let mut id = start;
    loop {
        let Some(entry) = arena.get(id) else { return id };
        if entry.children.is_empty() {
            return id;
        }
        let Some(tail) = entry.children.nth(arena, entry.children.len() - 1) else {
            return id;
        };
        id = tail;
    }
}

/// Set `current`/`current_index` at every level along `indices`, root to
/// leaf, and return the entry id at the end of the path.
pub fn set_cursor_chain(arena: &mut Arena, root: &mut EntryList, indices: &[usize]) -> Option<EntryId> {
    let mut id = None;
    let mut list_ref: *mut EntryList = root;
    for &i in indices {
        // SAFETY: `list_ref` always points at either `root` or a live
        // entry's `children` field fetched via `arena.get_mut` just below,
        // both of which outlive this loop iteration.
        let list = unsafe { &mut *list_ref };
        let entry_id = list.nth(arena, i)?;
        list.current = Some(entry_id);
        list.current_index = i;
        id = Some(entry_id);
        let entry = arena.get_mut(entry_id)?;
        list_ref = std::ptr::addr_of_mut!(entry.children);
    }
    id
}

/// Clear `current` at every level along the chain currently set on `root`.
pub fn clear_cursor_chain(arena: &mut Arena, root: &mut EntryList) {
    let mut list_ref: *mut EntryList = root;
    loop {
        // SAFETY: see `set_cursor_chain`.
        let list = unsafe { &mut *list_ref };
        let Some(current) = list.current.take() else { break };
        list.current_index = 0;
        let Some(entry) = arena.get_mut(current) else { break };
        list_ref = std::ptr::addr_of_mut!(entry.children);
    }
}

/// Recompute, from the deepest level both a "previous" and "next" sibling
/// could exist at, whether each is currently available.
#[must_use]
pub fn prev_next_availability(arena: &Arena, root: &EntryList) -> (bool, bool) {
    let mut list = *root;
    loop {
        let Some(current) = list.current() else { return (false, false) };
        let entry = arena.get(current);
        let descends_further = entry.is_some_and(|e| e.children.current().is_some());
        if !descends_further {
            let index = list.current_index();
            let has_previous = index > 0;
            let has_next = index + 1 < list.len();
            return (has_previous, has_next);
        }
        list = entry.expect("checked above").children;
    }
}

/// The index path from `root` down to `target`, derived from `target`'s
/// `parent` back-links rather than the (possibly stale) cursor.
fn chain_to(arena: &Arena, root: &EntryList, target: EntryId) -> Option<Vec<usize>> {
    let mut chain = Vec::new();
    let mut current = target;
    loop {
        let entry = arena.get(current)?;
        let siblings = match entry.parent {
            Some(parent) => arena.get(parent)?.children,
            None => *root,
        };
        chain.push(siblings.get_index(arena, current)?);
        match entry.parent {
            Some(parent) => current = parent,
            None => break,
        }
    }
    chain.reverse();
    Some(chain)
}

/// Drain and release a node's children without touching its own
/// `ref_count`; used when ascending out of a container the walk found to
/// hold nothing playable.
fn drain_children(arena: &mut Arena, id: EntryId) {
    let Some(mut children) = arena.get(id).map(|e| e.children) else { return };
    children.clear(arena);
    if let Some(entry) = arena.get_mut(id) {
        entry.children = children;
    }
}

/// Steps 1-4 of playlist navigation's `play`: resolve `indices` to a
/// candidate, walk to its deepest last child, and if that leaf is not
/// playable, ascend clearing emptied containers until a playable leaf is
/// found or the root is reached.
///
/// Returns `Ok(Some((entry, chain)))` on a resolved playable leaf with its
/// full cursor-chain index path; `Ok(None)` for the graceful "nothing left
/// to play" case (the walk exhausted the tree and the original path named
/// a boundary position at the root level); `Err(())` otherwise, or if
/// `limit` bounds the number of ascend steps and that bound is exceeded
/// (used by `play_next`/`play_previous` to keep recursive retries from
/// walking the whole tree).
pub fn resolve_playable(
    arena: &mut Arena,
    root: &EntryList,
    indices: &[usize],
    limit: Option<usize>,
) -> Result<Option<(EntryId, Vec<usize>)>, ()> {
    let Some(start) = resolve_indices(arena, root, indices) else { return Ok(None) };

    let mut current = last_leaf(arena, start);
    let mut steps = 0usize;

    loop {
        let playable = arena.get(current).is_some_and(|e| e.flags.playable);
        if playable {
            let chain = chain_to(arena, root, current).ok_or(())?;
            return Ok(Some((current, chain)));
        }

        let parent = arena.get(current).and_then(|e| e.parent);
        let Some(parent) = parent else {
            let boundary = indices.first().is_some_and(|&i| i == 0 || i + 1 == root.len());
            return if boundary { Ok(None) } else { Err(()) };
        };

        steps += 1;
        if limit.is_some_and(|limit| steps > limit) {
            return Err(());
        }

        drain_children(arena, current);
        current = parent;
    }
}

/// Shared walk for `play_next`/`play_previous`: move the deepest cursor
/// index by `delta`, retrying at shallower levels (ascend, widen the
/// search) until a playable entry is found or the chain is exhausted.
fn step(arena: &mut Arena, root: &mut EntryList, delta: isize) -> Option<(EntryId, Vec<usize>)> {
    let mut chain = cursor_chain(arena, root);
    while !chain.is_empty() {
        let last = chain.len() - 1;
        let Some(moved) = chain[last].checked_add_signed(delta) else {
            chain.pop();
            continue;
        };
        chain[last] = moved;

        match resolve_playable(arena, root, &chain, Some(chain.len() + 4)) {
            Ok(Some((entry, full_chain))) => {
                set_cursor_chain(arena, root, &full_chain);
                return Some((entry, full_chain));
            }
            Ok(None) => return None,
            Err(()) => {
                chain.pop();
            }
        }
    }
    None
}

/// Advance to the "next" media in display order, which — because the
/// playlist displays most-recent-first — is the *previous* sibling by
/// index. This inversion is intentional; do not silently correct it.
pub fn play_next(arena: &mut Arena, root: &mut EntryList) -> Option<(EntryId, Vec<usize>)> {
    step(arena, root, -1)
}

/// Advance to the "previous" media in display order, the *next* sibling
/// by index. See [`play_next`] for the inversion rationale.
pub fn play_previous(arena: &mut Arena, root: &mut EntryList) -> Option<(EntryId, Vec<usize>)> {
    step(arena, root, 1)
}
