//! Shuffle enable/disable with non-destructive backup/restore.
//!
//! Grounded on `control::queue::PlaybackQueue::shuffle`'s permute-and-pin
//! shape, generalized to the hierarchical list's recursive, flag-marked
//! restore contract.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use super::entry::{Arena, EntryId};
use super::list::EntryList;

/// Snapshot of one list's order, taken at shuffle-enable, consulted at
/// shuffle-disable to restore it. Holds one extra reference per entry
/// (released as each entry is restored or discarded) so a delete that
/// occurs while shuffled does not free an entry the backup still needs to
/// walk.
pub struct ShuffleBackup {
    entries: Vec<(EntryId, Option<Box<ShuffleBackup>>)>,
}

/// Snapshot `list`'s order into a backup, then re-thread it in a random
/// permutation, marking every re-inserted entry `ShuffleInserted`.
/// Recurses into the children of any `Sortable` entry.
///
/// `seed` drives every permutation in this call, including nested ones, via
/// a single seeded RNG stream — the same seed always produces the same
/// order, which is what the round-trip property in the playlist's testable
/// invariants requires.
pub fn enable(arena: &mut Arena, list: &mut EntryList, seed: u64) -> ShuffleBackup {
    let mut rng = StdRng::seed_from_u64(seed);
    enable_with_rng(arena, list, &mut rng)
}

fn enable_with_rng(arena: &mut Arena, list: &mut EntryList, rng: &mut StdRng) -> ShuffleBackup {
    let original_order: Vec<EntryId> = list.iter(arena).collect();
    let old_current = list.current;

    let mut entries = Vec::with_capacity(original_order.len());
    for &id in &original_order {
        arena.add_ref(id);
        let sortable = arena.get(id).is_some_and(|e| e.flags.sortable);
        let recursive = if sortable {
            let mut children = arena.get(id).expect("entry missing").children;
            let child_backup = enable_with_rng(arena, &mut children, rng);
            arena.get_mut(id).expect("entry missing").children = children;
            Some(Box::new(child_backup))
        } else {
            None
        };
        entries.push((id, recursive));
    }

    let mut permuted = original_order;
    permuted.shuffle(rng);

    *list = EntryList::new();
    for id in &permuted {
        if let Some(entry) = arena.get_mut(*id) {
            entry.flags.shuffle_inserted = true;
        }
        list.append(arena, *id);
    }

    if let Some(current) = old_current {
        list.current = Some(current);
        list.current_index = list.get_index(arena, current).unwrap_or(0);
    }

    ShuffleBackup { entries }
}

/// Two-phase restore of `list` from `backup`: entries added to the
/// playlist while shuffled (`ShuffleAdded`) are pulled out first, keeping
/// their relative order, then the backup's original order is replayed,
/// skipping entries marked `ShuffleDeleted`.
pub fn disable(arena: &mut Arena, list: &mut EntryList, backup: ShuffleBackup) {
    let old_current = list.current;
    let shuffled_order: Vec<EntryId> = list.iter(arena).collect();

    let mut restored = EntryList::new();
    for id in &shuffled_order {
        let added = arena.get(*id).is_some_and(|e| e.flags.shuffle_added);
        if added {
            if let Some(entry) = arena.get_mut(*id) {
                entry.flags.shuffle_added = false;
            }
            restored.append(arena, *id);
        }
    }

    *list = EntryList::new();

    for (id, child_backup) in backup.entries {
        let deleted = arena.get(id).is_none_or(|e| e.flags.shuffle_deleted);
        if deleted {
            arena.release(id);
            continue;
        }
        if let Some(entry) = arena.get_mut(id) {
            entry.flags.shuffle_inserted = false;
        }
        if let Some(child_backup) = child_backup {
            let mut children = arena.get(id).expect("entry missing").children;
            disable(arena, &mut children, *child_backup);
            arena.get_mut(id).expect("entry missing").children = children;
        }
        restored.append(arena, id);
        arena.release(id);
    }

    *list = restored;
    if let Some(current) = old_current {
        if list.get_index(arena, current).is_some() {
            list.current = Some(current);
            list.current_index = list.get_index(arena, current).unwrap_or(0);
        }
    }
}
