//! Hash-slot plan.
//!
//! Slots are dealt round-robin: master `i` of `n` owns every slot `s` with
//! `s % n == i`. Every slot has exactly one owner for any `n >= 1`.

use crate::SLOT_COUNT;

/// Slots owned by the master at `index` out of `master_count`.
///
/// Returns an empty set when `index` is out of range or `master_count` is 0.
pub fn slots_for_master(
    index: usize,
    master_count: usize,
) -> Vec<u16> {
    if master_count == 0 || index >= master_count {
        return Vec::new();
    }
    (0..SLOT_COUNT)
        .filter(|slot| *slot as usize % master_count == index)
        .collect()
}

/// Index of the master owning `slot`.
pub fn slot_owner(
    slot: u16,
    master_count: usize,
) -> Option<usize> {
    if master_count == 0 || slot >= SLOT_COUNT {
        return None;
    }
    Some(slot as usize % master_count)
}
