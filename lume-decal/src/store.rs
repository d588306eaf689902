use glam::Vec3;
use log::debug;

use crate::types::{CursorPreview, DecalRecord};
use crate::N_MAX_STORED_DECALS;

/// Fixed-capacity arena of committed decals.
///
/// Insertions go to `slot(counter)`; once the arena is full the oldest record is
/// replaced. Reads are bounded by [`DecalStore::active_count`].
pub struct DecalStore {
    records: Vec<DecalRecord>,
    capacity: usize,
    inserted: u64,
}

impl Default for DecalStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DecalStore {
    pub fn new() -> Self {
        Self::with_capacity(N_MAX_STORED_DECALS)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "decal store capacity must be non-zero");
        Self {
            records: Vec::with_capacity(capacity),
            capacity,
            inserted: 0,
        }
    }

    /// Arena slot for the `insertion`-th commit (zero based).
    pub fn slot(&self, insertion: u64) -> usize {
        (insertion % self.capacity as u64) as usize
    }

    /// Stores a decal built from `preview` at the next slot, evicting the oldest
    /// record when the arena is full.
    pub fn commit(&mut self, position: Vec3, normal: Vec3, preview: &CursorPreview) {
        let record = preview.place(position, normal);
        let slot = self.slot(self.inserted);
        if slot < self.records.len() {
            self.records[slot] = record;
        } else {
            self.records.push(record);
        }
        self.inserted += 1;
        debug!("Committed decal #{} to slot {} at {:?}", self.inserted, slot, position);
    }

    pub fn active_count(&self) -> usize {
        self.inserted.min(self.capacity as u64) as usize
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn get(&self, index: usize) -> &DecalRecord {
        debug_assert!(index < self.active_count(), "decal index {} out of range", index);
        &self.records[index]
    }

    /// Active records in slot order.
    pub fn records(&self) -> &[DecalRecord] {
        &self.records
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.inserted = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preview() -> CursorPreview {
        CursorPreview {
            size: Vec3::new(1.0, 1.0, 0.5),
            rotation: 0.0,
            angle_fade: 0.5,
            albedo: 1.0,
            intensity: 1.0,
            albedo_index: 0,
            normal_index: 0,
        }
    }

    fn commit_n(store: &mut DecalStore, n: usize) {
        for k in 1..=n {
            store.commit(Vec3::new(k as f32, 0.0, 0.0), Vec3::Y, &preview());
        }
    }

    #[test]
    fn test_active_count_saturates_at_capacity() {
        let mut store = DecalStore::new();
        assert_eq!(store.active_count(), 0);
        for k in 1..=70 {
            commit_n(&mut store, 1);
            assert_eq!(store.active_count(), k.min(N_MAX_STORED_DECALS));
        }
    }

    #[test]
    fn test_sixty_fifth_commit_overwrites_first() {
        let mut store = DecalStore::new();
        commit_n(&mut store, 65);
        assert_eq!(store.active_count(), 64);
        assert_eq!(store.get(0).position.x, 65.0);
        assert_eq!(store.get(1).position.x, 2.0);
        assert_eq!(store.get(63).position.x, 64.0);
    }

    #[test]
    fn test_slot_wraps() {
        let store = DecalStore::with_capacity(4);
        assert_eq!(store.slot(0), 0);
        assert_eq!(store.slot(3), 3);
        assert_eq!(store.slot(4), 0);
        assert_eq!(store.slot(9), 1);
    }

    #[test]
    #[should_panic]
    fn test_get_out_of_range_panics() {
        let mut store = DecalStore::new();
        commit_n(&mut store, 2);
        store.get(2);
    }

    #[test]
    fn test_clear_empties_store() {
        let mut store = DecalStore::with_capacity(2);
        commit_n(&mut store, 3);
        store.clear();
        assert_eq!(store.active_count(), 0);
        assert!(store.records().is_empty());
    }
}
