use log::debug;

use crate::camera::CameraState;
use crate::config::DecalConfig;
use crate::input::FrameInput;
use crate::partition::IndexPartition;
use crate::pick::PickState;
use crate::settings::{DecalSettings, LightSettings};
use crate::store::DecalStore;
use crate::types::PickResult;
use crate::visibility::{Visibility, VisibilityClassifier};

/// Instance counts baked into a recorded command buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordedCounts {
    pub active: usize,
    pub straddling: usize,
}

impl From<&IndexPartition> for RecordedCounts {
    fn from(partition: &IndexPartition) -> Self {
        Self { active: partition.active_count(), straddling: partition.num_straddling }
    }
}

#[derive(Clone, Copy, Debug)]
struct SlotRecord {
    dirty: bool,
    recorded: Option<RecordedCounts>,
}

/// Host side of the frame loop: decals, the pending pick and which frame slots
/// have stale command buffers. Holds no GPU handles.
pub struct FrameState {
    store: DecalStore,
    settings: DecalSettings,
    light: LightSettings,
    classifier: VisibilityClassifier,
    visibility: Visibility,
    partition: IndexPartition,
    pick: PickState,
    /// Camera of the most recently prepared frame, which is what the G-Buffer holds.
    last_camera: Option<CameraState>,
    slots: Vec<SlotRecord>,
}

impl FrameState {
    pub fn new(config: &DecalConfig, slot_count: usize) -> Self {
        Self {
            store: DecalStore::new(),
            settings: DecalSettings::new(config),
            light: LightSettings::default(),
            classifier: VisibilityClassifier::new(config.near_slab_thickness),
            visibility: Visibility::default(),
            partition: IndexPartition::default(),
            pick: PickState::Idle,
            last_camera: None,
            slots: vec![SlotRecord { dirty: true, recorded: None }; slot_count],
        }
    }

    /// Applies one frame of input. A click arms the pick; clicks that arrive
    /// while one is pending collapse into it.
    pub fn update(&mut self, input: &FrameInput) {
        self.settings.apply(input);
        self.light.apply(input);
        if input.clicked && self.pick == PickState::Idle {
            debug!("Pick requested");
            self.pick = PickState::Resolving;
        }
    }

    /// Camera the pending pick resolves against. A pick armed before any frame
    /// was prepared has no G-Buffer to read and is dropped.
    pub fn pending_pick(&mut self) -> Option<CameraState> {
        if self.pick != PickState::Resolving {
            return None;
        }
        if self.last_camera.is_none() {
            debug!("Pick dropped: no frame has been rendered yet");
            self.pick = PickState::Idle;
        }
        self.last_camera
    }

    /// Places the cursor decal at `hit` and invalidates every recorded slot.
    pub fn commit_pick(&mut self, hit: &PickResult) {
        let preview = self.settings.cursor_preview();
        self.store.commit(hit.position.truncate(), hit.normal.truncate(), &preview);
        self.pick = PickState::Idle;
        self.mark_all_dirty();
    }

    pub fn classify(&mut self, camera: &CameraState) {
        self.visibility = self.classifier.classify(self.store.records(), camera);
        self.partition.rebuild(&self.visibility.straddling);
    }

    pub fn recorded_counts(&self) -> RecordedCounts {
        RecordedCounts::from(&self.partition)
    }

    /// Camera motion alone can move decals across the near slab, so the recorded
    /// split is compared as well as the dirty flag.
    pub fn needs_record(&self, slot: usize) -> bool {
        let record = &self.slots[slot];
        record.dirty || record.recorded != Some(self.recorded_counts())
    }

    pub fn mark_recorded(&mut self, slot: usize) {
        let counts = self.recorded_counts();
        self.slots[slot] = SlotRecord { dirty: false, recorded: Some(counts) };
    }

    pub fn mark_all_dirty(&mut self) {
        for record in &mut self.slots {
            record.dirty = true;
        }
    }

    pub fn frame_prepared(&mut self, camera: CameraState) {
        self.last_camera = Some(camera);
    }

    /// Size-dependent resources were rebuilt: every slot re-records and the old
    /// G-Buffer camera no longer applies.
    pub fn invalidate(&mut self) {
        self.mark_all_dirty();
        self.last_camera = None;
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn pick_state(&self) -> PickState {
        self.pick
    }

    pub fn store(&self) -> &DecalStore {
        &self.store
    }

    pub fn settings(&self) -> &DecalSettings {
        &self.settings
    }

    pub fn light(&self) -> &LightSettings {
        &self.light
    }

    pub fn visibility(&self) -> &Visibility {
        &self.visibility
    }

    pub fn partition(&self) -> &IndexPartition {
        &self.partition
    }
}

#[cfg(test)]
mod tests {
    use glam::{Vec3, Vec4};

    use super::*;

    fn camera_at(position: Vec3) -> CameraState {
        CameraState::new(position, -Vec3::Z, Vec3::Y, 45f32.to_radians(), 0.1, 35.0, 1280, 720)
    }

    fn click() -> FrameInput {
        FrameInput { delta_time: 0.016, clicked: true, ..Default::default() }
    }

    fn wall_hit() -> PickResult {
        PickResult { position: Vec4::new(0.0, 0.0, -5.0, 1.0), normal: Vec4::new(0.0, 0.0, 1.0, 0.0) }
    }

    /// The host steps of one prepared frame; true if the slot was re-recorded.
    fn prepare(state: &mut FrameState, slot: usize, camera: &CameraState) -> bool {
        if state.pending_pick().is_some() {
            state.commit_pick(&wall_hit());
        }
        state.classify(camera);
        let record = state.needs_record(slot);
        if record {
            state.mark_recorded(slot);
        }
        state.frame_prepared(*camera);
        record
    }

    #[test]
    fn test_click_before_first_frame_is_dropped() {
        let mut state = FrameState::new(&DecalConfig::default(), 3);
        state.update(&click());
        assert_eq!(state.pick_state(), PickState::Resolving);

        assert!(state.pending_pick().is_none());
        assert_eq!(state.pick_state(), PickState::Idle);
        assert_eq!(state.store().active_count(), 0);
    }

    #[test]
    fn test_repeated_clicks_commit_one_decal() {
        let camera = camera_at(Vec3::ZERO);
        let mut state = FrameState::new(&DecalConfig::default(), 3);
        prepare(&mut state, 0, &camera);

        state.update(&click());
        state.update(&click());
        assert_eq!(state.pick_state(), PickState::Resolving);

        prepare(&mut state, 1, &camera);
        assert_eq!(state.pick_state(), PickState::Idle);
        assert_eq!(state.store().active_count(), 1);
        assert!(state.store().get(0).position.abs_diff_eq(Vec3::new(0.0, 0.0, -5.0), 1e-6));

        prepare(&mut state, 2, &camera);
        assert_eq!(state.store().active_count(), 1);
    }

    #[test]
    fn test_commit_rerecords_every_slot_once() {
        let camera = camera_at(Vec3::ZERO);
        let mut state = FrameState::new(&DecalConfig::default(), 3);
        for slot in 0..3 {
            assert!(prepare(&mut state, slot, &camera));
        }
        for slot in 0..3 {
            assert!(!prepare(&mut state, slot, &camera));
        }

        state.update(&click());
        let recorded: Vec<bool> = (0..3).map(|slot| prepare(&mut state, slot, &camera)).collect();
        assert_eq!(recorded, vec![true; 3]);
        let recorded: Vec<bool> = (0..3).map(|slot| prepare(&mut state, slot, &camera)).collect();
        assert_eq!(recorded, vec![false; 3]);
    }

    #[test]
    fn test_camera_entering_decal_rerecords() {
        let outside = camera_at(Vec3::ZERO);
        let mut state = FrameState::new(&DecalConfig::default(), 1);
        prepare(&mut state, 0, &outside);
        state.update(&click());
        prepare(&mut state, 0, &outside);
        assert_eq!(state.recorded_counts(), RecordedCounts { active: 1, straddling: 0 });
        assert!(!prepare(&mut state, 0, &outside));

        let inside = camera_at(Vec3::new(0.0, 0.0, -5.0));
        assert!(prepare(&mut state, 0, &inside));
        assert_eq!(state.recorded_counts(), RecordedCounts { active: 1, straddling: 1 });
    }

    #[test]
    fn test_invalidate_forgets_gbuffer_camera() {
        let camera = camera_at(Vec3::ZERO);
        let mut state = FrameState::new(&DecalConfig::default(), 2);
        prepare(&mut state, 0, &camera);
        prepare(&mut state, 1, &camera);

        state.invalidate();
        assert!(state.needs_record(0) && state.needs_record(1));
        state.update(&click());
        assert!(state.pending_pick().is_none());
    }

    #[test]
    fn test_recorded_counts_track_partition_split() {
        let a = RecordedCounts::from(&IndexPartition::build(&[true, false, false]));
        let b = RecordedCounts::from(&IndexPartition::build(&[false, false, false]));
        assert_eq!(a, RecordedCounts { active: 3, straddling: 1 });
        assert_ne!(a, b);
    }
}
