use std::marker::PhantomData;

use bytemuck::Pod;
use log::{debug, error, info};
use lume_core::device::*;
use lume_core::{Device, LumeResult};

use crate::camera::CameraState;
use crate::cluster::{ClusterBuilder, ClusterGridLayout};
use crate::config::DecalConfig;
use crate::input::FrameInput;
use crate::partition::IndexPartition;
use crate::pick::{PickController, PickState};
use crate::settings::DecalSettings;
use crate::state::FrameState;
use crate::store::DecalStore;
use crate::types::{CameraUniform, CursorUniform, GpuDecal, GpuIndexList, LightUniform, ZBounds};
use crate::visibility::Visibility;
use crate::{N_MAX_STORED_DECALS, UNIFORM_ALIGNMENT};

pub type DecalArray = [GpuDecal; N_MAX_STORED_DECALS];
pub type ZBoundsArray = [ZBounds; N_MAX_STORED_DECALS];

/// Byte distance between consecutive slots holding a `T`.
pub fn slot_stride<T>() -> u64 {
    (std::mem::size_of::<T>() as u64).div_ceil(UNIFORM_ALIGNMENT) * UNIFORM_ALIGNMENT
}

/// One host-visible buffer holding a `T` per frame slot.
pub struct FrameBuffered<D: Device, T: Pod> {
    buffer: D::Buffer,
    stride: u64,
    slots: usize,
    _marker: PhantomData<T>,
}

impl<D: Device, T: Pod> FrameBuffered<D, T> {
    pub fn new(device: &D, usage: BufferUsage, slots: usize) -> LumeResult<Self> {
        let stride = slot_stride::<T>();
        let buffer = device.create_buffer(BufferDescriptor {
            size: stride * slots as u64,
            usage,
            location: MemoryLocation::CpuToGpu,
        })?;
        Ok(Self { buffer, stride, slots, _marker: PhantomData })
    }

    pub fn write(&self, slot: usize, value: &T) -> LumeResult<()> {
        debug_assert!(slot < self.slots);
        self.buffer.write_data(self.slot_offset(slot), bytemuck::bytes_of(value))
    }

    pub fn slot_offset(&self, slot: usize) -> u64 {
        slot as u64 * self.stride
    }

    pub fn slots(&self) -> usize {
        self.slots
    }

    pub fn buffer(&self) -> &D::Buffer {
        &self.buffer
    }

    pub fn binding(&self, slot: usize) -> BindingResource<'_, D> {
        BindingResource::BufferRange {
            buffer: &self.buffer,
            offset: self.slot_offset(slot),
            size: std::mem::size_of::<T>() as u64,
        }
    }

    /// Makes this frame's host writes visible to every shader stage that reads them.
    pub fn record_host_barrier(&self, cmd: &mut D::CommandBuffer, slot: usize) {
        cmd.buffer_barrier(
            &self.buffer,
            BufferBarrier::whole(
                PipelineStage::HOST,
                Access::HOST_WRITE,
                PipelineStage::VERTEX_SHADER | PipelineStage::FRAGMENT_SHADER | PipelineStage::COMPUTE_SHADER,
                Access::UNIFORM_READ | Access::SHADER_READ,
            )
            .range(self.slot_offset(slot), self.stride),
        );
    }
}

/// The passes recorded around the cluster build: G-Buffer before it, deferred
/// shading after it. `slot` is also the swapchain image index.
pub trait FrameStages<D: Device> {
    fn record_geometry(&self, cmd: &mut D::CommandBuffer, slot: usize);
    fn record_shading(&self, cmd: &mut D::CommandBuffer, slot: usize);
}

/// Buffers the shading side binds to walk the cluster grid.
pub struct ShadingInputs<'a, D: Device> {
    pub grid: ClusterGridLayout,
    pub cluster_buffer: &'a D::Buffer,
    pub decals: &'a FrameBuffered<D, DecalArray>,
    pub index_list: &'a FrameBuffered<D, GpuIndexList>,
    pub camera: &'a FrameBuffered<D, CameraUniform>,
    pub cursor: &'a FrameBuffered<D, CursorUniform>,
    pub light: &'a FrameBuffered<D, LightUniform>,
}

struct FrameSlot<D: Device> {
    command_buffer: D::CommandBuffer,
    fence: D::Fence,
    bind_group: D::BindGroup,
}

/// Owns the decal state and per-slot GPU data, and drives one frame at a time:
/// pick commit, classification, partition, upload and lazy re-recording.
pub struct FrameOrchestrator<D: Device> {
    device: D,
    state: FrameState,
    cluster: ClusterBuilder<D>,
    pick: PickController<D>,
    decals: FrameBuffered<D, DecalArray>,
    z_bounds: FrameBuffered<D, ZBoundsArray>,
    index_list: FrameBuffered<D, GpuIndexList>,
    camera: FrameBuffered<D, CameraUniform>,
    cursor: FrameBuffered<D, CursorUniform>,
    light_uniform: FrameBuffered<D, LightUniform>,
    slots: Vec<FrameSlot<D>>,
    _command_pool: D::CommandPool,
}

impl<D: Device> FrameOrchestrator<D> {
    pub fn new(device: &D, config: &DecalConfig, slot_count: usize, width: u32, height: u32) -> LumeResult<Self> {
        let cluster = ClusterBuilder::new(device, width, height)?;
        let pick = PickController::new(device)?;

        let storage = BufferUsage::STORAGE;
        let uniform = BufferUsage::UNIFORM;
        let decals = FrameBuffered::new(device, storage, slot_count)?;
        let z_bounds = FrameBuffered::new(device, storage, slot_count)?;
        let index_list = FrameBuffered::new(device, storage, slot_count)?;
        let camera = FrameBuffered::new(device, uniform, slot_count)?;
        let cursor = FrameBuffered::new(device, uniform, slot_count)?;
        let light_uniform = FrameBuffered::new(device, uniform, slot_count)?;

        let command_pool = device.create_command_pool()?;
        let mut slots = Vec::with_capacity(slot_count);
        for slot in 0..slot_count {
            slots.push(FrameSlot {
                command_buffer: command_pool.allocate_command_buffer()?,
                fence: device.create_fence(true)?,
                bind_group: Self::cluster_bind_group(&cluster, &camera, &decals, &index_list, &z_bounds, slot)?,
            });
        }

        info!("Frame orchestrator ready with {} slots", slot_count);

        Ok(Self {
            device: device.clone(),
            state: FrameState::new(config, slot_count),
            cluster,
            pick,
            decals,
            z_bounds,
            index_list,
            camera,
            cursor,
            light_uniform,
            slots,
            _command_pool: command_pool,
        })
    }

    fn cluster_bind_group(
        cluster: &ClusterBuilder<D>,
        camera: &FrameBuffered<D, CameraUniform>,
        decals: &FrameBuffered<D, DecalArray>,
        index_list: &FrameBuffered<D, GpuIndexList>,
        z_bounds: &FrameBuffered<D, ZBoundsArray>,
        slot: usize,
    ) -> LumeResult<D::BindGroup> {
        cluster.create_bind_group(camera.binding(slot), decals.binding(slot), index_list.binding(slot), z_bounds.binding(slot))
    }

    /// Applies one frame of input. A click arms the pick; it resolves in the next
    /// `prepare_slot`.
    pub fn update(&mut self, input: &FrameInput) {
        self.state.update(input);
    }

    /// Points the pick at the current G-Buffer. Call again whenever it is recreated.
    pub fn set_gbuffer(&mut self, depth: &D::TextureView, normal: &D::TextureView) -> LumeResult<()> {
        self.pick.set_gbuffer(depth, normal)
    }

    /// Blocks until the GPU has finished the last submission of `slot`.
    pub fn wait_slot(&self, slot: usize) -> LumeResult<()> {
        self.device.wait_for_fences(&[&self.slots[slot].fence], true, u64::MAX)
    }

    pub fn prepare_slot<S: FrameStages<D>>(&mut self, slot: usize, camera: &CameraState, stages: &S) -> LumeResult<()> {
        self.wait_slot(slot)?;

        if let Some(pick_camera) = self.state.pending_pick() {
            let hit = self
                .pick
                .resolve(pick_camera.inverse_view_projection, pick_camera.width, pick_camera.height)
                .inspect_err(|e| error!("Pick readback failed: {}", e))?;
            self.state.commit_pick(&hit);
        }

        self.state.classify(camera);
        self.upload(slot, camera)?;

        if self.state.needs_record(slot) {
            self.record(slot, stages)?;
        }

        self.state.frame_prepared(*camera);
        Ok(())
    }

    fn upload(&self, slot: usize, camera: &CameraState) -> LumeResult<()> {
        let state = &self.state;
        let mut decals: DecalArray = bytemuck::Zeroable::zeroed();
        for (gpu, record) in decals.iter_mut().zip(state.store().records()) {
            *gpu = record.to_gpu();
        }
        let visible = &state.visibility().z_bounds;
        let mut z_bounds: ZBoundsArray = [ZBounds::default(); N_MAX_STORED_DECALS];
        z_bounds[..visible.len()].copy_from_slice(visible);

        self.decals.write(slot, &decals)?;
        self.z_bounds.write(slot, &z_bounds)?;
        self.index_list.write(slot, &state.partition().to_gpu())?;
        self.camera.write(slot, &camera.uniform(self.cluster.grid_layout()))?;
        self.cursor.write(slot, &state.settings().cursor_uniform())?;
        self.light_uniform.write(slot, &state.light().uniform())
    }

    fn record<S: FrameStages<D>>(&mut self, slot: usize, stages: &S) -> LumeResult<()> {
        let counts = self.state.recorded_counts();
        debug!("Recording slot {} ({} decals, {} straddling)", slot, counts.active, counts.straddling);

        let frame = &mut self.slots[slot];
        let cmd = &mut frame.command_buffer;
        cmd.reset()?;
        cmd.begin(CommandBufferUsage::Reusable)?;

        self.decals.record_host_barrier(cmd, slot);
        self.z_bounds.record_host_barrier(cmd, slot);
        self.index_list.record_host_barrier(cmd, slot);
        self.camera.record_host_barrier(cmd, slot);
        self.cursor.record_host_barrier(cmd, slot);
        self.light_uniform.record_host_barrier(cmd, slot);

        stages.record_geometry(cmd, slot);
        self.cluster.record(cmd, &frame.bind_group, self.state.partition());
        stages.record_shading(cmd, slot);

        cmd.end()?;
        self.state.mark_recorded(slot);
        Ok(())
    }

    /// Submits the slot's recorded commands; its fence signals on completion.
    pub fn submit_slot(&self, slot: usize, wait: &[&D::Semaphore], signal: &[&D::Semaphore]) -> LumeResult<()> {
        let frame = &self.slots[slot];
        self.device.reset_fences(&[&frame.fence])?;
        self.device.submit(&[&frame.command_buffer], wait, signal, Some(&frame.fence))
    }

    pub fn command_buffer(&self, slot: usize) -> &D::CommandBuffer {
        &self.slots[slot].command_buffer
    }

    pub fn mark_all_dirty(&mut self) {
        self.state.mark_all_dirty();
    }

    /// Rebuilds size-dependent state. The device must be idle and the G-Buffer
    /// rebound through [`Self::set_gbuffer`] afterwards.
    pub fn resize(&mut self, width: u32, height: u32) -> LumeResult<()> {
        self.cluster.resize(width, height)?;
        for (slot, frame) in self.slots.iter_mut().enumerate() {
            frame.bind_group =
                Self::cluster_bind_group(&self.cluster, &self.camera, &self.decals, &self.index_list, &self.z_bounds, slot)?;
        }
        self.pick.clear_gbuffer();
        self.state.invalidate();
        Ok(())
    }

    pub fn shading_inputs(&self) -> ShadingInputs<'_, D> {
        ShadingInputs {
            grid: *self.cluster.grid_layout(),
            cluster_buffer: self.cluster.cluster_buffer(),
            decals: &self.decals,
            index_list: &self.index_list,
            camera: &self.camera,
            cursor: &self.cursor,
            light: &self.light_uniform,
        }
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn store(&self) -> &DecalStore {
        self.state.store()
    }

    pub fn settings(&self) -> &DecalSettings {
        self.state.settings()
    }

    pub fn partition(&self) -> &IndexPartition {
        self.state.partition()
    }

    pub fn visibility(&self) -> &Visibility {
        self.state.visibility()
    }

    pub fn pick_state(&self) -> PickState {
        self.state.pick_state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_stride_is_aligned() {
        assert_eq!(slot_stride::<LightUniform>(), 256);
        assert_eq!(slot_stride::<CameraUniform>(), 512);
        assert_eq!(slot_stride::<GpuIndexList>(), 512);
        assert_eq!(slot_stride::<DecalArray>(), 160 * 64);
        assert_eq!(slot_stride::<ZBoundsArray>(), 512);
    }
}
