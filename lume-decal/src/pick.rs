use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use log::{debug, info};
use lume_core::device::*;
use lume_core::{Device, LumeError, LumeResult};

use crate::shaders;
use crate::types::PickResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PickState {
    Idle,
    /// A click arrived; the next prepared frame resolves it.
    Resolving,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct PickConstants {
    inverse_view_projection: Mat4,
    size: [u32; 2],
    padding: [u32; 2],
}

/// Turns a click into a world-space hit by reading the G-Buffer on the GPU.
/// Whether a pick is pending is tracked by [`crate::state::FrameState`].
pub struct PickController<D: Device> {
    device: D,
    bind_group_layout: D::BindGroupLayout,
    pipeline: D::ComputePipeline,
    bind_group: Option<D::BindGroup>,
    result_buffer: D::Buffer,
    command_buffer: D::CommandBuffer,
    _command_pool: D::CommandPool,
    fence: D::Fence,
}

impl<D: Device> PickController<D> {
    pub fn new(device: &D) -> LumeResult<Self> {
        let shader = device.create_shader_module(&shaders::compile(shaders::PICK_COMPUTE)?)?;

        let bind_group_layout = device.create_bind_group_layout(BindGroupLayoutDescriptor {
            entries: vec![
                BindGroupLayoutEntry { binding: 0, visibility: ShaderStage::COMPUTE, ty: BindingType::SampledTexture },
                BindGroupLayoutEntry { binding: 1, visibility: ShaderStage::COMPUTE, ty: BindingType::SampledTexture },
                BindGroupLayoutEntry { binding: 2, visibility: ShaderStage::COMPUTE, ty: BindingType::StorageBuffer },
            ],
        })?;
        let layout = device.create_pipeline_layout(PipelineLayoutDescriptor {
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[PushConstantRange {
                stages: ShaderStage::COMPUTE,
                offset: 0,
                size: std::mem::size_of::<PickConstants>() as u32,
            }],
        })?;
        let pipeline = device.create_compute_pipeline(ComputePipelineDescriptor { shader: &shader, layout: &layout })?;

        let result_buffer = device.create_buffer(BufferDescriptor {
            size: std::mem::size_of::<PickResult>() as u64,
            usage: BufferUsage::STORAGE,
            location: MemoryLocation::GpuToCpu,
        })?;

        let command_pool = device.create_command_pool()?;
        let command_buffer = command_pool.allocate_command_buffer()?;
        let fence = device.create_fence(false)?;

        info!("Pick controller ready");

        Ok(Self {
            device: device.clone(),
            bind_group_layout,
            pipeline,
            bind_group: None,
            result_buffer,
            command_buffer,
            _command_pool: command_pool,
            fence,
        })
    }

    /// Binds the G-Buffer targets the pick reads. Both views must be in the
    /// shader-read-only layout whenever a pick executes.
    pub fn set_gbuffer(&mut self, depth: &D::TextureView, normal: &D::TextureView) -> LumeResult<()> {
        self.bind_group = Some(self.device.create_bind_group(BindGroupDescriptor {
            layout: &self.bind_group_layout,
            entries: vec![
                BindGroupEntry { binding: 0, resource: BindingResource::TextureView(depth) },
                BindGroupEntry { binding: 1, resource: BindingResource::TextureView(normal) },
                BindGroupEntry { binding: 2, resource: BindingResource::Buffer(&self.result_buffer) },
            ],
        })?);
        Ok(())
    }

    pub fn clear_gbuffer(&mut self) {
        self.bind_group = None;
    }

    /// Dispatches the pick, waits for it and reads the result back.
    pub fn resolve(&mut self, inverse_view_projection: Mat4, width: u32, height: u32) -> LumeResult<PickResult> {
        let bind_group = self
            .bind_group
            .as_ref()
            .ok_or(LumeError::Generic("Pick resolved before a G-Buffer was bound"))?;

        let constants = PickConstants { inverse_view_projection, size: [width, height], padding: [0; 2] };

        let cmd = &mut self.command_buffer;
        cmd.reset()?;
        cmd.begin(CommandBufferUsage::OneTimeSubmit)?;
        cmd.bind_compute_pipeline(&self.pipeline);
        cmd.bind_bind_group(0, bind_group);
        cmd.set_push_constants(ShaderStage::COMPUTE, 0, bytemuck::bytes_of(&constants));
        cmd.dispatch(1, 1, 1);
        cmd.buffer_barrier(
            &self.result_buffer,
            BufferBarrier::whole(PipelineStage::COMPUTE_SHADER, Access::SHADER_WRITE, PipelineStage::HOST, Access::HOST_READ),
        );
        cmd.end()?;

        self.device.reset_fences(&[&self.fence])?;
        self.device.submit(&[&self.command_buffer], &[], &[], Some(&self.fence))?;
        self.device.wait_for_fences(&[&self.fence], true, u64::MAX)?;

        let mut result = PickResult::default();
        self.result_buffer.read_data(0, bytemuck::bytes_of_mut(&mut result))?;

        debug!("Pick resolved at {:?}, normal {:?}", result.position.truncate(), result.normal.truncate());
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use glam::{Vec2, Vec3, Vec4};

    use super::*;
    use crate::camera::CameraState;

    /// Center pixel of a `width` x `height` target, as sampled by the pick shader.
    fn center_pixel(width: u32, height: u32) -> (u32, u32) {
        (width / 2, height / 2)
    }

    /// World position and normal under the center pixel, from a depth sample and a
    /// stored normal. Same math as `pick.comp.wgsl`.
    fn reconstruct(inverse_view_projection: Mat4, width: u32, height: u32, depth: f32, normal: Vec3) -> PickResult {
        let (px, py) = center_pixel(width, height);
        let uv = (Vec2::new(px as f32, py as f32) + 0.5) / Vec2::new(width as f32, height as f32);
        let ndc = uv * 2.0 - 1.0;
        let world = inverse_view_projection * Vec4::new(ndc.x, ndc.y, depth, 1.0);

        let normal = if normal.length_squared() > 0.0 { normal.normalize() } else { Vec3::Y };
        PickResult {
            position: (world.truncate() / world.w).extend(1.0),
            normal: normal.extend(0.0),
        }
    }

    #[test]
    fn test_push_constants_fit_minimum_limit() {
        assert_eq!(std::mem::size_of::<PickConstants>(), 80);
        assert!(std::mem::size_of::<PickConstants>() <= 128);
    }

    #[test]
    fn test_center_pixel() {
        assert_eq!(center_pixel(1280, 720), (640, 360));
        assert_eq!(center_pixel(1, 1), (0, 0));
    }

    #[test]
    fn test_reconstruct_hits_plane() {
        let camera = CameraState::new(Vec3::new(0.5, 1.0, 2.0), Vec3::new(0.1, -0.2, -1.0), Vec3::Y, 45f32.to_radians(), 0.1, 35.0, 1280, 720);
        let plane_z = -5.0;

        // Fixture: where the center pixel's ray meets the plane, and its stored depth.
        let (px, py) = center_pixel(1280, 720);
        let ndc = (Vec2::new(px as f32, py as f32) + 0.5) / Vec2::new(1280.0, 720.0) * 2.0 - 1.0;
        let near = camera.inverse_view_projection.project_point3(ndc.extend(0.0));
        let far = camera.inverse_view_projection.project_point3(ndc.extend(1.0));
        let t = (plane_z - near.z) / (far.z - near.z);
        let hit = near.lerp(far, t);
        let depth = camera.view_projection().project_point3(hit).z;
        assert!(depth > 0.0 && depth < 1.0);

        let result = reconstruct(camera.inverse_view_projection, 1280, 720, depth, Vec3::new(0.0, 0.0, 2.0));
        assert!(result.position.truncate().abs_diff_eq(hit, 1e-3));
        assert!((result.position.z - plane_z).abs() < 1e-3);
        assert!(result.normal.truncate().abs_diff_eq(Vec3::Z, 1e-6));
    }

    #[test]
    fn test_reconstruct_far_plane_and_missing_normal() {
        let camera = CameraState::new(Vec3::ZERO, -Vec3::Z, Vec3::Y, 45f32.to_radians(), 0.1, 35.0, 1280, 720);
        let result = reconstruct(camera.inverse_view_projection, 1280, 720, 1.0, Vec3::ZERO);
        assert!((camera.linear_depth(result.position.truncate()) - 35.0).abs() < 1e-2);
        assert_eq!(result.normal, Vec4::new(0.0, 1.0, 0.0, 0.0));
    }
}
