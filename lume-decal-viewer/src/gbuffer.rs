use log::info;
use lume_core::device::*;
use lume_core::{Device, LumeResult};
use lume_decal::frame::FrameBuffered;
use lume_decal::shaders;
use lume_decal::types::CameraUniform;

use crate::scene::{SceneMesh, Vertex};

pub const NORMAL_FORMAT: TextureFormat = TextureFormat::Rgba16Float;
pub const ALBEDO_FORMAT: TextureFormat = TextureFormat::Rgba8Unorm;
pub const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;

const GBUFFER_VERTEX: &str = include_str!("../shaders/gbuffer.vert.wgsl");
const GBUFFER_FRAGMENT: &str = include_str!("../shaders/gbuffer.frag.wgsl");

/// Normal, albedo and depth, cleared and written once per frame and left in
/// the shader-read-only layout for the pick and the shading pass.
///
/// The targets are shared by every frame slot; the external dependencies
/// order them against the previous frame's reads on the same queue.
pub fn gbuffer_render_pass_descriptor() -> RenderPassDescriptor {
    let target = |format| AttachmentDescriptor {
        format,
        load_op: AttachmentLoadOp::Clear,
        store_op: AttachmentStoreOp::Store,
        initial_layout: ImageLayout::Undefined,
        final_layout: ImageLayout::ShaderReadOnly,
    };
    let attachment_stages =
        PipelineStage::COLOR_ATTACHMENT_OUTPUT | PipelineStage::EARLY_FRAGMENT_TESTS | PipelineStage::LATE_FRAGMENT_TESTS;
    let attachment_writes = Access::COLOR_ATTACHMENT_WRITE | Access::DEPTH_STENCIL_ATTACHMENT_WRITE;
    let readers = PipelineStage::FRAGMENT_SHADER | PipelineStage::COMPUTE_SHADER;

    RenderPassDescriptor {
        attachments: vec![target(NORMAL_FORMAT), target(ALBEDO_FORMAT), target(DEPTH_FORMAT)],
        subpasses: vec![SubpassDescriptor { color_attachments: vec![0, 1], depth_attachment: Some(2) }],
        dependencies: vec![
            SubpassDependency {
                src_subpass: SubpassIndex::External,
                dst_subpass: SubpassIndex::Index(0),
                src_stage: readers,
                dst_stage: attachment_stages,
                src_access: Access::SHADER_READ,
                dst_access: attachment_writes,
                by_region: false,
            },
            SubpassDependency {
                src_subpass: SubpassIndex::Index(0),
                dst_subpass: SubpassIndex::External,
                src_stage: attachment_stages,
                dst_stage: readers,
                src_access: attachment_writes,
                dst_access: Access::SHADER_READ,
                by_region: false,
            },
        ],
    }
}

struct GBufferTargets<D: Device> {
    // Framebuffer before the views it points at.
    framebuffer: D::Framebuffer,
    normal_view: D::TextureView,
    albedo_view: D::TextureView,
    depth_view: D::TextureView,
    _normal: D::Texture,
    _albedo: D::Texture,
    _depth: D::Texture,
    width: u32,
    height: u32,
}

impl<D: Device> GBufferTargets<D> {
    fn new(device: &D, render_pass: &D::RenderPass, width: u32, height: u32) -> LumeResult<Self> {
        let texture = |format, usage| {
            device.create_texture(TextureDescriptor { width, height, depth: 1, format, usage })
        };
        let color_usage = TextureUsage::RENDER_ATTACHMENT | TextureUsage::TEXTURE_BINDING;
        let normal = texture(NORMAL_FORMAT, color_usage)?;
        let albedo = texture(ALBEDO_FORMAT, color_usage)?;
        let depth = texture(DEPTH_FORMAT, TextureUsage::DEPTH_STENCIL_ATTACHMENT | TextureUsage::TEXTURE_BINDING)?;

        let normal_view = device.create_texture_view(&normal, TextureViewDescriptor { format: None })?;
        let albedo_view = device.create_texture_view(&albedo, TextureViewDescriptor { format: None })?;
        let depth_view = device.create_texture_view(&depth, TextureViewDescriptor { format: None })?;

        let framebuffer = device.create_framebuffer(FramebufferDescriptor {
            render_pass,
            attachments: &[&normal_view, &albedo_view, &depth_view],
            width,
            height,
        })?;

        Ok(Self {
            framebuffer,
            normal_view,
            albedo_view,
            depth_view,
            _normal: normal,
            _albedo: albedo,
            _depth: depth,
            width,
            height,
        })
    }
}

/// Rasterizes the scene into the G-Buffer.
pub struct GBufferPass<D: Device> {
    device: D,
    targets: GBufferTargets<D>,
    bind_groups: Vec<D::BindGroup>,
    pipeline: D::GraphicsPipeline,
    _pipeline_layout: D::PipelineLayout,
    _bind_group_layout: D::BindGroupLayout,
    render_pass: D::RenderPass,
}

impl<D: Device> GBufferPass<D> {
    pub fn new(device: &D, camera: &FrameBuffered<D, CameraUniform>, width: u32, height: u32) -> LumeResult<Self> {
        let vertex_shader = device.create_shader_module(&shaders::compile(&shaders::with_common(GBUFFER_VERTEX))?)?;
        let fragment_shader = device.create_shader_module(&shaders::compile(&shaders::with_common(GBUFFER_FRAGMENT))?)?;

        let bind_group_layout = device.create_bind_group_layout(BindGroupLayoutDescriptor {
            entries: vec![BindGroupLayoutEntry { binding: 0, visibility: ShaderStage::VERTEX, ty: BindingType::UniformBuffer }],
        })?;
        let pipeline_layout = device.create_pipeline_layout(PipelineLayoutDescriptor {
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        })?;

        let render_pass = device.create_render_pass(gbuffer_render_pass_descriptor())?;
        let pipeline = device.create_graphics_pipeline(GraphicsPipelineDescriptor {
            vertex_shader: &vertex_shader,
            fragment_shader: &fragment_shader,
            render_pass: &render_pass,
            subpass: 0,
            layout: &pipeline_layout,
            primitive: PrimitiveState {
                topology: PrimitiveTopology::TriangleList,
                // OBJ scenes come with either winding.
                cull_mode: CullMode::None,
                front_face: FrontFace::CounterClockwise,
            },
            vertex_layout: Some(Vertex::layout()),
            depth_stencil: Some(DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: CompareFunction::Less,
            }),
            color_target_count: 2,
        })?;

        let bind_groups = (0..camera.slots())
            .map(|slot| {
                device.create_bind_group(BindGroupDescriptor {
                    layout: &bind_group_layout,
                    entries: vec![BindGroupEntry { binding: 0, resource: camera.binding(slot) }],
                })
            })
            .collect::<LumeResult<Vec<_>>>()?;

        let targets = GBufferTargets::new(device, &render_pass, width, height)?;
        info!("G-Buffer ready at {}x{}", width, height);

        Ok(Self {
            device: device.clone(),
            targets,
            bind_groups,
            pipeline,
            _pipeline_layout: pipeline_layout,
            _bind_group_layout: bind_group_layout,
            render_pass,
        })
    }

    /// Recreates the targets. Anything bound to the old views has to be rebuilt.
    pub fn resize(&mut self, width: u32, height: u32) -> LumeResult<()> {
        self.targets = GBufferTargets::new(&self.device, &self.render_pass, width, height)?;
        info!("G-Buffer resized to {}x{}", width, height);
        Ok(())
    }

    pub fn normal_view(&self) -> &D::TextureView {
        &self.targets.normal_view
    }

    pub fn albedo_view(&self) -> &D::TextureView {
        &self.targets.albedo_view
    }

    pub fn depth_view(&self) -> &D::TextureView {
        &self.targets.depth_view
    }

    pub fn record(&self, cmd: &mut D::CommandBuffer, slot: usize, mesh: &SceneMesh<D>) {
        let (width, height) = (self.targets.width, self.targets.height);
        cmd.begin_render_pass(
            &self.render_pass,
            &self.targets.framebuffer,
            &[
                ClearValue::Color([0.0; 4]),
                ClearValue::Color([0.0; 4]),
                ClearValue::DepthStencil(1.0, 0),
            ],
        );
        cmd.set_viewport(0.0, 0.0, width as f32, height as f32);
        cmd.set_scissor(0, 0, width, height);
        cmd.bind_graphics_pipeline(&self.pipeline);
        cmd.bind_bind_group(0, &self.bind_groups[slot]);
        cmd.bind_vertex_buffer(&mesh.vertex_buffer);
        cmd.bind_index_buffer(&mesh.index_buffer, IndexFormat::Uint32);
        cmd.draw_indexed(mesh.index_count, 1, 0, 0, 0);
        cmd.end_render_pass();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_targets_end_readable() {
        let descriptor = gbuffer_render_pass_descriptor();
        assert_eq!(descriptor.attachments.len(), 3);
        assert!(descriptor.attachments.iter().all(|a| a.final_layout == ImageLayout::ShaderReadOnly));
        assert!(descriptor.attachments.iter().all(|a| a.store_op == AttachmentStoreOp::Store));
        assert!(descriptor.attachments[2].format.is_depth());
        assert_eq!(descriptor.subpasses[0].depth_attachment, Some(2));
    }

    #[test]
    fn test_dependencies_cover_both_directions() {
        let descriptor = gbuffer_render_pass_descriptor();
        let incoming = &descriptor.dependencies[0];
        let outgoing = &descriptor.dependencies[1];
        assert_eq!(incoming.src_subpass, SubpassIndex::External);
        assert!(incoming.src_stage.contains(PipelineStage::COMPUTE_SHADER));
        assert_eq!(outgoing.dst_subpass, SubpassIndex::External);
        assert!(outgoing.dst_stage.contains(PipelineStage::FRAGMENT_SHADER | PipelineStage::COMPUTE_SHADER));
        assert!(outgoing.dst_access.contains(Access::SHADER_READ));
    }

    #[test]
    fn test_shaders_compile() {
        assert!(shaders::compile(&shaders::with_common(GBUFFER_VERTEX)).is_ok());
        assert!(shaders::compile(&shaders::with_common(GBUFFER_FRAGMENT)).is_ok());
    }
}
