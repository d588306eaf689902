use log::info;
use lume_core::device::*;
use lume_core::{Device, LumeResult};
use lume_decal::frame::ShadingInputs;
use lume_decal::shaders;

use crate::gbuffer::GBufferPass;

const SHADING_VERTEX: &str = include_str!("../shaders/shading.vert.wgsl");
const SHADING_FRAGMENT: &str = include_str!("../shaders/shading.frag.wgsl");

fn shading_layout_entries() -> Vec<BindGroupLayoutEntry> {
    let fragment = |binding, ty| BindGroupLayoutEntry { binding, visibility: ShaderStage::FRAGMENT, ty };
    vec![
        fragment(0, BindingType::UniformBuffer),
        fragment(1, BindingType::StorageBuffer),
        fragment(2, BindingType::StorageBuffer),
        fragment(3, BindingType::StorageBuffer),
        fragment(4, BindingType::UniformBuffer),
        fragment(5, BindingType::UniformBuffer),
        fragment(6, BindingType::SampledTexture),
        fragment(7, BindingType::SampledTexture),
        fragment(8, BindingType::SampledTexture),
    ]
}

/// Full-screen deferred pass into the swapchain image: walks the pixel's
/// cluster cell, blends every decal that covers it, then lights the result.
pub struct ShadingPass<D: Device> {
    device: D,
    framebuffers: Vec<D::Framebuffer>,
    bind_groups: Vec<D::BindGroup>,
    pipeline: D::GraphicsPipeline,
    _pipeline_layout: D::PipelineLayout,
    bind_group_layout: D::BindGroupLayout,
    render_pass: D::RenderPass,
    extent: (u32, u32),
}

impl<D: Device> ShadingPass<D> {
    pub fn new(
        device: &D,
        swapchain: &D::Swapchain,
        inputs: &ShadingInputs<'_, D>,
        gbuffer: &GBufferPass<D>,
    ) -> LumeResult<Self> {
        let vertex_shader = device.create_shader_module(&shaders::compile(&shaders::with_common(SHADING_VERTEX))?)?;
        let fragment_shader = device.create_shader_module(&shaders::compile(&shaders::with_common(SHADING_FRAGMENT))?)?;

        let bind_group_layout = device.create_bind_group_layout(BindGroupLayoutDescriptor { entries: shading_layout_entries() })?;
        let pipeline_layout = device.create_pipeline_layout(PipelineLayoutDescriptor {
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        })?;

        let render_pass = device.create_render_pass(RenderPassDescriptor::single(swapchain.format(), ImageLayout::Present, None))?;
        let pipeline = device.create_graphics_pipeline(GraphicsPipelineDescriptor {
            vertex_shader: &vertex_shader,
            fragment_shader: &fragment_shader,
            render_pass: &render_pass,
            subpass: 0,
            layout: &pipeline_layout,
            primitive: PrimitiveState {
                topology: PrimitiveTopology::TriangleList,
                cull_mode: CullMode::None,
                front_face: FrontFace::CounterClockwise,
            },
            vertex_layout: None,
            depth_stencil: None,
            color_target_count: 1,
        })?;

        let mut pass = Self {
            device: device.clone(),
            framebuffers: Vec::new(),
            bind_groups: Vec::new(),
            pipeline,
            _pipeline_layout: pipeline_layout,
            bind_group_layout,
            render_pass,
            extent: swapchain.extent(),
        };
        pass.rebuild(swapchain, inputs, gbuffer)?;
        info!("Shading pass ready");
        Ok(pass)
    }

    /// Recreates everything that points at the swapchain, the G-Buffer or the
    /// cluster buffer.
    pub fn rebuild(&mut self, swapchain: &D::Swapchain, inputs: &ShadingInputs<'_, D>, gbuffer: &GBufferPass<D>) -> LumeResult<()> {
        let (width, height) = swapchain.extent();
        self.framebuffers = (0..swapchain.image_count())
            .map(|image| {
                self.device.create_framebuffer(FramebufferDescriptor {
                    render_pass: &self.render_pass,
                    attachments: &[swapchain.get_view(image)],
                    width,
                    height,
                })
            })
            .collect::<LumeResult<Vec<_>>>()?;

        self.bind_groups = (0..inputs.camera.slots())
            .map(|slot| {
                self.device.create_bind_group(BindGroupDescriptor {
                    layout: &self.bind_group_layout,
                    entries: vec![
                        BindGroupEntry { binding: 0, resource: inputs.camera.binding(slot) },
                        BindGroupEntry { binding: 1, resource: inputs.decals.binding(slot) },
                        BindGroupEntry { binding: 2, resource: inputs.index_list.binding(slot) },
                        BindGroupEntry { binding: 3, resource: BindingResource::Buffer(inputs.cluster_buffer) },
                        BindGroupEntry { binding: 4, resource: inputs.cursor.binding(slot) },
                        BindGroupEntry { binding: 5, resource: inputs.light.binding(slot) },
                        BindGroupEntry { binding: 6, resource: BindingResource::TextureView(gbuffer.depth_view()) },
                        BindGroupEntry { binding: 7, resource: BindingResource::TextureView(gbuffer.normal_view()) },
                        BindGroupEntry { binding: 8, resource: BindingResource::TextureView(gbuffer.albedo_view()) },
                    ],
                })
            })
            .collect::<LumeResult<Vec<_>>>()?;

        self.extent = (width, height);
        Ok(())
    }

    pub fn record(&self, cmd: &mut D::CommandBuffer, slot: usize) {
        let (width, height) = self.extent;
        cmd.begin_render_pass(&self.render_pass, &self.framebuffers[slot], &[ClearValue::Color([0.0, 0.0, 0.0, 1.0])]);
        cmd.set_viewport(0.0, 0.0, width as f32, height as f32);
        cmd.set_scissor(0, 0, width, height);
        cmd.bind_graphics_pipeline(&self.pipeline);
        cmd.bind_bind_group(0, &self.bind_groups[slot]);
        cmd.draw(3, 1, 0, 0);
        cmd.end_render_pass();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shaders_compile() {
        assert!(shaders::compile(&shaders::with_common(SHADING_VERTEX)).is_ok());
        assert!(shaders::compile(&shaders::with_common(SHADING_FRAGMENT)).is_ok());
    }

    #[test]
    fn test_layout_bindings_are_dense() {
        let entries = shading_layout_entries();
        for (expected, entry) in entries.iter().enumerate() {
            assert_eq!(entry.binding, expected as u32);
        }
        assert_eq!(entries.iter().filter(|e| e.ty == BindingType::SampledTexture).count(), 3);
    }
}
