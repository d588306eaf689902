use ash::vk;
use lume_core::{LumeError, LumeResult, device::*};
use crate::convert::{
    map_access, map_compare, map_cull_mode, map_front_face, map_layout, map_load_op, map_pipeline_stage, map_shader_stage,
    map_store_op, map_subpass, map_texture_format,
};
use crate::VulkanDevice;

use std::sync::Arc;
use crate::{VulkanShaderModuleInner, VulkanRenderPassInner, VulkanPipelineLayoutInner, VulkanGraphicsPipelineInner, VulkanComputePipelineInner};

impl VulkanDevice {
    pub fn create_shader_module_impl(&self, code: &[u32]) -> LumeResult<crate::VulkanShaderModule> {
        let create_info = vk::ShaderModuleCreateInfo {
            code_size: code.len() * 4,
            p_code: code.as_ptr(),
            ..Default::default()
        };

        let module = unsafe {
            self.inner
                .device
                .create_shader_module(&create_info, None)
                .map_err(|e| LumeError::ResourceCreationFailed(format!("Failed to create shader module: {}", e)))?
        };

        Ok(crate::VulkanShaderModule(Arc::new(VulkanShaderModuleInner {
            module,
            device: self.clone(),
        })))
    }

    pub fn create_render_pass_impl(&self, descriptor: RenderPassDescriptor) -> LumeResult<crate::VulkanRenderPass> {
        if descriptor.subpasses.is_empty() {
            return Err(LumeError::Generic("Render pass needs at least one subpass"));
        }

        let attachments: Vec<vk::AttachmentDescription> = descriptor
            .attachments
            .iter()
            .map(|a| vk::AttachmentDescription {
                format: map_texture_format(a.format),
                samples: vk::SampleCountFlags::TYPE_1,
                load_op: map_load_op(a.load_op),
                store_op: map_store_op(a.store_op),
                stencil_load_op: vk::AttachmentLoadOp::DONT_CARE,
                stencil_store_op: vk::AttachmentStoreOp::DONT_CARE,
                initial_layout: map_layout(a.initial_layout),
                final_layout: map_layout(a.final_layout),
                ..Default::default()
            })
            .collect();

        for subpass in &descriptor.subpasses {
            let out_of_range = subpass
                .color_attachments
                .iter()
                .chain(subpass.depth_attachment.iter())
                .any(|&i| i as usize >= attachments.len());
            if out_of_range {
                return Err(LumeError::Generic("Subpass references a missing attachment"));
            }
        }

        // References must outlive the subpass descriptions pointing into them.
        let color_refs: Vec<Vec<vk::AttachmentReference>> = descriptor
            .subpasses
            .iter()
            .map(|s| {
                s.color_attachments
                    .iter()
                    .map(|&attachment| vk::AttachmentReference {
                        attachment,
                        layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
                    })
                    .collect()
            })
            .collect();
        let depth_refs: Vec<Option<vk::AttachmentReference>> = descriptor
            .subpasses
            .iter()
            .map(|s| {
                s.depth_attachment.map(|attachment| vk::AttachmentReference {
                    attachment,
                    layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
                })
            })
            .collect();

        let subpasses: Vec<vk::SubpassDescription> = color_refs
            .iter()
            .zip(depth_refs.iter())
            .map(|(colors, depth)| vk::SubpassDescription {
                pipeline_bind_point: vk::PipelineBindPoint::GRAPHICS,
                color_attachment_count: colors.len() as u32,
                p_color_attachments: colors.as_ptr(),
                p_depth_stencil_attachment: depth.as_ref().map_or(std::ptr::null(), |d| d as *const _),
                ..Default::default()
            })
            .collect();

        let dependencies: Vec<vk::SubpassDependency> = descriptor
            .dependencies
            .iter()
            .map(|d| vk::SubpassDependency {
                src_subpass: map_subpass(d.src_subpass),
                dst_subpass: map_subpass(d.dst_subpass),
                src_stage_mask: map_pipeline_stage(d.src_stage),
                dst_stage_mask: map_pipeline_stage(d.dst_stage),
                src_access_mask: map_access(d.src_access),
                dst_access_mask: map_access(d.dst_access),
                dependency_flags: if d.by_region { vk::DependencyFlags::BY_REGION } else { vk::DependencyFlags::empty() },
            })
            .collect();

        let create_info = vk::RenderPassCreateInfo {
            attachment_count: attachments.len() as u32,
            p_attachments: attachments.as_ptr(),
            subpass_count: subpasses.len() as u32,
            p_subpasses: subpasses.as_ptr(),
            dependency_count: dependencies.len() as u32,
            p_dependencies: dependencies.as_ptr(),
            ..Default::default()
        };

        let render_pass = unsafe {
            self.inner
                .device
                .create_render_pass(&create_info, None)
                .map_err(|e| LumeError::ResourceCreationFailed(format!("Failed to create render pass: {}", e)))?
        };

        Ok(crate::VulkanRenderPass(Arc::new(VulkanRenderPassInner {
            render_pass,
            subpass_count: subpasses.len() as u32,
            device: self.clone(),
        })))
    }

    pub fn create_pipeline_layout_impl(&self, descriptor: PipelineLayoutDescriptor<Self>) -> LumeResult<crate::VulkanPipelineLayout> {
        let set_layouts: Vec<vk::DescriptorSetLayout> = descriptor.bind_group_layouts.iter().map(|l| l.layout).collect();
        let push_constant_ranges: Vec<vk::PushConstantRange> = descriptor
            .push_constant_ranges
            .iter()
            .map(|r| vk::PushConstantRange {
                stage_flags: map_shader_stage(r.stages),
                offset: r.offset,
                size: r.size,
            })
            .collect();

        let create_info = vk::PipelineLayoutCreateInfo {
            set_layout_count: set_layouts.len() as u32,
            p_set_layouts: set_layouts.as_ptr(),
            push_constant_range_count: push_constant_ranges.len() as u32,
            p_push_constant_ranges: push_constant_ranges.as_ptr(),
            ..Default::default()
        };

        let layout = unsafe {
            self.inner
                .device
                .create_pipeline_layout(&create_info, None)
                .map_err(|e| LumeError::ResourceCreationFailed(format!("Failed to create pipeline layout: {}", e)))?
        };

        Ok(crate::VulkanPipelineLayout(Arc::new(VulkanPipelineLayoutInner {
            layout,
            device: self.clone(),
        })))
    }

    pub fn create_graphics_pipeline_impl(&self, descriptor: GraphicsPipelineDescriptor<Self>) -> LumeResult<crate::VulkanGraphicsPipeline> {
        if descriptor.subpass >= descriptor.render_pass.0.subpass_count {
            return Err(LumeError::Generic("Pipeline subpass index is outside its render pass"));
        }

        let entry_name = c"main";

        let shader_stages = [
            vk::PipelineShaderStageCreateInfo {
                stage: vk::ShaderStageFlags::VERTEX,
                module: descriptor.vertex_shader.0.module,
                p_name: entry_name.as_ptr(),
                ..Default::default()
            },
            vk::PipelineShaderStageCreateInfo {
                stage: vk::ShaderStageFlags::FRAGMENT,
                module: descriptor.fragment_shader.0.module,
                p_name: entry_name.as_ptr(),
                ..Default::default()
            },
        ];

        let mut vertex_binding_descriptions = Vec::new();
        let mut vertex_attribute_descriptions = Vec::new();

        if let Some(layout) = &descriptor.vertex_layout {
            vertex_binding_descriptions.push(vk::VertexInputBindingDescription {
                binding: 0,
                stride: layout.array_stride,
                input_rate: vk::VertexInputRate::VERTEX,
            });

            for attr in &layout.attributes {
                vertex_attribute_descriptions.push(vk::VertexInputAttributeDescription {
                    location: attr.location,
                    binding: 0,
                    format: match attr.format {
                        VertexFormat::Float32x2 => vk::Format::R32G32_SFLOAT,
                        VertexFormat::Float32x3 => vk::Format::R32G32B32_SFLOAT,
                        VertexFormat::Float32x4 => vk::Format::R32G32B32A32_SFLOAT,
                    },
                    offset: attr.offset,
                });
            }
        }

        let vertex_input_info = vk::PipelineVertexInputStateCreateInfo {
            vertex_binding_description_count: vertex_binding_descriptions.len() as u32,
            p_vertex_binding_descriptions: vertex_binding_descriptions.as_ptr(),
            vertex_attribute_description_count: vertex_attribute_descriptions.len() as u32,
            p_vertex_attribute_descriptions: vertex_attribute_descriptions.as_ptr(),
            ..Default::default()
        };

        let input_assembly = vk::PipelineInputAssemblyStateCreateInfo {
            topology: match descriptor.primitive.topology {
                PrimitiveTopology::TriangleList => vk::PrimitiveTopology::TRIANGLE_LIST,
            },
            ..Default::default()
        };

        let rasterizer = vk::PipelineRasterizationStateCreateInfo {
            polygon_mode: vk::PolygonMode::FILL,
            line_width: 1.0,
            cull_mode: map_cull_mode(descriptor.primitive.cull_mode),
            front_face: map_front_face(descriptor.primitive.front_face),
            ..Default::default()
        };

        let multisampling = vk::PipelineMultisampleStateCreateInfo {
            rasterization_samples: vk::SampleCountFlags::TYPE_1,
            ..Default::default()
        };

        let color_blend_attachments = vec![
            vk::PipelineColorBlendAttachmentState {
                color_write_mask: vk::ColorComponentFlags::R
                    | vk::ColorComponentFlags::G
                    | vk::ColorComponentFlags::B
                    | vk::ColorComponentFlags::A,
                blend_enable: vk::FALSE,
                ..Default::default()
            };
            descriptor.color_target_count as usize
        ];

        let color_blending = vk::PipelineColorBlendStateCreateInfo {
            attachment_count: color_blend_attachments.len() as u32,
            p_attachments: color_blend_attachments.as_ptr(),
            ..Default::default()
        };

        let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
        let dynamic_state_info = vk::PipelineDynamicStateCreateInfo {
            dynamic_state_count: dynamic_states.len() as u32,
            p_dynamic_states: dynamic_states.as_ptr(),
            ..Default::default()
        };

        let viewport_state = vk::PipelineViewportStateCreateInfo {
            viewport_count: 1,
            scissor_count: 1,
            ..Default::default()
        };

        let depth_stencil_info = if let Some(ds) = &descriptor.depth_stencil {
            vk::PipelineDepthStencilStateCreateInfo {
                depth_test_enable: vk::TRUE,
                depth_write_enable: if ds.depth_write_enabled { vk::TRUE } else { vk::FALSE },
                depth_compare_op: map_compare(ds.depth_compare),
                ..Default::default()
            }
        } else {
            vk::PipelineDepthStencilStateCreateInfo::default()
        };

        let create_info = vk::GraphicsPipelineCreateInfo {
            stage_count: shader_stages.len() as u32,
            p_stages: shader_stages.as_ptr(),
            p_vertex_input_state: &vertex_input_info,
            p_input_assembly_state: &input_assembly,
            p_viewport_state: &viewport_state,
            p_rasterization_state: &rasterizer,
            p_multisample_state: &multisampling,
            p_color_blend_state: &color_blending,
            p_depth_stencil_state: &depth_stencil_info,
            p_dynamic_state: &dynamic_state_info,
            layout: descriptor.layout.0.layout,
            render_pass: descriptor.render_pass.0.render_pass,
            subpass: descriptor.subpass,
            ..Default::default()
        };

        let pipelines = unsafe {
            self.inner
                .device
                .create_graphics_pipelines(vk::PipelineCache::null(), &[create_info], None)
                .map_err(|(_, e)| LumeError::PipelineCreationFailed(format!("Failed to create graphics pipeline: {:?}", e)))?
        };

        Ok(crate::VulkanGraphicsPipeline(Arc::new(VulkanGraphicsPipelineInner {
            pipeline: pipelines[0],
            layout: descriptor.layout.clone(),
            device: self.clone(),
        })))
    }

    pub fn create_compute_pipeline_impl(&self, descriptor: ComputePipelineDescriptor<Self>) -> LumeResult<crate::VulkanComputePipeline> {
        let stage_info = vk::PipelineShaderStageCreateInfo {
            stage: vk::ShaderStageFlags::COMPUTE,
            module: descriptor.shader.0.module,
            p_name: c"main".as_ptr(),
            ..Default::default()
        };

        let create_info = vk::ComputePipelineCreateInfo {
            stage: stage_info,
            layout: descriptor.layout.0.layout,
            ..Default::default()
        };

        let pipelines = unsafe {
            self.inner
                .device
                .create_compute_pipelines(vk::PipelineCache::null(), &[create_info], None)
                .map_err(|(_, e)| LumeError::PipelineCreationFailed(format!("Failed to create compute pipeline: {:?}", e)))?
        };

        Ok(crate::VulkanComputePipeline(Arc::new(VulkanComputePipelineInner {
            pipeline: pipelines[0],
            layout: descriptor.layout.clone(),
            device: self.clone(),
        })))
    }

    pub fn create_framebuffer_impl(&self, descriptor: FramebufferDescriptor<Self>) -> LumeResult<crate::VulkanFramebuffer> {
        let vk_attachments: Vec<vk::ImageView> = descriptor.attachments.iter().map(|&a| a.view).collect();

        let create_info = vk::FramebufferCreateInfo {
            render_pass: descriptor.render_pass.0.render_pass,
            attachment_count: vk_attachments.len() as u32,
            p_attachments: vk_attachments.as_ptr(),
            width: descriptor.width,
            height: descriptor.height,
            layers: 1,
            ..Default::default()
        };

        let framebuffer = unsafe {
            self.inner
                .device
                .create_framebuffer(&create_info, None)
                .map_err(|e| LumeError::ResourceCreationFailed(format!("Failed to create framebuffer: {}", e)))?
        };

        Ok(crate::VulkanFramebuffer {
            framebuffer,
            width: descriptor.width,
            height: descriptor.height,
            device: self.clone(),
        })
    }
}
