use ash::vk;
use lume_core::device::{BufferBarrier, ClearValue, CommandBufferUsage, IndexFormat, ShaderStage};
use lume_core::{LumeError, LumeResult};
use crate::convert::{map_access, map_pipeline_stage, map_shader_stage};
use crate::VulkanDevice;

pub struct VulkanCommandPool {
    pub pool: vk::CommandPool,
    pub device: VulkanDevice,
}

impl Drop for VulkanCommandPool {
    fn drop(&mut self) {
        unsafe {
            self.device.raw().destroy_command_pool(self.pool, None);
        }
    }
}

impl lume_core::device::CommandPool for VulkanCommandPool {
    type Device = VulkanDevice;
    type CommandBuffer = VulkanCommandBuffer;

    fn allocate_command_buffer(&self) -> LumeResult<Self::CommandBuffer> {
        let allocate_info = vk::CommandBufferAllocateInfo {
            command_pool: self.pool,
            level: vk::CommandBufferLevel::PRIMARY,
            command_buffer_count: 1,
            ..Default::default()
        };

        let command_buffers = unsafe {
            self.device
                .raw()
                .allocate_command_buffers(&allocate_info)
                .map_err(|e| LumeError::ResourceCreationFailed(format!("Failed to allocate command buffer: {}", e)))?
        };

        Ok(VulkanCommandBuffer {
            buffer: command_buffers[0],
            pool: self.pool,
            device: self.device.clone(),
            current_pipeline_layout: vk::PipelineLayout::null(),
            current_bind_point: vk::PipelineBindPoint::GRAPHICS,
        })
    }
}

pub struct VulkanCommandBuffer {
    pub buffer: vk::CommandBuffer,
    pub pool: vk::CommandPool,
    pub device: VulkanDevice,
    pub current_pipeline_layout: vk::PipelineLayout,
    pub current_bind_point: vk::PipelineBindPoint,
}

impl Drop for VulkanCommandBuffer {
    fn drop(&mut self) {
        unsafe {
            self.device.raw().free_command_buffers(self.pool, &[self.buffer]);
        }
    }
}

impl lume_core::device::CommandBuffer for VulkanCommandBuffer {
    type Device = VulkanDevice;

    fn reset(&mut self) -> LumeResult<()> {
        unsafe {
            self.device
                .raw()
                .reset_command_buffer(self.buffer, vk::CommandBufferResetFlags::empty())
                .map_err(|e| LumeError::BackendError(format!("Failed to reset command buffer: {}", e)))
        }
    }

    fn begin(&mut self, usage: CommandBufferUsage) -> LumeResult<()> {
        let flags = match usage {
            CommandBufferUsage::OneTimeSubmit => vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT,
            CommandBufferUsage::Reusable => vk::CommandBufferUsageFlags::empty(),
        };
        let begin_info = vk::CommandBufferBeginInfo { flags, ..Default::default() };

        unsafe {
            self.device
                .raw()
                .begin_command_buffer(self.buffer, &begin_info)
                .map_err(|e| LumeError::BackendError(format!("Failed to begin command buffer: {}", e)))
        }
    }

    fn end(&mut self) -> LumeResult<()> {
        unsafe {
            self.device
                .raw()
                .end_command_buffer(self.buffer)
                .map_err(|e| LumeError::BackendError(format!("Failed to end command buffer: {}", e)))
        }
    }

    fn begin_render_pass(&mut self, render_pass: &crate::VulkanRenderPass, framebuffer: &crate::VulkanFramebuffer, clear_values: &[ClearValue]) {
        let vk_clear_values: Vec<vk::ClearValue> = clear_values
            .iter()
            .map(|value| match *value {
                ClearValue::Color(c) => vk::ClearValue { color: vk::ClearColorValue { float32: c } },
                ClearValue::DepthStencil(depth, stencil) => vk::ClearValue {
                    depth_stencil: vk::ClearDepthStencilValue { depth, stencil },
                },
            })
            .collect();

        let render_pass_begin_info = vk::RenderPassBeginInfo {
            render_pass: render_pass.0.render_pass,
            framebuffer: framebuffer.framebuffer,
            render_area: vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent: vk::Extent2D {
                    width: framebuffer.width,
                    height: framebuffer.height,
                },
            },
            clear_value_count: vk_clear_values.len() as u32,
            p_clear_values: vk_clear_values.as_ptr(),
            ..Default::default()
        };

        unsafe {
            self.device.raw().cmd_begin_render_pass(self.buffer, &render_pass_begin_info, vk::SubpassContents::INLINE);
        }
    }

    fn next_subpass(&mut self) {
        unsafe {
            self.device.raw().cmd_next_subpass(self.buffer, vk::SubpassContents::INLINE);
        }
    }

    fn end_render_pass(&mut self) {
        unsafe {
            self.device.raw().cmd_end_render_pass(self.buffer);
        }
    }

    fn bind_graphics_pipeline(&mut self, pipeline: &crate::VulkanGraphicsPipeline) {
        unsafe {
            self.device.raw().cmd_bind_pipeline(self.buffer, vk::PipelineBindPoint::GRAPHICS, pipeline.0.pipeline);
        }
        self.current_pipeline_layout = pipeline.0.layout.0.layout;
        self.current_bind_point = vk::PipelineBindPoint::GRAPHICS;
    }

    fn bind_compute_pipeline(&mut self, pipeline: &crate::VulkanComputePipeline) {
        unsafe {
            self.device.raw().cmd_bind_pipeline(self.buffer, vk::PipelineBindPoint::COMPUTE, pipeline.0.pipeline);
        }
        self.current_pipeline_layout = pipeline.0.layout.0.layout;
        self.current_bind_point = vk::PipelineBindPoint::COMPUTE;
    }

    fn bind_vertex_buffer(&mut self, buffer: &crate::VulkanBuffer) {
        unsafe {
            self.device.raw().cmd_bind_vertex_buffers(self.buffer, 0, &[buffer.buffer], &[0]);
        }
    }

    fn bind_index_buffer(&mut self, buffer: &crate::VulkanBuffer, format: IndexFormat) {
        let index_type = match format {
            IndexFormat::Uint16 => vk::IndexType::UINT16,
            IndexFormat::Uint32 => vk::IndexType::UINT32,
        };
        unsafe {
            self.device.raw().cmd_bind_index_buffer(self.buffer, buffer.buffer, 0, index_type);
        }
    }

    fn bind_bind_group(&mut self, index: u32, bind_group: &crate::VulkanBindGroup) {
        unsafe {
            self.device.raw().cmd_bind_descriptor_sets(
                self.buffer,
                self.current_bind_point,
                self.current_pipeline_layout,
                index,
                &[bind_group.set],
                &[],
            );
        }
    }

    fn set_push_constants(&mut self, stages: ShaderStage, offset: u32, data: &[u8]) {
        unsafe {
            self.device.raw().cmd_push_constants(
                self.buffer,
                self.current_pipeline_layout,
                map_shader_stage(stages),
                offset,
                data,
            );
        }
    }

    fn set_viewport(&mut self, x: f32, y: f32, width: f32, height: f32) {
        let viewport = vk::Viewport {
            x,
            y,
            width,
            height,
            min_depth: 0.0,
            max_depth: 1.0,
        };
        unsafe {
            self.device.raw().cmd_set_viewport(self.buffer, 0, &[viewport]);
        }
    }

    fn set_scissor(&mut self, x: i32, y: i32, width: u32, height: u32) {
        let scissor = vk::Rect2D {
            offset: vk::Offset2D { x, y },
            extent: vk::Extent2D { width, height },
        };
        unsafe {
            self.device.raw().cmd_set_scissor(self.buffer, 0, &[scissor]);
        }
    }

    fn draw(&mut self, vertex_count: u32, instance_count: u32, first_vertex: u32, first_instance: u32) {
        unsafe {
            self.device.raw().cmd_draw(self.buffer, vertex_count, instance_count, first_vertex, first_instance);
        }
    }

    fn draw_indexed(&mut self, index_count: u32, instance_count: u32, first_index: u32, vertex_offset: i32, first_instance: u32) {
        unsafe {
            self.device
                .raw()
                .cmd_draw_indexed(self.buffer, index_count, instance_count, first_index, vertex_offset, first_instance);
        }
    }

    fn dispatch(&mut self, x: u32, y: u32, z: u32) {
        unsafe {
            self.device.raw().cmd_dispatch(self.buffer, x, y, z);
        }
    }

    fn fill_buffer(&mut self, buffer: &crate::VulkanBuffer, offset: u64, size: u64, value: u32) {
        unsafe {
            self.device.raw().cmd_fill_buffer(self.buffer, buffer.buffer, offset, size, value);
        }
    }

    fn buffer_barrier(&mut self, buffer: &crate::VulkanBuffer, barrier: BufferBarrier) {
        let vk_barrier = vk::BufferMemoryBarrier {
            src_access_mask: map_access(barrier.src_access),
            dst_access_mask: map_access(barrier.dst_access),
            src_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
            dst_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
            buffer: buffer.buffer,
            offset: barrier.offset,
            size: barrier.size.unwrap_or(vk::WHOLE_SIZE),
            ..Default::default()
        };

        unsafe {
            self.device.raw().cmd_pipeline_barrier(
                self.buffer,
                map_pipeline_stage(barrier.src_stage),
                map_pipeline_stage(barrier.dst_stage),
                vk::DependencyFlags::empty(),
                &[],
                &[vk_barrier],
                &[],
            );
        }
    }

}
