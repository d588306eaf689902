use ash::vk;
use std::sync::Arc;
use crate::VulkanDevice;

pub struct VulkanShaderModuleInner {
    pub module: vk::ShaderModule,
    pub device: VulkanDevice,
}

impl Drop for VulkanShaderModuleInner {
    fn drop(&mut self) {
        unsafe {
            self.device.raw().destroy_shader_module(self.module, None);
        }
    }
}

#[derive(Clone)]
pub struct VulkanShaderModule(pub Arc<VulkanShaderModuleInner>);

pub struct VulkanRenderPassInner {
    pub render_pass: vk::RenderPass,
    pub subpass_count: u32,
    pub device: VulkanDevice,
}

impl Drop for VulkanRenderPassInner {
    fn drop(&mut self) {
        unsafe {
            self.device.raw().destroy_render_pass(self.render_pass, None);
        }
    }
}

#[derive(Clone)]
pub struct VulkanRenderPass(pub Arc<VulkanRenderPassInner>);

pub struct VulkanPipelineLayoutInner {
    pub layout: vk::PipelineLayout,
    pub device: VulkanDevice,
}

impl Drop for VulkanPipelineLayoutInner {
    fn drop(&mut self) {
        unsafe {
            self.device.raw().destroy_pipeline_layout(self.layout, None);
        }
    }
}

#[derive(Clone)]
pub struct VulkanPipelineLayout(pub Arc<VulkanPipelineLayoutInner>);

/// Pipelines keep their layout alive so bound descriptor sets and push
/// constants can always reach it.
pub struct VulkanGraphicsPipelineInner {
    pub pipeline: vk::Pipeline,
    pub layout: VulkanPipelineLayout,
    pub device: VulkanDevice,
}

impl Drop for VulkanGraphicsPipelineInner {
    fn drop(&mut self) {
        unsafe {
            self.device.raw().destroy_pipeline(self.pipeline, None);
        }
    }
}

#[derive(Clone)]
pub struct VulkanGraphicsPipeline(pub Arc<VulkanGraphicsPipelineInner>);

pub struct VulkanComputePipelineInner {
    pub pipeline: vk::Pipeline,
    pub layout: VulkanPipelineLayout,
    pub device: VulkanDevice,
}

impl Drop for VulkanComputePipelineInner {
    fn drop(&mut self) {
        unsafe {
            self.device.raw().destroy_pipeline(self.pipeline, None);
        }
    }
}

#[derive(Clone)]
pub struct VulkanComputePipeline(pub Arc<VulkanComputePipelineInner>);

pub struct VulkanFramebuffer {
    pub framebuffer: vk::Framebuffer,
    pub width: u32,
    pub height: u32,
    pub device: VulkanDevice,
}

impl Drop for VulkanFramebuffer {
    fn drop(&mut self) {
        unsafe {
            self.device.raw().destroy_framebuffer(self.framebuffer, None);
        }
    }
}

impl lume_core::device::ShaderModule for VulkanShaderModule {}
impl lume_core::device::RenderPass for VulkanRenderPass {}
impl lume_core::device::PipelineLayout for VulkanPipelineLayout {}
impl lume_core::device::GraphicsPipeline for VulkanGraphicsPipeline {}
impl lume_core::device::ComputePipeline for VulkanComputePipeline {}
impl lume_core::device::Framebuffer for VulkanFramebuffer {}
