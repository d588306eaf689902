use ash::vk;
use gpu_allocator::vulkan::Allocation;
use crate::VulkanDevice;

pub struct VulkanTexture {
    pub image: vk::Image,
    pub allocation: Allocation,
    pub format: vk::Format,
    pub width: u32,
    pub height: u32,
    pub device: VulkanDevice,
}

impl Drop for VulkanTexture {
    fn drop(&mut self) {
        unsafe {
            self.device.raw().destroy_image(self.image, None);
        }
        let allocation = std::mem::take(&mut self.allocation);
        self.device.free_allocation(allocation);
    }
}

impl lume_core::device::Texture for VulkanTexture {}

/// A view onto either an owned texture or a swapchain image.
pub struct VulkanTextureView {
    pub view: vk::ImageView,
    pub image: vk::Image,
    pub extent: vk::Extent2D,
    pub aspect: vk::ImageAspectFlags,
    pub device: VulkanDevice,
}

impl Drop for VulkanTextureView {
    fn drop(&mut self) {
        unsafe {
            self.device.raw().destroy_image_view(self.view, None);
        }
    }
}

impl lume_core::device::TextureView for VulkanTextureView {}
