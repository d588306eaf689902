use ash::vk;
use crate::VulkanDevice;

pub struct VulkanSemaphore {
    pub semaphore: vk::Semaphore,
    pub device: VulkanDevice,
}

impl Drop for VulkanSemaphore {
    fn drop(&mut self) {
        unsafe {
            self.device.raw().destroy_semaphore(self.semaphore, None);
        }
    }
}

impl lume_core::device::Semaphore for VulkanSemaphore {}

pub struct VulkanFence {
    pub fence: vk::Fence,
    pub device: VulkanDevice,
}

impl Drop for VulkanFence {
    fn drop(&mut self) {
        unsafe {
            self.device.raw().destroy_fence(self.fence, None);
        }
    }
}

impl lume_core::device::Fence for VulkanFence {}
