use ash::vk;
use log::{info, warn};
use lume_core::device::TextureFormat;
use lume_core::{LumeError, LumeResult};
use crate::{VulkanDevice, VulkanSemaphore, VulkanTextureView};

pub struct VulkanSwapchain {
    pub swapchain_loader: ash::khr::swapchain::Device,
    pub swapchain: vk::SwapchainKHR,
    pub images: Vec<vk::Image>,
    pub image_views: Vec<VulkanTextureView>,
    pub extent: vk::Extent2D,
    pub format: TextureFormat,
    pub device: VulkanDevice,
}

impl Drop for VulkanSwapchain {
    fn drop(&mut self) {
        unsafe {
            info!("Destroying Swapchain");
            self.image_views.clear();
            self.swapchain_loader.destroy_swapchain(self.swapchain, None);
        }
    }
}

impl lume_core::device::Swapchain for VulkanSwapchain {
    type TextureView = VulkanTextureView;
    type Semaphore = VulkanSemaphore;

    fn acquire_next_image(&mut self, signal_semaphore: &VulkanSemaphore) -> LumeResult<u32> {
        let result = unsafe {
            self.swapchain_loader.acquire_next_image(
                self.swapchain,
                u64::MAX,
                signal_semaphore.semaphore,
                vk::Fence::null(),
            )
        };

        match result {
            Ok((index, suboptimal)) => {
                if suboptimal {
                    warn!("Swapchain is suboptimal for the surface");
                }
                Ok(index)
            }
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Err(LumeError::SwapchainOutOfDate),
            Err(e) => Err(LumeError::BackendError(format!("Failed to acquire next image: {}", e))),
        }
    }

    fn present(&mut self, image_index: u32, wait_semaphores: &[&VulkanSemaphore]) -> LumeResult<()> {
        let swapchains = [self.swapchain];
        let image_indices = [image_index];
        let vk_wait_semaphores: Vec<vk::Semaphore> = wait_semaphores.iter().map(|s| s.semaphore).collect();

        let present_info = vk::PresentInfoKHR {
            wait_semaphore_count: vk_wait_semaphores.len() as u32,
            p_wait_semaphores: vk_wait_semaphores.as_ptr(),
            swapchain_count: 1,
            p_swapchains: swapchains.as_ptr(),
            p_image_indices: image_indices.as_ptr(),
            ..Default::default()
        };

        let result = unsafe { self.swapchain_loader.queue_present(self.device.graphics_queue, &present_info) };
        match result {
            // Suboptimal after present means the window changed; rebuild now.
            Ok(true) | Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Err(LumeError::SwapchainOutOfDate),
            Ok(false) => Ok(()),
            Err(e) => Err(LumeError::BackendError(format!("Queue present failed: {}", e))),
        }
    }

    fn get_view(&self, index: u32) -> &VulkanTextureView {
        &self.image_views[index as usize]
    }

    fn image_count(&self) -> u32 {
        self.images.len() as u32
    }

    fn extent(&self) -> (u32, u32) {
        (self.extent.width, self.extent.height)
    }

    fn format(&self) -> TextureFormat {
        self.format
    }
}
