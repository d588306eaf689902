use ash::vk;
use std::sync::Arc;
use crate::instance::VulkanInstanceInner;

pub struct VulkanSurface {
    pub surface: vk::SurfaceKHR,
    pub surface_loader: ash::khr::surface::Instance,
    pub(crate) _instance: Arc<VulkanInstanceInner>,
}

impl Drop for VulkanSurface {
    fn drop(&mut self) {
        unsafe {
            self.surface_loader.destroy_surface(self.surface, None);
        }
    }
}

impl lume_core::instance::Surface for VulkanSurface {}
