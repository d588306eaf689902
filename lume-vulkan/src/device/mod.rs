use ash::vk;
use gpu_allocator::vulkan::{Allocation, Allocator, AllocatorCreateDesc};
use lume_core::{LumeError, LumeResult};
use std::sync::{Arc, Mutex};
use crate::instance::VulkanInstanceInner;

pub struct VulkanDeviceInner {
    pub allocator: Option<Mutex<Allocator>>,
    pub descriptor_pool: vk::DescriptorPool,
    pub graphics_queue_index: u32,
    pub graphics_queue: vk::Queue,
    pub physical_device: vk::PhysicalDevice,
    pub device: ash::Device,
    pub instance: Arc<VulkanInstanceInner>,
}

#[derive(Clone)]
pub struct VulkanDevice {
    pub inner: Arc<VulkanDeviceInner>,
}

impl std::ops::Deref for VulkanDevice {
    type Target = VulkanDeviceInner;
    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl VulkanDevice {
    pub(crate) fn new(
        instance: Arc<VulkanInstanceInner>,
        device: ash::Device,
        physical_device: vk::PhysicalDevice,
        graphics_queue: vk::Queue,
        graphics_queue_index: u32,
    ) -> LumeResult<Self> {
        let pool_sizes = [
            vk::DescriptorPoolSize { ty: vk::DescriptorType::UNIFORM_BUFFER, descriptor_count: 1000 },
            vk::DescriptorPoolSize { ty: vk::DescriptorType::STORAGE_BUFFER, descriptor_count: 1000 },
            vk::DescriptorPoolSize { ty: vk::DescriptorType::SAMPLED_IMAGE, descriptor_count: 1000 },
            vk::DescriptorPoolSize { ty: vk::DescriptorType::SAMPLER, descriptor_count: 1000 },
        ];

        // Bind groups return their sets when size-dependent resources are rebuilt.
        let pool_info = vk::DescriptorPoolCreateInfo {
            flags: vk::DescriptorPoolCreateFlags::FREE_DESCRIPTOR_SET,
            pool_size_count: pool_sizes.len() as u32,
            p_pool_sizes: pool_sizes.as_ptr(),
            max_sets: 1000,
            ..Default::default()
        };

        let descriptor_pool = unsafe {
            device
                .create_descriptor_pool(&pool_info, None)
                .map_err(|e| LumeError::DeviceCreationFailed(format!("Failed to create descriptor pool: {}", e)))?
        };

        let allocator = Allocator::new(&AllocatorCreateDesc {
            instance: instance.instance.clone(),
            device: device.clone(),
            physical_device,
            debug_settings: Default::default(),
            buffer_device_address: false,
            allocation_sizes: Default::default(),
        })
        .map_err(|e| LumeError::DeviceCreationFailed(format!("Failed to create allocator: {}", e)))?;

        Ok(Self {
            inner: Arc::new(VulkanDeviceInner {
                allocator: Some(Mutex::new(allocator)),
                descriptor_pool,
                graphics_queue_index,
                graphics_queue,
                physical_device,
                device,
                instance,
            }),
        })
    }

    pub fn raw(&self) -> &ash::Device {
        &self.inner.device
    }

    pub(crate) fn allocator(&self) -> LumeResult<std::sync::MutexGuard<'_, Allocator>> {
        self.inner
            .allocator
            .as_ref()
            .ok_or_else(|| LumeError::BackendError("Allocator not initialized".to_string()))?
            .lock()
            .map_err(|_| LumeError::BackendError("Allocator lock poisoned".to_string()))
    }

    pub(crate) fn free_allocation(&self, allocation: Allocation) {
        match self.allocator() {
            Ok(mut allocator) => {
                if let Err(e) = allocator.free(allocation) {
                    log::error!("Failed to free device memory: {}", e);
                }
            }
            Err(e) => log::error!("Leaking device memory: {}", e),
        }
    }
}

impl Drop for VulkanDeviceInner {
    fn drop(&mut self) {
        unsafe {
            log::info!("Destroying Vulkan Device and Descriptor Pool");
            // The allocator frees its memory blocks through the device, so it goes first.
            self.allocator.take();
            self.device.destroy_descriptor_pool(self.descriptor_pool, None);
            self.device.destroy_device(None);
        }
    }
}

mod resource;
mod pipeline;
mod descriptor;
mod queue;

pub use descriptor::{VulkanBindGroup, VulkanBindGroupLayout};
