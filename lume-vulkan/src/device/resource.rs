use ash::vk;
use gpu_allocator::vulkan::{AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation as AllocLocation;
use log::info;
use lume_core::device::{BufferDescriptor, MemoryLocation, SwapchainDescriptor, TextureDescriptor, TextureViewDescriptor};
use lume_core::{LumeError, LumeResult};
use crate::convert::{is_depth_format, map_buffer_usage, map_texture_format, map_texture_usage, unmap_texture_format};
use crate::VulkanDevice;

impl VulkanDevice {
    pub fn create_buffer_impl(&self, descriptor: BufferDescriptor) -> LumeResult<crate::VulkanBuffer> {
        let create_info = vk::BufferCreateInfo {
            size: descriptor.size,
            usage: map_buffer_usage(descriptor.usage),
            sharing_mode: vk::SharingMode::EXCLUSIVE,
            ..Default::default()
        };

        let buffer = unsafe {
            self.inner
                .device
                .create_buffer(&create_info, None)
                .map_err(|e| LumeError::ResourceCreationFailed(format!("Failed to create buffer: {}", e)))?
        };

        let requirements = unsafe { self.inner.device.get_buffer_memory_requirements(buffer) };
        let location = match descriptor.location {
            MemoryLocation::GpuOnly => AllocLocation::GpuOnly,
            MemoryLocation::CpuToGpu => AllocLocation::CpuToGpu,
            MemoryLocation::GpuToCpu => AllocLocation::GpuToCpu,
        };

        let allocation = self
            .allocator()?
            .allocate(&AllocationCreateDesc {
                name: "Lume_Buffer",
                requirements,
                location,
                linear: true,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            })
            .map_err(|e| {
                unsafe { self.inner.device.destroy_buffer(buffer, None) };
                LumeError::BackendError(format!("Failed to allocate buffer memory: {}", e))
            })?;

        unsafe {
            self.inner
                .device
                .bind_buffer_memory(buffer, allocation.memory(), allocation.offset())
                .map_err(|e| LumeError::BackendError(format!("Failed to bind buffer memory: {}", e)))?;
        }

        Ok(crate::VulkanBuffer {
            buffer,
            allocation,
            size: descriptor.size,
            device: self.clone(),
        })
    }

    pub fn create_texture_impl(&self, descriptor: TextureDescriptor) -> LumeResult<crate::VulkanTexture> {
        let format = map_texture_format(descriptor.format);
        let create_info = vk::ImageCreateInfo {
            image_type: vk::ImageType::TYPE_2D,
            format,
            extent: vk::Extent3D { width: descriptor.width, height: descriptor.height, depth: descriptor.depth.max(1) },
            mip_levels: 1,
            array_layers: 1,
            samples: vk::SampleCountFlags::TYPE_1,
            tiling: vk::ImageTiling::OPTIMAL,
            usage: map_texture_usage(descriptor.usage),
            sharing_mode: vk::SharingMode::EXCLUSIVE,
            initial_layout: vk::ImageLayout::UNDEFINED,
            ..Default::default()
        };

        let image = unsafe {
            self.inner
                .device
                .create_image(&create_info, None)
                .map_err(|e| LumeError::ResourceCreationFailed(format!("Failed to create texture: {}", e)))?
        };

        let requirements = unsafe { self.inner.device.get_image_memory_requirements(image) };
        let allocation = self
            .allocator()?
            .allocate(&AllocationCreateDesc {
                name: "Lume_Texture",
                requirements,
                location: AllocLocation::GpuOnly,
                linear: false,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            })
            .map_err(|e| {
                unsafe { self.inner.device.destroy_image(image, None) };
                LumeError::BackendError(format!("Failed to allocate texture memory: {}", e))
            })?;

        unsafe {
            self.inner
                .device
                .bind_image_memory(image, allocation.memory(), allocation.offset())
                .map_err(|e| LumeError::BackendError(format!("Failed to bind texture memory: {}", e)))?;
        }

        Ok(crate::VulkanTexture {
            image,
            allocation,
            format,
            width: descriptor.width,
            height: descriptor.height,
            device: self.clone(),
        })
    }

    pub fn create_texture_view_impl(&self, texture: &crate::VulkanTexture, descriptor: TextureViewDescriptor) -> LumeResult<crate::VulkanTextureView> {
        let format = descriptor.format.map(map_texture_format).unwrap_or(texture.format);
        let extent = vk::Extent2D { width: texture.width, height: texture.height };
        self.create_image_view(texture.image, format, extent)
    }

    fn create_image_view(&self, image: vk::Image, format: vk::Format, extent: vk::Extent2D) -> LumeResult<crate::VulkanTextureView> {
        let aspect = if is_depth_format(format) { vk::ImageAspectFlags::DEPTH } else { vk::ImageAspectFlags::COLOR };

        let create_info = vk::ImageViewCreateInfo {
            image,
            view_type: vk::ImageViewType::TYPE_2D,
            format,
            subresource_range: vk::ImageSubresourceRange {
                aspect_mask: aspect,
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            },
            ..Default::default()
        };

        let view = unsafe {
            self.inner
                .device
                .create_image_view(&create_info, None)
                .map_err(|e| LumeError::ResourceCreationFailed(format!("Failed to create texture view: {}", e)))?
        };

        Ok(crate::VulkanTextureView {
            view,
            image,
            extent,
            aspect,
            device: self.clone(),
        })
    }

    pub fn create_swapchain_impl(&self, surface: &crate::VulkanSurface, descriptor: SwapchainDescriptor) -> LumeResult<crate::VulkanSwapchain> {
        let surface_loader = &surface.surface_loader;
        let surface_khr = surface.surface;

        let formats = unsafe {
            surface_loader
                .get_physical_device_surface_formats(self.inner.physical_device, surface_khr)
                .map_err(|e| LumeError::ResourceCreationFailed(format!("Failed to query surface formats: {}", e)))?
        };
        // sRGB first; the deferred pass writes linear colour.
        let (surface_format, format) = [vk::Format::B8G8R8A8_SRGB, vk::Format::R8G8B8A8_SRGB, vk::Format::B8G8R8A8_UNORM, vk::Format::R8G8B8A8_UNORM]
            .iter()
            .find_map(|wanted| {
                formats
                    .iter()
                    .find(|f| f.format == *wanted && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR)
                    .and_then(|f| unmap_texture_format(f.format).map(|ours| (*f, ours)))
            })
            .ok_or(LumeError::Generic("Surface offers no supported 8-bit colour format"))?;

        let caps = unsafe {
            surface_loader
                .get_physical_device_surface_capabilities(self.inner.physical_device, surface_khr)
                .map_err(|e| LumeError::ResourceCreationFailed(format!("Failed to query surface capabilities: {}", e)))?
        };

        let extent = if caps.current_extent.width != u32::MAX {
            caps.current_extent
        } else {
            vk::Extent2D {
                width: descriptor.width.clamp(caps.min_image_extent.width, caps.max_image_extent.width),
                height: descriptor.height.clamp(caps.min_image_extent.height, caps.max_image_extent.height),
            }
        };

        let mut min_image_count = descriptor.image_count.max(caps.min_image_count);
        if caps.max_image_count > 0 {
            min_image_count = min_image_count.min(caps.max_image_count);
        }

        let create_info = vk::SwapchainCreateInfoKHR {
            surface: surface_khr,
            min_image_count,
            image_format: surface_format.format,
            image_color_space: surface_format.color_space,
            image_extent: extent,
            image_array_layers: 1,
            image_usage: vk::ImageUsageFlags::COLOR_ATTACHMENT,
            image_sharing_mode: vk::SharingMode::EXCLUSIVE,
            pre_transform: caps.current_transform,
            composite_alpha: vk::CompositeAlphaFlagsKHR::OPAQUE,
            present_mode: vk::PresentModeKHR::FIFO,
            clipped: vk::TRUE,
            ..Default::default()
        };

        let loader = ash::khr::swapchain::Device::new(&self.inner.instance.instance, &self.inner.device);
        let swapchain = unsafe {
            loader
                .create_swapchain(&create_info, None)
                .map_err(|e| LumeError::ResourceCreationFailed(format!("Failed to create swapchain: {}", e)))?
        };
        let images = unsafe {
            loader
                .get_swapchain_images(swapchain)
                .map_err(|e| LumeError::ResourceCreationFailed(format!("Failed to get swapchain images: {}", e)))?
        };

        let image_views = images
            .iter()
            .map(|&image| self.create_image_view(image, surface_format.format, extent))
            .collect::<LumeResult<Vec<_>>>()?;

        info!("Swapchain created: {}x{}, {} images, {:?}", extent.width, extent.height, images.len(), format);

        Ok(crate::VulkanSwapchain {
            swapchain_loader: loader,
            swapchain,
            images,
            image_views,
            extent,
            format,
            device: self.clone(),
        })
    }
}
