use ash::vk;
use std::collections::HashMap;
use lume_core::{LumeError, LumeResult, device::{BindingResource, BindingType, BindGroupDescriptor, BindGroupLayoutDescriptor}};
use crate::convert::{map_binding_type, map_shader_stage};
use crate::VulkanDevice;

pub struct VulkanBindGroupLayout {
    pub layout: vk::DescriptorSetLayout,
    pub entries: HashMap<u32, BindingType>,
    pub device: VulkanDevice,
}

impl Drop for VulkanBindGroupLayout {
    fn drop(&mut self) {
        unsafe {
            self.device.raw().destroy_descriptor_set_layout(self.layout, None);
        }
    }
}

impl lume_core::device::BindGroupLayout for VulkanBindGroupLayout {}

pub struct VulkanBindGroup {
    pub set: vk::DescriptorSet,
    pub device: VulkanDevice,
}

impl Drop for VulkanBindGroup {
    fn drop(&mut self) {
        unsafe {
            if let Err(e) = self.device.raw().free_descriptor_sets(self.device.descriptor_pool, &[self.set]) {
                log::error!("Failed to free bind group: {}", e);
            }
        }
    }
}

impl lume_core::device::BindGroup for VulkanBindGroup {}

enum ResourceInfo {
    Buffer(vk::DescriptorBufferInfo),
    Image(vk::DescriptorImageInfo),
}

impl VulkanDevice {
    pub fn create_bind_group_layout_impl(&self, descriptor: BindGroupLayoutDescriptor) -> LumeResult<VulkanBindGroupLayout> {
        let mut entries = Vec::new();
        let mut type_map = HashMap::new();

        for entry in descriptor.entries {
            entries.push(vk::DescriptorSetLayoutBinding {
                binding: entry.binding,
                descriptor_type: map_binding_type(entry.ty),
                descriptor_count: 1,
                stage_flags: map_shader_stage(entry.visibility),
                ..Default::default()
            });
            type_map.insert(entry.binding, entry.ty);
        }

        let create_info = vk::DescriptorSetLayoutCreateInfo {
            binding_count: entries.len() as u32,
            p_bindings: entries.as_ptr(),
            ..Default::default()
        };

        let layout = unsafe {
            self.inner
                .device
                .create_descriptor_set_layout(&create_info, None)
                .map_err(|e| LumeError::ResourceCreationFailed(format!("Failed to create bind group layout: {}", e)))?
        };

        Ok(VulkanBindGroupLayout {
            layout,
            entries: type_map,
            device: self.clone(),
        })
    }

    pub fn create_bind_group_impl(&self, descriptor: BindGroupDescriptor<Self>) -> LumeResult<VulkanBindGroup> {
        // Resolve every entry before allocating so a bad descriptor leaks nothing.
        let mut resolved = Vec::with_capacity(descriptor.entries.len());
        for entry in &descriptor.entries {
            let ty = *descriptor
                .layout
                .entries
                .get(&entry.binding)
                .ok_or(LumeError::Generic("Unknown binding in bind group"))?;

            let info = match (&entry.resource, ty) {
                (BindingResource::Buffer(buf), BindingType::UniformBuffer | BindingType::StorageBuffer) => {
                    ResourceInfo::Buffer(vk::DescriptorBufferInfo {
                        buffer: buf.buffer,
                        offset: 0,
                        range: buf.size,
                    })
                }
                (BindingResource::BufferRange { buffer, offset, size }, BindingType::UniformBuffer | BindingType::StorageBuffer) => {
                    if offset + size > buffer.size {
                        return Err(LumeError::Generic("Buffer range binding exceeds the buffer"));
                    }
                    ResourceInfo::Buffer(vk::DescriptorBufferInfo {
                        buffer: buffer.buffer,
                        offset: *offset,
                        range: *size,
                    })
                }
                (BindingResource::TextureView(view), BindingType::SampledTexture) => ResourceInfo::Image(vk::DescriptorImageInfo {
                    image_view: view.view,
                    image_layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
                    ..Default::default()
                }),
                _ => return Err(LumeError::Generic("Mismatched binding type for resource")),
            };
            resolved.push((entry.binding, map_binding_type(ty), info));
        }

        let allocate_info = vk::DescriptorSetAllocateInfo {
            descriptor_pool: self.inner.descriptor_pool,
            descriptor_set_count: 1,
            p_set_layouts: &descriptor.layout.layout,
            ..Default::default()
        };

        let sets = unsafe {
            self.inner
                .device
                .allocate_descriptor_sets(&allocate_info)
                .map_err(|e| LumeError::ResourceCreationFailed(format!("Failed to allocate bind group: {}", e)))?
        };
        let set = sets[0];

        let writes: Vec<vk::WriteDescriptorSet> = resolved
            .iter()
            .map(|(binding, descriptor_type, info)| {
                let write = vk::WriteDescriptorSet {
                    dst_set: set,
                    dst_binding: *binding,
                    descriptor_count: 1,
                    descriptor_type: *descriptor_type,
                    ..Default::default()
                };
                match info {
                    ResourceInfo::Buffer(buffer_info) => vk::WriteDescriptorSet { p_buffer_info: buffer_info, ..write },
                    ResourceInfo::Image(image_info) => vk::WriteDescriptorSet { p_image_info: image_info, ..write },
                }
            })
            .collect();

        unsafe {
            self.inner.device.update_descriptor_sets(&writes, &[]);
        }

        Ok(VulkanBindGroup { set, device: self.clone() })
    }
}
