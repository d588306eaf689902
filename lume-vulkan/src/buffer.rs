use ash::vk;
use gpu_allocator::vulkan::Allocation;
use lume_core::{LumeError, LumeResult};
use crate::VulkanDevice;

pub struct VulkanBuffer {
    pub buffer: vk::Buffer,
    pub allocation: Allocation,
    pub size: u64,
    pub device: VulkanDevice,
}

impl Drop for VulkanBuffer {
    fn drop(&mut self) {
        unsafe {
            self.device.raw().destroy_buffer(self.buffer, None);
        }
        let allocation = std::mem::take(&mut self.allocation);
        self.device.free_allocation(allocation);
    }
}

impl VulkanBuffer {
    fn mapped_range(&self, offset: u64, len: usize) -> LumeResult<*mut u8> {
        if offset + len as u64 > self.size {
            return Err(LumeError::BackendError(format!(
                "Buffer access out of range: {}..{} of {}",
                offset,
                offset + len as u64,
                self.size
            )));
        }
        let ptr = self
            .allocation
            .mapped_ptr()
            .ok_or_else(|| LumeError::BackendError("Buffer is not CPU-mappable or not mapped".to_string()))?
            .as_ptr();
        Ok(unsafe { (ptr as *mut u8).add(offset as usize) })
    }
}

impl lume_core::device::Buffer for VulkanBuffer {
    fn size(&self) -> u64 {
        self.size
    }

    fn write_data(&self, offset: u64, data: &[u8]) -> LumeResult<()> {
        let dst = self.mapped_range(offset, data.len())?;
        unsafe {
            std::ptr::copy_nonoverlapping(data.as_ptr(), dst, data.len());
        }
        Ok(())
    }

    fn read_data(&self, offset: u64, data: &mut [u8]) -> LumeResult<()> {
        let src = self.mapped_range(offset, data.len())?;
        unsafe {
            std::ptr::copy_nonoverlapping(src as *const u8, data.as_mut_ptr(), data.len());
        }
        Ok(())
    }
}
