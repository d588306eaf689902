pub mod instance;
mod surface;
mod device;
mod swapchain;
mod pipeline;
mod command;
mod sync;
mod buffer;
mod texture;
mod convert;

pub use instance::VulkanInstance;
pub use surface::VulkanSurface;
pub use device::{VulkanDevice, VulkanBindGroup, VulkanBindGroupLayout};
pub use swapchain::VulkanSwapchain;
pub use texture::{VulkanTexture, VulkanTextureView};
pub use pipeline::*;
pub use command::{VulkanCommandPool, VulkanCommandBuffer};
pub use sync::{VulkanSemaphore, VulkanFence};
pub use buffer::VulkanBuffer;
