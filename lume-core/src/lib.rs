pub mod device;
pub mod error;
pub mod instance;
pub mod shader;

pub use device::Device;
pub use error::{LumeError, LumeResult};
pub use instance::{Backend, Instance, InstanceDescriptor};
