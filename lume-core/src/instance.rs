use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    Vulkan,
}

pub struct InstanceDescriptor<'a> {
    pub name: &'a str,
    pub backend: Backend,
    /// Enable the backend's validation layer when it is installed.
    pub validation: bool,
}

pub trait Instance: Sized {
    type Surface: Surface;
    type Device: crate::Device<Surface = Self::Surface>;

    /// Create a new instance of the rendering backend.
    ///
    /// The display handle decides which platform surface extensions get enabled.
    fn new(descriptor: InstanceDescriptor, display: &impl HasDisplayHandle) -> crate::LumeResult<Self>;

    /// Create a surface from a window.
    fn create_surface(
        &self,
        display_handle: &impl HasDisplayHandle,
        window_handle: &impl HasWindowHandle,
    ) -> crate::LumeResult<Self::Surface>;

    /// Request a suitable graphics device.
    /// This picks a physical device whose graphics queue can present to `surface`.
    fn request_device(&self, surface: Option<&Self::Surface>) -> crate::LumeResult<Self::Device>;
}

pub trait Surface {}
