use ash::{vk, Entry};
use lume_core::{Instance, InstanceDescriptor, LumeError, LumeResult};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::ffi::{CStr, CString};
use std::sync::Arc;
use log::{info, error, warn};
use crate::VulkanDevice;

const VALIDATION_LAYER: &CStr = c"VK_LAYER_KHRONOS_validation";

pub struct VulkanInstanceInner {
    pub entry: ash::Entry,
    pub instance: ash::Instance,
    debug_utils: Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,
}

impl Drop for VulkanInstanceInner {
    fn drop(&mut self) {
        unsafe {
            info!("Destroying Vulkan Instance");
            if let Some((loader, messenger)) = self.debug_utils.take() {
                loader.destroy_debug_utils_messenger(messenger, None);
            }
            self.instance.destroy_instance(None);
        }
    }
}

/// Devices and surfaces keep the instance alive through this shared handle.
#[derive(Clone)]
pub struct VulkanInstance {
    pub inner: Arc<VulkanInstanceInner>,
}

unsafe extern "system" fn vulkan_debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
    _user_data: *mut std::os::raw::c_void,
) -> vk::Bool32 {
    let callback_data = unsafe { *p_callback_data };
    let message_id_number = callback_data.message_id_number;

    let message_id_name = if callback_data.p_message_id_name.is_null() {
        std::borrow::Cow::from("")
    } else {
        unsafe { CStr::from_ptr(callback_data.p_message_id_name).to_string_lossy() }
    };

    let message = if callback_data.p_message.is_null() {
        std::borrow::Cow::from("")
    } else {
        unsafe { CStr::from_ptr(callback_data.p_message).to_string_lossy() }
    };

    let log_level = match message_severity {
        vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE => log::Level::Debug,
        vk::DebugUtilsMessageSeverityFlagsEXT::INFO => log::Level::Info,
        vk::DebugUtilsMessageSeverityFlagsEXT::WARNING => log::Level::Warn,
        vk::DebugUtilsMessageSeverityFlagsEXT::ERROR => log::Level::Error,
        _ => log::Level::Info,
    };

    log::log!(
        log_level,
        "[Vulkan] {:?} [{} ({})]: {}",
        message_type,
        message_id_name,
        message_id_number,
        message
    );

    vk::FALSE
}

impl Instance for VulkanInstance {
    type Device = VulkanDevice;
    type Surface = crate::VulkanSurface;

    fn new(descriptor: InstanceDescriptor, display: &impl HasDisplayHandle) -> LumeResult<Self> {
        info!("Initializing Vulkan Instance for application: {}", descriptor.name);

        let entry = unsafe {
            Entry::load().map_err(|e| LumeError::InstanceCreationFailed(format!("Failed to load Vulkan entry: {}", e)))?
        };

        let app_name = CString::new(descriptor.name)
            .map_err(|_| LumeError::Generic("Application name contains a NUL byte"))?;

        let app_info = vk::ApplicationInfo {
            p_application_name: app_name.as_ptr(),
            application_version: 0,
            p_engine_name: c"LumeVisual".as_ptr(),
            engine_version: 0,
            api_version: vk::API_VERSION_1_2,
            ..Default::default()
        };

        let raw_display = display
            .display_handle()
            .map_err(|e| LumeError::InstanceCreationFailed(format!("Failed to get display handle: {}", e)))?
            .as_raw();
        let mut extension_names = ash_window::enumerate_required_extensions(raw_display)
            .map_err(|e| LumeError::InstanceCreationFailed(format!("Unsupported display: {}", e)))?
            .to_vec();

        let validation = descriptor.validation && Self::has_validation_layer(&entry);
        if descriptor.validation && !validation {
            warn!("Validation requested but {:?} is not installed", VALIDATION_LAYER);
        }

        let layer_names: Vec<*const std::os::raw::c_char> = if validation {
            extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
            vec![VALIDATION_LAYER.as_ptr()]
        } else {
            Vec::new()
        };

        let debug_create_info = vk::DebugUtilsMessengerCreateInfoEXT {
            message_severity: vk::DebugUtilsMessageSeverityFlagsEXT::WARNING | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
            message_type: vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE
                | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION,
            pfn_user_callback: Some(vulkan_debug_callback),
            ..Default::default()
        };

        let create_info = vk::InstanceCreateInfo {
            p_application_info: &app_info,
            pp_enabled_extension_names: extension_names.as_ptr(),
            enabled_extension_count: extension_names.len() as u32,
            pp_enabled_layer_names: layer_names.as_ptr(),
            enabled_layer_count: layer_names.len() as u32,
            ..Default::default()
        };

        let instance = unsafe {
            entry.create_instance(&create_info, None).map_err(|e| {
                error!("Instance creation error: {:?}", e);
                LumeError::InstanceCreationFailed(format!("Failed to create Vulkan instance: {}", e))
            })?
        };

        let debug_utils = if validation {
            let loader = ash::ext::debug_utils::Instance::new(&entry, &instance);
            match unsafe { loader.create_debug_utils_messenger(&debug_create_info, None) } {
                Ok(messenger) => Some((loader, messenger)),
                Err(e) => {
                    warn!("Failed to create debug messenger: {:?}", e);
                    None
                }
            }
        } else {
            None
        };

        info!("Vulkan Instance created successfully (validation: {})", validation);

        Ok(VulkanInstance {
            inner: Arc::new(VulkanInstanceInner { entry, instance, debug_utils }),
        })
    }

    fn create_surface(
        &self,
        display_handle: &impl HasDisplayHandle,
        window_handle: &impl HasWindowHandle,
    ) -> LumeResult<Self::Surface> {
        let raw_display = display_handle
            .display_handle()
            .map_err(|e| LumeError::SurfaceCreationFailed(format!("Failed to get display handle: {}", e)))?
            .as_raw();
        let raw_window = window_handle
            .window_handle()
            .map_err(|e| LumeError::SurfaceCreationFailed(format!("Failed to get window handle: {}", e)))?
            .as_raw();

        let surface = unsafe {
            ash_window::create_surface(&self.inner.entry, &self.inner.instance, raw_display, raw_window, None)
                .map_err(|e| {
                    error!("Failed to create surface: {:?}", e);
                    LumeError::SurfaceCreationFailed(format!("Failed to create surface: {}", e))
                })?
        };

        info!("Vulkan Surface created successfully: {:?}", surface);

        let surface_loader = ash::khr::surface::Instance::new(&self.inner.entry, &self.inner.instance);

        Ok(crate::VulkanSurface {
            surface,
            surface_loader,
            _instance: self.inner.clone(),
        })
    }

    fn request_device(&self, surface: Option<&Self::Surface>) -> LumeResult<Self::Device> {
        let instance = &self.inner.instance;
        let pdevices = unsafe {
            instance
                .enumerate_physical_devices()
                .map_err(|e| LumeError::DeviceCreationFailed(format!("Failed to enumerate physical devices: {}", e)))?
        };

        info!("Found {} physical devices", pdevices.len());

        // (physical device, queue family, is discrete)
        let candidates: Vec<(vk::PhysicalDevice, u32, bool)> = pdevices
            .iter()
            .filter_map(|&pdevice| {
                let props = unsafe { instance.get_physical_device_properties(pdevice) };
                let features = unsafe { instance.get_physical_device_features(pdevice) };
                if features.fragment_stores_and_atomics == vk::FALSE {
                    return None;
                }

                let queue_families = unsafe { instance.get_physical_device_queue_family_properties(pdevice) };
                let index = queue_families.iter().enumerate().position(|(i, q)| {
                    let supports_graphics = q.queue_flags.contains(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE);
                    let supports_present = surface.is_none_or(|surface| unsafe {
                        surface
                            .surface_loader
                            .get_physical_device_surface_support(pdevice, i as u32, surface.surface)
                            .unwrap_or(false)
                    });
                    supports_graphics && supports_present
                })?;

                Some((pdevice, index as u32, props.device_type == vk::PhysicalDeviceType::DISCRETE_GPU))
            })
            .collect();

        // Prefer a discrete GPU
        let (pdevice, queue_family_index, _) = candidates
            .iter()
            .copied()
            .find(|c| c.2)
            .or_else(|| candidates.first().copied())
            .ok_or_else(|| LumeError::DeviceCreationFailed("No suitable physical device found".to_string()))?;

        let props = unsafe { instance.get_physical_device_properties(pdevice) };
        info!("Selected GPU: {:?}", unsafe { CStr::from_ptr(props.device_name.as_ptr()) });

        let priorities = [1.0];
        let queue_create_info = vk::DeviceQueueCreateInfo {
            queue_family_index,
            p_queue_priorities: priorities.as_ptr(),
            queue_count: 1,
            ..Default::default()
        };

        let mut device_extension_names = Vec::new();
        if surface.is_some() {
            device_extension_names.push(ash::khr::swapchain::NAME.as_ptr());
        }

        // The cluster fragment shader ORs bits into a storage buffer.
        let enabled_features = vk::PhysicalDeviceFeatures {
            fragment_stores_and_atomics: vk::TRUE,
            ..Default::default()
        };

        let device_create_info = vk::DeviceCreateInfo {
            p_queue_create_infos: &queue_create_info,
            queue_create_info_count: 1,
            pp_enabled_extension_names: device_extension_names.as_ptr(),
            enabled_extension_count: device_extension_names.len() as u32,
            p_enabled_features: &enabled_features,
            ..Default::default()
        };

        let device = unsafe {
            instance.create_device(pdevice, &device_create_info, None).map_err(|e| {
                error!("Failed to create logical device: {:?}", e);
                LumeError::DeviceCreationFailed(format!("Failed to create logical device: {}", e))
            })?
        };

        let graphics_queue = unsafe { device.get_device_queue(queue_family_index, 0) };

        info!("Vulkan Device created successfully");

        VulkanDevice::new(self.inner.clone(), device, pdevice, graphics_queue, queue_family_index)
    }
}

impl VulkanInstance {
    fn has_validation_layer(entry: &Entry) -> bool {
        let layers = unsafe { entry.enumerate_instance_layer_properties() }.unwrap_or_default();
        layers
            .iter()
            .any(|layer| layer.layer_name_as_c_str().is_ok_and(|name| name == VALIDATION_LAYER))
    }
}
