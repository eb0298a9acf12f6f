use std::ffi::{CStr, CString};

use ash::vk;
use graphics_types::error::{UrcError, UrcResult};
use log::{info, warn};

/// Picked physical device plus the bits of it the rest of the deferred
/// backend needs repeatedly. Grounded in the teacher's `phy_device.rs`:
/// enumerate devices, keep the first one whose API version clears the
/// backend's minimum, prefer a discrete GPU, and cache its queue family and
/// memory properties rather than re-querying them every frame.
pub struct PhyDevice {
    pub handle: vk::PhysicalDevice,
    pub memory_properties: vk::PhysicalDeviceMemoryProperties,
    pub queue_family_index: u32,
    pub name: String,
    pub is_discrete: bool,
}

impl PhyDevice {
    /// Vulkan 1.1 is the floor the spec names; any device reporting less is
    /// skipped rather than limping along on an unsupported feature set.
    const MIN_API_MAJOR: u32 = 1;
    const MIN_API_MINOR: u32 = 1;

    pub fn select(instance: &ash::Instance) -> UrcResult<Self> {
        let devices = unsafe { instance.enumerate_physical_devices() }
            .map_err(|e| UrcError::BackendFailure(format!("enumerate_physical_devices: {e}")))?;
        if devices.is_empty() {
            return Err(UrcError::BackendFailure("no vulkan physical devices found".into()));
        }

        let mut best: Option<(vk::PhysicalDevice, vk::PhysicalDeviceProperties, u32)> = None;
        for device in devices {
            let props = unsafe { instance.get_physical_device_properties(device) };
            let major = vk::api_version_major(props.api_version);
            let minor = vk::api_version_minor(props.api_version);
            if major < Self::MIN_API_MAJOR || (major == Self::MIN_API_MAJOR && minor < Self::MIN_API_MINOR) {
                continue;
            }

            let Some(queue_family_index) = Self::find_graphics_queue(instance, device) else {
                continue;
            };

            let is_better = match &best {
                None => true,
                Some((_, best_props, _)) => {
                    props.device_type == vk::PhysicalDeviceType::DISCRETE_GPU
                        && best_props.device_type != vk::PhysicalDeviceType::DISCRETE_GPU
                }
            };
            if is_better {
                best = Some((device, props, queue_family_index));
            }
        }

        let (handle, props, queue_family_index) = best.ok_or_else(|| {
            UrcError::BackendFailure("no vulkan device with a graphics queue and api >= 1.1 found".into())
        })?;

        let name = unsafe { CStr::from_ptr(props.device_name.as_ptr()) }
            .to_string_lossy()
            .into_owned();
        let is_discrete = props.device_type == vk::PhysicalDeviceType::DISCRETE_GPU;
        info!(
            "selected vulkan device '{name}' ({}), api {}.{}.{}",
            if is_discrete { "discrete" } else { "integrated/other" },
            vk::api_version_major(props.api_version),
            vk::api_version_minor(props.api_version),
            vk::api_version_patch(props.api_version),
        );

        let memory_properties = unsafe { instance.get_physical_device_memory_properties(handle) };

        Ok(Self {
            handle,
            memory_properties,
            queue_family_index,
            name,
            is_discrete,
        })
    }

    fn find_graphics_queue(instance: &ash::Instance, device: vk::PhysicalDevice) -> Option<u32> {
        let families = unsafe { instance.get_physical_device_queue_family_properties(device) };
        families
            .iter()
            .enumerate()
            .find(|(_, f)| f.queue_count > 0 && f.queue_flags.contains(vk::QueueFlags::GRAPHICS))
            .map(|(i, _)| i as u32)
    }

    /// First memory type both present in `filter` (the resource's
    /// `memoryTypeBits`) and carrying every flag in `required`, or
    /// `OutOfResources` if the device has none — there is no fallback once
    /// the device genuinely lacks the memory type (spec.md §7).
    pub fn find_memory_type(&self, filter: u32, required: vk::MemoryPropertyFlags) -> UrcResult<u32> {
        for i in 0..self.memory_properties.memory_type_count {
            let supported = (filter & (1 << i)) != 0;
            let flags = self.memory_properties.memory_types[i as usize].property_flags;
            if supported && flags.contains(required) {
                return Ok(i);
            }
        }
        Err(UrcError::OutOfResources(
            "no device memory type satisfies the requested properties".into(),
        ))
    }
}

/// Instance-level setup: application info, the extensions `ash-window`
/// demands for the platform the surface provider handed us, and (in debug
/// builds) the validation layer if the loader reports it present.
pub fn create_instance(
    entry: &ash::Entry,
    display_handle: raw_window_handle::RawDisplayHandle,
    debug_mode: bool,
) -> UrcResult<ash::Instance> {
    let app_name = CString::new("urc-application").unwrap();
    let engine_name = CString::new("unified-rendering-core").unwrap();
    let app_info = vk::ApplicationInfo::default()
        .application_name(&app_name)
        .application_version(vk::make_api_version(0, 1, 0, 0))
        .engine_name(&engine_name)
        .engine_version(vk::make_api_version(0, 1, 0, 0))
        .api_version(vk::API_VERSION_1_1);

    let mut extension_names = ash_window::enumerate_required_extensions(display_handle)
        .map_err(|e| UrcError::BackendFailure(format!("enumerate_required_extensions: {e}")))?
        .to_vec();

    let mut layer_names: Vec<*const i8> = Vec::new();
    let validation_layer = CString::new("VK_LAYER_KHRONOS_validation").unwrap();
    if debug_mode {
        let available = unsafe { entry.enumerate_instance_layer_properties() }
            .map_err(|e| UrcError::BackendFailure(format!("enumerate_instance_layer_properties: {e}")))?;
        let has_validation = available.iter().any(|l| {
            unsafe { CStr::from_ptr(l.layer_name.as_ptr()) } == validation_layer.as_c_str()
        });
        if has_validation {
            layer_names.push(validation_layer.as_ptr());
        } else {
            warn!("debug-mode requested but VK_LAYER_KHRONOS_validation is not installed");
        }
    }

    #[cfg(target_os = "macos")]
    extension_names.push(ash::khr::portability_enumeration::NAME.as_ptr());

    let create_info = vk::InstanceCreateInfo::default()
        .application_info(&app_info)
        .enabled_extension_names(&extension_names)
        .enabled_layer_names(&layer_names);

    unsafe { entry.create_instance(&create_info, None) }
        .map_err(|e| UrcError::BackendFailure(format!("create_instance: {e}")))
}

pub fn create_logical_device(instance: &ash::Instance, phy: &PhyDevice) -> UrcResult<(ash::Device, vk::Queue)> {
    let priorities = [1.0f32];
    let queue_info = vk::DeviceQueueCreateInfo::default()
        .queue_family_index(phy.queue_family_index)
        .queue_priorities(&priorities);
    let queue_infos = [queue_info];

    let extension_names = [ash::khr::swapchain::NAME.as_ptr()];
    let features = vk::PhysicalDeviceFeatures::default();

    let create_info = vk::DeviceCreateInfo::default()
        .queue_create_infos(&queue_infos)
        .enabled_extension_names(&extension_names)
        .enabled_features(&features);

    let device = unsafe { instance.create_device(phy.handle, &create_info, None) }
        .map_err(|e| UrcError::BackendFailure(format!("create_device: {e}")))?;
    let queue = unsafe { device.get_device_queue(phy.queue_family_index, 0) };
    Ok((device, queue))
}
