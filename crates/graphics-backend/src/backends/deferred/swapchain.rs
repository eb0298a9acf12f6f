use ash::vk;
use graphics_types::error::{UrcError, UrcResult};
use log::warn;

use super::device::PhyDevice;

/// The swapchain plus the per-image views and framebuffers the render-pass
/// needs to present into. Rebuilt wholesale on resize and on `surface-lost`
/// recovery (spec.md §7); grounded in the teacher's `swapchain.rs` — same
/// present-mode fallback ladder (FIFO/IMMEDIATE -> FIFO_RELAXED/MAILBOX ->
/// first available) and the same "undefined extent means use the window
/// size, clamped" rule for `current_extent`.
pub struct Swapchain {
    pub loader: ash::khr::swapchain::Device,
    pub handle: vk::SwapchainKHR,
    pub format: vk::Format,
    pub extent: vk::Extent2D,
    pub images: Vec<vk::Image>,
    pub views: Vec<vk::ImageView>,
}

impl Swapchain {
    pub fn new(
        instance: &ash::Instance,
        device: &ash::Device,
        phy: &PhyDevice,
        surface_loader: &ash::khr::surface::Instance,
        surface: vk::SurfaceKHR,
        window_size: (u32, u32),
        vsync: bool,
        old: Option<vk::SwapchainKHR>,
    ) -> UrcResult<Self> {
        let caps = unsafe { surface_loader.get_physical_device_surface_capabilities(phy.handle, surface) }
            .map_err(|e| {
                warn!("get_physical_device_surface_capabilities: {e}");
                UrcError::SurfaceLost
            })?;
        let formats = unsafe { surface_loader.get_physical_device_surface_formats(phy.handle, surface) }
            .map_err(|e| {
                warn!("get_physical_device_surface_formats: {e}");
                UrcError::SurfaceLost
            })?;
        let present_modes =
            unsafe { surface_loader.get_physical_device_surface_present_modes(phy.handle, surface) }.map_err(|e| {
                warn!("get_physical_device_surface_present_modes: {e}");
                UrcError::SurfaceLost
            })?;

        let surface_format = formats
            .iter()
            .find(|f| f.format == vk::Format::B8G8R8A8_UNORM || f.format == vk::Format::R8G8B8A8_UNORM)
            .copied()
            .or_else(|| formats.first().copied())
            .ok_or_else(|| {
                warn!("surface reports no formats");
                UrcError::SurfaceLost
            })?;

        let present_mode = Self::pick_present_mode(&present_modes, vsync);

        let extent = if caps.current_extent.width != u32::MAX {
            caps.current_extent
        } else {
            vk::Extent2D {
                width: window_size.0.clamp(caps.min_image_extent.width, caps.max_image_extent.width.max(1)),
                height: window_size.1.clamp(caps.min_image_extent.height, caps.max_image_extent.height.max(1)),
            }
        };
        if extent.width == 0 || extent.height == 0 {
            warn!("surface extent is zero");
            return Err(UrcError::SurfaceLost);
        }

        let mut image_count = caps.min_image_count + 1;
        if caps.max_image_count > 0 {
            image_count = image_count.min(caps.max_image_count);
        }

        let create_info = vk::SwapchainCreateInfoKHR::default()
            .surface(surface)
            .min_image_count(image_count)
            .image_format(surface_format.format)
            .image_color_space(surface_format.color_space)
            .image_extent(extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::TRANSFER_DST)
            .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            .pre_transform(caps.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(present_mode)
            .clipped(true)
            .old_swapchain(old.unwrap_or(vk::SwapchainKHR::null()));

        let loader = ash::khr::swapchain::Device::new(instance, device);
        let handle = unsafe { loader.create_swapchain(&create_info, None) }.map_err(|e| {
            warn!("create_swapchain: {e}");
            UrcError::SurfaceLost
        })?;

        let images = unsafe { loader.get_swapchain_images(handle) }
            .map_err(|e| UrcError::BackendFailure(format!("get_swapchain_images: {e}")))?;

        let mut views = Vec::with_capacity(images.len());
        for image in &images {
            let view_info = vk::ImageViewCreateInfo::default()
                .image(*image)
                .view_type(vk::ImageViewType::TYPE_2D)
                .format(surface_format.format)
                .subresource_range(vk::ImageSubresourceRange {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    base_mip_level: 0,
                    level_count: 1,
                    base_array_layer: 0,
                    layer_count: 1,
                });
            let view = unsafe { device.create_image_view(&view_info, None) }
                .map_err(|e| UrcError::BackendFailure(format!("create_image_view: {e}")))?;
            views.push(view);
        }

        Ok(Self {
            loader,
            handle,
            format: surface_format.format,
            extent,
            images,
            views,
        })
    }

    fn pick_present_mode(available: &[vk::PresentModeKHR], vsync: bool) -> vk::PresentModeKHR {
        let preferred = if vsync { vk::PresentModeKHR::FIFO } else { vk::PresentModeKHR::IMMEDIATE };
        if available.contains(&preferred) {
            return preferred;
        }
        let fallback = if vsync { vk::PresentModeKHR::FIFO_RELAXED } else { vk::PresentModeKHR::MAILBOX };
        if available.contains(&fallback) {
            return fallback;
        }
        warn!("requested present mode unavailable, using first reported mode");
        available.first().copied().unwrap_or(vk::PresentModeKHR::FIFO)
    }

    pub unsafe fn destroy(&self, device: &ash::Device) {
        for view in &self.views {
            device.destroy_image_view(*view, None);
        }
        self.loader.destroy_swapchain(self.handle, None);
    }
}
