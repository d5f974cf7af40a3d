use std::ops::Deref;

use ash::vk;
use winit::dpi::PhysicalSize;

use crate::{utility::OnErr, PREFERRED_PRESENTATION_METHOD};

use super::{
  create_objs::create_image_view,
  device_destroyable::DeviceManuallyDestroyed,
  errors::{error_chain_fmt, OutOfMemoryError},
  initialization::{
    device::{PhysicalDevice, QueueFamilies},
    Surface, SurfaceError,
  },
};

#[derive(thiserror::Error)]
pub enum SwapchainCreationError {
  #[error("Out of memory")]
  OutOfMemory(#[source] OutOfMemoryError),

  #[error("Device is lost")]
  DeviceIsLost,
  #[error("Surface is lost and no longer available")]
  SurfaceIsLost,
  #[error("Surface reports no supported formats")]
  NoSurfaceFormats,
  #[error("Creation failed because of some other error: {0:?}")]
  Unknown(vk::Result),
}
impl std::fmt::Debug for SwapchainCreationError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    error_chain_fmt(self, f)
  }
}

#[derive(thiserror::Error)]
pub enum AcquireNextImageError {
  #[error("Swapchain is out of date and needs to be recreated")]
  OutOfDate,

  #[error("Out of memory")]
  OutOfMemory(#[source] OutOfMemoryError),

  #[error("Device is lost")]
  DeviceIsLost,
  #[error("Surface is lost and no longer available")]
  SurfaceIsLost,
  #[error("Unexpected result: {0:?}")]
  Unknown(vk::Result),
}
impl std::fmt::Debug for AcquireNextImageError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    error_chain_fmt(self, f)
  }
}

impl From<vk::Result> for SwapchainCreationError {
  fn from(value: vk::Result) -> Self {
    match value {
      vk::Result::ERROR_OUT_OF_HOST_MEMORY | vk::Result::ERROR_OUT_OF_DEVICE_MEMORY => {
        SwapchainCreationError::OutOfMemory(value.into())
      }
      vk::Result::ERROR_DEVICE_LOST => SwapchainCreationError::DeviceIsLost,
      vk::Result::ERROR_SURFACE_LOST_KHR => SwapchainCreationError::SurfaceIsLost,
      other => SwapchainCreationError::Unknown(other),
    }
  }
}

impl From<vk::Result> for AcquireNextImageError {
  fn from(value: vk::Result) -> Self {
    match value {
      vk::Result::ERROR_OUT_OF_DATE_KHR => AcquireNextImageError::OutOfDate,
      vk::Result::ERROR_OUT_OF_HOST_MEMORY | vk::Result::ERROR_OUT_OF_DEVICE_MEMORY => {
        AcquireNextImageError::OutOfMemory(value.into())
      }
      vk::Result::ERROR_DEVICE_LOST => AcquireNextImageError::DeviceIsLost,
      vk::Result::ERROR_SURFACE_LOST_KHR => AcquireNextImageError::SurfaceIsLost,
      other => AcquireNextImageError::Unknown(other),
    }
  }
}

impl From<OutOfMemoryError> for SwapchainCreationError {
  fn from(value: OutOfMemoryError) -> Self {
    SwapchainCreationError::OutOfMemory(value)
  }
}

impl From<SurfaceError> for SwapchainCreationError {
  fn from(value: SurfaceError) -> Self {
    match value {
      SurfaceError::OutOfMemory(err) => SwapchainCreationError::OutOfMemory(err),
      SurfaceError::SurfaceIsLost => SwapchainCreationError::SurfaceIsLost,
      SurfaceError::UnsupportedPlatform => {
        SwapchainCreationError::Unknown(vk::Result::ERROR_EXTENSION_NOT_PRESENT)
      }
      SurfaceError::Unknown(result) => SwapchainCreationError::Unknown(result),
    }
  }
}

// B8G8R8A8_SRGB with a nonlinear sRGB color space if available, otherwise the first one
pub fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> Option<vk::SurfaceFormatKHR> {
  formats
    .iter()
    .find(|available| {
      available.format == vk::Format::B8G8R8A8_SRGB
        && available.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
    })
    .or_else(|| formats.first())
    .copied()
}

// FIFO is always available
pub fn choose_present_mode(
  present_modes: &[vk::PresentModeKHR],
  preferred: vk::PresentModeKHR,
) -> vk::PresentModeKHR {
  if present_modes.contains(&preferred) {
    preferred
  } else {
    vk::PresentModeKHR::FIFO
  }
}

pub fn choose_extent(
  capabilities: &vk::SurfaceCapabilitiesKHR,
  window_size: PhysicalSize<u32>,
) -> vk::Extent2D {
  if let Some(extent) = Surface::get_extent_from_capabilities(capabilities) {
    return extent;
  }

  vk::Extent2D {
    width: window_size.width.clamp(
      capabilities.min_image_extent.width,
      capabilities.max_image_extent.width,
    ),
    height: window_size.height.clamp(
      capabilities.min_image_extent.height,
      capabilities.max_image_extent.height,
    ),
  }
}

// one more than the minimum, max_image_count of 0 means no limit
pub fn image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
  let count = capabilities.min_image_count + 1;
  if capabilities.max_image_count > 0 {
    count.min(capabilities.max_image_count)
  } else {
    count
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecreationChanges {
  pub format: bool,
  pub extent: bool,
}

pub struct Swapchains {
  loader: ash::khr::swapchain::Device,
  current: Swapchain,
}

impl Swapchains {
  pub fn new(
    instance: &ash::Instance,
    physical_device: &PhysicalDevice,
    device: &ash::Device,
    surface: &Surface,
    window_size: PhysicalSize<u32>,
  ) -> Result<Self, SwapchainCreationError> {
    let loader = ash::khr::swapchain::Device::new(instance, device);

    let current = Swapchain::create(
      physical_device,
      device,
      surface,
      &loader,
      window_size,
      vk::SwapchainKHR::null(),
    )?;

    Ok(Self { loader, current })
  }

  // returns (image index, suboptimal)
  pub unsafe fn acquire_next_image(
    &mut self,
    semaphore: vk::Semaphore,
  ) -> Result<(u32, bool), AcquireNextImageError> {
    self
      .loader
      .acquire_next_image(self.current.inner, u64::MAX, semaphore, vk::Fence::null())
      .map_err(AcquireNextImageError::from)
  }

  // the device must be idle, as the old swapchain gets destroyed immediately
  pub unsafe fn recreate(
    &mut self,
    physical_device: &PhysicalDevice,
    device: &ash::Device,
    surface: &Surface,
    window_size: PhysicalSize<u32>,
  ) -> Result<RecreationChanges, SwapchainCreationError> {
    let new = Swapchain::create(
      physical_device,
      device,
      surface,
      &self.loader,
      window_size,
      self.current.inner,
    )?;

    let changes = RecreationChanges {
      format: new.format != self.current.format,
      extent: new.extent != self.current.extent,
    };

    let old = std::mem::replace(&mut self.current, new);
    old.destroy_self(&self.loader, device);

    Ok(changes)
  }

  // returns true if the swapchain is suboptimal
  pub unsafe fn queue_present(
    &mut self,
    image_index: u32,
    present_queue: vk::Queue,
    wait_semaphores: &[vk::Semaphore],
  ) -> Result<bool, AcquireNextImageError> {
    let swapchains = [self.current.inner];
    let image_indices = [image_index];
    let present_info = vk::PresentInfoKHR::default()
      .wait_semaphores(wait_semaphores)
      .swapchains(&swapchains)
      .image_indices(&image_indices);

    self
      .loader
      .queue_present(present_queue, &present_info)
      .map_err(AcquireNextImageError::from)
  }

  pub fn get_format(&self) -> vk::Format {
    self.current.format
  }

  pub fn get_extent(&self) -> vk::Extent2D {
    self.current.extent
  }

  pub fn get_image_views(&self) -> &[vk::ImageView] {
    &self.current.image_views
  }
}

impl DeviceManuallyDestroyed for Swapchains {
  unsafe fn destroy_self(&self, device: &ash::Device) {
    self.current.destroy_self(&self.loader, device);
  }
}

#[derive(Debug)]
struct Swapchain {
  inner: vk::SwapchainKHR,
  image_views: Box<[vk::ImageView]>,
  format: vk::Format,
  extent: vk::Extent2D,
}

impl Deref for Swapchain {
  type Target = vk::SwapchainKHR;

  fn deref(&self) -> &Self::Target {
    &self.inner
  }
}

impl Swapchain {
  fn create(
    physical_device: &PhysicalDevice,
    device: &ash::Device,
    surface: &Surface,
    loader: &ash::khr::swapchain::Device,
    window_size: PhysicalSize<u32>,
    old_swapchain: vk::SwapchainKHR,
  ) -> Result<Self, SwapchainCreationError> {
    let capabilities = unsafe { surface.get_capabilities(**physical_device) }?;
    let formats = unsafe { surface.get_formats(**physical_device) }?;
    let present_modes = unsafe { surface.get_present_modes(**physical_device) }?;

    let image_format =
      choose_surface_format(&formats).ok_or(SwapchainCreationError::NoSurfaceFormats)?;
    let present_mode = choose_present_mode(&present_modes, PREFERRED_PRESENTATION_METHOD);
    let extent = choose_extent(&capabilities, window_size);

    log::info!(
      "Creating swapchain with ({}, {}) extent, {:?} format and {:?} present mode",
      extent.width,
      extent.height,
      image_format,
      present_mode
    );

    Self::create_with(
      device,
      &physical_device.queue_families,
      surface,
      loader,
      &capabilities,
      image_format,
      present_mode,
      extent,
      old_swapchain,
    )
  }

  #[allow(clippy::too_many_arguments)]
  fn create_with(
    device: &ash::Device,
    queue_families: &QueueFamilies,
    surface: &Surface,
    loader: &ash::khr::swapchain::Device,
    capabilities: &vk::SurfaceCapabilitiesKHR,
    image_format: vk::SurfaceFormatKHR,
    present_mode: vk::PresentModeKHR,
    extent: vk::Extent2D,
    old_swapchain: vk::SwapchainKHR,
  ) -> Result<Self, SwapchainCreationError> {
    let family_indices = [queue_families.graphics, queue_families.presentation];

    let mut create_info = vk::SwapchainCreateInfoKHR::default()
      .surface(**surface)
      .min_image_count(image_count(capabilities))
      .image_color_space(image_format.color_space)
      .image_format(image_format.format)
      .image_extent(extent)
      .image_array_layers(1)
      .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
      .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
      .pre_transform(capabilities.current_transform)
      .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
      .present_mode(present_mode)
      .clipped(true)
      .old_swapchain(old_swapchain);

    if !queue_families.is_shared() {
      create_info = create_info
        .image_sharing_mode(vk::SharingMode::CONCURRENT)
        .queue_family_indices(&family_indices);
    }

    let swapchain = unsafe { loader.create_swapchain(&create_info, None) }?;

    let images = unsafe { loader.get_swapchain_images(swapchain) }
      .map_err(OutOfMemoryError::from)
      .on_err(|_| unsafe { loader.destroy_swapchain(swapchain, None) })?;

    let mut image_views: Vec<vk::ImageView> = Vec::with_capacity(images.len());
    for &image in images.iter() {
      match create_image_view(device, image, image_format.format) {
        Ok(view) => image_views.push(view),
        Err(err) => unsafe {
          image_views.destroy_self(device);
          loader.destroy_swapchain(swapchain, None);
          return Err(err.into());
        },
      }
    }

    log::debug!(
      "Created swapchain with {} images and image views {:?}",
      images.len(),
      image_views
    );

    Ok(Self {
      inner: swapchain,
      image_views: image_views.into_boxed_slice(),
      format: image_format.format,
      extent,
    })
  }

  unsafe fn destroy_self(&self, loader: &ash::khr::swapchain::Device, device: &ash::Device) {
    self.image_views.destroy_self(device);
    loader.destroy_swapchain(self.inner, None);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn surface_format(format: vk::Format, color_space: vk::ColorSpaceKHR) -> vk::SurfaceFormatKHR {
    vk::SurfaceFormatKHR {
      format,
      color_space,
    }
  }

  fn capabilities(min: (u32, u32), max: (u32, u32)) -> vk::SurfaceCapabilitiesKHR {
    vk::SurfaceCapabilitiesKHR {
      current_extent: vk::Extent2D {
        width: u32::MAX,
        height: u32::MAX,
      },
      min_image_extent: vk::Extent2D {
        width: min.0,
        height: min.1,
      },
      max_image_extent: vk::Extent2D {
        width: max.0,
        height: max.1,
      },
      ..Default::default()
    }
  }

  #[test]
  fn prefers_srgb_bgra() {
    let formats = [
      surface_format(vk::Format::R8G8B8A8_UNORM, vk::ColorSpaceKHR::SRGB_NONLINEAR),
      surface_format(vk::Format::B8G8R8A8_SRGB, vk::ColorSpaceKHR::SRGB_NONLINEAR),
    ];
    assert_eq!(choose_surface_format(&formats), Some(formats[1]));
  }

  #[test]
  fn falls_back_to_first_format() {
    let formats = [
      surface_format(vk::Format::R8G8B8A8_UNORM, vk::ColorSpaceKHR::SRGB_NONLINEAR),
      surface_format(
        vk::Format::B8G8R8A8_SRGB,
        vk::ColorSpaceKHR::EXTENDED_SRGB_LINEAR_EXT,
      ),
    ];
    assert_eq!(choose_surface_format(&formats), Some(formats[0]));
    assert_eq!(choose_surface_format(&[]), None);
  }

  #[test]
  fn present_mode_falls_back_to_fifo() {
    let modes = [vk::PresentModeKHR::FIFO, vk::PresentModeKHR::MAILBOX];
    assert_eq!(
      choose_present_mode(&modes, vk::PresentModeKHR::MAILBOX),
      vk::PresentModeKHR::MAILBOX
    );
    assert_eq!(
      choose_present_mode(&modes[..1], vk::PresentModeKHR::MAILBOX),
      vk::PresentModeKHR::FIFO
    );
  }

  #[test]
  fn window_size_is_clamped() {
    let caps = capabilities((100, 100), (1920, 1080));
    assert_eq!(
      choose_extent(&caps, PhysicalSize::new(4000, 50)),
      vk::Extent2D {
        width: 1920,
        height: 100
      }
    );
    assert_eq!(
      choose_extent(&caps, PhysicalSize::new(800, 600)),
      vk::Extent2D {
        width: 800,
        height: 600
      }
    );
  }

  #[test]
  fn fixed_surface_extent_wins() {
    let mut caps = capabilities((1, 1), (4096, 4096));
    caps.current_extent = vk::Extent2D {
      width: 640,
      height: 480,
    };
    assert_eq!(
      choose_extent(&caps, PhysicalSize::new(800, 600)),
      vk::Extent2D {
        width: 640,
        height: 480
      }
    );
  }

  #[test]
  fn image_count_respects_maximum() {
    let mut caps = capabilities((1, 1), (1, 1));
    caps.min_image_count = 2;
    caps.max_image_count = 0;
    assert_eq!(image_count(&caps), 3);

    caps.max_image_count = 2;
    assert_eq!(image_count(&caps), 2);
  }

  #[test]
  fn out_of_date_is_distinguished() {
    assert!(matches!(
      AcquireNextImageError::from(vk::Result::ERROR_OUT_OF_DATE_KHR),
      AcquireNextImageError::OutOfDate
    ));
    assert!(matches!(
      AcquireNextImageError::from(vk::Result::ERROR_SURFACE_LOST_KHR),
      AcquireNextImageError::SurfaceIsLost
    ));
  }
}
