use ash::vk;

use crate::render::{device_destroyable::DeviceManuallyDestroyed, errors::OutOfMemoryError};

pub fn create_semaphore(device: &ash::Device) -> Result<vk::Semaphore, OutOfMemoryError> {
  let create_info = vk::SemaphoreCreateInfo::default();
  unsafe { device.create_semaphore(&create_info, None) }.map_err(|err| err.into())
}

pub fn create_semaphores(
  device: &ash::Device,
  count: usize,
) -> Result<Box<[vk::Semaphore]>, OutOfMemoryError> {
  let mut semaphores = Vec::with_capacity(count);
  for _ in 0..count {
    match create_semaphore(device) {
      Ok(semaphore) => semaphores.push(semaphore),
      Err(err) => {
        unsafe { semaphores.destroy_self(device) };
        return Err(err);
      }
    }
  }
  Ok(semaphores.into_boxed_slice())
}

pub fn create_fence(
  device: &ash::Device,
  flags: vk::FenceCreateFlags,
) -> Result<vk::Fence, OutOfMemoryError> {
  let create_info = vk::FenceCreateInfo::default().flags(flags);
  unsafe { device.create_fence(&create_info, None) }.map_err(|err| err.into())
}

pub fn create_buffer(
  device: &ash::Device,
  size: u64,
  usage: vk::BufferUsageFlags,
) -> Result<vk::Buffer, OutOfMemoryError> {
  let create_info = vk::BufferCreateInfo::default()
    .size(size)
    .usage(usage)
    .sharing_mode(vk::SharingMode::EXCLUSIVE);
  unsafe { device.create_buffer(&create_info, None) }.map_err(|err| err.into())
}

pub fn create_image(
  device: &ash::Device,
  format: vk::Format,
  width: u32,
  height: u32,
  usage: vk::ImageUsageFlags,
) -> Result<vk::Image, OutOfMemoryError> {
  // 1 color layer 2d image
  let create_info = vk::ImageCreateInfo::default()
    .image_type(vk::ImageType::TYPE_2D)
    .format(format)
    .extent(vk::Extent3D {
      width,
      height,
      depth: 1,
    })
    .mip_levels(1)
    .array_layers(1)
    .samples(vk::SampleCountFlags::TYPE_1)
    .tiling(vk::ImageTiling::OPTIMAL)
    .usage(usage)
    .sharing_mode(vk::SharingMode::EXCLUSIVE)
    .initial_layout(vk::ImageLayout::UNDEFINED);

  unsafe { device.create_image(&create_info, None) }.map_err(|err| err.into())
}

pub const COLOR_SUBRESOURCE_RANGE: vk::ImageSubresourceRange = vk::ImageSubresourceRange {
  aspect_mask: vk::ImageAspectFlags::COLOR,
  base_mip_level: 0,
  level_count: 1,
  base_array_layer: 0,
  layer_count: 1,
};

pub fn create_image_view(
  device: &ash::Device,
  image: vk::Image,
  format: vk::Format,
) -> Result<vk::ImageView, OutOfMemoryError> {
  let create_info = vk::ImageViewCreateInfo::default()
    .image(image)
    .view_type(vk::ImageViewType::TYPE_2D)
    .format(format)
    .components(vk::ComponentMapping {
      r: vk::ComponentSwizzle::IDENTITY,
      g: vk::ComponentSwizzle::IDENTITY,
      b: vk::ComponentSwizzle::IDENTITY,
      a: vk::ComponentSwizzle::IDENTITY,
    })
    .subresource_range(COLOR_SUBRESOURCE_RANGE);

  unsafe {
    device
      .create_image_view(&create_info, None)
      .map_err(|err| err.into())
  }
}
