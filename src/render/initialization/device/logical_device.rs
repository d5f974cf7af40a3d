use ash::vk;
use std::ffi::c_char;

use crate::render::REQUIRED_DEVICE_EXTENSIONS;

use super::{PhysicalDevice, Queues};

pub fn create_logical_device(
  instance: &ash::Instance,
  physical_device: &PhysicalDevice,
) -> Result<(ash::Device, Queues), vk::Result> {
  let queue_create_infos = Queues::get_queue_create_infos(&physical_device.queue_families);

  let device_extensions_pointers: Vec<*const c_char> = REQUIRED_DEVICE_EXTENSIONS
    .iter()
    .map(|s| s.as_ptr())
    .collect();

  let features = vk::PhysicalDeviceFeatures::default()
    .sampler_anisotropy(physical_device.max_anisotropy.is_some());

  let create_info = vk::DeviceCreateInfo::default()
    .queue_create_infos(&queue_create_infos)
    .enabled_extension_names(&device_extensions_pointers)
    .enabled_features(&features);

  log::info!("Creating logical device");
  let device: ash::Device =
    unsafe { instance.create_device(**physical_device, &create_info, None) }?;

  log::debug!("Retrieving queues");
  let queues = unsafe { Queues::retrieve(&device, &physical_device.queue_families) };

  Ok((device, queues))
}
