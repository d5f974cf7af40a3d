use std::ops::Deref;

use ash::vk;

use crate::render::initialization::Surface;

use super::{
  device_selector::{device_name, select_physical_device},
  QueueFamilies,
};

// Saves physical device additional information in order to not query it multiple times
pub struct PhysicalDevice {
  inner: vk::PhysicalDevice,
  pub queue_families: QueueFamilies,
  pub mem_properties: vk::PhysicalDeviceMemoryProperties,
  // max sampler anisotropy if anisotropic filtering is supported
  pub max_anisotropy: Option<f32>,
}

impl Deref for PhysicalDevice {
  type Target = vk::PhysicalDevice;

  fn deref(&self) -> &Self::Target {
    &self.inner
  }
}

impl PhysicalDevice {
  pub unsafe fn select(
    instance: &ash::Instance,
    surface: &Surface,
  ) -> Result<Option<PhysicalDevice>, vk::Result> {
    let candidate = match select_physical_device(instance, surface)? {
      Some(candidate) => candidate,
      None => return Ok(None),
    };

    let name = device_name(&candidate.properties);
    log::info!("Using physical device \"{}\"", name);
    log::debug!("Selected queue families: {:?}", candidate.queue_families);

    let mem_properties = instance.get_physical_device_memory_properties(candidate.handle);
    log::debug!("Memory properties: {:#?}", mem_properties);

    let max_anisotropy = if candidate.features.sampler_anisotropy == vk::TRUE {
      Some(candidate.properties.limits.max_sampler_anisotropy)
    } else {
      log::warn!("Physical device does not support anisotropic filtering");
      None
    };

    Ok(Some(PhysicalDevice {
      inner: candidate.handle,
      queue_families: candidate.queue_families,
      mem_properties,
      max_anisotropy,
    }))
  }

  pub fn memory_types(&self) -> &[vk::MemoryType] {
    &self.mem_properties.memory_types[0..(self.mem_properties.memory_type_count as usize)]
  }
}
