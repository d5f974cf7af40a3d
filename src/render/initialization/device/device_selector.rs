use ash::vk;

use crate::{
  render::{
    initialization::{Surface, SurfaceError},
    REQUIRED_DEVICE_EXTENSIONS, TARGET_API_VERSION,
  },
  utility,
};

use super::{queues::QueueFamilyError, vendor::Vendor, QueueFamilies};

pub struct DeviceCandidate {
  pub handle: vk::PhysicalDevice,
  pub properties: vk::PhysicalDeviceProperties,
  pub features: vk::PhysicalDeviceFeatures,
  pub queue_families: QueueFamilies,
}

fn device_type_name(device_type: vk::PhysicalDeviceType) -> &'static str {
  match device_type {
    vk::PhysicalDeviceType::INTEGRATED_GPU => "Integrated GPU",
    vk::PhysicalDeviceType::DISCRETE_GPU => "Discrete GPU",
    vk::PhysicalDeviceType::VIRTUAL_GPU => "Virtual GPU",
    vk::PhysicalDeviceType::CPU => "CPU",
    _ => "Unknown",
  }
}

pub fn device_name(properties: &vk::PhysicalDeviceProperties) -> String {
  properties
    .device_name_as_c_str()
    .map(utility::c_str_to_string)
    .unwrap_or_else(|_| "<invalid name>".to_owned())
}

fn log_device_properties(properties: &vk::PhysicalDeviceProperties) {
  let vendor = Vendor::from_id(properties.vendor_id);
  let driver_version = vendor.parse_driver_version(properties.driver_version);

  log::info!(
    "\nFound physical device \"{}\":
      API Version: {},
      Vendor: {},
      Driver Version: {},
      ID: {},
      Type: {},",
    device_name(properties),
    utility::parse_vulkan_api_version(properties.api_version),
    vendor,
    driver_version,
    properties.device_id,
    device_type_name(properties.device_type),
  );
}

fn missing_device_extensions(available: &mut [String]) -> Box<[String]> {
  utility::not_in_slice(
    available,
    &mut REQUIRED_DEVICE_EXTENSIONS.iter().copied(),
    |a, b| a.as_bytes().cmp(b.to_bytes()),
  )
  .iter()
  .map(|&name| utility::c_str_to_string(name))
  .collect()
}

fn supports_required_extensions(
  instance: &ash::Instance,
  physical_device: vk::PhysicalDevice,
) -> Result<bool, vk::Result> {
  let properties = unsafe { instance.enumerate_device_extension_properties(physical_device) }?;
  let mut available: Vec<String> = properties
    .iter()
    .filter_map(|props| props.extension_name_as_c_str().ok())
    .map(utility::c_str_to_string)
    .collect();

  let missing = missing_device_extensions(&mut available);
  if !missing.is_empty() {
    log::info!("Physical device is missing extensions: {:?}", missing);
  }
  Ok(missing.is_empty())
}

fn supports_swapchain(
  physical_device: vk::PhysicalDevice,
  surface: &Surface,
) -> Result<bool, SurfaceError> {
  let formats = unsafe { surface.get_formats(physical_device) }?;
  let present_modes = unsafe { surface.get_present_modes(physical_device) }?;

  Ok(!formats.is_empty() && !present_modes.is_empty())
}

#[derive(Debug, thiserror::Error)]
enum CheckError {
  #[error("Failed to query device extensions: {0:?}")]
  Enumeration(vk::Result),
  #[error("Surface error")]
  Surface(#[source] SurfaceError),
}

fn is_physical_device_suitable(
  instance: &ash::Instance,
  surface: &Surface,
  physical_device: vk::PhysicalDevice,
  properties: &vk::PhysicalDeviceProperties,
) -> Result<bool, CheckError> {
  if properties.api_version < TARGET_API_VERSION {
    log::info!(
      "Skipped physical device: Device API version is less than targeted by the application"
    );
    return Ok(false);
  }

  if !supports_required_extensions(instance, physical_device).map_err(CheckError::Enumeration)? {
    log::info!("Skipped physical device: Device does not support required extensions");
    return Ok(false);
  }

  if !supports_swapchain(physical_device, surface).map_err(CheckError::Surface)? {
    log::info!("Skipped physical device: Device has no surface formats or present modes");
    return Ok(false);
  }

  Ok(true)
}

// lower is better
// device type dominates, then shared graphics / presentation families, then anisotropy support
pub fn device_score(
  device_type: vk::PhysicalDeviceType,
  queue_families: &QueueFamilies,
  supports_anisotropy: bool,
) -> u32 {
  let type_score = match device_type {
    vk::PhysicalDeviceType::DISCRETE_GPU => 0,
    vk::PhysicalDeviceType::INTEGRATED_GPU => 1,
    vk::PhysicalDeviceType::VIRTUAL_GPU => 2,
    vk::PhysicalDeviceType::CPU => 3,
    _ => 4,
  };
  let separate_families = if queue_families.is_shared() { 0 } else { 1 };
  let no_anisotropy = if supports_anisotropy { 0 } else { 1 };

  (type_score << 2) + (separate_families << 1) + no_anisotropy
}

pub unsafe fn select_physical_device(
  instance: &ash::Instance,
  surface: &Surface,
) -> Result<Option<DeviceCandidate>, vk::Result> {
  Ok(
    instance
      .enumerate_physical_devices()?
      .into_iter()
      .filter_map(|physical_device| {
        let properties = instance.get_physical_device_properties(physical_device);
        log_device_properties(&properties);

        match is_physical_device_suitable(instance, surface, physical_device, &properties) {
          Ok(true) => Some((physical_device, properties)),
          Ok(false) => None,
          Err(err) => {
            log::error!("Device selection error: {:?}", err);
            None
          }
        }
      })
      .filter_map(|(physical_device, properties)| {
        match QueueFamilies::get_from_physical_device(instance, physical_device, surface) {
          Ok(queue_families) => Some(DeviceCandidate {
            handle: physical_device,
            properties,
            features: instance.get_physical_device_features(physical_device),
            queue_families,
          }),
          Err(QueueFamilyError::DoesNotSupportRequiredQueueFamilies) => {
            log::info!("Skipped physical device: Device does not contain required queue families");
            None
          }
          Err(QueueFamilyError::SurfaceError(err)) => {
            log::error!(
              "Device selection error during queue family retrieval: {:?}",
              err
            );
            None
          }
        }
      })
      .min_by_key(|candidate| {
        device_score(
          candidate.properties.device_type,
          &candidate.queue_families,
          candidate.features.sampler_anisotropy == vk::TRUE,
        )
      }),
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  const SHARED: QueueFamilies = QueueFamilies {
    graphics: 0,
    presentation: 0,
  };
  const SEPARATE: QueueFamilies = QueueFamilies {
    graphics: 0,
    presentation: 1,
  };

  #[test]
  fn device_type_dominates_the_score() {
    let discrete = device_score(vk::PhysicalDeviceType::DISCRETE_GPU, &SEPARATE, false);
    let integrated = device_score(vk::PhysicalDeviceType::INTEGRATED_GPU, &SHARED, true);
    let cpu = device_score(vk::PhysicalDeviceType::CPU, &SHARED, true);
    assert!(discrete < integrated);
    assert!(integrated < cpu);
  }

  #[test]
  fn shared_families_and_anisotropy_break_ties() {
    let ty = vk::PhysicalDeviceType::INTEGRATED_GPU;
    let best = device_score(ty, &SHARED, true);
    let no_anisotropy = device_score(ty, &SHARED, false);
    let separate = device_score(ty, &SEPARATE, true);
    assert!(best < no_anisotropy);
    assert!(no_anisotropy < separate);
  }

  #[test]
  fn swapchain_extension_is_required() {
    let mut available = vec!["VK_KHR_maintenance1".to_owned()];
    assert_eq!(
      missing_device_extensions(&mut available).as_ref(),
      &["VK_KHR_swapchain".to_owned()]
    );

    let mut available = vec!["VK_KHR_swapchain".to_owned(), "VK_KHR_maintenance1".to_owned()];
    assert!(missing_device_extensions(&mut available).is_empty());
  }

  #[test]
  fn names_device_types() {
    assert_eq!(
      device_type_name(vk::PhysicalDeviceType::DISCRETE_GPU),
      "Discrete GPU"
    );
    assert_eq!(device_type_name(vk::PhysicalDeviceType::OTHER), "Unknown");
  }
}
