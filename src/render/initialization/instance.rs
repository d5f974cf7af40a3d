use ash::vk;
use raw_window_handle::RawDisplayHandle;
use std::ffi::{c_char, CStr};

use crate::{
  render::{errors::OutOfMemoryError, TARGET_API_VERSION},
  utility, APPLICATION_NAME, APPLICATION_VERSION,
};

#[derive(Debug, thiserror::Error)]
pub enum InstanceCreationError {
  #[error("Vulkan implementation only supports API version {0}, which is lower than the one targeted by the application")]
  UnsupportedApiVersion(String),

  #[error("Some instance extensions are strictly required but unavailable: {0:?}")]
  MissingExtensions(Box<[String]>),

  #[error("Validation layers requested, but not available: {0:?}")]
  MissingLayers(Box<[String]>),

  #[error("Requested layer is not present")]
  LayerNotPresent,

  #[error("No Vulkan compatible driver was found")]
  IncompatibleDriver,

  #[error("Out of memory")]
  OutOfMemory(#[source] OutOfMemoryError),

  #[error("Instance creation failed with {0:?}")]
  Unknown(vk::Result),
}

impl From<vk::Result> for InstanceCreationError {
  fn from(value: vk::Result) -> Self {
    match value {
      vk::Result::ERROR_OUT_OF_HOST_MEMORY | vk::Result::ERROR_OUT_OF_DEVICE_MEMORY => {
        InstanceCreationError::OutOfMemory(value.into())
      }
      vk::Result::ERROR_LAYER_NOT_PRESENT => InstanceCreationError::LayerNotPresent,
      vk::Result::ERROR_INCOMPATIBLE_DRIVER => InstanceCreationError::IncompatibleDriver,
      other => InstanceCreationError::Unknown(other),
    }
  }
}

impl From<OutOfMemoryError> for InstanceCreationError {
  fn from(value: OutOfMemoryError) -> Self {
    InstanceCreationError::OutOfMemory(value)
  }
}

// Checks if all required extensions exist and are supported by the host system
// Returns unavailable extensions as an error
fn check_instance_extension_support(
  entry: &ash::Entry,
  required_extensions: &[&CStr],
) -> Result<(), InstanceCreationError> {
  log::info!(
    "Required Instance extensions by the application: {:?}",
    required_extensions
  );

  let properties = unsafe { entry.enumerate_instance_extension_properties(None) }?;
  let mut available: Vec<String> = properties
    .iter()
    .filter_map(|props| match props.extension_name_as_c_str() {
      Ok(s) => Some(utility::c_str_to_string(s)),
      Err(_) => {
        log::warn!(
          "There exists an available extension with an invalid name that couldn't be decoded"
        );
        None
      }
    })
    .collect();

  log::debug!("Available Instance extensions: {:?}", available);

  let unavailable = missing_extensions(available.as_mut_slice(), required_extensions);
  if unavailable.is_empty() {
    Ok(())
  } else {
    Err(InstanceCreationError::MissingExtensions(unavailable))
  }
}

fn missing_extensions(available: &mut [String], required: &[&CStr]) -> Box<[String]> {
  utility::not_in_slice(available, &mut required.iter().copied(), |a, b| {
    a.as_bytes().cmp(b.to_bytes())
  })
  .iter()
  .map(|&name| utility::c_str_to_string(name))
  .collect()
}

fn check_target_api_version(entry: &ash::Entry) -> Result<(), InstanceCreationError> {
  let max_supported_version = match unsafe { entry.try_enumerate_instance_version() } {
    // Vulkan 1.1+
    Ok(opt) => opt.unwrap_or(vk::API_VERSION_1_0),
    // Vulkan 1.0
    Err(_) => vk::API_VERSION_1_0,
  };

  log::info!(
    "Vulkan library max supported version: {}",
    utility::parse_vulkan_api_version(max_supported_version)
  );

  if max_supported_version < TARGET_API_VERSION {
    return Err(InstanceCreationError::UnsupportedApiVersion(
      utility::parse_vulkan_api_version(max_supported_version),
    ));
  }
  Ok(())
}

fn get_app_info<'a>() -> vk::ApplicationInfo<'a> {
  vk::ApplicationInfo::default()
    .api_version(TARGET_API_VERSION)
    .application_name(APPLICATION_NAME)
    .application_version(APPLICATION_VERSION)
    .engine_name(c"No Engine")
    .engine_version(vk::make_api_version(0, 1, 0, 0))
}

fn get_required_extensions(
  display_handle: RawDisplayHandle,
) -> Result<Vec<&'static CStr>, InstanceCreationError> {
  #[allow(unused_mut)]
  let mut required_extensions = Vec::new();

  #[cfg(feature = "vl")]
  required_extensions.push(ash::ext::debug_utils::NAME);

  let surface_extensions = ash_window::enumerate_required_extensions(display_handle)?
    .iter()
    .map(|&ptr| unsafe { CStr::from_ptr(ptr) });
  required_extensions.extend(surface_extensions);

  Ok(required_extensions)
}

#[cfg(feature = "vl")]
pub fn create_instance(
  entry: &ash::Entry,
  display_handle: RawDisplayHandle,
) -> Result<(ash::Instance, super::DebugUtils), InstanceCreationError> {
  use crate::{render::device_destroyable::ManuallyDestroyed, utility::OnErr};

  check_target_api_version(entry)?;

  let required_extensions = get_required_extensions(display_handle)?;
  check_instance_extension_support(entry, &required_extensions)?;
  // required to be alive until the end of instance creation
  let required_extensions_ptr: Vec<*const c_char> =
    required_extensions.iter().map(|v| v.as_ptr()).collect();

  let app_info = get_app_info();

  // valid until the end of scope
  let validation_layers = super::get_validation_layers(entry)?;
  let vl_pointers: Vec<*const c_char> =
    validation_layers.iter().map(|name| name.as_ptr()).collect();

  // passing the messenger create info in the instance p_next chain covers messages emitted
  // during instance creation and destruction
  let mut debug_create_info = super::DebugUtils::get_debug_messenger_create_info();

  let create_info = vk::InstanceCreateInfo::default()
    .application_info(&app_info)
    .enabled_layer_names(&vl_pointers)
    .enabled_extension_names(&required_extensions_ptr)
    .push_next(&mut debug_create_info);

  log::debug!("Creating Instance");
  let instance: ash::Instance = unsafe { entry.create_instance(&create_info, None) }?;

  log::debug!("Creating Debug Utils");
  let debug_create_info = super::DebugUtils::get_debug_messenger_create_info();
  let debug_utils = super::DebugUtils::create(entry, &instance, &debug_create_info)
    .on_err(|_| unsafe { instance.destroy_self() })?;

  Ok((instance, debug_utils))
}

#[cfg(not(feature = "vl"))]
pub fn create_instance(
  entry: &ash::Entry,
  display_handle: RawDisplayHandle,
) -> Result<ash::Instance, InstanceCreationError> {
  check_target_api_version(entry)?;

  let required_extensions = get_required_extensions(display_handle)?;
  check_instance_extension_support(entry, &required_extensions)?;
  let required_extensions_ptr: Vec<*const c_char> =
    required_extensions.iter().map(|v| v.as_ptr()).collect();

  let app_info = get_app_info();

  let create_info = vk::InstanceCreateInfo::default()
    .application_info(&app_info)
    .enabled_extension_names(&required_extensions_ptr);

  log::debug!("Creating Instance");
  unsafe { entry.create_instance(&create_info, None) }.map_err(|err| err.into())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn reports_missing_extensions_by_name() {
    let mut available = vec!["VK_KHR_surface".to_owned(), "VK_KHR_xlib_surface".to_owned()];
    let required = [c"VK_KHR_surface", c"VK_EXT_debug_utils"];

    let missing = missing_extensions(&mut available, &required);
    assert_eq!(missing.as_ref(), &["VK_EXT_debug_utils".to_owned()]);
  }

  #[test]
  fn all_extensions_present() {
    let mut available = vec!["VK_KHR_surface".to_owned(), "VK_EXT_debug_utils".to_owned()];
    let required = [c"VK_EXT_debug_utils", c"VK_KHR_surface"];
    assert!(missing_extensions(&mut available, &required).is_empty());
  }

  #[test]
  fn classifies_creation_results() {
    assert!(matches!(
      InstanceCreationError::from(vk::Result::ERROR_INCOMPATIBLE_DRIVER),
      InstanceCreationError::IncompatibleDriver
    ));
    assert!(matches!(
      InstanceCreationError::from(vk::Result::ERROR_OUT_OF_HOST_MEMORY),
      InstanceCreationError::OutOfMemory(OutOfMemoryError::OutOfHostMemory)
    ));
    assert!(matches!(
      InstanceCreationError::from(vk::Result::ERROR_EXTENSION_NOT_PRESENT),
      InstanceCreationError::Unknown(vk::Result::ERROR_EXTENSION_NOT_PRESENT)
    ));
  }

  #[test]
  fn app_info_targets_configured_version() {
    let info = get_app_info();
    assert_eq!(info.api_version, TARGET_API_VERSION);
    assert_eq!(info.application_version, APPLICATION_VERSION);
  }
}
