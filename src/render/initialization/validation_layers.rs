use ash::vk;

use std::{borrow::Cow, ffi::CStr, os::raw::c_void, ptr};

use crate::{
  render::{device_destroyable::ManuallyDestroyed, errors::OutOfMemoryError, VALIDATION_LAYERS},
  utility,
};

use super::InstanceCreationError;

// splits requested layers into (available, unavailable)
fn filter_supported<'a>(
  requested: &[&'a CStr],
  available: &[&CStr],
) -> (Vec<&'a CStr>, Vec<&'a CStr>) {
  requested
    .iter()
    .copied()
    .partition(|&req| available.iter().any(|&av| av == req))
}

// every requested layer has to be available, otherwise returns the missing names
fn require_layers<'a>(
  requested: &[&'a CStr],
  available: &[&CStr],
) -> Result<Vec<&'a CStr>, Box<[String]>> {
  let (supported, unsupported) = filter_supported(requested, available);
  if unsupported.is_empty() {
    Ok(supported)
  } else {
    Err(
      unsupported
        .into_iter()
        .map(utility::c_str_to_string)
        .collect(),
    )
  }
}

// returns VALIDATION_LAYERS if all of them are available
pub fn get_validation_layers(
  entry: &ash::Entry,
) -> Result<Box<[&'static CStr]>, InstanceCreationError> {
  log::info!("Querying Vulkan instance layers");
  let properties = unsafe { entry.enumerate_instance_layer_properties() }?;
  let available_names: Vec<&CStr> = properties
    .iter()
    .filter_map(|props| props.layer_name_as_c_str().ok())
    .collect();
  log::debug!("Available instance layers: {:?}", available_names);

  match require_layers(&VALIDATION_LAYERS, &available_names) {
    Ok(layers) => Ok(layers.into_boxed_slice()),
    Err(missing) => {
      log::error!("Validation layers requested, but not available: {:?}", missing);
      Err(InstanceCreationError::MissingLayers(missing))
    }
  }
}

fn message_type_label(message_type: vk::DebugUtilsMessageTypeFlagsEXT) -> &'static str {
  match message_type {
    vk::DebugUtilsMessageTypeFlagsEXT::GENERAL => "[General]",
    vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE => "[Performance]",
    vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION => "[Validation]",
    _ => "[Unknown]",
  }
}

fn severity_log_level(severity: vk::DebugUtilsMessageSeverityFlagsEXT) -> log::Level {
  match severity {
    vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE => log::Level::Debug,
    vk::DebugUtilsMessageSeverityFlagsEXT::INFO => log::Level::Info,
    vk::DebugUtilsMessageSeverityFlagsEXT::WARNING => log::Level::Warn,
    vk::DebugUtilsMessageSeverityFlagsEXT::ERROR => log::Level::Error,
    _ => log::Level::Warn,
  }
}

unsafe extern "system" fn vulkan_debug_utils_callback(
  message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
  message_type: vk::DebugUtilsMessageTypeFlagsEXT,
  p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
  _p_user_data: *mut c_void,
) -> vk::Bool32 {
  let message: Cow<str> = if p_callback_data.is_null() || (*p_callback_data).p_message.is_null() {
    "<no message>".into()
  } else {
    CStr::from_ptr((*p_callback_data).p_message).to_string_lossy()
  };
  log::log!(
    target: "vulkan",
    severity_log_level(message_severity),
    "{} {}",
    message_type_label(message_type),
    message
  );

  // the call that triggered the message should not be aborted
  vk::FALSE
}

pub struct DebugUtils {
  loader: ash::ext::debug_utils::Instance,
  messenger: vk::DebugUtilsMessengerEXT,
}

impl DebugUtils {
  pub fn create(
    entry: &ash::Entry,
    instance: &ash::Instance,
    create_info: &vk::DebugUtilsMessengerCreateInfoEXT,
  ) -> Result<Self, OutOfMemoryError> {
    let loader = ash::ext::debug_utils::Instance::new(entry, instance);

    let messenger = unsafe { loader.create_debug_utils_messenger(create_info, None) }?;

    Ok(Self { loader, messenger })
  }

  pub fn get_debug_messenger_create_info<'a>() -> vk::DebugUtilsMessengerCreateInfoEXT<'a> {
    vk::DebugUtilsMessengerCreateInfoEXT {
      flags: vk::DebugUtilsMessengerCreateFlagsEXT::empty(),
      message_severity: vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
        | vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE
        | vk::DebugUtilsMessageSeverityFlagsEXT::INFO
        | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
      message_type: vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
        | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE
        | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION,
      pfn_user_callback: Some(vulkan_debug_utils_callback),
      p_user_data: ptr::null_mut(),
      ..Default::default()
    }
  }
}

impl ManuallyDestroyed for DebugUtils {
  unsafe fn destroy_self(&self) {
    self
      .loader
      .destroy_debug_utils_messenger(self.messenger, None);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn partitions_requested_layers() {
    let requested = [c"VK_LAYER_KHRONOS_validation", c"VK_LAYER_LUNARG_monitor"];
    let available = [c"VK_LAYER_MESA_device_select", c"VK_LAYER_KHRONOS_validation"];

    let (supported, unsupported) = filter_supported(&requested, &available);
    assert_eq!(supported, vec![c"VK_LAYER_KHRONOS_validation"]);
    assert_eq!(unsupported, vec![c"VK_LAYER_LUNARG_monitor"]);
  }

  #[test]
  fn no_layers_available() {
    let (supported, unsupported) = filter_supported(&VALIDATION_LAYERS, &[]);
    assert!(supported.is_empty());
    assert_eq!(unsupported.len(), VALIDATION_LAYERS.len());
  }

  #[test]
  fn missing_layers_are_an_error() {
    assert_eq!(
      require_layers(&VALIDATION_LAYERS, &[]),
      Err(vec!["VK_LAYER_KHRONOS_validation".to_owned()].into_boxed_slice())
    );
    assert_eq!(
      require_layers(
        &VALIDATION_LAYERS,
        &[c"VK_LAYER_MESA_device_select", c"VK_LAYER_KHRONOS_validation"]
      ),
      Ok(vec![c"VK_LAYER_KHRONOS_validation"])
    );
  }

  #[test]
  fn severities_map_to_log_levels() {
    assert_eq!(
      severity_log_level(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR),
      log::Level::Error
    );
    assert_eq!(
      severity_log_level(vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE),
      log::Level::Debug
    );
    assert_eq!(
      message_type_label(vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION),
      "[Validation]"
    );
  }

  #[test]
  fn create_info_covers_all_severities() {
    let info = DebugUtils::get_debug_messenger_create_info();
    assert!(info
      .message_severity
      .contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR));
    assert!(info
      .message_type
      .contains(vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION));
    assert!(info.pfn_user_callback.is_some());
  }
}
