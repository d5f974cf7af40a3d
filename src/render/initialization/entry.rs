#[cfg(all(feature = "link", feature = "load"))]
compile_error!(
  "\
    Features \"link\" and \"load\" \
    were included at the same time. \
    Choose between \"load\" to load the Vulkan library \
    at runtime or \"link\" to link it while building the binary."
);

#[derive(Debug, thiserror::Error)]
pub enum EntryError {
  #[cfg(feature = "load")]
  #[error("Failed to load the Vulkan library")]
  LoadingFailed(#[source] ash::LoadingError),

  #[error(
    "No compile feature was included for accessing the Vulkan library. \
    Choose between \"load\" to load the Vulkan library \
    at runtime or \"link\" to link it while building the binary."
  )]
  NoLoaderFeature,
}

#[allow(unreachable_code)]
pub unsafe fn get_entry() -> Result<ash::Entry, EntryError> {
  #[cfg(feature = "link")]
  return Ok(ash::Entry::linked());

  #[cfg(feature = "load")]
  return ash::Entry::load().map_err(|err| {
    log::error!("Failed to load Vulkan library: {}", err);
    EntryError::LoadingFailed(err)
  });

  // only reached if neither feature is enabled
  Err(EntryError::NoLoaderFeature)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_loader_feature_explains_the_choice() {
    let message = EntryError::NoLoaderFeature.to_string();
    assert!(message.contains("\"load\""));
    assert!(message.contains("\"link\""));
  }

  #[cfg(not(any(feature = "load", feature = "link")))]
  #[test]
  fn no_loader_feature_is_an_error() {
    assert!(matches!(
      unsafe { get_entry() },
      Err(EntryError::NoLoaderFeature)
    ));
  }
}
