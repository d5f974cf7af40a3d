use ash::vk;
use raw_window_handle::HandleError;

use super::{
  allocator::AllocationError,
  data::TextureError,
  descriptor_sets::DescriptorSetError,
  initialization::{EntryError, InstanceCreationError, SurfaceError},
  pipelines::PipelineCreationError,
  renderer::SwapchainRecreationError,
  swapchain::{AcquireNextImageError, SwapchainCreationError},
};

pub fn error_chain_fmt(
  e: &impl std::error::Error,
  f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
  writeln!(f, "{}\nCauses:", e)?;
  let mut current = e.source();
  while let Some(cause) = current {
    writeln!(f, "  {}", cause)?;
    current = cause.source();
  }
  Ok(())
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutOfMemoryError {
  #[error("Out of device memory")]
  OutOfDeviceMemory,
  #[error("Out of host memory")]
  OutOfHostMemory,
}

impl From<vk::Result> for OutOfMemoryError {
  fn from(value: vk::Result) -> Self {
    match value {
      vk::Result::ERROR_OUT_OF_DEVICE_MEMORY => OutOfMemoryError::OutOfDeviceMemory,
      vk::Result::ERROR_OUT_OF_HOST_MEMORY => OutOfMemoryError::OutOfHostMemory,
      _ => {
        panic!("Invalid vk::Result to OutOfMemoryError cast: {:?}", value);
      }
    }
  }
}

impl From<OutOfMemoryError> for vk::Result {
  fn from(value: OutOfMemoryError) -> Self {
    match value {
      OutOfMemoryError::OutOfDeviceMemory => vk::Result::ERROR_OUT_OF_DEVICE_MEMORY,
      OutOfMemoryError::OutOfHostMemory => vk::Result::ERROR_OUT_OF_HOST_MEMORY,
    }
  }
}

#[derive(Debug, thiserror::Error)]
pub enum WindowError {
  #[error("OS error")]
  OsError(#[source] winit::error::OsError),
  #[error("Failed to get handle")]
  HandleError(#[source] HandleError),
}

#[derive(thiserror::Error)]
pub enum InitializationError {
  #[error("Failed to load the Vulkan library")]
  LoadingFailed(#[source] EntryError),

  #[error("Instance creation failed")]
  InstanceCreationFailed(#[source] InstanceCreationError),

  #[error("No physical device supports the application")]
  NoCompatibleDevices,

  #[error("Window error")]
  WindowError(#[source] WindowError),

  #[error("Surface error")]
  SurfaceError(#[source] SurfaceError),

  #[error("Not enough memory")]
  NotEnoughMemory(#[source] OutOfMemoryError),

  #[error("Failed to allocate memory")]
  AllocationFailed(#[source] AllocationError),

  #[error("Failed to create swapchain")]
  SwapchainCreationFailed(#[source] SwapchainCreationError),

  #[error("Failed to create pipelines")]
  PipelineCreationFailed(#[source] PipelineCreationError),

  #[error("Failed to load texture")]
  TextureLoadingFailed(#[source] TextureError),

  #[error("Failed to create descriptor sets")]
  DescriptorSetsFailed(#[source] DescriptorSetError),

  #[error("Memory map failed: The application was unable to map the required memory")]
  MemoryMapFailed,

  // undefined behavior / driver or application bug (see vl)
  #[error("Device is lost")]
  DeviceLost,
  #[error("Unknown")]
  Unknown,
}
impl std::fmt::Debug for InitializationError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    error_chain_fmt(self, f)
  }
}

impl From<EntryError> for InitializationError {
  fn from(value: EntryError) -> Self {
    InitializationError::LoadingFailed(value)
  }
}

impl From<InstanceCreationError> for InitializationError {
  fn from(value: InstanceCreationError) -> Self {
    InitializationError::InstanceCreationFailed(value)
  }
}

impl From<winit::error::OsError> for InitializationError {
  fn from(value: winit::error::OsError) -> Self {
    InitializationError::WindowError(WindowError::OsError(value))
  }
}

impl From<HandleError> for InitializationError {
  fn from(value: HandleError) -> Self {
    InitializationError::WindowError(WindowError::HandleError(value))
  }
}

impl From<SurfaceError> for InitializationError {
  fn from(value: SurfaceError) -> Self {
    InitializationError::SurfaceError(value)
  }
}

impl From<PipelineCreationError> for InitializationError {
  fn from(value: PipelineCreationError) -> Self {
    InitializationError::PipelineCreationFailed(value)
  }
}

impl From<SwapchainCreationError> for InitializationError {
  fn from(value: SwapchainCreationError) -> Self {
    InitializationError::SwapchainCreationFailed(value)
  }
}

impl From<TextureError> for InitializationError {
  fn from(value: TextureError) -> Self {
    InitializationError::TextureLoadingFailed(value)
  }
}

impl From<DescriptorSetError> for InitializationError {
  fn from(value: DescriptorSetError) -> Self {
    InitializationError::DescriptorSetsFailed(value)
  }
}

impl From<OutOfMemoryError> for InitializationError {
  fn from(value: OutOfMemoryError) -> Self {
    InitializationError::NotEnoughMemory(value)
  }
}

impl From<AllocationError> for InitializationError {
  fn from(value: AllocationError) -> Self {
    match value {
      AllocationError::NotEnoughMemory(err) => InitializationError::NotEnoughMemory(err),
      AllocationError::MemoryMapFailed => InitializationError::MemoryMapFailed,
      AllocationError::DeviceIsLost => InitializationError::DeviceLost,
      AllocationError::NoCompatibleMemoryType { .. } => {
        InitializationError::AllocationFailed(value)
      }
    }
  }
}

impl From<vk::Result> for InitializationError {
  fn from(value: vk::Result) -> Self {
    match value {
      vk::Result::ERROR_OUT_OF_DEVICE_MEMORY | vk::Result::ERROR_OUT_OF_HOST_MEMORY => {
        InitializationError::NotEnoughMemory(value.into())
      }
      vk::Result::ERROR_DEVICE_LOST => InitializationError::DeviceLost,
      vk::Result::ERROR_UNKNOWN => InitializationError::Unknown,
      // validation layers may say more on this
      vk::Result::ERROR_INITIALIZATION_FAILED => InitializationError::Unknown,
      vk::Result::ERROR_MEMORY_MAP_FAILED => InitializationError::MemoryMapFailed,
      _ => {
        log::error!("Invalid vk::Result: {:?}", value);
        InitializationError::Unknown
      }
    }
  }
}

#[derive(thiserror::Error)]
pub enum FrameRenderError {
  #[error("Out of memory")]
  OutOfMemory(#[source] OutOfMemoryError),

  #[error("Device is lost")]
  DeviceLost,

  #[error("Failed to acquire or present swapchain image")]
  FailedToAcquireSwapchainImage(#[source] AcquireNextImageError),

  #[error("Failed to recreate swapchain")]
  FailedToRecreateSwapchain(#[source] SwapchainRecreationError),

  #[error("Unexpected result: {0:?}")]
  Unknown(vk::Result),
}
impl std::fmt::Debug for FrameRenderError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    error_chain_fmt(self, f)
  }
}

impl From<vk::Result> for FrameRenderError {
  fn from(value: vk::Result) -> Self {
    match value {
      vk::Result::ERROR_OUT_OF_HOST_MEMORY | vk::Result::ERROR_OUT_OF_DEVICE_MEMORY => {
        FrameRenderError::OutOfMemory(OutOfMemoryError::from(value))
      }
      vk::Result::ERROR_DEVICE_LOST => FrameRenderError::DeviceLost,
      other => FrameRenderError::Unknown(other),
    }
  }
}

impl From<OutOfMemoryError> for FrameRenderError {
  fn from(value: OutOfMemoryError) -> Self {
    Self::OutOfMemory(value)
  }
}

impl From<AcquireNextImageError> for FrameRenderError {
  fn from(value: AcquireNextImageError) -> Self {
    Self::FailedToAcquireSwapchainImage(value)
  }
}

impl From<SwapchainRecreationError> for FrameRenderError {
  fn from(value: SwapchainRecreationError) -> Self {
    Self::FailedToRecreateSwapchain(value)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn classifies_memory_results() {
    assert_eq!(
      OutOfMemoryError::from(vk::Result::ERROR_OUT_OF_HOST_MEMORY),
      OutOfMemoryError::OutOfHostMemory
    );
    assert_eq!(
      vk::Result::from(OutOfMemoryError::OutOfDeviceMemory),
      vk::Result::ERROR_OUT_OF_DEVICE_MEMORY
    );
  }

  #[test]
  #[should_panic]
  fn rejects_non_memory_results() {
    let _ = OutOfMemoryError::from(vk::Result::ERROR_DEVICE_LOST);
  }

  #[test]
  fn frame_errors_from_results() {
    assert!(matches!(
      FrameRenderError::from(vk::Result::ERROR_DEVICE_LOST),
      FrameRenderError::DeviceLost
    ));
    assert!(matches!(
      FrameRenderError::from(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY),
      FrameRenderError::OutOfMemory(OutOfMemoryError::OutOfDeviceMemory)
    ));
    assert!(matches!(
      FrameRenderError::from(vk::Result::TIMEOUT),
      FrameRenderError::Unknown(vk::Result::TIMEOUT)
    ));
  }

  #[test]
  fn initialization_errors_from_results() {
    assert!(matches!(
      InitializationError::from(vk::Result::ERROR_MEMORY_MAP_FAILED),
      InitializationError::MemoryMapFailed
    ));
    assert!(matches!(
      InitializationError::from(vk::Result::ERROR_INITIALIZATION_FAILED),
      InitializationError::Unknown
    ));
  }

  #[test]
  fn debug_prints_cause_chain() {
    let err = InitializationError::NotEnoughMemory(OutOfMemoryError::OutOfHostMemory);
    let printed = format!("{:?}", err);
    assert!(printed.starts_with("Not enough memory\nCauses:"));
    assert!(printed.contains("  Out of host memory"));
  }
}
