use ash::vk;

use crate::render::errors::OutOfMemoryError;

// Objects that get a dedicated allocation bound at offset 0
pub trait MemoryBound {
  fn kind(&self) -> &'static str;
  unsafe fn requirements(&self, device: &ash::Device) -> vk::MemoryRequirements;
  unsafe fn bind_dedicated(
    &self,
    device: &ash::Device,
    memory: vk::DeviceMemory,
  ) -> Result<(), OutOfMemoryError>;
}

impl MemoryBound for vk::Buffer {
  fn kind(&self) -> &'static str {
    "buffer"
  }

  unsafe fn requirements(&self, device: &ash::Device) -> vk::MemoryRequirements {
    device.get_buffer_memory_requirements(*self)
  }

  unsafe fn bind_dedicated(
    &self,
    device: &ash::Device,
    memory: vk::DeviceMemory,
  ) -> Result<(), OutOfMemoryError> {
    device
      .bind_buffer_memory(*self, memory, 0)
      .map_err(OutOfMemoryError::from)
  }
}

impl MemoryBound for vk::Image {
  fn kind(&self) -> &'static str {
    "image"
  }

  unsafe fn requirements(&self, device: &ash::Device) -> vk::MemoryRequirements {
    device.get_image_memory_requirements(*self)
  }

  unsafe fn bind_dedicated(
    &self,
    device: &ash::Device,
    memory: vk::DeviceMemory,
  ) -> Result<(), OutOfMemoryError> {
    device
      .bind_image_memory(*self, memory, 0)
      .map_err(OutOfMemoryError::from)
  }
}
