use std::ffi::c_void;

use ash::vk;

use crate::{
  render::{errors::OutOfMemoryError, initialization::device::PhysicalDevice},
  utility::OnErr,
};

mod memory_bound;

pub use memory_bound::MemoryBound;

#[derive(Debug, thiserror::Error, Clone, Copy)]
pub enum AllocationError {
  #[error("No memory type allows {type_bits:#b} with properties {properties:?}")]
  NoCompatibleMemoryType {
    type_bits: u32,
    properties: vk::MemoryPropertyFlags,
  },
  #[error("Not enough memory")]
  NotEnoughMemory(#[source] OutOfMemoryError),
  #[error("Memory map failed")]
  MemoryMapFailed,
  #[error("Device is lost")]
  DeviceIsLost,
}

impl From<OutOfMemoryError> for AllocationError {
  fn from(value: OutOfMemoryError) -> Self {
    AllocationError::NotEnoughMemory(value)
  }
}

impl From<vk::Result> for AllocationError {
  fn from(value: vk::Result) -> Self {
    match value {
      vk::Result::ERROR_OUT_OF_HOST_MEMORY | vk::Result::ERROR_OUT_OF_DEVICE_MEMORY => {
        AllocationError::NotEnoughMemory(value.into())
      }
      vk::Result::ERROR_MEMORY_MAP_FAILED => AllocationError::MemoryMapFailed,
      vk::Result::ERROR_DEVICE_LOST => AllocationError::DeviceIsLost,
      _ => {
        log::error!("Unexpected allocation result: {:?}", value);
        AllocationError::DeviceIsLost
      }
    }
  }
}

// first memory type allowed by type_bits that has all required properties
pub fn find_memory_type(
  mem_types: &[vk::MemoryType],
  type_bits: u32,
  properties: vk::MemoryPropertyFlags,
) -> Result<u32, AllocationError> {
  mem_types
    .iter()
    .enumerate()
    .find(|(i, mem_type)| {
      type_bits & (1 << i) != 0 && mem_type.property_flags.contains(properties)
    })
    .map(|(i, _)| i as u32)
    .ok_or(AllocationError::NoCompatibleMemoryType {
      type_bits,
      properties,
    })
}

// dedicated allocation for a single object
pub fn allocate_and_bind(
  device: &ash::Device,
  physical_device: &PhysicalDevice,
  obj: &dyn MemoryBound,
  properties: vk::MemoryPropertyFlags,
) -> Result<vk::DeviceMemory, AllocationError> {
  let requirements = unsafe { obj.requirements(device) };
  let type_index = find_memory_type(
    physical_device.memory_types(),
    requirements.memory_type_bits,
    properties,
  )?;

  log::debug!(
    "Allocating {} bytes for {} with memory type {} ({:?})",
    requirements.size,
    obj.kind(),
    type_index,
    properties
  );
  let allocate_info = vk::MemoryAllocateInfo::default()
    .allocation_size(requirements.size)
    .memory_type_index(type_index);
  let memory = unsafe { device.allocate_memory(&allocate_info, None) }?;

  unsafe { obj.bind_dedicated(device, memory) }
    .on_err(|_| unsafe { device.free_memory(memory, None) })?;

  Ok(memory)
}

pub unsafe fn map_memory(
  device: &ash::Device,
  memory: vk::DeviceMemory,
  size: u64,
) -> Result<*mut c_void, AllocationError> {
  device
    .map_memory(memory, 0, size, vk::MemoryMapFlags::empty())
    .map_err(AllocationError::from)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn mem_type(flags: vk::MemoryPropertyFlags) -> vk::MemoryType {
    vk::MemoryType {
      property_flags: flags,
      heap_index: 0,
    }
  }

  fn types() -> [vk::MemoryType; 3] {
    [
      mem_type(vk::MemoryPropertyFlags::DEVICE_LOCAL),
      mem_type(vk::MemoryPropertyFlags::HOST_VISIBLE),
      mem_type(vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT),
    ]
  }

  #[test]
  fn picks_first_type_with_all_properties() {
    let host =
      vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT;
    assert_eq!(find_memory_type(&types(), 0b111, host).unwrap(), 2);
    assert_eq!(
      find_memory_type(&types(), 0b111, vk::MemoryPropertyFlags::HOST_VISIBLE).unwrap(),
      1
    );
  }

  #[test]
  fn respects_requirement_bits() {
    assert_eq!(
      find_memory_type(&types(), 0b100, vk::MemoryPropertyFlags::HOST_VISIBLE).unwrap(),
      2
    );
  }

  #[test]
  fn reports_missing_memory_type() {
    let err = find_memory_type(&types(), 0b011, vk::MemoryPropertyFlags::HOST_COHERENT);
    assert!(matches!(
      err,
      Err(AllocationError::NoCompatibleMemoryType {
        type_bits: 0b011,
        ..
      })
    ));
  }

  #[test]
  fn classifies_allocation_results() {
    assert!(matches!(
      AllocationError::from(vk::Result::ERROR_MEMORY_MAP_FAILED),
      AllocationError::MemoryMapFailed
    ));
    assert!(matches!(
      AllocationError::from(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY),
      AllocationError::NotEnoughMemory(OutOfMemoryError::OutOfDeviceMemory)
    ));
  }
}
