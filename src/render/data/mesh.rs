use std::mem::size_of;

use ash::vk;

use crate::render::{
  allocator::{self, AllocationError},
  create_objs::create_buffer,
  device_destroyable::{destroy, DeviceManuallyDestroyed},
  initialization::device::PhysicalDevice,
  vertex::{Vertex, INDICES, VERTICES},
};

pub const VERTEX_SIZE: u64 = (VERTICES.len() * size_of::<Vertex>()) as u64;
pub const INDEX_SIZE: u64 = (INDICES.len() * size_of::<u16>()) as u64;

fn create_device_local_buffer(
  device: &ash::Device,
  physical_device: &PhysicalDevice,
  size: u64,
  usage: vk::BufferUsageFlags,
) -> Result<(vk::Buffer, vk::DeviceMemory), AllocationError> {
  let buffer = create_buffer(device, size, usage | vk::BufferUsageFlags::TRANSFER_DST)?;
  match allocator::allocate_and_bind(
    device,
    physical_device,
    &buffer,
    vk::MemoryPropertyFlags::DEVICE_LOCAL,
  ) {
    Ok(memory) => Ok((buffer, memory)),
    Err(err) => {
      unsafe { buffer.destroy_self(device) };
      Err(err)
    }
  }
}

// device local vertex and index buffers of the quad, filled by a staging upload
pub struct Mesh {
  pub vertex: vk::Buffer,
  vertex_memory: vk::DeviceMemory,
  pub index: vk::Buffer,
  index_memory: vk::DeviceMemory,
}

impl Mesh {
  pub fn create(
    device: &ash::Device,
    physical_device: &PhysicalDevice,
  ) -> Result<Self, AllocationError> {
    let (vertex, vertex_memory) = create_device_local_buffer(
      device,
      physical_device,
      VERTEX_SIZE,
      vk::BufferUsageFlags::VERTEX_BUFFER,
    )?;
    let (index, index_memory) = match create_device_local_buffer(
      device,
      physical_device,
      INDEX_SIZE,
      vk::BufferUsageFlags::INDEX_BUFFER,
    ) {
      Ok(pair) => pair,
      Err(err) => {
        unsafe { destroy!(device => &vertex, &vertex_memory) };
        return Err(err);
      }
    };

    Ok(Self {
      vertex,
      vertex_memory,
      index,
      index_memory,
    })
  }
}

impl DeviceManuallyDestroyed for Mesh {
  unsafe fn destroy_self(&self, device: &ash::Device) {
    destroy!(device => &self.vertex, &self.vertex_memory, &self.index, &self.index_memory);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn buffer_sizes_cover_the_quad() {
    assert_eq!(VERTEX_SIZE, 4 * 28);
    assert_eq!(INDEX_SIZE, 6 * 2);
  }
}
