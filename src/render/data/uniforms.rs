use std::{mem::size_of, ptr};

use ash::vk;
use glam::{Mat4, Vec3};

use crate::{
  render::{
    allocator::{self, AllocationError},
    create_objs::create_buffer,
    device_destroyable::DeviceManuallyDestroyed,
    initialization::device::PhysicalDevice,
    FRAMES_IN_FLIGHT,
  },
  utility,
};

const DEGREES_PER_SECOND: f32 = 90.0;
const EYE: Vec3 = Vec3::new(2.0, 2.0, 2.0);
const FOV_Y_DEGREES: f32 = 45.0;
const Z_NEAR: f32 = 0.1;
const Z_FAR: f32 = 10.0;

// column major, matches the std140 layout of the vertex shader's uniform block
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformBufferObject {
  pub model: Mat4,
  pub view: Mat4,
  pub proj: Mat4,
}

impl UniformBufferObject {
  pub const SIZE: u64 = size_of::<Self>() as u64;

  pub fn new(elapsed_secs: f32, extent: vk::Extent2D) -> Self {
    let model = Mat4::from_rotation_z((elapsed_secs * DEGREES_PER_SECOND).to_radians());
    let view = Mat4::look_at_rh(EYE, Vec3::ZERO, Vec3::Z);

    let aspect = extent.width as f32 / extent.height.max(1) as f32;
    let mut proj = Mat4::perspective_rh(FOV_Y_DEGREES.to_radians(), aspect, Z_NEAR, Z_FAR);
    // Vulkan clip space has Y pointing down
    proj.y_axis.y *= -1.0;

    Self { model, view, proj }
  }
}

// one persistently mapped host coherent buffer per frame in flight
pub struct UniformBuffers {
  pub buffers: [vk::Buffer; FRAMES_IN_FLIGHT],
  memories: [vk::DeviceMemory; FRAMES_IN_FLIGHT],
  mapped: [*mut u8; FRAMES_IN_FLIGHT],
}

impl UniformBuffers {
  pub fn new(
    device: &ash::Device,
    physical_device: &PhysicalDevice,
  ) -> Result<Self, AllocationError> {
    let mut result = Self {
      buffers: [vk::Buffer::null(); FRAMES_IN_FLIGHT],
      memories: [vk::DeviceMemory::null(); FRAMES_IN_FLIGHT],
      mapped: [ptr::null_mut(); FRAMES_IN_FLIGHT],
    };

    for i in 0..FRAMES_IN_FLIGHT {
      if let Err(err) = result.create_frame_buffer(device, physical_device, i) {
        // null handles are ignored by vkDestroy* and vkFreeMemory
        unsafe { result.destroy_self(device) };
        return Err(err);
      }
    }

    Ok(result)
  }

  fn create_frame_buffer(
    &mut self,
    device: &ash::Device,
    physical_device: &PhysicalDevice,
    i: usize,
  ) -> Result<(), AllocationError> {
    self.buffers[i] = create_buffer(
      device,
      UniformBufferObject::SIZE,
      vk::BufferUsageFlags::UNIFORM_BUFFER,
    )?;
    self.memories[i] = allocator::allocate_and_bind(
      device,
      physical_device,
      &self.buffers[i],
      vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
    )?;
    self.mapped[i] =
      unsafe { allocator::map_memory(device, self.memories[i], UniformBufferObject::SIZE) }?
        as *mut u8;
    Ok(())
  }

  // the frame's previous submission must have finished
  pub fn update(&mut self, frame_i: usize, ubo: &UniformBufferObject) {
    unsafe {
      let bytes = utility::any_as_u8_slice(ubo);
      ptr::copy_nonoverlapping(bytes.as_ptr(), self.mapped[frame_i], bytes.len());
    }
  }
}

impl DeviceManuallyDestroyed for UniformBuffers {
  unsafe fn destroy_self(&self, device: &ash::Device) {
    // freeing memory unmaps it
    self.buffers.destroy_self(device);
    self.memories.destroy_self(device);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use glam::Vec4;

  const EXTENT: vk::Extent2D = vk::Extent2D {
    width: 800,
    height: 600,
  };

  fn approx(a: Vec4, b: Vec4) -> bool {
    (a - b).abs().max_element() < 1e-5
  }

  #[test]
  fn three_matrices_of_sixteen_floats() {
    assert_eq!(UniformBufferObject::SIZE, 3 * 16 * 4);
  }

  #[test]
  fn model_rotates_ninety_degrees_per_second() {
    let ubo = UniformBufferObject::new(1.0, EXTENT);
    let rotated = ubo.model * Vec4::new(1.0, 0.0, 0.0, 1.0);
    assert!(approx(rotated, Vec4::new(0.0, 1.0, 0.0, 1.0)));

    let still = UniformBufferObject::new(0.0, EXTENT);
    assert_eq!(still.model, Mat4::IDENTITY);
  }

  #[test]
  fn view_looks_at_origin_from_eye() {
    let ubo = UniformBufferObject::new(0.0, EXTENT);
    let eye = ubo.view * EYE.extend(1.0);
    assert!(approx(eye, Vec4::new(0.0, 0.0, 0.0, 1.0)));
    // the origin ends up straight ahead (negative Z in view space)
    let origin = ubo.view * Vec4::new(0.0, 0.0, 0.0, 1.0);
    assert!(origin.x.abs() < 1e-5 && origin.y.abs() < 1e-5 && origin.z < 0.0);
  }

  #[test]
  fn projection_flips_y_and_uses_aspect() {
    let ubo = UniformBufferObject::new(0.0, EXTENT);
    assert!(ubo.proj.y_axis.y < 0.0);
    let ratio = ubo.proj.y_axis.y.abs() / ubo.proj.x_axis.x;
    assert!((ratio - 800.0 / 600.0).abs() < 1e-4);
  }

  #[test]
  fn zero_height_does_not_divide_by_zero() {
    let ubo = UniformBufferObject::new(
      0.0,
      vk::Extent2D {
        width: 800,
        height: 0,
      },
    );
    assert!(ubo.proj.x_axis.x.is_finite());
  }
}
