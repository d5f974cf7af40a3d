use ash::vk;

use crate::utility::OnErr;

use super::{
  command_pools::GraphicsCommandBufferPool,
  create_objs::{create_fence, create_semaphore},
  device_destroyable::{destroy, DeviceManuallyDestroyed},
  errors::OutOfMemoryError,
  initialization::device::QueueFamilies,
};

// synchronization objects and command buffer owned by one frame in flight
// render finished semaphores belong to swapchain images instead (see Renderer)
pub struct Frame {
  pub image_available: vk::Semaphore,
  // created signalled so that the first wait on it does not block
  pub in_flight: vk::Fence,
  pub command_pool: GraphicsCommandBufferPool,
}

impl Frame {
  pub fn new(device: &ash::Device, queue_families: &QueueFamilies) -> Result<Self, vk::Result> {
    let image_available = create_semaphore(device)?;
    let in_flight = create_fence(device, vk::FenceCreateFlags::SIGNALED)
      .on_err(|_| unsafe { image_available.destroy_self(device) })?;
    let command_pool = GraphicsCommandBufferPool::create(device, queue_families)
      .on_err(|_| unsafe { destroy!(device => &in_flight, &image_available) })?;

    Ok(Self {
      image_available,
      in_flight,
      command_pool,
    })
  }

  pub unsafe fn wait_in_flight(&self, device: &ash::Device) -> Result<(), vk::Result> {
    device.wait_for_fences(&[self.in_flight], true, u64::MAX)
  }

  pub unsafe fn reset_in_flight(&self, device: &ash::Device) -> Result<(), OutOfMemoryError> {
    device
      .reset_fences(&[self.in_flight])
      .map_err(OutOfMemoryError::from)
  }
}

impl DeviceManuallyDestroyed for Frame {
  unsafe fn destroy_self(&self, device: &ash::Device) {
    destroy!(device => &self.command_pool, &self.in_flight, &self.image_available);
  }
}
