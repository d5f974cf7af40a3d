use ash::vk;

mod graphics;
mod temporary_graphics;

pub use graphics::{GraphicsCommandBufferPool, SceneDraw};
pub use temporary_graphics::{BufferCopy, ImageUpload, TemporaryGraphicsCommandPool};

pub fn create_command_pool(
  device: &ash::Device,
  flags: vk::CommandPoolCreateFlags,
  queue_family_index: u32,
) -> Result<vk::CommandPool, vk::Result> {
  let command_pool_create_info = vk::CommandPoolCreateInfo::default()
    .flags(flags)
    .queue_family_index(queue_family_index);
  log::debug!("Creating command pool");
  unsafe { device.create_command_pool(&command_pool_create_info, None) }
}

fn allocate_primary_command_buffers(
  device: &ash::Device,
  command_pool: vk::CommandPool,
  command_buffer_count: u32,
) -> Result<Vec<vk::CommandBuffer>, vk::Result> {
  let allocate_info = vk::CommandBufferAllocateInfo::default()
    .command_pool(command_pool)
    .level(vk::CommandBufferLevel::PRIMARY)
    .command_buffer_count(command_buffer_count);

  log::debug!("Allocating command buffers");
  unsafe { device.allocate_command_buffers(&allocate_info) }
}
