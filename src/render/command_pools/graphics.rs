use ash::vk;

use crate::{
  render::{
    device_destroyable::DeviceManuallyDestroyed, errors::OutOfMemoryError,
    initialization::device::QueueFamilies, pipelines::GraphicsPipeline, vertex::INDICES,
  },
  BACKGROUND_COLOR,
};

// everything the textured quad needs to be drawn
pub struct SceneDraw<'a> {
  pub pipeline: &'a GraphicsPipeline,
  pub vertex_buffer: vk::Buffer,
  pub index_buffer: vk::Buffer,
  pub descriptor_set: vk::DescriptorSet,
}

// one per frame in flight, reset as a whole every frame
pub struct GraphicsCommandBufferPool {
  pool: vk::CommandPool,
  pub main: vk::CommandBuffer,
}

impl GraphicsCommandBufferPool {
  pub fn create(device: &ash::Device, queue_families: &QueueFamilies) -> Result<Self, vk::Result> {
    let flags = vk::CommandPoolCreateFlags::TRANSIENT;
    let pool = super::create_command_pool(device, flags, queue_families.graphics)?;

    let main = match super::allocate_primary_command_buffers(device, pool, 1) {
      Ok(buffers) => buffers[0],
      Err(err) => {
        unsafe { device.destroy_command_pool(pool, None) };
        return Err(err);
      }
    };

    Ok(Self { pool, main })
  }

  pub unsafe fn reset(&mut self, device: &ash::Device) -> Result<(), OutOfMemoryError> {
    device
      .reset_command_pool(self.pool, vk::CommandPoolResetFlags::empty())
      .map_err(|err| err.into())
  }

  // clears the framebuffer and, if present, draws the scene
  pub unsafe fn record(
    &mut self,
    device: &ash::Device,
    render_pass: vk::RenderPass,
    framebuffer: vk::Framebuffer,
    extent: vk::Extent2D,
    scene: Option<SceneDraw>,
  ) -> Result<(), OutOfMemoryError> {
    let cb = self.main;
    let begin_info =
      vk::CommandBufferBeginInfo::default().flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
    device.begin_command_buffer(cb, &begin_info)?;

    let clear_values = [vk::ClearValue {
      color: BACKGROUND_COLOR,
    }];
    // whole image
    let render_area = vk::Rect2D {
      offset: vk::Offset2D { x: 0, y: 0 },
      extent,
    };
    let render_pass_begin_info = vk::RenderPassBeginInfo::default()
      .render_pass(render_pass)
      .framebuffer(framebuffer)
      .render_area(render_area)
      .clear_values(&clear_values);
    device.cmd_begin_render_pass(cb, &render_pass_begin_info, vk::SubpassContents::INLINE);

    if let Some(scene) = scene {
      let viewport = vk::Viewport {
        x: 0.0,
        y: 0.0,
        width: extent.width as f32,
        height: extent.height as f32,
        min_depth: 0.0,
        max_depth: 1.0,
      };
      device.cmd_set_viewport(cb, 0, &[viewport]);
      device.cmd_set_scissor(cb, 0, &[render_area]);

      device.cmd_bind_pipeline(cb, vk::PipelineBindPoint::GRAPHICS, scene.pipeline.pipeline);
      device.cmd_bind_vertex_buffers(cb, 0, &[scene.vertex_buffer], &[0]);
      device.cmd_bind_index_buffer(cb, scene.index_buffer, 0, vk::IndexType::UINT16);
      device.cmd_bind_descriptor_sets(
        cb,
        vk::PipelineBindPoint::GRAPHICS,
        scene.pipeline.layout,
        0,
        &[scene.descriptor_set],
        &[],
      );
      device.cmd_draw_indexed(cb, INDICES.len() as u32, 1, 0, 0, 0);
    }

    device.cmd_end_render_pass(cb);
    device.end_command_buffer(cb)?;

    Ok(())
  }
}

impl DeviceManuallyDestroyed for GraphicsCommandBufferPool {
  unsafe fn destroy_self(&self, device: &ash::Device) {
    device.destroy_command_pool(self.pool, None);
  }
}
