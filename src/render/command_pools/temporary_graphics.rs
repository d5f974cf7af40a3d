use ash::vk;

use crate::render::{
  create_objs::COLOR_SUBRESOURCE_RANGE, device_destroyable::DeviceManuallyDestroyed,
  errors::OutOfMemoryError, initialization::device::QueueFamilies,
};

// used for one time submissions during initialization
pub struct TemporaryGraphicsCommandPool {
  pool: vk::CommandPool,
  pub upload: vk::CommandBuffer,
}

fn layout_transition<'a>(
  image: vk::Image,
  old_layout: vk::ImageLayout,
  new_layout: vk::ImageLayout,
  src_access_mask: vk::AccessFlags,
  dst_access_mask: vk::AccessFlags,
) -> vk::ImageMemoryBarrier<'a> {
  vk::ImageMemoryBarrier::default()
    .src_access_mask(src_access_mask)
    .dst_access_mask(dst_access_mask)
    .old_layout(old_layout)
    .new_layout(new_layout)
    .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
    .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
    .image(image)
    .subresource_range(COLOR_SUBRESOURCE_RANGE)
}

pub struct BufferCopy {
  pub src: vk::Buffer,
  pub dst: vk::Buffer,
  pub size: u64,
}

pub struct ImageUpload {
  pub src: vk::Buffer,
  pub dst: vk::Image,
  pub extent: vk::Extent2D,
}

impl TemporaryGraphicsCommandPool {
  pub fn create(device: &ash::Device, queue_families: &QueueFamilies) -> Result<Self, vk::Result> {
    let flags = vk::CommandPoolCreateFlags::TRANSIENT;
    let pool = super::create_command_pool(device, flags, queue_families.graphics)?;

    let upload = match super::allocate_primary_command_buffers(device, pool, 1) {
      Ok(buffers) => buffers[0],
      Err(err) => {
        unsafe { device.destroy_command_pool(pool, None) };
        return Err(err);
      }
    };

    Ok(Self { pool, upload })
  }

  // copies buffers and uploads the image, leaving it ready to be sampled by the fragment shader
  pub unsafe fn record_uploads(
    &mut self,
    device: &ash::Device,
    buffer_copies: &[BufferCopy],
    image: Option<ImageUpload>,
  ) -> Result<(), OutOfMemoryError> {
    let cb = self.upload;
    let begin_info =
      vk::CommandBufferBeginInfo::default().flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
    device.begin_command_buffer(cb, &begin_info)?;

    for copy in buffer_copies {
      let region = vk::BufferCopy {
        src_offset: 0,
        dst_offset: 0,
        size: copy.size,
      };
      device.cmd_copy_buffer(cb, copy.src, copy.dst, &[region]);
    }

    if let Some(upload) = image {
      let undefined_to_transfer_dst = layout_transition(
        upload.dst,
        vk::ImageLayout::UNDEFINED,
        vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        vk::AccessFlags::empty(),
        vk::AccessFlags::TRANSFER_WRITE,
      );
      device.cmd_pipeline_barrier(
        cb,
        vk::PipelineStageFlags::TOP_OF_PIPE,
        vk::PipelineStageFlags::TRANSFER,
        vk::DependencyFlags::empty(),
        &[],
        &[],
        &[undefined_to_transfer_dst],
      );

      let region = vk::BufferImageCopy {
        buffer_offset: 0,
        // tightly packed
        buffer_row_length: 0,
        buffer_image_height: 0,
        image_subresource: vk::ImageSubresourceLayers {
          aspect_mask: vk::ImageAspectFlags::COLOR,
          mip_level: 0,
          base_array_layer: 0,
          layer_count: 1,
        },
        image_offset: vk::Offset3D { x: 0, y: 0, z: 0 },
        image_extent: vk::Extent3D {
          width: upload.extent.width,
          height: upload.extent.height,
          depth: 1,
        },
      };
      device.cmd_copy_buffer_to_image(
        cb,
        upload.src,
        upload.dst,
        vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        &[region],
      );

      let transfer_dst_to_shader_read = layout_transition(
        upload.dst,
        vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        vk::AccessFlags::TRANSFER_WRITE,
        vk::AccessFlags::SHADER_READ,
      );
      device.cmd_pipeline_barrier(
        cb,
        vk::PipelineStageFlags::TRANSFER,
        vk::PipelineStageFlags::FRAGMENT_SHADER,
        vk::DependencyFlags::empty(),
        &[],
        &[],
        &[transfer_dst_to_shader_read],
      );
    }

    device.end_command_buffer(cb)?;
    Ok(())
  }

  // submits the recorded uploads and blocks until the queue finishes them
  pub unsafe fn submit_and_wait(
    &self,
    device: &ash::Device,
    queue: vk::Queue,
  ) -> Result<(), vk::Result> {
    let command_buffers = [self.upload];
    let submit_info = vk::SubmitInfo::default().command_buffers(&command_buffers);
    device.queue_submit(queue, &[submit_info], vk::Fence::null())?;
    device.queue_wait_idle(queue)
  }
}

impl DeviceManuallyDestroyed for TemporaryGraphicsCommandPool {
  unsafe fn destroy_self(&self, device: &ash::Device) {
    device.destroy_command_pool(self.pool, None);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn transitions_cover_the_whole_color_image() {
    let barrier = layout_transition(
      vk::Image::null(),
      vk::ImageLayout::UNDEFINED,
      vk::ImageLayout::TRANSFER_DST_OPTIMAL,
      vk::AccessFlags::empty(),
      vk::AccessFlags::TRANSFER_WRITE,
    );
    assert_eq!(barrier.subresource_range.level_count, 1);
    assert_eq!(
      barrier.subresource_range.aspect_mask,
      vk::ImageAspectFlags::COLOR
    );
    assert_eq!(barrier.src_queue_family_index, vk::QUEUE_FAMILY_IGNORED);
    assert_eq!(barrier.new_layout, vk::ImageLayout::TRANSFER_DST_OPTIMAL);
  }
}
