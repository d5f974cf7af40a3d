use ash::vk;

use crate::render::errors::OutOfMemoryError;

fn color_attachment(format: vk::Format) -> vk::AttachmentDescription {
  vk::AttachmentDescription::default()
    .format(format)
    .samples(vk::SampleCountFlags::TYPE_1)
    .load_op(vk::AttachmentLoadOp::CLEAR)
    .store_op(vk::AttachmentStoreOp::STORE)
    .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
    .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
    .initial_layout(vk::ImageLayout::UNDEFINED)
    .final_layout(vk::ImageLayout::PRESENT_SRC_KHR)
}

// the layout transition at the start of the render pass has to wait for the image to be acquired,
// which is signaled at COLOR_ATTACHMENT_OUTPUT
fn acquire_dependency() -> vk::SubpassDependency {
  vk::SubpassDependency::default()
    .src_subpass(vk::SUBPASS_EXTERNAL)
    .dst_subpass(0)
    .src_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
    .dst_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
    .src_access_mask(vk::AccessFlags::empty())
    .dst_access_mask(vk::AccessFlags::COLOR_ATTACHMENT_WRITE)
}

pub fn create_render_pass(
  device: &ash::Device,
  format: vk::Format,
) -> Result<vk::RenderPass, OutOfMemoryError> {
  let image_attachment = [color_attachment(format)];

  let attachment_ref = [vk::AttachmentReference {
    attachment: 0,
    layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
  }];

  let image_subpass = [vk::SubpassDescription::default()
    .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
    .color_attachments(&attachment_ref)];

  let dependencies = [acquire_dependency()];

  let create_info = vk::RenderPassCreateInfo::default()
    .attachments(&image_attachment)
    .subpasses(&image_subpass)
    .dependencies(&dependencies);

  log::debug!("Creating render pass with {:?} format", format);
  unsafe {
    device
      .create_render_pass(&create_info, None)
      .map_err(|err| err.into())
  }
}

pub fn create_framebuffer(
  device: &ash::Device,
  render_pass: vk::RenderPass,
  image_view: vk::ImageView,
  extent: vk::Extent2D,
) -> Result<vk::Framebuffer, OutOfMemoryError> {
  let attachments = [image_view];
  let create_info = vk::FramebufferCreateInfo::default()
    .render_pass(render_pass)
    .attachments(&attachments)
    .width(extent.width)
    .height(extent.height)
    .layers(1);
  unsafe {
    device
      .create_framebuffer(&create_info, None)
      .map_err(|err| err.into())
  }
}

// one framebuffer per swapchain image view
pub fn create_framebuffers(
  device: &ash::Device,
  render_pass: vk::RenderPass,
  image_views: &[vk::ImageView],
  extent: vk::Extent2D,
) -> Result<Box<[vk::Framebuffer]>, OutOfMemoryError> {
  use crate::render::device_destroyable::DeviceManuallyDestroyed;

  let mut framebuffers = Vec::with_capacity(image_views.len());
  for &view in image_views {
    match create_framebuffer(device, render_pass, view, extent) {
      Ok(framebuffer) => framebuffers.push(framebuffer),
      Err(err) => {
        unsafe { framebuffers.destroy_self(device) };
        return Err(err);
      }
    }
  }
  Ok(framebuffers.into_boxed_slice())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn attachment_is_cleared_and_presented() {
    let attachment = color_attachment(vk::Format::B8G8R8A8_SRGB);
    assert_eq!(attachment.load_op, vk::AttachmentLoadOp::CLEAR);
    assert_eq!(attachment.store_op, vk::AttachmentStoreOp::STORE);
    assert_eq!(attachment.initial_layout, vk::ImageLayout::UNDEFINED);
    assert_eq!(attachment.final_layout, vk::ImageLayout::PRESENT_SRC_KHR);
  }

  #[test]
  fn first_subpass_waits_for_acquisition() {
    let dependency = acquire_dependency();
    assert_eq!(dependency.src_subpass, vk::SUBPASS_EXTERNAL);
    assert_eq!(dependency.dst_subpass, 0);
    assert_eq!(
      dependency.src_stage_mask,
      vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
    );
  }
}
