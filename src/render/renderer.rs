use std::mem;

use ash::vk;
use winit::dpi::PhysicalSize;

use crate::utility::OnErr;

use super::{
  command_pools::GraphicsCommandBufferPool,
  create_objs::create_semaphores,
  data::{Scene, UniformBufferObject},
  device_destroyable::{destroy, DeviceManuallyDestroyed},
  errors::{error_chain_fmt, InitializationError, OutOfMemoryError},
  initialization::{
    device::{PhysicalDevice, Queues},
    Surface,
  },
  pipelines::PipelineCreationError,
  render_pass::{create_framebuffers, create_render_pass},
  swapchain::{SwapchainCreationError, Swapchains},
};

#[derive(thiserror::Error)]
pub enum SwapchainRecreationError {
  #[error("Failed to create the new swapchain")]
  Swapchain(#[source] SwapchainCreationError),
  #[error("Out of memory")]
  OutOfMemory(#[source] OutOfMemoryError),
  #[error("Failed to recreate the graphics pipeline")]
  Pipeline(#[source] PipelineCreationError),
}
impl std::fmt::Debug for SwapchainRecreationError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    error_chain_fmt(self, f)
  }
}

impl From<SwapchainCreationError> for SwapchainRecreationError {
  fn from(value: SwapchainCreationError) -> Self {
    SwapchainRecreationError::Swapchain(value)
  }
}

impl From<OutOfMemoryError> for SwapchainRecreationError {
  fn from(value: OutOfMemoryError) -> Self {
    SwapchainRecreationError::OutOfMemory(value)
  }
}

impl From<PipelineCreationError> for SwapchainRecreationError {
  fn from(value: PipelineCreationError) -> Self {
    SwapchainRecreationError::Pipeline(value)
  }
}

// a present may still be waiting on the semaphore after the frame's fence signals, so it is
// indexed by image and only signalled again once that image has been reacquired
fn semaphore_for_image(semaphores: &[vk::Semaphore], image_index: u32) -> vk::Semaphore {
  semaphores[image_index as usize]
}

// Swapchain dependent objects plus the optional textured quad
pub struct Renderer {
  pub swapchains: Swapchains,
  render_pass: vk::RenderPass,
  framebuffers: Box<[vk::Framebuffer]>,
  // one per swapchain image
  render_finished: Box<[vk::Semaphore]>,
  scene: Option<Scene>,
}

impl Renderer {
  pub fn new(
    instance: &ash::Instance,
    physical_device: &PhysicalDevice,
    device: &ash::Device,
    queues: &Queues,
    surface: &Surface,
    window_size: PhysicalSize<u32>,
    with_scene: bool,
  ) -> Result<Self, InitializationError> {
    let swapchains = Swapchains::new(instance, physical_device, device, surface, window_size)?;

    let render_pass = create_render_pass(device, swapchains.get_format())
      .on_err(|_| unsafe { swapchains.destroy_self(device) })?;

    let framebuffers = create_framebuffers(
      device,
      render_pass,
      swapchains.get_image_views(),
      swapchains.get_extent(),
    )
    .on_err(|_| unsafe { destroy!(device => &render_pass, &swapchains) })?;

    let render_finished = create_semaphores(device, swapchains.get_image_views().len())
      .on_err(|_| unsafe { destroy!(device => &framebuffers, &render_pass, &swapchains) })?;

    let scene = if with_scene {
      Some(
        Scene::new(device, physical_device, queues, render_pass).on_err(|_| unsafe {
          destroy!(device => &render_finished, &framebuffers, &render_pass, &swapchains)
        })?,
      )
    } else {
      None
    };

    Ok(Self {
      swapchains,
      render_pass,
      framebuffers,
      render_finished,
      scene,
    })
  }

  // the device must be idle
  pub unsafe fn recreate_swapchain(
    &mut self,
    physical_device: &PhysicalDevice,
    device: &ash::Device,
    surface: &Surface,
    window_size: PhysicalSize<u32>,
  ) -> Result<(), SwapchainRecreationError> {
    let changes = self
      .swapchains
      .recreate(physical_device, device, surface, window_size)?;
    log::debug!("Swapchain recreated with changes: {:?}", changes);

    // framebuffers always reference the old image views and the image count may have changed
    let old_framebuffers = mem::take(&mut self.framebuffers);
    let old_semaphores = mem::take(&mut self.render_finished);
    destroy!(device => &old_framebuffers, &old_semaphores);

    if changes.format {
      log::info!("Swapchain format changed, recreating render pass");
      let render_pass = create_render_pass(device, self.swapchains.get_format())?;
      self.render_pass.destroy_self(device);
      self.render_pass = render_pass;

      if let Some(scene) = self.scene.as_mut() {
        scene.pipeline.recreate(device, self.render_pass)?;
      }
    }

    self.framebuffers = create_framebuffers(
      device,
      self.render_pass,
      self.swapchains.get_image_views(),
      self.swapchains.get_extent(),
    )?;
    self.render_finished = create_semaphores(device, self.swapchains.get_image_views().len())?;

    Ok(())
  }

  pub fn render_finished(&self, image_index: u32) -> vk::Semaphore {
    semaphore_for_image(&self.render_finished, image_index)
  }

  pub unsafe fn record(
    &self,
    device: &ash::Device,
    pool: &mut GraphicsCommandBufferPool,
    frame_i: usize,
    image_index: u32,
  ) -> Result<(), OutOfMemoryError> {
    pool.reset(device)?;
    pool.record(
      device,
      self.render_pass,
      self.framebuffers[image_index as usize],
      self.swapchains.get_extent(),
      self.scene.as_ref().map(|scene| scene.draw(frame_i)),
    )
  }

  // the frame's previous submission must have finished
  pub fn update_uniforms(&mut self, frame_i: usize, elapsed_secs: f32) {
    let extent = self.swapchains.get_extent();
    if let Some(scene) = self.scene.as_mut() {
      let ubo = UniformBufferObject::new(elapsed_secs, extent);
      scene.uniforms.update(frame_i, &ubo);
    }
  }
}

impl DeviceManuallyDestroyed for Renderer {
  unsafe fn destroy_self(&self, device: &ash::Device) {
    destroy!(
      device => &self.scene,
      &self.render_finished,
      &self.framebuffers,
      &self.render_pass,
      &self.swapchains
    );
  }
}

#[cfg(test)]
mod tests {
  use ash::vk::Handle;

  use super::*;
  use crate::render::FRAMES_IN_FLIGHT;

  #[test]
  fn render_finished_follows_the_image_not_the_frame() {
    let semaphores: Vec<vk::Semaphore> = (1..=3).map(vk::Semaphore::from_raw).collect();
    // three images with MAILBOX, images acquired in order while frame slots cycle
    let acquired = [0u32, 1, 2, 0, 1];
    let signalled: Vec<vk::Semaphore> = acquired
      .iter()
      .map(|&image| semaphore_for_image(&semaphores, image))
      .collect();

    // frame slot 0 renders rounds 0 and 2: the present of image 0 may still be waiting on
    // the semaphore signalled in round 0, so round 2 must signal a different one
    assert_eq!(FRAMES_IN_FLIGHT, 2);
    assert_ne!(signalled[0], signalled[2]);
    // the same semaphore is only reused once its image is acquired again
    assert_eq!(signalled[0], signalled[3]);
    assert_eq!(signalled[1], signalled[4]);
  }
}
