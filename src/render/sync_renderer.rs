use std::time::Instant;

use ash::vk;
use winit::dpi::PhysicalSize;

use crate::utility::OnErr;

use super::{
  device_destroyable::{destroy, DeviceManuallyDestroyed},
  errors::{FrameRenderError, InitializationError},
  frame::Frame,
  initialization::{
    device::{PhysicalDevice, Queues},
    Surface,
  },
  renderer::Renderer,
  swapchain::{self, AcquireNextImageError},
  FRAMES_IN_FLIGHT,
};

fn is_minimized(window_size: PhysicalSize<u32>) -> bool {
  window_size.width == 0 || window_size.height == 0
}

fn next_frame_index(frame_i: usize) -> usize {
  (frame_i + 1) % FRAMES_IN_FLIGHT
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AcquireAction {
  Render { image_index: u32, recreate: bool },
  // nothing gets submitted, so the frame's fence must not be reset
  Skip,
}

fn acquire_action(
  result: Result<(u32, bool), AcquireNextImageError>,
) -> Result<AcquireAction, AcquireNextImageError> {
  match result {
    Ok((image_index, suboptimal)) => {
      if suboptimal {
        log::debug!("Acquired image from a suboptimal swapchain");
      }
      Ok(AcquireAction::Render {
        image_index,
        recreate: suboptimal,
      })
    }
    Err(AcquireNextImageError::OutOfDate) => {
      log::warn!("Swapchain is out of date, skipping frame");
      Ok(AcquireAction::Skip)
    }
    Err(err) => Err(err),
  }
}

// returns true if the swapchain should be recreated
fn present_needs_recreation(
  result: Result<bool, AcquireNextImageError>,
) -> Result<bool, AcquireNextImageError> {
  match result {
    Ok(false) => Ok(false),
    Ok(true) => {
      log::debug!("Presented to a suboptimal swapchain");
      Ok(true)
    }
    Err(AcquireNextImageError::OutOfDate) => {
      // window resizes can happen while the frame is being rendered and go unnoticed
      log::warn!("Failed to present: swapchain is out of date");
      Ok(true)
    }
    Err(err) => Err(err),
  }
}

fn resize_needs_recreation(
  capabilities: &vk::SurfaceCapabilitiesKHR,
  new_size: PhysicalSize<u32>,
  current_extent: vk::Extent2D,
) -> bool {
  if is_minimized(new_size) {
    return false;
  }
  swapchain::choose_extent(capabilities, new_size) != current_extent
}

// Drives the per frame loop: fences, acquisition, recording, submission, presentation and
// swapchain recreation
pub struct SyncRenderer {
  pub renderer: Renderer,
  frames: [Frame; FRAMES_IN_FLIGHT],
  frame_i: usize,

  // set on resize, suboptimal or out of date swapchains
  recreate_swapchain_next_frame: bool,
  start_time: Instant,
}

impl SyncRenderer {
  pub fn new(
    device: &ash::Device,
    physical_device: &PhysicalDevice,
    renderer: Renderer,
  ) -> Result<Self, InitializationError> {
    let frame0 = Frame::new(device, &physical_device.queue_families)
      .on_err(|_| unsafe { renderer.destroy_self(device) })?;
    let frame1 = Frame::new(device, &physical_device.queue_families)
      .on_err(|_| unsafe { destroy!(device => &frame0, &renderer) })?;

    Ok(Self {
      renderer,
      frames: [frame0, frame1],
      frame_i: 0,
      recreate_swapchain_next_frame: false,
      start_time: Instant::now(),
    })
  }

  pub fn render_next_frame(
    &mut self,
    device: &ash::Device,
    physical_device: &PhysicalDevice,
    queues: &Queues,
    surface: &Surface,
    window_size: PhysicalSize<u32>,
  ) -> Result<(), FrameRenderError> {
    if is_minimized(window_size) {
      return Ok(());
    }

    let frame_i = self.frame_i;
    let frame = &mut self.frames[frame_i];

    unsafe {
      frame.wait_in_flight(device)?;

      if self.recreate_swapchain_next_frame {
        device.device_wait_idle()?;
        self
          .renderer
          .recreate_swapchain(physical_device, device, surface, window_size)?;
        self.recreate_swapchain_next_frame = false;
      }

      let image_index = match acquire_action(
        self
          .renderer
          .swapchains
          .acquire_next_image(frame.image_available),
      )? {
        AcquireAction::Render {
          image_index,
          recreate,
        } => {
          self.recreate_swapchain_next_frame |= recreate;
          image_index
        }
        AcquireAction::Skip => {
          self.recreate_swapchain_next_frame = true;
          return Ok(());
        }
      };

      frame.reset_in_flight(device)?;
      self
        .renderer
        .record(device, &mut frame.command_pool, frame_i, image_index)?;

      let elapsed = self.start_time.elapsed().as_secs_f32();
      self.renderer.update_uniforms(frame_i, elapsed);

      let wait_semaphores = [frame.image_available];
      let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
      let command_buffers = [frame.command_pool.main];
      let signal_semaphores = [self.renderer.render_finished(image_index)];
      let submit_info = vk::SubmitInfo::default()
        .wait_semaphores(&wait_semaphores)
        .wait_dst_stage_mask(&wait_stages)
        .command_buffers(&command_buffers)
        .signal_semaphores(&signal_semaphores);
      device.queue_submit(queues.graphics, &[submit_info], frame.in_flight)?;

      let present_result = self.renderer.swapchains.queue_present(
        image_index,
        queues.presentation,
        &signal_semaphores,
      );
      if present_needs_recreation(present_result)? {
        self.recreate_swapchain_next_frame = true;
      }
    }

    self.frame_i = next_frame_index(frame_i);
    Ok(())
  }

  pub fn window_resized(
    &mut self,
    physical_device: &PhysicalDevice,
    surface: &Surface,
    new_size: PhysicalSize<u32>,
  ) {
    // the next non zero size triggers another resize
    if is_minimized(new_size) {
      return;
    }

    match unsafe { surface.get_capabilities(**physical_device) } {
      Ok(capabilities) => {
        let current_extent = self.renderer.swapchains.get_extent();
        if resize_needs_recreation(&capabilities, new_size, current_extent) {
          log::debug!(
            "Window resized to ({}, {}), recreating swapchain next frame",
            new_size.width,
            new_size.height
          );
          self.recreate_swapchain_next_frame = true;
        }
      }
      Err(err) => {
        // recreation will report the error if it persists
        log::warn!("Failed to query surface capabilities after resize: {}", err);
        self.recreate_swapchain_next_frame = true;
      }
    }
  }
}

impl DeviceManuallyDestroyed for SyncRenderer {
  unsafe fn destroy_self(&self, device: &ash::Device) {
    destroy!(device => self.frames.as_slice(), &self.renderer);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn zero_area_windows_are_minimized() {
    assert!(is_minimized(PhysicalSize::new(0, 600)));
    assert!(is_minimized(PhysicalSize::new(800, 0)));
    assert!(!is_minimized(PhysicalSize::new(800, 600)));
  }

  #[test]
  fn frame_slots_cycle() {
    let mut frame_i = 0;
    let mut visited = Vec::new();
    for _ in 0..(FRAMES_IN_FLIGHT * 2) {
      visited.push(frame_i);
      frame_i = next_frame_index(frame_i);
    }
    assert_eq!(visited, vec![0, 1, 0, 1]);
  }

  #[test]
  fn out_of_date_acquire_skips_the_frame() {
    assert_eq!(
      acquire_action(Err(AcquireNextImageError::OutOfDate)).ok(),
      Some(AcquireAction::Skip)
    );
  }

  #[test]
  fn suboptimal_acquire_still_renders() {
    assert_eq!(
      acquire_action(Ok((2, true))).ok(),
      Some(AcquireAction::Render {
        image_index: 2,
        recreate: true
      })
    );
    assert_eq!(
      acquire_action(Ok((0, false))).ok(),
      Some(AcquireAction::Render {
        image_index: 0,
        recreate: false
      })
    );
  }

  #[test]
  fn other_acquire_errors_propagate() {
    assert!(matches!(
      acquire_action(Err(AcquireNextImageError::DeviceIsLost)),
      Err(AcquireNextImageError::DeviceIsLost)
    ));
  }

  #[test]
  fn present_requests_recreation_when_needed() {
    assert!(!present_needs_recreation(Ok(false)).unwrap());
    assert!(present_needs_recreation(Ok(true)).unwrap());
    assert!(present_needs_recreation(Err(AcquireNextImageError::OutOfDate)).unwrap());
    assert!(matches!(
      present_needs_recreation(Err(AcquireNextImageError::SurfaceIsLost)),
      Err(AcquireNextImageError::SurfaceIsLost)
    ));
  }

  fn resizable_capabilities() -> vk::SurfaceCapabilitiesKHR {
    vk::SurfaceCapabilitiesKHR {
      current_extent: vk::Extent2D {
        width: u32::MAX,
        height: u32::MAX,
      },
      min_image_extent: vk::Extent2D {
        width: 1,
        height: 1,
      },
      max_image_extent: vk::Extent2D {
        width: 4096,
        height: 4096,
      },
      ..Default::default()
    }
  }

  #[test]
  fn resize_recreates_only_on_extent_change() {
    let caps = resizable_capabilities();
    let current = vk::Extent2D {
      width: 800,
      height: 600,
    };
    assert!(!resize_needs_recreation(&caps, PhysicalSize::new(800, 600), current));
    assert!(resize_needs_recreation(&caps, PhysicalSize::new(1024, 600), current));
    assert!(!resize_needs_recreation(&caps, PhysicalSize::new(0, 0), current));
  }

  #[test]
  fn fixed_surface_extent_ignores_window_size() {
    let mut caps = resizable_capabilities();
    caps.current_extent = vk::Extent2D {
      width: 800,
      height: 600,
    };
    let current = caps.current_extent;
    assert!(!resize_needs_recreation(&caps, PhysicalSize::new(1024, 768), current));
  }
}
