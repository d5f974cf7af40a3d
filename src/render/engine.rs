use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use winit::{dpi::PhysicalSize, window::Window};

use crate::{checkpoint::Checkpoint, utility::OnErr};

#[cfg(feature = "vl")]
use super::initialization::DebugUtils;
use super::{
  device_destroyable::{destroy, ManuallyDestroyed},
  errors::{FrameRenderError, InitializationError},
  initialization::{
    create_instance,
    device::{create_logical_device, PhysicalDevice, Queues},
    get_entry, Surface,
  },
  renderer::Renderer,
  sync_renderer::SyncRenderer,
};

// Owns every Vulkan object the selected checkpoint needs
pub struct RenderEngine {
  // the library stays loaded while the instance is alive
  _entry: ash::Entry,
  instance: ash::Instance,
  #[cfg(feature = "vl")]
  debug_utils: DebugUtils,

  device: Option<DeviceContext>,
}

impl RenderEngine {
  pub fn new(window: &Window, checkpoint: Checkpoint) -> Result<Self, InitializationError> {
    let entry = unsafe { get_entry() }?;
    let display_handle = window.display_handle()?.as_raw();

    #[cfg(feature = "vl")]
    let (instance, debug_utils) = create_instance(&entry, display_handle)?;
    #[cfg(not(feature = "vl"))]
    let instance = create_instance(&entry, display_handle)?;

    let device = if checkpoint.requires(Checkpoint::Device) {
      match DeviceContext::new(&entry, &instance, window, checkpoint) {
        Ok(device) => Some(device),
        Err(err) => {
          unsafe {
            #[cfg(feature = "vl")]
            debug_utils.destroy_self();
            instance.destroy_self();
          }
          return Err(err);
        }
      }
    } else {
      None
    };

    log::info!("Initialized \"{}\" checkpoint", checkpoint);
    Ok(Self {
      _entry: entry,
      instance,
      #[cfg(feature = "vl")]
      debug_utils,
      device,
    })
  }

  // true if frames are rendered and presented
  pub fn presents(&self) -> bool {
    self
      .device
      .as_ref()
      .is_some_and(|device| device.sync.is_some())
  }

  pub fn render_frame(&mut self) -> Result<(), FrameRenderError> {
    let Some(ctx) = self.device.as_mut() else {
      return Ok(());
    };
    match ctx.sync.as_mut() {
      Some(sync) => sync.render_next_frame(
        &ctx.device,
        &ctx.physical_device,
        &ctx.queues,
        &ctx.surface,
        ctx.window_size,
      ),
      None => Ok(()),
    }
  }

  pub fn window_resized(&mut self, new_size: PhysicalSize<u32>) {
    if let Some(ctx) = self.device.as_mut() {
      if new_size == ctx.window_size {
        return;
      }
      ctx.window_size = new_size;
      if let Some(sync) = ctx.sync.as_mut() {
        sync.window_resized(&ctx.physical_device, &ctx.surface, new_size);
      }
    }
  }
}

impl ManuallyDestroyed for RenderEngine {
  unsafe fn destroy_self(&self) {
    log::debug!("Destroying Vulkan objects");
    if let Some(ctx) = self.device.as_ref() {
      ctx.destroy_self();
    }

    #[cfg(feature = "vl")]
    self.debug_utils.destroy_self();
    self.instance.destroy_self();
  }
}

struct DeviceContext {
  surface: Surface,
  physical_device: PhysicalDevice,
  device: ash::Device,
  queues: Queues,
  window_size: PhysicalSize<u32>,

  sync: Option<SyncRenderer>,
}

impl DeviceContext {
  fn new(
    entry: &ash::Entry,
    instance: &ash::Instance,
    window: &Window,
    checkpoint: Checkpoint,
  ) -> Result<Self, InitializationError> {
    let surface = Surface::new(
      entry,
      instance,
      window.display_handle()?.as_raw(),
      window.window_handle()?.as_raw(),
    )?;

    let physical_device = match unsafe { PhysicalDevice::select(instance, &surface) } {
      Ok(Some(physical_device)) => physical_device,
      Ok(None) => {
        unsafe { surface.destroy_self() };
        return Err(InitializationError::NoCompatibleDevices);
      }
      Err(err) => {
        unsafe { surface.destroy_self() };
        return Err(err.into());
      }
    };

    let (device, queues) = create_logical_device(instance, &physical_device)
      .on_err(|_| unsafe { surface.destroy_self() })?;
    log::debug!("Retrieved queues: {:?}", queues);

    let window_size = window.inner_size();
    let sync = if checkpoint.requires(Checkpoint::Presentation) {
      let renderer = Renderer::new(
        instance,
        &physical_device,
        &device,
        &queues,
        &surface,
        window_size,
        checkpoint.requires(Checkpoint::Textured),
      )
      .on_err(|_| unsafe { destroy!(&device, &surface) })?;
      Some(
        SyncRenderer::new(&device, &physical_device, renderer)
          .on_err(|_| unsafe { destroy!(&device, &surface) })?,
      )
    } else {
      None
    };

    Ok(Self {
      surface,
      physical_device,
      device,
      queues,
      window_size,
      sync,
    })
  }

  unsafe fn destroy_self(&self) {
    if let Err(err) = self.device.device_wait_idle() {
      log::error!("Failed to wait for device idleness: {:?}", err);
    }
    destroy!(&self.device => &self.sync);
    destroy!(&self.device, &self.surface);
  }
}
