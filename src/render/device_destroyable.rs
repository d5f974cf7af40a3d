use ash::vk;

// Vulkan objects are destroyed explicitly and in reverse creation order, so nothing here
// implements Drop
pub trait ManuallyDestroyed {
  unsafe fn destroy_self(&self);
}
pub trait DeviceManuallyDestroyed {
  unsafe fn destroy_self(&self, device: &ash::Device);
}

impl<T: ManuallyDestroyed> DeviceManuallyDestroyed for T {
  unsafe fn destroy_self(&self, _device: &ash::Device) {
    self.destroy_self();
  }
}

// destroy!(a, b) or destroy!(device => a, b)
// objects are destroyed in the given order
macro_rules! destroy {
  ($($obj:expr),+) => {
    {
      use crate::render::device_destroyable::ManuallyDestroyed;
      $(ManuallyDestroyed::destroy_self($obj);)+
    }
  };

  ($device:expr => $($obj:expr),+) => {
    {
      use crate::render::device_destroyable::DeviceManuallyDestroyed;
      $(DeviceManuallyDestroyed::destroy_self($obj, $device);)+
    }
  };
}
pub(crate) use destroy;

impl<T: DeviceManuallyDestroyed> DeviceManuallyDestroyed for Box<[T]> {
  unsafe fn destroy_self(&self, device: &ash::Device) {
    for value in self.iter() {
      value.destroy_self(device);
    }
  }
}

impl<T: DeviceManuallyDestroyed> DeviceManuallyDestroyed for [T] {
  unsafe fn destroy_self(&self, device: &ash::Device) {
    for value in self.iter() {
      value.destroy_self(device);
    }
  }
}

impl<T: DeviceManuallyDestroyed> DeviceManuallyDestroyed for Option<T> {
  unsafe fn destroy_self(&self, device: &ash::Device) {
    if let Some(value) = self {
      value.destroy_self(device);
    }
  }
}

impl ManuallyDestroyed for ash::Instance {
  unsafe fn destroy_self(&self) {
    self.destroy_instance(None);
  }
}

impl ManuallyDestroyed for ash::Device {
  unsafe fn destroy_self(&self) {
    self.destroy_device(None);
  }
}

macro_rules! impl_device_destroyed {
  ($($t:ty => $fn:ident),+ $(,)?) => {
    $(
      impl DeviceManuallyDestroyed for $t {
        unsafe fn destroy_self(&self, device: &ash::Device) {
          device.$fn(*self, None);
        }
      }
    )+
  };
}

impl_device_destroyed!(
  vk::Fence => destroy_fence,
  vk::Semaphore => destroy_semaphore,
  vk::Image => destroy_image,
  vk::ImageView => destroy_image_view,
  vk::Buffer => destroy_buffer,
  vk::DeviceMemory => free_memory,
  vk::RenderPass => destroy_render_pass,
  vk::Framebuffer => destroy_framebuffer,
  vk::Pipeline => destroy_pipeline,
  vk::PipelineLayout => destroy_pipeline_layout,
  vk::ShaderModule => destroy_shader_module,
  vk::Sampler => destroy_sampler,
  vk::DescriptorSetLayout => destroy_descriptor_set_layout,
  vk::DescriptorPool => destroy_descriptor_pool,
  vk::CommandPool => destroy_command_pool,
);
