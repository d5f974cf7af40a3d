use std::{ffi::CStr, path::Path};

use ash::vk;

use crate::{
  render::device_destroyable::DeviceManuallyDestroyed, FRAGMENT_SHADER_PATH, VERTEX_SHADER_PATH,
};

use super::{load_shader, ShaderError};

static MAIN_FN_NAME: &CStr = c"main";

pub struct Shader {
  pub vert: vk::ShaderModule,
  pub frag: vk::ShaderModule,
}

impl Shader {
  pub fn load(device: &ash::Device) -> Result<Self, ShaderError> {
    let vert = load_shader(device, Path::new(VERTEX_SHADER_PATH))?;
    let frag = match load_shader(device, Path::new(FRAGMENT_SHADER_PATH)) {
      Ok(frag) => frag,
      Err(err) => {
        unsafe { device.destroy_shader_module(vert, None) };
        return Err(err);
      }
    };
    Ok(Self { vert, frag })
  }

  pub fn get_pipeline_shader_creation_info(&self) -> [vk::PipelineShaderStageCreateInfo<'_>; 2] {
    [
      vk::PipelineShaderStageCreateInfo::default()
        .stage(vk::ShaderStageFlags::VERTEX)
        .module(self.vert)
        .name(MAIN_FN_NAME),
      vk::PipelineShaderStageCreateInfo::default()
        .stage(vk::ShaderStageFlags::FRAGMENT)
        .module(self.frag)
        .name(MAIN_FN_NAME),
    ]
  }
}

impl DeviceManuallyDestroyed for Shader {
  unsafe fn destroy_self(&self, device: &ash::Device) {
    device.destroy_shader_module(self.vert, None);
    device.destroy_shader_module(self.frag, None);
  }
}
