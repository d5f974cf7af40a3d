use ash::vk;

use crate::render::{
  device_destroyable::DeviceManuallyDestroyed,
  errors::OutOfMemoryError,
  shaders::Shader,
  vertex::Vertex,
};

use super::PipelineCreationError;

pub struct GraphicsPipeline {
  pub layout: vk::PipelineLayout,
  pub pipeline: vk::Pipeline,

  shader: Shader,
}

const DYNAMIC_STATES: [vk::DynamicState; 2] =
  [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];

impl GraphicsPipeline {
  pub fn new(
    device: &ash::Device,
    render_pass: vk::RenderPass,
    descriptor_set_layout: vk::DescriptorSetLayout,
  ) -> Result<Self, PipelineCreationError> {
    let shader = Shader::load(device)?;

    let layout = match Self::create_layout(device, descriptor_set_layout) {
      Ok(layout) => layout,
      Err(err) => {
        unsafe { shader.destroy_self(device) };
        return Err(err.into());
      }
    };

    let pipeline = match Self::create_pipeline(device, layout, &shader, render_pass) {
      Ok(pipeline) => pipeline,
      Err(err) => {
        unsafe {
          layout.destroy_self(device);
          shader.destroy_self(device);
        }
        return Err(err);
      }
    };

    Ok(Self {
      layout,
      pipeline,
      shader,
    })
  }

  // render pass compatibility changes when the swapchain format changes
  // the device must be idle
  pub unsafe fn recreate(
    &mut self,
    device: &ash::Device,
    render_pass: vk::RenderPass,
  ) -> Result<(), PipelineCreationError> {
    let new = Self::create_pipeline(device, self.layout, &self.shader, render_pass)?;
    device.destroy_pipeline(self.pipeline, None);
    self.pipeline = new;
    Ok(())
  }

  fn create_layout(
    device: &ash::Device,
    descriptor_set_layout: vk::DescriptorSetLayout,
  ) -> Result<vk::PipelineLayout, OutOfMemoryError> {
    let set_layouts = [descriptor_set_layout];
    let layout_create_info = vk::PipelineLayoutCreateInfo::default().set_layouts(&set_layouts);
    unsafe { device.create_pipeline_layout(&layout_create_info, None) }
      .map_err(OutOfMemoryError::from)
  }

  fn create_pipeline(
    device: &ash::Device,
    layout: vk::PipelineLayout,
    shader: &Shader,
    render_pass: vk::RenderPass,
  ) -> Result<vk::Pipeline, PipelineCreationError> {
    let shader_stages = shader.get_pipeline_shader_creation_info();

    let binding_descriptions = [Vertex::get_binding_description(0)];
    let attribute_descriptions = Vertex::get_attribute_descriptions(0);
    let vertex_input_state = vk::PipelineVertexInputStateCreateInfo::default()
      .vertex_binding_descriptions(&binding_descriptions)
      .vertex_attribute_descriptions(&attribute_descriptions);

    let input_assembly_state = triangle_input_assembly_state();

    // viewport and scissor are set at record time
    let viewport_state = vk::PipelineViewportStateCreateInfo::default()
      .viewport_count(1)
      .scissor_count(1);
    let dynamic_state =
      vk::PipelineDynamicStateCreateInfo::default().dynamic_states(&DYNAMIC_STATES);

    let rasterization_state = back_culling_rasterization_state();
    let multisample_state = no_multisample_state();

    let attachment_states = [vk::PipelineColorBlendAttachmentState {
      blend_enable: vk::FALSE,
      color_write_mask: vk::ColorComponentFlags::RGBA,
      ..Default::default()
    }];
    let color_blend_state = vk::PipelineColorBlendStateCreateInfo::default()
      .logic_op_enable(false)
      .attachments(&attachment_states);

    let create_info = vk::GraphicsPipelineCreateInfo::default()
      .stages(&shader_stages)
      .vertex_input_state(&vertex_input_state)
      .input_assembly_state(&input_assembly_state)
      .viewport_state(&viewport_state)
      .rasterization_state(&rasterization_state)
      .multisample_state(&multisample_state)
      .color_blend_state(&color_blend_state)
      .dynamic_state(&dynamic_state)
      .layout(layout)
      .render_pass(render_pass)
      .subpass(0);

    log::debug!("Creating graphics pipeline");
    let pipelines = unsafe {
      device
        .create_graphics_pipelines(vk::PipelineCache::null(), &[create_info], None)
        .map_err(|(_, vkerr)| PipelineCreationError::from(vkerr))
    }?;
    Ok(pipelines[0])
  }
}

fn triangle_input_assembly_state<'a>() -> vk::PipelineInputAssemblyStateCreateInfo<'a> {
  vk::PipelineInputAssemblyStateCreateInfo::default()
    .topology(vk::PrimitiveTopology::TRIANGLE_LIST)
    .primitive_restart_enable(false)
}

fn back_culling_rasterization_state<'a>() -> vk::PipelineRasterizationStateCreateInfo<'a> {
  vk::PipelineRasterizationStateCreateInfo::default()
    .depth_clamp_enable(false)
    .rasterizer_discard_enable(false)
    .polygon_mode(vk::PolygonMode::FILL)
    .line_width(1.0)
    .cull_mode(vk::CullModeFlags::BACK)
    .front_face(vk::FrontFace::COUNTER_CLOCKWISE)
    .depth_bias_enable(false)
}

fn no_multisample_state<'a>() -> vk::PipelineMultisampleStateCreateInfo<'a> {
  vk::PipelineMultisampleStateCreateInfo::default()
    .rasterization_samples(vk::SampleCountFlags::TYPE_1)
    .sample_shading_enable(false)
}

impl DeviceManuallyDestroyed for GraphicsPipeline {
  unsafe fn destroy_self(&self, device: &ash::Device) {
    device.destroy_pipeline(self.pipeline, None);
    device.destroy_pipeline_layout(self.layout, None);
    self.shader.destroy_self(device);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn culls_back_faces_wound_clockwise() {
    let state = back_culling_rasterization_state();
    assert_eq!(state.cull_mode, vk::CullModeFlags::BACK);
    assert_eq!(state.front_face, vk::FrontFace::COUNTER_CLOCKWISE);
    assert_eq!(state.polygon_mode, vk::PolygonMode::FILL);
    assert_eq!(state.line_width, 1.0);
  }

  #[test]
  fn viewport_and_scissor_are_dynamic() {
    assert!(DYNAMIC_STATES.contains(&vk::DynamicState::VIEWPORT));
    assert!(DYNAMIC_STATES.contains(&vk::DynamicState::SCISSOR));
  }

  #[test]
  fn draws_triangle_lists() {
    let state = triangle_input_assembly_state();
    assert_eq!(state.topology, vk::PrimitiveTopology::TRIANGLE_LIST);
    assert_eq!(state.primitive_restart_enable, vk::FALSE);
  }
}
