use ash::vk;

use crate::render::{
  device_destroyable::DeviceManuallyDestroyed, errors::OutOfMemoryError, FRAMES_IN_FLIGHT,
};

#[derive(Debug, thiserror::Error)]
pub enum DescriptorSetError {
  #[error("Out of memory")]
  OutOfMemory(#[source] OutOfMemoryError),
  // the pool is sized exactly, so these point to a bug
  #[error("Descriptor pool has no space left for the requested sets")]
  OutOfPoolMemory,
  #[error("Descriptor pool is fragmented")]
  FragmentedPool,
  #[error("Unexpected result: {0:?}")]
  Unknown(vk::Result),
}

impl From<vk::Result> for DescriptorSetError {
  fn from(value: vk::Result) -> Self {
    match value {
      vk::Result::ERROR_OUT_OF_HOST_MEMORY | vk::Result::ERROR_OUT_OF_DEVICE_MEMORY => {
        DescriptorSetError::OutOfMemory(value.into())
      }
      vk::Result::ERROR_OUT_OF_POOL_MEMORY => DescriptorSetError::OutOfPoolMemory,
      vk::Result::ERROR_FRAGMENTED_POOL => DescriptorSetError::FragmentedPool,
      other => DescriptorSetError::Unknown(other),
    }
  }
}

impl From<OutOfMemoryError> for DescriptorSetError {
  fn from(value: OutOfMemoryError) -> Self {
    DescriptorSetError::OutOfMemory(value)
  }
}

pub const UNIFORM_BINDING: u32 = 0;
pub const SAMPLER_BINDING: u32 = 1;

// one set per frame in flight, each with the frame's uniform buffer and the shared texture
pub struct DescriptorPool {
  pub layout: vk::DescriptorSetLayout,
  pool: vk::DescriptorPool,
  pub sets: [vk::DescriptorSet; FRAMES_IN_FLIGHT],
}

fn layout_bindings<'a>() -> [vk::DescriptorSetLayoutBinding<'a>; 2] {
  [
    vk::DescriptorSetLayoutBinding::default()
      .binding(UNIFORM_BINDING)
      .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
      .descriptor_count(1)
      .stage_flags(vk::ShaderStageFlags::VERTEX),
    vk::DescriptorSetLayoutBinding::default()
      .binding(SAMPLER_BINDING)
      .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
      .descriptor_count(1)
      .stage_flags(vk::ShaderStageFlags::FRAGMENT),
  ]
}

const fn pool_sizes() -> [vk::DescriptorPoolSize; 2] {
  [
    vk::DescriptorPoolSize {
      ty: vk::DescriptorType::UNIFORM_BUFFER,
      descriptor_count: FRAMES_IN_FLIGHT as u32,
    },
    vk::DescriptorPoolSize {
      ty: vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
      descriptor_count: FRAMES_IN_FLIGHT as u32,
    },
  ]
}

fn create_layout(device: &ash::Device) -> Result<vk::DescriptorSetLayout, OutOfMemoryError> {
  let bindings = layout_bindings();
  let create_info = vk::DescriptorSetLayoutCreateInfo::default().bindings(&bindings);
  unsafe { device.create_descriptor_set_layout(&create_info, None) }.map_err(|err| err.into())
}

impl DescriptorPool {
  pub fn new(device: &ash::Device) -> Result<Self, DescriptorSetError> {
    let layout = create_layout(device)?;

    let sizes = pool_sizes();
    let pool_create_info = vk::DescriptorPoolCreateInfo::default()
      .pool_sizes(&sizes)
      .max_sets(FRAMES_IN_FLIGHT as u32);
    let pool = match unsafe { device.create_descriptor_pool(&pool_create_info, None) } {
      Ok(pool) => pool,
      Err(err) => {
        unsafe { layout.destroy_self(device) };
        return Err(err.into());
      }
    };

    let layouts = [layout; FRAMES_IN_FLIGHT];
    let allocate_info = vk::DescriptorSetAllocateInfo::default()
      .descriptor_pool(pool)
      .set_layouts(&layouts);
    let sets = match unsafe { device.allocate_descriptor_sets(&allocate_info) } {
      Ok(sets) => sets,
      Err(err) => {
        unsafe {
          pool.destroy_self(device);
          layout.destroy_self(device);
        }
        return Err(err.into());
      }
    };

    let mut set_array = [vk::DescriptorSet::null(); FRAMES_IN_FLIGHT];
    set_array.copy_from_slice(&sets);

    Ok(Self {
      layout,
      pool,
      sets: set_array,
    })
  }

  pub fn write_sets(
    &self,
    device: &ash::Device,
    uniform_buffers: &[vk::Buffer; FRAMES_IN_FLIGHT],
    uniform_size: u64,
    texture_view: vk::ImageView,
    sampler: vk::Sampler,
  ) {
    let image_info = [vk::DescriptorImageInfo {
      sampler,
      image_view: texture_view,
      image_layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
    }];

    for (&set, &buffer) in self.sets.iter().zip(uniform_buffers.iter()) {
      let buffer_info = [vk::DescriptorBufferInfo {
        buffer,
        offset: 0,
        range: uniform_size,
      }];
      let writes = [
        vk::WriteDescriptorSet::default()
          .dst_set(set)
          .dst_binding(UNIFORM_BINDING)
          .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
          .buffer_info(&buffer_info),
        vk::WriteDescriptorSet::default()
          .dst_set(set)
          .dst_binding(SAMPLER_BINDING)
          .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
          .image_info(&image_info),
      ];
      unsafe { device.update_descriptor_sets(&writes, &[]) };
    }
  }
}

impl DeviceManuallyDestroyed for DescriptorPool {
  unsafe fn destroy_self(&self, device: &ash::Device) {
    // sets are freed with the pool
    device.destroy_descriptor_pool(self.pool, None);
    device.destroy_descriptor_set_layout(self.layout, None);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn bindings_match_shader_interface() {
    let bindings = layout_bindings();
    assert_eq!(bindings[0].binding, 0);
    assert_eq!(
      bindings[0].descriptor_type,
      vk::DescriptorType::UNIFORM_BUFFER
    );
    assert_eq!(bindings[0].stage_flags, vk::ShaderStageFlags::VERTEX);
    assert_eq!(bindings[1].binding, 1);
    assert_eq!(
      bindings[1].descriptor_type,
      vk::DescriptorType::COMBINED_IMAGE_SAMPLER
    );
    assert_eq!(bindings[1].stage_flags, vk::ShaderStageFlags::FRAGMENT);
  }

  #[test]
  fn allocation_failures_are_classified() {
    assert!(matches!(
      DescriptorSetError::from(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY),
      DescriptorSetError::OutOfMemory(OutOfMemoryError::OutOfDeviceMemory)
    ));
    assert!(matches!(
      DescriptorSetError::from(vk::Result::ERROR_FRAGMENTED_POOL),
      DescriptorSetError::FragmentedPool
    ));
    assert!(matches!(
      DescriptorSetError::from(vk::Result::ERROR_OUT_OF_POOL_MEMORY),
      DescriptorSetError::OutOfPoolMemory
    ));
    assert!(matches!(
      DescriptorSetError::from(vk::Result::ERROR_UNKNOWN),
      DescriptorSetError::Unknown(vk::Result::ERROR_UNKNOWN)
    ));
  }

  #[test]
  fn pool_holds_one_set_per_frame() {
    for size in pool_sizes() {
      assert_eq!(size.descriptor_count as usize, FRAMES_IN_FLIGHT);
    }
  }
}
