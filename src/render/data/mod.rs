mod mesh;
mod texture;
mod uniforms;

use std::{path::Path, ptr};

use ash::vk;

use crate::{
  render::{
    allocator::{self, AllocationError},
    command_pools::{BufferCopy, ImageUpload, SceneDraw, TemporaryGraphicsCommandPool},
    create_objs::create_buffer,
    descriptor_sets::DescriptorPool,
    device_destroyable::{destroy, DeviceManuallyDestroyed},
    errors::InitializationError,
    initialization::device::{PhysicalDevice, Queues},
    pipelines::GraphicsPipeline,
    vertex::{INDICES, VERTICES},
  },
  utility::{self, OnErr},
  TEXTURE_PATH,
};

pub use mesh::{Mesh, INDEX_SIZE, VERTEX_SIZE};
pub use texture::{load_rgba8, DecodedImage, Texture, TextureError};
pub use uniforms::{UniformBufferObject, UniformBuffers};

// host visible buffer used as a transfer source, freed once the upload completes
struct StagingBuffer {
  buffer: vk::Buffer,
  memory: vk::DeviceMemory,
}

impl StagingBuffer {
  fn with_bytes(
    device: &ash::Device,
    physical_device: &PhysicalDevice,
    bytes: &[u8],
  ) -> Result<Self, AllocationError> {
    let size = bytes.len() as u64;
    let buffer = create_buffer(device, size, vk::BufferUsageFlags::TRANSFER_SRC)?;
    let memory = allocator::allocate_and_bind(
      device,
      physical_device,
      &buffer,
      vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
    )
    .on_err(|_| unsafe { buffer.destroy_self(device) })?;

    unsafe {
      let mem_ptr = allocator::map_memory(device, memory, size)
        .on_err(|_| destroy!(device => &buffer, &memory))? as *mut u8;
      ptr::copy_nonoverlapping(bytes.as_ptr(), mem_ptr, bytes.len());
      device.unmap_memory(memory);
    }

    Ok(Self { buffer, memory })
  }
}

impl DeviceManuallyDestroyed for StagingBuffer {
  unsafe fn destroy_self(&self, device: &ash::Device) {
    destroy!(device => &self.buffer, &self.memory);
  }
}

#[allow(clippy::too_many_arguments)]
fn stage_and_submit(
  device: &ash::Device,
  physical_device: &PhysicalDevice,
  queues: &Queues,
  pool: &mut TemporaryGraphicsCommandPool,
  stagings: &mut Vec<StagingBuffer>,
  mesh: &Mesh,
  texture: &Texture,
  decoded: &DecodedImage,
) -> Result<(), InitializationError> {
  let vertex_bytes = unsafe { utility::any_as_u8_slice(&VERTICES) };
  let index_bytes = unsafe { utility::any_as_u8_slice(&INDICES) };

  for bytes in [vertex_bytes, index_bytes, decoded.bytes.as_slice()] {
    stagings.push(StagingBuffer::with_bytes(device, physical_device, bytes)?);
  }

  let buffer_copies = [
    BufferCopy {
      src: stagings[0].buffer,
      dst: mesh.vertex,
      size: VERTEX_SIZE,
    },
    BufferCopy {
      src: stagings[1].buffer,
      dst: mesh.index,
      size: INDEX_SIZE,
    },
  ];
  let image_upload = ImageUpload {
    src: stagings[2].buffer,
    dst: texture.image,
    extent: decoded.extent(),
  };

  unsafe {
    pool.record_uploads(device, &buffer_copies, Some(image_upload))?;
    pool.submit_and_wait(device, queues.graphics)?;
  }
  Ok(())
}

fn upload(
  device: &ash::Device,
  physical_device: &PhysicalDevice,
  queues: &Queues,
  mesh: &Mesh,
  texture: &Texture,
  decoded: &DecodedImage,
) -> Result<(), InitializationError> {
  let mut pool = TemporaryGraphicsCommandPool::create(device, &physical_device.queue_families)?;
  let mut stagings = Vec::with_capacity(3);

  log::debug!("Uploading mesh and texture");
  let result = stage_and_submit(
    device,
    physical_device,
    queues,
    &mut pool,
    &mut stagings,
    mesh,
    texture,
    decoded,
  );

  unsafe {
    stagings.destroy_self(device);
    pool.destroy_self(device);
  }
  result
}

// resources of the textured quad
pub struct Scene {
  pub mesh: Mesh,
  pub texture: Texture,
  pub uniforms: UniformBuffers,
  pub descriptor_pool: DescriptorPool,
  pub pipeline: GraphicsPipeline,
}

impl Scene {
  pub fn new(
    device: &ash::Device,
    physical_device: &PhysicalDevice,
    queues: &Queues,
    render_pass: vk::RenderPass,
  ) -> Result<Self, InitializationError> {
    let decoded = load_rgba8(Path::new(TEXTURE_PATH))?;
    log::info!(
      "Loaded {}x{} texture from {}",
      decoded.width,
      decoded.height,
      TEXTURE_PATH
    );

    let mesh = Mesh::create(device, physical_device)?;
    let texture = Texture::create(device, physical_device, decoded.extent())
      .on_err(|_| unsafe { mesh.destroy_self(device) })?;
    upload(device, physical_device, queues, &mesh, &texture, &decoded)
      .on_err(|_| unsafe { destroy!(device => &texture, &mesh) })?;

    let uniforms = UniformBuffers::new(device, physical_device)
      .on_err(|_| unsafe { destroy!(device => &texture, &mesh) })?;

    let descriptor_pool = DescriptorPool::new(device)
      .on_err(|_| unsafe { destroy!(device => &uniforms, &texture, &mesh) })?;
    descriptor_pool.write_sets(
      device,
      &uniforms.buffers,
      UniformBufferObject::SIZE,
      texture.view,
      texture.sampler,
    );

    let pipeline = GraphicsPipeline::new(device, render_pass, descriptor_pool.layout)
      .on_err(|_| unsafe { destroy!(device => &descriptor_pool, &uniforms, &texture, &mesh) })?;

    Ok(Self {
      mesh,
      texture,
      uniforms,
      descriptor_pool,
      pipeline,
    })
  }

  pub fn draw(&self, frame_i: usize) -> SceneDraw<'_> {
    SceneDraw {
      pipeline: &self.pipeline,
      vertex_buffer: self.mesh.vertex,
      index_buffer: self.mesh.index,
      descriptor_set: self.descriptor_pool.sets[frame_i],
    }
  }
}

impl DeviceManuallyDestroyed for Scene {
  unsafe fn destroy_self(&self, device: &ash::Device) {
    destroy!(device => &self.pipeline, &self.descriptor_pool, &self.uniforms, &self.texture, &self.mesh);
  }
}
