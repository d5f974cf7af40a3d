use std::{io, path::Path};

use ash::vk;

use crate::render::{
  allocator::{self, AllocationError},
  create_objs::{create_image, create_image_view},
  device_destroyable::{destroy, DeviceManuallyDestroyed},
  errors::OutOfMemoryError,
  initialization::device::PhysicalDevice,
};

pub const TEXTURE_FORMAT: vk::Format = vk::Format::R8G8B8A8_SRGB;

#[derive(Debug, thiserror::Error)]
pub enum TextureError {
  #[error("Failed to read \"{1}\"")]
  IOError(#[source] io::Error, String),
  #[error("Failed to decode image")]
  ImageError(#[source] image::ImageError),
  #[error("Image has no pixels")]
  Empty,
}

impl From<image::ImageError> for TextureError {
  fn from(value: image::ImageError) -> Self {
    TextureError::ImageError(value)
  }
}

// tightly packed RGBA8 pixels
pub struct DecodedImage {
  pub width: u32,
  pub height: u32,
  pub bytes: Vec<u8>,
}

impl DecodedImage {
  pub fn extent(&self) -> vk::Extent2D {
    vk::Extent2D {
      width: self.width,
      height: self.height,
    }
  }
}

fn into_rgba8(img: image::DynamicImage) -> Result<DecodedImage, TextureError> {
  let img = img.into_rgba8();
  let (width, height) = (img.width(), img.height());
  if width == 0 || height == 0 {
    return Err(TextureError::Empty);
  }

  let bytes = img.into_raw();
  debug_assert_eq!(bytes.len(), width as usize * height as usize * 4);
  Ok(DecodedImage {
    width,
    height,
    bytes,
  })
}

pub fn load_rgba8(path: &Path) -> Result<DecodedImage, TextureError> {
  log::debug!("Loading texture from {}", path.display());
  let reader = image::io::Reader::open(path)
    .map_err(|err| TextureError::IOError(err, path.display().to_string()))?
    .with_guessed_format()
    .map_err(|err| TextureError::IOError(err, path.display().to_string()))?;
  into_rgba8(reader.decode()?)
}

fn sampler_create_info<'a>(max_anisotropy: Option<f32>) -> vk::SamplerCreateInfo<'a> {
  vk::SamplerCreateInfo::default()
    .mag_filter(vk::Filter::LINEAR)
    .min_filter(vk::Filter::LINEAR)
    .address_mode_u(vk::SamplerAddressMode::REPEAT)
    .address_mode_v(vk::SamplerAddressMode::REPEAT)
    .address_mode_w(vk::SamplerAddressMode::REPEAT)
    .anisotropy_enable(max_anisotropy.is_some())
    .max_anisotropy(max_anisotropy.unwrap_or(1.0))
    .border_color(vk::BorderColor::INT_OPAQUE_BLACK)
    .unnormalized_coordinates(false)
    .compare_enable(false)
    .compare_op(vk::CompareOp::ALWAYS)
    .mipmap_mode(vk::SamplerMipmapMode::LINEAR)
    .mip_lod_bias(0.0)
    .min_lod(0.0)
    .max_lod(0.0)
}

fn create_sampler(
  device: &ash::Device,
  max_anisotropy: Option<f32>,
) -> Result<vk::Sampler, OutOfMemoryError> {
  let create_info = sampler_create_info(max_anisotropy);
  unsafe { device.create_sampler(&create_info, None) }.map_err(|err| err.into())
}

// device local sampled image, contents have to be uploaded separately
pub struct Texture {
  pub image: vk::Image,
  memory: vk::DeviceMemory,
  pub view: vk::ImageView,
  pub sampler: vk::Sampler,
}

impl Texture {
  pub fn create(
    device: &ash::Device,
    physical_device: &PhysicalDevice,
    extent: vk::Extent2D,
  ) -> Result<Self, AllocationError> {
    let image = create_image(
      device,
      TEXTURE_FORMAT,
      extent.width,
      extent.height,
      vk::ImageUsageFlags::TRANSFER_DST | vk::ImageUsageFlags::SAMPLED,
    )?;

    let memory = match allocator::allocate_and_bind(
      device,
      physical_device,
      &image,
      vk::MemoryPropertyFlags::DEVICE_LOCAL,
    ) {
      Ok(memory) => memory,
      Err(err) => {
        unsafe { image.destroy_self(device) };
        return Err(err);
      }
    };

    let view = match create_image_view(device, image, TEXTURE_FORMAT) {
      Ok(view) => view,
      Err(err) => {
        unsafe { destroy!(device => &image, &memory) };
        return Err(err.into());
      }
    };

    let sampler = match create_sampler(device, physical_device.max_anisotropy) {
      Ok(sampler) => sampler,
      Err(err) => {
        unsafe { destroy!(device => &view, &image, &memory) };
        return Err(err.into());
      }
    };

    Ok(Self {
      image,
      memory,
      view,
      sampler,
    })
  }
}

impl DeviceManuallyDestroyed for Texture {
  unsafe fn destroy_self(&self, device: &ash::Device) {
    self.sampler.destroy_self(device);
    self.view.destroy_self(device);
    self.image.destroy_self(device);
    self.memory.destroy_self(device);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Cursor;

  fn encoded_png(width: u32, height: u32) -> Vec<u8> {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
      width,
      height,
      image::Rgb([10, 20, 30]),
    ));
    let mut cursor = Cursor::new(Vec::new());
    img
      .write_to(&mut cursor, image::ImageOutputFormat::Png)
      .unwrap();
    cursor.into_inner()
  }

  fn decode_rgba8(encoded: &[u8]) -> Result<DecodedImage, TextureError> {
    into_rgba8(image::load_from_memory(encoded)?)
  }

  #[test]
  fn decodes_to_tightly_packed_rgba() {
    let decoded = decode_rgba8(&encoded_png(2, 3)).unwrap();
    assert_eq!((decoded.width, decoded.height), (2, 3));
    assert_eq!(decoded.bytes.len(), 2 * 3 * 4);
    // alpha gets added to rgb images
    assert_eq!(&decoded.bytes[0..4], &[10, 20, 30, 255]);
    assert_eq!(
      decoded.extent(),
      vk::Extent2D {
        width: 2,
        height: 3
      }
    );
  }

  #[test]
  fn rejects_garbage() {
    assert!(matches!(
      decode_rgba8(b"definitely not an image"),
      Err(TextureError::ImageError(_))
    ));
  }

  #[test]
  fn missing_file_is_an_io_error() {
    assert!(matches!(
      load_rgba8(Path::new("./no/such/texture.png")),
      Err(TextureError::IOError(_, _))
    ));
  }

  #[test]
  fn anisotropy_follows_device_support() {
    let with = sampler_create_info(Some(16.0));
    assert_eq!(with.anisotropy_enable, vk::TRUE);
    assert_eq!(with.max_anisotropy, 16.0);

    let without = sampler_create_info(None);
    assert_eq!(without.anisotropy_enable, vk::FALSE);
    assert_eq!(without.address_mode_u, vk::SamplerAddressMode::REPEAT);
  }
}
