use std::{
  fs::File,
  io::{self, Read, Seek},
  path::Path,
};

use ash::vk;

mod shader;

pub use shader::Shader;

use crate::render::errors::OutOfMemoryError;

#[derive(thiserror::Error, Debug)]
pub enum ShaderError {
  #[error("\"{1}\" IO error (were the shaders compiled with `make shaders`?)")]
  IOError(#[source] io::Error, String),

  #[error("Shader code is invalid")]
  Invalid,

  #[error("Not enough memory")]
  NotEnoughMemory(#[source] OutOfMemoryError),
}

pub fn load_shader(
  device: &ash::Device,
  shader_path: &Path,
) -> Result<vk::ShaderModule, ShaderError> {
  let code = File::open(shader_path)
    .and_then(|mut file| read_shader_code(&mut file))
    .map_err(|err| ShaderError::IOError(err, shader_path.display().to_string()))?;
  create_shader_module(device, &code)
}

// SPIR-V is a sequence of u32 words, checked for size and magic number
fn read_shader_code<R: Read + Seek>(reader: &mut R) -> io::Result<Vec<u32>> {
  ash::util::read_spv(reader)
}

fn create_shader_module(
  device: &ash::Device,
  code: &[u32],
) -> Result<vk::ShaderModule, ShaderError> {
  let create_info = vk::ShaderModuleCreateInfo::default().code(code);

  unsafe { device.create_shader_module(&create_info, None) }.map_err(|vkerr| match vkerr {
    vk::Result::ERROR_OUT_OF_HOST_MEMORY | vk::Result::ERROR_OUT_OF_DEVICE_MEMORY => {
      ShaderError::NotEnoughMemory(vkerr.into())
    }
    _ => ShaderError::Invalid,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Cursor;

  const SPIRV_MAGIC: u32 = 0x0723_0203;

  #[test]
  fn reads_words() {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&SPIRV_MAGIC.to_le_bytes());
    bytes.extend_from_slice(&0x0001_0000u32.to_le_bytes());

    let code = read_shader_code(&mut Cursor::new(bytes)).unwrap();
    assert_eq!(code, vec![SPIRV_MAGIC, 0x0001_0000]);
  }

  #[test]
  fn rejects_truncated_code() {
    let mut bytes = SPIRV_MAGIC.to_le_bytes().to_vec();
    bytes.push(0);
    assert!(read_shader_code(&mut Cursor::new(bytes)).is_err());
  }

  #[test]
  fn missing_file_names_the_path() {
    let path = Path::new("./does/not/exist.spv");
    let err = File::open(path)
      .and_then(|mut file| read_shader_code(&mut file))
      .map_err(|err| ShaderError::IOError(err, path.display().to_string()))
      .unwrap_err();
    assert!(err.to_string().contains("./does/not/exist.spv"));
  }
}
