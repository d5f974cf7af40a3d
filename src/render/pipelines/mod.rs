use ash::vk;

use crate::render::{errors::OutOfMemoryError, shaders::ShaderError};

mod graphics;

pub use graphics::GraphicsPipeline;

#[derive(Debug, thiserror::Error)]
pub enum PipelineCreationError {
  #[error("Out of memory")]
  OutOfMemory(#[source] OutOfMemoryError),
  #[error("Failed to load shader")]
  ShaderFailed(#[source] ShaderError),
  #[error("Failed to compile or link shaders")]
  CompilationFailed,
  #[error("Unexpected pipeline creation result: {0:?}")]
  Unknown(vk::Result),
}

impl From<OutOfMemoryError> for PipelineCreationError {
  fn from(value: OutOfMemoryError) -> Self {
    PipelineCreationError::OutOfMemory(value)
  }
}

impl From<ShaderError> for PipelineCreationError {
  fn from(value: ShaderError) -> Self {
    PipelineCreationError::ShaderFailed(value)
  }
}

impl From<vk::Result> for PipelineCreationError {
  fn from(value: vk::Result) -> Self {
    match value {
      vk::Result::ERROR_OUT_OF_HOST_MEMORY | vk::Result::ERROR_OUT_OF_DEVICE_MEMORY => {
        PipelineCreationError::OutOfMemory(value.into())
      }
      vk::Result::ERROR_INVALID_SHADER_NV => PipelineCreationError::CompilationFailed,
      other => PipelineCreationError::Unknown(other),
    }
  }
}
