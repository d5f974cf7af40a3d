mod app;
mod checkpoint;
mod render;
mod utility;

use std::{ffi::CStr, process::ExitCode};

use ash::vk;

use checkpoint::Checkpoint;

pub const WINDOW_TITLE: &str = "Vulkan";
pub const INITIAL_WINDOW_WIDTH: u32 = 800;
pub const INITIAL_WINDOW_HEIGHT: u32 = 600;

pub const APPLICATION_NAME: &CStr = c"Hello Triangle";
pub const APPLICATION_VERSION: u32 = vk::make_api_version(0, 1, 0, 0);

// MAILBOX renders as fast as possible without tearing, FIFO (vsync) is used when it is
// not available
pub const PREFERRED_PRESENTATION_METHOD: vk::PresentModeKHR = vk::PresentModeKHR::MAILBOX;

pub const BACKGROUND_COLOR: vk::ClearColorValue = vk::ClearColorValue {
  float32: [0.0, 0.0, 0.0, 1.0],
};

// relative to the working directory
pub const TEXTURE_PATH: &str = "./textures/texture.png";
pub const VERTEX_SHADER_PATH: &str = "./shaders/vert.spv";
pub const FRAGMENT_SHADER_PATH: &str = "./shaders/frag.spv";

fn main() -> ExitCode {
  env_logger::init();

  let checkpoint = match Checkpoint::from_args(std::env::args()) {
    Ok(checkpoint) => checkpoint,
    Err(err) => {
      log::error!("{}", err);
      return ExitCode::FAILURE;
    }
  };
  log::info!("Running checkpoint \"{}\"", checkpoint);

  match app::run(checkpoint) {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      log::error!("{:?}", err);
      ExitCode::FAILURE
    }
  }
}
