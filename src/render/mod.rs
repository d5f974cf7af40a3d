mod allocator;
mod command_pools;
mod create_objs;
mod data;
mod descriptor_sets;
mod device_destroyable;
mod engine;
mod errors;
mod frame;
mod initialization;
mod pipelines;
mod render_pass;
mod renderer;
mod shaders;
mod swapchain;
mod sync_renderer;
mod vertex;

use std::ffi::CStr;

use ash::vk;

pub const TARGET_API_VERSION: u32 = vk::API_VERSION_1_0;

pub const REQUIRED_DEVICE_EXTENSIONS: [&CStr; 1] = [ash::khr::swapchain::NAME];

#[cfg(feature = "vl")]
pub const VALIDATION_LAYERS: [&CStr; 1] = [c"VK_LAYER_KHRONOS_validation"];

pub const FRAMES_IN_FLIGHT: usize = 2;

pub use device_destroyable::ManuallyDestroyed;
pub use engine::RenderEngine;
pub use errors::{error_chain_fmt, FrameRenderError, InitializationError};
