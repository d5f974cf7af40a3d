use std::mem::{offset_of, size_of};

use ash::vk;

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Vertex {
  pub pos: [f32; 2],
  pub color: [f32; 3],
  pub tex_coord: [f32; 2],
}

impl Vertex {
  pub const ATTRIBUTE_SIZE: usize = 3;

  pub const fn get_binding_description(binding: u32) -> vk::VertexInputBindingDescription {
    vk::VertexInputBindingDescription {
      binding,
      stride: size_of::<Self>() as u32,
      input_rate: vk::VertexInputRate::VERTEX,
    }
  }

  pub const fn get_attribute_descriptions(
    binding: u32,
  ) -> [vk::VertexInputAttributeDescription; Self::ATTRIBUTE_SIZE] {
    [
      vk::VertexInputAttributeDescription {
        location: 0,
        binding,
        format: vk::Format::R32G32_SFLOAT,
        offset: offset_of!(Self, pos) as u32,
      },
      vk::VertexInputAttributeDescription {
        location: 1,
        binding,
        format: vk::Format::R32G32B32_SFLOAT,
        offset: offset_of!(Self, color) as u32,
      },
      vk::VertexInputAttributeDescription {
        location: 2,
        binding,
        format: vk::Format::R32G32_SFLOAT,
        offset: offset_of!(Self, tex_coord) as u32,
      },
    ]
  }
}

// counter-clockwise quad facing +Z
pub const VERTICES: [Vertex; 4] = [
  Vertex {
    pos: [-0.5, -0.5],
    color: [1.0, 0.0, 0.0],
    tex_coord: [1.0, 0.0],
  },
  Vertex {
    pos: [0.5, -0.5],
    color: [0.0, 1.0, 0.0],
    tex_coord: [0.0, 0.0],
  },
  Vertex {
    pos: [0.5, 0.5],
    color: [0.0, 0.0, 1.0],
    tex_coord: [0.0, 1.0],
  },
  Vertex {
    pos: [-0.5, 0.5],
    color: [1.0, 1.0, 1.0],
    tex_coord: [1.0, 1.0],
  },
];

pub const INDICES: [u16; 6] = [0, 1, 2, 2, 3, 0];

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn layout_matches_shader_inputs() {
    let binding = Vertex::get_binding_description(0);
    assert_eq!(binding.stride, 28);
    assert_eq!(binding.input_rate, vk::VertexInputRate::VERTEX);

    let attributes = Vertex::get_attribute_descriptions(0);
    let offsets: Vec<u32> = attributes.iter().map(|a| a.offset).collect();
    let locations: Vec<u32> = attributes.iter().map(|a| a.location).collect();
    assert_eq!(offsets, vec![0, 8, 20]);
    assert_eq!(locations, vec![0, 1, 2]);
    assert_eq!(attributes[1].format, vk::Format::R32G32B32_SFLOAT);
  }

  #[test]
  fn indices_reference_existing_vertices() {
    assert!(INDICES.iter().all(|&i| (i as usize) < VERTICES.len()));
    assert_eq!(INDICES, [0, 1, 2, 2, 3, 0]);
  }

  #[test]
  fn quad_winds_counter_clockwise() {
    // signed area of the first triangle
    let [a, b, c] = [0, 1, 2].map(|i| VERTICES[INDICES[i] as usize].pos);
    let area = (b[0] - a[0]) * (c[1] - a[1]) - (c[0] - a[0]) * (b[1] - a[1]);
    assert!(area > 0.0);
  }
}
