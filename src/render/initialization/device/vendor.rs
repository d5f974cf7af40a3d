use std::fmt::Display;

use crate::utility;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vendor {
  Nvidia,
  Amd,
  Arm,
  Intel,
  ImgTec,
  Qualcomm,
  Mesa,
  Unknown(u32),
}

impl Vendor {
  pub fn from_id(id: u32) -> Self {
    match id {
      0x1002 => Self::Amd,
      0x1010 => Self::ImgTec,
      0x10DE => Self::Nvidia,
      0x13B5 => Self::Arm,
      0x5143 => Self::Qualcomm,
      0x8086 => Self::Intel,
      // VK_VENDOR_ID_MESA, used by software implementations like lavapipe
      0x10005 => Self::Mesa,
      _ => Self::Unknown(id),
    }
  }

  // the Vulkan packing is variant (3 bits), major (7), minor (10), patch (12)
  // vendors with their own packing need their own parsing
  pub fn parse_driver_version(&self, v: u32) -> String {
    match self {
      Self::Nvidia => {
        // major (10 bits), minor (8), secondary branch (8), tertiary branch (6)
        let eight_bits = 0b1111_1111;
        let six_bits = 0b11_1111;
        format!(
          "{}.{}.{}.{}",
          v >> (32 - 10),
          (v >> (32 - 10 - 8)) & eight_bits,
          (v >> (32 - 10 - 8 - 8)) & eight_bits,
          v & six_bits
        )
      }
      _ => utility::parse_vulkan_api_version(v),
    }
  }
}

impl Display for Vendor {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Nvidia => f.write_str("NVIDIA"),
      Self::Amd => f.write_str("AMD"),
      Self::Arm => f.write_str("ARM"),
      Self::Intel => f.write_str("INTEL"),
      Self::ImgTec => f.write_str("ImgTec"),
      Self::Qualcomm => f.write_str("Qualcomm"),
      Self::Mesa => f.write_str("Mesa"),
      Self::Unknown(id) => write!(f, "Unknown ({:#x})", id),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use ash::vk;

  #[test]
  fn known_vendor_ids() {
    assert_eq!(Vendor::from_id(0x10DE), Vendor::Nvidia);
    assert_eq!(Vendor::from_id(0x8086), Vendor::Intel);
    assert_eq!(Vendor::from_id(0x1234), Vendor::Unknown(0x1234));
    assert_eq!(Vendor::Unknown(0x1234).to_string(), "Unknown (0x1234)");
  }

  #[test]
  fn nvidia_driver_versions_use_their_own_packing() {
    // 535.113.1.0
    let packed = (535 << 22) | (113 << 14) | (1 << 6);
    assert_eq!(Vendor::Nvidia.parse_driver_version(packed), "535.113.1.0");
  }

  #[test]
  fn other_vendors_use_vulkan_packing() {
    let packed = vk::make_api_version(0, 23, 1, 4);
    assert_eq!(Vendor::Amd.parse_driver_version(packed), "23.1.4");
  }
}
