use std::ffi::CStr;

use ash::vk;

// this module contains general functions used in other modules

pub fn parse_vulkan_api_version(v: u32) -> String {
  format!(
    "{}.{}.{}",
    vk::api_version_major(v),
    vk::api_version_minor(v),
    vk::api_version_patch(v)
  )
}

// returns every item of `required` that is not contained in `available`
// `available` gets sorted in the process
pub fn not_in_slice<'a, 'b, A: Ord, B: ?Sized, F>(
  available: &'a mut [A],
  required: &mut dyn Iterator<Item = &'b B>,
  f: F,
) -> Box<[&'b B]>
where
  F: Fn(&A, &B) -> std::cmp::Ordering,
{
  available.sort();
  required
    .filter(|req| available.binary_search_by(|av| f(av, *req)).is_err())
    .collect()
}

// c strings with invalid utf-8 get displayed lossily
pub fn c_str_to_string(s: &CStr) -> String {
  s.to_string_lossy().into_owned()
}

pub unsafe fn any_as_u8_slice<T: Sized>(p: &T) -> &[u8] {
  std::slice::from_raw_parts((p as *const T) as *const u8, std::mem::size_of::<T>())
}

pub trait OnErr<T, E> {
  fn on_err<O: FnOnce(&E)>(self, op: O) -> Result<T, E>
  where
    Self: Sized;
}

impl<T, E> OnErr<T, E> for Result<T, E> {
  fn on_err<O: FnOnce(&E)>(self, op: O) -> Result<T, E>
  where
    Self: Sized,
  {
    if let Err(ref e) = self {
      op(e);
    }
    self
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn formats_api_versions() {
    assert_eq!(parse_vulkan_api_version(vk::API_VERSION_1_0), "1.0.0");
    assert_eq!(
      parse_vulkan_api_version(vk::make_api_version(0, 1, 3, 275)),
      "1.3.275"
    );
  }

  #[test]
  fn finds_missing_names() {
    let mut available = vec![
      "VK_KHR_surface".to_owned(),
      "VK_EXT_debug_utils".to_owned(),
      "VK_KHR_xcb_surface".to_owned(),
    ];
    let required: [&CStr; 3] = [c"VK_KHR_surface", c"VK_KHR_wayland_surface", c"VK_EXT_debug_utils"];

    let missing = not_in_slice(
      available.as_mut_slice(),
      &mut required.iter().copied(),
      |a, b| a.as_str().cmp(b.to_str().unwrap()),
    );

    assert_eq!(missing.as_ref(), &[c"VK_KHR_wayland_surface"]);
  }

  #[test]
  fn nothing_missing_when_all_available() {
    let mut available = vec![1, 5, 3];
    let required = [3, 1];
    let missing = not_in_slice(available.as_mut_slice(), &mut required.iter(), |a, b| {
      a.cmp(b)
    });
    assert!(missing.is_empty());
  }

  #[test]
  fn on_err_only_runs_on_errors() {
    let mut calls = 0;
    let ok: Result<u32, &str> = Ok(1);
    let _ = ok.on_err(|_| calls += 1);
    let err: Result<u32, &str> = Err("failed");
    assert_eq!(err.on_err(|_| calls += 1), Err("failed"));
    assert_eq!(calls, 1);
  }

  #[test]
  fn reads_bytes_of_plain_values() {
    let value: [u16; 2] = [0x0102, 0x0304];
    let bytes = unsafe { any_as_u8_slice(&value) };
    assert_eq!(bytes.len(), 4);
    assert_eq!(u16::from_ne_bytes([bytes[0], bytes[1]]), 0x0102);
  }
}
