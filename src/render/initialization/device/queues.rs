use ash::vk;

use crate::render::initialization::{Surface, SurfaceError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFamilies {
  pub graphics: u32,
  pub presentation: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum QueueFamilyError {
  #[error("Surface error")]
  SurfaceError(#[source] SurfaceError),
  #[error("Device does not support required queue families")]
  DoesNotSupportRequiredQueueFamilies,
}

impl From<SurfaceError> for QueueFamilyError {
  fn from(value: SurfaceError) -> Self {
    QueueFamilyError::SurfaceError(value)
  }
}

// graphics is the first family with graphics support and presentation the first one that can
// present, unless some family supports both, in which case it is used for both
pub fn select_queue_families<F>(
  properties: &[vk::QueueFamilyProperties],
  mut supports_present: F,
) -> Result<QueueFamilies, QueueFamilyError>
where
  F: FnMut(u32) -> Result<bool, SurfaceError>,
{
  let mut graphics = None;
  let mut presentation = None;

  for (i, props) in properties.iter().enumerate() {
    let index = i as u32;
    if props.queue_count == 0 {
      continue;
    }

    let is_graphics = props.queue_flags.contains(vk::QueueFlags::GRAPHICS);
    let can_present = supports_present(index)?;

    if is_graphics && can_present {
      graphics = Some(index);
      presentation = Some(index);
      break;
    }
    if is_graphics && graphics.is_none() {
      graphics = Some(index);
    }
    if can_present && presentation.is_none() {
      presentation = Some(index);
    }
  }

  match (graphics, presentation) {
    (Some(graphics), Some(presentation)) => Ok(QueueFamilies {
      graphics,
      presentation,
    }),
    _ => Err(QueueFamilyError::DoesNotSupportRequiredQueueFamilies),
  }
}

impl QueueFamilies {
  pub fn get_from_physical_device(
    instance: &ash::Instance,
    physical_device: vk::PhysicalDevice,
    surface: &Surface,
  ) -> Result<Self, QueueFamilyError> {
    let properties =
      unsafe { instance.get_physical_device_queue_family_properties(physical_device) };
    log::debug!("Queue family properties: {:#?}", properties);

    select_queue_families(&properties, |index| unsafe {
      surface.supports_queue_family(physical_device, index)
    })
  }

  pub fn is_shared(&self) -> bool {
    self.graphics == self.presentation
  }

  // each family appears once
  pub fn unique_indices(&self) -> Vec<u32> {
    if self.is_shared() {
      vec![self.graphics]
    } else {
      vec![self.graphics, self.presentation]
    }
  }
}

#[derive(Debug)]
pub struct Queues {
  pub graphics: vk::Queue,
  pub presentation: vk::Queue,
}

static QUEUE_PRIORITIES: [f32; 1] = [1.0];

impl Queues {
  pub fn get_queue_create_infos(
    queue_families: &QueueFamilies,
  ) -> Vec<vk::DeviceQueueCreateInfo<'static>> {
    queue_families
      .unique_indices()
      .into_iter()
      .map(|index| {
        vk::DeviceQueueCreateInfo::default()
          .queue_family_index(index)
          .queue_priorities(&QUEUE_PRIORITIES)
      })
      .collect()
  }

  pub unsafe fn retrieve(device: &ash::Device, queue_families: &QueueFamilies) -> Queues {
    let graphics = device.get_device_queue(queue_families.graphics, 0);
    let presentation = if queue_families.is_shared() {
      graphics
    } else {
      device.get_device_queue(queue_families.presentation, 0)
    };

    Queues {
      graphics,
      presentation,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn family(flags: vk::QueueFlags) -> vk::QueueFamilyProperties {
    vk::QueueFamilyProperties {
      queue_flags: flags,
      queue_count: 1,
      ..Default::default()
    }
  }

  #[test]
  fn prefers_a_family_that_does_both() {
    let properties = [
      family(vk::QueueFlags::GRAPHICS),
      family(vk::QueueFlags::COMPUTE),
      family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE),
    ];
    // family 1 presents, family 2 does both
    let families = select_queue_families(&properties, |i| Ok(i >= 1)).unwrap();
    assert_eq!(
      families,
      QueueFamilies {
        graphics: 2,
        presentation: 2
      }
    );
    assert!(families.is_shared());
    assert_eq!(families.unique_indices(), vec![2]);
  }

  #[test]
  fn falls_back_to_separate_families() {
    let properties = [
      family(vk::QueueFlags::COMPUTE),
      family(vk::QueueFlags::GRAPHICS),
    ];
    let families = select_queue_families(&properties, |i| Ok(i == 0)).unwrap();
    assert_eq!(
      families,
      QueueFamilies {
        graphics: 1,
        presentation: 0
      }
    );
    assert_eq!(families.unique_indices(), vec![1, 0]);
  }

  #[test]
  fn missing_presentation_is_an_error() {
    let properties = [family(vk::QueueFlags::GRAPHICS)];
    assert!(matches!(
      select_queue_families(&properties, |_| Ok(false)),
      Err(QueueFamilyError::DoesNotSupportRequiredQueueFamilies)
    ));
  }

  #[test]
  fn missing_graphics_is_an_error() {
    let properties = [family(vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER)];
    assert!(matches!(
      select_queue_families(&properties, |_| Ok(true)),
      Err(QueueFamilyError::DoesNotSupportRequiredQueueFamilies)
    ));
  }

  #[test]
  fn surface_errors_propagate() {
    let properties = [family(vk::QueueFlags::GRAPHICS)];
    assert!(matches!(
      select_queue_families(&properties, |_| Err(SurfaceError::SurfaceIsLost)),
      Err(QueueFamilyError::SurfaceError(SurfaceError::SurfaceIsLost))
    ));
  }

  #[test]
  fn never_requests_a_family_twice() {
    let shared = QueueFamilies {
      graphics: 0,
      presentation: 0,
    };
    let infos = Queues::get_queue_create_infos(&shared);
    assert_eq!(infos.len(), 1);
    assert_eq!(infos[0].queue_count, 1);

    let separate = QueueFamilies {
      graphics: 0,
      presentation: 3,
    };
    let indices: Vec<u32> = Queues::get_queue_create_infos(&separate)
      .iter()
      .map(|info| info.queue_family_index)
      .collect();
    assert_eq!(indices, vec![0, 3]);
  }
}
