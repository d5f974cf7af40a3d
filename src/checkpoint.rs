use std::{fmt, str::FromStr};

// How far into the tutorial sequence the application goes.
// Every checkpoint creates everything the previous ones do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Checkpoint {
  // instance, validation layers and an empty window
  Instance,
  // + surface, physical device and logical device with its queues
  Device,
  // + swapchain and a cleared frame presented every redraw
  Presentation,
  // + pipeline, textured quad and per-frame uniform animation
  #[default]
  Textured,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Unknown checkpoint \"{0}\" (expected one of: instance, device, presentation, textured)")]
pub struct UnknownCheckpoint(pub String);

impl Checkpoint {
  pub const ALL: [Checkpoint; 4] = [
    Checkpoint::Instance,
    Checkpoint::Device,
    Checkpoint::Presentation,
    Checkpoint::Textured,
  ];

  // the first argument (after the program name) selects the checkpoint
  pub fn from_args<I: IntoIterator<Item = String>>(args: I) -> Result<Self, UnknownCheckpoint> {
    match args.into_iter().nth(1) {
      Some(arg) => arg.parse(),
      None => Ok(Self::default()),
    }
  }

  pub fn requires(self, other: Checkpoint) -> bool {
    self >= other
  }

  pub fn name(self) -> &'static str {
    match self {
      Checkpoint::Instance => "instance",
      Checkpoint::Device => "device",
      Checkpoint::Presentation => "presentation",
      Checkpoint::Textured => "textured",
    }
  }
}

impl FromStr for Checkpoint {
  type Err = UnknownCheckpoint;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let lowercase = s.trim().to_ascii_lowercase();
    // by name or by position, starting at 1
    Self::ALL
      .into_iter()
      .enumerate()
      .find(|(i, checkpoint)| checkpoint.name() == lowercase || (i + 1).to_string() == lowercase)
      .map(|(_, checkpoint)| checkpoint)
      .ok_or_else(|| UnknownCheckpoint(s.to_owned()))
  }
}

impl fmt::Display for Checkpoint {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
  }

  #[test]
  fn parses_names_and_numbers() {
    assert_eq!("instance".parse::<Checkpoint>(), Ok(Checkpoint::Instance));
    assert_eq!("Device".parse::<Checkpoint>(), Ok(Checkpoint::Device));
    assert_eq!(" PRESENTATION ".parse::<Checkpoint>(), Ok(Checkpoint::Presentation));
    assert_eq!("4".parse::<Checkpoint>(), Ok(Checkpoint::Textured));
  }

  #[test]
  fn rejects_unknown_names() {
    let err = "swapchain".parse::<Checkpoint>().unwrap_err();
    assert_eq!(err, UnknownCheckpoint("swapchain".to_owned()));
    assert!(err.to_string().contains("presentation"));
  }

  #[test]
  fn defaults_to_last_checkpoint() {
    assert_eq!(
      Checkpoint::from_args(args(&["hello-triangle"])),
      Ok(Checkpoint::Textured)
    );
    assert_eq!(
      Checkpoint::from_args(args(&["hello-triangle", "device", "ignored"])),
      Ok(Checkpoint::Device)
    );
  }

  #[test]
  fn later_checkpoints_require_earlier_ones() {
    assert!(Checkpoint::Textured.requires(Checkpoint::Presentation));
    assert!(Checkpoint::Device.requires(Checkpoint::Device));
    assert!(!Checkpoint::Instance.requires(Checkpoint::Device));
  }

  #[test]
  fn names_round_trip() {
    for checkpoint in Checkpoint::ALL {
      assert_eq!(checkpoint.name().parse::<Checkpoint>(), Ok(checkpoint));
    }
  }
}
