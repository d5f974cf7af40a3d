use winit::{
  dpi::PhysicalSize,
  error::EventLoopError,
  event::{Event, WindowEvent},
  event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget},
  window::{Window, WindowBuilder},
};

use crate::{
  checkpoint::Checkpoint,
  render::{
    error_chain_fmt, FrameRenderError, InitializationError, ManuallyDestroyed, RenderEngine,
  },
  INITIAL_WINDOW_HEIGHT, INITIAL_WINDOW_WIDTH, WINDOW_TITLE,
};

#[derive(thiserror::Error)]
pub enum AppError {
  #[error("Failed to run the event loop")]
  EventLoop(#[source] EventLoopError),
  #[error("Failed to initialize")]
  Initialization(#[source] InitializationError),
  #[error("Failed to render a frame")]
  FrameRender(#[source] FrameRenderError),
}
impl std::fmt::Debug for AppError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    error_chain_fmt(self, f)
  }
}

impl From<EventLoopError> for AppError {
  fn from(value: EventLoopError) -> Self {
    AppError::EventLoop(value)
  }
}

impl From<InitializationError> for AppError {
  fn from(value: InitializationError) -> Self {
    AppError::Initialization(value)
  }
}

impl From<FrameRenderError> for AppError {
  fn from(value: FrameRenderError) -> Self {
    AppError::FrameRender(value)
  }
}

// frames are drawn continuously only while there is something to present to
fn control_flow(presents: bool, window_size: PhysicalSize<u32>) -> ControlFlow {
  if presents && window_size.width != 0 && window_size.height != 0 {
    ControlFlow::Poll
  } else {
    ControlFlow::Wait
  }
}

// Vulkan objects are created once the window exists and destroyed before it
struct App {
  checkpoint: Checkpoint,
  // declared before the window so that it is dropped first
  render: Option<RenderEngine>,
  window: Option<Window>,
}

impl App {
  fn new(checkpoint: Checkpoint) -> Self {
    Self {
      checkpoint,
      render: None,
      window: None,
    }
  }

  fn resumed(&mut self, target: &EventLoopWindowTarget<()>) -> Result<(), AppError> {
    if self.window.is_some() {
      return Ok(());
    }

    let window = WindowBuilder::new()
      .with_title(WINDOW_TITLE)
      .with_inner_size(PhysicalSize::new(INITIAL_WINDOW_WIDTH, INITIAL_WINDOW_HEIGHT))
      .with_resizable(true)
      .build(target)
      .map_err(InitializationError::from)?;

    let render = RenderEngine::new(&window, self.checkpoint)?;
    target.set_control_flow(control_flow(render.presents(), window.inner_size()));

    self.render = Some(render);
    self.window = Some(window);
    Ok(())
  }

  fn handle_event(
    &mut self,
    event: Event<()>,
    target: &EventLoopWindowTarget<()>,
  ) -> Result<(), AppError> {
    match event {
      Event::Resumed => self.resumed(target)?,
      Event::AboutToWait => {
        if let (Some(window), Some(render)) = (self.window.as_ref(), self.render.as_ref()) {
          // a minimized window gets woken up again by its Resized event
          let flow = control_flow(render.presents(), window.inner_size());
          target.set_control_flow(flow);
          if flow == ControlFlow::Poll {
            window.request_redraw();
          }
        }
      }
      Event::WindowEvent { event, .. } => match event {
        WindowEvent::CloseRequested => {
          log::info!("Close requested");
          target.exit();
        }
        WindowEvent::Resized(new_size) => {
          if let Some(render) = self.render.as_mut() {
            render.window_resized(new_size);
          }
        }
        WindowEvent::RedrawRequested => {
          if let Some(render) = self.render.as_mut() {
            render.render_frame()?;
          }
        }
        _ => {}
      },
      Event::LoopExiting => self.destroy(),
      _ => {}
    }
    Ok(())
  }

  fn destroy(&mut self) {
    if let Some(render) = self.render.take() {
      unsafe { render.destroy_self() };
    }
    self.window = None;
  }
}

pub fn run(checkpoint: Checkpoint) -> Result<(), AppError> {
  let event_loop = EventLoop::new()?;
  let mut app = App::new(checkpoint);
  let mut result = Ok(());

  event_loop.run(|event, target| {
    if let Err(err) = app.handle_event(event, target) {
      result = Err(err);
      target.exit();
    }
  })?;

  // the loop may have stopped without a LoopExiting event
  app.destroy();
  result
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn polls_only_while_presenting_to_a_visible_window() {
    assert_eq!(
      control_flow(true, PhysicalSize::new(800, 600)),
      ControlFlow::Poll
    );
    assert_eq!(control_flow(true, PhysicalSize::new(0, 0)), ControlFlow::Wait);
    assert_eq!(
      control_flow(true, PhysicalSize::new(800, 0)),
      ControlFlow::Wait
    );
    assert_eq!(
      control_flow(false, PhysicalSize::new(800, 600)),
      ControlFlow::Wait
    );
  }
}
