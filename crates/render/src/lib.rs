//! Rendering seam and render-loop driver.
//!
//! # Invariants
//! - Rendering services never mutate simulation state; they only receive
//!   placements derived from the [`orrery_kernel::OrbitalSystem`].
//! - A surface resize reaches the camera projection and the rendering service
//!   before the draw of the same frame.
//! - Each [`RenderLoop::step`] advances the kinematics exactly once.
//!
//! The [`DebugTextRenderer`] is a headless [`RenderService`] that formats each
//! frame as text. The GPU backend lives in `orrery-render-wgpu` and implements
//! the same trait.

mod camera;
mod driver;
mod renderer;
mod service;
mod viewport;

pub use camera::{Camera, CameraState, PerspectiveCamera};
pub use driver::{
    CancelToken, FrameQueue, LoopState, RenderLoop, SceneContext, Scheduler, StepOutcome,
};
pub use renderer::{DebugObject, DebugTextRenderer};
pub use service::{RenderError, RenderService};
pub use viewport::{DisplaySurface, OffscreenSurface, check_resize};
