use glam::Vec3;
use orrery_common::{Light, Material, RenderHandle, Shape, SurfaceSize};

use crate::camera::CameraState;

/// Errors raised by a rendering service. There is no partial-frame recovery:
/// the render loop stops and hands these to the host.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("surface error: {0}")]
    Surface(String),
    #[error("render backend error: {0}")]
    Backend(String),
    #[error("unknown render handle {0:?}")]
    UnknownHandle(RenderHandle),
}

/// Renderer-agnostic interface. All rendering services implement this trait.
///
/// The service owns every render object; the engine only keeps the opaque
/// [`RenderHandle`]s it hands out and pushes placements into them each frame.
pub trait RenderService {
    /// Create a render object and return its handle.
    fn create_handle(&mut self, shape: &Shape, material: &Material)
        -> Result<RenderHandle, RenderError>;

    /// Move a render object. Unknown handles are ignored.
    fn set_position(&mut self, handle: RenderHandle, position: Vec3);

    /// Set a render object's Euler XYZ rotation in radians. Unknown handles are ignored.
    fn set_rotation(&mut self, handle: RenderHandle, rotation: Vec3);

    /// Replace the scene's lights. An empty slice means a single
    /// [`Light::star`] at the origin.
    fn set_lights(&mut self, lights: &[Light]);

    /// The drawing surface's backing store changed size.
    fn resize(&mut self, size: SurfaceSize) -> Result<(), RenderError>;

    /// Draw one frame containing `handles` as seen by `camera`.
    fn draw(&mut self, handles: &[RenderHandle], camera: &CameraState) -> Result<(), RenderError>;
}
