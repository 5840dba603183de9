use glam::{Mat4, Vec3};

/// Projection seam used by the render loop.
///
/// The aspect ratio is settable at any time, but the projection only changes
/// when [`recompute_projection`](Camera::recompute_projection) is called.
pub trait Camera {
    fn set_aspect(&mut self, aspect: f32);
    fn recompute_projection(&mut self);
    fn state(&self) -> CameraState;
}

/// What a rendering service needs from the camera to draw a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub eye: Vec3,
    pub view: Mat4,
    pub projection: Mat4,
}

impl CameraState {
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }
}

/// Perspective camera looking from `eye` at `target`.
/// Camera motion is NOT part of the simulation; nothing in the kernel reads it.
#[derive(Debug, Clone)]
pub struct PerspectiveCamera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in radians.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    projection: Mat4,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, 75.0)
    }
}

impl PerspectiveCamera {
    pub fn new(eye: Vec3, target: Vec3, fov_degrees: f32) -> Self {
        let mut camera = Self {
            eye,
            target,
            up: Vec3::Y,
            fov: fov_degrees.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
            projection: Mat4::IDENTITY,
        };
        camera.recompute_projection();
        camera
    }

    pub fn with_clip(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self.recompute_projection();
        self
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.eye).try_normalize().unwrap_or(Vec3::NEG_Z)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    /// The cached projection, as of the last recompute.
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }
}

impl Camera for PerspectiveCamera {
    fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    fn recompute_projection(&mut self) {
        self.projection = Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far);
    }

    fn state(&self) -> CameraState {
        CameraState {
            eye: self.eye,
            view: self.view_matrix(),
            projection: self.projection,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_camera() {
        let cam = PerspectiveCamera::default();
        assert_eq!(cam.eye, Vec3::new(0.0, 0.0, 5.0));
        let vp = cam.state().view_projection();
        // Should produce a valid matrix (no NaN)
        assert!(!vp.col(0).x.is_nan());
        assert!((cam.forward() - Vec3::NEG_Z).length() < 1e-6);
    }

    #[test]
    fn projection_is_stale_until_recomputed() {
        let mut cam = PerspectiveCamera::default();
        let before = cam.projection_matrix();
        cam.set_aspect(4.0 / 3.0);
        assert_eq!(cam.projection_matrix(), before);

        cam.recompute_projection();
        let after = cam.projection_matrix();
        assert_ne!(after, before);
        assert_eq!(
            after,
            Mat4::perspective_rh(cam.fov, 4.0 / 3.0, cam.near, cam.far)
        );
    }

    #[test]
    fn eye_at_target_does_not_produce_nan_forward() {
        let cam = PerspectiveCamera::new(Vec3::ONE, Vec3::ONE, 60.0);
        assert!(cam.forward().is_finite());
    }
}
