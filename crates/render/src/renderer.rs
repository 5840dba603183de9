use std::collections::BTreeMap;

use glam::Vec3;
use orrery_common::{Light, Material, RenderHandle, Shape, SurfaceSize};

use crate::camera::CameraState;
use crate::service::{RenderError, RenderService};

/// A render object as tracked by the [`DebugTextRenderer`].
#[derive(Debug, Clone, PartialEq)]
pub struct DebugObject {
    pub shape: Shape,
    pub material: Material,
    pub position: Vec3,
    pub rotation: Vec3,
}

/// Headless rendering service.
///
/// Produces a human-readable text frame per draw call. Useful for CLI output,
/// logging, and testing the render loop without a GPU.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    objects: BTreeMap<RenderHandle, DebugObject>,
    next_handle: u64,
    lights: Vec<Light>,
    size: Option<SurfaceSize>,
    resizes: Vec<SurfaceSize>,
    frames: u64,
    last_camera: Option<CameraState>,
    last_frame: String,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn object(&self, handle: RenderHandle) -> Option<&DebugObject> {
        self.objects.get(&handle)
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Lights in effect; the default star when none were set.
    pub fn lights(&self) -> Vec<Light> {
        if self.lights.is_empty() {
            vec![Light::star()]
        } else {
            self.lights.clone()
        }
    }

    /// Number of frames drawn so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Every backing-store size pushed via [`RenderService::resize`], oldest first.
    pub fn resizes(&self) -> &[SurfaceSize] {
        &self.resizes
    }

    /// Camera state used by the most recent draw.
    pub fn last_camera(&self) -> Option<&CameraState> {
        self.last_camera.as_ref()
    }

    /// Text of the most recent frame.
    pub fn last_frame(&self) -> &str {
        &self.last_frame
    }

    fn render_frame(&self, handles: &[RenderHandle], camera: &CameraState) -> String {
        let mut out = String::new();
        let size = self
            .size
            .map(|s| format!("{}x{}", s.width, s.height))
            .unwrap_or_else(|| "unsized".into());
        out.push_str(&format!("=== Frame {} ({size}) ===\n", self.frames));
        out.push_str(&format!("Objects: {}\n", handles.len()));
        out.push_str(&format!(
            "Camera: eye=({:.1}, {:.1}, {:.1})\n",
            camera.eye.x, camera.eye.y, camera.eye.z
        ));
        for light in self.lights() {
            let [r, g, b] = light.radiance();
            match light {
                Light::Directional { direction: d, .. } => out.push_str(&format!(
                    "Light: directional dir=({:.1}, {:.1}, {:.1}) rgb=({r:.2}, {g:.2}, {b:.2})\n",
                    d[0], d[1], d[2]
                )),
                Light::Point { position: p, .. } => out.push_str(&format!(
                    "Light: point pos=({:.1}, {:.1}, {:.1}) rgb=({r:.2}, {g:.2}, {b:.2})\n",
                    p[0], p[1], p[2]
                )),
            }
        }
        for handle in handles {
            if let Some(obj) = self.objects.get(handle) {
                let p = obj.position;
                let r = obj.rotation;
                out.push_str(&format!(
                    "  [#{}] {:<18} {:<6} pos=({:.2}, {:.2}, {:.2}) rot=({:.2}, {:.2}, {:.2})\n",
                    handle.0,
                    obj.material.name,
                    shape_name(&obj.shape),
                    p.x,
                    p.y,
                    p.z,
                    r.x,
                    r.y,
                    r.z
                ));
            }
        }
        out
    }
}

fn shape_name(shape: &Shape) -> &'static str {
    match shape {
        Shape::Sphere { .. } => "sphere",
        Shape::Cube { .. } => "cube",
        Shape::Ring { .. } => "ring",
    }
}

impl RenderService for DebugTextRenderer {
    fn create_handle(
        &mut self,
        shape: &Shape,
        material: &Material,
    ) -> Result<RenderHandle, RenderError> {
        self.next_handle += 1;
        let handle = RenderHandle(self.next_handle);
        self.objects.insert(
            handle,
            DebugObject {
                shape: *shape,
                material: material.clone(),
                position: Vec3::ZERO,
                rotation: Vec3::ZERO,
            },
        );
        Ok(handle)
    }

    fn set_position(&mut self, handle: RenderHandle, position: Vec3) {
        if let Some(obj) = self.objects.get_mut(&handle) {
            obj.position = position;
        }
    }

    fn set_rotation(&mut self, handle: RenderHandle, rotation: Vec3) {
        if let Some(obj) = self.objects.get_mut(&handle) {
            obj.rotation = rotation;
        }
    }

    fn set_lights(&mut self, lights: &[Light]) {
        self.lights = lights.to_vec();
    }

    fn resize(&mut self, size: SurfaceSize) -> Result<(), RenderError> {
        self.size = Some(size);
        self.resizes.push(size);
        Ok(())
    }

    fn draw(&mut self, handles: &[RenderHandle], camera: &CameraState) -> Result<(), RenderError> {
        if let Some(missing) = handles.iter().find(|h| !self.objects.contains_key(*h)) {
            return Err(RenderError::UnknownHandle(*missing));
        }
        self.frames += 1;
        self.last_frame = self.render_frame(handles, camera);
        self.last_camera = Some(*camera);
        Ok(())
    }
}
