//! Serializable scene descriptors.
//!
//! # YAML format
//! ```yaml
//! name: earth-moon
//! vertical_tilt: 0.2        # default for bodies that do not set their own
//! camera:
//!   eye: [0.0, 4.0, 12.0]
//!   fov_degrees: 60.0
//! lights:                   # omitted: one white point light at the origin
//!   - { type: directional, direction: [0.0, -1.0, 0.0], intensity: 0.5 }
//!   - { type: point, position: [0.0, 0.0, 5.0], color: [1.0, 0.0, 0.0], intensity: 0.5 }
//! bodies:
//!   - id: earth
//!     shape: { type: sphere, radius: 1.0 }
//!     material: { name: earth, shading: basic }
//!     texture: textures/earth.jpg
//!     spin: { period: 10.0 }
//!   - id: moon
//!     shape: { type: sphere, radius: 0.27 }
//!     material: { name: moon }
//!     orbit: { parent: earth, radius: 4.0, period: 273.0 }
//! attachments:
//!   - id: earth-clouds
//!     leader: earth
//!     shape: { type: sphere, radius: 1.02 }
//!     material: { name: clouds, base_color: [1.0, 1.0, 1.0, 0.5] }
//!     spin: { velocity: 0.004 }
//! ```
//!
//! A body without `orbit` is the root. Rates are given either as a `period`
//! in ticks or as a `velocity` in radians per tick, never both.

use std::f64::consts::TAU;
use std::path::Path;

use orrery_common::{BodyId, Light, Material, Shape};
use orrery_kernel::DEFAULT_VERTICAL_TILT;
use serde::{Deserialize, Serialize};

use crate::error::SceneBuildError;

/// Top-level scene description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDescriptor {
    pub name: String,
    /// Tilt applied to every orbit that does not override it.
    #[serde(default = "default_tilt")]
    pub vertical_tilt: f64,
    #[serde(default)]
    pub camera: CameraDescriptor,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lights: Vec<Light>,
    #[serde(default)]
    pub bodies: Vec<BodyDescriptor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<AttachmentDescriptor>,
}

fn default_tilt() -> f64 {
    DEFAULT_VERTICAL_TILT
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraDescriptor {
    pub eye: [f32; 3],
    pub target: [f32; 3],
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraDescriptor {
    fn default() -> Self {
        Self {
            eye: [0.0, 0.0, 5.0],
            target: [0.0, 0.0, 0.0],
            fov_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyDescriptor {
    pub id: BodyId,
    pub shape: Shape,
    #[serde(default)]
    pub material: Material,
    /// Texture path, relative to the assets root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orbit: Option<OrbitDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spin: Option<SpinDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrbitDescriptor {
    pub parent: BodyId,
    pub radius: f64,
    #[serde(flatten)]
    pub rate: Rate,
    #[serde(default)]
    pub phase: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertical_tilt: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinDescriptor {
    #[serde(flatten)]
    pub rate: Rate,
    #[serde(default = "default_axis")]
    pub axis: [f64; 3],
}

fn default_axis() -> [f64; 3] {
    [0.0, 1.0, 0.0]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachmentDescriptor {
    pub id: BodyId,
    pub leader: BodyId,
    #[serde(default)]
    pub offset: [f64; 3],
    pub shape: Shape,
    #[serde(default)]
    pub material: Material,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spin: Option<SpinDescriptor>,
}

/// An angular rate, either as a period in ticks or as radians per tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity: Option<f64>,
}

impl Rate {
    pub fn period(period: f64) -> Self {
        Self {
            period: Some(period),
            velocity: None,
        }
    }

    pub fn velocity(velocity: f64) -> Self {
        Self {
            period: None,
            velocity: Some(velocity),
        }
    }

    /// Radians per tick. An unset rate is zero; a negative period runs backwards.
    pub fn radians_per_tick(
        &self,
        id: &BodyId,
        field: &'static str,
    ) -> Result<f64, SceneBuildError> {
        match (self.period, self.velocity) {
            (Some(_), Some(_)) => Err(SceneBuildError::ConflictingRate {
                id: id.clone(),
                field,
            }),
            (Some(period), None) => Ok(TAU / period),
            (None, Some(velocity)) => Ok(velocity),
            (None, None) => Ok(0.0),
        }
    }
}

impl SpinDescriptor {
    pub fn new(rate: Rate, axis: [f64; 3]) -> Self {
        Self { rate, axis }
    }
}

impl SceneDescriptor {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, SceneBuildError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SceneBuildError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn to_yaml(&self) -> Result<String, SceneBuildError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Every texture path referenced by a body or attachment, in declaration order.
    pub fn texture_paths(&self) -> impl Iterator<Item = &str> {
        let bodies = self.bodies.iter().filter_map(|b| b.texture.as_deref());
        let attachments = self.attachments.iter().filter_map(|a| a.texture.as_deref());
        bodies.chain(attachments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EARTH_MOON: &str = r#"
name: earth-moon
camera:
  eye: [0.0, 4.0, 12.0]
  fov_degrees: 60.0
lights:
  - { type: directional, direction: [0.0, -1.0, 0.0], intensity: 0.5 }
  - { type: point, position: [0.0, 0.0, 5.0], color: [1.0, 0.0, 0.0] }
bodies:
  - id: earth
    shape: { type: sphere, radius: 1.0 }
    material: { name: earth }
    texture: textures/earth.jpg
    spin: { period: 10.0 }
  - id: moon
    shape: { type: sphere, radius: 0.27 }
    material: { name: moon, shading: basic }
    orbit: { parent: earth, radius: 4.0, period: 273.0, vertical_tilt: 0.0 }
attachments:
  - id: earth-clouds
    leader: earth
    shape: { type: sphere, radius: 1.02 }
    material: { name: clouds, base_color: [1.0, 1.0, 1.0, 0.5] }
    spin: { velocity: 0.004 }
"#;

    #[test]
    fn parses_yaml_with_defaults() {
        let desc = SceneDescriptor::from_yaml_str(EARTH_MOON).unwrap();
        assert_eq!(desc.name, "earth-moon");
        assert_eq!(desc.vertical_tilt, DEFAULT_VERTICAL_TILT);
        assert_eq!(desc.camera.fov_degrees, 60.0);
        assert_eq!(desc.camera.far, 1000.0);
        assert_eq!(desc.bodies.len(), 2);
        assert_eq!(
            desc.lights,
            [
                Light::Directional {
                    direction: [0.0, -1.0, 0.0],
                    color: [1.0, 1.0, 1.0],
                    intensity: 0.5,
                },
                Light::Point {
                    position: [0.0, 0.0, 5.0],
                    color: [1.0, 0.0, 0.0],
                    intensity: 1.0,
                },
            ]
        );

        let earth = &desc.bodies[0];
        assert!(earth.orbit.is_none());
        let spin = earth.spin.as_ref().unwrap();
        assert_eq!(spin.rate, Rate::period(10.0));
        assert_eq!(spin.axis, [0.0, 1.0, 0.0]);

        let orbit = desc.bodies[1].orbit.as_ref().unwrap();
        assert_eq!(orbit.parent, BodyId::from("earth"));
        assert_eq!(orbit.phase, 0.0);
        assert_eq!(orbit.vertical_tilt, Some(0.0));

        assert!(desc.attachments[0].material.is_translucent());
        assert_eq!(desc.attachments[0].offset, [0.0; 3]);
    }

    #[test]
    fn yaml_round_trips() {
        let desc = SceneDescriptor::from_yaml_str(EARTH_MOON).unwrap();
        let again = SceneDescriptor::from_yaml_str(&desc.to_yaml().unwrap()).unwrap();
        assert_eq!(desc, again);
    }

    #[test]
    fn rate_conversion() {
        let id = BodyId::from("x");
        assert_eq!(Rate::default().radians_per_tick(&id, "spin").unwrap(), 0.0);
        assert_eq!(Rate::velocity(0.5).radians_per_tick(&id, "spin").unwrap(), 0.5);
        let w = Rate::period(100.0).radians_per_tick(&id, "orbit").unwrap();
        assert!((w - TAU / 100.0).abs() < 1e-15);
    }

    #[test]
    fn conflicting_rate_is_rejected() {
        let rate = Rate {
            period: Some(10.0),
            velocity: Some(1.0),
        };
        let err = rate.radians_per_tick(&"moon".into(), "orbit").unwrap_err();
        assert!(matches!(
            err,
            SceneBuildError::ConflictingRate { field: "orbit", .. }
        ));
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let err = SceneDescriptor::from_yaml_str("name: [unterminated").unwrap_err();
        assert!(matches!(err, SceneBuildError::Yaml(_)));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.yaml");
        std::fs::write(&path, EARTH_MOON).unwrap();
        let desc = SceneDescriptor::from_path(&path).unwrap();
        assert_eq!(desc.texture_paths().collect::<Vec<_>>(), ["textures/earth.jpg"]);

        let missing = SceneDescriptor::from_path(dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(missing, SceneBuildError::Io(_)));
    }
}
