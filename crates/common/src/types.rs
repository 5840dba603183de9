use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable, human-readable identifier of a body or attachment ("earth", "saturn-rings").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BodyId(String);

impl BodyId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BodyId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for BodyId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Opaque reference to an object owned by a rendering service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RenderHandle(pub u64);

/// Identifier of a cached asset (currently textures), keyed by its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(pub u64);

/// Pixel dimensions of a drawing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Clamp both dimensions to at least one pixel.
    pub fn at_least_one(self) -> Self {
        Self {
            width: self.width.max(1),
            height: self.height.max(1),
        }
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

/// Geometry requested from a rendering service.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    Sphere { radius: f32 },
    Cube { size: f32 },
    /// Flat annulus in the local XZ plane.
    Ring { inner_radius: f32, outer_radius: f32 },
}

impl Shape {
    /// Largest distance from the local origin to the surface of the shape.
    pub fn extent(&self) -> f32 {
        match *self {
            Self::Sphere { radius } => radius,
            Self::Cube { size } => size * 0.5,
            Self::Ring { outer_radius, .. } => outer_radius,
        }
    }
}

/// How a material responds to light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shading {
    /// Flat color, ignores lights.
    Basic,
    /// Diffuse lighting from the scene lights.
    #[default]
    Standard,
    /// Self-illuminated (stars, glows).
    Emissive,
}

/// Surface description handed to a rendering service alongside a [`Shape`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    #[serde(default)]
    pub shading: Shading,
    #[serde(default = "default_color")]
    pub base_color: [f32; 4],
    /// Cached texture reference; the path itself lives in the asset cache.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texture: Option<AssetId>,
}

fn default_color() -> [f32; 4] {
    [0.8, 0.8, 0.8, 1.0]
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: "default".into(),
            shading: Shading::default(),
            base_color: default_color(),
            texture: None,
        }
    }
}

impl Material {
    pub fn is_translucent(&self) -> bool {
        self.base_color[3] < 1.0
    }
}

/// A scene light. Colors are linear RGB; `intensity` scales the color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Light {
    /// Parallel rays travelling along `direction`.
    Directional {
        direction: [f32; 3],
        #[serde(default = "white")]
        color: [f32; 3],
        #[serde(default = "unit_intensity")]
        intensity: f32,
    },
    /// Omnidirectional light at `position`.
    Point {
        position: [f32; 3],
        #[serde(default = "white")]
        color: [f32; 3],
        #[serde(default = "unit_intensity")]
        intensity: f32,
    },
}

fn white() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

fn unit_intensity() -> f32 {
    1.0
}

impl Light {
    /// White point light at the origin, used when a scene declares no lights.
    pub fn star() -> Self {
        Self::Point {
            position: [0.0; 3],
            color: white(),
            intensity: 1.0,
        }
    }

    /// Color premultiplied by intensity.
    pub fn radiance(&self) -> [f32; 3] {
        match *self {
            Self::Directional { color, intensity, .. } | Self::Point { color, intensity, .. } => {
                color.map(|c| c * intensity)
            }
        }
    }
}
