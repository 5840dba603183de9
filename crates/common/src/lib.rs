//! Shared types for the orrery engine: identifiers, surface sizes, and the
//! shape/material/light vocabulary spoken between scenes and rendering services.

mod types;

pub use types::{AssetId, BodyId, Light, Material, RenderHandle, Shading, Shape, SurfaceSize};
