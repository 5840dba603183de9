//! Scene construction: descriptors, built-in presets, and one routine that
//! turns either into an [`OrbitalSystem`](orrery_kernel::OrbitalSystem) plus
//! render objects.
//!
//! # Invariants
//! - Every scene, preset or file, goes through [`build_scene`].
//! - One render handle per body and per attachment, created in declaration
//!   order.
//! - Texture paths are registered in the shared
//!   [`AssetCache`](orrery_assets::AssetCache), never loaded here.

mod build;
mod descriptor;
mod error;
mod presets;

pub use build::{BuiltScene, build_scene};
pub use descriptor::{
    AttachmentDescriptor, BodyDescriptor, CameraDescriptor, OrbitDescriptor, Rate,
    SceneDescriptor, SpinDescriptor,
};
pub use error::SceneBuildError;
pub use presets::{PRESETS, TICKS_PER_DAY, earth_moon, preset, solar_system, spinning_cubes};
