//! wgpu rendering service for the orrery engine.
//!
//! Draws every render object as an instance of a shared mesh (unit sphere,
//! unit cube, or a ring per radius pair). Opaque batches draw first with depth
//! writes, translucent batches (cloud shells, atmospheres, rings) after them
//! with alpha blending.
//!
//! # Invariants
//! - The renderer never reads or mutates simulation state; placements arrive
//!   through [`RenderService`](orrery_render::RenderService).
//! - Lighting comes from a point light at the origin, where the root star sits.
//! - Textures are registered by the engine but not sampled here.

mod gpu;
mod mesh;
mod shaders;

pub use gpu::WgpuRenderer;
