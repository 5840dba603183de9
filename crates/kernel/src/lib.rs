//! Orbital kernel: body registry, orbital kinematics, attachment propagation.
//!
//! # Invariants
//! - Exactly one root body; the parent graph is a tree, validated once when an
//!   [`OrbitalSystem`] is built.
//! - Each tick visits bodies parent-first, so a child always reads its
//!   parent's position for the same tick.
//! - Attachments are recomputed after every body has moved.
//! - Derived positions are never authoritative; they are a pure function of
//!   the orbital parameters and the tick count.

mod body;
mod error;
mod registry;
mod system;

pub use body::{Attachment, Body, DEFAULT_VERTICAL_TILT, angular_velocity_for_period};
pub use error::SceneError;
pub use registry::BodyRegistry;
pub use system::{BodyState, OrbitalSystem, Placement};
