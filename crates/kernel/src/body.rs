use glam::DVec3;
use orrery_common::{BodyId, RenderHandle};
use std::f64::consts::TAU;

use crate::error::SceneError;

/// Vertical excursion of an orbit relative to its horizontal excursion.
///
/// A visual stand-in for orbital inclination, not a physical quantity.
pub const DEFAULT_VERTICAL_TILT: f64 = 0.2;

/// Angular velocity (radians per tick) that completes one revolution in
/// `period_ticks` ticks. Negative periods give retrograde motion.
pub fn angular_velocity_for_period(period_ticks: f64) -> f64 {
    TAU / period_ticks
}

/// Euler XYZ angles after `ticks` ticks of spin, each wrapped to `[0, 2π)`.
pub(crate) fn euler_rotation(spin_axis: DVec3, spin_velocity: f64, ticks: f64) -> DVec3 {
    let raw = spin_axis * (spin_velocity * ticks);
    DVec3::new(
        raw.x.rem_euclid(TAU),
        raw.y.rem_euclid(TAU),
        raw.z.rem_euclid(TAU),
    )
}

/// A simulated orbiting (or stationary) entity.
///
/// Orbital parameters are public and fixed after registration; the derived
/// kinematic state is only written by the owning
/// [`OrbitalSystem`](crate::OrbitalSystem).
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub id: BodyId,
    /// `None` for the root (the star).
    pub parent: Option<BodyId>,
    pub orbital_radius: f64,
    /// Angular position at tick 0, in radians.
    pub phase: f64,
    /// Radians advanced per tick; the sign gives the direction.
    pub angular_velocity: f64,
    pub vertical_tilt: f64,
    /// Radians of self-rotation per tick.
    pub spin_velocity: f64,
    /// Per-axis Euler weights applied to the accumulated spin.
    pub spin_axis: DVec3,
    pub render_handle: Option<RenderHandle>,
    pub(crate) angular_position: f64,
    pub(crate) spin: f64,
    pub(crate) rotation: DVec3,
    pub(crate) position: DVec3,
}

impl Body {
    /// A stationary root body at the origin.
    pub fn root(id: impl Into<BodyId>) -> Self {
        Self {
            id: id.into(),
            parent: None,
            orbital_radius: 0.0,
            phase: 0.0,
            angular_velocity: 0.0,
            vertical_tilt: DEFAULT_VERTICAL_TILT,
            spin_velocity: 0.0,
            spin_axis: DVec3::Y,
            render_handle: None,
            angular_position: 0.0,
            spin: 0.0,
            rotation: DVec3::ZERO,
            position: DVec3::ZERO,
        }
    }

    /// A body orbiting `parent` at `orbital_radius`, initially stationary.
    pub fn orbiting(id: impl Into<BodyId>, parent: impl Into<BodyId>, orbital_radius: f64) -> Self {
        Self {
            parent: Some(parent.into()),
            orbital_radius,
            ..Self::root(id)
        }
    }

    pub fn with_period(self, period_ticks: f64) -> Self {
        self.with_angular_velocity(angular_velocity_for_period(period_ticks))
    }

    pub fn with_angular_velocity(mut self, angular_velocity: f64) -> Self {
        self.angular_velocity = angular_velocity;
        self
    }

    pub fn with_phase(mut self, phase: f64) -> Self {
        self.phase = phase;
        self
    }

    pub fn with_vertical_tilt(mut self, vertical_tilt: f64) -> Self {
        self.vertical_tilt = vertical_tilt;
        self
    }

    pub fn with_spin(mut self, spin_velocity: f64, spin_axis: DVec3) -> Self {
        self.spin_velocity = spin_velocity;
        self.spin_axis = spin_axis;
        self
    }

    pub fn with_handle(mut self, handle: RenderHandle) -> Self {
        self.render_handle = Some(handle);
        self
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Current orbital phase in `[0, 2π)`.
    pub fn angular_position(&self) -> f64 {
        self.angular_position
    }

    /// Accumulated self-rotation angle in `[0, 2π)`.
    pub fn spin(&self) -> f64 {
        self.spin
    }

    /// World-space position derived for the current tick.
    pub fn position(&self) -> DVec3 {
        self.position
    }

    /// Euler XYZ rotation. Each component is wrapped on its own after the
    /// axis weight is applied, so fractional weights turn continuously.
    pub fn rotation(&self) -> DVec3 {
        self.rotation
    }

    /// Offset from the parent for a given orbital phase.
    pub fn orbit_offset(&self, angle: f64) -> DVec3 {
        let (sin, cos) = angle.sin_cos();
        self.orbital_radius * DVec3::new(cos, cos * self.vertical_tilt, sin)
    }

    pub(crate) fn validate(&self) -> Result<(), SceneError> {
        if !self.angular_velocity.is_finite() {
            return Err(SceneError::InvalidVelocity {
                id: self.id.clone(),
                field: "angular velocity",
            });
        }
        if !self.spin_velocity.is_finite() {
            return Err(SceneError::InvalidVelocity {
                id: self.id.clone(),
                field: "spin velocity",
            });
        }
        let invalid = |field| SceneError::InvalidParameter {
            id: self.id.clone(),
            field,
        };
        if !self.orbital_radius.is_finite() || self.orbital_radius < 0.0 {
            return Err(invalid("orbital radius"));
        }
        if !self.phase.is_finite() {
            return Err(invalid("phase"));
        }
        if !self.vertical_tilt.is_finite() {
            return Err(invalid("vertical tilt"));
        }
        if !self.spin_axis.is_finite() {
            return Err(invalid("spin axis"));
        }
        Ok(())
    }
}

/// A render object that mirrors a leader body's position without kinematics
/// of its own (cloud shells, atmospheres, rings).
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub id: BodyId,
    pub leader: BodyId,
    pub offset: DVec3,
    pub spin_velocity: f64,
    pub spin_axis: DVec3,
    pub render_handle: Option<RenderHandle>,
    pub(crate) spin: f64,
    pub(crate) rotation: DVec3,
    pub(crate) position: DVec3,
}

impl Attachment {
    pub fn new(id: impl Into<BodyId>, leader: impl Into<BodyId>) -> Self {
        Self {
            id: id.into(),
            leader: leader.into(),
            offset: DVec3::ZERO,
            spin_velocity: 0.0,
            spin_axis: DVec3::Y,
            render_handle: None,
            spin: 0.0,
            rotation: DVec3::ZERO,
            position: DVec3::ZERO,
        }
    }

    pub fn with_offset(mut self, offset: DVec3) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_spin(mut self, spin_velocity: f64, spin_axis: DVec3) -> Self {
        self.spin_velocity = spin_velocity;
        self.spin_axis = spin_axis;
        self
    }

    pub fn with_handle(mut self, handle: RenderHandle) -> Self {
        self.render_handle = Some(handle);
        self
    }

    pub fn position(&self) -> DVec3 {
        self.position
    }

    pub fn spin(&self) -> f64 {
        self.spin
    }

    pub fn rotation(&self) -> DVec3 {
        self.rotation
    }

    pub(crate) fn validate(&self) -> Result<(), SceneError> {
        if !self.spin_velocity.is_finite() {
            return Err(SceneError::InvalidVelocity {
                id: self.id.clone(),
                field: "spin velocity",
            });
        }
        if !self.offset.is_finite() {
            return Err(SceneError::InvalidParameter {
                id: self.id.clone(),
                field: "offset",
            });
        }
        if !self.spin_axis.is_finite() {
            return Err(SceneError::InvalidParameter {
                id: self.id.clone(),
                field: "spin axis",
            });
        }
        Ok(())
    }
}
