use std::collections::VecDeque;
use std::f64::consts::TAU;

use glam::DVec3;
use orrery_common::{BodyId, RenderHandle};
use serde::Serialize;

use crate::body::{Attachment, Body, euler_rotation};
use crate::error::SceneError;
use crate::registry::{BodyRegistry, Slot};

/// A validated body registry plus the derived kinematic state for one tick.
///
/// Angular positions and spins are derived from the integer tick count
/// (`phase + ω·n`, wrapped to `[0, 2π)`) rather than accumulated, so the error
/// after `n` ticks is one rounding of `ω·n` instead of `n` roundings.
#[derive(Debug, Clone)]
pub struct OrbitalSystem {
    registry: BodyRegistry,
    /// Body indices, root first; every parent precedes its children.
    order: Vec<usize>,
    parents: Vec<Option<usize>>,
    leaders: Vec<usize>,
    tick: u64,
}

/// Where a render handle sits this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub handle: RenderHandle,
    pub position: DVec3,
    /// Euler XYZ angles in radians.
    pub rotation: DVec3,
}

/// Serializable view of one body or attachment, for tools and debug output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BodyState {
    pub id: BodyId,
    /// Parent for bodies, leader for attachments.
    pub anchor: Option<BodyId>,
    pub attachment: bool,
    pub position: [f64; 3],
    pub rotation: [f64; 3],
    pub angular_position: Option<f64>,
}

impl OrbitalSystem {
    /// Resolve parents and leaders, order bodies root-first, and compute the
    /// tick-0 state.
    pub fn new(registry: BodyRegistry) -> Result<Self, SceneError> {
        let root = registry.root_index().ok_or(SceneError::MissingRoot)?;
        let bodies = registry.bodies();

        let mut parents = Vec::with_capacity(bodies.len());
        for body in bodies {
            let parent = match &body.parent {
                None => None,
                Some(pid) => match registry.slot(pid) {
                    Some(Slot::Body(i)) => Some(i),
                    _ => return Err(SceneError::NotFound(pid.clone())),
                },
            };
            parents.push(parent);
        }

        let mut children = vec![Vec::new(); bodies.len()];
        for (i, parent) in parents.iter().enumerate() {
            if let Some(p) = parent {
                children[*p].push(i);
            }
        }

        // Breadth-first from the root. Anything unreached hangs off a cycle,
        // since every non-root body has exactly one parent.
        let mut order = Vec::with_capacity(bodies.len());
        let mut queue = VecDeque::from([root]);
        while let Some(i) = queue.pop_front() {
            order.push(i);
            queue.extend(children[i].iter().copied());
        }
        if order.len() != bodies.len() {
            let mut reached = vec![false; bodies.len()];
            for &i in &order {
                reached[i] = true;
            }
            if let Some(i) = reached.iter().position(|r| !r) {
                return Err(SceneError::CyclicParent(bodies[i].id.clone()));
            }
        }

        let mut leaders = Vec::with_capacity(registry.attachments().len());
        for attachment in registry.attachments() {
            match registry.slot(&attachment.leader) {
                Some(Slot::Body(i)) => leaders.push(i),
                _ => return Err(SceneError::NotFound(attachment.leader.clone())),
            }
        }

        let mut system = Self {
            registry,
            order,
            parents,
            leaders,
            tick: 0,
        };
        system.recompute();
        tracing::info!(
            bodies = system.registry.len(),
            attachments = system.leaders.len(),
            "orbital system built"
        );
        Ok(system)
    }

    /// Ticks elapsed since construction.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn registry(&self) -> &BodyRegistry {
        &self.registry
    }

    pub fn body(&self, id: &BodyId) -> Result<&Body, SceneError> {
        self.registry.get(id)
    }

    pub fn attachment(&self, id: &BodyId) -> Result<&Attachment, SceneError> {
        self.registry.get_attachment(id)
    }

    /// Bodies root-first, each after its parent.
    pub fn topological_order(&self) -> impl Iterator<Item = &Body> {
        let bodies = self.registry.bodies();
        self.order.iter().map(move |&i| &bodies[i])
    }

    /// Advance one tick: orbital kinematics, then attachment propagation.
    pub fn step(&mut self) {
        self.tick += 1;
        self.recompute();
    }

    /// Jump to an arbitrary tick. Equivalent to stepping there from tick 0.
    pub fn seek(&mut self, tick: u64) {
        self.tick = tick;
        self.recompute();
    }

    fn recompute(&mut self) {
        self.advance_bodies();
        self.propagate_attachments();
    }

    fn advance_bodies(&mut self) {
        let n = self.tick as f64;
        let bodies = self.registry.bodies_mut();
        for &i in &self.order {
            // Parents are visited first, so this is the current tick's position.
            let parent_position = self.parents[i].map_or(DVec3::ZERO, |p| bodies[p].position);
            let body = &mut bodies[i];
            body.angular_position = (body.phase + body.angular_velocity * n).rem_euclid(TAU);
            body.position = parent_position + body.orbit_offset(body.angular_position);
            body.spin = (body.spin_velocity * n).rem_euclid(TAU);
            body.rotation = euler_rotation(body.spin_axis, body.spin_velocity, n);
        }
    }

    fn propagate_attachments(&mut self) {
        let n = self.tick as f64;
        let (bodies, attachments) = self.registry.split_mut();
        for (attachment, &leader) in attachments.iter_mut().zip(&self.leaders) {
            attachment.position = bodies[leader].position + attachment.offset;
            attachment.spin = (attachment.spin_velocity * n).rem_euclid(TAU);
            attachment.rotation =
                euler_rotation(attachment.spin_axis, attachment.spin_velocity, n);
        }
    }

    /// Every render handle with its current placement: bodies in topological
    /// order, then attachments in insertion order.
    pub fn placements(&self) -> impl Iterator<Item = Placement> + '_ {
        let bodies = self.topological_order().filter_map(|b| {
            b.render_handle.map(|handle| Placement {
                handle,
                position: b.position(),
                rotation: b.rotation(),
            })
        });
        let attachments = self.registry.attachments().iter().filter_map(|a| {
            a.render_handle.map(|handle| Placement {
                handle,
                position: a.position(),
                rotation: a.rotation(),
            })
        });
        bodies.chain(attachments)
    }

    /// Snapshot of every body and attachment, in registration order.
    pub fn states(&self) -> Vec<BodyState> {
        let bodies = self.registry.bodies().iter().map(|b| BodyState {
            id: b.id.clone(),
            anchor: b.parent.clone(),
            attachment: false,
            position: b.position().to_array(),
            rotation: b.rotation().to_array(),
            angular_position: Some(b.angular_position()),
        });
        let attachments = self.registry.attachments().iter().map(|a| BodyState {
            id: a.id.clone(),
            anchor: Some(a.leader.clone()),
            attachment: true,
            position: a.position().to_array(),
            rotation: a.rotation().to_array(),
            angular_position: None,
        });
        bodies.chain(attachments).collect()
    }

    /// FNV-1a digest of the tick and every derived position and spin.
    pub fn state_hash(&self) -> u64 {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325;
        let mix = |h: &mut u64, bytes: &[u8]| {
            for &b in bytes {
                *h ^= b as u64;
                *h = h.wrapping_mul(0x0100_0000_01b3);
            }
        };
        mix(&mut h, &self.tick.to_le_bytes());
        for body in self.registry.bodies() {
            mix(&mut h, body.id.as_str().as_bytes());
            for v in body.position().to_array() {
                mix(&mut h, &v.to_le_bytes());
            }
            mix(&mut h, &body.spin().to_le_bytes());
        }
        for attachment in self.registry.attachments() {
            mix(&mut h, attachment.id.as_str().as_bytes());
            for v in attachment.position().to_array() {
                mix(&mut h, &v.to_le_bytes());
            }
            mix(&mut h, &attachment.spin().to_le_bytes());
        }
        h
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::angular_velocity_for_period;
    use std::f64::consts::PI;

    fn angle_delta(a: f64, b: f64) -> f64 {
        let d = (a - b).rem_euclid(TAU);
        d.min(TAU - d)
    }

    fn solar() -> OrbitalSystem {
        let mut reg = BodyRegistry::new();
        reg.register(Body::root("sun").with_spin(0.01, DVec3::Y))
            .unwrap();
        reg.register(Body::orbiting("earth", "sun", 10.0).with_period(365.0))
            .unwrap();
        reg.register(Body::orbiting("moon", "earth", 1.5).with_period(27.0))
            .unwrap();
        reg.attach(Attachment::new("earth-clouds", "earth").with_spin(0.02, DVec3::Y))
            .unwrap();
        reg.attach(
            Attachment::new("earth-halo", "earth").with_offset(DVec3::new(0.0, 0.25, 0.0)),
        )
        .unwrap();
        OrbitalSystem::new(reg).unwrap()
    }

    #[test]
    fn tick_zero_state_is_derived_on_build() {
        let sys = solar();
        assert_eq!(sys.tick(), 0);
        let earth = sys.body(&"earth".into()).unwrap();
        assert!((earth.position() - DVec3::new(10.0, 2.0, 0.0)).length() < 1e-12);
    }

    #[test]
    fn periodicity_after_exact_period() {
        let period = 1000u64;
        let mut reg = BodyRegistry::new();
        reg.register(Body::root("sun")).unwrap();
        reg.register(
            Body::orbiting("planet", "sun", 7.0)
                .with_period(period as f64)
                .with_phase(0.3),
        )
        .unwrap();
        let mut sys = OrbitalSystem::new(reg).unwrap();
        let id: BodyId = "planet".into();
        let start_angle = sys.body(&id).unwrap().angular_position();
        let start = sys.body(&id).unwrap().position();

        for _ in 0..period {
            sys.step();
        }
        let planet = sys.body(&id).unwrap();
        assert!(angle_delta(planet.angular_position(), start_angle) < 1e-9);
        assert!((planet.position() - start).length() < 1e-9);
    }

    #[test]
    fn half_period_is_opposite_side() {
        let mut reg = BodyRegistry::new();
        reg.register(Body::root("sun")).unwrap();
        reg.register(
            Body::orbiting("planet", "sun", 4.0)
                .with_period(100.0)
                .with_vertical_tilt(0.0),
        )
        .unwrap();
        let mut sys = OrbitalSystem::new(reg).unwrap();
        sys.seek(50);
        let p = sys.body(&"planet".into()).unwrap().position();
        assert!((p - DVec3::new(-4.0, 0.0, 0.0)).length() < 1e-9);
    }

    #[test]
    fn attachments_track_leader_exactly() {
        let mut sys = solar();
        for _ in 0..500 {
            sys.step();
            let earth = sys.body(&"earth".into()).unwrap().position();
            for attachment in sys.registry().attachments() {
                assert_eq!(attachment.position(), earth + attachment.offset);
            }
        }
    }

    #[test]
    fn attachment_spin_is_independent_of_leader() {
        let mut sys = solar();
        sys.seek(10);
        let clouds = sys.attachment(&"earth-clouds".into()).unwrap();
        assert!((clouds.spin() - 0.2).abs() < 1e-12);
        let halo = sys.attachment(&"earth-halo".into()).unwrap();
        assert_eq!(halo.spin(), 0.0);
    }

    #[test]
    fn zero_radius_stacks_on_parent() {
        let mut reg = BodyRegistry::new();
        reg.register(Body::root("sun")).unwrap();
        reg.register(Body::orbiting("planet", "sun", 6.0).with_period(80.0))
            .unwrap();
        reg.register(
            Body::orbiting("glow", "planet", 0.0).with_angular_velocity(0.37),
        )
        .unwrap();
        let mut sys = OrbitalSystem::new(reg).unwrap();
        for _ in 0..200 {
            sys.step();
            let planet = sys.body(&"planet".into()).unwrap().position();
            let glow = sys.body(&"glow".into()).unwrap().position();
            assert_eq!(glow, planet);
        }
    }

    #[test]
    fn stationary_root_spins_without_moving() {
        let mut sys = solar();
        for _ in 0..10 {
            sys.step();
        }
        let sun = sys.body(&"sun".into()).unwrap();
        assert_eq!(sun.position(), DVec3::ZERO);
        assert!((sun.spin() - 0.1).abs() < 1e-12);
        assert!((sun.rotation().y - 0.1).abs() < 1e-12);
    }

    #[test]
    fn child_uses_parents_current_tick_position() {
        // Moon registered before its planet: insertion order alone would
        // visit it first and read last tick's planet position.
        let mut reg = BodyRegistry::new();
        reg.register(Body::root("sun")).unwrap();
        reg.register(Body::orbiting("moon", "planet", 1.0).with_period(10.0))
            .unwrap();
        reg.register(Body::orbiting("planet", "sun", 20.0).with_period(50.0))
            .unwrap();
        let mut sys = OrbitalSystem::new(reg).unwrap();

        let order: Vec<&str> = sys.topological_order().map(|b| b.id.as_str()).collect();
        assert_eq!(order, ["sun", "planet", "moon"]);

        for _ in 0..25 {
            sys.step();
            let planet = sys.body(&"planet".into()).unwrap().position();
            let moon = sys.body(&"moon".into()).unwrap();
            let expected = planet + moon.orbit_offset(moon.angular_position());
            assert!((moon.position() - expected).length() < 1e-12);
        }
    }

    #[test]
    fn long_run_stays_periodic() {
        let mut reg = BodyRegistry::new();
        reg.register(Body::root("sun")).unwrap();
        reg.register(
            Body::orbiting("planet", "sun", 100.0)
                .with_angular_velocity(angular_velocity_for_period(1000.0)),
        )
        .unwrap();
        let mut sys = OrbitalSystem::new(reg).unwrap();
        let start = sys.body(&"planet".into()).unwrap().position();

        for _ in 0..10_000_000u64 {
            sys.step();
        }
        assert_eq!(sys.tick(), 10_000_000);
        let end = sys.body(&"planet".into()).unwrap().position();
        assert!(
            (end - start).length() < 1e-6,
            "drifted {}",
            (end - start).length()
        );
    }

    #[test]
    fn seek_matches_stepping() {
        let mut stepped = solar();
        for _ in 0..1234 {
            stepped.step();
        }
        let mut sought = solar();
        sought.seek(1234);
        assert_eq!(stepped.state_hash(), sought.state_hash());
    }

    #[test]
    fn identical_systems_hash_identically() {
        let mut a = solar();
        let mut b = solar();
        a.step();
        b.step();
        assert_eq!(a.state_hash(), b.state_hash());
        b.step();
        assert_ne!(a.state_hash(), b.state_hash());
    }

    #[test]
    fn unknown_parent_is_not_found() {
        let mut reg = BodyRegistry::new();
        reg.register(Body::root("sun")).unwrap();
        reg.register(Body::orbiting("moon", "earth", 1.0)).unwrap();
        assert_eq!(
            OrbitalSystem::new(reg).unwrap_err(),
            SceneError::NotFound("earth".into())
        );
    }

    #[test]
    fn unknown_leader_is_not_found() {
        let mut reg = BodyRegistry::new();
        reg.register(Body::root("sun")).unwrap();
        reg.attach(Attachment::new("rings", "saturn")).unwrap();
        assert_eq!(
            OrbitalSystem::new(reg).unwrap_err(),
            SceneError::NotFound("saturn".into())
        );
    }

    #[test]
    fn parent_cycle_is_rejected() {
        let mut reg = BodyRegistry::new();
        reg.register(Body::root("sun")).unwrap();
        reg.register(Body::orbiting("a", "b", 1.0)).unwrap();
        reg.register(Body::orbiting("b", "a", 1.0)).unwrap();
        assert_eq!(
            OrbitalSystem::new(reg).unwrap_err(),
            SceneError::CyclicParent("a".into())
        );
    }

    #[test]
    fn self_parent_is_a_cycle() {
        let mut reg = BodyRegistry::new();
        reg.register(Body::root("sun")).unwrap();
        reg.register(Body::orbiting("loop", "loop", 1.0)).unwrap();
        assert!(matches!(
            OrbitalSystem::new(reg),
            Err(SceneError::CyclicParent(_))
        ));
    }

    #[test]
    fn rootless_registry_is_rejected() {
        let mut reg = BodyRegistry::new();
        reg.register(Body::orbiting("a", "b", 1.0)).unwrap();
        reg.register(Body::orbiting("b", "a", 1.0)).unwrap();
        assert_eq!(OrbitalSystem::new(reg).unwrap_err(), SceneError::MissingRoot);
        assert_eq!(
            OrbitalSystem::new(BodyRegistry::new()).unwrap_err(),
            SceneError::MissingRoot
        );
    }

    #[test]
    fn placements_skip_bodies_without_handles() {
        let mut reg = BodyRegistry::new();
        reg.register(Body::root("sun").with_handle(RenderHandle(1)))
            .unwrap();
        reg.register(Body::orbiting("dust", "sun", 3.0)).unwrap();
        reg.attach(Attachment::new("corona", "sun").with_handle(RenderHandle(2)))
            .unwrap();
        let sys = OrbitalSystem::new(reg).unwrap();
        let handles: Vec<RenderHandle> = sys.placements().map(|p| p.handle).collect();
        assert_eq!(handles, [RenderHandle(1), RenderHandle(2)]);
    }

    #[test]
    fn states_cover_bodies_and_attachments() {
        let sys = solar();
        let states = sys.states();
        assert_eq!(states.len(), 5);
        assert!(states.iter().filter(|s| s.attachment).count() == 2);
        let clouds = states.iter().find(|s| s.id.as_str() == "earth-clouds").unwrap();
        assert_eq!(clouds.anchor, Some("earth".into()));
    }

    fn largest_step(rotations: &[f64]) -> f64 {
        rotations
            .windows(2)
            .map(|w| ((w[1] - w[0] + PI).rem_euclid(TAU) - PI).abs())
            .fold(0.0, f64::max)
    }

    #[test]
    fn fractional_spin_axis_turns_smoothly_across_the_wrap() {
        let mut reg = BodyRegistry::new();
        reg.register(Body::root("top").with_spin(0.1, DVec3::new(0.5, 0.0, 0.0)))
            .unwrap();
        reg.attach(Attachment::new("cap", "top").with_spin(0.1, DVec3::new(0.0, 0.0, 1.5)))
            .unwrap();
        let mut sys = OrbitalSystem::new(reg).unwrap();

        let mut body_x = Vec::new();
        let mut cap_z = Vec::new();
        for _ in 0..200 {
            sys.step();
            body_x.push(sys.body(&"top".into()).unwrap().rotation().x);
            cap_z.push(sys.attachment(&"cap".into()).unwrap().rotation().z);
        }
        assert!(largest_step(&body_x) <= 0.051);
        assert!(largest_step(&cap_z) <= 0.151);
        // 200 ticks at 0.05 rad is 10 rad of turn.
        assert!((body_x[199] - 10.0f64.rem_euclid(TAU)).abs() < 1e-9);
    }
}
