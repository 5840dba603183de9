//! Built-in scenes.
//!
//! Periods are in ticks with one Earth year fixed at 3650 ticks (ten ticks
//! per day), so relative speeds follow real sidereal periods. Distances and
//! sizes are chosen for a readable picture, not to scale.

use orrery_common::{BodyId, Light, Material, Shading, Shape};

use crate::descriptor::{
    AttachmentDescriptor, BodyDescriptor, CameraDescriptor, OrbitDescriptor, Rate,
    SceneDescriptor, SpinDescriptor,
};
use crate::error::SceneBuildError;

/// Ticks per Earth day.
pub const TICKS_PER_DAY: f64 = 10.0;

/// Names accepted by [`preset`].
pub const PRESETS: &[&str] = &["solar-system", "earth-moon", "spinning-cubes"];

pub fn preset(name: &str) -> Result<SceneDescriptor, SceneBuildError> {
    match name {
        "solar-system" => Ok(solar_system()),
        "earth-moon" => Ok(earth_moon()),
        "spinning-cubes" => Ok(spinning_cubes()),
        other => Err(SceneBuildError::UnknownPreset(other.to_string())),
    }
}

struct Planet {
    id: &'static str,
    radius: f32,
    distance: f64,
    period_days: f64,
    day_days: f64,
    phase: f64,
    color: [f32; 4],
}

#[rustfmt::skip]
const PLANETS: &[Planet] = &[
    Planet { id: "mercury", radius: 0.25, distance: 4.0, period_days: 87.97, day_days: 58.6, phase: 0.0, color: [0.6, 0.6, 0.6, 1.0] },
    Planet { id: "venus", radius: 0.45, distance: 6.0, period_days: 224.7, day_days: -243.0, phase: 1.1, color: [0.9, 0.8, 0.6, 1.0] },
    Planet { id: "earth", radius: 0.5, distance: 8.5, period_days: 365.0, day_days: 1.0, phase: 2.3, color: [0.3, 0.5, 0.9, 1.0] },
    Planet { id: "mars", radius: 0.35, distance: 11.0, period_days: 686.98, day_days: 1.03, phase: 3.7, color: [0.8, 0.4, 0.3, 1.0] },
    Planet { id: "jupiter", radius: 1.3, distance: 16.0, period_days: 4332.6, day_days: 0.41, phase: 4.4, color: [0.8, 0.7, 0.6, 1.0] },
    Planet { id: "saturn", radius: 1.1, distance: 22.0, period_days: 10759.2, day_days: 0.44, phase: 5.2, color: [0.9, 0.8, 0.6, 1.0] },
    Planet { id: "uranus", radius: 0.8, distance: 27.0, period_days: 30688.5, day_days: -0.72, phase: 0.6, color: [0.6, 0.8, 0.9, 1.0] },
    Planet { id: "neptune", radius: 0.78, distance: 31.0, period_days: 60182.0, day_days: 0.67, phase: 2.9, color: [0.3, 0.4, 0.9, 1.0] },
];

fn material(name: &str, shading: Shading, base_color: [f32; 4]) -> Material {
    Material {
        name: name.into(),
        shading,
        base_color,
        texture: None,
    }
}

fn days(d: f64) -> Rate {
    Rate::period(d * TICKS_PER_DAY)
}

fn texture(id: &str) -> Option<String> {
    Some(format!("textures/{id}.jpg"))
}

fn earth_extras(leader: &str, radius: f32) -> Vec<AttachmentDescriptor> {
    vec![
        AttachmentDescriptor {
            id: BodyId::new(format!("{leader}-clouds")),
            leader: leader.into(),
            offset: [0.0; 3],
            shape: Shape::Sphere { radius: radius * 1.02 },
            material: material("earth-clouds", Shading::Standard, [1.0, 1.0, 1.0, 0.6]),
            texture: Some("textures/earth_clouds.png".into()),
            spin: Some(SpinDescriptor::new(days(1.4), [0.0, 1.0, 0.0])),
        },
        AttachmentDescriptor {
            id: BodyId::new(format!("{leader}-atmosphere")),
            leader: leader.into(),
            offset: [0.0; 3],
            shape: Shape::Sphere { radius: radius * 1.08 },
            material: material("earth-atmosphere", Shading::Basic, [0.4, 0.6, 1.0, 0.15]),
            texture: None,
            spin: None,
        },
    ]
}

fn moon(parent: &str, distance: f64) -> BodyDescriptor {
    BodyDescriptor {
        id: "moon".into(),
        shape: Shape::Sphere { radius: 0.14 },
        material: material("moon", Shading::Standard, [0.7, 0.7, 0.7, 1.0]),
        texture: texture("moon"),
        orbit: Some(OrbitDescriptor {
            parent: parent.into(),
            radius: distance,
            rate: days(27.3),
            phase: 0.0,
            vertical_tilt: None,
        }),
        spin: Some(SpinDescriptor::new(days(27.3), [0.0, 1.0, 0.0])),
    }
}

/// The Sun, eight planets, the Moon, Earth's clouds and atmosphere, and
/// Saturn's rings.
pub fn solar_system() -> SceneDescriptor {
    let mut bodies = vec![BodyDescriptor {
        id: "sun".into(),
        shape: Shape::Sphere { radius: 2.0 },
        material: material("sun", Shading::Emissive, [1.0, 0.85, 0.4, 1.0]),
        texture: texture("sun"),
        orbit: None,
        spin: Some(SpinDescriptor::new(days(25.4), [0.0, 1.0, 0.0])),
    }];

    for p in PLANETS {
        bodies.push(BodyDescriptor {
            id: p.id.into(),
            shape: Shape::Sphere { radius: p.radius },
            material: material(p.id, Shading::Standard, p.color),
            texture: texture(p.id),
            orbit: Some(OrbitDescriptor {
                parent: "sun".into(),
                radius: p.distance,
                rate: days(p.period_days),
                phase: p.phase,
                vertical_tilt: None,
            }),
            spin: Some(SpinDescriptor::new(days(p.day_days), [0.0, 1.0, 0.0])),
        });
    }
    bodies.push(moon("earth", 1.2));

    let mut attachments = earth_extras("earth", 0.5);
    attachments.push(AttachmentDescriptor {
        id: "saturn-rings".into(),
        leader: "saturn".into(),
        offset: [0.0; 3],
        shape: Shape::Ring {
            inner_radius: 1.4,
            outer_radius: 2.4,
        },
        material: material("saturn-rings", Shading::Standard, [0.85, 0.75, 0.6, 0.8]),
        texture: Some("textures/saturn_rings.png".into()),
        spin: None,
    });

    SceneDescriptor {
        name: "solar-system".into(),
        vertical_tilt: orrery_kernel::DEFAULT_VERTICAL_TILT,
        camera: CameraDescriptor {
            eye: [0.0, 25.0, 45.0],
            fov_degrees: 60.0,
            ..CameraDescriptor::default()
        },
        lights: Vec::new(),
        bodies,
        attachments,
    }
}

/// Earth at the origin with its clouds, atmosphere and Moon.
pub fn earth_moon() -> SceneDescriptor {
    let earth = BodyDescriptor {
        id: "earth".into(),
        shape: Shape::Sphere { radius: 1.0 },
        material: material("earth", Shading::Standard, [0.3, 0.5, 0.9, 1.0]),
        texture: texture("earth"),
        orbit: None,
        spin: Some(SpinDescriptor::new(days(1.0), [0.0, 1.0, 0.0])),
    };
    let mut moon = moon("earth", 4.0);
    moon.shape = Shape::Sphere { radius: 0.27 };

    SceneDescriptor {
        name: "earth-moon".into(),
        vertical_tilt: orrery_kernel::DEFAULT_VERTICAL_TILT,
        camera: CameraDescriptor {
            eye: [0.0, 3.0, 10.0],
            fov_degrees: 60.0,
            ..CameraDescriptor::default()
        },
        lights: Vec::new(),
        bodies: vec![earth, moon],
        attachments: earth_extras("earth", 1.0),
    }
}

/// Two textured unit cubes: an unlit one at the origin and a lit one two
/// units along +X, tumbling in opposite directions by 0.01 rad per tick on X
/// and Y. Lit by a half-strength white light from above and a half-strength
/// red lamp between the cubes and the camera.
pub fn spinning_cubes() -> SceneDescriptor {
    let tumble = [1.0, 1.0, 0.0];
    let cube = Shape::Cube { size: 1.0 };
    SceneDescriptor {
        name: "spinning-cubes".into(),
        vertical_tilt: 0.0,
        camera: CameraDescriptor::default(),
        lights: vec![
            Light::Directional {
                direction: [0.0, -1.0, 0.0],
                color: [1.0, 1.0, 1.0],
                intensity: 0.5,
            },
            Light::Point {
                position: [0.0, 0.0, 5.0],
                color: [1.0, 0.0, 0.0],
                intensity: 0.5,
            },
        ],
        bodies: vec![
            BodyDescriptor {
                id: "pointer-cube".into(),
                shape: cube,
                material: material("basic", Shading::Basic, [1.0; 4]),
                texture: Some("textures/corgi.jpg".into()),
                orbit: None,
                spin: Some(SpinDescriptor::new(Rate::velocity(0.01), tumble)),
            },
            BodyDescriptor {
                id: "center-cube".into(),
                shape: cube,
                material: material("standard", Shading::Standard, [1.0; 4]),
                texture: Some("textures/corgi.jpg".into()),
                orbit: Some(OrbitDescriptor {
                    parent: "pointer-cube".into(),
                    radius: 2.0,
                    rate: Rate::velocity(0.0),
                    phase: 0.0,
                    vertical_tilt: None,
                }),
                spin: Some(SpinDescriptor::new(Rate::velocity(-0.01), tumble)),
            },
        ],
        attachments: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::build_scene;
    use glam::DVec3;
    use orrery_assets::AssetCache;
    use orrery_render::DebugTextRenderer;

    #[test]
    fn every_preset_builds() {
        for name in PRESETS {
            let desc = preset(name).unwrap();
            assert_eq!(desc.name, *name);
            let mut renderer = DebugTextRenderer::new();
            let built = build_scene(&desc, &mut renderer, &mut AssetCache::new()).unwrap();
            assert_eq!(
                renderer.object_count(),
                desc.bodies.len() + desc.attachments.len()
            );
            assert_eq!(built.system.registry().len(), desc.bodies.len());
            assert_eq!(built.system.placements().count(), renderer.object_count());
        }
    }

    #[test]
    fn unknown_preset() {
        assert!(matches!(
            preset("andromeda"),
            Err(SceneBuildError::UnknownPreset(name)) if name == "andromeda"
        ));
    }

    #[test]
    fn presets_survive_yaml() {
        for name in PRESETS {
            let desc = preset(name).unwrap();
            let yaml = desc.to_yaml().unwrap();
            assert_eq!(SceneDescriptor::from_yaml_str(&yaml).unwrap(), desc);
        }
    }

    #[test]
    fn earth_year_is_3650_ticks() {
        let desc = solar_system();
        let mut built =
            build_scene(&desc, &mut DebugTextRenderer::new(), &mut AssetCache::new()).unwrap();
        let start = built.system.body(&"earth".into()).unwrap().position();
        built.system.seek(3650);
        let end = built.system.body(&"earth".into()).unwrap().position();
        assert!((start - end).length() < 1e-9);

        let moon = built.system.body(&"moon".into()).unwrap();
        assert_eq!(moon.parent, Some("earth".into()));
    }

    #[test]
    fn cubes_match_the_demo_layout() {
        let desc = spinning_cubes();
        let mut assets = AssetCache::new();
        let mut built = build_scene(&desc, &mut DebugTextRenderer::new(), &mut assets).unwrap();
        assert_eq!(assets.len(), 1);

        built.system.seek(10);
        let center = built.system.body(&"center-cube".into()).unwrap();
        assert_eq!(center.position(), DVec3::new(2.0, 0.0, 0.0));
        let r = center.rotation();
        assert!((r.x - (std::f64::consts::TAU - 0.1)).abs() < 1e-12);
        assert_eq!(r.x, r.y);
        assert_eq!(r.z, 0.0);

        let pointer = built.system.body(&"pointer-cube".into()).unwrap();
        assert!((pointer.rotation().x - 0.1).abs() < 1e-12);
    }

    #[test]
    fn cubes_are_lit_from_above_and_by_a_red_lamp() {
        let desc = spinning_cubes();
        assert_eq!(desc.lights.len(), 2);
        assert!(desc.lights.iter().any(|l| matches!(
            l,
            Light::Directional { direction, intensity, .. }
                if *direction == [0.0, -1.0, 0.0] && *intensity == 0.5
        )));
        assert!(desc.lights.iter().any(|l| matches!(
            l,
            Light::Point { position, color, intensity }
                if *position == [0.0, 0.0, 5.0] && *color == [1.0, 0.0, 0.0] && *intensity == 0.5
        )));

        let mut renderer = DebugTextRenderer::new();
        build_scene(&desc, &mut renderer, &mut AssetCache::new()).unwrap();
        assert_eq!(renderer.lights(), desc.lights);
        assert!(solar_system().lights.is_empty());
    }
}
