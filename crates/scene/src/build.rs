use glam::{DVec3, Vec3};
use orrery_assets::AssetCache;
use orrery_common::{BodyId, Material, Shape};
use orrery_kernel::{Attachment, Body, BodyRegistry, OrbitalSystem};
use orrery_render::{PerspectiveCamera, RenderService};

use crate::descriptor::{CameraDescriptor, SceneDescriptor, SpinDescriptor};
use crate::error::SceneBuildError;

/// A scene ready to hand to a render loop.
#[derive(Debug)]
pub struct BuiltScene {
    pub name: String,
    pub system: OrbitalSystem,
    pub camera: PerspectiveCamera,
}

/// Build the registry, render objects and camera described by `desc`.
///
/// Lights are handed to the renderer first. Render handles are created in
/// declaration order, bodies before attachments, each only after the kernel
/// accepted the entry. Texture paths are registered in `assets` and the resulting
/// ids are stored on the materials passed to the renderer.
pub fn build_scene(
    desc: &SceneDescriptor,
    renderer: &mut impl RenderService,
    assets: &mut AssetCache,
) -> Result<BuiltScene, SceneBuildError> {
    let _span = tracing::info_span!("build_scene", scene = %desc.name).entered();
    let mut registry = BodyRegistry::new();
    renderer.set_lights(&desc.lights);

    for bd in &desc.bodies {
        let (spin_velocity, spin_axis) = spin_of(&bd.id, bd.spin.as_ref())?;
        let body = match &bd.orbit {
            None => Body::root(bd.id.clone()),
            Some(orbit) => Body::orbiting(bd.id.clone(), orbit.parent.clone(), orbit.radius)
                .with_angular_velocity(orbit.rate.radians_per_tick(&bd.id, "orbit")?)
                .with_phase(orbit.phase)
                .with_vertical_tilt(orbit.vertical_tilt.unwrap_or(desc.vertical_tilt)),
        }
        .with_spin(spin_velocity, spin_axis);

        // Register first so a rejected body never reaches the renderer.
        registry.register(body)?;
        let handle = create(renderer, assets, &bd.shape, &bd.material, bd.texture.as_deref())?;
        registry.set_render_handle(&bd.id, handle)?;
        tracing::debug!(id = %bd.id, handle = handle.0, "registered body");
    }

    for ad in &desc.attachments {
        let (spin_velocity, spin_axis) = spin_of(&ad.id, ad.spin.as_ref())?;
        let attachment = Attachment::new(ad.id.clone(), ad.leader.clone())
            .with_offset(DVec3::from_array(ad.offset))
            .with_spin(spin_velocity, spin_axis);

        registry.attach(attachment)?;
        let handle = create(renderer, assets, &ad.shape, &ad.material, ad.texture.as_deref())?;
        registry.set_render_handle(&ad.id, handle)?;
        tracing::debug!(id = %ad.id, leader = %ad.leader, handle = handle.0, "registered attachment");
    }

    let system = OrbitalSystem::new(registry)?;
    Ok(BuiltScene {
        name: desc.name.clone(),
        system,
        camera: camera_from(&desc.camera),
    })
}

fn spin_of(id: &BodyId, spin: Option<&SpinDescriptor>) -> Result<(f64, DVec3), SceneBuildError> {
    match spin {
        None => Ok((0.0, DVec3::Y)),
        Some(spin) => Ok((
            spin.rate.radians_per_tick(id, "spin")?,
            DVec3::from_array(spin.axis),
        )),
    }
}

fn create(
    renderer: &mut impl RenderService,
    assets: &mut AssetCache,
    shape: &Shape,
    material: &Material,
    texture: Option<&str>,
) -> Result<orrery_common::RenderHandle, SceneBuildError> {
    let mut material = material.clone();
    if let Some(path) = texture {
        material.texture = Some(assets.texture(path));
    }
    Ok(renderer.create_handle(shape, &material)?)
}

fn camera_from(desc: &CameraDescriptor) -> PerspectiveCamera {
    PerspectiveCamera::new(
        Vec3::from_array(desc.eye),
        Vec3::from_array(desc.target),
        desc.fov_degrees,
    )
    .with_clip(desc.near, desc.far)
}
