use std::f32::consts::{PI, TAU};

use bytemuck::{Pod, Zeroable};
use orrery_common::Shape;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

pub(crate) struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

/// Identifies a shared GPU mesh. Spheres and cubes are unit meshes scaled per
/// instance; rings depend on their radius ratio so each distinct pair gets its
/// own mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) enum MeshKey {
    Sphere,
    Cube,
    Ring { inner_bits: u32, outer_bits: u32 },
}

const SPHERE_STACKS: u32 = 24;
const SPHERE_SLICES: u32 = 48;
const RING_SEGMENTS: u32 = 96;

/// The mesh a shape uses and the uniform scale applied to it.
pub(crate) fn mesh_for(shape: &Shape) -> (MeshKey, f32) {
    match *shape {
        Shape::Sphere { radius } => (MeshKey::Sphere, radius),
        Shape::Cube { size } => (MeshKey::Cube, size),
        Shape::Ring {
            inner_radius,
            outer_radius,
        } => (
            MeshKey::Ring {
                inner_bits: inner_radius.to_bits(),
                outer_bits: outer_radius.to_bits(),
            },
            1.0,
        ),
    }
}

pub(crate) fn build(key: MeshKey) -> MeshData {
    match key {
        MeshKey::Sphere => sphere_mesh(SPHERE_STACKS, SPHERE_SLICES),
        MeshKey::Cube => cube_mesh(),
        MeshKey::Ring {
            inner_bits,
            outer_bits,
        } => ring_mesh(
            f32::from_bits(inner_bits),
            f32::from_bits(outer_bits),
            RING_SEGMENTS,
        ),
    }
}

/// Unit-radius UV sphere.
fn sphere_mesh(stacks: u32, slices: u32) -> MeshData {
    let mut vertices = Vec::with_capacity(((stacks + 1) * (slices + 1)) as usize);
    for i in 0..=stacks {
        let phi = PI * i as f32 / stacks as f32;
        let (sin_phi, cos_phi) = phi.sin_cos();
        for j in 0..=slices {
            let theta = TAU * j as f32 / slices as f32;
            let (sin_theta, cos_theta) = theta.sin_cos();
            let n = [sin_phi * cos_theta, cos_phi, sin_phi * sin_theta];
            vertices.push(Vertex {
                position: n,
                normal: n,
            });
        }
    }

    let row = slices + 1;
    let mut indices = Vec::with_capacity((stacks * slices * 6) as usize);
    for i in 0..stacks {
        for j in 0..slices {
            let a = i * row + j;
            let b = a + row;
            indices.extend_from_slice(&[a, a + 1, b, b, a + 1, b + 1]);
        }
    }
    MeshData { vertices, indices }
}

/// Unit cube centered on the origin.
fn cube_mesh() -> MeshData {
    const FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        // normal, u, v
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
    ];
    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (n, u, v) in FACES {
        let base = vertices.len() as u32;
        for (su, sv) in [(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)] {
            let position = [
                n[0] * 0.5 + u[0] * su + v[0] * sv,
                n[1] * 0.5 + u[1] * su + v[1] * sv,
                n[2] * 0.5 + u[2] * su + v[2] * sv,
            ];
            vertices.push(Vertex {
                position,
                normal: n,
            });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }
    MeshData { vertices, indices }
}

/// Flat annulus in the XZ plane, with separate top and bottom faces so it
/// survives back-face culling from either side.
fn ring_mesh(inner: f32, outer: f32, segments: u32) -> MeshData {
    let mut vertices = Vec::with_capacity((4 * (segments + 1)) as usize);
    for normal_y in [1.0_f32, -1.0] {
        for s in 0..=segments {
            let theta = TAU * s as f32 / segments as f32;
            let (sin, cos) = theta.sin_cos();
            for r in [inner, outer] {
                vertices.push(Vertex {
                    position: [r * cos, 0.0, r * sin],
                    normal: [0.0, normal_y, 0.0],
                });
            }
        }
    }

    let side = 2 * (segments + 1);
    let mut indices = Vec::with_capacity((12 * segments) as usize);
    for s in 0..segments {
        let i0 = 2 * s;
        let (o0, i1, o1) = (i0 + 1, i0 + 2, i0 + 3);
        // top, counter-clockwise seen from +Y
        indices.extend_from_slice(&[i0, i1, o0, o0, i1, o1]);
        // bottom, counter-clockwise seen from -Y
        let (bi0, bo0, bi1, bo1) = (i0 + side, o0 + side, i1 + side, o1 + side);
        indices.extend_from_slice(&[bi0, bo0, bi1, bo0, bo1, bi1]);
    }
    MeshData { vertices, indices }
}
