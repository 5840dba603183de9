/// WGSL shader for every body mesh.
///
/// `params.x` selects the shading model: 0 basic (unlit), 1 standard (diffuse
/// from the scene lights over a faint ambient term), 2 emissive.
///
/// A light's `vector.w` is 1 for a point light at `vector.xyz` and 0 for a
/// directional light travelling along `vector.xyz`.
pub const BODY_SHADER: &str = r#"
struct Light {
    vector: vec4<f32>,
    radiance: vec4<f32>,
};

struct Uniforms {
    view_proj: mat4x4<f32>,
    lights: array<Light, 4>,
    light_count: vec4<u32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct InstanceInput {
    @location(2) model_0: vec4<f32>,
    @location(3) model_1: vec4<f32>,
    @location(4) model_2: vec4<f32>,
    @location(5) model_3: vec4<f32>,
    @location(6) color: vec4<f32>,
    @location(7) params: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) color: vec4<f32>,
    @location(3) shading: f32,
};

@vertex
fn vs_main(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    let world_pos = model * vec4<f32>(vertex.position, 1.0);

    var out: VertexOutput;
    out.clip_position = uniforms.view_proj * world_pos;
    out.world_position = world_pos.xyz;
    out.world_normal = normalize((model * vec4<f32>(vertex.normal, 0.0)).xyz);
    out.color = instance.color;
    out.shading = instance.params.x;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    if (in.shading < 0.5) {
        return in.color;
    }
    if (in.shading > 1.5) {
        return vec4<f32>(min(in.color.rgb * 1.2, vec3<f32>(1.0)), in.color.a);
    }
    var lighting = vec3<f32>(0.08);
    for (var i = 0u; i < uniforms.light_count.x; i = i + 1u) {
        let lamp = uniforms.lights[i];
        var to_light = -lamp.vector.xyz;
        if (lamp.vector.w > 0.5) {
            to_light = lamp.vector.xyz - in.world_position;
        }
        let light_dir = to_light / max(length(to_light), 1e-4);
        let diffuse = max(dot(in.world_normal, light_dir), 0.0);
        lighting = lighting + lamp.radiance.rgb * diffuse * 0.9;
    }
    return vec4<f32>(in.color.rgb * lighting, in.color.a);
}
"#;
