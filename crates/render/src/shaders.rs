//! WGSL sources for the cube program and the names of its interface.

pub const POSITION_ATTRIBUTE: &str = "a_position";
pub const COLOR_ATTRIBUTE: &str = "a_color";

pub const MODEL_UNIFORM: &str = "u_model";
pub const VIEW_UNIFORM: &str = "u_view";
pub const PROJECTION_UNIFORM: &str = "u_projection";

/// Struct whose `@location` members are the vertex attributes.
pub const VERTEX_INPUT_STRUCT: &str = "VertexInput";
/// Uniform block bound at group 0, binding 0.
pub const UNIFORM_STRUCT: &str = "Uniforms";

pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// Transforms `a_position` by `projection * view * model` and forwards
/// `a_color` untouched.
pub const VERTEX_SHADER: &str = r#"
struct Uniforms {
    u_model: mat4x4<f32>,
    u_view: mat4x4<f32>,
    u_projection: mat4x4<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct VertexInput {
    @location(0) a_position: vec3<f32>,
    @location(1) a_color: vec3<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) v_color: vec4<f32>,
};

@vertex
fn vs_main(vertex: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.v_color = vec4<f32>(vertex.a_color, 1.0);
    out.clip_position = uniforms.u_projection
        * uniforms.u_view
        * uniforms.u_model
        * vec4<f32>(vertex.a_position, 1.0);
    return out;
}
"#;

/// Writes the interpolated vertex color.
pub const FRAGMENT_SHADER: &str = r#"
struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) v_color: vec4<f32>,
};

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return in.v_color;
}
"#;
