//! WGSL helper functions shared by the shaders.
//!
//! # Available Functions
//!
//! - `hash21(p: vec2<f32>) -> f32` - Hash a 2D cell id to [0, 1)
//! - `tris(x: f32) -> f32` - Triangle wave of period 1, range [0, 1]
//! - `smooth_step(e0: f32, e1: f32, x: f32) -> f32` - Hermite step that
//!   accepts reversed edges
//! - `hsv2rgb(c: vec3<f32>) -> vec3<f32>` - Convert HSV (0-1) to RGB
//!
//! Each function has a CPU twin (see [`crate::visuals`] and
//! [`crate::starfield`]) so behaviour can be tested without a GPU.

/// WGSL code for hashing and periodic functions.
pub const HASH_WGSL: &str = r#"
fn hash21(p_in: vec2<f32>) -> f32 {
    var p = fract(p_in * vec2<f32>(123.34, 456.21));
    p = p + dot(p, p + 45.32);
    return fract(p.x * p.y);
}

fn tris(x: f32) -> f32 {
    return 1.0 - smooth_step(0.0, 1.0, abs(2.0 * fract(x) - 1.0));
}
"#;

/// WGSL code for interpolation.
///
/// Built-in `smoothstep` is undefined for `e0 >= e1`; this one is not.
pub const STEP_WGSL: &str = r#"
fn smooth_step(e0: f32, e1: f32, x: f32) -> f32 {
    let t = clamp((x - e0) / (e1 - e0), 0.0, 1.0);
    return t * t * (3.0 - 2.0 * t);
}
"#;

/// WGSL code for color conversion.
pub const COLOR_WGSL: &str = r#"
// h, s, v all in [0, 1]; hue wraps
fn hsv2rgb(c: vec3<f32>) -> vec3<f32> {
    let k = vec4<f32>(1.0, 2.0 / 3.0, 1.0 / 3.0, 3.0);
    let p = abs(fract(c.xxx + k.xyz) * 6.0 - k.www);
    return c.z * mix(k.xxx, clamp(p - k.xxx, vec3<f32>(0.0), vec3<f32>(1.0)), c.y);
}
"#;

/// Get all utility functions combined.
pub fn all_utils_wgsl() -> String {
    format!(
        "// Utility functions\n{}\n{}\n{}\n",
        STEP_WGSL, HASH_WGSL, COLOR_WGSL
    )
}
