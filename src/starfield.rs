//! Procedural starfield engine.
//!
//! A full-screen fragment shader draws four layers of hashed star cells that
//! fly toward the viewer, rotate slowly about a focal point and bend away
//! from the pointer while it is moving. The host side only eases the pointer
//! and an activity level; everything else is a pure function of the uniform
//! set and the pixel.
//!
//! [`shade`] is the CPU mirror of the fragment shader, so the look can be
//! tested without a GPU.
//!
//! # Example
//!
//! ```
//! use backdrop::starfield::{hash21, shade, StarUniforms, StarfieldConfig};
//! use backdrop::input::Viewport;
//! use backdrop::Vec2;
//!
//! let uniforms = StarUniforms::new(&StarfieldConfig::default(), Viewport::new(640, 480));
//! let pixel = shade(Vec2::new(0.3, 0.7), &uniforms);
//! assert!(pixel.is_finite());
//!
//! assert_eq!(hash21(Vec2::new(3.0, 4.0)), hash21(Vec2::new(3.0, 4.0)));
//! ```

use crate::effect::Effect;
use crate::input::{Activity, Pointer, PointerTracker, Viewport};
use crate::time::Time;
use crate::uniforms::UniformSet;
use crate::visuals::{fract, hsv_to_rgb, mix, smoothstep};
use glam::{Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

/// Number of depth layers.
pub const LAYERS: u32 = 4;

const SIN_45: f32 = 0.7071;

/// Starfield settings. Every field is optional in a scene file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StarfieldConfig {
    /// Centre of the field in unit coordinates (y up).
    pub focal: [f32; 2],
    /// How fast layers fly toward the viewer.
    pub star_speed: f32,
    pub density: f32,
    /// Hue rotation in degrees.
    pub hue_shift: f32,
    /// Speed of the per-star jitter.
    pub speed: f32,
    pub glow_intensity: f32,
    pub saturation: f32,
    pub mouse_repulsion: bool,
    pub repulsion_strength: f32,
    /// Radians per second.
    pub rotation_speed: f32,
    /// Alpha follows brightness instead of being opaque.
    pub transparent: bool,
    /// Fraction of the gap to the pointer closed per frame.
    pub pointer_follow: f32,
    /// Fraction of the gap to the activity target closed per frame.
    pub activity_rate: f32,
}

impl Default for StarfieldConfig {
    fn default() -> Self {
        Self {
            focal: [0.5, 0.5],
            star_speed: 0.5,
            density: 1.0,
            hue_shift: 200.0,
            speed: 1.0,
            glow_intensity: 0.5,
            saturation: 0.5,
            mouse_repulsion: true,
            repulsion_strength: 2.5,
            rotation_speed: 0.05,
            transparent: true,
            pointer_follow: 0.1,
            activity_rate: 0.05,
        }
    }
}

impl StarfieldConfig {
    pub fn with_focal(mut self, focal: Vec2) -> Self {
        self.focal = focal.to_array();
        self
    }

    pub fn with_density(mut self, density: f32) -> Self {
        self.density = density;
        self
    }

    pub fn with_hue_shift(mut self, degrees: f32) -> Self {
        self.hue_shift = degrees;
        self
    }

    pub fn with_repulsion(mut self, enabled: bool, strength: f32) -> Self {
        self.mouse_repulsion = enabled;
        self.repulsion_strength = strength;
        self
    }

    pub fn with_rotation_speed(mut self, speed: f32) -> Self {
        self.rotation_speed = speed;
        self
    }

    pub fn with_transparent(mut self, transparent: bool) -> Self {
        self.transparent = transparent;
        self
    }

    /// Tune the pointer easing and activity decay rates.
    pub fn with_easing(mut self, pointer_follow: f32, activity_rate: f32) -> Self {
        self.pointer_follow = pointer_follow;
        self.activity_rate = activity_rate;
        self
    }
}

/// Every value the starfield shader reads, in shader order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StarUniforms {
    /// Seconds.
    pub time: f32,
    /// Width, height and aspect ratio in pixels.
    pub resolution: Vec3,
    pub focal: Vec2,
    pub star_speed: f32,
    pub density: f32,
    pub hue_shift: f32,
    pub speed: f32,
    /// Eased pointer in unit coordinates (y up).
    pub mouse: Vec2,
    pub glow_intensity: f32,
    pub saturation: f32,
    pub mouse_repulsion: bool,
    pub rotation_speed: f32,
    pub repulsion_strength: f32,
    /// Eased pointer activity, 0 when idle.
    pub mouse_active_factor: f32,
    pub transparent: bool,
}

impl StarUniforms {
    /// Uniforms at time zero with the pointer resting on the centre.
    pub fn new(config: &StarfieldConfig, viewport: Viewport) -> Self {
        Self {
            time: 0.0,
            resolution: resolution_of(viewport),
            focal: Vec2::from_array(config.focal),
            star_speed: config.star_speed,
            density: config.density,
            hue_shift: config.hue_shift,
            speed: config.speed,
            mouse: Vec2::splat(0.5),
            glow_intensity: config.glow_intensity,
            saturation: config.saturation,
            mouse_repulsion: config.mouse_repulsion,
            rotation_speed: config.rotation_speed,
            repulsion_strength: config.repulsion_strength,
            mouse_active_factor: 0.0,
            transparent: config.transparent,
        }
    }

    /// The named uniform set uploaded to the shader.
    pub fn to_set(&self) -> UniformSet {
        let mut set = UniformSet::new();
        set.set("time", self.time);
        set.set("resolution", self.resolution);
        set.set("focal", self.focal);
        set.set("star_speed", self.star_speed);
        set.set("density", self.density);
        set.set("hue_shift", self.hue_shift);
        set.set("speed", self.speed);
        set.set("mouse", self.mouse);
        set.set("glow_intensity", self.glow_intensity);
        set.set("saturation", self.saturation);
        set.set("mouse_repulsion", self.mouse_repulsion);
        set.set("rotation_speed", self.rotation_speed);
        set.set("repulsion_strength", self.repulsion_strength);
        set.set("mouse_active_factor", self.mouse_active_factor);
        set.set("transparent", self.transparent);
        set
    }
}

fn resolution_of(viewport: Viewport) -> Vec3 {
    let size = viewport.size();
    Vec3::new(size.x, size.y, viewport.aspect())
}

#[inline]
fn fract2(v: Vec2) -> Vec2 {
    v - v.floor()
}

/// Hash a 2D cell id to a pseudo-random value in [0, 1).
pub fn hash21(p: Vec2) -> f32 {
    let mut p = fract2(p * Vec2::new(123.34, 456.21));
    p += Vec2::splat(p.dot(p + Vec2::splat(45.32)));
    fract(p.x * p.y)
}

/// Triangle wave with period 1, ranging over [0, 1].
pub fn tris(x: f32) -> f32 {
    1.0 - smoothstep(0.0, 1.0, (2.0 * fract(x) - 1.0).abs())
}

/// Brightness of a single star at offset `uv` from its centre.
pub fn star(uv: Vec2, flare: f32, glow: f32) -> f32 {
    let d = uv.length();
    let mut m = (0.05 * glow) / d;

    let rays = smoothstep(0.0, 1.0, 1.0 - (uv.x * uv.y * 1000.0).abs());
    m += rays * flare * glow;

    let diagonal = Vec2::new(SIN_45 * uv.x - SIN_45 * uv.y, SIN_45 * uv.x + SIN_45 * uv.y);
    let rays = smoothstep(0.0, 1.0, 1.0 - (diagonal.x * diagonal.y * 1000.0).abs());
    m += rays * 0.3 * flare * glow;

    m * smoothstep(1.0, 0.2, d)
}

/// Colour of one star layer at `uv` (in cell units).
pub fn star_layer(uv: Vec2, u: &StarUniforms) -> Vec3 {
    let mut col = Vec3::ZERO;
    let gv = fract2(uv) - Vec2::splat(0.5);
    let id = uv.floor();

    for y in -1..=1 {
        for x in -1..=1 {
            let offset = Vec2::new(x as f32, y as f32);
            let seed = hash21(id + offset);
            let size = fract(seed * 345.32);
            let flare = smoothstep(0.9, 1.0, size);

            let base = hsv_to_rgb(Vec3::new(
                fract(seed + u.hue_shift / 360.0),
                u.saturation,
                1.0,
            ));
            let pad = Vec2::new(
                tris(seed * 34.0 + u.time * u.speed * 0.1),
                tris(seed * 38.0 + u.time * u.speed * 0.05),
            ) - Vec2::splat(0.5);

            col += star(gv - offset - pad, flare, u.glow_intensity) * size * base;
        }
    }
    col
}

/// Colour of the starfield at `uv` (unit coordinates, y up).
pub fn shade(uv: Vec2, u: &StarUniforms) -> Vec4 {
    let res = u.resolution.truncate();
    let focal_px = u.focal * res;
    let mut p = (uv * res - focal_px) / res.y;

    if u.mouse_repulsion {
        let mouse = (u.mouse * res - focal_px) / res.y;
        let away = p - mouse;
        let force = (u.repulsion_strength * 0.1) / (away.length() + 0.15);
        p += away.normalize_or_zero() * force * u.mouse_active_factor;
    }

    let angle = u.time * u.rotation_speed;
    let (s, c) = angle.sin_cos();
    p = Vec2::new(c * p.x - s * p.y, s * p.x + c * p.y);

    let mut col = Vec3::ZERO;
    for layer in 0..LAYERS {
        let i = layer as f32 / LAYERS as f32;
        let depth = fract(i + u.time * u.star_speed * 0.1);
        let scale = mix(20.0 * u.density, 0.5 * u.density, depth);
        col += star_layer(p * scale + Vec2::splat(i * 453.32), u) * depth;
    }

    let alpha = if u.transparent { col.length() } else { 1.0 };
    col.extend(alpha)
}

/// The starfield engine.
pub struct Starfield {
    config: StarfieldConfig,
    uniforms: StarUniforms,
    time: Time,
    pointer: Pointer,
    tracker: PointerTracker,
    activity: Activity,
    viewport: Viewport,
}

impl Starfield {
    pub fn new(config: StarfieldConfig, viewport: Viewport) -> Self {
        let centre = Vec2::splat(0.5);
        Self {
            uniforms: StarUniforms::new(&config, viewport),
            time: Time::new(),
            pointer: Pointer::new(viewport),
            tracker: PointerTracker::new(centre, config.pointer_follow),
            activity: Activity::new(config.activity_rate),
            viewport,
            config,
        }
    }

    pub fn config(&self) -> &StarfieldConfig {
        &self.config
    }

    pub fn uniforms(&self) -> &StarUniforms {
        &self.uniforms
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn time(&self) -> &Time {
        &self.time
    }

    /// Uniform set for this frame.
    pub fn uniform_set(&self) -> UniformSet {
        self.uniforms.to_set()
    }
}

impl Effect for Starfield {
    fn name(&self) -> &'static str {
        "starfield"
    }

    fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.pointer.set_region(viewport);
        self.uniforms.resolution = resolution_of(viewport);
    }

    fn pointer_moved(&mut self, position: Vec2) {
        self.pointer.move_to(position);
        self.tracker.set_target(self.pointer.uv());
    }

    fn update(&mut self, delta: f32) {
        self.time.advance(delta);

        if self.pointer.take_moved() {
            self.activity.poke();
        }

        self.uniforms.time = self.time.elapsed();
        self.uniforms.mouse = self.tracker.step();
        self.uniforms.mouse_active_factor = self.activity.step();
    }

    /// One full-screen triangle.
    fn time(&self) -> &Time {
        &self.time
    }

    fn instance_count(&self) -> u32 {
        1
    }
}
