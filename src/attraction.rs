//! Pointer-attraction engine.
//!
//! Hundreds of small capsules are scattered across a slab in front of the
//! camera. Capsules whose home lies within the magnet radius of the pointer
//! gather on a wobbling ring around it, turn to face it and grow; the rest
//! drift back home. Every capsule is drawn as one instance of a shared mesh.
//!
//! All positions here are world units on the camera's z = 0 plane.

use crate::camera::Camera;
use crate::effect::Effect;
use crate::input::{Pointer, Viewport};
use crate::spawn::{rng_from_seed, SpawnContext};
use crate::time::Time;
use crate::visuals::{hex, HexColor};
use glam::{Mat3, Mat4, Quat, Vec2, Vec3, Vec4};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, TAU};

const CAMERA_DISTANCE: f32 = 50.0;
const FOV_DEGREES: f32 = 35.0;
const CAMERA_FAR: f32 = 1000.0;

/// Homes are spread over this multiple of the visible extent.
const HOME_SPREAD: f32 = 2.5;
/// Depth of the slab homes are spread through.
const HOME_DEPTH: f32 = 15.0;
/// Distance from the ring at which a capsule shrinks to its minimum scale.
const RING_FALLOFF: f32 = 8.0;

/// Attraction field settings. Every field is optional in a scene file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttractionConfig {
    pub count: u32,
    /// Capsules whose home is closer than this to the pointer are attracted.
    pub magnet_radius: f32,
    /// Radius of the ring attracted capsules settle on.
    pub ring_radius: f32,
    pub particle_size: f32,
    pub color: HexColor,
    pub opacity: f32,
    /// Radial wobble of the ring.
    pub wave_amplitude: f32,
    /// Fraction of the gap to the target closed per frame.
    pub smoothing: f32,
    /// Fixed seed for a reproducible layout.
    pub seed: Option<u64>,
}

impl Default for AttractionConfig {
    fn default() -> Self {
        Self {
            count: 400,
            magnet_radius: 15.0,
            ring_radius: 12.0,
            particle_size: 1.5,
            color: hex("#5227FF"),
            opacity: 1.0,
            wave_amplitude: 1.2,
            smoothing: 0.08,
            seed: None,
        }
    }
}

impl AttractionConfig {
    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    pub fn with_radii(mut self, magnet: f32, ring: f32) -> Self {
        self.magnet_radius = magnet;
        self.ring_radius = ring;
        self
    }

    pub fn with_color(mut self, color: HexColor) -> Self {
        self.color = color;
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// One instanced capsule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Capsule {
    pub home: Vec3,
    pub current: Vec3,
    /// Target chosen on the last step.
    pub target: Vec3,
    /// Wobble phase.
    pub phase: f32,
    /// Phase advance per frame.
    pub speed: f32,
}

impl Capsule {
    /// A capsule resting at `home`.
    pub fn new(home: Vec3, phase: f32, speed: f32) -> Self {
        Self {
            home,
            current: home,
            target: home,
            phase,
            speed,
        }
    }

    /// Spawn a capsule somewhere in front of a camera seeing `extent`.
    pub fn spawn(ctx: &mut SpawnContext, extent: Vec2) -> Self {
        let phase = ctx.random() * 100.0;
        let speed = 0.01 + ctx.random() / 150.0;
        let home = ctx.random_in_box(Vec3::new(
            extent.x * HOME_SPREAD * 0.5,
            extent.y * HOME_SPREAD * 0.5,
            HOME_DEPTH * 0.5,
        ));
        Self::new(home, phase, speed)
    }

    /// Where this capsule wants to be for the given pointer.
    pub fn target_for(&self, pointer: Vec2, config: &AttractionConfig) -> Vec3 {
        let offset = self.home.truncate() - pointer;
        let dist = offset.length();
        if dist >= config.magnet_radius {
            return self.home;
        }

        let angle = offset.y.atan2(offset.x);
        let wave = (self.phase * 0.5 + angle).sin() * config.wave_amplitude;
        let radius = config.ring_radius + wave;
        Vec3::new(
            pointer.x + radius * angle.cos(),
            pointer.y + radius * angle.sin(),
            self.home.z + self.phase.sin() * 3.0,
        )
    }

    /// Advance one frame toward the pointer.
    pub fn step(&mut self, pointer: Vec2, config: &AttractionConfig) {
        self.phase += self.speed;
        self.target = self.target_for(pointer, config);
        self.current += (self.target - self.current) * config.smoothing;
    }

    /// Rotation that points the capsule's +Z toward the pointer (at the
    /// capsule's own depth), followed by a quarter turn about local X.
    pub fn orientation(&self, pointer: Vec2) -> Quat {
        let look = look_toward(pointer.extend(self.current.z) - self.current);
        look * Quat::from_rotation_x(FRAC_PI_2)
    }

    /// Uniform scale: full size on the ring, shrinking with distance from it.
    pub fn scale(&self, pointer: Vec2, config: &AttractionConfig) -> f32 {
        let from_ring = ((self.current.truncate() - pointer).length() - config.ring_radius).abs();
        (1.0 - from_ring / RING_FALLOFF).clamp(0.2, 1.0) * config.particle_size
    }
}

/// Rotation whose +Z axis points along `dir`, keeping +Y up where possible.
fn look_toward(dir: Vec3) -> Quat {
    let Some(mut z) = dir.try_normalize() else {
        return Quat::IDENTITY;
    };
    if Vec3::Y.cross(z).length_squared() < 1e-12 {
        // Looking straight up or down; nudge off the up axis
        z.z += 1e-4;
        z = z.normalize();
    }
    let x = Vec3::Y.cross(z).normalize();
    let y = z.cross(x);
    Quat::from_mat3(&Mat3::from_cols(x, y, z))
}

/// The pointer-attraction engine.
pub struct AttractionField {
    config: AttractionConfig,
    capsules: Vec<Capsule>,
    time: Time,
    pointer: Pointer,
    pointer_world: Vec2,
    camera: Camera,
    viewport: Viewport,
}

impl AttractionField {
    /// Build a field, seeded from `config.seed` or from entropy.
    pub fn new(config: AttractionConfig, viewport: Viewport) -> Self {
        let mut rng = rng_from_seed(config.seed);
        Self::with_rng(config, viewport, &mut rng)
    }

    /// Build a field drawing its layout from `rng`.
    pub fn with_rng(config: AttractionConfig, viewport: Viewport, rng: &mut dyn RngCore) -> Self {
        let extent = camera_for(viewport).visible_extent();
        let mut ctx = SpawnContext::new(rng, 0, config.count);
        let mut capsules = Vec::with_capacity(config.count as usize);
        for _ in 0..config.count {
            capsules.push(Capsule::spawn(&mut ctx, extent));
            ctx.advance();
        }
        Self::from_capsules(config, viewport, capsules)
    }

    /// Build a field from an explicit capsule pool.
    pub fn from_capsules(config: AttractionConfig, viewport: Viewport, capsules: Vec<Capsule>) -> Self {
        Self {
            config,
            capsules,
            time: Time::new(),
            pointer: Pointer::new(viewport),
            pointer_world: Vec2::ZERO,
            camera: camera_for(viewport),
            viewport,
        }
    }

    pub fn config(&self) -> &AttractionConfig {
        &self.config
    }

    pub fn capsules(&self) -> &[Capsule] {
        &self.capsules
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn time(&self) -> &Time {
        &self.time
    }

    /// Pointer position in world units.
    pub fn pointer_world(&self) -> Vec2 {
        self.pointer_world
    }

    /// Width and height of the visible plane in world units.
    pub fn extent(&self) -> Vec2 {
        self.camera.visible_extent()
    }

    /// Material colour with opacity applied.
    pub fn color(&self) -> Vec4 {
        self.config.color.rgb().extend(0.6 * self.config.opacity)
    }

    /// Model matrix of one capsule for the current pointer.
    pub fn instance_transform(&self, capsule: &Capsule) -> Mat4 {
        let pointer = self.pointer_world;
        Mat4::from_scale_rotation_translation(
            Vec3::splat(capsule.scale(pointer, &self.config)),
            capsule.orientation(pointer),
            capsule.current,
        )
    }

    pub fn view_projection(&self) -> Mat4 {
        self.camera.projection_matrix() * self.camera.view_matrix()
    }
}

fn camera_for(viewport: Viewport) -> Camera {
    let mut camera = Camera::new(CAMERA_DISTANCE, FOV_DEGREES).with_far(CAMERA_FAR);
    camera.fit(viewport);
    camera
}

impl Effect for AttractionField {
    fn name(&self) -> &'static str {
        "attraction"
    }

    /// Rescales every home by the change in visible extent. The pool
    /// itself never changes.
    fn resize(&mut self, viewport: Viewport) {
        let before = self.extent();
        self.camera.fit(viewport);
        let after = self.extent();
        self.viewport = viewport;
        self.pointer.set_region(viewport);

        let ratio = after / before;
        if !ratio.is_finite() {
            return;
        }
        for capsule in &mut self.capsules {
            capsule.home.x *= ratio.x;
            capsule.home.y *= ratio.y;
        }
    }

    fn pointer_moved(&mut self, position: Vec2) {
        self.pointer.move_to(position);
        self.pointer_world = self.pointer.ndc() * self.extent() * 0.5;
    }

    fn update(&mut self, delta: f32) {
        self.time.advance(delta);
        let pointer = self.pointer_world;
        for capsule in &mut self.capsules {
            capsule.step(pointer, &self.config);
        }
    }

    fn time(&self) -> &Time {
        &self.time
    }

    fn instance_count(&self) -> u32 {
        self.capsules.len() as u32
    }
}

/// Triangle mesh of a capsule along +Y, built as a lathe of its profile.
#[derive(Debug, Clone, PartialEq)]
pub struct CapsuleMesh {
    pub positions: Vec<Vec3>,
    pub indices: Vec<u16>,
}

impl CapsuleMesh {
    /// * `radius` - radius of the caps and the body
    /// * `length` - length of the straight middle section
    /// * `cap_segments` - profile steps per hemisphere
    /// * `radial_segments` - steps around the axis
    pub fn new(radius: f32, length: f32, cap_segments: u32, radial_segments: u32) -> Self {
        let cap_segments = cap_segments.max(1);
        let radial_segments = radial_segments.max(3);

        // Profile from the bottom pole up to the top pole as (ring radius, y)
        let mut profile = Vec::new();
        for (centre, from) in [(-length * 0.5, -FRAC_PI_2), (length * 0.5, 0.0)] {
            for k in 0..=cap_segments {
                let a = from + FRAC_PI_2 * k as f32 / cap_segments as f32;
                profile.push(Vec2::new(radius * a.cos(), centre + radius * a.sin()));
            }
        }

        let mut positions = Vec::with_capacity(profile.len() * radial_segments as usize);
        for ring in &profile {
            for s in 0..radial_segments {
                let theta = TAU * s as f32 / radial_segments as f32;
                positions.push(Vec3::new(ring.x * theta.cos(), ring.y, ring.x * theta.sin()));
            }
        }

        let r = radial_segments as u16;
        let mut indices = Vec::new();
        for j in 0..(profile.len() as u16 - 1) {
            for s in 0..r {
                let a = j * r + s;
                let b = j * r + (s + 1) % r;
                let c = (j + 1) * r + s;
                let d = (j + 1) * r + (s + 1) % r;
                indices.extend_from_slice(&[a, c, b, b, c, d]);
            }
        }

        Self { positions, indices }
    }
}

impl Default for CapsuleMesh {
    fn default() -> Self {
        Self::new(0.1, 0.4, 4, 8)
    }
}
