//! Particle-field engine.
//!
//! A fixed cloud of point sprites scattered through a sphere. The whole cloud
//! sways and slowly rotates as one body, shifts away from the pointer, and
//! every particle drifts and pulses on its own seed-keyed sine waves.
//!
//! Per-particle motion is evaluated in the vertex shader
//! (`gpu::points`); [`ParticleField::displaced_position`] and
//! [`ParticleField::point_size`] are host mirrors of that code.
//!
//! # Example
//!
//! ```
//! use backdrop::effect::Effect;
//! use backdrop::input::Viewport;
//! use backdrop::particles::{ParticleField, ParticleFieldConfig};
//!
//! let config = ParticleFieldConfig::default().with_count(100).with_seed(1);
//! let mut field = ParticleField::new(config, Viewport::new(800, 600));
//! field.update(1.0 / 60.0);
//!
//! assert_eq!(field.instance_count(), 100);
//! ```

use crate::camera::Camera;
use crate::effect::Effect;
use crate::input::{Pointer, Viewport};
use crate::spawn::{rng_from_seed, SpawnContext};
use crate::time::Time;
use crate::visuals::{mix, purple_palette, HexColor, RenderMode};
use glam::{EulerRot, Mat4, Quat, Vec2, Vec3, Vec4};
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Phase multiplier applied to seeds in the shader (one turn, rounded).
const SEED_PHASE: f32 = 6.28;
/// Base angular rate of the per-particle drift.
const WAVE_SPEED: f32 = 0.003;
/// Camera field of view in degrees.
const FOV_DEGREES: f32 = 60.0;

/// Particle field settings. Every field is optional in a scene file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleFieldConfig {
    pub particle_count: u32,
    /// Radius of the spawn sphere.
    pub particle_spread: f32,
    /// Clock multiplier.
    pub speed: f32,
    pub particle_colors: Vec<HexColor>,
    /// Shift the cloud away from the pointer.
    pub move_particles_on_hover: bool,
    pub particle_hover_factor: f32,
    /// Soft glowing sprites instead of solid discs.
    pub alpha_particles: bool,
    pub particle_base_size: f32,
    pub size_randomness: f32,
    pub camera_distance: f32,
    pub disable_rotation: bool,
    pub pixel_ratio: f32,
    pub intensity: f32,
    /// Fixed seed for a reproducible layout.
    pub seed: Option<u64>,
}

impl Default for ParticleFieldConfig {
    fn default() -> Self {
        Self {
            particle_count: 800,
            particle_spread: 25.0,
            speed: 0.3,
            particle_colors: purple_palette(),
            move_particles_on_hover: true,
            particle_hover_factor: 0.8,
            alpha_particles: true,
            particle_base_size: 140.0,
            size_randomness: 3.5,
            camera_distance: 40.0,
            disable_rotation: false,
            pixel_ratio: 1.8,
            intensity: 1.8,
            seed: None,
        }
    }
}

impl ParticleFieldConfig {
    pub fn with_count(mut self, count: u32) -> Self {
        self.particle_count = count;
        self
    }

    pub fn with_spread(mut self, spread: f32) -> Self {
        self.particle_spread = spread;
        self
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_colors(mut self, colors: Vec<HexColor>) -> Self {
        self.particle_colors = colors;
        self
    }

    /// Enable or disable the pointer shift, with its strength.
    pub fn with_hover(mut self, enabled: bool, factor: f32) -> Self {
        self.move_particles_on_hover = enabled;
        self.particle_hover_factor = factor;
        self
    }

    pub fn with_rotation(mut self, enabled: bool) -> Self {
        self.disable_rotation = !enabled;
        self
    }

    pub fn with_render_mode(mut self, mode: RenderMode) -> Self {
        self.alpha_particles = mode == RenderMode::Glow;
        self
    }

    pub fn with_intensity(mut self, intensity: f32) -> Self {
        self.intensity = intensity;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn render_mode(&self) -> RenderMode {
        if self.alpha_particles {
            RenderMode::Glow
        } else {
            RenderMode::Solid
        }
    }
}

/// One point sprite. Fixed for its whole life.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// Position inside the spawn sphere.
    pub home: Vec3,
    /// Four independent seeds in [0, 1).
    pub seeds: Vec4,
    pub color: Vec3,
}

impl Particle {
    /// Spawn a particle with a home inside a sphere of radius `spread`.
    ///
    /// An empty palette gives white particles.
    pub fn spawn(ctx: &mut SpawnContext, spread: f32, palette: &[Vec3]) -> Self {
        let home = ctx.random_in_sphere(spread, 1.5);
        let seeds = ctx.seeds();
        let color = ctx.pick(palette).copied().unwrap_or(Vec3::ONE);
        Self { home, seeds, color }
    }
}

/// The particle-field engine.
pub struct ParticleField {
    config: ParticleFieldConfig,
    particles: Vec<Particle>,
    time: Time,
    pointer: Pointer,
    camera: Camera,
    viewport: Viewport,
    rotation: Vec3,
    anchor: Vec3,
}

impl ParticleField {
    /// Build a field, seeded from `config.seed` or from entropy.
    pub fn new(config: ParticleFieldConfig, viewport: Viewport) -> Self {
        let mut rng = rng_from_seed(config.seed);
        Self::with_rng(config, viewport, &mut rng)
    }

    /// Build a field drawing its layout from `rng`.
    pub fn with_rng(config: ParticleFieldConfig, viewport: Viewport, rng: &mut dyn RngCore) -> Self {
        let palette: Vec<Vec3> = config.particle_colors.iter().map(HexColor::rgb).collect();
        let count = config.particle_count;

        let mut ctx = SpawnContext::new(rng, 0, count);
        let mut particles = Vec::with_capacity(count as usize);
        for _ in 0..count {
            particles.push(Particle::spawn(&mut ctx, config.particle_spread, &palette));
            ctx.advance();
        }

        let mut camera = Camera::new(config.camera_distance, FOV_DEGREES);
        camera.fit(viewport);

        Self {
            time: Time::with_scale(config.speed),
            pointer: Pointer::new(viewport),
            camera,
            viewport,
            rotation: Vec3::ZERO,
            anchor: Vec3::ZERO,
            particles,
            config,
        }
    }

    pub fn config(&self) -> &ParticleFieldConfig {
        &self.config
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn time(&self) -> &Time {
        &self.time
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Whole-cloud translation for the current frame.
    pub fn anchor(&self) -> Vec3 {
        self.anchor
    }

    /// Whole-cloud Euler rotation (x, y, z) for the current frame.
    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    /// Model matrix of the cloud. Rotation applies in Y, X, Z order.
    pub fn model_matrix(&self) -> Mat4 {
        let rotation = Quat::from_euler(
            EulerRot::YXZ,
            self.rotation.y,
            self.rotation.x,
            self.rotation.z,
        );
        Mat4::from_rotation_translation(rotation, self.anchor)
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.camera.view_matrix()
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.camera.projection_matrix()
    }

    /// Brightness/scale pulse of one particle, between 0.6 and 1.4.
    pub fn pulse(&self, particle: &Particle) -> f32 {
        let t = self.time.elapsed() * 1.5;
        (t * 0.002 + particle.seeds.x * SEED_PHASE).sin() * 0.4 + 1.0
    }

    /// World position of one particle this frame.
    pub fn displaced_position(&self, particle: &Particle) -> Vec3 {
        let r = particle.seeds;
        let t = self.time.elapsed() * 1.5;
        let k = 3.0 * self.config.intensity;

        let mut p = self
            .model_matrix()
            .transform_point3(particle.home * self.config.particle_spread);
        p.x += (t * WAVE_SPEED * r.z + SEED_PHASE * r.w).sin() * mix(1.5, 6.0, r.x) * k;
        p.y += (t * WAVE_SPEED * 1.2 * r.y + SEED_PHASE * r.x).sin() * mix(1.5, 6.0, r.w) * k;
        p.z += (t * WAVE_SPEED * 0.8 * r.w + SEED_PHASE * r.y).sin() * mix(1.5, 6.0, r.z) * k;

        p *= self.pulse(particle);

        p.x += (t * 0.0005 + r.y * SEED_PHASE).sin() * 3.0;
        p.y += (t * 0.0007 + r.z * SEED_PHASE).cos() * 3.0;
        p
    }

    /// Sprite diameter in pixels this frame, never negative.
    pub fn point_size(&self, particle: &Particle) -> f32 {
        let view_pos = self
            .view_matrix()
            .transform_point3(self.displaced_position(particle));
        let distance_factor = 1.0 / (view_pos.length() * 0.25).max(1e-6);
        let variation = 1.0 + self.config.size_randomness * (particle.seeds.y - 0.5);
        let intensity = 1.0 + self.config.intensity * 0.7;

        (self.config.particle_base_size
            * self.config.pixel_ratio
            * variation
            * distance_factor
            * intensity
            * self.pulse(particle)
            * 1.2)
            .max(0.0)
    }

    fn update_anchor(&mut self) {
        let e = self.time.elapsed();

        self.anchor = if self.config.move_particles_on_hover {
            let shift = -self.pointer.ndc() * self.config.particle_hover_factor * 4.0;
            shift.extend(0.0)
        } else {
            Vec3::ZERO
        };

        if !self.config.disable_rotation {
            self.rotation.x = (e * 0.05).sin() * 0.25;
            self.rotation.y = (e * 0.08).cos() * 0.3;
            self.rotation.z += 0.005 * self.config.speed;

            self.anchor.x += (e * 0.12).cos() * 2.0;
            self.anchor.y += (e * 0.15).sin() * 3.0;
        }
    }
}

impl Effect for ParticleField {
    fn name(&self) -> &'static str {
        "particles"
    }

    fn listens_to_pointer(&self) -> bool {
        self.config.move_particles_on_hover
    }

    fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.pointer.set_region(viewport);
        self.camera.fit(viewport);
    }

    fn pointer_moved(&mut self, position: Vec2) {
        self.pointer.move_to(position);
    }

    fn update(&mut self, delta: f32) {
        self.time.advance(delta);
        self.update_anchor();
    }

    fn time(&self) -> &Time {
        &self.time
    }

    fn instance_count(&self) -> u32 {
        self.particles.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spawn::rng_from_seed;

    fn field(config: ParticleFieldConfig) -> ParticleField {
        ParticleField::new(config.with_seed(11), Viewport::new(1280, 720))
    }

    #[test]
    fn test_config_defaults() {
        let config = ParticleFieldConfig::default();
        assert_eq!(config.particle_count, 800);
        assert_eq!(config.particle_spread, 25.0);
        assert_eq!(config.particle_colors.len(), 6);
        assert_eq!(config.render_mode(), RenderMode::Glow);
        assert!(config.seed.is_none());
    }

    #[test]
    fn test_config_from_partial_json() {
        let config: ParticleFieldConfig =
            serde_json::from_str(r##"{"particle_count": 12, "particle_colors": ["#fff"]}"##)
                .unwrap();
        assert_eq!(config.particle_count, 12);
        assert_eq!(config.particle_colors[0].rgb(), Vec3::ONE);
        assert_eq!(config.intensity, 1.8);
    }

    #[test]
    fn test_homes_within_spread() {
        let f = field(ParticleFieldConfig::default());
        assert_eq!(f.particles().len(), 800);
        for p in f.particles() {
            assert!(p.home.length() <= 25.0 + 1e-3);
            assert!(p.seeds.min_element() >= 0.0 && p.seeds.max_element() < 1.0);
        }
    }

    #[test]
    fn test_density_falls_off_with_radius() {
        let spread = 10.0;
        let f = field(ParticleFieldConfig::default().with_count(20_000).with_spread(spread));

        // Particles per unit volume in four equal-width shells
        let mut counts = [0usize; 4];
        for p in f.particles() {
            let shell = ((p.home.length() / spread) * 4.0) as usize;
            counts[shell.min(3)] += 1;
        }
        let density: Vec<f32> = counts
            .iter()
            .enumerate()
            .map(|(k, &n)| {
                let (inner, outer) = (k as f32, k as f32 + 1.0);
                n as f32 / (outer.powi(3) - inner.powi(3))
            })
            .collect();
        for pair in density.windows(2) {
            assert!(pair[0] > pair[1], "{density:?}");
        }
    }

    #[test]
    fn test_colors_come_from_palette() {
        let f = field(ParticleFieldConfig::default().with_count(200));
        let palette: Vec<Vec3> = purple_palette().iter().map(HexColor::rgb).collect();
        for p in f.particles() {
            assert!(palette.contains(&p.color));
        }
    }

    #[test]
    fn test_empty_palette_is_white() {
        let mut rng = rng_from_seed(Some(5));
        let mut ctx = SpawnContext::new(&mut rng, 0, 1);
        let p = Particle::spawn(&mut ctx, 1.0, &[]);
        assert_eq!(p.color, Vec3::ONE);
    }

    #[test]
    fn test_zero_particles() {
        let mut f = field(ParticleFieldConfig::default().with_count(0));
        for _ in 0..10 {
            f.update(1.0 / 60.0);
        }
        assert_eq!(f.instance_count(), 0);
        assert!(f.model_matrix().is_finite());
    }

    #[test]
    fn test_clock_scaled_by_speed() {
        let mut f = field(ParticleFieldConfig::default().with_count(1));
        f.update(1.0);
        assert!((f.time().elapsed() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_anchor_moves_away_from_pointer() {
        let mut f = field(
            ParticleFieldConfig::default()
                .with_count(1)
                .with_rotation(false),
        );
        // Right edge, vertical centre
        f.pointer_moved(Vec2::new(1280.0, 360.0));
        f.update(1.0 / 60.0);
        assert!((f.anchor() - Vec3::new(-3.2, 0.0, 0.0)).length() < 1e-5);
        assert_eq!(f.rotation(), Vec3::ZERO);
    }

    #[test]
    fn test_hover_disabled_ignores_pointer() {
        let mut f = field(
            ParticleFieldConfig::default()
                .with_count(1)
                .with_rotation(false)
                .with_hover(false, 0.8),
        );
        assert!(!f.listens_to_pointer());
        f.pointer_moved(Vec2::ZERO);
        f.update(1.0 / 60.0);
        assert_eq!(f.anchor(), Vec3::ZERO);
    }

    #[test]
    fn test_rotation_advances_per_frame() {
        let mut f = field(ParticleFieldConfig::default().with_count(1));
        for _ in 0..10 {
            f.update(1.0 / 60.0);
        }
        assert!((f.rotation().z - 10.0 * 0.005 * 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_pulse_range() {
        let mut f = field(ParticleFieldConfig::default().with_count(50));
        for _ in 0..30 {
            f.update(0.5);
        }
        for p in f.particles() {
            let pulse = f.pulse(p);
            assert!((0.6 - 1e-5..=1.4 + 1e-5).contains(&pulse));
        }
    }

    #[test]
    fn test_point_size_never_negative() {
        let mut f = field(ParticleFieldConfig::default().with_count(200));
        f.update(1.0 / 60.0);
        for p in f.particles() {
            let size = f.point_size(p);
            assert!(size.is_finite() && size >= 0.0);
        }
    }

    #[test]
    fn test_displacement_at_rest() {
        // With rotation off, the pointer centred and the clock at zero the
        // displacement reduces to the seed-keyed phase offsets.
        let f = field(
            ParticleFieldConfig::default()
                .with_count(1)
                .with_rotation(false),
        );
        let p = Particle {
            home: Vec3::new(0.1, 0.0, 0.0),
            seeds: Vec4::ZERO,
            color: Vec3::ONE,
        };
        let world = f.displaced_position(&p);
        assert!((world.x - 2.5).abs() < 1e-4);
        assert!((world.y - 3.0).abs() < 1e-4);
        assert!(world.z.abs() < 1e-4);
    }
}
