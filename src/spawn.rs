//! Spawn context for entity initialization.
//!
//! Every engine draws its initial layout through a [`SpawnContext`] backed
//! by an injected random source. Outside of tests the source is seeded from
//! entropy, so each load looks different; tests pass a seeded [`SmallRng`]
//! to get reproducible layouts.
//!
//! ```
//! use backdrop::spawn::{rng_from_seed, SpawnContext};
//!
//! let mut rng = rng_from_seed(Some(7));
//! let mut ctx = SpawnContext::new(&mut rng, 0, 1);
//! let p = ctx.random_in_sphere(25.0, 1.5);
//! assert!(p.length() <= 25.0);
//! ```

use crate::{Vec3, Vec4};
use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};
use std::f32::consts::TAU;

/// Build the default random source.
///
/// `Some(seed)` gives a reproducible sequence; `None` seeds from entropy.
pub fn rng_from_seed(seed: Option<u64>) -> SmallRng {
    match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    }
}

/// Context provided to spawn code with helpers for common spawn patterns.
pub struct SpawnContext<'a> {
    /// Index of the entity being spawned (0 to count-1).
    pub index: u32,
    /// Total number of entities being spawned.
    pub count: u32,
    rng: &'a mut dyn RngCore,
}

impl<'a> SpawnContext<'a> {
    pub fn new(rng: &'a mut dyn RngCore, index: u32, count: u32) -> Self {
        Self { index, count, rng }
    }

    /// Move on to the next entity, keeping the random source.
    pub fn advance(&mut self) {
        self.index += 1;
    }

    /// Normalized progress through the spawn (0.0 to 1.0).
    #[inline]
    pub fn progress(&self) -> f32 {
        if self.count == 0 {
            0.0
        } else {
            self.index as f32 / self.count as f32
        }
    }

    // ========== Random primitives ==========

    /// Random f32 in [0, 1).
    #[inline]
    pub fn random(&mut self) -> f32 {
        self.rng.gen()
    }

    /// Four independent seeds in [0, 1).
    pub fn seeds(&mut self) -> Vec4 {
        Vec4::new(self.random(), self.random(), self.random(), self.random())
    }

    /// Pick one item uniformly. `None` for an empty slice.
    pub fn pick<'b, T>(&mut self, items: &'b [T]) -> Option<&'b T> {
        if items.is_empty() {
            return None;
        }
        let i = (self.random() * items.len() as f32) as usize;
        items.get(i.min(items.len() - 1))
    }

    // ========== Position helpers ==========

    /// Random point inside a sphere of given radius, centered at origin.
    ///
    /// Direction is uniform over the sphere (azimuth uniform, polar angle
    /// through `acos(2u - 1)`). The radius is `radius * u^exponent`:
    /// an exponent of 1/3 fills the volume uniformly, larger exponents pull
    /// points toward the centre.
    pub fn random_in_sphere(&mut self, radius: f32, exponent: f32) -> Vec3 {
        let theta = self.random() * TAU;
        let phi = (2.0 * self.random() - 1.0).clamp(-1.0, 1.0).acos();
        let r = self.random().powf(exponent) * radius;

        Vec3::new(
            r * phi.sin() * theta.cos(),
            r * phi.sin() * theta.sin(),
            r * phi.cos(),
        )
    }

    /// Random point inside an axis-aligned box centered at origin.
    pub fn random_in_box(&mut self, half_extents: Vec3) -> Vec3 {
        Vec3::new(
            (self.random() - 0.5) * 2.0 * half_extents.x,
            (self.random() - 0.5) * 2.0 * half_extents.y,
            (self.random() - 0.5) * 2.0 * half_extents.z,
        )
    }
}
