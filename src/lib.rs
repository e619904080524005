//! # backdrop
//!
//! GPU-rendered animated backgrounds that sit behind page content and react
//! to the pointer.
//!
//! Three engines are provided:
//!
//! - [`ParticleField`] - a slowly rotating cloud of glowing points that
//!   drifts away from the pointer
//! - [`Starfield`] - layers of procedural stars flying toward the viewer,
//!   bending away from a moving pointer
//! - [`AttractionField`] - a scattered field of capsules that gather into
//!   a wobbling ring around the pointer
//!
//! Each engine is an [`Effect`]: plain state advanced once per frame. A
//! [`Canvas`] draws it with wgpu, and a [`Mount`] ties the two to a
//! [`FrameHost`] that paces frames and delivers pointer and resize events.
//!
//! ## Quick Start
//!
//! ```no_run
//! use backdrop::prelude::*;
//!
//! fn main() -> Result<(), StageError> {
//!     let scene = SceneConfig::default()
//!         .with_layer(LayerConfig::Starfield(StarfieldConfig::default().with_density(1.2)));
//!     Stage::new(scene).run()
//! }
//! ```
//!
//! ## Without a window
//!
//! Every engine can be stepped on the CPU alone, which is how the tests
//! drive them:
//!
//! ```
//! use backdrop::prelude::*;
//!
//! let config = AttractionConfig::default().with_count(100).with_seed(7);
//! let mut field = AttractionField::new(config, Viewport::new(1280, 720));
//!
//! field.pointer_moved(Vec2::new(640.0, 360.0));
//! for _ in 0..60 {
//!     field.update(1.0 / 60.0);
//! }
//! assert_eq!(field.instance_count(), 100);
//! ```
//!
//! ## Scenes
//!
//! The `backdrop` binary opens one window per layer of a JSON scene file
//! (see [`scene`]). Set `RUST_LOG=backdrop=debug` to log frame rates.

pub mod attraction;
pub mod camera;
pub mod effect;
pub mod error;
pub mod gpu;
pub mod input;
pub mod mount;
pub mod particles;
pub mod scene;
pub mod scheduler;
pub mod shader_utils;
pub mod spawn;
pub mod stage;
pub mod starfield;
pub mod time;
pub mod uniforms;
pub mod visuals;

pub use attraction::{AttractionConfig, AttractionField};
pub use effect::{Canvas, DrawStats, Effect};
pub use glam::{Vec2, Vec3, Vec4};
pub use mount::{Layer, Mount};
pub use particles::{ParticleField, ParticleFieldConfig};
pub use scheduler::{FrameHost, FrameScheduler};
pub use starfield::{Starfield, StarfieldConfig};

/// Convenient re-exports for common usage.
///
/// ```
/// use backdrop::prelude::*;
/// ```
pub mod prelude {
    pub use crate::attraction::{AttractionConfig, AttractionField};
    pub use crate::effect::{Canvas, DrawStats, Effect};
    pub use crate::error::{MountError, RenderError, SceneError, StageError};
    pub use crate::input::Viewport;
    pub use crate::mount::{Layer, Mount};
    pub use crate::particles::{ParticleField, ParticleFieldConfig};
    pub use crate::scene::{LayerConfig, SceneConfig};
    pub use crate::scheduler::{FrameHost, FrameScheduler, ListenerKind};
    pub use crate::stage::Stage;
    pub use crate::starfield::{Starfield, StarfieldConfig};
    pub use crate::time::Time;
    pub use crate::visuals::{HexColor, RenderMode};
    pub use crate::{Vec2, Vec3, Vec4};
}
