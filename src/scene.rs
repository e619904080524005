//! Scene descriptions: which backdrops to open and how they are configured.
//!
//! A scene is a JSON document with a title and a list of layers. Each layer
//! names its engine with `kind`; every other key is that engine's config and
//! may be left out.
//!
//! ```
//! use backdrop::scene::{LayerConfig, SceneConfig};
//!
//! let scene = SceneConfig::from_json(
//!     r#"{ "title": "portfolio", "layers": [
//!         { "kind": "starfield", "density": 1.2 },
//!         { "kind": "attraction", "count": 300 },
//!         { "kind": "particles" } ] }"#,
//! )
//! .unwrap();
//!
//! assert_eq!(scene.layers.len(), 3);
//! assert!(matches!(&scene.layers[1], LayerConfig::Attraction(c) if c.count == 300));
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::attraction::AttractionConfig;
use crate::error::SceneError;
use crate::particles::ParticleFieldConfig;
use crate::starfield::StarfieldConfig;

/// One backdrop in a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayerConfig {
    Particles(ParticleFieldConfig),
    Starfield(StarfieldConfig),
    Attraction(AttractionConfig),
}

impl LayerConfig {
    /// Engine name, as written in the `kind` key.
    pub fn kind(&self) -> &'static str {
        match self {
            LayerConfig::Particles(_) => "particles",
            LayerConfig::Starfield(_) => "starfield",
            LayerConfig::Attraction(_) => "attraction",
        }
    }
}

/// A set of layers, each opened in its own window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub title: String,
    /// Initial window size in logical pixels.
    pub width: u32,
    pub height: u32,
    pub layers: Vec<LayerConfig>,
}

impl Default for SceneConfig {
    /// One layer of every engine with default settings.
    fn default() -> Self {
        Self {
            title: "backdrop".into(),
            width: 1280,
            height: 720,
            layers: vec![
                LayerConfig::Particles(ParticleFieldConfig::default()),
                LayerConfig::Starfield(StarfieldConfig::default()),
                LayerConfig::Attraction(AttractionConfig::default()),
            ],
        }
    }
}

impl SceneConfig {
    pub fn from_json(json: &str) -> Result<Self, SceneError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a scene from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Save the scene as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SceneError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn with_layer(mut self, layer: LayerConfig) -> Self {
        self.layers.push(layer);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visuals::RenderMode;

    #[test]
    fn test_default_scene_has_every_engine() {
        let kinds: Vec<_> = SceneConfig::default().layers.iter().map(|l| l.kind()).collect();
        assert_eq!(kinds, ["particles", "starfield", "attraction"]);
    }

    #[test]
    fn test_missing_keys_use_defaults() {
        let scene = SceneConfig::from_json(r#"{ "layers": [{ "kind": "particles" }] }"#).unwrap();
        assert_eq!(scene.title, "backdrop");
        assert_eq!(
            scene.layers[0],
            LayerConfig::Particles(ParticleFieldConfig::default())
        );
    }

    #[test]
    fn test_layer_overrides() {
        let scene = SceneConfig::from_json(
            r##"{ "layers": [
                { "kind": "particles", "particle_count": 12, "alpha_particles": false,
                  "particle_colors": ["#fff", "#00ff00"] },
                { "kind": "starfield", "focal": [0.25, 0.75], "mouse_repulsion": false }
            ] }"##,
        )
        .unwrap();

        let LayerConfig::Particles(particles) = &scene.layers[0] else {
            panic!("expected particles, got {:?}", scene.layers[0]);
        };
        assert_eq!(particles.particle_count, 12);
        assert_eq!(particles.render_mode(), RenderMode::Solid);
        assert_eq!(particles.particle_colors.len(), 2);

        let LayerConfig::Starfield(stars) = &scene.layers[1] else {
            panic!("expected starfield, got {:?}", scene.layers[1]);
        };
        assert_eq!(stars.focal, [0.25, 0.75]);
        assert!(!stars.mouse_repulsion);
    }

    #[test]
    fn test_bad_colour_is_rejected() {
        let result = SceneConfig::from_json(
            r#"{ "layers": [{ "kind": "attraction", "color": "purple" }] }"#,
        );
        assert!(matches!(result, Err(SceneError::Json(_))));
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let result = SceneConfig::from_json(r#"{ "layers": [{ "kind": "fireworks" }] }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("backdrop-scene-{}.json", std::process::id()));
        let scene = SceneConfig::default();
        scene.save(&path).unwrap();
        let loaded = SceneConfig::load(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(loaded, scene);
    }

    #[test]
    fn test_missing_file() {
        let result = SceneConfig::load("/nonexistent/backdrop/scene.json");
        assert!(matches!(result, Err(SceneError::Io(_))));
    }
}
