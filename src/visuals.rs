//! Colours, palettes and sprite render modes.
//!
//! Colours arrive as packed hex strings (`#9d4edd`, `#fff`) in configuration
//! and are converted once, at spawn time, to normalized RGB triples.

use crate::error::ColorParseError;
use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An RGB colour parsed from a `#rgb` or `#rrggbb` hex string.
///
/// Serializes back to the string it was parsed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor {
    source: String,
    rgb: Vec3,
}

impl HexColor {
    /// Normalized RGB, each channel 0-1.
    #[inline]
    pub fn rgb(&self) -> Vec3 {
        self.rgb
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl FromStr for HexColor {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().trim_start_matches('#');
        let expanded: String = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 => digits.to_string(),
            _ => return Err(ColorParseError(s.to_string())),
        };
        let packed =
            u32::from_str_radix(&expanded, 16).map_err(|_| ColorParseError(s.to_string()))?;

        let r = ((packed >> 16) & 255) as f32 / 255.0;
        let g = ((packed >> 8) & 255) as f32 / 255.0;
        let b = (packed & 255) as f32 / 255.0;

        Ok(Self {
            source: s.to_string(),
            rgb: Vec3::new(r, g, b),
        })
    }
}

impl TryFrom<String> for HexColor {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HexColor> for String {
    fn from(color: HexColor) -> Self {
        color.source
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Parse a hex colour that is known to be valid at compile time.
pub(crate) fn hex(s: &str) -> HexColor {
    match s.parse() {
        Ok(color) => color,
        Err(_) => HexColor {
            source: s.to_string(),
            rgb: Vec3::ONE,
        },
    }
}

/// The purple/pink palette the particle field uses when none is given.
pub fn purple_palette() -> Vec<HexColor> {
    [
        "#9d4edd", // Vibrant violet
        "#7b2cbf", // Mid purple
        "#ff6bff", // Neon pink
        "#c77dff", // Lilac
        "#e0aaff", // Light lavender
        "#ff4dff", // Strong pink
    ]
    .into_iter()
    .map(hex)
    .collect()
}

/// Convert HSV to RGB, all components 0-1.
///
/// Branch-free form matching the shader's `hsv2rgb`; hue wraps.
pub fn hsv_to_rgb(hsv: Vec3) -> Vec3 {
    let k = Vec4::new(1.0, 2.0 / 3.0, 1.0 / 3.0, 3.0);
    let p = (fract3(Vec3::splat(hsv.x) + k.truncate()) * 6.0 - Vec3::splat(k.w)).abs();
    let rgb = (p - Vec3::ONE).clamp(Vec3::ZERO, Vec3::ONE);
    hsv.z * Vec3::ONE.lerp(rgb, hsv.y)
}

/// GLSL-style `fract`: `x - floor(x)`, always in [0, 1).
#[inline]
pub fn fract(x: f32) -> f32 {
    x - x.floor()
}

#[inline]
fn fract3(v: Vec3) -> Vec3 {
    v - v.floor()
}

/// Hermite smoothstep that accepts reversed edges (`e0 > e1`).
#[inline]
pub fn smoothstep(e0: f32, e1: f32, x: f32) -> f32 {
    let t = ((x - e0) / (e1 - e0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[inline]
pub fn mix(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// How each point sprite is shaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// Hard-edged disc with an antialiased rim and a bright core.
    Solid,
    /// Overlapping halo and core falloffs; nothing is discarded.
    #[default]
    Glow,
}

impl RenderMode {
    /// Value passed to the shader to select the mode.
    pub fn as_uniform(&self) -> f32 {
        match self {
            RenderMode::Solid => 0.0,
            RenderMode::Glow => 1.0,
        }
    }

    /// Shade one fragment of a sprite.
    ///
    /// * `d` - distance from the sprite centre in sprite units (0.5 = rim)
    /// * `color` - the particle's base colour
    /// * `seed` - the particle's first seed, keys the flicker
    /// * `time` - effect time in seconds
    /// * `intensity` - configured intensity
    ///
    /// Returns `None` where the fragment is discarded.
    pub fn shade(
        &self,
        d: f32,
        color: Vec3,
        seed: f32,
        time: f32,
        intensity: f32,
    ) -> Option<Vec4> {
        let time_glow = (time * 0.003 + seed * 12.56).sin() * 0.35;
        let intensity_glow = intensity * 0.4;

        match self {
            RenderMode::Solid => {
                if d > 0.5 {
                    return None;
                }
                let center_glow = 1.0 - smoothstep(0.0, 0.4, d);
                let alpha = 1.0 - smoothstep(0.4, 0.5, d);
                let glow = 0.4 + time_glow + intensity_glow + center_glow * 0.7;
                let core = 1.0 - smoothstep(0.0, 0.15, d);
                let rgb = color * (1.0 + glow) + Vec3::splat(core * 0.8);
                Some(rgb.extend(alpha * 0.95))
            }
            RenderMode::Glow => {
                let circle = smoothstep(0.5, 0.2, d) * (1.0 + time_glow * 0.7 + intensity_glow * 0.5);
                let halo = smoothstep(0.7, 0.3, d) * 0.6;
                let outer = smoothstep(0.8, 0.6, d) * 0.3;
                let alpha = circle.max(halo).max(outer);

                let core = 1.0 - smoothstep(0.0, 0.1, d);
                let rgb = color * (1.0 + intensity_glow + time_glow * 0.4)
                    + Vec3::splat(core * 1.2);
                Some(rgb.extend(alpha * 0.9))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_parse() {
        let c: HexColor = "#ff8000".parse().unwrap();
        assert!((c.rgb().x - 1.0).abs() < 1e-6);
        assert!((c.rgb().y - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(c.rgb().z, 0.0);
    }

    #[test]
    fn test_hex_shorthand() {
        let short: HexColor = "#f0a".parse().unwrap();
        let long: HexColor = "#ff00aa".parse().unwrap();
        assert_eq!(short.rgb(), long.rgb());
    }

    #[test]
    fn test_hex_rejects_garbage() {
        assert!("#12345".parse::<HexColor>().is_err());
        assert!("#gggggg".parse::<HexColor>().is_err());
        assert!("".parse::<HexColor>().is_err());
    }

    #[test]
    fn test_hex_serde_roundtrip() {
        let c: HexColor = serde_json::from_str("\"#5227FF\"").unwrap();
        assert_eq!(serde_json::to_string(&c).unwrap(), "\"#5227FF\"");
        assert!(serde_json::from_str::<HexColor>("\"purple\"").is_err());
    }

    #[test]
    fn test_purple_palette() {
        let palette = purple_palette();
        assert_eq!(palette.len(), 6);
        for c in &palette {
            assert!(c.rgb().min_element() >= 0.0 && c.rgb().max_element() <= 1.0);
        }
    }

    #[test]
    fn test_hsv_to_rgb() {
        let red = hsv_to_rgb(Vec3::new(0.0, 1.0, 1.0));
        assert!((red - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-5);

        let green = hsv_to_rgb(Vec3::new(1.0 / 3.0, 1.0, 1.0));
        assert!((green - Vec3::new(0.0, 1.0, 0.0)).length() < 1e-5);

        // Zero saturation is grey at the given value
        let grey = hsv_to_rgb(Vec3::new(0.7, 0.0, 0.5));
        assert!((grey - Vec3::splat(0.5)).length() < 1e-5);
    }

    #[test]
    fn test_smoothstep_reversed_edges() {
        assert_eq!(smoothstep(1.0, 0.2, 0.0), 1.0);
        assert_eq!(smoothstep(1.0, 0.2, 2.0), 0.0);
        assert!((smoothstep(0.0, 1.0, 0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_solid_discards_outside_rim() {
        let mode = RenderMode::Solid;
        assert!(mode.shade(0.51, Vec3::ONE, 0.3, 0.0, 1.0).is_none());

        let center = mode.shade(0.0, Vec3::ONE, 0.3, 0.0, 1.0).unwrap();
        assert!((center.w - 0.95).abs() < 1e-6);

        let rim = mode.shade(0.49, Vec3::ONE, 0.3, 0.0, 1.0).unwrap();
        assert!(rim.w < center.w);
    }

    #[test]
    fn test_glow_never_discards() {
        let mode = RenderMode::Glow;
        for i in 0..=20 {
            let d = i as f32 * 0.05;
            assert!(mode.shade(d, Vec3::ONE, 0.1, 2.0, 1.8).is_some());
        }
        // Far outside every falloff the sprite is fully transparent
        let far = mode.shade(0.9, Vec3::ONE, 0.1, 2.0, 1.8).unwrap();
        assert_eq!(far.w, 0.0);
    }

    #[test]
    fn test_brightness_from_flicker_and_intensity_only() {
        // Seed 0 at time 0 has no flicker, leaving the intensity term
        let solid = RenderMode::Solid.shade(0.0, Vec3::ONE, 0.0, 0.0, 1.0).unwrap();
        assert!((solid.x - (1.0 + 0.4 + 0.4 + 0.7 + 0.8)).abs() < 1e-5);

        let glow = RenderMode::Glow.shade(0.0, Vec3::ONE, 0.0, 0.0, 1.0).unwrap();
        assert!((glow.x - (1.0 + 0.4 + 1.2)).abs() < 1e-5);
    }
}
