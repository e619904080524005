//! Named shader parameters.
//!
//! A [`UniformSet`] is an ordered list of named values. The same list
//! produces both the WGSL struct declaration and the bytes uploaded to the
//! GPU, so the two can never drift apart.
//!
//! # Example
//!
//! ```
//! use backdrop::uniforms::UniformSet;
//! use backdrop::Vec2;
//!
//! let mut set = UniformSet::new();
//! set.set("time", 0.0f32);
//! set.set("focal", Vec2::splat(0.5));
//! set.set("transparent", true);
//!
//! assert!(set.to_wgsl_fields().contains("focal: vec2<f32>,"));
//! assert_eq!(set.byte_size(), 32);
//! ```

use glam::{Vec2, Vec3};
use std::collections::HashMap;

/// Supported uniform value types.
///
/// Booleans are carried as `U32` (0 or 1).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformValue {
    F32(f32),
    U32(u32),
    Vec2(Vec2),
    Vec3(Vec3),
}

impl UniformValue {
    /// Get the WGSL type name for this value.
    pub fn wgsl_type(&self) -> &'static str {
        match self {
            UniformValue::F32(_) => "f32",
            UniformValue::U32(_) => "u32",
            UniformValue::Vec2(_) => "vec2<f32>",
            UniformValue::Vec3(_) => "vec3<f32>",
        }
    }

    /// Alignment of this value inside a WGSL uniform struct.
    pub fn align(&self) -> usize {
        match self {
            UniformValue::Vec3(_) => 16,
            UniformValue::Vec2(_) => 8,
            _ => 4,
        }
    }

    /// Write this value to a byte buffer.
    pub fn write_bytes(&self, buf: &mut Vec<u8>) {
        match self {
            UniformValue::F32(v) => buf.extend_from_slice(&v.to_le_bytes()),
            UniformValue::U32(v) => buf.extend_from_slice(&v.to_le_bytes()),
            UniformValue::Vec2(v) => {
                buf.extend_from_slice(&v.x.to_le_bytes());
                buf.extend_from_slice(&v.y.to_le_bytes());
            }
            UniformValue::Vec3(v) => {
                buf.extend_from_slice(&v.x.to_le_bytes());
                buf.extend_from_slice(&v.y.to_le_bytes());
                buf.extend_from_slice(&v.z.to_le_bytes());
                // A following scalar may pack into the trailing 4 bytes
            }
        }
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::F32(v)
    }
}

impl From<u32> for UniformValue {
    fn from(v: u32) -> Self {
        UniformValue::U32(v)
    }
}

impl From<bool> for UniformValue {
    fn from(v: bool) -> Self {
        UniformValue::U32(v as u32)
    }
}

impl From<Vec2> for UniformValue {
    fn from(v: Vec2) -> Self {
        UniformValue::Vec2(v)
    }
}

impl From<Vec3> for UniformValue {
    fn from(v: Vec3) -> Self {
        UniformValue::Vec3(v)
    }
}

/// Ordered collection of named uniform values.
#[derive(Clone, Debug, Default)]
pub struct UniformSet {
    /// Ordered list of (name, value) pairs.
    /// Order matters for WGSL struct layout.
    values: Vec<(String, UniformValue)>,
    /// Quick lookup by name.
    indices: HashMap<String, usize>,
}

impl UniformSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or update a uniform value.
    ///
    /// Updating keeps the original position, so the layout is fixed by the
    /// first call for each name.
    pub fn set<V: Into<UniformValue>>(&mut self, name: &str, value: V) {
        let value = value.into();
        if let Some(&idx) = self.indices.get(name) {
            self.values[idx].1 = value;
        } else {
            let idx = self.values.len();
            self.values.push((name.to_string(), value));
            self.indices.insert(name.to_string(), idx);
        }
    }

    pub fn get(&self, name: &str) -> Option<&UniformValue> {
        self.indices.get(name).map(|&idx| &self.values[idx].1)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &UniformValue)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Generate the WGSL struct fields, one per line.
    pub fn to_wgsl_fields(&self) -> String {
        self.values
            .iter()
            .map(|(name, value)| format!("    {}: {},", name, value.wgsl_type()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Generate a complete WGSL struct declaration.
    pub fn to_wgsl_struct(&self, name: &str) -> String {
        format!("struct {} {{\n{}\n}};\n", name, self.to_wgsl_fields())
    }

    /// Serialize all values for GPU upload, padded to a 16-byte multiple.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        for (_, value) in &self.values {
            let align = value.align();
            while buf.len() % align != 0 {
                buf.push(0);
            }
            value.write_bytes(&mut buf);
        }
        while buf.len() % 16 != 0 {
            buf.push(0);
        }
        buf
    }

    /// Total byte size with alignment.
    pub fn byte_size(&self) -> usize {
        self.to_bytes().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f32_at(bytes: &[u8], offset: usize) -> f32 {
        f32::from_le_bytes([
            bytes[offset],
            bytes[offset + 1],
            bytes[offset + 2],
            bytes[offset + 3],
        ])
    }

    #[test]
    fn test_set_keeps_order() {
        let mut set = UniformSet::new();
        set.set("a", 1.0f32);
        set.set("b", 2.0f32);
        set.set("a", 3.0f32);

        let names: Vec<_> = set.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(set.get("a"), Some(&UniformValue::F32(3.0)));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_vec3_alignment() {
        let mut set = UniformSet::new();
        set.set("time", 1.5f32);
        set.set("resolution", Vec3::new(800.0, 600.0, 800.0 / 600.0));
        set.set("focal", Vec2::new(0.25, 0.75));

        let bytes = set.to_bytes();
        assert_eq!(f32_at(&bytes, 0), 1.5);
        // vec3 starts on a 16-byte boundary
        assert_eq!(f32_at(&bytes, 16), 800.0);
        // vec2 after the vec3 starts on an 8-byte boundary
        assert_eq!(f32_at(&bytes, 32), 0.25);
        assert_eq!(bytes.len(), 48);
    }

    #[test]
    fn test_scalar_packs_after_vec3() {
        let mut set = UniformSet::new();
        set.set("v", Vec3::ONE);
        set.set("s", 9.0f32);
        let bytes = set.to_bytes();
        assert_eq!(f32_at(&bytes, 12), 9.0);
        assert_eq!(bytes.len(), 16);
    }

    #[test]
    fn test_bool_as_u32() {
        let mut set = UniformSet::new();
        set.set("flag", true);
        assert_eq!(set.get("flag"), Some(&UniformValue::U32(1)));
        assert!(set.to_wgsl_fields().contains("flag: u32,"));
    }

    #[test]
    fn test_wgsl_struct() {
        let mut set = UniformSet::new();
        set.set("time", 0.0f32);
        let decl = set.to_wgsl_struct("Params");
        assert!(decl.starts_with("struct Params {"));
        assert!(decl.contains("    time: f32,"));
    }
}
