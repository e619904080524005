//! Every WGSL program the canvases build must parse and validate.

use backdrop::gpu::{point_shader, starfield_shader, CAPSULE_SHADER};
use backdrop::shader_utils::all_utils_wgsl;
use naga::front::wgsl;
use naga::valid::{Capabilities, ValidationFlags, Validator};

fn validate(source: &str) -> Result<naga::Module, String> {
    let module = wgsl::parse_str(source).map_err(|err| err.emit_to_string(source))?;
    Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .map_err(|err| format!("{err:?}"))?;
    Ok(module)
}

fn entry_points(module: &naga::Module) -> Vec<&str> {
    let mut names: Vec<&str> = module.entry_points.iter().map(|e| e.name.as_str()).collect();
    names.sort();
    names
}

#[test]
fn test_point_shader_validates() {
    let source = point_shader();
    let module = validate(&source).unwrap_or_else(|e| panic!("point shader:\n{e}"));
    assert_eq!(entry_points(&module), ["fs_main", "vs_main"]);
}

#[test]
fn test_starfield_shader_validates() {
    let source = starfield_shader();
    let module = validate(&source).unwrap_or_else(|e| panic!("starfield shader:\n{e}"));
    assert_eq!(entry_points(&module), ["fs_main", "vs_main"]);
}

#[test]
fn test_capsule_shader_validates() {
    let module = validate(CAPSULE_SHADER).unwrap_or_else(|e| panic!("capsule shader:\n{e}"));
    assert_eq!(entry_points(&module), ["fs_main", "vs_main"]);
}

#[test]
fn test_utils_validate_alone() {
    validate(&all_utils_wgsl()).unwrap_or_else(|e| panic!("utils:\n{e}"));
}

#[test]
fn test_starfield_uniform_struct_matches_upload() {
    use backdrop::input::Viewport;
    use backdrop::starfield::{StarUniforms, StarfieldConfig};

    let source = starfield_shader();
    let module = validate(&source).unwrap();
    let set = StarUniforms::new(&StarfieldConfig::default(), Viewport::default()).to_set();

    let (_, ty) = module
        .types
        .iter()
        .find(|(_, t)| t.name.as_deref() == Some("Uniforms"))
        .expect("Uniforms struct");
    let naga::TypeInner::Struct { members, span } = &ty.inner else {
        panic!("Uniforms is not a struct");
    };

    assert_eq!(members.len(), set.len());
    assert_eq!(*span as usize, set.byte_size());
    for (member, (name, _)) in members.iter().zip(set.iter()) {
        assert_eq!(member.name.as_deref(), Some(name));
    }
}
