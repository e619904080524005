use backdrop::prelude::*;
use backdrop::scene::LayerConfig;

fn bundled(name: &str) -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("scenes")
        .join(name)
}

#[test]
fn test_portfolio_scene_loads() {
    let scene = SceneConfig::load(bundled("portfolio.json")).unwrap();
    assert_eq!(scene.title, "portfolio");

    let kinds: Vec<_> = scene.layers.iter().map(LayerConfig::kind).collect();
    assert_eq!(kinds, ["particles", "starfield", "attraction"]);

    match &scene.layers[0] {
        LayerConfig::Particles(c) => {
            assert_eq!(c.particle_count, 550);
            assert_eq!(c.pixel_ratio, 1.5);
            // Unlisted keys keep their defaults
            assert_eq!(c.camera_distance, ParticleFieldConfig::default().camera_distance);
        }
        other => panic!("expected particles, got {other:?}"),
    }
    match &scene.layers[2] {
        LayerConfig::Attraction(c) => {
            assert_eq!(c.count, 300);
            assert_eq!(c.color.as_str(), "#5227FF");
        }
        other => panic!("expected attraction, got {other:?}"),
    }
}

#[test]
fn test_scene_layers_build_engines() {
    let scene = SceneConfig::load(bundled("portfolio.json")).unwrap();
    let viewport = Viewport::new(800, 600);

    for layer in &scene.layers {
        let count = match layer {
            LayerConfig::Particles(c) => ParticleField::new(c.clone(), viewport).instance_count(),
            LayerConfig::Starfield(c) => Starfield::new(c.clone(), viewport).instance_count(),
            LayerConfig::Attraction(c) => AttractionField::new(c.clone(), viewport).instance_count(),
        };
        let expected = match layer {
            LayerConfig::Particles(c) => c.particle_count,
            LayerConfig::Starfield(_) => 1,
            LayerConfig::Attraction(c) => c.count,
        };
        assert_eq!(count, expected, "{}", layer.kind());
    }
}
