use std::process::ExitCode;

use backdrop::scene::SceneConfig;
use backdrop::stage::Stage;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("backdrop=info"))
        .init();

    let scene = match std::env::args().nth(1) {
        Some(path) => match SceneConfig::load(&path) {
            Ok(scene) => scene,
            Err(err) => {
                log::error!("{}: {}", path, err);
                return ExitCode::FAILURE;
            }
        },
        None => SceneConfig::default(),
    };

    log::info!("Opening scene {:?} with {} layers", scene.title, scene.layers.len());

    match Stage::new(scene).run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
