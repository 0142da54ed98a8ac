use std::path::PathBuf;

use game3d::settings::EngineSettings;

fn main() {
    game3d::init_logging();

    let mut args = std::env::args().skip(1);
    let Some(model_path) = args.next().map(PathBuf::from) else {
        eprintln!("usage: game3d <model.gltf> [settings.json]");
        std::process::exit(2);
    };
    let settings = match args.next() {
        Some(path) => EngineSettings::load_from_path(path),
        None => EngineSettings::load(),
    };

    if let Err(err) = game3d::run(&model_path, &settings) {
        eprintln!("Application error: {err}");
        std::process::exit(1);
    }
}
