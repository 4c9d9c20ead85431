use anyhow::Context;
use shadowmap::window::{self, WindowSettings};
use shadowmap::SceneConfig;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    // Optional JSON scene configuration as the only argument
    let config = match std::env::args().nth(1) {
        Some(path) => SceneConfig::from_path(&path)
            .with_context(|| format!("failed to load scene configuration from {path}"))?,
        None => SceneConfig::default(),
    };
    log::info!(
        "Starting with {} depth encoding, bias {}",
        config.encoding,
        config.depth_bias
    );

    window::run(WindowSettings::new().title("shadowmap"), config)
}
