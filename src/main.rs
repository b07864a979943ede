use std::path::PathBuf;

use diorama::app::DioramaApp;
use diorama::config::ViewerConfig;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Optional path to a TOML config; falls back to ./diorama.toml, then defaults
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = ViewerConfig::load(config_path.as_deref())?;

    DioramaApp::new(config)?.run()
}
