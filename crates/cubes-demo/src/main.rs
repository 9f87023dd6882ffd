mod config;
mod cubes;
mod geometry;
mod shaders;

use cubes_engine::logging::{init_logging, LoggingConfig};
use cubes_engine::window::Runtime;

use crate::config::CubesConfig;
use crate::cubes::CubesApp;

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());

    let config = CubesConfig::default();
    log::info!(
        "starting \"{}\" at {}x{}",
        config.title,
        config.width,
        config.height
    );

    Runtime::run(config.runtime_config(), config.gpu_init(), CubesApp::new(config))
}
