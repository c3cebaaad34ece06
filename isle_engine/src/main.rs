#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
//! ** Isle **
//! Scene/state text adventure engine

use isle_engine::data_paths::data_path;
use isle_engine::loader::config::CONFIG_FILE;
use isle_engine::{ISLE_VERSION, load_config, load_world, run_repl};

use anyhow::{Context, Result};
use log::info;

fn main() -> Result<()> {
    env_logger::init();
    info!("Start: isle v{ISLE_VERSION}");

    let config = load_config(&data_path(CONFIG_FILE));
    let graph = load_world(&config).context("while loading the world")?;
    info!(
        "world '{}' ready with {} scenes; saves go to {}",
        graph.rules().title,
        graph.scene_count(),
        config.save_file.display()
    );

    run_repl(&graph, &config)
}
