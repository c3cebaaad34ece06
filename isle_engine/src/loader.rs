//! Loader utilities for building a `SceneGraph` from serialized data.
//!
//! World content comes from a RON `WorldDef`. The Treasure Island world is
//! compiled into the binary; a different file can be selected in `isle.toml`.

pub mod config;
pub mod worlddef;

use anyhow::{Context, Result};
use log::info;

use crate::data_paths::data_path;
use crate::graph::SceneGraph;
use crate::loader::config::EngineConfig;
use crate::loader::worlddef::{load_worlddef, parse_worlddef};

/// The bundled world definition.
pub const DEFAULT_WORLD: &str = include_str!("../data/world.ron");

/// Build the graph for the bundled world.
///
/// # Errors
/// Fails only if the bundled RON is malformed or inconsistent.
pub fn default_graph() -> Result<SceneGraph> {
    let def = parse_worlddef(DEFAULT_WORLD).context("while parsing bundled world")?;
    let graph = SceneGraph::from_def(&def).context("while building bundled world")?;
    Ok(graph)
}

/// Load the world selected by `config`, falling back to the bundled one.
///
/// # Errors
/// Errors bubble up from file IO, deserialization, or integrity checks.
pub fn load_world(config: &EngineConfig) -> Result<SceneGraph> {
    let Some(world_file) = &config.world_file else {
        info!("loading bundled world");
        return default_graph();
    };
    let path = if world_file.is_relative() {
        data_path(world_file)
    } else {
        world_file.clone()
    };
    info!("loading world from {}", path.display());
    let def = load_worlddef(&path).context("while loading worlddef from file")?;
    let graph = SceneGraph::from_def(&def).with_context(|| format!("while building world from {}", path.display()))?;
    info!(
        "world '{}' loaded: {} scenes, {} unreachable",
        graph.rules().title,
        graph.scene_count(),
        graph.unreachable_scenes().len()
    );
    Ok(graph)
}
