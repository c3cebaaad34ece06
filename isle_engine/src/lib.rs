#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]

pub const ISLE_VERSION: &str = env!("CARGO_PKG_VERSION");

// Core modules
pub mod command;
pub mod data_paths;
pub mod graph;
pub mod loader;
pub mod repl;
pub mod resolver;
pub mod save_files;
pub mod scene;
pub mod state;
pub mod style;
pub mod view;

// Re-exports for convenience
pub use graph::{GraphError, GraphIntegrityError, SceneGraph};
pub use loader::config::{EngineConfig, load_config};
pub use loader::{default_graph, load_world};
pub use repl::run_repl;
pub use resolver::{CommandError, Outcome, SessionRequest, resolve, resolve_with};
pub use save_files::{SaveError, read_save_file, write_save_file};
pub use state::{GameState, StateError};
pub use view::{View, ViewItem};
