//! `repl::system` module
//!
//! Handlers for the session requests the resolver hands back (save, load,
//! quit) and the summary shown when a story ends.

use std::path::Path;

use isle_data::EndingKind;
use log::{info, warn};

use crate::graph::SceneGraph;
use crate::resolver::SessionRequest;
use crate::save_files::{read_save_file, write_save_file};
use crate::state::GameState;
use crate::view::ViewItem;

/// Control flow signal used by handlers to leave the play loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplControl {
    Continue,
    Menu,
    Exit,
}

/// Carry out a save, load or quit request against the single save slot.
///
/// A failed load leaves `state` exactly as it was.
pub fn handle_request(
    request: SessionRequest,
    state: &mut GameState,
    graph: &SceneGraph,
    save_file: &Path,
    view: &mut Vec<ViewItem>,
) -> ReplControl {
    match request {
        SessionRequest::Save => {
            match write_save_file(save_file, state) {
                Ok(()) => view.push(ViewItem::EngineMessage(format!(
                    "Game saved to {}.",
                    save_file.display()
                ))),
                Err(err) => {
                    warn!("save failed: {err}");
                    view.push(ViewItem::Error(format!("Could not save the game: {err}")));
                },
            }
            ReplControl::Continue
        },
        SessionRequest::Load => {
            match read_save_file(save_file, graph) {
                Ok(loaded) => {
                    *state = loaded;
                    view.push(ViewItem::EngineMessage(format!(
                        "Game loaded from {}.",
                        save_file.display()
                    )));
                    view.extend(scene_view(state, graph));
                },
                Err(err) => view.push(ViewItem::Error(format!(
                    "Could not load the game: {err}. Your current game is unchanged."
                ))),
            }
            ReplControl::Continue
        },
        SessionRequest::Quit => {
            info!(
                "{} quit in '{}' with a score of {}",
                state.player_name(),
                state.current_scene(),
                state.score()
            );
            view.push(ViewItem::EngineMessage("Returning to the main menu.".to_string()));
            ReplControl::Menu
        },
    }
}

/// Description of the scene the player currently stands in.
pub fn scene_view(state: &GameState, graph: &SceneGraph) -> Vec<ViewItem> {
    match graph.get_scene(state.current_scene()) {
        Ok(scene) => vec![ViewItem::SceneDescription {
            title: scene.title.clone(),
            description: scene.description.clone(),
        }],
        Err(err) => vec![ViewItem::Error(err.to_string())],
    }
}

/// Closing summary for a finished session.
pub fn ending_summary(state: &GameState, graph: &SceneGraph, kind: EndingKind) -> ViewItem {
    info!("{} reached the {kind} ending with {} points", state.player_name(), state.score());
    ViewItem::EngineMessage(format!(
        "{} finished with the {kind} ending. Score: {} | Health: {}/{} | Scenes visited: {}/{}",
        state.player_name(),
        state.score(),
        state.health(),
        graph.rules().max_health,
        state.visited().len(),
        graph.scene_count()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::default_graph;
    use crate::resolver::resolve;
    use anyhow::Result;
    use tempfile::tempdir;

    #[test]
    fn save_then_load_restores_state() -> Result<()> {
        let graph = default_graph()?;
        let dir = tempdir()?;
        let slot = dir.path().join("savegame.json");
        let mut items = Vec::new();

        let mut saved = GameState::new_game(&graph, "Tess");
        saved = resolve("chest", &saved, &graph)?.state;
        let control = handle_request(SessionRequest::Save, &mut saved, &graph, &slot, &mut items);
        assert_eq!(control, ReplControl::Continue);

        let mut current = resolve("proceed", &saved, &graph)?.state;
        handle_request(SessionRequest::Load, &mut current, &graph, &slot, &mut items);
        assert_eq!(current, saved);
        assert!(items.iter().any(ViewItem::is_scene_description));
        Ok(())
    }

    #[test]
    fn failed_load_keeps_current_session() -> Result<()> {
        let graph = default_graph()?;
        let dir = tempdir()?;
        let slot = dir.path().join("savegame.json");
        std::fs::write(&slot, r#"{"current_scene": "nowhere"}"#)?;

        let mut items = Vec::new();
        let mut state = GameState::new_game(&graph, "Tess");
        let before = state.clone();
        handle_request(SessionRequest::Load, &mut state, &graph, &slot, &mut items);
        assert_eq!(state, before);
        assert!(items.iter().any(ViewItem::is_error));
        Ok(())
    }

    #[test]
    fn quit_returns_to_menu() -> Result<()> {
        let graph = default_graph()?;
        let mut state = GameState::new_game(&graph, "Tess");
        let mut items = Vec::new();
        let control = handle_request(
            SessionRequest::Quit,
            &mut state,
            &graph,
            Path::new("unused.json"),
            &mut items,
        );
        assert_eq!(control, ReplControl::Menu);
        Ok(())
    }
}
