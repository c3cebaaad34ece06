//! REPL and menu handling.
//!
//! The terminal front end: a start menu, then a read-eval-print loop that feeds
//! each line to the resolver and renders what comes back. All printing happens
//! here and in [`crate::view`].

mod input;
pub mod system;

use anyhow::Result;
use colored::Colorize;
use log::info;

use crate::graph::SceneGraph;
use crate::loader::config::EngineConfig;
use crate::resolver::{CommandError, resolve};
use crate::save_files::peek_save;
use crate::state::GameState;
use crate::style::GameStyle;
use crate::view::{View, ViewItem};

use input::{InputEvent, InputManager};
pub use system::{ReplControl, ending_summary, handle_request, scene_view};

/// Run the start menu until the player exits.
///
/// # Errors
/// Propagates unrecoverable terminal failures.
pub fn run_repl(graph: &SceneGraph, config: &EngineConfig) -> Result<()> {
    let mut view = match config.display.wrap_width {
        Some(width) => View::with_width(width),
        None => View::new(),
    };
    let mut input = InputManager::new();

    loop {
        print_menu(graph, config);
        let choice = match input.read_line("Choose an option: ")? {
            InputEvent::Line(line) => line.trim().to_lowercase(),
            InputEvent::Eof => return Ok(()),
            InputEvent::Interrupted => continue,
        };
        match choice.as_str() {
            "1" | "new" | "n" => {
                let name = match input.read_line("What is your name, explorer? ")? {
                    InputEvent::Line(line) => line,
                    InputEvent::Eof => return Ok(()),
                    InputEvent::Interrupted => continue,
                };
                let state = GameState::new_game(graph, &name);
                info!("new game started for {}", state.player_name());
                println!("\n{}\n", graph.rules().intro.description_style());
                if let ReplControl::Exit = play(graph, config, state, &mut view, &mut input)? {
                    return Ok(());
                }
            },
            "2" | "load" | "l" => match crate::save_files::read_save_file(&config.save_file, graph) {
                Ok(state) => {
                    if let ReplControl::Exit = play(graph, config, state, &mut view, &mut input)? {
                        return Ok(());
                    }
                },
                Err(err) => {
                    view.push(ViewItem::Error(format!("Could not load game: {err}")));
                    view.flush();
                },
            },
            "3" | "how" | "h" => print_how_to_play(),
            "4" | "exit" | "quit" | "q" => return Ok(()),
            _ => println!("{}", "Please choose 1, 2, 3 or 4.".error_style()),
        }
    }
}

/// Play one session until it ends, the player quits, or input runs out.
fn play(
    graph: &SceneGraph,
    config: &EngineConfig,
    mut state: GameState,
    view: &mut View,
    input: &mut InputManager,
) -> Result<ReplControl> {
    view.extend(scene_view(&state, graph));
    if let Some(kind) = state.ending() {
        view.push(ending_summary(&state, graph, kind));
        view.flush();
        return replay_prompt(input);
    }
    view.flush();

    loop {
        if let Ok(scene) = graph.get_scene(state.current_scene()) {
            let terms: Vec<String> = scene
                .actions
                .iter()
                .flat_map(|action| std::iter::once(&action.command).chain(&action.aliases))
                .cloned()
                .collect();
            input.set_scene_terms(&terms);
        }

        let prompt = format!(
            "\n[{} | Health: {}/{} | Score: {}]>> ",
            state.player_name(),
            state.health(),
            graph.rules().max_health,
            state.score()
        );
        let line = match input.read_line(&prompt)? {
            InputEvent::Line(line) => line,
            InputEvent::Eof => return Ok(ReplControl::Exit),
            InputEvent::Interrupted => {
                view.push(ViewItem::EngineMessage("Command canceled.".to_string()));
                view.flush();
                continue;
            },
        };

        match resolve(&line, &state, graph) {
            Ok(outcome) => {
                view.extend(outcome.view_items);
                state = outcome.state;
                let control = match outcome.request {
                    Some(request) => {
                        let mut items = Vec::new();
                        let control = handle_request(request, &mut state, graph, &config.save_file, &mut items);
                        view.extend(items);
                        control
                    },
                    None => ReplControl::Continue,
                };
                if let Some(kind) = state.ending() {
                    view.push(ending_summary(&state, graph, kind));
                }
                view.flush();
                if state.is_over() {
                    return replay_prompt(input);
                }
                if let ReplControl::Menu | ReplControl::Exit = control {
                    return Ok(control);
                }
            },
            Err(CommandError::EmptyCommand) => {},
            Err(err) => {
                view.push(ViewItem::Error(err.to_string()));
                view.flush();
            },
        }
    }
}

fn replay_prompt(input: &mut InputManager) -> Result<ReplControl> {
    match input.read_line("Return to the main menu? (y/n) ")? {
        InputEvent::Line(line) if line.trim().eq_ignore_ascii_case("n") => Ok(ReplControl::Exit),
        InputEvent::Eof => Ok(ReplControl::Exit),
        _ => Ok(ReplControl::Menu),
    }
}

fn print_menu(graph: &SceneGraph, config: &EngineConfig) {
    println!("\n{}", graph.rules().title.to_uppercase().scene_titlebar_style());
    println!("  1) New game");
    match peek_save(&config.save_file, graph) {
        Some(summary) => println!(
            "  2) Load game {}",
            format!(
                "({} at {}, score {}{})",
                summary.player_name,
                summary.location,
                summary.score,
                summary.modified.map(|m| format!(", saved {m}")).unwrap_or_default()
            )
            .dimmed()
        ),
        None => println!("  2) Load game {}", "(no save yet)".dimmed()),
    }
    println!("  3) How to play");
    println!("  4) Exit");
}

fn print_how_to_play() {
    println!("\n{}", "How to play".subheading_style());
    println!("Each scene lists the actions you can take. Type an action's keyword to do it.");
    println!("Some actions take an argument, such as 'code 123'.");
    println!("Type 'help' in any scene to see its actions and the global commands.");
    println!("Hints are limited, and your health is too. Good luck.");
}
