//! Command resolver
//!
//! Applies one player command to a session. The caller's `GameState` is never
//! touched: the resolver clones it, applies the command to the clone and hands
//! the clone back inside an `Outcome`. A failed command therefore leaves no
//! trace.

use isle_data::EndingKind;
use log::{debug, info};
use rand::Rng;
use thiserror::Error;

use crate::command::{Command, parse_command};
use crate::graph::{GraphError, SceneGraph};
use crate::scene::{Action, CodeLock, Effect, Scene};
use crate::state::{GameState, StateError};
use crate::view::{ActionLine, PATH_SUMMARY_LEN, StatusReport, ViewItem};

/// Recoverable command failures. None of these change the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Please type a command. Type 'help' to see what you can do.")]
    EmptyCommand,
    #[error("The story has already ended ({0} ending). Start a new game to play again.")]
    SessionOver(EndingKind),
    #[error("Unknown command '{0}'. Type 'help' to see what you can do.")]
    UnknownCommand(String),
    #[error("{message}")]
    PreconditionFailed { message: String },
    #[error("You have no hints left.")]
    NoHintsRemaining,
    #[error("You are not carrying '{0}'.")]
    ItemNotInInventory(String),
    #[error("The {0} cannot be used right now.")]
    ItemNotUsable(String),
    #[error("'{command}' needs an argument. Usage: {usage}")]
    MissingArgument { command: String, usage: String },
    #[error("'{argument}' is not valid here. Usage: {usage}")]
    InvalidArgument { argument: String, usage: String },
    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl From<StateError> for CommandError {
    fn from(err: StateError) -> Self {
        match err {
            StateError::NoHintsRemaining => CommandError::NoHintsRemaining,
            StateError::ItemNotHeld(item) => CommandError::ItemNotInInventory(item),
        }
    }
}

/// Session-level requests the resolver hands back to the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRequest {
    Save,
    Load,
    Quit,
}

/// Result of a successfully resolved command.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub state: GameState,
    pub view_items: Vec<ViewItem>,
    pub ending: Option<EndingKind>,
    pub request: Option<SessionRequest>,
}

impl Outcome {
    /// All narrative output of the turn as plain text, one item per line.
    pub fn narrative(&self) -> String {
        self.view_items
            .iter()
            .map(ViewItem::plain_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Resolve `input` against `state` using the thread-local RNG for scene events.
///
/// # Errors
/// Returns a `CommandError` if the command cannot be carried out; `state` is never modified.
pub fn resolve(input: &str, state: &GameState, graph: &SceneGraph) -> Result<Outcome, CommandError> {
    resolve_with(input, state, graph, &mut rand::rng())
}

/// Resolve `input` with an injected random source.
///
/// # Errors
/// See [`resolve`].
pub fn resolve_with<R: Rng + ?Sized>(
    input: &str,
    state: &GameState,
    graph: &SceneGraph,
    rng: &mut R,
) -> Result<Outcome, CommandError> {
    if let Some(kind) = state.ending() {
        return Err(CommandError::SessionOver(kind));
    }
    let command = parse_command(input);
    if command.is_blank() {
        return Err(CommandError::EmptyCommand);
    }
    debug!("resolving {command:?} in scene '{}'", state.current_scene());

    let mut turn = Turn {
        graph,
        state: state.clone(),
        rng,
        items: Vec::new(),
        request: None,
        argument: None,
    };
    match command {
        Command::Blank => return Err(CommandError::EmptyCommand),
        Command::Help => turn.help()?,
        Command::Status => turn.status()?,
        Command::Hint => turn.hint()?,
        Command::Save => turn.request = Some(SessionRequest::Save),
        Command::Load => turn.request = Some(SessionRequest::Load),
        Command::Quit => turn.request = Some(SessionRequest::Quit),
        Command::UseItem(None) => {
            return Err(CommandError::MissingArgument {
                command: "use".to_string(),
                usage: "use <item>".to_string(),
            });
        },
        Command::UseItem(Some(query)) => turn.use_item(&query)?,
        Command::Scene { keyword, argument } => turn.scene_action(&keyword, argument, input)?,
    }

    let ending = turn.state.ending();
    Ok(Outcome {
        state: turn.state,
        view_items: turn.items,
        ending,
        request: turn.request,
    })
}

/// Working set for one command: the cloned state plus everything produced so far.
struct Turn<'g, 'r, R: Rng + ?Sized> {
    graph: &'g SceneGraph,
    state: GameState,
    rng: &'r mut R,
    items: Vec<ViewItem>,
    request: Option<SessionRequest>,
    argument: Option<String>,
}

impl<'g, R: Rng + ?Sized> Turn<'g, '_, R> {
    fn current_scene(&self) -> Result<&'g Scene, CommandError> {
        let graph = self.graph;
        Ok(graph.get_scene(self.state.current_scene())?)
    }

    fn help(&mut self) -> Result<(), CommandError> {
        let scene = self.current_scene()?;
        let actions = scene
            .actions
            .iter()
            .map(|action| ActionLine {
                command: action.usage(),
                label: action.label.clone(),
                blocked: (!action.is_available(&self.state)).then(|| action.blocked_text.clone()),
            })
            .collect();
        self.items.push(ViewItem::Help {
            scene_title: scene.title.clone(),
            actions,
        });
        Ok(())
    }

    fn status(&mut self) -> Result<(), CommandError> {
        let scene = self.current_scene()?;
        let graph = self.graph;
        let mut path: Vec<String> = Vec::new();
        for id in self.state.history() {
            let title = graph.get_scene(id).map_or_else(|_| id.clone(), |s| s.title.clone());
            if !path.contains(&title) {
                path.push(title);
            }
            if path.len() == PATH_SUMMARY_LEN {
                break;
            }
        }
        self.items.push(ViewItem::Status(StatusReport {
            player_name: self.state.player_name().to_string(),
            health: self.state.health(),
            max_health: graph.rules().max_health,
            score: self.state.score(),
            hints_remaining: self.state.hints_remaining(),
            location: scene.title.clone(),
            inventory: self
                .state
                .inventory()
                .iter()
                .map(|id| graph.item_name(id).to_string())
                .collect(),
            visited: self.state.visited().len(),
            path,
        }));
        Ok(())
    }

    fn hint(&mut self) -> Result<(), CommandError> {
        if self.state.hints_remaining() == 0 {
            return Err(CommandError::NoHintsRemaining);
        }
        let scene = self.current_scene()?;
        match &scene.hint {
            Some(text) => {
                let remaining = self.state.consume_hint()?;
                self.items.push(ViewItem::Hint {
                    text: text.clone(),
                    remaining,
                });
            },
            None => self.items.push(ViewItem::NoHintHere),
        }
        Ok(())
    }

    fn use_item(&mut self, query: &str) -> Result<(), CommandError> {
        let graph = self.graph;
        let Some(item) = graph.find_item(query) else {
            return Err(CommandError::ItemNotInInventory(query.replace('_', " ")));
        };
        if !self.state.has_item(&item.id) {
            return Err(CommandError::ItemNotInInventory(item.name.clone()));
        }
        if !item.is_usable() {
            return Err(CommandError::ItemNotUsable(item.name.clone()));
        }
        if item.consumed_on_use {
            self.state.apply_inventory_remove(&item.id)?;
        }
        info!("player used item '{}'", item.id);
        self.items.push(ViewItem::ItemUsed {
            name: item.name.clone(),
            text: item.use_text.clone(),
        });
        self.apply_effects(&item.use_effects)
    }

    fn scene_action(&mut self, keyword: &str, argument: Option<String>, input: &str) -> Result<(), CommandError> {
        let scene = self.current_scene()?;
        let unknown = || CommandError::UnknownCommand(input.trim().to_string());
        let action = scene.find_action(keyword).ok_or_else(unknown)?;

        match (action.takes_argument(), argument.as_deref()) {
            (true, None) => {
                return Err(CommandError::MissingArgument {
                    command: action.command.clone(),
                    usage: action.usage(),
                });
            },
            (false, Some(_)) => return Err(unknown()),
            _ => {},
        }

        if !action.is_available(&self.state) {
            return Err(CommandError::PreconditionFailed {
                message: action.blocked_text.clone(),
            });
        }

        if let (Some(lock), Some(arg)) = (action.code_lock(), argument.as_deref())
            && !lock.accepts_format(arg)
        {
            return Err(CommandError::InvalidArgument {
                argument: arg.to_string(),
                usage: action.usage(),
            });
        }

        self.argument = argument;
        self.run_action(action)
    }

    fn run_action(&mut self, action: &'g Action) -> Result<(), CommandError> {
        debug!("running action '{}'", action.command);
        if let Some(text) = &action.text {
            self.items.push(ViewItem::ActionResult(text.clone()));
        }
        self.apply_effects(&action.effects)
    }

    /// Apply effects in order, stopping as soon as the session has ended.
    fn apply_effects(&mut self, effects: &'g [Effect]) -> Result<(), CommandError> {
        for effect in effects {
            if self.state.is_over() {
                break;
            }
            self.apply_effect(effect)?;
        }
        Ok(())
    }

    fn apply_effect(&mut self, effect: &'g Effect) -> Result<(), CommandError> {
        let graph = self.graph;
        match effect {
            Effect::MoveTo(scene) => self.enter_scene(scene)?,
            Effect::AddItem(item) => {
                if self.state.apply_inventory_add(item) {
                    self.items.push(ViewItem::ItemAcquired(graph.item_name(item).to_string()));
                }
            },
            Effect::RemoveItem(item) => {
                if self.state.apply_inventory_remove(item).is_ok() {
                    self.items.push(ViewItem::ItemLost(graph.item_name(item).to_string()));
                }
            },
            Effect::Health(delta) => self.change_health(*delta),
            Effect::Score(delta) => {
                self.state.apply_score_delta(*delta);
                if *delta != 0 {
                    self.items.push(ViewItem::ScoreChanged(*delta));
                }
            },
            Effect::SetFlag(flag) => {
                self.state.set_flag(flag);
            },
            Effect::When { flag, then } => {
                if self.state.has_flag(flag) {
                    self.apply_effects(then)?;
                }
            },
            Effect::CheckCode(lock) => self.check_code(lock)?,
        }
        Ok(())
    }

    fn change_health(&mut self, delta: i32) {
        let graph = self.graph;
        let rules = graph.rules();
        let before = self.state.health();
        let died = self.state.apply_health_delta(delta, rules.max_health);
        let after = self.state.health();
        if after != before {
            let change = i64::from(after) - i64::from(before);
            self.items.push(ViewItem::HealthChanged {
                delta: i32::try_from(change).unwrap_or(delta),
                health: after,
                max: rules.max_health,
            });
        }
        if died {
            info!("player health reached zero in '{}'", self.state.current_scene());
            self.finish(EndingKind::Bad, rules.death_text.clone());
        }
    }

    fn check_code(&mut self, lock: &'g CodeLock) -> Result<(), CommandError> {
        let Some(guess) = self.argument.clone() else {
            return Err(CommandError::MissingArgument {
                command: "code".to_string(),
                usage: format!("code <{} digits>", lock.digits()),
            });
        };

        if guess == lock.answer {
            if let Some(text) = &lock.success_text {
                self.items.push(ViewItem::ActionResult(text.clone()));
            }
            return self.apply_effects(&lock.on_success);
        }

        let attempts = self.state.increment_counter(&lock.counter);
        info!("wrong code entered ({attempts}/{})", lock.max_attempts);
        if let Some(text) = &lock.failure_text {
            self.items.push(ViewItem::ActionResult(text.clone()));
        }
        self.items.push(ViewItem::EngineMessage(format!(
            "Failed attempts: {attempts}/{}",
            lock.max_attempts
        )));
        self.apply_effects(&lock.on_failure)?;
        if attempts >= lock.max_attempts && !self.state.is_over() {
            self.enter_scene(&lock.lockout_scene)?;
        }
        Ok(())
    }

    /// Move into `id`: record the visit, run on-enter effects, apply any ending, then roll events.
    fn enter_scene(&mut self, id: &str) -> Result<(), CommandError> {
        let graph = self.graph;
        let scene = graph.get_scene(id)?;
        self.state.record_visit(&scene.id);
        info!("entered scene '{}'", scene.id);
        self.items.push(ViewItem::SceneDescription {
            title: scene.title.clone(),
            description: scene.description.clone(),
        });

        self.apply_effects(&scene.on_enter)?;
        if self.state.is_over() {
            return Ok(());
        }
        if let Some(ending) = &scene.ending {
            self.finish(ending.kind, ending.text.clone());
            return Ok(());
        }
        self.roll_events(scene)
    }

    fn roll_events(&mut self, scene: &'g Scene) -> Result<(), CommandError> {
        for event in &scene.events {
            if self.state.is_over() {
                break;
            }
            if event.once {
                let key = event.flag_key(&scene.id);
                if self.state.has_flag(&key) {
                    continue;
                }
                self.state.set_flag(&key);
            }
            if self.rng.random_bool(event.chance) {
                debug!("event '{}' fired in '{}'", event.id, scene.id);
                self.items.push(ViewItem::EventText(event.text.clone()));
                self.apply_effects(&event.effects)?;
            }
        }
        Ok(())
    }

    fn finish(&mut self, kind: EndingKind, text: String) {
        info!("session ended: {kind}");
        self.state.set_ending(kind);
        self.items.push(ViewItem::Ending { kind, text });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::default_graph;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn setup() -> (SceneGraph, GameState) {
        let graph = default_graph().expect("bundled world builds");
        let state = GameState::new_game(&graph, "Tess");
        (graph, state)
    }

    fn play(state: &GameState, graph: &SceneGraph, commands: &[&str]) -> GameState {
        let mut rng = StdRng::seed_from_u64(7);
        let mut current = state.clone();
        for command in commands {
            current = resolve_with(command, &current, graph, &mut rng)
                .unwrap_or_else(|err| panic!("'{command}' failed: {err}"))
                .state;
        }
        current
    }

    #[test]
    fn blank_input_is_an_error() {
        let (graph, state) = setup();
        assert_eq!(resolve("   ", &state, &graph), Err(CommandError::EmptyCommand));
    }

    #[test]
    fn unknown_keyword_is_reported() {
        let (graph, state) = setup();
        assert_eq!(
            resolve("dance", &state, &graph),
            Err(CommandError::UnknownCommand("dance".into()))
        );
    }

    #[test]
    fn unexpected_argument_is_unknown() {
        let (graph, state) = setup();
        assert!(matches!(
            resolve("proceed quickly", &state, &graph),
            Err(CommandError::UnknownCommand(_))
        ));
    }

    #[test]
    fn moving_records_visit_and_score() {
        let (graph, state) = setup();
        let outcome = resolve("proceed", &state, &graph).expect("proceed works");
        assert_eq!(outcome.state.current_scene(), "crossroad");
        assert_eq!(outcome.state.score(), 2);
        assert!(outcome.state.visited().contains("crossroad"));
        assert!(outcome.narrative().contains("Fork in the Path"));
        // caller's state untouched
        assert_eq!(state.current_scene(), "camp");
    }

    #[test]
    fn precondition_failure_changes_nothing() {
        let (graph, state) = setup();
        let state = play(&state, &graph, &["proceed", "left", "wait", "house", "blue"]);
        let err = resolve("forward", &state, &graph).unwrap_err();
        assert_eq!(
            err,
            CommandError::PreconditionFailed {
                message: "Claws scrape in the dark. You need a torch first.".into()
            }
        );
    }

    #[test]
    fn help_shows_blocked_reasons() {
        let (graph, state) = setup();
        let state = play(&state, &graph, &["chest"]);
        let outcome = resolve("help", &state, &graph).expect("help works");
        let text = outcome.narrative();
        assert!(text.contains("(blocked: The chest has nothing useful left.)"));
        assert!(text.contains("proceed - Step onto the misty trail."));
        assert_eq!(outcome.state, state);
    }

    #[test]
    fn ended_session_refuses_hints() {
        let (graph, state) = setup();
        let state = play(&state, &graph, &["proceed", "right"]);
        assert!(state.is_over());
        assert_eq!(
            resolve("hint", &state, &graph),
            Err(CommandError::SessionOver(EndingKind::Bad))
        );
    }

    #[test]
    fn code_argument_is_validated() {
        let (graph, state) = setup();
        let state = play(
            &state,
            &graph,
            &["proceed", "left", "wait", "house", "yellow", "garden", "dig", "back", "gate", "key", "forward"],
        );
        assert_eq!(state.current_scene(), "vault_lock");
        assert!(matches!(
            resolve("code", &state, &graph),
            Err(CommandError::MissingArgument { .. })
        ));
        let err = resolve("code 27", &state, &graph).unwrap_err();
        assert_eq!(
            err,
            CommandError::InvalidArgument {
                argument: "27".into(),
                usage: "code <3 digits>".into()
            }
        );
        assert!(!err.to_string().contains("274"));
    }

    #[test]
    fn ended_session_refuses_blank_input() {
        let (graph, state) = setup();
        let state = play(&state, &graph, &["proceed", "right"]);
        for input in ["", "   ", "help"] {
            assert_eq!(
                resolve(input, &state, &graph),
                Err(CommandError::SessionOver(EndingKind::Bad))
            );
        }
    }

    #[test]
    fn session_requests_are_returned() {
        let (graph, state) = setup();
        for (input, request) in [
            ("save", SessionRequest::Save),
            ("load", SessionRequest::Load),
            ("quit", SessionRequest::Quit),
        ] {
            let outcome = resolve(input, &state, &graph).expect("request resolves");
            assert_eq!(outcome.request, Some(request));
            assert_eq!(outcome.state, state);
        }
    }

    #[test]
    fn once_only_events_fire_at_most_once() {
        let (graph, state) = setup();
        let mut rng = StdRng::seed_from_u64(42);
        let mut current = play(&state, &graph, &["proceed", "left", "wait"]);
        current.apply_health_delta(2, 5);
        for _ in 0..5 {
            current = resolve_with("tower", &current, &graph, &mut rng).expect("tower").state;
            current = resolve_with("dock", &current, &graph, &mut rng).expect("dock").state;
        }
        assert!(current.has_flag("_event_watchtower_tower_slip"));
        assert!(current.health() >= 4);
    }
}
