//! Scene module
//!
//! Runtime representation of the story graph's nodes: scenes, the actions a
//! player can take inside them, and the effects those actions produce.
//! Everything here is immutable once the `SceneGraph` has been built.

use isle_data::EndingKind;

use crate::state::GameState;

/// One node of the story graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub id: String,
    pub title: String,
    pub description: String,
    pub hint: Option<String>,
    pub actions: Vec<Action>,
    pub on_enter: Vec<Effect>,
    pub events: Vec<SceneEvent>,
    pub ending: Option<Ending>,
}

impl Scene {
    /// Find the action answering to `keyword` (command or alias).
    pub fn find_action(&self, keyword: &str) -> Option<&Action> {
        self.actions.iter().find(|action| action.matches(keyword))
    }

    /// True if entering this scene ends the session.
    pub fn is_terminal(&self) -> bool {
        self.ending.is_some()
    }
}

/// A command the player can issue in a particular scene.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub command: String,
    pub label: String,
    pub aliases: Vec<String>,
    pub requires: Vec<Condition>,
    pub blocked_text: String,
    pub text: Option<String>,
    pub effects: Vec<Effect>,
}

impl Action {
    pub fn matches(&self, keyword: &str) -> bool {
        self.command == keyword || self.aliases.iter().any(|alias| alias == keyword)
    }

    /// The code puzzle attached to this action, if any.
    pub fn code_lock(&self) -> Option<&CodeLock> {
        self.effects.iter().find_map(|effect| match effect {
            Effect::CheckCode(lock) => Some(lock),
            _ => None,
        })
    }

    /// Actions carrying a code puzzle expect the code as their argument.
    pub fn takes_argument(&self) -> bool {
        self.code_lock().is_some()
    }

    /// How the action is typed, e.g. `code <3 digits>`.
    pub fn usage(&self) -> String {
        match self.code_lock() {
            Some(lock) => format!("{} <{} digits>", self.command, lock.digits()),
            None => self.command.clone(),
        }
    }

    /// True when every precondition holds for `state`.
    pub fn is_available(&self, state: &GameState) -> bool {
        self.requires.iter().all(|cond| cond.is_met(state))
    }
}

/// A precondition gating an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    HasItem(String),
    HasFlag(String),
    MissingFlag(String),
}

impl Condition {
    pub fn is_met(&self, state: &GameState) -> bool {
        match self {
            Condition::HasItem(item) => state.has_item(item),
            Condition::HasFlag(flag) => state.has_flag(flag),
            Condition::MissingFlag(flag) => !state.has_flag(flag),
        }
    }
}

/// State changes produced by actions, scene entry, events and item use.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    MoveTo(String),
    AddItem(String),
    RemoveItem(String),
    Health(i32),
    Score(i32),
    SetFlag(String),
    When { flag: String, then: Vec<Effect> },
    CheckCode(CodeLock),
}

/// A numeric code puzzle with a bounded number of attempts.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeLock {
    pub answer: String,
    pub counter: String,
    pub max_attempts: u32,
    pub lockout_scene: String,
    pub success_text: Option<String>,
    pub failure_text: Option<String>,
    pub on_success: Vec<Effect>,
    pub on_failure: Vec<Effect>,
}

impl CodeLock {
    /// Number of digits a guess must have.
    pub fn digits(&self) -> usize {
        self.answer.len()
    }

    /// Guesses must be exactly `digits()` ASCII digits.
    pub fn accepts_format(&self, guess: &str) -> bool {
        guess.len() == self.digits() && guess.chars().all(|c| c.is_ascii_digit())
    }
}

/// A chance-based event rolled on scene entry.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneEvent {
    pub id: String,
    pub text: String,
    pub chance: f64,
    pub effects: Vec<Effect>,
    pub once: bool,
}

impl SceneEvent {
    /// Flag remembering that a once-only event has already been rolled.
    pub fn flag_key(&self, scene_id: &str) -> String {
        format!("_event_{scene_id}_{}", self.id)
    }
}

/// Terminal metadata for an ending scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ending {
    pub kind: EndingKind,
    pub text: String,
}

/// An inventory item and what using it does.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub aliases: Vec<String>,
    pub use_effects: Vec<Effect>,
    pub use_text: Option<String>,
    pub consumed_on_use: bool,
}

impl Item {
    /// Match a normalized query (`healing_herb`, `herb`, `healing herb`) against this item.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase().replace(' ', "_");
        self.id == query
            || self.aliases.iter().any(|alias| alias.to_lowercase() == query)
            || self.name.to_lowercase().replace(' ', "_") == query
    }

    pub fn is_usable(&self) -> bool {
        !self.use_effects.is_empty()
    }
}

/// Session-wide rules taken from the world's game definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRules {
    pub title: String,
    pub intro: String,
    pub start_scene: String,
    pub start_health: u32,
    pub max_health: u32,
    pub initial_hints: u32,
    pub default_player_name: String,
    pub death_text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code_action() -> Action {
        Action {
            command: "code".into(),
            label: "Enter the code".into(),
            aliases: vec!["dial".into()],
            requires: Vec::new(),
            blocked_text: "No.".into(),
            text: None,
            effects: vec![Effect::CheckCode(CodeLock {
                answer: "274".into(),
                counter: "tries".into(),
                max_attempts: 3,
                lockout_scene: "boom".into(),
                success_text: None,
                failure_text: None,
                on_success: Vec::new(),
                on_failure: Vec::new(),
            })],
        }
    }

    #[test]
    fn action_matches_command_and_aliases() {
        let action = code_action();
        assert!(action.matches("code"));
        assert!(action.matches("dial"));
        assert!(!action.matches("codes"));
    }

    #[test]
    fn code_actions_take_an_argument() {
        let action = code_action();
        assert!(action.takes_argument());
        assert_eq!(action.usage(), "code <3 digits>");
        let lock = action.code_lock().expect("lock present");
        assert!(lock.accepts_format("123"));
        assert!(!lock.accepts_format("12"));
        assert!(!lock.accepts_format("12a"));
    }

    #[test]
    fn item_matches_id_alias_and_name() {
        let item = Item {
            id: "healing_herb".into(),
            name: "Healing Herb".into(),
            aliases: vec!["herb".into()],
            use_effects: vec![Effect::Health(1)],
            use_text: None,
            consumed_on_use: true,
        };
        assert!(item.matches("healing_herb"));
        assert!(item.matches("herb"));
        assert!(item.matches("Healing Herb"));
        assert!(!item.matches("torch"));
        assert!(item.is_usable());
    }
}
