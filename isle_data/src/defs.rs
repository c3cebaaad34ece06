use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier used across WorldDef references.
pub type Id = String;

/// Top-level world data loaded by the engine.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WorldDef {
    pub game: GameDef,
    #[serde(default)]
    pub scenes: Vec<SceneDef>,
    #[serde(default)]
    pub items: Vec<ItemDef>,
}

/// Game-level metadata and the rules a new session starts from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameDef {
    pub title: String,
    #[serde(default)]
    pub intro: String,
    pub start_scene: Id,
    #[serde(default = "default_start_health")]
    pub start_health: u32,
    #[serde(default = "default_max_health")]
    pub max_health: u32,
    #[serde(default = "default_hints")]
    pub hints: u32,
    #[serde(default = "default_player_name")]
    pub default_player_name: String,
    #[serde(default = "default_death_text")]
    pub death_text: String,
}

impl Default for GameDef {
    fn default() -> Self {
        Self {
            title: String::new(),
            intro: String::new(),
            start_scene: String::new(),
            start_health: default_start_health(),
            max_health: default_max_health(),
            hints: default_hints(),
            default_player_name: default_player_name(),
            death_text: default_death_text(),
        }
    }
}

fn default_start_health() -> u32 {
    3
}

fn default_max_health() -> u32 {
    5
}

fn default_hints() -> u32 {
    3
}

fn default_player_name() -> String {
    "Explorer".to_string()
}

fn default_death_text() -> String {
    "Your strength gives out. The story ends here.".to_string()
}

/// Scene definition: one node of the story graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneDef {
    pub id: Id,
    pub title: String,
    pub desc: String,
    #[serde(default)]
    pub hint: Option<String>,
    #[serde(default)]
    pub actions: Vec<ActionDef>,
    #[serde(default)]
    pub on_enter: Vec<EffectDef>,
    #[serde(default)]
    pub events: Vec<EventDef>,
    #[serde(default)]
    pub ending: Option<EndingDef>,
}

/// A command the player can issue inside a scene.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionDef {
    pub command: String,
    pub label: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub requires: Vec<ConditionDef>,
    #[serde(default)]
    pub blocked_text: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub effects: Vec<EffectDef>,
}

/// Preconditions that gate an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionDef {
    HasItem(Id),
    HasFlag(String),
    MissingFlag(String),
}

/// Effects applied, in order, when an action succeeds or a scene is entered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EffectDef {
    MoveTo(Id),
    AddItem(Id),
    RemoveItem(Id),
    Health(i32),
    Score(i32),
    SetFlag(String),
    When { flag: String, then: Vec<EffectDef> },
    CheckCode(CodeLockDef),
}

/// Numeric code puzzle attached to an action that takes the code as its argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeLockDef {
    pub answer: String,
    pub counter: String,
    pub max_attempts: u32,
    pub lockout_scene: Id,
    #[serde(default)]
    pub success_text: Option<String>,
    #[serde(default)]
    pub failure_text: Option<String>,
    #[serde(default)]
    pub on_success: Vec<EffectDef>,
    #[serde(default)]
    pub on_failure: Vec<EffectDef>,
}

/// Chance-based event rolled when the player enters a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDef {
    pub id: Id,
    pub text: String,
    pub chance: f64,
    #[serde(default)]
    pub effects: Vec<EffectDef>,
    #[serde(default = "default_once")]
    pub once: bool,
}

fn default_once() -> bool {
    true
}

/// Marks a scene as terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndingDef {
    pub kind: EndingKind,
    pub text: String,
}

/// Terminal classification of a finished session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EndingKind {
    Win,
    Bad,
    Secret,
}

impl EndingKind {
    /// Stable lowercase name, matching the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            EndingKind::Win => "win",
            EndingKind::Bad => "bad",
            EndingKind::Secret => "secret",
        }
    }

    /// Parse the lowercase name produced by [`EndingKind::as_str`].
    pub fn from_key(key: &str) -> Option<EndingKind> {
        match key {
            "win" => Some(EndingKind::Win),
            "bad" => Some(EndingKind::Bad),
            "secret" => Some(EndingKind::Secret),
            _ => None,
        }
    }
}

impl fmt::Display for EndingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Item definition: display data plus what `use` does with it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDef {
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub use_effects: Vec<EffectDef>,
    #[serde(default)]
    pub use_text: Option<String>,
    #[serde(default)]
    pub consumed_on_use: bool,
}
