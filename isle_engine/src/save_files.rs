//! Save-game serialization helpers.
//!
//! A session is saved as a single JSON document. Decoding checks every field
//! against the scene graph and refuses anything that would break a state
//! invariant; nothing is repaired silently. Writes go through a temporary file
//! in the target directory that is then renamed over the slot, so a failed
//! save never clobbers the previous one.

use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use isle_data::EndingKind;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::graph::{GraphError, SceneGraph};
use crate::scene::Action;
use crate::state::{GameState, parse_counter};

/// Current save format version. Files without a version field are version 0.
pub const SAVE_VERSION: u32 = 1;

/// Default single save slot.
pub const DEFAULT_SAVE_FILE: &str = "savegame.json";

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("no saved game found at {}", .0.display())]
    NotFound(PathBuf),
    #[error("save file i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("save data is corrupt: {0}")]
    Corrupt(String),
    #[error("save refers to unknown scene '{0}'")]
    UnknownSceneReference(String),
    #[error("invalid value for '{field}': {reason}")]
    InvalidFieldValue { field: &'static str, reason: String },
    #[error("unsupported save version {found} (this build reads up to {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },
}

/// On-disk shape of a save. Numeric fields are read wide so range problems
/// surface as `InvalidFieldValue` rather than a parse error.
#[derive(Debug, Serialize, Deserialize)]
struct SaveFile {
    #[serde(default)]
    version: u32,
    #[serde(default)]
    player_name: String,
    current_scene: String,
    health: i64,
    score: i64,
    inventory: Vec<String>,
    hints_remaining: i64,
    flags: Vec<String>,
    #[serde(default)]
    visited: Vec<String>,
    #[serde(default)]
    history: Vec<String>,
    #[serde(default)]
    ending: Option<String>,
}

/// Serialize a session to pretty, deterministic JSON.
///
/// # Errors
/// `SaveError::Corrupt` if serialization fails.
pub fn encode(state: &GameState) -> Result<Vec<u8>, SaveError> {
    let file = SaveFile {
        version: SAVE_VERSION,
        player_name: state.player_name.clone(),
        current_scene: state.current_scene.clone(),
        health: i64::from(state.health),
        score: i64::from(state.score),
        inventory: state.inventory.clone(),
        hints_remaining: i64::from(state.hints_remaining),
        flags: state.flags.iter().cloned().collect(),
        visited: state.visited.iter().cloned().collect(),
        history: state.history.clone(),
        ending: state.ending.map(|kind| kind.as_str().to_string()),
    };
    let mut bytes = serde_json::to_vec_pretty(&file).map_err(|err| SaveError::Corrupt(err.to_string()))?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Parse and validate a save against `graph`.
///
/// # Errors
/// Any malformed, out-of-range or dangling value yields the matching `SaveError`.
pub fn decode(bytes: &[u8], graph: &SceneGraph) -> Result<GameState, SaveError> {
    let file: SaveFile = serde_json::from_slice(bytes).map_err(|err| SaveError::Corrupt(err.to_string()))?;
    if file.version > SAVE_VERSION {
        return Err(SaveError::UnsupportedVersion {
            found: file.version,
            supported: SAVE_VERSION,
        });
    }
    let rules = graph.rules();

    if !graph.contains_scene(&file.current_scene) {
        return Err(SaveError::UnknownSceneReference(file.current_scene));
    }
    if let Some(id) = file
        .visited
        .iter()
        .chain(&file.history)
        .find(|id| !graph.contains_scene(id))
    {
        return Err(SaveError::UnknownSceneReference(id.clone()));
    }

    let health = u32::try_from(file.health)
        .ok()
        .filter(|health| *health <= rules.max_health)
        .ok_or_else(|| invalid("health", format!("{} outside 0..={}", file.health, rules.max_health)))?;
    let hints_remaining = u32::try_from(file.hints_remaining)
        .ok()
        .filter(|hints| *hints <= rules.initial_hints)
        .ok_or_else(|| {
            invalid(
                "hints_remaining",
                format!("{} outside 0..={}", file.hints_remaining, rules.initial_hints),
            )
        })?;
    let score = i32::try_from(file.score).map_err(|_| invalid("score", format!("{} out of range", file.score)))?;

    let mut held = HashSet::new();
    for item in &file.inventory {
        if graph.item(item).is_none() {
            return Err(invalid("inventory", format!("unknown item '{item}'")));
        }
        if !held.insert(item.as_str()) {
            return Err(invalid("inventory", format!("duplicate item '{item}'")));
        }
    }

    let mut flags = BTreeSet::new();
    let mut counters = HashSet::new();
    for flag in &file.flags {
        if !flags.insert(flag.clone()) {
            return Err(invalid("flags", format!("duplicate flag '{flag}'")));
        }
        if let Some((name, _)) = parse_counter(flag)
            && !counters.insert(name)
        {
            return Err(invalid("flags", format!("counter '{name}' stored more than once")));
        }
    }

    let ending = match file.ending.as_deref() {
        None => None,
        Some(key) => {
            Some(EndingKind::from_key(key).ok_or_else(|| invalid("ending", format!("unknown ending '{key}'")))?)
        },
    };
    if health == 0 && ending != Some(EndingKind::Bad) {
        return Err(invalid("health", "0 health without a bad ending".to_string()));
    }

    let scene = graph
        .get_scene(&file.current_scene)
        .map_err(|GraphError::SceneNotFound(id)| SaveError::UnknownSceneReference(id))?;
    if let Some(terminal) = &scene.ending
        && ending != Some(terminal.kind)
    {
        return Err(invalid(
            "ending",
            format!("scene '{}' ends the story with a {} ending", scene.id, terminal.kind),
        ));
    }
    if ending.is_none() {
        for lock in scene.actions.iter().filter_map(Action::code_lock) {
            let attempts = flags
                .iter()
                .filter_map(|flag| parse_counter(flag))
                .find_map(|(name, value)| (name == lock.counter).then_some(value))
                .unwrap_or(0);
            if attempts >= lock.max_attempts {
                return Err(invalid(
                    "flags",
                    format!("'{}' at {attempts} of {} attempts without an ending", lock.counter, lock.max_attempts),
                ));
            }
        }
    }

    let player_name = match file.player_name.trim() {
        "" => rules.default_player_name.clone(),
        name => name.to_string(),
    };

    Ok(GameState {
        player_name,
        current_scene: file.current_scene,
        health,
        score,
        inventory: file.inventory,
        hints_remaining,
        flags,
        visited: file.visited.into_iter().collect(),
        history: file.history,
        ending,
    })
}

fn invalid(field: &'static str, reason: String) -> SaveError {
    SaveError::InvalidFieldValue { field, reason }
}

/// Atomically write `state` to `path`.
///
/// # Errors
/// Returns `SaveError::Io` if the temporary file cannot be written or renamed.
pub fn write_save_file(path: &Path, state: &GameState) -> Result<(), SaveError> {
    let bytes = encode(state)?;
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(&bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|err| SaveError::Io(err.error))?;
    info!("saved game to {}", path.display());
    Ok(())
}

/// Read and validate the save at `path`.
///
/// # Errors
/// `SaveError::NotFound` if there is no file; otherwise see [`decode`].
pub fn read_save_file(path: &Path, graph: &SceneGraph) -> Result<GameState, SaveError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Err(SaveError::NotFound(path.to_path_buf())),
        Err(err) => return Err(SaveError::Io(err)),
    };
    let state = decode(&bytes, graph).inspect_err(|err| {
        warn!("rejected save file {}: {}", path.display(), trim_error(err));
    })?;
    info!("loaded game from {}", path.display());
    Ok(state)
}

/// Lightweight description of the save slot for the start menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveSummary {
    pub player_name: String,
    pub location: String,
    pub score: i64,
    pub modified: Option<String>,
}

/// Describe the save at `path` without full validation. Returns `None` if
/// there is no readable save there.
pub fn peek_save(path: &Path, graph: &SceneGraph) -> Option<SaveSummary> {
    let raw = fs::read(path).ok()?;
    let file: SaveFile = match serde_json::from_slice(&raw) {
        Ok(file) => file,
        Err(err) => {
            warn!("failed to parse save {}: {}", path.display(), trim_error(&err));
            return None;
        },
    };
    let location = graph
        .get_scene(&file.current_scene)
        .map_or_else(|_| file.current_scene.clone(), |scene| scene.title.clone());
    let modified = fs::metadata(path)
        .and_then(|meta| meta.modified())
        .ok()
        .map(format_modified);
    Some(SaveSummary {
        player_name: file.player_name,
        location,
        score: file.score,
        modified,
    })
}

/// Format a human-friendly modified time relative to now.
pub fn format_modified(modified: SystemTime) -> String {
    match SystemTime::now().duration_since(modified) {
        Ok(delta) => format_duration(delta),
        Err(_) => "in the future".to_string(),
    }
}

/// Convert a duration into a compact "time ago" string.
fn format_duration(duration: Duration) -> String {
    const MINUTE: u64 = 60;
    const HOUR: u64 = MINUTE * 60;
    const DAY: u64 = HOUR * 24;
    const WEEK: u64 = DAY * 7;

    let secs = duration.as_secs();
    if secs < 30 {
        "just now".to_string()
    } else if secs < MINUTE {
        format!("{secs}s ago")
    } else if secs < HOUR {
        format!("{}m ago", secs / MINUTE)
    } else if secs < DAY {
        format!("{}h ago", secs / HOUR)
    } else if secs < WEEK {
        format!("{}d ago", secs / DAY)
    } else {
        format!("{}w ago", secs / WEEK)
    }
}

/// Clamp verbose error messages to a readable length.
fn trim_error(err: &impl ToString) -> String {
    let message = err.to_string();
    if message.chars().count() <= 120 {
        return message;
    }
    let mut trimmed: String = message.chars().take(117).collect();
    trimmed.push_str("...");
    trimmed
}
