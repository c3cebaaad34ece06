//! Game state
//!
//! Everything that changes during a session. The resolver only ever mutates
//! a clone of the caller's state, and every mutator here either applies fully
//! or fails without touching anything.

use std::collections::BTreeSet;

use isle_data::EndingKind;
use thiserror::Error;

use crate::graph::SceneGraph;

/// Separator between a counter's name and its value in the flag set.
pub const COUNTER_SEPARATOR: char = '#';

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("item '{0}' is not in the inventory")]
    ItemNotHeld(String),
    #[error("no hints remaining")]
    NoHintsRemaining,
}

/// Mutable data for one play session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    pub(crate) player_name: String,
    pub(crate) current_scene: String,
    pub(crate) health: u32,
    pub(crate) score: i32,
    pub(crate) inventory: Vec<String>,
    pub(crate) hints_remaining: u32,
    pub(crate) flags: BTreeSet<String>,
    pub(crate) visited: BTreeSet<String>,
    pub(crate) history: Vec<String>,
    pub(crate) ending: Option<EndingKind>,
}

impl GameState {
    /// Fresh session at the graph's start scene. A blank name falls back to the world default.
    pub fn new_game(graph: &SceneGraph, player_name: &str) -> GameState {
        let rules = graph.rules();
        let name = player_name.trim();
        let mut state = GameState {
            player_name: if name.is_empty() {
                rules.default_player_name.clone()
            } else {
                name.to_string()
            },
            current_scene: rules.start_scene.clone(),
            health: rules.start_health,
            score: 0,
            inventory: Vec::new(),
            hints_remaining: rules.initial_hints,
            flags: BTreeSet::new(),
            visited: BTreeSet::new(),
            history: Vec::new(),
            ending: None,
        };
        state.record_visit(&rules.start_scene);
        state
    }

    pub fn player_name(&self) -> &str {
        &self.player_name
    }

    pub fn current_scene(&self) -> &str {
        &self.current_scene
    }

    pub fn health(&self) -> u32 {
        self.health
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn inventory(&self) -> &[String] {
        &self.inventory
    }

    pub fn hints_remaining(&self) -> u32 {
        self.hints_remaining
    }

    pub fn flags(&self) -> &BTreeSet<String> {
        &self.flags
    }

    pub fn visited(&self) -> &BTreeSet<String> {
        &self.visited
    }

    /// Every scene entered, in order, including repeats.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn ending(&self) -> Option<EndingKind> {
        self.ending
    }

    pub fn is_over(&self) -> bool {
        self.ending.is_some()
    }

    pub fn has_item(&self, item: &str) -> bool {
        self.inventory.iter().any(|held| held == item)
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.contains(flag)
    }

    /// Add an item; returns false (and changes nothing) if it is already held.
    pub fn apply_inventory_add(&mut self, item: &str) -> bool {
        if self.has_item(item) {
            return false;
        }
        self.inventory.push(item.to_string());
        true
    }

    /// Remove a held item.
    ///
    /// # Errors
    /// `StateError::ItemNotHeld` if the item is not in the inventory.
    pub fn apply_inventory_remove(&mut self, item: &str) -> Result<(), StateError> {
        let index = self
            .inventory
            .iter()
            .position(|held| held == item)
            .ok_or_else(|| StateError::ItemNotHeld(item.to_string()))?;
        self.inventory.remove(index);
        Ok(())
    }

    /// Shift health by `delta`, clamped to `0..=max`. Returns true when this call drops health to zero.
    pub fn apply_health_delta(&mut self, delta: i32, max: u32) -> bool {
        let before = self.health;
        let after = (i64::from(before) + i64::from(delta)).clamp(0, i64::from(max));
        self.health = u32::try_from(after).unwrap_or(max);
        before > 0 && self.health == 0
    }

    pub fn apply_score_delta(&mut self, delta: i32) {
        self.score = self.score.saturating_add(delta);
    }

    /// Set a flag; returns false if it was already set.
    pub fn set_flag(&mut self, flag: &str) -> bool {
        self.flags.insert(flag.to_string())
    }

    /// Spend one hint and return how many are left.
    ///
    /// # Errors
    /// `StateError::NoHintsRemaining` when the budget is exhausted.
    pub fn consume_hint(&mut self) -> Result<u32, StateError> {
        if self.hints_remaining == 0 {
            return Err(StateError::NoHintsRemaining);
        }
        self.hints_remaining -= 1;
        Ok(self.hints_remaining)
    }

    /// Current value of a `name#N` counter, 0 when unset.
    pub fn counter(&self, name: &str) -> u32 {
        self.flags
            .iter()
            .find_map(|flag| parse_counter(flag).filter(|(key, _)| *key == name).map(|(_, value)| value))
            .unwrap_or(0)
    }

    /// Bump a counter by one, replacing its previous flag. Returns the new value.
    pub fn increment_counter(&mut self, name: &str) -> u32 {
        let current = self.counter(name);
        self.flags.remove(&counter_flag(name, current));
        let next = current.saturating_add(1);
        self.flags.insert(counter_flag(name, next));
        next
    }

    /// Move to `scene` and note the visit.
    pub fn record_visit(&mut self, scene: &str) {
        self.current_scene = scene.to_string();
        self.visited.insert(scene.to_string());
        self.history.push(scene.to_string());
    }

    pub fn set_ending(&mut self, kind: EndingKind) {
        self.ending = Some(kind);
    }
}

/// Flag key for counter `name` at `value`.
pub fn counter_flag(name: &str, value: u32) -> String {
    format!("{name}{COUNTER_SEPARATOR}{value}")
}

/// Split a `name#N` flag into its parts; plain flags return `None`.
pub fn parse_counter(flag: &str) -> Option<(&str, u32)> {
    let (name, value) = flag.rsplit_once(COUNTER_SEPARATOR)?;
    if name.is_empty() || value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    value.parse().ok().map(|value| (name, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::default_graph;

    fn fresh() -> GameState {
        let graph = default_graph().expect("bundled world builds");
        GameState::new_game(&graph, "Tess")
    }

    #[test]
    fn new_game_starts_at_start_scene() {
        let graph = default_graph().expect("bundled world builds");
        let state = GameState::new_game(&graph, "  ");
        assert_eq!(state.player_name(), "Explorer");
        assert_eq!(state.current_scene(), "camp");
        assert_eq!(state.health(), 3);
        assert_eq!(state.hints_remaining(), 3);
        assert_eq!(state.history(), ["camp".to_string()]);
        assert!(state.visited().contains("camp"));
        assert!(!state.is_over());
    }

    #[test]
    fn inventory_rejects_duplicates() {
        let mut state = fresh();
        assert!(state.apply_inventory_add("torch"));
        assert!(!state.apply_inventory_add("torch"));
        assert_eq!(state.inventory().len(), 1);
        assert_eq!(state.apply_inventory_remove("torch"), Ok(()));
        assert_eq!(
            state.apply_inventory_remove("torch"),
            Err(StateError::ItemNotHeld("torch".into()))
        );
    }

    #[test]
    fn health_is_clamped_and_death_detected() {
        let mut state = fresh();
        assert!(!state.apply_health_delta(10, 5));
        assert_eq!(state.health(), 5);
        assert!(state.apply_health_delta(-9, 5));
        assert_eq!(state.health(), 0);
        // already at zero: no new crossing
        assert!(!state.apply_health_delta(-1, 5));
    }

    #[test]
    fn hints_run_out() {
        let mut state = fresh();
        assert_eq!(state.consume_hint(), Ok(2));
        assert_eq!(state.consume_hint(), Ok(1));
        assert_eq!(state.consume_hint(), Ok(0));
        assert_eq!(state.consume_hint(), Err(StateError::NoHintsRemaining));
        assert_eq!(state.hints_remaining(), 0);
    }

    #[test]
    fn counters_keep_a_single_flag() {
        let mut state = fresh();
        assert_eq!(state.counter("tries"), 0);
        assert_eq!(state.increment_counter("tries"), 1);
        assert_eq!(state.increment_counter("tries"), 2);
        assert_eq!(state.counter("tries"), 2);
        let counters: Vec<_> = state.flags().iter().filter(|f| f.starts_with("tries#")).collect();
        assert_eq!(counters, vec!["tries#2"]);
    }

    #[test]
    fn parse_counter_ignores_plain_flags() {
        assert_eq!(parse_counter("tries#3"), Some(("tries", 3)));
        assert_eq!(parse_counter("torch_taken"), None);
        assert_eq!(parse_counter("odd#x"), None);
    }
}
