//! WorldDef loader and conversion helpers.
//!
//! Converts the serialized `WorldDef` data model into runtime engine structs.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use isle_data::{ActionDef, CodeLockDef, ConditionDef, EffectDef, EventDef, GameDef, ItemDef, SceneDef, WorldDef};

use crate::scene::{Action, CodeLock, Condition, Effect, Ending, GameRules, Item, Scene, SceneEvent};

const DEFAULT_BLOCKED_TEXT: &str = "You cannot do that right now.";

/// Load a `WorldDef` from a RON file.
pub fn load_worlddef(path: &Path) -> Result<WorldDef> {
    let text = fs::read_to_string(path).with_context(|| format!("reading worlddef from '{}'", path.display()))?;
    parse_worlddef(&text).with_context(|| format!("parsing worlddef RON from '{}'", path.display()))
}

/// Parse a `WorldDef` from RON text.
pub fn parse_worlddef(text: &str) -> Result<WorldDef> {
    let def = ron::from_str(text)?;
    Ok(def)
}

pub(crate) fn rules_from_def(def: &GameDef) -> GameRules {
    GameRules {
        title: def.title.clone(),
        intro: def.intro.clone(),
        start_scene: def.start_scene.clone(),
        start_health: def.start_health,
        max_health: def.max_health,
        initial_hints: def.hints,
        default_player_name: def.default_player_name.clone(),
        death_text: def.death_text.clone(),
    }
}

pub(crate) fn scene_from_def(def: &SceneDef) -> Scene {
    Scene {
        id: def.id.clone(),
        title: def.title.clone(),
        description: def.desc.trim().to_string(),
        hint: def.hint.clone(),
        actions: def.actions.iter().map(action_from_def).collect(),
        on_enter: effects_from_defs(&def.on_enter),
        events: def.events.iter().map(event_from_def).collect(),
        ending: def.ending.as_ref().map(|ending| Ending {
            kind: ending.kind,
            text: ending.text.clone(),
        }),
    }
}

pub(crate) fn item_from_def(def: &ItemDef) -> Item {
    Item {
        id: def.id.clone(),
        name: def.name.clone(),
        aliases: def.aliases.iter().map(|alias| alias.to_lowercase()).collect(),
        use_effects: effects_from_defs(&def.use_effects),
        use_text: def.use_text.clone(),
        consumed_on_use: def.consumed_on_use,
    }
}

fn action_from_def(def: &ActionDef) -> Action {
    Action {
        command: def.command.to_lowercase(),
        label: def.label.clone(),
        aliases: def.aliases.iter().map(|alias| alias.to_lowercase()).collect(),
        requires: def.requires.iter().map(condition_from_def).collect(),
        blocked_text: def
            .blocked_text
            .clone()
            .unwrap_or_else(|| DEFAULT_BLOCKED_TEXT.to_string()),
        text: def.text.clone(),
        effects: effects_from_defs(&def.effects),
    }
}

fn condition_from_def(def: &ConditionDef) -> Condition {
    match def {
        ConditionDef::HasItem(item) => Condition::HasItem(item.clone()),
        ConditionDef::HasFlag(flag) => Condition::HasFlag(flag.clone()),
        ConditionDef::MissingFlag(flag) => Condition::MissingFlag(flag.clone()),
    }
}

fn event_from_def(def: &EventDef) -> SceneEvent {
    SceneEvent {
        id: def.id.clone(),
        text: def.text.clone(),
        chance: def.chance,
        effects: effects_from_defs(&def.effects),
        once: def.once,
    }
}

fn effects_from_defs(defs: &[EffectDef]) -> Vec<Effect> {
    defs.iter().map(effect_from_def).collect()
}

fn effect_from_def(def: &EffectDef) -> Effect {
    match def {
        EffectDef::MoveTo(scene) => Effect::MoveTo(scene.clone()),
        EffectDef::AddItem(item) => Effect::AddItem(item.clone()),
        EffectDef::RemoveItem(item) => Effect::RemoveItem(item.clone()),
        EffectDef::Health(delta) => Effect::Health(*delta),
        EffectDef::Score(delta) => Effect::Score(*delta),
        EffectDef::SetFlag(flag) => Effect::SetFlag(flag.clone()),
        EffectDef::When { flag, then } => Effect::When {
            flag: flag.clone(),
            then: effects_from_defs(then),
        },
        EffectDef::CheckCode(lock) => Effect::CheckCode(code_lock_from_def(lock)),
    }
}

fn code_lock_from_def(def: &CodeLockDef) -> CodeLock {
    CodeLock {
        answer: def.answer.clone(),
        counter: def.counter.clone(),
        max_attempts: def.max_attempts,
        lockout_scene: def.lockout_scene.clone(),
        success_text: def.success_text.clone(),
        failure_text: def.failure_text.clone(),
        on_success: effects_from_defs(&def.on_success),
        on_failure: effects_from_defs(&def.on_failure),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actions_get_default_blocked_text_and_lowercase_keywords() {
        let def = ActionDef {
            command: "Left".into(),
            label: "Go left".into(),
            aliases: vec!["WEST".into()],
            requires: vec![ConditionDef::HasFlag("lit".into())],
            blocked_text: None,
            text: None,
            effects: vec![EffectDef::Score(1)],
        };
        let action = action_from_def(&def);
        assert_eq!(action.command, "left");
        assert_eq!(action.aliases, vec!["west".to_string()]);
        assert_eq!(action.blocked_text, DEFAULT_BLOCKED_TEXT);
        assert_eq!(action.requires, vec![Condition::HasFlag("lit".into())]);
    }

    #[test]
    fn nested_effects_are_converted() {
        let def = EffectDef::When {
            flag: "knows_code".into(),
            then: vec![EffectDef::Score(6), EffectDef::MoveTo("vault".into())],
        };
        let Effect::When { flag, then } = effect_from_def(&def) else {
            panic!("expected conditional effect");
        };
        assert_eq!(flag, "knows_code");
        assert_eq!(then, vec![Effect::Score(6), Effect::MoveTo("vault".into())]);
    }

    #[test]
    fn parse_worlddef_reports_bad_ron() {
        assert!(parse_worlddef("(game: oops").is_err());
    }
}
