use std::collections::HashSet;
use std::fmt;

use crate::*;

/// Validation error for malformed or missing references in a WorldDef.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    DuplicateId { kind: &'static str, id: String },
    MissingReference { kind: &'static str, id: String, context: String },
    InvalidValue { context: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::DuplicateId { kind, id } => {
                write!(f, "duplicate {kind} id '{id}'")
            },
            ValidationError::MissingReference { kind, id, context } => {
                write!(f, "missing {kind} '{id}' ({context})")
            },
            ValidationError::InvalidValue { context } => {
                write!(f, "invalid value ({context})")
            },
        }
    }
}

impl std::error::Error for ValidationError {}

/// Words the engine always reads as global commands; scene actions cannot use them.
pub const RESERVED_KEYWORDS: &[&str] = &["help", "?", "status", "stats", "hint", "save", "load", "quit", "exit", "use"];

/// Validate cross-references and basic invariants in a WorldDef.
///
/// ```
/// use isle_data::{GameDef, SceneDef, WorldDef, validate_world};
///
/// let world = WorldDef {
///     game: GameDef {
///         title: "Demo".into(),
///         start_scene: "start".into(),
///         ..GameDef::default()
///     },
///     scenes: vec![SceneDef {
///         id: "start".into(),
///         title: "Start".into(),
///         desc: "A beach.".into(),
///         hint: None,
///         actions: Vec::new(),
///         on_enter: Vec::new(),
///         events: Vec::new(),
///         ending: None,
///     }],
///     ..WorldDef::default()
/// };
/// assert!(validate_world(&world).is_empty());
/// ```
pub fn validate_world(world: &WorldDef) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let mut scenes = HashSet::new();
    let mut items = HashSet::new();

    track_ids(
        "scene",
        world.scenes.iter().map(|s| s.id.as_str()),
        &mut scenes,
        &mut errors,
    );
    track_ids(
        "item",
        world.items.iter().map(|i| i.id.as_str()),
        &mut items,
        &mut errors,
    );

    let ids = IdSets {
        scenes: &scenes,
        items: &items,
    };

    if world.game.start_scene.trim().is_empty() {
        errors.push(ValidationError::InvalidValue {
            context: "game start scene missing".to_string(),
        });
    } else {
        check_ref(
            "scene",
            &world.game.start_scene,
            ids.scenes,
            "game start scene".to_string(),
            &mut errors,
        );
    }

    if world.game.max_health == 0 {
        errors.push(ValidationError::InvalidValue {
            context: "game max health must be positive".to_string(),
        });
    }
    if world.game.start_health == 0 || world.game.start_health > world.game.max_health {
        errors.push(ValidationError::InvalidValue {
            context: format!(
                "game start health {} outside 1..={}",
                world.game.start_health, world.game.max_health
            ),
        });
    }

    for scene in &world.scenes {
        let mut commands = HashSet::new();
        for action in &scene.actions {
            let context = format!("scene '{}' action '{}'", scene.id, action.command);
            for keyword in std::iter::once(&action.command).chain(&action.aliases) {
                if keyword.trim().is_empty() || keyword.chars().any(char::is_whitespace) {
                    errors.push(ValidationError::InvalidValue {
                        context: format!("{context}: keyword '{keyword}' must be a single word"),
                    });
                } else if RESERVED_KEYWORDS.contains(&keyword.to_lowercase().as_str()) {
                    errors.push(ValidationError::InvalidValue {
                        context: format!("{context}: keyword '{keyword}' is a global command"),
                    });
                } else if !commands.insert(keyword.to_lowercase()) {
                    errors.push(ValidationError::DuplicateId {
                        kind: "command",
                        id: format!("{}:{keyword}", scene.id),
                    });
                }
            }
            for cond in &action.requires {
                validate_condition(cond, &ids, &mut errors, &context);
            }
            validate_effects(&action.effects, &ids, &mut errors, &context);
        }
        validate_effects(
            &scene.on_enter,
            &ids,
            &mut errors,
            &format!("scene '{}' on enter", scene.id),
        );
        for event in &scene.events {
            let context = format!("scene '{}' event '{}'", scene.id, event.id);
            if !(0.0..=1.0).contains(&event.chance) {
                errors.push(ValidationError::InvalidValue {
                    context: format!("{context}: chance {} outside 0.0..=1.0", event.chance),
                });
            }
            validate_effects(&event.effects, &ids, &mut errors, &context);
        }
    }

    for item in &world.items {
        validate_effects(
            &item.use_effects,
            &ids,
            &mut errors,
            &format!("item '{}' use", item.id),
        );
    }

    errors
}

struct IdSets<'a> {
    scenes: &'a HashSet<String>,
    items: &'a HashSet<String>,
}

fn track_ids<'a>(
    kind: &'static str,
    ids: impl Iterator<Item = &'a str>,
    set: &mut HashSet<String>,
    errors: &mut Vec<ValidationError>,
) {
    for id in ids {
        if !set.insert(id.to_string()) {
            errors.push(ValidationError::DuplicateId {
                kind,
                id: id.to_string(),
            });
        }
    }
}

fn check_ref(kind: &'static str, id: &str, set: &HashSet<String>, context: String, errors: &mut Vec<ValidationError>) {
    if !set.contains(id) {
        errors.push(ValidationError::MissingReference {
            kind,
            id: id.to_string(),
            context,
        });
    }
}

fn validate_condition(cond: &ConditionDef, ids: &IdSets<'_>, errors: &mut Vec<ValidationError>, context: &str) {
    match cond {
        ConditionDef::HasItem(item) => check_ref("item", item, ids.items, context.to_string(), errors),
        ConditionDef::HasFlag(_) | ConditionDef::MissingFlag(_) => {},
    }
}

fn validate_effects(effects: &[EffectDef], ids: &IdSets<'_>, errors: &mut Vec<ValidationError>, context: &str) {
    for effect in effects {
        validate_effect(effect, ids, errors, context);
    }
}

fn validate_effect(effect: &EffectDef, ids: &IdSets<'_>, errors: &mut Vec<ValidationError>, context: &str) {
    match effect {
        EffectDef::MoveTo(scene) => check_ref("scene", scene, ids.scenes, context.to_string(), errors),
        EffectDef::AddItem(item) | EffectDef::RemoveItem(item) => {
            check_ref("item", item, ids.items, context.to_string(), errors);
        },
        EffectDef::Health(_) | EffectDef::Score(_) => {},
        EffectDef::SetFlag(flag) => {
            if flag.contains('#') {
                errors.push(ValidationError::InvalidValue {
                    context: format!("{context}: flag '{flag}' may not contain '#'"),
                });
            }
        },
        EffectDef::When { then, .. } => validate_effects(then, ids, errors, context),
        EffectDef::CheckCode(lock) => {
            if lock.answer.is_empty() || !lock.answer.chars().all(|c| c.is_ascii_digit()) {
                errors.push(ValidationError::InvalidValue {
                    context: format!("{context}: code answer '{}' must be digits", lock.answer),
                });
            }
            if lock.max_attempts == 0 {
                errors.push(ValidationError::InvalidValue {
                    context: format!("{context}: code max attempts must be positive"),
                });
            }
            if lock.counter.trim().is_empty() || lock.counter.contains('#') {
                errors.push(ValidationError::InvalidValue {
                    context: format!("{context}: invalid code counter name '{}'", lock.counter),
                });
            }
            check_ref("scene", &lock.lockout_scene, ids.scenes, context.to_string(), errors);
            validate_effects(&lock.on_success, ids, errors, context);
            validate_effects(&lock.on_failure, ids, errors, context);
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene(id: &str) -> SceneDef {
        SceneDef {
            id: id.to_string(),
            title: format!("Scene {id}"),
            desc: "Test scene".into(),
            hint: None,
            actions: Vec::new(),
            on_enter: Vec::new(),
            events: Vec::new(),
            ending: None,
        }
    }

    fn action(command: &str, effects: Vec<EffectDef>) -> ActionDef {
        ActionDef {
            command: command.to_string(),
            label: format!("Do {command}"),
            aliases: Vec::new(),
            requires: Vec::new(),
            blocked_text: None,
            text: None,
            effects,
        }
    }

    fn base_world() -> WorldDef {
        WorldDef {
            game: GameDef {
                title: "Demo".into(),
                start_scene: "start".into(),
                ..GameDef::default()
            },
            scenes: vec![scene("start")],
            ..WorldDef::default()
        }
    }

    #[test]
    fn duplicate_ids_are_reported() {
        let mut world = base_world();
        world.scenes = vec![scene("start"), scene("start")];

        let errors = validate_world(&world);
        assert!(
            errors
                .iter()
                .any(|err| matches!(err, ValidationError::DuplicateId { kind, id } if *kind == "scene" && id == "start"))
        );
    }

    #[test]
    fn dangling_transition_is_reported() {
        let mut world = base_world();
        world.scenes[0].actions.push(action("north", vec![EffectDef::MoveTo("nowhere".into())]));

        let errors = validate_world(&world);
        assert!(errors.iter().any(|err| matches!(err, ValidationError::MissingReference { kind, id, .. } if *kind == "scene" && id == "nowhere")));
    }

    #[test]
    fn nested_references_are_checked() {
        let mut world = base_world();
        world.scenes[0].actions.push(action(
            "dig",
            vec![EffectDef::When {
                flag: "lucky".into(),
                then: vec![EffectDef::AddItem("shovel".into())],
            }],
        ));

        let errors = validate_world(&world);
        assert!(errors.iter().any(|err| matches!(err, ValidationError::MissingReference { kind, id, .. } if *kind == "item" && id == "shovel")));
    }

    #[test]
    fn duplicate_command_keywords_are_reported() {
        let mut world = base_world();
        let mut left = action("left", Vec::new());
        left.aliases.push("west".into());
        world.scenes[0].actions.push(left);
        world.scenes[0].actions.push(action("west", Vec::new()));

        let errors = validate_world(&world);
        assert!(
            errors
                .iter()
                .any(|err| matches!(err, ValidationError::DuplicateId { kind, .. } if *kind == "command"))
        );
    }

    #[test]
    fn global_command_keywords_are_reported() {
        let mut world = base_world();
        world.scenes[0].actions.push(action("Exit", Vec::new()));
        let mut dig = action("dig", Vec::new());
        dig.aliases.push("use".into());
        world.scenes[0].actions.push(dig);

        let errors = validate_world(&world);
        let collisions = errors
            .iter()
            .filter(|err| {
                matches!(err, ValidationError::InvalidValue { context } if context.contains("is a global command"))
            })
            .count();
        assert_eq!(collisions, 2);
    }

    #[test]
    fn invalid_code_lock_is_reported() {
        let mut world = base_world();
        world.scenes[0].actions.push(action(
            "code",
            vec![EffectDef::CheckCode(CodeLockDef {
                answer: "27a".into(),
                counter: "attempts".into(),
                max_attempts: 0,
                lockout_scene: "start".into(),
                success_text: None,
                failure_text: None,
                on_success: Vec::new(),
                on_failure: Vec::new(),
            })],
        ));

        let errors = validate_world(&world);
        let invalid = errors
            .iter()
            .filter(|err| matches!(err, ValidationError::InvalidValue { .. }))
            .count();
        assert_eq!(invalid, 2);
    }

    #[test]
    fn out_of_range_event_chance_is_reported() {
        let mut world = base_world();
        world.scenes[0].events.push(EventDef {
            id: "gust".into(),
            text: "Wind.".into(),
            chance: 1.5,
            effects: Vec::new(),
            once: true,
        });

        let errors = validate_world(&world);
        assert!(
            errors
                .iter()
                .any(|err| matches!(err, ValidationError::InvalidValue { .. }))
        );
    }

    #[test]
    fn start_health_above_max_is_reported() {
        let mut world = base_world();
        world.game.start_health = 9;
        world.game.max_health = 5;

        let errors = validate_world(&world);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn world_defs_parse_from_ron() {
        let text = r#"(
            game: (title: "Tiny", start_scene: "a"),
            scenes: [
                (id: "a", title: "A", desc: "First.", actions: [
                    (command: "go", label: "Go on", effects: [MoveTo("b"), Score(2)]),
                ]),
                (id: "b", title: "B", desc: "Last.", ending: Some((kind: win, text: "Done."))),
            ],
        )"#;
        let world: WorldDef = ron::from_str(text).expect("tiny world parses");
        assert_eq!(world.game.max_health, 5);
        assert_eq!(world.scenes[1].ending.as_ref().map(|e| e.kind), Some(EndingKind::Win));
        assert!(validate_world(&world).is_empty());
    }
}
