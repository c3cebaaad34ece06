//! Scene graph
//!
//! The immutable arena of scenes and items a session plays through. Scenes
//! reference each other by string id; the graph is built once from a
//! `WorldDef` and never changes afterwards.

use std::collections::{HashMap, HashSet, VecDeque};

use isle_data::{ValidationError, WorldDef, validate_world};
use log::{info, warn};
use thiserror::Error;

use crate::loader::worlddef::{item_from_def, rules_from_def, scene_from_def};
use crate::scene::{Effect, GameRules, Item, Scene};

/// Lookup failure against a built graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("scene '{0}' not found")]
    SceneNotFound(String),
}

/// A world definition that cannot be turned into a playable graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("world definition failed integrity checks:\n{}", list_problems(.problems))]
pub struct GraphIntegrityError {
    pub problems: Vec<ValidationError>,
}

fn list_problems(problems: &[ValidationError]) -> String {
    problems
        .iter()
        .map(|problem| format!("- {problem}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Immutable story graph plus the session rules that go with it.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    rules: GameRules,
    scenes: HashMap<String, Scene>,
    scene_order: Vec<String>,
    items: HashMap<String, Item>,
    item_order: Vec<String>,
    unreachable: Vec<String>,
}

impl SceneGraph {
    /// Validate `def` and build the runtime graph.
    ///
    /// # Errors
    /// Returns every dangling reference, duplicate id and invalid value found in `def`.
    pub fn from_def(def: &WorldDef) -> Result<SceneGraph, GraphIntegrityError> {
        let problems = validate_world(def);
        if !problems.is_empty() {
            return Err(GraphIntegrityError { problems });
        }

        let mut graph = SceneGraph {
            rules: rules_from_def(&def.game),
            scenes: HashMap::new(),
            scene_order: Vec::new(),
            items: HashMap::new(),
            item_order: Vec::new(),
            unreachable: Vec::new(),
        };
        for scene_def in &def.scenes {
            let scene = scene_from_def(scene_def);
            graph.scene_order.push(scene.id.clone());
            graph.scenes.insert(scene.id.clone(), scene);
        }
        for item_def in &def.items {
            let item = item_from_def(item_def);
            graph.item_order.push(item.id.clone());
            graph.items.insert(item.id.clone(), item);
        }

        graph.unreachable = graph.find_unreachable();
        for id in &graph.unreachable {
            warn!("scene '{id}' cannot be reached from start scene '{}'", graph.rules.start_scene);
        }
        info!(
            "scene graph built: {} scenes, {} items",
            graph.scenes.len(),
            graph.items.len()
        );
        Ok(graph)
    }

    /// Look up a scene by id.
    ///
    /// # Errors
    /// `GraphError::SceneNotFound` if no scene has that id.
    pub fn get_scene(&self, id: &str) -> Result<&Scene, GraphError> {
        self.scenes
            .get(id)
            .ok_or_else(|| GraphError::SceneNotFound(id.to_string()))
    }

    pub fn contains_scene(&self, id: &str) -> bool {
        self.scenes.contains_key(id)
    }

    pub fn scene_count(&self) -> usize {
        self.scenes.len()
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    pub fn item(&self, id: &str) -> Option<&Item> {
        self.items.get(id)
    }

    /// Items in definition order.
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.item_order.iter().filter_map(|id| self.items.get(id))
    }

    /// Resolve a player-typed item reference by id, alias or display name.
    pub fn find_item(&self, query: &str) -> Option<&Item> {
        self.items().find(|item| item.matches(query))
    }

    /// Display name for an item id, falling back to the id itself.
    pub fn item_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.items.get(id).map_or(id, |item| item.name.as_str())
    }

    /// Scenes no path from the start scene leads to, in definition order.
    pub fn unreachable_scenes(&self) -> &[String] {
        &self.unreachable
    }

    fn find_unreachable(&self) -> Vec<String> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();

        // Item effects can fire anywhere, so their targets count as roots.
        let mut roots = vec![self.rules.start_scene.as_str()];
        for item in self.items.values() {
            collect_targets(&item.use_effects, &mut roots);
        }
        for root in roots {
            if seen.insert(root) {
                queue.push_back(root);
            }
        }

        while let Some(id) = queue.pop_front() {
            let Some(scene) = self.scenes.get(id) else {
                continue;
            };
            let mut targets = Vec::new();
            collect_targets(&scene.on_enter, &mut targets);
            for action in &scene.actions {
                collect_targets(&action.effects, &mut targets);
            }
            for event in &scene.events {
                collect_targets(&event.effects, &mut targets);
            }
            for target in targets {
                if seen.insert(target) {
                    queue.push_back(target);
                }
            }
        }

        self.scene_order
            .iter()
            .filter(|id| !seen.contains(id.as_str()))
            .cloned()
            .collect()
    }
}

fn collect_targets<'a>(effects: &'a [Effect], out: &mut Vec<&'a str>) {
    for effect in effects {
        match effect {
            Effect::MoveTo(scene) => out.push(scene),
            Effect::When { then, .. } => collect_targets(then, out),
            Effect::CheckCode(lock) => {
                out.push(&lock.lockout_scene);
                collect_targets(&lock.on_success, out);
                collect_targets(&lock.on_failure, out);
            },
            Effect::AddItem(_) | Effect::RemoveItem(_) | Effect::Health(_) | Effect::Score(_) | Effect::SetFlag(_) => {},
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use isle_data::{ActionDef, EffectDef, GameDef, SceneDef};

    fn scene(id: &str, effects: Vec<EffectDef>) -> SceneDef {
        SceneDef {
            id: id.into(),
            title: id.to_uppercase(),
            desc: format!("Scene {id}"),
            hint: None,
            actions: vec![ActionDef {
                command: "go".into(),
                label: "Go".into(),
                aliases: Vec::new(),
                requires: Vec::new(),
                blocked_text: None,
                text: None,
                effects,
            }],
            on_enter: Vec::new(),
            events: Vec::new(),
            ending: None,
        }
    }

    fn world(scenes: Vec<SceneDef>) -> WorldDef {
        WorldDef {
            game: GameDef {
                title: "Test".into(),
                start_scene: "a".into(),
                ..GameDef::default()
            },
            scenes,
            items: Vec::new(),
        }
    }

    #[test]
    fn dangling_references_fail_construction() {
        let def = world(vec![scene("a", vec![EffectDef::MoveTo("missing".into())])]);
        let err = SceneGraph::from_def(&def).expect_err("dangling transition");
        assert_eq!(err.problems.len(), 1);
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn unreachable_scenes_are_reported_not_fatal() -> anyhow::Result<()> {
        let def = world(vec![
            scene("a", vec![EffectDef::MoveTo("b".into())]),
            scene("b", vec![EffectDef::MoveTo("a".into())]),
            scene("island", vec![EffectDef::MoveTo("a".into())]),
        ]);
        let graph = SceneGraph::from_def(&def)?;
        assert_eq!(graph.unreachable_scenes(), ["island".to_string()]);
        assert_eq!(graph.scene_count(), 3);
        Ok(())
    }

    #[test]
    fn get_scene_reports_unknown_ids() -> anyhow::Result<()> {
        let graph = SceneGraph::from_def(&world(vec![scene("a", Vec::new())]))?;
        assert_eq!(graph.get_scene("a")?.title, "A");
        assert_eq!(
            graph.get_scene("zzz").unwrap_err(),
            GraphError::SceneNotFound("zzz".into())
        );
        Ok(())
    }
}
