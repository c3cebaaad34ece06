//! View module.
//! The resolver never prints. It returns `ViewItem`s describing what happened
//! during a turn, and the REPL hands them to a `View`, which groups, styles and
//! displays them at the end of the turn.
use colored::Colorize;
use isle_data::EndingKind;
use textwrap::{fill, termwidth};
use variantly::Variantly;

use crate::command::GLOBAL_COMMANDS;
use crate::style::{GameStyle, indented_block, normal_block};

const ICON_SUCCESS: &str = "\u{2611}";
const ICON_ERROR: &str = "⚠︎";
const ICON_EVENT: &str = "⚡︎";
const ICON_ENGINE: &str = "⚙";
const ICON_NEGATIVE: &str = "➖";
const ICON_POSITIVE: &str = "➕";
const ICON_HARMED: &str = "\u{2623}";
const ICON_HEALED: &str = "\u{2624}";
const ICON_HINT: &str = "?";

/// Maximum number of distinct scenes listed in a status path summary.
pub const PATH_SUMMARY_LEN: usize = 8;

/// A help line for one scene action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionLine {
    pub command: String,
    pub label: String,
    pub blocked: Option<String>,
}

/// Snapshot of the player's progress for the `status` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub player_name: String,
    pub health: u32,
    pub max_health: u32,
    pub score: i32,
    pub hints_remaining: u32,
    pub location: String,
    pub inventory: Vec<String>,
    pub visited: usize,
    pub path: Vec<String>,
}

/// Pieces of narrative output produced by one resolved command.
#[derive(Debug, Clone, PartialEq, Eq, Variantly)]
pub enum ViewItem {
    SceneDescription { title: String, description: String },
    ActionResult(String),
    ItemAcquired(String),
    ItemLost(String),
    ItemUsed { name: String, text: Option<String> },
    HealthChanged { delta: i32, health: u32, max: u32 },
    ScoreChanged(i32),
    EventText(String),
    Hint { text: String, remaining: u32 },
    NoHintHere,
    Help { scene_title: String, actions: Vec<ActionLine> },
    Status(StatusReport),
    Ending { kind: EndingKind, text: String },
    EngineMessage(String),
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Scene,
    Results,
    Game,
}

impl ViewItem {
    fn section(&self) -> Section {
        match self {
            ViewItem::SceneDescription { .. } => Section::Scene,
            ViewItem::Help { .. } | ViewItem::Status(_) | ViewItem::EngineMessage(_) => Section::Game,
            _ => Section::Results,
        }
    }

    /// Unstyled text for this item, as used by logs and tests.
    pub fn plain_text(&self) -> String {
        match self {
            ViewItem::SceneDescription { title, description } => format!("{title}\n{description}"),
            ViewItem::ActionResult(text) | ViewItem::EventText(text) | ViewItem::EngineMessage(text) => text.clone(),
            ViewItem::ItemAcquired(name) => format!("Added to inventory: {name}"),
            ViewItem::ItemLost(name) => format!("Removed from inventory: {name}"),
            ViewItem::ItemUsed { name, text } => match text {
                Some(text) => text.clone(),
                None => format!("You use the {name}."),
            },
            ViewItem::HealthChanged { delta, health, max } => {
                if *delta < 0 {
                    format!("You lose {} health. ({health}/{max})", delta.unsigned_abs())
                } else {
                    format!("You recover {delta} health. ({health}/{max})")
                }
            },
            ViewItem::ScoreChanged(delta) => format!("Score {delta:+}"),
            ViewItem::Hint { text, remaining } => format!("Hint: {text} ({remaining} left)"),
            ViewItem::NoHintHere => "There is no hint for this scene.".to_string(),
            ViewItem::Help { scene_title, actions } => {
                let mut lines = vec![format!("Actions in {scene_title}:")];
                for line in actions {
                    match &line.blocked {
                        Some(reason) => lines.push(format!("  {} - {} (blocked: {reason})", line.command, line.label)),
                        None => lines.push(format!("  {} - {}", line.command, line.label)),
                    }
                }
                lines.push("Global commands:".to_string());
                for (command, label) in GLOBAL_COMMANDS {
                    lines.push(format!("  {command} - {label}"));
                }
                lines.join("\n")
            },
            ViewItem::Status(report) => status_lines(report).join("\n"),
            ViewItem::Ending { kind, text } => format!("[{} ending] {text}", kind.as_str().to_uppercase()),
            ViewItem::Error(text) => format!("Error: {text}"),
        }
    }
}

fn status_lines(report: &StatusReport) -> Vec<String> {
    let inventory = if report.inventory.is_empty() {
        "empty".to_string()
    } else {
        report.inventory.join(", ")
    };
    vec![
        format!("Player: {}", report.player_name),
        format!("Health: {}/{}", report.health, report.max_health),
        format!("Score: {}", report.score),
        format!("Hints left: {}", report.hints_remaining),
        format!("Location: {}", report.location),
        format!("Inventory: {inventory}"),
        format!("Scenes visited: {}", report.visited),
        format!("Path: {}", report.path.join(" -> ")),
    ]
}

/// Aggregates the items of one turn and renders them to the terminal.
#[derive(Debug, Clone)]
pub struct View {
    pub width: usize,
    pub items: Vec<ViewItem>,
}

impl Default for View {
    fn default() -> Self {
        Self::new()
    }
}

impl View {
    pub fn new() -> Self {
        Self {
            width: termwidth(),
            items: Vec::new(),
        }
    }

    /// Use a fixed wrap width instead of the terminal's.
    pub fn with_width(width: usize) -> Self {
        Self {
            width,
            items: Vec::new(),
        }
    }

    pub fn push(&mut self, item: ViewItem) {
        self.items.push(item);
    }

    pub fn extend(&mut self, items: impl IntoIterator<Item = ViewItem>) {
        self.items.extend(items);
    }

    /// Compose and display everything queued this turn, then clear the buffer.
    pub fn flush(&mut self) {
        let scene: Vec<_> = self.items.iter().filter(|i| i.section() == Section::Scene).collect();
        let results: Vec<_> = self.items.iter().filter(|i| i.section() == Section::Results).collect();
        let game: Vec<_> = self.items.iter().filter(|i| i.section() == Section::Game).collect();

        // Only the last scene entered this turn is shown, after the results that led there.
        if !results.is_empty() {
            println!("{:.>width$}\n", "results".section_style(), width = self.width);
            for item in results {
                self.render(item);
            }
        }
        if let Some(item) = scene.last() {
            println!("{:.>width$}\n", "scene".section_style(), width = self.width);
            self.render(item);
        }
        if !game.is_empty() {
            println!("{:.>width$}\n", "game".section_style(), width = self.width);
            for item in game {
                self.render(item);
            }
        }

        self.items.clear();
        println!();
    }

    fn render(&self, item: &ViewItem) {
        let width = self.width;
        match item {
            ViewItem::SceneDescription { title, description } => {
                println!("{}", title.scene_titlebar_style());
                println!("{}\n", fill(description, normal_block(width)).description_style());
            },
            ViewItem::ActionResult(text) => {
                println!("{}\n", fill(&format!("{ICON_SUCCESS:<4}{text}"), normal_block(width)));
            },
            ViewItem::ItemAcquired(name) => {
                println!("{:<4}Added to inventory: {}", ICON_POSITIVE.bright_green(), name.item_style());
            },
            ViewItem::ItemLost(name) => {
                println!("{:<4}Removed from inventory: {}", ICON_NEGATIVE.bright_red(), name.item_style());
            },
            ViewItem::ItemUsed { .. } => {
                println!("{}", fill(&item.plain_text(), normal_block(width)).triggered_style());
            },
            ViewItem::HealthChanged { delta, .. } => {
                let icon = if *delta < 0 {
                    ICON_HARMED.bright_red()
                } else {
                    ICON_HEALED.bright_green()
                };
                println!("{icon:<4}{}", item.plain_text());
            },
            ViewItem::ScoreChanged(delta) => {
                if delta.is_negative() {
                    println!("{:<4}{}", ICON_NEGATIVE.bright_red(), item.plain_text().bright_red());
                } else {
                    println!("{:<4}{}", ICON_POSITIVE.bright_green(), item.plain_text().bright_green());
                }
            },
            ViewItem::EventText(text) => {
                let formatted = format!("{:<4}{}", ICON_EVENT.trig_icon_style(), text.triggered_style());
                println!("{}\n", fill(&formatted, normal_block(width)));
            },
            ViewItem::Hint { text, remaining } => {
                println!("{:<4}{}", ICON_HINT.hint_style(), fill(text, normal_block(width)).hint_style());
                println!("    {}\n", format!("({remaining} hints left)").dimmed());
            },
            ViewItem::NoHintHere => {
                println!("{:<4}{}\n", ICON_HINT.hint_style(), item.plain_text().dimmed());
            },
            ViewItem::Help { scene_title, actions } => {
                println!("{}", format!("Actions in {scene_title}").subheading_style());
                for line in actions {
                    match &line.blocked {
                        Some(reason) => println!(
                            "  {:<16}{} {}",
                            line.command.denied_style(),
                            line.label,
                            format!("({reason})").dimmed()
                        ),
                        None => println!("  {:<16}{}", line.command.command_style(), line.label),
                    }
                }
                println!("\n{}", "Global commands".subheading_style());
                for (command, label) in GLOBAL_COMMANDS {
                    println!("  {:<16}{label}", command.command_style());
                }
                println!();
            },
            ViewItem::Status(report) => {
                for line in status_lines(report) {
                    println!("{}", fill(&line, indented_block(width)));
                }
                println!();
            },
            ViewItem::Ending { kind, text } => {
                let banner = format!("*** {} ENDING ***", kind.as_str().to_uppercase());
                println!("{}", banner.ending_style(*kind));
                println!("{}\n", fill(text, normal_block(width)).ending_style(*kind));
            },
            ViewItem::EngineMessage(text) => {
                println!("{}", fill(&format!("{ICON_ENGINE:<4}{text}"), normal_block(width)));
            },
            ViewItem::Error(text) => {
                println!("{:<4}{}", ICON_ERROR.error_style(), text.error_style());
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn help_text_lists_blocked_reasons_and_globals() {
        let item = ViewItem::Help {
            scene_title: "Stone Gate".into(),
            actions: vec![
                ActionLine {
                    command: "key".into(),
                    label: "Use the key".into(),
                    blocked: Some("You lack the key.".into()),
                },
                ActionLine {
                    command: "back".into(),
                    label: "Go back".into(),
                    blocked: None,
                },
            ],
        };
        let text = item.plain_text();
        assert!(text.contains("key - Use the key (blocked: You lack the key.)"));
        assert!(text.contains("back - Go back"));
        assert!(text.contains("hint - Spend a hint"));
    }

    #[test]
    fn health_change_text_shows_direction() {
        let hurt = ViewItem::HealthChanged {
            delta: -1,
            health: 2,
            max: 5,
        };
        assert_eq!(hurt.plain_text(), "You lose 1 health. (2/5)");
        let healed = ViewItem::HealthChanged {
            delta: 1,
            health: 4,
            max: 5,
        };
        assert_eq!(healed.plain_text(), "You recover 1 health. (4/5)");
    }

    #[test]
    fn status_text_summarizes_inventory() {
        let report = StatusReport {
            player_name: "Tess".into(),
            health: 3,
            max_health: 5,
            score: 12,
            hints_remaining: 2,
            location: "Shore Camp".into(),
            inventory: Vec::new(),
            visited: 1,
            path: vec!["Shore Camp".into()],
        };
        let text = ViewItem::Status(report).plain_text();
        assert!(text.contains("Inventory: empty"));
        assert!(text.contains("Path: Shore Camp"));
    }
}
