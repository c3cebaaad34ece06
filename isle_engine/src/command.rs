//! Command module
//!
//! Turns raw player input into a `Command`. Global commands are recognized
//! here; everything else is handed to the current scene as a keyword plus an
//! optional argument.

/// Commands that can be issued by the player.
#[derive(Debug, Clone, PartialEq, Eq, variantly::Variantly)]
pub enum Command {
    Blank,
    Help,
    Hint,
    Load,
    Quit,
    Save,
    Status,
    UseItem(Option<String>),
    Scene { keyword: String, argument: Option<String> },
}

/// Global commands shown in every help listing.
pub const GLOBAL_COMMANDS: &[(&str, &str)] = &[
    ("help", "Show what you can do here."),
    ("status", "Show health, score, hints and inventory."),
    ("hint", "Spend a hint on the current scene."),
    ("use <item>", "Use an item from your inventory."),
    ("save", "Save the game."),
    ("load", "Load the saved game."),
    ("quit", "Return to the main menu."),
];

/// Lowercase, trim and collapse runs of whitespace.
pub fn normalize(input: &str) -> String {
    input
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parses an input string into a `Command`.
pub fn parse_command(input: &str) -> Command {
    let normalized = normalize(input);
    let words: Vec<&str> = normalized.split(' ').filter(|w| !w.is_empty()).collect();
    match words.as_slice() {
        [] => Command::Blank,
        ["help" | "?"] => Command::Help,
        ["status" | "stats"] => Command::Status,
        ["hint"] => Command::Hint,
        ["save"] => Command::Save,
        ["load"] => Command::Load,
        ["quit" | "exit"] => Command::Quit,
        ["use"] => Command::UseItem(None),
        ["use", rest @ ..] => Command::UseItem(Some(rest.join("_"))),
        [keyword] => Command::Scene {
            keyword: (*keyword).to_string(),
            argument: None,
        },
        [keyword, rest @ ..] => Command::Scene {
            keyword: (*keyword).to_string(),
            argument: Some(rest.join(" ")),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_spacing() {
        assert_eq!(normalize("  Code   274 \t"), "code 274");
        assert_eq!(normalize("   "), "");
    }

    #[test]
    fn parses_global_commands() {
        assert_eq!(parse_command("HELP"), Command::Help);
        assert_eq!(parse_command("?"), Command::Help);
        assert_eq!(parse_command("stats"), Command::Status);
        assert_eq!(parse_command("exit"), Command::Quit);
        assert!(parse_command("  ").is_blank());
    }

    #[test]
    fn reserved_world_keywords_never_reach_a_scene() {
        for keyword in isle_data::RESERVED_KEYWORDS {
            assert!(!parse_command(keyword).is_scene(), "{keyword} parsed as a scene action");
        }
    }

    #[test]
    fn use_joins_multiword_items() {
        assert_eq!(parse_command("use healing herb"), Command::UseItem(Some("healing_herb".into())));
        assert_eq!(parse_command("use"), Command::UseItem(None));
        assert!(parse_command("USE coin").is_use_item());
    }

    #[test]
    fn scene_commands_keep_their_argument() {
        assert_eq!(
            parse_command("code 274"),
            Command::Scene {
                keyword: "code".into(),
                argument: Some("274".into())
            }
        );
        assert_eq!(
            parse_command("Left"),
            Command::Scene {
                keyword: "left".into(),
                argument: None
            }
        );
        // global words with trailing text fall through to the scene
        assert!(parse_command("save slot1").is_scene());
    }
}
