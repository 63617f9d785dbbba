#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,
    WriteLast,
    Wipe,
    Chat,
}

/// Classifies one line of user input.
///
/// Control commands are whole-line tokens compared case-insensitively after
/// trimming; anything else is chat text.
pub fn parse_command(input: &str) -> Command {
    let trimmed = input.trim();

    if trimmed.eq_ignore_ascii_case("quit") {
        Command::Quit
    } else if trimmed.eq_ignore_ascii_case("writelast") {
        Command::WriteLast
    } else if trimmed.eq_ignore_ascii_case("wipe") || trimmed.eq_ignore_ascii_case("wipehistory")
    {
        Command::Wipe
    } else {
        Command::Chat
    }
}

/// REPL-only commands handled by the terminal front end, never by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Toggle(String),
    Options,
    Help,
    Unknown(String),
}

pub fn parse_repl_command(input: &str) -> Option<ReplCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with(':') {
        return None;
    }

    let mut parts = trimmed.split_whitespace();
    let command = parts.next().unwrap_or(trimmed).to_string();

    let parsed = match command.as_str() {
        ":toggle" => ReplCommand::Toggle(parts.collect::<Vec<_>>().join(" ")),
        ":options" => ReplCommand::Options,
        ":help" => ReplCommand::Help,
        _ => ReplCommand::Unknown(command),
    };

    Some(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_tokens_ignore_case_and_surrounding_whitespace() {
        assert_eq!(parse_command("QUIT"), Command::Quit);
        assert_eq!(parse_command("  quit\n"), Command::Quit);
        assert_eq!(parse_command("WriteLast"), Command::WriteLast);
        assert_eq!(parse_command("wipe"), Command::Wipe);
        assert_eq!(parse_command("WIPEHISTORY"), Command::Wipe);
    }

    #[test]
    fn tokens_must_match_the_whole_line() {
        assert_eq!(parse_command("quit now"), Command::Chat);
        assert_eq!(parse_command("please wipe"), Command::Chat);
        assert_eq!(parse_command(""), Command::Chat);
    }

    #[test]
    fn repl_commands_require_colon_prefix() {
        assert_eq!(parse_repl_command("toggle x"), None);
        assert_eq!(parse_repl_command(":options"), Some(ReplCommand::Options));
        assert_eq!(
            parse_repl_command(":toggle disableOutputCodeToFile"),
            Some(ReplCommand::Toggle("disableOutputCodeToFile".to_string()))
        );
        assert_eq!(
            parse_repl_command(":toggle"),
            Some(ReplCommand::Toggle(String::new()))
        );
        assert_eq!(
            parse_repl_command(":nope"),
            Some(ReplCommand::Unknown(":nope".to_string()))
        );
    }
}
