//! Terminal command parsing

use shared::first_grapheme;

pub const HELP: &str = "\
Commands:
  set <row> <col> <char>   fill one empty cell (you get exactly one)
  history                  fetch the full update history from the server
  show                     redraw the grid
  help                     show this message
  quit                     leave the session";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Set { row: i32, col: i32, ch: String },
    History,
    Show,
    Help,
    Quit,
}

/// Parses one line of user input.
///
/// For `set`, everything after the column is taken as the character and
/// reduced to its first grapheme, so `set 1 2 hello` sends `h`.
pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (word, rest) = line
        .split_once(char::is_whitespace)
        .unwrap_or((line, ""));

    match word.to_ascii_lowercase().as_str() {
        "set" | "s" => parse_set(rest),
        "history" | "h" => Ok(Command::History),
        "show" | "" => Ok(Command::Show),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" | "q" => Ok(Command::Quit),
        other => Err(format!("Unknown command '{}', type 'help'", other)),
    }
}

fn parse_set(args: &str) -> Result<Command, String> {
    let mut parts = args.trim_start().splitn(3, char::is_whitespace);
    let row = parse_index(parts.next(), "row")?;
    let col = parse_index(parts.next(), "col")?;
    let ch = parts
        .next()
        .and_then(first_grapheme)
        .ok_or_else(|| "Empty input not allowed".to_string())?;

    Ok(Command::Set {
        row,
        col,
        ch: ch.to_string(),
    })
}

fn parse_index(value: Option<&str>, name: &str) -> Result<i32, String> {
    let value = value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| format!("Missing {}: set <row> <col> <char>", name))?;
    value
        .parse()
        .map_err(|_| format!("Invalid {} '{}'", name, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_set() {
        assert_eq!(
            parse_command("set 2 3 x"),
            Ok(Command::Set {
                row: 2,
                col: 3,
                ch: "x".to_string()
            })
        );
    }

    #[test]
    fn test_parse_set_takes_first_grapheme() {
        assert_eq!(
            parse_command("  s 0 9   hello world"),
            Ok(Command::Set {
                row: 0,
                col: 9,
                ch: "h".to_string()
            })
        );
        assert_eq!(
            parse_command("set 1 1 \u{1F600}\u{1F601}"),
            Ok(Command::Set {
                row: 1,
                col: 1,
                ch: "\u{1F600}".to_string()
            })
        );
    }

    #[test]
    fn test_parse_set_keeps_out_of_range_for_server() {
        assert_eq!(
            parse_command("set -1 42 z"),
            Ok(Command::Set {
                row: -1,
                col: 42,
                ch: "z".to_string()
            })
        );
    }

    #[test]
    fn test_parse_set_errors() {
        assert_eq!(
            parse_command("set 1 2"),
            Err("Empty input not allowed".to_string())
        );
        assert_eq!(
            parse_command("set 1 2    "),
            Err("Empty input not allowed".to_string())
        );
        assert!(parse_command("set").unwrap_err().starts_with("Missing row"));
        assert!(parse_command("set a 1 x")
            .unwrap_err()
            .starts_with("Invalid row"));
    }

    #[test]
    fn test_parse_other_commands() {
        assert_eq!(parse_command("history"), Ok(Command::History));
        assert_eq!(parse_command("HELP"), Ok(Command::Help));
        assert_eq!(parse_command(""), Ok(Command::Show));
        assert_eq!(parse_command("quit"), Ok(Command::Quit));
        assert!(parse_command("dance").is_err());
    }
}
