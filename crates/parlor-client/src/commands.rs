//! Terminal input convention: a leading `$` selects a peer or an action,
//! anything else is chat text.

pub const SIGIL: char = '$';

pub const HELP: &str = "\
Commands:
  $<name>       start a conversation with <name>
  $return       leave the current conversation and go back to the lobby
  $disconnect   leave the chat room
  $help         show this help
Anything else you type while in a conversation is sent to your partner.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Disconnect,
    Return,
    Help,
    PairWith(String),
    Say(String),
    Empty,
}

/// Parse one line of input. Action keywords are case-insensitive; a peer
/// name keeps its spelling.
pub fn parse(line: &str) -> Command {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Command::Empty;
    }
    let Some(rest) = trimmed.strip_prefix(SIGIL) else {
        return Command::Say(line.trim_end_matches(['\r', '\n']).to_string());
    };

    let rest = rest.trim();
    match rest.to_lowercase().as_str() {
        "disconnect" => Command::Disconnect,
        "return" => Command::Return,
        "help" | "" => Command::Help,
        _ => Command::PairWith(rest.to_string()),
    }
}
