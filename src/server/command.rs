//! In-band `/`-command parsing and dispatch.
//!
//! Lines from connections and from the host console both end up in
//! [`process_line`]. The host-only `/close` never reaches the dispatcher: it
//! is intercepted on the host input path, so from here it looks like any
//! other unknown command.

use super::domain::{Nickname, ParticipantId};
use super::formatter::MessageFormatter;
use super::registry::Registry;
use super::state::RoomState;

/// A parsed client command
#[derive(Debug, PartialEq)]
pub enum Command {
    /// `/nick <name>`: change the issuer's nickname
    Nick { arg: Option<String> },
    /// `/users`: list every participant, privately
    Users,
    /// `/help`: list the available commands, privately
    Help,
    /// Anything else starting with `/`
    Unknown(String),
}

/// Parse a line into a command.
///
/// Returns `None` when the line does not start with `/` and is therefore
/// chat. Command names are case-sensitive; the argument is the rest of the
/// line with surrounding whitespace removed.
pub fn parse(line: &str) -> Option<Command> {
    let body = line.strip_prefix('/')?;
    let (name, rest) = match body.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest),
        None => (body, ""),
    };
    let arg = rest.trim();
    let arg = (!arg.is_empty()).then(|| arg.to_string());

    let command = match name {
        "nick" => Command::Nick { arg },
        "users" => Command::Users,
        "help" => Command::Help,
        _ => Command::Unknown(name.to_string()),
    };
    Some(command)
}

/// Process one line arriving from a participant.
///
/// Trailing whitespace is trimmed first. A trimmed line starting with `/` is
/// dispatched as a command; any other non-empty line is formatted with the
/// issuer's role prefix and nickname and broadcast to everyone else.
pub async fn process_line(state: &RoomState, issuer: ParticipantId, line: &str) {
    let text = line.trim_end();
    if text.is_empty() {
        return;
    }

    match parse(text) {
        Some(command) => dispatch(state, issuer, command).await,
        None => {
            let registry = state.registry.lock().await;
            let Some(sender) = registry.get(issuer) else {
                // The issuer disconnected while its line was in flight
                return;
            };
            let chat_line = MessageFormatter::format_chat_line(sender, text);
            registry.broadcast(&chat_line, Some(issuer));
        }
    }
}

async fn dispatch(state: &RoomState, issuer: ParticipantId, command: Command) {
    match command {
        Command::Nick { arg } => handle_nick(state, issuer, arg).await,
        Command::Users => {
            let registry = state.registry.lock().await;
            for line in MessageFormatter::format_roster(&registry.participants()) {
                reply(&registry, issuer, &line);
            }
        }
        Command::Help => {
            let registry = state.registry.lock().await;
            reply(&registry, issuer, &MessageFormatter::format_help());
        }
        Command::Unknown(name) => {
            let registry = state.registry.lock().await;
            reply(
                &registry,
                issuer,
                &MessageFormatter::format_unknown_command(&name),
            );
        }
    }
}

/// Handle `/nick`. The permission check comes before argument validation,
/// and the registry lock is held across the rename and its notice so the
/// update is atomic with respect to other broadcasts.
async fn handle_nick(state: &RoomState, issuer: ParticipantId, arg: Option<String>) {
    let mut registry = state.registry.lock().await;
    let Some(issuer_record) = registry.get(issuer) else {
        return;
    };

    if !issuer_record.permission.can_rename() {
        reply(&registry, issuer, &MessageFormatter::format_nick_refusal());
        return;
    }

    let Some(name) = arg else {
        reply(&registry, issuer, &MessageFormatter::format_nick_usage());
        return;
    };

    match Nickname::new(&name) {
        Ok(new_nickname) => {
            if let Some(old) = registry.set_nickname(issuer, new_nickname.clone()) {
                registry.broadcast(
                    &MessageFormatter::format_rename_notice(&old, &new_nickname),
                    None,
                );
            }
        }
        Err(e) => {
            reply(&registry, issuer, &MessageFormatter::format_nick_rejected(&e));
        }
    }
}

fn reply(registry: &Registry, issuer: ParticipantId, line: &str) {
    if let Err(e) = registry.send_to(issuer, line) {
        tracing::warn!("Failed to reply to participant '{}': {}", issuer, e);
    }
}
