//! Formatting for every line the room sends to participants.
//!
//! All functions are pure so the exact wire text can be asserted in tests.

use crate::common::time::timestamp_to_jst_rfc3339;

use super::domain::{Nickname, NicknameError, Participant, ParticipantId, Timestamp};

/// Formatter for lines sent to room participants
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format the private welcome line sent to a freshly accepted connection
    ///
    /// # Arguments
    ///
    /// * `nickname` - The default nickname assigned to the connection
    ///
    /// # Returns
    ///
    /// A formatted welcome line naming the nickname and pointing to `/help`
    pub fn format_welcome(nickname: &Nickname) -> String {
        format!(
            "Welcome! You are '{}'. Type /help to list commands.",
            nickname
        )
    }

    /// Format the join notice broadcast when a participant enters the room
    ///
    /// # Arguments
    ///
    /// * `nickname` - The nickname of the participant who entered
    /// * `entered_at` - When the participant entered (JST milliseconds)
    ///
    /// # Returns
    ///
    /// A formatted join notice with an RFC 3339 timestamp
    pub fn format_entered_notice(nickname: &Nickname, entered_at: Timestamp) -> String {
        format!(
            "* {} entered the room at {}",
            nickname,
            timestamp_to_jst_rfc3339(entered_at.value())
        )
    }

    /// Format the leave notice broadcast when a participant disconnects
    ///
    /// # Arguments
    ///
    /// * `nickname` - The nickname the participant had when it left
    /// * `left_at` - When the participant left (JST milliseconds)
    ///
    /// # Returns
    ///
    /// A formatted leave notice with an RFC 3339 timestamp
    pub fn format_left_notice(nickname: &Nickname, left_at: Timestamp) -> String {
        format!(
            "* {} left the room at {}",
            nickname,
            timestamp_to_jst_rfc3339(left_at.value())
        )
    }

    /// Format the rename notice broadcast after a successful `/nick`
    ///
    /// # Arguments
    ///
    /// * `old` - The nickname before the change
    /// * `new` - The nickname after the change
    ///
    /// # Returns
    ///
    /// A formatted rename notice naming both nicknames
    pub fn format_rename_notice(old: &Nickname, new: &Nickname) -> String {
        format!("* {} is now known as {}", old, new)
    }

    /// Format the farewell broadcast when the host closes the room
    pub fn format_closing_notice() -> String {
        "* The host is closing the room. Goodbye!".to_string()
    }

    /// Format a chat line from a participant
    ///
    /// # Arguments
    ///
    /// * `sender` - The registry record of the sender
    /// * `text` - The trimmed message text
    ///
    /// # Returns
    ///
    /// A line in the form `"<role_prefix> [<nickname>]: <text>"`
    pub fn format_chat_line(sender: &Participant, text: &str) -> String {
        format!("{} [{}]: {}", sender.role_prefix, sender.nickname, text)
    }

    /// Format the `/users` roster reply
    ///
    /// # Arguments
    ///
    /// * `participants` - Snapshot of every registry entry in stable order
    ///
    /// # Returns
    ///
    /// A header line followed by one indented line per participant showing
    /// role prefix, nickname, endpoint and permission level
    pub fn format_roster(participants: &[(ParticipantId, Participant)]) -> Vec<String> {
        let mut lines = Vec::with_capacity(participants.len() + 1);
        lines.push(format!("Participants ({}):", participants.len()));
        for (_, participant) in participants {
            lines.push(format!(
                "  {} {} {} (permission {})",
                participant.role_prefix,
                participant.nickname,
                participant.endpoint(),
                participant.permission.value()
            ));
        }
        lines
    }

    /// Format the `/help` reply listing the commands available to clients
    pub fn format_help() -> String {
        "Available commands: /nick <name>, /users, /help, /quit".to_string()
    }

    /// Format the usage reply for `/nick` without an argument
    pub fn format_nick_usage() -> String {
        "Usage: /nick <name>".to_string()
    }

    /// Format the refusal reply for `/nick` from a participant without the
    /// required permission
    pub fn format_nick_refusal() -> String {
        "You do not have permission to change your nickname.".to_string()
    }

    /// Format the rejection reply for `/nick` with an invalid name
    ///
    /// # Arguments
    ///
    /// * `error` - The validation error to explain to the issuer
    pub fn format_nick_rejected(error: &NicknameError) -> String {
        format!("Cannot change nickname: {}", error)
    }

    /// Format the reply for a command the dispatcher does not know
    ///
    /// # Arguments
    ///
    /// * `name` - The command name as typed, without the leading `/`
    pub fn format_unknown_command(name: &str) -> String {
        format!("Unknown command '/{}'. Type /help to list commands.", name)
    }
}
