//! Client registry: participant records and the outboxes lines are
//! delivered through.

use std::collections::HashMap;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::common::ui::redisplay_prompt;

use super::domain::{Nickname, Participant, ParticipantId};

/// Where lines addressed to a participant are delivered
pub enum Outbox {
    /// A connected client, fed through its writer task
    Connection(mpsc::UnboundedSender<String>),
    /// The hosting console
    Console,
}

/// Delivery failure for a single participant
#[derive(Debug, Error, PartialEq)]
pub enum DeliveryError {
    /// No record exists for the participant
    #[error("Participant '{0}' is not registered")]
    NotRegistered(ParticipantId),

    /// The participant's writer task is gone
    #[error("Outbox for participant '{0}' is closed")]
    ChannelClosed(ParticipantId),
}

struct Entry {
    participant: Participant,
    outbox: Outbox,
}

/// Mapping from participant ID to record and outbox.
///
/// The registry itself is not synchronized; the room state wraps it in a
/// mutex so that registration, broadcast and command handling are atomic
/// with respect to each other.
#[derive(Default)]
pub struct Registry {
    entries: HashMap<ParticipantId, Entry>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a participant.
    ///
    /// # Panics
    ///
    /// Panics if the ID is already registered. Connection IDs are generated
    /// from a monotonic counter and the host is registered exactly once, so
    /// a duplicate is a bug in the caller.
    pub fn register(&mut self, id: ParticipantId, participant: Participant, outbox: Outbox) {
        let previous = self.entries.insert(id, Entry { participant, outbox });
        assert!(
            previous.is_none(),
            "participant '{}' is already registered",
            id
        );
    }

    /// Remove a participant and return its record. No-op if absent.
    pub fn unregister(&mut self, id: ParticipantId) -> Option<Participant> {
        self.entries.remove(&id).map(|entry| entry.participant)
    }

    /// Look up a participant's record
    pub fn get(&self, id: ParticipantId) -> Option<&Participant> {
        self.entries.get(&id).map(|entry| &entry.participant)
    }

    /// Replace a participant's nickname, returning the previous one
    pub fn set_nickname(&mut self, id: ParticipantId, new_nickname: Nickname) -> Option<Nickname> {
        self.entries
            .get_mut(&id)
            .map(|entry| std::mem::replace(&mut entry.participant.nickname, new_nickname))
    }

    /// Number of registered participants, the host included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry has no participants
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot of every participant, host first, then connections in accept
    /// order
    pub fn participants(&self) -> Vec<(ParticipantId, Participant)> {
        let mut participants: Vec<(ParticipantId, Participant)> = self
            .entries
            .iter()
            .map(|(id, entry)| (*id, entry.participant.clone()))
            .collect();

        // Host first, then ascending connection IDs
        participants.sort_by_key(|(id, _)| *id);

        participants
    }

    /// IDs a broadcast is delivered to, in the same stable order as
    /// [`Registry::participants`]
    pub fn broadcast_targets(&self, exclude: Option<ParticipantId>) -> Vec<ParticipantId> {
        let mut targets: Vec<ParticipantId> = self
            .entries
            .keys()
            .copied()
            .filter(|id| Some(*id) != exclude)
            .collect();

        targets.sort();

        targets
    }

    /// Deliver a line to one participant
    pub fn send_to(&self, id: ParticipantId, line: &str) -> Result<(), DeliveryError> {
        let entry = self
            .entries
            .get(&id)
            .ok_or(DeliveryError::NotRegistered(id))?;
        deliver(id, &entry.outbox, line)
    }

    /// Deliver a line to every participant except the excluded one.
    ///
    /// A failed delivery only affects that recipient; the line still goes
    /// out to everyone else.
    pub fn broadcast(&self, line: &str, exclude: Option<ParticipantId>) {
        for id in self.broadcast_targets(exclude) {
            if let Err(e) = self.send_to(id, line) {
                tracing::warn!("Failed to deliver line to participant '{}': {}", id, e);
            }
        }
    }
}

fn deliver(id: ParticipantId, outbox: &Outbox, line: &str) -> Result<(), DeliveryError> {
    match outbox {
        Outbox::Connection(sender) => sender
            .send(line.to_string())
            .map_err(|_| DeliveryError::ChannelClosed(id)),
        Outbox::Console => {
            println!("{}", line);
            redisplay_prompt();
            Ok(())
        }
    }
}
