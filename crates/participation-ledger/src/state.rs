//! Persistent form of a [`ParticipationLedger`].
//!
//! A [`LedgerState`] is a plain JSON document holding the ledger index, the
//! registered events, and every participation record. Loading replays the
//! document through the same validation as live mutation, except that
//! participations may lie at or below the ledger index.

use std::path::Path;

use participation_types::{Event, EventId, MilestoneIndex};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::ledger::ParticipationLedger;
use crate::participation::Participation;
use crate::LedgerError;

/// A registered event together with its id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEntry {
    /// The event id.
    pub id: EventId,
    /// The event definition.
    pub event: Event,
}

/// Serializable snapshot of a ledger's full contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerState {
    /// Last applied milestone.
    pub ledger_index: MilestoneIndex,
    /// Registered events.
    #[serde(default)]
    pub events: Vec<EventEntry>,
    /// Participation records.
    #[serde(default)]
    pub participations: Vec<Participation>,
}

impl LedgerState {
    /// Read a state document from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Io`] if the file cannot be read or
    /// [`LedgerError::Json`] if it is not a valid state document.
    pub fn from_file(path: &Path) -> Result<Self, LedgerError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse a state document from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Json`] if the string is not a valid document.
    pub fn parse(json: &str) -> Result<Self, LedgerError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write the document to `path` as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] if serialization or the write fails.
    pub fn write_to(&self, path: &Path) -> Result<(), LedgerError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

impl ParticipationLedger {
    /// Rebuild a ledger from a state document.
    ///
    /// # Errors
    ///
    /// Returns the first [`LedgerError`] raised while registering events or
    /// participations.
    pub fn from_state(state: LedgerState) -> Result<Self, LedgerError> {
        let mut ledger = Self::new(state.ledger_index);
        let event_count = state.events.len();
        let participation_count = state.participations.len();

        for entry in state.events {
            ledger.add_event(entry.id, entry.event)?;
        }
        for participation in state.participations {
            ledger.insert_participation(participation)?;
        }

        info!(
            ledger_index = state.ledger_index,
            events = event_count,
            participations = participation_count,
            "participation ledger restored"
        );
        Ok(ledger)
    }

    /// Capture the ledger's full contents as a state document.
    pub fn to_state(&self) -> LedgerState {
        LedgerState {
            ledger_index: self.ledger_index(),
            events: self
                .events()
                .iter()
                .map(|(id, event)| EventEntry {
                    id: *id,
                    event: event.clone(),
                })
                .collect(),
            participations: self
                .events()
                .keys()
                .flat_map(|id| self.participations(id))
                .cloned()
                .collect(),
        }
    }
}
