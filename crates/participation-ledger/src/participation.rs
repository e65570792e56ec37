//! Participation records.
//!
//! A [`Participation`] says that one ledger output commits `amount` tokens
//! to one event from `start_milestone` until it is spent at
//! `end_milestone` (exclusive), or indefinitely while it stays unspent.

use participation_types::{EventId, MilestoneIndex, OutputId};
use serde::{Deserialize, Serialize};

/// Parameters for opening a participation.
///
/// Packs the arguments of
/// [`ParticipationLedger::start_participation`](crate::ParticipationLedger::start_participation)
/// into a single struct for call-site readability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipationParams {
    /// The output carrying the participation.
    pub output_id: OutputId,
    /// The event participated in.
    pub event_id: EventId,
    /// Tokens held by the output.
    pub amount: u64,
    /// One answer value per ballot question. Empty for staking.
    pub answers: Vec<u8>,
    /// The milestone that booked the output.
    pub milestone: MilestoneIndex,
}

/// A tracked participation of one output in one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participation {
    /// The output carrying the participation.
    pub output_id: OutputId,
    /// The event participated in.
    pub event_id: EventId,
    /// Tokens held by the output.
    pub amount: u64,
    /// One answer value per ballot question. Empty for staking.
    #[serde(default)]
    pub answers: Vec<u8>,
    /// First milestone at which the participation counts.
    pub start_milestone: MilestoneIndex,
    /// Milestone at which the output was spent, if it was.
    #[serde(default)]
    pub end_milestone: Option<MilestoneIndex>,
}

impl Participation {
    /// Whether the participation counts at milestone `index`.
    pub const fn is_active_at(&self, index: MilestoneIndex) -> bool {
        if self.start_milestone > index {
            return false;
        }
        match self.end_milestone {
            Some(end) => end > index,
            None => true,
        }
    }

    /// Exclusive upper bound of the milestones this participation covers
    /// when observed at `index`.
    pub fn covered_until(&self, index: MilestoneIndex) -> MilestoneIndex {
        let next = index.saturating_add(1);
        self.end_milestone.map_or(next, |end| end.min(next))
    }

    /// The answer given for `question_index`, if any.
    pub fn answer_for(&self, question_index: u8) -> Option<u8> {
        self.answers.get(usize::from(question_index)).copied()
    }
}
