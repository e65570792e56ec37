//! The immutable aggregation result.
//!
//! A [`Snapshot`] is built fresh by every aggregation and never mutated
//! afterwards. Ballot and staking tallies live in separate maps; an event
//! id appears in at most one of them.

use std::collections::BTreeMap;

use participation_types::{EventId, EventStatus, MilestoneIndex};
use serde::{Deserialize, Serialize};

/// Number of events per status, plus the overall total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventStatusCounts {
    /// Events not yet commencing.
    pub upcoming: u64,
    /// Events accepting participations before the holding phase.
    pub commencing: u64,
    /// Events in their holding phase.
    pub holding: u64,
    /// Events past their end milestone.
    pub ended: u64,
    /// All events, regardless of kind or status.
    pub total: u64,
}

impl EventStatusCounts {
    /// Count one event with the given status.
    pub const fn record(&mut self, status: EventStatus) {
        let bucket = match status {
            EventStatus::Upcoming => &mut self.upcoming,
            EventStatus::Commencing => &mut self.commencing,
            EventStatus::Holding => &mut self.holding,
            EventStatus::Ended => &mut self.ended,
        };
        *bucket = bucket.saturating_add(1);
        self.total = self.total.saturating_add(1);
    }

    /// The count for one status.
    pub const fn get(&self, status: EventStatus) -> u64 {
        match status {
            EventStatus::Upcoming => self.upcoming,
            EventStatus::Commencing => self.commencing,
            EventStatus::Holding => self.holding,
            EventStatus::Ended => self.ended,
        }
    }
}

/// Tally of one staking event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingTally {
    /// Event name, used as a metric label.
    pub event_name: String,
    /// Current reward rate (rewards per milestone).
    pub current: u64,
    /// Tokens staked at the snapshot milestone.
    pub per_milestone: u64,
    /// Rewards accumulated up to the snapshot milestone.
    pub accumulated: u64,
}

/// Tally of one ballot answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerTally {
    /// Tokens currently voting for the answer.
    pub current: u64,
    /// Tokens accumulated over the holding milestones so far.
    pub accumulated: u64,
}

/// Tally of one ballot event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotTally {
    /// Event name, used as a metric label.
    pub event_name: String,
    /// One entry per question, in question order, mapping each answer value
    /// defined on the question to its tally.
    pub questions: Vec<BTreeMap<u8, AnswerTally>>,
}

/// A coherent view of all participation events at one milestone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// The milestone every figure was computed against.
    pub milestone_index: MilestoneIndex,
    /// Event counts per status.
    pub events: EventStatusCounts,
    /// Tallies of staking events.
    pub staking: BTreeMap<EventId, StakingTally>,
    /// Tallies of ballot events.
    pub ballots: BTreeMap<EventId, BallotTally>,
}

impl Snapshot {
    /// An empty snapshot at `milestone_index`.
    pub const fn empty(milestone_index: MilestoneIndex) -> Self {
        Self {
            milestone_index,
            events: EventStatusCounts {
                upcoming: 0,
                commencing: 0,
                holding: 0,
                ended: 0,
                total: 0,
            },
            staking: BTreeMap::new(),
            ballots: BTreeMap::new(),
        }
    }
}
