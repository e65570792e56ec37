//! The participation event model.
//!
//! An [`Event`] is either a multi-question [`Ballot`] or a single
//! [`Staking`] program, distinguished by its [`EventPayload`]. Every event
//! carries a milestone schedule from which its [`EventStatus`] is derived.
//!
//! # Schedule
//!
//! ```text
//!   upcoming   | commencing   | holding        | ended
//! -------------+--------------+----------------+--------->  milestone index
//!           commence        start             end
//! ```

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::enums::EventStatus;
use crate::ids::MilestoneIndex;

/// Maximum number of questions in a ballot (question indices are `u8`).
pub const MAX_QUESTIONS: usize = 256;

/// Errors raised when an event definition is internally inconsistent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventError {
    /// The milestone schedule is not strictly increasing.
    #[error("invalid schedule: commence {commence} < start {start} < end {end} must hold")]
    InvalidSchedule {
        /// Commencing milestone.
        commence: MilestoneIndex,
        /// Holding start milestone.
        start: MilestoneIndex,
        /// End milestone.
        end: MilestoneIndex,
    },

    /// The ballot has more questions than can be indexed.
    #[error("ballot has {count} questions, at most {MAX_QUESTIONS} are allowed")]
    TooManyQuestions {
        /// Number of questions supplied.
        count: usize,
    },

    /// Two answers of one question share the same value.
    #[error("question {question_index} defines answer value {value} more than once")]
    DuplicateAnswer {
        /// Index of the offending question.
        question_index: usize,
        /// The duplicated answer value.
        value: u8,
    },

    /// A staking event must have a non-zero reward denominator.
    #[error("staking denominator must be non-zero")]
    ZeroDenominator,
}

/// A single answer option of a ballot question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    /// The value voters submit to select this answer. Unique within its
    /// question.
    pub value: u8,
    /// Human-readable answer text.
    pub text: String,
    /// Free-form extra information.
    #[serde(default)]
    pub additional_info: String,
}

/// A ballot question with its ordered answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Human-readable question text.
    pub text: String,
    /// Answer options in definition order.
    pub answers: Vec<Answer>,
    /// Free-form extra information.
    #[serde(default)]
    pub additional_info: String,
}

impl Question {
    /// Look up an answer by its value.
    pub fn answer(&self, value: u8) -> Option<&Answer> {
        self.answers.iter().find(|a| a.value == value)
    }
}

/// Payload of a ballot event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ballot {
    /// Questions in index order.
    pub questions: Vec<Question>,
}

/// Payload of a staking event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Staking {
    /// Human-readable description of the staking program.
    pub text: String,
    /// Ticker symbol of the reward token.
    pub symbol: String,
    /// Reward numerator per staked token per milestone.
    pub numerator: u64,
    /// Reward denominator per staked token per milestone.
    pub denominator: u64,
    /// Minimum rewards an output must earn to be paid out.
    #[serde(default)]
    pub required_minimum_rewards: u64,
    /// Free-form extra information.
    #[serde(default)]
    pub additional_info: String,
}

impl Staking {
    /// Rewards earned per milestone by `amount` staked tokens.
    ///
    /// Returns `None` if the denominator is zero or the result does not fit
    /// in a `u64`.
    pub fn rewards_per_milestone(&self, amount: u64) -> Option<u64> {
        u128::from(amount)
            .checked_mul(u128::from(self.numerator))?
            .checked_div(u128::from(self.denominator))
            .and_then(|r| u64::try_from(r).ok())
    }
}

/// The kind-specific content of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    /// A multi-question vote.
    Ballot(Ballot),
    /// A token staking program.
    Staking(Staking),
    /// A payload kind this build does not know how to interpret. The event
    /// still has a schedule and a status, but no tallies.
    Unrecognized {
        /// The payload type code as found in the source data.
        payload_type: u32,
    },
}

/// A participation event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Human-readable event name.
    pub name: String,
    /// Milestone at which the event starts accepting participations.
    pub milestone_index_commence: MilestoneIndex,
    /// Milestone at which participations start being counted.
    pub milestone_index_start: MilestoneIndex,
    /// Milestone at which the event ends (exclusive).
    pub milestone_index_end: MilestoneIndex,
    /// Kind-specific content.
    pub payload: EventPayload,
    /// Free-form extra information.
    #[serde(default)]
    pub additional_info: String,
}

impl Event {
    /// Build and validate an event.
    ///
    /// # Errors
    ///
    /// Returns [`EventError`] if the schedule or payload is inconsistent.
    pub fn new(
        name: impl Into<String>,
        commence: MilestoneIndex,
        start: MilestoneIndex,
        end: MilestoneIndex,
        payload: EventPayload,
    ) -> Result<Self, EventError> {
        let event = Self {
            name: name.into(),
            milestone_index_commence: commence,
            milestone_index_start: start,
            milestone_index_end: end,
            payload,
            additional_info: String::new(),
        };
        event.validate()?;
        Ok(event)
    }

    /// Check the schedule ordering and payload consistency.
    ///
    /// # Errors
    ///
    /// Returns the first [`EventError`] found.
    pub fn validate(&self) -> Result<(), EventError> {
        if self.milestone_index_commence >= self.milestone_index_start
            || self.milestone_index_start >= self.milestone_index_end
        {
            return Err(EventError::InvalidSchedule {
                commence: self.milestone_index_commence,
                start: self.milestone_index_start,
                end: self.milestone_index_end,
            });
        }

        match &self.payload {
            EventPayload::Ballot(ballot) => {
                if ballot.questions.len() > MAX_QUESTIONS {
                    return Err(EventError::TooManyQuestions {
                        count: ballot.questions.len(),
                    });
                }
                for (question_index, question) in ballot.questions.iter().enumerate() {
                    let mut seen = BTreeSet::new();
                    for answer in &question.answers {
                        if !seen.insert(answer.value) {
                            return Err(EventError::DuplicateAnswer {
                                question_index,
                                value: answer.value,
                            });
                        }
                    }
                }
            }
            EventPayload::Staking(staking) => {
                if staking.denominator == 0 {
                    return Err(EventError::ZeroDenominator);
                }
            }
            EventPayload::Unrecognized { .. } => {}
        }

        Ok(())
    }

    /// Derive the status of the event at `index`.
    pub const fn status(&self, index: MilestoneIndex) -> EventStatus {
        if index >= self.milestone_index_end {
            EventStatus::Ended
        } else if index >= self.milestone_index_start {
            EventStatus::Holding
        } else if index >= self.milestone_index_commence {
            EventStatus::Commencing
        } else {
            EventStatus::Upcoming
        }
    }

    /// The staking payload, if this is a staking event.
    pub const fn staking(&self) -> Option<&Staking> {
        match &self.payload {
            EventPayload::Staking(staking) => Some(staking),
            EventPayload::Ballot(_) | EventPayload::Unrecognized { .. } => None,
        }
    }

    /// Number of holding milestones inside `[from, until)`.
    ///
    /// Only milestones in `[milestone_index_start, milestone_index_end)`
    /// are counted.
    pub fn holding_milestones(&self, from: MilestoneIndex, until: MilestoneIndex) -> u32 {
        let lo = from.max(self.milestone_index_start);
        let hi = until.min(self.milestone_index_end);
        hi.saturating_sub(lo)
    }
}
