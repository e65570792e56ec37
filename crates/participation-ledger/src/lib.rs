//! In-memory participation indexer for the participation workspace.
//!
//! Tracks which ledger outputs participate in which events, from which
//! milestone, and with which ballot answers. From that record it answers the
//! point-in-time balance queries the snapshot aggregator consumes.
//!
//! # Architecture
//!
//! - [`ledger`] -- The [`ParticipationLedger`]: event registry, ledger
//!   index, participation records, and the balance queries.
//! - [`participation`] -- The [`Participation`] record and its activity
//!   window.
//! - [`state`] -- [`LedgerState`], the JSON document a ledger is loaded
//!   from and saved to.
//!
//! # History is immutable
//!
//! Every mutation belongs to a milestone that has not been applied yet.
//! Once [`ParticipationLedger::apply_milestone`] advances the ledger index,
//! every query at or below that index keeps returning the same figures.
//!
//! # Usage
//!
//! ```
//! use participation_ledger::{ParticipationLedger, ParticipationParams};
//! use participation_types::{Event, EventId, EventPayload, Staking, OutputId};
//!
//! let mut ledger = ParticipationLedger::new(0);
//! let event_id = EventId::new([1; 32]);
//! let staking = Staking {
//!     text: String::from("Stake"),
//!     symbol: String::from("EXP"),
//!     numerator: 1,
//!     denominator: 10,
//!     required_minimum_rewards: 0,
//!     additional_info: String::new(),
//! };
//! let event = Event::new("Stake", 1, 2, 100, EventPayload::Staking(staking)).ok();
//! assert!(event.is_some());
//! if let Some(event) = event {
//!     ledger.add_event(event_id, event).ok();
//! }
//! ledger.apply_milestone(1).ok();
//! ledger
//!     .start_participation(ParticipationParams {
//!         output_id: OutputId::new([2; 34]),
//!         event_id,
//!         amount: 1_000,
//!         answers: Vec::new(),
//!         milestone: 2,
//!     })
//!     .ok();
//! ledger.apply_milestone(3).ok();
//!
//! assert_eq!(ledger.staking_reward_rate(&event_id, 3).ok(), Some(100));
//! ```

pub mod ledger;
pub mod participation;
pub mod state;

// Re-export primary types at crate root.
pub use ledger::ParticipationLedger;
pub use participation::{Participation, ParticipationParams};
pub use state::{EventEntry, LedgerState};

use participation_types::{EventError, EventId, EventStatus, MilestoneIndex, OutputId};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur when mutating or querying the participation ledger.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// A query asked for a milestone the ledger has not reached.
    #[error("milestone {requested} is beyond the ledger index {ledger_index}")]
    MilestoneOutOfRange {
        /// The milestone that was asked for.
        requested: MilestoneIndex,
        /// The current ledger index.
        ledger_index: MilestoneIndex,
    },

    /// A mutation targeted a milestone that has already been applied.
    #[error("milestone {milestone} is already applied (ledger index {ledger_index})")]
    MilestoneAlreadyApplied {
        /// The milestone of the mutation.
        milestone: MilestoneIndex,
        /// The current ledger index.
        ledger_index: MilestoneIndex,
    },

    /// The event is not in the registry.
    #[error("event {0} not found")]
    EventNotFound(EventId),

    /// An event with this id is already registered.
    #[error("event {0} already exists")]
    EventExists(EventId),

    /// The event definition failed validation.
    #[error("event {event_id} is invalid: {source}")]
    InvalidEvent {
        /// The offending event.
        event_id: EventId,
        /// Why the event is invalid.
        #[source]
        source: EventError,
    },

    /// The event payload is not of the kind the operation needs.
    #[error("event {event_id} is not a {expected} event")]
    WrongEventKind {
        /// The event that was queried.
        event_id: EventId,
        /// The payload kind the operation needs.
        expected: &'static str,
    },

    /// The ballot has no question at this index.
    #[error("event {event_id} has no question {question_index}")]
    QuestionNotFound {
        /// The ballot event.
        event_id: EventId,
        /// The missing question index.
        question_index: u8,
    },

    /// The question has no answer with this value.
    #[error("event {event_id} question {question_index} has no answer {answer_value}")]
    AnswerNotFound {
        /// The ballot event.
        event_id: EventId,
        /// The question index.
        question_index: u8,
        /// The missing answer value.
        answer_value: u8,
    },

    /// A ballot participation must answer every question exactly once.
    #[error("event {event_id} has {expected} questions but {actual} answers were given")]
    AnswerCountMismatch {
        /// The ballot event.
        event_id: EventId,
        /// Number of questions.
        expected: usize,
        /// Number of answers supplied.
        actual: usize,
    },

    /// The event does not accept participations in its current phase.
    #[error("event {event_id} is {status} and does not accept participations")]
    NotAcceptingParticipation {
        /// The event.
        event_id: EventId,
        /// Its status at the participation milestone.
        status: EventStatus,
    },

    /// The output already participates in the event.
    #[error("output {output_id} already participates in event {event_id}")]
    ParticipationExists {
        /// The output.
        output_id: OutputId,
        /// The event.
        event_id: EventId,
    },

    /// The output has no open participation.
    #[error("output {0} has no open participation")]
    ParticipationNotFound(OutputId),

    /// A participation must end after it starts.
    #[error("participation of {output_id} cannot end at {end} before starting at {start}")]
    InvalidParticipationEnd {
        /// The output.
        output_id: OutputId,
        /// Start milestone.
        start: MilestoneIndex,
        /// Requested end milestone.
        end: MilestoneIndex,
    },

    /// A participation must carry tokens.
    #[error("participation amount must be non-zero")]
    ZeroAmount,

    /// A balance computation overflowed `u64`.
    #[error("balance overflow for event {0}")]
    Overflow(EventId),

    /// Reading or writing a ledger state file failed.
    #[error("ledger state I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A ledger state document could not be parsed or produced.
    #[error("ledger state JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
