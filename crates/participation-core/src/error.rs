//! Error types for snapshot aggregation.
//!
//! Aggregation is fail-fast: the first provider failure aborts the call and
//! no partial [`Snapshot`](crate::Snapshot) is ever returned. The provider's
//! error is kept intact as the `source` of the variant.

use participation_types::EventId;
use tokio::task::JoinError;

use crate::provider::ProviderError;

/// Which balance query failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceQueryKind {
    /// Current balance of a ballot answer.
    CurrentBallotAnswer {
        /// Question index within the ballot.
        question_index: u8,
        /// Answer value within the question.
        answer_value: u8,
    },
    /// Accumulated balance of a ballot answer.
    AccumulatedBallotAnswer {
        /// Question index within the ballot.
        question_index: u8,
        /// Answer value within the question.
        answer_value: u8,
    },
    /// Current staking reward rate.
    StakingRewardRate,
    /// Total staking participation.
    StakingParticipation,
}

impl core::fmt::Display for BalanceQueryKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::CurrentBallotAnswer {
                question_index,
                answer_value,
            } => write!(f, "current balance of question {question_index} answer {answer_value}"),
            Self::AccumulatedBallotAnswer {
                question_index,
                answer_value,
            } => write!(
                f,
                "accumulated balance of question {question_index} answer {answer_value}"
            ),
            Self::StakingRewardRate => f.write_str("staking reward rate"),
            Self::StakingParticipation => f.write_str("staking participation"),
        }
    }
}

/// Errors that abort an aggregation.
#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    /// The current milestone index could not be read.
    #[error("failed to read ledger index: {0}")]
    LedgerRead(#[source] ProviderError),

    /// The event set could not be read.
    #[error("failed to read event registry: {0}")]
    RegistryRead(#[source] ProviderError),

    /// A balance query for one event failed.
    #[error("{query} query failed for event {event_id}: {source}")]
    BalanceQuery {
        /// The event being tallied.
        event_id: EventId,
        /// Which query failed.
        query: BalanceQueryKind,
        /// The provider error.
        #[source]
        source: ProviderError,
    },

    /// A ballot has more questions than a question index can address.
    #[error("event {event_id} has {count} questions, more than a ballot can index")]
    TooManyQuestions {
        /// The ballot event.
        event_id: EventId,
        /// Number of questions the registry returned.
        count: usize,
    },

    /// The aggregation task panicked or was cancelled.
    #[error("aggregation task aborted: {0}")]
    Aborted(#[source] JoinError),
}
