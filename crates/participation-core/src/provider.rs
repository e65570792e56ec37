//! Capabilities consumed from the ledger indexing subsystem.
//!
//! The aggregator treats the indexer as a black box reached through three
//! traits. Each query is parameterized by an explicit milestone index so
//! the caller decides which point in time is observed.

use std::collections::BTreeMap;

use participation_types::{Event, EventId, MilestoneIndex};
use serde::{Deserialize, Serialize};

/// Error type returned by provider implementations.
///
/// Providers keep their own typed errors; the aggregator only carries them
/// through as the source of an [`AggregateError`](crate::AggregateError).
pub type ProviderError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Total staking participation of one event at a milestone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingParticipation {
    /// Tokens staked at the milestone.
    pub staked: u64,
    /// Rewards accumulated up to and including the milestone.
    pub rewarded: u64,
}

/// Read access to the current ledger position.
pub trait LedgerPosition {
    /// The milestone index the ledger has been indexed up to.
    ///
    /// # Errors
    ///
    /// Returns an error if the position is unavailable.
    fn ledger_index(&self) -> Result<MilestoneIndex, ProviderError>;
}

/// Read access to the set of known participation events.
pub trait EventRegistry {
    /// All known events keyed by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the event set cannot be read.
    fn events(&self) -> Result<BTreeMap<EventId, Event>, ProviderError>;
}

/// Point-in-time balance lookups.
///
/// Every method fails if the event, question, or answer is not indexed, or
/// if `milestone` lies outside the indexed range.
pub trait BalanceQuery {
    /// Tokens currently voting for `answer_value` of question
    /// `question_index`.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    fn current_ballot_answer_balance(
        &self,
        event_id: &EventId,
        milestone: MilestoneIndex,
        question_index: u8,
        answer_value: u8,
    ) -> Result<u64, ProviderError>;

    /// Tokens accumulated for `answer_value` of question `question_index`
    /// over the holding milestones up to `milestone`.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    fn accumulated_ballot_answer_balance(
        &self,
        event_id: &EventId,
        milestone: MilestoneIndex,
        question_index: u8,
        answer_value: u8,
    ) -> Result<u64, ProviderError>;

    /// Rewards currently paid out per milestone for a staking event.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    fn current_staking_reward_rate(
        &self,
        event_id: &EventId,
        milestone: MilestoneIndex,
    ) -> Result<u64, ProviderError>;

    /// Staked and rewarded totals for a staking event.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    fn total_staking_participation(
        &self,
        event_id: &EventId,
        milestone: MilestoneIndex,
    ) -> Result<StakingParticipation, ProviderError>;
}

/// Everything the aggregator needs from one locked source.
pub trait ParticipationSource: LedgerPosition + EventRegistry + BalanceQuery {}

impl<T> ParticipationSource for T where T: LedgerPosition + EventRegistry + BalanceQuery {}
