//! Snapshot aggregation for participation events.
//!
//! Given the current ledger position and a registry of participation
//! events, this crate derives one coherent [`Snapshot`] of per-event and
//! per-answer tallies. Every figure in a snapshot is computed against the
//! same milestone index, read once at the start of aggregation.
//!
//! # Modules
//!
//! - [`provider`] -- The capabilities consumed from the ledger indexer:
//!   [`LedgerPosition`], [`EventRegistry`], and [`BalanceQuery`].
//! - [`snapshot`] -- The immutable [`Snapshot`] result and its tallies.
//! - [`aggregate`] -- The aggregation algorithm over a locked source.
//! - [`manager`] -- [`ParticipationManager`], the single lock that makes
//!   aggregation atomic with respect to ledger mutation.
//! - [`error`] -- [`AggregateError`].
//!
//! # Consistency
//!
//! The manager holds one exclusive lock over the ledger state for the whole
//! aggregation, including every balance query. Writers that advance the
//! ledger take the same lock, so a snapshot never mixes two milestones or
//! an event set that changed mid-computation.

pub mod aggregate;
pub mod error;
pub mod manager;
pub mod provider;
pub mod snapshot;

// Re-export primary types at crate root.
pub use aggregate::aggregate;
pub use error::{AggregateError, BalanceQueryKind};
pub use manager::ParticipationManager;
pub use provider::{
    BalanceQuery, EventRegistry, LedgerPosition, ParticipationSource, ProviderError,
    StakingParticipation,
};
pub use snapshot::{AnswerTally, BallotTally, EventStatusCounts, Snapshot, StakingTally};
