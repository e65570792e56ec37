//! Shared type definitions for participation event tracking.
//!
//! This crate is the single source of truth for the domain types used
//! across the workspace: identifiers, the participation event model, and
//! the milestone-derived event status.
//!
//! # Modules
//!
//! - [`ids`] -- Fixed-width, hex-encoded identifiers ([`EventId`], [`OutputId`])
//! - [`enums`] -- Enumeration types ([`EventStatus`])
//! - [`event`] -- The [`Event`] model with its [`EventPayload`] sum type

pub mod enums;
pub mod event;
pub mod ids;

// Re-export all public types at crate root for convenience.
pub use enums::EventStatus;
pub use event::{Answer, Ballot, Event, EventError, EventPayload, Question, Staking};
pub use ids::{EventId, IdError, MilestoneIndex, OutputId};
