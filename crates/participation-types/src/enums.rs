//! Enumeration types for participation events.

use serde::{Deserialize, Serialize};

/// Lifecycle phase of a participation event at a given milestone.
///
/// The status is never stored. It is derived from the event's milestone
/// schedule via [`Event::status`](crate::Event::status) every time it is
/// needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    /// The commencing milestone has not been reached yet.
    Upcoming,
    /// Participations are accepted but not yet counted toward accumulated
    /// totals.
    Commencing,
    /// The event is live and participations accumulate every milestone.
    Holding,
    /// The end milestone has been reached.
    Ended,
}

impl EventStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [Self; 4] = [Self::Upcoming, Self::Commencing, Self::Holding, Self::Ended];

    /// The label used for this status in exported metrics and JSON.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Upcoming => "upcoming",
            Self::Commencing => "commencing",
            Self::Holding => "holding",
            Self::Ended => "ended",
        }
    }

    /// Whether new participations are accepted in this phase.
    pub const fn accepts_participation(self) -> bool {
        matches!(self, Self::Commencing | Self::Holding)
    }
}

impl core::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_match_serde_names() {
        for status in EventStatus::ALL {
            let json = serde_json::to_string(&status).unwrap_or_default();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }

    #[test]
    fn only_commencing_and_holding_accept_participation() {
        assert!(!EventStatus::Upcoming.accepts_participation());
        assert!(EventStatus::Commencing.accepts_participation());
        assert!(EventStatus::Holding.accepts_participation());
        assert!(!EventStatus::Ended.accepts_participation());
    }
}
