//! The participation ledger: event registry, ledger index, and participation
//! records, with point-in-time balance queries.
//!
//! # Design
//!
//! - **Pending-only mutation**: participations are opened and closed at
//!   milestones above the ledger index, so applied history never changes.
//! - **Computed balances**: nothing is pre-aggregated. Every query walks the
//!   event's participations and derives the figure for the requested
//!   milestone, which keeps the per-milestone view exact.
//! - **Checked arithmetic**: every sum and product is checked and reports
//!   [`LedgerError::Overflow`] instead of wrapping.

use std::collections::BTreeMap;

use participation_core::{
    BalanceQuery, EventRegistry, LedgerPosition, ProviderError, StakingParticipation,
};
use participation_types::{
    Event, EventId, EventPayload, EventStatus, MilestoneIndex, OutputId, Staking,
};
use tracing::debug;

use crate::participation::{Participation, ParticipationParams};
use crate::LedgerError;

/// Event registry plus participation index for one ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParticipationLedger {
    /// Last applied milestone.
    ledger_index: MilestoneIndex,
    /// Registered events.
    events: BTreeMap<EventId, Event>,
    /// Participations grouped by event, then by output.
    participations: BTreeMap<EventId, BTreeMap<OutputId, Participation>>,
}

impl ParticipationLedger {
    /// Create an empty ledger positioned at `ledger_index`.
    pub const fn new(ledger_index: MilestoneIndex) -> Self {
        Self {
            ledger_index,
            events: BTreeMap::new(),
            participations: BTreeMap::new(),
        }
    }

    /// The last applied milestone.
    pub const fn ledger_index(&self) -> MilestoneIndex {
        self.ledger_index
    }

    /// All registered events.
    pub const fn events(&self) -> &BTreeMap<EventId, Event> {
        &self.events
    }

    /// Look up one event.
    pub fn event(&self, event_id: &EventId) -> Option<&Event> {
        self.events.get(event_id)
    }

    /// Participations recorded for one event, ordered by output id.
    pub fn participations(&self, event_id: &EventId) -> impl Iterator<Item = &Participation> {
        self.participations
            .get(event_id)
            .into_iter()
            .flat_map(BTreeMap::values)
    }

    /// Total number of participation records across all events.
    pub fn participation_count(&self) -> usize {
        self.participations.values().map(BTreeMap::len).sum()
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Advance the ledger to milestone `index`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::MilestoneAlreadyApplied`] if `index` is not
    /// above the current ledger index.
    pub fn apply_milestone(&mut self, index: MilestoneIndex) -> Result<(), LedgerError> {
        self.check_pending(index)?;
        self.ledger_index = index;
        debug!(ledger_index = index, "milestone applied");
        Ok(())
    }

    /// Register a new event.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::EventExists`] for a duplicate id or
    /// [`LedgerError::InvalidEvent`] if the definition fails validation.
    pub fn add_event(&mut self, event_id: EventId, event: Event) -> Result<(), LedgerError> {
        if self.events.contains_key(&event_id) {
            return Err(LedgerError::EventExists(event_id));
        }
        event
            .validate()
            .map_err(|source| LedgerError::InvalidEvent { event_id, source })?;

        debug!(%event_id, name = %event.name, "event added");
        self.events.insert(event_id, event);
        Ok(())
    }

    /// Remove an event together with all its participations.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::EventNotFound`] if the event is unknown.
    pub fn remove_event(&mut self, event_id: &EventId) -> Result<Event, LedgerError> {
        let event = self
            .events
            .remove(event_id)
            .ok_or(LedgerError::EventNotFound(*event_id))?;
        let dropped = self
            .participations
            .remove(event_id)
            .map_or(0, |outputs| outputs.len());
        debug!(%event_id, dropped_participations = dropped, "event removed");
        Ok(event)
    }

    /// Open a participation booked at a pending milestone.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] if the milestone is already applied, the
    /// event does not accept participations at that milestone, the answers
    /// do not fit the ballot, or the output already participates.
    pub fn start_participation(&mut self, params: ParticipationParams) -> Result<(), LedgerError> {
        self.check_pending(params.milestone)?;
        self.insert_participation(Participation {
            output_id: params.output_id,
            event_id: params.event_id,
            amount: params.amount,
            answers: params.answers,
            start_milestone: params.milestone,
            end_milestone: None,
        })
    }

    /// Close every open participation of `output_id` at a pending milestone.
    ///
    /// Returns the number of participations closed.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::ParticipationNotFound`] if the output has no
    /// open participation, or [`LedgerError::InvalidParticipationEnd`] if
    /// one of them started at or after `milestone`. Nothing is changed on
    /// error.
    pub fn end_participation(
        &mut self,
        output_id: &OutputId,
        milestone: MilestoneIndex,
    ) -> Result<usize, LedgerError> {
        self.check_pending(milestone)?;

        let mut open = 0_usize;
        let open_participations = self
            .participations
            .values()
            .filter_map(|outputs| outputs.get(output_id))
            .filter(|p| p.end_milestone.is_none());
        for p in open_participations {
            if p.start_milestone >= milestone {
                return Err(LedgerError::InvalidParticipationEnd {
                    output_id: *output_id,
                    start: p.start_milestone,
                    end: milestone,
                });
            }
            open = open.saturating_add(1);
        }
        if open == 0 {
            return Err(LedgerError::ParticipationNotFound(*output_id));
        }

        self.participations
            .values_mut()
            .filter_map(|outputs| outputs.get_mut(output_id))
            .filter(|p| p.end_milestone.is_none())
            .for_each(|p| p.end_milestone = Some(milestone));
        debug!(%output_id, milestone, closed = open, "participation ended");
        Ok(open)
    }

    /// Validate and store a participation record without the pending
    /// milestone check. Used when restoring history.
    pub(crate) fn insert_participation(
        &mut self,
        participation: Participation,
    ) -> Result<(), LedgerError> {
        self.validate_participation(&participation)?;

        let outputs = self
            .participations
            .entry(participation.event_id)
            .or_default();
        if outputs.contains_key(&participation.output_id) {
            return Err(LedgerError::ParticipationExists {
                output_id: participation.output_id,
                event_id: participation.event_id,
            });
        }

        debug!(
            output_id = %participation.output_id,
            event_id = %participation.event_id,
            amount = participation.amount,
            milestone = participation.start_milestone,
            "participation started"
        );
        outputs.insert(participation.output_id, participation);
        Ok(())
    }

    fn validate_participation(&self, participation: &Participation) -> Result<(), LedgerError> {
        let event_id = participation.event_id;
        let event = self
            .events
            .get(&event_id)
            .ok_or(LedgerError::EventNotFound(event_id))?;

        if participation.amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }

        let status = event.status(participation.start_milestone);
        if !status.accepts_participation() {
            return Err(LedgerError::NotAcceptingParticipation { event_id, status });
        }

        if let Some(end) = participation.end_milestone {
            if end <= participation.start_milestone {
                return Err(LedgerError::InvalidParticipationEnd {
                    output_id: participation.output_id,
                    start: participation.start_milestone,
                    end,
                });
            }
        }

        match &event.payload {
            EventPayload::Ballot(ballot) => {
                if participation.answers.len() != ballot.questions.len() {
                    return Err(LedgerError::AnswerCountMismatch {
                        event_id,
                        expected: ballot.questions.len(),
                        actual: participation.answers.len(),
                    });
                }
                for ((question_index, question), answer_value) in
                    (0..=u8::MAX).zip(&ballot.questions).zip(&participation.answers)
                {
                    if question.answer(*answer_value).is_none() {
                        return Err(LedgerError::AnswerNotFound {
                            event_id,
                            question_index,
                            answer_value: *answer_value,
                        });
                    }
                }
                Ok(())
            }
            EventPayload::Staking(_) => Ok(()),
            EventPayload::Unrecognized { .. } => Err(LedgerError::WrongEventKind {
                event_id,
                expected: "ballot or staking",
            }),
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Tokens voting for an answer at milestone `index`.
    ///
    /// Only counted while the event is commencing or holding.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] if the milestone is out of range, the event
    /// is not a ballot, or the question or answer does not exist.
    pub fn current_answer_balance(
        &self,
        event_id: &EventId,
        index: MilestoneIndex,
        question_index: u8,
        answer_value: u8,
    ) -> Result<u64, LedgerError> {
        self.check_milestone(index)?;
        let event = self.ballot_answer(event_id, question_index, answer_value)?;
        if !event.status(index).accepts_participation() {
            return Ok(0);
        }

        checked_sum(
            event_id,
            self.participations(event_id)
                .filter(|p| p.is_active_at(index))
                .filter(|p| p.answer_for(question_index) == Some(answer_value))
                .map(|p| Some(p.amount)),
        )
    }

    /// Tokens accumulated for an answer over every holding milestone up to
    /// and including `index`.
    ///
    /// # Errors
    ///
    /// Same as [`current_answer_balance`](Self::current_answer_balance).
    pub fn accumulated_answer_balance(
        &self,
        event_id: &EventId,
        index: MilestoneIndex,
        question_index: u8,
        answer_value: u8,
    ) -> Result<u64, LedgerError> {
        self.check_milestone(index)?;
        let event = self.ballot_answer(event_id, question_index, answer_value)?;

        checked_sum(
            event_id,
            self.participations(event_id)
                .filter(|p| p.answer_for(question_index) == Some(answer_value))
                .map(|p| {
                    let milestones =
                        event.holding_milestones(p.start_milestone, p.covered_until(index));
                    p.amount.checked_mul(u64::from(milestones))
                }),
        )
    }

    /// Rewards paid out per milestone for a staking event at `index`.
    ///
    /// Zero outside the holding phase.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] if the milestone is out of range or the event
    /// is not a staking event.
    pub fn staking_reward_rate(
        &self,
        event_id: &EventId,
        index: MilestoneIndex,
    ) -> Result<u64, LedgerError> {
        self.check_milestone(index)?;
        let (event, staking) = self.staking_event(event_id)?;
        if event.status(index) != EventStatus::Holding {
            return Ok(0);
        }

        checked_sum(
            event_id,
            self.participations(event_id)
                .filter(|p| p.is_active_at(index))
                .map(|p| staking.rewards_per_milestone(p.amount)),
        )
    }

    /// Staked tokens and accumulated rewards of a staking event at `index`.
    ///
    /// # Errors
    ///
    /// Same as [`staking_reward_rate`](Self::staking_reward_rate).
    pub fn staking_participation(
        &self,
        event_id: &EventId,
        index: MilestoneIndex,
    ) -> Result<StakingParticipation, LedgerError> {
        self.check_milestone(index)?;
        let (event, staking) = self.staking_event(event_id)?;

        let staked = if event.status(index).accepts_participation() {
            checked_sum(
                event_id,
                self.participations(event_id)
                    .filter(|p| p.is_active_at(index))
                    .map(|p| Some(p.amount)),
            )?
        } else {
            0
        };

        let rewarded = checked_sum(
            event_id,
            self.participations(event_id).map(|p| {
                let milestones =
                    event.holding_milestones(p.start_milestone, p.covered_until(index));
                staking
                    .rewards_per_milestone(p.amount)?
                    .checked_mul(u64::from(milestones))
            }),
        )?;

        Ok(StakingParticipation { staked, rewarded })
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn check_milestone(&self, index: MilestoneIndex) -> Result<(), LedgerError> {
        if index > self.ledger_index {
            return Err(LedgerError::MilestoneOutOfRange {
                requested: index,
                ledger_index: self.ledger_index,
            });
        }
        Ok(())
    }

    fn check_pending(&self, milestone: MilestoneIndex) -> Result<(), LedgerError> {
        if milestone <= self.ledger_index {
            return Err(LedgerError::MilestoneAlreadyApplied {
                milestone,
                ledger_index: self.ledger_index,
            });
        }
        Ok(())
    }

    fn ballot_answer(
        &self,
        event_id: &EventId,
        question_index: u8,
        answer_value: u8,
    ) -> Result<&Event, LedgerError> {
        let event = self
            .events
            .get(event_id)
            .ok_or(LedgerError::EventNotFound(*event_id))?;
        let EventPayload::Ballot(ballot) = &event.payload else {
            return Err(LedgerError::WrongEventKind {
                event_id: *event_id,
                expected: "ballot",
            });
        };
        let question = ballot
            .questions
            .get(usize::from(question_index))
            .ok_or(LedgerError::QuestionNotFound {
                event_id: *event_id,
                question_index,
            })?;
        if question.answer(answer_value).is_none() {
            return Err(LedgerError::AnswerNotFound {
                event_id: *event_id,
                question_index,
                answer_value,
            });
        }
        Ok(event)
    }

    fn staking_event(&self, event_id: &EventId) -> Result<(&Event, &Staking), LedgerError> {
        let event = self
            .events
            .get(event_id)
            .ok_or(LedgerError::EventNotFound(*event_id))?;
        let staking = event.staking().ok_or(LedgerError::WrongEventKind {
            event_id: *event_id,
            expected: "staking",
        })?;
        Ok((event, staking))
    }
}

/// Sum optional terms, where `None` marks a term that already overflowed.
fn checked_sum<I>(event_id: &EventId, terms: I) -> Result<u64, LedgerError>
where
    I: IntoIterator<Item = Option<u64>>,
{
    terms.into_iter().try_fold(0_u64, |acc, term| {
        term.and_then(|t| acc.checked_add(t))
            .ok_or(LedgerError::Overflow(*event_id))
    })
}

// ---------------------------------------------------------------------------
// Provider capabilities
// ---------------------------------------------------------------------------

impl LedgerPosition for ParticipationLedger {
    fn ledger_index(&self) -> Result<MilestoneIndex, ProviderError> {
        Ok(self.ledger_index)
    }
}

impl EventRegistry for ParticipationLedger {
    fn events(&self) -> Result<BTreeMap<EventId, Event>, ProviderError> {
        Ok(self.events.clone())
    }
}

impl BalanceQuery for ParticipationLedger {
    fn current_ballot_answer_balance(
        &self,
        event_id: &EventId,
        milestone: MilestoneIndex,
        question_index: u8,
        answer_value: u8,
    ) -> Result<u64, ProviderError> {
        Ok(self.current_answer_balance(event_id, milestone, question_index, answer_value)?)
    }

    fn accumulated_ballot_answer_balance(
        &self,
        event_id: &EventId,
        milestone: MilestoneIndex,
        question_index: u8,
        answer_value: u8,
    ) -> Result<u64, ProviderError> {
        Ok(self.accumulated_answer_balance(event_id, milestone, question_index, answer_value)?)
    }

    fn current_staking_reward_rate(
        &self,
        event_id: &EventId,
        milestone: MilestoneIndex,
    ) -> Result<u64, ProviderError> {
        Ok(self.staking_reward_rate(event_id, milestone)?)
    }

    fn total_staking_participation(
        &self,
        event_id: &EventId,
        milestone: MilestoneIndex,
    ) -> Result<StakingParticipation, ProviderError> {
        Ok(self.staking_participation(event_id, milestone)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use participation_types::{Answer, Ballot, Question};

    use super::*;

    fn ballot_id() -> EventId {
        EventId::new([1; 32])
    }

    fn staking_id() -> EventId {
        EventId::new([2; 32])
    }

    fn output(byte: u8) -> OutputId {
        OutputId::new([byte; 34])
    }

    fn yes_no() -> Question {
        Question {
            text: String::from("Accept?"),
            answers: [0_u8, 1]
                .iter()
                .map(|v| Answer {
                    value: *v,
                    text: v.to_string(),
                    additional_info: String::new(),
                })
                .collect(),
            additional_info: String::new(),
        }
    }

    /// Ballot and staking events scheduled commence 10, start 20, end 30.
    fn ledger() -> ParticipationLedger {
        let mut ledger = ParticipationLedger::new(9);
        let ballot = Event::new(
            "Vote",
            10,
            20,
            30,
            EventPayload::Ballot(Ballot {
                questions: vec![yes_no()],
            }),
        )
        .unwrap();
        let staking = Event::new(
            "Stake",
            10,
            20,
            30,
            EventPayload::Staking(Staking {
                text: String::from("Stake"),
                symbol: String::from("EXP"),
                numerator: 1,
                denominator: 10,
                required_minimum_rewards: 0,
                additional_info: String::new(),
            }),
        )
        .unwrap();
        ledger.add_event(ballot_id(), ballot).unwrap();
        ledger.add_event(staking_id(), staking).unwrap();
        ledger
    }

    fn vote(output_id: OutputId, amount: u64, answer: u8, milestone: u32) -> ParticipationParams {
        ParticipationParams {
            output_id,
            event_id: ballot_id(),
            amount,
            answers: vec![answer],
            milestone,
        }
    }

    fn stake(output_id: OutputId, amount: u64, milestone: u32) -> ParticipationParams {
        ParticipationParams {
            output_id,
            event_id: staking_id(),
            amount,
            answers: Vec::new(),
            milestone,
        }
    }

    /// Votes at 12 (100 for yes) and 15 (50 for no), ledger advanced to 25.
    fn voted_ledger() -> ParticipationLedger {
        let mut ledger = ledger();
        ledger.apply_milestone(11).unwrap();
        ledger.start_participation(vote(output(1), 100, 1, 12)).unwrap();
        ledger.start_participation(stake(output(3), 1_000, 12)).unwrap();
        ledger.apply_milestone(14).unwrap();
        ledger.start_participation(vote(output(2), 50, 0, 15)).unwrap();
        ledger.apply_milestone(25).unwrap();
        ledger
    }

    #[test]
    fn current_balance_counts_active_votes_per_answer() {
        let ledger = voted_ledger();
        let id = ballot_id();
        assert_eq!(ledger.current_answer_balance(&id, 25, 0, 1).unwrap(), 100);
        assert_eq!(ledger.current_answer_balance(&id, 25, 0, 0).unwrap(), 50);
        assert_eq!(ledger.current_answer_balance(&id, 13, 0, 0).unwrap(), 0);
        assert_eq!(ledger.current_answer_balance(&id, 9, 0, 1).unwrap(), 0);
    }

    #[test]
    fn accumulated_balance_counts_holding_milestones_only() {
        let ledger = voted_ledger();
        let id = ballot_id();
        assert_eq!(ledger.accumulated_answer_balance(&id, 15, 0, 1).unwrap(), 0);
        assert_eq!(ledger.accumulated_answer_balance(&id, 20, 0, 1).unwrap(), 100);
        assert_eq!(ledger.accumulated_answer_balance(&id, 25, 0, 1).unwrap(), 600);
        assert_eq!(ledger.accumulated_answer_balance(&id, 25, 0, 0).unwrap(), 300);
    }

    #[test]
    fn ended_participation_stops_accumulating_but_history_is_stable() {
        let mut ledger = voted_ledger();
        let id = ballot_id();
        let before = ledger.accumulated_answer_balance(&id, 25, 0, 1).unwrap();

        assert_eq!(ledger.end_participation(&output(1), 27).unwrap(), 1);
        ledger.apply_milestone(35).unwrap();

        assert_eq!(ledger.accumulated_answer_balance(&id, 25, 0, 1).unwrap(), before);
        assert_eq!(ledger.current_answer_balance(&id, 25, 0, 1).unwrap(), 100);
        assert_eq!(ledger.current_answer_balance(&id, 27, 0, 1).unwrap(), 0);
        assert_eq!(ledger.accumulated_answer_balance(&id, 35, 0, 1).unwrap(), 700);
        assert_eq!(ledger.accumulated_answer_balance(&id, 35, 0, 0).unwrap(), 500);
        assert_eq!(ledger.current_answer_balance(&id, 35, 0, 0).unwrap(), 0);
    }

    #[test]
    fn staking_rate_and_totals_follow_the_schedule() {
        let mut ledger = voted_ledger();
        let id = staking_id();

        assert_eq!(ledger.staking_reward_rate(&id, 15).unwrap(), 0);
        assert_eq!(
            ledger.staking_participation(&id, 15).unwrap(),
            StakingParticipation {
                staked: 1_000,
                rewarded: 0
            }
        );

        assert_eq!(ledger.staking_reward_rate(&id, 25).unwrap(), 100);
        assert_eq!(
            ledger.staking_participation(&id, 25).unwrap(),
            StakingParticipation {
                staked: 1_000,
                rewarded: 600
            }
        );

        ledger.apply_milestone(35).unwrap();
        assert_eq!(ledger.staking_reward_rate(&id, 35).unwrap(), 0);
        assert_eq!(
            ledger.staking_participation(&id, 35).unwrap(),
            StakingParticipation {
                staked: 0,
                rewarded: 1_000
            }
        );
    }

    #[test]
    fn queries_reject_unindexed_targets() {
        let ledger = voted_ledger();
        let id = ballot_id();

        assert!(matches!(
            ledger.current_answer_balance(&id, 26, 0, 1),
            Err(LedgerError::MilestoneOutOfRange {
                requested: 26,
                ledger_index: 25
            })
        ));
        assert!(matches!(
            ledger.current_answer_balance(&id, 25, 3, 1),
            Err(LedgerError::QuestionNotFound { .. })
        ));
        assert!(matches!(
            ledger.accumulated_answer_balance(&id, 25, 0, 9),
            Err(LedgerError::AnswerNotFound { .. })
        ));
        assert!(matches!(
            ledger.staking_reward_rate(&id, 25),
            Err(LedgerError::WrongEventKind { .. })
        ));
        assert!(matches!(
            ledger.staking_participation(&EventId::new([9; 32]), 25),
            Err(LedgerError::EventNotFound(_))
        ));
    }

    #[test]
    fn participation_must_target_a_pending_milestone() {
        let mut ledger = voted_ledger();
        assert!(matches!(
            ledger.start_participation(vote(output(7), 10, 1, 25)),
            Err(LedgerError::MilestoneAlreadyApplied { .. })
        ));
        assert!(matches!(
            ledger.end_participation(&output(1), 20),
            Err(LedgerError::MilestoneAlreadyApplied { .. })
        ));
        assert!(matches!(
            ledger.apply_milestone(25),
            Err(LedgerError::MilestoneAlreadyApplied { .. })
        ));
    }

    #[test]
    fn participation_is_validated_against_the_event() {
        let mut ledger = ledger();

        // Milestone 10 is the first commencing milestone.
        assert!(ledger.start_participation(vote(output(1), 10, 1, 10)).is_ok());
        assert!(matches!(
            ledger.start_participation(vote(output(1), 10, 0, 11)),
            Err(LedgerError::ParticipationExists { .. })
        ));
        assert!(matches!(
            ledger.start_participation(vote(output(2), 10, 5, 11)),
            Err(LedgerError::AnswerNotFound { .. })
        ));
        assert!(matches!(
            ledger.start_participation(ParticipationParams {
                answers: vec![0, 1],
                ..vote(output(3), 10, 0, 11)
            }),
            Err(LedgerError::AnswerCountMismatch {
                expected: 1,
                actual: 2,
                ..
            })
        ));
        assert!(matches!(
            ledger.start_participation(vote(output(4), 0, 1, 11)),
            Err(LedgerError::ZeroAmount)
        ));
        assert!(matches!(
            ledger.start_participation(vote(output(5), 10, 1, 30)),
            Err(LedgerError::NotAcceptingParticipation {
                status: EventStatus::Ended,
                ..
            })
        ));
    }

    #[test]
    fn end_participation_closes_every_event_of_the_output() {
        let mut ledger = ledger();
        ledger.start_participation(vote(output(1), 10, 1, 12)).unwrap();
        ledger.start_participation(stake(output(1), 10, 12)).unwrap();

        assert!(matches!(
            ledger.end_participation(&output(1), 12),
            Err(LedgerError::InvalidParticipationEnd { .. })
        ));
        assert_eq!(ledger.end_participation(&output(1), 13).unwrap(), 2);
        assert!(matches!(
            ledger.end_participation(&output(1), 14),
            Err(LedgerError::ParticipationNotFound(_))
        ));
    }

    #[test]
    fn remove_event_drops_its_participations() {
        let mut ledger = voted_ledger();
        assert_eq!(ledger.participation_count(), 3);

        let removed = ledger.remove_event(&ballot_id()).unwrap();
        assert_eq!(removed.name, "Vote");
        assert_eq!(ledger.participation_count(), 1);
        assert!(ledger.event(&ballot_id()).is_none());
        assert!(matches!(
            ledger.remove_event(&ballot_id()),
            Err(LedgerError::EventNotFound(_))
        ));
    }

    #[test]
    fn duplicate_and_invalid_events_are_rejected() {
        let mut ledger = ledger();
        let event = ledger.event(&ballot_id()).cloned().unwrap();
        assert!(matches!(
            ledger.add_event(ballot_id(), event.clone()),
            Err(LedgerError::EventExists(_))
        ));

        let mut broken = event;
        broken.milestone_index_end = broken.milestone_index_start;
        assert!(matches!(
            ledger.add_event(EventId::new([5; 32]), broken),
            Err(LedgerError::InvalidEvent { .. })
        ));
    }

    #[test]
    fn overflow_is_reported() {
        let mut ledger = ledger();
        ledger.start_participation(vote(output(1), u64::MAX, 1, 12)).unwrap();
        ledger.start_participation(vote(output(2), 1, 1, 12)).unwrap();
        ledger.apply_milestone(25).unwrap();

        assert!(matches!(
            ledger.current_answer_balance(&ballot_id(), 25, 0, 1),
            Err(LedgerError::Overflow(_))
        ));
    }
}
