//! The aggregation algorithm.
//!
//! [`aggregate`] reads the ledger position and the event set exactly once,
//! then tallies every event against that single milestone index. It expects
//! to be called while the caller holds exclusive access to `source`; the
//! [`ParticipationManager`](crate::ParticipationManager) takes care of that.

use std::collections::BTreeMap;

use participation_types::{Ballot, Event, EventId, EventPayload, MilestoneIndex};

use crate::error::{AggregateError, BalanceQueryKind};
use crate::provider::{ParticipationSource, ProviderError};
use crate::snapshot::{AnswerTally, BallotTally, EventStatusCounts, Snapshot, StakingTally};

/// Compute a [`Snapshot`] of every event known to `source`.
///
/// Events are visited in registry order. Each one is counted under its
/// status at the current milestone; ballot and staking events additionally
/// get a tally. Events with an unrecognized payload only contribute to the
/// status counts.
///
/// # Errors
///
/// Returns the first failure encountered. No partial snapshot is produced.
pub fn aggregate<S>(source: &S) -> Result<Snapshot, AggregateError>
where
    S: ParticipationSource + ?Sized,
{
    let milestone = source.ledger_index().map_err(AggregateError::LedgerRead)?;
    let events = source.events().map_err(AggregateError::RegistryRead)?;

    let mut counts = EventStatusCounts::default();
    let mut staking = BTreeMap::new();
    let mut ballots = BTreeMap::new();

    for (event_id, event) in &events {
        counts.record(event.status(milestone));

        match &event.payload {
            EventPayload::Ballot(ballot) => {
                let tally = ballot_tally(source, event_id, event, ballot, milestone)?;
                ballots.insert(*event_id, tally);
            }
            EventPayload::Staking(_) => {
                let tally = staking_tally(source, event_id, event, milestone)?;
                staking.insert(*event_id, tally);
            }
            EventPayload::Unrecognized { .. } => {}
        }
    }

    Ok(Snapshot {
        milestone_index: milestone,
        events: counts,
        staking,
        ballots,
    })
}

fn ballot_tally<S>(
    source: &S,
    event_id: &EventId,
    event: &Event,
    ballot: &Ballot,
    milestone: MilestoneIndex,
) -> Result<BallotTally, AggregateError>
where
    S: ParticipationSource + ?Sized,
{
    let mut questions = Vec::with_capacity(ballot.questions.len());

    for (index, question) in ballot.questions.iter().enumerate() {
        let Ok(question_index) = u8::try_from(index) else {
            return Err(AggregateError::TooManyQuestions {
                event_id: *event_id,
                count: ballot.questions.len(),
            });
        };

        let mut answers = BTreeMap::new();
        for answer in &question.answers {
            let answer_value = answer.value;

            let current_query = BalanceQueryKind::CurrentBallotAnswer {
                question_index,
                answer_value,
            };
            let current = source
                .current_ballot_answer_balance(event_id, milestone, question_index, answer_value)
                .map_err(query_failed(*event_id, current_query))?;

            let accumulated_query = BalanceQueryKind::AccumulatedBallotAnswer {
                question_index,
                answer_value,
            };
            let accumulated = source
                .accumulated_ballot_answer_balance(
                    event_id,
                    milestone,
                    question_index,
                    answer_value,
                )
                .map_err(query_failed(*event_id, accumulated_query))?;

            answers.insert(
                answer_value,
                AnswerTally {
                    current,
                    accumulated,
                },
            );
        }
        questions.push(answers);
    }

    Ok(BallotTally {
        event_name: event.name.clone(),
        questions,
    })
}

fn staking_tally<S>(
    source: &S,
    event_id: &EventId,
    event: &Event,
    milestone: MilestoneIndex,
) -> Result<StakingTally, AggregateError>
where
    S: ParticipationSource + ?Sized,
{
    let current = source
        .current_staking_reward_rate(event_id, milestone)
        .map_err(query_failed(*event_id, BalanceQueryKind::StakingRewardRate))?;
    let participation = source
        .total_staking_participation(event_id, milestone)
        .map_err(query_failed(*event_id, BalanceQueryKind::StakingParticipation))?;

    Ok(StakingTally {
        event_name: event.name.clone(),
        current,
        per_milestone: participation.staked,
        accumulated: participation.rewarded,
    })
}

/// Attach event and query context to a provider error.
fn query_failed(
    event_id: EventId,
    query: BalanceQueryKind,
) -> impl FnOnce(ProviderError) -> AggregateError {
    move |source| AggregateError::BalanceQuery {
        event_id,
        query,
        source,
    }
}
