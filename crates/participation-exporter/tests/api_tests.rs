//! Integration tests for the scrape endpoint.
//!
//! Tests drive the Axum `Router` directly via `tower::ServiceExt` without
//! starting a TCP server, except for the startup test which binds an
//! ephemeral port.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use participation_core::{
    BalanceQuery, EventRegistry, LedgerPosition, ParticipationManager, ProviderError,
    StakingParticipation,
};
use participation_exporter::{build_router, spawn_exporter, AppState, PrometheusConfig};
use participation_ledger::{ParticipationLedger, ParticipationParams};
use participation_types::{
    Answer, Ballot, Event, EventId, EventPayload, MilestoneIndex, OutputId, Question, Staking,
};
use tower::ServiceExt;

// =========================================================================
// Fixtures
// =========================================================================

/// A ledger whose reads can be switched to fail or to stall.
#[derive(Debug, Default)]
struct FlakyLedger {
    ledger: ParticipationLedger,
    failing: bool,
    delay: Option<Duration>,
}

impl FlakyLedger {
    fn check(&self) -> Result<(), ProviderError> {
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        if self.failing {
            return Err("ledger unavailable".into());
        }
        Ok(())
    }
}

impl LedgerPosition for FlakyLedger {
    fn ledger_index(&self) -> Result<MilestoneIndex, ProviderError> {
        self.check()?;
        LedgerPosition::ledger_index(&self.ledger)
    }
}

impl EventRegistry for FlakyLedger {
    fn events(&self) -> Result<BTreeMap<EventId, Event>, ProviderError> {
        self.check()?;
        EventRegistry::events(&self.ledger)
    }
}

impl BalanceQuery for FlakyLedger {
    fn current_ballot_answer_balance(
        &self,
        event_id: &EventId,
        milestone: MilestoneIndex,
        question_index: u8,
        answer_value: u8,
    ) -> Result<u64, ProviderError> {
        self.check()?;
        self.ledger
            .current_ballot_answer_balance(event_id, milestone, question_index, answer_value)
    }

    fn accumulated_ballot_answer_balance(
        &self,
        event_id: &EventId,
        milestone: MilestoneIndex,
        question_index: u8,
        answer_value: u8,
    ) -> Result<u64, ProviderError> {
        self.check()?;
        self.ledger
            .accumulated_ballot_answer_balance(event_id, milestone, question_index, answer_value)
    }

    fn current_staking_reward_rate(
        &self,
        event_id: &EventId,
        milestone: MilestoneIndex,
    ) -> Result<u64, ProviderError> {
        self.check()?;
        self.ledger.current_staking_reward_rate(event_id, milestone)
    }

    fn total_staking_participation(
        &self,
        event_id: &EventId,
        milestone: MilestoneIndex,
    ) -> Result<StakingParticipation, ProviderError> {
        self.check()?;
        self.ledger.total_staking_participation(event_id, milestone)
    }
}

fn ballot_id() -> EventId {
    EventId::new([1; 32])
}

fn staking_id() -> EventId {
    EventId::new([2; 32])
}

fn answer(value: u8, text: &str) -> Answer {
    Answer {
        value,
        text: String::from(text),
        additional_info: String::new(),
    }
}

fn stake() -> Staking {
    Staking {
        text: String::from("Stake"),
        symbol: String::from("EXP"),
        numerator: 1,
        denominator: 4,
        required_minimum_rewards: 0,
        additional_info: String::new(),
    }
}

/// Ballot and staking event, both holding from milestone 20, with one
/// participation each booked at milestone 20 and the ledger at 24.
fn populated_ledger() -> ParticipationLedger {
    let mut ledger = ParticipationLedger::new(10);

    let ballot = Ballot {
        questions: vec![Question {
            text: String::from("Fund it?"),
            answers: vec![answer(0, "No"), answer(1, "Yes")],
            additional_info: String::new(),
        }],
    };
    ledger
        .add_event(
            ballot_id(),
            Event::new("Treasury", 15, 20, 100, EventPayload::Ballot(ballot)).unwrap(),
        )
        .unwrap();
    ledger
        .add_event(
            staking_id(),
            Event::new("Airdrop", 15, 20, 100, EventPayload::Staking(stake())).unwrap(),
        )
        .unwrap();

    ledger
        .start_participation(ParticipationParams {
            output_id: OutputId::new([7; 34]),
            event_id: ballot_id(),
            amount: 50,
            answers: vec![1],
            milestone: 20,
        })
        .unwrap();
    ledger
        .start_participation(ParticipationParams {
            output_id: OutputId::new([7; 34]),
            event_id: staking_id(),
            amount: 80,
            answers: Vec::new(),
            milestone: 20,
        })
        .unwrap();
    ledger.apply_milestone(24).unwrap();
    ledger
}

/// `count` staking events holding from milestone 20, each with one
/// participation, and the ledger at 24.
fn crowded_ledger(count: u8) -> ParticipationLedger {
    let mut ledger = ParticipationLedger::new(10);
    for byte in 1..=count {
        let event_id = EventId::new([byte; 32]);
        ledger
            .add_event(
                event_id,
                Event::new(
                    format!("Stake {byte}"),
                    15,
                    20,
                    100,
                    EventPayload::Staking(stake()),
                )
                .unwrap(),
            )
            .unwrap();
        ledger
            .start_participation(ParticipationParams {
                output_id: OutputId::new([byte; 34]),
                event_id,
                amount: 40,
                answers: Vec::new(),
                milestone: 20,
            })
            .unwrap();
    }
    ledger.apply_milestone(24).unwrap();
    ledger
}

fn make_state(ledger: ParticipationLedger) -> AppState<FlakyLedger> {
    let manager = Arc::new(ParticipationManager::new(FlakyLedger {
        ledger,
        ..FlakyLedger::default()
    }));
    AppState::new(manager, &PrometheusConfig::default()).unwrap()
}

async fn scrape(state: &AppState<FlakyLedger>) -> (StatusCode, String, String) {
    let response = build_router(state.clone())
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get("content-type")
        .map(|v| v.to_str().unwrap().to_owned())
        .unwrap_or_default();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, content_type, String::from_utf8(bytes.to_vec()).unwrap())
}

/// Value of the first sample of `metric` whose labels contain every
/// `name="value"` fragment in `labels`.
fn sample(body: &str, metric: &str, labels: &[&str]) -> Option<i64> {
    body.lines()
        .filter(|line| !line.starts_with('#'))
        .filter(|line| {
            line.strip_prefix(metric)
                .is_some_and(|rest| rest.starts_with('{') || rest.starts_with(' '))
        })
        .find(|line| labels.iter().all(|label| line.contains(label)))
        .and_then(|line| line.rsplit(' ').next())
        .map(|value| value.parse().unwrap())
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_metrics_serves_participation_gauges() {
    let state = make_state(populated_ledger());
    let (status, content_type, body) = scrape(&state).await;

    assert_eq!(status, StatusCode::OK);
    assert!(content_type.starts_with("text/plain"));

    let ballot = format!("eventID=\"{}\"", ballot_id().to_hex());
    let staking = format!("eventID=\"{}\"", staking_id().to_hex());

    assert_eq!(
        sample(&body, "iota_participation_participation_events", &["status=\"holding\""]),
        Some(2)
    );
    assert_eq!(
        sample(&body, "iota_participation_participation_events", &["status=\"total\""]),
        Some(2)
    );
    assert_eq!(
        sample(&body, "iota_participation_participation_events", &["status=\"upcoming\""]),
        Some(0)
    );

    // 50 tokens for answer 1 over holding milestones 20..=24.
    assert_eq!(
        sample(
            &body,
            "iota_participation_ballot_answers_current",
            &[&ballot, "eventName=\"Treasury\"", "questionID=\"0\"", "answerID=\"1\""]
        ),
        Some(50)
    );
    assert_eq!(
        sample(
            &body,
            "iota_participation_ballot_answers_total",
            &[&ballot, "questionID=\"0\"", "answerID=\"1\""]
        ),
        Some(250)
    );
    assert_eq!(
        sample(
            &body,
            "iota_participation_ballot_answers_current",
            &[&ballot, "answerID=\"0\""]
        ),
        Some(0)
    );

    // 80 staked at 1/4 yields 20 per milestone over 5 holding milestones.
    assert_eq!(
        sample(&body, "iota_participation_staking_current", &[&staking, "eventName=\"Airdrop\""]),
        Some(20)
    );
    assert_eq!(
        sample(&body, "iota_participation_staking_per_milestone", &[&staking]),
        Some(80)
    );
    assert_eq!(
        sample(&body, "iota_participation_staking_total", &[&staking]),
        Some(100)
    );
}

#[tokio::test]
async fn test_empty_ledger_reports_zero_totals() {
    let state = make_state(ParticipationLedger::new(5));
    let (status, _, body) = scrape(&state).await;

    assert_eq!(status, StatusCode::OK);
    for status in ["upcoming", "commencing", "holding", "ended", "total"] {
        let label = format!("status=\"{status}\"");
        assert_eq!(
            sample(&body, "iota_participation_participation_events", &[&label]),
            Some(0)
        );
    }
    assert!(!body.contains("iota_participation_ballot_answers_current"));
    assert!(!body.contains("iota_participation_staking_current"));
}

#[tokio::test]
async fn test_failed_collection_serves_previous_values() {
    let state = make_state(populated_ledger());
    let (_, _, before) = scrape(&state).await;

    state.manager.update(|source| source.failing = true).await;
    let (status, _, after) = scrape(&state).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(after, before);
}

#[tokio::test]
async fn test_scrape_reflects_ledger_updates() {
    let state = make_state(populated_ledger());
    let (_, _, before) = scrape(&state).await;

    state
        .manager
        .update(|source| {
            source.ledger.remove_event(&staking_id()).unwrap();
            source.ledger.apply_milestone(25).unwrap();
        })
        .await;
    let (_, _, after) = scrape(&state).await;

    assert!(before.contains("iota_participation_staking_total"));
    assert!(!after.contains("iota_participation_staking_total"));
    assert_eq!(
        sample(&after, "iota_participation_ballot_answers_total", &["answerID=\"1\""]),
        Some(300)
    );
}

#[tokio::test]
async fn test_repeated_scrapes_are_identical() {
    let state = make_state(populated_ledger());
    let (_, _, first) = scrape(&state).await;
    let (_, _, second) = scrape(&state).await;
    assert_eq!(first, second);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_slow_collection_times_out() {
    let manager = Arc::new(ParticipationManager::new(FlakyLedger {
        ledger: populated_ledger(),
        ..FlakyLedger::default()
    }));
    let config = PrometheusConfig {
        collect_timeout_ms: 50,
        exposition_metrics: true,
        ..PrometheusConfig::default()
    };
    let state = AppState::new(Arc::clone(&manager), &config).unwrap();

    // Hold the manager lock long enough for the scrape to give up.
    let (locked_tx, locked_rx) = tokio::sync::oneshot::channel();
    let writer = tokio::spawn(async move {
        manager
            .update(|_| {
                locked_tx.send(()).unwrap();
                std::thread::sleep(Duration::from_millis(500));
            })
            .await;
    });
    locked_rx.await.unwrap();

    let (status, _, body) = scrape(&state).await;
    writer.await.unwrap();

    assert_eq!(status, StatusCode::OK);
    assert!(!body.contains("iota_participation_participation_events"));
    assert!(body.contains("promhttp_metric_handler_requests_in_flight 1"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_slow_provider_is_bounded_by_collect_timeout() {
    let manager = Arc::new(ParticipationManager::new(FlakyLedger {
        ledger: populated_ledger(),
        delay: Some(Duration::from_millis(400)),
        ..FlakyLedger::default()
    }));
    let config = PrometheusConfig {
        collect_timeout_ms: 50,
        ..PrometheusConfig::default()
    };
    let state = AppState::new(manager, &config).unwrap();

    let started = std::time::Instant::now();
    let (status, _, body) = scrape(&state).await;

    assert!(started.elapsed() < Duration::from_millis(300));
    assert_eq!(status, StatusCode::OK);
    assert!(!body.contains("iota_participation_participation_events"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_scrapes_each_carry_every_series() {
    const EVENTS: u8 = 50;
    let state = make_state(crowded_ledger(EVENTS));

    let scrapes: Vec<_> = (0..16)
        .map(|_| {
            let state = state.clone();
            tokio::spawn(async move { scrape(&state).await })
        })
        .collect();

    for task in scrapes {
        let (status, _, body) = task.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        let staking_series = body
            .lines()
            .filter(|line| line.starts_with("iota_participation_staking_current{"))
            .count();
        assert_eq!(staking_series, usize::from(EVENTS));
        assert_eq!(
            sample(&body, "iota_participation_participation_events", &["status=\"total\""]),
            Some(i64::from(EVENTS))
        );
    }
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let state = make_state(populated_ledger());
    let response = build_router(state)
        .oneshot(Request::get("/api/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_spawned_exporter_serves_until_shutdown() {
    let manager = Arc::new(ParticipationManager::new(populated_ledger()));
    let config = PrometheusConfig {
        bind_address: String::from("127.0.0.1:0"),
        ..PrometheusConfig::default()
    };
    let handle = spawn_exporter(&config, manager).await.unwrap();
    let addr = handle.local_addr();
    assert_ne!(addr.port(), 0);

    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    tokio::io::AsyncWriteExt::write_all(
        &mut stream,
        b"GET /metrics HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    )
    .await
    .unwrap();
    let mut response = Vec::new();
    tokio::io::AsyncReadExt::read_to_end(&mut stream, &mut response)
        .await
        .unwrap();
    let response = String::from_utf8(response).unwrap();

    assert!(response.starts_with("HTTP/1.1 200"));
    assert!(response.contains("iota_participation_staking_current"));

    handle.shutdown().await;
}
