//! Metric definitions and the snapshot projection.
//!
//! [`MetricsExporter`] owns the Prometheus [`Registry`] and every optional
//! metric group. [`ParticipationMetrics`] maps one
//! [`Snapshot`] onto labeled gauges under the `iota_participation_`
//! prefix:
//!
//! | Metric | Labels |
//! |--------|--------|
//! | `participation_events` | `status` |
//! | `ballot_answers_current` | `eventID`, `eventName`, `questionID`, `answerID` |
//! | `ballot_answers_total` | `eventID`, `eventName`, `questionID`, `answerID` |
//! | `staking_current` | `eventID`, `eventName` |
//! | `staking_per_milestone` | `eventID`, `eventName` |
//! | `staking_total` | `eventID`, `eventName` |

use axum::http::StatusCode;
use participation_core::Snapshot;
use participation_types::EventStatus;
use prometheus::{Encoder, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry, TextEncoder};
use tokio::sync::Mutex;

use crate::config::PrometheusConfig;
use crate::error::ExporterError;

const NAMESPACE: &str = "iota";
const SUBSYSTEM: &str = "participation";

/// Status label carrying the number of events across all statuses.
const TOTAL_STATUS: &str = "total";

const EVENT_LABELS: [&str; 2] = ["eventID", "eventName"];
const ANSWER_LABELS: [&str; 4] = ["eventID", "eventName", "questionID", "answerID"];

/// Convert a counter to a gauge value, saturating at `i64::MAX`.
fn gauge_value<T>(value: T) -> i64
where
    i64: TryFrom<T>,
{
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn gauge_vec(
    registry: &Registry,
    opts: Opts,
    labels: &[&str],
) -> Result<IntGaugeVec, prometheus::Error> {
    let gauge = IntGaugeVec::new(opts, labels)?;
    registry.register(Box::new(gauge.clone()))?;
    Ok(gauge)
}

fn gauge(registry: &Registry, opts: Opts) -> Result<IntGauge, prometheus::Error> {
    let gauge = IntGauge::with_opts(opts)?;
    registry.register(Box::new(gauge.clone()))?;
    Ok(gauge)
}

fn participation_opts(name: &str, help: &str) -> Opts {
    Opts::new(name, help)
        .namespace(NAMESPACE)
        .subsystem(SUBSYSTEM)
}

// ---------------------------------------------------------------------------
// Participation metrics
// ---------------------------------------------------------------------------

/// Gauges fed from a participation [`Snapshot`].
pub struct ParticipationMetrics {
    events: IntGaugeVec,
    ballot_answers_current: IntGaugeVec,
    ballot_answers_total: IntGaugeVec,
    staking_current: IntGaugeVec,
    staking_per_milestone: IntGaugeVec,
    staking_total: IntGaugeVec,
}

impl ParticipationMetrics {
    /// Create the participation gauges and register them with `registry`.
    ///
    /// # Errors
    ///
    /// Returns [`prometheus::Error`] if a gauge with the same name is
    /// already registered.
    pub fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
        Ok(Self {
            events: gauge_vec(
                registry,
                participation_opts(
                    "participation_events",
                    "Number of participation events added to the node.",
                ),
                &["status"],
            )?,
            ballot_answers_current: gauge_vec(
                registry,
                participation_opts(
                    "ballot_answers_current",
                    "Current amount of tokens voting for this answer.",
                ),
                &ANSWER_LABELS,
            )?,
            ballot_answers_total: gauge_vec(
                registry,
                participation_opts(
                    "ballot_answers_total",
                    "Accumulated amount of tokens voting for this answer.",
                ),
                &ANSWER_LABELS,
            )?,
            staking_current: gauge_vec(
                registry,
                participation_opts(
                    "staking_current",
                    "Current amount of new tokens rewarded per milestone.",
                ),
                &EVENT_LABELS,
            )?,
            staking_per_milestone: gauge_vec(
                registry,
                participation_opts(
                    "staking_per_milestone",
                    "Current amount of tokens staked for this event.",
                ),
                &EVENT_LABELS,
            )?,
            staking_total: gauge_vec(
                registry,
                participation_opts(
                    "staking_total",
                    "Accumulated amount of new tokens rewarded.",
                ),
                &EVENT_LABELS,
            )?,
        })
    }

    /// Replace every gauge value with the figures of `snapshot`.
    ///
    /// Per-event series are cleared first, so events missing from the
    /// snapshot disappear from the output. Status gauges are always set,
    /// which yields explicit zeros for an empty snapshot.
    pub fn observe(&self, snapshot: &Snapshot) {
        for status in EventStatus::ALL {
            self.events
                .with_label_values(&[status.as_str()])
                .set(gauge_value(snapshot.events.get(status)));
        }
        self.events
            .with_label_values(&[TOTAL_STATUS])
            .set(gauge_value(snapshot.events.total));

        self.staking_current.reset();
        self.staking_per_milestone.reset();
        self.staking_total.reset();
        for (event_id, tally) in &snapshot.staking {
            let event_id = event_id.to_hex();
            let labels = [event_id.as_str(), tally.event_name.as_str()];
            self.staking_current
                .with_label_values(&labels)
                .set(gauge_value(tally.current));
            self.staking_per_milestone
                .with_label_values(&labels)
                .set(gauge_value(tally.per_milestone));
            self.staking_total
                .with_label_values(&labels)
                .set(gauge_value(tally.accumulated));
        }

        self.ballot_answers_current.reset();
        self.ballot_answers_total.reset();
        for (event_id, ballot) in &snapshot.ballots {
            let event_id = event_id.to_hex();
            for (question_index, answers) in ballot.questions.iter().enumerate() {
                let question_id = question_index.to_string();
                for (answer_value, tally) in answers {
                    let answer_id = answer_value.to_string();
                    let labels = [
                        event_id.as_str(),
                        ballot.event_name.as_str(),
                        question_id.as_str(),
                        answer_id.as_str(),
                    ];
                    self.ballot_answers_current
                        .with_label_values(&labels)
                        .set(gauge_value(tally.current));
                    self.ballot_answers_total
                        .with_label_values(&labels)
                        .set(gauge_value(tally.accumulated));
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Runtime metrics
// ---------------------------------------------------------------------------

/// Gauges describing the Tokio runtime serving the scrape.
struct RuntimeMetrics {
    workers: IntGauge,
    alive_tasks: IntGauge,
}

impl RuntimeMetrics {
    fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
        let opts = |name: &str, help: &str| {
            Opts::new(name, help)
                .namespace(NAMESPACE)
                .subsystem("runtime")
        };
        Ok(Self {
            workers: gauge(
                registry,
                opts("tokio_workers", "Number of worker threads of the Tokio runtime."),
            )?,
            alive_tasks: gauge(
                registry,
                opts("tokio_alive_tasks", "Number of alive tasks on the Tokio runtime."),
            )?,
        })
    }

    fn refresh(&self) {
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let metrics = handle.metrics();
            self.workers.set(gauge_value(metrics.num_workers()));
            self.alive_tasks.set(gauge_value(metrics.num_alive_tasks()));
        }
    }
}

// ---------------------------------------------------------------------------
// Process metrics
// ---------------------------------------------------------------------------

#[cfg(target_os = "linux")]
fn register_process_metrics(registry: &Registry) -> Result<(), prometheus::Error> {
    registry.register(Box::new(
        prometheus::process_collector::ProcessCollector::for_self(),
    ))
}

#[cfg(not(target_os = "linux"))]
#[allow(clippy::unnecessary_wraps)]
fn register_process_metrics(_registry: &Registry) -> Result<(), prometheus::Error> {
    tracing::warn!("process metrics are only collected on Linux");
    Ok(())
}

// ---------------------------------------------------------------------------
// Exposition metrics
// ---------------------------------------------------------------------------

/// Metrics about the scrape endpoint itself.
struct ExpositionMetrics {
    requests: IntCounterVec,
    in_flight: IntGauge,
}

impl ExpositionMetrics {
    fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
        let requests = IntCounterVec::new(
            Opts::new(
                "promhttp_metric_handler_requests_total",
                "Total number of scrapes by HTTP status code.",
            ),
            &["code"],
        )?;
        registry.register(Box::new(requests.clone()))?;
        let in_flight = gauge(
            registry,
            Opts::new(
                "promhttp_metric_handler_requests_in_flight",
                "Current number of scrapes being served.",
            ),
        )?;
        Ok(Self {
            requests,
            in_flight,
        })
    }
}

/// Marks one scrape as in flight until dropped.
pub struct ScrapeGuard<'a> {
    in_flight: Option<&'a IntGauge>,
}

impl Drop for ScrapeGuard<'_> {
    fn drop(&mut self) {
        if let Some(gauge) = self.in_flight {
            gauge.dec();
        }
    }
}

// ---------------------------------------------------------------------------
// Exporter
// ---------------------------------------------------------------------------

/// The registry served by the scrape endpoint, with its metric groups.
///
/// Projection and encoding happen under one lock, so a rendered body always
/// reflects exactly one snapshot and snapshots are applied in scrape order.
pub struct MetricsExporter {
    registry: Registry,
    participation: Option<ParticipationMetrics>,
    runtime: Option<RuntimeMetrics>,
    exposition: Option<ExpositionMetrics>,
    projection: Mutex<()>,
}

impl MetricsExporter {
    /// Build a registry holding the metric groups enabled in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ExporterError::Prometheus`] if a metric cannot be created
    /// or registered.
    pub fn new(config: &PrometheusConfig) -> Result<Self, ExporterError> {
        let registry = Registry::new();

        let participation = if config.participation_metrics {
            Some(ParticipationMetrics::register(&registry)?)
        } else {
            None
        };
        let runtime = if config.runtime_metrics {
            Some(RuntimeMetrics::register(&registry)?)
        } else {
            None
        };
        if config.process_metrics {
            register_process_metrics(&registry)?;
        }
        let exposition = if config.exposition_metrics {
            Some(ExpositionMetrics::register(&registry)?)
        } else {
            None
        };

        Ok(Self {
            registry,
            participation,
            runtime,
            exposition,
            projection: Mutex::new(()),
        })
    }

    /// Whether participation gauges are exported.
    pub const fn collects_participation(&self) -> bool {
        self.participation.is_some()
    }

    /// Collect a snapshot, project it and encode the registry as one step.
    ///
    /// `collect` runs while the projection lock is held. When it yields
    /// `None` the gauges keep their previous values.
    ///
    /// # Errors
    ///
    /// Returns [`ExporterError`] if encoding fails.
    pub async fn scrape<F>(&self, collect: F) -> Result<String, ExporterError>
    where
        F: Future<Output = Option<Snapshot>> + Send,
    {
        let _projection = self.projection.lock().await;
        if let Some(snapshot) = collect.await {
            self.observe(&snapshot);
        }
        self.render()
    }

    /// Project `snapshot` onto the participation gauges, if enabled.
    fn observe(&self, snapshot: &Snapshot) {
        if let Some(participation) = &self.participation {
            participation.observe(snapshot);
        }
    }

    /// Count a scrape as in flight until the returned guard is dropped.
    pub fn scrape_started(&self) -> ScrapeGuard<'_> {
        let in_flight = self.exposition.as_ref().map(|exposition| {
            exposition.in_flight.inc();
            &exposition.in_flight
        });
        ScrapeGuard { in_flight }
    }

    /// Count a finished scrape by its response status.
    pub fn scrape_finished(&self, status: StatusCode) {
        if let Some(exposition) = &self.exposition {
            exposition
                .requests
                .with_label_values(&[status.as_str()])
                .inc();
        }
    }

    /// Encode the registry in the Prometheus text format.
    fn render(&self) -> Result<String, ExporterError> {
        if let Some(runtime) = &self.runtime {
            runtime.refresh();
        }
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
