//! Scrape endpoint handler.
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/metrics` | Prometheus text exposition |

use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use participation_core::{ParticipationSource, Snapshot};
use tracing::{debug, error, warn};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// GET /metrics
// ---------------------------------------------------------------------------

/// Serve the registry in the Prometheus text format.
///
/// When participation metrics are enabled, one aggregation is run first and
/// projected onto the gauges. If it fails or exceeds the collect timeout
/// the previous values are served unchanged. Concurrent scrapes are
/// serialized so that each body reflects a single snapshot.
pub async fn metrics<S>(State(state): State<AppState<S>>) -> Response
where
    S: ParticipationSource + Send + 'static,
{
    let in_flight = state.exporter.scrape_started();

    let snapshot = async {
        if state.exporter.collects_participation() {
            collect(&state).await
        } else {
            None
        }
    };
    let response = state.exporter.scrape(snapshot).await.map_or_else(
        |e| {
            error!(error = %e, "failed to encode metrics");
            e.into_response()
        },
        |body| ([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body).into_response(),
    );

    drop(in_flight);
    state.exporter.scrape_finished(response.status());
    response
}

/// Run one aggregation, or `None` if it fails or times out.
async fn collect<S>(state: &AppState<S>) -> Option<Snapshot>
where
    S: ParticipationSource + Send + 'static,
{
    match tokio::time::timeout(state.collect_timeout, state.manager.aggregate()).await {
        Ok(Ok(snapshot)) => {
            debug!(
                milestone_index = snapshot.milestone_index,
                events = snapshot.events.total,
                "participation snapshot collected"
            );
            Some(snapshot)
        }
        Ok(Err(e)) => {
            warn!(error = %e, "participation snapshot failed, serving previous values");
            None
        }
        Err(_) => {
            warn!(
                timeout_ms = u64::try_from(state.collect_timeout.as_millis()).unwrap_or(u64::MAX),
                "participation snapshot timed out, serving previous values"
            );
            None
        }
    }
}
