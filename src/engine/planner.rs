use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::engine::sequencing::sequence;
use crate::error::AppError;
use crate::models::plan::{PlanTrigger, RoutableStop, RoutePlan, RouteSummary};
use crate::state::AppState;

/// Asks the planner loop for a recompute. Best effort: a full queue means a
/// trigger is already pending, which is all we need.
pub fn request_plan(state: &AppState) {
    let _ = state.plan_tx.try_send(PlanTrigger);
    state.metrics.plan_triggers_total.inc();
}

/// Runs one complete planning pass: snapshot candidates, fetch the travel
/// matrix, sequence, fetch the driven path, publish.
///
/// Zero candidates is not an error; it publishes an empty plan without any
/// provider call. A matrix failure aborts the run atomically and leaves the
/// previously published plan in place. A path failure only degrades the
/// summary; the ordered plan is still returned.
pub async fn plan_route(state: &AppState) -> Result<RoutePlan, AppError> {
    let candidates = collect_candidates(state);
    state.metrics.stops_in_plan.set(candidates.len() as i64);

    if candidates.is_empty() {
        let plan = RoutePlan::empty();
        publish(state, plan.clone()).await;
        info!("nothing to plan: no outstanding stops");
        return Ok(plan);
    }

    let mut addresses = Vec::with_capacity(candidates.len() + 1);
    addresses.push(state.base_address.clone());
    addresses.extend(candidates.iter().map(|s| s.address.clone()));

    let matrix = match state.routing.travel_time_matrix(&addresses).await {
        Ok(matrix) => {
            state
                .metrics
                .routing_requests_total
                .with_label_values(&["matrix", "success"])
                .inc();
            matrix
        }
        Err(err) => {
            state
                .metrics
                .routing_requests_total
                .with_label_values(&["matrix", "error"])
                .inc();
            return Err(err);
        }
    };

    let outcome = sequence(&matrix, candidates);
    if outcome.used_fallback {
        warn!("precedence fallback fired: some delivery had no reachable pickups");
    }

    let waypoints: Vec<String> = outcome.ordered.iter().map(|s| s.address.clone()).collect();
    let (summary, polyline) = match state.routing.route_path(&state.base_address, &waypoints).await
    {
        Ok(path) => {
            state
                .metrics
                .routing_requests_total
                .with_label_values(&["directions", "success"])
                .inc();
            (RouteSummary::from_legs(&path.legs), path.polyline)
        }
        Err(err) => {
            state
                .metrics
                .routing_requests_total
                .with_label_values(&["directions", "error"])
                .inc();
            warn!(error = %err, "route summary unavailable, keeping the plan");
            (RouteSummary::unavailable(), None)
        }
    };

    let plan = RoutePlan {
        stops: outcome.ordered,
        summary,
        polyline,
        used_fallback: outcome.used_fallback,
        planned_at: Utc::now(),
    };

    publish(state, plan.clone()).await;
    Ok(plan)
}

/// Gathers the candidate stops for a planning run: every stop without a
/// terminal status across all non-archived shipments.
fn collect_candidates(state: &AppState) -> Vec<RoutableStop> {
    let mut stops = Vec::new();
    let mut active = 0i64;

    for entry in state.shipments.iter() {
        let shipment = entry.value();
        if shipment.is_archived() {
            continue;
        }
        active += 1;

        for (index, stop) in shipment.stops.iter().enumerate() {
            if stop.is_terminal() || stop.address.is_empty() {
                continue;
            }
            stops.push(RoutableStop {
                id: format!("{}_{index}", shipment.id),
                shipment_id: shipment.id,
                stop_type: stop.stop_type,
                address: stop.address.clone(),
                priority: stop.priority,
                label: stop.label(&shipment.track_code),
            });
        }
    }

    state.metrics.shipments_active.set(active);
    stops
}

/// Last completed run wins the display slot; in-flight runs are never
/// cancelled.
async fn publish(state: &AppState, plan: RoutePlan) {
    *state.current_plan.write().await = Some(plan.clone());
    let _ = state.plan_events_tx.send(plan);
}

/// Background loop feeding `plan_route` from data-change triggers. Bursts of
/// triggers within the debounce window collapse into a single run, and every
/// run works from a fresh snapshot.
pub async fn run_planner(state: Arc<AppState>, mut trigger_rx: mpsc::Receiver<PlanTrigger>) {
    info!("planner started");

    while trigger_rx.recv().await.is_some() {
        loop {
            match tokio::time::timeout(state.plan_debounce, trigger_rx.recv()).await {
                // Another trigger within the window resets it.
                Ok(Some(_)) => continue,
                // Channel closed; run the pass we already owe, then exit.
                Ok(None) => break,
                // Quiet period elapsed.
                Err(_) => break,
            }
        }

        let start = Instant::now();
        match plan_route(&state).await {
            Ok(plan) => {
                let elapsed = start.elapsed().as_secs_f64();
                state
                    .metrics
                    .plan_latency_seconds
                    .with_label_values(&["success"])
                    .observe(elapsed);
                state
                    .metrics
                    .plans_total
                    .with_label_values(&["success"])
                    .inc();
                info!(stops = plan.stops.len(), "plan recomputed");
            }
            Err(err) => {
                let elapsed = start.elapsed().as_secs_f64();
                state
                    .metrics
                    .plan_latency_seconds
                    .with_label_values(&["error"])
                    .observe(elapsed);
                state
                    .metrics
                    .plans_total
                    .with_label_values(&["error"])
                    .inc();
                error!(error = %err, "planning run failed; previous plan kept");
            }
        }
    }

    warn!("planner stopped: trigger channel closed");
}
