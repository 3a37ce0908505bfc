use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::shipment::StopType;
use crate::routing::RouteLeg;

/// A stop as the sequencing engine sees it. Built fresh from all non-terminal
/// stops of all non-archived shipments at the start of each planning run; the
/// id is only stable within that run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutableStop {
    pub id: String,
    pub shipment_id: Uuid,
    pub stop_type: StopType,
    pub address: String,
    pub priority: bool,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteSummary {
    pub total_distance_km: Option<f64>,
    pub total_duration_seconds: Option<u64>,
    pub duration_text: Option<String>,
}

impl RouteSummary {
    pub fn from_legs(legs: &[RouteLeg]) -> Self {
        if legs.is_empty() {
            return Self::unavailable();
        }

        let meters: f64 = legs.iter().map(|l| l.distance_meters).sum();
        let seconds: f64 = legs.iter().map(|l| l.duration_seconds).sum();
        if !meters.is_finite() || !seconds.is_finite() || meters < 0.0 || seconds < 0.0 {
            return Self::unavailable();
        }

        let seconds = seconds.round() as u64;
        let total_minutes = (seconds + 30) / 60;
        let hours = total_minutes / 60;
        let minutes = total_minutes % 60;
        let duration_text = if hours > 0 {
            format!("{hours}u {minutes}m")
        } else {
            format!("{minutes}m")
        };

        Self {
            total_distance_km: Some((meters / 100.0).round() / 10.0),
            total_duration_seconds: Some(seconds),
            duration_text: Some(duration_text),
        }
    }

    /// Placeholder shown when the provider path response is missing or
    /// malformed; the plan itself stays valid.
    pub fn unavailable() -> Self {
        Self {
            total_distance_km: None,
            total_duration_seconds: None,
            duration_text: None,
        }
    }
}

/// The published result of one planning run. The most recently completed run
/// owns the display slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutePlan {
    pub stops: Vec<RoutableStop>,
    pub summary: RouteSummary,
    pub polyline: Option<String>,
    pub used_fallback: bool,
    pub planned_at: DateTime<Utc>,
}

impl RoutePlan {
    /// "Nothing to plan" result: zero candidates is not an error.
    pub fn empty() -> Self {
        Self {
            stops: Vec::new(),
            summary: RouteSummary::unavailable(),
            polyline: None,
            used_fallback: false,
            planned_at: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }
}

/// Append-only event recorded against a shipment whenever its status is
/// written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentEvent {
    pub shipment_id: Uuid,
    pub event_type: String,
    pub note: Option<String>,
    pub stop_index: Option<usize>,
    pub created_at: DateTime<Utc>,
}

/// Message asking the planner loop for a recompute. Triggers carry no data;
/// the planner always works from a fresh snapshot.
#[derive(Debug, Clone, Copy)]
pub struct PlanTrigger;
