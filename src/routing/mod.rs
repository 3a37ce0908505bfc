pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Square matrix of directed travel durations in seconds. Row/column 0 is the
/// base address, the rest follow the candidate stop order. A `None` cell is a
/// per-address failure from the provider and reads as infinite cost.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TravelTimeMatrix {
    durations: Vec<Vec<Option<f64>>>,
}

impl TravelTimeMatrix {
    pub fn new(durations: Vec<Vec<Option<f64>>>) -> Self {
        Self { durations }
    }

    pub fn size(&self) -> usize {
        self.durations.len()
    }

    pub fn is_square(&self) -> bool {
        let n = self.durations.len();
        self.durations.iter().all(|row| row.len() == n)
    }

    pub fn seconds(&self, from: usize, to: usize) -> f64 {
        self.durations
            .get(from)
            .and_then(|row| row.get(to))
            .copied()
            .flatten()
            .filter(|d| d.is_finite() && *d >= 0.0)
            .unwrap_or(f64::INFINITY)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteLeg {
    pub distance_meters: f64,
    pub duration_seconds: f64,
}

/// A driven path through the ordered waypoints, base to base.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutePath {
    pub legs: Vec<RouteLeg>,
    pub polyline: Option<String>,
}

/// Boundary to the external routing service. The provider supplies travel
/// durations and driven paths; it never reorders waypoints.
#[async_trait]
pub trait RoutingProvider: Send + Sync {
    /// Directed travel durations for every address pair in `addresses`.
    async fn travel_time_matrix(&self, addresses: &[String])
        -> Result<TravelTimeMatrix, AppError>;

    /// Driven path from `base` through `waypoints` (in exactly that order)
    /// and back to `base`.
    async fn route_path(&self, base: &str, waypoints: &[String]) -> Result<RoutePath, AppError>;
}
