use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::routing::{RouteLeg, RoutePath, RoutingProvider, TravelTimeMatrix};

/// JSON client for the external routing service. Exposes the two provider
/// operations the core needs: a pairwise duration matrix and a driven path
/// with fixed waypoint order.
pub struct HttpRoutingProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct MatrixRequest<'a> {
    addresses: &'a [String],
}

#[derive(Deserialize)]
struct MatrixResponse {
    durations: Vec<Vec<Option<f64>>>,
}

#[derive(Serialize)]
struct DirectionsRequest<'a> {
    origin: &'a str,
    destination: &'a str,
    waypoints: &'a [String],
    // The engine's order is authoritative; the provider must not re-optimize.
    optimize_waypoints: bool,
}

#[derive(Deserialize)]
struct DirectionsResponse {
    legs: Vec<LegResponse>,
    polyline: Option<String>,
}

#[derive(Deserialize)]
struct LegResponse {
    distance_meters: f64,
    duration_seconds: f64,
}

impl HttpRoutingProvider {
    pub fn new(base_url: String, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }

    fn request(&self, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .post(format!("{}/{path}", self.base_url.trim_end_matches('/')));
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        builder
    }
}

#[async_trait]
impl RoutingProvider for HttpRoutingProvider {
    async fn travel_time_matrix(
        &self,
        addresses: &[String],
    ) -> Result<TravelTimeMatrix, AppError> {
        let response = self
            .request("matrix")
            .json(&MatrixRequest { addresses })
            .send()
            .await
            .map_err(|err| AppError::NoRouteData(format!("matrix request failed: {err}")))?;

        if !response.status().is_success() {
            return Err(AppError::NoRouteData(format!(
                "matrix request returned {}",
                response.status()
            )));
        }

        let body: MatrixResponse = response
            .json()
            .await
            .map_err(|err| AppError::NoRouteData(format!("invalid matrix response: {err}")))?;

        let matrix = TravelTimeMatrix::new(body.durations);
        if matrix.size() != addresses.len() || !matrix.is_square() {
            return Err(AppError::NoRouteData(format!(
                "matrix shape mismatch: expected {}x{0}, got {} rows",
                addresses.len(),
                matrix.size()
            )));
        }

        Ok(matrix)
    }

    async fn route_path(&self, base: &str, waypoints: &[String]) -> Result<RoutePath, AppError> {
        let response = self
            .request("directions")
            .json(&DirectionsRequest {
                origin: base,
                destination: base,
                waypoints,
                optimize_waypoints: false,
            })
            .send()
            .await
            .map_err(|err| AppError::NoRouteData(format!("directions request failed: {err}")))?;

        if !response.status().is_success() {
            return Err(AppError::NoRouteData(format!(
                "directions request returned {}",
                response.status()
            )));
        }

        let body: DirectionsResponse = response
            .json()
            .await
            .map_err(|err| AppError::NoRouteData(format!("invalid directions response: {err}")))?;

        Ok(RoutePath {
            legs: body
                .legs
                .into_iter()
                .map(|leg| RouteLeg {
                    distance_meters: leg.distance_meters,
                    duration_seconds: leg.duration_seconds,
                })
                .collect(),
            polyline: body.polyline,
        })
    }
}
