use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::planner::request_plan;
use crate::engine::status::{all_deliveries_delivered, check_transition, overall_status};
use crate::error::AppError;
use crate::models::plan::ShipmentEvent;
use crate::models::shipment::{
    generate_track_code, merge_edited_stops, normalize_stops, CargoType, LegacyAddressFields,
    Proof, RawStop, Shipment, ShipmentStatus, Stop, StopStatus, StopType,
};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/shipments", post(create_shipment).get(list_shipments))
        .route(
            "/shipments/:id",
            get(get_shipment)
                .put(update_shipment)
                .delete(delete_shipment),
        )
        .route("/shipments/:id/status", post(set_shipment_status))
        .route("/shipments/:id/archive", post(archive_shipment))
        .route("/shipments/:id/events", get(list_events))
        .route("/shipments/:id/stops/:index/status", post(set_stop_status))
        .route(
            "/shipments/:id/stops/:index/proof",
            post(confirm_delivery),
        )
}

#[derive(Deserialize)]
pub struct CreateShipmentRequest {
    pub customer_name: String,
    #[serde(default)]
    pub cargo_type: CargoType,
    pub cargo_type_other: Option<String>,
    #[serde(default = "default_colli")]
    pub colli_count: u32,
    #[serde(default)]
    pub stops: Vec<RawStop>,
    #[serde(flatten)]
    pub legacy: LegacyAddressFields,
}

fn default_colli() -> u32 {
    1
}

#[derive(Deserialize)]
pub struct UpdateShipmentRequest {
    pub customer_name: String,
    #[serde(default)]
    pub cargo_type: CargoType,
    pub cargo_type_other: Option<String>,
    #[serde(default = "default_colli")]
    pub colli_count: u32,
    #[serde(default)]
    pub stops: Vec<RawStop>,
    #[serde(flatten)]
    pub legacy: LegacyAddressFields,
}

#[derive(Deserialize)]
pub struct ListShipmentsQuery {
    #[serde(default)]
    pub archived: bool,
}

#[derive(Deserialize)]
pub struct SetStopStatusRequest {
    pub status: StopStatus,
    pub note: Option<String>,
}

#[derive(Deserialize)]
pub struct SetShipmentStatusRequest {
    pub status: ShipmentStatus,
    pub note: Option<String>,
}

#[derive(Deserialize)]
pub struct ConfirmDeliveryRequest {
    pub receiver_name: String,
    pub note: Option<String>,
    pub signature_path: String,
    pub photo1_path: Option<String>,
    pub photo2_path: Option<String>,
}

fn validate_stops(stops: &[Stop]) -> Result<(), AppError> {
    let has_pickup = stops.iter().any(|s| s.stop_type == StopType::Pickup);
    let has_delivery = stops.iter().any(|s| s.stop_type == StopType::Delivery);

    if !has_pickup || !has_delivery {
        return Err(AppError::BadRequest(
            "a shipment needs at least one pickup and one delivery stop".to_string(),
        ));
    }
    Ok(())
}

fn validate_cargo(cargo_type: CargoType, other: &Option<String>) -> Result<(), AppError> {
    if cargo_type == CargoType::Other
        && other.as_deref().map_or(true, |s| s.trim().is_empty())
    {
        return Err(AppError::BadRequest(
            "cargo_type_other is required for cargo type 'other'".to_string(),
        ));
    }
    Ok(())
}

/// Recomputes the overall status from the stop list and applies its side
/// effects: the problem note is cleared once no stop is in problem anymore,
/// and the shipment is archived once every delivery is delivered. Archival is
/// one-way.
fn apply_derived_status(shipment: &mut Shipment) -> ShipmentStatus {
    let overall = overall_status(&shipment.stops);
    shipment.status = overall;

    if overall != ShipmentStatus::Problem {
        shipment.problem_note = None;
    }
    if overall == ShipmentStatus::Delivered
        && all_deliveries_delivered(&shipment.stops)
        && shipment.archived_at.is_none()
    {
        shipment.archived_at = Some(Utc::now());
        tracing::info!(shipment_id = %shipment.id, "shipment auto-archived");
    }

    overall
}

fn record_event(
    state: &AppState,
    shipment_id: Uuid,
    event_type: String,
    note: Option<String>,
    stop_index: Option<usize>,
) {
    state
        .events
        .entry(shipment_id)
        .or_default()
        .push(ShipmentEvent {
            shipment_id,
            event_type,
            note,
            stop_index,
            created_at: Utc::now(),
        });
}

async fn create_shipment(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateShipmentRequest>,
) -> Result<Json<Shipment>, AppError> {
    if payload.customer_name.trim().is_empty() {
        return Err(AppError::BadRequest(
            "customer_name cannot be empty".to_string(),
        ));
    }
    validate_cargo(payload.cargo_type, &payload.cargo_type_other)?;

    let stops = normalize_stops(payload.stops, &payload.legacy);
    validate_stops(&stops)?;

    let now = Utc::now();
    let mut shipment = Shipment {
        id: Uuid::new_v4(),
        track_code: generate_track_code(now),
        customer_name: payload.customer_name.trim().to_string(),
        cargo_type: payload.cargo_type,
        cargo_type_other: if payload.cargo_type == CargoType::Other {
            payload.cargo_type_other
        } else {
            None
        },
        colli_count: payload.colli_count.max(1),
        status: ShipmentStatus::Created,
        problem_note: None,
        archived_at: None,
        created_at: now,
        updated_at: now,
        stops,
    };

    // A payload may carry pre-set stop statuses; a shipment that arrives
    // fully delivered is archived straight away.
    apply_derived_status(&mut shipment);

    state.shipments.insert(shipment.id, shipment.clone());
    request_plan(&state);

    tracing::info!(shipment_id = %shipment.id, track_code = %shipment.track_code, "shipment created");

    Ok(Json(shipment))
}

async fn list_shipments(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListShipmentsQuery>,
) -> Json<Vec<Shipment>> {
    let mut shipments: Vec<Shipment> = state
        .shipments
        .iter()
        .filter(|entry| entry.value().is_archived() == query.archived)
        .map(|entry| entry.value().clone())
        .collect();

    shipments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Json(shipments)
}

async fn get_shipment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Shipment>, AppError> {
    let shipment = state
        .shipments
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("shipment {} not found", id)))?;

    Ok(Json(shipment.value().clone()))
}

async fn update_shipment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateShipmentRequest>,
) -> Result<Json<Shipment>, AppError> {
    if payload.customer_name.trim().is_empty() {
        return Err(AppError::BadRequest(
            "customer_name cannot be empty".to_string(),
        ));
    }
    validate_cargo(payload.cargo_type, &payload.cargo_type_other)?;

    let edited = normalize_stops(payload.stops, &payload.legacy);
    validate_stops(&edited)?;

    let mut shipment = state
        .shipments
        .get_mut(&id)
        .ok_or_else(|| AppError::NotFound(format!("shipment {} not found", id)))?;

    if shipment.is_archived() {
        return Err(AppError::PersistenceConflict(
            "archived shipments cannot be edited".to_string(),
        ));
    }

    let merged = merge_edited_stops(&shipment.stops, edited);

    shipment.customer_name = payload.customer_name.trim().to_string();
    shipment.cargo_type = payload.cargo_type;
    shipment.cargo_type_other = if payload.cargo_type == CargoType::Other {
        payload.cargo_type_other
    } else {
        None
    };
    shipment.colli_count = payload.colli_count.max(1);
    shipment.stops = merged;
    apply_derived_status(&mut shipment);
    shipment.updated_at = Utc::now();

    let updated = shipment.clone();
    drop(shipment);

    request_plan(&state);
    Ok(Json(updated))
}

async fn delete_shipment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let (_, shipment) = state
        .shipments
        .remove(&id)
        .ok_or_else(|| AppError::NotFound(format!("shipment {} not found", id)))?;
    state.events.remove(&id);

    tracing::info!(shipment_id = %id, track_code = %shipment.track_code, "shipment deleted");
    request_plan(&state);

    Ok(Json(serde_json::json!({ "deleted": id })))
}

/// Sets a stop's status, recomputes the overall shipment status and
/// auto-archives once every delivery is delivered. The transition is checked
/// before anything is written.
async fn set_stop_status(
    State(state): State<Arc<AppState>>,
    Path((id, index)): Path<(Uuid, usize)>,
    Json(payload): Json<SetStopStatusRequest>,
) -> Result<Json<Shipment>, AppError> {
    let mut shipment = state
        .shipments
        .get_mut(&id)
        .ok_or_else(|| AppError::NotFound(format!("shipment {} not found", id)))?;

    if shipment.is_archived() {
        return Err(AppError::PersistenceConflict(
            "archived shipments cannot change status".to_string(),
        ));
    }

    let stop = shipment
        .stops
        .get(index)
        .ok_or_else(|| AppError::NotFound(format!("shipment {} has no stop {}", id, index)))?;

    check_transition(stop.stop_type, payload.status)?;

    let stop_label = stop.label(&shipment.track_code);
    shipment.stops[index].status = Some(payload.status);

    if payload.status == StopStatus::Problem {
        shipment.problem_note = payload.note.clone();
    }
    let overall = apply_derived_status(&mut shipment);
    shipment.updated_at = Utc::now();

    let updated = shipment.clone();
    drop(shipment);

    let note = payload
        .note
        .or_else(|| Some(format!("Stop {} • {stop_label}", index + 1)));
    record_event(&state, id, overall.to_string(), note, Some(index));
    request_plan(&state);

    Ok(Json(updated))
}

/// Delivered-with-proof confirmation for a delivery stop. Proof is immutable
/// once written.
async fn confirm_delivery(
    State(state): State<Arc<AppState>>,
    Path((id, index)): Path<(Uuid, usize)>,
    Json(payload): Json<ConfirmDeliveryRequest>,
) -> Result<Json<Shipment>, AppError> {
    if payload.receiver_name.trim().is_empty() {
        return Err(AppError::BadRequest(
            "receiver_name is required".to_string(),
        ));
    }
    if payload.signature_path.trim().is_empty() {
        return Err(AppError::BadRequest(
            "signature_path is required".to_string(),
        ));
    }

    let mut shipment = state
        .shipments
        .get_mut(&id)
        .ok_or_else(|| AppError::NotFound(format!("shipment {} not found", id)))?;

    if shipment.is_archived() {
        return Err(AppError::PersistenceConflict(
            "archived shipments cannot change status".to_string(),
        ));
    }

    let stop = shipment
        .stops
        .get(index)
        .ok_or_else(|| AppError::NotFound(format!("shipment {} has no stop {}", id, index)))?;

    check_transition(stop.stop_type, StopStatus::Delivered)?;

    if stop.proof.is_some() {
        return Err(AppError::PersistenceConflict(
            "delivery proof has already been recorded".to_string(),
        ));
    }

    let stop_label = stop.label(&shipment.track_code);
    shipment.stops[index].status = Some(StopStatus::Delivered);
    shipment.stops[index].proof = Some(Proof {
        receiver_name: payload.receiver_name.trim().to_string(),
        note: payload.note.clone(),
        signature_path: payload.signature_path,
        photo1_path: payload.photo1_path,
        photo2_path: payload.photo2_path,
        delivered_at: Utc::now(),
    });

    let overall = apply_derived_status(&mut shipment);
    shipment.updated_at = Utc::now();

    let updated = shipment.clone();
    drop(shipment);

    record_event(
        &state,
        id,
        overall.to_string(),
        Some(format!("Stop {} • {stop_label}", index + 1)),
        Some(index),
    );
    request_plan(&state);

    Ok(Json(updated))
}

/// Legacy shipment-level status setter. `EnRoute` has no per-stop derivation
/// rule and is only settable here; `Problem` records the operator note. The
/// derived terminal statuses cannot be forced this way.
async fn set_shipment_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetShipmentStatusRequest>,
) -> Result<Json<Shipment>, AppError> {
    match payload.status {
        ShipmentStatus::EnRoute | ShipmentStatus::Problem => {}
        other => {
            return Err(AppError::InvalidTransition(format!(
                "status {other} is derived from stops and cannot be set directly"
            )));
        }
    }

    let mut shipment = state
        .shipments
        .get_mut(&id)
        .ok_or_else(|| AppError::NotFound(format!("shipment {} not found", id)))?;

    if shipment.is_archived() {
        return Err(AppError::PersistenceConflict(
            "archived shipments cannot change status".to_string(),
        ));
    }

    shipment.status = payload.status;
    if payload.status == ShipmentStatus::Problem {
        shipment.problem_note = payload.note.clone();
    }
    shipment.updated_at = Utc::now();

    let updated = shipment.clone();
    drop(shipment);

    record_event(&state, id, payload.status.to_string(), payload.note, None);
    request_plan(&state);

    Ok(Json(updated))
}

/// Manual archive for an already delivered shipment.
async fn archive_shipment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Shipment>, AppError> {
    let mut shipment = state
        .shipments
        .get_mut(&id)
        .ok_or_else(|| AppError::NotFound(format!("shipment {} not found", id)))?;

    if shipment.status != ShipmentStatus::Delivered {
        return Err(AppError::PersistenceConflict(
            "only delivered shipments can be archived".to_string(),
        ));
    }

    if shipment.archived_at.is_none() {
        shipment.archived_at = Some(Utc::now());
        shipment.updated_at = Utc::now();
    }

    let updated = shipment.clone();
    drop(shipment);

    request_plan(&state);
    Ok(Json(updated))
}

async fn list_events(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ShipmentEvent>>, AppError> {
    if !state.shipments.contains_key(&id) {
        return Err(AppError::NotFound(format!("shipment {} not found", id)));
    }

    let events = state
        .events
        .get(&id)
        .map(|entry| entry.value().clone())
        .unwrap_or_default();

    Ok(Json(events))
}
