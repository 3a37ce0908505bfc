use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StopType {
    Pickup,
    Delivery,
}

/// Status a driver can set on a single stop. A stop without a status has not
/// been visited yet.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StopStatus {
    PickedUp,
    Delivered,
    Problem,
}

/// Overall shipment status, derived from the stop list (see
/// `engine::status::overall_status`). `EnRoute` is a legacy display status
/// settable only at the shipment level; it has no per-stop derivation rule.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentStatus {
    Created,
    PickedUp,
    EnRoute,
    Delivered,
    Problem,
}

impl std::fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ShipmentStatus::Created => "CREATED",
            ShipmentStatus::PickedUp => "PICKED_UP",
            ShipmentStatus::EnRoute => "EN_ROUTE",
            ShipmentStatus::Delivered => "DELIVERED",
            ShipmentStatus::Problem => "PROBLEM",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CargoType {
    #[default]
    Box,
    Pallet,
    Envelope,
    Other,
}

/// Delivery confirmation attached to a delivery stop. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proof {
    pub receiver_name: String,
    pub note: Option<String>,
    pub signature_path: String,
    pub photo1_path: Option<String>,
    pub photo2_path: Option<String>,
    pub delivered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stop {
    pub stop_type: StopType,
    pub address: String,
    pub priority: bool,
    pub status: Option<StopStatus>,
    pub proof: Option<Proof>,
}

impl Stop {
    pub fn new(stop_type: StopType, address: String, priority: bool) -> Self {
        Self {
            stop_type,
            address,
            priority,
            status: None,
            proof: None,
        }
    }

    /// A stop is terminal once it has any status; terminal stops are no
    /// longer sequencing candidates.
    pub fn is_terminal(&self) -> bool {
        self.status.is_some()
    }

    pub fn label(&self, track_code: &str) -> String {
        let verb = match self.stop_type {
            StopType::Pickup => "Pickup",
            StopType::Delivery => "Delivery",
        };
        format!("{verb}: {} ({track_code})", self.address)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shipment {
    pub id: Uuid,
    pub track_code: String,
    pub customer_name: String,
    pub cargo_type: CargoType,
    pub cargo_type_other: Option<String>,
    pub colli_count: u32,
    pub stops: Vec<Stop>,
    pub status: ShipmentStatus,
    pub problem_note: Option<String>,
    pub archived_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Shipment {
    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }
}

/// Tracking codes are assigned once at creation and never change.
pub fn generate_track_code(now: DateTime<Utc>) -> String {
    format!("DVK{}{}", now.year(), now.timestamp())
}

/// Inbound stop payload. Older clients used a handful of field-name aliases;
/// they are all accepted here and nowhere else.
#[derive(Debug, Clone, Deserialize)]
pub struct RawStop {
    #[serde(rename = "type", alias = "stop_type", alias = "kind")]
    pub stop_type: Option<StopType>,
    #[serde(alias = "addr", alias = "stop_address")]
    pub address: Option<String>,
    #[serde(alias = "priority", alias = "is_prio", alias = "is_priority", default)]
    pub prio: bool,
    pub status: Option<StopStatus>,
    pub proof: Option<Proof>,
}

/// Legacy single-address shipment fields, used only when no stop list is
/// supplied.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LegacyAddressFields {
    pub pickup_address: Option<String>,
    pub delivery_address: Option<String>,
    #[serde(default)]
    pub pickup_prio: bool,
    #[serde(default)]
    pub delivery_prio: bool,
}

/// The single normalization point between inbound payloads and the canonical
/// stop model. Stops with an empty address are dropped; a missing stop type
/// defaults to delivery. When the stop list is empty the legacy
/// pickup/delivery address pair is promoted to a two-stop list.
pub fn normalize_stops(raw: Vec<RawStop>, legacy: &LegacyAddressFields) -> Vec<Stop> {
    let normalized: Vec<Stop> = raw
        .into_iter()
        .filter_map(|r| {
            let address = r.address.unwrap_or_default().trim().to_string();
            if address.is_empty() {
                return None;
            }
            Some(Stop {
                stop_type: r.stop_type.unwrap_or(StopType::Delivery),
                address,
                priority: r.prio,
                status: r.status,
                proof: r.proof,
            })
        })
        .collect();

    if !normalized.is_empty() {
        return normalized;
    }

    let mut out = Vec::new();
    if let Some(p) = legacy.pickup_address.as_deref().map(str::trim)
        && !p.is_empty()
    {
        out.push(Stop::new(StopType::Pickup, p.to_string(), legacy.pickup_prio));
    }
    if let Some(d) = legacy.delivery_address.as_deref().map(str::trim)
        && !d.is_empty()
    {
        out.push(Stop::new(
            StopType::Delivery,
            d.to_string(),
            legacy.delivery_prio,
        ));
    }
    out
}

/// Merge an edited stop list with the previous one, keeping the status and
/// proof at positions where the replacement is like-for-like (same stop
/// type). A stop whose type changed starts over unvisited.
pub fn merge_edited_stops(old: &[Stop], edited: Vec<Stop>) -> Vec<Stop> {
    edited
        .into_iter()
        .enumerate()
        .map(|(i, mut stop)| {
            if let Some(prev) = old.get(i)
                && prev.stop_type == stop.stop_type
            {
                stop.status = prev.status;
                stop.proof = prev.proof.clone();
            }
            stop
        })
        .collect()
}
