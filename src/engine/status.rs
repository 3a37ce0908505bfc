use crate::error::AppError;
use crate::models::shipment::{ShipmentStatus, Stop, StopStatus, StopType};

/// Rejects statuses that are illegal for a stop's type before anything is
/// written. A pickup terminates in `PickedUp`, a delivery in `Delivered`;
/// `Problem` is reachable from any state.
pub fn check_transition(stop_type: StopType, new_status: StopStatus) -> Result<(), AppError> {
    match (stop_type, new_status) {
        (_, StopStatus::Problem)
        | (StopType::Pickup, StopStatus::PickedUp)
        | (StopType::Delivery, StopStatus::Delivered) => Ok(()),
        (StopType::Pickup, StopStatus::Delivered) => Err(AppError::InvalidTransition(
            "a pickup stop cannot be marked delivered".to_string(),
        )),
        (StopType::Delivery, StopStatus::PickedUp) => Err(AppError::InvalidTransition(
            "a delivery stop cannot be marked picked up".to_string(),
        )),
    }
}

/// Derives the overall shipment status from the full stop list. Pure and
/// order-independent; evaluated in strict precedence:
///
/// 1. any problem stop wins
/// 2. all pickups done and all deliveries delivered
/// 3. anything picked up so far
/// 4. untouched
pub fn overall_status(stops: &[Stop]) -> ShipmentStatus {
    if stops.iter().any(|s| s.status == Some(StopStatus::Problem)) {
        return ShipmentStatus::Problem;
    }

    let all_pickups_done = stops
        .iter()
        .filter(|s| s.stop_type == StopType::Pickup)
        .all(|s| matches!(s.status, Some(StopStatus::PickedUp) | Some(StopStatus::Delivered)));

    let mut deliveries = stops
        .iter()
        .filter(|s| s.stop_type == StopType::Delivery)
        .peekable();
    let any_delivery = deliveries.peek().is_some();
    let all_deliveries_done = deliveries.all(|s| s.status == Some(StopStatus::Delivered));

    if all_pickups_done && any_delivery && all_deliveries_done {
        return ShipmentStatus::Delivered;
    }

    if stops.iter().any(|s| s.status == Some(StopStatus::PickedUp)) {
        return ShipmentStatus::PickedUp;
    }

    ShipmentStatus::Created
}

/// True once every delivery stop carries the delivered status; the trigger
/// for auto-archival.
pub fn all_deliveries_delivered(stops: &[Stop]) -> bool {
    let mut deliveries = stops
        .iter()
        .filter(|s| s.stop_type == StopType::Delivery)
        .peekable();

    deliveries.peek().is_some() && deliveries.all(|s| s.status == Some(StopStatus::Delivered))
}
