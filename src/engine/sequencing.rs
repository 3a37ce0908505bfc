use std::collections::HashMap;

use uuid::Uuid;

use crate::models::plan::RoutableStop;
use crate::models::shipment::StopType;
use crate::routing::TravelTimeMatrix;

/// Multiplier applied to a priority stop's travel cost during selection.
/// Makes a priority stop look roughly 3x closer than it is, so it tends to
/// win without being unconditionally first.
pub const PRIORITY_BIAS: f64 = 0.35;

#[derive(Debug)]
pub struct SequenceOutcome {
    pub ordered: Vec<RoutableStop>,
    /// True when at some point no remaining stop satisfied the precedence
    /// rule and the whole remaining set was considered instead.
    pub used_fallback: bool,
}

/// Orders the candidate stops into a single visiting sequence, greedy
/// nearest-next from the base location.
///
/// The matrix must cover `[base] + stops` in input order: row/column 0 is the
/// base, stop `i` sits at index `i + 1`. Deliveries only become candidates
/// once every candidate pickup of their shipment has been visited; priority
/// stops get their cost discounted by `PRIORITY_BIAS`. The produced order
/// never ends on a pickup while a delivery exists anywhere in it.
pub fn sequence(matrix: &TravelTimeMatrix, stops: Vec<RoutableStop>) -> SequenceOutcome {
    if stops.is_empty() {
        return SequenceOutcome {
            ordered: Vec::new(),
            used_fallback: false,
        };
    }

    let matrix_index: HashMap<String, usize> = stops
        .iter()
        .enumerate()
        .map(|(i, s)| (s.id.clone(), i + 1))
        .collect();

    let mut pickup_need: HashMap<Uuid, usize> = HashMap::new();
    for stop in stops.iter().filter(|s| s.stop_type == StopType::Pickup) {
        *pickup_need.entry(stop.shipment_id).or_insert(0) += 1;
    }

    let mut done_pickups: HashMap<Uuid, usize> = HashMap::new();
    let mut remaining = stops;
    let mut ordered = Vec::with_capacity(remaining.len());
    let mut current = 0usize;
    let mut used_fallback = false;

    while !remaining.is_empty() {
        let mut candidates: Vec<usize> = remaining
            .iter()
            .enumerate()
            .filter(|(_, s)| match s.stop_type {
                StopType::Pickup => true,
                StopType::Delivery => {
                    let need = pickup_need.get(&s.shipment_id).copied().unwrap_or(0);
                    let done = done_pickups.get(&s.shipment_id).copied().unwrap_or(0);
                    need == 0 || done >= need
                }
            })
            .map(|(i, _)| i)
            .collect();

        // Documented fallback: should not occur with consistent bookkeeping,
        // but a delivery whose pickups never entered the candidate set must
        // still be routable.
        if candidates.is_empty() {
            used_fallback = true;
            candidates = (0..remaining.len()).collect();
        }

        let mut best: Option<(usize, f64)> = None;
        for &i in &candidates {
            let stop = &remaining[i];
            let mut cost = matrix.seconds(current, matrix_index[&stop.id]);
            if stop.priority {
                cost *= PRIORITY_BIAS;
            }
            if best.is_none_or(|(_, best_cost)| cost < best_cost) {
                best = Some((i, cost));
            }
        }

        let Some((winner_index, _)) = best else {
            break;
        };

        let winner = remaining.remove(winner_index);
        if winner.stop_type == StopType::Pickup {
            *done_pickups.entry(winner.shipment_id).or_insert(0) += 1;
        }
        current = matrix_index[&winner.id];
        ordered.push(winner);
    }

    // The route must not end on an unfinished pickup while a delivery is
    // still pending representation.
    if ordered
        .last()
        .is_some_and(|s| s.stop_type != StopType::Delivery)
        && let Some(last_delivery) = ordered.iter().rposition(|s| s.stop_type == StopType::Delivery)
    {
        let stop = ordered.remove(last_delivery);
        ordered.push(stop);
    }

    SequenceOutcome {
        ordered,
        used_fallback,
    }
}
