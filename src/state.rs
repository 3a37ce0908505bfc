use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{broadcast, mpsc, RwLock};
use uuid::Uuid;

use crate::config::Config;
use crate::models::plan::{PlanTrigger, RoutePlan, ShipmentEvent};
use crate::models::shipment::Shipment;
use crate::observability::metrics::Metrics;
use crate::routing::RoutingProvider;

pub struct AppState {
    pub shipments: DashMap<Uuid, Shipment>,
    pub events: DashMap<Uuid, Vec<ShipmentEvent>>,
    /// Display slot for the most recently completed planning run.
    pub current_plan: RwLock<Option<RoutePlan>>,
    pub plan_tx: mpsc::Sender<PlanTrigger>,
    pub plan_events_tx: broadcast::Sender<RoutePlan>,
    pub routing: Arc<dyn RoutingProvider>,
    pub base_address: String,
    pub plan_debounce: Duration,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(
        config: &Config,
        routing: Arc<dyn RoutingProvider>,
    ) -> (Self, mpsc::Receiver<PlanTrigger>) {
        let (plan_tx, plan_rx) = mpsc::channel(config.plan_queue_size);
        let (plan_events_tx, _unused_rx) = broadcast::channel(config.event_buffer_size);

        (
            Self {
                shipments: DashMap::new(),
                events: DashMap::new(),
                current_plan: RwLock::new(None),
                plan_tx,
                plan_events_tx,
                routing,
                base_address: config.base_address.clone(),
                plan_debounce: Duration::from_millis(config.plan_debounce_ms),
                metrics: Metrics::new(),
            },
            plan_rx,
        )
    }
}
