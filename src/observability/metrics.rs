use prometheus::{
    Encoder, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub plans_total: IntCounterVec,
    pub plan_latency_seconds: HistogramVec,
    pub plan_triggers_total: IntCounter,
    pub stops_in_plan: IntGauge,
    pub shipments_active: IntGauge,
    pub routing_requests_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let plans_total = IntCounterVec::new(
            Opts::new("plans_total", "Total planning runs by outcome"),
            &["outcome"],
        )
        .expect("valid plans_total metric");

        let plan_latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "plan_latency_seconds",
                "Latency of planning runs in seconds",
            ),
            &["outcome"],
        )
        .expect("valid plan_latency_seconds metric");

        let plan_triggers_total = IntCounter::new(
            "plan_triggers_total",
            "Recompute triggers received, before debouncing",
        )
        .expect("valid plan_triggers_total metric");

        let stops_in_plan = IntGauge::new(
            "stops_in_plan",
            "Candidate stops in the most recent planning run",
        )
        .expect("valid stops_in_plan metric");

        let shipments_active = IntGauge::new(
            "shipments_active",
            "Non-archived shipments known to the store",
        )
        .expect("valid shipments_active metric");

        let routing_requests_total = IntCounterVec::new(
            Opts::new(
                "routing_requests_total",
                "Routing provider calls by kind and outcome",
            ),
            &["kind", "outcome"],
        )
        .expect("valid routing_requests_total metric");

        registry
            .register(Box::new(plans_total.clone()))
            .expect("register plans_total");
        registry
            .register(Box::new(plan_latency_seconds.clone()))
            .expect("register plan_latency_seconds");
        registry
            .register(Box::new(plan_triggers_total.clone()))
            .expect("register plan_triggers_total");
        registry
            .register(Box::new(stops_in_plan.clone()))
            .expect("register stops_in_plan");
        registry
            .register(Box::new(shipments_active.clone()))
            .expect("register shipments_active");
        registry
            .register(Box::new(routing_requests_total.clone()))
            .expect("register routing_requests_total");

        Self {
            registry,
            plans_total,
            plan_latency_seconds,
            plan_triggers_total,
            stops_in_plan,
            shipments_active,
            routing_requests_total,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}
