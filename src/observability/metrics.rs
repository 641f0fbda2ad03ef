use std::sync::OnceLock;

use anyhow::Result;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};
use tracing::info;

// Declare the static OnceLock to hold the Metrics.
static METRICS_INSTANCE: OnceLock<Metrics> = OnceLock::new();

/// Initializes on first use and returns the process-wide metrics.
pub fn get_metrics() -> &'static Metrics {
    METRICS_INSTANCE.get_or_init(|| {
        info!("Initializing Metrics ...");
        Metrics::new()
    })
}

#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Cell metrics
    pub store_reads: IntCounterVec,
    pub store_writes: IntCounterVec,
    pub store_expirations: IntCounterVec,

    // Errors routed through on_error
    pub store_errors: IntCounterVec,
}

impl Metrics {
    fn new() -> Self {
        let registry = Registry::new_custom(Some("expiringstore".into()), None).expect("valid registry prefix");

        let metrics = Self {
            // Cell
            store_reads: IntCounterVec::new(Opts::new("store_reads_total", "Reads served by expiring stores"),&["key"],).expect("valid metric"),
            store_writes: IntCounterVec::new(Opts::new("store_writes_total", "Writes attempted on expiring stores by outcome"),&["key", "outcome"],).expect("valid metric"),
            store_expirations: IntCounterVec::new(Opts::new("store_expirations_total", "Live to expired transitions"),&["key"],).expect("valid metric"),

            // Errors
            store_errors: IntCounterVec::new(Opts::new("store_errors_total", "Errors routed to on_error by kind"),&["kind"],).expect("valid metric"),

            registry,
        };

        // Register all metrics in the registry
        let reg = &metrics.registry;
        reg.register(Box::new(metrics.store_reads.clone())).expect("unique collector");
        reg.register(Box::new(metrics.store_writes.clone())).expect("unique collector");
        reg.register(Box::new(metrics.store_expirations.clone())).expect("unique collector");
        reg.register(Box::new(metrics.store_errors.clone())).expect("unique collector");

        metrics
    }

    /// Prometheus text exposition of every registered collector
    pub fn encode_text(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
