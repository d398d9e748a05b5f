//! Prometheus counters for the HTTP surface, rendered on `/metrics`.

use prometheus::{Encoder, IntCounter, Registry, TextEncoder};

pub struct ApiMetrics {
    registry: Registry,
    transfers_total: IntCounter,
    transfers_rejected_total: IntCounter,
    reservations_reversed_total: IntCounter,
}

impl ApiMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();
        let transfers_total = IntCounter::new(
            "transfers_total",
            "Waste shipments committed across all organizations",
        )?;
        let transfers_rejected_total = IntCounter::new(
            "transfers_rejected_total",
            "Shipment requests rejected before committing anything",
        )?;
        let reservations_reversed_total = IntCounter::new(
            "reservations_reversed_total",
            "Reservations rejected after delivery, with capacity returned",
        )?;
        registry.register(Box::new(transfers_total.clone()))?;
        registry.register(Box::new(transfers_rejected_total.clone()))?;
        registry.register(Box::new(reservations_reversed_total.clone()))?;
        Ok(Self {
            registry,
            transfers_total,
            transfers_rejected_total,
            reservations_reversed_total,
        })
    }

    pub fn record_transfer(&self) {
        self.transfers_total.inc();
    }

    pub fn record_rejected_transfer(&self) {
        self.transfers_rejected_total.inc();
    }

    pub fn record_reversal(&self) {
        self.reservations_reversed_total.inc();
    }

    pub fn transfers(&self) -> u64 {
        self.transfers_total.get()
    }

    pub fn rejected_transfers(&self) -> u64 {
        self.transfers_rejected_total.get()
    }

    pub fn reversals(&self) -> u64 {
        self.reservations_reversed_total.get()
    }

    /// Text exposition format for the `/metrics` route.
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        if let Err(err) = encoder.encode(&self.registry.gather(), &mut buffer) {
            log::error!("failed to encode metrics: {err}");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_show_up_in_rendered_output() {
        let metrics = ApiMetrics::new().unwrap();
        metrics.record_transfer();
        metrics.record_transfer();
        metrics.record_rejected_transfer();
        assert_eq!(metrics.transfers(), 2);
        assert_eq!(metrics.rejected_transfers(), 1);
        assert_eq!(metrics.reversals(), 0);

        let rendered = metrics.render();
        assert!(rendered.contains("transfers_total 2"));
        assert!(rendered.contains("transfers_rejected_total 1"));
    }
}
