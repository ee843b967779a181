// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use prometheus::{
    register_int_counter_vec_with_registry, register_int_counter_with_registry,
    register_int_gauge_vec_with_registry, register_int_gauge_with_registry, IntCounter,
    IntCounterVec, IntGauge, IntGaugeVec, Registry,
};

#[derive(Clone, Debug)]
pub struct BridgeMetrics {
    pub(crate) bitcoin_blocks_scanned: IntCounter,
    pub(crate) bitcoin_last_observed_height: IntGauge,
    pub(crate) bitcoin_tx_parse_errors: IntCounter,
    pub(crate) osmosis_blocks_observed: IntCounter,
    pub(crate) osmosis_last_observed_height: IntGauge,

    pub(crate) outbound_transfers_observed: IntCounterVec,
    pub(crate) unroutable_transfers: IntCounterVec,
    pub(crate) inbound_transfers_dispatched: IntCounterVec,
    pub(crate) inbound_transfer_failures: IntCounterVec,
    pub(crate) observer_queue_size: IntGaugeVec,

    pub(crate) server_uptime_seconds: IntGauge,
}

impl BridgeMetrics {
    // Registration only fails on duplicate names, which is a programming error.
    pub fn new(registry: &Registry) -> Self {
        Self {
            bitcoin_blocks_scanned: register_int_counter_with_registry!(
                "bridge_bitcoin_blocks_scanned",
                "Total number of Bitcoin blocks scanned for bridge transfers",
                registry,
            )
            .unwrap(),
            bitcoin_last_observed_height: register_int_gauge_with_registry!(
                "bridge_bitcoin_last_observed_height",
                "Height of the last fully scanned Bitcoin block",
                registry,
            )
            .unwrap(),
            bitcoin_tx_parse_errors: register_int_counter_with_registry!(
                "bridge_bitcoin_tx_parse_errors",
                "Total number of Bitcoin transactions skipped because they could not be parsed",
                registry,
            )
            .unwrap(),
            osmosis_blocks_observed: register_int_counter_with_registry!(
                "bridge_osmosis_blocks_observed",
                "Total number of Osmosis new-block notifications processed",
                registry,
            )
            .unwrap(),
            osmosis_last_observed_height: register_int_gauge_with_registry!(
                "bridge_osmosis_last_observed_height",
                "Height of the last processed Osmosis block",
                registry,
            )
            .unwrap(),
            outbound_transfers_observed: register_int_counter_vec_with_registry!(
                "bridge_outbound_transfers_observed",
                "Total number of transfers observed per source chain",
                &["source_chain"],
                registry,
            )
            .unwrap(),
            unroutable_transfers: register_int_counter_vec_with_registry!(
                "bridge_unroutable_transfers",
                "Total number of transfers dropped because their destination chain is not served",
                &["destination_chain"],
                registry,
            )
            .unwrap(),
            inbound_transfers_dispatched: register_int_counter_vec_with_registry!(
                "bridge_inbound_transfers_dispatched",
                "Total number of transfers delivered per destination chain",
                &["destination_chain"],
                registry,
            )
            .unwrap(),
            inbound_transfer_failures: register_int_counter_vec_with_registry!(
                "bridge_inbound_transfer_failures",
                "Total number of failed delivery attempts per destination chain and error type",
                &["destination_chain", "error_type"],
                registry,
            )
            .unwrap(),
            observer_queue_size: register_int_gauge_vec_with_registry!(
                "bridge_observer_queue_size",
                "Number of transfers waiting for confirmations or delivery per source chain",
                &["source_chain"],
                registry,
            )
            .unwrap(),
            server_uptime_seconds: register_int_gauge_with_registry!(
                "bridge_server_uptime_seconds",
                "Seconds since the bridge node started",
                registry,
            )
            .unwrap(),
        }
    }

    pub fn new_for_testing() -> Self {
        let registry = Registry::new();
        Self::new(&registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_are_registered() {
        let registry = Registry::new();
        let metrics = BridgeMetrics::new(&registry);
        metrics
            .outbound_transfers_observed
            .with_label_values(&["bitcoin"])
            .inc();
        metrics
            .inbound_transfer_failures
            .with_label_values(&["osmosis", "broadcast"])
            .inc();
        metrics.bitcoin_last_observed_height.set(2_582_657);

        let names: Vec<String> = registry
            .gather()
            .iter()
            .map(|family| family.get_name().to_string())
            .collect();
        assert!(names.contains(&"bridge_outbound_transfers_observed".to_string()));
        assert!(names.contains(&"bridge_inbound_transfer_failures".to_string()));
        assert!(names.contains(&"bridge_bitcoin_last_observed_height".to_string()));
    }

    #[test]
    fn test_new_for_testing_registries_are_independent() {
        // each call uses a fresh registry, so names never collide
        let first = BridgeMetrics::new_for_testing();
        let second = BridgeMetrics::new_for_testing();
        first.bitcoin_blocks_scanned.inc();
        assert_eq!(first.bitcoin_blocks_scanned.get(), 1);
        assert_eq!(second.bitcoin_blocks_scanned.get(), 0);
    }
}
