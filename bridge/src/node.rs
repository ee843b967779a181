// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::bitcoin::BitcoinChainClient;
use crate::config::BridgeNodeConfig;
use crate::metrics::BridgeMetrics;
use crate::observer::{ChainClient, CrossChainObserver};
use crate::osmosis::OsmosisChainClient;
use crate::server::{run_server, BridgeNodePublicMetadata};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// A running relayer.
pub struct BridgeNode {
    observer: CrossChainObserver,
    handles: Vec<JoinHandle<()>>,
}

impl BridgeNode {
    /// Stops the chains, delivers whatever is confirmed and shuts the server down.
    pub async fn stop(self) -> anyhow::Result<()> {
        self.observer.stop().await?;
        for handle in self.handles {
            handle.abort();
        }
        info!("Bridge node stopped");
        Ok(())
    }
}

pub async fn run_bridge_node(
    config: BridgeNodeConfig,
    version: &'static str,
    prometheus_registry: prometheus::Registry,
) -> anyhow::Result<BridgeNode> {
    let metrics = Arc::new(BridgeMetrics::new(&prometheus_registry));
    let start_time = std::time::Instant::now();

    let runtime = config.validate()?;
    let bitcoin = BitcoinChainClient::new(
        Arc::new(runtime.bitcoin_rpc),
        runtime.bitcoin,
        metrics.clone(),
    )?;
    let osmosis = OsmosisChainClient::new(
        Arc::new(runtime.osmosis_rpc),
        Arc::new(runtime.signer),
        runtime.osmosis.clone(),
        metrics.clone(),
    )?;

    let metadata = Arc::new(BridgeNodePublicMetadata::new(
        version,
        runtime.osmosis.validator_address,
        bitcoin.vault_address().to_string(),
    ));
    let metrics_address =
        SocketAddr::new(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)), runtime.metrics_port);
    let mut handles = vec![run_server(metrics_address, prometheus_registry, metadata).await?];

    let chains: Vec<Arc<dyn ChainClient>> = vec![Arc::new(bitcoin), Arc::new(osmosis)];
    let observer = CrossChainObserver::new(chains, runtime.dispatch_interval, metrics.clone());
    if let Err(e) = observer.start().await {
        error!("Failed to start bridge observer: {}", e);
        if let Err(stop_err) = observer.stop().await {
            error!("Failed to stop bridge observer: {}", stop_err);
        }
        for handle in handles {
            handle.abort();
        }
        return Err(e.into());
    }

    // Start server uptime tracking task
    handles.push(tokio::spawn(async move {
        loop {
            metrics
                .server_uptime_seconds
                .set(start_time.elapsed().as_secs() as i64);
            tokio::time::sleep(std::time::Duration::from_secs(10)).await;
        }
    }));

    info!("Bridge node started");
    Ok(BridgeNode { observer, handles })
}
