// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use super::task::Worker;
use super::{ChainClient, OUTBOUND_CHANNEL_CAPACITY};
use crate::error::BridgeResult;
use crate::metrics::BridgeMetrics;
use crate::types::Transfer;
use osmosis_bridge_types::{AssetId, ChainId};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

struct ObserverState {
    chains: BTreeMap<ChainId, Arc<dyn ChainClient>>,
    // transfers waiting for confirmations or delivery, per source chain, in arrival order
    queue: Mutex<HashMap<ChainId, Vec<Transfer>>>,
    metrics: Arc<BridgeMetrics>,
}

impl ObserverState {
    fn collect(&self, transfer: Transfer) {
        if !self.chains.contains_key(&transfer.dest_chain) {
            warn!(
                "[Observer] Dropping transfer {} from {}: destination chain {} is not served",
                transfer.external_id, transfer.source_chain, transfer.dest_chain
            );
            self.metrics
                .unroutable_transfers
                .with_label_values(&[transfer.dest_chain.as_ref()])
                .inc();
            return;
        }

        let source = transfer.source_chain;
        let mut queue = self.queue.lock();
        let pending = queue.entry(source).or_default();
        // one source transaction may carry several transfers under the same id
        if pending.contains(&transfer) {
            warn!(
                "[Observer] Transfer {} from {} is already queued, ignoring duplicate",
                transfer.external_id, source
            );
            return;
        }
        info!(
            "[Observer] Queued transfer {} from {} to {} at height {}",
            transfer.external_id, source, transfer.dest_chain, transfer.height
        );
        pending.push(transfer);
        self.metrics
            .outbound_transfers_observed
            .with_label_values(&[source.as_ref()])
            .inc();
        self.metrics
            .observer_queue_size
            .with_label_values(&[source.as_ref()])
            .set(pending.len() as i64);
    }

    fn pending(&self, source: ChainId) -> Vec<Transfer> {
        self.queue.lock().get(&source).cloned().unwrap_or_default()
    }

    fn remove_delivered(&self, source: ChainId, delivered: &[Transfer]) {
        let mut queue = self.queue.lock();
        if let Some(pending) = queue.get_mut(&source) {
            pending.retain(|t| !delivered.contains(t));
            self.metrics
                .observer_queue_size
                .with_label_values(&[source.as_ref()])
                .set(pending.len() as i64);
        }
    }

    /// One pass over every source queue. The queue lock is never held across
    /// an RPC call: each queue is snapshotted, processed, then pruned.
    async fn dispatch_once(&self) {
        for (source, client) in &self.chains {
            let pending = self.pending(*source);
            if pending.is_empty() {
                continue;
            }

            let height = match client.height().await {
                Ok(height) => height,
                Err(e) => {
                    warn!("[Observer] Failed to get {} height: {}", source, e);
                    continue;
                }
            };

            let mut confirmations: HashMap<(ChainId, AssetId), u64> = HashMap::new();
            let mut delivered = Vec::new();
            for transfer in pending {
                let Some(dest) = self.chains.get(&transfer.dest_chain) else {
                    continue;
                };

                let cache_key = (transfer.dest_chain, transfer.asset_id.clone());
                let required = match confirmations.get(&cache_key) {
                    Some(required) => *required,
                    None => match dest.confirmations_required(&transfer.asset_id).await {
                        Ok(required) => {
                            confirmations.insert(cache_key, required);
                            required
                        }
                        Err(e) => {
                            warn!(
                                "[Observer] Failed to get confirmations for {} on {}: {}",
                                transfer.asset_id, transfer.dest_chain, e
                            );
                            continue;
                        }
                    },
                };

                let depth = height.saturating_sub(transfer.height);
                if depth < required {
                    debug!(
                        "[Observer] Transfer {} has {}/{} confirmations",
                        transfer.external_id, depth, required
                    );
                    continue;
                }

                match dest.signal_inbound_transfer(&transfer).await {
                    Ok(()) => {
                        info!(
                            "[Observer] Delivered transfer {} from {} to {}",
                            transfer.external_id, source, transfer.dest_chain
                        );
                        self.metrics
                            .inbound_transfers_dispatched
                            .with_label_values(&[transfer.dest_chain.as_ref()])
                            .inc();
                        delivered.push(transfer);
                    }
                    Err(e) => {
                        warn!(
                            "[Observer] Failed to deliver transfer {} to {}, will retry: {}",
                            transfer.external_id, transfer.dest_chain, e
                        );
                        self.metrics
                            .inbound_transfer_failures
                            .with_label_values(&[transfer.dest_chain.as_ref(), e.error_type()])
                            .inc();
                    }
                }
            }

            if !delivered.is_empty() {
                self.remove_delivered(*source, &delivered);
            }
        }
    }
}

/// Relays transfers between the registered chains once they are confirmed.
pub struct CrossChainObserver {
    state: Arc<ObserverState>,
    dispatch_interval: Duration,
    collector: Worker,
    dispatcher: Worker,
}

impl CrossChainObserver {
    pub fn new(
        chains: Vec<Arc<dyn ChainClient>>,
        dispatch_interval: Duration,
        metrics: Arc<BridgeMetrics>,
    ) -> Self {
        let chains = chains.into_iter().map(|c| (c.chain_id(), c)).collect();
        Self {
            state: Arc::new(ObserverState {
                chains,
                queue: Mutex::new(HashMap::new()),
                metrics,
            }),
            dispatch_interval,
            collector: Worker::new("Observer collector"),
            dispatcher: Worker::new("Observer dispatcher"),
        }
    }

    /// Starts every chain, then the collection and dispatch tasks.
    pub async fn start(&self) -> BridgeResult<()> {
        for (chain_id, client) in &self.state.chains {
            client.start().await?;
            info!("[Observer] Started {} chain client", chain_id);
        }

        let (merged_tx, mut merged_rx) = mpsc::channel::<Transfer>(OUTBOUND_CHANNEL_CAPACITY);
        for client in self.state.chains.values() {
            let mut outbound = client.listen_outbound_transfers();
            let merged_tx = merged_tx.clone();
            let cancel = self.collector.cancel_token();
            self.collector.spawn(async move {
                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        item = outbound.recv() => match item {
                            Some(transfer) => {
                                if merged_tx.send(transfer).await.is_err() {
                                    break;
                                }
                            }
                            None => break,
                        },
                    }
                }
            });
        }
        // the collection task ends once every chain stream is closed
        drop(merged_tx);

        let state = self.state.clone();
        self.collector.spawn(async move {
            while let Some(transfer) = merged_rx.recv().await {
                state.collect(transfer);
            }
            debug!("[Observer] All outbound streams closed");
        });

        let state = self.state.clone();
        let cancel = self.dispatcher.cancel_token();
        let period = self.dispatch_interval;
        self.dispatcher.spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        info!("[Observer] Dispatch loop cancelled");
                        break;
                    }
                    _ = interval.tick() => state.dispatch_once().await,
                }
            }
        });

        info!(
            "[Observer] Started with {} chains, dispatch interval {:?}",
            self.state.chains.len(),
            self.dispatch_interval
        );
        Ok(())
    }

    /// Stops all chains, drains their streams, and runs a final dispatch pass
    /// so that confirmed transfers are not left behind.
    pub async fn stop(&self) -> BridgeResult<()> {
        for (chain_id, client) in &self.state.chains {
            if let Err(e) = client.stop().await {
                error!("[Observer] Failed to stop {} chain client: {}", chain_id, e);
            }
        }
        self.collector.join().await;
        self.dispatcher.shutdown().await;

        self.state.dispatch_once().await;
        let left: usize = self.state.queue.lock().values().map(Vec::len).sum();
        info!("[Observer] Stopped, {} transfers left undelivered", left);
        Ok(())
    }

    /// Transfers from `source` still waiting for confirmations or delivery.
    pub fn pending_transfers(&self, source: ChainId) -> Vec<Transfer> {
        self.state.pending(source)
    }
}
