// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Bitcoin side of the bridge: a sequential block scanner that emits
//! deposits to the vault address as transfers to Osmosis.

use crate::error::{BridgeError, BridgeResult};
use crate::metrics::BridgeMetrics;
use crate::observer::task::{OutboundStream, Worker};
use crate::observer::{ChainClient, OUTBOUND_CHANNEL_CAPACITY};
use crate::retry_with_max_elapsed_time;
use crate::types::Transfer;
use async_trait::async_trait;
use bitcoin::address::NetworkUnchecked;
use bitcoin::{Address, Network};
use osmosis_bridge_types::{AssetId, ChainId};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[cfg(test)]
pub(crate) mod mock;
mod parser;
pub mod rpc;

pub use rpc::{BitcoinCoreRpc, BitcoinRpc};

#[derive(Clone, Debug)]
pub struct BitcoinClientConfig {
    pub network: Network,
    pub vault_address: String,
    /// First block to scan.
    pub start_height: u64,
    pub poll_interval: Duration,
    /// Depth required before a transfer is delivered to Bitcoin.
    pub confirmations: u64,
    /// Upper bound for the reachability check in `start`.
    pub connect_timeout: Duration,
}

pub struct BitcoinChainClient<R> {
    scanner: Arc<Scanner<R>>,
    confirmations: u64,
    connect_timeout: Duration,
    outbound: OutboundStream,
    worker: Worker,
}

impl<R: BitcoinRpc> BitcoinChainClient<R> {
    pub fn new(
        rpc: Arc<R>,
        config: BitcoinClientConfig,
        metrics: Arc<BridgeMetrics>,
    ) -> BridgeResult<Self> {
        let vault = parse_vault_address(&config.vault_address, config.network)?;
        Ok(Self {
            scanner: Arc::new(Scanner {
                rpc,
                network: config.network,
                vault,
                poll_interval: config.poll_interval,
                last_observed_height: AtomicU64::new(config.start_height.saturating_sub(1)),
                metrics,
            }),
            confirmations: config.confirmations,
            connect_timeout: config.connect_timeout,
            outbound: OutboundStream::new(OUTBOUND_CHANNEL_CAPACITY),
            worker: Worker::new("BitcoinChainClient"),
        })
    }

    pub fn vault_address(&self) -> &Address {
        &self.scanner.vault
    }
}

fn parse_vault_address(address: &str, network: Network) -> BridgeResult<Address> {
    if address.is_empty() {
        return Err(BridgeError::InvalidConfig("empty BTC vault address".into()));
    }
    address
        .parse::<Address<NetworkUnchecked>>()
        .map_err(|e| BridgeError::InvalidConfig(format!("invalid BTC vault address: {e}")))?
        .require_network(network)
        .map_err(|e| BridgeError::InvalidConfig(format!("invalid BTC vault address: {e}")))
}

#[async_trait]
impl<R: BitcoinRpc> ChainClient for BitcoinChainClient<R> {
    fn chain_id(&self) -> ChainId {
        ChainId::Bitcoin
    }

    async fn start(&self) -> BridgeResult<()> {
        let tip = retry_with_max_elapsed_time!(self.scanner.rpc.get_block_count(), self.connect_timeout)
            .and_then(|result| result)
            .map_err(|e| BridgeError::Connection(format!("bitcoin node unreachable: {e}")))?;

        let Some(outbound) = self.outbound.take_sender() else {
            warn!("[BitcoinChainClient] Already started");
            return Ok(());
        };
        let scanner = self.scanner.clone();
        let cancel = self.worker.cancel_token();
        self.worker.spawn(scanner.run(outbound, cancel));

        info!(
            "[BitcoinChainClient] Started at height {}, node tip {}, vault {}",
            self.scanner.last_observed_height.load(Ordering::SeqCst) + 1,
            tip,
            self.scanner.vault
        );
        Ok(())
    }

    async fn stop(&self) -> BridgeResult<()> {
        self.worker.shutdown().await;
        self.outbound.close();
        info!("[BitcoinChainClient] Stopped");
        Ok(())
    }

    async fn height(&self) -> BridgeResult<u64> {
        Ok(self.scanner.last_observed_height.load(Ordering::SeqCst))
    }

    async fn confirmations_required(&self, _asset_id: &AssetId) -> BridgeResult<u64> {
        Ok(self.confirmations)
    }

    fn listen_outbound_transfers(&self) -> mpsc::Receiver<Transfer> {
        self.outbound.take_receiver()
    }

    async fn signal_inbound_transfer(&self, transfer: &Transfer) -> BridgeResult<()> {
        Err(BridgeError::Unsupported(format!(
            "releasing {} to {} from the BTC vault",
            transfer.amount, transfer.destination
        )))
    }
}

enum ScanOutcome {
    Completed,
    Interrupted,
}

struct Scanner<R> {
    rpc: Arc<R>,
    network: Network,
    vault: Address,
    poll_interval: Duration,
    last_observed_height: AtomicU64,
    metrics: Arc<BridgeMetrics>,
}

impl<R: BitcoinRpc> Scanner<R> {
    /// Scan loop driver. Every failure ends here as a log line and a retry.
    async fn run(self: Arc<Self>, outbound: mpsc::Sender<Transfer>, cancel: CancellationToken) {
        // txids of the current block already emitted, so a retried block is not emitted twice
        let mut emitted = HashSet::new();
        while !cancel.is_cancelled() {
            let height = self.last_observed_height.load(Ordering::SeqCst) + 1;
            match self.scan_block(height, &outbound, &cancel, &mut emitted).await {
                Ok(ScanOutcome::Completed) => {
                    self.last_observed_height.store(height, Ordering::SeqCst);
                    self.metrics.bitcoin_blocks_scanned.inc();
                    self.metrics
                        .bitcoin_last_observed_height
                        .set(height as i64);
                    emitted.clear();
                    continue;
                }
                Ok(ScanOutcome::Interrupted) => {
                    info!("[BitcoinChainClient] Exiting in the middle of block {}", height);
                    break;
                }
                Err(BridgeError::BlockUnavailable(_)) => {
                    debug!("[BitcoinChainClient] Block {} is not available yet", height);
                }
                Err(e) => {
                    error!("[BitcoinChainClient] Failed to scan block {}: {}", height, e);
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }
        info!(
            "[BitcoinChainClient] Scan loop stopped, last observed height {}",
            self.last_observed_height.load(Ordering::SeqCst)
        );
    }

    async fn scan_block(
        &self,
        height: u64,
        outbound: &mpsc::Sender<Transfer>,
        cancel: &CancellationToken,
        emitted: &mut HashSet<String>,
    ) -> BridgeResult<ScanOutcome> {
        let hash = self.rpc.get_block_hash(height).await?;
        let block = self.rpc.get_block_verbose(&hash).await?;
        info!(
            "[BitcoinChainClient] Scanning block {} ({}) with {} transactions",
            height,
            hash,
            block.tx.len()
        );

        for tx in &block.tx {
            if emitted.contains(&tx.txid) {
                continue;
            }
            let transfer = match parser::parse_transfer(
                self.rpc.as_ref(),
                tx,
                height,
                &self.vault,
                self.network,
            )
            .await
            {
                Ok(Some(transfer)) => transfer,
                Ok(None) => continue,
                Err(BridgeError::Parse(reason)) => {
                    warn!("[BitcoinChainClient] Skipping tx {}: {}", tx.txid, reason);
                    self.metrics.bitcoin_tx_parse_errors.inc();
                    continue;
                }
                Err(e) => return Err(e),
            };

            info!(
                "[BitcoinChainClient] Observed deposit {} of {} sat from {} to {}",
                transfer.external_id, transfer.amount, transfer.sender, transfer.destination
            );
            tokio::select! {
                _ = cancel.cancelled() => return Ok(ScanOutcome::Interrupted),
                sent = outbound.send(transfer) => {
                    if sent.is_err() {
                        return Ok(ScanOutcome::Interrupted);
                    }
                }
            }
            emitted.insert(tx.txid.clone());
        }
        Ok(ScanOutcome::Completed)
    }
}
