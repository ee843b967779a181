// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Osmosis side of the bridge.
//!
//! Outbound transfers are read from `EventOutboundTransfer` events of every
//! committed block. Inbound transfers are delivered as a `MsgInboundTransfer`
//! vote signed by the relayer's validator account.

use crate::error::{BridgeError, BridgeResult};
use crate::metrics::BridgeMetrics;
use crate::observer::task::{OutboundStream, Worker};
use crate::observer::{ChainClient, OUTBOUND_CHANNEL_CAPACITY};
use crate::retry_with_max_elapsed_time;
use crate::types::Transfer;
use async_trait::async_trait;
use bitcoin::Network;
use futures::stream::{BoxStream, StreamExt};
use osmosis_bridge_types::address::validate_account_address;
use osmosis_bridge_types::{proto, AssetId, ChainId, EventOutboundTransfer, Params};
use prost::Message;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[cfg(test)]
pub(crate) mod mock;
pub mod rpc;
pub mod signer;
mod tx;

pub use rpc::{CometRpc, OsmosisRpc};
pub use signer::{LocalKeySigner, Signer};
pub use tx::TxSettings;

/// Which Bitcoin network outbound destinations must belong to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Testnet,
    Mainnet,
}

impl Mode {
    pub fn bitcoin_network(&self) -> Network {
        match self {
            Mode::Testnet => Network::Testnet,
            Mode::Mainnet => Network::Bitcoin,
        }
    }
}

#[derive(Clone, Debug)]
pub struct OsmosisClientConfig {
    pub mode: Mode,
    pub min_outbound_transfer_amount: u128,
    /// Account that signs inbound transfer votes.
    pub validator_address: String,
    pub tx: TxSettings,
    pub connect_timeout: Duration,
}

pub struct OsmosisChainClient<R, S> {
    rpc: Arc<R>,
    signer: Arc<S>,
    config: OsmosisClientConfig,
    watcher: Arc<EventWatcher<R>>,
    outbound: OutboundStream,
    worker: Worker,
}

impl<R: OsmosisRpc, S: Signer> OsmosisChainClient<R, S> {
    pub fn new(
        rpc: Arc<R>,
        signer: Arc<S>,
        config: OsmosisClientConfig,
        metrics: Arc<BridgeMetrics>,
    ) -> BridgeResult<Self> {
        validate_account_address("validator address", &config.validator_address)
            .map_err(|e| BridgeError::InvalidConfig(e.to_string()))?;
        signer
            .public_key(&config.validator_address)
            .map_err(|e| BridgeError::InvalidConfig(format!("signer can't sign for validator: {e}")))?;

        let watcher = Arc::new(EventWatcher {
            rpc: rpc.clone(),
            network: config.mode.bitcoin_network(),
            min_amount: config.min_outbound_transfer_amount,
            last_height: AtomicU64::new(0),
            metrics,
        });
        Ok(Self {
            rpc,
            signer,
            config,
            watcher,
            outbound: OutboundStream::new(OUTBOUND_CHANNEL_CAPACITY),
            worker: Worker::new("OsmosisChainClient"),
        })
    }

    async fn params(&self) -> BridgeResult<Params> {
        let response = self
            .rpc
            .abci_query(
                proto::QUERY_PARAMS_PATH,
                proto::QueryParamsRequest {}.encode_to_vec(),
            )
            .await?;
        let response = proto::QueryParamsResponse::decode(response.as_slice())
            .map_err(|e| BridgeError::Query(format!("bad params response: {e}")))?;
        response
            .params
            .ok_or_else(|| BridgeError::Query("empty params response".into()))?
            .try_into()
            .map_err(|e: osmosis_bridge_types::ValidationError| BridgeError::Query(e.to_string()))
    }
}

#[async_trait]
impl<R: OsmosisRpc, S: Signer> ChainClient for OsmosisChainClient<R, S> {
    fn chain_id(&self) -> ChainId {
        ChainId::Osmosis
    }

    async fn start(&self) -> BridgeResult<()> {
        let blocks = retry_with_max_elapsed_time!(
            self.rpc.subscribe_new_blocks(),
            self.config.connect_timeout
        )
        .and_then(|result| result)
        .map_err(|e| BridgeError::Connection(format!("can't subscribe to new blocks: {e}")))?;

        let Some(outbound) = self.outbound.take_sender() else {
            warn!("[OsmosisChainClient] Already started");
            return Ok(());
        };
        let watcher = self.watcher.clone();
        let cancel = self.worker.cancel_token();
        self.worker.spawn(watcher.run(blocks, outbound, cancel));
        info!(
            "[OsmosisChainClient] Started, validator {}",
            self.config.validator_address
        );
        Ok(())
    }

    async fn stop(&self) -> BridgeResult<()> {
        self.worker.shutdown().await;
        self.outbound.close();
        info!("[OsmosisChainClient] Stopped");
        Ok(())
    }

    async fn height(&self) -> BridgeResult<u64> {
        Ok(self.watcher.last_height.load(Ordering::SeqCst))
    }

    async fn confirmations_required(&self, asset_id: &AssetId) -> BridgeResult<u64> {
        self.params()
            .await?
            .get_asset(asset_id)
            .map(|asset| asset.external_confirmations)
            .ok_or_else(|| BridgeError::Query(format!("unknown asset {asset_id}")))
    }

    fn listen_outbound_transfers(&self) -> mpsc::Receiver<Transfer> {
        self.outbound.take_receiver()
    }

    async fn signal_inbound_transfer(&self, transfer: &Transfer) -> BridgeResult<()> {
        let validator = self.config.validator_address.as_str();
        let msg = transfer.to_inbound_msg(validator);
        msg.validate_basic()?;

        let account = tx::decode_account(
            &self
                .rpc
                .abci_query(tx::QUERY_ACCOUNT_PATH, tx::account_query(validator))
                .await?,
        )?;
        let public_key = self.signer.public_key(validator)?;
        let sign_doc = tx::sign_doc(
            vec![tx::inbound_transfer_any(msg)],
            public_key.clone(),
            &account,
            &self.config.tx,
        );
        let sign_bytes = sign_doc.encode_to_vec();
        let signature = self.signer.sign(validator, &sign_bytes).await?;
        tx::verify_signature(&public_key, &sign_bytes, &signature)?;

        let result = self
            .rpc
            .broadcast_tx_sync(tx::tx_raw(sign_doc, signature))
            .await?;
        if result.code != 0 {
            return Err(BridgeError::Broadcast(format!(
                "tx {} rejected with code {}: {}",
                result.hash, result.code, result.log
            )));
        }
        info!(
            "[OsmosisChainClient] Voted for transfer {} (sequence {}) in tx {}",
            transfer.external_id, account.sequence, result.hash
        );
        Ok(())
    }
}

struct EventWatcher<R> {
    rpc: Arc<R>,
    network: Network,
    min_amount: u128,
    last_height: AtomicU64,
    metrics: Arc<BridgeMetrics>,
}

impl<R: OsmosisRpc> EventWatcher<R> {
    async fn run(
        self: Arc<Self>,
        mut blocks: BoxStream<'static, BridgeResult<u64>>,
        outbound: mpsc::Sender<Transfer>,
        cancel: CancellationToken,
    ) {
        loop {
            let height = tokio::select! {
                _ = cancel.cancelled() => break,
                item = blocks.next() => match item {
                    Some(Ok(height)) => height,
                    Some(Err(e)) => {
                        warn!("[OsmosisChainClient] Skipping new block notification: {}", e);
                        continue;
                    }
                    None => {
                        warn!("[OsmosisChainClient] New block subscription closed");
                        break;
                    }
                },
            };

            self.last_height.fetch_max(height, Ordering::SeqCst);
            self.metrics.osmosis_blocks_observed.inc();
            self.metrics
                .osmosis_last_observed_height
                .set(self.last_height.load(Ordering::SeqCst) as i64);

            let transfers = match self.transfers_at(height).await {
                Ok(transfers) => transfers,
                Err(e) => {
                    warn!("[OsmosisChainClient] Failed to read block {}: {}", height, e);
                    continue;
                }
            };
            for transfer in transfers {
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    sent = outbound.send(transfer) => {
                        if sent.is_err() {
                            return;
                        }
                    }
                }
            }
        }
        info!("[OsmosisChainClient] Event watcher stopped");
    }

    async fn transfers_at(&self, height: u64) -> BridgeResult<Vec<Transfer>> {
        let mut transfers = Vec::new();
        for tx in self.rpc.txs_at_height(height).await? {
            if tx.code != 0 {
                debug!("[OsmosisChainClient] Ignoring failed tx {}", tx.hash);
                continue;
            }
            for event in tx
                .events
                .iter()
                .filter(|event| event.kind == EventOutboundTransfer::TYPE)
            {
                let attributes = event
                    .attributes
                    .iter()
                    .map(|(key, value)| (key.as_str(), value.as_str()));
                match self.parse_outbound(&tx.hash, height, attributes) {
                    Ok(Some(transfer)) => {
                        info!(
                            "[OsmosisChainClient] Observed outbound transfer {} of {} {} to {}",
                            transfer.external_id,
                            transfer.amount,
                            transfer.asset_id,
                            transfer.destination
                        );
                        transfers.push(transfer);
                    }
                    Ok(None) => {}
                    Err(e) => warn!(
                        "[OsmosisChainClient] Skipping outbound event in tx {}: {}",
                        tx.hash, e
                    ),
                }
            }
        }
        Ok(transfers)
    }

    fn parse_outbound<'a>(
        &self,
        tx_hash: &str,
        height: u64,
        attributes: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> BridgeResult<Option<Transfer>> {
        let event = EventOutboundTransfer::from_attributes(attributes)?;
        if event.amount < self.min_amount {
            info!(
                "[OsmosisChainClient] Ignoring transfer in tx {}: amount {} below minimum {}",
                tx_hash, event.amount, self.min_amount
            );
            return Ok(None);
        }
        let dest_chain = event
            .asset_id
            .source_chain
            .parse::<ChainId>()
            .map_err(|_| BridgeError::Parse(format!("unknown chain of asset {}", event.asset_id)))?;

        let transfer = Transfer {
            source_chain: ChainId::Osmosis,
            dest_chain,
            external_id: tx_hash.to_string(),
            height,
            sender: event.sender,
            destination: event.dest_addr,
            asset_id: event.asset_id,
            amount: event.amount,
        };
        transfer.validate_addresses(self.network)?;
        Ok(Some(transfer))
    }
}
