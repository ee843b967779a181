// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! The CometBFT RPC calls the Osmosis client relies on.

use crate::error::{BridgeError, BridgeResult};
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use tendermint_rpc::event::EventData;
use tendermint_rpc::query::{EventType, Query};
use tendermint_rpc::{Client, HttpClient, Order, SubscriptionClient, WebSocketClient};
use tracing::{info, warn};

const TX_SEARCH_PAGE_SIZE: u8 = 100;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxEvent {
    pub kind: String,
    pub attributes: Vec<(String, String)>,
}

/// A transaction included in a block, with its execution result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockTx {
    pub hash: String,
    /// Zero on success.
    pub code: u32,
    pub events: Vec<TxEvent>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BroadcastResult {
    /// CheckTx result code, zero when the transaction entered the mempool.
    pub code: u32,
    pub hash: String,
    pub log: String,
}

#[async_trait]
pub trait OsmosisRpc: Send + Sync + 'static {
    /// Heights of new blocks as they are committed.
    async fn subscribe_new_blocks(&self) -> BridgeResult<BoxStream<'static, BridgeResult<u64>>>;

    async fn txs_at_height(&self, height: u64) -> BridgeResult<Vec<BlockTx>>;

    /// Runs an ABCI query and returns the response value. Non-zero codes are errors.
    async fn abci_query(&self, path: &str, data: Vec<u8>) -> BridgeResult<Vec<u8>>;

    async fn broadcast_tx_sync(&self, tx: Vec<u8>) -> BridgeResult<BroadcastResult>;
}

/// [`OsmosisRpc`] over a CometBFT node: HTTP for queries, websocket for events.
pub struct CometRpc {
    http: HttpClient,
    websocket_url: String,
}

impl CometRpc {
    pub fn new(rpc_url: &str, websocket_url: &str) -> BridgeResult<Self> {
        let http = HttpClient::new(rpc_url)
            .map_err(|e| BridgeError::InvalidConfig(format!("invalid rpc url {rpc_url}: {e}")))?;
        Ok(Self {
            http,
            websocket_url: websocket_url.to_string(),
        })
    }
}

fn rpc_error(e: tendermint_rpc::Error) -> BridgeError {
    BridgeError::Rpc(e.to_string())
}

#[async_trait]
impl OsmosisRpc for CometRpc {
    async fn subscribe_new_blocks(&self) -> BridgeResult<BoxStream<'static, BridgeResult<u64>>> {
        let (client, driver) = WebSocketClient::new(self.websocket_url.as_str())
            .await
            .map_err(|e| BridgeError::Connection(e.to_string()))?;
        tokio::spawn(async move {
            if let Err(e) = driver.run().await {
                warn!("[OsmosisChainClient] Websocket driver stopped: {}", e);
            }
        });
        let subscription = client
            .subscribe(EventType::NewBlock.into())
            .await
            .map_err(|e| BridgeError::Connection(e.to_string()))?;
        info!("[OsmosisChainClient] Subscribed to new blocks at {}", self.websocket_url);

        let heights = subscription.map(move |event| {
            // the subscription lives as long as its client
            let _client = &client;
            let event = event.map_err(rpc_error)?;
            match event.data {
                EventData::NewBlock { block: Some(block), .. } => Ok(block.header.height.value()),
                other => Err(BridgeError::Parse(format!(
                    "unexpected event on new block subscription: {other:?}"
                ))),
            }
        });
        Ok(heights.boxed())
    }

    async fn txs_at_height(&self, height: u64) -> BridgeResult<Vec<BlockTx>> {
        let mut txs = Vec::new();
        let mut page = 1;
        loop {
            let response = self
                .http
                .tx_search(
                    Query::eq("tx.height", height),
                    false,
                    page,
                    TX_SEARCH_PAGE_SIZE,
                    Order::Ascending,
                )
                .await
                .map_err(rpc_error)?;
            let fetched = response.txs.len();
            txs.extend(response.txs.into_iter().map(|tx| BlockTx {
                hash: tx.hash.to_string(),
                code: tx.tx_result.code.value(),
                events: tx
                    .tx_result
                    .events
                    .into_iter()
                    .map(|event| TxEvent {
                        kind: event.kind,
                        attributes: event
                            .attributes
                            .into_iter()
                            .map(|attr| (attr.key, attr.value))
                            .collect(),
                    })
                    .collect(),
            }));
            if fetched == 0 || txs.len() >= response.total_count as usize {
                return Ok(txs);
            }
            page += 1;
        }
    }

    async fn abci_query(&self, path: &str, data: Vec<u8>) -> BridgeResult<Vec<u8>> {
        let response = self
            .http
            .abci_query(Some(path.to_string()), data, None, false)
            .await
            .map_err(rpc_error)?;
        if response.code.is_err() {
            return Err(BridgeError::Query(format!(
                "{path} failed with code {}: {}",
                response.code.value(),
                response.log
            )));
        }
        Ok(response.value)
    }

    async fn broadcast_tx_sync(&self, tx: Vec<u8>) -> BridgeResult<BroadcastResult> {
        let response = self.http.broadcast_tx_sync(tx).await.map_err(rpc_error)?;
        Ok(BroadcastResult {
            code: response.code.value(),
            hash: response.hash.to_string(),
            log: response.log,
        })
    }
}
