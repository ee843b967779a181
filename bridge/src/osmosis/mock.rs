// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! In-memory CometBFT node for tests.

use super::rpc::{BlockTx, BroadcastResult, OsmosisRpc, TxEvent};
use super::tx::QUERY_ACCOUNT_PATH;
use crate::error::{BridgeError, BridgeResult};
use async_trait::async_trait;
use cosmrs::proto::cosmos::auth::v1beta1::{BaseAccount, QueryAccountRequest, QueryAccountResponse};
use cosmrs::Any;
use futures::stream::{self, BoxStream, StreamExt};
use osmosis_bridge_types::{proto, EventOutboundTransfer, Params};
use parking_lot::Mutex;
use prost::Message;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

type BlockFeed = mpsc::UnboundedReceiver<BridgeResult<u64>>;

#[derive(Clone)]
pub(crate) struct OsmosisMockRpc {
    block_sender: mpsc::UnboundedSender<BridgeResult<u64>>,
    block_receiver: Arc<Mutex<Option<BlockFeed>>>,
    subscribe_fails: Arc<Mutex<bool>>,
    txs: Arc<Mutex<HashMap<u64, Vec<BlockTx>>>>,
    params: Arc<Mutex<Option<Params>>>,
    accounts: Arc<Mutex<HashMap<String, BaseAccount>>>,
    broadcast_code: Arc<Mutex<u32>>,
    broadcasts: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl Default for OsmosisMockRpc {
    fn default() -> Self {
        let (block_sender, block_receiver) = mpsc::unbounded_channel();
        Self {
            block_sender,
            block_receiver: Arc::new(Mutex::new(Some(block_receiver))),
            subscribe_fails: Default::default(),
            txs: Default::default(),
            params: Default::default(),
            accounts: Default::default(),
            broadcast_code: Default::default(),
            broadcasts: Default::default(),
        }
    }
}

impl OsmosisMockRpc {
    /// Announces a new block at `height` carrying `txs`.
    pub(crate) fn push_block(&self, height: u64, txs: Vec<BlockTx>) {
        self.txs.lock().insert(height, txs);
        let _ = self.block_sender.send(Ok(height));
    }

    pub(crate) fn push_subscription_error(&self) {
        let _ = self
            .block_sender
            .send(Err(BridgeError::Rpc("websocket read failed".into())));
    }

    pub(crate) fn set_subscribe_fails(&self, fails: bool) {
        *self.subscribe_fails.lock() = fails;
    }

    pub(crate) fn set_params(&self, params: Params) {
        *self.params.lock() = Some(params);
    }

    pub(crate) fn set_account(&self, account: BaseAccount) {
        self.accounts.lock().insert(account.address.clone(), account);
    }

    pub(crate) fn set_broadcast_code(&self, code: u32) {
        *self.broadcast_code.lock() = code;
    }

    pub(crate) fn broadcasts(&self) -> Vec<Vec<u8>> {
        self.broadcasts.lock().clone()
    }

    fn query_params(&self) -> BridgeResult<Vec<u8>> {
        let params = self
            .params
            .lock()
            .clone()
            .ok_or_else(|| BridgeError::Query("bridge params not set".into()))?;
        let params = proto::Params::try_from(params).map_err(|e| BridgeError::Query(e.to_string()))?;
        Ok(proto::QueryParamsResponse {
            params: Some(params),
        }
        .encode_to_vec())
    }

    fn query_account(&self, data: &[u8]) -> BridgeResult<Vec<u8>> {
        let request = QueryAccountRequest::decode(data).map_err(|e| BridgeError::Query(e.to_string()))?;
        let account = self
            .accounts
            .lock()
            .get(&request.address)
            .cloned()
            .ok_or_else(|| BridgeError::Query(format!("account {} not found", request.address)))?;
        Ok(QueryAccountResponse {
            account: Some(Any {
                type_url: "/cosmos.auth.v1beta1.BaseAccount".into(),
                value: account.encode_to_vec(),
            }),
        }
        .encode_to_vec())
    }
}

#[async_trait]
impl OsmosisRpc for OsmosisMockRpc {
    async fn subscribe_new_blocks(&self) -> BridgeResult<BoxStream<'static, BridgeResult<u64>>> {
        if *self.subscribe_fails.lock() {
            return Err(BridgeError::Connection("websocket handshake failed".into()));
        }
        let receiver = self
            .block_receiver
            .lock()
            .take()
            .ok_or_else(|| BridgeError::Connection("already subscribed".into()))?;
        Ok(stream::unfold(receiver, |mut receiver| async move {
            receiver.recv().await.map(|item| (item, receiver))
        })
        .boxed())
    }

    async fn txs_at_height(&self, height: u64) -> BridgeResult<Vec<BlockTx>> {
        Ok(self.txs.lock().get(&height).cloned().unwrap_or_default())
    }

    async fn abci_query(&self, path: &str, data: Vec<u8>) -> BridgeResult<Vec<u8>> {
        match path {
            proto::QUERY_PARAMS_PATH => self.query_params(),
            QUERY_ACCOUNT_PATH => self.query_account(&data),
            _ => Err(BridgeError::Query(format!("unknown query path {path}"))),
        }
    }

    async fn broadcast_tx_sync(&self, tx: Vec<u8>) -> BridgeResult<BroadcastResult> {
        let code = *self.broadcast_code.lock();
        if code == 0 {
            self.broadcasts.lock().push(tx);
        }
        Ok(BroadcastResult {
            code,
            hash: "ABCDEF".into(),
            log: if code == 0 { String::new() } else { "check tx failed".into() },
        })
    }
}

/// A transaction emitting one outbound transfer event.
pub(crate) fn outbound_tx(hash: &str, code: u32, event: &EventOutboundTransfer) -> BlockTx {
    BlockTx {
        hash: hash.into(),
        code,
        events: vec![
            TxEvent {
                kind: "message".into(),
                attributes: vec![("action".into(), MSG_OUTBOUND_ACTION.into())],
            },
            TxEvent {
                kind: EventOutboundTransfer::TYPE.into(),
                attributes: event.to_attributes(),
            },
        ],
    }
}

const MSG_OUTBOUND_ACTION: &str = "/osmosis.bridge.v1beta1.MsgOutboundTransfer";
