// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! The slice of the Bitcoin Core JSON-RPC API the scanner needs.

use crate::error::{BridgeError, BridgeResult};
use async_trait::async_trait;
use bitcoin::{Amount, BlockHash};
use bitcoincore_rpc::{Auth, Client, RpcApi};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// `RPC_INVALID_PARAMETER`, returned by `getblockhash` for heights above the tip.
const RPC_INVALID_PARAMETER: i32 = -8;
/// `RPC_INVALID_ADDRESS_OR_KEY`, returned by `getrawtransaction` for unknown txids.
const RPC_INVALID_ADDRESS_OR_KEY: i32 = -5;

/// `getblock <hash> 2`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VerboseBlock {
    pub hash: BlockHash,
    pub height: u64,
    pub tx: Vec<RawTransaction>,
}

/// `getrawtransaction <txid> true`, also the per-transaction entries of a verbose block.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawTransaction {
    pub txid: String,
    pub hash: String,
    pub vin: Vec<TxInput>,
    pub vout: Vec<TxOutput>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TxInput {
    // both unset for coinbase inputs
    pub txid: Option<String>,
    pub vout: Option<u32>,
    pub coinbase: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TxOutput {
    #[serde(with = "bitcoin::amount::serde::as_btc")]
    pub value: Amount,
    pub n: u32,
    #[serde(rename = "scriptPubKey")]
    pub script_pub_key: ScriptPubKey,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScriptPubKey {
    pub asm: String,
    pub hex: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[async_trait]
pub trait BitcoinRpc: Send + Sync + 'static {
    async fn get_block_count(&self) -> BridgeResult<u64>;

    /// Fails with `BridgeError::BlockUnavailable` when `height` is above the tip.
    async fn get_block_hash(&self, height: u64) -> BridgeResult<BlockHash>;

    async fn get_block_verbose(&self, hash: &BlockHash) -> BridgeResult<VerboseBlock>;

    /// Fails with `BridgeError::TransactionNotFound` when the node does not know `txid`.
    async fn get_raw_transaction(&self, txid: &str) -> BridgeResult<RawTransaction>;
}

/// [`BitcoinRpc`] backed by a Bitcoin Core node. Sender lookups need `-txindex`.
pub struct BitcoinCoreRpc {
    client: Arc<Client>,
}

impl BitcoinCoreRpc {
    pub fn new(url: &str, user: &str, password: &str) -> BridgeResult<Self> {
        let auth = Auth::UserPass(user.to_string(), password.to_string());
        let client = Client::new(url, auth).map_err(|e| BridgeError::Connection(e.to_string()))?;
        Ok(Self {
            client: Arc::new(client),
        })
    }

    // bitcoincore-rpc is synchronous
    async fn blocking<T, F>(&self, call: F) -> Result<T, bitcoincore_rpc::Error>
    where
        T: Send + 'static,
        F: FnOnce(&Client) -> Result<T, bitcoincore_rpc::Error> + Send + 'static,
    {
        let client = self.client.clone();
        tokio::task::spawn_blocking(move || call(&client))
            .await
            .map_err(|e| bitcoincore_rpc::Error::ReturnedError(format!("rpc task failed: {e}")))?
    }
}

fn has_rpc_code(e: &bitcoincore_rpc::Error, code: i32) -> bool {
    matches!(
        e,
        bitcoincore_rpc::Error::JsonRpc(bitcoincore_rpc::jsonrpc::Error::Rpc(rpc))
            if rpc.code == code
    )
}

fn rpc_error(e: bitcoincore_rpc::Error) -> BridgeError {
    BridgeError::Rpc(e.to_string())
}

#[async_trait]
impl BitcoinRpc for BitcoinCoreRpc {
    async fn get_block_count(&self) -> BridgeResult<u64> {
        self.blocking(|c| c.get_block_count()).await.map_err(rpc_error)
    }

    async fn get_block_hash(&self, height: u64) -> BridgeResult<BlockHash> {
        self.blocking(move |c| c.get_block_hash(height))
            .await
            .map_err(|e| {
                if has_rpc_code(&e, RPC_INVALID_PARAMETER) {
                    BridgeError::BlockUnavailable(height)
                } else {
                    rpc_error(e)
                }
            })
    }

    async fn get_block_verbose(&self, hash: &BlockHash) -> BridgeResult<VerboseBlock> {
        let args = [json!(hash.to_string()), json!(2)];
        self.blocking(move |c| c.call("getblock", &args))
            .await
            .map_err(rpc_error)
    }

    async fn get_raw_transaction(&self, txid: &str) -> BridgeResult<RawTransaction> {
        let args = [json!(txid), json!(true)];
        self.blocking(move |c| c.call("getrawtransaction", &args))
            .await
            .map_err(|e| {
                if has_rpc_code(&e, RPC_INVALID_ADDRESS_OR_KEY) {
                    BridgeError::TransactionNotFound(txid.to_string())
                } else {
                    rpc_error(e)
                }
            })
    }
}
