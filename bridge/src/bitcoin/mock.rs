// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! In-memory Bitcoin node and transaction builders for tests.

use super::rpc::{BitcoinRpc, RawTransaction, ScriptPubKey, TxInput, TxOutput, VerboseBlock};
use crate::error::{BridgeError, BridgeResult};
use async_trait::async_trait;
use bitcoin::hashes::Hash;
use bitcoin::{Address, Amount, BlockHash, Network, ScriptBuf, WPubkeyHash};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Clone, Default)]
pub(crate) struct BitcoinMockRpc {
    blocks: Arc<Mutex<BTreeMap<u64, VerboseBlock>>>,
    transactions: Arc<Mutex<HashMap<String, RawTransaction>>>,
    block_hash_failures: Arc<Mutex<HashMap<u64, usize>>>,
    raw_transaction_failures: Arc<Mutex<HashMap<String, usize>>>,
    unreachable: Arc<Mutex<bool>>,
    raw_transaction_calls: Arc<AtomicUsize>,
}

impl BitcoinMockRpc {
    /// Adds a block at `height`. Its transactions become resolvable by txid too.
    pub(crate) fn add_block(&self, height: u64, tx: Vec<RawTransaction>) -> BlockHash {
        let mut bytes = [0u8; 32];
        bytes[..8].copy_from_slice(&height.to_le_bytes());
        let hash = BlockHash::from_byte_array(bytes);
        for t in &tx {
            self.add_transaction(t.clone());
        }
        self.blocks
            .lock()
            .insert(height, VerboseBlock { hash, height, tx });
        hash
    }

    pub(crate) fn add_transaction(&self, tx: RawTransaction) {
        self.transactions.lock().insert(tx.txid.clone(), tx);
    }

    /// Makes the next `times` `getblockhash` calls for `height` fail.
    pub(crate) fn fail_block_hash(&self, height: u64, times: usize) {
        self.block_hash_failures.lock().insert(height, times);
    }

    /// Makes the next `times` `getrawtransaction` calls for `txid` fail transiently.
    pub(crate) fn fail_raw_transaction(&self, txid: &str, times: usize) {
        self.raw_transaction_failures
            .lock()
            .insert(txid.to_string(), times);
    }

    pub(crate) fn set_unreachable(&self, unreachable: bool) {
        *self.unreachable.lock() = unreachable;
    }

    pub(crate) fn raw_transaction_calls(&self) -> usize {
        self.raw_transaction_calls.load(Ordering::SeqCst)
    }

    fn check_reachable(&self) -> BridgeResult<()> {
        if *self.unreachable.lock() {
            return Err(BridgeError::Rpc("connection refused".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl BitcoinRpc for BitcoinMockRpc {
    async fn get_block_count(&self) -> BridgeResult<u64> {
        self.check_reachable()?;
        Ok(self.blocks.lock().keys().next_back().copied().unwrap_or(0))
    }

    async fn get_block_hash(&self, height: u64) -> BridgeResult<BlockHash> {
        self.check_reachable()?;
        if let Some(left) = self.block_hash_failures.lock().get_mut(&height) {
            if *left > 0 {
                *left -= 1;
                return Err(BridgeError::Rpc(format!("getblockhash {height} failed")));
            }
        }
        self.blocks
            .lock()
            .get(&height)
            .map(|block| block.hash)
            .ok_or(BridgeError::BlockUnavailable(height))
    }

    async fn get_block_verbose(&self, hash: &BlockHash) -> BridgeResult<VerboseBlock> {
        self.check_reachable()?;
        self.blocks
            .lock()
            .values()
            .find(|block| &block.hash == hash)
            .cloned()
            .ok_or_else(|| BridgeError::Rpc(format!("block {hash} not found")))
    }

    async fn get_raw_transaction(&self, txid: &str) -> BridgeResult<RawTransaction> {
        self.check_reachable()?;
        self.raw_transaction_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(left) = self.raw_transaction_failures.lock().get_mut(txid) {
            if *left > 0 {
                *left -= 1;
                return Err(BridgeError::Rpc(format!("getrawtransaction {txid} failed")));
            }
        }
        self.transactions
            .lock()
            .get(txid)
            .cloned()
            .ok_or_else(|| BridgeError::TransactionNotFound(txid.to_string()))
    }
}

fn p2wpkh_script(seed: u8) -> ScriptBuf {
    ScriptBuf::new_p2wpkh(&WPubkeyHash::from_byte_array([seed; 20]))
}

/// The P2WPKH address identified by `seed` in these helpers.
pub(crate) fn address_for(seed: u8, network: Network) -> Address {
    Address::from_script(&p2wpkh_script(seed), network).unwrap()
}

pub(crate) fn p2wpkh_output(n: u32, sats: u64, seed: u8) -> TxOutput {
    let script = p2wpkh_script(seed);
    TxOutput {
        value: Amount::from_sat(sats),
        n,
        script_pub_key: ScriptPubKey {
            asm: format!("0 {}", hex::encode([seed; 20])),
            hex: hex::encode(script.as_bytes()),
            kind: "witness_v0_keyhash".into(),
        },
    }
}

pub(crate) fn nulldata_output(n: u32, asm: &str) -> TxOutput {
    TxOutput {
        value: Amount::ZERO,
        n,
        script_pub_key: ScriptPubKey {
            asm: asm.into(),
            hex: "6a".into(),
            kind: "nulldata".into(),
        },
    }
}

/// `OP_RETURN <memo>`, memo shorter than 76 bytes.
pub(crate) fn memo_output(n: u32, memo: &str) -> TxOutput {
    let data = hex::encode(memo.as_bytes());
    TxOutput {
        value: Amount::ZERO,
        n,
        script_pub_key: ScriptPubKey {
            asm: format!("OP_RETURN {data}"),
            hex: format!("6a{:02x}{}", memo.len(), data),
            kind: "nulldata".into(),
        },
    }
}

pub(crate) fn spend_tx(txid: &str, prev: (&str, u32), vout: Vec<TxOutput>) -> RawTransaction {
    RawTransaction {
        txid: txid.into(),
        hash: format!("{txid}-w"),
        vin: vec![TxInput {
            txid: Some(prev.0.into()),
            vout: Some(prev.1),
            coinbase: None,
        }],
        vout,
    }
}

/// A coinbase paying `sats` to `seed` in output 0.
pub(crate) fn funding_tx(txid: &str, seed: u8, sats: u64) -> RawTransaction {
    RawTransaction {
        txid: txid.into(),
        hash: txid.into(),
        vin: vec![TxInput {
            txid: None,
            vout: None,
            coinbase: Some("00".into()),
        }],
        vout: vec![p2wpkh_output(0, sats, seed)],
    }
}
