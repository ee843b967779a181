// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! A scriptable in-memory chain for observer tests.

use super::task::OutboundStream;
use super::{ChainClient, OUTBOUND_CHANNEL_CAPACITY};
use crate::error::{BridgeError, BridgeResult};
use crate::types::Transfer;
use async_trait::async_trait;
use osmosis_bridge_types::{AssetId, ChainId};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

pub(crate) struct MockChainClient {
    chain_id: ChainId,
    height: AtomicU64,
    height_error: AtomicBool,
    confirmations: AtomicU64,
    failing: Arc<Mutex<HashSet<String>>>,
    attempts: Arc<Mutex<HashMap<String, usize>>>,
    delivered: Arc<Mutex<Vec<Transfer>>>,
    outbound: OutboundStream,
    sender: Mutex<Option<mpsc::Sender<Transfer>>>,
    started: AtomicBool,
    stopped: AtomicBool,
}

impl MockChainClient {
    pub(crate) fn new(chain_id: ChainId) -> Self {
        let outbound = OutboundStream::new(OUTBOUND_CHANNEL_CAPACITY);
        let sender = Mutex::new(outbound.take_sender());
        Self {
            chain_id,
            height: AtomicU64::new(0),
            height_error: AtomicBool::new(false),
            confirmations: AtomicU64::new(0),
            failing: Default::default(),
            attempts: Default::default(),
            delivered: Default::default(),
            outbound,
            sender,
            started: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
        }
    }

    pub(crate) fn set_height(&self, height: u64) {
        self.height.store(height, Ordering::SeqCst);
    }

    pub(crate) fn set_height_error(&self, fail: bool) {
        self.height_error.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn set_confirmations_required(&self, confirmations: u64) {
        self.confirmations.store(confirmations, Ordering::SeqCst);
    }

    pub(crate) fn fail_inbound_for(&self, external_id: &str) {
        self.failing.lock().insert(external_id.to_string());
    }

    pub(crate) fn fail_inbound_to(&self, destination: &str) {
        self.failing.lock().insert(destination.to_string());
    }

    pub(crate) fn clear_failures(&self) {
        self.failing.lock().clear();
    }

    pub(crate) fn delivered(&self) -> Vec<Transfer> {
        self.delivered.lock().clone()
    }

    pub(crate) fn attempts(&self, external_id: &str) -> usize {
        self.attempts.lock().get(external_id).copied().unwrap_or(0)
    }

    pub(crate) fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    pub(crate) fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Pushes a transfer onto this chain's outbound stream.
    pub(crate) async fn emit(&self, transfer: Transfer) {
        let sender = self.sender.lock().clone();
        if let Some(sender) = sender {
            sender.send(transfer).await.unwrap();
        }
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    async fn start(&self) -> BridgeResult<()> {
        self.started.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) -> BridgeResult<()> {
        self.sender.lock().take();
        self.outbound.close();
        self.stopped.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn height(&self) -> BridgeResult<u64> {
        if self.height_error.load(Ordering::SeqCst) {
            return Err(BridgeError::Rpc("height unavailable".into()));
        }
        Ok(self.height.load(Ordering::SeqCst))
    }

    async fn confirmations_required(&self, _asset_id: &AssetId) -> BridgeResult<u64> {
        Ok(self.confirmations.load(Ordering::SeqCst))
    }

    fn listen_outbound_transfers(&self) -> mpsc::Receiver<Transfer> {
        self.outbound.take_receiver()
    }

    async fn signal_inbound_transfer(&self, transfer: &Transfer) -> BridgeResult<()> {
        *self
            .attempts
            .lock()
            .entry(transfer.external_id.clone())
            .or_default() += 1;
        let failing = self.failing.lock();
        if failing.contains(&transfer.external_id) || failing.contains(&transfer.destination) {
            return Err(BridgeError::Broadcast(format!(
                "rejected {}",
                transfer.external_id
            )));
        }
        self.delivered.lock().push(transfer.clone());
        Ok(())
    }
}
