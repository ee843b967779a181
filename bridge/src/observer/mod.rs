// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Cross-chain observation and relay
//!
//! Every chain the bridge serves implements [`ChainClient`]. The
//! [`CrossChainObserver`] owns one client per chain, merges their outbound
//! streams and hands each transfer to its destination chain once the transfer
//! is deep enough in the source chain.
//!
//! ```text
//! ┌───────────────────┐  Transfer  ┌──────────────────────────────────────┐
//! │ BitcoinChainClient│───────────▶│ CrossChainObserver                   │
//! └───────────────────┘            │                                      │
//! ┌───────────────────┐  Transfer  │  collect ──▶ queue[source chain]     │
//! │ OsmosisChainClient│───────────▶│                  │                   │
//! └───────────────────┘            │  dispatch (every interval)           │
//!          ▲                       │   height(source) - transfer.height   │
//!          │                       │     >= confirmations(dest, asset)    │
//!          └─ signal_inbound ──────┴──────────────────────────────────────┘
//! ```

use crate::error::BridgeResult;
use crate::types::Transfer;
use async_trait::async_trait;
use osmosis_bridge_types::{AssetId, ChainId};
use tokio::sync::mpsc;

mod cross_chain;
pub(crate) mod task;

#[cfg(test)]
pub(crate) mod mock;

pub use cross_chain::CrossChainObserver;

/// Capacity of every outbound transfer channel.
pub const OUTBOUND_CHANNEL_CAPACITY: usize = 1000;

#[async_trait]
pub trait ChainClient: Send + Sync {
    fn chain_id(&self) -> ChainId;

    /// Starts background observation. Fails with `BridgeError::Connection`
    /// when the node can't be reached within a short bounded attempt.
    async fn start(&self) -> BridgeResult<()>;

    /// Stops background work, waits for it to finish and closes the outbound
    /// stream. Safe to call after a failed or missing `start`.
    async fn stop(&self) -> BridgeResult<()>;

    /// Most recently observed height, not necessarily the chain tip. Zero
    /// before anything has been observed.
    async fn height(&self) -> BridgeResult<u64>;

    /// Confirmation depth a transfer of `asset_id` needs before this chain
    /// accepts it as destination.
    async fn confirmations_required(&self, asset_id: &AssetId) -> BridgeResult<u64>;

    /// The stream of transfers leaving this chain. The first call gets the
    /// live stream, later calls get an already closed one.
    fn listen_outbound_transfers(&self) -> mpsc::Receiver<Transfer>;

    /// Delivers `transfer` to this chain. An error means nothing was applied
    /// and the caller may retry.
    async fn signal_inbound_transfer(&self, transfer: &Transfer) -> BridgeResult<()>;
}
