// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Shared types of the Bitcoin <-> Osmosis bridge.
//!
//! Domain types (`Asset`, `Params`, the bridge messages) are plain Rust values
//! with validation attached. Their protobuf wire counterparts live in [`proto`]
//! and convert both ways, so the relayer can build transactions and decode
//! query responses while the ledger persists records with the same encoding.

pub mod address;
pub mod asset;
pub mod chain;
pub mod error;
pub mod events;
pub mod msgs;
pub mod params;
pub mod proto;

pub use asset::{Asset, AssetId, AssetStatus};
pub use chain::ChainId;
pub use error::{ValidationError, ValidationResult};
pub use events::EventOutboundTransfer;
pub use msgs::{MsgChangeAssetStatus, MsgInboundTransfer, MsgOutboundTransfer, MsgUpdateParams};
pub use params::Params;

/// Name of the bridge module on the Osmosis side. Also seeds the module account address.
pub const MODULE_NAME: &str = "bridge";

pub const DEFAULT_BITCOIN_CHAIN_NAME: &str = "bitcoin";
pub const DEFAULT_BITCOIN_DENOM_NAME: &str = "btc";
pub const DEFAULT_BITCOIN_EXPONENT: u64 = 8;
pub const DEFAULT_BITCOIN_CONFIRMATIONS: u64 = 6;
pub const DEFAULT_VOTES_NEEDED: u64 = 1;
