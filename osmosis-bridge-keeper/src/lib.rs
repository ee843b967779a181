// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Destination side of the bridge: vote accumulation and exactly-once release
//! of inbound transfers, outbound burns, and the parameter store.
//!
//! Everything here runs inside the host chain's sequential state transition,
//! so the [`Keeper`] takes `&mut self` and does no locking of its own.

pub mod bank;
pub mod error;
pub mod keeper;
pub mod store;

pub use bank::{Coin, MemBank, TokenFactory};
pub use error::{LedgerError, LedgerResult};
pub use keeper::{InboundVote, Keeper};
pub use store::{MemStore, Store};
