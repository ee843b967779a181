// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::error::{BridgeError, BridgeResult};
use bitcoin::Network;
use osmosis_bridge_types::address::{validate_account_address, validate_bitcoin_address};
use osmosis_bridge_types::{AssetId, ChainId, MsgInboundTransfer};
use serde::{Deserialize, Serialize};

/// A transfer observed on `source_chain` that has to be delivered to `dest_chain`.
///
/// `external_id` is the source transaction id. A transaction may carry more than
/// one transfer, so only the whole value identifies a transfer. Amounts are in
/// the smallest unit of the source chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub source_chain: ChainId,
    pub dest_chain: ChainId,
    pub external_id: String,
    pub height: u64,
    pub sender: String,
    pub destination: String,
    pub asset_id: AssetId,
    pub amount: u128,
}

impl Transfer {
    /// Checks sender and destination against the address rules of their chains.
    pub fn validate_addresses(&self, bitcoin_network: Network) -> BridgeResult<()> {
        validate_chain_address(self.source_chain, "sender", &self.sender, bitcoin_network)?;
        validate_chain_address(
            self.dest_chain,
            "destination",
            &self.destination,
            bitcoin_network,
        )
    }

    /// The vote a validator submits on Osmosis for this transfer.
    pub fn to_inbound_msg(&self, signer: &str) -> MsgInboundTransfer {
        MsgInboundTransfer {
            external_id: self.external_id.clone(),
            external_height: self.height,
            sender: signer.to_string(),
            dest_addr: self.destination.clone(),
            asset_id: self.asset_id.clone(),
            amount: self.amount,
        }
    }
}

fn validate_chain_address(
    chain: ChainId,
    field: &'static str,
    address: &str,
    bitcoin_network: Network,
) -> BridgeResult<()> {
    match chain {
        ChainId::Bitcoin => validate_bitcoin_address(field, address, Some(bitcoin_network))
            .map(|_| ())
            .map_err(BridgeError::from),
        ChainId::Osmosis => validate_account_address(field, address).map_err(BridgeError::from),
    }
}
