// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::bank::{Coin, TokenFactory};
use crate::error::{LedgerError, LedgerResult};
use crate::store::{inbound_transfer_key, last_transfer_height_key, params_key, Store};
use osmosis_bridge_types::address::module_address;
use osmosis_bridge_types::proto;
use osmosis_bridge_types::{
    AssetId, AssetStatus, EventOutboundTransfer, MsgChangeAssetStatus, MsgInboundTransfer,
    MsgOutboundTransfer, MsgUpdateParams, Params, MODULE_NAME,
};
use prost::Message;
use tracing::{debug, info};

/// Votes collected for one `(external_id, external_height)` pair. Never deleted:
/// a finalized record is what rejects late and repeated votes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundTransferRecord {
    pub external_id: String,
    pub external_height: u64,
    pub dest_addr: String,
    pub asset_id: AssetId,
    pub amount: u128,
    pub voters: Vec<String>,
    pub finalized: bool,
}

impl InboundTransferRecord {
    fn from_msg(msg: &MsgInboundTransfer) -> Self {
        Self {
            external_id: msg.external_id.clone(),
            external_height: msg.external_height,
            dest_addr: msg.dest_addr.clone(),
            asset_id: msg.asset_id.clone(),
            amount: msg.amount,
            voters: vec![],
            finalized: false,
        }
    }

    fn same_payload(&self, msg: &MsgInboundTransfer) -> bool {
        self.dest_addr == msg.dest_addr && self.asset_id == msg.asset_id && self.amount == msg.amount
    }
}

impl From<InboundTransferRecord> for proto::InboundTransfer {
    fn from(r: InboundTransferRecord) -> Self {
        Self {
            external_id: r.external_id,
            external_height: r.external_height,
            dest_addr: r.dest_addr,
            asset_id: Some(r.asset_id.into()),
            amount: r.amount.to_string(),
            voters: r.voters,
            finalized: r.finalized,
        }
    }
}

impl TryFrom<proto::InboundTransfer> for InboundTransferRecord {
    type Error = LedgerError;

    fn try_from(r: proto::InboundTransfer) -> LedgerResult<Self> {
        let asset_id = r
            .asset_id
            .ok_or_else(|| LedgerError::Store("inbound transfer without asset id".into()))?;
        Ok(Self {
            amount: proto::parse_amount(&r.amount).map_err(|e| LedgerError::Store(e.to_string()))?,
            asset_id: asset_id.into(),
            external_id: r.external_id,
            external_height: r.external_height,
            dest_addr: r.dest_addr,
            voters: r.voters,
            finalized: r.finalized,
        })
    }
}

/// Result of an accepted vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InboundVote {
    pub votes: usize,
    pub finalized: bool,
}

pub struct Keeper<S, T> {
    store: S,
    token_factory: T,
    // address allowed to change params, usually the governance module
    authority: String,
    module_address: String,
}

impl<S: Store, T: TokenFactory> Keeper<S, T> {
    pub fn new(store: S, token_factory: T, authority: impl Into<String>) -> LedgerResult<Self> {
        let module_address =
            module_address(MODULE_NAME).map_err(|e| LedgerError::Store(e.to_string()))?;
        Ok(Self {
            store,
            token_factory,
            authority: authority.into(),
            module_address,
        })
    }

    pub fn init_params(&mut self, params: Params) -> LedgerResult<()> {
        params.validate()?;
        self.set_params(&params)
    }

    pub fn module_address(&self) -> &str {
        &self.module_address
    }

    pub fn token_factory(&self) -> &T {
        &self.token_factory
    }

    pub fn token_factory_mut(&mut self) -> &mut T {
        &mut self.token_factory
    }

    /// Token-factory denom minted for `asset_id` on this chain.
    pub fn bridged_denom(&self, asset_id: &AssetId) -> String {
        format!("factory/{}/{}", self.module_address, asset_id.denom)
    }

    pub fn params(&self) -> LedgerResult<Params> {
        let bytes = self
            .store
            .get(&params_key())
            .ok_or_else(|| LedgerError::Store("params are not initialized".into()))?;
        let raw = proto::Params::decode(bytes.as_slice())
            .map_err(|e| LedgerError::Store(format!("failed to decode params: {e}")))?;
        Params::try_from(raw).map_err(|e| LedgerError::Store(e.to_string()))
    }

    fn set_params(&mut self, params: &Params) -> LedgerResult<()> {
        let raw = proto::Params::try_from(params.clone())?;
        self.store.set(params_key(), raw.encode_to_vec());
        Ok(())
    }

    pub fn get_inbound_transfer(
        &self,
        external_id: &str,
        external_height: u64,
    ) -> LedgerResult<Option<InboundTransferRecord>> {
        let Some(bytes) = self
            .store
            .get(&inbound_transfer_key(external_id, external_height))
        else {
            return Ok(None);
        };
        let raw = proto::InboundTransfer::decode(bytes.as_slice())
            .map_err(|e| LedgerError::Store(format!("failed to decode inbound transfer: {e}")))?;
        InboundTransferRecord::try_from(raw).map(Some)
    }

    fn set_inbound_transfer(&mut self, record: InboundTransferRecord) {
        let key = inbound_transfer_key(&record.external_id, record.external_height);
        let raw = proto::InboundTransfer::from(record);
        self.store.set(key, raw.encode_to_vec());
    }

    pub fn is_transfer_finalized(
        &self,
        external_id: &str,
        external_height: u64,
    ) -> LedgerResult<bool> {
        Ok(self
            .get_inbound_transfer(external_id, external_height)?
            .map(|r| r.finalized)
            .unwrap_or(false))
    }

    /// Source height of the last finalized transfer of `asset_id`.
    pub fn last_transfer_height(&self, asset_id: &AssetId) -> LedgerResult<Option<u64>> {
        let Some(bytes) = self.store.get(&last_transfer_height_key(asset_id)) else {
            return Ok(None);
        };
        let raw: [u8; 8] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| LedgerError::Store("malformed last transfer height".into()))?;
        Ok(Some(u64::from_be_bytes(raw)))
    }

    /// Records `msg.sender`'s vote and releases the funds once `votes_needed`
    /// distinct signers agree. A failed mint leaves the state untouched.
    pub fn inbound_transfer(&mut self, msg: &MsgInboundTransfer) -> LedgerResult<InboundVote> {
        msg.validate_basic()?;

        let params = self.params()?;
        if !params.is_signer(&msg.sender) {
            return Err(LedgerError::InvalidSigner(msg.sender.clone()));
        }
        let asset = params
            .get_asset(&msg.asset_id)
            .ok_or_else(|| LedgerError::InvalidAssetId(msg.asset_id.clone()))?;
        if !asset.status.inbound_enabled() {
            return Err(LedgerError::InvalidAssetStatus {
                asset: asset.id.clone(),
                status: asset.status,
            });
        }

        let mut record = self
            .get_inbound_transfer(&msg.external_id, msg.external_height)?
            .unwrap_or_else(|| InboundTransferRecord::from_msg(msg));
        if record.finalized {
            return Err(LedgerError::CantFinalizeTransfer {
                external_id: msg.external_id.clone(),
                external_height: msg.external_height,
            });
        }
        if record.voters.contains(&msg.sender) {
            return Err(LedgerError::AlreadyVoted {
                signer: msg.sender.clone(),
                external_id: msg.external_id.clone(),
            });
        }
        if !record.same_payload(msg) {
            return Err(LedgerError::InvalidRequest(format!(
                "vote for transfer {} does not match the recorded payload",
                msg.external_id
            )));
        }

        record.voters.push(msg.sender.clone());
        let votes = record.voters.len();
        let reached_quorum = votes as u64 >= params.votes_needed;

        if reached_quorum {
            let coin = Coin::new(self.bridged_denom(&record.asset_id), record.amount);
            self.token_factory
                .mint(&self.module_address, coin.clone(), &record.dest_addr)
                .map_err(LedgerError::TokenFactory)?;
            record.finalized = true;
            self.store.set(
                last_transfer_height_key(&record.asset_id),
                record.external_height.to_be_bytes().to_vec(),
            );
            info!(
                "[Keeper] Finalized inbound transfer {} at height {}: minted {} to {}",
                record.external_id, record.external_height, coin, record.dest_addr
            );
        } else {
            debug!(
                "[Keeper] Vote {}/{} from {} on transfer {}",
                votes, params.votes_needed, msg.sender, record.external_id
            );
        }

        self.set_inbound_transfer(record);
        Ok(InboundVote {
            votes,
            finalized: reached_quorum,
        })
    }

    /// Burns the sender's bridged tokens and returns the event the relayers pick up.
    pub fn outbound_transfer(
        &mut self,
        msg: &MsgOutboundTransfer,
    ) -> LedgerResult<EventOutboundTransfer> {
        msg.validate_basic()?;

        let params = self.params()?;
        let asset = params
            .get_asset(&msg.asset_id)
            .ok_or_else(|| LedgerError::InvalidAssetId(msg.asset_id.clone()))?;
        if !asset.status.outbound_enabled() {
            return Err(LedgerError::InvalidAssetStatus {
                asset: asset.id.clone(),
                status: asset.status,
            });
        }

        let coin = Coin::new(self.bridged_denom(&msg.asset_id), msg.amount);
        self.token_factory
            .burn(&self.module_address, coin, &msg.sender)
            .map_err(LedgerError::TokenFactory)?;

        Ok(EventOutboundTransfer {
            sender: msg.sender.clone(),
            dest_addr: msg.dest_addr.clone(),
            asset_id: msg.asset_id.clone(),
            amount: msg.amount,
        })
    }

    pub fn update_params(&mut self, msg: &MsgUpdateParams) -> LedgerResult<()> {
        msg.validate_basic()?;
        if msg.sender != self.authority {
            return Err(LedgerError::InvalidSigner(msg.sender.clone()));
        }
        self.set_params(&msg.new_params)?;
        info!("[Keeper] Params updated by {}", msg.sender);
        Ok(())
    }

    /// Returns the previous status of the asset.
    pub fn change_asset_status(&mut self, msg: &MsgChangeAssetStatus) -> LedgerResult<AssetStatus> {
        msg.validate_basic()?;
        if msg.sender != self.authority {
            return Err(LedgerError::InvalidSigner(msg.sender.clone()));
        }
        let mut params = self.params()?;
        let asset = params
            .get_asset_mut(&msg.asset_id)
            .ok_or_else(|| LedgerError::InvalidAssetId(msg.asset_id.clone()))?;
        let previous = std::mem::replace(&mut asset.status, msg.new_status);
        self.set_params(&params)?;
        info!(
            "[Keeper] Asset {} status changed {} -> {}",
            msg.asset_id, previous, msg.new_status
        );
        Ok(previous)
    }
}
