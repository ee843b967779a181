// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Bridge module messages and their stateless validation.

use crate::address::{validate_account_address, validate_external_address};
use crate::error::{ValidationError, ValidationResult};
use crate::{AssetId, AssetStatus, Params};
use serde::{Deserialize, Serialize};

/// A signer's attestation that `amount` of `asset_id` was sent to the bridge
/// vault by external transaction `external_id` at `external_height`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgInboundTransfer {
    pub external_id: String,
    pub external_height: u64,
    // the voting signer, not the external sender
    pub sender: String,
    pub dest_addr: String,
    pub asset_id: AssetId,
    pub amount: u128,
}

impl MsgInboundTransfer {
    pub const TYPE_URL: &'static str = "/osmosis.bridge.v1beta1.MsgInboundTransfer";

    pub fn validate_basic(&self) -> ValidationResult<()> {
        if self.external_id.is_empty() {
            return Err(ValidationError::EmptyField("external id"));
        }
        validate_account_address("sender", &self.sender)?;
        validate_account_address("destination", &self.dest_addr)?;
        self.asset_id.validate_basic()?;
        if self.amount == 0 {
            return Err(ValidationError::ZeroAmount);
        }
        Ok(())
    }
}

/// Burns bridged tokens on Osmosis so the relayers release them on the asset's source chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgOutboundTransfer {
    pub sender: String,
    pub dest_addr: String,
    pub asset_id: AssetId,
    pub amount: u128,
}

impl MsgOutboundTransfer {
    pub const TYPE_URL: &'static str = "/osmosis.bridge.v1beta1.MsgOutboundTransfer";

    pub fn validate_basic(&self) -> ValidationResult<()> {
        validate_account_address("sender", &self.sender)?;
        validate_external_address("destination", &self.dest_addr)?;
        self.asset_id.validate_basic()?;
        if self.amount == 0 {
            return Err(ValidationError::ZeroAmount);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgUpdateParams {
    pub sender: String,
    pub new_params: Params,
}

impl MsgUpdateParams {
    pub const TYPE_URL: &'static str = "/osmosis.bridge.v1beta1.MsgUpdateParams";

    pub fn validate_basic(&self) -> ValidationResult<()> {
        validate_account_address("sender", &self.sender)?;
        self.new_params.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgChangeAssetStatus {
    pub sender: String,
    pub asset_id: AssetId,
    pub new_status: AssetStatus,
}

impl MsgChangeAssetStatus {
    pub const TYPE_URL: &'static str = "/osmosis.bridge.v1beta1.MsgChangeAssetStatus";

    pub fn validate_basic(&self) -> ValidationResult<()> {
        validate_account_address("sender", &self.sender)?;
        self.asset_id.validate_basic()?;
        if self.new_status == AssetStatus::Unspecified {
            return Err(ValidationError::InvalidAssetStatus(self.new_status as i32));
        }
        Ok(())
    }
}
