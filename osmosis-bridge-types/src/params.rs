// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::address::validate_account_address;
use crate::error::{ValidationError, ValidationResult};
use crate::{
    Asset, AssetId, AssetStatus, DEFAULT_BITCOIN_CHAIN_NAME, DEFAULT_BITCOIN_CONFIRMATIONS,
    DEFAULT_BITCOIN_DENOM_NAME, DEFAULT_BITCOIN_EXPONENT, DEFAULT_VOTES_NEEDED,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Bridge module parameters. Read on every vote, written only through `MsgUpdateParams`
/// and `MsgChangeAssetStatus`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    // addresses allowed to vote on inbound transfers
    pub signers: Vec<String>,
    pub assets: Vec<Asset>,
    pub votes_needed: u64,
    pub fee: Decimal,
}

pub fn default_assets() -> Vec<Asset> {
    vec![Asset {
        id: AssetId::new(DEFAULT_BITCOIN_CHAIN_NAME, DEFAULT_BITCOIN_DENOM_NAME),
        status: AssetStatus::Ok,
        exponent: DEFAULT_BITCOIN_EXPONENT,
        external_confirmations: DEFAULT_BITCOIN_CONFIRMATIONS,
    }]
}

impl Default for Params {
    fn default() -> Self {
        Self {
            signers: vec![],
            assets: default_assets(),
            votes_needed: DEFAULT_VOTES_NEEDED,
            fee: Decimal::ZERO,
        }
    }
}

impl Params {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_signers(&self.signers)?;
        validate_assets(&self.assets)?;
        if self.fee < Decimal::ZERO || self.fee > Decimal::ONE {
            return Err(ValidationError::InvalidFee(self.fee.to_string()));
        }
        Ok(())
    }

    pub fn is_signer(&self, address: &str) -> bool {
        self.signers.iter().any(|s| s == address)
    }

    pub fn get_asset(&self, id: &AssetId) -> Option<&Asset> {
        self.assets.iter().find(|a| &a.id == id)
    }

    pub fn get_asset_mut(&mut self, id: &AssetId) -> Option<&mut Asset> {
        self.assets.iter_mut().find(|a| &a.id == id)
    }
}

// An empty signer set is valid: the bridge is then effectively paused.
fn validate_signers(signers: &[String]) -> ValidationResult<()> {
    let mut seen = HashSet::with_capacity(signers.len());
    for signer in signers {
        validate_account_address("signer", signer)?;
        if !seen.insert(signer.as_str()) {
            return Err(ValidationError::DuplicatedSigner(signer.clone()));
        }
    }
    Ok(())
}

fn validate_assets(assets: &[Asset]) -> ValidationResult<()> {
    if assets.is_empty() {
        return Err(ValidationError::NoAssets);
    }
    let mut seen = HashSet::with_capacity(assets.len());
    for asset in assets {
        asset.validate()?;
        if !seen.insert(&asset.id) {
            return Err(ValidationError::DuplicatedAsset(asset.id.clone()));
        }
    }
    Ok(())
}
