// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::error::{ValidationError, ValidationResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Compound key of a bridgeable asset: the chain it originates from and its denom there.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId {
    pub source_chain: String,
    pub denom: String,
}

impl AssetId {
    pub fn new(source_chain: impl Into<String>, denom: impl Into<String>) -> Self {
        Self {
            source_chain: source_chain.into(),
            denom: denom.into(),
        }
    }

    pub fn validate_basic(&self) -> ValidationResult<()> {
        if self.source_chain.is_empty() {
            return Err(ValidationError::EmptyField("asset source chain"));
        }
        if self.denom.is_empty() {
            return Err(ValidationError::EmptyField("asset denom"));
        }
        Ok(())
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.source_chain, self.denom)
    }
}

/// Whether transfers of an asset may move in a given direction.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    prost::Enumeration,
)]
#[repr(i32)]
#[serde(rename_all = "snake_case")]
pub enum AssetStatus {
    Unspecified = 0,
    Ok = 1,
    BlockedInbound = 2,
    BlockedOutbound = 3,
    BlockedBoth = 4,
}

impl AssetStatus {
    pub fn as_str_name(&self) -> &'static str {
        match self {
            AssetStatus::Unspecified => "ASSET_STATUS_UNSPECIFIED",
            AssetStatus::Ok => "ASSET_STATUS_OK",
            AssetStatus::BlockedInbound => "ASSET_STATUS_BLOCKED_INBOUND",
            AssetStatus::BlockedOutbound => "ASSET_STATUS_BLOCKED_OUTBOUND",
            AssetStatus::BlockedBoth => "ASSET_STATUS_BLOCKED_BOTH",
        }
    }

    /// Parses a wire value, rejecting unknown values and `Unspecified`.
    pub fn from_wire(value: i32) -> ValidationResult<Self> {
        match AssetStatus::try_from(value) {
            Ok(AssetStatus::Unspecified) | Err(_) => Err(ValidationError::InvalidAssetStatus(value)),
            Ok(status) => Ok(status),
        }
    }

    pub fn inbound_enabled(&self) -> bool {
        matches!(self, AssetStatus::Ok | AssetStatus::BlockedOutbound)
    }

    pub fn outbound_enabled(&self) -> bool {
        matches!(self, AssetStatus::Ok | AssetStatus::BlockedInbound)
    }
}

impl fmt::Display for AssetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub id: AssetId,
    pub status: AssetStatus,
    // precision of the asset on its source chain
    pub exponent: u64,
    // confirmation depth required on the source chain before relaying
    pub external_confirmations: u64,
}

impl Asset {
    pub fn validate(&self) -> ValidationResult<()> {
        self.id.validate_basic()?;
        if self.status == AssetStatus::Unspecified {
            return Err(ValidationError::InvalidAssetStatus(self.status as i32));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_directions() {
        let cases = vec![
            (AssetStatus::Unspecified, false, false),
            (AssetStatus::Ok, true, true),
            (AssetStatus::BlockedInbound, false, true),
            (AssetStatus::BlockedOutbound, true, false),
            (AssetStatus::BlockedBoth, false, false),
        ];
        for (status, inbound, outbound) in cases {
            assert_eq!(status.inbound_enabled(), inbound, "{status}");
            assert_eq!(status.outbound_enabled(), outbound, "{status}");
        }
    }

    #[test]
    fn test_status_from_wire() {
        assert_eq!(AssetStatus::from_wire(1), Ok(AssetStatus::Ok));
        assert_eq!(AssetStatus::from_wire(4), Ok(AssetStatus::BlockedBoth));
        assert_eq!(
            AssetStatus::from_wire(0),
            Err(ValidationError::InvalidAssetStatus(0))
        );
        assert_eq!(
            AssetStatus::from_wire(10),
            Err(ValidationError::InvalidAssetStatus(10))
        );
    }

    #[test]
    fn test_asset_validation() {
        let mut asset = Asset {
            id: AssetId::new("bitcoin", "btc"),
            status: AssetStatus::Ok,
            exponent: 8,
            external_confirmations: 6,
        };
        asset.validate().unwrap();

        asset.status = AssetStatus::Unspecified;
        assert!(asset.validate().is_err());

        asset.status = AssetStatus::Ok;
        asset.id.denom.clear();
        assert_eq!(
            asset.validate(),
            Err(ValidationError::EmptyField("asset denom"))
        );
    }
}
