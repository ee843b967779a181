// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Protobuf wire types of the `osmosis.bridge.v1beta1` package.
//!
//! Amounts travel as decimal integer strings and the fee as a legacy decimal,
//! i.e. an integer string scaled by 10^18.

use crate::error::{ValidationError, ValidationResult};
use crate::AssetStatus;
use rust_decimal::Decimal;

const LEGACY_DEC_PRECISION: u32 = 18;

pub const QUERY_PARAMS_PATH: &str = "/osmosis.bridge.v1beta1.Query/Params";

#[derive(Clone, PartialEq, Eq, Hash, prost::Message)]
pub struct AssetId {
    #[prost(string, tag = "1")]
    pub source_chain: String,
    #[prost(string, tag = "2")]
    pub denom: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Asset {
    #[prost(message, optional, tag = "1")]
    pub id: Option<AssetId>,
    #[prost(enumeration = "AssetStatus", tag = "2")]
    pub status: i32,
    #[prost(uint64, tag = "3")]
    pub exponent: u64,
    #[prost(uint64, tag = "4")]
    pub external_confirmations: u64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Params {
    #[prost(string, repeated, tag = "1")]
    pub signers: Vec<String>,
    #[prost(message, repeated, tag = "2")]
    pub assets: Vec<Asset>,
    #[prost(uint64, tag = "3")]
    pub votes_needed: u64,
    #[prost(string, tag = "4")]
    pub fee: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct MsgInboundTransfer {
    #[prost(string, tag = "1")]
    pub external_id: String,
    #[prost(uint64, tag = "2")]
    pub external_height: u64,
    #[prost(string, tag = "3")]
    pub sender: String,
    #[prost(string, tag = "4")]
    pub dest_addr: String,
    #[prost(message, optional, tag = "5")]
    pub asset_id: Option<AssetId>,
    #[prost(string, tag = "6")]
    pub amount: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct MsgOutboundTransfer {
    #[prost(string, tag = "1")]
    pub sender: String,
    #[prost(string, tag = "2")]
    pub dest_addr: String,
    #[prost(message, optional, tag = "3")]
    pub asset_id: Option<AssetId>,
    #[prost(string, tag = "4")]
    pub amount: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct MsgUpdateParams {
    #[prost(string, tag = "1")]
    pub sender: String,
    #[prost(message, optional, tag = "2")]
    pub new_params: Option<Params>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct MsgChangeAssetStatus {
    #[prost(string, tag = "1")]
    pub sender: String,
    #[prost(message, optional, tag = "2")]
    pub asset_id: Option<AssetId>,
    #[prost(enumeration = "AssetStatus", tag = "3")]
    pub new_status: i32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct QueryParamsRequest {}

#[derive(Clone, PartialEq, prost::Message)]
pub struct QueryParamsResponse {
    #[prost(message, optional, tag = "1")]
    pub params: Option<Params>,
}

/// Ledger record of the votes collected for one external transfer.
#[derive(Clone, PartialEq, prost::Message)]
pub struct InboundTransfer {
    #[prost(string, tag = "1")]
    pub external_id: String,
    #[prost(uint64, tag = "2")]
    pub external_height: u64,
    #[prost(string, tag = "3")]
    pub dest_addr: String,
    #[prost(message, optional, tag = "4")]
    pub asset_id: Option<AssetId>,
    #[prost(string, tag = "5")]
    pub amount: String,
    #[prost(string, repeated, tag = "6")]
    pub voters: Vec<String>,
    #[prost(bool, tag = "7")]
    pub finalized: bool,
}

pub fn parse_amount(raw: &str) -> ValidationResult<u128> {
    raw.parse::<u128>()
        .map_err(|_| ValidationError::InvalidAmount(raw.to_string()))
}

pub fn encode_legacy_dec(value: Decimal) -> ValidationResult<String> {
    let scale = Decimal::from(10u64.pow(LEGACY_DEC_PRECISION));
    value
        .checked_mul(scale)
        .map(|scaled| scaled.trunc().to_string())
        .ok_or_else(|| ValidationError::InvalidFee(value.to_string()))
}

pub fn decode_legacy_dec(raw: &str) -> ValidationResult<Decimal> {
    if raw.is_empty() {
        return Ok(Decimal::ZERO);
    }
    let atomics = raw
        .parse::<i128>()
        .map_err(|_| ValidationError::InvalidFee(raw.to_string()))?;
    Decimal::try_from_i128_with_scale(atomics, LEGACY_DEC_PRECISION)
        .map(|d| d.normalize())
        .map_err(|_| ValidationError::InvalidFee(raw.to_string()))
}

fn required<T>(value: Option<T>, field: &'static str) -> ValidationResult<T> {
    value.ok_or(ValidationError::Decode(format!("missing {field}")))
}

impl From<crate::AssetId> for AssetId {
    fn from(id: crate::AssetId) -> Self {
        Self {
            source_chain: id.source_chain,
            denom: id.denom,
        }
    }
}

impl From<AssetId> for crate::AssetId {
    fn from(id: AssetId) -> Self {
        crate::AssetId::new(id.source_chain, id.denom)
    }
}

impl From<crate::Asset> for Asset {
    fn from(asset: crate::Asset) -> Self {
        Self {
            id: Some(asset.id.into()),
            status: asset.status as i32,
            exponent: asset.exponent,
            external_confirmations: asset.external_confirmations,
        }
    }
}

impl TryFrom<Asset> for crate::Asset {
    type Error = ValidationError;

    fn try_from(asset: Asset) -> ValidationResult<Self> {
        let status = AssetStatus::try_from(asset.status)
            .map_err(|_| ValidationError::InvalidAssetStatus(asset.status))?;
        Ok(Self {
            id: required(asset.id, "asset id")?.into(),
            status,
            exponent: asset.exponent,
            external_confirmations: asset.external_confirmations,
        })
    }
}

impl TryFrom<crate::Params> for Params {
    type Error = ValidationError;

    fn try_from(params: crate::Params) -> ValidationResult<Self> {
        Ok(Self {
            fee: encode_legacy_dec(params.fee)?,
            signers: params.signers,
            assets: params.assets.into_iter().map(Into::into).collect(),
            votes_needed: params.votes_needed,
        })
    }
}

impl TryFrom<Params> for crate::Params {
    type Error = ValidationError;

    fn try_from(params: Params) -> ValidationResult<Self> {
        Ok(Self {
            fee: decode_legacy_dec(&params.fee)?,
            signers: params.signers,
            assets: params
                .assets
                .into_iter()
                .map(crate::Asset::try_from)
                .collect::<ValidationResult<_>>()?,
            votes_needed: params.votes_needed,
        })
    }
}

impl From<crate::MsgInboundTransfer> for MsgInboundTransfer {
    fn from(msg: crate::MsgInboundTransfer) -> Self {
        Self {
            external_id: msg.external_id,
            external_height: msg.external_height,
            sender: msg.sender,
            dest_addr: msg.dest_addr,
            asset_id: Some(msg.asset_id.into()),
            amount: msg.amount.to_string(),
        }
    }
}

impl TryFrom<MsgInboundTransfer> for crate::MsgInboundTransfer {
    type Error = ValidationError;

    fn try_from(msg: MsgInboundTransfer) -> ValidationResult<Self> {
        Ok(Self {
            amount: parse_amount(&msg.amount)?,
            asset_id: required(msg.asset_id, "asset id")?.into(),
            external_id: msg.external_id,
            external_height: msg.external_height,
            sender: msg.sender,
            dest_addr: msg.dest_addr,
        })
    }
}

impl From<crate::MsgOutboundTransfer> for MsgOutboundTransfer {
    fn from(msg: crate::MsgOutboundTransfer) -> Self {
        Self {
            sender: msg.sender,
            dest_addr: msg.dest_addr,
            asset_id: Some(msg.asset_id.into()),
            amount: msg.amount.to_string(),
        }
    }
}

impl TryFrom<MsgOutboundTransfer> for crate::MsgOutboundTransfer {
    type Error = ValidationError;

    fn try_from(msg: MsgOutboundTransfer) -> ValidationResult<Self> {
        Ok(Self {
            amount: parse_amount(&msg.amount)?,
            asset_id: required(msg.asset_id, "asset id")?.into(),
            sender: msg.sender,
            dest_addr: msg.dest_addr,
        })
    }
}

impl TryFrom<MsgChangeAssetStatus> for crate::MsgChangeAssetStatus {
    type Error = ValidationError;

    fn try_from(msg: MsgChangeAssetStatus) -> ValidationResult<Self> {
        Ok(Self {
            new_status: AssetStatus::from_wire(msg.new_status)?,
            asset_id: required(msg.asset_id, "asset id")?.into(),
            sender: msg.sender,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;
    use std::str::FromStr;

    #[test]
    fn test_legacy_dec_encoding() {
        let half = Decimal::from_str("0.5").unwrap();
        assert_eq!(encode_legacy_dec(half).unwrap(), "500000000000000000");
        assert_eq!(decode_legacy_dec("500000000000000000").unwrap(), half);
        assert_eq!(decode_legacy_dec("").unwrap(), Decimal::ZERO);
        assert_eq!(encode_legacy_dec(Decimal::ONE).unwrap(), "1000000000000000000");
        assert!(decode_legacy_dec("0.5").is_err());
    }

    #[test]
    fn test_params_response_decoding() {
        let params = crate::Params::default();
        let response = QueryParamsResponse {
            params: Some(Params::try_from(params.clone()).unwrap()),
        };
        let bytes = response.encode_to_vec();
        let decoded = QueryParamsResponse::decode(bytes.as_slice()).unwrap();
        let domain = crate::Params::try_from(decoded.params.unwrap()).unwrap();
        assert_eq!(domain, params);
    }

    #[test]
    fn test_change_asset_status_rejects_unknown_status() {
        let msg = MsgChangeAssetStatus {
            sender: "osmo1".into(),
            asset_id: Some(AssetId {
                source_chain: "bitcoin".into(),
                denom: "btc".into(),
            }),
            new_status: 10,
        };
        assert_eq!(
            crate::MsgChangeAssetStatus::try_from(msg),
            Err(ValidationError::InvalidAssetStatus(10))
        );
    }

    #[test]
    fn test_inbound_transfer_amount_parsing() {
        let msg = MsgInboundTransfer {
            external_id: "deadbeef".into(),
            external_height: 42,
            sender: "osmo1".into(),
            dest_addr: "osmo1".into(),
            asset_id: None,
            amount: "10".into(),
        };
        assert!(matches!(
            crate::MsgInboundTransfer::try_from(msg.clone()),
            Err(ValidationError::Decode(_))
        ));

        let msg = MsgInboundTransfer {
            asset_id: Some(AssetId {
                source_chain: "bitcoin".into(),
                denom: "btc".into(),
            }),
            amount: "-10".into(),
            ..msg
        };
        assert_eq!(
            crate::MsgInboundTransfer::try_from(msg),
            Err(ValidationError::InvalidAmount("-10".into()))
        );
    }
}
