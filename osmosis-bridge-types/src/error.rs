// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::AssetId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("invalid {field} address {address:?}: {reason}")]
    InvalidAddress {
        field: &'static str,
        address: String,
        reason: String,
    },

    #[error("amount must be positive")]
    ZeroAmount,

    #[error("invalid amount {0:?}")]
    InvalidAmount(String),

    #[error("duplicated signer {0}")]
    DuplicatedSigner(String),

    #[error("assets must not be empty")]
    NoAssets,

    #[error("duplicated asset {0}")]
    DuplicatedAsset(AssetId),

    #[error("invalid asset status {0}")]
    InvalidAssetStatus(i32),

    #[error("invalid fee {0}: must be within [0, 1]")]
    InvalidFee(String),

    #[error("failed to decode {0}")]
    Decode(String),
}

pub type ValidationResult<T> = Result<T, ValidationError>;
