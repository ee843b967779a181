// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use osmosis_bridge_types::{AssetId, AssetStatus, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    // The message failed stateless validation
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    // The sender is not allowed to perform this action
    #[error("invalid signer {0}")]
    InvalidSigner(String),

    #[error("unknown asset {0}")]
    InvalidAssetId(AssetId),

    // The asset status forbids the requested direction
    #[error("asset {asset} has status {status}")]
    InvalidAssetStatus { asset: AssetId, status: AssetStatus },

    // The transfer is already finalized, the vote is not applied
    #[error("can't finalize transfer {external_id} at height {external_height}: already finalized")]
    CantFinalizeTransfer {
        external_id: String,
        external_height: u64,
    },

    // The signer has already voted on this pending transfer
    #[error("signer {signer} has already voted on transfer {external_id}")]
    AlreadyVoted { signer: String, external_id: String },

    #[error("tokenfactory error: {0}")]
    TokenFactory(String),

    #[error("store error: {0}")]
    Store(String),
}

impl LedgerError {
    /// Short label for logs and metrics
    pub fn error_type(&self) -> &'static str {
        match self {
            LedgerError::InvalidRequest(_) => "invalid_request",
            LedgerError::InvalidSigner(_) => "invalid_signer",
            LedgerError::InvalidAssetId(_) => "invalid_asset_id",
            LedgerError::InvalidAssetStatus { .. } => "invalid_asset_status",
            LedgerError::CantFinalizeTransfer { .. } => "cant_finalize_transfer",
            LedgerError::AlreadyVoted { .. } => "already_voted",
            LedgerError::TokenFactory(_) => "tokenfactory",
            LedgerError::Store(_) => "store",
        }
    }
}

impl From<ValidationError> for LedgerError {
    fn from(e: ValidationError) -> Self {
        LedgerError::InvalidRequest(e.to_string())
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;
