// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use osmosis_bridge_types::{ChainId, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    // The RPC endpoint could not be reached during start-up
    #[error("connection error: {0}")]
    Connection(String),
    // The requested block does not exist yet
    #[error("block {0} is not available yet")]
    BlockUnavailable(u64),
    // Transient RPC failure
    #[error("rpc error: {0}")]
    Rpc(String),
    // The node does not know the transaction, e.g. pruned or no txindex
    #[error("transaction {0} not found")]
    TransactionNotFound(String),
    // A transaction or event could not be interpreted
    #[error("parse error: {0}")]
    Parse(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("signing error: {0}")]
    Signing(String),
    #[error("query error: {0}")]
    Query(String),
    // The node rejected the transaction
    #[error("broadcast error: {0}")]
    Broadcast(String),
    #[error("operation not supported: {0}")]
    Unsupported(String),
    #[error("unknown chain {0}")]
    UnknownChain(ChainId),
    #[error("{0}")]
    Generic(String),
}

impl BridgeError {
    /// Returns a short string identifying the error type for metrics labels
    pub fn error_type(&self) -> &'static str {
        match self {
            BridgeError::Connection(_) => "connection",
            BridgeError::BlockUnavailable(_) => "block_unavailable",
            BridgeError::Rpc(_) => "rpc",
            BridgeError::TransactionNotFound(_) => "transaction_not_found",
            BridgeError::Parse(_) => "parse",
            BridgeError::InvalidConfig(_) => "invalid_config",
            BridgeError::Signing(_) => "signing",
            BridgeError::Query(_) => "query",
            BridgeError::Broadcast(_) => "broadcast",
            BridgeError::Unsupported(_) => "unsupported",
            BridgeError::UnknownChain(_) => "unknown_chain",
            BridgeError::Generic(_) => "generic",
        }
    }
}

impl From<ValidationError> for BridgeError {
    fn from(e: ValidationError) -> Self {
        BridgeError::Parse(e.to_string())
    }
}

pub type BridgeResult<T> = Result<T, BridgeError>;
