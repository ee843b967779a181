// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::error::{BridgeError, BridgeResult};
use async_trait::async_trait;
use cosmrs::crypto::secp256k1::SigningKey;
use osmosis_bridge_types::address::ACCOUNT_ADDRESS_PREFIX;
use std::path::Path;

/// Signs transaction bytes on behalf of an Osmosis account. Key material never
/// leaves the implementation.
#[async_trait]
pub trait Signer: Send + Sync + 'static {
    /// Compressed SEC1 secp256k1 public key of `address`.
    fn public_key(&self, address: &str) -> BridgeResult<Vec<u8>>;

    /// 64-byte `r || s` ECDSA signature over the SHA-256 of `sign_bytes`.
    async fn sign(&self, address: &str, sign_bytes: &[u8]) -> BridgeResult<Vec<u8>>;
}

/// A single secp256k1 key held in memory, loaded from a hex file.
pub struct LocalKeySigner {
    address: String,
    key: SigningKey,
}

impl LocalKeySigner {
    pub fn from_hex(hex_key: &str) -> BridgeResult<Self> {
        let bytes = hex::decode(hex_key.trim())
            .map_err(|e| BridgeError::InvalidConfig(format!("signer key is not hex: {e}")))?;
        let key = SigningKey::from_slice(&bytes)
            .map_err(|e| BridgeError::InvalidConfig(format!("invalid signer key: {e}")))?;
        let address = key
            .public_key()
            .account_id(ACCOUNT_ADDRESS_PREFIX)
            .map_err(|e| BridgeError::InvalidConfig(format!("invalid signer key: {e}")))?
            .to_string();
        Ok(Self { address, key })
    }

    pub fn from_file(path: &Path) -> BridgeResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            BridgeError::InvalidConfig(format!("can't read signer key {}: {e}", path.display()))
        })?;
        Self::from_hex(&content)
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    fn check_address(&self, address: &str) -> BridgeResult<()> {
        if address != self.address {
            return Err(BridgeError::Signing(format!("no key for {address}")));
        }
        Ok(())
    }
}

#[async_trait]
impl Signer for LocalKeySigner {
    fn public_key(&self, address: &str) -> BridgeResult<Vec<u8>> {
        self.check_address(address)?;
        Ok(self.key.public_key().to_bytes())
    }

    async fn sign(&self, address: &str, sign_bytes: &[u8]) -> BridgeResult<Vec<u8>> {
        self.check_address(address)?;
        let signature = self
            .key
            .sign(sign_bytes)
            .map_err(|e| BridgeError::Signing(e.to_string()))?;
        Ok(signature.to_bytes().to_vec())
    }
}
