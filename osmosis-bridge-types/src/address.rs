// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Address helpers for both sides of the bridge.

use crate::error::{ValidationError, ValidationResult};
use bech32::{FromBase32, ToBase32, Variant};
use bitcoin::Network;
use sha2::{Digest, Sha256};
use std::str::FromStr;

/// Human readable part of Osmosis account addresses.
pub const ACCOUNT_ADDRESS_PREFIX: &str = "osmo";

fn invalid(field: &'static str, address: &str, reason: impl ToString) -> ValidationError {
    ValidationError::InvalidAddress {
        field,
        address: address.to_string(),
        reason: reason.to_string(),
    }
}

/// Decodes a bech32 account address and returns its raw bytes.
pub fn decode_account_address(field: &'static str, address: &str) -> ValidationResult<Vec<u8>> {
    if address.is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    let (hrp, data, variant) = bech32::decode(address).map_err(|e| invalid(field, address, e))?;
    if hrp != ACCOUNT_ADDRESS_PREFIX {
        return Err(invalid(field, address, format!("unexpected prefix {hrp}")));
    }
    if variant != Variant::Bech32 {
        return Err(invalid(field, address, "bech32m is not an account encoding"));
    }
    let bytes = Vec::<u8>::from_base32(&data).map_err(|e| invalid(field, address, e))?;
    // 20 bytes for key accounts, 32 for module derived accounts
    if bytes.len() != 20 && bytes.len() != 32 {
        return Err(invalid(
            field,
            address,
            format!("unexpected length {}", bytes.len()),
        ));
    }
    Ok(bytes)
}

pub fn validate_account_address(field: &'static str, address: &str) -> ValidationResult<()> {
    decode_account_address(field, address).map(|_| ())
}

pub fn encode_account_address(bytes: &[u8]) -> ValidationResult<String> {
    bech32::encode(ACCOUNT_ADDRESS_PREFIX, bytes.to_base32(), Variant::Bech32)
        .map_err(|e| ValidationError::Decode(format!("account address: {e}")))
}

/// Address of a module account: the first 20 bytes of `sha256(name)`.
pub fn module_address(name: &str) -> ValidationResult<String> {
    let digest = Sha256::digest(name.as_bytes());
    encode_account_address(&digest[..20])
}

/// Checks that `address` is a Bitcoin address. With `network` set, the
/// address must also belong to that network.
pub fn validate_bitcoin_address(
    field: &'static str,
    address: &str,
    network: Option<Network>,
) -> ValidationResult<bitcoin::Address<bitcoin::address::NetworkUnchecked>> {
    if address.is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    let parsed = bitcoin::Address::from_str(address).map_err(|e| invalid(field, address, e))?;
    if let Some(network) = network {
        if !parsed.is_valid_for_network(network) {
            return Err(invalid(
                field,
                address,
                format!("not an address of the {network} network"),
            ));
        }
    }
    Ok(parsed)
}

/// Destination of an outbound transfer: any Bitcoin address or an account address.
pub fn validate_external_address(field: &'static str, address: &str) -> ValidationResult<()> {
    if address.is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    if validate_bitcoin_address(field, address, None).is_ok() {
        return Ok(());
    }
    validate_account_address(field, address)
}
