// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Recognition of bridge deposits in plain Bitcoin transactions.
//!
//! Bitcoin has no notion of a transfer sender or recipient, so both are
//! inferred: the sender is the owner of the output spent by the first input,
//! the destination is the first paying output that doesn't go back to the
//! sender. Multi-input transactions are assumed to have a single owner.

use super::rpc::{BitcoinRpc, RawTransaction, TxOutput};
use crate::error::{BridgeError, BridgeResult};
use crate::types::Transfer;
use bitcoin::{Address, Amount, Network, ScriptBuf};
use osmosis_bridge_types::{AssetId, ChainId, DEFAULT_BITCOIN_CHAIN_NAME, DEFAULT_BITCOIN_DENOM_NAME};

const NULLDATA: &str = "nulldata";

fn is_nulldata(output: &TxOutput) -> bool {
    output.script_pub_key.kind.eq_ignore_ascii_case(NULLDATA)
}

/// The single address an output pays to, if its script has one.
pub(crate) fn output_address(output: &TxOutput, network: Network) -> Option<Address> {
    if is_nulldata(output) || output.script_pub_key.hex.is_empty() {
        return None;
    }
    let script = ScriptBuf::from_bytes(hex::decode(&output.script_pub_key.hex).ok()?);
    Address::from_script(&script, network).ok()
}

/// Whether any output of `tx` pays to `vault`.
pub(crate) fn pays_to(tx: &RawTransaction, vault: &Address, network: Network) -> bool {
    tx.vout
        .iter()
        .filter_map(|output| output_address(output, network))
        .any(|address| &address == vault)
}

/// Resolves the address owning the output spent by the first input.
pub(crate) async fn infer_sender<R>(
    rpc: &R,
    tx: &RawTransaction,
    network: Network,
) -> BridgeResult<Address>
where
    R: BitcoinRpc + ?Sized,
{
    let input = tx
        .vin
        .first()
        .ok_or_else(|| BridgeError::Parse("transaction has no inputs".into()))?;
    let (prev_txid, prev_vout) = match (&input.txid, input.vout) {
        (Some(txid), Some(vout)) => (txid, vout),
        _ => return Err(BridgeError::Parse("coinbase transaction has no sender".into())),
    };

    // An unknown previous transaction stays unknown on retry
    let prev = rpc
        .get_raw_transaction(prev_txid)
        .await
        .map_err(|e| match e {
            BridgeError::TransactionNotFound(txid) => {
                BridgeError::Parse(format!("previous transaction {txid} not found"))
            }
            other => other,
        })?;
    let spent = prev
        .vout
        .iter()
        .find(|output| output.n == prev_vout)
        .ok_or_else(|| {
            BridgeError::Parse(format!("output {prev_vout} not found in {prev_txid}"))
        })?;
    output_address(spent, network).ok_or_else(|| {
        BridgeError::Parse(format!(
            "output {prev_vout} of {prev_txid} has no single address"
        ))
    })
}

/// First non-memo, non-zero output paying to someone other than `sender`.
pub(crate) fn infer_destination(
    tx: &RawTransaction,
    sender: &Address,
    network: Network,
) -> BridgeResult<(Address, Amount)> {
    tx.vout
        .iter()
        .filter(|output| !is_nulldata(output) && output.value > Amount::ZERO)
        .find_map(|output| {
            output_address(output, network)
                .filter(|address| address != sender)
                .map(|address| (address, output.value))
        })
        .ok_or_else(|| BridgeError::Parse("no output to a third party".into()))
}

/// Decodes the data of the first `OP_RETURN <data>` output.
pub(crate) fn extract_memo(tx: &RawTransaction) -> BridgeResult<String> {
    tx.vout
        .iter()
        .filter(|output| is_nulldata(output))
        .find_map(|output| {
            let fields: Vec<&str> = output.script_pub_key.asm.split_whitespace().collect();
            match fields.as_slice() {
                [_, data] => hex::decode(data)
                    .ok()
                    .and_then(|bytes| String::from_utf8(bytes).ok()),
                _ => None,
            }
        })
        .ok_or_else(|| BridgeError::Parse("no decodable memo".into()))
}

/// Turns `tx` into a transfer to Osmosis if it is a deposit to `vault`.
///
/// `Ok(None)` means the transaction is unrelated to the bridge. `Parse` errors
/// mean it looks like a deposit but can't be routed. Other errors come from
/// the node and are worth retrying.
pub(crate) async fn parse_transfer<R>(
    rpc: &R,
    tx: &RawTransaction,
    height: u64,
    vault: &Address,
    network: Network,
) -> BridgeResult<Option<Transfer>>
where
    R: BitcoinRpc + ?Sized,
{
    // cheap check before the sender lookup round trip
    if !pays_to(tx, vault, network) {
        return Ok(None);
    }

    let sender = infer_sender(rpc, tx, network).await?;
    let (destination, amount) = infer_destination(tx, &sender, network)?;
    if &destination != vault {
        return Ok(None);
    }
    let memo = extract_memo(tx)?;

    let transfer = Transfer {
        source_chain: ChainId::Bitcoin,
        dest_chain: ChainId::Osmosis,
        external_id: tx.txid.clone(),
        height,
        sender: sender.to_string(),
        destination: memo,
        asset_id: AssetId::new(DEFAULT_BITCOIN_CHAIN_NAME, DEFAULT_BITCOIN_DENOM_NAME),
        amount: u128::from(amount.to_sat()),
    };
    transfer.validate_addresses(network)?;
    Ok(Some(transfer))
}
