// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Building and checking `SIGN_MODE_DIRECT` transactions.

use crate::error::{BridgeError, BridgeResult};
use cosmrs::proto::cosmos::auth::v1beta1::{BaseAccount, QueryAccountRequest, QueryAccountResponse};
use cosmrs::proto::cosmos::base::v1beta1::Coin;
use cosmrs::proto::cosmos::crypto::secp256k1::PubKey;
use cosmrs::proto::cosmos::tx::signing::v1beta1::SignMode;
use cosmrs::proto::cosmos::tx::v1beta1::{
    mode_info, AuthInfo, Fee, ModeInfo, SignDoc, SignerInfo, TxBody, TxRaw,
};
use cosmrs::Any;
use k256::ecdsa::signature::Verifier;
use k256::ecdsa::{Signature, VerifyingKey};
use osmosis_bridge_types::{proto, MsgInboundTransfer};
use prost::Message;

pub(crate) const QUERY_ACCOUNT_PATH: &str = "/cosmos.auth.v1beta1.Query/Account";
const SECP256K1_PUBKEY_TYPE_URL: &str = "/cosmos.crypto.secp256k1.PubKey";

/// Fee and chain settings shared by every transaction the relayer sends.
#[derive(Clone, Debug)]
pub struct TxSettings {
    pub chain_id: String,
    pub fee_denom: String,
    pub fee_amount: u128,
    pub gas_limit: u64,
}

pub(crate) fn account_query(address: &str) -> Vec<u8> {
    QueryAccountRequest {
        address: address.to_string(),
    }
    .encode_to_vec()
}

pub(crate) fn decode_account(response: &[u8]) -> BridgeResult<BaseAccount> {
    let response = QueryAccountResponse::decode(response)
        .map_err(|e| BridgeError::Query(format!("bad account response: {e}")))?;
    let account = response
        .account
        .ok_or_else(|| BridgeError::Query("account not found".into()))?;
    BaseAccount::decode(account.value.as_slice())
        .map_err(|e| BridgeError::Query(format!("bad account: {e}")))
}

pub(crate) fn inbound_transfer_any(msg: MsgInboundTransfer) -> Any {
    Any {
        type_url: MsgInboundTransfer::TYPE_URL.to_string(),
        value: proto::MsgInboundTransfer::from(msg).encode_to_vec(),
    }
}

/// The document whose encoding is signed by `public_key`'s owner.
pub(crate) fn sign_doc(
    messages: Vec<Any>,
    public_key: Vec<u8>,
    account: &BaseAccount,
    settings: &TxSettings,
) -> SignDoc {
    let body = TxBody {
        messages,
        ..Default::default()
    };
    let signer_info = SignerInfo {
        public_key: Some(Any {
            type_url: SECP256K1_PUBKEY_TYPE_URL.to_string(),
            value: PubKey { key: public_key }.encode_to_vec(),
        }),
        mode_info: Some(ModeInfo {
            sum: Some(mode_info::Sum::Single(mode_info::Single {
                mode: SignMode::Direct as i32,
            })),
        }),
        sequence: account.sequence,
    };
    let auth_info = AuthInfo {
        signer_infos: vec![signer_info],
        fee: Some(Fee {
            amount: vec![Coin {
                denom: settings.fee_denom.clone(),
                amount: settings.fee_amount.to_string(),
            }],
            gas_limit: settings.gas_limit,
            ..Default::default()
        }),
        ..Default::default()
    };
    SignDoc {
        body_bytes: body.encode_to_vec(),
        auth_info_bytes: auth_info.encode_to_vec(),
        chain_id: settings.chain_id.clone(),
        account_number: account.account_number,
    }
}

/// Checks `signature` against `public_key` before anything is broadcast.
pub(crate) fn verify_signature(
    public_key: &[u8],
    sign_bytes: &[u8],
    signature: &[u8],
) -> BridgeResult<()> {
    let key = VerifyingKey::from_sec1_bytes(public_key)
        .map_err(|e| BridgeError::Signing(format!("invalid public key: {e}")))?;
    let signature = Signature::from_slice(signature)
        .map_err(|e| BridgeError::Signing(format!("malformed signature: {e}")))?;
    key.verify(sign_bytes, &signature)
        .map_err(|_| BridgeError::Signing("signature doesn't match the signer key".into()))
}

pub(crate) fn tx_raw(sign_doc: SignDoc, signature: Vec<u8>) -> Vec<u8> {
    TxRaw {
        body_bytes: sign_doc.body_bytes,
        auth_info_bytes: sign_doc.auth_info_bytes,
        signatures: vec![signature],
    }
    .encode_to_vec()
}
