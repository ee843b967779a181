// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::error::{ValidationError, ValidationResult};
use crate::AssetId;
use serde::{Deserialize, Serialize};

/// Emitted by the bridge module when tokens are burned for an outbound transfer.
///
/// Typed events carry every field as a JSON encoded attribute value, e.g.
/// `amount = "\"10\""` and `asset_id = {"source_chain":"bitcoin","denom":"btc"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventOutboundTransfer {
    pub sender: String,
    pub dest_addr: String,
    pub asset_id: AssetId,
    pub amount: u128,
}

impl EventOutboundTransfer {
    pub const TYPE: &'static str = "osmosis.bridge.v1beta1.EventOutboundTransfer";

    pub fn to_attributes(&self) -> Vec<(String, String)> {
        let quoted = |v: &str| serde_json::Value::String(v.to_string()).to_string();
        vec![
            ("sender".to_string(), quoted(&self.sender)),
            ("dest_addr".to_string(), quoted(&self.dest_addr)),
            (
                "asset_id".to_string(),
                serde_json::json!({
                    "source_chain": self.asset_id.source_chain,
                    "denom": self.asset_id.denom,
                })
                .to_string(),
            ),
            ("amount".to_string(), quoted(&self.amount.to_string())),
        ]
    }

    pub fn from_attributes<'a, I>(attributes: I) -> ValidationResult<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut sender = None;
        let mut dest_addr = None;
        let mut asset_id = None;
        let mut amount = None;
        for (key, value) in attributes {
            match key {
                "sender" => sender = Some(decode::<String>(key, value)?),
                "dest_addr" => dest_addr = Some(decode::<String>(key, value)?),
                "asset_id" => asset_id = Some(decode::<AssetId>(key, value)?),
                "amount" => {
                    let raw = decode::<String>(key, value)?;
                    let parsed = raw
                        .parse::<u128>()
                        .map_err(|_| ValidationError::InvalidAmount(raw))?;
                    amount = Some(parsed);
                }
                // msg_index and other attributes added by the node
                _ => {}
            }
        }
        Ok(Self {
            sender: sender.ok_or(ValidationError::EmptyField("sender"))?,
            dest_addr: dest_addr.ok_or(ValidationError::EmptyField("dest_addr"))?,
            asset_id: asset_id.ok_or(ValidationError::EmptyField("asset_id"))?,
            amount: amount.ok_or(ValidationError::EmptyField("amount"))?,
        })
    }
}

fn decode<T: serde::de::DeserializeOwned>(key: &str, value: &str) -> ValidationResult<T> {
    serde_json::from_str(value).map_err(|e| ValidationError::Decode(format!("{key}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_node_attributes() {
        let attributes = vec![
            ("amount", "\"10\""),
            (
                "asset_id",
                "{\"source_chain\":\"bitcoin\",\"denom\":\"btc\"}",
            ),
            ("dest_addr", "\"2Mt1ttL5yffdfCGxpfxmceNE4CRUcAsBbgQ\""),
            ("sender", "\"osmo1pldlhnwegsj3lqkarz0e4flcsay3fuqgkd35ww\""),
            ("msg_index", "0"),
        ];
        let event = EventOutboundTransfer::from_attributes(attributes).unwrap();
        assert_eq!(event.amount, 10);
        assert_eq!(event.asset_id, AssetId::new("bitcoin", "btc"));
        assert_eq!(event.dest_addr, "2Mt1ttL5yffdfCGxpfxmceNE4CRUcAsBbgQ");
    }

    #[test]
    fn test_missing_or_malformed_attributes() {
        let missing = EventOutboundTransfer::from_attributes(vec![("sender", "\"osmo1\"")]);
        assert!(matches!(missing, Err(ValidationError::EmptyField(_))));

        let bad_amount = EventOutboundTransfer::from_attributes(vec![("amount", "\"-5\"")]);
        assert!(matches!(bad_amount, Err(ValidationError::InvalidAmount(_))));
    }

    #[test]
    fn test_attributes_are_readable_back() {
        let event = EventOutboundTransfer {
            sender: "osmo1sender".into(),
            dest_addr: "bc1qdest".into(),
            asset_id: AssetId::new("bitcoin", "btc"),
            amount: 1_000,
        };
        let attributes = event.to_attributes();
        let parsed = EventOutboundTransfer::from_attributes(
            attributes.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        )
        .unwrap();
        assert_eq!(parsed, event);
    }
}
