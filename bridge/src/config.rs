// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::bitcoin::{BitcoinClientConfig, BitcoinCoreRpc};
use crate::osmosis::{CometRpc, LocalKeySigner, Mode, OsmosisClientConfig, TxSettings};
use anyhow::{anyhow, bail};
use bitcoin::address::NetworkUnchecked;
use bitcoin::{Address, Network};
use osmosis_bridge_config::Config;
use osmosis_bridge_types::address::validate_account_address;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr, PickFirst};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// How long `start` keeps trying to reach a node.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BitcoinConfig {
    // Bitcoin Core JSON-RPC endpoint, the node must run with -txindex
    pub rpc_url: String,
    pub rpc_user: String,
    pub rpc_password: String,
    pub network: Network,
    // Address receiving all deposits to the bridge
    pub vault_address: String,
    // First block to scan
    pub start_height: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    // Confirmations required before a transfer is released on Bitcoin
    #[serde(default = "default_confirmations")]
    pub confirmations: u64,
}

#[serde_as]
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct OsmosisConfig {
    pub chain_id: String,
    // CometBFT RPC, used for queries and broadcasting
    pub rpc_url: String,
    // CometBFT websocket endpoint for block subscriptions
    pub websocket_url: String,
    pub mode: Mode,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub min_outbound_transfer_amount: u128,
    // Account voting for inbound transfers
    pub validator_address: String,
    // Hex encoded secp256k1 key of the validator account
    pub signer_key_path: PathBuf,
    #[serde(default = "default_fee_denom")]
    pub fee_denom: String,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    #[serde(default = "default_fee_amount")]
    pub fee_amount: u128,
    #[serde(default = "default_gas_limit")]
    pub gas_limit: u64,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BridgeNodeConfig {
    // The port for the metrics server.
    pub metrics_port: u16,
    #[serde(default = "default_dispatch_interval_ms")]
    pub dispatch_interval_ms: u64,
    pub bitcoin: BitcoinConfig,
    pub osmosis: OsmosisConfig,
}

fn default_poll_interval_ms() -> u64 {
    5000
}

fn default_confirmations() -> u64 {
    osmosis_bridge_types::DEFAULT_BITCOIN_CONFIRMATIONS
}

fn default_dispatch_interval_ms() -> u64 {
    5000
}

fn default_fee_denom() -> String {
    "uosmo".to_string()
}

fn default_fee_amount() -> u128 {
    1000
}

fn default_gas_limit() -> u64 {
    200_000
}

impl Config for BridgeNodeConfig {}

/// Everything the node needs to run, built from a validated [`BridgeNodeConfig`].
pub struct BridgeRuntimeConfig {
    pub metrics_port: u16,
    pub dispatch_interval: Duration,
    pub bitcoin_rpc: BitcoinCoreRpc,
    pub bitcoin: BitcoinClientConfig,
    pub osmosis_rpc: CometRpc,
    pub osmosis: OsmosisClientConfig,
    pub signer: LocalKeySigner,
}

impl BridgeNodeConfig {
    pub fn validate(&self) -> anyhow::Result<BridgeRuntimeConfig> {
        info!("Starting config validation");
        if self.dispatch_interval_ms == 0 {
            bail!("dispatch-interval-ms must be positive");
        }
        if self.bitcoin.poll_interval_ms == 0 {
            bail!("bitcoin poll-interval-ms must be positive");
        }

        let btc = &self.bitcoin;
        if btc.vault_address.is_empty() {
            bail!("bitcoin vault-address is empty");
        }
        btc.vault_address
            .parse::<Address<NetworkUnchecked>>()
            .map_err(|e| anyhow!("invalid bitcoin vault-address {}: {}", btc.vault_address, e))?
            .require_network(btc.network)
            .map_err(|e| anyhow!("bitcoin vault-address is not a {} address: {}", btc.network, e))?;
        let bitcoin_rpc = BitcoinCoreRpc::new(&btc.rpc_url, &btc.rpc_user, &btc.rpc_password)
            .map_err(|e| anyhow!("bitcoin rpc: {}", e))?;

        let osmo = &self.osmosis;
        validate_account_address("validator-address", &osmo.validator_address)
            .map_err(|e| anyhow!("invalid osmosis validator-address: {}", e))?;
        let signer = LocalKeySigner::from_file(&osmo.signer_key_path)
            .map_err(|e| anyhow!("osmosis signer: {}", e))?;
        if signer.address() != osmo.validator_address {
            bail!(
                "signer key at {:?} belongs to {}, not to validator {}",
                osmo.signer_key_path,
                signer.address(),
                osmo.validator_address
            );
        }
        let osmosis_rpc = CometRpc::new(&osmo.rpc_url, &osmo.websocket_url)
            .map_err(|e| anyhow!("osmosis rpc: {}", e))?;
        info!(
            "Loaded signer key for validator {} from {:?}",
            osmo.validator_address, osmo.signer_key_path
        );

        Ok(BridgeRuntimeConfig {
            metrics_port: self.metrics_port,
            dispatch_interval: Duration::from_millis(self.dispatch_interval_ms),
            bitcoin_rpc,
            bitcoin: BitcoinClientConfig {
                network: btc.network,
                vault_address: btc.vault_address.clone(),
                start_height: btc.start_height,
                poll_interval: Duration::from_millis(btc.poll_interval_ms),
                confirmations: btc.confirmations,
                connect_timeout: CONNECT_TIMEOUT,
            },
            osmosis_rpc,
            osmosis: OsmosisClientConfig {
                mode: osmo.mode,
                min_outbound_transfer_amount: osmo.min_outbound_transfer_amount,
                validator_address: osmo.validator_address.clone(),
                tx: TxSettings {
                    chain_id: osmo.chain_id.clone(),
                    fee_denom: osmo.fee_denom.clone(),
                    fee_amount: osmo.fee_amount,
                    gas_limit: osmo.gas_limit,
                },
                connect_timeout: CONNECT_TIMEOUT,
            },
            signer,
        })
    }
}
