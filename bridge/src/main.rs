// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use clap::Parser;
use osmosis_bridge::config::BridgeNodeConfig;
use osmosis_bridge::node::run_bridge_node;
use osmosis_bridge_config::Config;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[clap(rename_all = "kebab-case")]
#[clap(name = env!("CARGO_BIN_NAME"))]
#[clap(version = VERSION)]
struct Args {
    #[clap(long)]
    pub config_path: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = BridgeNodeConfig::load(&args.config_path)?;
    info!("Loaded config from {:?}", args.config_path);

    let registry = prometheus::Registry::new();
    let node = run_bridge_node(config, VERSION, registry).await?;

    tokio::signal::ctrl_c().await?;
    info!("Received Ctrl-C, shutting down");
    node.stop().await
}
