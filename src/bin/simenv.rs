//! simenv - polling environment for agent simulations
//!
//! Usage:
//!   simenv --host localhost --port 4000 --room S1 --room S2
//!
//! Polls `conv_<room>.action` on every interval and nudges
//! `temp_<room>.temperature` through the memory service. Ctrl-C stops all
//! workers and exits.

use clap::Parser;
use simenv::cli::{self, Cli};
use simenv::logging;
use simenv_memory::HttpMemoryClient;
use simenv_runtime::CancellationToken;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.json_logs);

    let config = cli.effective_config();
    if cli.dump_config {
        println!("{}", config.to_toml());
        return Ok(());
    }

    let memory = Arc::new(HttpMemoryClient::from_config(&config.memory)?);
    info!("Memory service at {}", memory.base_url());

    let cancel = CancellationToken::new();
    tokio::spawn(cli::handle_interrupts(cancel.clone()));

    cli::run(&config, memory, cancel).await
}
