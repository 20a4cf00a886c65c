//! Binary crate for the `skyclock` command-line clock & weather companion.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Wiring the weather services together
//! - Human-friendly output formatting

use clap::Parser;

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    skyclock_core::init()?;
    tracing::debug!("skyclock started");

    let cmd = cli::Cli::parse();
    cmd.run().await
}
