//! fsfactory: assemble filesystems from config and call them by name.
//!
//! Logs go to stderr (set `RUST_LOG` to change the level); results are
//! printed to stdout as JSON.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use fsfactory_cli::{Cli, run};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("fsfactory=info".parse()?))
        .init();

    let cli = Cli::parse();
    let out = run(cli).await?;
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
