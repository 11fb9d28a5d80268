//! Removes PCR duplicates from single-end SAM files using the UMI in the read name.

use anyhow::Result;
use clap::Parser;

mod app;
pub mod cigar;
pub mod dedup;
pub mod dups;
pub mod io;
pub mod metrics;
pub mod position;
pub mod record;
pub mod umis;

use app::{App, Config};

/// Initializes the logger, info level unless `-q` or `-v` is given.
fn init_log(config: &Config) -> Result<()> {
    stderrlog::new()
        .module(module_path!())
        .quiet(config.quiet)
        .verbosity(2 + usize::from(config.verbose))
        .timestamp(stderrlog::Timestamp::Off)
        .init()?;
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let config = Config::parse();
    init_log(&config)?;

    let mut app = App::new(config).await?;
    app.run().await?;

    Ok(())
}
