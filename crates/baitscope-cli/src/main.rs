//! Baitscope - headline analytics dashboard generator

use anyhow::{Context, Result};
use baitscope_cli::{load_config, write_view, App, Args};
use baitscope_common::init_logging;
use clap::Parser;
use tracing::{error, info};

fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args).context("Failed to load configuration")?;

    init_logging(&config.logging).context("Failed to initialize logging")?;

    info!("Starting Baitscope v{}", env!("CARGO_PKG_VERSION"));

    let app = App::new(config);
    let view = app.run().inspect_err(|e| error!("Dashboard pass failed: {e}"))?;
    write_view(&view, args.output.as_deref(), args.pretty).context("Failed to write dashboard view")?;

    Ok(())
}
