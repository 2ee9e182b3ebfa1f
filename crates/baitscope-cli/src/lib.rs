//! # Baitscope CLI
//!
//! Command line front end for the headline analytics pipeline.
//!
//! Reads the configuration, layers the command line flags over it, runs one
//! dashboard pass and writes the resulting view as JSON for a rendering sink.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod app;
pub mod args;
pub mod error;

pub use app::*;
pub use args::*;
pub use error::*;

use baitscope_config::{Config, ConfigLoader};

/// Configuration from `--config` when given, else the usual lookup, with the flags applied.
pub fn load_config(args: &Args) -> CliResult<Config> {
    let mut config = match &args.config {
        Some(path) => ConfigLoader::load_config(path)?,
        None => ConfigLoader::load()?,
    };
    args.apply(&mut config);
    config.validate()?;
    Ok(config)
}
