//! # Baitscope Common
//!
//! Shared types, utilities, and common functionality for Baitscope.
//!
//! This crate provides the closed vocabularies (categories, indicators), the
//! workspace error type, logging bootstrap and parsing helpers used by every
//! other crate in the workspace.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod logging;
pub mod types;
pub mod utils;

#[cfg(any(test, feature = "testing"))]
pub mod test_utils;

pub use error::*;
pub use logging::*;
pub use types::*;
pub use utils::*;
