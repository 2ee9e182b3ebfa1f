//! # Baitscope Pipeline
//!
//! Headline analytics behind the Baitscope dashboard.
//!
//! Records loaded from a delimited source flow through three stages:
//! [`select`] restricts them to a date interval and allow-lists, the
//! aggregators bucket them by key and calendar month, and the smoothers run
//! an EWMA or trailing mean over each series independently. [`Dashboard`]
//! wires the stages together, memoizes results in a [`QueryCache`] and hands
//! the charts to the rendering sink as a [`DashboardView`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod aggregator;
pub mod cache;
pub mod chart;
pub mod dashboard;
pub mod palette;
pub mod record;
pub mod selector;
pub mod smoother;
pub mod source;

pub use aggregator::*;
pub use cache::*;
pub use chart::*;
pub use dashboard::*;
pub use palette::*;
pub use record::*;
pub use selector::*;
pub use smoother::*;
pub use source::*;
