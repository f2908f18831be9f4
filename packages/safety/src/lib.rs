#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Parking safety scoring.
//!
//! Records from the three datasets are grouped by location
//! ([`aggregator`]), each group is analysed per dataset ([`infractions`],
//! [`street`], [`lots`]) and combined into a clamped score with a level,
//! reasoning and recommendations by the [`SafetyEngine`]. [`pipeline`]
//! wraps a run with the fingerprinted analysis cache and [`markers`] turns
//! results into map pins.

pub mod aggregator;
pub mod engine;
pub mod infractions;
pub mod lots;
pub mod markers;
pub mod pipeline;
pub mod recommendations;
pub mod score;
pub mod search;
pub mod street;

pub use aggregator::{LocationAggregator, LocationRecords};
pub use engine::SafetyEngine;
pub use pipeline::{AnalysisRun, CachePolicy, run_analysis};
pub use search::search_locations;

use parking_safety_source::SourceError;

/// Errors that can occur during an analysis run.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// Dataset loading failed.
    #[error(transparent)]
    Source(#[from] SourceError),
}
