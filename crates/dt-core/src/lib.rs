//! DRAM fault triage core library.
//!
//! This crate provides the classification engine for memory error logs:
//! - CSV ingest of error events, inventory and trouble tickets
//! - Aggregation of raw events into unique failing cells
//! - Per-device failure profiles
//! - The failure-mechanism classifier
//! - Category, summary and FIT reports

pub mod aggregate;
pub mod classify;
pub mod config;
pub mod exit_codes;
pub mod ingest;
pub mod logging;
pub mod pipeline;
pub mod profile;
pub mod report;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use classify::Classifier;
pub use pipeline::{run_pipeline, CategoryRow, PipelineOutput, RunStats};
pub use profile::{DeviceFailureProfile, DeviceFeatures};
