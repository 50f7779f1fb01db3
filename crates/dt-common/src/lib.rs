//! DRAM fault triage common types, IDs, and errors.
//!
//! This crate provides foundational types shared across dt-core modules:
//! - Device identity types (server id + memory module id)
//! - Raw error events and aggregated failing cells
//! - The failure-mechanism category taxonomy
//! - Common error types
//! - Output formats for command payloads

pub mod categories;
pub mod error;
pub mod id;
pub mod output;
pub mod records;
pub mod schema;

pub use categories::{Category, LogicalClass, Mechanism, Permanency};
pub use error::{Error, Result};
pub use id::{DeviceId, ServerId};
pub use output::OutputFormat;
pub use records::{CellCoord, ErrorEvent, ErrorKind, ErrorKindSet, FailingCell};
pub use schema::SCHEMA_VERSION;
