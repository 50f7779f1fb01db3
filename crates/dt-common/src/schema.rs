//! Output schema versioning.

/// Schema version stamped on every JSON payload emitted by dt-core.
///
/// Bump the minor version when fields are added, the major version when
/// fields are renamed or removed.
pub const SCHEMA_VERSION: &str = "1.0.0";
