//! Server and device identity types.
//!
//! A device (one memory module) is uniquely identified by the
//! (server id, memory module id) pair. Server ids are opaque strings
//! taken verbatim from the input logs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Server identifier ("sid" in the error logs).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerId(pub String);

impl ServerId {
    pub fn new(sid: impl Into<String>) -> Self {
        ServerId(sid.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ServerId {
    fn from(sid: &str) -> Self {
        ServerId(sid.to_string())
    }
}

/// Device identity: one memory module on one server.
///
/// Ordering is (sid, memory_id), which is also the order in which
/// aggregated cells and category tables are emitted.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DeviceId {
    pub sid: ServerId,
    #[serde(rename = "memoryid")]
    pub memory_id: u32,
}

impl DeviceId {
    pub fn new(sid: impl Into<String>, memory_id: u32) -> Self {
        DeviceId {
            sid: ServerId(sid.into()),
            memory_id,
        }
    }

    /// Parse the `sid/memoryid` display form.
    pub fn parse(s: &str) -> Option<Self> {
        let (sid, mem) = s.rsplit_once('/')?;
        if sid.is_empty() {
            return None;
        }
        let memory_id = mem.parse::<u32>().ok()?;
        Some(DeviceId::new(sid, memory_id))
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.sid, self.memory_id)
    }
}
