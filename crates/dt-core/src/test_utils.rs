//! Test utilities for dt-core.
//!
//! This module provides:
//! - Common assertions
//! - Builders for failing cells and device profiles
//! - CSV fixture writers for end-to-end tests

use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDateTime};
use dt_common::{DeviceId, ErrorKind, ErrorKindSet, FailingCell};

use crate::profile::DeviceFailureProfile;

// ============================================================================
// Macros (must be defined first for use in this module)
// ============================================================================

/// Assert that a Result is Ok and return the value.
#[macro_export]
macro_rules! assert_ok {
    ($expr:expr) => {
        match $expr {
            Ok(val) => val,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
    ($expr:expr, $msg:expr) => {
        match $expr {
            Ok(val) => val,
            Err(e) => panic!("{}: {:?}", $msg, e),
        }
    };
}

/// Assert that a Result is Err.
#[macro_export]
macro_rules! assert_err {
    ($expr:expr) => {
        match $expr {
            Ok(val) => panic!("Expected Err, got Ok: {:?}", val),
            Err(_) => {}
        }
    };
    ($expr:expr, $msg:expr) => {
        match $expr {
            Ok(val) => panic!("{}: got Ok({:?})", $msg, val),
            Err(_) => {}
        }
    };
}

/// Assert that two floating point numbers are approximately equal.
#[macro_export]
macro_rules! assert_approx_eq {
    ($a:expr, $b:expr) => {
        $crate::assert_approx_eq!($a, $b, 1e-6_f64)
    };
    ($a:expr, $b:expr, $epsilon:expr) => {{
        let a: f64 = $a;
        let b: f64 = $b;
        let eps: f64 = $epsilon;
        let diff = (a - b).abs();
        if diff > eps {
            panic!(
                "assertion failed: `(left ~= right)` (left: `{}`, right: `{}`, diff: `{}`, epsilon: `{}`)",
                a, b, diff, eps
            );
        }
    }};
}

// ============================================================================
// Builders
// ============================================================================

/// Fixed reference instant all builder timestamps are offset from.
pub fn base_time() -> NaiveDateTime {
    NaiveDateTime::parse_from_str("2020-01-01 00:00:00", "%Y-%m-%d %H:%M:%S")
        .unwrap_or(NaiveDateTime::MIN)
}

/// `base_time()` plus `hours`.
pub fn hours(hours: i64) -> NaiveDateTime {
    base_time() + Duration::hours(hours)
}

/// Fluent builder for a [`DeviceFailureProfile`].
#[derive(Debug, Clone)]
pub struct ProfileBuilder {
    device: DeviceId,
    model: String,
    manufacturer: String,
    kind: ErrorKind,
    from: i64,
    to: i64,
    cells: Vec<FailingCell>,
}

impl ProfileBuilder {
    pub fn new(sid: &str, memory_id: u32) -> Self {
        ProfileBuilder {
            device: DeviceId::new(sid, memory_id),
            model: "B1".to_string(),
            manufacturer: "M1".to_string(),
            kind: ErrorKind::Read,
            from: 0,
            to: 0,
            cells: Vec::new(),
        }
    }

    pub fn model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn manufacturer(mut self, manufacturer: &str) -> Self {
        self.manufacturer = manufacturer.to_string();
        self
    }

    /// Kind stamped on cells added after this call.
    pub fn kind(mut self, kind: ErrorKind) -> Self {
        self.kind = kind;
        self
    }

    /// Observation window (hours from `base_time`) for cells added after this call.
    pub fn window(mut self, from: i64, to: i64) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    pub fn cell(mut self, rank: u32, bank: u32, row: u32, col: u32) -> Self {
        self.cells.push(FailingCell {
            device: self.device.clone(),
            rank,
            bank,
            row,
            col,
            first_seen: hours(self.from),
            last_seen: hours(self.to),
            count: 1,
            kinds: ErrorKindSet::single(self.kind),
        });
        self
    }

    /// One cell per row in a single column of rank 0, bank 0.
    pub fn rows(self, rows: &[u32], col: u32) -> Self {
        rows.iter().fold(self, |b, &row| b.cell(0, 0, row, col))
    }

    /// Panics when no cell was added.
    pub fn build(self) -> DeviceFailureProfile {
        DeviceFailureProfile::new(self.device, self.model, self.manufacturer, self.cells)
            .unwrap_or_else(|| panic!("profile builder needs at least one cell"))
    }
}

/// Single-column profile with the given rows.
pub fn profile_from_rows(sid: &str, memory_id: u32, rows: &[u32], col: u32) -> DeviceFailureProfile {
    ProfileBuilder::new(sid, memory_id).rows(rows, col).build()
}

/// Single-column profile observed over `[from, to]` hours.
pub fn profile_at(sid: &str, memory_id: u32, rows: &[u32], from: i64, to: i64) -> DeviceFailureProfile {
    ProfileBuilder::new(sid, memory_id)
        .window(from, to)
        .rows(rows, 1)
        .build()
}

// ============================================================================
// CSV fixtures
// ============================================================================

pub const EVENTS_HEADER: &str = "sid,memoryid,rankid,bankid,row,col,error_type,error_time";
pub const INVENTORY_HEADER: &str = "sid,DRAM_model,DIMM_number,server_manufacturer";
pub const TICKETS_HEADER: &str = "sid,failure_type";

/// Write `header` plus `rows` to `dir/name`.
pub fn write_csv(dir: &Path, name: &str, header: &str, rows: &[String]) -> PathBuf {
    let mut content = String::from(header);
    content.push('\n');
    for row in rows {
        content.push_str(row);
        content.push('\n');
    }
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap_or_else(|e| panic!("write {}: {}", path.display(), e));
    path
}

/// One event line with `error_type` read and a time `hours` after `base_time`.
pub fn event_line(sid: &str, memory_id: u32, rank: u32, bank: u32, row: u32, col: u32, at: i64) -> String {
    format!(
        "{},{},{},{},{},{},1,{}",
        sid,
        memory_id,
        rank,
        bank,
        row,
        col,
        hours(at).format("%Y-%m-%d %H:%M:%S")
    )
}
