//! Raw error events and aggregated failing cells.
//!
//! An [`ErrorEvent`] is one line of the memory error log. Events are
//! collapsed per physical location into [`FailingCell`]s, which are the
//! unit every classification rule reasons about.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::id::DeviceId;

/// Kind of access that surfaced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Read,
    Scrub,
    Write,
}

impl ErrorKind {
    pub fn all() -> &'static [ErrorKind] {
        &[ErrorKind::Read, ErrorKind::Scrub, ErrorKind::Write]
    }

    /// Decode the numeric `error_type` column (1=read, 2=scrub, 3=write).
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(ErrorKind::Read),
            2 => Some(ErrorKind::Scrub),
            3 => Some(ErrorKind::Write),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            ErrorKind::Read => 1,
            ErrorKind::Scrub => 2,
            ErrorKind::Write => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::Read => "read",
            ErrorKind::Scrub => "scrub",
            ErrorKind::Write => "write",
        }
    }

    fn bit(self) -> u8 {
        1 << (self.code() - 1)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Set of error kinds observed for a cell or a device.
///
/// Rendered with the compound labels used in the category tables:
/// `read`, `scrub`, `write`, `read_scrub`, `read_write`, `scrub_write`,
/// `read_scrub_write` (and `none` for the empty set).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ErrorKindSet(u8);

impl ErrorKindSet {
    pub const EMPTY: ErrorKindSet = ErrorKindSet(0);

    pub fn single(kind: ErrorKind) -> Self {
        ErrorKindSet(kind.bit())
    }

    pub fn insert(&mut self, kind: ErrorKind) {
        self.0 |= kind.bit();
    }

    pub fn union(self, other: ErrorKindSet) -> Self {
        ErrorKindSet(self.0 | other.0)
    }

    pub fn contains(self, kind: ErrorKind) -> bool {
        self.0 & kind.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True when the set holds exactly `kind` and nothing else.
    pub fn is_only(self, kind: ErrorKind) -> bool {
        self.0 == kind.bit()
    }

    pub fn iter(self) -> impl Iterator<Item = ErrorKind> {
        ErrorKind::all()
            .iter()
            .copied()
            .filter(move |k| self.contains(*k))
    }

    pub fn label(self) -> String {
        if self.is_empty() {
            return "none".to_string();
        }
        self.iter().map(ErrorKind::name).collect::<Vec<_>>().join("_")
    }

    /// Parse a compound label such as `read_write`.
    pub fn parse(label: &str) -> Option<Self> {
        if label == "none" {
            return Some(ErrorKindSet::EMPTY);
        }
        let mut set = ErrorKindSet::EMPTY;
        let mut last: Option<ErrorKind> = None;
        for part in label.split('_') {
            let kind = match part {
                "read" => ErrorKind::Read,
                "scrub" => ErrorKind::Scrub,
                "write" => ErrorKind::Write,
                _ => return None,
            };
            // Labels are canonical: ascending and without repeats.
            if last.is_some_and(|prev| prev >= kind) {
                return None;
            }
            set.insert(kind);
            last = Some(kind);
        }
        Some(set)
    }
}

impl FromIterator<ErrorKind> for ErrorKindSet {
    fn from_iter<I: IntoIterator<Item = ErrorKind>>(iter: I) -> Self {
        let mut set = ErrorKindSet::EMPTY;
        for kind in iter {
            set.insert(kind);
        }
        set
    }
}

impl fmt::Display for ErrorKindSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl From<ErrorKindSet> for String {
    fn from(set: ErrorKindSet) -> Self {
        set.label()
    }
}

impl TryFrom<String> for ErrorKindSet {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ErrorKindSet::parse(&value).ok_or_else(|| format!("unknown error kind set: {}", value))
    }
}

/// One observed hardware error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEvent {
    pub device: DeviceId,
    pub rank: u32,
    pub bank: u32,
    pub row: u32,
    pub col: u32,
    pub kind: ErrorKind,
    pub timestamp: NaiveDateTime,
}

impl ErrorEvent {
    pub fn coord(&self) -> CellCoord {
        CellCoord {
            rank: self.rank,
            bank: self.bank,
            row: self.row,
            col: self.col,
        }
    }
}

/// Physical location of a cell inside one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellCoord {
    pub rank: u32,
    pub bank: u32,
    pub row: u32,
    pub col: u32,
}

/// A unique failing location of a device, reduced over all its events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailingCell {
    pub device: DeviceId,
    pub rank: u32,
    pub bank: u32,
    pub row: u32,
    pub col: u32,
    pub first_seen: NaiveDateTime,
    pub last_seen: NaiveDateTime,
    /// Number of raw events collapsed into this cell.
    pub count: u64,
    pub kinds: ErrorKindSet,
}

impl FailingCell {
    pub fn coord(&self) -> CellCoord {
        CellCoord {
            rank: self.rank,
            bank: self.bank,
            row: self.row,
            col: self.col,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn kind_from_code() {
        assert_eq!(ErrorKind::from_code(1), Some(ErrorKind::Read));
        assert_eq!(ErrorKind::from_code(2), Some(ErrorKind::Scrub));
        assert_eq!(ErrorKind::from_code(3), Some(ErrorKind::Write));
        assert_eq!(ErrorKind::from_code(0), None);
        assert_eq!(ErrorKind::from_code(4), None);
    }

    #[test]
    fn kind_set_labels() {
        let read: ErrorKindSet = [ErrorKind::Read].into_iter().collect();
        assert_eq!(read.label(), "read");

        let rw: ErrorKindSet = [ErrorKind::Write, ErrorKind::Read].into_iter().collect();
        assert_eq!(rw.label(), "read_write");

        let all: ErrorKindSet = ErrorKind::all().iter().copied().collect();
        assert_eq!(all.label(), "read_scrub_write");

        assert_eq!(ErrorKindSet::EMPTY.label(), "none");
    }

    #[test]
    fn kind_set_is_only() {
        let mut set = ErrorKindSet::single(ErrorKind::Read);
        assert!(set.is_only(ErrorKind::Read));
        set.insert(ErrorKind::Scrub);
        assert!(!set.is_only(ErrorKind::Read));
        assert!(set.contains(ErrorKind::Read));
    }

    #[test]
    fn kind_set_rejects_non_canonical_labels() {
        assert!(ErrorKindSet::parse("write_read").is_none());
        assert!(ErrorKindSet::parse("read_read").is_none());
        assert!(ErrorKindSet::parse("read_bogus").is_none());
        assert!(ErrorKindSet::parse("").is_none());
    }

    #[test]
    fn kind_set_serializes_as_label() {
        let set: ErrorKindSet = [ErrorKind::Scrub, ErrorKind::Write].into_iter().collect();
        assert_eq!(serde_json::to_string(&set).unwrap(), r#""scrub_write""#);
        let back: ErrorKindSet = serde_json::from_str(r#""scrub_write""#).unwrap();
        assert_eq!(back, set);
    }

    proptest! {
        #[test]
        fn kind_set_label_parses_back(bits in 0u8..8) {
            let set: ErrorKindSet = ErrorKind::all()
                .iter()
                .copied()
                .filter(|k| bits & (1 << (k.code() - 1)) != 0)
                .collect();
            prop_assert_eq!(ErrorKindSet::parse(&set.label()), Some(set));
        }
    }
}
