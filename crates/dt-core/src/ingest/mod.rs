//! CSV ingestion of error events, inventory and trouble tickets.
//!
//! Parsing is partial-failure tolerant: a malformed row becomes a
//! [`RejectedRecord`] and the rest of the file is still read. Only an
//! unreadable file or a missing header column aborts ingest.

pub mod csv;
pub mod events;
pub mod inventory;
pub mod tickets;
pub mod timestamp;

pub use events::parse_events_content;
pub use inventory::{parse_inventory_content, Inventory, InventoryRecord, ModuleInfo};
pub use tickets::{parse_tickets_content, FailureType, Ticket, TicketIndex};
pub use timestamp::parse_timestamp;

use std::path::{Path, PathBuf};

use dt_common::ErrorEvent;
use dt_config::IngestOptions;
use serde::Serialize;
use thiserror::Error;

use crate::log_event;
use crate::logging::{event_names, LogContext, Stage};

/// Fatal ingest errors.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("input file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("I/O error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{file} is missing required column '{column}'")]
    MissingColumn { file: String, column: String },

    #[error("{file} has no header line")]
    Empty { file: String },
}

impl From<IngestError> for dt_common::Error {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::NotFound { path } => dt_common::Error::InputNotFound {
                path: path.display().to_string(),
            },
            IngestError::Io { source, .. } => dt_common::Error::Io(source),
            IngestError::MissingColumn { file, column } => {
                dt_common::Error::MissingColumn { file, column }
            }
            IngestError::Empty { file } => dt_common::Error::EmptyInput(format!("{} has no header line", file)),
        }
    }
}

/// A row that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedRecord {
    pub file: String,
    /// 1-based line number in the source file.
    pub line: usize,
    pub reason: String,
}

/// Parsed rows plus the rows that were rejected.
#[derive(Debug, Clone)]
pub struct ParseOutcome<T> {
    pub records: Vec<T>,
    pub rejected: Vec<RejectedRecord>,
}

impl<T> Default for ParseOutcome<T> {
    fn default() -> Self {
        ParseOutcome {
            records: Vec::new(),
            rejected: Vec::new(),
        }
    }
}

/// Input file locations.
#[derive(Debug, Clone)]
pub struct InputPaths {
    pub events: PathBuf,
    pub inventory: PathBuf,
    pub tickets: Option<PathBuf>,
}

/// Everything ingest produced.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub events: Vec<ErrorEvent>,
    pub inventory: Inventory,
    pub tickets: TicketIndex,
    pub rejected: Vec<RejectedRecord>,
}

impl Dataset {
    pub fn has_rejections(&self) -> bool {
        !self.rejected.is_empty()
    }
}

fn read_file(path: &Path) -> Result<String, IngestError> {
    std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            IngestError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            IngestError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn report_rejections(ctx: &LogContext, rejected: &[RejectedRecord]) {
    for r in rejected {
        log_event!(
            ctx,
            WARN,
            event_names::INGEST_REJECTED_ROW,
            Stage::Ingest,
            "row rejected",
            file = r.file.as_str(),
            line = r.line as u64,
            reason = r.reason.as_str()
        );
    }
}

/// Read and parse all input tables.
pub fn load_dataset(
    paths: &InputPaths,
    options: &IngestOptions,
    ctx: &LogContext,
) -> Result<Dataset, IngestError> {
    let mut dataset = Dataset::default();

    let label = file_label(&paths.events);
    let events = parse_events_content(
        &label,
        &read_file(&paths.events)?,
        options.remap_placeholder_epoch,
    )?;
    log_event!(
        ctx,
        INFO,
        event_names::INGEST_FILE_LOADED,
        Stage::Ingest,
        "events loaded",
        file = label.as_str(),
        rows = events.records.len() as u64,
        rejected = events.rejected.len() as u64
    );
    report_rejections(ctx, &events.rejected);
    dataset.events = events.records;
    dataset.rejected.extend(events.rejected);

    let label = file_label(&paths.inventory);
    let inventory = parse_inventory_content(&label, &read_file(&paths.inventory)?)?;
    log_event!(
        ctx,
        INFO,
        event_names::INGEST_FILE_LOADED,
        Stage::Ingest,
        "inventory loaded",
        file = label.as_str(),
        rows = inventory.records.len() as u64,
        rejected = inventory.rejected.len() as u64
    );
    report_rejections(ctx, &inventory.rejected);
    dataset.inventory = Inventory::from_records(inventory.records);
    dataset.rejected.extend(inventory.rejected);

    if let Some(path) = &paths.tickets {
        let label = file_label(path);
        let tickets = parse_tickets_content(&label, &read_file(path)?)?;
        log_event!(
            ctx,
            INFO,
            event_names::INGEST_FILE_LOADED,
            Stage::Ingest,
            "tickets loaded",
            file = label.as_str(),
            rows = tickets.records.len() as u64,
            rejected = tickets.rejected.len() as u64
        );
        report_rejections(ctx, &tickets.rejected);
        dataset.tickets = TicketIndex::from_tickets(tickets.records);
        dataset.rejected.extend(tickets.rejected);
    }

    Ok(dataset)
}
