//! Raw error-event table parser.
//!
//! Expected header (any column order, extra columns ignored):
//! `sid,memoryid,rankid,bankid,row,col,error_type,error_time`.

use dt_common::{DeviceId, ErrorEvent, ErrorKind};

use super::csv::{read_table, Record};
use super::timestamp::parse_timestamp;
use super::{IngestError, ParseOutcome, RejectedRecord};

/// Column indices of the event table.
struct EventColumns {
    sid: usize,
    memoryid: usize,
    rankid: usize,
    bankid: usize,
    row: usize,
    col: usize,
    error_type: usize,
    error_time: usize,
}

/// Parse event CSV content. Malformed rows are collected, not fatal.
pub fn parse_events_content(
    file: &str,
    content: &str,
    remap_placeholder_epoch: bool,
) -> Result<ParseOutcome<ErrorEvent>, IngestError> {
    let (header, records) = read_table(file, content)?;
    let cols = EventColumns {
        sid: header.require("sid")?,
        memoryid: header.require("memoryid")?,
        rankid: header.require("rankid")?,
        bankid: header.require("bankid")?,
        row: header.require("row")?,
        col: header.require("col")?,
        error_type: header.require("error_type")?,
        error_time: header.require("error_time")?,
    };

    let mut outcome = ParseOutcome::default();
    for record in &records {
        match parse_event(record, &cols, remap_placeholder_epoch) {
            Ok(event) => outcome.records.push(event),
            Err(reason) => outcome.rejected.push(RejectedRecord {
                file: file.to_string(),
                line: record.line,
                reason,
            }),
        }
    }
    Ok(outcome)
}

fn parse_event(record: &Record, cols: &EventColumns, remap: bool) -> Result<ErrorEvent, String> {
    let sid = record.get(cols.sid, "sid")?;
    let memory_id = record.get_u32(cols.memoryid, "memoryid")?;
    let code = record.get_i64(cols.error_type, "error_type")?;
    let kind = ErrorKind::from_code(code)
        .ok_or_else(|| format!("error_type {} is not 1, 2 or 3", code))?;
    let timestamp = parse_timestamp(record.get(cols.error_time, "error_time")?, remap)?;

    Ok(ErrorEvent {
        device: DeviceId::new(sid, memory_id),
        rank: record.get_u32(cols.rankid, "rankid")?,
        bank: record.get_u32(cols.bankid, "bankid")?,
        row: record.get_u32(cols.row, "row")?,
        col: record.get_u32(cols.col, "col")?,
        kind,
        timestamp,
    })
}
