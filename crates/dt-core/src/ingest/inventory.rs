//! Server inventory table.
//!
//! Header: `sid,DRAM_model,server_manufacturer`, optionally `memoryid` and
//! `DIMM_number`. Rows with a `memoryid` describe one module; rows without
//! describe every module of the server. Module rows take precedence.

use std::collections::HashMap;

use dt_common::{DeviceId, ServerId};
use serde::Serialize;

use super::csv::{read_table, Record};
use super::{IngestError, ParseOutcome, RejectedRecord};

/// Hardware description joined onto each device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleInfo {
    pub dram_model: String,
    pub server_manufacturer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimm_number: Option<u32>,
}

/// One parsed inventory row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryRecord {
    pub sid: ServerId,
    pub memory_id: Option<u32>,
    pub info: ModuleInfo,
}

/// Inventory lookup keyed by server, with per-module overrides.
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    by_server: HashMap<ServerId, ModuleInfo>,
    by_device: HashMap<DeviceId, ModuleInfo>,
}

impl Inventory {
    /// Build from parsed rows. The first row for a given key wins.
    pub fn from_records(records: impl IntoIterator<Item = InventoryRecord>) -> Self {
        let mut inventory = Inventory::default();
        for record in records {
            match record.memory_id {
                Some(memory_id) => {
                    inventory
                        .by_device
                        .entry(DeviceId {
                            sid: record.sid,
                            memory_id,
                        })
                        .or_insert(record.info);
                }
                None => {
                    inventory.by_server.entry(record.sid).or_insert(record.info);
                }
            }
        }
        inventory
    }

    pub fn lookup(&self, device: &DeviceId) -> Option<&ModuleInfo> {
        self.by_device
            .get(device)
            .or_else(|| self.by_server.get(&device.sid))
    }

    pub fn len(&self) -> usize {
        self.by_server.len() + self.by_device.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Parse inventory CSV content.
pub fn parse_inventory_content(
    file: &str,
    content: &str,
) -> Result<ParseOutcome<InventoryRecord>, IngestError> {
    let (header, records) = read_table(file, content)?;
    let sid = header.require("sid")?;
    let model = header.require("DRAM_model")?;
    let manufacturer = header.require("server_manufacturer")?;
    let memoryid = header.optional("memoryid");
    let dimm_number = header.optional("DIMM_number");

    let mut outcome = ParseOutcome::default();
    for record in &records {
        let parsed = (|| -> Result<InventoryRecord, String> {
            Ok(InventoryRecord {
                sid: ServerId::new(record.get(sid, "sid")?),
                memory_id: optional_u32(record, memoryid, "memoryid")?,
                info: ModuleInfo {
                    dram_model: record.get(model, "DRAM_model")?.to_string(),
                    server_manufacturer: record
                        .get(manufacturer, "server_manufacturer")?
                        .to_string(),
                    dimm_number: optional_u32(record, dimm_number, "DIMM_number")?,
                },
            })
        })();
        match parsed {
            Ok(row) => outcome.records.push(row),
            Err(reason) => outcome.rejected.push(RejectedRecord {
                file: file.to_string(),
                line: record.line,
                reason,
            }),
        }
    }
    Ok(outcome)
}

/// An optional column that is blank counts as absent.
fn optional_u32(record: &Record, idx: Option<usize>, column: &str) -> Result<Option<u32>, String> {
    match idx {
        Some(i) if record.fields.get(i).is_some_and(|v| !v.is_empty()) => {
            record.get_u32(i, column).map(Some)
        }
        _ => Ok(None),
    }
}
