//! Collapse raw error events into unique failing cells.
//!
//! Grouping key is the exact (device, rank, bank, row, col) tuple; output is
//! sorted by that key, so the result does not depend on input order.

use std::collections::BTreeMap;

use dt_common::{CellCoord, DeviceId, ErrorEvent, ErrorKindSet, FailingCell};

/// Reduce events to one [`FailingCell`] per physical location per device.
pub fn aggregate_events<'a>(events: impl IntoIterator<Item = &'a ErrorEvent>) -> Vec<FailingCell> {
    let mut cells: BTreeMap<(DeviceId, CellCoord), FailingCell> = BTreeMap::new();

    for event in events {
        let key = (event.device.clone(), event.coord());
        cells
            .entry(key)
            .and_modify(|cell| {
                cell.first_seen = cell.first_seen.min(event.timestamp);
                cell.last_seen = cell.last_seen.max(event.timestamp);
                cell.count += 1;
                cell.kinds.insert(event.kind);
            })
            .or_insert_with(|| FailingCell {
                device: event.device.clone(),
                rank: event.rank,
                bank: event.bank,
                row: event.row,
                col: event.col,
                first_seen: event.timestamp,
                last_seen: event.timestamp,
                count: 1,
                kinds: ErrorKindSet::single(event.kind),
            });
    }

    cells.into_values().collect()
}
