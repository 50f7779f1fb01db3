//! Per-device category table.

use crate::pipeline::CategoryRow;

use super::Table;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn category_table(rows: &[CategoryRow]) -> Table {
    let mut table = Table::new(&[
        "sid",
        "memory_id",
        "dram_model",
        "server_manufacturer",
        "category",
        "logical_class",
        "mechanism",
        "permanency",
        "cells",
        "first_seen",
        "last_seen",
        "error_kinds",
        "failure_type",
    ]);
    for row in rows {
        table.push(vec![
            row.sid.clone(),
            row.memory_id.to_string(),
            row.dram_model.clone(),
            row.server_manufacturer.clone(),
            row.category.name().to_string(),
            row.logical_class.name().to_string(),
            row.mechanism.map(|m| m.name().to_string()).unwrap_or_default(),
            row.permanency.name().to_string(),
            row.cells.to_string(),
            row.first_seen.format(TIME_FORMAT).to_string(),
            row.last_seen.format(TIME_FORMAT).to_string(),
            row.error_kinds.clone(),
            row.failure_type.name().to_string(),
        ]);
    }
    table
}
