//! Failures-in-time (per 10^9 device-hours) by category.
//!
//! `fit_total = N / num_dimms / chips_per_rank / hours * 1e9` over all N
//! classified devices; each group gets `fit_total * count / N`.

use std::collections::BTreeMap;
use std::fmt;

use dt_common::{Category, Permanency};
use dt_config::FleetParams;
use serde::Serialize;

use crate::ingest::FailureType;
use crate::pipeline::CategoryRow;

use super::Table;

/// Whether a device's server ever had an uncorrectable ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum FailureClass {
    Uncorrectable,
    #[serde(rename = "Not Uncorrectable")]
    NotUncorrectable,
}

impl FailureClass {
    pub fn of(failure_type: FailureType) -> Self {
        if failure_type == FailureType::Uncorrectable {
            FailureClass::Uncorrectable
        } else {
            FailureClass::NotUncorrectable
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FailureClass::Uncorrectable => "Uncorrectable",
            FailureClass::NotUncorrectable => "Not Uncorrectable",
        }
    }
}

impl fmt::Display for FailureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitRow {
    /// `category-p` or `category-t`.
    pub label: String,
    pub category: Category,
    pub permanency: Permanency,
    pub failure_classification: FailureClass,
    pub count: usize,
    pub percentage: f64,
    pub fit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitReport {
    pub total_devices: usize,
    pub fit_total: f64,
    pub fleet: FleetParams,
    pub rows: Vec<FitRow>,
}

pub fn fit_total(devices: usize, fleet: &FleetParams) -> f64 {
    let device_hours = fleet.device_hours();
    if device_hours <= 0.0 {
        return 0.0;
    }
    devices as f64 / device_hours * 1e9
}

pub fn compute_fit(rows: &[CategoryRow], fleet: &FleetParams) -> FitReport {
    let total = rows.len();
    let fit_total = fit_total(total, fleet);

    let mut groups: BTreeMap<(Category, Permanency, FailureClass), usize> = BTreeMap::new();
    for row in rows {
        *groups
            .entry((row.category, row.permanency, FailureClass::of(row.failure_type)))
            .or_default() += 1;
    }

    let rows = groups
        .into_iter()
        .map(|((category, permanency, class), count)| {
            let percentage = count as f64 / total as f64;
            FitRow {
                label: format!("{}-{}", category.name(), permanency.initial()),
                category,
                permanency,
                failure_classification: class,
                count,
                percentage,
                fit: fit_total * percentage,
            }
        })
        .collect();

    FitReport {
        total_devices: total,
        fit_total,
        fleet: fleet.clone(),
        rows,
    }
}

impl FitReport {
    pub fn table(&self) -> Table {
        let mut table = Table::new(&[
            "label",
            "failure_classification",
            "count",
            "percentage",
            "fit",
        ]);
        for row in &self.rows {
            table.push(vec![
                row.label.clone(),
                row.failure_classification.name().to_string(),
                row.count.to_string(),
                format!("{:.6}", row.percentage),
                format!("{:.6}", row.fit),
            ]);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_approx_eq;
    use crate::test_utils::hours;

    fn row(category: Category, permanency: Permanency, failure_type: FailureType) -> CategoryRow {
        CategoryRow {
            sid: "s".into(),
            memory_id: 0,
            dram_model: "A1".into(),
            server_manufacturer: "M1".into(),
            category,
            logical_class: category.logical_class(),
            mechanism: category.mechanism(),
            permanency,
            cells: 3,
            first_seen: hours(0),
            last_seen: hours(0),
            error_kinds: "read".into(),
            failure_type,
        }
    }

    #[test]
    fn fit_total_matches_formula() {
        let fleet = FleetParams {
            num_dimms: 1000,
            hours: 100.0,
            chips_per_rank: 10,
        };
        // 4 / (1000 * 10 * 100) * 1e9
        assert_approx_eq!(fit_total(4, &fleet), 4000.0);
        assert_approx_eq!(fit_total(0, &fleet), 0.0);
    }

    #[test]
    fn groups_split_by_permanency_and_ticket() {
        let rows = vec![
            row(Category::LocalWordline, Permanency::Permanent, FailureType::Uncorrectable),
            row(Category::LocalWordline, Permanency::Permanent, FailureType::Correctable),
            row(Category::LocalWordline, Permanency::Permanent, FailureType::Unknown),
            row(Category::LocalWordline, Permanency::Transient, FailureType::Unknown),
        ];
        let fleet = FleetParams {
            num_dimms: 1000,
            hours: 100.0,
            chips_per_rank: 10,
        };
        let report = compute_fit(&rows, &fleet);
        assert_eq!(report.total_devices, 4);
        assert_eq!(report.rows.len(), 3);

        let not_ue = report
            .rows
            .iter()
            .find(|r| {
                r.permanency == Permanency::Permanent
                    && r.failure_classification == FailureClass::NotUncorrectable
            })
            .unwrap();
        assert_eq!(not_ue.label, "local_wordline-p");
        assert_eq!(not_ue.count, 2);
        assert_approx_eq!(not_ue.percentage, 0.5);
        assert_approx_eq!(not_ue.fit, 2000.0);

        let share: f64 = report.rows.iter().map(|r| r.percentage).sum();
        assert_approx_eq!(share, 1.0);
    }

    #[test]
    fn transient_label_suffix() {
        let rows = vec![row(Category::MultiRank, Permanency::Transient, FailureType::Unknown)];
        let report = compute_fit(&rows, &FleetParams::default());
        assert_eq!(report.rows[0].label, "multi_rank-t");
        assert_eq!(report.table().rows[0][1], "Not Uncorrectable");
    }
}
