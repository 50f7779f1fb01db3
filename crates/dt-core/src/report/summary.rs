//! Count tables over classified devices.

use std::collections::BTreeMap;

use dt_common::{Category, LogicalClass};
use serde::Serialize;

use crate::pipeline::CategoryRow;

use super::Table;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelCount {
    pub category: Category,
    pub dram_model: String,
    pub count: usize,
}

/// Device counts by category x model, by logical class and by mechanism.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub by_category_model: Vec<ModelCount>,
    pub by_logical_class: BTreeMap<LogicalClass, usize>,
    /// Keyed by mechanism name; labels without a mechanism use their own name.
    pub by_mechanism: BTreeMap<String, usize>,
}

pub fn summarize(rows: &[CategoryRow]) -> Summary {
    let mut by_pair: BTreeMap<(Category, &str), usize> = BTreeMap::new();
    let mut summary = Summary {
        total: rows.len(),
        ..Summary::default()
    };
    for row in rows {
        *by_pair.entry((row.category, row.dram_model.as_str())).or_default() += 1;
        *summary.by_logical_class.entry(row.logical_class).or_default() += 1;
        *summary
            .by_mechanism
            .entry(row.category.coarse_name().to_string())
            .or_default() += 1;
    }
    summary.by_category_model = by_pair
        .into_iter()
        .map(|((category, model), count)| ModelCount {
            category,
            dram_model: model.to_string(),
            count,
        })
        .collect();
    summary
}

impl Summary {
    pub fn tables(&self) -> Vec<(&'static str, Table)> {
        let mut by_model = Table::new(&["category", "dram_model", "count"]);
        for entry in &self.by_category_model {
            by_model.push(vec![
                entry.category.name().to_string(),
                entry.dram_model.clone(),
                entry.count.to_string(),
            ]);
        }

        let mut by_class = Table::new(&["logical_class", "count"]);
        for (class, count) in &self.by_logical_class {
            by_class.push(vec![class.name().to_string(), count.to_string()]);
        }

        let mut by_mechanism = Table::new(&["mechanism", "count"]);
        for (name, count) in &self.by_mechanism {
            by_mechanism.push(vec![name.clone(), count.to_string()]);
        }

        vec![
            ("Categories by DRAM model", by_model),
            ("Logical classes", by_class),
            ("Mechanisms", by_mechanism),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::FailureType;
    use crate::test_utils::hours;
    use dt_common::Permanency;

    fn row(category: Category, model: &str) -> CategoryRow {
        CategoryRow {
            sid: "s".into(),
            memory_id: 0,
            dram_model: model.into(),
            server_manufacturer: "M1".into(),
            category,
            logical_class: category.logical_class(),
            mechanism: category.mechanism(),
            permanency: Permanency::Permanent,
            cells: 3,
            first_seen: hours(0),
            last_seen: hours(0),
            error_kinds: "read".into(),
            failure_type: FailureType::Unknown,
        }
    }

    #[test]
    fn counts_roll_up_three_ways() {
        let rows = vec![
            row(Category::LocalWordline, "A1"),
            row(Category::ConsecutiveRows, "A1"),
            row(Category::LocalWordline, "B1"),
            row(Category::LocalWordline, "A1"),
            row(Category::MultiRank, "A1"),
        ];
        let summary = summarize(&rows);
        assert_eq!(summary.total, 5);
        assert_eq!(
            summary.by_category_model[0],
            ModelCount {
                category: Category::MultiRank,
                dram_model: "A1".into(),
                count: 1
            }
        );
        let lwl_a1 = summary
            .by_category_model
            .iter()
            .find(|m| m.category == Category::LocalWordline && m.dram_model == "A1")
            .unwrap();
        assert_eq!(lwl_a1.count, 2);
        assert_eq!(summary.by_logical_class[&LogicalClass::SingleRow], 3);
        assert_eq!(summary.by_logical_class[&LogicalClass::SingleBank], 1);
        assert_eq!(summary.by_mechanism["SWD"], 4);
        assert_eq!(summary.by_mechanism["multi_rank"], 1);
    }

    #[test]
    fn summary_serializes_enum_keys_as_names() {
        let summary = summarize(&[row(Category::LocalWordline, "A1")]);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["by_logical_class"]["single_row"], 1);
        assert_eq!(json["by_category_model"][0]["category"], "local_wordline");
    }
}
