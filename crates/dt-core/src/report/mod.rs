//! Report rendering: category table, summary counts and FIT rates.
//!
//! Every report exists in two shapes:
//! - a serde payload wrapped in [`ReportEnvelope`] for JSON
//! - a flat [`Table`] for CSV and Markdown

pub mod fit;
pub mod summary;
pub mod table;

pub use fit::{compute_fit, FailureClass, FitReport, FitRow};
pub use summary::{summarize, Summary};
pub use table::category_table;

use chrono::Utc;
use dt_common::{OutputFormat, Result, SCHEMA_VERSION};
use dt_config::ConfigSnapshot;
use serde::Serialize;

use crate::pipeline::RunStats;

/// Metadata wrapped around every JSON report.
#[derive(Debug, Serialize)]
pub struct ReportEnvelope<'a, T: Serialize> {
    pub schema_version: &'static str,
    pub generated_at: String,
    pub run_id: &'a str,
    pub config: &'a ConfigSnapshot,
    pub stats: &'a RunStats,
    #[serde(flatten)]
    pub body: T,
}

impl<'a, T: Serialize> ReportEnvelope<'a, T> {
    pub fn new(run_id: &'a str, config: &'a ConfigSnapshot, stats: &'a RunStats, body: T) -> Self {
        ReportEnvelope {
            schema_version: SCHEMA_VERSION,
            generated_at: Utc::now().to_rfc3339(),
            run_id,
            config,
            stats,
            body,
        }
    }
}

/// Flat rows with a header, rendered as CSV or Markdown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Table {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        for line in std::iter::once(&self.headers).chain(&self.rows) {
            let cells: Vec<String> = line.iter().map(|c| csv_escape(c)).collect();
            out.push_str(&cells.join(","));
            out.push('\n');
        }
        out
    }

    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("| {} |\n", self.headers.join(" | ")));
        out.push_str(&format!(
            "|{}\n",
            self.headers.iter().map(|_| "---|").collect::<String>()
        ));
        for row in &self.rows {
            let cells: Vec<String> = row.iter().map(|c| c.replace('|', "\\|")).collect();
            out.push_str(&format!("| {} |\n", cells.join(" | ")));
        }
        out
    }
}

fn csv_escape(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Render `payload` as JSON or `tables` as CSV/Markdown.
///
/// Markdown gets one `## title` section per table; CSV concatenates tables
/// separated by a blank line.
pub fn render<T: Serialize>(
    format: OutputFormat,
    payload: &T,
    tables: &[(&str, Table)],
) -> Result<String> {
    match format {
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(payload)?;
            json.push('\n');
            Ok(json)
        }
        OutputFormat::Csv => Ok(tables
            .iter()
            .map(|(_, t)| t.to_csv())
            .collect::<Vec<_>>()
            .join("\n")),
        OutputFormat::Md => Ok(tables
            .iter()
            .map(|(title, t)| format!("## {}\n\n{}", title, t.to_markdown()))
            .collect::<Vec<_>>()
            .join("\n")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        let mut t = Table::new(&["name", "count"]);
        t.push(vec!["a,b".into(), "1".into()]);
        t.push(vec!["say \"hi\"".into(), "2".into()]);
        t
    }

    #[test]
    fn csv_quotes_special_values() {
        assert_eq!(
            sample().to_csv(),
            "name,count\n\"a,b\",1\n\"say \"\"hi\"\"\",2\n"
        );
    }

    #[test]
    fn markdown_has_separator_row() {
        let md = sample().to_markdown();
        let lines: Vec<&str> = md.lines().collect();
        assert_eq!(lines[0], "| name | count |");
        assert_eq!(lines[1], "|---|---|");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn render_dispatches_on_format() {
        let tables = [("Sample", sample())];
        let json = render(OutputFormat::Json, &serde_json::json!({"k": 1}), &tables).unwrap();
        assert!(json.contains("\"k\": 1"));
        let md = render(OutputFormat::Md, &(), &tables).unwrap();
        assert!(md.starts_with("## Sample\n\n| name"));
        let csv = render(OutputFormat::Csv, &(), &tables).unwrap();
        assert!(csv.starts_with("name,count\n"));
    }
}
