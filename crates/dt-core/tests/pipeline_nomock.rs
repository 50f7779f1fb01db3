//! No-mock pipeline tests: real CSV files on disk through ingest,
//! classification and reporting.

use std::path::{Path, PathBuf};

use dt_common::{Category, OutputFormat, Permanency};
use dt_config::{ClassifierOptions, ConfigSnapshot, FleetParams, IngestOptions};
use dt_core::ingest::{load_dataset, FailureType, InputPaths};
use dt_core::logging::LogContext;
use dt_core::pipeline::run_pipeline;
use dt_core::report::{category_table, compute_fit, render, summarize, ReportEnvelope};
use tempfile::TempDir;

const EVENTS: &str = "\
sid,memoryid,rankid,bankid,row,col,error_type,error_time
srvA,0,0,3,100,40,1,2020-05-01 00:00:00
srvA,0,0,3,101,40,1,2020-05-01 01:00:00
srvA,0,0,3,1100,40,2,2020-05-03 00:00:00
srvA,0,0,3,1100,40,2,2020-05-03 00:10:00
srvB,1,0,2,500,7,1,2020-06-01 00:00:00
srvB,1,0,2,500,8,1,2020-06-01 00:00:00
srvB,1,0,2,500,9,3,2020-06-01 02:00:00
srvC,2,0,1,42,42,1,0001-03-01 00:00:00
srvD,0,0,0,10,5,1,2020-07-01 00:00:00
srvD,0,0,0,11,5,1,not-a-date
";

const INVENTORY: &str = "\
sid,DRAM_model,DIMM_number,server_manufacturer
srvA,A1,16,M1
srvB,B1,16,M2
srvC,B2,8,M2
";

const TICKETS: &str = "\
sid,failure_type
srvA,1
srvB,2
";

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn fixture(temp: &TempDir) -> InputPaths {
    InputPaths {
        events: write(temp.path(), "events.csv", EVENTS),
        inventory: write(temp.path(), "inventory.csv", INVENTORY),
        tickets: Some(write(temp.path(), "tickets.csv", TICKETS)),
    }
}

#[test]
fn full_run_classifies_every_inventoried_device() {
    let temp = TempDir::new().unwrap();
    let ctx = LogContext::new("run-nomock");
    let dataset = load_dataset(&fixture(&temp), &IngestOptions::default(), &ctx).unwrap();

    assert_eq!(dataset.rejected.len(), 1);
    assert_eq!(dataset.rejected[0].line, 11);

    let out = run_pipeline(&dataset, &ClassifierOptions::default(), &ctx).unwrap();
    // srvD has no inventory row.
    assert_eq!(out.stats.missing_inventory, 1);
    assert_eq!(out.rows.len(), 3);

    let a = &out.rows[0];
    assert_eq!(a.sid, "srvA");
    assert_eq!(a.category, Category::SingleSenseAmp);
    assert_eq!(a.permanency, Permanency::Permanent);
    assert_eq!(a.error_kinds, "read_scrub");
    assert_eq!(a.failure_type, FailureType::Uncorrectable);

    let b = &out.rows[1];
    assert_eq!(b.category, Category::LocalWordline);
    assert_eq!(b.permanency, Permanency::Transient);
    assert_eq!(b.failure_type, FailureType::Correctable);

    let c = &out.rows[2];
    assert_eq!(c.category, Category::MultipleSingleBitFailures);
    // 0001-03-01 is remapped into late 2019.
    assert_eq!(c.first_seen.format("%Y-%m-%d").to_string(), "2019-12-01");
}

#[test]
fn excluded_models_are_dropped_before_classification() {
    let temp = TempDir::new().unwrap();
    let ctx = LogContext::new("run-nomock");
    let dataset = load_dataset(&fixture(&temp), &IngestOptions::default(), &ctx).unwrap();
    let options = ClassifierOptions {
        excluded_models: vec!["B2".to_string()],
        ..ClassifierOptions::default()
    };
    let out = run_pipeline(&dataset, &options, &ctx).unwrap();
    assert_eq!(out.rows.len(), 2);
    assert_eq!(out.stats.excluded_devices, 1);
}

#[test]
fn reports_render_in_every_format() {
    let temp = TempDir::new().unwrap();
    let ctx = LogContext::new("run-nomock");
    let dataset = load_dataset(&fixture(&temp), &IngestOptions::default(), &ctx).unwrap();
    let out = run_pipeline(&dataset, &ClassifierOptions::default(), &ctx).unwrap();
    let snapshot = ConfigSnapshot::defaults_only();

    let json = render(
        OutputFormat::Json,
        &ReportEnvelope::new("run-nomock", &snapshot, &out.stats, summarize(&out.rows)),
        &summarize(&out.rows).tables(),
    )
    .unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["schema_version"], dt_common::SCHEMA_VERSION);
    assert_eq!(value["total"], 3);
    assert_eq!(value["stats"]["rejected_rows"], 1);

    let csv = render(OutputFormat::Csv, &(), &[("Categories", category_table(&out.rows))]).unwrap();
    assert_eq!(csv.lines().count(), 4);
    assert!(csv.lines().nth(1).unwrap().starts_with("srvA,0,A1,M1,single_sense_amp"));

    let fit = compute_fit(&out.rows, &FleetParams::default());
    let md = render(OutputFormat::Md, &(), &[("FIT", fit.table())]).unwrap();
    assert!(md.starts_with("## FIT"));
    assert!(md.contains("single_sense_amp-p"));
}
