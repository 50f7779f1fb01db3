//! End-to-end CLI tests: real CSV inputs, real binary, exit codes and output.

use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

const EVENTS_HEADER: &str = "sid,memoryid,rankid,bankid,row,col,error_type,error_time";

struct Fixture {
    temp: TempDir,
    events: PathBuf,
    inventory: PathBuf,
    tickets: PathBuf,
}

impl Fixture {
    fn new(extra_event_lines: &[&str]) -> Self {
        let temp = TempDir::new().unwrap();
        let mut events = vec![
            EVENTS_HEADER,
            "s1,0,0,0,10,4,1,2020-01-01 00:00:00",
            "s1,0,0,0,11,4,1,2020-01-02 00:00:00",
            "s1,0,0,0,12,4,2,2020-01-03 00:00:00",
            "s2,0,0,5,77,1,1,2020-02-01 00:00:00",
            "s2,0,0,5,77,2,1,2020-02-01 00:00:00",
            "s2,0,0,5,77,3,1,2020-02-01 00:00:00",
            "s3,1,0,0,1,1,1,2020-03-01 00:00:00",
        ];
        events.extend_from_slice(extra_event_lines);
        let events = write(temp.path(), "events.csv", &events.join("\n"));
        let inventory = write(
            temp.path(),
            "inventory.csv",
            "sid,DRAM_model,DIMM_number,server_manufacturer\ns1,A1,16,M1\ns2,B1,16,M2\ns3,B2,8,M2\n",
        );
        let tickets = write(temp.path(), "tickets.csv", "sid,failure_type\ns1,1\ns3,3\n");
        std::fs::create_dir_all(temp.path().join("xdg")).unwrap();
        Fixture {
            temp,
            events,
            inventory,
            tickets,
        }
    }

    /// A dt-core command isolated from the caller's config and log environment.
    fn cmd(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("dt-core");
        cmd.env("XDG_CONFIG_HOME", self.temp.path().join("xdg"))
            .env_remove("DRAM_TRIAGE_CONFIG")
            .env_remove("DRAM_TRIAGE_CONFIG_DIR")
            .env_remove("DT_LOG")
            .env_remove("DT_LOG_FORMAT")
            .env_remove("RUST_LOG");
        cmd
    }

    fn inputs(&self) -> Vec<String> {
        vec![
            "--events".into(),
            self.events.display().to_string(),
            "--inventory".into(),
            self.inventory.display().to_string(),
            "--tickets".into(),
            self.tickets.display().to_string(),
        ]
    }
}

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

// ============================================================================
// classify
// ============================================================================

#[test]
fn classify_json_lists_every_device() {
    let fx = Fixture::new(&[]);
    let output = fx
        .cmd()
        .arg("classify")
        .args(fx.inputs())
        .arg("-q")
        .assert()
        .success()
        .get_output()
        .clone();

    let json = stdout_json(&output);
    assert_eq!(json["command"], "classify");
    assert!(json["run_id"].as_str().unwrap().starts_with("run-"));
    let rows = json["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["sid"], "s1");
    assert_eq!(rows[0]["category"], "single_sense_amp");
    assert_eq!(rows[0]["permanency"], "permanent");
    assert_eq!(rows[0]["failure_type"], "Uncorrectable");
    assert_eq!(rows[1]["category"], "local_wordline");
    assert_eq!(rows[1]["mechanism"], "SWD");
    assert_eq!(rows[2]["category"], "multiple_single_bit_failures");
    assert_eq!(rows[2]["failure_type"], "System failure");
    assert_eq!(json["config"]["config_source"], "builtin default");
}

#[test]
fn rejected_rows_exit_with_partial_code() {
    let fx = Fixture::new(&["s9,x,0,0,1,1,1,2020-01-01", "s9,0,0,0,1,1,9,2020-01-01"]);
    let output = fx
        .cmd()
        .arg("classify")
        .args(fx.inputs())
        .arg("-q")
        .assert()
        .code(3)
        .get_output()
        .clone();
    let json = stdout_json(&output);
    assert_eq!(json["rejected"].as_array().unwrap().len(), 2);
    assert_eq!(json["stats"]["rejected_rows"], 2);
    assert_eq!(json["rows"].as_array().unwrap().len(), 3);
}

#[test]
fn classify_csv_output() {
    let fx = Fixture::new(&[]);
    fx.cmd()
        .args(["--format", "csv", "classify"])
        .args(fx.inputs())
        .arg("-q")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("sid,memory_id,dram_model"))
        .stdout(predicate::str::contains("s2,0,B1,M2,local_wordline,single_row,SWD,transient"));
}

#[test]
fn excluded_model_flag_drops_devices() {
    let fx = Fixture::new(&[]);
    let output = fx
        .cmd()
        .arg("classify")
        .args(fx.inputs())
        .args(["--exclude-model", "B1", "--exclude-model", "B2", "-q"])
        .assert()
        .success()
        .get_output()
        .clone();
    let json = stdout_json(&output);
    assert_eq!(json["rows"].as_array().unwrap().len(), 1);
    assert_eq!(json["stats"]["excluded_devices"], 2);
}

#[test]
fn output_flag_writes_file() {
    let fx = Fixture::new(&[]);
    let out = fx.temp.path().join("report.md");
    fx.cmd()
        .args(["--format", "md", "classify"])
        .args(fx.inputs())
        .arg("--output")
        .arg(&out)
        .arg("-q")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
    let written = std::fs::read_to_string(&out).unwrap();
    assert!(written.starts_with("## Categories"));
}

#[test]
fn missing_events_file_is_input_error() {
    let fx = Fixture::new(&[]);
    fx.cmd()
        .args(["classify", "--events"])
        .arg(fx.temp.path().join("absent.csv"))
        .arg("--inventory")
        .arg(&fx.inventory)
        .arg("-q")
        .assert()
        .code(10)
        .stderr(predicate::str::contains("\"code\":20"));
}

#[test]
fn missing_required_column_is_input_error() {
    let fx = Fixture::new(&[]);
    let bad = write(fx.temp.path(), "bad.csv", "sid,memoryid\ns1,0\n");
    fx.cmd()
        .args(["--format", "md", "classify", "--events"])
        .arg(&bad)
        .arg("--inventory")
        .arg(&fx.inventory)
        .arg("-q")
        .assert()
        .code(10)
        .stderr(predicate::str::contains("missing required column"));
}

// ============================================================================
// summary / fit
// ============================================================================

#[test]
fn summary_counts_by_class() {
    let fx = Fixture::new(&[]);
    let output = fx
        .cmd()
        .arg("summary")
        .args(fx.inputs())
        .arg("-q")
        .assert()
        .success()
        .get_output()
        .clone();
    let json = stdout_json(&output);
    assert_eq!(json["command"], "summary");
    assert_eq!(json["summary"]["total"], 3);
    assert_eq!(json["summary"]["by_logical_class"]["single_row"], 1);
    assert_eq!(json["summary"]["by_mechanism"]["BLSA"], 1);
}

#[test]
fn fit_uses_fleet_flags() {
    let fx = Fixture::new(&[]);
    let output = fx
        .cmd()
        .arg("fit")
        .args(fx.inputs())
        .args(["--num-dimms", "1000", "--hours", "100", "--chips-per-rank", "10", "-q"])
        .assert()
        .success()
        .get_output()
        .clone();
    let json = stdout_json(&output);
    let fit_total = json["fit"]["fit_total"].as_f64().unwrap();
    assert!((fit_total - 3000.0).abs() < 1e-6);
    let labels: Vec<&str> = json["fit"]["rows"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["label"].as_str().unwrap())
        .collect();
    assert!(labels.contains(&"single_sense_amp-p"));
    assert!(labels.contains(&"local_wordline-t"));
}

// ============================================================================
// config / version
// ============================================================================

#[test]
fn config_show_defaults() {
    let fx = Fixture::new(&[]);
    let output = fx
        .cmd()
        .args(["config", "show", "-q"])
        .assert()
        .success()
        .get_output()
        .clone();
    let json = stdout_json(&output);
    assert_eq!(json["config"]["classifier"]["msocket"], true);
    assert_eq!(json["geometry"]["bank_rows"], 65536);
}

#[test]
fn config_validate_accepts_good_file() {
    let fx = Fixture::new(&[]);
    let file = write(
        fx.temp.path(),
        "classifier.json",
        r#"{"schema_version": "1.0.0", "classifier": {"workers": 4}}"#,
    );
    fx.cmd()
        .arg("--config")
        .arg(&file)
        .args(["config", "validate", "-q"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\": \"valid\""));
}

#[test]
fn config_validate_rejects_bad_file() {
    let fx = Fixture::new(&[]);
    let file = write(
        fx.temp.path(),
        "classifier.json",
        r#"{"schema_version": "1.0.0", "classifier": {"workers": 0}}"#,
    );
    fx.cmd()
        .arg("--config")
        .arg(&file)
        .args(["config", "validate", "-q"])
        .assert()
        .code(11);
}

#[test]
fn missing_config_path_is_config_error() {
    let fx = Fixture::new(&[]);
    fx.cmd()
        .arg("--config")
        .arg(fx.temp.path().join("nope.json"))
        .arg("classify")
        .args(fx.inputs())
        .arg("-q")
        .assert()
        .code(11);
}

#[test]
fn version_json() {
    let fx = Fixture::new(&[]);
    fx.cmd()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\":\"dt-core\""));
}
