use serde_json::Value;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn write_file(path: &Path, contents: &str) {
    std::fs::write(path, contents).expect("fixture file should be written");
}

fn hydrogen_job() -> &'static str {
    r#"
    {
      "nuclearCharge": 1.0,
      "grid": { "kind": "exponential", "rMin": 1.0e-6, "rMax": 30.0, "pointCount": 1200 },
      "states": [
        { "n": 1, "l": 0, "trialEnergy": -1.0 },
        { "n": 2, "l": 0, "trialEnergy": -0.3 }
      ]
    }
    "#
}

fn radsolve() -> Command {
    Command::new(env!("CARGO_BIN_EXE_radsolve"))
}

#[test]
fn solve_command_writes_hydrogen_report() {
    let temp = TempDir::new().expect("tempdir");
    let job_path = temp.path().join("hydrogen.json");
    let report_path = temp.path().join("report.json");
    write_file(&job_path, hydrogen_job());

    let output = radsolve()
        .arg("solve")
        .arg(&job_path)
        .arg("--output")
        .arg(&report_path)
        .output()
        .expect("solve should run");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let report: Value = serde_json::from_str(
        &std::fs::read_to_string(&report_path).expect("report should exist"),
    )
    .expect("report should be JSON");
    let states = report["states"].as_array().expect("states array");
    assert_eq!(states.len(), 2);

    let ground = &states[0];
    assert_eq!(ground["nodeCount"], 0);
    assert_eq!(ground["converged"], true);
    let energy = ground["energy"].as_f64().expect("energy");
    assert!((energy + 0.5).abs() <= 1.0e-3, "energy = {energy}");

    let excited = &states[1];
    assert_eq!(excited["nodeCount"], 1);
    let energy = excited["energy"].as_f64().expect("energy");
    assert!((energy + 0.125).abs() <= 1.0e-3, "energy = {energy}");
}

#[test]
fn solve_command_prints_report_to_stdout_by_default() {
    let temp = TempDir::new().expect("tempdir");
    let job_path = temp.path().join("hydrogen.json");
    write_file(&job_path, hydrogen_job());

    let output = radsolve()
        .arg("solve")
        .arg(&job_path)
        .output()
        .expect("solve should run");
    assert!(output.status.success());

    let report: Value =
        serde_json::from_slice(&output.stdout).expect("stdout should carry the JSON report");
    assert_eq!(report["states"].as_array().expect("states").len(), 2);
}

#[test]
fn probe_command_reports_node_count() {
    let temp = TempDir::new().expect("tempdir");
    let job_path = temp.path().join("hydrogen.json");
    write_file(&job_path, hydrogen_job());

    let output = radsolve()
        .arg("probe")
        .arg(&job_path)
        .arg("--l")
        .arg("0")
        .arg("--energy=-0.6")
        .output()
        .expect("probe should run");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let report: Value = serde_json::from_slice(&output.stdout).expect("probe JSON");
    assert_eq!(report["l"], 0);
    assert_eq!(report["nodeCount"], 0);
}

#[test]
fn malformed_job_file_fails_with_nonzero_exit() {
    let temp = TempDir::new().expect("tempdir");
    let job_path = temp.path().join("broken.json");
    write_file(&job_path, "{ not json");

    let output = radsolve()
        .arg("solve")
        .arg(&job_path)
        .output()
        .expect("solve should run");
    assert!(!output.status.success());
    assert!(
        String::from_utf8_lossy(&output.stderr).contains("failed to parse solve job"),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn unknown_subcommand_is_a_usage_error() {
    let output = radsolve()
        .arg("granulate")
        .output()
        .expect("cli should run");
    assert_eq!(output.status.code(), Some(2));
}
