//! CLI tests for the vt-core binary.
//!
//! Verify payloads on stdout, errors on stderr and the exit-code contract.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};

/// Get a Command for the vt-core binary with calibration env cleared.
fn vt_core() -> Command {
    let mut cmd = Command::cargo_bin("vt-core").expect("vt-core binary should exist");
    cmd.env_remove("VT_AGE_TABLE")
        .env_remove("VT_SEVERITY_TABLE")
        .env_remove("VT_CONFIG_DIR")
        .env_remove("VT_LOG")
        .env_remove("VT_LOG_FORMAT")
        .env_remove("RUST_LOG");
    cmd
}

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../test/fixtures/calibration")
        .join(name)
}

mod run {
    use super::*;

    #[test]
    fn prints_comparison_report() {
        let output = vt_core()
            .args(["run", "-n", "100", "-k", "40", "-t", "5", "-s", "7", "-q"])
            .output()
            .expect("run");
        assert!(output.status.success());
        let report: serde_json::Value =
            serde_json::from_slice(&output.stdout).expect("stdout is JSON");
        assert_eq!(report["trials"], 5);
        assert_eq!(report["ventilators"], 40);
        assert_eq!(report["policies"].as_array().map(Vec::len), Some(7));
    }

    #[test]
    fn output_is_reproducible_and_parallel_safe() {
        let args = ["run", "-n", "80", "--scarcity", "0.25", "-t", "6", "-s", "3", "-q"];
        let sequential = vt_core().args(args).output().expect("sequential");
        let parallel = vt_core().args(args).arg("--parallel").output().expect("parallel");
        assert!(sequential.status.success());
        assert_eq!(sequential.stdout, parallel.stdout);
    }

    #[test]
    fn policy_subset_and_baseline() {
        vt_core()
            .args([
                "run",
                "-n",
                "50",
                "-t",
                "3",
                "--policy",
                "lottery,scheme-a,youngest_first",
                "--baseline",
                "youngest-first",
                "-f",
                "summary",
                "-q",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("baseline=youngest-first"))
            .stdout(predicate::str::contains("tiered-lottery"))
            .stdout(predicate::str::contains("sickest-first").not());
    }

    #[test]
    fn budget_above_population_is_config_error() {
        vt_core()
            .args(["run", "-n", "10", "-k", "11", "-t", "1", "-q"])
            .assert()
            .code(10)
            .stderr(predicate::str::contains("ventilators"));
    }

    #[test]
    fn error_payload_names_the_field() {
        vt_core()
            .args(["run", "-n", "10", "-k", "11", "-t", "1", "-q"])
            .assert()
            .code(10)
            .stderr(predicate::str::contains(r#""field":"ventilators""#))
            .stderr(predicate::str::contains(r#""kind":"ERR_CONFIG""#));
    }

    #[test]
    fn unknown_baseline_is_config_error() {
        vt_core()
            .args(["run", "-n", "10", "-t", "1", "--policy", "lottery", "--baseline", "youngest-first", "-q"])
            .assert()
            .code(10)
            .stdout(predicate::str::is_empty());
    }

    #[test]
    fn unknown_policy_rejected_by_parser() {
        vt_core()
            .args(["run", "--policy", "first-come"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("unknown policy"));
    }

    #[test]
    fn missing_table_is_io_error() {
        vt_core()
            .args(["run", "-t", "1", "--age-table", "/nonexistent/age_table.json", "-q"])
            .assert()
            .code(12);
    }
}

mod cohort {
    use super::*;

    #[test]
    fn prints_requested_patients() {
        let output = vt_core()
            .args(["cohort", "-n", "25", "-s", "1", "-q"])
            .output()
            .expect("cohort");
        assert!(output.status.success());
        let cohort: serde_json::Value =
            serde_json::from_slice(&output.stdout).expect("stdout is JSON");
        let patients = cohort["patients"].as_array().expect("patients");
        assert_eq!(patients.len(), 25);
        for p in patients {
            let score = p["severity_score"].as_u64().expect("score");
            assert!((3..=20).contains(&score));
        }
    }

    #[test]
    fn zero_patients_is_config_error() {
        vt_core()
            .args(["cohort", "-n", "0", "-q"])
            .assert()
            .code(10);
    }
}

mod check {
    use super::*;

    #[test]
    fn presets_are_valid() {
        vt_core()
            .args(["check", "--preset", "flat", "-q"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"status\": \"ok\""));
    }

    #[test]
    fn fixture_tables_are_valid() {
        vt_core()
            .arg("check")
            .arg("--age-table")
            .arg(fixture("valid_age_table.json"))
            .arg("--severity-table")
            .arg(fixture("valid_severity_table.json"))
            .arg("--constants")
            .arg(fixture("constants_override.json"))
            .arg("-q")
            .assert()
            .success()
            .stdout(predicate::str::contains("CLI argument"));
    }

    #[test]
    fn broken_severity_table_is_config_error() {
        vt_core()
            .arg("check")
            .arg("--severity-table")
            .arg(fixture("invalid_severity_table_missing_bucket.json"))
            .arg("-q")
            .assert()
            .code(10)
            .stderr(predicate::str::contains("ERR_CONFIG"));
    }

    #[test]
    fn missing_environment_path_warns_and_uses_preset() {
        vt_core()
            .env("VT_AGE_TABLE", "/nonexistent/age_table.json")
            .args(["check", "-f", "summary"])
            .assert()
            .success()
            .stdout(predicate::str::contains("age table from builtin preset"))
            .stderr(predicate::str::contains("does not exist"))
            .stderr(predicate::str::contains("VT_AGE_TABLE"));
    }

    #[test]
    fn age_table_from_environment() {
        vt_core()
            .env("VT_AGE_TABLE", fixture("valid_age_table.json"))
            .args(["check", "-f", "summary", "-q"])
            .assert()
            .success()
            .stdout(predicate::str::contains("age table from environment variable"));
    }
}

mod logging {
    use super::*;

    #[test]
    fn quiet_flag_beats_rust_log() {
        vt_core()
            .env("RUST_LOG", "debug")
            .args(["-q", "run", "-n", "20", "-t", "2"])
            .assert()
            .success()
            .stderr(predicate::str::contains("run started").not())
            .stderr(predicate::str::contains("trial evaluated").not())
            .stderr(predicate::str::contains("resolved calibration paths").not());
    }

    #[test]
    fn vt_log_beats_rust_log() {
        vt_core()
            .env("RUST_LOG", "debug")
            .env("VT_LOG", "warn")
            .args(["run", "-n", "20", "-t", "2"])
            .assert()
            .success()
            .stderr(predicate::str::is_empty());
    }

    #[test]
    fn verbose_flag_reaches_calibration_events() {
        vt_core()
            .args(["-v", "run", "-n", "20", "-t", "2"])
            .assert()
            .success()
            .stderr(predicate::str::contains("resolved calibration paths"))
            .stderr(predicate::str::contains("trial evaluated"));
    }

    #[test]
    fn rust_log_directives_apply_without_flags() {
        vt_core()
            .env("RUST_LOG", "vt_config=debug")
            .args(["run", "-n", "20", "-t", "2"])
            .assert()
            .success()
            .stderr(predicate::str::contains("resolved calibration paths"))
            .stderr(predicate::str::contains("run started").not());
    }
}

#[test]
fn policies_lists_every_policy() {
    vt_core()
        .args(["policies", "-f", "summary"])
        .assert()
        .success()
        .stdout(predicate::str::contains("maximize-life-years"))
        .stdout(predicate::str::contains("scored-tiebreak"));
}

#[test]
fn unknown_command_fails() {
    vt_core()
        .arg("nonexistent-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}
