//! CLI integration tests for flagdeck
//!
//! Tests the flagdeck CLI commands end-to-end using assert_cmd. Each
//! test gets its own config dir so database and config files stay
//! isolated.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Helper to create a command scoped to an isolated config directory
fn flagdeck_cmd(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("flagdeck").unwrap();
    cmd.env("FLAGDECK_CONFIG_DIR", home.path());
    cmd
}

/// Extract the flag ID from `flags create` output
fn extract_id(output: &[u8], label: &str) -> String {
    let text = String::from_utf8_lossy(output);
    text.lines()
        .find_map(|line| line.trim().strip_prefix(label))
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| panic!("No '{}' line in output:\n{}", label, text))
}

const ORG: &str = "11111111-1111-1111-1111-111111111111";

#[test]
fn test_create_and_show_flag() {
    let home = TempDir::new().unwrap();

    let output = flagdeck_cmd(&home)
        .args([
            "flags", "create", "dark-mode", "--org", ORG, "--env", "prod", "--env", "staging",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Flag created successfully"))
        .get_output()
        .stdout
        .clone();

    let flag_id = extract_id(&output, "ID:");

    flagdeck_cmd(&home)
        .args(["flags", "show", &flag_id])
        .assert()
        .success()
        .stdout(predicate::str::contains("dark-mode"))
        .stdout(predicate::str::contains("prod [off]"))
        .stdout(predicate::str::contains("Live revision: none"));
}

#[test]
fn test_flags_list_scoped_to_org() {
    let home = TempDir::new().unwrap();

    flagdeck_cmd(&home)
        .args(["flags", "create", "only-flag", "--org", ORG, "--env", "prod"])
        .assert()
        .success();

    flagdeck_cmd(&home)
        .args(["flags", "list", "--org", ORG])
        .assert()
        .success()
        .stdout(predicate::str::contains("only-flag"));

    flagdeck_cmd(&home)
        .args([
            "flags",
            "list",
            "--org",
            "22222222-2222-2222-2222-222222222222",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("No flags found"));
}

#[test]
fn test_draft_approve_rollback_flow() {
    let home = TempDir::new().unwrap();

    let output = flagdeck_cmd(&home)
        .args(["flags", "create", "pricing", "--org", ORG, "--env", "prod"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let flag_id = extract_id(&output, "ID:");

    let output = flagdeck_cmd(&home)
        .args(["revisions", "draft", &flag_id, "-d", "true"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Draft revision created"))
        .get_output()
        .stdout
        .clone();
    let revision_id = extract_id(&output, "Draft revision created:");

    flagdeck_cmd(&home)
        .args(["revisions", "approve", &flag_id, &revision_id])
        .assert()
        .success()
        .stdout(predicate::str::contains("is now live"))
        .stdout(predicate::str::contains("Flag version: 2"));

    flagdeck_cmd(&home)
        .args(["revisions", "rollback", &flag_id])
        .assert()
        .success()
        .stdout(predicate::str::contains("no revision is live"));

    flagdeck_cmd(&home)
        .args(["revisions", "list", &flag_id])
        .assert()
        .success()
        .stdout(predicate::str::contains("[draft]"));
}

#[test]
fn test_toggle_environment() {
    let home = TempDir::new().unwrap();

    let output = flagdeck_cmd(&home)
        .args(["flags", "create", "banner", "--org", ORG, "--env", "prod"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let flag_id = extract_id(&output, "ID:");

    flagdeck_cmd(&home)
        .args(["toggle", &flag_id, "prod"])
        .assert()
        .success()
        .stdout(predicate::str::contains("'prod' is now on"));

    flagdeck_cmd(&home)
        .args(["toggle", &flag_id, "qa"])
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing changed"));
}

#[test]
fn test_audit_show_records_activity() {
    let home = TempDir::new().unwrap();

    let output = flagdeck_cmd(&home)
        .args(["flags", "create", "audited", "--org", ORG, "--env", "prod"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let flag_id = extract_id(&output, "ID:");

    flagdeck_cmd(&home)
        .args(["toggle", &flag_id, "prod"])
        .assert()
        .success();

    flagdeck_cmd(&home)
        .args(["audit", "show", &flag_id])
        .assert()
        .success()
        .stdout(predicate::str::contains("created"))
        .stdout(predicate::str::contains("toggled"));
}

#[test]
fn test_delete_hides_flag() {
    let home = TempDir::new().unwrap();

    let output = flagdeck_cmd(&home)
        .args(["flags", "create", "doomed", "--org", ORG, "--env", "prod"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let flag_id = extract_id(&output, "ID:");

    flagdeck_cmd(&home)
        .args(["flags", "delete", &flag_id])
        .assert()
        .success();

    flagdeck_cmd(&home)
        .args(["flags", "show", &flag_id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_audit_prune_rejects_nonpositive_days() {
    let home = TempDir::new().unwrap();

    let output = flagdeck_cmd(&home)
        .args(["flags", "create", "kept", "--org", ORG, "--env", "prod"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let flag_id = extract_id(&output, "ID:");

    for bad in ["--days=0", "--days=-5"] {
        flagdeck_cmd(&home)
            .args(["audit", "prune", bad])
            .assert()
            .failure()
            .stderr(predicate::str::contains("at least 1"));
    }

    // The trail is untouched by the rejected prune.
    flagdeck_cmd(&home)
        .args(["audit", "show", &flag_id])
        .assert()
        .success()
        .stdout(predicate::str::contains("created"));
}

#[test]
fn test_config_round_trip() {
    let home = TempDir::new().unwrap();

    flagdeck_cmd(&home)
        .args(["config", "set", "audit.retention_days", "30"])
        .assert()
        .success();

    flagdeck_cmd(&home)
        .args(["config", "get", "audit.retention_days"])
        .assert()
        .success()
        .stdout(predicate::str::contains("30"));

    flagdeck_cmd(&home)
        .args(["config", "reset"])
        .assert()
        .success();

    flagdeck_cmd(&home)
        .args(["config", "get", "audit.retention_days"])
        .assert()
        .success()
        .stdout(predicate::str::contains("90"));
}

#[test]
fn test_doctor_reports_healthy() {
    let home = TempDir::new().unwrap();

    flagdeck_cmd(&home)
        .args(["doctor"])
        .assert()
        .success()
        .stdout(predicate::str::contains("All checks passed"));
}
