//! End-to-end CLI integration tests for the `roster` binary.
//!
//! Each test writes its own catalog into a temporary directory and runs
//! the binary there via `assert_cmd`.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const CAMP: &str = r#"
[[variables]]
id = 1
name = "base"
default = "5"

[[variables]]
id = 2
name = "bonus"

[[variables]]
id = 3
name = "nights"
default = "2"

[[variables]]
id = 4
name = "tent_fee"
kind = "choice"

[[values]]
variable = 2
event = "E1"
value = "3"
revision = 1

[[values]]
variable = 4
event = "E1"
choice = "tent"
value = "12.5"
revision = 1

[[attributes]]
name = "room"
formula = "value * nights"

[[attributes.choices]]
id = "single"
title = "Single room"
management_title = "40"

[[attributes.choices]]
id = "tent"
title = "Tent"
management_title = "tent"
formula = "tent_fee"
"#;

/// Build a `Command` targeting the cargo-built `roster` binary.
fn roster(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("roster").unwrap();
    cmd.current_dir(dir.path())
        .env("NO_COLOR", "1")
        .env_remove("ROSTER_DIR")
        .env_remove("RUST_LOG");
    cmd
}

fn camp() -> TempDir {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("camp.catalog.toml"), CAMP).unwrap();
    tmp
}

fn json_stdout(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.output().unwrap();
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

// ---------------------------------------------------------------------------
// init
// ---------------------------------------------------------------------------

#[test]
fn init_creates_default_catalog() {
    let tmp = TempDir::new().unwrap();
    roster(&tmp).args(["init", "--catalog", "camp"]).assert().success();
    assert!(tmp.path().join(".roster/config.yaml").is_file());
    assert!(tmp.path().join(".roster/catalogs/camp.catalog.toml").is_file());

    roster(&tmp)
        .args(["variable", "create", "--name", "fee", "--default", "3"])
        .assert()
        .success();
    roster(&tmp)
        .args(["formula", "eval", "fee * 2"])
        .assert()
        .success()
        .stdout("6,00\n");

    roster(&tmp)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

// ---------------------------------------------------------------------------
// flags
// ---------------------------------------------------------------------------

#[test]
fn flags_format_lists_labels_in_catalog_order() {
    let tmp = TempDir::new().unwrap();
    roster(&tmp)
        .args(["flags", "format", "status", "3"])
        .assert()
        .success()
        .stdout("confirmed, paid\n");

    roster(&tmp)
        .args(["flags", "format", "participant_status", "0"])
        .assert()
        .success()
        .stdout("unconfirmed\n");
}

#[test]
fn flags_format_rejects_stray_bits() {
    let tmp = TempDir::new().unwrap();
    roster(&tmp)
        .args(["flags", "format", "status", "8"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("outside the catalog"));
}

#[test]
fn flags_edit_json() {
    let tmp = TempDir::new().unwrap();
    let json = json_stdout(roster(&tmp).args([
        "flags", "edit", "food", "2", "--enable", "no_pork", "--toggle", "vegan", "--json",
    ]));
    assert_eq!(json["mask"], 8);
    assert_eq!(json["names"], serde_json::json!(["no_pork"]));
    assert_eq!(json["labels"], serde_json::json!(["no pork"]));
}

#[test]
fn flags_list_json_has_categories() {
    let tmp = TempDir::new().unwrap();
    let json = json_stdout(roster(&tmp).args(["flags", "list", "status", "--json"]));
    let flags = json["flags"].as_array().unwrap();
    assert_eq!(flags.len(), 4);
    assert_eq!(flags[0]["name"], "confirmed");
    assert_eq!(flags[0]["category"], "success");
    assert_eq!(flags[0]["absence"], "unconfirmed");
    assert_eq!(flags[3]["bit"], 16);
}

#[test]
fn config_overrides_labels() {
    let tmp = TempDir::new().unwrap();
    std::fs::create_dir(tmp.path().join(".roster")).unwrap();
    std::fs::write(
        tmp.path().join(".roster/config.yaml"),
        "flags:\n  participant_status:\n    labels:\n      paid: settled\n",
    )
    .unwrap();

    roster(&tmp)
        .args(["flags", "format", "status", "2"])
        .assert()
        .success()
        .stdout("settled\n");
}

// ---------------------------------------------------------------------------
// formula
// ---------------------------------------------------------------------------

#[test]
fn formula_parse_round_trips_separator() {
    let tmp = TempDir::new().unwrap();
    let json = json_stdout(roster(&tmp).args(["formula", "parse", "10,5 + x", "--json"]));
    assert_eq!(json["expression"], "10.5 + x");
    assert_eq!(json["display"], "10,5 + x");
    assert_eq!(json["variables"], serde_json::json!(["x"]));
}

#[test]
fn formula_parse_uses_configured_separator() {
    let tmp = TempDir::new().unwrap();
    std::fs::create_dir(tmp.path().join(".roster")).unwrap();
    std::fs::write(
        tmp.path().join(".roster/config.yaml"),
        "pricing:\n  display_separator: \".\"\n",
    )
    .unwrap();

    roster(&tmp)
        .args(["formula", "parse", "10,5 + x"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Expression: 10.5 + x"));
}

#[test]
fn formula_parse_reports_syntax_errors() {
    let tmp = TempDir::new().unwrap();
    roster(&tmp)
        .args(["formula", "parse", "(1 +"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("syntax error"));
}

#[test]
fn formula_eval_uses_overrides_and_defaults() {
    let tmp = camp();
    roster(&tmp)
        .args(["formula", "eval", "base * 2 + bonus", "--catalog", "camp", "--event", "E1"])
        .assert()
        .success()
        .stdout("13,00\n");
}

#[test]
fn formula_eval_names_missing_variable() {
    let tmp = camp();
    roster(&tmp)
        .args(["formula", "eval", "base * 2 + bonus", "--catalog", "camp", "--event", "E2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("calculation impossible").and(predicate::str::contains("'bonus'")));

    let output = roster(&tmp)
        .args([
            "formula", "eval", "base * 2 + bonus", "--catalog", "camp", "--event", "E2", "--json",
        ])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let err: serde_json::Value = serde_json::from_slice(&output.stderr).unwrap();
    assert_eq!(err["variable"], "bonus");
}

#[test]
fn formula_eval_without_catalog() {
    let tmp = TempDir::new().unwrap();
    roster(&tmp)
        .args(["formula", "eval", "value * n", "--set", "n=2,5", "--value", "4"])
        .assert()
        .success()
        .stdout("10,00\n");
}

#[test]
fn formula_check_passes_and_fails() {
    let tmp = camp();
    roster(&tmp)
        .args(["formula", "check", "--catalog", "camp"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 attribute(s) consistent"));

    let broken = CAMP.replace("formula = \"tent_fee\"\n", "");
    std::fs::write(tmp.path().join("broken.catalog.toml"), broken).unwrap();
    roster(&tmp)
        .args(["formula", "check", "--catalog", "broken"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("numeric management title"));
}

// ---------------------------------------------------------------------------
// price
// ---------------------------------------------------------------------------

#[test]
fn price_breakdown_json() {
    let tmp = camp();
    let json = json_stdout(roster(&tmp).args([
        "price", "--catalog", "camp", "--event", "E1", "--select", "room=single", "--json",
    ]));
    assert_eq!(json["summands"][0]["attribute"], "room");
    assert_eq!(json["summands"][0]["formula"], "value * nights");
    assert_eq!(json["total"], "80");
}

#[test]
fn price_text_uses_configured_separator() {
    let tmp = camp();
    std::fs::create_dir(tmp.path().join(".roster")).unwrap();
    std::fs::write(
        tmp.path().join(".roster/config.yaml"),
        "catalog: camp\npricing:\n  display_separator: \".\"\n",
    )
    .unwrap();

    roster(&tmp)
        .args(["price", "--event", "E1", "--select", "room=tent"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total: 12.50"));
}

#[test]
fn price_fails_for_unknown_choice() {
    let tmp = camp();
    roster(&tmp)
        .args(["price", "--catalog", "camp", "--event", "E1", "--select", "room=suite"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no choice 'suite'"));
}

// ---------------------------------------------------------------------------
// variable
// ---------------------------------------------------------------------------

#[test]
fn variable_set_then_eval() {
    let tmp = camp();
    roster(&tmp)
        .args(["variable", "set", "--catalog", "camp", "--variable", "bonus", "--event", "E2", "--value", "4"])
        .assert()
        .success();

    roster(&tmp)
        .args(["formula", "eval", "base * 2 + bonus", "--catalog", "camp", "--event", "E2"])
        .assert()
        .success()
        .stdout("14,00\n");
}

#[test]
fn variable_set_detects_revision_conflict() {
    let tmp = camp();
    roster(&tmp)
        .args([
            "variable", "set", "--catalog", "camp", "--variable", "bonus", "--event", "E1", "--value", "9",
            "--revision", "0",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("revision conflict"));
}

#[test]
fn variable_provision_is_idempotent() {
    let tmp = camp();
    for _ in 0..2 {
        let json = json_stdout(roster(&tmp).args([
            "variable", "provision", "--catalog", "camp", "--variable", "nights", "--event", "E9", "--json",
        ]));
        assert_eq!(json["event"], "E9");
        assert!(json.get("value").is_none());
    }

    let list = json_stdout(roster(&tmp).args([
        "variable", "list", "--catalog", "camp", "--event", "E9", "--json",
    ]));
    let nights = list
        .as_array()
        .unwrap()
        .iter()
        .find(|v| v["name"] == "nights")
        .unwrap()
        .clone();
    assert_eq!(nights["effective"], "2");

    let saved = std::fs::read_to_string(tmp.path().join("camp.catalog.toml")).unwrap();
    assert_eq!(saved.matches("event = \"E9\"").count(), 1);
}

#[test]
fn variable_delete_and_restore() {
    let tmp = camp();
    roster(&tmp)
        .args(["variable", "delete", "--catalog", "camp", "--variable", "base"])
        .assert()
        .success();

    roster(&tmp)
        .args(["formula", "eval", "base", "--catalog", "camp"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("'base'"));

    roster(&tmp)
        .args(["variable", "restore", "--catalog", "camp", "--id", "1"])
        .assert()
        .success();

    roster(&tmp)
        .args(["formula", "eval", "base", "--catalog", "camp"])
        .assert()
        .success()
        .stdout("5,00\n");
}

#[test]
fn version_prints() {
    let tmp = TempDir::new().unwrap();
    roster(&tmp)
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("roster version"));
}
