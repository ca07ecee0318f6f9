//! CLI smoke tests. These never start a browser.

use assert_cmd::Command;
use predicates::prelude::*;

fn storecheck() -> Command {
    Command::cargo_bin("storecheck").expect("binary builds")
}

#[test]
fn list_shows_registered_scenarios() {
    storecheck()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("login_standard_user"))
        .stdout(predicate::str::contains("cart_add_and_remove"));
}

#[test]
fn init_then_validate_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("storecheck.toml");

    storecheck()
        .args(["init", "--path"])
        .arg(&config)
        .assert()
        .success();

    storecheck()
        .arg("--config")
        .arg(&config)
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"));
}

#[test]
fn init_refuses_to_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("storecheck.toml");
    std::fs::write(&config, "# existing\n").unwrap();

    storecheck()
        .args(["init", "--path"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn validate_fails_on_a_missing_config() {
    storecheck()
        .args(["--config", "/no/such/storecheck.toml", "validate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load config"));
}

#[test]
fn validate_rejects_an_unsupported_browser() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("storecheck.toml");
    std::fs::write(
        &config,
        "[browser]\nkind = \"netscape\"\n\n[timeouts]\nimplicit_wait = 10\nexplicit_wait = 10\npage_load = 30\n\n[retry]\ncount = 0\n\n[suite]\nworkers = 1\n",
    )
    .unwrap();

    storecheck()
        .arg("--config")
        .arg(&config)
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a supported browser"));
}

#[test]
fn validate_rejects_a_malformed_grid_url() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("storecheck.toml");
    std::fs::write(
        &config,
        "[browser]\nkind = \"chrome\"\n\n[timeouts]\nimplicit_wait = 10\nexplicit_wait = 10\npage_load = 30\n\n[retry]\ncount = 0\n\n[suite]\nworkers = 1\n\n[grid]\nenabled = true\nhub_url = \"not a url\"\n",
    )
    .unwrap();

    storecheck()
        .arg("--config")
        .arg(&config)
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("grid.hub_url"));
}
