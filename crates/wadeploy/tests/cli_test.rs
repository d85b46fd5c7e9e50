#![allow(deprecated)] // assert_cmd: cargo_bin

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("wadeploy").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Azure App Service"))
        .stdout(predicate::str::contains("deploy"))
        .stdout(predicate::str::contains("registry"))
        .stdout(predicate::str::contains("version"));
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("wadeploy").unwrap();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("wadeploy"))
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_deploy_help() {
    let mut cmd = Command::cargo_bin("wadeploy").unwrap();
    cmd.arg("deploy")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--project"))
        .stdout(predicate::str::contains("--package"))
        .stdout(predicate::str::contains("--app-id"));
}

#[test]
fn test_registry_tags_requires_repository() {
    let mut cmd = Command::cargo_bin("wadeploy").unwrap();
    cmd.args(["registry", "tags"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("<REPOSITORY>"));
}

#[test]
fn test_deploy_reports_missing_setting() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = temp_dir.path().join("wadeploy.yaml");
    std::fs::write(&config, "registry:\n  server_url: myregistry.azurecr.io\n").unwrap();

    let mut cmd = Command::cargo_bin("wadeploy").unwrap();
    cmd.current_dir(temp_dir.path())
        .env_remove("AZURE_SUBSCRIPTION_ID")
        .args(["deploy", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("web_app.subscription_id"));
}

#[test]
fn test_invalid_config_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = temp_dir.path().join("wadeploy.yaml");
    std::fs::write(&config, "registry: [unclosed\n").unwrap();

    let mut cmd = Command::cargo_bin("wadeploy").unwrap();
    cmd.args(["registry", "repos", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse"));
}
