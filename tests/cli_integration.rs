//! CLI integration tests
//!
//! Exercises the binary end-to-end for behaviour that needs no network:
//! argument handling and configuration errors raised before any I/O.

use assert_cmd::Command;
use predicates::prelude::*;

fn cli() -> Command {
    Command::cargo_bin("chain-registry-query").unwrap()
}

// ==================== Basic CLI tests ====================

#[test]
fn test_version() {
    cli()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("chain-registry-query"));
}

#[test]
fn test_help() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("chain registry"))
        .stdout(predicate::str::contains("--max-results"))
        .stdout(predicate::str::contains("--polkachu"));
}

#[test]
fn test_missing_arguments() {
    cli().assert().failure();
    cli().arg("osmosis").assert().failure();
}

// ==================== Configuration errors ====================

#[test]
fn test_invalid_resource_type() {
    cli()
        .args(["osmosis", "validators", "--no-preflight"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "persistent_peers, seeds, rpc, rest or grpc",
        ));
}

#[test]
fn test_polkachu_requires_persistent_peers() {
    cli()
        .args(["osmosis", "rpc", "--polkachu"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Only 'persistent_peers'"));
}

#[test]
fn test_polkachu_rejected_for_seeds() {
    cli()
        .args(["osmosis", "seeds", "--polkachu", "-q"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("persistent_peers"));
}

#[test]
fn test_require_websocket_only_for_rpc() {
    cli()
        .args(["osmosis", "grpc", "--require-websocket"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("websocket"));
}

#[test]
fn test_zero_concurrency_rejected() {
    cli()
        .args(["osmosis", "rest", "-n", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Concurrency"));
}

#[test]
fn test_unknown_format_rejected() {
    cli()
        .args(["osmosis", "rest", "--format", "xml", "--no-preflight"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported output format"));
}

#[test]
fn test_bad_config_file_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[settings]\nconcurrency = \"many\"\n").unwrap();

    cli()
        .args(["osmosis", "rest", "--config"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Config file parse error"));
}
