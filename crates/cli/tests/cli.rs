// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Command-line behavior that needs no server.

#![allow(clippy::unwrap_used)]

mod common;
use common::*;

#[test]
fn help_lists_commands() {
    let home = TempDir::new().unwrap();
    pubwire(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("listen"))
        .stdout(predicate::str::contains("publish"));
}

#[test]
fn missing_endpoint_is_reported() {
    let home = TempDir::new().unwrap();
    pubwire(&home)
        .args(["publish", "room1", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::starts_with("error: no endpoint configured"));
}

#[test]
fn missing_api_key_is_reported() {
    let home = TempDir::new().unwrap();
    pubwire(&home)
        .args(["publish", "room1", "1", "--endpoint", "http://127.0.0.1:9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing access key"));
}

#[test]
fn invalid_payload_is_reported() {
    let home = TempDir::new().unwrap();
    pubwire(&home)
        .args([
            "publish",
            "room1",
            "hello",
            "--endpoint",
            "http://127.0.0.1:9",
            "--api-key",
            "k",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid payload"));
}

#[test]
fn unsupported_scheme_is_reported() {
    let home = TempDir::new().unwrap();
    pubwire(&home)
        .args([
            "publish",
            "room1",
            "1",
            "--endpoint",
            "ftp://127.0.0.1",
            "--api-key",
            "k",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported endpoint scheme"));
}

#[test]
fn empty_channel_is_rejected() {
    let home = TempDir::new().unwrap();
    pubwire(&home)
        .args(["listen", "", "--endpoint", "http://127.0.0.1:9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be empty"));
}

#[test]
fn listen_requires_a_channel() {
    let home = TempDir::new().unwrap();
    pubwire(&home)
        .args(["listen", "--endpoint", "http://127.0.0.1:9"])
        .assert()
        .failure();
}

#[test]
fn explicit_config_must_exist() {
    let home = TempDir::new().unwrap();
    let missing = home.path().join("missing.toml");
    pubwire(&home)
        .args(["publish", "room1", "1", "--config"])
        .arg(&missing)
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read"));
}

#[test]
fn invalid_config_is_reported() {
    let home = TempDir::new().unwrap();
    let path = write_config(&home, "endpoint = ");
    pubwire(&home)
        .args(["publish", "room1", "1", "--config", &path])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid config"));
}

#[test]
fn publish_times_out_without_server() {
    // Nothing listens on the discard port; the client keeps retrying
    let home = TempDir::new().unwrap();
    pubwire(&home)
        .args([
            "publish",
            "room1",
            "1",
            "--endpoint",
            "http://127.0.0.1:9",
            "--api-key",
            "k",
            "--timeout-secs",
            "1",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("timed out after 1s"));
}
