// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use std::fs;

use tempfile::TempDir;

use super::*;

fn write_config(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("config.toml");
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_file_values_are_used() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        "endpoint = \"https://api.example.com\"\napi_key = \"file-key\"\n",
    );
    let args = GlobalArgs {
        config: Some(path),
        ..GlobalArgs::default()
    };

    let config = load(&args).unwrap();

    assert_eq!(config.endpoint, "https://api.example.com");
    assert_eq!(config.api_key.as_deref(), Some("file-key"));
    assert!(!config.internal);
}

#[test]
fn test_flags_override_file() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        "endpoint = \"https://api.example.com\"\napi_key = \"file-key\"\n\n[reconnect]\nbase_delay_ms = 100\n",
    );
    let args = GlobalArgs {
        config: Some(path),
        endpoint: Some("http://localhost:3000".to_string()),
        api_key: Some("flag-key".to_string()),
        internal: true,
        verbose: false,
    };

    let config = load(&args).unwrap();

    assert_eq!(config.endpoint, "http://localhost:3000");
    assert_eq!(config.api_key.as_deref(), Some("flag-key"));
    assert!(config.internal);
    // Sections absent from the flags survive
    assert_eq!(config.reconnect.base_delay_ms, 100);
}

#[test]
fn test_explicit_missing_config_is_an_error() {
    let dir = TempDir::new().unwrap();
    let args = GlobalArgs {
        config: Some(dir.path().join("nope.toml")),
        endpoint: Some("http://localhost:3000".to_string()),
        ..GlobalArgs::default()
    };

    assert!(matches!(load(&args), Err(Error::ConfigFile(_))));
}

#[test]
fn test_endpoint_flag_without_file() {
    let args = GlobalArgs {
        endpoint: Some("http://localhost:3000".to_string()),
        ..GlobalArgs::default()
    };

    let config = load(&args).unwrap();

    assert_eq!(config.endpoint, "http://localhost:3000");
}
