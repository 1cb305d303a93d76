// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// Allow unused items: test helpers are shared across multiple test binaries,
// and not every test file uses every helper.
#![allow(dead_code)]
#![allow(unused_imports)]
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;

pub use predicates::prelude::*;
pub use tempfile::TempDir;

/// `pubwire` isolated from any config file in the real home directory.
pub fn pubwire(home: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("pubwire");
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path())
        .env_remove("RUST_LOG");
    cmd
}

/// Writes `config.toml` into `dir` and returns its path as a string.
pub fn write_config(dir: &TempDir, content: &str) -> String {
    let path = dir.path().join("config.toml");
    std::fs::write(&path, content).unwrap();
    path.display().to_string()
}
