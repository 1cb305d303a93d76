// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use serde_json::json;
use yare::parameterized;

use super::*;

#[parameterized(
    string = { r#""hello""#, json!("hello") },
    number = { "42", json!(42) },
    object = { r#"{"a":[1,2]}"#, json!({ "a": [1, 2] }) },
    null = { "null", json!(null) },
)]
fn test_parse_payload(text: &str, expected: Value) {
    assert_eq!(parse_payload(text).unwrap(), expected);
}

#[parameterized(
    bare_word = { "hello" },
    empty = { "" },
    truncated = { "{\"a\":" },
)]
fn test_parse_payload_rejects(text: &str) {
    assert!(matches!(parse_payload(text), Err(Error::InvalidPayload(_))));
}
