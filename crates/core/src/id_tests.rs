// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::HashMap;

crate::define_id! {
    /// Test ID type for macro verification.
    pub struct TestId("tst-");
}

#[test]
fn generated_id_has_prefix_and_full_length() {
    let id = TestId::new();
    assert!(id.as_str().starts_with("tst-"));
    assert_eq!(id.as_str().len(), ID_MAX_LEN);
}

#[test]
fn define_id_hash_map_lookup_by_str() {
    let id = TestId::from_string("tst-abc");
    let mut map = HashMap::new();
    map.insert(id, 42);
    assert_eq!(map.get("tst-abc"), Some(&42));
}

#[test]
fn suffix_strips_prefix() {
    let id = TestId::from_string("tst-abcdef");
    assert_eq!(id.suffix(), "abcdef");
}

#[test]
fn short_truncates_suffix() {
    let id = TestId::from_string("tst-abcdefghijklmnop");
    assert_eq!(id.short(8), "abcdefgh");
    assert_eq!(id.short(99), "abcdefghijklmnop");
}

#[test]
fn serde_is_transparent() {
    let id = TestId::from_string("tst-roundtrip");
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"tst-roundtrip\"");
    let back: TestId = serde_json::from_str(&json).unwrap();
    assert_eq!(back, id);
}

#[test]
fn deserialize_rejects_oversized() {
    let long = format!("\"{}\"", "x".repeat(ID_MAX_LEN + 1));
    assert!(serde_json::from_str::<TestId>(&long).is_err());
}

#[test]
fn short_fn_truncates_plain_strings() {
    assert_eq!(short("abcdef", 3), "abc");
    assert_eq!(short("ab", 3), "ab");
}
