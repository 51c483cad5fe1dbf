// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;

crate::define_id! {
    /// Test ID type for macro verification.
    pub struct TestId("tst-");
}

#[test]
fn define_id_generates_prefixed_ids() {
    let id = TestId::new();
    assert!(id.as_str().starts_with("tst-"));
    assert_eq!(id.as_str().len(), 23);
}

#[test]
fn define_id_ids_are_unique() {
    let id1 = TestId::new();
    let id2 = TestId::new();
    assert_ne!(id1, id2);
}

#[test]
fn define_id_displays_the_full_id() {
    let id = TestId::from("tst-abcdef");
    assert_eq!(id.to_string(), "tst-abcdef");
}

#[test]
fn define_id_hash_map_lookup() {
    let mut map = HashMap::new();
    map.insert(TestId::from("tst-k"), 42);
    assert_eq!(map.get(&TestId::from("tst-k")), Some(&42));
}

#[test]
fn define_id_serde_is_transparent() {
    let id = TestId::from("tst-abc");
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"tst-abc\"");

    let parsed: TestId = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, id);
}
