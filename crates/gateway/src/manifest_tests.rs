// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

const MINIMAL: &str = r#"{
    "id": "term-gw",
    "direction": "bidirectional",
    "process": {"command": "term-agent"}
}"#;

#[test]
fn minimal_manifest_fills_defaults() {
    let m = GatewayManifest::from_json(MINIMAL).unwrap();
    assert_eq!(m.transport, "process_stdio");
    assert!(m.enabled);
    assert_eq!(m.mode.default, DeliveryMode::Sync);
    assert_eq!(m.process.ack_timeout_ms, 3_000);
    assert_eq!(m.process.request_timeout_ms, 30_000);
    assert!(m.default_target.is_none());
}

#[test]
fn unsupported_transport_is_rejected() {
    let raw = r#"{"id": "x", "direction": "input", "transport": "tcp",
                  "process": {"command": "x"}}"#;
    assert!(matches!(
        GatewayManifest::from_json(raw),
        Err(FingerError::InvalidConfig(_))
    ));
}

#[test]
fn content_hash_tracks_content() {
    let a = GatewayManifest::from_json(MINIMAL).unwrap();
    let b = GatewayManifest::from_json(MINIMAL).unwrap();
    assert_eq!(a.content_hash(), b.content_hash());

    let mut c = a.clone();
    c.process.args.push("--verbose".into());
    assert_ne!(a.content_hash(), c.content_hash());
}

#[test]
fn load_dir_skips_invalid_and_sorts() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(
        tmp.path().join("b.json"),
        r#"{"id": "b-gw", "direction": "output", "process": {"command": "b"}}"#,
    )
    .unwrap();
    std::fs::write(
        tmp.path().join("a.json"),
        r#"{"id": "a-gw", "direction": "input", "process": {"command": "a"}}"#,
    )
    .unwrap();
    std::fs::write(tmp.path().join("broken.json"), "{").unwrap();
    std::fs::write(tmp.path().join("notes.txt"), "ignored").unwrap();

    let manifests = load_dir(tmp.path());
    let ids: Vec<&str> = manifests.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["a-gw", "b-gw"]);
}

#[test]
fn load_dir_of_missing_directory_is_empty() {
    assert!(load_dir(Path::new("/nonexistent/gateways")).is_empty());
}
