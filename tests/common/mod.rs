//! Shared helpers for config-history integration tests.
//!
//! Every test records into its own temp directory.

#![allow(dead_code)]

use std::path::Path;

use serde_json::{Value, json};
use tempfile::TempDir;

use config_history::{HistoryConfig, HistoryStore, TrackedObject};

/// A config that records into `dir`.
pub fn config_for(dir: &Path) -> HistoryConfig {
    let mut config = HistoryConfig::default();
    config.repository.path = dir.to_path_buf();
    config
}

/// Open a fresh store in a new temp directory.
pub fn setup_store() -> (TempDir, HistoryStore) {
    let dir = TempDir::new().expect("failed to create temp dir");
    let store = HistoryStore::open(&config_for(dir.path())).expect("failed to open store");
    (dir, store)
}

/// A core-group `ConfigMap` carrying `data`.
pub fn config_map(data: Value) -> TrackedObject {
    TrackedObject::new(json!({
        "apiVersion": "v1",
        "kind": "ConfigMap",
        "metadata": {"name": "cluster-settings", "namespace": "openshift-config"},
        "data": data,
    }))
}

/// An object of kind `kind` in group `example.io/v1`.
pub fn custom(kind: &str, value: &str) -> TrackedObject {
    TrackedObject::new(json!({
        "apiVersion": "example.io/v1",
        "kind": kind,
        "metadata": {"name": "x"},
        "spec": {"value": value},
    }))
}

/// Commit messages on `HEAD`, oldest first.
pub fn messages(store: &HistoryStore) -> Vec<String> {
    let mut messages: Vec<String> = store
        .history(None)
        .expect("history")
        .into_iter()
        .map(|e| e.message)
        .collect();
    messages.reverse();
    messages
}

/// Contents of `.git/info/refs`.
pub fn ref_index(dir: &Path) -> String {
    std::fs::read_to_string(dir.join(".git/info/refs")).expect("read info/refs")
}
