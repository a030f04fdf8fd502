//! What the store does when a pipeline stage fails.

mod common;

use std::path::Path;

use serde_json::json;

use config_history::{HistoryStore, Outcome, Stage, TrackedObject};
use history_git::{
    CommitInfo, EntryMode, GitError, GitOid, GitRepo, GixRepo, NewCommit, RefName, Reference,
    TreeEntry,
};

use common::{config_for, custom, messages, ref_index, setup_store};

/// Delegates to gix but refuses to write commit objects.
struct FailingCommits(GixRepo);

impl GitRepo for FailingCommits {
    fn git_dir(&self) -> &Path {
        self.0.git_dir()
    }
    fn workdir(&self) -> Option<&Path> {
        self.0.workdir()
    }
    fn head_ref(&self) -> Result<RefName, GitError> {
        self.0.head_ref()
    }
    fn read_ref(&self, name: &RefName) -> Result<Option<GitOid>, GitError> {
        self.0.read_ref(name)
    }
    fn update_ref(
        &self,
        name: &RefName,
        new: GitOid,
        expected_old: Option<GitOid>,
        log_message: &str,
    ) -> Result<(), GitError> {
        self.0.update_ref(name, new, expected_old, log_message)
    }
    fn list_refs(&self) -> Result<Vec<Reference>, GitError> {
        self.0.list_refs()
    }
    fn rev_parse_opt(&self, spec: &str) -> Result<Option<GitOid>, GitError> {
        self.0.rev_parse_opt(spec)
    }
    fn read_blob(&self, oid: GitOid) -> Result<Vec<u8>, GitError> {
        self.0.read_blob(oid)
    }
    fn read_tree(&self, oid: GitOid) -> Result<Vec<TreeEntry>, GitError> {
        self.0.read_tree(oid)
    }
    fn read_commit(&self, oid: GitOid) -> Result<CommitInfo, GitError> {
        self.0.read_commit(oid)
    }
    fn write_blob(&self, data: &[u8]) -> Result<GitOid, GitError> {
        self.0.write_blob(data)
    }
    fn create_commit(&self, _commit: &NewCommit) -> Result<GitOid, GitError> {
        Err(GitError::BackendError {
            message: "object store is read-only".to_owned(),
        })
    }
    fn stage_path(&self, path: &str, blob: Option<(EntryMode, GitOid)>) -> Result<(), GitError> {
        self.0.stage_path(path, blob)
    }
    fn write_index_tree(&self) -> Result<GitOid, GitError> {
        self.0.write_index_tree()
    }
    fn walk_history(&self, tip: GitOid, limit: Option<usize>) -> Result<Vec<GitOid>, GitError> {
        self.0.walk_history(tip, limit)
    }
}

#[test]
fn commit_failure_still_publishes_index() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = config_for(dir.path());
    let good = HistoryStore::open(&config).unwrap();
    let tip = good.observed(&custom("Widget", "1")).commit().unwrap();
    drop(good);

    let repo = FailingCommits(GixRepo::open_at(dir.path()).unwrap());
    let store = HistoryStore::with_repo(repo, &config).unwrap();

    std::fs::remove_file(dir.path().join(".git/info/refs")).unwrap();
    let outcome = store.observed(&custom("Widget", "second"));
    assert_eq!(outcome, Outcome::Skipped(Stage::Commit));

    // The file was written, the branch did not move, and the index was
    // regenerated anyway.
    let on_disk = std::fs::read_to_string(dir.path().join("widget.v1.example.io.yaml")).unwrap();
    assert!(on_disk.contains("value: second"), "got {on_disk}");
    assert_eq!(store.history(None).unwrap()[0].id, tip);
    assert!(ref_index(dir.path()).starts_with(&tip.to_string()));
}

#[test]
fn removal_commit_failure_still_publishes_index() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = config_for(dir.path());
    let good = HistoryStore::open(&config).unwrap();
    let tip = good.observed(&custom("Widget", "1")).commit().unwrap();
    drop(good);

    let repo = FailingCommits(GixRepo::open_at(dir.path()).unwrap());
    let store = HistoryStore::with_repo(repo, &config).unwrap();

    std::fs::remove_file(dir.path().join(".git/info/refs")).unwrap();
    let outcome = store.removed(&custom("Widget", "1"));
    assert_eq!(outcome, Outcome::Skipped(Stage::Commit));

    assert!(!dir.path().join("widget.v1.example.io.yaml").exists());
    assert_eq!(store.history(None).unwrap()[0].id, tip);
    assert!(ref_index(dir.path()).starts_with(&tip.to_string()));
}

#[test]
fn store_keeps_working_after_commit_failure() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = config_for(dir.path());
    {
        let repo = FailingCommits(GixRepo::init(dir.path()).unwrap());
        let store = HistoryStore::with_repo(repo, &config).unwrap();
        assert_eq!(
            store.observed(&custom("Widget", "1")),
            Outcome::Skipped(Stage::Commit)
        );
    }
    let store = HistoryStore::open(&config).unwrap();
    // The earlier write is picked up by the next successful commit.
    assert!(matches!(
        store.observed(&custom("Gadget", "1")),
        Outcome::Committed(_)
    ));
    assert_eq!(messages(&store), ["gadget.v1.example.io.yaml added"]);
}

#[test]
fn malformed_objects_do_not_disturb_others() {
    let (dir, store) = setup_store();
    let _ = store.observed(&custom("Gadget", "1"));
    let published = ref_index(dir.path());
    let broken = [
        json!("just a string"),
        json!({"apiVersion": "v1"}),
        json!({"kind": "Widget"}),
        json!({"kind": "", "apiVersion": "v1"}),
        json!({"kind": "Widget", "apiVersion": "a/b/c"}),
        json!({"kind": 7, "apiVersion": "v1"}),
    ];
    for value in broken {
        assert_eq!(
            store.observed(&TrackedObject::new(value.clone())),
            Outcome::Skipped(Stage::Decode),
            "{value}"
        );
        assert_eq!(ref_index(dir.path()), published, "{value}");
    }
    assert!(matches!(
        store.observed(&custom("Widget", "1")),
        Outcome::Committed(_)
    ));
    assert_eq!(messages(&store).len(), 2);
}

#[test]
fn removing_absent_file_records_nothing() {
    let (dir, store) = setup_store();
    let _ = store.observed(&custom("Widget", "1"));
    let published = std::fs::read(dir.path().join(".git/info/refs")).unwrap();
    assert_eq!(
        store.removed(&custom("Gadget", "1")),
        Outcome::Skipped(Stage::Write)
    );
    assert_eq!(messages(&store).len(), 1);
    assert_eq!(
        std::fs::read(dir.path().join(".git/info/refs")).unwrap(),
        published
    );
}

fn break_info_dir(dir: &Path) {
    let info = dir.join(".git/info");
    std::fs::remove_dir_all(&info).unwrap();
    std::fs::write(&info, "not a directory").unwrap();
}

#[test]
fn open_fails_when_index_cannot_be_written() {
    let dir = tempfile::TempDir::new().unwrap();
    drop(GixRepo::init(dir.path()).unwrap());
    let _ = std::fs::create_dir_all(dir.path().join(".git/info"));
    break_info_dir(dir.path());

    let err = HistoryStore::open(&config_for(dir.path())).err().unwrap();
    assert!(matches!(err, config_history::error::OpenError::Index(_)), "got {err:?}");
}

#[test]
#[should_panic(expected = "reference index could not be published")]
fn index_failure_is_fatal() {
    let (dir, store) = setup_store();
    break_info_dir(dir.path());
    let _ = store.observed(&custom("Widget", "1"));
}

#[test]
fn store_refuses_events_after_fatal_failure() {
    let (dir, store) = setup_store();
    break_info_dir(dir.path());

    let store = std::sync::Arc::new(store);
    let first = {
        let store = std::sync::Arc::clone(&store);
        std::thread::spawn(move || {
            let _ = store.observed(&custom("Widget", "1"));
        })
        .join()
    };
    assert!(first.is_err());

    std::fs::remove_file(dir.path().join(".git/info")).unwrap();
    let second = std::thread::spawn(move || {
        let _ = store.observed(&custom("Widget", "2"));
    })
    .join();
    assert!(second.is_err(), "poisoned store accepted an event");
}
