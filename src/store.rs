//! Mutation sequencer.
//!
//! [`HistoryStore`] turns add/update/delete notifications into commits. Every
//! event runs the full pipeline under one exclusive lock:
//!
//! ```text
//! serialize ─▶ write work tree ─▶ stage + commit ─▶ publish info/refs
//! ```
//!
//! Decode and write failures end the event early. A commit failure is logged
//! and the reference index is still republished. A failure to publish the
//! index is fatal: the store panics, poisoning its lock, and every later
//! event panics too.

use std::sync::{Mutex, MutexGuard};

use history_git::{GitError, GitOid, GitRepo, GixRepo, Signature};
use tracing::instrument;

use crate::commit::CommitWriter;
use crate::config::HistoryConfig;
use crate::error::OpenError;
use crate::object::TrackedObject;
use crate::ref_index::RefIndexPublisher;
use crate::snapshot::SnapshotSerializer;
use crate::worktree::WorkTree;

/// Pipeline stage at which an event stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    /// The object could not be serialized or named.
    Decode,
    /// The work tree file could not be replaced or removed.
    Write,
    /// Staging or committing failed; the index was still republished.
    Commit,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Decode => "decode",
            Self::Write => "write",
            Self::Commit => "commit",
        })
    }
}

/// What one event did to the history.
#[must_use]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// A new commit was appended.
    Committed(GitOid),
    /// The staged tree matched `HEAD`; nothing was recorded.
    Unchanged,
    /// The event stopped at `Stage`.
    Skipped(Stage),
}

impl Outcome {
    /// The new commit, if one was made.
    #[must_use]
    pub const fn commit(self) -> Option<GitOid> {
        match self {
            Self::Committed(oid) => Some(oid),
            Self::Unchanged | Self::Skipped(_) => None,
        }
    }
}

/// Notification callbacks a watch dispatcher programs against.
///
/// Callbacks never report failure back to the dispatcher.
pub trait EventHandler {
    fn on_add(&self, obj: &TrackedObject);
    fn on_update(&self, old: &TrackedObject, new: &TrackedObject);
    fn on_delete(&self, obj: &TrackedObject);
}

/// One commit as shown by `config-history log`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryEntry {
    pub id: GitOid,
    pub message: String,
    pub author: String,
    pub committer: String,
    /// Commit time, seconds since the Unix epoch.
    pub time: i64,
}

struct State<R> {
    repo: R,
    tree: WorkTree,
}

enum Mutation<'a> {
    Added(&'a TrackedObject),
    Modified(&'a TrackedObject),
    Removed(&'a TrackedObject),
}

impl Mutation<'_> {
    const fn kind(&self) -> &'static str {
        match self {
            Self::Added(_) => "add",
            Self::Modified(_) => "update",
            Self::Removed(_) => "delete",
        }
    }
}

/// The change-history recorder.
///
/// `Sync` whenever `R` is `Send`; share it between dispatcher threads by
/// reference or through an `Arc`.
pub struct HistoryStore<R: GitRepo = GixRepo> {
    state: Mutex<State<R>>,
    serializer: SnapshotSerializer,
    writer: CommitWriter,
    component: String,
}

impl HistoryStore<GixRepo> {
    /// Open the repository at `config.repository.path`, initializing an empty
    /// one if none exists, and publish the reference index.
    ///
    /// # Errors
    /// Returns an [`OpenError`] if the repository cannot be opened or created,
    /// is bare, or the initial index cannot be written.
    pub fn open(config: &HistoryConfig) -> Result<Self, OpenError> {
        let path = &config.repository.path;
        let repository = |source| OpenError::Repository {
            path: path.clone(),
            source,
        };
        let mut repo = GixRepo::open_or_init(path).map_err(repository)?;
        // Reflog entries name the recorder, like the commits it authors.
        repo.set_committer(&config.identity.author())
            .map_err(repository)?;
        Self::with_repo(repo, config)
    }
}

impl<R: GitRepo> HistoryStore<R> {
    /// Build a store around an already opened repository.
    ///
    /// # Errors
    /// Returns an [`OpenError`] if the repository has no work tree or the
    /// initial index cannot be written.
    pub fn with_repo(repo: R, config: &HistoryConfig) -> Result<Self, OpenError> {
        let root = repo.workdir().ok_or(OpenError::NoWorkTree)?.to_path_buf();
        RefIndexPublisher.publish(&repo)?;
        tracing::info!(
            repo = %root.display(),
            naming = ?config.snapshot.naming,
            "history store ready"
        );
        Ok(Self {
            state: Mutex::new(State {
                repo,
                tree: WorkTree::new(root),
            }),
            serializer: SnapshotSerializer::new(config.snapshot.naming),
            writer: CommitWriter::new(config.identity.author(), &config.identity.email_domain),
            component: config.identity.component.clone(),
        })
    }

    /// The fixed author stamped on every commit.
    #[must_use]
    pub const fn author(&self) -> &Signature {
        self.writer.author()
    }

    /// The committer name used by [`observed`](Self::observed) and friends.
    #[must_use]
    pub fn component(&self) -> &str {
        &self.component
    }

    /// Record a newly observed object.
    pub fn observed(&self, obj: &TrackedObject) -> Outcome {
        self.observed_by(&self.component, obj)
    }

    /// Record an update. Only the new state matters.
    pub fn changed(&self, _old: &TrackedObject, new: &TrackedObject) -> Outcome {
        self.changed_by(&self.component, new)
    }

    /// Record a deletion.
    pub fn removed(&self, obj: &TrackedObject) -> Outcome {
        self.removed_by(&self.component, obj)
    }

    /// [`observed`](Self::observed) with an explicit acting component.
    pub fn observed_by(&self, component: &str, obj: &TrackedObject) -> Outcome {
        self.apply(component, Mutation::Added(obj))
    }

    /// [`changed`](Self::changed) with an explicit acting component.
    pub fn changed_by(&self, component: &str, new: &TrackedObject) -> Outcome {
        self.apply(component, Mutation::Modified(new))
    }

    /// [`removed`](Self::removed) with an explicit acting component.
    pub fn removed_by(&self, component: &str, obj: &TrackedObject) -> Outcome {
        self.apply(component, Mutation::Removed(obj))
    }

    /// Up to `limit` commits reachable from `HEAD` by first parents, newest
    /// first. An unborn branch has no history.
    ///
    /// # Errors
    /// Returns a [`GitError`] if the history cannot be walked.
    pub fn history(&self, limit: Option<usize>) -> Result<Vec<HistoryEntry>, GitError> {
        let state = self.lock();
        let Some(tip) = state.repo.head_commit()? else {
            return Ok(Vec::new());
        };
        state
            .repo
            .walk_history(tip, limit)?
            .into_iter()
            .map(|id| {
                let info = state.repo.read_commit(id)?;
                Ok(HistoryEntry {
                    id,
                    message: info.message,
                    author: info.author,
                    committer: info.committer,
                    time: info.time,
                })
            })
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, State<R>> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("history store is unusable after a fatal failure"),
        }
    }

    #[instrument(skip_all, fields(component = %component, event = mutation.kind()))]
    fn apply(&self, component: &str, mutation: Mutation<'_>) -> Outcome {
        let state = self.lock();
        let outcome = match mutation {
            Mutation::Added(obj) => self.record(&state, component, obj, "added"),
            Mutation::Modified(obj) => self.record(&state, component, obj, "modified"),
            Mutation::Removed(obj) => self.remove(&state, component, obj),
        };
        drop(state);
        outcome
    }

    fn record(&self, state: &State<R>, component: &str, obj: &TrackedObject, verb: &str) -> Outcome {
        let snapshot = match self.serializer.serialize(obj) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "could not serialize object");
                return Outcome::Skipped(Stage::Decode);
            }
        };
        let name = snapshot.file_name;
        if let Err(e) = state.tree.replace(&name, &snapshot.content) {
            tracing::warn!(file = %name, error = %e, "could not write snapshot");
            return Outcome::Skipped(Stage::Write);
        }
        let message = format!("{name} {verb}");
        self.commit_and_publish(state, &name, component, &message)
    }

    fn remove(&self, state: &State<R>, component: &str, obj: &TrackedObject) -> Outcome {
        let name = match self.serializer.file_name(obj) {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(error = %e, "could not derive snapshot name");
                return Outcome::Skipped(Stage::Decode);
            }
        };
        if let Err(e) = state.tree.remove(&name) {
            tracing::warn!(file = %name, error = %e, "could not remove snapshot");
            return Outcome::Skipped(Stage::Write);
        }
        let message = format!("{name:?} removed");
        self.commit_and_publish(state, &name, component, &message)
    }

    fn commit_and_publish(
        &self,
        state: &State<R>,
        name: &str,
        component: &str,
        message: &str,
    ) -> Outcome {
        let outcome = match self.writer.commit(&state.repo, name, component, message) {
            Ok(Some(oid)) => {
                tracing::info!(file = %name, commit = %oid.short(), "{message}");
                Outcome::Committed(oid)
            }
            Ok(None) => {
                tracing::info!(file = %name, "no change recorded");
                Outcome::Unchanged
            }
            Err(e) => {
                tracing::warn!(file = %name, error = %e, "could not commit snapshot");
                Outcome::Skipped(Stage::Commit)
            }
        };
        if let Err(e) = RefIndexPublisher.publish(&state.repo) {
            tracing::error!(error = %e, "reference index could not be published");
            panic!("reference index could not be published: {e}");
        }
        outcome
    }
}

impl<R: GitRepo> EventHandler for HistoryStore<R> {
    fn on_add(&self, obj: &TrackedObject) {
        let _ = self.observed(obj);
    }

    fn on_update(&self, old: &TrackedObject, new: &TrackedObject) {
        let _ = self.changed(old, new);
    }

    fn on_delete(&self, obj: &TrackedObject) {
        let _ = self.removed(obj);
    }
}
