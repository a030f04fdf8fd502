//! The [`GitRepo`] trait, the single boundary between the recorder and git.
//!
//! The recorder only needs a narrow slice of git:
//!
//! | Group        | Methods                                              |
//! |--------------|------------------------------------------------------|
//! | Layout       | `git_dir`, `workdir`                                 |
//! | Refs         | `head_ref`, `read_ref`, `update_ref`, `list_refs`    |
//! | Rev-parse    | `rev_parse_opt`                                      |
//! | Object read  | `read_blob`, `read_tree`, `read_commit`              |
//! | Object write | `write_blob`, `create_commit`                        |
//! | Index        | `stage_path`, `write_index_tree`                     |
//! | History      | `walk_history`                                       |

use std::path::Path;

use crate::error::GitError;
use crate::types::{CommitInfo, EntryMode, GitOid, NewCommit, RefName, Reference, TreeEntry};

/// The git abstraction used by the recorder.
///
/// Implementations may be backed by gix (the only production backend) or by
/// a test double wrapping it.
pub trait GitRepo {
    // -----------------------------------------------------------------------
    // Layout
    // -----------------------------------------------------------------------

    /// Path of the repository metadata directory (usually `<workdir>/.git`).
    fn git_dir(&self) -> &Path;

    /// Root of the work tree, `None` for bare repositories.
    fn workdir(&self) -> Option<&Path>;

    // -----------------------------------------------------------------------
    // Refs
    // -----------------------------------------------------------------------

    /// The branch `HEAD` points to, even when that branch has no commits yet.
    ///
    /// Returns [`GitError::NotFound`] if `HEAD` is detached.
    fn head_ref(&self) -> Result<RefName, GitError>;

    /// Resolve a ref to its OID, returning `None` if the ref does not exist.
    fn read_ref(&self, name: &RefName) -> Result<Option<GitOid>, GitError>;

    /// Point `name` at `new`.
    ///
    /// `expected_old` gives compare-and-swap semantics: `None` requires that the
    /// ref does not exist yet, `Some(oid)` requires it to currently hold `oid`.
    /// A mismatch yields [`GitError::RefConflict`].
    fn update_ref(
        &self,
        name: &RefName,
        new: GitOid,
        expected_old: Option<GitOid>,
        log_message: &str,
    ) -> Result<(), GitError>;

    /// Every reference in the repository with its raw (unpeeled) target,
    /// sorted by name.
    fn list_refs(&self) -> Result<Vec<Reference>, GitError>;

    // -----------------------------------------------------------------------
    // Rev-parse
    // -----------------------------------------------------------------------

    /// Resolve a revision spec, returning `None` if it cannot be resolved
    /// (including an unborn `HEAD`).
    fn rev_parse_opt(&self, spec: &str) -> Result<Option<GitOid>, GitError>;

    // -----------------------------------------------------------------------
    // Object read
    // -----------------------------------------------------------------------

    /// Read the contents of a blob object. Together with
    /// [`read_tree`](Self::read_tree) this lets callers audit what a
    /// recorded commit contains.
    fn read_blob(&self, oid: GitOid) -> Result<Vec<u8>, GitError>;

    /// Read the entries of a tree object (one level deep).
    fn read_tree(&self, oid: GitOid) -> Result<Vec<TreeEntry>, GitError>;

    /// Read a commit object's metadata.
    fn read_commit(&self, oid: GitOid) -> Result<CommitInfo, GitError>;

    // -----------------------------------------------------------------------
    // Object write
    // -----------------------------------------------------------------------

    /// Write a blob to the object store and return its OID.
    fn write_blob(&self, data: &[u8]) -> Result<GitOid, GitError>;

    /// Write a commit object. No ref is touched; pair with
    /// [`update_ref`](Self::update_ref).
    fn create_commit(&self, commit: &NewCommit) -> Result<GitOid, GitError>;

    // -----------------------------------------------------------------------
    // Index
    // -----------------------------------------------------------------------

    /// Point the index entry for `path` at `blob`, or drop it when `blob` is
    /// `None`. Every other entry is left exactly as it was, whatever its name
    /// or mode.
    fn stage_path(&self, path: &str, blob: Option<(EntryMode, GitOid)>) -> Result<(), GitError>;

    /// Write the tree described by the current index and return its OID.
    fn write_index_tree(&self) -> Result<GitOid, GitError>;

    // -----------------------------------------------------------------------
    // History
    // -----------------------------------------------------------------------

    /// Commits reachable from `tip` following first parents, newest first.
    fn walk_history(&self, tip: GitOid, limit: Option<usize>) -> Result<Vec<GitOid>, GitError>;

    /// The commit `HEAD` resolves to, `None` while the branch is unborn.
    fn head_commit(&self) -> Result<Option<GitOid>, GitError> {
        self.rev_parse_opt("HEAD")
    }
}
