//! Index (staging area) operations for [`GixRepo`].
//!
//! Entries are edited in place on the gix index state, so paths the recorder
//! never wrote (including non UTF-8 names) pass through untouched.

use gix::bstr::BStr;

use crate::error::GitError;
use crate::gix_repo::{GixRepo, from_gix_oid, to_gix_oid};
use crate::types::*;

fn open_or_empty(repo: &GixRepo) -> Result<gix::index::File, GitError> {
    let path = repo.repo.index_path();
    // A freshly initialized repository has no index file until the first
    // write.
    if !path.try_exists()? {
        let state = gix::index::State::new(repo.repo.object_hash());
        return Ok(gix::index::File::from_state(state, path));
    }
    repo.repo.open_index().map_err(|e| GitError::BackendError {
        message: format!("failed to open index: {e}"),
    })
}

pub fn stage_path(
    repo: &GixRepo,
    path: &str,
    blob: Option<(EntryMode, GitOid)>,
) -> Result<(), GitError> {
    let mut index = open_or_empty(repo)?;
    let target: &BStr = path.into();

    index.remove_entries(|_, entry_path, _| entry_path == target);
    if let Some((mode, oid)) = blob {
        // Zeroed stat data only makes status fall back to content hashing.
        index.dangerously_push_entry(
            gix::index::entry::Stat::default(),
            to_gix_oid(oid),
            gix::index::entry::Flags::empty(),
            entry_mode_to_gix_mode(mode),
            target,
        );
        index.sort_entries();
    }
    // The cached tree no longer matches the entries.
    index.remove_tree();

    index
        .write(Default::default())
        .map_err(|e| GitError::BackendError {
            message: format!("failed to write index: {e}"),
        })?;
    tracing::trace!(path, staged = blob.is_some(), "index entry updated");
    Ok(())
}

/// Build the tree described by the index, equivalent to `git write-tree`.
pub fn write_index_tree(repo: &GixRepo) -> Result<GitOid, GitError> {
    let index = open_or_empty(repo)?;
    // find_tree resolves the empty tree even if it was never written.
    let empty = repo
        .repo
        .find_tree(to_gix_oid(GitOid::EMPTY_TREE))
        .map_err(GitError::backend)?;
    let mut editor = empty.edit().map_err(|e| GitError::BackendError {
        message: format!("failed to create tree editor: {e}"),
    })?;

    for entry in index.entries() {
        let path = entry.path(&index);
        let kind = entry
            .mode
            .to_tree_entry_mode()
            .ok_or_else(|| GitError::BackendError {
                message: format!("index entry '{path}' has unsupported mode {:o}", entry.mode.bits()),
            })?
            .kind();
        editor
            .upsert(path, kind, entry.id)
            .map_err(|e| GitError::BackendError {
                message: format!("tree edit upsert '{path}': {e}"),
            })?;
    }

    let id = editor.write().map_err(|e| GitError::BackendError {
        message: format!("failed to write index tree: {e}"),
    })?;
    from_gix_oid(id.as_ref())
}

const fn entry_mode_to_gix_mode(mode: EntryMode) -> gix::index::entry::Mode {
    match mode {
        EntryMode::Blob => gix::index::entry::Mode::FILE,
        EntryMode::BlobExecutable => gix::index::entry::Mode::FILE_EXECUTABLE,
        EntryMode::Link => gix::index::entry::Mode::SYMLINK,
        EntryMode::Tree => gix::index::entry::Mode::DIR,
        EntryMode::Commit => gix::index::entry::Mode::COMMIT,
    }
}
