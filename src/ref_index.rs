//! Reference index publisher.
//!
//! Regenerates `.git/info/refs`, the file git's "dumb" HTTP transport reads
//! to discover what to fetch. With it in place the repository can be served
//! by any static file server.

use std::fmt::Write as _;
use std::path::PathBuf;

use history_git::GitRepo;

use crate::error::IndexError;

/// Location of the index relative to the git directory.
pub const INFO_REFS: &str = "info/refs";

/// Writes the flat reference index for passive readers.
#[derive(Clone, Copy, Debug, Default)]
pub struct RefIndexPublisher;

impl RefIndexPublisher {
    /// Path of the index file for `repo`.
    pub fn path<R: GitRepo + ?Sized>(repo: &R) -> PathBuf {
        repo.git_dir().join(INFO_REFS)
    }

    /// Rewrite the index from the current reference set.
    ///
    /// Only direct references are listed, one `"<hex>\t<name>\n"` line each,
    /// sorted by name. The file is replaced wholesale.
    ///
    /// # Errors
    /// Returns an [`IndexError`] if references cannot be listed or the file
    /// cannot be written.
    pub fn publish<R: GitRepo + ?Sized>(&self, repo: &R) -> Result<(), IndexError> {
        let refs = repo.list_refs().map_err(IndexError::ListRefs)?;

        let mut data = String::new();
        for (oid, name) in refs
            .iter()
            .filter_map(|r| r.direct_target().map(|oid| (oid, &r.name)))
        {
            let _ = writeln!(data, "{oid}\t{name}");
        }

        let path = Self::path(repo);
        let write = || -> std::io::Result<()> {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, &data)
        };
        write().map_err(|source| IndexError::Write {
            path: path.clone(),
            source,
        })?;
        tracing::trace!(path = %path.display(), refs = refs.len(), "reference index published");
        Ok(())
    }
}
