//! The gix-backed implementation of [`GitRepo`].

use std::path::{Path, PathBuf};

use crate::error::GitError;
use crate::repo::GitRepo;
use crate::types::*;

/// A [`GitRepo`] implementation backed by [gix](https://github.com/GitoxideLabs/gitoxide).
///
/// Construct via [`GixRepo::open_at`], [`GixRepo::init`] or
/// [`GixRepo::open_or_init`].
pub struct GixRepo {
    pub(crate) repo: gix::Repository,
    pub(crate) workdir: Option<PathBuf>,
}

impl GixRepo {
    /// Open a git repository at exactly `path` (no parent discovery, no
    /// global or system configuration).
    ///
    /// Reflog entries are attributed to [`GixRepo::DEFAULT_COMMITTER`] until
    /// [`set_committer`](Self::set_committer) names someone else.
    pub fn open_at(path: &Path) -> Result<Self, GitError> {
        let repo =
            gix::open_opts(path, gix::open::Options::isolated()).map_err(GitError::backend)?;
        let workdir = repo.workdir().map(Path::to_path_buf);
        let mut this = Self { repo, workdir };
        let (name, email) = Self::DEFAULT_COMMITTER;
        this.set_committer(&Signature::new(name, email))?;
        Ok(this)
    }

    /// Name and email written into reflog entries when nothing else is set.
    pub const DEFAULT_COMMITTER: (&'static str, &'static str) =
        ("config-history", "config-history@localhost");

    /// Use `sig` as the committer of reflog entries. Isolated repositories
    /// read no user configuration, so without this ref updates that write a
    /// reflog fail.
    pub fn set_committer(&mut self, sig: &Signature) -> Result<(), GitError> {
        let mut config = self.repo.config_snapshot_mut();
        config
            .set_raw_value(&"committer.name", sig.name.as_str())
            .map_err(GitError::backend)?;
        config
            .set_raw_value(&"committer.email", sig.email.as_str())
            .map_err(GitError::backend)?;
        config.commit().map_err(GitError::backend)?;
        Ok(())
    }

    /// Initialize an empty repository with a work tree at `path`, creating
    /// the directory if needed.
    pub fn init(path: &Path) -> Result<Self, GitError> {
        gix::init(path).map_err(GitError::backend)?;
        Self::open_at(path)
    }

    /// Open the repository at `path`, initializing an empty one first if
    /// there is no `.git` directory there.
    pub fn open_or_init(path: &Path) -> Result<Self, GitError> {
        if path.join(".git").try_exists()? {
            Self::open_at(path)
        } else {
            tracing::info!(path = %path.display(), "initializing empty repository");
            Self::init(path)
        }
    }
}

/// Convert a `GitOid` to a `gix::ObjectId`.
pub(crate) fn to_gix_oid(oid: GitOid) -> gix::ObjectId {
    gix::ObjectId::from_bytes_or_panic(oid.as_bytes())
}

/// Convert a `gix::oid` to a `GitOid`, rejecting non-SHA-1 ids.
pub(crate) fn from_gix_oid(oid: &gix::oid) -> Result<GitOid, GitError> {
    let bytes: [u8; 20] = oid.as_bytes().try_into().map_err(|_| GitError::InvalidOid {
        value: oid.to_string(),
        reason: "only SHA-1 object ids are supported".to_owned(),
    })?;
    Ok(GitOid::from_bytes(bytes))
}

impl GitRepo for GixRepo {
    fn git_dir(&self) -> &Path {
        self.repo.git_dir()
    }

    fn workdir(&self) -> Option<&Path> {
        self.workdir.as_deref()
    }

    // === Refs ===
    fn head_ref(&self) -> Result<RefName, GitError> {
        crate::refs_impl::head_ref(self)
    }

    fn read_ref(&self, name: &RefName) -> Result<Option<GitOid>, GitError> {
        crate::refs_impl::read_ref(self, name)
    }

    fn update_ref(
        &self,
        name: &RefName,
        new: GitOid,
        expected_old: Option<GitOid>,
        log_message: &str,
    ) -> Result<(), GitError> {
        crate::refs_impl::update_ref(self, name, new, expected_old, log_message)
    }

    fn list_refs(&self) -> Result<Vec<Reference>, GitError> {
        crate::refs_impl::list_refs(self)
    }

    // === Rev-parse ===
    fn rev_parse_opt(&self, spec: &str) -> Result<Option<GitOid>, GitError> {
        crate::refs_impl::rev_parse_opt(self, spec)
    }

    // === Object read ===
    fn read_blob(&self, oid: GitOid) -> Result<Vec<u8>, GitError> {
        crate::objects_impl::read_blob(self, oid)
    }

    fn read_tree(&self, oid: GitOid) -> Result<Vec<TreeEntry>, GitError> {
        crate::objects_impl::read_tree(self, oid)
    }

    fn read_commit(&self, oid: GitOid) -> Result<CommitInfo, GitError> {
        crate::objects_impl::read_commit(self, oid)
    }

    // === Object write ===
    fn write_blob(&self, data: &[u8]) -> Result<GitOid, GitError> {
        crate::objects_impl::write_blob(self, data)
    }

    fn create_commit(&self, commit: &NewCommit) -> Result<GitOid, GitError> {
        crate::objects_impl::create_commit(self, commit)
    }

    // === Index ===
    fn stage_path(&self, path: &str, blob: Option<(EntryMode, GitOid)>) -> Result<(), GitError> {
        crate::index_impl::stage_path(self, path, blob)
    }

    fn write_index_tree(&self) -> Result<GitOid, GitError> {
        crate::index_impl::write_index_tree(self)
    }

    // === History ===
    fn walk_history(&self, tip: GitOid, limit: Option<usize>) -> Result<Vec<GitOid>, GitError> {
        crate::refs_impl::walk_history(self, tip, limit)
    }
}
