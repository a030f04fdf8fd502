//! Commit writer: stage one snapshot path and commit it if the tree changed.
//!
//! Every commit carries two identities. The author is always the recorder
//! itself; the committer is the component that triggered the event, so
//! `git log --format='%an %cn'` tells "who recorded" apart from "who acted".

use history_git::{EntryMode, GitOid, GitRepo, NewCommit, Signature};

use crate::error::CommitError;

/// Creates commits with a fixed author and a per-event committer.
#[derive(Clone, Debug)]
pub struct CommitWriter {
    author: Signature,
    email_domain: String,
}

impl CommitWriter {
    /// `author` is stamped on every commit; committers get
    /// `<component>@<email_domain>` as their address.
    pub fn new(author: Signature, email_domain: impl Into<String>) -> Self {
        Self {
            author,
            email_domain: email_domain.into(),
        }
    }

    /// The fixed system identity.
    #[must_use]
    pub const fn author(&self) -> &Signature {
        &self.author
    }

    /// The committer signature for an acting component.
    #[must_use]
    pub fn committer(&self, component: &str) -> Signature {
        Signature::new(component, format!("{component}@{}", self.email_domain))
    }

    /// Stage `name` and commit the index if it differs from `HEAD`.
    ///
    /// Returns `Ok(None)` when nothing changed, so re-delivering an identical
    /// object never grows the history.
    ///
    /// # Errors
    /// Returns a [`CommitError`] if staging, tree construction, commit
    /// creation, or the branch update fails.
    pub fn commit<R: GitRepo + ?Sized>(
        &self,
        repo: &R,
        name: &str,
        component: &str,
        message: &str,
    ) -> Result<Option<GitOid>, CommitError> {
        stage(repo, name)?;

        let parent = repo.head_commit()?;
        let parent_tree = match parent {
            Some(oid) => repo.read_commit(oid)?.tree_oid,
            None => GitOid::EMPTY_TREE,
        };
        let tree = repo.write_index_tree()?;
        if tree == parent_tree {
            tracing::debug!(file = name, "work tree clean, skipping commit");
            return Ok(None);
        }

        let oid = repo.create_commit(&NewCommit {
            tree,
            parents: parent.into_iter().collect(),
            message: message.to_owned(),
            author: self.author.clone(),
            committer: self.committer(component),
        })?;
        let branch = repo.head_ref()?;
        repo.update_ref(&branch, oid, parent, &format!("commit: {message}"))?;
        tracing::debug!(file = name, commit = %oid, branch = %branch, "committed");
        Ok(Some(oid))
    }
}

/// Bring the index entry for `name` in line with the work tree: add or
/// update it if the file exists, drop it if it does not. Other entries are
/// not touched.
fn stage<R: GitRepo + ?Sized>(repo: &R, name: &str) -> Result<(), CommitError> {
    let workdir = repo.workdir().ok_or(CommitError::NoWorkTree)?;
    let path = workdir.join(name);

    let blob = match std::fs::read(&path) {
        Ok(content) => Some((EntryMode::Blob, repo.write_blob(&content)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(source) => return Err(CommitError::Stage { path, source }),
    };
    repo.stage_path(name, blob)?;
    Ok(())
}
