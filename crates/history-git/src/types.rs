//! Core types for the history git layer.
//!
//! These types form the vocabulary shared between the [`GitRepo`](crate::GitRepo)
//! trait and the recorder crate. They contain no gix types; the backend is an
//! implementation detail.

use std::fmt;

// ---------------------------------------------------------------------------
// GitOid
// ---------------------------------------------------------------------------

/// SHA-1 object id. Formats as 40 lowercase hex digits.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GitOid([u8; 20]);

impl GitOid {
    /// Id of the tree with no entries. Every repository can resolve it,
    /// whether or not it was ever written.
    pub const EMPTY_TREE: Self = Self([
        0x4b, 0x82, 0x5d, 0xc6, 0x42, 0xcb, 0x6e, 0xb9, 0xa0, 0x60, 0xe5, 0x4b, 0xf8, 0xd6, 0x92,
        0x88, 0xfb, 0xee, 0x49, 0x04,
    ]);

    #[must_use]
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Abbreviated form used in log lines.
    #[must_use]
    pub fn short(&self) -> String {
        let mut hex = self.to_string();
        hex.truncate(7);
        hex
    }
}

impl fmt::Display for GitOid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.iter().try_for_each(|b| write!(f, "{b:02x}"))
    }
}

impl fmt::Debug for GitOid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GitOid({self})")
    }
}

// ---------------------------------------------------------------------------
// RefName
// ---------------------------------------------------------------------------

/// A full reference name: `HEAD` or anything under `refs/`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RefName(String);

impl RefName {
    /// # Errors
    /// Returns a [`RefNameError`] for short names such as `main`.
    pub fn new(name: &str) -> Result<Self, RefNameError> {
        let full = name == "HEAD" || name.strip_prefix("refs/").is_some_and(|rest| !rest.is_empty());
        if full {
            Ok(Self(name.to_owned()))
        } else {
            Err(RefNameError {
                value: name.to_owned(),
            })
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RefName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A name that is not a full reference name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefNameError {
    pub value: String,
}

impl fmt::Display for RefNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} is not a full reference name", self.value)
    }
}

impl std::error::Error for RefNameError {}

// ---------------------------------------------------------------------------
// References
// ---------------------------------------------------------------------------

/// What a reference points at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RefTarget {
    /// A direct reference holding an object id.
    Object(GitOid),
    /// A symbolic reference naming another ref (e.g. `HEAD -> refs/heads/main`).
    Symbolic(String),
}

/// A reference as stored in the repository, without peeling.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reference {
    /// Full reference name.
    pub name: String,
    /// Raw target.
    pub target: RefTarget,
}

impl Reference {
    /// The object id for direct references, `None` for symbolic ones.
    #[must_use]
    pub const fn direct_target(&self) -> Option<GitOid> {
        match self.target {
            RefTarget::Object(oid) => Some(oid),
            RefTarget::Symbolic(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tree types
// ---------------------------------------------------------------------------

/// The file mode of a tree or index entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntryMode {
    /// Regular file (`100644`).
    Blob,
    /// Executable file (`100755`).
    BlobExecutable,
    /// Subdirectory (`040000`).
    Tree,
    /// Symbolic link (`120000`).
    Link,
    /// Gitlink / submodule (`160000`).
    Commit,
}

/// A single entry in a git tree object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeEntry {
    /// File or directory name (just the basename, not a full path).
    pub name: String,
    /// The entry mode.
    pub mode: EntryMode,
    /// The OID of the blob, tree, or commit this entry points to.
    pub oid: GitOid,
}

// ---------------------------------------------------------------------------
// Commit types
// ---------------------------------------------------------------------------

/// A name/email pair used for commit attribution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
}

impl Signature {
    /// Create a signature from a name and an email.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

/// Everything needed to write a new commit object.
///
/// Both signatures are stamped with the current time when the object is
/// written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewCommit {
    /// Root tree of the commit.
    pub tree: GitOid,
    /// Parent commits (empty for a root commit).
    pub parents: Vec<GitOid>,
    /// The commit message, written verbatim.
    pub message: String,
    /// Who authored the change.
    pub author: Signature,
    /// Who recorded the change.
    pub committer: Signature,
}

/// Information about a commit object.
///
/// Returned by [`GitRepo::read_commit`](crate::GitRepo::read_commit).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitInfo {
    /// OID of the tree this commit points to.
    pub tree_oid: GitOid,
    /// OIDs of parent commits (empty for root commits).
    pub parents: Vec<GitOid>,
    /// The commit message.
    pub message: String,
    /// Author identity string (e.g., `"Alice <alice@example.com>"`).
    pub author: String,
    /// Committer identity string.
    pub committer: String,
    /// Committer time in seconds since the Unix epoch.
    pub time: i64,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
