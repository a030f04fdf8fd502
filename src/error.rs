//! Error types for the history store.
//!
//! Each pipeline stage has its own error type so the sequencer can apply a
//! different policy per stage:
//!
//! | Error          | Stage                    | Policy                              |
//! |----------------|--------------------------|-------------------------------------|
//! | [`DecodeError`] | snapshot serializer     | log, skip the rest of the event     |
//! | [`WriteError`]  | working tree writer     | log, skip the rest of the event     |
//! | [`CommitError`] | commit writer           | log, still publish the ref index    |
//! | [`IndexError`]  | reference index publisher | fatal                             |

use std::path::PathBuf;

use history_git::GitError;
use thiserror::Error;

/// The object could not be turned into a snapshot.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The payload is valid JSON but not an object.
    #[error("object payload is not a JSON object")]
    NotAnObject,

    /// The `kind` field is absent or empty.
    #[error("object has no kind")]
    MissingKind,

    /// The `apiVersion` field is absent.
    #[error("object has no apiVersion")]
    MissingApiVersion,

    /// The `apiVersion` field is not `version` or `group/version`.
    #[error("unexpected apiVersion {value:?}")]
    InvalidApiVersion {
        /// The rejected value.
        value: String,
    },

    /// A field the store interprets has the wrong JSON type.
    #[error("field `{field}` must be a string")]
    InvalidField {
        /// The offending field.
        field: &'static str,
    },

    /// Per-instance naming was requested but the object has no
    /// `metadata.name`.
    #[error("object has no metadata.name")]
    MissingName,

    /// YAML rendering failed.
    #[error("could not render YAML: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

/// A working tree file operation failed.
#[derive(Debug, Error)]
pub enum WriteError {
    /// The file to remove does not exist.
    #[error("{} does not exist", path.display())]
    NotFound {
        /// The missing file.
        path: PathBuf,
    },

    /// The name cannot be used as a snapshot file name.
    #[error("invalid snapshot file name {name:?}")]
    InvalidName {
        /// The rejected name.
        name: String,
    },

    /// Any other I/O failure.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// The file being written or removed.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },
}

impl WriteError {
    /// `true` for the "already absent" case callers may treat as benign.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Staging or commit creation failed.
#[derive(Debug, Error)]
pub enum CommitError {
    /// The repository has no work tree to stage from.
    #[error("repository has no work tree")]
    NoWorkTree,

    /// Reading the staged file from the work tree failed.
    #[error("could not read {} for staging: {source}", path.display())]
    Stage {
        /// The file being staged.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },

    /// The git backend rejected an operation.
    #[error(transparent)]
    Git(#[from] GitError),
}

/// The reference index could not be regenerated.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Enumerating references failed.
    #[error("could not list references: {0}")]
    ListRefs(#[source] GitError),

    /// Writing the index file failed.
    #[error("could not write {}: {source}", path.display())]
    Write {
        /// The index file path.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },
}

/// The store could not be opened.
#[derive(Debug, Error)]
pub enum OpenError {
    /// Opening or initializing the repository failed.
    #[error("could not open repository at {}: {source}", path.display())]
    Repository {
        /// The configured repository path.
        path: PathBuf,
        /// The underlying error.
        source: GitError,
    },

    /// The repository is bare; snapshots need a work tree.
    #[error("repository has no work tree")]
    NoWorkTree,

    /// The initial reference index could not be published.
    #[error(transparent)]
    Index(#[from] IndexError),
}
