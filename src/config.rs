//! Recorder configuration (`config-history.toml`).
//!
//! Every field has a default, so a missing file or an empty one yields a
//! working configuration that records into `./history`.
//!
//! ```toml
//! [repository]
//! path = "/var/lib/config-history"
//!
//! [identity]
//! author_name = "config-history-operator"
//! author_email = "config-history-operator@openshift.io"
//! component = "operator"
//! email_domain = "openshift.io"
//!
//! [snapshot]
//! naming = "type"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use history_git::Signature;

use crate::snapshot::FileNaming;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level recorder configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HistoryConfig {
    /// Where the repository lives.
    #[serde(default)]
    pub repository: RepositoryConfig,

    /// Commit attribution.
    #[serde(default)]
    pub identity: IdentityConfig,

    /// Snapshot file layout.
    #[serde(default)]
    pub snapshot: SnapshotConfig,
}

// ---------------------------------------------------------------------------
// RepositoryConfig
// ---------------------------------------------------------------------------

/// Repository location.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepositoryConfig {
    /// Work tree root; `.git` is created beneath it if missing.
    #[serde(default = "default_path")]
    pub path: PathBuf,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
        }
    }
}

fn default_path() -> PathBuf {
    PathBuf::from("history")
}

// ---------------------------------------------------------------------------
// IdentityConfig
// ---------------------------------------------------------------------------

/// Who commits are attributed to.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdentityConfig {
    /// Author name on every commit (the recorder itself).
    #[serde(default = "default_author_name")]
    pub author_name: String,

    /// Author email on every commit.
    #[serde(default = "default_author_email")]
    pub author_email: String,

    /// Committer name used when an event does not name its own actor.
    #[serde(default = "default_component")]
    pub component: String,

    /// Domain appended to committer names to form their email.
    #[serde(default = "default_email_domain")]
    pub email_domain: String,
}

impl IdentityConfig {
    /// The fixed author signature.
    #[must_use]
    pub fn author(&self) -> Signature {
        Signature::new(self.author_name.clone(), self.author_email.clone())
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            author_name: default_author_name(),
            author_email: default_author_email(),
            component: default_component(),
            email_domain: default_email_domain(),
        }
    }
}

fn default_author_name() -> String {
    "config-history-operator".to_owned()
}

fn default_author_email() -> String {
    "config-history-operator@openshift.io".to_owned()
}

fn default_component() -> String {
    "operator".to_owned()
}

fn default_email_domain() -> String {
    "openshift.io".to_owned()
}

// ---------------------------------------------------------------------------
// SnapshotConfig
// ---------------------------------------------------------------------------

/// Snapshot file layout.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SnapshotConfig {
    /// `"type"` (one file per kind/version/group) or `"instance"`.
    #[serde(default)]
    pub naming: FileNaming,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// The config file could not be used.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{}: {message}", origin(.path.as_deref()))]
pub struct ConfigError {
    /// File being loaded; `None` when parsing a string.
    pub path: Option<PathBuf>,
    /// What went wrong, prefixed with `line N:` when the location is known.
    pub message: String,
}

fn origin(path: Option<&Path>) -> String {
    path.map_or_else(|| "config".to_owned(), |p| p.display().to_string())
}

impl HistoryConfig {
    /// Read `path`. A file that does not exist means "all defaults".
    ///
    /// # Errors
    /// Returns a [`ConfigError`] if the file exists but cannot be read or
    /// parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let at = |message: String| ConfigError {
            path: Some(path.to_owned()),
            message,
        };
        match std::fs::read_to_string(path) {
            Ok(text) => Self::parse(&text).map_err(|e| at(e.message)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(at(format!("unreadable: {e}"))),
        }
    }

    /// # Errors
    /// Returns a [`ConfigError`] for malformed TOML, unknown keys, or values
    /// of the wrong type.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| {
            let message = match e.span() {
                Some(span) => format!("line {}: {}", line_of(text, span.start), e.message()),
                None => e.message().to_owned(),
            };
            ConfigError {
                path: None,
                message,
            }
        })
    }
}

/// 1-based line number of a byte offset.
fn line_of(text: &str, offset: usize) -> usize {
    text.as_bytes()[..offset.min(text.len())]
        .iter()
        .filter(|&&b| b == b'\n')
        .count()
        + 1
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let cfg = HistoryConfig::default();
        assert_eq!(cfg.repository.path, PathBuf::from("history"));
        assert_eq!(cfg.identity.author_name, "config-history-operator");
        assert_eq!(
            cfg.identity.author_email,
            "config-history-operator@openshift.io"
        );
        assert_eq!(cfg.identity.component, "operator");
        assert_eq!(cfg.identity.email_domain, "openshift.io");
        assert_eq!(cfg.snapshot.naming, FileNaming::Type);
    }

    #[test]
    fn empty_file_is_default() {
        assert_eq!(HistoryConfig::parse("").unwrap(), HistoryConfig::default());
    }

    #[test]
    fn every_section_overridden() {
        let text = r#"
[repository]
path = "/var/lib/config-history"

[identity]
author_name = "recorder"
author_email = "recorder@example.com"
component = "kube-apiserver"
email_domain = "example.com"

[snapshot]
naming = "instance"
"#;
        let cfg = HistoryConfig::parse(text).unwrap();
        assert_eq!(
            cfg.repository.path,
            PathBuf::from("/var/lib/config-history")
        );
        assert_eq!(
            cfg.identity.author(),
            Signature::new("recorder", "recorder@example.com")
        );
        assert_eq!(cfg.identity.component, "kube-apiserver");
        assert_eq!(cfg.snapshot.naming, FileNaming::Instance);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let cfg = HistoryConfig::parse("[identity]\ncomponent = \"etcd\"\n").unwrap();
        assert_eq!(cfg.identity.component, "etcd");
        assert_eq!(cfg.identity.author_name, "config-history-operator");
        assert_eq!(cfg.repository, RepositoryConfig::default());
    }

    #[test]
    fn unknown_field_reports_line() {
        let err = HistoryConfig::parse("[repository]\npath = \"x\"\nbranch = \"main\"\n")
            .unwrap_err();
        assert!(err.message.contains("unknown field"), "got {}", err.message);
        assert!(err.message.starts_with("line "), "got {}", err.message);
    }

    #[test]
    fn unknown_naming_is_rejected() {
        assert!(HistoryConfig::parse("[snapshot]\nnaming = \"random\"\n").is_err());
    }

    #[test]
    fn load_missing_file_is_default() {
        let dir = tempfile::TempDir::new().unwrap();
        let cfg = HistoryConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg, HistoryConfig::default());
    }

    #[test]
    fn load_errors_name_the_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("broken.toml");
        std::fs::write(&file, "[repository\n").unwrap();
        let err = HistoryConfig::load(&file).unwrap_err();
        assert_eq!(err.path.as_deref(), Some(file.as_path()));
        assert!(err.to_string().starts_with(&file.display().to_string()));
        assert!(err.message.starts_with("line "), "got {}", err.message);
    }

    #[test]
    fn string_errors_have_generic_origin() {
        let err = HistoryConfig::parse("[identity]\ncomponent = 3\n").unwrap_err();
        assert!(err.to_string().starts_with("config: line "), "got {err}");
    }
}
