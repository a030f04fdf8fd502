//! Working tree writer.
//!
//! Snapshot files live flat in the repository's work tree. `replace` sets a
//! file's contents atomically: the new bytes go to a temporary file in the
//! same directory which is then renamed over the target, so readers never
//! see a torn or partially truncated snapshot and no bytes of a longer
//! previous version survive. A replaced file keeps its permissions; new
//! files get the usual `0644`.

use std::io::Write as _;
use std::path::PathBuf;

use crate::error::WriteError;

#[cfg(unix)]
const NEW_FILE_MODE: u32 = 0o644;

/// Replaces or removes snapshot files under a work tree root.
#[derive(Clone, Debug)]
pub struct WorkTree {
    root: PathBuf,
}

impl WorkTree {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Absolute path of a snapshot file.
    #[must_use]
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Make `name` hold exactly `content`, creating it if needed.
    ///
    /// # Errors
    /// [`WriteError::InvalidName`] for names that are not a plain file name,
    /// [`WriteError::Io`] if the temporary file cannot be written or renamed.
    pub fn replace(&self, name: &str, content: &[u8]) -> Result<(), WriteError> {
        validate_name(name)?;
        let path = self.path_of(name);
        let io_err = |source| WriteError::Io {
            path: path.clone(),
            source,
        };

        let mut tmp = tempfile::NamedTempFile::new_in(&self.root).map_err(io_err)?;
        tmp.write_all(content).map_err(io_err)?;
        // Temp files are created owner-only.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt as _;
            let mode = match std::fs::metadata(&path) {
                Ok(meta) => meta.permissions().mode() & 0o7777,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => NEW_FILE_MODE,
                Err(source) => return Err(io_err(source)),
            };
            tmp.as_file()
                .set_permissions(std::fs::Permissions::from_mode(mode))
                .map_err(io_err)?;
        }
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&path).map_err(|e| io_err(e.error))?;
        Ok(())
    }

    /// Delete `name`.
    ///
    /// # Errors
    /// [`WriteError::NotFound`] if the file is already absent, which callers
    /// may tolerate; [`WriteError::Io`] for every other failure.
    pub fn remove(&self, name: &str) -> Result<(), WriteError> {
        validate_name(name)?;
        let path = self.path_of(name);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(WriteError::NotFound { path }),
            Err(source) => Err(WriteError::Io { path, source }),
        }
    }
}

/// Snapshot names are single path components and never touch `.git`.
fn validate_name(name: &str) -> Result<(), WriteError> {
    let plain = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.eq_ignore_ascii_case(".git")
        && !name.contains(['/', '\\', '\0']);
    if plain {
        Ok(())
    } else {
        Err(WriteError::InvalidName {
            name: name.to_owned(),
        })
    }
}
