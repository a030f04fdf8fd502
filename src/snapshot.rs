//! Snapshot serializer: tracked object → (file name, YAML bytes).

use serde::Deserialize;

use crate::error::DecodeError;
use crate::object::{TrackedObject, TypeDescriptor};

/// How snapshot file names are derived.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileNaming {
    /// One file per type: `{kind}.{version}.{group}.yaml`. Instances of the
    /// same type share the file.
    #[default]
    Type,
    /// One file per instance:
    /// `{kind}.{version}.{group}.{namespace}.{name}.yaml`.
    Instance,
}

/// The rendered state of one object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    /// Work tree file name.
    pub file_name: String,
    /// Full YAML rendering of the object.
    pub content: Vec<u8>,
}

/// Turns tracked objects into snapshot files.
#[derive(Clone, Copy, Debug, Default)]
pub struct SnapshotSerializer {
    naming: FileNaming,
}

impl SnapshotSerializer {
    #[must_use]
    pub const fn new(naming: FileNaming) -> Self {
        Self { naming }
    }

    /// Derive only the file name (the delete path discards content).
    ///
    /// # Errors
    /// Returns a [`DecodeError`] if the type descriptor cannot be read, or
    /// per-instance naming is in effect and the object has no name.
    pub fn file_name(&self, obj: &TrackedObject) -> Result<String, DecodeError> {
        let td = obj.type_descriptor()?;
        match self.naming {
            FileNaming::Type => Ok(type_file_name(&td)),
            FileNaming::Instance => {
                let id = obj.instance().ok_or(DecodeError::MissingName)?;
                Ok(format!(
                    "{}.{}.{}.{}.{}.yaml",
                    td.kind, td.version, td.group, id.namespace, id.name
                )
                .to_lowercase())
            }
        }
    }

    /// Render the object's entire current state.
    ///
    /// Mapping keys come out sorted, so equal states always produce equal
    /// bytes and a re-delivered object is a no-op at the commit level.
    ///
    /// # Errors
    /// Returns a [`DecodeError`] if the name cannot be derived or YAML
    /// rendering fails.
    pub fn serialize(&self, obj: &TrackedObject) -> Result<Snapshot, DecodeError> {
        let file_name = self.file_name(obj)?;
        let content = serde_yaml_ng::to_string(obj.as_value())?.into_bytes();
        Ok(Snapshot { file_name, content })
    }
}

/// Lowercase `{kind}.{version}.{group}.yaml`.
#[must_use]
pub fn type_file_name(td: &TypeDescriptor) -> String {
    format!("{}.{}.{}.yaml", td.kind, td.version, td.group).to_lowercase()
}
