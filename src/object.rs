//! Tracked objects and their type descriptors.
//!
//! A [`TrackedObject`] is an opaque JSON document in the Kubernetes
//! "unstructured" shape: a top-level `kind`, an `apiVersion` of the form
//! `group/version` (or bare `version` for the core group), and an optional
//! `metadata` block naming the instance. Only those fields are interpreted;
//! everything else is carried through to the snapshot untouched.

use std::fmt;

use serde::Deserialize;
use serde_json::Value;

use crate::error::DecodeError;

/// An object whose lifecycle notifications drive the history store.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct TrackedObject(Value);

impl TrackedObject {
    /// Wrap an already-parsed JSON document.
    #[must_use]
    pub const fn new(value: Value) -> Self {
        Self(value)
    }

    /// The full object state.
    #[must_use]
    pub const fn as_value(&self) -> &Value {
        &self.0
    }

    /// Derive the type descriptor from `kind` and `apiVersion`.
    ///
    /// # Errors
    /// Returns a [`DecodeError`] if the payload is not a JSON object, `kind`
    /// is missing or empty, or `apiVersion` is missing or malformed.
    pub fn type_descriptor(&self) -> Result<TypeDescriptor, DecodeError> {
        let Value::Object(fields) = &self.0 else {
            return Err(DecodeError::NotAnObject);
        };

        let kind = match fields.get("kind") {
            Some(Value::String(kind)) if !kind.is_empty() => kind.clone(),
            Some(Value::String(_)) | None => return Err(DecodeError::MissingKind),
            Some(_) => return Err(DecodeError::InvalidField { field: "kind" }),
        };

        let api_version = match fields.get("apiVersion") {
            Some(Value::String(v)) => v.as_str(),
            None => return Err(DecodeError::MissingApiVersion),
            Some(_) => return Err(DecodeError::InvalidField { field: "apiVersion" }),
        };
        let (group, version) = parse_api_version(api_version)?;

        Ok(TypeDescriptor {
            kind,
            version: version.to_owned(),
            group: group.to_owned(),
        })
    }

    /// The `metadata.namespace` / `metadata.name` pair, if the object names
    /// itself.
    #[must_use]
    pub fn instance(&self) -> Option<InstanceId> {
        let metadata = self.0.get("metadata")?;
        let name = metadata.get("name")?.as_str()?;
        if name.is_empty() {
            return None;
        }
        let namespace = metadata
            .get("namespace")
            .and_then(Value::as_str)
            .unwrap_or_default();
        Some(InstanceId {
            namespace: namespace.to_owned(),
            name: name.to_owned(),
        })
    }
}

impl From<Value> for TrackedObject {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Split `apiVersion` into `(group, version)`.
///
/// `"v1"` is the core group, `"apps/v1"` names a group. Anything with more
/// than one `/` or an empty version is rejected.
fn parse_api_version(api_version: &str) -> Result<(&str, &str), DecodeError> {
    let invalid = || DecodeError::InvalidApiVersion {
        value: api_version.to_owned(),
    };
    let (group, version) = match api_version.split_once('/') {
        None => ("", api_version),
        Some((_, rest)) if rest.contains('/') => return Err(invalid()),
        Some((group, version)) => (group, version),
    };
    if version.is_empty() {
        return Err(invalid());
    }
    Ok((group, version))
}

/// The type of a tracked object: kind, version, and API group.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeDescriptor {
    /// Object kind, e.g. `ConfigMap`.
    pub kind: String,
    /// API version, e.g. `v1`.
    pub version: String,
    /// API group; empty for the core group.
    pub group: String,
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            write!(f, "{}/{}", self.version, self.kind)
        } else {
            write!(f, "{}/{}/{}", self.group, self.version, self.kind)
        }
    }
}

/// Identity of one instance of a type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct InstanceId {
    /// Namespace; empty for cluster-scoped objects.
    pub namespace: String,
    /// Object name.
    pub name: String,
}
