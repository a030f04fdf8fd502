//! Git abstraction layer for config-history.
//!
//! This crate defines the [`GitRepo`] trait, the single interface through
//! which the recorder interacts with git. Nothing else in the workspace
//! imports gix directly.
//!
//! # Crate layout
//!
//! - [`repo`]: the [`GitRepo`] trait definition.
//! - [`types`]: value types used in trait signatures ([`GitOid`], [`RefName`],
//!   [`Reference`], [`NewCommit`], etc.).
//! - [`error`]: the [`GitError`] enum returned by all trait methods.

pub mod error;
pub mod repo;
pub mod types;

// gix-backed implementation modules
mod gix_repo;
mod index_impl;
mod objects_impl;
mod refs_impl;

pub use gix_repo::GixRepo;

pub use error::GitError;
pub use repo::GitRepo;
pub use types::{
    CommitInfo, EntryMode, GitOid, NewCommit, RefName, RefNameError, RefTarget, Reference,
    Signature, TreeEntry,
};
