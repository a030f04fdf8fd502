//! gix-backed ref, rev-parse, and history operations.

use gix::refs::Target;
use gix::refs::transaction::PreviousValue;

use crate::error::GitError;
use crate::gix_repo::{GixRepo, from_gix_oid, to_gix_oid};
use crate::types::*;

pub fn head_ref(repo: &GixRepo) -> Result<RefName, GitError> {
    let name = repo
        .repo
        .head_name()
        .map_err(GitError::backend)?
        .ok_or_else(|| GitError::NotFound {
            message: "HEAD is detached, no branch to advance".to_owned(),
        })?;
    RefName::new(&name.as_bstr().to_string()).map_err(GitError::backend)
}

pub fn read_ref(repo: &GixRepo, name: &RefName) -> Result<Option<GitOid>, GitError> {
    match repo.repo.try_find_reference(name.as_str()) {
        Ok(Some(mut r)) => {
            let id = r.peel_to_id_in_place().map_err(GitError::backend)?;
            Ok(Some(from_gix_oid(id.as_ref())?))
        }
        Ok(None) => Ok(None),
        Err(e) => Err(GitError::backend(e)),
    }
}

pub fn update_ref(
    repo: &GixRepo,
    name: &RefName,
    new: GitOid,
    expected_old: Option<GitOid>,
    log_message: &str,
) -> Result<(), GitError> {
    let constraint = match expected_old {
        None => PreviousValue::MustNotExist,
        Some(old) => PreviousValue::MustExistAndMatch(Target::Object(to_gix_oid(old))),
    };
    if let Err(e) = repo
        .repo
        .reference(name.as_str(), to_gix_oid(new), constraint, log_message)
    {
        // gix reports CAS failures through several error shapes; compare the
        // live value instead of parsing messages.
        let current = read_ref(repo, name)?;
        if current != expected_old {
            return Err(GitError::RefConflict {
                ref_name: name.to_string(),
                message: format!(
                    "expected {}, found {}",
                    describe(expected_old),
                    describe(current)
                ),
            });
        }
        return Err(GitError::backend(e));
    }
    Ok(())
}

fn describe(oid: Option<GitOid>) -> String {
    oid.map_or_else(|| "no ref".to_owned(), |oid| oid.to_string())
}

pub fn list_refs(repo: &GixRepo) -> Result<Vec<Reference>, GitError> {
    let platform = repo.repo.references().map_err(GitError::backend)?;
    let refs_iter = platform.all().map_err(GitError::backend)?;

    let mut result = Vec::new();
    for r in refs_iter {
        let r = r.map_err(GitError::backend)?;
        let target = match &r.inner.target {
            Target::Object(id) => RefTarget::Object(from_gix_oid(id)?),
            Target::Symbolic(name) => RefTarget::Symbolic(name.as_bstr().to_string()),
        };
        result.push(Reference {
            name: r.name().as_bstr().to_string(),
            target,
        });
    }
    result.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(result)
}

pub fn rev_parse_opt(repo: &GixRepo, spec: &str) -> Result<Option<GitOid>, GitError> {
    // Resolution failures (malformed spec, missing ref, unborn HEAD) all
    // mean "could not be resolved".
    match repo.repo.rev_parse_single(spec) {
        Ok(id) => Ok(Some(from_gix_oid(id.as_ref())?)),
        Err(_) => Ok(None),
    }
}

pub fn walk_history(
    repo: &GixRepo,
    tip: GitOid,
    limit: Option<usize>,
) -> Result<Vec<GitOid>, GitError> {
    let walk = repo
        .repo
        .rev_walk([to_gix_oid(tip)])
        .first_parent_only()
        .all()
        .map_err(GitError::backend)?;

    let mut result = Vec::new();
    for info in walk.take(limit.unwrap_or(usize::MAX)) {
        let info = info.map_err(GitError::backend)?;
        result.push(from_gix_oid(&info.id)?);
    }
    Ok(result)
}
