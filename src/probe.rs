//! # Repository State Probe
//!
//! Read-only questions about repository state: branch existence,
//! commit-subject reachability, pending-change detection, and the staged
//! mode of the CI submodule. The pipeline's re-entrancy guards are built
//! entirely from these probes, so nothing here may mutate the repository.

use std::path::Path;

use git2::{BranchType, Commit, Repository, StatusOptions, StatusShow};
use log::debug;

use crate::error::{Error, Result};

/// Index mode of a submodule (gitlink) entry.
pub const GITLINK_MODE: u32 = 0o160000;

/// Which changes count as pending for a commit decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingScope {
    /// Only changes already staged in the index.
    Staged,
    /// Staged changes plus worktree modifications and untracked files.
    WorktreeAndStaged,
}

/// Working-tree root of a repository.
///
/// # Errors
///
/// Returns `Error::RepositoryNotFound` for bare repositories, which have no
/// working tree to operate on.
pub fn workdir(repo: &Repository) -> Result<&Path> {
    repo.workdir().ok_or_else(|| Error::RepositoryNotFound {
        path: repo.path().display().to_string(),
    })
}

/// Whether a local branch with the given name exists.
pub fn branch_exists(repo: &Repository, name: &str) -> bool {
    repo.find_branch(name, BranchType::Local).is_ok()
}

/// Whether a commit whose subject equals `subject` is reachable from
/// `reference`.
///
/// The subject is the first line of the commit message, whitespace-trimmed,
/// compared for exact equality. A missing or unborn reference yields false:
/// on a fresh repository every guard built on this probe reports "not done
/// yet".
pub fn has_commit_with_subject(repo: &Repository, reference: &str, subject: &str) -> bool {
    let Ok(object) = repo.revparse_single(reference) else {
        debug!("reference '{}' not found", reference);
        return false;
    };
    let Ok(mut walk) = repo.revwalk() else {
        return false;
    };
    if walk.push(object.id()).is_err() {
        return false;
    }

    for oid in walk.filter_map(|o| o.ok()) {
        let Ok(commit) = repo.find_commit(oid) else {
            continue;
        };
        if commit_subject(&commit) == Some(subject) {
            debug!("commit {} carries subject '{}'", oid, subject);
            return true;
        }
    }
    false
}

/// First message line of a commit, whitespace-trimmed.
fn commit_subject<'a>(commit: &'a Commit) -> Option<&'a str> {
    commit.message().and_then(|m| m.lines().next()).map(str::trim)
}

/// Whether the repository has pending changes in the given scope.
///
/// Ignored files never count; untracked files count only in
/// [`PendingScope::WorktreeAndStaged`].
pub fn has_pending_changes(repo: &Repository, scope: PendingScope) -> Result<bool> {
    let mut options = StatusOptions::new();
    match scope {
        PendingScope::Staged => {
            options.show(StatusShow::Index);
        }
        PendingScope::WorktreeAndStaged => {
            options.include_untracked(true).recurse_untracked_dirs(true);
        }
    }
    let statuses = repo.statuses(Some(&mut options))?;
    Ok(!statuses.is_empty())
}

/// Whether the index entry at `path` is staged as a gitlink.
pub fn is_staged_as_gitlink(repo: &Repository, path: &Path) -> Result<bool> {
    Ok(staged_mode(repo, path)? == GITLINK_MODE)
}

/// Assert that `path` is staged as a gitlink, the mode a healthy submodule
/// entry carries.
///
/// # Errors
///
/// Returns `Error::SubmoduleIntegrity` with the mode actually found (0 when
/// the path is absent from the index). Callers treat this as a hard abort:
/// committing a mis-staged submodule would bake its files into history.
pub fn assert_staged_gitlink(repo: &Repository, path: &Path) -> Result<()> {
    let mode = staged_mode(repo, path)?;
    if mode == GITLINK_MODE {
        Ok(())
    } else {
        Err(Error::SubmoduleIntegrity {
            path: path.display().to_string(),
            mode,
        })
    }
}

/// Index mode of the entry at `path`, or 0 when absent.
fn staged_mode(repo: &Repository, path: &Path) -> Result<u32> {
    let index = repo.index()?;
    Ok(index.get_path(path, 0).map(|entry| entry.mode).unwrap_or(0))
}
