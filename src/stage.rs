//! # Stage-and-Commit Engine
//!
//! Turns working-tree state into index state and index state into commits.
//!
//! Every staging pass starts with the same worktree sweep: paths deleted
//! from the worktree are removed from the index first, then new and
//! modified paths are added, with ignore rules honored and no path handed
//! to both operations. Call sites extend the sweep with a [`StagePlan`]
//! naming force-staged paths, asset files, directories, and whether the CI
//! submodule is staged as a gitlink.
//!
//! Commits are gated: [`commit_if_pending`] writes a commit only when the
//! probe reports pending changes, which is what makes a re-run of the whole
//! pipeline produce no new history.

use std::fs;
use std::path::{Path, PathBuf};

use git2::{Commit, Index, IndexAddOption, Oid, Repository, Status, StatusOptions};
use log::{debug, info, warn};

use crate::defaults;
use crate::error::Result;
use crate::probe::{self, PendingScope};

/// Extra staging work a pipeline step wants on top of the worktree sweep.
#[derive(Debug, Default, Clone)]
pub struct StagePlan {
    /// Paths staged directly, bypassing ignore rules. Missing paths are
    /// skipped.
    pub force_paths: Vec<PathBuf>,
    /// Plain files staged when present, ignore rules respected.
    pub files: Vec<PathBuf>,
    /// Directories staged recursively, ignore rules respected.
    pub dirs: Vec<PathBuf>,
    /// Stage the CI submodule path as a gitlink.
    pub submodule: bool,
}

/// Paths a staging pass touched, for reporting.
#[derive(Debug, Default)]
pub struct StagedSet {
    pub added: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
}

impl StagedSet {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    fn normalize(&mut self) {
        self.added.sort();
        self.added.dedup();
        self.removed.sort();
        self.removed.dedup();
    }
}

/// Stage the worktree sweep plus the plan's extras, then write the index.
///
/// The sweep never touches the submodule path or anything under it; the
/// submodule enters the index only through `plan.submodule`, so a commit
/// can never move the submodule pointer as a side effect of unrelated
/// staging.
pub fn stage_step(repo: &Repository, plan: &StagePlan) -> Result<StagedSet> {
    let root = probe::workdir(repo)?;
    let mut index = repo.index()?;
    let mut staged = StagedSet::default();

    sweep_worktree(repo, &mut index, &mut staged)?;

    for path in &plan.force_paths {
        if root.join(path).exists() {
            index.add_path(path)?;
            staged.added.push(path.clone());
        }
    }
    for path in &plan.files {
        if root.join(path).is_file() {
            add_all_tracked(&mut index, path, &mut staged)?;
        }
    }
    for dir in &plan.dirs {
        if root.join(dir).is_dir() {
            add_all_tracked(&mut index, dir, &mut staged)?;
        }
    }
    if plan.submodule {
        stage_submodule(root, &mut index, &mut staged)?;
    }

    index.write()?;
    staged.normalize();
    info!(
        "staged {} addition(s), {} removal(s)",
        staged.added.len(),
        staged.removed.len()
    );
    Ok(staged)
}

/// Mirror the worktree into the index: deletions first, then additions.
fn sweep_worktree(repo: &Repository, index: &mut Index, staged: &mut StagedSet) -> Result<()> {
    let mut options = StatusOptions::new();
    options.include_untracked(true).recurse_untracked_dirs(true);
    let statuses = repo.statuses(Some(&mut options))?;

    let mut to_remove = Vec::new();
    let mut to_add = Vec::new();
    for entry in statuses.iter() {
        let Some(path) = entry.path() else {
            debug!("skipping non-UTF-8 path in status list");
            continue;
        };
        if is_submodule_path(path) {
            continue;
        }
        let status = entry.status();
        if status.contains(Status::WT_DELETED) {
            to_remove.push(PathBuf::from(path));
        } else if status.intersects(
            Status::WT_NEW | Status::WT_MODIFIED | Status::WT_TYPECHANGE | Status::WT_RENAMED,
        ) {
            to_add.push(PathBuf::from(path));
        }
    }

    for path in to_remove {
        debug!("staging deletion: {}", path.display());
        index.remove_path(&path)?;
        staged.removed.push(path);
    }
    for path in to_add {
        debug!("staging: {}", path.display());
        index.add_path(&path)?;
        staged.added.push(path);
    }
    Ok(())
}

fn is_submodule_path(path: &str) -> bool {
    path == defaults::SUBMODULE_DIR
        || path
            .strip_prefix(defaults::SUBMODULE_DIR)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Stage a pathspec like `git add` would, recording matched paths.
fn add_all_tracked(index: &mut Index, pathspec: &Path, staged: &mut StagedSet) -> Result<()> {
    let mut matched = Vec::new();
    let mut record = |path: &Path, _spec: &[u8]| -> i32 {
        matched.push(path.to_path_buf());
        0
    };
    index.add_all([pathspec], IndexAddOption::DEFAULT, Some(&mut record))?;
    staged.added.append(&mut matched);
    Ok(())
}

/// Stage the CI submodule path, expecting it to resolve to a gitlink.
///
/// When the path cannot be staged as a submodule (broken or unregistered
/// layout), its contents are staged as ordinary files instead so that the
/// gitlink assertion downstream reports the layout problem rather than this
/// function guessing at a repair.
fn stage_submodule(root: &Path, index: &mut Index, staged: &mut StagedSet) -> Result<()> {
    let path = Path::new(defaults::SUBMODULE_DIR);
    if !root.join(path).exists() {
        debug!("submodule path {} missing, nothing to stage", path.display());
        return Ok(());
    }

    preclean_submodule_metadata(root)?;

    match index.add_path(path) {
        Ok(()) => {
            debug!("staged {} as gitlink", path.display());
            staged.added.push(path.to_path_buf());
        }
        Err(e) => {
            warn!("could not stage {} as a gitlink: {}", path.display(), e);
            add_all_tracked(index, path, staged)?;
        }
    }
    Ok(())
}

/// Remove a nested `.git` directory physically present inside the submodule
/// working directory.
///
/// A checkout whose metadata was never absorbed into the superproject
/// carries a real `.git` directory there; committing on top of that layout
/// corrupts the gitlink. The proper layout is a `.git` pointer *file*,
/// which is left alone. Returns whether anything was removed.
pub fn preclean_submodule_metadata(repo_root: &Path) -> Result<bool> {
    let nested = repo_root.join(defaults::SUBMODULE_DIR).join(".git");
    match fs::symlink_metadata(&nested) {
        Ok(meta) if meta.is_dir() => {
            fs::remove_dir_all(&nested)?;
            info!("removed nested metadata directory {}", nested.display());
            Ok(true)
        }
        _ => Ok(false),
    }
}

/// Commit the index iff the probe reports pending changes in `scope`.
///
/// Returns the new commit id, or `None` when there was nothing to commit.
/// Works on an unborn branch: the first commit simply has no parents.
pub fn commit_if_pending(
    repo: &Repository,
    message: &str,
    scope: PendingScope,
) -> Result<Option<Oid>> {
    if !probe::has_pending_changes(repo, scope)? {
        info!("nothing to commit");
        return Ok(None);
    }

    let mut index = repo.index()?;
    let tree_id = index.write_tree()?;
    let tree = repo.find_tree(tree_id)?;
    let signature = repo.signature()?;
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&Commit> = parent.iter().collect();
    let oid = repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)?;
    info!("committed {:.7}: {}", oid.to_string(), message);
    Ok(Some(oid))
}
