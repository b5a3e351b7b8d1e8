//! # CI Asset Import
//!
//! Copies continuous-integration assets out of the `si_gh_actions`
//! submodule checkout into the repository root: the changelog, version and
//! target-info metadata files, the root `.gitignore`, and the `.github`
//! workflow tree.
//!
//! Every item is handled independently. A missing source or a failed copy
//! is logged and recorded in the [`ImportReport`], never escalated: CI
//! assets are convenience content and their absence must not sink the
//! surrounding pipeline. Copies overwrite existing destinations, so
//! re-importing identical content leaves the working tree byte-identical.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use walkdir::WalkDir;

use crate::defaults;

/// What one import pass did, item by item.
///
/// Paths are relative to the repository root so callers can feed them
/// straight into staging.
#[derive(Debug, Default)]
pub struct ImportReport {
    /// Destination paths written this pass.
    pub copied: Vec<PathBuf>,
    /// Items whose source was missing from the submodule checkout.
    pub skipped: Vec<PathBuf>,
    /// Per-item copy failures, formatted as `path: cause`.
    pub warnings: Vec<String>,
}

impl ImportReport {
    /// True when nothing was written to the working tree.
    pub fn is_noop(&self) -> bool {
        self.copied.is_empty()
    }
}

/// Import CI assets from the submodule checkout under `repo_root`.
///
/// Copies each of [`defaults::CI_ASSET_FILES`] to the repository root and
/// recursively merges the submodule's `.github/` tree into the root
/// `.github/`. Infallible: per-item problems are logged and collected in
/// the returned report.
pub fn import_ci_assets(repo_root: &Path) -> ImportReport {
    let submodule = repo_root.join(defaults::SUBMODULE_DIR);
    let mut report = ImportReport::default();

    for name in defaults::CI_ASSET_FILES {
        copy_file(repo_root, &submodule.join(name), Path::new(name), &mut report);
    }
    copy_tree(
        repo_root,
        &submodule.join(defaults::WORKFLOW_DIR),
        Path::new(defaults::WORKFLOW_DIR),
        &mut report,
    );

    if report.is_noop() {
        info!("no CI assets imported");
    } else {
        info!("imported {} CI asset file(s)", report.copied.len());
    }
    report
}

/// Copy one file to `repo_root/rel_dest`, overwriting.
fn copy_file(repo_root: &Path, source: &Path, rel_dest: &Path, report: &mut ImportReport) {
    if !source.is_file() {
        warn!("asset source missing, skipping: {}", source.display());
        report.skipped.push(rel_dest.to_path_buf());
        return;
    }
    match fs::copy(source, repo_root.join(rel_dest)) {
        Ok(_) => {
            debug!("imported {}", rel_dest.display());
            report.copied.push(rel_dest.to_path_buf());
        }
        Err(e) => {
            warn!("failed to copy {}: {}", source.display(), e);
            report
                .warnings
                .push(format!("{}: {}", rel_dest.display(), e));
        }
    }
}

/// Recursively merge `source` into `repo_root/rel_dest`.
///
/// Existing destination files not present in the source survive the merge;
/// colliding files are overwritten.
fn copy_tree(repo_root: &Path, source: &Path, rel_dest: &Path, report: &mut ImportReport) {
    if !source.is_dir() {
        warn!("asset source missing, skipping: {}", source.display());
        report.skipped.push(rel_dest.to_path_buf());
        return;
    }

    for entry in WalkDir::new(source)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let Ok(rel) = entry.path().strip_prefix(source) else {
            continue;
        };
        let rel_target = rel_dest.join(rel);
        if entry.file_type().is_dir() {
            if let Err(e) = fs::create_dir_all(repo_root.join(&rel_target)) {
                warn!("failed to create {}: {}", rel_target.display(), e);
                report
                    .warnings
                    .push(format!("{}: {}", rel_target.display(), e));
            }
        } else {
            copy_file(repo_root, entry.path(), &rel_target, report);
        }
    }
}
