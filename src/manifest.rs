//! # Firmware Manifest Cleanup
//!
//! This module strips board-identifying configuration from a working tree:
//! it rewrites the `.slcp` project manifest without board components and
//! deletes the `.pintool` pin-configuration file. Together these edits turn
//! a board-specific checkout into its Boardless form.
//!
//! ## Filtering policy
//!
//! A manifest's top-level `component` sequence is filtered by each record's
//! `id` string: a component is removed when its id starts with `brd` or
//! `efr32`, compared ASCII-case-insensitively. Top-level mapping keys are
//! never filtered; entries without an `id`, and non-mapping entries, are
//! kept as-is. The rest of the document passes through the serializer
//! untouched, and the mapping preserves key order.
//!
//! The manifest is only rewritten when at least one component was removed,
//! so a tree that is already boardless stays byte-identical and the
//! commit gate downstream sees nothing to do.
//!
//! Both the manifest and the pintool file are optional per repository;
//! absence of either is a no-op, not an error.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde_yaml::Value;
use walkdir::{DirEntry, WalkDir};

use crate::defaults;
use crate::error::{Error, Result};

/// What one cleanup pass changed on disk.
#[derive(Debug, Default)]
pub struct CleanupReport {
    /// Manifest the pass inspected, if one was found.
    pub manifest: Option<PathBuf>,
    /// Component ids removed from the manifest.
    pub removed_components: Vec<String>,
    /// Pintool file deleted, if one was found.
    pub removed_pintool: Option<PathBuf>,
}

impl CleanupReport {
    /// True when the pass left the working tree untouched.
    pub fn is_noop(&self) -> bool {
        self.removed_components.is_empty() && self.removed_pintool.is_none()
    }
}

/// Strip board-identifying configuration from the tree under `repo_root`.
///
/// Locates the first `.slcp` manifest (deterministic file-name order,
/// skipping git metadata and the CI submodule checkout), filters its
/// `component` list, and deletes the first `.pintool` file found under the
/// same rules. Returns what was removed; a missing manifest or pintool is
/// not an error.
///
/// # Errors
///
/// Returns `Error::ManifestParse` when the manifest exists but is not valid
/// YAML, and I/O errors from reading or rewriting the affected files.
pub fn clean_firmware_manifest(repo_root: &Path) -> Result<CleanupReport> {
    let mut report = CleanupReport::default();

    match find_manifest(repo_root) {
        Some(manifest_path) => {
            info!("found manifest: {}", manifest_path.display());
            report.removed_components = filter_manifest_file(&manifest_path)?;
            if report.removed_components.is_empty() {
                info!("manifest has no board-specific components");
            } else {
                info!(
                    "removed {} board-specific component(s): {}",
                    report.removed_components.len(),
                    report.removed_components.join(", ")
                );
            }
            report.manifest = Some(manifest_path);
        }
        None => debug!("no .slcp manifest under {}", repo_root.display()),
    }

    match find_pintool(repo_root) {
        Some(pintool_path) => {
            fs::remove_file(&pintool_path)?;
            info!("deleted pintool file: {}", pintool_path.display());
            report.removed_pintool = Some(pintool_path);
        }
        None => debug!("no .pintool file under {}", repo_root.display()),
    }

    Ok(report)
}

/// First `.slcp` manifest under `repo_root`, if any.
pub fn find_manifest(repo_root: &Path) -> Option<PathBuf> {
    find_first_with_extension(repo_root, defaults::MANIFEST_EXTENSION)
}

/// First `.pintool` file under `repo_root`, if any.
pub fn find_pintool(repo_root: &Path) -> Option<PathBuf> {
    find_first_with_extension(repo_root, defaults::PINTOOL_EXTENSION)
}

/// Whether a component identifier marks board-specific content.
pub fn is_board_identifier(id: &str) -> bool {
    let lowered = id.to_ascii_lowercase();
    defaults::BOARD_PREFIXES
        .iter()
        .any(|prefix| lowered.starts_with(prefix))
}

/// Remove board components from a parsed manifest document.
///
/// Operates on the top-level `component` sequence; returns the removed ids
/// in document order. Documents without such a sequence are left untouched.
pub fn filter_board_components(doc: &mut Value) -> Vec<String> {
    let Some(components) = doc.get_mut("component").and_then(Value::as_sequence_mut) else {
        return Vec::new();
    };

    let mut removed = Vec::new();
    components.retain(|entry| match entry.get("id").and_then(Value::as_str) {
        Some(id) if is_board_identifier(id) => {
            debug!("removing board component: {}", id);
            removed.push(id.to_string());
            false
        }
        _ => true,
    });

    removed
}

/// Parse, filter, and (when changed) rewrite the manifest at `path`.
fn filter_manifest_file(path: &Path) -> Result<Vec<String>> {
    let raw = fs::read_to_string(path)?;
    let mut doc: Value = serde_yaml::from_str(&raw).map_err(|e| Error::ManifestParse {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let removed = filter_board_components(&mut doc);
    if !removed.is_empty() {
        let serialized = serde_yaml::to_string(&doc).map_err(|e| Error::Serialization {
            message: e.to_string(),
        })?;
        fs::write(path, serialized)?;
    }

    Ok(removed)
}

/// First file under `root` with the given extension, in file-name order.
///
/// Git metadata directories and the CI submodule checkout are never
/// searched: the submodule is foreign content this pipeline must not edit.
fn find_first_with_extension(root: &Path, extension: &str) -> Option<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(keep_entry)
        .filter_map(|e| e.ok())
        .find(|e| {
            e.file_type().is_file() && e.path().extension().is_some_and(|ext| ext == extension)
        })
        .map(DirEntry::into_path)
}

fn keep_entry(entry: &DirEntry) -> bool {
    // Always allow the walk root itself.
    if entry.depth() == 0 {
        return true;
    }
    if entry.file_name() == ".git" {
        return false;
    }
    if entry.depth() == 1
        && entry.file_type().is_dir()
        && entry.file_name() == defaults::SUBMODULE_DIR
    {
        return false;
    }
    true
}
