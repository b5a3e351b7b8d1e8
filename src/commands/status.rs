//! Status command implementation
//!
//! Read-only preflight report built from the repository state probe:
//! branch existence, the three commit gates, pending-change scopes, the
//! staged submodule mode, and manifest/pintool presence. Batch drivers use
//! it to decide whether a run would do anything. Never mutates the
//! repository, and gate state does not affect the exit code.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use serde::Serialize;

use boardless::output::{emoji, OutputConfig};
use boardless::pipeline::open_repository;
use boardless::probe::{self, PendingScope};
use boardless::{defaults, manifest};

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Repository root (defaults to the current directory)
    #[arg(short, long, value_name = "PATH", env = "BOARDLESS_REPO")]
    pub repo: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = StatusFormat::Text)]
    pub format: StatusFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StatusFormat {
    /// Human-readable report
    Text,
    /// Machine-readable JSON
    Json,
}

/// Snapshot of everything the pipeline's guards would look at.
#[derive(Debug, Serialize)]
struct RepoStatus {
    root: String,
    current_branch: Option<String>,
    default_branch_exists: bool,
    work_branch_exists: bool,
    boardful_committed: bool,
    ci_assets_committed: bool,
    boardless_committed: bool,
    staged_changes: bool,
    worktree_changes: bool,
    submodule_gitlink_staged: bool,
    manifest: Option<String>,
    pintool: Option<String>,
}

/// Execute the status command
pub fn execute(args: StatusArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let root = match args.repo {
        Some(path) => path,
        None => std::env::current_dir().context("failed to resolve the current directory")?,
    };

    let status = collect(&root)?;
    match args.format {
        StatusFormat::Json => println!("{}", serde_json::to_string_pretty(&status)?),
        StatusFormat::Text => print_text(&out, &status),
    }
    Ok(())
}

fn collect(root: &Path) -> Result<RepoStatus> {
    let repo = open_repository(root)?;
    let workdir = probe::workdir(&repo)?;

    let current_branch = repo
        .head()
        .ok()
        .filter(git2::Reference::is_branch)
        .and_then(|head| head.shorthand().map(str::to_string));

    Ok(RepoStatus {
        root: workdir.display().to_string(),
        current_branch,
        default_branch_exists: probe::branch_exists(&repo, defaults::DEFAULT_BRANCH),
        work_branch_exists: probe::branch_exists(&repo, defaults::WORK_BRANCH),
        boardful_committed: probe::has_commit_with_subject(
            &repo,
            defaults::DEFAULT_BRANCH,
            defaults::BOARDFUL_SUBJECT,
        ),
        ci_assets_committed: probe::has_commit_with_subject(
            &repo,
            defaults::WORK_BRANCH,
            defaults::CI_ASSETS_SUBJECT,
        ),
        boardless_committed: probe::has_commit_with_subject(
            &repo,
            defaults::WORK_BRANCH,
            defaults::BOARDLESS_SUBJECT,
        ),
        staged_changes: probe::has_pending_changes(&repo, PendingScope::Staged)?,
        worktree_changes: probe::has_pending_changes(&repo, PendingScope::WorktreeAndStaged)?,
        submodule_gitlink_staged: probe::is_staged_as_gitlink(
            &repo,
            Path::new(defaults::SUBMODULE_DIR),
        )?,
        manifest: manifest::find_manifest(workdir).map(|p| p.display().to_string()),
        pintool: manifest::find_pintool(workdir).map(|p| p.display().to_string()),
    })
}

fn print_text(out: &OutputConfig, status: &RepoStatus) {
    println!("{} Boardless Status", emoji(out, "🔎", "[STATUS]"));
    println!();
    println!("Repository: {}", status.root);
    println!(
        "Current branch: {}",
        status.current_branch.as_deref().unwrap_or("(none)")
    );
    println!();

    println!("Commit gates:");
    println!(
        "  {} Boardful commit on '{}'",
        mark(out, status.boardful_committed),
        defaults::DEFAULT_BRANCH
    );
    println!(
        "  {} CI-assets commit on '{}'",
        mark(out, status.ci_assets_committed),
        defaults::WORK_BRANCH
    );
    println!(
        "  {} Boardless commit on '{}'",
        mark(out, status.boardless_committed),
        defaults::WORK_BRANCH
    );
    println!();

    println!("Branches:");
    println!(
        "  {} {}",
        mark(out, status.default_branch_exists),
        defaults::DEFAULT_BRANCH
    );
    println!(
        "  {} {}",
        mark(out, status.work_branch_exists),
        defaults::WORK_BRANCH
    );
    println!();

    println!("Working state:");
    println!("  staged changes: {}", yes_no(status.staged_changes));
    println!("  worktree changes: {}", yes_no(status.worktree_changes));
    println!(
        "  submodule staged as gitlink: {}",
        yes_no(status.submodule_gitlink_staged)
    );
    println!(
        "  manifest: {}",
        status.manifest.as_deref().unwrap_or("(none)")
    );
    println!(
        "  pintool: {}",
        status.pintool.as_deref().unwrap_or("(none)")
    );
}

fn mark(out: &OutputConfig, done: bool) -> &'static str {
    if done {
        emoji(out, "✅", "[DONE]")
    } else {
        emoji(out, "🔲", "[PENDING]")
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
