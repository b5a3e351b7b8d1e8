//! # Pipeline Orchestrator
//!
//! Runs the six-step conversion that turns a vendor board repository into
//! its Boardful (default branch) and Boardless (work branch) forms:
//!
//! 1. Ensure the default branch exists and is checked out.
//! 2. Submodule hygiene: protect `.gitmodules`, drop nested metadata,
//!    sync and update the CI submodule (best effort).
//! 3. Boardful commit on the default branch.
//! 4. Ensure the work branch exists and is checked out.
//! 5. CI-assets commit on the work branch.
//! 6. Boardless commit on the work branch.
//!
//! Steps run strictly in order. Each commit step is guarded by a
//! commit-subject probe evaluated against live repository state, so a
//! second run over the same repository finds every gate closed and creates
//! no new history. A fatal error aborts the remainder of the run wrapped
//! in [`Error::Step`] naming the step that failed.

use std::fs;
use std::path::{Path, PathBuf};

use git2::build::CheckoutBuilder;
use git2::{BranchType, Oid, Repository};
use log::{info, warn};

use crate::error::{Error, Result};
use crate::probe::PendingScope;
use crate::stage::StagePlan;
use crate::{assets, defaults, manifest, probe, stage};

const STEP_DEFAULT_BRANCH: &str = "ensure-default-branch";
const STEP_HYGIENE: &str = "submodule-hygiene";
const STEP_BOARDFUL: &str = "boardful-commit";
const STEP_WORK_BRANCH: &str = "ensure-work-branch";
const STEP_CI_ASSETS: &str = "ci-assets-commit";
const STEP_BOARDLESS: &str = "boardless-commit";

/// Everything one pipeline run is parameterized by.
///
/// The manifest filtering policy is deliberately not here: exactly one
/// canonical policy exists.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Repository root (or any path inside the working tree).
    pub root: PathBuf,
    /// Branch carrying the Boardful history.
    pub default_branch: String,
    /// Branch carrying the Boardless history.
    pub work_branch: String,
    /// Subject of the Boardful commit, also its re-entrancy gate.
    pub boardful_subject: String,
    /// Subject of the CI-assets commit, also its re-entrancy gate.
    pub ci_assets_subject: String,
    /// Subject of the Boardless commit, also its re-entrancy gate.
    pub boardless_subject: String,
    /// Run the Boardless side (steps 4 to 6). Off recovers the variant
    /// that only produces the Boardful commit.
    pub boardless: bool,
}

impl PipelineConfig {
    /// Configuration with stock branch names and commit subjects.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            default_branch: defaults::DEFAULT_BRANCH.to_string(),
            work_branch: defaults::WORK_BRANCH.to_string(),
            boardful_subject: defaults::BOARDFUL_SUBJECT.to_string(),
            ci_assets_subject: defaults::CI_ASSETS_SUBJECT.to_string(),
            boardless_subject: defaults::BOARDLESS_SUBJECT.to_string(),
            boardless: true,
        }
    }
}

/// How one pipeline step ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepStatus {
    /// The step created a commit.
    Committed(Oid),
    /// The step staged and gated, but nothing needed committing.
    NothingToCommit,
    /// The step's guard found its work already done.
    SkippedByGuard,
    /// Housekeeping step ran to completion.
    Completed,
}

/// Outcome of one executed step, including best-effort warnings.
#[derive(Debug)]
pub struct StepOutcome {
    pub step: &'static str,
    pub status: StepStatus,
    pub warnings: Vec<String>,
}

impl StepOutcome {
    fn completed(step: &'static str) -> Self {
        Self {
            step,
            status: StepStatus::Completed,
            warnings: Vec::new(),
        }
    }

    fn skipped(step: &'static str) -> Self {
        Self {
            step,
            status: StepStatus::SkippedByGuard,
            warnings: Vec::new(),
        }
    }

    fn from_commit(step: &'static str, oid: Option<Oid>) -> Self {
        Self {
            step,
            status: match oid {
                Some(oid) => StepStatus::Committed(oid),
                None => StepStatus::NothingToCommit,
            },
            warnings: Vec::new(),
        }
    }
}

/// What a run did, step by step.
#[derive(Debug, Default)]
pub struct PipelineReport {
    pub steps: Vec<StepOutcome>,
}

impl PipelineReport {
    pub fn commit_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s.status, StepStatus::Committed(_)))
            .count()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &str> {
        self.steps
            .iter()
            .flat_map(|s| s.warnings.iter().map(String::as_str))
    }
}

/// Open the repository containing `root`.
///
/// # Errors
///
/// Returns `Error::RepositoryNotFound` when no repository is found or the
/// repository is bare.
pub fn open_repository(root: &Path) -> Result<Repository> {
    let repo = Repository::discover(root).map_err(|_| Error::RepositoryNotFound {
        path: root.display().to_string(),
    })?;
    if repo.is_bare() {
        return Err(Error::RepositoryNotFound {
            path: root.display().to_string(),
        });
    }
    Ok(repo)
}

/// The six-step conversion, driven by a [`PipelineConfig`].
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Execute the pipeline against the configured repository.
    ///
    /// # Errors
    ///
    /// Any fatal error is wrapped in `Error::Step` naming the failing step.
    pub fn run(&self) -> Result<PipelineReport> {
        info!("starting pipeline in {}", self.config.root.display());
        let repo = open_repository(&self.config.root)?;
        log_starting_branch(&repo);

        let mut report = PipelineReport::default();
        report.steps.push(
            self.ensure_default_branch(&repo)
                .map_err(|e| e.in_step(STEP_DEFAULT_BRANCH))?,
        );
        report.steps.push(
            self.submodule_hygiene(&repo)
                .map_err(|e| e.in_step(STEP_HYGIENE))?,
        );
        report.steps.push(
            self.boardful_commit(&repo)
                .map_err(|e| e.in_step(STEP_BOARDFUL))?,
        );

        if self.config.boardless {
            report.steps.push(
                self.ensure_work_branch(&repo)
                    .map_err(|e| e.in_step(STEP_WORK_BRANCH))?,
            );
            report.steps.push(
                self.ci_assets_commit(&repo)
                    .map_err(|e| e.in_step(STEP_CI_ASSETS))?,
            );
            report.steps.push(
                self.boardless_commit(&repo)
                    .map_err(|e| e.in_step(STEP_BOARDLESS))?,
            );
        } else {
            info!("boardful-only mode, work-branch steps skipped");
        }

        info!(
            "pipeline complete: {} commit(s) created",
            report.commit_count()
        );
        Ok(report)
    }

    /// Step 1: the default branch exists and is checked out afterwards.
    fn ensure_default_branch(&self, repo: &Repository) -> Result<StepOutcome> {
        let name = &self.config.default_branch;
        if probe::branch_exists(repo, name) {
            info!("branch '{}' exists, checking it out", name);
            checkout_branch(repo, name)?;
            return Ok(StepOutcome::completed(STEP_DEFAULT_BRANCH));
        }

        match repo.head() {
            Ok(head) if head.is_branch() => match head.shorthand() {
                Some(current) => {
                    info!("renaming branch '{}' to '{}'", current, name);
                    let current = current.to_string();
                    let mut branch = repo.find_branch(&current, BranchType::Local)?;
                    branch.rename(name, false)?;
                    repo.set_head(&branch_ref(name))?;
                }
                None => {
                    let commit = head.peel_to_commit()?;
                    repo.branch(name, &commit, false)?;
                    repo.set_head(&branch_ref(name))?;
                }
            },
            Ok(head) => {
                let commit = head.peel_to_commit()?;
                info!(
                    "creating branch '{}' at detached HEAD {:.7}",
                    name,
                    commit.id().to_string()
                );
                repo.branch(name, &commit, false)?;
                repo.set_head(&branch_ref(name))?;
            }
            Err(_) => {
                info!("unborn HEAD, pointing it at '{}'", name);
                repo.set_head(&branch_ref(name))?;
            }
        }
        Ok(StepOutcome::completed(STEP_DEFAULT_BRANCH))
    }

    /// Step 2: protect `.gitmodules`, drop nested metadata, sync the
    /// submodule. Sync/update failures are warnings, never fatal.
    fn submodule_hygiene(&self, repo: &Repository) -> Result<StepOutcome> {
        let root = probe::workdir(repo)?;
        let mut outcome = StepOutcome::completed(STEP_HYGIENE);

        protect_gitmodules(root)?;
        stage::preclean_submodule_metadata(root)?;
        if let Err(e) = sync_submodule(repo) {
            warn!("submodule sync/update failed: {}", e);
            outcome.warnings.push(e.to_string());
        }
        Ok(outcome)
    }

    /// Step 3: the Boardful commit on the default branch.
    fn boardful_commit(&self, repo: &Repository) -> Result<StepOutcome> {
        let subject = &self.config.boardful_subject;
        if probe::has_commit_with_subject(repo, &self.config.default_branch, subject) {
            info!(
                "'{}' already on '{}', skipping",
                subject, self.config.default_branch
            );
            return Ok(StepOutcome::skipped(STEP_BOARDFUL));
        }

        let plan = StagePlan {
            force_paths: protected_paths(),
            submodule: true,
            ..StagePlan::default()
        };
        stage::stage_step(repo, &plan)?;
        probe::assert_staged_gitlink(repo, Path::new(defaults::SUBMODULE_DIR))?;
        let oid = stage::commit_if_pending(repo, subject, PendingScope::Staged)?;
        Ok(StepOutcome::from_commit(STEP_BOARDFUL, oid))
    }

    /// Step 4: the work branch exists and is checked out afterwards.
    fn ensure_work_branch(&self, repo: &Repository) -> Result<StepOutcome> {
        let name = &self.config.work_branch;
        if probe::branch_exists(repo, name) {
            info!("branch '{}' exists, checking it out", name);
            checkout_branch(repo, name)?;
            return Ok(StepOutcome::completed(STEP_WORK_BRANCH));
        }

        match repo.head() {
            Ok(head) => {
                let commit = head.peel_to_commit()?;
                info!(
                    "creating branch '{}' from {:.7}",
                    name,
                    commit.id().to_string()
                );
                repo.branch(name, &commit, false)?;
                repo.set_head(&branch_ref(name))?;
            }
            Err(_) => {
                info!("unborn HEAD, pointing it at '{}'", name);
                repo.set_head(&branch_ref(name))?;
            }
        }
        Ok(StepOutcome::completed(STEP_WORK_BRANCH))
    }

    /// Step 5: the CI-assets commit on the work branch.
    fn ci_assets_commit(&self, repo: &Repository) -> Result<StepOutcome> {
        let subject = &self.config.ci_assets_subject;
        if probe::has_commit_with_subject(repo, &self.config.work_branch, subject) {
            info!(
                "'{}' already on '{}', skipping",
                subject, self.config.work_branch
            );
            return Ok(StepOutcome::skipped(STEP_CI_ASSETS));
        }

        let root = probe::workdir(repo)?;
        let import = assets::import_ci_assets(root);

        // The imported .gitignore is force-staged: it overwrites the root
        // one and may otherwise hide itself behind prior ignore rules.
        let plan = StagePlan {
            force_paths: protected_paths(),
            files: asset_file_paths(),
            dirs: vec![PathBuf::from(defaults::WORKFLOW_DIR)],
            ..StagePlan::default()
        };
        stage::stage_step(repo, &plan)?;
        let oid = stage::commit_if_pending(repo, subject, PendingScope::Staged)?;

        let mut outcome = StepOutcome::from_commit(STEP_CI_ASSETS, oid);
        outcome.warnings = import.warnings;
        Ok(outcome)
    }

    /// Step 6: the Boardless commit on the work branch.
    fn boardless_commit(&self, repo: &Repository) -> Result<StepOutcome> {
        let subject = &self.config.boardless_subject;
        if probe::has_commit_with_subject(repo, &self.config.work_branch, subject) {
            info!(
                "'{}' already on '{}', skipping",
                subject, self.config.work_branch
            );
            return Ok(StepOutcome::skipped(STEP_BOARDLESS));
        }

        let root = probe::workdir(repo)?;
        manifest::clean_firmware_manifest(root)?;

        let plan = StagePlan {
            force_paths: protected_paths(),
            submodule: true,
            ..StagePlan::default()
        };
        stage::stage_step(repo, &plan)?;
        probe::assert_staged_gitlink(repo, Path::new(defaults::SUBMODULE_DIR))?;
        let oid = stage::commit_if_pending(repo, subject, PendingScope::Staged)?;
        Ok(StepOutcome::from_commit(STEP_BOARDLESS, oid))
    }
}

fn branch_ref(name: &str) -> String {
    format!("refs/heads/{}", name)
}

fn protected_paths() -> Vec<PathBuf> {
    defaults::PROTECTED_FILES.iter().map(PathBuf::from).collect()
}

/// Imported asset files staged by name, minus those already force-staged.
fn asset_file_paths() -> Vec<PathBuf> {
    defaults::CI_ASSET_FILES
        .iter()
        .copied()
        .filter(|name| !defaults::PROTECTED_FILES.contains(name))
        .map(PathBuf::from)
        .collect()
}

fn log_starting_branch(repo: &Repository) {
    match repo.head() {
        Ok(head) if head.is_branch() => {
            info!("starting on branch '{}'", head.shorthand().unwrap_or("?"));
        }
        Ok(head) => {
            let at = head
                .target()
                .map(|oid| oid.to_string())
                .unwrap_or_default();
            info!("starting from detached HEAD at {:.7}", at);
        }
        Err(_) => info!("starting on an unborn branch"),
    }
}

/// Checkout an existing local branch and point HEAD at it.
fn checkout_branch(repo: &Repository, name: &str) -> Result<()> {
    let refname = branch_ref(name);
    let object = repo.revparse_single(&refname)?;
    let mut checkout = CheckoutBuilder::new();
    checkout.safe();
    repo.checkout_tree(&object, Some(&mut checkout))?;
    repo.set_head(&refname)?;
    Ok(())
}

/// Append `!.gitmodules` to an existing `.gitignore` once.
///
/// Without the negation an over-broad ignore rule can hide `.gitmodules`,
/// and a clone of the result would lose the submodule registration.
fn protect_gitmodules(root: &Path) -> Result<()> {
    let gitignore = root.join(".gitignore");
    if !gitignore.is_file() {
        return Ok(());
    }
    let content = fs::read_to_string(&gitignore)?;
    if content.lines().any(|line| line.trim() == "!.gitmodules") {
        return Ok(());
    }

    let mut updated = content;
    if !updated.is_empty() && !updated.ends_with('\n') {
        updated.push('\n');
    }
    updated.push_str("!.gitmodules\n");
    fs::write(&gitignore, updated)?;
    info!("protected .gitmodules in .gitignore");
    Ok(())
}

/// Sync the CI submodule's URL and update its checkout.
fn sync_submodule(repo: &Repository) -> std::result::Result<(), git2::Error> {
    let mut submodule = repo.find_submodule(defaults::SUBMODULE_DIR)?;
    submodule.sync()?;
    let mut options = git2::SubmoduleUpdateOptions::new();
    submodule.update(true, Some(&mut options))?;
    info!("synchronized submodule {}", defaults::SUBMODULE_DIR);
    Ok(())
}
