//! # Boardless Library
//!
//! This library converts a vendor board repository into its two published
//! forms: a *Boardful* variant on the default branch (full board content
//! plus CI assets and a healthy `si_gh_actions` submodule gitlink) and a
//! *Boardless* variant on the work branch (board-identifying configuration
//! stripped from the firmware manifest, pin-configuration file deleted).
//! It is designed to be used by the `boardless` command-line tool but can
//! also drive conversions from other applications.
//!
//! ## Quick Example
//!
//! ```
//! use boardless::manifest::{filter_board_components, is_board_identifier};
//!
//! // Board components are recognized by id prefix, case-insensitively.
//! assert!(is_board_identifier("brd4001a"));
//! assert!(is_board_identifier("EFR32MG12P332F1024GL125"));
//! assert!(!is_board_identifier("uart"));
//!
//! // Filtering a parsed manifest removes exactly those components.
//! let mut doc: serde_yaml::Value =
//!     serde_yaml::from_str("component:\n- id: brd4001a\n- id: uart\n").unwrap();
//! let removed = filter_board_components(&mut doc);
//! assert_eq!(removed, vec!["brd4001a".to_string()]);
//! ```
//!
//! ## Core Concepts
//!
//! The library is built around a few key concepts:
//!
//! - **Manifest Editor (`manifest`)**: Rewrites the `.slcp` firmware
//!   manifest without board components and deletes the `.pintool` file.
//! - **Asset Importer (`assets`)**: Copies CI metadata files and the
//!   `.github` workflow tree out of the submodule checkout, best effort.
//! - **Repository State Probe (`probe`)**: Read-only queries answering
//!   "is this already done?" - branch existence, commit-subject
//!   reachability, pending changes, gitlink integrity.
//! - **Stage-and-Commit Engine (`stage`)**: Mirrors the worktree into the
//!   index and creates gated commits that never duplicate work.
//! - **Pipeline Orchestrator (`pipeline`)**: Runs the six conversion steps
//!   in order, each guarded so the whole run is idempotent.
//!
//! ## Execution Flow
//!
//! `pipeline::Pipeline::run` executes the following steps:
//!
//! 1.  **Ensure default branch**: checkout `main`, or adopt the current
//!     branch under that name.
//! 2.  **Submodule hygiene**: protect `.gitmodules`, drop nested metadata
//!     directories, sync and update the CI submodule.
//! 3.  **Boardful commit** on the default branch.
//! 4.  **Ensure work branch**: checkout `dev`, or create it from the
//!     current tip.
//! 5.  **CI-assets commit** on the work branch.
//! 6.  **Boardless commit** on the work branch.
//!
//! Re-running the pipeline over a converted repository finds every gate
//! closed and creates no new history.

pub mod assets;
pub mod defaults;
pub mod error;
pub mod manifest;
pub mod output;
pub mod pipeline;
pub mod probe;
pub mod stage;

#[cfg(test)]
mod manifest_proptest;
