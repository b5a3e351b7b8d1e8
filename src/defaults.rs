//! Fixed layout contract shared across the pipeline.
//!
//! This module centralizes the names the CI environment guarantees
//! (submodule path, asset files, branch names, commit subjects), ensuring
//! consistency and avoiding duplication across steps.

/// Path of the CI-asset submodule, relative to the repository root.
pub const SUBMODULE_DIR: &str = "si_gh_actions";

/// Files copied from the submodule checkout to the repository root.
pub const CI_ASSET_FILES: [&str; 4] = [
    "CHANGELOG.md",
    "VERSION.md",
    ".gitignore",
    "target_info.yaml",
];

/// Workflow directory copied from the submodule to the repository root.
pub const WORKFLOW_DIR: &str = ".github";

/// Paths staged even when ignore rules would exclude them.
pub const PROTECTED_FILES: [&str; 2] = [".gitmodules", ".gitignore"];

/// Branch carrying the Boardful variant.
pub const DEFAULT_BRANCH: &str = "main";

/// Branch carrying the CI-asset and Boardless commits.
pub const WORK_BRANCH: &str = "dev";

/// Commit subjects used as idempotency tokens, one per pipeline gate.
pub const BOARDFUL_SUBJECT: &str = "Initial Boardful commit";
pub const CI_ASSETS_SUBJECT: &str = "CI: add workflows and metadata";
pub const BOARDLESS_SUBJECT: &str = "Initial Boardless commit";

/// Extension of the firmware project manifest.
pub const MANIFEST_EXTENSION: &str = "slcp";

/// Extension of the pin-configuration file deleted on the Boardless side.
pub const PINTOOL_EXTENSION: &str = "pintool";

/// Identifier prefixes marking a manifest entry as board-specific.
/// Compared ASCII-case-insensitively.
pub const BOARD_PREFIXES: [&str; 2] = ["brd", "efr32"];
