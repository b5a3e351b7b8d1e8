//! # Error Handling
//!
//! This module defines the centralized error handling mechanism for the
//! `boardless` application. It uses the `thiserror` library to create an
//! `Error` enum covering the fatal failure modes of the pipeline, providing
//! clear and descriptive error messages.
//!
//! ## Key Components
//!
//! - **`Error`**: The main enum that represents all fatal errors. Each
//!   variant corresponds to a specific type of error and includes contextual
//!   information to aid in remediation.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`, used
//!   throughout the library to simplify function signatures.
//!
//! Non-fatal conditions (a missing asset file, a failed submodule sync) are
//! deliberately *not* errors: they are logged and recorded as report values
//! on the operation that observed them, so a bulk step never aborts on a
//! per-item problem. Only whole-step failures surface here.

use thiserror::Error;

/// Main error type for boardless operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The given path is not inside a non-bare git working tree.
    ///
    /// Raised when opening the repository at the start of a run; nothing
    /// has been mutated when this is reported.
    #[error("not a git working tree: {path}")]
    RepositoryNotFound { path: String },

    /// The firmware manifest exists but could not be parsed as YAML.
    ///
    /// Fatal for the cleanup step that invoked it: a manifest we cannot
    /// read is a manifest we must not rewrite.
    #[error("manifest parse error in {path}: {message}")]
    ManifestParse { path: String, message: String },

    /// The submodule path is staged with a non-gitlink index mode.
    ///
    /// This indicates the submodule contents were captured as ordinary
    /// tracked files. The pipeline aborts before committing.
    #[error("{path} is not staged as a submodule gitlink (mode 160000), found mode {mode:o}")]
    SubmoduleIntegrity { path: String, mode: u32 },

    /// A fatal error, annotated with the pipeline step that raised it.
    #[error("pipeline step '{step}' failed: {source}")]
    Step {
        step: &'static str,
        #[source]
        source: Box<Error>,
    },

    /// An error occurred while serializing the rewritten manifest.
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// A git operation failed, wrapped from `git2::Error`.
    #[error("git error: {0}")]
    Git(#[from] git2::Error),

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Annotate a fatal error with the pipeline step it aborted.
    pub fn in_step(self, step: &'static str) -> Self {
        Error::Step {
            step,
            source: Box::new(self),
        }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_repository_not_found() {
        let error = Error::RepositoryNotFound {
            path: "/tmp/not-a-repo".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("not a git working tree"));
        assert!(display.contains("/tmp/not-a-repo"));
    }

    #[test]
    fn test_error_display_manifest_parse() {
        let error = Error::ManifestParse {
            path: "app/project.slcp".to_string(),
            message: "invalid type: string".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("manifest parse error"));
        assert!(display.contains("app/project.slcp"));
        assert!(display.contains("invalid type"));
    }

    #[test]
    fn test_error_display_submodule_integrity_shows_octal_mode() {
        let error = Error::SubmoduleIntegrity {
            path: "si_gh_actions".to_string(),
            mode: 0o100644,
        };
        let display = format!("{}", error);
        assert!(display.contains("si_gh_actions"));
        assert!(display.contains("160000"));
        assert!(display.contains("100644"));
    }

    #[test]
    fn test_error_step_wrapping_names_the_step() {
        let inner = Error::SubmoduleIntegrity {
            path: "si_gh_actions".to_string(),
            mode: 0o40000,
        };
        let wrapped = inner.in_step("boardful commit");
        let display = format!("{}", wrapped);
        assert!(display.contains("pipeline step 'boardful commit' failed"));
        assert!(display.contains("not staged as a submodule gitlink"));
    }

    #[test]
    fn test_error_from_io_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let error: Error = io_error.into();
        let display = format!("{}", error);
        assert!(display.contains("I/O error"));
        assert!(display.contains("File not found"));
    }

    #[test]
    fn test_error_from_git_error() {
        let git_error = git2::Error::from_str("object not found");
        let error: Error = git_error.into();
        let display = format!("{}", error);
        assert!(display.contains("git error"));
        assert!(display.contains("object not found"));
    }
}
