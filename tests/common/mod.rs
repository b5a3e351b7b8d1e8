//! Shared test utilities for integration and E2E tests.
//!
//! This module provides the vendor-repository fixture the pipeline tests
//! run against, plus helpers for inspecting the resulting git state.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = VendorRepoFixture::new().with_attached_submodule();
//!     // ... test code
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use git2::{Oid, Repository};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    #[allow(unused_imports)]
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    #[allow(unused_imports)]
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::{
        branch_tip, committed_filemode, manifest_component_ids, VendorRepoFixture,
    };
}

/// A board manifest the way vendor drops ship them.
pub const BOARD_MANIFEST: &str = r#"project_name: blink_demo
package: platform
quality: production
component:
  - id: brd4001a
  - id: brd4182a
  - id: EFR32MG12P332F1024GL125
  - id: uart
    instance: [vcom]
  - id: sl_system
  - id: device_init
"#;

/// A scratch vendor repository with board content, plus a local "upstream"
/// repository standing in for the CI submodule's remote.
///
/// Layout under the temp directory:
/// - `upstream/` - the CI assets repository (submodule remote)
/// - `repo/` - the vendor repository the pipeline runs against
///
/// The vendor history starts on a branch named `import` so tests exercise
/// the default-branch adoption path.
pub struct VendorRepoFixture {
    temp: assert_fs::TempDir,
}

impl VendorRepoFixture {
    /// Create the upstream CI repository and a vendor repository with one
    /// committed board drop (manifest, pintool, sources).
    pub fn new() -> Self {
        let temp = assert_fs::TempDir::new().expect("Failed to create temp directory");

        build_upstream(&temp.path().join("upstream"));

        let root = temp.path().join("repo");
        fs::create_dir_all(&root).expect("Failed to create repo directory");
        let repo = init_repo(&root);
        write_file(&root, "app.slcp", BOARD_MANIFEST);
        write_file(&root, "config/pins.pintool", "<pin_tool part=\"EFR32MG12\"/>\n");
        write_file(&root, "src/blink.c", "int main(void) { return 0; }\n");
        write_file(&root, "README.md", "# blink_demo\n");
        write_file(&root, ".gitignore", "build/\n*.o\n");
        stage_all(&repo);
        commit_staged(&repo, "Import vendor drop");
        rename_current_branch(&repo, "import");

        Self { temp }
    }

    /// Root of the vendor repository.
    pub fn root(&self) -> PathBuf {
        self.temp.path().join("repo")
    }

    /// URL of the upstream CI repository (a local path).
    pub fn upstream_url(&self) -> String {
        self.temp.path().join("upstream").display().to_string()
    }

    /// Open the vendor repository.
    pub fn repo(&self) -> Repository {
        Repository::open(self.root()).expect("Failed to open fixture repository")
    }

    /// Attach `si_gh_actions` the healthy way: metadata under
    /// `.git/modules`, a `.git` pointer file in the checkout, and the
    /// gitlink plus `.gitmodules` staged.
    pub fn with_attached_submodule(self) -> Self {
        let repo = self.repo();
        let mut submodule = repo
            .submodule(&self.upstream_url(), Path::new("si_gh_actions"), true)
            .expect("Failed to set up submodule");
        submodule.clone(None).expect("Failed to clone submodule");
        submodule
            .add_finalize()
            .expect("Failed to finalize submodule");
        self
    }

    /// Create a command configured to run in the vendor repository.
    #[allow(dead_code)]
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("boardless");
        cmd.current_dir(self.root());
        cmd
    }
}

impl Default for VendorRepoFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Tip commit of a local branch.
#[allow(dead_code)]
pub fn branch_tip(repo: &Repository, name: &str) -> Oid {
    repo.find_branch(name, git2::BranchType::Local)
        .unwrap_or_else(|_| panic!("branch '{name}' not found"))
        .get()
        .target()
        .expect("branch has no target")
}

/// Filemode of `path` in the tree committed at the tip of `branch`.
#[allow(dead_code)]
pub fn committed_filemode(repo: &Repository, branch: &str, path: &str) -> Option<i32> {
    let tip = branch_tip(repo, branch);
    let tree = repo
        .find_commit(tip)
        .expect("tip commit")
        .tree()
        .expect("tip tree");
    tree.get_path(Path::new(path)).ok().map(|entry| entry.filemode())
}

/// Component ids of an `.slcp` manifest on disk.
#[allow(dead_code)]
pub fn manifest_component_ids(path: &Path) -> Vec<String> {
    let raw = fs::read_to_string(path).expect("Failed to read manifest");
    let doc: serde_yaml::Value = serde_yaml::from_str(&raw).expect("Failed to parse manifest");
    doc["component"]
        .as_sequence()
        .map(|seq| {
            seq.iter()
                .filter_map(|c| c.get("id").and_then(serde_yaml::Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// The CI assets repository: metadata files plus a workflow tree.
fn build_upstream(path: &Path) {
    fs::create_dir_all(path).expect("Failed to create upstream directory");
    let repo = init_repo(path);
    write_file(path, "CHANGELOG.md", "# Changelog\n\n## 1.0.0\n- initial\n");
    write_file(path, "VERSION.md", "1.0.0\n");
    write_file(path, ".gitignore", "build/\n*.hex\n");
    write_file(path, "target_info.yaml", "family: efr32mg12\ntoolchain: gcc\n");
    write_file(
        path,
        ".github/workflows/build.yml",
        "on: push\njobs:\n  build:\n    runs-on: ubuntu-latest\n",
    );
    write_file(path, ".github/CODEOWNERS", "* @firmware\n");
    stage_all(&repo);
    commit_staged(&repo, "CI assets v1");
}

fn init_repo(path: &Path) -> Repository {
    let repo = Repository::init(path).expect("Failed to init repository");
    let mut config = repo.config().expect("Failed to open repo config");
    config.set_str("user.name", "tester").unwrap();
    config.set_str("user.email", "tester@example.com").unwrap();
    repo
}

fn write_file(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent directory");
    }
    fs::write(path, content).expect("Failed to write file");
}

fn stage_all(repo: &Repository) {
    let mut index = repo.index().expect("Failed to open index");
    index
        .add_all(["*"], git2::IndexAddOption::DEFAULT, None)
        .expect("Failed to stage files");
    index.write().expect("Failed to write index");
}

fn commit_staged(repo: &Repository, message: &str) -> Oid {
    let mut index = repo.index().expect("Failed to open index");
    let tree_id = index.write_tree().expect("Failed to write tree");
    let tree = repo.find_tree(tree_id).expect("Failed to find tree");
    let sig = repo.signature().expect("Failed to build signature");
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit> = parent.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .expect("Failed to commit")
}

fn rename_current_branch(repo: &Repository, name: &str) {
    let current = repo
        .head()
        .expect("Failed to read HEAD")
        .shorthand()
        .expect("HEAD is not valid UTF-8")
        .to_string();
    if current != name {
        let mut branch = repo
            .find_branch(&current, git2::BranchType::Local)
            .expect("Failed to find current branch");
        branch.rename(name, false).expect("Failed to rename branch");
        repo.set_head(&format!("refs/heads/{name}"))
            .expect("Failed to move HEAD");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_commits_board_content() {
        let fixture = VendorRepoFixture::new();
        let repo = fixture.repo();
        assert_eq!(repo.head().unwrap().shorthand(), Some("import"));
        assert!(fixture.root().join("app.slcp").is_file());
        assert!(fixture.root().join("config/pins.pintool").is_file());

        let ids = manifest_component_ids(&fixture.root().join("app.slcp"));
        assert!(ids.contains(&"brd4001a".to_string()));
        assert!(ids.contains(&"uart".to_string()));
    }

    #[test]
    fn test_attached_submodule_uses_pointer_file() {
        let fixture = VendorRepoFixture::new().with_attached_submodule();
        let dotgit = fixture.root().join("si_gh_actions/.git");
        assert!(dotgit.is_file(), "expected a .git pointer file");
        assert!(fixture.root().join(".git/modules/si_gh_actions").is_dir());
        assert!(fixture.root().join("si_gh_actions/CHANGELOG.md").is_file());
    }
}
