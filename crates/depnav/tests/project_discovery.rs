//! BUILD file discovery over real directory trees.

use std::fs;
use std::path::Path;
use std::sync::Mutex;

use depnav::project::{collect_build_files, ParsedProject, Stat};
use tempfile::TempDir;

static CWD_LOCK: Mutex<()> = Mutex::new(());

fn write_file(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn in_dir<T>(dir: &Path, f: impl FnOnce() -> T) -> T {
    let guard = CWD_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let previous = std::env::current_dir().unwrap();
    std::env::set_current_dir(dir).unwrap();
    let result = f();
    std::env::set_current_dir(previous).unwrap();
    drop(guard);
    result
}

fn collected_names(include_external: bool) -> Vec<String> {
    let mut stat = Stat::default();
    let mut files: Vec<String> = collect_build_files(include_external, &mut stat)
        .iter()
        .map(|path| path.display().to_string())
        .collect();
    files.sort();
    files
}

#[test]
fn finds_build_and_build_bazel_skipping_noise() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "a/BUILD", "x = 1\n");
    write_file(dir.path(), "b/BUILD.bazel", "y = 2\n");
    write_file(dir.path(), "b/nested/BUILD", "z = 3\n");
    write_file(dir.path(), "_tmp/BUILD", "ignored = 1\n");
    write_file(dir.path(), ".git/BUILD", "ignored = 2\n");
    write_file(dir.path(), "c/OTHER.bazel", "not_a_build_file = 1\n");

    in_dir(dir.path(), || {
        assert_eq!(
            collected_names(false),
            vec!["./a/BUILD", "./b/BUILD.bazel", "./b/nested/BUILD"]
        );
    });
}

#[test]
fn symlinks_in_main_tree_are_not_followed() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "real/BUILD", "x = 1\n");
    std::os::unix::fs::symlink(dir.path().join("real"), dir.path().join("link")).unwrap();

    in_dir(dir.path(), || {
        assert_eq!(collected_names(false), vec!["./real/BUILD"]);
    });
}

#[test]
fn external_tree_is_walked_through_its_symlink_only_on_request() {
    let root = TempDir::new().unwrap();
    // Layout mirrors bazel: the external tree lives elsewhere and is
    // reachable through a `bazel-<project>` symlink inside the workspace.
    let work = root.path().join("work");
    let store = root.path().join("store");
    write_file(&work, "BUILD", "cc_library(name = \"main\")\n");
    write_file(&store, "external/ws/BUILD", "cc_library(name = \"ext\")\n");
    std::os::unix::fs::symlink(&store, work.join("bazel-work")).unwrap();

    in_dir(&work, || {
        assert_eq!(collected_names(false), vec!["./BUILD"]);
        assert_eq!(
            collected_names(true),
            vec!["./BUILD", "./bazel-work/external/ws/BUILD"]
        );
    });
}

#[test]
fn from_filesystem_attributes_external_packages() {
    let root = TempDir::new().unwrap();
    let work = root.path().join("work");
    let store = root.path().join("store");
    write_file(&work, "lib/BUILD", "cc_library(name = \"scan\", hdrs = [\"scan.h\"])\n");
    write_file(&store, "external/absl/strings/BUILD", "cc_library(name = \"strings\")\n");
    std::os::unix::fs::symlink(&store, work.join("bazel-work")).unwrap();

    in_dir(&work, || {
        let mut errors = Vec::new();
        let project = ParsedProject::from_filesystem(true, &mut errors);
        assert_eq!(project.error_count, 0);
        assert_eq!(project.files.len(), 2);

        let main = &project.files["./lib/BUILD"];
        assert!(main.package.project.is_empty());
        assert_eq!(main.package.path, "lib");

        let external = &project.files["./bazel-work/external/absl/strings/BUILD"];
        assert_eq!(external.package.project, "@absl");
        assert_eq!(external.package.path, "strings");
    });
}

#[test]
fn unreadable_and_broken_files_are_counted_not_fatal() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "ok/BUILD", "x = 1\n");
    write_file(dir.path(), "broken/BUILD", "cc_library(name = [)\n");

    in_dir(dir.path(), || {
        let mut errors = Vec::new();
        let project = ParsedProject::from_filesystem(false, &mut errors);
        assert_eq!(project.error_count, 1);
        assert_eq!(project.files.len(), 2);
        let report = String::from_utf8(errors).unwrap();
        assert!(report.contains("./broken/BUILD:1:"), "{report}");
    });
}
