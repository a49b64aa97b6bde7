//! DWYU engine end-to-end against real workspaces built in a temp dir.
//!
//! Source lookup happens relative to the current directory, so these tests
//! chdir into the fixture; a process-wide lock keeps them serial.

use std::fs;
use std::path::Path;
use std::sync::Mutex;

use depnav::dwyu::dependency_edits;
use depnav::project::ParsedProject;
use tempfile::TempDir;

static CWD_LOCK: Mutex<()> = Mutex::new(());

fn write_file(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Create the given files in a temp workspace, chdir into it, run `f`.
fn in_workspace<T>(files: &[(&str, &str)], f: impl FnOnce() -> T) -> T {
    let guard = CWD_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let dir = TempDir::new().unwrap();
    for (relative, content) in files {
        write_file(dir.path(), relative, content);
    }
    let previous = std::env::current_dir().unwrap();
    std::env::set_current_dir(dir.path()).unwrap();
    let result = f();
    std::env::set_current_dir(previous).unwrap();
    drop(guard);
    result
}

fn edits_for_project() -> (Vec<String>, String) {
    let mut load_errors = Vec::new();
    let project = ParsedProject::from_filesystem(true, &mut load_errors);
    assert_eq!(project.error_count, 0, "{}", String::from_utf8_lossy(&load_errors));
    let mut info = Vec::new();
    let edits = dependency_edits(&project, &mut info);
    (
        edits.iter().map(|edit| edit.to_string()).collect(),
        String::from_utf8(info).unwrap(),
    )
}

#[test]
fn unused_dep_is_removed() {
    let files = [
        (
            "BUILD",
            "cc_library(name = \"x\", hdrs = [\"x.h\"])\n\
             cc_library(name = \"unused\")\n\
             cc_library(name = \"y\", srcs = [\"y.cc\"], deps = [\":x\", \":unused\"])\n",
        ),
        ("x.h", "#pragma once\n"),
        ("y.cc", "#include \"x.h\"\n"),
    ];
    in_workspace(&files, || {
        let (edits, _info) = edits_for_project();
        assert_eq!(edits, vec!["buildozer 'remove deps :unused' //:y"]);
    });
}

#[test]
fn unreadable_source_blocks_removal_but_not_addition() {
    let files = [
        (
            "BUILD",
            "cc_library(name = \"x\", hdrs = [\"x.h\"])\n\
             cc_library(name = \"unused\")\n\
             cc_library(name = \"y\", srcs = [\"y.cc\", \"w.cc\"], deps = [\":unused\"])\n",
        ),
        ("x.h", "#pragma once\n"),
        // y.cc intentionally missing (presumed generated)
        ("w.cc", "#include \"x.h\"\n"),
    ];
    in_workspace(&files, || {
        let (edits, info) = edits_for_project();
        assert_eq!(edits, vec!["buildozer 'add deps :x' //:y"]);
        assert!(info.contains("Can not read 'y.cc'"), "{info}");
    });
}

#[test]
fn satisfied_deps_produce_no_edits() {
    let files = [
        (
            "BUILD",
            "cc_library(name = \"x\", hdrs = [\"x.h\"])\n\
             cc_library(name = \"y\", srcs = [\"y.cc\"], deps = [\":x\"])\n",
        ),
        ("x.h", "#pragma once\n"),
        ("y.cc", "#include \"x.h\"\n"),
    ];
    in_workspace(&files, || {
        let (edits, _info) = edits_for_project();
        assert!(edits.is_empty(), "expected no edits, got {edits:?}");
    });
}

#[test]
fn additions_are_sorted_and_cross_package_deps_canonical() {
    let files = [
        (
            "BUILD",
            "cc_library(name = \"b\", hdrs = [\"b.h\"])\n\
             cc_library(name = \"a\", hdrs = [\"a.h\"])\n\
             cc_binary(name = \"tool\", srcs = [\"tool.cc\"])\n",
        ),
        ("a.h", ""),
        ("b.h", ""),
        (
            "lib/BUILD",
            "cc_library(name = \"far\", hdrs = [\"far.h\"])\n",
        ),
        ("lib/far.h", ""),
        (
            "tool.cc",
            "#include \"b.h\"\n#include \"a.h\"\n#include \"lib/far.h\"\n",
        ),
    ];
    in_workspace(&files, || {
        let (edits, _info) = edits_for_project();
        assert_eq!(
            edits,
            vec![
                "buildozer 'add deps :a' //:tool",
                "buildozer 'add deps :b' //:tool",
                "buildozer 'add deps //lib:far' //:tool",
            ]
        );
    });
}

#[test]
fn alwayslink_targets_are_never_suggested_for_removal() {
    let files = [
        (
            "BUILD",
            "cc_library(name = \"x\", hdrs = [\"x.h\"])\n\
             cc_library(name = \"pinned\", alwayslink = True)\n\
             cc_library(name = \"y\", srcs = [\"y.cc\"], deps = [\":x\", \":pinned\"])\n",
        ),
        ("x.h", ""),
        ("y.cc", "#include \"x.h\"\n"),
    ];
    in_workspace(&files, || {
        let (edits, _info) = edits_for_project();
        assert!(edits.is_empty(), "alwayslink dep was edited: {edits:?}");
    });
}

#[test]
fn unknown_include_lowers_remove_confidence() {
    let files = [
        (
            "BUILD",
            "cc_library(name = \"unused\")\n\
             cc_library(name = \"y\", srcs = [\"y.cc\"], deps = [\":unused\"])\n",
        ),
        ("y.cc", "#include \"mystery.h\"\n"),
    ];
    in_workspace(&files, || {
        let (edits, _info) = edits_for_project();
        assert!(edits.is_empty(), "unaccounted header must block removal: {edits:?}");
    });
}

#[test]
fn malformed_dep_is_diagnosed_but_not_edited() {
    let files = [
        (
            "BUILD",
            "cc_library(name = \"y\", srcs = [\"y.cc\"], deps = [\"a:b:c\", \"plain\"])\n",
        ),
        ("y.cc", ""),
    ];
    in_workspace(&files, || {
        let (edits, info) = edits_for_project();
        assert!(edits.is_empty(), "{edits:?}");
        assert!(info.contains("Invalid target name 'a:b:c'"), "{info}");
        assert!(info.contains("Consider canonicalizing"), "{info}");
    });
}

#[test]
fn external_workspaces_are_not_edited() {
    let files = [
        (
            "BUILD",
            "cc_library(name = \"x\", hdrs = [\"x.h\"])\n",
        ),
        ("x.h", ""),
    ];
    in_workspace(&files, || {
        let cwd = std::env::current_dir().unwrap();
        let base = cwd.file_name().unwrap().to_string_lossy().into_owned();
        write_file(
            &cwd,
            &format!("bazel-{base}/external/ws/BUILD"),
            "cc_library(name = \"ext\", hdrs = [\"ext.h\"])\n\
             cc_library(name = \"sloppy\", srcs = [\"s.cc\"], deps = [\":ext\"])\n",
        );
        let (edits, _info) = edits_for_project();
        assert!(edits.is_empty(), "external target was edited: {edits:?}");
    });
}

#[test]
fn edit_stream_is_deterministic() {
    let files = [
        (
            "BUILD",
            "cc_library(name = \"c\", hdrs = [\"c.h\"])\n\
             cc_library(name = \"d\", hdrs = [\"d.h\"])\n\
             cc_library(name = \"unused\")\n\
             cc_library(name = \"user\", srcs = [\"u.cc\"], deps = [\":unused\"])\n",
        ),
        ("c.h", ""),
        ("d.h", ""),
        ("u.cc", "#include \"d.h\"\n#include \"c.h\"\n"),
    ];
    in_workspace(&files, || {
        let (first, _) = edits_for_project();
        let (second, _) = edits_for_project();
        assert_eq!(first, second);
        assert_eq!(
            first,
            vec![
                "buildozer 'remove deps :unused' //:user",
                "buildozer 'add deps :c' //:user",
                "buildozer 'add deps :d' //:user",
            ]
        );
    });
}
