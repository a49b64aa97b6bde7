//! Discover and parse all BUILD files of a workspace.
//!
//! Discovery walks the current directory (skipping `_tmp` and `.git`, never
//! following symlinks, so bazel's own output tree stays out of scope) and,
//! when externals are included, the `bazel-<dir>/external` symlink tree
//! with symlink following enabled. Every `BUILD` / `BUILD.bazel` file is
//! parsed into one shared node arena; per-file errors are recorded as data
//! and never abort the load.

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use depnav_starlark::{printer, LineColumnMap, NodeArena, NodeId, Parser, Scanner};
use walkdir::{DirEntry, WalkDir};

use crate::bazel::BazelPackage;

/// Counters for one load phase.
#[derive(Debug, Default, Clone)]
pub struct Stat {
    pub count: usize,
    pub duration: Duration,
    pub bytes_processed: Option<usize>,
}

impl Stat {
    /// Readable one-liner; `thing_name` describes what was counted.
    pub fn display(&self, thing_name: &str) -> String {
        let ms = self.duration.as_secs_f64() * 1000.0;
        match self.bytes_processed {
            Some(bytes) => {
                let kib = bytes as f64 / 1024.0;
                let secs = self.duration.as_secs_f64();
                let mb_per_sec = if secs > 0.0 {
                    bytes as f64 / 1_000_000.0 / secs
                } else {
                    0.0
                };
                format!(
                    "{} {} with {:.2} KiB in {:.3}ms ({:.2} MB/sec)",
                    self.count, thing_name, kib, ms, mb_per_sec
                )
            }
            None => format!("{} {} in {:.3}ms", self.count, thing_name, ms),
        }
    }
}

/// One parsed BUILD file. The AST's spans point into `content`; both share
/// the project's lifetime.
#[derive(Debug)]
pub struct FileContent {
    pub filename: String,
    pub content: String,
    pub line_map: LineColumnMap,
    pub package: BazelPackage,
    /// Root statement list; nodes owned by the project arena.
    pub ast: Option<NodeId>,
    /// Parser diagnostics, empty for a clean parse.
    pub errors: String,
}

/// A whole workspace's BUILD files plus the arena all their nodes live in.
pub struct ParsedProject {
    pub arena: NodeArena,
    pub files: BTreeMap<String, FileContent>,
    pub collect_stat: Stat,
    pub parse_stat: Stat,
    /// Files that could not be read or did not parse cleanly.
    pub error_count: usize,
}

impl ParsedProject {
    pub fn new() -> Self {
        ParsedProject {
            arena: NodeArena::new(),
            files: BTreeMap::new(),
            collect_stat: Stat::default(),
            parse_stat: Stat::default(),
            error_count: 0,
        }
    }

    /// Parse the project from the current directory: the main workspace
    /// and, if requested, all `bazel-<dir>/external/*` sub-projects.
    /// Parse diagnostics go to `error_out`.
    pub fn from_filesystem(include_external: bool, error_out: &mut dyn Write) -> Self {
        let mut collect_stat = Stat::default();
        let build_files = collect_build_files(include_external, &mut collect_stat);
        let external_prefix = format!("{}/", external_project_dir().display());
        let mut project = Self::from_files(&build_files, &external_prefix, error_out);
        project.collect_stat = collect_stat;
        project
    }

    /// Parse an explicit list of BUILD files. Files under `external_prefix`
    /// are attributed to their `@workspace`.
    pub fn from_files(
        build_files: &[PathBuf],
        external_prefix: &str,
        error_out: &mut dyn Write,
    ) -> Self {
        let mut project = ParsedProject::new();
        let start = Instant::now();
        let mut bytes_processed = 0usize;
        for path in build_files {
            let filename = path.display().to_string();
            let content = match fs::read_to_string(path) {
                Ok(content) => content,
                Err(err) => {
                    let _ = writeln!(error_out, "Could not read {filename}: {err}");
                    project.error_count += 1;
                    continue;
                }
            };
            project.parse_stat.count += 1;
            bytes_processed += content.len();
            if !project.add_file(&filename, content, external_prefix) {
                let _ = write!(error_out, "{}", project.files[&filename].errors);
                project.error_count += 1;
            }
        }
        if bytes_processed > 0 {
            project.parse_stat.bytes_processed = Some(bytes_processed);
        }
        project.parse_stat.duration = start.elapsed();
        project
    }

    /// Parse one file's content into the project. Returns false when the
    /// parse produced diagnostics (recorded on the file either way).
    pub fn add_file(&mut self, filename: &str, content: String, external_prefix: &str) -> bool {
        if self.files.contains_key(filename) {
            tracing::debug!("already seen {filename}");
            return true;
        }
        tracing::debug!("parsing {filename}");
        let package = package_for_build_file(filename, external_prefix);
        let scanner = Scanner::new(&content);
        let mut parser = Parser::new(scanner, &mut self.arena, filename);
        let ast = parser.parse();
        let clean = !parser.parse_error();
        let (line_map, errors) = parser.into_parts();
        self.files.insert(
            filename.to_string(),
            FileContent {
                filename: filename.to_string(),
                content,
                line_map,
                package,
                ast: Some(ast),
                errors,
            },
        );
        clean
    }
}

impl Default for ParsedProject {
    fn default() -> Self {
        Self::new()
    }
}

/// The symlink bazel leaves behind for external workspaces:
/// `./bazel-<basename(cwd)>/external`.
fn external_project_dir() -> PathBuf {
    let project_dir_name = std::env::current_dir()
        .ok()
        .and_then(|dir| dir.file_name().map(|name| name.to_string_lossy().into_owned()))
        .unwrap_or_default();
    PathBuf::from(format!("./bazel-{project_dir_name}/external"))
}

fn is_build_file_name(name: &OsStr) -> bool {
    name == "BUILD" || name == "BUILD.bazel"
}

/// `_tmp` is scratch, `.git` is lots of irrelevant stuff.
fn is_relevant_dir(entry: &DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return true;
    }
    !matches!(entry.file_name().to_str(), Some("_tmp") | Some(".git"))
}

fn scan_tree(
    root: &Path,
    follow_symlinks: bool,
    walked: &mut usize,
    build_files: &mut Vec<PathBuf>,
) {
    let walk = WalkDir::new(root)
        .follow_links(follow_symlinks)
        .into_iter()
        .filter_entry(is_relevant_dir);
    for entry in walk {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::debug!("skipping unreadable entry: {err}");
                continue;
            }
        };
        *walked += 1;
        if entry.file_type().is_file() && is_build_file_name(entry.file_name()) {
            build_files.push(entry.path().to_path_buf());
        }
    }
}

/// Collect all BUILD files below the current directory; with
/// `include_external` also below the bazel external-workspace tree, where
/// following symlinks is required (the workspace roots are symlinks).
/// Updates `stat` with entries walked and time taken.
pub fn collect_build_files(include_external: bool, stat: &mut Stat) -> Vec<PathBuf> {
    let start = Instant::now();
    let mut build_files = Vec::new();
    let mut walked = 0usize;

    scan_tree(Path::new("."), false, &mut walked, &mut build_files);
    if include_external {
        scan_tree(&external_project_dir(), true, &mut walked, &mut build_files);
    }

    stat.count = walked;
    stat.duration = start.elapsed();
    build_files
}

/// `./foo/bar/baz/BUILD.bazel` turns into `foo/bar/baz`.
fn target_path_from_build_file(file: &str) -> &str {
    let dir = match file.rfind('/') {
        Some(slash) => &file[..slash],
        None => "",
    };
    dir.trim_start_matches(['.', '/'])
}

fn package_for_build_file(filename: &str, external_prefix: &str) -> BazelPackage {
    if let Some(below_external) = filename.strip_prefix(external_prefix) {
        let (workspace, rest) = below_external.split_once('/').unwrap_or((below_external, ""));
        return BazelPackage {
            project: format!("@{workspace}"),
            path: target_path_from_build_file(rest).to_string(),
        };
    }
    BazelPackage {
        project: String::new(),
        path: target_path_from_build_file(filename).to_string(),
    }
}

/// Print the project as reconstructed from the ASTs. File banners and
/// recorded errors go to `info_out`, the trees themselves to `out`. With
/// `only_files_with_errors`, clean files are skipped.
pub fn print_project(
    out: &mut dyn Write,
    info_out: &mut dyn Write,
    project: &ParsedProject,
    only_files_with_errors: bool,
) {
    for (filename, file) in &project.files {
        if only_files_with_errors && file.errors.is_empty() {
            continue;
        }
        let _ = writeln!(info_out, "------- file {filename}");
        let _ = write!(info_out, "{}", file.errors);
        let Some(ast) = file.ast else { continue };
        let _ = writeln!(
            out,
            "{} = {}",
            file.package,
            printer::print_node(&project.arena, &file.content, ast)
        );
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Build a project from in-memory `(filename, content)` pairs; names
    /// under `./bazel-proj/external/` become external packages.
    pub(crate) fn project_from_sources(sources: &[(&str, &str)]) -> ParsedProject {
        let mut project = ParsedProject::new();
        for (filename, content) in sources {
            project.parse_stat.count += 1;
            if !project.add_file(filename, content.to_string(), "./bazel-proj/external/") {
                project.error_count += 1;
            }
        }
        project
    }
}
