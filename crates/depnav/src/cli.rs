//! CLI argument parsing with clap derive.
//!
//! The surface is a handful of single-letter flags: a few global options
//! and one command flag at a time (`-L`, `-P`, `-H`, `-D`). With no
//! command, the tool parses the project silently and the exit status is
//! the number of files with parse errors.

use clap::Parser;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Navigate Bazel-style BUILD files and their dependency graph.
#[derive(Parser, Debug)]
#[command(name = "dnav")]
#[command(version = VERSION)]
#[command(about = "Navigate BUILD files; align deps with used headers (DWYU)")]
pub struct Cli {
    /// Project base directory (default: current dir).
    #[arg(short = 'C', value_name = "DIR")]
    pub chdir: Option<String>,

    /// Do not read BUILD files of external projects.
    #[arg(short = 'x')]
    pub exclude_external: bool,

    /// Quiet: don't print info messages to stderr.
    #[arg(short = 'q')]
    pub quiet: bool,

    /// Verbose: print stats.
    #[arg(short = 'v')]
    pub verbose: bool,

    /// List all BUILD files found in the project.
    #[arg(short = 'L', group = "command")]
    pub list_build_files: bool,

    /// Print the parse trees reconstructed from the ASTs.
    #[arg(short = 'P', group = "command")]
    pub print_parse_tree: bool,

    /// With -P: only print files that had parse errors.
    #[arg(short = 'e', requires = "print_parse_tree")]
    pub only_errors: bool,

    /// Print the table of header files -> targets that define them.
    #[arg(short = 'H', group = "command")]
    pub library_headers: bool,

    /// DWYU: Depend on What You Use (emit buildozer edits).
    #[arg(short = 'D', group = "command")]
    pub dependency_edits: bool,
}
