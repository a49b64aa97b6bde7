//! Binary entry point for the dnav CLI.
//!
//! Output discipline: the selected command's primary output goes to stdout;
//! diagnostics and file banners go to the info stream (stderr, or swallowed
//! with `-q`). With no command at all, parsing is the objective and parse
//! errors are the primary output. The exit status is the number of BUILD
//! files with parse errors, or 1 for setup failures.

use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;

use depnav::cli::Cli;
use depnav::dwyu::print_dependency_edits;
use depnav::error::SetupError;
use depnav::headers::print_library_headers;
use depnav::project::{collect_build_files, print_project, ParsedProject, Stat};

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // Usage failures exit 1; help/version output is not a failure.
            let code = if err.use_stderr() { 1 } else { 0 };
            let _ = err.print();
            return ExitCode::from(code);
        }
    };
    init_tracing(cli.verbose);
    match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(1)
        }
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default_level = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_env("DEPNAV_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<ExitCode, SetupError> {
    if let Some(dir) = &cli.chdir {
        std::env::set_current_dir(dir).map_err(|source| SetupError::ChangeDir {
            dir: dir.clone(),
            source,
        })?;
    }
    let include_external = !cli.exclude_external;

    let mut stdout = io::stdout().lock();
    let mut info: Box<dyn Write> = if cli.quiet {
        Box::new(io::sink())
    } else {
        Box::new(io::stderr())
    };

    if cli.list_build_files {
        // This one doesn't need to parse the project.
        let mut stat = Stat::default();
        for file in collect_build_files(include_external, &mut stat) {
            let _ = writeln!(stdout, "{}", file.display());
        }
        if cli.verbose {
            eprintln!("Walked through {}", stat.display("files/dirs"));
        }
        return Ok(ExitCode::SUCCESS);
    }

    // All other commands parse the project first. With no command, the
    // parse itself is the objective and its errors are the primary output;
    // otherwise they go to the info stream.
    let no_command = !cli.print_parse_tree && !cli.library_headers && !cli.dependency_edits;
    let project = if no_command {
        ParsedProject::from_filesystem(include_external, &mut stdout)
    } else {
        ParsedProject::from_filesystem(include_external, &mut info)
    };

    if cli.print_parse_tree {
        print_project(&mut stdout, &mut info, &project, cli.only_errors);
    } else if cli.library_headers {
        print_library_headers(&mut stdout, &mut info, &project);
    } else if cli.dependency_edits {
        print_dependency_edits(&project, &mut stdout, &mut info);
    }

    if cli.verbose {
        // Explicitly requested; bypasses -q.
        eprintln!(
            "Walked through {} to collect BUILD files.",
            project.collect_stat.display("files/dirs")
        );
        eprintln!(
            "Parsed {}; {} with issues",
            project.parse_stat.display("BUILD files"),
            project.error_count
        );
    }

    Ok(ExitCode::from(project.error_count.min(255) as u8))
}
