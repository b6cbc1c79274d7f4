//! reference_getter CLI binary
//!
//! This is the main entry point for the reference_getter command-line interface.
//! The CLI is a thin adapter over the library - NO lookup logic is implemented here.

use reference_getter::cli::{try_parse_args, Cli, USAGE};
use reference_getter::lookup::{run_lookup, LookupOptions};
use reference_getter::program::config::ProjectConfig;
use reference_getter::{report, RefError};
use std::io::Write;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = match try_parse_args(std::env::args_os()) {
        Ok(cli) => cli,
        Err(e) => {
            // help and version land here too
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    // Initialize logger if verbose
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug"))
            .init();
    }

    let Some((repo_path, location)) = cli.positionals() else {
        eprintln!("{}", USAGE);
        return ExitCode::from(1);
    };

    let result = load_options(&cli).and_then(|options| run_lookup(repo_path, location, &options));

    let stdout = std::io::stdout();
    let stderr = std::io::stderr();
    match result {
        Ok(references) => {
            let mut out = stdout.lock();
            let written = if cli.json {
                report::write_references_json(&mut out, &references)
            } else {
                report::write_references(&mut out, &references)
            };
            match written.and_then(|_| out.flush().map_err(RefError::from)) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    ExitCode::from(1)
                }
            }
        }
        Err(e) => {
            let mut err = stderr.lock();
            let _ = if cli.json {
                report::write_error_json(&mut err, &e)
            } else {
                report::write_error(&mut err, &e)
            };
            ExitCode::from(1)
        }
    }
}

/// Build lookup options from the configuration file and `--exclude` flags.
fn load_options(cli: &Cli) -> Result<LookupOptions, RefError> {
    let config = match &cli.config {
        Some(path) => ProjectConfig::load(path)?,
        None => ProjectConfig::default(),
    };
    Ok(LookupOptions {
        config,
        exclude: cli.exclude.clone(),
    })
}
