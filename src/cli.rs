//! Command-line interface module for episort.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing and the job/bulk invocation split
//! - Configuration loading and command-line overrides
//! - Logger setup
//! - Report rendering

use crate::config::{Config, ConfigError};
use crate::indexer::{IndexError, Indexer, JobContext, RunReport};
use crate::logging;
use crate::output::OutputFormatter;
use crate::placement::{Placer, StdFilesystem};
use clap::Parser;
use log::LevelFilter;
use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Sort TV episodes into a `show/Season NN/` library tree.
#[derive(Debug, Parser)]
#[command(
    name = "episort",
    version,
    about,
    override_usage = "episort [OPTIONS] <JOB_ID> <JOB_NAME> <PATH>\n       episort [OPTIONS] <SOURCE_DIR> [DEST_DIR]"
)]
pub struct Cli {
    /// `<job id> <job name> <path>` for a finished download, or
    /// `<source dir> [<destination dir>]` to sort a whole tree.
    #[arg(value_name = "ARGS", required = true, num_args = 1..=3)]
    pub args: Vec<OsString>,

    /// Report where files would go without touching the filesystem.
    #[arg(long)]
    pub dry_run: bool,

    /// Configuration file (defaults to .episortrc.toml, then ~/.config/episort/config.toml).
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Library root, overriding the configured one.
    #[arg(short, long, value_name = "DIR")]
    pub target: Option<PathBuf>,

    /// Append log output to this file instead of stderr.
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log debug messages.
    #[arg(short, long)]
    pub verbose: bool,

    /// Print the run report as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Errors surfaced by the command-line entry point.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error("Failed to open log file: {0}")]
    Logging(#[source] io::Error),

    #[error("Failed to render report: {0}")]
    Report(#[from] serde_json::Error),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Usage(_) => 2,
            _ => 1,
        }
    }
}

/// What the positional arguments ask for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// A download client reporting one finished job.
    Job { job: JobContext, path: PathBuf },
    /// Reconcile a whole source tree into the library.
    Bulk {
        source: PathBuf,
        target: Option<PathBuf>,
    },
}

impl Invocation {
    /// Interprets the positional arguments by count.
    ///
    /// # Examples
    ///
    /// ```
    /// use episort::cli::Invocation;
    /// use std::ffi::OsString;
    ///
    /// let args: Vec<OsString> = vec!["/downloads".into()];
    /// assert!(matches!(
    ///     Invocation::from_args(&args),
    ///     Ok(Invocation::Bulk { target: None, .. })
    /// ));
    /// ```
    pub fn from_args(args: &[OsString]) -> Result<Self, CliError> {
        match args {
            [source] => Ok(Invocation::Bulk {
                source: PathBuf::from(source),
                target: None,
            }),
            [source, target] => Ok(Invocation::Bulk {
                source: PathBuf::from(source),
                target: Some(PathBuf::from(target)),
            }),
            [id, name, path] => Ok(Invocation::Job {
                job: JobContext {
                    id: id.to_string_lossy().into_owned(),
                    name: name.to_string_lossy().into_owned(),
                },
                path: PathBuf::from(path),
            }),
            _ => Err(CliError::Usage(format!(
                "expected 1 to 3 arguments, got {}\nusage: episort <job id> <job name> <path>\n       episort <source dir> [<destination dir>]",
                args.len()
            ))),
        }
    }
}

/// Settings for a run after configuration and flags are merged.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub dry_run: bool,
    pub target: Option<PathBuf>,
}

/// Runs the CLI application with parsed arguments.
///
/// Loads configuration, installs the logger, runs the invocation and
/// prints the report. Per-file classification failures are part of a
/// successful run; only usage, configuration and filesystem errors are
/// returned.
pub fn run_cli(cli: Cli) -> Result<(), CliError> {
    let invocation = Invocation::from_args(&cli.args)?;
    let config = Config::load(cli.config.as_deref())?;

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        config.logging.level_filter()?
    };
    let log_file = cli.log_file.as_deref().or(config.logging.file.as_deref());
    logging::init(level, log_file).map_err(CliError::Logging)?;

    let options = RunOptions {
        dry_run: cli.dry_run,
        target: cli.target.clone(),
    };
    let report = run_invocation(&invocation, &config, &options)?;

    if cli.json {
        println!("{}", OutputFormatter::json(&report)?);
    } else {
        OutputFormatter::summary(&report, options.dry_run);
    }

    Ok(())
}

/// Runs one invocation against the library and returns its report.
///
/// The library root is, in order of preference: the bulk destination
/// argument, `options.target`, the configured target.
pub fn run_invocation(
    invocation: &Invocation,
    config: &Config,
    options: &RunOptions,
) -> Result<RunReport, CliError> {
    let filters = config.compile_filters()?;
    let placer = Placer::new(StdFilesystem).with_dry_run(options.dry_run);
    let fallback_target = options
        .target
        .clone()
        .unwrap_or_else(|| config.library.target.clone());

    let report = match invocation {
        Invocation::Job { job, path } => {
            let indexer = Indexer::new(placer, filters, fallback_target);
            indexer.index(Some(job), path)?
        }
        Invocation::Bulk { source, target } => {
            let library_root = target.clone().unwrap_or(fallback_target);
            let indexer = Indexer::new(placer, filters, library_root);
            indexer.index_dir(source)?
        }
    };

    Ok(report)
}
