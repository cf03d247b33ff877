//! Log backend setup.

use env_logger::{Builder, Target, WriteStyle};
use log::LevelFilter;
use std::fs::OpenOptions;
use std::io;
use std::path::Path;

/// Installs the global logger.
///
/// `RUST_LOG`, when set, overrides `level`. Records go to stderr, or are
/// appended to `log_file` when one is given. Installing twice is harmless;
/// the first logger stays in place.
pub fn init(level: LevelFilter, log_file: Option<&Path>) -> io::Result<()> {
    let mut builder = Builder::new();
    builder.filter_level(level);

    if std::env::var_os("RUST_LOG").is_some() {
        builder.parse_default_env();
    }

    match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder
                .target(Target::Pipe(Box::new(file)))
                .write_style(WriteStyle::Never);
        }
        None => {
            builder.target(Target::Stderr);
        }
    }

    if builder.try_init().is_err() {
        log::debug!("logger already installed, keeping the existing one");
    }

    Ok(())
}
