//! Configuration loading and file filtering.
//!
//! Configuration is read from a TOML file. Every section is optional:
//!
//! ```toml
//! [library]
//! target = "/mnt/media/tv"
//!
//! [filters]
//! skip_hidden = false
//! sidecar_extensions = ["nfo"]
//!
//! [filters.exclude]
//! patterns = ["**/Sample/**"]
//! regex = ["(?i)\\bsample\\b"]
//!
//! [logging]
//! level = "info"
//! file = "episort.log"
//! ```

use glob::Pattern;
use log::LevelFilter;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during configuration loading and compilation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),
    /// Invalid glob pattern provided.
    #[error("Invalid glob pattern '{pattern}': {reason}")]
    InvalidGlobPattern { pattern: String, reason: String },
    /// Invalid regex pattern provided.
    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern { pattern: String, reason: String },
    /// Unknown log level name.
    #[error("Invalid log level '{0}': expected off, error, warn, info, debug or trace")]
    InvalidLogLevel(String),
    /// IO error while reading configuration.
    #[error("IO error reading configuration: {0}")]
    IoError(#[from] std::io::Error),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub library: LibraryConfig,
    pub filters: FilterRules,
    pub logging: LoggingConfig,
}

/// Where the library tree lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Destination root used when none is given on the command line.
    pub target: PathBuf,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            target: PathBuf::from("sorted"),
        }
    }
}

/// Rules deciding which files are handed to the classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterRules {
    /// Skip files whose name starts with a dot.
    pub skip_hidden: bool,

    /// Non-video companion files skipped before classification.
    pub sidecar_extensions: Vec<String>,

    pub exclude: ExcludeRules,
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            skip_hidden: false,
            sidecar_extensions: vec!["nfo".to_string()],
            exclude: ExcludeRules::default(),
        }
    }
}

/// Rules for excluding files from indexing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExcludeRules {
    /// Glob patterns matched against the full path (e.g. `**/Sample/**`).
    pub patterns: Vec<String>,

    /// Regex patterns matched against the file name.
    pub regex: Vec<String>,
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of `off`, `error`, `warn`, `info`, `debug`, `trace`.
    pub level: String,

    /// Append log records to this file instead of stderr.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Parses the configured level name.
    pub fn level_filter(&self) -> Result<LevelFilter, ConfigError> {
        self.level
            .parse()
            .map_err(|_| ConfigError::InvalidLogLevel(self.level.clone()))
    }
}

impl Config {
    /// Load configuration from a file, with fallback to defaults.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.episortrc.toml` in the current directory
    /// 3. Look for `~/.config/episort/config.toml` in home directory
    /// 4. Fall back to default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but
    /// cannot be read, or if any file found is not valid TOML.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(".episortrc.toml");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("episort")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Compile the filter rules into matchers.
    ///
    /// # Errors
    ///
    /// Returns an error if any regex or glob patterns are invalid.
    pub fn compile_filters(&self) -> Result<CompiledFilters, ConfigError> {
        CompiledFilters::new(&self.filters)
    }
}

/// Why a file was not handed to the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Sidecar,
    Hidden,
    ExcludedPattern,
    ExcludedRegex,
}

/// Filter rules with every pattern pre-compiled.
#[derive(Debug)]
pub struct CompiledFilters {
    skip_hidden: bool,
    sidecar_extensions: Vec<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
}

impl Default for CompiledFilters {
    fn default() -> Self {
        Self::without_excludes(&FilterRules::default())
    }
}

impl CompiledFilters {
    /// Takes the rules that need no compilation; exclude lists start empty.
    fn without_excludes(rules: &FilterRules) -> Self {
        Self {
            skip_hidden: rules.skip_hidden,
            sidecar_extensions: rules
                .sidecar_extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            exclude_patterns: Vec::new(),
            exclude_regexes: Vec::new(),
        }
    }

    fn new(rules: &FilterRules) -> Result<Self, ConfigError> {
        let exclude_patterns = rules
            .exclude
            .patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|e| ConfigError::InvalidGlobPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let exclude_regexes = rules
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            exclude_patterns,
            exclude_regexes,
            ..Self::without_excludes(rules)
        })
    }

    /// Returns why `file_path` should be skipped, or `None` to index it.
    ///
    /// Checks run in order: sidecar extension, hidden file, exclude globs,
    /// exclude regexes.
    pub fn skip_reason(&self, file_path: &Path) -> Option<SkipReason> {
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if self.is_sidecar(file_path) {
            return Some(SkipReason::Sidecar);
        }

        if self.skip_hidden && file_name.starts_with('.') {
            return Some(SkipReason::Hidden);
        }

        if self
            .exclude_patterns
            .iter()
            .any(|pattern| pattern.matches_path(file_path))
        {
            return Some(SkipReason::ExcludedPattern);
        }

        if self
            .exclude_regexes
            .iter()
            .any(|regex| regex.is_match(&file_name))
        {
            return Some(SkipReason::ExcludedRegex);
        }

        None
    }

    /// Check if the file carries a sidecar extension (case-insensitive).
    pub fn is_sidecar(&self, file_path: &Path) -> bool {
        file_path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .is_some_and(|ext| self.sidecar_extensions.contains(&ext))
    }
}
