//! Walks downloads and places every recognisable episode into the library.
//!
//! Each file is filtered, classified and placed on its own; nothing learned
//! from one file is carried over to its siblings. A file that cannot be
//! classified is logged and skipped. Filesystem failures other than a
//! cross-device link abort the run.

use crate::classifier::{Classification, classify};
use crate::config::CompiledFilters;
use crate::naming::normalize_show_name;
use crate::placement::{Filesystem, PlacementError, PlacementOutcome, Placer, StdFilesystem};
use log::{debug, error, info};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Errors that abort an indexing run.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error(transparent)]
    Placement(#[from] PlacementError),

    /// A directory could not be read while walking the source tree.
    #[error("Failed to walk {}: {source}", root.display())]
    Walk {
        root: PathBuf,
        source: walkdir::Error,
    },
}

/// Result type for indexing operations.
pub type IndexResult<T> = Result<T, IndexError>;

/// Identifies the download job that triggered a single-item run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobContext {
    pub id: String,
    pub name: String,
}

impl fmt::Display for JobContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.id, self.name)
    }
}

/// A path plus the job it belongs to, for log messages.
struct Subject<'a> {
    job: Option<&'a JobContext>,
    path: &'a Path,
}

impl fmt::Display for Subject<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.job {
            Some(job) => write!(f, "[{}] {}", job, self.path.display()),
            None => write!(f, "{}", self.path.display()),
        }
    }
}

/// What happened to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileDisposition {
    /// Classified and placed (or planned, in a dry run).
    Placed {
        show: String,
        outcome: PlacementOutcome,
    },
    /// Filtered out before classification.
    Skipped,
    /// No matcher recognised the file name.
    Unmatched,
}

/// Totals for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub linked: usize,
    pub copied: usize,
    pub already_placed: usize,
    pub planned: usize,
    pub skipped: usize,
    pub unmatched: Vec<PathBuf>,
    /// Episodes per normalized show name.
    pub shows: BTreeMap<String, usize>,
}

impl RunReport {
    /// Folds one file's disposition into the totals.
    pub fn record(&mut self, path: &Path, disposition: &FileDisposition) {
        match disposition {
            FileDisposition::Placed { show, outcome } => {
                match outcome {
                    PlacementOutcome::Linked(_) => self.linked += 1,
                    PlacementOutcome::Copied(_) => self.copied += 1,
                    PlacementOutcome::AlreadyPlaced(_) => self.already_placed += 1,
                    PlacementOutcome::Planned(_) => self.planned += 1,
                }
                *self.shows.entry(show.clone()).or_insert(0) += 1;
            }
            FileDisposition::Skipped => self.skipped += 1,
            FileDisposition::Unmatched => self.unmatched.push(path.to_path_buf()),
        }
    }

    /// Files that ended up (or would end up) in the library.
    pub fn placed(&self) -> usize {
        self.linked + self.copied + self.already_placed + self.planned
    }

    /// Every file the run looked at.
    pub fn total(&self) -> usize {
        self.placed() + self.skipped + self.unmatched.len()
    }
}

/// Classifies and places files under a library root.
#[derive(Debug)]
pub struct Indexer<F = StdFilesystem> {
    placer: Placer<F>,
    filters: CompiledFilters,
    library_root: PathBuf,
}

impl<F: Filesystem> Indexer<F> {
    pub fn new(placer: Placer<F>, filters: CompiledFilters, library_root: PathBuf) -> Self {
        Self {
            placer,
            filters,
            library_root,
        }
    }

    /// Indexes a single job's payload, which may be a file or a directory.
    ///
    /// A directory is walked and each file inside it indexed on its own;
    /// the directory's own name is never classified.
    pub fn index(&self, job: Option<&JobContext>, path: &Path) -> IndexResult<RunReport> {
        let mut report = RunReport::default();

        if self.filters.is_sidecar(path) {
            debug!("skipping sidecar {}", Subject { job, path });
            report.skipped += 1;
            return Ok(report);
        }

        info!("indexing {}", Subject { job, path });

        if path.is_dir() {
            return self.walk(job, path);
        }

        let disposition = self.index_file(job, path)?;
        report.record(path, &disposition);
        Ok(report)
    }

    /// Indexes every file below `root`.
    pub fn index_dir(&self, root: &Path) -> IndexResult<RunReport> {
        info!(
            "indexing {} into {}",
            root.display(),
            self.library_root.display()
        );
        self.walk(None, root)
    }

    fn walk(&self, job: Option<&JobContext>, root: &Path) -> IndexResult<RunReport> {
        let mut report = RunReport::default();

        let library = self.library_root.canonicalize().ok();
        let entries = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            // The library may live inside the source tree; don't re-index it.
            .filter_entry(|entry| {
                !entry.file_type().is_dir()
                    || library.is_none()
                    || entry.path().canonicalize().ok() != library
            });

        for entry in entries {
            let entry = entry.map_err(|e| IndexError::Walk {
                root: root.to_path_buf(),
                source: e,
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            let disposition = self.index_file(job, entry.path())?;
            report.record(entry.path(), &disposition);
        }

        Ok(report)
    }

    /// Filters, classifies and places one file.
    ///
    /// A classification failure is logged and reported as
    /// [`FileDisposition::Unmatched`]; only placement failures are errors.
    pub fn index_file(&self, job: Option<&JobContext>, path: &Path) -> IndexResult<FileDisposition> {
        let subject = Subject { job, path };

        if let Some(reason) = self.filters.skip_reason(path) {
            debug!("skipping {} ({:?})", subject, reason);
            return Ok(FileDisposition::Skipped);
        }

        let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
            error!("could not match {}: file name is not valid UTF-8", subject);
            return Ok(FileDisposition::Unmatched);
        };

        let descriptor = match classify(file_name) {
            Classification::Matched(descriptor) => descriptor,
            Classification::NoMatch => {
                error!("could not match {}", subject);
                return Ok(FileDisposition::Unmatched);
            }
        };

        let show = normalize_show_name(&descriptor.show_name);
        info!(
            "found {} season {} episode {} as {} ({})",
            show, descriptor.season, descriptor.episode, descriptor.target_file_name, descriptor.stage
        );
        if let Some(last) = &descriptor.last_episode {
            debug!("multi-episode release ending at episode {}", last);
        }

        let outcome = self
            .placer
            .place(path, &descriptor, &self.library_root)?;

        match &outcome {
            PlacementOutcome::Linked(dest) => info!("linked {} -> {}", subject, dest.display()),
            PlacementOutcome::Copied(dest) => info!("copied {} -> {}", subject, dest.display()),
            PlacementOutcome::AlreadyPlaced(_) | PlacementOutcome::Planned(_) => {}
        }

        Ok(FileDisposition::Placed { show, outcome })
    }
}
