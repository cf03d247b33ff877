//! Placement of classified episodes into the library tree.
//!
//! This module links (or, across devices, copies) a source file into
//! `<library>/<show>/Season NN/`. It creates the show and season directories
//! as needed and never overwrites an existing episode, so placing the same
//! file twice is a no-op.

use crate::classifier::EpisodeDescriptor;
use crate::naming::LibraryLocation;
use log::{debug, info};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Why a hard link could not be created.
#[derive(Debug, Error)]
pub enum LinkError {
    /// Source and destination live on different storage volumes.
    #[error("source and destination are on different devices")]
    CrossDevice,
    /// Any other I/O failure.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// The filesystem operations placement relies on.
pub trait Filesystem {
    fn exists(&self, path: &Path) -> bool;

    fn create_dir(&self, path: &Path) -> io::Result<()>;

    /// Creates `dst` as a hard link to `src`.
    ///
    /// Must report [`LinkError::CrossDevice`] when the two paths are on
    /// different volumes so that callers can fall back to copying.
    fn hard_link(&self, src: &Path, dst: &Path) -> Result<(), LinkError>;

    /// Copies `src` to `dst`, returning the number of bytes copied.
    fn copy_file(&self, src: &Path, dst: &Path) -> io::Result<u64>;
}

/// [`Filesystem`] backed by `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdFilesystem;

impl Filesystem for StdFilesystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_dir(&self, path: &Path) -> io::Result<()> {
        fs::create_dir(path)
    }

    fn hard_link(&self, src: &Path, dst: &Path) -> Result<(), LinkError> {
        fs::hard_link(src, dst).map_err(|e| match e.kind() {
            io::ErrorKind::CrossesDevices => LinkError::CrossDevice,
            _ => LinkError::Io(e),
        })
    }

    fn copy_file(&self, src: &Path, dst: &Path) -> io::Result<u64> {
        fs::copy(src, dst)
    }
}

/// Errors that can occur while placing an episode.
#[derive(Debug, Error)]
pub enum PlacementError {
    /// Failed to create a show or season directory.
    #[error("Failed to create directory {}: {source}", path.display())]
    DirectoryCreationFailed { path: PathBuf, source: io::Error },

    /// Hard linking failed for a reason other than crossing devices.
    #[error("Failed to link {} to {}: {source}", from.display(), to.display())]
    LinkFailed {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },

    /// The cross-device fallback copy failed.
    #[error("Failed to copy {} to {}: {source}", from.display(), to.display())]
    CopyFailed {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },
}

/// Result type for placement operations.
pub type PlacementResult<T> = Result<T, PlacementError>;

/// What placing a single episode did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacementOutcome {
    /// A hard link was created at the destination.
    Linked(PathBuf),
    /// The link crossed devices, so the file was copied instead.
    Copied(PathBuf),
    /// The destination already existed; nothing was touched.
    AlreadyPlaced(PathBuf),
    /// Dry run: the file would be placed here.
    Planned(PathBuf),
}

impl PlacementOutcome {
    /// The episode path inside the library.
    pub fn destination(&self) -> &Path {
        match self {
            PlacementOutcome::Linked(path)
            | PlacementOutcome::Copied(path)
            | PlacementOutcome::AlreadyPlaced(path)
            | PlacementOutcome::Planned(path) => path,
        }
    }
}

/// Links classified episodes into a library tree.
#[derive(Debug)]
pub struct Placer<F = StdFilesystem> {
    fs: F,
    dry_run: bool,
}

impl<F: Filesystem> Placer<F> {
    /// Creates a placer over the given filesystem.
    pub fn new(fs: F) -> Self {
        Self { fs, dry_run: false }
    }

    /// When set, destinations are computed and reported but nothing is written.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Places `source` at the library location described by `descriptor`.
    ///
    /// # Returns
    ///
    /// Returns the [`PlacementOutcome`] on success. A destination that
    /// already exists short-circuits to `AlreadyPlaced` without any
    /// filesystem mutation. A cross-device link failure is recovered by
    /// copying; every other failure is returned as a [`PlacementError`].
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use episort::classifier::classify;
    /// use episort::placement::{Placer, StdFilesystem};
    /// use std::path::Path;
    ///
    /// let source = Path::new("/downloads/Show.Name.S01E02.mkv");
    /// let descriptor = classify("Show.Name.S01E02.mkv").into_descriptor().unwrap();
    ///
    /// let placer = Placer::new(StdFilesystem);
    /// match placer.place(source, &descriptor, Path::new("/library")) {
    ///     Ok(outcome) => println!("placed at {}", outcome.destination().display()),
    ///     Err(e) => eprintln!("placement failed: {}", e),
    /// }
    /// ```
    pub fn place(
        &self,
        source: &Path,
        descriptor: &EpisodeDescriptor,
        library_root: &Path,
    ) -> PlacementResult<PlacementOutcome> {
        let location = LibraryLocation::resolve(library_root, descriptor);
        let episode_path = location.episode_path.clone();

        if self.fs.exists(&episode_path) {
            info!("episode already indexed {}", episode_path.display());
            return Ok(PlacementOutcome::AlreadyPlaced(episode_path));
        }

        if self.dry_run {
            info!(
                "would place {} -> {}",
                source.display(),
                episode_path.display()
            );
            return Ok(PlacementOutcome::Planned(episode_path));
        }

        self.ensure_dir(&location.show_dir)?;
        self.ensure_dir(&location.season_dir)?;

        debug!("linking {} -> {}", source.display(), episode_path.display());
        match self.fs.hard_link(source, &episode_path) {
            Ok(()) => Ok(PlacementOutcome::Linked(episode_path)),
            Err(LinkError::CrossDevice) => {
                debug!(
                    "link failed, copying {} -> {}",
                    source.display(),
                    episode_path.display()
                );
                self.fs
                    .copy_file(source, &episode_path)
                    .map_err(|e| PlacementError::CopyFailed {
                        from: source.to_path_buf(),
                        to: episode_path.clone(),
                        source: e,
                    })?;
                Ok(PlacementOutcome::Copied(episode_path))
            }
            Err(LinkError::Io(e)) => Err(PlacementError::LinkFailed {
                from: source.to_path_buf(),
                to: episode_path,
                source: e,
            }),
        }
    }

    fn ensure_dir(&self, path: &Path) -> PlacementResult<()> {
        if self.fs.exists(path) {
            return Ok(());
        }

        debug!("creating path {}", path.display());
        self.fs
            .create_dir(path)
            .map_err(|e| PlacementError::DirectoryCreationFailed {
                path: path.to_path_buf(),
                source: e,
            })
    }
}
