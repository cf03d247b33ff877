//! episort - sort downloaded TV episodes into a media library
//!
//! This library classifies release file names into show, season and episode,
//! and links (or copies) the files into a `show name/Season NN/` tree that
//! media servers can index. Classification is a heuristic over the file name
//! alone; no metadata is looked up.

pub mod classifier;
pub mod cli;
pub mod config;
pub mod indexer;
pub mod logging;
pub mod naming;
pub mod output;
pub mod placement;

pub use classifier::{Classification, EpisodeDescriptor, MatchStage, classify};
pub use config::{CompiledFilters, Config, ConfigError};
pub use indexer::{Indexer, JobContext, RunReport};
pub use placement::{Filesystem, PlacementOutcome, Placer, StdFilesystem};

pub use cli::{Cli, run_cli};
