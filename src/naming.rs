//! Rendering of classified episodes into library path components.
//!
//! These are pure string transforms; nothing here touches the filesystem.

use crate::classifier::EpisodeDescriptor;
use std::path::{Path, PathBuf};

/// Turns a raw show prefix into the show directory name.
///
/// Trailing dots are dropped, the name is lower-cased, `.` and `_`
/// separators become spaces and surrounding whitespace is trimmed.
///
/// # Examples
///
/// ```
/// use episort::naming::normalize_show_name;
///
/// assert_eq!(normalize_show_name("How.I.Met.Your.Mother."), "how i met your mother");
/// assert_eq!(normalize_show_name("Doctor_Who_2005"), "doctor who 2005");
/// ```
pub fn normalize_show_name(raw: &str) -> String {
    raw.trim_end_matches('.')
        .to_lowercase()
        .replace(['.', '_'], " ")
        .trim()
        .to_string()
}

/// Returns the season directory name, padding single-digit seasons.
///
/// # Examples
///
/// ```
/// use episort::naming::season_directory;
///
/// assert_eq!(season_directory("4"), "Season 04");
/// assert_eq!(season_directory("12"), "Season 12");
/// assert_eq!(season_directory("2014"), "Season 2014");
/// ```
pub fn season_directory(season: &str) -> String {
    format!("Season {season:0>2}")
}

/// Where a classified episode lives inside a library root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryLocation {
    /// `<root>/<show name>`
    pub show_dir: PathBuf,
    /// `<root>/<show name>/Season NN`
    pub season_dir: PathBuf,
    /// `<root>/<show name>/Season NN/<target file name>`
    pub episode_path: PathBuf,
}

impl LibraryLocation {
    /// Computes the location of `descriptor` under `library_root`.
    pub fn resolve(library_root: &Path, descriptor: &EpisodeDescriptor) -> Self {
        let show_dir = library_root.join(normalize_show_name(&descriptor.show_name));
        let season_dir = show_dir.join(season_directory(&descriptor.season));
        let episode_path = season_dir.join(&descriptor.target_file_name);

        Self {
            show_dir,
            season_dir,
            episode_path,
        }
    }
}
