//! Episode classification from release file names.
//!
//! Release groups name their files in several incompatible ways. The
//! classifier tries a fixed cascade of matchers, from the most explicit
//! marker to the most speculative guess, and stops at the first one that
//! yields both a season and an episode:
//!
//! 1. `Broadchurch.S01E06.PROPER.HDTV.x264-TLA.mp4` (explicit marker)
//! 2. `Broadchurch.1x08.HDTV.x264-FoV.mp4` or `HIMYM.S09E23-E24.mp4`
//! 3. `The.Colbert.Report.2014.03.31.Biz.Stone.HDTV.x264-2HD.mp4` (datestamp)
//! 4. `madam.secretary.416.hdtv-lol.mkv` (bare episode count)
//!
//! # Examples
//!
//! ```
//! use episort::classifier::{classify, MatchStage};
//!
//! let descriptor = classify("Show.Name.S03E07.720p.mkv")
//!     .into_descriptor()
//!     .expect("explicit marker should match");
//! assert_eq!(descriptor.show_name, "Show.Name");
//! assert_eq!(descriptor.season, "03");
//! assert_eq!(descriptor.episode, "07");
//! assert_eq!(descriptor.stage, MatchStage::Explicit);
//! ```

use crate::naming::normalize_show_name;
use log::{debug, warn};
use regex::{Captures, Regex};
use std::fmt;
use std::sync::LazyLock;

// Digit classes are ASCII only; `\d` would also accept `４` or `٤`, which
// neither slice by byte nor belong in a `Season NN` directory.

/// `<show>S<season>E<episode>`, anywhere in the name.
static EXPLICIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*)[Ss]([0-9]+)[Ee]([0-9]+)").expect("explicit marker regex is valid")
});

/// `<show>S<season>E<episode>[-E<last>]` or `<show><season>x<episode>`.
///
/// The numeric prefix must be empty or end on a non-digit, otherwise the
/// greedy prefix would steal leading season digits (`Show.12x08`).
static ALTERNATIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(.*)[Ss]([0-9]+)[Ee]([0-9]+)(?:-[Ee]([0-9]+))?|(.*[^0-9])?([0-9]+)x([0-9]+))")
        .expect("alternative marker regex is valid")
});

/// `<show>.<year>.<month>.<day>.`
static DATESTAMP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*)\.([0-9]+)\.([0-9]+)\.([0-9]+)\.").expect("datestamp regex is valid")
});

/// `<show>.<count>.`
static EPISODE_COUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*)\.([0-9]+)\.").expect("episode count regex is valid"));

/// The matcher that produced a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchStage {
    /// `S03E07` anywhere in the name.
    Explicit,
    /// `S09E23-E24` or `1x08`.
    Alternative,
    /// `2014.03.31` broadcast date.
    Datestamp,
    /// `416` read as season 4, episode 16.
    EpisodeCount,
}

impl fmt::Display for MatchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MatchStage::Explicit => "explicit marker",
            MatchStage::Alternative => "alternative marker",
            MatchStage::Datestamp => "datestamp",
            MatchStage::EpisodeCount => "episode count",
        };
        f.write_str(name)
    }
}

/// Show, season and episode recovered from a single file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeDescriptor {
    /// Raw show prefix with trailing dots removed, e.g. `Show.Name`.
    pub show_name: String,
    /// Season digits exactly as they appeared (`03`, `4`, `2014`).
    pub season: String,
    /// Episode digits exactly as they appeared (`07`, `16`, `0331`).
    pub episode: String,
    /// File name to use inside the season directory.
    pub target_file_name: String,
    /// Which matcher recognised the name.
    pub stage: MatchStage,
    /// Closing episode of a multi-episode release (`S09E23-E24` gives `24`).
    pub last_episode: Option<String>,
}

impl EpisodeDescriptor {
    /// Builds a descriptor, refusing empty show, season or episode parts.
    ///
    /// A show prefix made only of separators (`___.`) counts as empty, since
    /// it would normalize to an empty library directory name.
    fn build(
        stage: MatchStage,
        raw_show: &str,
        season: &str,
        episode: &str,
        target_file_name: String,
    ) -> Option<Self> {
        let show_name = raw_show.trim_end_matches('.');
        if normalize_show_name(show_name).is_empty() || season.is_empty() || episode.is_empty() {
            return None;
        }

        Some(Self {
            show_name: show_name.to_string(),
            season: season.to_string(),
            episode: episode.to_string(),
            target_file_name,
            stage,
            last_episode: None,
        })
    }
}

/// Result of running the matcher cascade over a file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// A matcher produced a complete descriptor.
    Matched(EpisodeDescriptor),
    /// No matcher's structural condition held.
    NoMatch,
}

impl Classification {
    /// Consumes the classification, returning the descriptor if any.
    pub fn into_descriptor(self) -> Option<EpisodeDescriptor> {
        match self {
            Classification::Matched(descriptor) => Some(descriptor),
            Classification::NoMatch => None,
        }
    }
}

type Matcher = fn(&str) -> Option<EpisodeDescriptor>;

/// Matchers in the order they are tried.
const CASCADE: [(MatchStage, Matcher); 4] = [
    (MatchStage::Explicit, match_explicit),
    (MatchStage::Alternative, match_alternative),
    (MatchStage::Datestamp, match_datestamp),
    (MatchStage::EpisodeCount, match_episode_count),
];

/// Classifies a file's base name (extension included).
///
/// Each matcher is consulted only when the previous one failed, either
/// because its pattern did not match or because it matched without
/// supplying both a season and an episode.
pub fn classify(file_name: &str) -> Classification {
    for (stage, matcher) in CASCADE {
        if let Some(descriptor) = matcher(file_name) {
            debug!(
                "{} matched {}: show={:?} season={} episode={}",
                stage, file_name, descriptor.show_name, descriptor.season, descriptor.episode
            );
            return Classification::Matched(descriptor);
        }
        debug!("no {} match for {}, trying next matcher", stage, file_name);
    }

    Classification::NoMatch
}

/// Returns the capture group's text, treating an empty capture as absent.
fn group<'h>(captures: &Captures<'h>, index: usize) -> Option<&'h str> {
    captures
        .get(index)
        .map(|m| m.as_str())
        .filter(|text| !text.is_empty())
}

fn prefix<'h>(captures: &Captures<'h>, index: usize) -> &'h str {
    captures.get(index).map_or("", |m| m.as_str())
}

fn match_explicit(file_name: &str) -> Option<EpisodeDescriptor> {
    let captures = EXPLICIT_RE.captures(file_name)?;

    let (Some(season), Some(episode)) = (group(&captures, 2), group(&captures, 3)) else {
        warn!("didn't find season and episode: {}", file_name);
        return None;
    };

    EpisodeDescriptor::build(
        MatchStage::Explicit,
        prefix(&captures, 1),
        season,
        episode,
        file_name.to_string(),
    )
}

fn match_alternative(file_name: &str) -> Option<EpisodeDescriptor> {
    let captures = ALTERNATIVE_RE.captures(file_name)?;

    if let (Some(season), Some(episode)) = (group(&captures, 2), group(&captures, 3)) {
        let last_episode = group(&captures, 4).map(str::to_string);
        return EpisodeDescriptor::build(
            MatchStage::Alternative,
            prefix(&captures, 1),
            season,
            episode,
            file_name.to_string(),
        )
        .map(|descriptor| EpisodeDescriptor {
            last_episode,
            ..descriptor
        });
    }

    if let (Some(season), Some(episode)) = (group(&captures, 6), group(&captures, 7)) {
        return EpisodeDescriptor::build(
            MatchStage::Alternative,
            prefix(&captures, 5),
            season,
            episode,
            file_name.to_string(),
        );
    }

    warn!("didn't find season and episode: {}", file_name);
    None
}

fn match_datestamp(file_name: &str) -> Option<EpisodeDescriptor> {
    let captures = DATESTAMP_RE.captures(file_name)?;

    let year = group(&captures, 2)?;
    let month = group(&captures, 3)?;
    let day = group(&captures, 4)?;

    EpisodeDescriptor::build(
        MatchStage::Datestamp,
        prefix(&captures, 1),
        year,
        &format!("{month}{day}"),
        file_name.to_string(),
    )
}

fn match_episode_count(file_name: &str) -> Option<EpisodeDescriptor> {
    let captures = EPISODE_COUNT_RE.captures(file_name)?;
    let count = group(&captures, 2)?;

    // The last two digits are the episode; anything before them is the season.
    let (season, episode) = count.split_at(count.len().saturating_sub(2));
    if season.is_empty() {
        warn!(
            "episode count {} in {} is too short to hold a season",
            count, file_name
        );
        return None;
    }

    let show = prefix(&captures, 1).trim_end_matches('.');
    let extension = file_name.rsplit('.').next().unwrap_or_default();

    // Library scanners don't understand bare episode counts, so the placed
    // copy gets an explicit marker.
    let target_file_name = format!("{show}.S{season}E{episode}.{extension}");

    EpisodeDescriptor::build(
        MatchStage::EpisodeCount,
        show,
        season,
        episode,
        target_file_name,
    )
}
