//! Integration tests for episort
//!
//! These tests drive whole runs against temporary download and library
//! trees, the way a download client hook or a manual bulk sort would.
//!
//! Test categories:
//! 1. Single job invocations
//! 2. Bulk directory sorting
//! 3. Dry-run mode
//! 4. Idempotency and round trips
//! 5. Configuration and filtering

use episort::cli::{Invocation, RunOptions, run_invocation};
use episort::classifier::classify;
use episort::config::Config;
use episort::indexer::JobContext;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ============================================================================
// Test Utilities
// ============================================================================

/// A temporary `downloads/` and `library/` pair.
struct TestFixture {
    temp_dir: TempDir,
}

impl TestFixture {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::create_dir(temp_dir.path().join("downloads")).expect("Failed to create downloads");
        fs::create_dir(temp_dir.path().join("library")).expect("Failed to create library");
        TestFixture { temp_dir }
    }

    fn downloads(&self) -> PathBuf {
        self.temp_dir.path().join("downloads")
    }

    fn library(&self) -> PathBuf {
        self.temp_dir.path().join("library")
    }

    /// Create a file under downloads/, creating parent directories.
    fn create_download(&self, rel_path: &str, content: &[u8]) -> PathBuf {
        let path = self.downloads().join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        let mut file = File::create(&path).expect("Failed to create file");
        file.write_all(content)
            .expect("Failed to write file content");
        path
    }

    fn assert_placed(&self, rel_path: &str) {
        let path = self.library().join(rel_path);
        assert!(path.is_file(), "File should be placed: {}", path.display());
    }

    fn assert_not_placed(&self, rel_path: &str) {
        let path = self.library().join(rel_path);
        assert!(!path.exists(), "File should not exist: {}", path.display());
    }

    /// List all files in the library recursively, relative to it.
    fn library_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        Self::walk_dir(&self.library(), &mut files);
        let mut files: Vec<_> = files
            .into_iter()
            .map(|path| {
                path.strip_prefix(self.library())
                    .expect("path should be inside library")
                    .to_path_buf()
            })
            .collect();
        files.sort();
        files
    }

    fn walk_dir(dir: &Path, files: &mut Vec<PathBuf>) {
        if let Ok(entries) = fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_file() {
                    files.push(path);
                } else if path.is_dir() {
                    Self::walk_dir(&path, files);
                }
            }
        }
    }

    fn bulk(&self) -> Invocation {
        Invocation::Bulk {
            source: self.downloads(),
            target: Some(self.library()),
        }
    }

    fn job(&self, path: PathBuf) -> Invocation {
        Invocation::Job {
            job: JobContext {
                id: "0123abcd".to_string(),
                name: "test job".to_string(),
            },
            path,
        }
    }

    /// Options for job runs, which have no destination argument.
    fn job_options(&self) -> RunOptions {
        RunOptions {
            dry_run: false,
            target: Some(self.library()),
        }
    }
}

const VIDEO: &[u8] = b"\x1a\x45\xdf\xa3 not really matroska";

// ============================================================================
// Test Suite 1: Single Job Invocations
// ============================================================================

#[test]
fn test_job_places_explicit_marker_file() {
    let fixture = TestFixture::new();
    let path = fixture.create_download("Show.Name.S03E07.something.mp4", VIDEO);

    let report = run_invocation(&fixture.job(path), &Config::default(), &fixture.job_options())
        .expect("Run should succeed");

    assert_eq!(report.linked, 1);
    fixture.assert_placed("show name/Season 03/Show.Name.S03E07.something.mp4");
}

#[test]
fn test_job_places_datestamp_file() {
    let fixture = TestFixture::new();
    let path = fixture.create_download(
        "The.Colbert.Report.2014.03.31.Biz.Stone.HDTV.x264-2HD.mp4",
        VIDEO,
    );

    run_invocation(&fixture.job(path), &Config::default(), &fixture.job_options())
        .expect("Run should succeed");

    fixture.assert_placed(
        "the colbert report/Season 2014/The.Colbert.Report.2014.03.31.Biz.Stone.HDTV.x264-2HD.mp4",
    );
}

#[test]
fn test_job_renames_episode_count_file() {
    let fixture = TestFixture::new();
    let path = fixture.create_download("madam.secretary.416.hdtv-lol.mkv", VIDEO);

    run_invocation(&fixture.job(path), &Config::default(), &fixture.job_options())
        .expect("Run should succeed");

    fixture.assert_placed("madam secretary/Season 04/madam.secretary.S4E16.mkv");
    fixture.assert_not_placed("madam secretary/Season 04/madam.secretary.416.hdtv-lol.mkv");
}

#[test]
fn test_job_directory_places_contents() {
    let fixture = TestFixture::new();
    fixture.create_download("Broadchurch.S01/Broadchurch.1x08.HDTV.x264-FoV.mp4", VIDEO);
    fixture.create_download("Broadchurch.S01/Broadchurch.1x08.HDTV.x264-FoV.nfo", b"info");

    let report = run_invocation(
        &fixture.job(fixture.downloads().join("Broadchurch.S01")),
        &Config::default(),
        &fixture.job_options(),
    )
    .expect("Run should succeed");

    assert_eq!(report.linked, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(
        fixture.library_files(),
        vec![PathBuf::from(
            "broadchurch/Season 01/Broadchurch.1x08.HDTV.x264-FoV.mp4"
        )]
    );
}

#[test]
fn test_job_sidecar_is_ignored() {
    let fixture = TestFixture::new();
    let path = fixture.create_download("Show.Name.S03E07.nfo", b"info");

    let report = run_invocation(&fixture.job(path), &Config::default(), &fixture.job_options())
        .expect("Run should succeed");

    assert_eq!(report.placed(), 0);
    assert!(fixture.library_files().is_empty());
    assert_eq!(fs::read_dir(fixture.library()).unwrap().count(), 0);
}

#[test]
fn test_job_unmatched_file_still_succeeds() {
    let fixture = TestFixture::new();
    let path = fixture.create_download("family.holiday.mkv", VIDEO);

    let report = run_invocation(&fixture.job(path.clone()), &Config::default(), &fixture.job_options())
        .expect("Unmatched files are not fatal");

    assert_eq!(report.unmatched, vec![path]);
    assert!(fixture.library_files().is_empty());
}

#[test]
fn test_job_uses_configured_target() {
    let fixture = TestFixture::new();
    let path = fixture.create_download("Show.S02E01.mkv", VIDEO);

    let mut config = Config::default();
    config.library.target = fixture.library();

    run_invocation(&fixture.job(path), &config, &RunOptions::default())
        .expect("Run should succeed");

    fixture.assert_placed("show/Season 02/Show.S02E01.mkv");
}

// ============================================================================
// Test Suite 2: Bulk Directory Sorting
// ============================================================================

#[test]
fn test_bulk_sorts_mixed_release_styles() {
    let fixture = TestFixture::new();
    fixture.create_download("Broadchurch.S01E06.PROPER.HDTV.x264-TLA.mp4", VIDEO);
    fixture.create_download("a/Broadchurch.1x08.HDTVxx264-FoV.mp4", VIDEO);
    fixture.create_download("b/Castle.2009.S06E08.HDTV.x264-LOL.mp4", VIDEO);
    fixture.create_download(
        "c/How.I.Met.Your.Mother.S09E23-E24.HDTV.x264-EXCELLENCE.mp4",
        VIDEO,
    );
    fixture.create_download("c/d/madam.secretary.416.hdtv-lol[ettv].mkv", VIDEO);
    fixture.create_download("c/d/madam.secretary.416.hdtv-lol[ettv].nfo", b"info");
    fixture.create_download("random.notes.txt", b"notes");

    let report = run_invocation(&fixture.bulk(), &Config::default(), &RunOptions::default())
        .expect("Run should succeed");

    assert_eq!(report.linked, 5);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.unmatched.len(), 1);
    assert_eq!(report.shows.get("broadchurch"), Some(&2));

    assert_eq!(
        fixture.library_files(),
        vec![
            PathBuf::from("broadchurch/Season 01/Broadchurch.1x08.HDTVxx264-FoV.mp4"),
            PathBuf::from("broadchurch/Season 01/Broadchurch.S01E06.PROPER.HDTV.x264-TLA.mp4"),
            PathBuf::from("castle 2009/Season 06/Castle.2009.S06E08.HDTV.x264-LOL.mp4"),
            PathBuf::from(
                "how i met your mother/Season 09/How.I.Met.Your.Mother.S09E23-E24.HDTV.x264-EXCELLENCE.mp4"
            ),
            PathBuf::from("madam secretary/Season 04/madam.secretary.S4E16.mkv"),
        ]
    );
}

#[test]
fn test_bulk_keeps_source_files() {
    let fixture = TestFixture::new();
    let source = fixture.create_download("Show.S01E01.mkv", VIDEO);

    run_invocation(&fixture.bulk(), &Config::default(), &RunOptions::default())
        .expect("Run should succeed");

    assert!(source.exists(), "Source must stay in place for seeding");
    assert_eq!(
        fs::read(fixture.library().join("show/Season 01/Show.S01E01.mkv")).unwrap(),
        VIDEO
    );
}

#[test]
fn test_bulk_missing_library_root_is_fatal() {
    let fixture = TestFixture::new();
    fixture.create_download("Show.S01E01.mkv", VIDEO);

    let invocation = Invocation::Bulk {
        source: fixture.downloads(),
        target: Some(fixture.library().join("does-not-exist")),
    };
    let result = run_invocation(&invocation, &Config::default(), &RunOptions::default());

    let error = result.expect_err("Placement under a missing root should fail");
    assert_eq!(error.exit_code(), 1);
}

#[test]
fn test_bulk_missing_source_is_fatal() {
    let fixture = TestFixture::new();

    let invocation = Invocation::Bulk {
        source: fixture.downloads().join("missing"),
        target: Some(fixture.library()),
    };

    assert!(run_invocation(&invocation, &Config::default(), &RunOptions::default()).is_err());
}

// ============================================================================
// Test Suite 3: Dry-Run Mode
// ============================================================================

#[test]
fn test_dry_run_doesnt_touch_library() {
    let fixture = TestFixture::new();
    fixture.create_download("Show.Name.S03E07.mkv", VIDEO);
    fixture.create_download("madam.secretary.416.hdtv-lol.mkv", VIDEO);

    let options = RunOptions {
        dry_run: true,
        target: None,
    };
    let report = run_invocation(&fixture.bulk(), &Config::default(), &options)
        .expect("Dry run should succeed");

    assert_eq!(report.planned, 2);
    assert_eq!(report.linked, 0);
    assert_eq!(
        fs::read_dir(fixture.library()).unwrap().count(),
        0,
        "Dry-run should not create directories"
    );
}

#[test]
fn test_dry_run_vs_actual_sort() {
    let fixture = TestFixture::new();
    fixture.create_download("Show.Name.S03E07.mkv", VIDEO);

    let dry = run_invocation(
        &fixture.bulk(),
        &Config::default(),
        &RunOptions {
            dry_run: true,
            target: None,
        },
    )
    .expect("Dry run should succeed");
    let actual = run_invocation(&fixture.bulk(), &Config::default(), &RunOptions::default())
        .expect("Run should succeed");

    assert_eq!(dry.planned, actual.linked);
    assert_eq!(dry.shows, actual.shows);
}

// ============================================================================
// Test Suite 4: Idempotency and Round Trips
// ============================================================================

#[test]
fn test_rerun_is_a_no_op() {
    let fixture = TestFixture::new();
    fixture.create_download("Show.Name.S03E07.mkv", VIDEO);

    let first = run_invocation(&fixture.bulk(), &Config::default(), &RunOptions::default())
        .expect("First run should succeed");
    let placed = fixture.library().join("show name/Season 03/Show.Name.S03E07.mkv");
    let modified = fs::metadata(&placed).unwrap().modified().unwrap();

    let second = run_invocation(&fixture.bulk(), &Config::default(), &RunOptions::default())
        .expect("Second run should succeed");

    assert_eq!(first.linked, 1);
    assert_eq!(second.linked, 0);
    assert_eq!(second.already_placed, 1);
    assert_eq!(fs::metadata(&placed).unwrap().modified().unwrap(), modified);
    assert_eq!(fixture.library_files().len(), 1);
}

#[test]
fn test_placed_names_classify_to_same_episode() {
    let fixture = TestFixture::new();
    let names = [
        "Show.Name.S03E07.something.mp4",
        "Show.1x08.something.mkv",
        "madam.secretary.416.hdtv-lol.mkv",
    ];
    for name in names {
        fixture.create_download(name, VIDEO);
    }

    run_invocation(&fixture.bulk(), &Config::default(), &RunOptions::default())
        .expect("Run should succeed");

    for name in names {
        let original = classify(name).into_descriptor().unwrap();
        let placed_name = original.target_file_name.clone();
        let placed = classify(&placed_name).into_descriptor().unwrap();
        assert_eq!(
            (placed.season.as_str(), placed.episode.as_str()),
            (original.season.as_str(), original.episode.as_str()),
            "{name} should round-trip through {placed_name}"
        );
    }
}

// ============================================================================
// Test Suite 5: Configuration and Filtering
// ============================================================================

#[test]
fn test_config_excludes_samples() {
    let fixture = TestFixture::new();
    fixture.create_download("Show.S01E01/Show.S01E01.mkv", VIDEO);
    fixture.create_download("Show.S01E01/Sample/Show.S01E01.sample.mkv", VIDEO);

    let config = Config::from_toml(
        r#"
        [filters.exclude]
        patterns = ["**/Sample/**"]
        "#,
    )
    .unwrap();

    let report = run_invocation(&fixture.bulk(), &config, &RunOptions::default())
        .expect("Run should succeed");

    assert_eq!(report.linked, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(
        fixture.library_files(),
        vec![PathBuf::from("show/Season 01/Show.S01E01.mkv")]
    );
}

#[test]
fn test_config_extra_sidecar_extensions() {
    let fixture = TestFixture::new();
    fixture.create_download("Show.S01E01.mkv", VIDEO);
    fixture.create_download("Show.S01E01.srt", b"1\n00:00:01,000 --> 00:00:02,000\nhi\n");

    let config = Config::from_toml(
        r#"
        [filters]
        sidecar_extensions = ["nfo", "srt"]
        "#,
    )
    .unwrap();

    let report = run_invocation(&fixture.bulk(), &config, &RunOptions::default())
        .expect("Run should succeed");

    assert_eq!(report.linked, 1);
    assert_eq!(report.skipped, 1);
}

#[test]
fn test_invalid_filter_pattern_fails_before_placing() {
    let fixture = TestFixture::new();
    fixture.create_download("Show.S01E01.mkv", VIDEO);

    let mut config = Config::default();
    config.filters.exclude.regex = vec!["[unclosed(".to_string()];

    let result = run_invocation(&fixture.bulk(), &config, &RunOptions::default());

    assert!(result.is_err());
    assert!(fixture.library_files().is_empty());
}
