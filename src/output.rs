//! Output formatting and styling module.
//!
//! Renders run reports for the terminal, either as a colored summary or as
//! JSON for scripts.

use crate::indexer::RunReport;
use colored::*;

/// Manages CLI output with consistent styling.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Serializes a report as pretty-printed JSON.
    pub fn json(report: &RunReport) -> serde_json::Result<String> {
        serde_json::to_string_pretty(report)
    }

    /// Prints a summary table of a finished run.
    pub fn summary(report: &RunReport, dry_run: bool) {
        Self::header("SUMMARY");

        if !report.shows.is_empty() {
            let width = report
                .shows
                .keys()
                .map(|name| name.len())
                .max()
                .unwrap_or(0)
                .max(4); // At least "Show" width

            println!(
                "{:<width$} | {}",
                "Show".bold(),
                "Episodes".bold(),
                width = width
            );
            println!("{}", "-".repeat(width + 12));
            for (show, count) in &report.shows {
                println!(
                    "{:<width$} | {}",
                    show,
                    count.to_string().green(),
                    width = width
                );
            }
            println!("{}", "-".repeat(width + 12));
        }

        if dry_run {
            Self::dry_run_notice(&format!("{} file(s) would be placed", report.planned));
        } else {
            println!("  Linked:         {}", report.linked.to_string().green());
            println!("  Copied:         {}", report.copied.to_string().green());
        }
        println!("  Already placed: {}", report.already_placed);
        println!("  Skipped:        {}", report.skipped);

        if report.unmatched.is_empty() {
            Self::success(&format!("{} file(s) examined", report.total()));
        } else {
            Self::warning(&format!(
                "{} of {} file(s) could not be matched:",
                report.unmatched.len(),
                report.total()
            ));
            for path in &report.unmatched {
                Self::error(&format!("{}", path.display()));
            }
        }
    }
}
