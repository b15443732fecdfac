//! Styled terminal output for run summaries

use console::style;
use mirrorcp_types::SyncStats;
use serde::Serialize;

/// Aggregated result of a whole run
#[derive(Debug, Serialize)]
pub struct RunSummary {
    /// Number of passes performed
    pub passes: u64,
    /// Statistics merged across all passes
    #[serde(flatten)]
    pub totals: SyncStats,
}

/// Display the run summary in a formatted way
pub fn print_run_summary(summary: &RunSummary) {
    let totals = &summary.totals;

    println!();
    println!("{}", style("Run summary:").bold().underlined());
    println!("  Passes: {}", style(summary.passes).cyan());
    println!(
        "  Directories created: {}",
        style(totals.dirs_created).green()
    );
    println!("  Files created: {}", style(totals.files_created).green());
    println!("  Files updated: {}", style(totals.files_updated).green());
    println!(
        "  Entries deleted: {}",
        style(totals.files_deleted + totals.dirs_deleted).green()
    );
    println!(
        "  Files unchanged: {}",
        style(totals.files_unchanged).dim()
    );
    println!(
        "  Entries skipped: {}",
        style(totals.entries_skipped).yellow()
    );
    println!(
        "  Errors: {}",
        if totals.entries_failed > 0 {
            style(totals.entries_failed).red()
        } else {
            style(totals.entries_failed).green()
        }
    );
    println!(
        "  Bytes copied: {}",
        style(format_bytes(totals.bytes_copied)).green()
    );
    println!("  Elapsed: {:.2?}", totals.duration);
}

/// Format a byte count as a human-readable string
fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1024), "1.0 KB");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(1048576), "1.0 MB");
    }

    #[test]
    fn test_run_summary_serializes_flat() {
        let summary = RunSummary {
            passes: 2,
            totals: SyncStats::new(),
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["passes"], 2);
        assert_eq!(json["files_created"], 0);
    }
}
