//! Output module for run summaries and stored statistics
//!
//! This module handles:
//! - Printing the summary of a finished run
//! - Loading and printing statistics from the SQLite sink

pub mod stats;

pub use stats::{load_statistics, print_statistics, HarvestStatistics};

use crate::engine::RunSummary;

/// Renders a run summary as the text printed after a run
pub fn format_summary(summary: &RunSummary) -> String {
    let mut text = String::from("=== Run Summary ===\n");
    text.push_str(&format!("  Pages visited: {}\n", summary.pages_visited));
    text.push_str(&format!("  Listings seen: {}\n", summary.listings_seen));
    text.push_str(&format!("  Records emitted: {}\n", summary.records_emitted));
    text.push_str(&format!("  Sink failures: {}\n", summary.sink_failures));
    text.push_str(&format!("  Skipped: {}\n", summary.total_skipped()));
    for (kind, count) in &summary.skipped {
        text.push_str(&format!("    {}: {}\n", kind, count));
    }
    text
}

/// Prints a run summary to stdout
pub fn print_summary(summary: &RunSummary) {
    print!("{}", format_summary(summary));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SkipReason;

    #[test]
    fn test_format_summary_lists_skips() {
        let mut summary = RunSummary {
            pages_visited: 2,
            listings_seen: 6,
            records_emitted: 5,
            ..RunSummary::default()
        };
        summary.record_skip(&SkipReason::DetailsMissing);

        let text = format_summary(&summary);
        assert!(text.contains("Records emitted: 5"));
        assert!(text.contains("Skipped: 1"));
        assert!(text.contains("details_missing: 1"));
    }
}
