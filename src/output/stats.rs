//! Statistics from the SQLite sink database
//!
//! This module extracts and displays what past runs stored locally.

use crate::sink::{RunRecord, SqliteSink};
use crate::HarvestError;

/// Number of organizations listed in the statistics
const TOP_ORGANIZATIONS: usize = 10;

/// Sink database statistics summary
#[derive(Debug, Clone)]
pub struct HarvestStatistics {
    /// Total number of stored records
    pub total_records: u64,

    /// Records whose qualifications text is non-empty
    pub records_with_qualifications: u64,

    /// Number of runs started against this database
    pub total_runs: u64,

    /// Organizations with the most records
    pub top_organizations: Vec<(String, u64)>,

    /// Counters of the most recent completed run
    pub latest_run: Option<RunRecord>,
}

/// Loads statistics from the sink database
///
/// # Arguments
///
/// * `sink` - The SQLite sink to query
///
/// # Returns
///
/// * `Ok(HarvestStatistics)` - Successfully loaded statistics
/// * `Err(HarvestError)` - Failed to query statistics
pub fn load_statistics(sink: &SqliteSink) -> Result<HarvestStatistics, HarvestError> {
    Ok(HarvestStatistics {
        total_records: sink.count_records()?,
        records_with_qualifications: sink.count_records_with_qualifications()?,
        total_runs: sink.count_runs()?,
        top_organizations: sink.top_organizations(TOP_ORGANIZATIONS)?,
        latest_run: sink.latest_completed_run()?,
    })
}

fn percentage(part: u64, total: u64) -> f64 {
    if total > 0 {
        (part as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &HarvestStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Overview:");
    println!("  Runs: {}", stats.total_runs);
    println!("  Records stored: {}", stats.total_records);
    println!(
        "  With qualifications: {} ({:.1}%)",
        stats.records_with_qualifications,
        percentage(stats.records_with_qualifications, stats.total_records)
    );
    println!();

    if !stats.top_organizations.is_empty() {
        println!("Top Organizations:");
        for (org, count) in &stats.top_organizations {
            println!("  {}: {}", org, count);
        }
        println!();
    }

    match &stats.latest_run {
        Some(run) => {
            println!("Latest Completed Run (#{}):", run.id);
            println!("  Started: {}", run.started_at);
            if let Some(finished) = &run.finished_at {
                println!("  Finished: {}", finished);
            }
            println!("  Config hash: {}", run.config_hash);
            println!("  Pages visited: {}", run.pages_visited);
            println!("  Listings seen: {}", run.listings_seen);
            println!(
                "  Records emitted: {} ({:.1}%)",
                run.records_emitted,
                percentage(run.records_emitted, run.listings_seen)
            );
            println!("  Listings skipped: {}", run.records_skipped);
            println!("  Sink failures: {}", run.sink_failures);
        }
        None => println!("No completed runs yet"),
    }
}
