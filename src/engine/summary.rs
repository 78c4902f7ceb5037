use super::outcome::SkipReason;
use std::collections::BTreeMap;

/// Counters collected over one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub pages_visited: u32,
    pub listings_seen: u64,
    pub records_emitted: u64,
    pub sink_failures: u64,

    /// Skipped listings by [`SkipReason::kind`]
    pub skipped: BTreeMap<&'static str, u64>,
}

impl RunSummary {
    pub fn record_skip(&mut self, reason: &SkipReason) {
        *self.skipped.entry(reason.kind()).or_insert(0) += 1;
    }

    pub fn total_skipped(&self) -> u64 {
        self.skipped.values().sum()
    }
}
