use std::collections::BTreeMap;

use brewmerge_core::MergedBeerRecord;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Counters for one merge run.
#[derive(Debug, Clone, Serialize)]
pub struct MergeReport {
    pub input_records: usize,
    pub per_source: BTreeMap<String, usize>,
    pub clusters: usize,
    pub multi_source_clusters: usize,
    pub merged_duplicates: usize,
    /// Records without a usable name or producer, kept as singletons.
    pub malformed: usize,
    /// Matches that joined two clusters which had already grown.
    pub bridged_matches: usize,
    pub pack_clusters: usize,
    pub variant_flagged: usize,
    pub generated_at: DateTime<Utc>,
}

/// Merged records plus the run report.
#[derive(Debug, Clone, Serialize)]
pub struct MergeOutcome {
    pub records: Vec<MergedBeerRecord>,
    pub report: MergeReport,
}

impl MergeReport {
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("Input records:        {}", self.input_records),
            format!("Merged records:       {}", self.clusters),
            format!("Duplicates folded:    {}", self.merged_duplicates),
            format!("Found on 2+ sites:    {}", self.multi_source_clusters),
            format!("Pack listings:        {}", self.pack_clusters),
            format!("With variant markers: {}", self.variant_flagged),
        ];
        if self.malformed > 0 {
            lines.push(format!("Malformed records:    {}", self.malformed));
        }
        if self.bridged_matches > 0 {
            lines.push(format!("Bridged clusters:     {}", self.bridged_matches));
        }
        for (source, count) in &self.per_source {
            lines.push(format!("  {source:<20} {count}"));
        }
        lines
    }
}
