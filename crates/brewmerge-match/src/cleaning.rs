//! Rewrites beer names that repeat the producer ("Messorem – Fardeau") or
//! carry a trailing volume ("Écume - 473ml").

use std::collections::HashSet;

use brewmerge_core::{BeerRecord, CleaningConfig, MatchingConfig, MergedBeerRecord};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::check_threshold;
use crate::error::{MatchError, Result};
use crate::normalize::{Normalizer, strip_volume_suffix};

/// One renamed record. `source_id` is the record's source, or the canonical
/// provenance key for merged records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameChange {
    pub index: usize,
    pub source_id: String,
    pub producer: String,
    pub original: String,
    pub cleaned: String,
}

/// Cleaned copies of the input plus the list of changes made.
#[derive(Debug, Clone, Serialize)]
pub struct CleanOutcome<T> {
    pub records: Vec<T>,
    pub changes: Vec<NameChange>,
}

#[derive(Debug, Clone)]
pub struct NameCleaner {
    separators: Vec<String>,
    overlap_ratio: f64,
    min_prefix_len: usize,
    max_prefix_len: usize,
    strip_volume: bool,
    normalizer: Normalizer,
}

impl NameCleaner {
    /// Producer stop words are the matching stop words plus the cleaner's
    /// own extras ("craft", "beer", ...).
    pub fn from_settings(cleaning: &CleaningConfig, matching: &MatchingConfig) -> Result<Self> {
        check_threshold("prefix_overlap_ratio", cleaning.prefix_overlap_ratio)?;
        if cleaning.min_prefix_len > cleaning.max_prefix_len {
            return Err(MatchError::InvalidRange {
                name: "prefix length",
                min: cleaning.min_prefix_len,
                max: cleaning.max_prefix_len,
            });
        }

        let separators: Vec<String> = cleaning
            .separators
            .iter()
            .filter(|sep| !sep.is_empty())
            .cloned()
            .collect();
        if separators.is_empty() {
            return Err(MatchError::EmptyConfiguration("separators"));
        }

        let stop_words = matching
            .stop_words
            .iter()
            .chain(&cleaning.extra_stop_words);

        Ok(Self {
            separators,
            overlap_ratio: cleaning.prefix_overlap_ratio,
            min_prefix_len: cleaning.min_prefix_len,
            max_prefix_len: cleaning.max_prefix_len,
            strip_volume: cleaning.strip_volume_suffix,
            normalizer: Normalizer::new(stop_words),
        })
    }

    /// Splits `name` at the first configured separator (in configuration
    /// order) that leaves a prefix of acceptable length and a remainder of
    /// at least two characters. Returns `(prefix, rest)`, both trimmed.
    pub fn extract_producer_prefix<'n>(&self, name: &'n str) -> Option<(&'n str, &'n str)> {
        self.separators.iter().find_map(|sep| {
            let (prefix, rest) = name.split_once(sep.as_str())?;
            let (prefix, rest) = (prefix.trim(), rest.trim());
            let prefix_len = prefix.chars().count();

            let usable = (self.min_prefix_len..=self.max_prefix_len).contains(&prefix_len)
                && rest.chars().count() >= 2;
            usable.then_some((prefix, rest))
        })
    }

    /// True when the name starts with something that names the producer.
    pub fn has_producer_prefix(&self, name: &str, producer: &str) -> bool {
        if name.trim().is_empty() || producer.trim().is_empty() {
            return false;
        }
        let Some((prefix, _)) = self.extract_producer_prefix(name) else {
            return false;
        };

        let prefix_tokens = self.significant_tokens(prefix);
        let producer_tokens = self.significant_tokens(producer);
        if prefix_tokens.is_empty() || producer_tokens.is_empty() {
            return false;
        }
        if prefix_tokens.is_subset(&producer_tokens) {
            return true;
        }

        let overlap = prefix_tokens.intersection(&producer_tokens).count();
        overlap as f64 / prefix_tokens.len() as f64 >= self.overlap_ratio
    }

    pub fn clean_name(&self, name: &str, producer: &str) -> String {
        let mut cleaned = name;
        if self.has_producer_prefix(name, producer)
            && let Some((_, rest)) = self.extract_producer_prefix(name)
        {
            cleaned = rest;
        }
        if self.strip_volume {
            cleaned = strip_volume_suffix(cleaned);
        }
        cleaned.trim().to_string()
    }

    /// Returns cleaned copies; `records` is left untouched.
    pub fn clean_records(&self, records: &[BeerRecord]) -> CleanOutcome<BeerRecord> {
        let mut changes = Vec::new();
        let cleaned: Vec<BeerRecord> = records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                let mut copy = record.clone();
                let Some(original) = record.name.as_deref() else {
                    return copy;
                };
                let name = self.clean_name(original, record.display_producer());
                if name != original {
                    debug!(index, original, cleaned = %name, "cleaned beer name");
                    changes.push(NameChange {
                        index,
                        source_id: record.source_id.clone(),
                        producer: record.display_producer().to_string(),
                        original: original.to_string(),
                        cleaned: name.clone(),
                    });
                    copy.name = Some(name);
                }
                copy
            })
            .collect();

        info!(total = records.len(), cleaned = changes.len(), "name cleaning finished");
        CleanOutcome {
            records: cleaned,
            changes,
        }
    }

    /// Cleans canonical names of merged records. Member records under
    /// `sources` keep their names as published.
    pub fn clean_merged(&self, records: &[MergedBeerRecord]) -> CleanOutcome<MergedBeerRecord> {
        let mut changes = Vec::new();
        let cleaned: Vec<MergedBeerRecord> = records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                let mut copy = record.clone();
                let name = self.clean_name(&record.name, &record.producer);
                if name != record.name {
                    changes.push(NameChange {
                        index,
                        source_id: record.canonical_source.clone(),
                        producer: record.producer.clone(),
                        original: record.name.clone(),
                        cleaned: name.clone(),
                    });
                    copy.name = name;
                }
                copy
            })
            .collect();

        info!(total = records.len(), cleaned = changes.len(), "merged name cleaning finished");
        CleanOutcome {
            records: cleaned,
            changes,
        }
    }

    fn significant_tokens(&self, text: &str) -> HashSet<String> {
        self.normalizer
            .normalize(text)
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }
}

impl Default for NameCleaner {
    fn default() -> Self {
        Self::from_settings(&CleaningConfig::default(), &MatchingConfig::default())
            .expect("built-in cleaning settings are valid")
    }
}
