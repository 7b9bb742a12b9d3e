//! Same-product vs. variant decision for a pair of records.

use std::collections::BTreeSet;

use brewmerge_core::{BeerRecord, PackageFormat};
use regex::Regex;
use serde::Serialize;

use crate::config::MatchConfig;
use crate::error::{MatchError, Result};
use crate::normalize::{fold, strip_volume_suffix};
use crate::similarity::{Scores, similarity};

/// Words and token patterns that turn an otherwise matching name into a
/// different product ("Fardeau" vs "Fardeau Xtrm", "Vintage 2021" vs "Vintage 2022").
#[derive(Debug, Clone)]
pub struct VariantMarkers {
    phrases: Vec<Vec<String>>,
    numeric: Vec<Regex>,
}

impl VariantMarkers {
    pub fn new<M, P>(markers: M, numeric_patterns: P) -> Result<Self>
    where
        M: IntoIterator,
        M::Item: AsRef<str>,
        P: IntoIterator,
        P::Item: AsRef<str>,
    {
        let phrases: Vec<Vec<String>> = markers
            .into_iter()
            .map(|marker| {
                fold(marker.as_ref())
                    .split_whitespace()
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .filter(|tokens| !tokens.is_empty())
            .collect();
        if phrases.is_empty() {
            return Err(MatchError::EmptyConfiguration("variant_markers"));
        }

        let numeric = numeric_patterns
            .into_iter()
            .map(|pattern| {
                let pattern = pattern.as_ref();
                Regex::new(pattern).map_err(|source| MatchError::InvalidPattern {
                    pattern: pattern.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { phrases, numeric })
    }

    /// Markers found in an already folded name. Multi-word markers must
    /// appear as consecutive tokens; numeric patterns match whole tokens.
    pub fn markers_in(&self, folded: &str) -> BTreeSet<String> {
        let tokens: Vec<&str> = folded.split_whitespace().collect();
        let mut found = BTreeSet::new();

        for phrase in &self.phrases {
            let hit = tokens
                .windows(phrase.len())
                .any(|window| window.iter().zip(phrase).all(|(t, p)| *t == p.as_str()));
            if hit {
                found.insert(phrase.join(" "));
            }
        }

        for token in &tokens {
            if self.numeric.iter().any(|re| re.is_match(token)) {
                found.insert((*token).to_string());
            }
        }

        found
    }
}

/// Comparison view of a record, computed once per record per run.
#[derive(Debug, Clone)]
pub struct PreparedRecord {
    pub name_key: String,
    pub producer_key: String,
    pub markers: BTreeSet<String>,
    pub package: PackageFormat,
    pub malformed: bool,
}

impl PreparedRecord {
    pub fn new(record: &BeerRecord, config: &MatchConfig) -> Self {
        let normalizer = config.normalizer();
        let name = strip_volume_suffix(record.display_name());

        Self {
            name_key: normalizer.comparison_key(name),
            producer_key: normalizer.comparison_key(record.display_producer()),
            markers: config.markers().markers_in(&fold(name)),
            package: config.packs().format_of(record),
            malformed: record.is_malformed(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchVerdict {
    Same,
    Malformed,
    PackageMismatch,
    ProducerBelowThreshold,
    NameBelowThreshold,
    VariantMismatch,
}

impl MatchVerdict {
    pub fn describe(self) -> &'static str {
        match self {
            MatchVerdict::Same => "same product",
            MatchVerdict::Malformed => "record lacks a name or producer",
            MatchVerdict::PackageMismatch => "pack and single listing",
            MatchVerdict::ProducerBelowThreshold => "producers differ",
            MatchVerdict::NameBelowThreshold => "names differ",
            MatchVerdict::VariantMismatch => "names differ by a variant marker",
        }
    }
}

/// Outcome of comparing two records, with the evidence behind it.
#[derive(Debug, Clone, Serialize)]
pub struct MatchDecision<'a> {
    pub left: &'a BeerRecord,
    pub right: &'a BeerRecord,
    pub scores: Option<Scores>,
    pub left_package: PackageFormat,
    pub right_package: PackageFormat,
    pub differing_markers: Vec<String>,
    pub verdict: MatchVerdict,
}

impl MatchDecision<'_> {
    pub fn is_match(&self) -> bool {
        self.verdict == MatchVerdict::Same
    }
}

/// Fast path used by the merge engine: stops at the first failed check.
/// Thresholds are inclusive.
pub fn matches(
    a: &PreparedRecord,
    b: &PreparedRecord,
    config: &MatchConfig,
    check_package: bool,
) -> bool {
    if a.malformed || b.malformed {
        return false;
    }
    if check_package && a.package != b.package {
        return false;
    }
    if similarity(&a.producer_key, &b.producer_key, config.scoring()) < config.producer_threshold() {
        return false;
    }
    if similarity(&a.name_key, &b.name_key, config.scoring()) < config.name_threshold() {
        return false;
    }
    a.markers == b.markers
}

fn classify(
    a: &PreparedRecord,
    b: &PreparedRecord,
    config: &MatchConfig,
    check_package: bool,
) -> (MatchVerdict, Option<Scores>, Vec<String>) {
    if a.malformed || b.malformed {
        return (MatchVerdict::Malformed, None, Vec::new());
    }

    let scores = Scores {
        name: similarity(&a.name_key, &b.name_key, config.scoring()),
        producer: similarity(&a.producer_key, &b.producer_key, config.scoring()),
    };
    let differing: Vec<String> = a.markers.symmetric_difference(&b.markers).cloned().collect();

    let verdict = if check_package && a.package != b.package {
        MatchVerdict::PackageMismatch
    } else if scores.producer < config.producer_threshold() {
        MatchVerdict::ProducerBelowThreshold
    } else if scores.name < config.name_threshold() {
        MatchVerdict::NameBelowThreshold
    } else if !differing.is_empty() {
        MatchVerdict::VariantMismatch
    } else {
        MatchVerdict::Same
    };

    (verdict, Some(scores), differing)
}

/// Full comparison as the merge engine applies it, package check included.
pub fn explain<'a>(a: &'a BeerRecord, b: &'a BeerRecord, config: &MatchConfig) -> MatchDecision<'a> {
    let left = PreparedRecord::new(a, config);
    let right = PreparedRecord::new(b, config);
    let (verdict, scores, differing_markers) = classify(&left, &right, config, true);

    MatchDecision {
        left: a,
        right: b,
        scores,
        left_package: left.package,
        right_package: right.package,
        differing_markers,
        verdict,
    }
}

/// Producer, name and variant checks only; pack vs. single is left to the
/// merge engine.
pub fn is_same_product(a: &BeerRecord, b: &BeerRecord, config: &MatchConfig) -> bool {
    matches(
        &PreparedRecord::new(a, config),
        &PreparedRecord::new(b, config),
        config,
        false,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn beer(name: &str, producer: &str) -> BeerRecord {
        BeerRecord::new("test", name, producer)
    }

    #[test]
    fn markers_match_whole_tokens_and_phrases() {
        let markers = VariantMarkers::new(["xtrm", "barrel aged"], [r"^\d+[a-z]?$"]).unwrap();
        let found = markers.markers_in("fardeau xtrm barrel aged 2");
        let found: Vec<_> = found.into_iter().collect();
        assert_eq!(found, vec!["2", "barrel aged", "xtrm"]);

        assert!(markers.markers_in("switcheroo barrel").is_empty());
    }

    #[test]
    fn same_product_across_producer_spellings() {
        let cfg = MatchConfig::default();
        let a = beer("Fardeau", "Messorem Bracitorium");
        let b = beer("Fardeau", "Brasserie Messorem Bracitorium inc.");
        assert!(is_same_product(&a, &b, &cfg));

        let decision = explain(&a, &b, &cfg);
        assert!(decision.is_match());
        let scores = decision.scores.unwrap();
        assert_eq!(scores.name, 1.0);
        assert_eq!(scores.producer, 1.0);
    }

    #[test]
    fn variant_marker_blocks_high_overlap() {
        let cfg = MatchConfig::default();
        let a = beer("Fardeau", "Messorem Bracitorium");
        let b = beer("Fardeau Xtrm Turbo", "Messorem Bracitorium");

        let decision = explain(&a, &b, &cfg);
        assert_eq!(decision.verdict, MatchVerdict::VariantMismatch);
        assert_eq!(decision.scores.unwrap().name, 1.0);
        assert_eq!(decision.differing_markers, vec!["turbo", "xtrm"]);
        assert!(!is_same_product(&a, &b, &cfg));
    }

    #[test]
    fn different_producer_blocks_match() {
        let cfg = MatchConfig::default();
        let a = beer("Fardeau", "Messorem Bracitorium");
        let b = beer("Fardeau", "Other Brewery");
        assert_eq!(explain(&a, &b, &cfg).verdict, MatchVerdict::ProducerBelowThreshold);
    }

    #[test]
    fn pack_is_flagged_only_by_explain() {
        let cfg = MatchConfig::default();
        let pack = beer("IPA 6-pack", "X");
        let single = beer("IPA", "X");

        let decision = explain(&pack, &single, &cfg);
        assert_eq!(decision.verdict, MatchVerdict::PackageMismatch);
        assert_eq!(decision.left_package, PackageFormat::Pack);
        assert_eq!(decision.right_package, PackageFormat::Single);
        // The "6" is also a numeric marker, so the pair differs without the pack rule too.
        assert!(!is_same_product(&pack, &single, &cfg));
    }

    #[test]
    fn malformed_records_never_match() {
        let cfg = MatchConfig::default();
        let mut broken = beer("Fardeau", "");
        broken.producer = None;
        let ok = beer("Fardeau", "Messorem");
        let decision = explain(&broken, &ok, &cfg);
        assert_eq!(decision.verdict, MatchVerdict::Malformed);
        assert!(decision.scores.is_none());
    }

    #[test]
    fn thresholds_are_inclusive() {
        let cfg = MatchConfig::default();
        // 4 of 5 tokens shared: exactly 0.8.
        let c = beer("Grande Blanche Houblonnee Ete Tardif", "Dunham");
        let d = beer("Grande Rouge Houblonnee Ete Tardif", "Dunham");
        let cfg = cfg.with_thresholds(0.6, 0.8).unwrap();
        let decision = explain(&c, &d, &cfg);
        assert_eq!(decision.scores.unwrap().name, 0.8);
        // Same score, but "blanche" is a variant marker.
        assert_eq!(decision.verdict, MatchVerdict::VariantMismatch);

        let e = beer("Grande Ambree Houblonnee Ete Tardif", "Dunham");
        let f = beer("Grande Cuivree Houblonnee Ete Tardif", "Dunham");
        let decision = explain(&e, &f, &cfg);
        assert_eq!(decision.scores.unwrap().name, 0.8);
        assert!(decision.is_match());
    }

    #[test]
    fn explain_agrees_with_fast_path_and_is_symmetric() {
        let cfg = MatchConfig::default();
        let corpus = [
            beer("Fardeau", "Messorem Bracitorium"),
            beer("Messorem – Fardeau", "Messorem"),
            beer("Fardeau Xtrm Turbo", "Messorem Bracitorium"),
            beer("IPA 6-pack", "Sir John"),
            beer("IPA", "Brasserie Sir John Brewing co."),
            beer("Écume", "Abri de la Tempête"),
            beer("Ecume - 473ml", "L'Abri de la Tempete"),
            beer("Blanche", "Dieu du Ciel!"),
            beer("Péché Mortel", "Dieu du Ciel"),
        ];

        for a in &corpus {
            for b in &corpus {
                let pa = PreparedRecord::new(a, &cfg);
                let pb = PreparedRecord::new(b, &cfg);
                let ab = explain(a, b, &cfg);
                let ba = explain(b, a, &cfg);
                assert_eq!(ab.verdict, ba.verdict, "{:?} / {:?}", a.name, b.name);
                assert_eq!(ab.is_match(), matches(&pa, &pb, &cfg, true));
                assert_eq!(is_same_product(a, b, &cfg), is_same_product(b, a, &cfg));
            }
        }
    }

    #[test]
    fn volume_suffix_does_not_count_as_variant() {
        let cfg = MatchConfig::default();
        let a = beer("Écume", "Abri de la Tempête");
        let b = beer("Ecume - 473ml", "L'Abri de la Tempete");
        assert!(explain(&a, &b, &cfg).is_match());
    }
}
