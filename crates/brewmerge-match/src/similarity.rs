use std::collections::HashSet;

use brewmerge_core::ScoringMode;
use serde::Serialize;

/// Scores for a record pair. Kept apart because names and producers have
/// their own thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Scores {
    pub name: f64,
    pub producer: f64,
}

pub fn token_set(text: &str) -> HashSet<&str> {
    text.split_whitespace().collect()
}

/// |A ∩ B| / min(|A|, |B|) over whitespace tokens, in [0, 1].
///
/// A name whose tokens are all contained in the other scores 1.0, which is
/// what lets "Fardeau" match "Messorem Fardeau".
pub fn containment(a: &str, b: &str) -> f64 {
    containment_of_sets(&token_set(a), &token_set(b))
}

pub fn containment_of_sets(a: &HashSet<&str>, b: &HashSet<&str>) -> f64 {
    let smaller = a.len().min(b.len());
    if smaller == 0 {
        return 0.0;
    }
    let shared = a.intersection(b).count();
    shared as f64 / smaller as f64
}

/// Similarity of two already-normalized strings.
pub fn similarity(a: &str, b: &str, mode: ScoringMode) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }

    let overlap = containment(a, b);
    match mode {
        ScoringMode::Containment => overlap,
        ScoringMode::Hybrid => overlap.max(strsim::normalized_levenshtein(a, b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn containment_rewards_subsets() {
        assert_eq!(containment("fardeau", "messorem fardeau"), 1.0);
        assert_eq!(containment("fardeau xtrm turbo", "fardeau"), 1.0);
        assert_eq!(containment("belle ipa", "grosse ipa"), 0.5);
        assert_eq!(containment("stout", "porter"), 0.0);
    }

    #[test]
    fn empty_inputs_score_zero() {
        assert_eq!(similarity("", "fardeau", ScoringMode::Containment), 0.0);
        assert_eq!(similarity("", "", ScoringMode::Hybrid), 0.0);
    }

    #[test]
    fn similarity_is_bounded_and_symmetric() {
        let pairs = [
            ("messorem bracitorium", "messorem bracitorium inc"),
            ("dieu ciel", "dieu du ciel"),
            ("trou diable", "trou du diable"),
            ("pit caribou", "pit caribu"),
            ("ipa", "double ipa"),
        ];
        for mode in [ScoringMode::Containment, ScoringMode::Hybrid] {
            for (a, b) in pairs {
                let ab = similarity(a, b, mode);
                let ba = similarity(b, a, mode);
                assert!((0.0..=1.0).contains(&ab), "{a} / {b}: {ab}");
                assert_eq!(ab, ba, "{a} / {b}");
            }
        }
    }

    #[test]
    fn hybrid_tolerates_typos() {
        let strict = similarity("pit caribou", "pit caribu", ScoringMode::Containment);
        let hybrid = similarity("pit caribou", "pit caribu", ScoringMode::Hybrid);
        assert_eq!(strict, 0.5);
        assert!(hybrid > 0.9);
    }
}
