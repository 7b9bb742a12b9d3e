//! Text canonicalization for matching: case folding, accent stripping,
//! punctuation removal and stop-word filtering.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

static VOLUME_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s*[-–—:]\s*\d+([.,]\d+)?\s*(ml|cl|l|litre|litres)\s*$").unwrap()
});

/// Lower-cases, strips diacritics, turns every non-alphanumeric character
/// into a separator and collapses whitespace. No words are removed.
pub fn fold(text: &str) -> String {
    let stripped: String = text
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase();
    let cleaned: String = stripped
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Removes a trailing volume such as `- 473ml` or `: 0.5 L`.
pub fn strip_volume_suffix(name: &str) -> &str {
    match VOLUME_SUFFIX.find(name) {
        Some(m) if m.start() > 0 => name[..m.start()].trim_end(),
        _ => name.trim(),
    }
}

/// Folding plus stop-word and short-token removal.
#[derive(Debug, Clone)]
pub struct Normalizer {
    stop_words: HashSet<String>,
}

impl Normalizer {
    /// Stop words are folded before use, so `"ltée"` also drops `"LTEE"`.
    pub fn new<I, S>(stop_words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let stop_words = stop_words
            .into_iter()
            .flat_map(|word| {
                fold(word.as_ref())
                    .split_whitespace()
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .collect();
        Self { stop_words }
    }

    pub fn is_stop_word(&self, token: &str) -> bool {
        self.stop_words.contains(token)
    }

    /// Total: any input, including "", yields a (possibly empty) string.
    pub fn normalize(&self, text: &str) -> String {
        fold(text)
            .split_whitespace()
            .filter(|token| token.chars().count() >= 2 && !self.is_stop_word(token))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// The string used for scoring. Falls back to the folded text when every
    /// word is a stop word, so "La" still compares as "la" instead of "".
    pub fn comparison_key(&self, text: &str) -> String {
        let normalized = self.normalize(text);
        if normalized.is_empty() {
            fold(text)
        } else {
            normalized
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> Normalizer {
        Normalizer::new(["brasserie", "microbrasserie", "brewing", "inc", "le", "la", "de", "du"])
    }

    #[test]
    fn fold_strips_accents_and_punctuation() {
        assert_eq!(fold("Abri de la Tempête"), "abri de la tempete");
        assert_eq!(fold("  Mille-Îles  –  Sure!! "), "mille iles sure");
        assert_eq!(fold("L'Œil du Malt"), "l œil du malt");
        assert_eq!(fold(""), "");
    }

    #[test]
    fn normalize_removes_stop_words_and_short_tokens() {
        let n = normalizer();
        assert_eq!(
            n.normalize("Brasserie Messorem Bracitorium inc."),
            "messorem bracitorium"
        );
        assert_eq!(n.normalize("La Fin du Monde"), "fin monde");
        assert_eq!(n.normalize("L'Abri"), "abri");
        assert_eq!(n.normalize(""), "");
    }

    #[test]
    fn stop_words_are_folded() {
        let n = Normalizer::new(["Ltée", "Microbrasserie"]);
        assert_eq!(n.normalize("Dieu du Ciel LTEE"), "dieu du ciel");
        assert_eq!(n.normalize("MICROBRASSERIE Charlevoix"), "charlevoix");
    }

    #[test]
    fn comparison_key_falls_back_to_folded_text() {
        let n = normalizer();
        assert_eq!(n.comparison_key("La"), "la");
        assert_eq!(n.comparison_key("La Tempête"), "tempete");
    }

    #[test]
    fn strip_volume_suffix_variants() {
        assert_eq!(strip_volume_suffix("Fardeau - 473ml"), "Fardeau");
        assert_eq!(strip_volume_suffix("Fardeau - 473 ml"), "Fardeau");
        assert_eq!(strip_volume_suffix("Écume — 0,5 L"), "Écume");
        assert_eq!(strip_volume_suffix("IPA: 355 mL "), "IPA");
        assert_eq!(strip_volume_suffix("La Belle IPA"), "La Belle IPA");
        assert_eq!(strip_volume_suffix("- 473ml"), "- 473ml");
    }
}
