use brewmerge_core::{BeerRecord, PackageFormat};
use regex::{Regex, RegexBuilder};

use crate::error::{MatchError, Result};

/// Recognizes multi-unit listings ("6-pack", "caisse", "4 x 473 ml") from a
/// record's name, URL and volume.
#[derive(Debug, Clone)]
pub struct PackDetector {
    patterns: Vec<Regex>,
}

impl PackDetector {
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|pattern| {
                let pattern = pattern.as_ref();
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|source| MatchError::InvalidPattern {
                        pattern: pattern.to_string(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        if patterns.is_empty() {
            return Err(MatchError::EmptyConfiguration("pack_patterns"));
        }
        Ok(Self { patterns })
    }

    pub fn is_pack_text(&self, text: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(text))
    }

    pub fn format_of(&self, record: &BeerRecord) -> PackageFormat {
        let text = [&record.name, &record.url, &record.volume]
            .into_iter()
            .filter_map(|field| field.as_deref())
            .collect::<Vec<_>>()
            .join(" ");

        if self.is_pack_text(&text) {
            PackageFormat::Pack
        } else {
            PackageFormat::Single
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brewmerge_core::MatchingConfig;

    fn detector() -> PackDetector {
        PackDetector::new(&MatchingConfig::default().pack_patterns).unwrap()
    }

    #[test]
    fn detects_pack_in_name_url_or_volume() {
        let d = detector();
        let by_name = BeerRecord::new("a", "IPA 6-pack", "X");
        let by_url = BeerRecord::new("a", "IPA", "X").with_url("https://shop.example/ipa-caisse-24");
        let by_volume = BeerRecord::new("a", "IPA", "X").with_volume("4 x 473 ml");
        let squashed = BeerRecord::new("a", "IPA 12pack", "X");

        assert_eq!(d.format_of(&by_name), PackageFormat::Pack);
        assert_eq!(d.format_of(&by_url), PackageFormat::Pack);
        assert_eq!(d.format_of(&by_volume), PackageFormat::Pack);
        assert_eq!(d.format_of(&squashed), PackageFormat::Pack);
    }

    #[test]
    fn single_listings_stay_single() {
        let d = detector();
        let single = BeerRecord::new("a", "Packard Pale Ale", "X")
            .with_url("https://shop.example/showcase/packard")
            .with_volume("473 ml");
        assert_eq!(d.format_of(&single), PackageFormat::Single);
    }

    #[test]
    fn rejects_bad_or_empty_patterns() {
        assert!(matches!(
            PackDetector::new(["(unclosed"]),
            Err(MatchError::InvalidPattern { .. })
        ));
        assert!(matches!(
            PackDetector::new(Vec::<String>::new()),
            Err(MatchError::EmptyConfiguration("pack_patterns"))
        ));
    }
}
