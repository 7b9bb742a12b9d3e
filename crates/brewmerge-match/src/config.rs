use brewmerge_core::{MatchingConfig, ScoringMode};

use crate::error::{MatchError, Result};
use crate::normalize::Normalizer;
use crate::package::PackDetector;
use crate::variant::VariantMarkers;

/// Validated, compiled matching configuration.
///
/// Built once per run and shared by reference with every component, including
/// the parallel comparison workers.
#[derive(Debug, Clone)]
pub struct MatchConfig {
    producer_threshold: f64,
    name_threshold: f64,
    scoring: ScoringMode,
    parallel: bool,
    normalizer: Normalizer,
    markers: VariantMarkers,
    packs: PackDetector,
}

impl MatchConfig {
    /// Fails before any record is processed if a threshold is outside
    /// [0, 1], a required word list is empty, or a pattern does not compile.
    pub fn from_settings(settings: &MatchingConfig) -> Result<Self> {
        check_threshold("producer_threshold", settings.producer_threshold)?;
        check_threshold("name_threshold", settings.name_threshold)?;

        if settings.stop_words.iter().all(|w| w.trim().is_empty()) {
            return Err(MatchError::EmptyConfiguration("stop_words"));
        }

        Ok(Self {
            producer_threshold: settings.producer_threshold,
            name_threshold: settings.name_threshold,
            scoring: settings.scoring,
            parallel: settings.parallel,
            normalizer: Normalizer::new(&settings.stop_words),
            markers: VariantMarkers::new(
                &settings.variant_markers,
                &settings.numeric_variant_patterns,
            )?,
            packs: PackDetector::new(&settings.pack_patterns)?,
        })
    }

    pub fn with_thresholds(mut self, producer: f64, name: f64) -> Result<Self> {
        check_threshold("producer_threshold", producer)?;
        check_threshold("name_threshold", name)?;
        self.producer_threshold = producer;
        self.name_threshold = name;
        Ok(self)
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_scoring(mut self, scoring: ScoringMode) -> Self {
        self.scoring = scoring;
        self
    }

    pub fn producer_threshold(&self) -> f64 {
        self.producer_threshold
    }

    pub fn name_threshold(&self) -> f64 {
        self.name_threshold
    }

    pub fn scoring(&self) -> ScoringMode {
        self.scoring
    }

    pub fn parallel(&self) -> bool {
        self.parallel
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn markers(&self) -> &VariantMarkers {
        &self.markers
    }

    pub fn packs(&self) -> &PackDetector {
        &self.packs
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self::from_settings(&MatchingConfig::default())
            .expect("built-in matching settings are valid")
    }
}

pub(crate) fn check_threshold(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(MatchError::InvalidThreshold { name, value })
    }
}
