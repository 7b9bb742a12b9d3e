use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Root application configuration, loaded from `~/.config/brewmerge/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub matching: MatchingConfig,
    pub cleaning: CleaningConfig,
    pub output: OutputConfig,
}

/// Raw matching settings. `brewmerge_match::MatchConfig` validates and
/// compiles these before a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    pub producer_threshold: f64,
    pub name_threshold: f64,
    pub scoring: ScoringMode,
    pub parallel: bool,
    pub stop_words: Vec<String>,
    pub variant_markers: Vec<String>,
    /// Regexes matched against whole normalized tokens.
    pub numeric_variant_patterns: Vec<String>,
    /// Case-insensitive regexes matched against "name url volume".
    pub pack_patterns: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringMode {
    /// Token intersection over the smaller token set.
    #[default]
    Containment,
    /// Best of containment and normalized Levenshtein, tolerant to typos.
    Hybrid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    pub separators: Vec<String>,
    pub prefix_overlap_ratio: f64,
    pub min_prefix_len: usize,
    pub max_prefix_len: usize,
    pub strip_volume_suffix: bool,
    /// Words ignored on top of `matching.stop_words` when comparing a name
    /// prefix with the producer.
    pub extra_stop_words: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub pretty: bool,
    /// Stripped from source file stems: `beers_masoif.json` is source `masoif`.
    pub source_prefix: String,
}

// ─── Defaults ──────────────────────────────────────────────

const DEFAULT_STOP_WORDS: &[&str] = &[
    "microbrasserie",
    "brasserie",
    "brasseurs",
    "brasseur",
    "brouerie",
    "brassicole",
    "microbrewery",
    "brewery",
    "brewing",
    "brewers",
    "cooperative",
    "travail",
    "artisanal",
    "artisanale",
    "inc",
    "ltee",
    "ltd",
    "limited",
    "co",
    "company",
    "compagnie",
    "the",
    "le",
    "la",
    "les",
    "du",
    "de",
    "des",
];

const DEFAULT_VARIANT_MARKERS: &[&str] = &[
    "xtrm",
    "extreme",
    "turbo",
    "session",
    "light",
    "sans alcool",
    "lime",
    "citron",
    "lemon",
    "framboise",
    "raspberry",
    "cerise",
    "cherry",
    "mangue",
    "mango",
    "passion",
    "pamplemousse",
    "grapefruit",
    "sure",
    "sour",
    "lactose",
    "vanille",
    "vanilla",
    "chocolat",
    "chocolate",
    "cafe",
    "coffee",
    "barrel aged",
    "vieilli",
    "aged",
    "bourbon",
    "nitro",
    "imperial",
    "double",
    "triple",
    "blonde",
    "brune",
    "rousse",
    "noire",
    "blanche",
    "wheat",
    "wit",
    "weizen",
    "stout",
    "porter",
    "peche",
    "peach",
    "abricot",
    "apricot",
    "orange",
    "tangerine",
];

const DEFAULT_NUMERIC_VARIANT_PATTERNS: &[&str] = &[r"^\d+[a-z]?$", r"^v\d+$"];

const DEFAULT_PACK_PATTERNS: &[&str] = &[
    r"\b\d+\s*-?\s*pack\b",
    r"\b(multi)?pack\b",
    r"\bx\s?(4|6|8|12|15|24)\b",
    r"\b\d{1,2}\s*[x×]\s*\d{2,4}\s*ml\b",
    r"\bcaisse\b",
    r"\bcase\b",
];

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|word| word.to_string()).collect()
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            producer_threshold: 0.6,
            name_threshold: 0.8,
            scoring: ScoringMode::default(),
            parallel: true,
            stop_words: owned(DEFAULT_STOP_WORDS),
            variant_markers: owned(DEFAULT_VARIANT_MARKERS),
            numeric_variant_patterns: owned(DEFAULT_NUMERIC_VARIANT_PATTERNS),
            pack_patterns: owned(DEFAULT_PACK_PATTERNS),
        }
    }
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            separators: owned(&["–", "-", "—", ":", "|", "/"]),
            prefix_overlap_ratio: 0.7,
            min_prefix_len: 2,
            max_prefix_len: 50,
            strip_volume_suffix: true,
            extra_stop_words: owned(&["craft", "beer", "beers", "biere", "bieres"]),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            pretty: true,
            source_prefix: "beers_".to_string(),
        }
    }
}

// ─── Load / Save ───────────────────────────────────────────

impl AppConfig {
    /// Standard config file path: `~/.config/brewmerge/config.toml`
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("BREWMERGE_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("brewmerge")
            .join("config.toml")
    }

    /// Load config from disk, falling back to defaults if file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        Self::load_from(&path)
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save config to the standard path.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        self.save_to(&path)
    }

    /// Save config to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }
}
