//! Brewmerge matching: normalization, similarity, variant classification and cluster merge.

pub mod error;
pub mod normalize;
pub mod similarity;
pub mod package;
pub mod config;
pub mod variant;
pub mod provenance;
pub mod report;
pub mod dedup;
pub mod cleaning;

pub use error::{MatchError, Result};
pub use config::MatchConfig;
pub use normalize::{Normalizer, fold, strip_volume_suffix};
pub use similarity::{Scores, similarity};
pub use variant::{MatchDecision, MatchVerdict, explain, is_same_product};
pub use report::{MergeOutcome, MergeReport};
pub use dedup::{MergeEngine, merge};
pub use cleaning::{CleanOutcome, NameChange, NameCleaner};
