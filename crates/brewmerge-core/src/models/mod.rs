pub mod merged;
pub mod record;

pub use merged::{MergedBeerRecord, source_key};
pub use record::{BeerRecord, PackageFormat, Presence, SourceBatch};
