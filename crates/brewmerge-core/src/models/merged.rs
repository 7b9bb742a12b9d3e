use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::record::{BeerRecord, PackageFormat};

/// One deduplicated product, built from every source record judged to be
/// the same beer.
///
/// `sources` is the provenance map: each contributing record is stored
/// untouched under its source id. Two records from the same source are
/// stored under `"{source}"` and `"{source}#2"`, `"{source}#3"`, ...
///
/// The maps below `sources` (`descriptions`, `styles`, ...) are convenience
/// views derived from it and use the same keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergedBeerRecord {
    pub name: String,
    pub producer: String,
    pub cluster_size: usize,

    #[serde(default)]
    pub package: PackageFormat,

    /// Key into `sources` of the member that supplied `name` and `producer`.
    pub canonical_source: String,

    /// Set when the only member lacked a usable name or producer.
    #[serde(default, skip_serializing_if = "is_false")]
    pub malformed: bool,

    pub sources: BTreeMap<String, BeerRecord>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub urls: Vec<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub descriptions: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub styles: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sub_styles: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub prices: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub photo_urls: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alcohol: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ibu: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<String>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl MergedBeerRecord {
    /// Distinct originating sites, ignoring the `#n` suffixes of duplicates.
    pub fn source_ids(&self) -> BTreeSet<&str> {
        self.sources
            .values()
            .map(|record| record.source_id.as_str())
            .collect()
    }

    pub fn is_multi_source(&self) -> bool {
        self.source_ids().len() > 1
    }

    /// Member records in key order.
    pub fn records(&self) -> impl Iterator<Item = &BeerRecord> {
        self.sources.values()
    }

    /// The canonical fields as a fresh record for `source_id`, carrying the
    /// canonical member's URL and volume so package detection still applies.
    pub fn to_record(&self, source_id: impl Into<String>) -> BeerRecord {
        let mut record = self
            .sources
            .get(&self.canonical_source)
            .cloned()
            .unwrap_or_default();
        record.source_id = source_id.into();
        record.name = Some(self.name.clone()).filter(|name| !name.is_empty());
        record.producer = Some(self.producer.clone()).filter(|producer| !producer.is_empty());
        record
    }
}

/// Key under which the `occurrence`-th record (1-based) of `source_id`
/// is stored in a cluster's `sources` map.
pub fn source_key(source_id: &str, occurrence: usize) -> String {
    if occurrence <= 1 {
        source_id.to_string()
    } else {
        format!("{source_id}#{occurrence}")
    }
}
