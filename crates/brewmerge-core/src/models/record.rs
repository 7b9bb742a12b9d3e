use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One raw beer product as scraped from a single source site.
///
/// Every field except `source_id` is optional because crawlers only fill what
/// the page exposed. Fields the model does not know about (`upc`,
/// `untappd_rating`, ...) are kept in `extra` so a record survives a
/// load/save cycle unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BeerRecord {
    #[serde(rename = "source", alias = "source_id", default)]
    pub source_id: String,

    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub producer: Option<String>,

    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,

    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub sub_style: Option<String>,

    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub volume: Option<String>,

    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub alcohol: Option<String>,

    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub ibu: Option<String>,

    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,

    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,

    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub availability: Option<String>,

    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// State of an optional text field, resolved once at ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence<'a> {
    Absent,
    /// Key present but blank after trimming.
    Empty,
    Present(&'a str),
}

impl<'a> Presence<'a> {
    pub fn of(field: &'a Option<String>) -> Self {
        match field.as_deref() {
            None => Presence::Absent,
            Some(value) if value.trim().is_empty() => Presence::Empty,
            Some(value) => Presence::Present(value.trim()),
        }
    }

    pub fn value(self) -> Option<&'a str> {
        match self {
            Presence::Present(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_present(self) -> bool {
        matches!(self, Presence::Present(_))
    }
}

impl BeerRecord {
    pub fn new(
        source_id: impl Into<String>,
        name: impl Into<String>,
        producer: impl Into<String>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            name: Some(name.into()),
            producer: Some(producer.into()),
            ..Default::default()
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_volume(mut self, volume: impl Into<String>) -> Self {
        self.volume = Some(volume.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name_presence(&self) -> Presence<'_> {
        Presence::of(&self.name)
    }

    pub fn producer_presence(&self) -> Presence<'_> {
        Presence::of(&self.producer)
    }

    /// A record without a usable name or producer cannot take part in matching.
    pub fn is_malformed(&self) -> bool {
        !self.name_presence().is_present() || !self.producer_presence().is_present()
    }

    /// Trimmed name, or "" when absent or blank.
    pub fn display_name(&self) -> &str {
        self.name_presence().value().unwrap_or_default()
    }

    /// Trimmed producer, or "" when absent or blank.
    pub fn display_producer(&self) -> &str {
        self.producer_presence().value().unwrap_or_default()
    }
}

/// Accepts strings, numbers and booleans for free-text fields. Some sites
/// publish `price` or `alcohol` as JSON numbers.
fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text),
        Some(Value::Number(number)) => Some(number.to_string()),
        Some(Value::Bool(flag)) => Some(flag.to_string()),
        Some(other) => Some(other.to_string()),
    })
}

/// All records contributed by one source site.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceBatch {
    pub source_id: String,
    pub records: Vec<BeerRecord>,
}

impl SourceBatch {
    pub fn new(source_id: impl Into<String>, records: Vec<BeerRecord>) -> Self {
        Self {
            source_id: source_id.into(),
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Whether a listing sells one container or a multi-unit pack.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageFormat {
    #[default]
    Single,
    Pack,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presence_distinguishes_absent_and_blank() {
        let absent: Option<String> = None;
        let blank = Some("   ".to_string());
        let filled = Some("  Fardeau ".to_string());

        assert_eq!(Presence::of(&absent), Presence::Absent);
        assert_eq!(Presence::of(&blank), Presence::Empty);
        assert_eq!(Presence::of(&filled), Presence::Present("Fardeau"));
    }

    #[test]
    fn malformed_when_name_or_producer_missing() {
        let ok = BeerRecord::new("masoif", "Fardeau", "Messorem Bracitorium");
        assert!(!ok.is_malformed());

        let mut no_producer = ok.clone();
        no_producer.producer = Some(String::new());
        assert!(no_producer.is_malformed());

        let mut no_name = ok;
        no_name.name = None;
        assert!(no_name.is_malformed());
    }

    #[test]
    fn deserializes_numbers_and_keeps_unknown_fields() {
        let json = r#"{
            "source": "vtub",
            "name": "Écume",
            "producer": "Abri de la Tempête",
            "price": 4.99,
            "alcohol": "5.5%",
            "upc": "0628055000123",
            "untappd_rating": 3.82
        }"#;

        let record: BeerRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.source_id, "vtub");
        assert_eq!(record.price.as_deref(), Some("4.99"));
        assert_eq!(record.alcohol.as_deref(), Some("5.5%"));
        assert_eq!(
            record.extra.get("upc").and_then(Value::as_str),
            Some("0628055000123")
        );

        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["untappd_rating"], serde_json::json!(3.82));
        assert_eq!(back["source"], "vtub");
        assert!(back.get("style").is_none());
    }

    #[test]
    fn accepts_source_id_alias() {
        let record: BeerRecord =
            serde_json::from_str(r#"{"source_id":"lbab","name":"IPA","producer":"X"}"#).unwrap();
        assert_eq!(record.source_id, "lbab");
    }
}
