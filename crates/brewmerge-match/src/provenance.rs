//! Builds the merged record for one cluster: canonical fields, the
//! provenance map and the per-source views derived from it.

use std::collections::{BTreeMap, HashMap};

use brewmerge_core::{BeerRecord, MergedBeerRecord, PackageFormat, Presence, source_key};

use crate::package::PackDetector;

/// A cluster member as seen by the engine: the batch it came from and the
/// untouched source record.
#[derive(Debug, Clone, Copy)]
pub struct ClusterMember<'a> {
    pub source_id: &'a str,
    pub record: &'a BeerRecord,
}

/// `members` must be in input order and non-empty.
pub fn assemble(
    members: &[ClusterMember<'_>],
    package: PackageFormat,
    malformed: bool,
    packs: &PackDetector,
) -> MergedBeerRecord {
    let keys = provenance_keys(members);
    let canonical = canonical_index(members);

    // Canonical member first, then the rest in input order.
    let mut priority: Vec<usize> = vec![canonical];
    priority.extend((0..members.len()).filter(|idx| *idx != canonical));

    let mut sources = BTreeMap::new();
    let mut urls: Vec<String> = Vec::new();
    let mut descriptions = BTreeMap::new();
    let mut styles = BTreeMap::new();
    let mut sub_styles = BTreeMap::new();
    let mut prices = BTreeMap::new();
    let mut photo_urls = BTreeMap::new();
    let mut photos_in_order: Vec<&str> = Vec::new();

    for (member, key) in members.iter().zip(&keys) {
        let record = member.record;

        let mut tagged = record.clone();
        if tagged.source_id != member.source_id {
            tagged.source_id = member.source_id.to_string();
        }
        sources.insert(key.clone(), tagged);

        if let Some(url) = text(&record.url)
            && !urls.iter().any(|u| u == url)
        {
            urls.push(url.to_string());
        }
        insert_text(&mut descriptions, key, &record.description);
        insert_text(&mut styles, key, &record.style);
        insert_text(&mut sub_styles, key, &record.sub_style);
        insert_text(&mut prices, key, &record.price);
        insert_text(&mut photo_urls, key, &record.photo_url);
        if let Some(photo) = text(&record.photo_url) {
            photos_in_order.push(photo);
        }
    }

    MergedBeerRecord {
        name: members[canonical].record.display_name().to_string(),
        producer: members[canonical].record.display_producer().to_string(),
        cluster_size: members.len(),
        package,
        canonical_source: keys[canonical].clone(),
        malformed,
        sources,
        urls,
        descriptions,
        styles,
        sub_styles,
        prices,
        photo_url: choose_best_photo(&photos_in_order, package, packs).map(str::to_string),
        photo_urls,
        volume: first_text(members, &priority, |r| &r.volume),
        alcohol: first_text(members, &priority, |r| &r.alcohol),
        ibu: first_text(members, &priority, |r| &r.ibu),
        region: first_text(members, &priority, |r| &r.region),
        availability: first_text(members, &priority, |r| &r.availability),
    }
}

fn first_text<F>(members: &[ClusterMember<'_>], priority: &[usize], field: F) -> Option<String>
where
    F: Fn(&BeerRecord) -> &Option<String>,
{
    priority
        .iter()
        .find_map(|idx| text(field(members[*idx].record)))
        .map(str::to_string)
}

/// `"src"`, `"src#2"`, ... in member order, one per member.
fn provenance_keys(members: &[ClusterMember<'_>]) -> Vec<String> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    members
        .iter()
        .map(|member| {
            let count = seen.entry(member.source_id).or_insert(0);
            *count += 1;
            source_key(member.source_id, *count)
        })
        .collect()
}

/// The member whose name and producer become the cluster's canonical pair:
/// longest name, then longest producer, then first seen. Both fields come
/// from one record so the pair always exists in the input.
fn canonical_index(members: &[ClusterMember<'_>]) -> usize {
    let key = |member: &ClusterMember<'_>| {
        (
            member.record.display_name().chars().count(),
            member.record.display_producer().chars().count(),
        )
    };

    let mut best_idx = 0usize;
    let mut best_key = key(&members[0]);
    for (idx, member) in members.iter().enumerate().skip(1) {
        let candidate = key(member);
        if candidate > best_key {
            best_key = candidate;
            best_idx = idx;
        }
    }

    best_idx
}

fn text(field: &Option<String>) -> Option<&str> {
    Presence::of(field).value()
}

fn insert_text(target: &mut BTreeMap<String, String>, key: &str, field: &Option<String>) {
    if let Some(value) = text(field) {
        target.insert(key.to_string(), value.to_string());
    }
}

fn is_placeholder(url: &str) -> bool {
    url.to_lowercase().contains("placeholder")
}

/// First real photo. Single listings skip photos that show a pack.
pub fn choose_best_photo<'a>(
    photos: &[&'a str],
    package: PackageFormat,
    packs: &PackDetector,
) -> Option<&'a str> {
    if package == PackageFormat::Single
        && let Some(photo) = photos
            .iter()
            .find(|url| !is_placeholder(url) && !packs.is_pack_text(url))
    {
        return Some(*photo);
    }

    photos
        .iter()
        .find(|url| !is_placeholder(url))
        .or_else(|| photos.first())
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchConfig;

    fn member<'a>(source_id: &'a str, record: &'a BeerRecord) -> ClusterMember<'a> {
        ClusterMember { source_id, record }
    }

    #[test]
    fn canonical_name_is_longest_with_first_seen_ties() {
        let cfg = MatchConfig::default();
        let a = BeerRecord::new("", "Abri", "Abri de la Tempête");
        let b = BeerRecord::new("", "Écume", "Abri de la Tempête inc.");
        let c = BeerRecord::new("", "Ecume", "Abri");

        let merged = assemble(
            &[member("vtub", &a), member("masoif", &b), member("lbab", &c)],
            PackageFormat::Single,
            false,
            cfg.packs(),
        );
        assert_eq!(merged.name, "Écume");
        assert_eq!(merged.canonical_source, "masoif");
        assert_eq!(merged.producer, "Abri de la Tempête inc.");
        assert_eq!(merged.cluster_size, 3);
    }

    #[test]
    fn name_and_producer_come_from_the_same_member() {
        let cfg = MatchConfig::default();
        let a = BeerRecord::new("", "Alpha Bravo Charlie Delta Echo", "Kruhoek");
        let b = BeerRecord::new("", "Alpha Bravo Charlie Delta Fox", "Kruhoek Tremblay Gagnon");

        let merged = assemble(
            &[member("masoif", &a), member("vtub", &b)],
            PackageFormat::Single,
            false,
            cfg.packs(),
        );
        assert_eq!(merged.name, "Alpha Bravo Charlie Delta Echo");
        assert_eq!(merged.producer, "Kruhoek");
        assert_eq!(merged.canonical_source, "masoif");
    }

    #[test]
    fn equal_names_prefer_longer_producer() {
        let cfg = MatchConfig::default();
        let a = BeerRecord::new("", "Fardeau", "Messorem");
        let b = BeerRecord::new("", "Fardeau", "Messorem Bracitorium");
        let c = BeerRecord::new("", "FARDEAU", "Messorem Bracitorium");

        let merged = assemble(
            &[member("lbab", &a), member("vtub", &b), member("masoif", &c)],
            PackageFormat::Single,
            false,
            cfg.packs(),
        );
        assert_eq!(merged.name, "Fardeau");
        assert_eq!(merged.producer, "Messorem Bracitorium");
        assert_eq!(merged.canonical_source, "vtub");
    }

    #[test]
    fn duplicate_sources_get_suffixed_keys_and_tagged_records() {
        let cfg = MatchConfig::default();
        let a = BeerRecord::new("", "Fardeau", "Messorem")
            .with_url("https://lbab.example/fardeau")
            .with_description("NEIPA");
        let b = BeerRecord::new("", "Fardeau", "Messorem")
            .with_url("https://lbab.example/fardeau")
            .with_description("Double NEIPA");

        let merged = assemble(
            &[member("lbab", &a), member("lbab", &b)],
            PackageFormat::Single,
            false,
            cfg.packs(),
        );

        let keys: Vec<_> = merged.sources.keys().cloned().collect();
        assert_eq!(keys, vec!["lbab", "lbab#2"]);
        assert_eq!(merged.sources["lbab#2"].source_id, "lbab");
        assert_eq!(merged.urls, vec!["https://lbab.example/fardeau"]);
        assert_eq!(merged.descriptions["lbab"], "NEIPA");
        assert_eq!(merged.descriptions["lbab#2"], "Double NEIPA");
    }

    #[test]
    fn scalars_prefer_canonical_member() {
        let cfg = MatchConfig::default();
        let mut short = BeerRecord::new("", "IPA", "Sir John");
        short.alcohol = Some("6.5%".to_string());
        short.ibu = Some("  ".to_string());
        let mut long = BeerRecord::new("", "IPA du Nord", "Sir John");
        long.alcohol = Some("6,5 %".to_string());
        let mut other = BeerRecord::new("", "IPA", "Sir John");
        other.ibu = Some("55".to_string());

        let merged = assemble(
            &[member("a", &short), member("b", &long), member("c", &other)],
            PackageFormat::Single,
            false,
            cfg.packs(),
        );
        assert_eq!(merged.alcohol.as_deref(), Some("6,5 %"));
        assert_eq!(merged.ibu.as_deref(), Some("55"));
        assert!(merged.volume.is_none());
    }

    #[test]
    fn best_photo_skips_placeholders_and_pack_shots() {
        let cfg = MatchConfig::default();
        let photos = [
            "https://cdn.example/placeholder.png",
            "https://cdn.example/ipa-6-pack.jpg",
            "https://cdn.example/ipa.jpg",
        ];
        assert_eq!(
            choose_best_photo(&photos, PackageFormat::Single, cfg.packs()),
            Some("https://cdn.example/ipa.jpg")
        );
        assert_eq!(
            choose_best_photo(&photos, PackageFormat::Pack, cfg.packs()),
            Some("https://cdn.example/ipa-6-pack.jpg")
        );
        assert_eq!(
            choose_best_photo(&photos[..1], PackageFormat::Single, cfg.packs()),
            Some("https://cdn.example/placeholder.png")
        );
        assert_eq!(choose_best_photo(&[], PackageFormat::Single, cfg.packs()), None);
    }
}
