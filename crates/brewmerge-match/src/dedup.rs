//! Merge engine: pairwise matching over every input record, union-find
//! clustering, then one merged record per cluster.

use std::collections::{BTreeMap, HashMap};

use brewmerge_core::{MergedBeerRecord, PackageFormat, SourceBatch};
use chrono::Utc;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::MatchConfig;
use crate::provenance::{ClusterMember, assemble};
use crate::report::{MergeOutcome, MergeReport};
use crate::variant::{PreparedRecord, matches};

#[derive(Debug, Clone, Copy)]
pub struct MergeEngine<'c> {
    config: &'c MatchConfig,
}

impl<'c> MergeEngine<'c> {
    pub fn new(config: &'c MatchConfig) -> Self {
        Self { config }
    }

    /// Deterministic for a given input order and configuration, whether the
    /// comparison phase runs in parallel or not.
    pub fn merge(&self, batches: &[SourceBatch]) -> MergeOutcome {
        let members: Vec<ClusterMember<'_>> = batches
            .iter()
            .flat_map(|batch| {
                batch.records.iter().map(move |record| ClusterMember {
                    source_id: batch.source_id.as_str(),
                    record,
                })
            })
            .collect();
        info!(
            records = members.len(),
            sources = batches.len(),
            parallel = self.config.parallel(),
            "merging beer records"
        );

        let prepared: Vec<PreparedRecord> = members
            .iter()
            .map(|member| PreparedRecord::new(member.record, self.config))
            .collect();

        let mut malformed = 0usize;
        for (member, prep) in members.iter().zip(&prepared) {
            if prep.malformed {
                malformed += 1;
                debug!(
                    source = member.source_id,
                    url = member.record.url.as_deref().unwrap_or_default(),
                    "record lacks name or producer, kept as its own cluster"
                );
            }
        }
        if malformed > 0 {
            warn!(malformed, "records without a name or producer were not matched");
        }

        let edges = self.pairwise_matches(&prepared);

        let mut dsu = DisjointSet::new(members.len());
        let mut bridged_matches = 0usize;
        for (left, row) in edges.iter().enumerate() {
            for &right in row {
                if dsu.union(left, right) == UnionOutcome::Bridged {
                    bridged_matches += 1;
                    debug!(
                        left = members[left].record.display_name(),
                        right = members[right].record.display_name(),
                        "match bridged two clusters; kept the earliest as root"
                    );
                }
            }
        }

        let clusters = components(&mut dsu);

        let mut records = Vec::with_capacity(clusters.len());
        let mut pack_clusters = 0usize;
        let mut variant_flagged = 0usize;
        for indexes in &clusters {
            let first = &prepared[indexes[0]];
            let cluster_members: Vec<ClusterMember<'_>> =
                indexes.iter().map(|idx| members[*idx]).collect();
            let is_malformed = indexes.len() == 1 && first.malformed;

            if first.package == PackageFormat::Pack {
                pack_clusters += 1;
            }
            if !is_malformed && !first.markers.is_empty() {
                variant_flagged += 1;
            }

            records.push(assemble(
                &cluster_members,
                first.package,
                is_malformed,
                self.config.packs(),
            ));
        }

        let mut per_source: BTreeMap<String, usize> = BTreeMap::new();
        for batch in batches {
            *per_source.entry(batch.source_id.clone()).or_default() += batch.len();
        }

        let report = MergeReport {
            input_records: members.len(),
            per_source,
            clusters: records.len(),
            multi_source_clusters: records.iter().filter(|r| r.is_multi_source()).count(),
            merged_duplicates: members.len() - records.len(),
            malformed,
            bridged_matches,
            pack_clusters,
            variant_flagged,
            generated_at: Utc::now(),
        };
        info!(
            input = report.input_records,
            merged = report.clusters,
            duplicates = report.merged_duplicates,
            multi_source = report.multi_source_clusters,
            "merge finished"
        );

        MergeOutcome { records, report }
    }

    /// For each record `i`, the records `j > i` it matches. Rows are
    /// independent reads over immutable data; clustering happens afterwards
    /// on a single thread.
    fn pairwise_matches(&self, prepared: &[PreparedRecord]) -> Vec<Vec<usize>> {
        let n = prepared.len();
        let config = self.config;
        let row = |i: usize| -> Vec<usize> {
            ((i + 1)..n)
                .filter(|&j| matches(&prepared[i], &prepared[j], config, true))
                .collect()
        };

        if config.parallel() {
            (0..n).into_par_iter().map(row).collect()
        } else {
            (0..n).map(row).collect()
        }
    }
}

/// Merge with the given configuration, dropping the report.
pub fn merge(batches: &[SourceBatch], config: &MatchConfig) -> Vec<MergedBeerRecord> {
    MergeEngine::new(config).merge(batches).records
}

/// Connected components ordered by their first (lowest) index, members ascending.
fn components(dsu: &mut DisjointSet) -> Vec<Vec<usize>> {
    let mut slot_of_root: HashMap<usize, usize> = HashMap::new();
    let mut clusters: Vec<Vec<usize>> = Vec::new();

    for idx in 0..dsu.len() {
        let root = dsu.find(idx);
        let slot = *slot_of_root.entry(root).or_insert_with(|| {
            clusters.push(Vec::new());
            clusters.len() - 1
        });
        clusters[slot].push(idx);
    }

    clusters
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnionOutcome {
    AlreadyJoined,
    Joined,
    /// Both sides already had more than one member.
    Bridged,
}

/// Disjoint sets over record indexes. The root of a set is always its
/// lowest index, i.e. the first record seen in input order.
#[derive(Debug, Clone)]
struct DisjointSet {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl DisjointSet {
    fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
            size: vec![1; size],
        }
    }

    fn len(&self) -> usize {
        self.parent.len()
    }

    fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }

        let mut node = x;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }
        root
    }

    fn union(&mut self, left: usize, right: usize) -> UnionOutcome {
        let left_root = self.find(left);
        let right_root = self.find(right);

        if left_root == right_root {
            return UnionOutcome::AlreadyJoined;
        }

        let bridged = self.size[left_root] > 1 && self.size[right_root] > 1;
        let (root, child) = if left_root < right_root {
            (left_root, right_root)
        } else {
            (right_root, left_root)
        };
        self.parent[child] = root;
        self.size[root] += self.size[child];

        if bridged {
            UnionOutcome::Bridged
        } else {
            UnionOutcome::Joined
        }
    }
}
