//! Complete-linkage clustering of canonical phrases.
//!
//! Phrases that survived the wash were only ever compared against the library
//! as it stood at the time, never against each other. This pass compares
//! every pair within a category and groups near-duplicates for operator
//! review. A phrase joins a cluster only when it is similar to every member,
//! so `A~B` and `B~C` never pull in an `A`/`C` pair that is not itself similar.
//!
//! Cost is O(m²) per category in the number of distinct phrases, fine for a
//! single project's library. Large multi-tenant corpora would need blocking
//! or an index first.

use std::collections::BTreeMap;

use rusqlite::Connection;

use crate::config::EngineConfig;
use crate::db;
use crate::models::PhraseUsage;

use super::error::NormalizationError;
use super::similarity::normalize_for_match;
use super::traits::SimilarityMeasure;
use super::types::{Cluster, ClusterMember};

/// Group near-duplicate phrases. Input rows with the same category and text
/// are combined by summing their usage.
pub fn compute_clusters(
    entries: &[PhraseUsage],
    similarity: &dyn SimilarityMeasure,
    threshold: f64,
) -> Vec<Cluster> {
    let mut by_category: BTreeMap<&str, BTreeMap<&str, i64>> = BTreeMap::new();
    for entry in entries {
        *by_category
            .entry(entry.category.as_str())
            .or_default()
            .entry(entry.text.as_str())
            .or_default() += entry.usage_count;
    }

    let mut clusters: Vec<Cluster> = by_category
        .iter()
        .flat_map(|(category, usage)| cluster_category(category, usage, similarity, threshold))
        .collect();

    clusters.sort_by(|a, b| {
        b.total_usage
            .cmp(&a.total_usage)
            .then_with(|| a.category.cmp(&b.category))
            .then_with(|| a.suggested_canonical.cmp(&b.suggested_canonical))
    });
    clusters
}

/// Snapshot a tenant's active library and cluster it.
pub fn find_clusters(
    conn: &Connection,
    tenant_id: &str,
    config: &EngineConfig,
    similarity: &dyn SimilarityMeasure,
) -> Result<Vec<Cluster>, NormalizationError> {
    let snapshot = db::aggregate_phrase_usage(conn, tenant_id)?;
    let clusters = compute_clusters(&snapshot, similarity, config.cluster_threshold);

    tracing::info!(
        tenant = tenant_id,
        phrases = snapshot.len(),
        clusters = clusters.len(),
        threshold = config.cluster_threshold,
        "Cluster analysis complete"
    );
    Ok(clusters)
}

fn cluster_category(
    category: &str,
    usage: &BTreeMap<&str, i64>,
    similarity: &dyn SimilarityMeasure,
    threshold: f64,
) -> Vec<Cluster> {
    let texts: Vec<&str> = usage.keys().copied().collect();
    let keys: Vec<String> = texts.iter().map(|t| normalize_for_match(t)).collect();
    let n = texts.len();

    let mut adjacent = vec![vec![false; n]; n];
    let mut edges: Vec<(f64, usize, usize)> = Vec::new();
    for i in 0..n {
        for j in (i + 1)..n {
            let score = similarity.similarity(&keys[i], &keys[j]);
            if score >= threshold {
                adjacent[i][j] = true;
                adjacent[j][i] = true;
                edges.push((score, i, j));
            }
        }
    }

    // Strongest edges seed clusters first; index order breaks ties since
    // `texts` is sorted.
    edges.sort_by(|a, b| {
        b.0.total_cmp(&a.0)
            .then_with(|| a.1.cmp(&b.1))
            .then_with(|| a.2.cmp(&b.2))
    });

    let mut scan_order: Vec<usize> = (0..n).collect();
    scan_order.sort_by(|&a, &b| {
        usage[texts[b]]
            .cmp(&usage[texts[a]])
            .then_with(|| texts[a].cmp(texts[b]))
    });

    let mut assigned = vec![false; n];
    let mut clusters = Vec::new();

    for &(_, a, b) in &edges {
        if assigned[a] || assigned[b] {
            continue;
        }
        let mut members = vec![a, b];
        assigned[a] = true;
        assigned[b] = true;

        for &candidate in &scan_order {
            if assigned[candidate] {
                continue;
            }
            if members.iter().all(|&m| adjacent[m][candidate]) {
                members.push(candidate);
                assigned[candidate] = true;
            }
        }

        if members.len() >= 2 {
            clusters.push(build_cluster(category, &members, &texts, usage));
        }
    }

    clusters
}

fn build_cluster(
    category: &str,
    members: &[usize],
    texts: &[&str],
    usage: &BTreeMap<&str, i64>,
) -> Cluster {
    let mut members: Vec<ClusterMember> = members
        .iter()
        .map(|&i| ClusterMember {
            description: texts[i].to_string(),
            usage: usage[texts[i]],
        })
        .collect();
    members.sort_by(|a, b| {
        b.usage
            .cmp(&a.usage)
            .then_with(|| a.description.cmp(&b.description))
    });

    let total_usage = members.iter().map(|m| m.usage).sum();
    let suggested_canonical = members[0].description.clone();

    Cluster {
        category: category.to_string(),
        members,
        total_usage,
        suggested_canonical,
    }
}
