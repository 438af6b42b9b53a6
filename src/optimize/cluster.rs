//! Topic clustering over bookmark feature vectors.
//!
//! The primary path is bottom-up agglomerative clustering with a
//! configurable metric and linkage rule, implemented with the
//! Lance-Williams distance update. When vectorization degenerates or the
//! collection is smaller than the cluster target, a domain-keyword
//! fallback assigns categories from the URL host instead.
//!
//! Everything here is deterministic: merge ties resolve to the lowest
//! index pair, fallback categories are tried in lexical key order, and
//! final labels are numbered by first appearance in input order.

use crate::bookmarks::{self, Bookmark};
use crate::config::ClusteringConfig;
use crate::optimize::features::{FeatureSet, FeatureVector};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    #[default]
    Euclidean,
    Cosine,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Linkage {
    #[default]
    Ward,
    Average,
    Complete,
    Single,
}

/// Which path produced the assignment. Selected once per run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClusteringStrategy {
    Agglomerative,
    DomainFallback,
}

impl ClusteringStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClusteringStrategy::Agglomerative => "agglomerative",
            ClusteringStrategy::DomainFallback => "domain-fallback",
        }
    }
}

/// A total assignment of cluster labels, aligned with the input bookmark
/// order. Labels are contiguous from 0.
#[derive(Debug, Clone)]
pub struct ClusterAssignment {
    labels: Vec<u32>,
    n_labels: u32,
}

impl ClusterAssignment {
    /// Renumber arbitrary raw labels densely by first appearance.
    pub(crate) fn from_raw(raw: Vec<u32>) -> Self {
        let mut dense: HashMap<u32, u32> = HashMap::new();
        let mut labels = Vec::with_capacity(raw.len());
        let mut next = 0u32;
        for value in raw {
            let label = match dense.get(&value) {
                Some(&label) => label,
                None => {
                    let label = next;
                    dense.insert(value, label);
                    next += 1;
                    label
                }
            };
            labels.push(label);
        }
        ClusterAssignment {
            labels,
            n_labels: next,
        }
    }

    pub fn labels(&self) -> &[u32] {
        &self.labels
    }

    pub fn n_labels(&self) -> u32 {
        self.n_labels
    }

    /// Label lookup by bookmark id over the aligned input slice.
    pub fn by_id(&self, bookmarks: &[Bookmark]) -> BTreeMap<u64, u32> {
        bookmarks
            .iter()
            .zip(self.labels.iter())
            .map(|(b, &label)| (b.id, label))
            .collect()
    }
}

/// True when the primary path cannot run: degenerate vectors, or fewer
/// bookmarks than target clusters.
pub fn needs_fallback(features: &FeatureSet, n_bookmarks: usize, cfg: &ClusteringConfig) -> bool {
    features.is_degenerate() || n_bookmarks < cfg.n_clusters
}

/// Produce the cluster assignment for the whole collection.
pub fn assign(
    bookmarks: &[Bookmark],
    features: &FeatureSet,
    cfg: &ClusteringConfig,
) -> (ClusterAssignment, ClusteringStrategy) {
    if needs_fallback(features, bookmarks.len(), cfg) {
        log::info!("clustering via domain fallback");
        let raw = domain_fallback(bookmarks, &cfg.domain_categories);
        (ClusterAssignment::from_raw(raw), ClusteringStrategy::DomainFallback)
    } else {
        let raw = agglomerative(features.vectors(), cfg);
        (ClusterAssignment::from_raw(raw), ClusteringStrategy::Agglomerative)
    }
}

fn distance(a: &FeatureVector, b: &FeatureVector, metric: Metric) -> f64 {
    match metric {
        Metric::Euclidean => a.squared_distance(b).sqrt(),
        Metric::Cosine => {
            // vectors are l2-normalized; zero vectors are maximally distant
            // from everything except each other
            match (a.is_zero(), b.is_zero()) {
                (true, true) => 0.0,
                (true, false) | (false, true) => 1.0,
                (false, false) => (1.0 - a.dot(b)).max(0.0),
            }
        }
    }
}

/// Bottom-up merging until the target cluster count remains. Distances
/// between merged clusters follow the configured linkage via the
/// Lance-Williams recurrence.
fn agglomerative(vectors: &[FeatureVector], cfg: &ClusteringConfig) -> Vec<u32> {
    let n = vectors.len();
    if n == 0 {
        return vec![];
    }
    let target = cfg.n_clusters.min(n);

    let mut dist = vec![vec![0.0f64; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let d = distance(&vectors[i], &vectors[j], cfg.metric);
            dist[i][j] = d;
            dist[j][i] = d;
        }
    }

    let mut active = vec![true; n];
    let mut size = vec![1usize; n];
    let mut members: Vec<Vec<usize>> = (0..n).map(|i| vec![i]).collect();
    let mut remaining = n;

    while remaining > target {
        // closest active pair; strict < keeps the lowest (i, j) on ties
        let mut best = (0usize, 0usize, f64::INFINITY);
        for i in 0..n {
            if !active[i] {
                continue;
            }
            for j in (i + 1)..n {
                if active[j] && dist[i][j] < best.2 {
                    best = (i, j, dist[i][j]);
                }
            }
        }
        let (a, b, d_ab) = best;

        for k in 0..n {
            if !active[k] || k == a || k == b {
                continue;
            }
            let (na, nb, nk) = (size[a] as f64, size[b] as f64, size[k] as f64);
            let updated = match cfg.linkage {
                Linkage::Single => dist[a][k].min(dist[b][k]),
                Linkage::Complete => dist[a][k].max(dist[b][k]),
                Linkage::Average => (na * dist[a][k] + nb * dist[b][k]) / (na + nb),
                Linkage::Ward => {
                    let sq = ((na + nk) * dist[a][k] * dist[a][k]
                        + (nb + nk) * dist[b][k] * dist[b][k]
                        - nk * d_ab * d_ab)
                        / (na + nb + nk);
                    sq.max(0.0).sqrt()
                }
            };
            dist[a][k] = updated;
            dist[k][a] = updated;
        }

        size[a] += size[b];
        active[b] = false;
        let absorbed = std::mem::take(&mut members[b]);
        members[a].extend(absorbed);
        remaining -= 1;
    }

    let mut raw = vec![0u32; n];
    let mut cluster = 0u32;
    for i in 0..n {
        if active[i] {
            for &point in &members[i] {
                raw[point] = cluster;
            }
            cluster += 1;
        }
    }
    raw
}

/// Keyword match each bookmark's host against the configured categories.
/// Unmatched bookmarks land one label past the highest configured category.
fn domain_fallback(bookmarks: &[Bookmark], categories: &BTreeMap<String, u32>) -> Vec<u32> {
    let uncategorized = categories.values().max().map(|&m| m + 1).unwrap_or(0);
    bookmarks
        .iter()
        .map(|bookmark| {
            let host = bookmarks::host(&bookmark.url).unwrap_or_default();
            categories
                .iter()
                .find(|(keyword, _)| host.contains(keyword.as_str()))
                .map(|(_, &label)| label)
                .unwrap_or(uncategorized)
        })
        .collect()
}
