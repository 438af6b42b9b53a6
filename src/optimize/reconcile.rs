//! Merging cluster assignments back into a folder tree.
//!
//! Original folders whose bookmarks predominantly share one cluster label
//! are preserved verbatim, nested under a cluster-named top-level group.
//! Folders that straddle clusters are dissolved and their bookmarks
//! redistributed flat into each bookmark's own group. Group names come
//! from the most frequent non-stopword title token of the cluster.

use crate::bookmarks::{Bookmark, FolderNode};
use crate::config::ReconcileConfig;
use crate::optimize::cluster::ClusterAssignment;
use crate::optimize::features;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Tokens carrying no naming signal beyond the stopword list: web noise
/// left over from hosts and titles.
const WEB_NOISE: &[&str] = &[
    "com", "org", "net", "edu", "gov", "io", "www", "home", "page", "site", "official", "website",
];

/// At most this many secondary tokens join the primary in a group name.
const MAX_SECONDARY_TOKENS: usize = 2;

const MIN_NAME_TOKEN_LEN: usize = 3;

/// Build the reorganized tree (pre-promotion) from the assignment and the
/// original folder paths carried on the bookmarks.
pub fn reconcile(
    bookmarks: &[Bookmark],
    assignment: &ClusterAssignment,
    cfg: &ReconcileConfig,
) -> FolderNode {
    let labels = assignment.labels();
    let n_labels = assignment.n_labels() as usize;

    // original folders in encounter order, members in input order
    let mut order: Vec<Vec<String>> = vec![];
    let mut by_path: HashMap<Vec<String>, Vec<usize>> = HashMap::new();
    for (idx, bookmark) in bookmarks.iter().enumerate() {
        by_path
            .entry(bookmark.folder_path.clone())
            .or_insert_with(|| {
                order.push(bookmark.folder_path.clone());
                vec![]
            })
            .push(idx);
    }

    let names = cluster_names(bookmarks, labels, n_labels, cfg);

    let mut root = FolderNode::new("Bookmarks");
    for name in &names {
        root.children.push(FolderNode::new(name));
    }

    for path in &order {
        let indices = &by_path[path];

        // a pathless bookmark has no folder to preserve
        if path.is_empty() {
            for &i in indices {
                root.children[labels[i] as usize]
                    .bookmarks
                    .push(bookmarks[i].clone());
            }
            continue;
        }

        let (dominant, fraction) = dominant_label(indices, labels);
        if fraction >= cfg.coherence_threshold {
            // preserved verbatim, original nesting kept below the group
            let mut node = &mut root.children[dominant as usize];
            for segment in path {
                node = node.child_mut(segment);
            }
            for &i in indices {
                node.bookmarks.push(bookmarks[i].clone());
            }
        } else {
            // dissolved: flat redistribution by each bookmark's own label
            for &i in indices {
                root.children[labels[i] as usize]
                    .bookmarks
                    .push(bookmarks[i].clone());
            }
        }
    }

    root.prune_empty();
    root
}

/// Mode of the member labels; ties resolve to the lowest label id.
fn dominant_label(indices: &[usize], labels: &[u32]) -> (u32, f64) {
    let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
    for &i in indices {
        *counts.entry(labels[i]).or_insert(0) += 1;
    }

    let mut best_label = 0u32;
    let mut best_count = 0usize;
    for (&label, &count) in &counts {
        if count > best_count {
            best_label = label;
            best_count = count;
        }
    }

    (best_label, best_count as f64 / indices.len() as f64)
}

/// One display name per cluster label, deduplicated across clusters.
fn cluster_names(
    bookmarks: &[Bookmark],
    labels: &[u32],
    n_labels: usize,
    cfg: &ReconcileConfig,
) -> Vec<String> {
    let mut names = Vec::with_capacity(n_labels);
    let mut used: HashSet<String> = HashSet::new();

    for label in 0..n_labels {
        let members: Vec<&Bookmark> = bookmarks
            .iter()
            .zip(labels.iter())
            .filter(|(_, &l)| l as usize == label)
            .map(|(b, _)| b)
            .collect();

        let mut name = name_from_titles(&members, cfg.name_min_fraction)
            .unwrap_or_else(|| format!("Cluster {label}"));

        if !used.insert(name.clone()) {
            name = format!("{name} ({label})");
            used.insert(name.clone());
        }
        names.push(name);
    }

    names
}

/// Most frequent shared title token, with up to two secondary tokens that
/// clear the same fraction of the primary's count. `None` when no token is
/// shared widely enough.
fn name_from_titles(members: &[&Bookmark], min_fraction: f64) -> Option<String> {
    if members.is_empty() {
        return None;
    }

    // count bookmarks containing each token, not raw occurrences
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for bookmark in members {
        let distinct: HashSet<String> = features::tokenize(&bookmark.title, MIN_NAME_TOKEN_LEN)
            .into_iter()
            .filter(|t| !WEB_NOISE.contains(&t.as_str()))
            .collect();
        for token in distinct {
            *counts.entry(token).or_insert(0) += 1;
        }
    }

    // highest count wins; BTreeMap order makes ties lexical
    let mut primary: Option<(&str, usize)> = None;
    for (token, &count) in &counts {
        if primary.map_or(true, |(_, best)| count > best) {
            primary = Some((token.as_str(), count));
        }
    }
    let (primary, primary_count) = primary?;

    if (primary_count as f64) < min_fraction * members.len() as f64 {
        return None;
    }

    let mut secondary: Vec<(&str, usize)> = counts
        .iter()
        .filter(|(token, &count)| {
            token.as_str() != primary
                && !primary.contains(token.as_str())
                && count as f64 >= min_fraction * primary_count as f64
        })
        .map(|(token, &count)| (token.as_str(), count))
        .collect();
    secondary.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let mut name = capitalize(primary);
    for (token, _) in secondary.into_iter().take(MAX_SECONDARY_TOKENS) {
        name.push_str(" & ");
        name.push_str(&capitalize(token));
    }
    Some(name)
}

fn capitalize(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bm(id: u64, title: &str, path: &[&str]) -> Bookmark {
        Bookmark {
            id,
            title: title.to_string(),
            url: format!("https://example.com/{id}"),
            folder_path: path.iter().map(|s| s.to_string()).collect(),
            visit_hint: 0.0,
        }
    }

    fn cfg() -> ReconcileConfig {
        ReconcileConfig {
            coherence_threshold: 0.5,
            name_min_fraction: 0.4,
        }
    }

    fn assignment(raw: Vec<u32>) -> ClusterAssignment {
        ClusterAssignment::from_raw(raw)
    }

    fn find<'a>(node: &'a FolderNode, name: &str) -> Option<&'a FolderNode> {
        if node.name == name {
            return Some(node);
        }
        node.children.iter().find_map(|c| find(c, name))
    }

    #[test]
    fn test_coherent_folder_is_preserved() {
        let bookmarks = vec![
            bm(1, "rust compiler", &["Dev"]),
            bm(2, "rust parser", &["Dev"]),
            bm(3, "pasta carbonara", &["Food"]),
        ];
        let tree = reconcile(&bookmarks, &assignment(vec![0, 0, 1]), &cfg());

        let dev = find(&tree, "Dev").expect("Dev folder kept");
        assert_eq!(dev.bookmarks.len(), 2);
        let food = find(&tree, "Food").expect("Food folder kept");
        assert_eq!(food.bookmarks.len(), 1);
    }

    #[test]
    fn test_incoherent_folder_is_dissolved() {
        let bookmarks = vec![
            bm(1, "rust compiler", &["Mixed"]),
            bm(2, "pasta carbonara", &["Mixed"]),
            bm(3, "rust parser", &["Mixed"]),
            bm(4, "pasta bolognese", &["Mixed"]),
            bm(5, "rust macros", &["Mixed"]),
        ];
        // 3 of 5 share label 0: below a 0.7 threshold the folder dissolves
        let config = ReconcileConfig {
            coherence_threshold: 0.7,
            name_min_fraction: 0.4,
        };
        let tree = reconcile(&bookmarks, &assignment(vec![0, 1, 0, 1, 0]), &config);

        assert!(find(&tree, "Mixed").is_none());
        assert_eq!(tree.children.len(), 2);
        assert_eq!(tree.children[0].bookmarks.len(), 3);
        assert_eq!(tree.children[1].bookmarks.len(), 2);
        assert_eq!(tree.bookmark_count(), 5);
    }

    #[test]
    fn test_coherence_threshold_boundary_is_inclusive() {
        let bookmarks = vec![
            bm(1, "rust compiler", &["Half"]),
            bm(2, "pasta carbonara", &["Half"]),
        ];
        // dominant fraction is exactly 0.5 and the threshold is 0.5
        let tree = reconcile(&bookmarks, &assignment(vec![0, 1]), &cfg());
        let half = find(&tree, "Half").expect("folder at the boundary is coherent");
        assert_eq!(half.bookmarks.len(), 2);
    }

    #[test]
    fn test_dominant_tie_resolves_to_lowest_label() {
        let labels = vec![1, 0, 1, 0];
        let (label, fraction) = dominant_label(&[0, 1, 2, 3], &labels);
        assert_eq!(label, 0);
        assert!((fraction - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_nesting_below_group_is_preserved() {
        let bookmarks = vec![
            bm(1, "rust compiler", &["Dev", "Rust"]),
            bm(2, "rust parser", &["Dev", "Rust"]),
        ];
        let tree = reconcile(&bookmarks, &assignment(vec![0, 0]), &cfg());

        let group = &tree.children[0];
        let dev = &group.children[0];
        assert_eq!(dev.name, "Dev");
        let rust = &dev.children[0];
        assert_eq!(rust.name, "Rust");
        assert_eq!(rust.bookmarks.len(), 2);
    }

    #[test]
    fn test_pathless_bookmarks_are_distributed() {
        let bookmarks = vec![
            bm(1, "rust compiler", &[]),
            bm(2, "pasta carbonara", &[]),
        ];
        let tree = reconcile(&bookmarks, &assignment(vec![0, 1]), &cfg());

        assert_eq!(tree.children.len(), 2);
        assert_eq!(tree.children[0].bookmarks[0].id, 1);
        assert_eq!(tree.children[1].bookmarks[0].id, 2);
    }

    #[test]
    fn test_group_named_from_shared_token() {
        let bookmarks = vec![
            bm(1, "rust compiler", &["Dev"]),
            bm(2, "rust parser", &["Dev"]),
        ];
        let tree = reconcile(&bookmarks, &assignment(vec![0, 0]), &cfg());
        assert!(tree.children[0].name.starts_with("Rust"));
    }

    #[test]
    fn test_group_name_falls_back_to_cluster_number() {
        // nothing shared: each title token appears once, below 0.9
        let bookmarks = vec![
            bm(1, "alpha", &["A"]),
            bm(2, "beta", &["A"]),
            bm(3, "gamma", &["A"]),
        ];
        let config = ReconcileConfig {
            coherence_threshold: 0.4,
            name_min_fraction: 0.9,
        };
        let tree = reconcile(&bookmarks, &assignment(vec![0, 0, 0]), &config);
        assert_eq!(tree.children[0].name, "Cluster 0");
    }

    #[test]
    fn test_duplicate_group_names_are_disambiguated() {
        let bookmarks = vec![
            bm(1, "rust compiler", &["A"]),
            bm(2, "rust compiler", &["B"]),
        ];
        let tree = reconcile(&bookmarks, &assignment(vec![0, 1]), &cfg());
        let names: Vec<&str> = tree.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names.len(), 2);
        assert_ne!(names[0], names[1]);
    }

    #[test]
    fn test_no_bookmark_is_lost_or_duplicated() {
        let bookmarks = vec![
            bm(1, "rust compiler", &["Dev"]),
            bm(2, "pasta carbonara", &["Dev"]),
            bm(3, "rust parser", &["Dev", "Rust"]),
            bm(4, "garden soil", &[]),
        ];
        let tree = reconcile(&bookmarks, &assignment(vec![0, 1, 0, 2]), &cfg());

        let mut ids = vec![];
        tree.collect_ids(&mut ids);
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }
}
