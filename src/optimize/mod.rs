//! Bookmark tree optimization pipeline.
//!
//! Runs the stages strictly in order over one collection:
//! feature building, topic clustering, folder reconciliation, and
//! quick-access promotion. A fatal error at any stage aborts the run;
//! non-fatal conditions accumulate into the returned [`RunReport`].
//!
//! # Architecture
//!
//! - `features`: tf-idf vectors over title/URL/folder tokens
//! - `cluster`: agglomerative clustering with a domain-keyword fallback
//! - `reconcile`: merges cluster labels with the original folder tree
//! - `promote`: lifts frequently-used bookmarks into quick access

pub mod cluster;
pub mod features;
pub mod promote;
pub mod reconcile;

pub use cluster::{ClusterAssignment, ClusteringStrategy, Linkage, Metric};
pub use features::{FeatureSet, FeatureVector};

use crate::bookmarks::{self, Bookmark, FolderNode, InputError};
use crate::config::{Config, ConfigError};
use std::collections::HashMap;

#[derive(Debug, thiserror::Error)]
pub enum OptimizeError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Non-fatal findings of one pipeline run, returned next to the tree.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub total_bookmarks: usize,
    pub strategy: ClusteringStrategy,
    pub degenerate_features: bool,
    pub cluster_count: usize,
    pub promoted: usize,
    pub warnings: Vec<String>,
}

/// The final tree plus the run report.
#[derive(Debug, Clone)]
pub struct Optimized {
    pub tree: FolderNode,
    pub report: RunReport,
}

/// Run the whole pipeline over one bookmark collection.
pub fn run(bookmarks: &[Bookmark], config: &Config) -> Result<Optimized, OptimizeError> {
    config.validate()?;
    bookmarks::validate(bookmarks)?;

    let mut warnings = vec![];

    let features = features::build(bookmarks, &config.vectorizer);
    let degenerate = features.is_degenerate();
    if degenerate {
        log::warn!("feature vectors are degenerate; topic clustering quality is reduced");
        warnings
            .push("feature vectors are degenerate; falling back to domain clustering".to_string());
    }

    if cluster::needs_fallback(&features, bookmarks.len(), &config.clustering)
        && !config.clustering.fallback_enabled
    {
        let err = if bookmarks.len() < config.clustering.n_clusters {
            ConfigError::TooFewBookmarks {
                clusters: config.clustering.n_clusters,
                bookmarks: bookmarks.len(),
            }
        } else {
            ConfigError::DegenerateWithoutFallback
        };
        return Err(err.into());
    }

    if !degenerate && bookmarks.len() < config.clustering.n_clusters {
        warnings.push(format!(
            "{} bookmarks for {} clusters; falling back to domain clustering",
            bookmarks.len(),
            config.clustering.n_clusters
        ));
    }

    let (assignment, strategy) = cluster::assign(bookmarks, &features, &config.clustering);

    let mut tree = reconcile::reconcile(bookmarks, &assignment, &config.reconcile);

    let original_paths: HashMap<u64, Vec<String>> = bookmarks
        .iter()
        .map(|b| (b.id, b.folder_path.clone()))
        .collect();
    let promoted = promote::promote(&mut tree, &original_paths, &config.promotion);

    Ok(Optimized {
        tree,
        report: RunReport {
            total_bookmarks: bookmarks.len(),
            strategy,
            degenerate_features: degenerate,
            cluster_count: assignment.n_labels() as usize,
            promoted,
            warnings,
        },
    })
}
