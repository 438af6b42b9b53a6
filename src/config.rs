use crate::optimize::cluster::{Linkage, Metric};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

const DEFAULT_MAX_FEATURES: usize = 1000;
const DEFAULT_MIN_DF: usize = 2;
const DEFAULT_MAX_DF: f64 = 0.8;
const DEFAULT_MIN_TOKEN_LEN: usize = 2;

const DEFAULT_N_CLUSTERS: usize = 10;

/// 40% of a folder's bookmarks must share the dominant topic for the folder
/// to survive reorganization unchanged.
const DEFAULT_COHERENCE_THRESHOLD: f64 = 0.4;
/// 40% of a cluster's bookmarks must share a token before it names the group.
const DEFAULT_NAME_MIN_FRACTION: f64 = 0.4;

const DEFAULT_VISIT_THRESHOLD: f64 = 10.0;
const DEFAULT_QUICK_ACCESS_NAME: &str = "Quick Access";

/// Term-weighting parameters for the feature builder.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VectorizerConfig {
    /// Vocabulary cap; least informative terms are dropped beyond it.
    #[serde(default = "default_max_features")]
    pub max_features: usize,

    /// A term must appear in at least this many bookmarks to be admitted.
    #[serde(default = "default_min_df")]
    pub min_df: usize,

    /// Terms appearing in more than this fraction of bookmarks are excluded.
    #[serde(default = "default_max_df")]
    pub max_df: f64,

    /// Minimum alphabetic token length.
    #[serde(default = "default_min_token_len")]
    pub min_token_len: usize,

    /// Generate bigrams in addition to unigrams.
    #[serde(default = "default_true")]
    pub bigrams: bool,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            max_features: DEFAULT_MAX_FEATURES,
            min_df: DEFAULT_MIN_DF,
            max_df: DEFAULT_MAX_DF,
            min_token_len: DEFAULT_MIN_TOKEN_LEN,
            bigrams: true,
        }
    }
}

fn default_max_features() -> usize {
    DEFAULT_MAX_FEATURES
}

fn default_min_df() -> usize {
    DEFAULT_MIN_DF
}

fn default_max_df() -> f64 {
    DEFAULT_MAX_DF
}

fn default_min_token_len() -> usize {
    DEFAULT_MIN_TOKEN_LEN
}

fn default_true() -> bool {
    true
}

/// Cluster engine parameters, including the domain-keyword fallback mapping.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClusteringConfig {
    /// Target number of topic clusters.
    #[serde(default = "default_n_clusters")]
    pub n_clusters: usize,

    #[serde(default)]
    pub metric: Metric,

    #[serde(default)]
    pub linkage: Linkage,

    /// Domain keyword -> category label, used when vectorization degenerates
    /// or the collection is smaller than the cluster target. Unmatched hosts
    /// land one label past the highest configured category.
    #[serde(default = "default_domain_categories")]
    pub domain_categories: BTreeMap<String, u32>,

    /// Allow the domain fallback. When disabled, conditions that would
    /// require it abort the run instead.
    #[serde(default = "default_true")]
    pub fallback_enabled: bool,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            n_clusters: DEFAULT_N_CLUSTERS,
            metric: Metric::default(),
            linkage: Linkage::default(),
            domain_categories: default_domain_categories(),
            fallback_enabled: true,
        }
    }
}

fn default_n_clusters() -> usize {
    DEFAULT_N_CLUSTERS
}

fn default_domain_categories() -> BTreeMap<String, u32> {
    [
        ("google", 0),
        ("gmail", 0),
        ("youtube", 0),
        ("github", 1),
        ("gitlab", 1),
        ("bitbucket", 1),
        ("amazon", 2),
        ("ebay", 2),
        ("walmart", 2),
        ("facebook", 3),
        ("instagram", 3),
        ("twitter", 3),
        ("linkedin", 4),
        ("indeed", 4),
        ("glassdoor", 4),
        ("stackoverflow", 5),
        ("stackexchange", 5),
        ("quora", 5),
        ("reddit", 6),
        ("pinterest", 6),
        ("tumblr", 6),
        ("dropbox", 7),
        ("onedrive", 7),
        ("box", 7),
        ("netflix", 8),
        ("spotify", 8),
        ("hulu", 8),
        ("wikipedia", 9),
        ("scholar", 9),
        ("research", 9),
        ("news", 10),
        ("reuters", 10),
        ("bloomberg", 10),
        ("weather", 11),
        ("maps", 11),
        ("calendar", 11),
        ("bank", 12),
        ("paypal", 12),
        ("venmo", 12),
        ("health", 13),
        ("medical", 13),
        ("fitness", 13),
        ("travel", 14),
        ("booking", 14),
        ("airline", 14),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

/// Folder-coherence and cluster-naming parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// A folder is kept intact when at least this fraction of its bookmarks
    /// share the dominant cluster label.
    #[serde(default = "default_coherence_threshold")]
    pub coherence_threshold: f64,

    /// A token must be shared by at least this fraction of a cluster's
    /// bookmarks to name the group.
    #[serde(default = "default_name_min_fraction")]
    pub name_min_fraction: f64,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            coherence_threshold: DEFAULT_COHERENCE_THRESHOLD,
            name_min_fraction: DEFAULT_NAME_MIN_FRACTION,
        }
    }
}

fn default_coherence_threshold() -> f64 {
    DEFAULT_COHERENCE_THRESHOLD
}

fn default_name_min_fraction() -> f64 {
    DEFAULT_NAME_MIN_FRACTION
}

/// Quick-access promotion rules.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PromotionConfig {
    /// Hosts promoted unconditionally (frequently used tools).
    #[serde(default = "default_tool_domains")]
    pub tool_domains: BTreeSet<String>,

    /// Keywords promoting a bookmark when found in its title or url.
    #[serde(default = "default_keywords")]
    pub keywords: BTreeSet<String>,

    /// Bookmarks whose visit hint strictly exceeds this are promoted.
    #[serde(default = "default_visit_threshold")]
    pub visit_threshold: f64,

    /// Original folder names whose members are promoted (e.g. a browser's
    /// bookmarks bar).
    #[serde(default)]
    pub pinned_folders: BTreeSet<String>,

    /// Name of the top-level folder promoted bookmarks are moved into.
    #[serde(default = "default_quick_access_name")]
    pub quick_access_name: String,
}

impl Default for PromotionConfig {
    fn default() -> Self {
        Self {
            tool_domains: default_tool_domains(),
            keywords: default_keywords(),
            visit_threshold: DEFAULT_VISIT_THRESHOLD,
            pinned_folders: BTreeSet::new(),
            quick_access_name: DEFAULT_QUICK_ACCESS_NAME.to_string(),
        }
    }
}

fn default_tool_domains() -> BTreeSet<String> {
    [
        "google.com",
        "gmail.com",
        "github.com",
        "stackoverflow.com",
        "wikipedia.org",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_keywords() -> BTreeSet<String> {
    [
        "canvas",
        "class",
        "lecture",
        "homework",
        "assignment",
        "course",
        "syllabus",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_visit_threshold() -> f64 {
    DEFAULT_VISIT_THRESHOLD
}

fn default_quick_access_name() -> String {
    DEFAULT_QUICK_ACCESS_NAME.to_string()
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub vectorizer: VectorizerConfig,
    #[serde(default)]
    pub clustering: ClusteringConfig,
    #[serde(default)]
    pub reconcile: ReconcileConfig,
    #[serde(default)]
    pub promotion: PromotionConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("clustering.n_clusters must be at least 1")]
    ZeroClusterCount,

    #[error("vectorizer.min_df must be at least 1")]
    ZeroMinDf,

    #[error("vectorizer.max_features must be at least 1")]
    ZeroMaxFeatures,

    #[error("vectorizer.max_df must be within (0.0, 1.0], got {0}")]
    MaxDfOutOfRange(f64),

    #[error("{field} must be within [0.0, 1.0], got {value}")]
    FractionOutOfRange { field: &'static str, value: f64 },

    #[error("ward linkage requires the euclidean metric")]
    WardRequiresEuclidean,

    #[error("promotion.visit_threshold must not be negative, got {0}")]
    NegativeVisitThreshold(f64),

    #[error("clustering.domain_categories contains an empty keyword")]
    EmptyDomainKeyword,

    #[error("{clusters} clusters requested for {bookmarks} bookmarks and the domain fallback is disabled")]
    TooFewBookmarks { clusters: usize, bookmarks: usize },

    #[error("feature vectors are degenerate and the domain fallback is disabled")]
    DegenerateWithoutFallback,
}

impl Config {
    /// Reject out-of-domain values before the pipeline starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.clustering.n_clusters == 0 {
            return Err(ConfigError::ZeroClusterCount);
        }
        if self.vectorizer.min_df == 0 {
            return Err(ConfigError::ZeroMinDf);
        }
        if self.vectorizer.max_features == 0 {
            return Err(ConfigError::ZeroMaxFeatures);
        }
        if !(self.vectorizer.max_df > 0.0 && self.vectorizer.max_df <= 1.0) {
            return Err(ConfigError::MaxDfOutOfRange(self.vectorizer.max_df));
        }
        if !(0.0..=1.0).contains(&self.reconcile.coherence_threshold) {
            return Err(ConfigError::FractionOutOfRange {
                field: "reconcile.coherence_threshold",
                value: self.reconcile.coherence_threshold,
            });
        }
        if !(0.0..=1.0).contains(&self.reconcile.name_min_fraction) {
            return Err(ConfigError::FractionOutOfRange {
                field: "reconcile.name_min_fraction",
                value: self.reconcile.name_min_fraction,
            });
        }
        if self.clustering.linkage == Linkage::Ward && self.clustering.metric != Metric::Euclidean {
            return Err(ConfigError::WardRequiresEuclidean);
        }
        if self.promotion.visit_threshold < 0.0 {
            return Err(ConfigError::NegativeVisitThreshold(
                self.promotion.visit_threshold,
            ));
        }
        if self.clustering.domain_categories.keys().any(|k| k.is_empty()) {
            return Err(ConfigError::EmptyDomainKeyword);
        }

        Ok(())
    }

    /// Load the configuration from a YAML file, creating it with defaults
    /// when it does not exist yet.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        if !path.exists() {
            let default = Self::default();
            std::fs::write(path, serde_yml::to_string(&default)?)
                .with_context(|| format!("writing default config to {}", path.display()))?;
            return Ok(default);
        }

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let config: Self = serde_yml::from_str(&text)
            .with_context(|| format!("config {} is malformed", path.display()))?;
        config.validate()?;

        Ok(config)
    }
}
