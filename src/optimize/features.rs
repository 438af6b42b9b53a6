//! Term-weighted feature vectors for bookmark similarity.
//!
//! Each bookmark becomes one sparse tf-idf vector over word and bigram
//! tokens drawn from its title, URL host and path, and original folder
//! names. Document-frequency bounds and a vocabulary cap keep the term
//! space focused; a collection that filters down to nothing is reported
//! as degenerate rather than clustered.

use crate::bookmarks::Bookmark;
use crate::config::VectorizerConfig;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, HashMap, HashSet};

static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-zA-Z]+").expect("static token pattern"));

/// `www.` prefix and the generic TLD suffixes carry no topical signal.
static HOST_NOISE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^www\.|\.com$|\.org$|\.net$|\.edu$|\.gov$").expect("static host pattern")
});

static STOPWORDS: Lazy<HashSet<String>> =
    Lazy::new(|| stop_words::get(stop_words::LANGUAGE::English).into_iter().collect());

/// Sparse token -> weight map for one bookmark. Only nonzero weights are
/// stored, so an empty map is the all-zero (degenerate) vector.
#[derive(Debug, Clone, Default)]
pub struct FeatureVector {
    weights: BTreeMap<String, f64>,
}

impl FeatureVector {
    pub fn is_zero(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn weight(&self, term: &str) -> f64 {
        self.weights.get(term).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.weights.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn dot(&self, other: &FeatureVector) -> f64 {
        // iterate the smaller side
        let (small, large) = if self.weights.len() <= other.weights.len() {
            (self, other)
        } else {
            (other, self)
        };
        small
            .iter()
            .map(|(term, w)| w * large.weight(term))
            .sum()
    }

    pub fn squared_distance(&self, other: &FeatureVector) -> f64 {
        let mut sum = 0.0;
        for (term, w) in self.iter() {
            let d = w - other.weight(term);
            sum += d * d;
        }
        for (term, w) in other.iter() {
            if self.weights.get(term).is_none() {
                sum += w * w;
            }
        }
        sum
    }
}

/// The full collection's vectors, aligned with the input bookmark order.
#[derive(Debug, Clone)]
pub struct FeatureSet {
    vectors: Vec<FeatureVector>,
    vocabulary_len: usize,
}

impl FeatureSet {
    pub fn vectors(&self) -> &[FeatureVector] {
        &self.vectors
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary_len
    }

    /// True when every vector is all-zero. Signals the cluster engine to
    /// take its domain fallback instead of the primary path.
    pub fn is_degenerate(&self) -> bool {
        self.vectors.iter().all(|v| v.is_zero())
    }
}

/// Lowercase alphabetic tokens of at least `min_len` characters, stopwords
/// removed.
pub fn tokenize(text: &str, min_len: usize) -> Vec<String> {
    let lower = text.to_lowercase();
    TOKEN_RE
        .find_iter(&lower)
        .map(|m| m.as_str().to_string())
        .filter(|t| t.len() >= min_len && !STOPWORDS.contains(t))
        .collect()
}

/// The text a bookmark is vectorized from: title, de-noised host, URL path
/// segments, and the original folder names.
fn document_text(bookmark: &Bookmark) -> String {
    let mut text = bookmark.title.to_lowercase();

    if let Ok(parsed) = url::Url::parse(&bookmark.url) {
        if let Some(host) = parsed.host_str() {
            let host_lower = host.to_lowercase();
            let host = HOST_NOISE_RE.replace_all(&host_lower, "");
            text.push(' ');
            text.push_str(&host);
        }
        text.push(' ');
        text.push_str(&parsed.path().replace('/', " "));
    }

    for folder in &bookmark.folder_path {
        text.push(' ');
        text.push_str(&folder.to_lowercase());
    }

    text
}

fn terms_for(bookmark: &Bookmark, cfg: &VectorizerConfig) -> Vec<String> {
    let tokens = tokenize(&document_text(bookmark), cfg.min_token_len);
    let mut terms = tokens.clone();
    if cfg.bigrams {
        for pair in tokens.windows(2) {
            terms.push(format!("{} {}", pair[0], pair[1]));
        }
    }
    terms
}

/// Build one feature vector per bookmark over the whole collection.
pub fn build(bookmarks: &[Bookmark], cfg: &VectorizerConfig) -> FeatureSet {
    let docs: Vec<Vec<String>> = bookmarks.iter().map(|b| terms_for(b, cfg)).collect();
    let n = docs.len();

    // document frequency per term
    let mut df: HashMap<&str, usize> = HashMap::new();
    for doc in &docs {
        let distinct: HashSet<&str> = doc.iter().map(|t| t.as_str()).collect();
        for term in distinct {
            *df.entry(term).or_insert(0) += 1;
        }
    }

    // admit terms within the document-frequency bounds
    let mut admitted: Vec<(&str, usize)> = df
        .into_iter()
        .filter(|&(_, count)| count >= cfg.min_df && count as f64 <= cfg.max_df * n as f64)
        .collect();

    // cap the vocabulary, dropping the least frequent terms first
    admitted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    admitted.truncate(cfg.max_features);

    let idf: HashMap<&str, f64> = admitted
        .iter()
        .map(|&(term, count)| {
            let idf = ((1.0 + n as f64) / (1.0 + count as f64)).ln() + 1.0;
            (term, idf)
        })
        .collect();

    let vectors = docs
        .iter()
        .map(|doc| {
            let mut tf: HashMap<&str, usize> = HashMap::new();
            for term in doc {
                if idf.contains_key(term.as_str()) {
                    *tf.entry(term.as_str()).or_insert(0) += 1;
                }
            }

            let mut weights: BTreeMap<String, f64> = tf
                .into_iter()
                .map(|(term, count)| (term.to_string(), count as f64 * idf[term]))
                .collect();

            // l2 normalization keeps distances comparable across documents
            let norm = weights.values().map(|w| w * w).sum::<f64>().sqrt();
            if norm > 0.0 {
                for w in weights.values_mut() {
                    *w /= norm;
                }
            }

            FeatureVector { weights }
        })
        .collect();

    let set = FeatureSet {
        vectors,
        vocabulary_len: idf.len(),
    };

    log::debug!(
        "vectorized {} bookmarks over {} terms",
        n,
        set.vocabulary_len
    );

    set
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bm(id: u64, title: &str, url: &str) -> Bookmark {
        Bookmark {
            id,
            title: title.to_string(),
            url: url.to_string(),
            folder_path: vec![],
            visit_hint: 0.0,
        }
    }

    fn cfg() -> VectorizerConfig {
        VectorizerConfig {
            max_features: 100,
            min_df: 1,
            max_df: 1.0,
            min_token_len: 2,
            bigrams: true,
        }
    }

    #[test]
    fn test_tokenize_lowercases_and_filters() {
        let tokens = tokenize("The Rust Programming Language", 2);
        assert_eq!(tokens, vec!["rust", "programming", "language"]);
    }

    #[test]
    fn test_tokenize_drops_short_tokens() {
        let tokens = tokenize("m x rust compiler", 2);
        assert_eq!(tokens, vec!["rust", "compiler"]);
    }

    #[test]
    fn test_bigrams_are_generated() {
        let bookmarks = vec![
            bm(1, "rust programming", "https://example.com/"),
            bm(2, "rust programming", "https://example.net/"),
        ];
        let set = build(&bookmarks, &cfg());
        assert!(set.vectors()[0].weight("rust programming") > 0.0);
    }

    #[test]
    fn test_max_df_excludes_ubiquitous_terms() {
        let mut config = cfg();
        config.max_df = 0.5;
        let bookmarks = vec![
            bm(1, "rust guide", "https://one.example/"),
            bm(2, "rust recipes", "https://two.example/"),
            bm(3, "rust news", "https://three.example/"),
        ];
        let set = build(&bookmarks, &config);
        // "rust" appears in every document and is excluded
        assert!(set.vectors().iter().all(|v| v.weight("rust") == 0.0));
    }

    #[test]
    fn test_min_df_starves_tiny_collections() {
        let mut config = cfg();
        config.min_df = 3;
        let bookmarks = vec![
            bm(1, "rust guide", "https://one.example/"),
            bm(2, "rust recipes", "https://two.example/"),
        ];
        let set = build(&bookmarks, &config);
        assert!(set.is_degenerate());
        assert_eq!(set.vocabulary_len(), 0);
    }

    #[test]
    fn test_vectors_are_l2_normalized() {
        let bookmarks = vec![
            bm(1, "rust rust rust guide", "https://one.example/"),
            bm(2, "python news", "https://two.example/"),
        ];
        let set = build(&bookmarks, &cfg());
        for vector in set.vectors() {
            let norm: f64 = vector.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
            assert!((norm - 1.0).abs() < 1e-9, "norm was {norm}");
        }
    }

    #[test]
    fn test_host_noise_is_stripped() {
        let bookmarks = vec![
            bm(1, "kernel", "https://www.github.com/torvalds/linux"),
            bm(2, "compiler", "https://github.com/rust-lang/rust"),
        ];
        let set = build(&bookmarks, &cfg());
        assert!(set.vectors()[0].weight("github") > 0.0);
        assert!(set.vectors().iter().all(|v| v.weight("www") == 0.0));
        assert!(set.vectors().iter().all(|v| v.weight("com") == 0.0));
    }

    #[test]
    fn test_dot_and_distance() {
        let bookmarks = vec![
            bm(1, "rust guide", "https://one.example/"),
            bm(2, "rust guide", "https://one.example/"),
            bm(3, "pasta recipes", "https://two.example/"),
        ];
        let set = build(&bookmarks, &cfg());
        let [a, b, c] = [&set.vectors()[0], &set.vectors()[1], &set.vectors()[2]];

        assert!((a.dot(b) - 1.0).abs() < 1e-9);
        assert!(a.squared_distance(b) < 1e-9);
        assert!(a.squared_distance(c) > 0.5);
    }
}
