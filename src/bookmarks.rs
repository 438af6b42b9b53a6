use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::hash::Hash;
use url::Url;

/// A single bookmark record as delivered by the extraction step.
///
/// `folder_path` is the original nesting (outermost folder first) and
/// `visit_hint` is an optional frequency/recency signal; records without one
/// default to 0.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: u64,

    pub title: String,
    pub url: String,

    #[serde(default)]
    pub folder_path: Vec<String>,

    #[serde(default)]
    pub visit_hint: f64,
}

impl Hash for Bookmark {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state)
    }
}

impl PartialEq for Bookmark {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Bookmark {}

/// A folder in the bookmark tree. Children are owned by their parent and the
/// tree is only ever built top-down, so no back-references exist.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FolderNode {
    pub name: String,
    #[serde(default)]
    pub children: Vec<FolderNode>,
    #[serde(default)]
    pub bookmarks: Vec<Bookmark>,
}

impl FolderNode {
    pub fn new(name: &str) -> Self {
        FolderNode {
            name: name.to_string(),
            children: vec![],
            bookmarks: vec![],
        }
    }

    /// Find a direct child by name, creating it at the end of the child list
    /// if it does not exist yet.
    pub fn child_mut(&mut self, name: &str) -> &mut FolderNode {
        if let Some(idx) = self.children.iter().position(|c| c.name == name) {
            &mut self.children[idx]
        } else {
            self.children.push(FolderNode::new(name));
            self.children.last_mut().expect("child was just pushed")
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bookmarks.is_empty() && self.children.is_empty()
    }

    /// Drop empty folders anywhere below this node.
    pub fn prune_empty(&mut self) {
        for child in self.children.iter_mut() {
            child.prune_empty();
        }
        self.children.retain(|c| !c.is_empty());
    }

    pub fn bookmark_count(&self) -> usize {
        self.bookmarks.len()
            + self
                .children
                .iter()
                .map(|c| c.bookmark_count())
                .sum::<usize>()
    }

    /// Collect every bookmark id in this subtree, in tree order.
    pub fn collect_ids(&self, out: &mut Vec<u64>) {
        out.extend(self.bookmarks.iter().map(|b| b.id));
        for child in &self.children {
            child.collect_ids(out);
        }
    }
}

/// Rebuild the original folder tree from the records' folder paths,
/// preserving input order within each folder.
pub fn build_tree(bookmarks: &[Bookmark]) -> FolderNode {
    let mut root = FolderNode::new("Bookmarks");
    for bookmark in bookmarks {
        let mut node = &mut root;
        for segment in &bookmark.folder_path {
            node = node.child_mut(segment);
        }
        node.bookmarks.push(bookmark.clone());
    }
    root
}

/// Extract the lowercased host of a bookmark URL, without a `www.` prefix.
/// Returns `None` for URLs that do not parse or have no host.
pub fn host(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    Some(host.strip_prefix("www.").unwrap_or(&host).to_string())
}

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("extraction produced zero bookmarks")]
    Empty,

    #[error("duplicate bookmark id {0}")]
    DuplicateId(u64),

    #[error("bookmark {0} has neither a title nor a url")]
    Blank(u64),
}

/// Minimal validation of the extraction output. Runs before anything else;
/// a failure here aborts the run.
pub fn validate(bookmarks: &[Bookmark]) -> Result<(), InputError> {
    if bookmarks.is_empty() {
        return Err(InputError::Empty);
    }

    let mut seen = HashSet::new();
    for bookmark in bookmarks {
        if !seen.insert(bookmark.id) {
            return Err(InputError::DuplicateId(bookmark.id));
        }
        if bookmark.title.trim().is_empty() && bookmark.url.trim().is_empty() {
            return Err(InputError::Blank(bookmark.id));
        }
    }

    Ok(())
}
