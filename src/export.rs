//! Structured JSON export of the optimized tree.
//!
//! The export maps folder names to their bookmarks and subfolders. Keys
//! are sorted and writes go through a temp file plus rename, so the
//! output is byte-stable across identical runs and never half-written.

use crate::bookmarks::{Bookmark, FolderNode};
use anyhow::Context;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct ExportBookmark {
    pub id: u64,
    pub title: String,
    pub url: String,
    pub visit_hint: f64,
}

impl From<&Bookmark> for ExportBookmark {
    fn from(bookmark: &Bookmark) -> Self {
        ExportBookmark {
            id: bookmark.id,
            title: bookmark.title.clone(),
            url: bookmark.url.clone(),
            visit_hint: bookmark.visit_hint,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ExportFolder {
    pub bookmarks: Vec<ExportBookmark>,
    pub subfolders: BTreeMap<String, ExportFolder>,
}

impl From<&FolderNode> for ExportFolder {
    fn from(node: &FolderNode) -> Self {
        ExportFolder {
            bookmarks: node.bookmarks.iter().map(ExportBookmark::from).collect(),
            subfolders: node
                .children
                .iter()
                .map(|c| (c.name.clone(), ExportFolder::from(c)))
                .collect(),
        }
    }
}

/// The root's top-level folders keyed by name.
pub fn export_map(root: &FolderNode) -> BTreeMap<String, ExportFolder> {
    root.children
        .iter()
        .map(|c| (c.name.clone(), ExportFolder::from(c)))
        .collect()
}

fn write_atomic(path: &Path, data: &[u8]) -> anyhow::Result<()> {
    let temp_path = path.with_extension("tmp");
    std::fs::write(&temp_path, data)
        .with_context(|| format!("writing {}", temp_path.display()))?;
    std::fs::rename(&temp_path, path)
        .with_context(|| format!("renaming into {}", path.display()))?;
    Ok(())
}

/// Write the structured export. All-or-nothing: a failure leaves no
/// partial file at `path`.
pub fn write_export(root: &FolderNode, path: &Path) -> anyhow::Result<()> {
    let data = serde_json::to_vec_pretty(&export_map(root))?;
    write_atomic(path, &data)?;
    log::info!("wrote structured export to {}", path.display());
    Ok(())
}

/// Write the final tree in record shape, for the HTML generation step.
pub fn write_tree(root: &FolderNode, path: &Path) -> anyhow::Result<()> {
    let data = serde_json::to_vec_pretty(root)?;
    write_atomic(path, &data)?;
    log::info!("wrote folder tree to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> FolderNode {
        let mut root = FolderNode::new("Bookmarks");
        let dev = root.child_mut("Dev");
        dev.bookmarks.push(Bookmark {
            id: 1,
            title: "kernel".into(),
            url: "https://github.com/torvalds/linux".into(),
            folder_path: vec![],
            visit_hint: 3.0,
        });
        dev.child_mut("Rust").bookmarks.push(Bookmark {
            id: 2,
            title: "compiler".into(),
            url: "https://github.com/rust-lang/rust".into(),
            folder_path: vec![],
            visit_hint: 0.0,
        });
        root
    }

    #[test]
    fn test_export_shape() {
        let map = export_map(&sample_tree());
        let dev = map.get("Dev").expect("Dev exported");
        assert_eq!(dev.bookmarks.len(), 1);
        assert_eq!(dev.bookmarks[0].id, 1);
        let rust = dev.subfolders.get("Rust").expect("Rust exported");
        assert_eq!(rust.bookmarks[0].id, 2);
    }

    #[test]
    fn test_export_is_byte_stable() {
        let tree = sample_tree();
        let a = serde_json::to_vec(&export_map(&tree)).expect("serializable export");
        let b = serde_json::to_vec(&export_map(&tree)).expect("serializable export");
        assert_eq!(a, b);
    }

    #[test]
    fn test_write_export_round_trips() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("organized.json");
        write_export(&sample_tree(), &path).expect("export written");

        let text = std::fs::read_to_string(&path).expect("export readable");
        let value: serde_json::Value = serde_json::from_str(&text).expect("export is json");
        assert!(value.get("Dev").is_some());
        // the temp file was renamed away
        assert!(!dir.path().join("organized.tmp").exists());
    }
}
