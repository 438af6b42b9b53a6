//! Quick-access promotion.
//!
//! Scans the reconciled tree and moves bookmarks matching any promotion
//! rule into a dedicated top-level folder. Moves are destructive: a
//! promoted bookmark leaves its old folder, and folders emptied by the
//! move are dropped. Bookmarks already inside the quick-access folder are
//! never rescanned, so running promotion again is a no-op.

use crate::bookmarks::{self, Bookmark, FolderNode};
use crate::config::PromotionConfig;
use std::collections::HashMap;

/// Apply the promotion rules to the tree. `original_paths` is the side
/// mapping of bookmark id to original folder path, used by the
/// pinned-folder rule. Returns the number of bookmarks moved.
pub fn promote(
    root: &mut FolderNode,
    original_paths: &HashMap<u64, Vec<String>>,
    cfg: &PromotionConfig,
) -> usize {
    let mut moved: Vec<Bookmark> = vec![];

    drain_matches(&mut root.bookmarks, original_paths, cfg, &mut moved);
    for child in root.children.iter_mut() {
        if child.name == cfg.quick_access_name {
            continue;
        }
        drain_folder(child, original_paths, cfg, &mut moved);
    }

    root.prune_empty();

    let count = moved.len();
    if count == 0 {
        return 0;
    }

    let quick = match root
        .children
        .iter()
        .position(|c| c.name == cfg.quick_access_name)
    {
        Some(idx) => &mut root.children[idx],
        None => {
            root.children.insert(0, FolderNode::new(&cfg.quick_access_name));
            &mut root.children[0]
        }
    };

    quick.bookmarks.append(&mut moved);
    quick.bookmarks.sort_by(|a, b| {
        b.visit_hint
            .total_cmp(&a.visit_hint)
            .then_with(|| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
    });

    log::info!("promoted {count} bookmarks to {}", cfg.quick_access_name);
    count
}

fn drain_folder(
    folder: &mut FolderNode,
    original_paths: &HashMap<u64, Vec<String>>,
    cfg: &PromotionConfig,
    moved: &mut Vec<Bookmark>,
) {
    drain_matches(&mut folder.bookmarks, original_paths, cfg, moved);
    for child in folder.children.iter_mut() {
        drain_folder(child, original_paths, cfg, moved);
    }
}

fn drain_matches(
    bookmarks: &mut Vec<Bookmark>,
    original_paths: &HashMap<u64, Vec<String>>,
    cfg: &PromotionConfig,
    moved: &mut Vec<Bookmark>,
) {
    let mut i = 0;
    while i < bookmarks.len() {
        if is_promoted(&bookmarks[i], original_paths, cfg) {
            moved.push(bookmarks.remove(i));
        } else {
            i += 1;
        }
    }
}

fn is_promoted(
    bookmark: &Bookmark,
    original_paths: &HashMap<u64, Vec<String>>,
    cfg: &PromotionConfig,
) -> bool {
    if let Some(host) = bookmarks::host(&bookmark.url) {
        if cfg.tool_domains.contains(&host) {
            return true;
        }
    }

    let title = bookmark.title.to_lowercase();
    let url = bookmark.url.to_lowercase();
    if cfg
        .keywords
        .iter()
        .any(|k| title.contains(k.as_str()) || url.contains(k.as_str()))
    {
        return true;
    }

    if bookmark.visit_hint > cfg.visit_threshold {
        return true;
    }

    if let Some(path) = original_paths.get(&bookmark.id) {
        if path.iter().any(|folder| cfg.pinned_folders.contains(folder)) {
            return true;
        }
    }

    false
}
