//! Path resolution over a [`VfsTree`].
//!
//! Paths follow shell conventions: `/` and `~` name the root, `.` and `..`
//! the current and parent directory. `..` at the root stays at the root.

use crate::vfs::{NodeId, VfsTree};

/// Resolve `path` against `base`.
///
/// Returns `None` when a segment does not exist or when the walk would
/// descend through a file. Never mutates the tree.
pub fn resolve(tree: &VfsTree, path: &str, base: NodeId) -> Option<NodeId> {
    match path {
        "" | "." => Some(base),
        "~" | "/" => Some(tree.root()),
        ".." => Some(tree.parent_or_self(base)),
        _ if is_absolute(path) => walk(tree, path.trim_start_matches(['~', '/']), tree.root()),
        _ => walk(tree, path, base),
    }
}

/// Resolve `path` and keep the result only if it is a directory.
pub fn resolve_dir(tree: &VfsTree, path: &str, base: NodeId) -> Option<NodeId> {
    resolve(tree, path, base).filter(|id| tree.node(*id).is_dir())
}

pub fn is_absolute(path: &str) -> bool {
    path.starts_with(['/', '~'])
}

fn walk(tree: &VfsTree, path: &str, start: NodeId) -> Option<NodeId> {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .try_fold(start, |current, segment| match segment {
            ".." => Some(tree.parent_or_self(current)),
            "." => Some(current),
            name => tree.node(current).child(name),
        })
}
