//! Shell-style tab completion over verbs and filesystem paths.

use crate::command::VERBS;
use crate::path::resolve_dir;
use crate::vfs::{NodeId, VfsTree};

/// Possible completions for `input`.
///
/// Without a space the verb is completed: every verb starting with the
/// lowercased input. Otherwise the text after the first space is completed
/// as a path: everything up to its last `/` is kept and the remainder is
/// matched against the children of that directory. Directories carry a
/// trailing `/`. Candidates are sorted.
pub fn candidates(input: &str, tree: &VfsTree, cwd: NodeId) -> Vec<String> {
    let Some((_, path)) = input.split_once(' ') else {
        let prefix = input.to_lowercase();
        let mut verbs: Vec<String> = VERBS
            .iter()
            .filter(|verb| verb.starts_with(&prefix))
            .map(|verb| verb.to_string())
            .collect();
        verbs.sort();
        return verbs;
    };

    let (base, prefix) = match path.rfind('/') {
        Some(slash) => path.split_at(slash + 1),
        None => ("", path),
    };

    let Some(dir) = resolve_dir(tree, base, cwd) else {
        return Vec::new();
    };

    let mut paths: Vec<String> = tree
        .node(dir)
        .children()
        .filter(|(name, _)| name.starts_with(prefix))
        .map(|(name, child)| {
            let slash = if tree.node(child).is_dir() { "/" } else { "" };
            format!("{base}{name}{slash}")
        })
        .collect();
    paths.sort();
    paths
}

/// Longest string every candidate starts with.
pub fn common_prefix<S: AsRef<str>>(candidates: &[S]) -> &str {
    let Some((first, rest)) = candidates.split_first() else {
        return "";
    };
    let first = first.as_ref();

    let len = rest.iter().fold(first.len(), |len, other| {
        first[..len]
            .char_indices()
            .zip(other.as_ref().chars())
            .find(|((_, a), b)| a != b)
            .map_or_else(|| len.min(other.as_ref().len()), |((index, _), _)| index)
    });

    &first[..len]
}

/// The input line after pressing Tab, or `None` if it stays as it is.
pub fn complete(input: &str, tree: &VfsTree, cwd: NodeId) -> Option<String> {
    let candidates = candidates(input, tree, cwd);
    let split = input.split_once(' ');

    match (candidates.as_slice(), split) {
        ([], _) => None,
        ([verb], None) => Some(format!("{verb} ")),
        ([path], Some((verb, _))) => Some(format!("{verb} {path}")),
        (many, None) => {
            let prefix = common_prefix(many);
            (prefix.len() > input.len()).then(|| prefix.to_string())
        }
        (many, Some((verb, path))) => {
            let prefix = common_prefix(many);
            (prefix.len() > path.len()).then(|| format!("{verb} {prefix}"))
        }
    }
}
