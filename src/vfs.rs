use indexmap::IndexMap;
use tracing::{debug, warn};
use url::Url;

/// Name shown for the root directory.
pub const ROOT_NAME: &str = "~";
/// Absolute path of the root directory.
pub const ROOT_PATH: &str = "/";

/// Index of a node inside a [`VfsTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Directory,
    File,
}

/// A directory or file derived from one URL path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    path: String,
    name: String,
    parent: Option<NodeId>,
    /// `None` for files.
    children: Option<IndexMap<String, NodeId>>,
}

impl Node {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn kind(&self) -> NodeKind {
        match self.children {
            Some(_) => NodeKind::Directory,
            None => NodeKind::File,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind() == NodeKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind() == NodeKind::File
    }

    /// Child lookup by segment name. Always `None` on files.
    pub fn child(&self, name: &str) -> Option<NodeId> {
        self.children.as_ref()?.get(name).copied()
    }

    /// Children in insertion order. Empty for files.
    pub fn children(&self) -> impl Iterator<Item = (&str, NodeId)> + '_ {
        self.children
            .iter()
            .flat_map(|children| children.iter().map(|(name, id)| (name.as_str(), *id)))
    }

    pub fn has_children(&self) -> bool {
        self.children.as_ref().is_some_and(|c| !c.is_empty())
    }
}

/// Virtual filesystem built from a flat list of site URLs.
///
/// Nodes are stored in an arena owned by the tree, parent and child links are
/// indices into it. The root is always the first node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VfsTree {
    nodes: Vec<Node>,
}

impl Default for VfsTree {
    fn default() -> Self {
        Self {
            nodes: vec![Node {
                path: ROOT_PATH.to_string(),
                name: ROOT_NAME.to_string(),
                parent: None,
                children: Some(IndexMap::new()),
            }],
        }
    }
}

impl VfsTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from absolute URL strings.
    ///
    /// URLs that fail to parse are skipped with a warning.
    pub fn from_urls<I>(urls: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut tree = Self::new();
        for url in urls {
            let url = url.as_ref();
            match Url::parse(url.trim()) {
                Ok(parsed) => tree.insert_url(&parsed),
                Err(err) => warn!(url, %err, "skipping malformed sitemap url"),
            }
        }
        tree
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        !self.node(self.root()).has_children()
    }

    /// Parent of `id`, or `id` itself for the root.
    pub fn parent_or_self(&self, id: NodeId) -> NodeId {
        self.node(id).parent.unwrap_or(id)
    }

    /// Insert the path of `url`. Inserting the same path twice is a no-op.
    pub fn insert_url(&mut self, url: &Url) {
        let segments: Vec<&str> = url.path().split('/').filter(|s| !s.is_empty()).collect();

        let mut current = self.root();
        for (index, segment) in segments.iter().enumerate() {
            let is_last = index == segments.len() - 1;
            current = match self.node(current).child(segment) {
                Some(existing) => {
                    if !is_last {
                        self.promote_to_dir(existing);
                    }
                    existing
                }
                None => self.add_child(current, segment, !is_last),
            };
        }
    }

    fn add_child(&mut self, parent: NodeId, name: &str, is_dir: bool) -> NodeId {
        let id = NodeId(self.nodes.len());
        let parent_path = self.node(parent).path();
        let path = if parent_path == ROOT_PATH {
            format!("/{name}")
        } else {
            format!("{parent_path}/{name}")
        };

        self.nodes.push(Node {
            path,
            name: name.to_string(),
            parent: Some(parent),
            children: is_dir.then(IndexMap::new),
        });

        if let Some(children) = self.nodes[parent.0].children.as_mut() {
            children.insert(name.to_string(), id);
        }

        id
    }

    /// A file that turns out to be the ancestor of another URL becomes a directory.
    fn promote_to_dir(&mut self, id: NodeId) {
        let node = &mut self.nodes[id.0];
        if node.children.is_none() {
            debug!(path = %node.path, "promoting file to directory");
            node.children = Some(IndexMap::new());
        }
    }
}
