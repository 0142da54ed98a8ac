use glam::Mat4;

use crate::error::SceneError;

/// Index of a node inside a [`NodeTree`].
pub type NodeId = usize;

/// One entry of an authored hierarchy, owning its children.
#[derive(Debug, Clone)]
pub struct RawNode {
    pub name: String,
    pub transform: Mat4,
    pub children: Vec<RawNode>,
}

impl RawNode {
    pub fn new(name: impl Into<String>, transform: Mat4) -> Self {
        Self {
            name: name.into(),
            transform,
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: RawNode) -> Self {
        self.children.push(child);
        self
    }
}

/// One entry of a hierarchy stored as a flat list, children referenced by
/// index. This is the shape importers hand us and it may be malformed.
#[derive(Debug, Clone)]
pub struct IndexedNode {
    pub name: String,
    pub transform: Mat4,
    pub children: Vec<usize>,
}

/// A node of the imported hierarchy.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub local_transform: Mat4,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// Arena of nodes in depth-first pre-order. The root is always at index 0.
#[derive(Debug, Clone)]
pub struct NodeTree {
    nodes: Vec<Node>,
}

impl NodeTree {
    pub const ROOT: NodeId = 0;

    /// Wraps an owned hierarchy into an arena, keeping child order.
    pub fn build(raw: &RawNode) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        let mut stack: Vec<(&RawNode, Option<NodeId>)> = vec![(raw, None)];

        while let Some((entry, parent)) = stack.pop() {
            let id = tree.push(&entry.name, entry.transform, parent);
            for child in entry.children.iter().rev() {
                stack.push((child, Some(id)));
            }
        }

        tree
    }

    /// Builds the arena from an index-linked node list starting at `root`.
    ///
    /// Fails if a child index is out of range or a node is reached twice,
    /// which covers both cycles and nodes shared between parents.
    pub fn from_indexed(nodes: &[IndexedNode], root: usize) -> Result<Self, SceneError> {
        if nodes.is_empty() {
            return Err(SceneError::EmptyHierarchy);
        }

        let mut tree = Self {
            nodes: Vec::with_capacity(nodes.len()),
        };
        let mut visited = vec![false; nodes.len()];
        let mut stack: Vec<(usize, Option<NodeId>)> = vec![(root, None)];

        while let Some((source, parent)) = stack.pop() {
            let entry = nodes
                .get(source)
                .ok_or(SceneError::InvalidNodeIndex(source))?;
            if std::mem::replace(&mut visited[source], true) {
                return Err(SceneError::CyclicHierarchy(source));
            }

            let id = tree.push(&entry.name, entry.transform, parent);
            for &child in entry.children.iter().rev() {
                stack.push((child, Some(id)));
            }
        }

        log::debug!(
            "Built node tree with {} nodes ({} unreachable from root)",
            tree.len(),
            nodes.len() - tree.len()
        );

        Ok(tree)
    }

    fn push(&mut self, name: &str, transform: Mat4, parent: Option<NodeId>) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            name: name.to_string(),
            local_transform: transform,
            parent,
            children: Vec::new(),
        });
        if let Some(parent) = parent {
            self.nodes[parent].children.push(id);
        }
        id
    }

    pub fn root(&self) -> &Node {
        &self.nodes[Self::ROOT]
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate()
    }

    /// All nodes carrying `name`, in pre-order.
    pub fn find_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = NodeId> + 'a {
        self.iter()
            .filter(move |(_, node)| node.name == name)
            .map(|(id, _)| id)
    }

    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.find_all(name).next()
    }

    /// Global transform of a node from authored local transforms only.
    pub fn global_transform(&self, id: NodeId) -> Option<Mat4> {
        let mut node = self.get(id)?;
        let mut global = node.local_transform;
        while let Some(parent) = node.parent {
            node = &self.nodes[parent];
            global = node.local_transform * global;
        }
        Some(global)
    }

    /// Depth-first walk from the root with `G_node = G_parent · local(node)`,
    /// where the root's parent transform is the identity.
    ///
    /// `local` supplies the per-node local transform (the authored one or an
    /// override) and `visit` receives each node with its global transform.
    pub fn traverse<L, V>(&self, mut local: L, mut visit: V)
    where
        L: FnMut(NodeId, &Node) -> Mat4,
        V: FnMut(NodeId, &Node, Mat4),
    {
        if self.nodes.is_empty() {
            return;
        }
        self.traverse_from(Self::ROOT, Mat4::IDENTITY, &mut local, &mut visit);
    }

    fn traverse_from<L, V>(&self, id: NodeId, parent_global: Mat4, local: &mut L, visit: &mut V)
    where
        L: FnMut(NodeId, &Node) -> Mat4,
        V: FnMut(NodeId, &Node, Mat4),
    {
        let node = &self.nodes[id];
        let global = parent_global * local(id, node);
        visit(id, node, global);
        for &child in &node.children {
            self.traverse_from(child, global, local, visit);
        }
    }
}
