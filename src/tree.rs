//! Rooted tree arena with upward parent links.
//!
//! # Overview
//! Both the species tree and the gene trees use the same representation: a
//! flat `Vec<Node>` addressed by [`NodeId`] indices. Ownership is strictly
//! top-down (the arena owns every node, parents list their children), while
//! the parent link is a plain index used only for upward traversal, so no
//! cyclic ownership is needed.
//!
//! Tree shape is immutable after assembly; everything the reconciliation
//! pipeline derives (species sets, cross-tree mappings) lives in external
//! maps keyed by `NodeId`.

use crate::error::ReconcileError;

/// Index of a node inside a [`Tree`] arena.
pub type NodeId = usize;

/// A single node of a rooted tree.
#[derive(Debug, Clone)]
pub struct Node {
    /// Leaf identifier or clade name, if any. Species-tree leaves carry bare
    /// species names; gene-tree leaves carry `species|id|accession|family`
    /// identifiers. Internal nodes are usually unnamed.
    pub name: Option<String>,
    /// Parent index, `None` for the root. Set exactly once at assembly time.
    pub parent: Option<NodeId>,
    /// Child indices in insertion order.
    pub children: Vec<NodeId>,
}

/// A rooted tree stored as an index arena.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Tree {
    /// Create a tree holding a single root node.
    pub fn new(name: Option<&str>) -> Self {
        Tree {
            nodes: vec![Node {
                name: name.map(str::to_owned),
                parent: None,
                children: Vec::new(),
            }],
            root: 0,
        }
    }

    /// Append a child under `parent` and return its id.
    pub fn add_child(&mut self, parent: NodeId, name: Option<&str>) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            name: name.map(str::to_owned),
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent].children.push(id);
        id
    }

    /// Id of the root node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Total number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A tree always holds at least its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Borrow a node by id.
    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    /// All node ids, root included.
    pub fn ids(&self) -> std::ops::Range<NodeId> {
        0..self.nodes.len()
    }

    /// A node is terminal exactly when it has no children.
    pub fn is_terminal(&self, id: NodeId) -> bool {
        self.nodes[id].children.is_empty()
    }

    /// A node is the root exactly when it has no parent.
    pub fn is_root(&self, id: NodeId) -> bool {
        self.nodes[id].parent.is_none()
    }

    /// Nodes from `id` up to the root, both inclusive.
    ///
    /// Fails only when the parent chain is broken, which signals a
    /// structurally invalid tree.
    pub fn path_to_root(&self, id: NodeId) -> Result<Vec<NodeId>, ReconcileError> {
        let mut path = vec![id];
        let mut current = id;
        while let Some(parent) = self.nodes[current].parent {
            path.push(parent);
            current = parent;
            // A parent cycle would otherwise loop forever.
            if path.len() > self.nodes.len() {
                return Err(ReconcileError::BrokenParentChain(id));
            }
        }
        if current != self.root {
            return Err(ReconcileError::BrokenParentChain(id));
        }
        Ok(path)
    }

    /// Number of edges between `id` and the root.
    pub fn depth(&self, id: NodeId) -> Result<usize, ReconcileError> {
        Ok(self.path_to_root(id)?.len() - 1)
    }

    /// Number of edges between two nodes of the same tree.
    ///
    /// Both root paths are compared from the root end inward; the distance is
    /// the sum of what remains of each path past the last shared ancestor.
    /// When one node is an ancestor of the other this collapses to their
    /// depth difference.
    pub fn path_length(&self, a: NodeId, b: NodeId) -> Result<usize, ReconcileError> {
        if a == b {
            return Ok(0);
        }
        let path_a = self.path_to_root(a)?;
        let path_b = self.path_to_root(b)?;
        let shared = path_a
            .iter()
            .rev()
            .zip(path_b.iter().rev())
            .take_while(|(x, y)| x == y)
            .count();
        debug_assert!(shared >= 1, "two nodes of the same tree share at least the root");
        Ok(path_a.len() + path_b.len() - 2 * shared)
    }

    /// Leaves under `id` in depth-first, stored-child order.
    pub fn terminals(&self, id: NodeId) -> Vec<NodeId> {
        let mut leaves = Vec::new();
        self.collect_terminals(id, &mut leaves);
        leaves
    }

    fn collect_terminals(&self, id: NodeId, out: &mut Vec<NodeId>) {
        if self.is_terminal(id) {
            out.push(id);
            return;
        }
        for &child in &self.nodes[id].children {
            self.collect_terminals(child, out);
        }
    }

    /// Internal nodes under `id`, pre-order (`id` first when it is internal).
    pub fn nonterminals(&self, id: NodeId) -> Vec<NodeId> {
        let mut clades = Vec::new();
        self.collect_nonterminals(id, &mut clades);
        clades
    }

    fn collect_nonterminals(&self, id: NodeId, out: &mut Vec<NodeId>) {
        if self.is_terminal(id) {
            return;
        }
        out.push(id);
        for &child in &self.nodes[id].children {
            self.collect_nonterminals(child, out);
        }
    }

    /// Check the parent/child agreement for every node: exactly one root,
    /// every other node listed among its parent's children.
    pub fn validate(&self) -> Result<(), ReconcileError> {
        for id in self.ids() {
            match self.nodes[id].parent {
                None if id != self.root => return Err(ReconcileError::BrokenParentChain(id)),
                Some(parent) if !self.nodes[parent].children.contains(&id) => {
                    return Err(ReconcileError::BrokenParentChain(id));
                }
                _ => {}
            }
            self.path_to_root(id)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;

    /// ```text
    ///           root
    ///          /    \
    ///        ab      c
    ///       /  \
    ///      a    b
    /// ```
    fn small_tree() -> (Tree, NodeId, NodeId, NodeId, NodeId) {
        let mut tree = Tree::new(None);
        let ab = tree.add_child(tree.root(), None);
        let a = tree.add_child(ab, Some("A"));
        let b = tree.add_child(ab, Some("B"));
        let c = tree.add_child(tree.root(), Some("C"));
        (tree, ab, a, b, c)
    }

    #[test]
    fn path_to_root_is_inclusive_on_both_ends() {
        let (tree, ab, a, _, c) = small_tree();
        assert_eq!(tree.path_to_root(a).unwrap(), vec![a, ab, tree.root()]);
        assert_eq!(tree.path_to_root(c).unwrap(), vec![c, tree.root()]);
        assert_eq!(tree.path_to_root(tree.root()).unwrap(), vec![tree.root()]);
    }

    #[test]
    fn path_length_of_a_node_to_itself_is_zero() {
        let (tree, ..) = small_tree();
        for id in tree.ids() {
            assert_eq!(tree.path_length(id, id).unwrap(), 0);
        }
    }

    #[test]
    fn path_length_is_symmetric() {
        let (tree, ..) = small_tree();
        for pair in tree.ids().combinations(2) {
            assert_eq!(
                tree.path_length(pair[0], pair[1]).unwrap(),
                tree.path_length(pair[1], pair[0]).unwrap(),
            );
        }
    }

    #[test]
    fn path_length_counts_edges() {
        let (tree, ab, a, b, c) = small_tree();
        let root = tree.root();
        assert_eq!(tree.path_length(a, b).unwrap(), 2);
        assert_eq!(tree.path_length(a, c).unwrap(), 3);
        assert_eq!(tree.path_length(ab, c).unwrap(), 2);
        // Ancestor/descendant pairs collapse to the depth difference.
        assert_eq!(tree.path_length(ab, a).unwrap(), 1);
        assert_eq!(tree.path_length(a, root).unwrap(), 2);
        assert_eq!(tree.path_length(root, ab).unwrap(), 1);
    }

    #[test]
    fn terminals_follow_stored_child_order() {
        let (tree, _, a, b, c) = small_tree();
        assert_eq!(tree.terminals(tree.root()), vec![a, b, c]);
    }

    #[test]
    fn nonterminals_are_preorder_and_include_self() {
        let (tree, ab, a, ..) = small_tree();
        assert_eq!(tree.nonterminals(tree.root()), vec![tree.root(), ab]);
        // A terminal subtree has no nonterminals.
        assert!(tree.nonterminals(a).is_empty());
        // A single leaf is its whole terminal enumeration.
        assert_eq!(tree.terminals(a), vec![a]);
    }

    #[test]
    fn terminal_and_root_predicates() {
        let (tree, ab, a, ..) = small_tree();
        assert!(tree.is_root(tree.root()));
        assert!(!tree.is_root(ab));
        assert!(tree.is_terminal(a));
        assert!(!tree.is_terminal(ab));
    }

    #[test]
    fn well_formed_tree_validates() {
        let (tree, ..) = small_tree();
        assert!(tree.validate().is_ok());
    }
}
