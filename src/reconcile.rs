//! Gene-tree to species-tree reconciliation.
//!
//! The reconciler assigns every gene-tree node the species-tree clade it
//! corresponds to: terminals through a species-name lookup over the species
//! tree's leaves, nonterminals through the least-common-ancestor resolver.
//! The resulting [`Reconciliation`] is consumed by the deep-coalescence
//! scorer and the duplication detector.

use std::collections::{BTreeSet, HashMap};

use crate::error::ReconcileError;
use crate::labels::SpeciesLabels;
use crate::tree::{NodeId, Tree};

/// Cross-tree mapping from gene-tree nodes to species-tree nodes.
///
/// Purely an association between the two arenas; it owns neither tree. Once
/// produced it does not change.
#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    mapping: HashMap<NodeId, NodeId>,
}

impl Reconciliation {
    /// Species-tree node a gene-tree node was mapped to.
    pub fn mapped(&self, gene_node: NodeId) -> Result<NodeId, ReconcileError> {
        self.mapping
            .get(&gene_node)
            .copied()
            .ok_or(ReconcileError::Unmapped(gene_node))
    }

    /// Iterate over `(gene node, species node)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.mapping.iter().map(|(&gene, &species)| (gene, species))
    }

    /// Number of mapped gene-tree nodes.
    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    /// True before any node has been mapped.
    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }
}

/// Most specific species-tree clade whose species set covers `target`.
///
/// Every species-tree leaf contributes the deepest node on its root path that
/// covers `target`; the deepest candidate overall is the answer. Under
/// clade-consistent labeling the covering clades form a chain of ancestors,
/// so the deepest one is unique; two distinct candidates at equal depth mean
/// the labeling is corrupt and are reported rather than tie-broken.
pub fn find_least_common_ancestor(
    species_tree: &Tree,
    labels: &SpeciesLabels,
    target: &BTreeSet<String>,
) -> Result<NodeId, ReconcileError> {
    debug_assert!(!target.is_empty(), "LCA target species set must be non-empty");
    let mut best: Option<(usize, NodeId)> = None;
    for leaf in species_tree.terminals(species_tree.root()) {
        let path = species_tree.path_to_root(leaf)?;
        for (hops, &node) in path.iter().enumerate() {
            if !labels.species(node)?.is_superset(target) {
                continue;
            }
            // First covering node from the leaf side is the deepest on this
            // path; everything above it also covers the target.
            let depth = path.len() - 1 - hops;
            best = match best {
                Some((d, _)) if depth > d => Some((depth, node)),
                Some((d, n)) if depth == d && n != node => {
                    return Err(ReconcileError::AmbiguousLca(n, node));
                }
                Some(current) => Some(current),
                None => Some((depth, node)),
            };
            break;
        }
    }
    best.map(|(_, node)| node)
        .ok_or_else(|| ReconcileError::MissingSpecies(join_species(target)))
}

/// Map every gene-tree node onto its species-tree counterpart.
///
/// Terminals are resolved first through a name lookup built once from the
/// species tree's leaves, so an unknown species fails fast; nonterminals then
/// go through [`find_least_common_ancestor`]. Re-running the pass wholesale
/// produces the same mapping.
pub fn reconcile(
    species_tree: &Tree,
    species_labels: &SpeciesLabels,
    gene_tree: &Tree,
    gene_labels: &SpeciesLabels,
) -> Result<Reconciliation, ReconcileError> {
    let mut mapping = HashMap::new();

    let mut species_leaves: HashMap<&str, NodeId> = HashMap::new();
    for leaf in species_tree.terminals(species_tree.root()) {
        for name in species_labels.species(leaf)? {
            species_leaves.insert(name.as_str(), leaf);
        }
    }

    for leaf in gene_tree.terminals(gene_tree.root()) {
        let set = gene_labels.species(leaf)?;
        let name = set
            .iter()
            .next()
            .ok_or(ReconcileError::MissingLabel(leaf))?;
        let target = species_leaves
            .get(name.as_str())
            .copied()
            .ok_or_else(|| ReconcileError::MissingSpecies(name.clone()))?;
        mapping.insert(leaf, target);
    }

    for node in gene_tree.nonterminals(gene_tree.root()) {
        let lca =
            find_least_common_ancestor(species_tree, species_labels, gene_labels.species(node)?)?;
        mapping.insert(node, lca);
    }

    Ok(Reconciliation { mapping })
}

fn join_species(set: &BTreeSet<String>) -> String {
    set.iter().cloned().collect::<Vec<_>>().join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Species tree `((A,B),C)` with its labels.
    fn species_fixture() -> (Tree, SpeciesLabels, NodeId, NodeId, NodeId, NodeId) {
        let mut tree = Tree::new(None);
        let ab = tree.add_child(tree.root(), None);
        let a = tree.add_child(ab, Some("A"));
        let b = tree.add_child(ab, Some("B"));
        let c = tree.add_child(tree.root(), Some("C"));
        let labels = SpeciesLabels::for_species_tree(&tree).unwrap();
        (tree, labels, ab, a, b, c)
    }

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn lca_of_a_clade_is_the_clade_node() {
        let (tree, labels, ab, ..) = species_fixture();
        let lca = find_least_common_ancestor(&tree, &labels, &set(&["A", "B"])).unwrap();
        assert_eq!(lca, ab);
        assert!(labels.species(lca).unwrap().is_superset(&set(&["A", "B"])));
    }

    #[test]
    fn lca_of_a_single_species_is_its_leaf() {
        let (tree, labels, _, a, _, c) = species_fixture();
        assert_eq!(find_least_common_ancestor(&tree, &labels, &set(&["A"])).unwrap(), a);
        assert_eq!(find_least_common_ancestor(&tree, &labels, &set(&["C"])).unwrap(), c);
    }

    #[test]
    fn lca_of_the_full_species_set_is_the_root() {
        let (tree, labels, ..) = species_fixture();
        let lca = find_least_common_ancestor(&tree, &labels, &set(&["A", "B", "C"])).unwrap();
        assert_eq!(lca, tree.root());
    }

    #[test]
    fn lca_spanning_both_root_children_is_the_root() {
        let (tree, labels, ..) = species_fixture();
        let lca = find_least_common_ancestor(&tree, &labels, &set(&["B", "C"])).unwrap();
        assert_eq!(lca, tree.root());
    }

    #[test]
    fn lca_result_is_minimal() {
        let (tree, labels, ab, ..) = species_fixture();
        let target = set(&["A", "B"]);
        let lca = find_least_common_ancestor(&tree, &labels, &target).unwrap();
        for &child in &tree.get(lca).children {
            assert!(!labels.species(child).unwrap().is_superset(&target));
        }
        assert_eq!(lca, ab);
    }

    #[test]
    fn lca_of_an_unknown_species_fails() {
        let (tree, labels, ..) = species_fixture();
        assert!(matches!(
            find_least_common_ancestor(&tree, &labels, &set(&["D"])),
            Err(ReconcileError::MissingSpecies(_)),
        ));
    }

    #[test]
    fn duplicate_species_placements_are_ambiguous() {
        // Species tree ((A,B),(A,C)): "A" appears under two disjoint clades,
        // so its two leaves tie at equal depth.
        let mut tree = Tree::new(None);
        let left = tree.add_child(tree.root(), None);
        tree.add_child(left, Some("A"));
        tree.add_child(left, Some("B"));
        let right = tree.add_child(tree.root(), None);
        tree.add_child(right, Some("A"));
        tree.add_child(right, Some("C"));
        let labels = SpeciesLabels::for_species_tree(&tree).unwrap();

        assert!(matches!(
            find_least_common_ancestor(&tree, &labels, &set(&["A"])),
            Err(ReconcileError::AmbiguousLca(_, _)),
        ));
    }

    #[test]
    fn corrupted_labels_are_ambiguous() {
        // Hand-corrupt the labels so two sibling clades both claim {A, B}.
        let (tree, mut labels, ab, _, _, c) = species_fixture();
        labels.insert_species(c, set(&["A", "B"]));
        // ab and c sit at depth 1; both now cover {A, B}.
        let result = find_least_common_ancestor(&tree, &labels, &set(&["A", "B"]));
        match result {
            Err(ReconcileError::AmbiguousLca(x, y)) => {
                assert_ne!(x, y);
                assert!([x, y].contains(&ab));
                assert!([x, y].contains(&c));
            }
            other => panic!("expected AmbiguousLca, got {other:?}"),
        }
    }

    fn gene_leaf(species: &str, tag: &str) -> String {
        format!("{species}|0|acc|{tag}")
    }

    #[test]
    fn reconcile_maps_terminals_to_species_leaves() {
        let (species_tree, species_labels, _, a, b, _) = species_fixture();

        // Gene tree ((a,b),c) mirroring the species tree.
        let mut gene = Tree::new(None);
        let inner = gene.add_child(gene.root(), None);
        let ga = gene.add_child(inner, Some(&gene_leaf("A", "hox")));
        let gb = gene.add_child(inner, Some(&gene_leaf("B", "hox")));
        gene.add_child(gene.root(), Some(&gene_leaf("C", "hox")));
        let gene_labels = SpeciesLabels::for_gene_tree(&gene).unwrap();

        let recon = reconcile(&species_tree, &species_labels, &gene, &gene_labels).unwrap();
        assert_eq!(recon.len(), gene.len());
        assert_eq!(recon.mapped(ga).unwrap(), a);
        assert_eq!(recon.mapped(gb).unwrap(), b);
    }

    #[test]
    fn reconcile_maps_nonterminals_through_the_lca() {
        let (species_tree, species_labels, ab, ..) = species_fixture();

        let mut gene = Tree::new(None);
        let inner = gene.add_child(gene.root(), None);
        gene.add_child(inner, Some(&gene_leaf("A", "hox")));
        gene.add_child(inner, Some(&gene_leaf("B", "hox")));
        gene.add_child(gene.root(), Some(&gene_leaf("C", "hox")));
        let gene_labels = SpeciesLabels::for_gene_tree(&gene).unwrap();

        let recon = reconcile(&species_tree, &species_labels, &gene, &gene_labels).unwrap();
        assert_eq!(recon.mapped(inner).unwrap(), ab);
        assert_eq!(recon.mapped(gene.root()).unwrap(), species_tree.root());
    }

    #[test]
    fn reconcile_rejects_species_missing_from_the_species_tree() {
        let (species_tree, species_labels, ..) = species_fixture();

        let mut gene = Tree::new(None);
        gene.add_child(gene.root(), Some(&gene_leaf("A", "hox")));
        gene.add_child(gene.root(), Some(&gene_leaf("D", "hox")));
        let gene_labels = SpeciesLabels::for_gene_tree(&gene).unwrap();

        assert!(matches!(
            reconcile(&species_tree, &species_labels, &gene, &gene_labels),
            Err(ReconcileError::MissingSpecies(ref s)) if s.as_str() == "D",
        ));
    }
}
