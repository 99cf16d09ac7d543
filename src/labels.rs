//! Species annotation maps for tree nodes.
//!
//! Labels live outside the tree (keyed by [`NodeId`]) so the same tree can be
//! reconciled repeatedly without carrying hidden state on its nodes. A
//! terminal node holds a singleton species set; an internal node holds the
//! union of the species of its leaf descendants.

use std::collections::{BTreeSet, HashMap};

use crate::error::ReconcileError;
use crate::tree::{NodeId, Tree};

/// Per-node species sets, plus the gene-family tag parsed from gene-tree
/// leaf identifiers.
#[derive(Debug, Clone, Default)]
pub struct SpeciesLabels {
    species: HashMap<NodeId, BTreeSet<String>>,
    family: HashMap<NodeId, String>,
}

impl SpeciesLabels {
    /// Label every node of a species tree whose leaves carry bare species
    /// names.
    pub fn for_species_tree(tree: &Tree) -> Result<Self, ReconcileError> {
        tree.validate()?;
        let mut labels = SpeciesLabels::default();
        for leaf in tree.terminals(tree.root()) {
            let name = leaf_name(tree, leaf)?;
            labels
                .species
                .insert(leaf, BTreeSet::from([name.to_owned()]));
        }
        labels.label_clades(tree)?;
        Ok(labels)
    }

    /// Label every node of a gene tree whose leaves follow the
    /// `species|id|accession|family` identifier convention.
    pub fn for_gene_tree(tree: &Tree) -> Result<Self, ReconcileError> {
        tree.validate()?;
        let mut labels = SpeciesLabels::default();
        for leaf in tree.terminals(tree.root()) {
            let (species, family) = parse_leaf_id(leaf_name(tree, leaf)?)?;
            labels.species.insert(leaf, BTreeSet::from([species]));
            labels.family.insert(leaf, family);
        }
        labels.label_clades(tree)?;
        Ok(labels)
    }

    /// Union the leaf species sets into every nonterminal node. Each clade is
    /// computed independently from its leaf descendants, so order does not
    /// matter.
    fn label_clades(&mut self, tree: &Tree) -> Result<(), ReconcileError> {
        for clade in tree.nonterminals(tree.root()) {
            let mut union = BTreeSet::new();
            for leaf in tree.terminals(clade) {
                let set = self
                    .species
                    .get(&leaf)
                    .ok_or(ReconcileError::MissingLabel(leaf))?;
                union.extend(set.iter().cloned());
            }
            self.species.insert(clade, union);
        }
        Ok(())
    }

    /// Species set of a node.
    pub fn species(&self, id: NodeId) -> Result<&BTreeSet<String>, ReconcileError> {
        self.species.get(&id).ok_or(ReconcileError::MissingLabel(id))
    }

    /// Gene-family tag of a gene-tree leaf, if it carries one. Not used by
    /// the reconciliation algorithm itself.
    pub fn family(&self, id: NodeId) -> Option<&str> {
        self.family.get(&id).map(String::as_str)
    }

    /// Short human-readable label for a node's clade, e.g. `Human,Mouse`.
    pub fn clade_label(&self, id: NodeId) -> String {
        match self.species.get(&id) {
            Some(set) => set.iter().cloned().collect::<Vec<_>>().join(","),
            None => format!("<unlabeled {id}>"),
        }
    }

    #[cfg(test)]
    pub(crate) fn insert_species(&mut self, id: NodeId, species: BTreeSet<String>) {
        self.species.insert(id, species);
    }
}

fn leaf_name(tree: &Tree, leaf: NodeId) -> Result<&str, ReconcileError> {
    tree.get(leaf)
        .name
        .as_deref()
        .ok_or_else(|| ReconcileError::MalformedLeafId(format!("<unnamed node {leaf}>")))
}

/// Split a gene leaf identifier into its species and family fields.
///
/// The identifier has four pipe-delimited fields; the second and third are
/// carried by upstream tooling and ignored here.
pub fn parse_leaf_id(id: &str) -> Result<(String, String), ReconcileError> {
    let fields: Vec<&str> = id.split('|').collect();
    match fields.as_slice() {
        [species, _, _, family] => Ok(((*species).to_owned(), (*family).to_owned())),
        _ => Err(ReconcileError::MalformedLeafId(id.to_owned())),
    }
}
