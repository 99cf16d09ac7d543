//! Error types shared across the reconciliation pipeline.

use thiserror::Error;

use crate::tree::NodeId;

/// Errors that can occur while labeling, reconciling or scoring trees.
///
/// All of these indicate invalid input structure rather than transient
/// failure: they abort the reconciliation of the affected gene tree.
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// A non-root node's parent chain cannot be resolved up to the root.
    #[error("node {0} is not the root but its parent chain does not reach the root")]
    BrokenParentChain(NodeId),

    /// A leaf identifier does not follow the expected field structure.
    #[error("leaf identifier '{0}' does not split into exactly four '|'-delimited fields")]
    MalformedLeafId(String),

    /// A node was queried for its species set before being labeled.
    #[error("node {0} carries no species annotation")]
    MissingLabel(NodeId),

    /// A gene-tree species has no counterpart in the species tree.
    #[error("species '{0}' is not present in the species tree")]
    MissingSpecies(String),

    /// Two distinct species-tree clades at the same depth both cover the
    /// target species set, so there is no unique most specific ancestor.
    #[error("ambiguous least common ancestor: nodes {0} and {1} both cover the target set at equal depth")]
    AmbiguousLca(NodeId, NodeId),

    /// A gene-tree node was consumed before the reconciler mapped it.
    #[error("gene-tree node {0} has not been mapped to a species-tree node")]
    Unmapped(NodeId),

    /// The Newick input could not be parsed.
    #[error("failed to parse Newick input")]
    Parse(#[from] phylotree::tree::NewickParseError),

    /// The parsed input tree could not be converted.
    #[error("invalid input tree")]
    InputTree(#[from] phylotree::tree::TreeError),

    /// I/O failure while reading an input file.
    #[error("i/o error")]
    Io(#[from] std::io::Error),
}
