//! Downstream signals derived from a reconciliation mapping.
//!
//! Both analyses consume a completed [`Reconciliation`]: the deep-coalescence
//! scorer measures how far the gene tree's mapped topology strays from the
//! species tree, and the duplication detector finds the gene-tree nodes where
//! a lineage split without a corresponding speciation.

use std::collections::HashSet;

use rayon::prelude::*;

use crate::error::ReconcileError;
use crate::labels::SpeciesLabels;
use crate::reconcile::{Reconciliation, reconcile};
use crate::tree::{NodeId, Tree};

/// Deep-coalescence cost of a reconciled gene tree.
///
/// Every non-root gene-tree edge contributes the number of species-tree edges
/// between its two mapped clades beyond the single edge a clean speciation
/// uses. A congruent gene tree scores 0; every extra lineage a mismatched
/// edge drags through the species tree adds 1. Summation order is
/// irrelevant; the result is non-negative by construction.
pub fn deep_coalescence(
    species_tree: &Tree,
    gene_tree: &Tree,
    reconciliation: &Reconciliation,
) -> Result<usize, ReconcileError> {
    let mut score = 0;
    for node in gene_tree.ids() {
        let Some(parent) = gene_tree.get(node).parent else {
            continue;
        };
        let distance =
            species_tree.path_length(reconciliation.mapped(node)?, reconciliation.mapped(parent)?)?;
        score += distance.saturating_sub(1);
    }
    Ok(score)
}

/// Gene-tree nodes marking duplication events.
///
/// For every non-root gene-tree node whose mapped species clade equals its
/// parent's, the *parent* is marked: the duplication is attributed to the
/// ancestral clade where the lineage split without a speciation. Several
/// children can mark the same parent; the set deduplicates by node identity.
pub fn find_duplications(
    gene_tree: &Tree,
    reconciliation: &Reconciliation,
) -> Result<HashSet<NodeId>, ReconcileError> {
    let mut duplications = HashSet::new();
    for node in gene_tree.ids() {
        let Some(parent) = gene_tree.get(node).parent else {
            continue;
        };
        if reconciliation.mapped(node)? == reconciliation.mapped(parent)? {
            duplications.insert(parent);
        }
    }
    Ok(duplications)
}

/// Everything derived from reconciling one gene family.
#[derive(Debug, Clone)]
pub struct ReconciliationSummary {
    /// The completed gene-node to species-node mapping.
    pub reconciliation: Reconciliation,
    /// Total deep-coalescence cost.
    pub deep_coalescence: usize,
    /// Gene-tree nodes flagged as duplication events.
    pub duplications: HashSet<NodeId>,
}

/// Run the whole pipeline for one gene family: reconcile, score, detect
/// duplications.
pub fn analyze(
    species_tree: &Tree,
    species_labels: &SpeciesLabels,
    gene_tree: &Tree,
    gene_labels: &SpeciesLabels,
) -> Result<ReconciliationSummary, ReconcileError> {
    let reconciliation = reconcile(species_tree, species_labels, gene_tree, gene_labels)?;
    let score = deep_coalescence(species_tree, gene_tree, &reconciliation)?;
    let duplications = find_duplications(gene_tree, &reconciliation)?;
    Ok(ReconciliationSummary {
        reconciliation,
        deep_coalescence: score,
        duplications,
    })
}

/// Reconcile many gene families against one species tree in parallel.
///
/// Each family fails or succeeds independently, in input order.
pub fn analyze_many(
    species_tree: &Tree,
    species_labels: &SpeciesLabels,
    gene_trees: &[(Tree, SpeciesLabels)],
) -> Vec<Result<ReconciliationSummary, ReconcileError>> {
    gene_trees
        .par_iter()
        .map(|(gene_tree, gene_labels)| {
            analyze(species_tree, species_labels, gene_tree, gene_labels)
        })
        .collect()
}
