//! Python binding layer for gene-tree/species-tree reconciliation.
//!
//! Provides Python functions running the full reconciliation pipeline on
//! Newick strings.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::error::ReconcileError;
use crate::events::analyze;
use crate::io::read_newick;
use crate::labels::SpeciesLabels;

/// Reconcile a gene-family tree against a species tree.
///
/// Args:
///     species_newick: Newick string of the species tree (bare species names
///         as leaf labels)
///     gene_newick: Newick string of the gene tree
///         (`species|id|accession|family` leaf labels)
///
/// Returns:
///     A tuple of (score, duplications, mapping) where:
///     - score is the integer deep-coalescence cost
///     - duplications is a sorted list of duplication clade labels
///     - mapping is a sorted list of (gene clade, species clade) pairs
///
/// Raises:
///     ValueError: If either tree fails to parse, a leaf identifier is
///         malformed, or a gene species is absent from the species tree
#[pyfunction]
fn reconcile_trees(
    species_newick: &str,
    gene_newick: &str,
) -> PyResult<(usize, Vec<String>, Vec<(String, String)>)> {
    run_pipeline(species_newick, gene_newick)
        .map_err(|e| PyValueError::new_err(e.to_string()))
}

fn run_pipeline(
    species_newick: &str,
    gene_newick: &str,
) -> Result<(usize, Vec<String>, Vec<(String, String)>), ReconcileError> {
    let species_tree = read_newick(species_newick)?;
    let species_labels = SpeciesLabels::for_species_tree(&species_tree)?;
    let gene_tree = read_newick(gene_newick)?;
    let gene_labels = SpeciesLabels::for_gene_tree(&gene_tree)?;

    let summary = analyze(&species_tree, &species_labels, &gene_tree, &gene_labels)?;

    let mut duplications: Vec<String> = summary
        .duplications
        .iter()
        .map(|&node| gene_labels.clade_label(node))
        .collect();
    duplications.sort();

    let mut mapping: Vec<(String, String)> = summary
        .reconciliation
        .iter()
        .map(|(gene, species)| {
            (
                gene_labels.clade_label(gene),
                species_labels.clade_label(species),
            )
        })
        .collect();
    mapping.sort();

    Ok((summary.deep_coalescence, duplications, mapping))
}

/// Python module definition
#[pymodule]
fn tree_reconcile(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(reconcile_trees, m)?)?;
    Ok(())
}
