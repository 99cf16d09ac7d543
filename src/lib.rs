//! Crate root: lightweight module orchestration and public re-exports.
//!
//! Modules:
//! - `tree`: index-arena rooted tree with path/traversal operations.
//! - `labels`: species annotation maps and leaf-identifier parsing.
//! - `reconcile`: LCA resolution and the gene-to-species-tree mapping.
//! - `events`: deep-coalescence scoring and duplication detection.
//! - `io`: reading Newick inputs and writing reconciliation reports.
//! - `error`: crate-wide error type.
//! - `api`: Python bindings via `pyo3` (gated behind "python" feature).
//!
//! Public API kept stable by re-exporting key items from the modules.

pub mod error;
pub mod events;
pub mod io;
pub mod labels;
pub mod reconcile;
pub mod tree;

#[cfg(feature = "python")]
pub mod api;

// Re-export frequently used types & functions
pub use error::ReconcileError;
pub use events::{ReconciliationSummary, analyze, deep_coalescence, find_duplications};
pub use io::{read_newick, read_newick_file, write_trace_tsv};
pub use labels::SpeciesLabels;
pub use reconcile::{Reconciliation, find_least_common_ancestor, reconcile};
pub use tree::{Node, NodeId, Tree};
