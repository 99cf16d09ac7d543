use clap::Parser;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tree_reconcile::error::ReconcileError;
use tree_reconcile::events::analyze;
use tree_reconcile::io::{TraceRow, read_newick_file, write_trace_tsv};
use tree_reconcile::labels::SpeciesLabels;
use tree_reconcile::tree::Tree;

/// Reconcile gene-family trees against a species tree and report the
/// deep-coalescence score and duplication nodes of each family.
#[derive(Parser, Debug)]
#[command(name = "tree-reconcile", version, about = "Gene-tree/species-tree reconciliation")]
struct Args {
    /// Path to the species tree (Newick, bare species names as leaf labels)
    #[arg(short = 's', long = "species")]
    species: PathBuf,

    /// Paths to gene-family trees (Newick, `species|id|accession|family` leaf labels)
    #[arg(short = 'g', long = "genes", num_args = 1.., required = true)]
    genes: Vec<PathBuf>,

    /// Output path for the TSV reconciliation trace (gzip-compressed if it ends in .gz)
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Quiet mode: suppresses progress messages on stdout
    #[arg(short = 'q', long = "quiet", default_value_t = false)]
    quiet: bool,
}

struct FamilyReport {
    score: usize,
    duplication_count: usize,
    rows: Vec<TraceRow>,
}

fn main() {
    let args = Args::parse();

    let t0 = Instant::now();
    let species_tree = match read_newick_file(&args.species) {
        Ok(tree) => tree,
        Err(e) => {
            eprintln!("Failed to read species tree {:?}: {e}", args.species);
            std::process::exit(2);
        }
    };
    let species_labels = match SpeciesLabels::for_species_tree(&species_tree) {
        Ok(labels) => labels,
        Err(e) => {
            eprintln!("Failed to label species tree {:?}: {e}", args.species);
            std::process::exit(2);
        }
    };
    log_if(
        !args.quiet,
        format!(
            "Read species tree with {} species in {:.3}s",
            species_tree.terminals(species_tree.root()).len(),
            t0.elapsed().as_secs_f64()
        ),
    );

    // Reconcile every family in parallel; each family fails independently.
    let t1 = Instant::now();
    let results: Vec<(String, Result<FamilyReport, ReconcileError>)> = args
        .genes
        .par_iter()
        .map(|path| {
            (
                family_name(path),
                analyze_family(path, &species_tree, &species_labels),
            )
        })
        .collect();
    log_if(
        !args.quiet,
        format!(
            "Reconciled {} gene families in {:.3}s",
            results.len(),
            t1.elapsed().as_secs_f64()
        ),
    );

    let mut rows = Vec::new();
    let mut failed = false;
    for (family, result) in results {
        match result {
            Ok(report) => {
                println!(
                    "{family}: deep coalescence = {}, duplications = {}",
                    report.score, report.duplication_count
                );
                rows.extend(report.rows);
            }
            Err(e) => {
                eprintln!("{family}: reconciliation failed: {e}");
                failed = true;
            }
        }
    }

    if let Some(output) = &args.output {
        let t2 = Instant::now();
        if let Err(e) = write_trace_tsv(output, &rows) {
            eprintln!("Failed to write output {:?}: {e}", output);
            std::process::exit(4);
        }
        log_if(
            !args.quiet,
            format!(
                "Wrote reconciliation trace to {:?} in {:.3}s",
                output,
                t2.elapsed().as_secs_f64()
            ),
        );
    }

    if failed {
        std::process::exit(1);
    }
}

fn family_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string()
}

fn analyze_family(
    path: &Path,
    species_tree: &Tree,
    species_labels: &SpeciesLabels,
) -> Result<FamilyReport, ReconcileError> {
    let family = family_name(path);
    let gene_tree = read_newick_file(path)?;
    let gene_labels = SpeciesLabels::for_gene_tree(&gene_tree)?;
    let summary = analyze(species_tree, species_labels, &gene_tree, &gene_labels)?;

    let mut rows = Vec::new();
    for node in gene_tree.ids() {
        let mapped = summary.reconciliation.mapped(node)?;
        // Leaves report their full identifier, clades their species set.
        let gene_clade = match &gene_tree.get(node).name {
            Some(name) if gene_tree.is_terminal(node) => name.clone(),
            _ => gene_labels.clade_label(node),
        };
        rows.push(TraceRow {
            family: family.clone(),
            gene_clade,
            species_clade: species_labels.clade_label(mapped),
            duplication: summary.duplications.contains(&node),
        });
    }

    Ok(FamilyReport {
        score: summary.deep_coalescence,
        duplication_count: summary.duplications.len(),
        rows,
    })
}

fn log_if(show: bool, msg: String) {
    if show {
        println!("{}", msg);
    }
}
