//! Reading Newick inputs and writing reconciliation reports.
//!
//! Tree construction itself is delegated to `phylotree`; parsed trees are
//! converted into the arena representation at this boundary. Reports are
//! plain TSV, gzip-compressed when the output path ends in `.gz`.

use std::fs;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use flate2::Compression;
use flate2::write::GzEncoder;
use phylotree::tree::Tree as PhyloTree;

use crate::error::ReconcileError;
use crate::tree::{NodeId, Tree};

/// Read a rooted tree from a Newick file.
pub fn read_newick_file<P: AsRef<Path>>(path: P) -> Result<Tree, ReconcileError> {
    let content = fs::read_to_string(path.as_ref())?;
    read_newick(content.trim())
}

/// Parse a Newick string into an arena tree.
pub fn read_newick(newick: &str) -> Result<Tree, ReconcileError> {
    let phylo = PhyloTree::from_newick(newick)?;
    from_phylo(&phylo)
}

/// Copy a parsed `phylotree` structure into the arena representation,
/// assigning parent links as the nodes are inserted.
pub fn from_phylo(phylo: &PhyloTree) -> Result<Tree, ReconcileError> {
    let root_id = phylo.get_root()?;
    let root = phylo.get(&root_id)?;
    let mut tree = Tree::new(root.name.as_deref());
    let dst_root = tree.root();
    copy_children(phylo, root_id, &mut tree, dst_root)?;
    Ok(tree)
}

fn copy_children(
    phylo: &PhyloTree,
    src: usize,
    tree: &mut Tree,
    dst: NodeId,
) -> Result<(), ReconcileError> {
    let children = phylo.get(&src)?.children.clone();
    for child_id in children {
        let child = phylo.get(&child_id)?;
        let new_id = tree.add_child(dst, child.name.as_deref());
        copy_children(phylo, child_id, tree, new_id)?;
    }
    Ok(())
}

/// One row of a reconciliation trace: a gene clade, the species clade it was
/// mapped to, and whether the gene node is a duplication event.
#[derive(Debug, Clone)]
pub struct TraceRow {
    pub family: String,
    pub gene_clade: String,
    pub species_clade: String,
    pub duplication: bool,
}

/// Write reconciliation trace rows as TSV to a file.
/// If `path` ends with `.gz`, the output is gzip-compressed.
pub fn write_trace_tsv<P: AsRef<Path>>(path: P, rows: &[TraceRow]) -> io::Result<()> {
    let p = path.as_ref();
    let is_gz = p.to_string_lossy().ends_with(".gz");

    let mut out: Box<dyn Write> = if is_gz {
        let f = File::create(p)?;
        let enc = GzEncoder::new(f, Compression::default());
        Box::new(BufWriter::new(enc))
    } else {
        Box::new(BufWriter::new(File::create(p)?))
    };

    writeln!(&mut out, "family\tgene_clade\tspecies_clade\tduplication")?;
    for row in rows {
        writeln!(
            &mut out,
            "{}\t{}\t{}\t{}",
            row.family,
            row.gene_clade,
            row.species_clade,
            if row.duplication { "*" } else { "" },
        )?;
    }

    out.flush()?;
    Ok(())
}
