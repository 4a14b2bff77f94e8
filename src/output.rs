//! Artefact writers: the on-disk output of a run.
//!
//! Every run writes into
//! `<output_root>/<p1>_<c1>_<p2>_<c2>/sp_<σ>_node_<sₘᵢₙ>_clust_<Cₘᵢₙ>_mag_<μ>/`:
//! the raw difference matrix (`diff_dist_arr.bin`), its heat map
//! (`diff_dist_mat.png`), the dendrogram (`motion_tree.png`), the combined
//! two-model coordinate file, one PyMOL selection script per effective node
//! (`node_<k>.pml`, numbered from the coarsest split) and a plain-text
//! summary (`domains.info`).

use std::fs;
use std::path::{Path, PathBuf};

use byteorder::{ByteOrder, LittleEndian};
use itertools::Itertools;
use log::info;

use crate::align::ResidueMap;
use crate::engine::{Motion, Params};
use crate::error::{Error, Result};
use crate::float::Float;
use crate::matrix::SquareMatrix;
use crate::node::MotionNode;
use crate::protein::Chain;
use crate::render;
use crate::superpose::Superposition;
use crate::{pdb, Termination};

const LARGE_DOMAIN_COLOR: &str = "[0  ,0  ,255]";
const SMALL_DOMAIN_COLOR: &str = "[255,0  ,0  ]";
const NON_DOMAIN_COLOR: &str = "[128,128,128]";

/// How many of the deepest merges the rendered dendrogram keeps.
pub const DENDROGRAM_MERGES: usize = 12;

/// Identifies a run for directory naming: the two protein codes and chain
/// identifiers being compared.
#[derive(Clone, Debug)]
pub struct RunLabel {
    /// Code of the first structure, e.g. `1adg`.
    pub protein_1: String,
    /// Chain of the first structure.
    pub chain_1: char,
    /// Code of the second structure.
    pub protein_2: String,
    /// Chain of the second structure.
    pub chain_2: char,
}

impl RunLabel {
    /// The `<p1>_<c1>_<p2>_<c2>` directory and file-name stem.
    pub fn pair_name(&self) -> String {
        format!(
            "{}_{}_{}_{}",
            self.protein_1, self.chain_1, self.protein_2, self.chain_2
        )
    }
}

/// The artefact directory for one run under `root`.
pub fn run_dir(root: &Path, label: &RunLabel, params: &Params) -> PathBuf {
    root.join(label.pair_name()).join(format!(
        "sp_{:?}_node_{}_clust_{}_mag_{}",
        params.spatial_proximity, params.small_node, params.clust_size, params.magnitude
    ))
}

/// Write every artefact of a completed (or stalled) run and return the run
/// directory.
pub fn write_run(
    root: &Path,
    label: &RunLabel,
    params: &Params,
    motion: &Motion<f64>,
    chain_1: &Chain,
    chain_2: &Chain,
    map: &ResidueMap,
    superposition: &Superposition,
) -> Result<PathBuf> {
    let dir = run_dir(root, label, params);
    fs::create_dir_all(&dir)
        .map_err(|e| Error::Io { path: dir.clone(), source: e })?;

    write_difference_array(&motion.diff, &dir.join("diff_dist_arr.bin"))?;
    render::save_heat_map(&motion.diff, &dir.join("diff_dist_mat.png"))?;
    render::save_dendrogram(
        &motion.dendrogram,
        params.magnitude as f64,
        DENDROGRAM_MERGES,
        &dir.join("motion_tree.png"),
    )?;
    pdb::write_two_model(
        &dir.join(format!("{}.pdb", label.pair_name())),
        chain_1,
        &map.chain_1,
        chain_2,
        &map.chain_2,
        superposition,
    )?;
    write_node_scripts(&dir, &label.pair_name(), chain_1, map, &motion.nodes)?;
    write_info(&dir, label, superposition.rmsd, motion, chain_1, chain_2, map)?;
    info!("artefacts written to {}", dir.display());
    Ok(dir)
}

/// Serialise the difference matrix as little-endian binary: the order as a
/// `u64`, then the row-major `f64` entries.
pub fn write_difference_array<T: Float>(
    diff: &SquareMatrix<T>,
    path: &Path,
) -> Result<()> {
    let n = diff.order();
    let mut bytes = vec![0u8; 8 + n * n * 8];
    LittleEndian::write_u64(&mut bytes[..8], n as u64);
    let values: Vec<f64> = diff.as_slice().iter().map(|v| v.to_f64()).collect();
    LittleEndian::write_f64_into(&values, &mut bytes[8..]);
    fs::write(path, &bytes).map_err(|e| Error::Io { path: path.to_path_buf(), source: e })
}

/// Write one PyMOL selection script per effective node, numbered from 1 at
/// the coarsest split. Each script partitions conformation 1's residues
/// into the large domain (blue), the small domain (red) and everything
/// else (grey).
pub fn write_node_scripts(
    dir: &Path,
    pair_name: &str,
    chain_1: &Chain,
    map: &ResidueMap,
    nodes: &[MotionNode<f64>],
) -> Result<()> {
    for (k, node) in nodes.iter().rev().enumerate() {
        let number = k + 1;
        let mut script = format!("load {}.pdb, node_{}\n", pair_name, number);

        let in_node = |ri: &u32| {
            node.large_domain.binary_search(ri).is_ok()
                || node.small_domain.binary_search(ri).is_ok()
        };
        let other: Vec<u32> = (0..map.len() as u32).filter(|ri| !in_node(ri)).collect();

        let large = residue_numbers(chain_1, &map.chain_1, &node.large_domain, 0);
        let small = residue_numbers(chain_1, &map.chain_1, &node.small_domain, 0);
        let other = residue_numbers(chain_1, &map.chain_1, &other, 0);
        append_selection(&mut script, number, 0, &large, LARGE_DOMAIN_COLOR);
        append_selection(&mut script, number, 1, &small, SMALL_DOMAIN_COLOR);
        append_selection(&mut script, number, 2, &other, NON_DOMAIN_COLOR);

        let path = dir.join(format!("node_{}.pml", number));
        fs::write(&path, script)
            .map_err(|e| Error::Io { path: path.clone(), source: e })?;
    }
    Ok(())
}

/// Write the human-readable summary of the run.
pub fn write_info(
    dir: &Path,
    label: &RunLabel,
    rmsd: f64,
    motion: &Motion<f64>,
    chain_1: &Chain,
    chain_2: &Chain,
    map: &ResidueMap,
) -> Result<()> {
    let mut text = String::new();
    text += &format!("Protein 1 = {} ({})\n", label.protein_1, label.chain_1);
    text += &format!("Protein 2 = {} ({})\n", label.protein_2, label.chain_2);
    text += &format!("Whole Protein RMSD = {:.3}\n", rmsd);
    if let Termination::NoCandidatePair { merges } = motion.termination {
        text += &format!(
            "Clustering stalled after {} merges: no spatially adjacent pair left\n",
            merges
        );
    }
    text += &format!("Number of Effective Nodes = {}\n\n", motion.nodes.len());

    for (k, node) in motion.nodes.iter().rev().enumerate() {
        text += "==========================================================================\n";
        text += &format!("Effective Node {}\n", k + 1);
        text += &format!("Magnitude = {:.2}\n", node.magnitude);
        text += "--------------------------------------------------------------------------\n";
        for (code, chain_id, chain, chain_map, offset) in [
            (&label.protein_1, label.chain_1, chain_1, &map.chain_1, 0),
            (&label.protein_2, label.chain_2, chain_2, &map.chain_2, map.offset_2),
        ] {
            text += &format!("{} ({})\n", code, chain_id);
            for (title, domain) in
                [("Large", &node.large_domain), ("Small", &node.small_domain)]
            {
                let numbers = residue_numbers(chain, chain_map, domain, offset);
                text += &format!(
                    "{} Domain: {:<3} Residues\n",
                    title,
                    domain.len()
                );
                text += &format!("Residues: {}\n", format_ranges(&numbers));
            }
            text += "\n";
        }
    }

    let path = dir.join("domains.info");
    fs::write(&path, text).map_err(|e| Error::Io { path, source: e })
}

/// Map residue indices to chain residue numbers, applying the renumbering
/// offset.
fn residue_numbers(chain: &Chain, map: &[usize], ris: &[u32], offset: i32) -> Vec<i32> {
    ris.iter().map(|&ri| chain.residues[map[ri as usize]].seq_num - offset).collect()
}

/// Group sorted residue numbers into inclusive consecutive runs.
fn number_runs(numbers: &[i32]) -> Vec<(i32, i32)> {
    let mut runs = Vec::new();
    for (_, run) in &numbers
        .iter()
        .enumerate()
        .group_by(|(position, &v)| i64::from(v) - *position as i64)
    {
        let mut bounds = None;
        for (_, &v) in run {
            bounds = match bounds {
                None => Some((v, v)),
                Some((first, _)) => Some((first, v)),
            };
        }
        if let Some(b) = bounds {
            runs.push(b);
        }
    }
    runs
}

/// Render runs the way the summary file shows them:
/// `12  - 45  , 58  , 60  - 71`.
fn format_ranges(numbers: &[i32]) -> String {
    number_runs(numbers)
        .into_iter()
        .map(|(first, last)| {
            if first == last {
                format!("{:<3}", first)
            } else {
                format!("{:<3} - {:<3}", first, last)
            }
        })
        .join(" , ")
}

fn append_selection(
    script: &mut String,
    node_number: usize,
    region: usize,
    numbers: &[i32],
    color: &str,
) {
    if numbers.is_empty() {
        return;
    }
    for (k, (first, last)) in number_runs(numbers).into_iter().enumerate() {
        if k == 0 {
            script.push_str(&format!(
                "select region{r}, node_{n} and resi {a}-{b}\n",
                r = region,
                n = node_number,
                a = first,
                b = last
            ));
        } else {
            script.push_str(&format!(
                "select region{r}, region{r} + (node_{n} and resi {a}-{b})\n",
                r = region,
                n = node_number,
                a = first,
                b = last
            ));
        }
    }
    script.push_str(&format!("set_color colour{r} = {c}\n", r = region, c = color));
    script.push_str(&format!("color colour{r}, region{r}\n", r = region));
    script.push_str("deselect\n");
}
