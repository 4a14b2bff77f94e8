use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;

use clap::Parser;
use log::{info, warn};

use motion_tree::output::{self, RunLabel};
use motion_tree::{
    aligned_residues, alpha_coords, distance_matrix, motion_tree, pdb, superpose,
    Error, Params, Termination, LOW_MOTION_RMSD, PERMISSIVE_IDENTITY,
    STANDARD_IDENTITY,
};

/// Build the Motion Tree between two conformations of a protein chain.
///
/// Inputs may come from `key = value` configuration files in the original
/// layout (`--paths`, `--params`) or from the flags below; flags win.
#[derive(Parser, Debug)]
#[clap(author, version, about, arg_required_else_help = true)]
struct Args {
    /// PDB code of the first structure (read from <input-dir>/<code>.pdb)
    #[clap(long)]
    protein1: Option<String>,
    /// PDB code of the second structure
    #[clap(long)]
    protein2: Option<String>,
    /// chain of the first structure
    #[clap(long)]
    chain1: Option<char>,
    /// chain of the second structure
    #[clap(long)]
    chain2: Option<char>,
    /// directory holding the input PDB files
    #[clap(long)]
    input_dir: Option<PathBuf>,
    /// directory receiving the run artefacts
    #[clap(long)]
    output_dir: Option<PathBuf>,
    /// key = value file naming directories, proteins and chains
    #[clap(long)]
    paths: Option<PathBuf>,
    /// key = value file with the engine thresholds
    #[clap(long)]
    params: Option<PathBuf>,
    /// spatial proximity bound in Å (4-8, default 7)
    #[clap(long)]
    spatial_proximity: Option<f64>,
    /// minimum residues on each side of an effective node (0-10, default 5)
    #[clap(long)]
    small_node: Option<usize>,
    /// minimum residues in an effective node (10-50, default 30)
    #[clap(long)]
    clust_size: Option<usize>,
    /// minimum magnitude of an effective node in Å (1-30, default 5)
    #[clap(long)]
    magnitude: Option<usize>,
    /// accept alignments down to 40% identity instead of 90%
    #[clap(long)]
    permissive: bool,
    /// log pipeline progress on stderr
    #[clap(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();
    let default_level = if args.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_level),
    )
    .init();

    if let Err(err) = run(args) {
        eprintln!("motion-tree: {}", err);
        process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut files = match &args.paths {
        Some(path) => read_kv(path)?,
        None => HashMap::new(),
    };
    let protein_1 =
        pick(args.protein1.clone(), files.remove("protein1"), "protein1")?.to_lowercase();
    let protein_2 =
        pick(args.protein2.clone(), files.remove("protein2"), "protein2")?.to_lowercase();
    let chain_1 = args
        .chain1
        .or_else(|| first_char(files.get("chain1id")))
        .unwrap_or('A');
    let chain_2 = args
        .chain2
        .or_else(|| first_char(files.get("chain2id")))
        .unwrap_or('A');
    let input_dir = args
        .input_dir
        .clone()
        .or_else(|| files.remove("input_path").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("data/input"));
    let output_dir = args
        .output_dir
        .clone()
        .or_else(|| files.remove("output_path").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("data/output"));

    let mut params = Params::default();
    if let Some(path) = &args.params {
        apply_params(&mut params, &read_kv(path)?)?;
    }
    if let Some(v) = args.spatial_proximity {
        params.spatial_proximity = v;
    }
    if let Some(v) = args.small_node {
        params.small_node = v;
    }
    if let Some(v) = args.clust_size {
        params.clust_size = v;
    }
    if let Some(v) = args.magnitude {
        params.magnitude = v;
    }
    params.validate()?;

    let chain_a = pdb::read_chain(&input_dir.join(format!("{}.pdb", protein_1)), chain_1)?;
    let chain_b = pdb::read_chain(&input_dir.join(format!("{}.pdb", protein_2)), chain_2)?;
    info!(
        "{} ({}): {} residues; {} ({}): {} residues",
        protein_1,
        chain_1,
        chain_a.len(),
        protein_2,
        chain_2,
        chain_b.len()
    );

    let min_identity = if args.permissive { PERMISSIVE_IDENTITY } else { STANDARD_IDENTITY };
    let map = aligned_residues(&chain_a, &chain_b, min_identity)?;
    info!(
        "aligned {} residues at {:.1}% identity",
        map.len(),
        map.alignment.identity * 100.0
    );

    let coords_1 = alpha_coords(&chain_a, &map.chain_1)?;
    let coords_2 = alpha_coords(&chain_b, &map.chain_2)?;
    let superposition = superpose(&coords_2, &coords_1);
    info!("whole-chain rmsd {:.2} Å", superposition.rmsd);
    if superposition.rmsd < LOW_MOTION_RMSD {
        warn!(
            "{}",
            Error::LowMotion { rmsd: superposition.rmsd, threshold: LOW_MOTION_RMSD }
        );
    }

    let d1 = distance_matrix(&coords_1);
    let d2 = distance_matrix(&coords_2);
    let start = Instant::now();
    let motion = motion_tree(&d1, &d2, &params)?;
    info!("clustering took {:.2?}", start.elapsed());

    let label = RunLabel { protein_1, chain_1, protein_2, chain_2 };
    let dir = output::write_run(
        &output_dir,
        &label,
        &params,
        &motion,
        &chain_a,
        &chain_b,
        &map,
        &superposition,
    )?;
    println!(
        "{} effective nodes, artefacts in {}",
        motion.nodes.len(),
        dir.display()
    );

    // Partial artefacts are on disk; a stalled run still fails loudly.
    if let Termination::NoCandidatePair { merges } = motion.termination {
        return Err(Box::new(Error::NoCandidatePair { merges }));
    }
    Ok(())
}

/// Parse a `key = value` configuration file; lines containing `#` are
/// comments.
fn read_kv(path: &Path) -> Result<HashMap<String, String>, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    let mut map = HashMap::new();
    for line in text.lines() {
        if line.contains('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            map.insert(key.trim().to_string(), value.trim().to_string());
        }
    }
    Ok(map)
}

fn apply_params(
    params: &mut Params,
    kv: &HashMap<String, String>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(v) = kv.get("spatial_proximity") {
        params.spatial_proximity = v.parse()?;
    }
    if let Some(v) = kv.get("small_node") {
        params.small_node = v.parse()?;
    }
    if let Some(v) = kv.get("clust_size") {
        params.clust_size = v.parse()?;
    }
    if let Some(v) = kv.get("magnitude") {
        params.magnitude = v.parse()?;
    }
    if let Some(v) = kv.get("dissimilarity_k") {
        params.dissimilarity_k = v.parse()?;
    }
    Ok(())
}

fn pick(
    flag: Option<String>,
    file: Option<String>,
    name: &str,
) -> Result<String, String> {
    flag.or(file).ok_or_else(|| format!("missing required input: {}", name))
}

fn first_char(value: Option<&String>) -> Option<char> {
    value.and_then(|v| v.chars().next())
}
