//! A lean reader and writer for the fixed-column PDB coordinate format.
//!
//! Only `ATOM` records of the first model are consumed, which is all the
//! pipeline needs: one polymer chain per conformation, with per-residue atom
//! lists. Everything else in a deposition (headers, anisotropic factors,
//! heteroatoms, further models) is skipped.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use log::warn;

use crate::error::{Error, Result};
use crate::protein::{Atom, Chain, Residue};
use crate::superpose::Superposition;

/// Read one chain from a PDB file.
///
/// # Errors
///
/// Returns [`Error::InputMissing`] if the file does not exist,
/// [`Error::ChainNotFound`] if no `ATOM` record carries the requested chain
/// identifier, and [`Error::Io`] for other read failures. Malformed `ATOM`
/// lines are skipped with a warning rather than failing the whole file;
/// real depositions carry plenty of oddities.
pub fn read_chain(path: &Path, chain_id: char) -> Result<Chain> {
    let file = File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => Error::InputMissing { path: path.to_path_buf() },
        _ => Error::Io { path: path.to_path_buf(), source: e },
    })?;
    let structure = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    read_chain_from(BufReader::new(file), &structure, chain_id).map_err(|e| match e {
        Error::Io { source, .. } => Error::Io { path: path.to_path_buf(), source },
        other => other,
    })
}

fn read_chain_from<R: BufRead>(
    reader: R,
    structure: &str,
    chain_id: char,
) -> Result<Chain> {
    let mut residues: Vec<Residue> = Vec::new();
    // Identity of the residue currently being filled: number, insertion
    // code, name.
    let mut current: Option<(i32, char, String)> = None;

    for line in reader.lines() {
        let line = line.map_err(|e| Error::Io { path: structure.into(), source: e })?;
        if line.starts_with("ENDMDL") {
            // Single-model analysis: later models describe the same chain.
            break;
        }
        if !line.starts_with("ATOM") {
            continue;
        }
        let Some(record) = parse_atom_record(&line) else {
            warn!("skipping malformed ATOM record: {}", line);
            continue;
        };
        if record.chain != chain_id {
            continue;
        }
        // Keep only the primary alternate location.
        if record.alt_loc != ' ' && record.alt_loc != 'A' {
            continue;
        }
        let key = (record.seq_num, record.i_code, record.res_name.clone());
        if current.as_ref() != Some(&key) {
            residues.push(Residue {
                name: record.res_name,
                seq_num: record.seq_num,
                atoms: Vec::new(),
            });
            current = Some(key);
        }
        if let Some(residue) = residues.last_mut() {
            residue.atoms.push(Atom { name: record.name, pos: record.pos });
        }
    }

    if residues.is_empty() {
        return Err(Error::ChainNotFound {
            structure: structure.to_string(),
            chain: chain_id,
        });
    }
    Ok(Chain { id: chain_id, residues })
}

struct AtomRecord {
    name: String,
    alt_loc: char,
    res_name: String,
    chain: char,
    seq_num: i32,
    i_code: char,
    pos: [f64; 3],
}

fn parse_atom_record(line: &str) -> Option<AtomRecord> {
    let field = |range: std::ops::Range<usize>| line.get(range).map(str::trim);
    let char_at = |i: usize| {
        line.get(i..i + 1).and_then(|s| s.chars().next()).unwrap_or(' ')
    };
    Some(AtomRecord {
        name: field(12..16)?.to_string(),
        alt_loc: char_at(16),
        res_name: field(17..20)?.to_string(),
        chain: char_at(21),
        seq_num: field(22..26)?.parse().ok()?,
        i_code: char_at(26),
        pos: [
            field(30..38)?.parse().ok()?,
            field(38..46)?.parse().ok()?,
            field(46..54)?.parse().ok()?,
        ],
    })
}

/// Write the combined two-model coordinate file: model 1 holds conformation
/// 1's utilised residues as they are, model 2 holds conformation 2's after
/// superposition onto conformation 1, so that a molecular viewer shows both
/// in one frame.
pub fn write_two_model(
    path: &Path,
    chain_1: &Chain,
    used_1: &[usize],
    chain_2: &Chain,
    used_2: &[usize],
    superposition: &Superposition,
) -> Result<()> {
    let io_err = |e| Error::Io { path: path.to_path_buf(), source: e };
    let mut out = BufWriter::new(File::create(path).map_err(io_err)?);
    write_model(&mut out, 1, chain_1, used_1, None).map_err(io_err)?;
    write_model(&mut out, 2, chain_2, used_2, Some(superposition)).map_err(io_err)?;
    out.flush().map_err(io_err)
}

fn write_model<W: Write>(
    out: &mut W,
    model: usize,
    chain: &Chain,
    used: &[usize],
    superposition: Option<&Superposition>,
) -> io::Result<()> {
    writeln!(out, "MODEL{:>9}", model)?;
    let mut serial = 1;
    for &i in used {
        let residue = &chain.residues[i];
        for atom in &residue.atoms {
            let [x, y, z] = match superposition {
                Some(s) => s.apply(atom.pos),
                None => atom.pos,
            };
            writeln!(
                out,
                "ATOM  {:>5} {:<4} {:>3} {}{:>4}    {:>8.3}{:>8.3}{:>8.3}",
                serial, atom.name, residue.name, chain.id, residue.seq_num, x, y, z
            )?;
            serial += 1;
        }
    }
    writeln!(out, "ENDMDL")
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::{read_chain_from, write_model};
    use crate::protein::{Atom, Chain, Residue};

    const SAMPLE: &str = "\
HEADER    TOY PROTEIN
ATOM      1  N   ALA A   1      11.104   6.134  -6.504  1.00  0.00           N
ATOM      2  CA  ALA A   1      11.639   6.071  -5.147  1.00  0.00           C
ATOM      3  CA BALA A   1      11.700   6.100  -5.100  1.00  0.00           C
ATOM      4  C   ALA A   1      12.321   7.382  -4.803  1.00  0.00           C
ATOM      5  CA  GLY A   2      13.513   8.998  -3.259  1.00  0.00           C
ATOM      6  CA  SER B   1       1.000   2.000   3.000  1.00  0.00           C
ENDMDL
ATOM      7  CA  TRP A   3       0.000   0.000   0.000  1.00  0.00           C
";

    #[test]
    fn reads_first_model_of_one_chain() {
        let chain = read_chain_from(Cursor::new(SAMPLE), "toy", 'A').unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.residues[0].name, "ALA");
        assert_eq!(chain.residues[0].seq_num, 1);
        // The B alternate location is dropped; N, CA and C remain.
        assert_eq!(chain.residues[0].atoms.len(), 3);
        let ca = chain.residues[0].alpha_carbon().unwrap();
        assert_eq!(ca.pos, [11.639, 6.071, -5.147]);
        // The TRP after ENDMDL belongs to the second model.
        assert_eq!(chain.residues[1].name, "GLY");
    }

    #[test]
    fn selects_the_requested_chain() {
        let chain = read_chain_from(Cursor::new(SAMPLE), "toy", 'B').unwrap();
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.residues[0].name, "SER");
    }

    #[test]
    fn unknown_chain_is_an_error() {
        let err = read_chain_from(Cursor::new(SAMPLE), "toy", 'Z').unwrap_err();
        assert!(matches!(err, crate::Error::ChainNotFound { chain: 'Z', .. }));
    }

    #[test]
    fn writes_fixed_columns() {
        let chain = Chain {
            id: 'A',
            residues: vec![Residue {
                name: "ALA".to_string(),
                seq_num: 12,
                atoms: vec![Atom { name: "CA".to_string(), pos: [1.0, -2.25, 3.5] }],
            }],
        };
        let mut out = Vec::new();
        write_model(&mut out, 1, &chain, &[0], None).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "MODEL        1\n\
             ATOM      1 CA   ALA A  12       1.000  -2.250   3.500\nENDMDL\n"
        );
    }
}
