use crate::error::{Error, Result};

/// The atom name that stands in for a residue's position.
pub const ALPHA_CARBON: &str = "CA";

/// One atom of a residue: its PDB atom name and Cartesian position in Å.
#[derive(Clone, Debug, PartialEq)]
pub struct Atom {
    /// The atom name, e.g. `CA` or `OXT`.
    pub name: String,
    /// The position in Å.
    pub pos: [f64; 3],
}

/// One amino-acid unit of a chain.
#[derive(Clone, Debug, PartialEq)]
pub struct Residue {
    /// Three-letter residue name, e.g. `ALA`.
    pub name: String,
    /// The residue number within its chain, as the depositors assigned it.
    pub seq_num: i32,
    /// The residue's atoms, in file order.
    pub atoms: Vec<Atom>,
}

impl Residue {
    /// Find an atom by name.
    pub fn atom(&self, name: &str) -> Option<&Atom> {
        self.atoms.iter().find(|a| a.name == name)
    }

    /// The α-carbon of this residue, if it has one.
    pub fn alpha_carbon(&self) -> Option<&Atom> {
        self.atom(ALPHA_CARBON)
    }

    /// The one-letter code for this residue's name, `X` for anything
    /// outside the twenty standard amino acids (selenomethionine is folded
    /// into methionine).
    pub fn one_letter(&self) -> char {
        match self.name.as_str() {
            "ALA" => 'A',
            "ARG" => 'R',
            "ASN" => 'N',
            "ASP" => 'D',
            "CYS" => 'C',
            "GLN" => 'Q',
            "GLU" => 'E',
            "GLY" => 'G',
            "HIS" => 'H',
            "ILE" => 'I',
            "LEU" => 'L',
            "LYS" => 'K',
            "MET" | "MSE" => 'M',
            "PHE" => 'F',
            "PRO" => 'P',
            "SER" => 'S',
            "THR" => 'T',
            "TRP" => 'W',
            "TYR" => 'Y',
            "VAL" => 'V',
            _ => 'X',
        }
    }
}

/// One polymer chain of a conformation.
#[derive(Clone, Debug, PartialEq)]
pub struct Chain {
    /// The chain identifier, e.g. `A`.
    pub id: char,
    /// The residues in chain order.
    pub residues: Vec<Residue>,
}

impl Chain {
    /// The number of residues.
    pub fn len(&self) -> usize {
        self.residues.len()
    }

    /// True if and only if the chain has no residues.
    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }

    /// The chain's sequence in one-letter codes.
    pub fn sequence(&self) -> String {
        self.residues.iter().map(Residue::one_letter).collect()
    }
}

/// Extract the α-carbon coordinate vector for the residues selected by
/// `map`, which holds indices into `chain.residues` in aligned order.
///
/// # Errors
///
/// Returns [`Error::MissingBackbone`] when a selected residue has no
/// α-carbon. Maps produced by the residue aligner never trip this, since
/// alignment already drops positions without one; the error guards direct
/// callers.
pub fn alpha_coords(chain: &Chain, map: &[usize]) -> Result<Vec<[f64; 3]>> {
    map.iter()
        .map(|&i| {
            let residue = &chain.residues[i];
            match residue.alpha_carbon() {
                Some(atom) => Ok(atom.pos),
                None => Err(Error::MissingBackbone {
                    name: residue.name.clone(),
                    seq_num: residue.seq_num,
                }),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{alpha_coords, Atom, Chain, Residue};

    pub(crate) fn residue(name: &str, seq_num: i32, ca: Option<[f64; 3]>) -> Residue {
        let mut atoms = vec![Atom { name: "N".to_string(), pos: [0.0, 0.0, 0.0] }];
        if let Some(pos) = ca {
            atoms.push(Atom { name: "CA".to_string(), pos });
        }
        Residue { name: name.to_string(), seq_num, atoms }
    }

    #[test]
    fn one_letter_codes() {
        assert_eq!(residue("GLY", 1, None).one_letter(), 'G');
        assert_eq!(residue("MSE", 1, None).one_letter(), 'M');
        assert_eq!(residue("UNK", 1, None).one_letter(), 'X');
    }

    #[test]
    fn sequence_concatenates_codes() {
        let chain = Chain {
            id: 'A',
            residues: vec![
                residue("ALA", 1, None),
                residue("GLY", 2, None),
                residue("TRP", 3, None),
            ],
        };
        assert_eq!(chain.sequence(), "AGW");
    }

    #[test]
    fn alpha_coords_follow_the_map() {
        let chain = Chain {
            id: 'A',
            residues: vec![
                residue("ALA", 1, Some([0.0, 0.0, 0.0])),
                residue("GLY", 2, Some([1.0, 0.0, 0.0])),
                residue("SER", 3, Some([2.0, 0.0, 0.0])),
            ],
        };
        let coords = alpha_coords(&chain, &[2, 0]).unwrap();
        assert_eq!(coords, vec![[2.0, 0.0, 0.0], [0.0, 0.0, 0.0]]);
    }

    #[test]
    fn missing_alpha_carbon_is_an_error() {
        let chain = Chain { id: 'A', residues: vec![residue("ALA", 7, None)] };
        assert!(alpha_coords(&chain, &[0]).is_err());
    }
}
