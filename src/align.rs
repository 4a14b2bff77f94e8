use log::debug;

use crate::error::{Error, Result};
use crate::protein::Chain;

/// Default identity threshold: the two sequences must match in at least 90%
/// of the shorter one's positions.
pub const STANDARD_IDENTITY: f64 = 0.90;

/// Relaxed identity threshold for permissive mode, e.g. for comparing
/// homologues rather than two depositions of the same protein.
pub const PERMISSIVE_IDENTITY: f64 = 0.40;

/// If conformation 2's numbering starts more than this many positions after
/// conformation 1's, the difference is treated as wholesale renumbering
/// rather than a missing stretch, and subtracted back out.
const RENUMBER_GAP: i32 = 10;

const MATCH: i32 = 1;
const MISMATCH: i32 = -1;
const GAP: i32 = -1;

/// A global pairwise sequence alignment.
#[derive(Clone, Debug, PartialEq)]
pub struct Alignment {
    /// The first sequence with `-` at gap positions.
    pub aligned_1: String,
    /// The second sequence with `-` at gap positions.
    pub aligned_2: String,
    /// Fraction of matched positions relative to the shorter input.
    pub identity: f64,
}

/// The equal-length, index-aligned view of two chains.
///
/// A residue index (RI) in `[0, N)` selects one aligned position; the two
/// vectors map it to positions in each chain's residue list. Both mappings
/// are strictly increasing and are read-only once built.
#[derive(Clone, Debug)]
pub struct ResidueMap {
    /// RI → index into conformation 1's residues.
    pub chain_1: Vec<usize>,
    /// RI → index into conformation 2's residues.
    pub chain_2: Vec<usize>,
    /// Offset subtracted from conformation 2's residue numbering on output,
    /// per the renumbering heuristic. Usually zero.
    pub offset_2: i32,
    /// The alignment the mapping was derived from, for reference.
    pub alignment: Alignment,
}

impl ResidueMap {
    /// The aligned residue count N.
    pub fn len(&self) -> usize {
        self.chain_1.len()
    }

    /// True if and only if no position survived alignment.
    pub fn is_empty(&self) -> bool {
        self.chain_1.is_empty()
    }
}

/// Globally align two sequences with the Needleman–Wunsch algorithm.
///
/// Scoring is +1 for a match, −1 for a mismatch and −1 per gap position.
/// Ties in the dynamic program are broken deterministically, preferring a
/// pairing over a gap in the first sequence over a gap in the second.
pub fn align(seq_1: &str, seq_2: &str) -> Alignment {
    let a = seq_1.as_bytes();
    let b = seq_2.as_bytes();
    let (la, lb) = (a.len(), b.len());
    let width = lb + 1;

    // Direction codes for the traceback.
    const STOP: u8 = 0;
    const PAIR: u8 = 1;
    const UP: u8 = 2;
    const LEFT: u8 = 3;

    let mut score = vec![0i32; (la + 1) * width];
    let mut dir = vec![STOP; (la + 1) * width];
    for i in 1..=la {
        score[i * width] = -(i as i32);
        dir[i * width] = UP;
    }
    for j in 1..=lb {
        score[j] = -(j as i32);
        dir[j] = LEFT;
    }
    for i in 1..=la {
        for j in 1..=lb {
            let pair = score[(i - 1) * width + j - 1]
                + if a[i - 1] == b[j - 1] { MATCH } else { MISMATCH };
            let up = score[(i - 1) * width + j] + GAP;
            let left = score[i * width + j - 1] + GAP;
            let (mut best, mut from) = (pair, PAIR);
            if up > best {
                best = up;
                from = UP;
            }
            if left > best {
                best = left;
                from = LEFT;
            }
            score[i * width + j] = best;
            dir[i * width + j] = from;
        }
    }

    let mut aligned_1 = Vec::new();
    let mut aligned_2 = Vec::new();
    let (mut i, mut j) = (la, lb);
    while i > 0 || j > 0 {
        match dir[i * width + j] {
            PAIR => {
                i -= 1;
                j -= 1;
                aligned_1.push(a[i]);
                aligned_2.push(b[j]);
            }
            UP => {
                i -= 1;
                aligned_1.push(a[i]);
                aligned_2.push(b'-');
            }
            _ => {
                j -= 1;
                aligned_1.push(b'-');
                aligned_2.push(b[j]);
            }
        }
    }
    aligned_1.reverse();
    aligned_2.reverse();

    let matches = aligned_1
        .iter()
        .zip(&aligned_2)
        .filter(|(&x, &y)| x != b'-' && x == y)
        .count();
    let shorter = la.min(lb);
    let identity = if shorter == 0 { 0.0 } else { matches as f64 / shorter as f64 };

    Alignment {
        aligned_1: String::from_utf8_lossy(&aligned_1).into_owned(),
        aligned_2: String::from_utf8_lossy(&aligned_2).into_owned(),
        identity,
    }
}

/// Produce the index-aligned residue mapping between two chains.
///
/// The chains' one-letter sequences are aligned globally; positions where
/// either side has a gap or lacks an α-carbon are dropped, and what remains
/// is numbered by residue index. Both mappings come out strictly increasing
/// in each chain's native order.
///
/// # Errors
///
/// Returns [`Error::SeqIdentityLow`] when the alignment identity falls
/// below `min_identity` ([`STANDARD_IDENTITY`] or [`PERMISSIVE_IDENTITY`]
/// for the two stock modes).
pub fn aligned_residues(
    chain_1: &Chain,
    chain_2: &Chain,
    min_identity: f64,
) -> Result<ResidueMap> {
    let alignment = align(&chain_1.sequence(), &chain_2.sequence());
    if alignment.identity < min_identity {
        return Err(Error::SeqIdentityLow {
            identity: alignment.identity,
            threshold: min_identity,
        });
    }

    let mut map_1 = Vec::new();
    let mut map_2 = Vec::new();
    let (mut i1, mut i2) = (0usize, 0usize);
    for (c1, c2) in alignment.aligned_1.bytes().zip(alignment.aligned_2.bytes()) {
        if c1 != b'-' && c2 != b'-' {
            let has_ca = chain_1.residues[i1].alpha_carbon().is_some()
                && chain_2.residues[i2].alpha_carbon().is_some();
            if has_ca {
                map_1.push(i1);
                map_2.push(i2);
            }
        }
        if c1 != b'-' {
            i1 += 1;
        }
        if c2 != b'-' {
            i2 += 1;
        }
    }
    debug!(
        "aligned {} residues at identity {:.3}",
        map_1.len(),
        alignment.identity
    );

    let offset_2 = match (chain_1.residues.first(), chain_2.residues.first()) {
        (Some(r1), Some(r2)) if r2.seq_num - r1.seq_num > RENUMBER_GAP => {
            debug!(
                "conformation 2 starts at {}, conformation 1 at {}: renumbering assumed",
                r2.seq_num, r1.seq_num
            );
            r2.seq_num - r1.seq_num
        }
        _ => 0,
    };

    Ok(ResidueMap { chain_1: map_1, chain_2: map_2, offset_2, alignment })
}

#[cfg(test)]
mod tests {
    use super::{align, aligned_residues, PERMISSIVE_IDENTITY, STANDARD_IDENTITY};
    use crate::protein::{Atom, Chain, Residue};

    fn chain_of(seq: &str, first_num: i32) -> Chain {
        let residues = seq
            .chars()
            .enumerate()
            .map(|(i, c)| Residue {
                name: three_letter(c),
                seq_num: first_num + i as i32,
                atoms: vec![Atom {
                    name: "CA".to_string(),
                    pos: [i as f64, 0.0, 0.0],
                }],
            })
            .collect();
        Chain { id: 'A', residues }
    }

    fn three_letter(c: char) -> String {
        match c {
            'A' => "ALA",
            'C' => "CYS",
            'D' => "ASP",
            'E' => "GLU",
            'F' => "PHE",
            'G' => "GLY",
            'K' => "LYS",
            'W' => "TRP",
            _ => "UNK",
        }
        .to_string()
    }

    #[test]
    fn identical_sequences() {
        let al = align("ACDEFG", "ACDEFG");
        assert_eq!(al.aligned_1, "ACDEFG");
        assert_eq!(al.aligned_2, "ACDEFG");
        assert_eq!(al.identity, 1.0);
    }

    #[test]
    fn gap_is_opened_for_a_deletion() {
        let al = align("ACDEFG", "ACEFG");
        assert_eq!(al.aligned_1, "ACDEFG");
        assert_eq!(al.aligned_2, "AC-EFG");
        assert_eq!(al.identity, 1.0);
    }

    #[test]
    fn mismatches_lower_identity() {
        let al = align("AAAA", "AAAW");
        assert_eq!(al.identity, 0.75);
    }

    #[test]
    fn mapping_skips_gapped_positions() {
        let chain_1 = chain_of("ACDEFG", 1);
        let chain_2 = chain_of("ACEFG", 1);
        let map = aligned_residues(&chain_1, &chain_2, PERMISSIVE_IDENTITY).unwrap();
        assert_eq!(map.len(), 5);
        assert_eq!(map.chain_1, vec![0, 1, 3, 4, 5]);
        assert_eq!(map.chain_2, vec![0, 1, 2, 3, 4]);
        assert_eq!(map.offset_2, 0);
    }

    #[test]
    fn mapping_skips_residues_without_alpha_carbon() {
        let chain_1 = chain_of("ACDE", 1);
        let mut chain_2 = chain_of("ACDE", 1);
        chain_2.residues[2].atoms.clear();
        let map = aligned_residues(&chain_1, &chain_2, STANDARD_IDENTITY).unwrap();
        assert_eq!(map.chain_1, vec![0, 1, 3]);
        assert_eq!(map.chain_2, vec![0, 1, 3]);
    }

    #[test]
    fn low_identity_is_rejected() {
        let chain_1 = chain_of("AAAAAAAA", 1);
        let chain_2 = chain_of("WWWWKKKK", 1);
        let err = aligned_residues(&chain_1, &chain_2, STANDARD_IDENTITY).unwrap_err();
        assert!(matches!(err, crate::Error::SeqIdentityLow { .. }));
    }

    #[test]
    fn large_start_offset_is_treated_as_renumbering() {
        let chain_1 = chain_of("ACDEFG", 1);
        let chain_2 = chain_of("ACDEFG", 101);
        let map = aligned_residues(&chain_1, &chain_2, STANDARD_IDENTITY).unwrap();
        assert_eq!(map.offset_2, 100);

        // A small start offset is an honest gap, not renumbering.
        let chain_3 = chain_of("ACDEFG", 6);
        let map = aligned_residues(&chain_1, &chain_3, STANDARD_IDENTITY).unwrap();
        assert_eq!(map.offset_2, 0);
    }
}
