use quickcheck::{Arbitrary, Gen};
use rand::Rng;

use crate::matrix::{distance_matrix, SquareMatrix};

/// A pair of random conformations of the same toy chain, for property
/// tests.
///
/// The first conformation scatters up to a dozen residues inside a 6 Å
/// box, so that most pairs clear the default spatial proximity bound; the
/// second perturbs each coordinate by up to 1.5 Å. Runs over such pairs may
/// still stall on the proximity filter, which the properties must (and do)
/// tolerate.
#[derive(Clone, Debug)]
pub struct ConformationPair {
    coords_1: Vec<[f64; 3]>,
    coords_2: Vec<[f64; 3]>,
}

impl ConformationPair {
    /// The two intra-chain distance matrices.
    pub fn matrices(&self) -> (SquareMatrix<f64>, SquareMatrix<f64>) {
        (distance_matrix(&self.coords_1), distance_matrix(&self.coords_2))
    }
}

impl Arbitrary for ConformationPair {
    fn arbitrary(_g: &mut Gen) -> ConformationPair {
        let mut rng = rand::thread_rng();
        let n = rng.gen_range(2..=12);
        let coords_1: Vec<[f64; 3]> = (0..n)
            .map(|_| {
                [
                    rng.gen_range(0.0..6.0),
                    rng.gen_range(0.0..6.0),
                    rng.gen_range(0.0..6.0),
                ]
            })
            .collect();
        let coords_2 = coords_1
            .iter()
            .map(|c| {
                [
                    c[0] + rng.gen_range(-1.5..1.5),
                    c[1] + rng.gen_range(-1.5..1.5),
                    c[2] + rng.gen_range(-1.5..1.5),
                ]
            })
            .collect();
        ConformationPair { coords_1, coords_2 }
    }
}
