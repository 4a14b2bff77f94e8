/*!
This crate builds a *Motion Tree* between two conformations of the same
protein chain: a hierarchical decomposition of the chain into rigid
sub-domains whose relative motion explains the conformational change,
following the Motion Tree method of Koike, Ota and Kidera.

The pipeline is, leaves first: align the two chains residue by residue,
take the α-carbon of every aligned residue, compute the intra-chain
pairwise distance matrix of each conformation, subtract the matrices
entry-wise into the distance-difference matrix, and cluster that matrix
agglomeratively. The clustering is *constrained*: two clusters may only
merge while they are spatially adjacent in both conformations, and the
distance between clusters is the mean of the largest residue-level
differences between them, so the tree's deep nodes separate rigid bodies at
genuine hinges.

# Overview

The most important parts of this crate are as follows:

* [`motion_tree`] runs the constrained clustering engine over a pair of
  intra-chain distance matrices.
* [`Params`] carries the engine's thresholds: spatial proximity, the
  effective-node gates and the top-k linkage depth.
* [`Motion`] is the result: the difference matrix, the stepwise
  [`Dendrogram`] and the effective [`MotionNode`]s, each of which names the
  two rigid domains a hinge separates.
* [`aligned_residues`], [`pdb::read_chain`], [`distance_matrix`] and
  [`superpose`] feed the engine from structure files; [`output::write_run`]
  writes every artefact of a run to disk.

# Example

Four residues in a row, with the outer two bending away in the second
conformation:

```
use motion_tree::{distance_matrix, motion_tree, Params};

let coords_1 = [
    [0.0, 0.0, 0.0],
    [3.8, 0.0, 0.0],
    [7.6, 0.0, 0.0],
    [11.4, 0.0, 0.0],
];
let coords_2 = [
    [0.0, 0.0, 0.0],
    [3.8, 0.0, 0.0],
    [7.6, 1.0, 0.5],
    [11.0, 2.5, 1.0],
];

let d1 = distance_matrix(&coords_1);
let d2 = distance_matrix(&coords_2);
let motion = motion_tree(&d1, &d2, &Params::default()).unwrap();

// A complete run over N residues always has N - 1 merges; the last one
// joins the whole chain.
assert!(motion.is_complete());
assert_eq!(motion.dendrogram.len(), 3);
assert_eq!(motion.dendrogram.steps().last().unwrap().size, 4);
```

Each step of the dendrogram is a 4-tuple of the two merged cluster labels,
the motion magnitude between them and the size of the new cluster, in the
same labeling scheme SciPy uses, so the linkage can be fed to any stock
dendrogram plotter. Merges that clear all four effectiveness gates
additionally emit a [`MotionNode`] listing the residues on both sides of
the hinge.

# Determinism

Given identical inputs and parameters, a run is reproducible to the byte:
the nearest-pair scan walks the upper triangle row-major and keeps the
first minimum, and the top-k linkage sorts under a total float order. The
engine is a pure single-threaded computation; only the distance-matrix
construction in front of it uses data parallelism.

# Testing

Unit tests live next to the data structures they cover. The engine is
additionally exercised by quickcheck properties over random conformation
pairs, checking determinism, linkage shape, the effective-node gates and
the all-zero behaviour of identical conformations.
*/

#![deny(missing_docs)]

pub use crate::align::{
    align, aligned_residues, Alignment, ResidueMap, PERMISSIVE_IDENTITY,
    STANDARD_IDENTITY,
};
pub use crate::dendrogram::{Dendrogram, Step};
pub use crate::engine::{motion_tree, Motion, Params, Termination};
pub use crate::error::{Error, Result};
pub use crate::float::Float;
pub use crate::matrix::{difference_matrix, distance_matrix, SquareMatrix};
pub use crate::node::{residue_ranges, MotionNode};
pub use crate::protein::{alpha_coords, Atom, Chain, Residue, ALPHA_CARBON};
pub use crate::superpose::{superpose, Superposition, LOW_MOTION_RMSD};

mod align;
mod cluster;
mod dendrogram;
mod engine;
mod error;
mod float;
mod matrix;
mod node;
pub mod output;
pub mod pdb;
mod protein;
pub mod render;
mod superpose;
#[cfg(test)]
mod test;
