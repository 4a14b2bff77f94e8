use log::{debug, info};

use crate::cluster::ClusterSet;
use crate::dendrogram::{Dendrogram, Step};
use crate::error::{Error, Result};
use crate::float::Float;
use crate::matrix::{difference_matrix, SquareMatrix};
use crate::node::MotionNode;

/// Tunable parameters of the clustering engine.
///
/// The documented bounds are what the interactive shells offer;
/// [`Params::validate`] enforces them for configuration input. The engine
/// itself accepts any values so that callers (tests in particular) can probe
/// degenerate settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Params {
    /// σ, in Å: the largest intra-chain α-carbon distance at which two
    /// clusters still count as spatially adjacent. Default 7.0, bounds 4–8.
    pub spatial_proximity: f64,
    /// sₘᵢₙ: the minimum number of residues each side of a merge must hold
    /// for the merge to be an effective node. Default 5, bounds 0–10.
    pub small_node: usize,
    /// Cₘᵢₙ: the minimum total size of the merged cluster for the merge to
    /// be an effective node. Default 30, bounds 10–50.
    pub clust_size: usize,
    /// μ, in Å: the minimum magnitude for an effective node. Default 5,
    /// bounds 1–30.
    pub magnitude: usize,
    /// k: how many of the largest inter-residue differences are averaged
    /// when two clusters have more than k residue pairs between them.
    /// Default 20.
    pub dissimilarity_k: usize,
}

impl Default for Params {
    fn default() -> Params {
        Params {
            spatial_proximity: 7.0,
            small_node: 5,
            clust_size: 30,
            magnitude: 5,
            dissimilarity_k: 20,
        }
    }
}

impl Params {
    /// Check every parameter against its documented bounds.
    ///
    /// Configuration layers call this before starting a run; the engine does
    /// not, so out-of-bounds experiments remain possible programmatically.
    pub fn validate(&self) -> Result<()> {
        check("spatial_proximity", self.spatial_proximity, 4.0, 8.0)?;
        check("small_node", self.small_node as f64, 0.0, 10.0)?;
        check("clust_size", self.clust_size as f64, 10.0, 50.0)?;
        check("magnitude", self.magnitude as f64, 1.0, 30.0)?;
        Ok(())
    }
}

fn check(name: &'static str, value: f64, min: f64, max: f64) -> Result<()> {
    if value < min || value > max {
        return Err(Error::ParamOutOfRange { name, value, min, max });
    }
    Ok(())
}

/// How a clustering run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    /// All residues ended up in a single cluster after `N - 1` merges.
    Complete,
    /// Clustering stalled because every remaining cluster pair fails the
    /// spatial proximity measure in at least one conformation. The
    /// dendrogram and node list hold whatever was built up to that point.
    NoCandidatePair {
        /// The number of merges completed before the stall.
        merges: usize,
    },
}

/// The result of a Motion Tree run.
#[derive(Clone, Debug, PartialEq)]
pub struct Motion<T> {
    /// The distance-difference matrix `|D¹ - D²|` with its natural zero
    /// diagonal, as persisted and rendered by the output formatter.
    pub diff: SquareMatrix<T>,
    /// The linkage record: one step per merge, in merge order.
    pub dendrogram: Dendrogram<T>,
    /// The effective nodes, in merge order. The last entry is the coarsest
    /// split of the chain.
    pub nodes: Vec<MotionNode<T>>,
    /// Whether the run completed or stalled.
    pub termination: Termination,
}

impl<T> Motion<T> {
    /// True if and only if the run merged everything into one cluster.
    pub fn is_complete(&self) -> bool {
        self.termination == Termination::Complete
    }
}

/// Build the Motion Tree for two conformations given their intra-chain
/// α-carbon distance matrices.
///
/// The matrices must be symmetric, non-negative and of equal order `N`;
/// entry `[i, j]` is the Euclidean distance between residues `i` and `j` of
/// the respective conformation, with residues indexed by their aligned
/// position. The run is deterministic: ties in the nearest-pair search are
/// broken row-major over the upper triangle of the working matrix.
///
/// The constrained agglomeration differs from an ordinary linkage in two
/// ways. First, the closest pair (by difference of distances) is only merged
/// if the two clusters are spatially adjacent in *both* conformations: some
/// residue pair between them must lie within `spatial_proximity` Å in D¹,
/// and some (possibly different) pair within the same bound in D². Rejected
/// pairs are set aside for the remainder of the iteration and the search
/// continues with the next-closest pair. Second, the distance between a
/// newly formed cluster and every other cluster is the mean of the
/// `dissimilarity_k` largest original inter-residue differences between
/// them, so a large rigid body cannot drown a genuine hinge in a sea of
/// small differences.
///
/// # Errors
///
/// Returns [`Error::DimensionMismatch`] when the two matrices differ in
/// order, and [`Error::InvariantViolation`] if the working matrix produces
/// a non-finite distance for an active pair, which indicates a bug rather
/// than bad input. A stall for lack of spatially adjacent pairs is *not*
/// an error: it is reported through [`Termination::NoCandidatePair`] so
/// the partial dendrogram and the nodes emitted so far stay available.
pub fn motion_tree<T: Float>(
    d1: &SquareMatrix<T>,
    d2: &SquareMatrix<T>,
    params: &Params,
) -> Result<Motion<T>> {
    if d1.order() != d2.order() {
        return Err(Error::DimensionMismatch {
            order_1: d1.order(),
            order_2: d2.order(),
        });
    }
    let n = d1.order();
    let diff = difference_matrix(d1, d2);
    if n < 2 {
        return Ok(Motion {
            diff,
            dendrogram: Dendrogram::new(n),
            nodes: vec![],
            termination: Termination::Complete,
        });
    }
    info!("clustering {} aligned residues", n);

    let sigma = T::from_f64(params.spatial_proximity);
    let mu = T::from_usize(params.magnitude);
    let mut clusters = ClusterSet::new(n);

    // The working matrix is preallocated at its final order. Rows and
    // columns of merged clusters are retired by writing +∞ rather than
    // compacted, so a cluster id indexes its row directly.
    let full = 2 * n - 1;
    let mut work = SquareMatrix::new(full, T::infinity());
    for i in 0..n {
        for j in 0..n {
            if i != j {
                work[[i, j]] = diff[[i, j]];
            }
        }
    }

    let mut steps = Dendrogram::new(n);
    let mut nodes = Vec::new();
    let mut visited: Vec<(usize, usize)> = Vec::new();

    for completed in 0..n - 1 {
        // The visited set only spans one merge iteration: merging changes
        // the cluster pairs, so earlier rejections are stale.
        visited.clear();
        let (a, b, dist) = loop {
            let (a, b, dist) = match argmin(&work, &clusters, &visited) {
                Some(found) => found,
                None => {
                    info!(
                        "no spatially adjacent cluster pair left after {} merges",
                        completed
                    );
                    return Ok(Motion {
                        diff,
                        dendrogram: steps,
                        nodes,
                        termination: Termination::NoCandidatePair { merges: completed },
                    });
                }
            };
            if !dist.is_finite() {
                return Err(Error::InvariantViolation { a, b });
            }
            let r_a = clusters.members(a);
            let r_b = clusters.members(b);
            if spatially_adjacent(d1, r_a, r_b, sigma)
                && spatially_adjacent(d2, r_a, r_b, sigma)
            {
                break (a, b, dist);
            }
            debug!("pair ({}, {}) rejected by the spatial proximity measure", a, b);
            visited.push((a, b));
        };

        let size_a = clusters.members(a).len();
        let size_b = clusters.members(b).len();
        if dist > mu
            && size_a >= params.small_node
            && size_b >= params.small_node
            && size_a + size_b >= params.clust_size
        {
            nodes.push(effective_node(&clusters, a, b, dist));
        }

        let id = clusters.merge(a, b);
        steps.push(Step::new(a, b, dist, size_a + size_b));
        debug!("merge {}: {} + {} -> {} at {}", completed, a, b, id, dist);

        for x in 0..full {
            work[[a, x]] = T::infinity();
            work[[x, a]] = T::infinity();
            work[[b, x]] = T::infinity();
            work[[x, b]] = T::infinity();
        }
        let merged = clusters.members(id);
        for c in clusters.ids() {
            if c == id {
                continue;
            }
            let linked =
                top_k_mean(&diff, merged, clusters.members(c), params.dissimilarity_k);
            work[[id, c]] = linked;
            work[[c, id]] = linked;
        }
    }

    info!(
        "motion tree complete: {} merges, {} effective nodes",
        steps.len(),
        nodes.len()
    );
    Ok(Motion { diff, dendrogram: steps, nodes, termination: Termination::Complete })
}

/// Find the active pair `(a, b)` with `a < b` minimising the working
/// distance, skipping pairs already rejected this iteration. The scan walks
/// the upper triangle row-major and keeps the first minimum, which is the
/// tie-break order the whole run's determinism rests on.
fn argmin<T: Float>(
    work: &SquareMatrix<T>,
    clusters: &ClusterSet,
    visited: &[(usize, usize)],
) -> Option<(usize, usize, T)> {
    let mut min: Option<(usize, usize, T)> = None;
    let mut rows = clusters.ids();
    while let Some(a) = rows.next() {
        for b in rows.clone() {
            if visited.contains(&(a, b)) {
                continue;
            }
            let value = work[[a, b]];
            match min {
                Some((_, _, best)) if !(value < best) => {}
                _ => min = Some((a, b, value)),
            }
        }
    }
    min
}

/// True if some residue of `r_a` lies within `sigma` of some residue of
/// `r_b` in the conformation described by `d`. Exits on the first witness.
fn spatially_adjacent<T: Float>(
    d: &SquareMatrix<T>,
    r_a: &[u32],
    r_b: &[u32],
    sigma: T,
) -> bool {
    r_a.iter()
        .any(|&i| r_b.iter().any(|&j| d[[i as usize, j as usize]] < sigma))
}

/// The linkage rule: the mean of the `k` largest original inter-residue
/// differences between the two clusters, or of all of them when there are
/// no more than `k`. The sort is stable under the total float order, so
/// equal differences cannot reorder between runs.
fn top_k_mean<T: Float>(
    diff: &SquareMatrix<T>,
    r_a: &[u32],
    r_b: &[u32],
    k: usize,
) -> T {
    let mut deltas = Vec::with_capacity(r_a.len() * r_b.len());
    for &i in r_a {
        for &j in r_b {
            deltas.push(diff[[i as usize, j as usize]]);
        }
    }
    if k > 0 && deltas.len() > k {
        deltas.sort_by(|x, y| y.total_cmp(x));
        deltas.truncate(k);
    }
    let mut sum = T::zero();
    for &d in &deltas {
        sum = sum + d;
    }
    sum / T::from_usize(deltas.len())
}

fn effective_node<T: Float>(
    clusters: &ClusterSet,
    a: usize,
    b: usize,
    dist: T,
) -> MotionNode<T> {
    let mut r_a = clusters.members(a).to_vec();
    let mut r_b = clusters.members(b).to_vec();
    r_a.sort_unstable();
    r_b.sort_unstable();
    // `a < b` for every argmin pair, so on equal sizes the cluster with the
    // smaller id becomes the large domain.
    let (large_domain, small_domain) =
        if r_b.len() > r_a.len() { (r_b, r_a) } else { (r_a, r_b) };
    MotionNode { magnitude: dist, large_domain, small_domain }
}
