use std::ops::Range;

use itertools::Itertools;

/// An effective node of the Motion Tree: a merge whose magnitude and cluster
/// sizes all clear their thresholds, i.e. a reportable hinge between two
/// rigid domains.
///
/// Nodes are recorded in merge order, so the last node in a run's list
/// corresponds to the final, coarsest cut of the chain. Output formatters
/// present the list reversed, numbering the coarsest node 1.
#[derive(Clone, Debug, PartialEq)]
pub struct MotionNode<T> {
    /// The inter-cluster distance at the time of the merge.
    pub magnitude: T,
    /// Residue indices of the larger side, sorted ascending. Ties in size go
    /// to the cluster with the smaller id.
    pub large_domain: Vec<u32>,
    /// Residue indices of the smaller side, sorted ascending. Disjoint from
    /// `large_domain`; the union of both is the merged cluster.
    pub small_domain: Vec<u32>,
}

impl<T> MotionNode<T> {
    /// The total number of residues that this node partitions.
    pub fn size(&self) -> usize {
        self.large_domain.len() + self.small_domain.len()
    }
}

/// Group an ascending list of residue indices into half-open ranges of
/// consecutive values.
///
/// `[3, 4, 5, 9, 12, 13]` becomes `[3..6, 9..10, 12..14]`. A single linear
/// pass, keyed on the difference between value and position, which is
/// constant exactly along a consecutive run.
pub fn residue_ranges(residues: &[u32]) -> Vec<Range<u32>> {
    let mut ranges = Vec::new();
    for (_, run) in &residues
        .iter()
        .enumerate()
        .group_by(|(position, &r)| i64::from(r) - *position as i64)
    {
        let mut bounds = None;
        for (_, &r) in run {
            bounds = match bounds {
                None => Some((r, r)),
                Some((first, _)) => Some((first, r)),
            };
        }
        if let Some((first, last)) = bounds {
            ranges.push(first..last + 1);
        }
    }
    ranges
}

#[cfg(test)]
mod tests {
    use super::residue_ranges;

    #[test]
    fn empty() {
        assert!(residue_ranges(&[]).is_empty());
    }

    #[test]
    fn one_run() {
        assert_eq!(residue_ranges(&[0, 1, 2, 3]), vec![0..4]);
    }

    #[test]
    fn singletons_and_runs() {
        assert_eq!(
            residue_ranges(&[3, 4, 5, 9, 12, 13]),
            vec![3..6, 9..10, 12..14]
        );
    }

    #[test]
    fn lone_residue() {
        assert_eq!(residue_ranges(&[7]), vec![7..8]);
    }
}
