use std::ops::{Index, IndexMut};

use rayon::prelude::*;

use crate::float::Float;

/// A dense square matrix with convenient 2-dimensional indexing.
///
/// The matrix is stored row-major and can be indexed using a 2-element
/// array: if `mat` is a `SquareMatrix`, then `mat[[2, 5]]` returns the entry
/// at row `2`, column `5`. Unlike a condensed triangular representation, the
/// full square is kept, because the clustering engine retires rows and
/// columns in place by writing +∞ and a triangular layout cannot express
/// that for both halves cheaply.
#[derive(Clone, Debug, PartialEq)]
pub struct SquareMatrix<T> {
    data: Vec<T>,
    order: usize,
}

impl<T: Copy> SquareMatrix<T> {
    /// Create a new matrix of the given order with every entry set to
    /// `value`.
    pub fn new(order: usize, value: T) -> SquareMatrix<T> {
        SquareMatrix { data: vec![value; order * order], order }
    }

    /// The number of rows (equivalently, columns).
    pub fn order(&self) -> usize {
        self.order
    }

    /// Set every diagonal entry to `value`.
    pub fn fill_diagonal(&mut self, value: T) {
        for i in 0..self.order {
            self.data[i * self.order + i] = value;
        }
    }

    /// Borrow row `r` as a slice.
    pub fn row(&self, r: usize) -> &[T] {
        &self.data[r * self.order..(r + 1) * self.order]
    }

    /// Borrow the row-major backing storage.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }
}

impl<T> Index<[usize; 2]> for SquareMatrix<T> {
    type Output = T;

    fn index(&self, idx: [usize; 2]) -> &T {
        debug_assert!(idx[0] < self.order && idx[1] < self.order);
        &self.data[idx[0] * self.order + idx[1]]
    }
}

impl<T> IndexMut<[usize; 2]> for SquareMatrix<T> {
    fn index_mut(&mut self, idx: [usize; 2]) -> &mut T {
        debug_assert!(idx[0] < self.order && idx[1] < self.order);
        &mut self.data[idx[0] * self.order + idx[1]]
    }
}

/// Compute the pairwise Euclidean distance matrix of a set of points.
///
/// Every entry is computed from the exact same arithmetic expression
/// regardless of which triangle it lies in, so the result is numerically
/// symmetric bit for bit. Rows are filled in parallel.
pub fn distance_matrix<T: Float + Send + Sync>(coords: &[[T; 3]]) -> SquareMatrix<T> {
    let n = coords.len();
    let mut mat = SquareMatrix::new(n, T::zero());
    mat.data
        .par_chunks_mut(n.max(1))
        .enumerate()
        .for_each(|(i, row)| {
            for (j, out) in row.iter_mut().enumerate() {
                *out = euclidean(&coords[i], &coords[j]);
            }
        });
    mat
}

/// Compute the distance-difference matrix `|d1 - d2|`.
///
/// The diagonal is zero; masking it to +∞ is left to the caller so that a
/// pristine copy can be persisted for rendering first.
///
/// # Panics
///
/// This method panics when the two matrices differ in order. Callers that
/// cannot vouch for their inputs should go through
/// [`motion_tree`](crate::motion_tree), which reports the mismatch as a
/// typed error instead.
pub fn difference_matrix<T: Float>(
    d1: &SquareMatrix<T>,
    d2: &SquareMatrix<T>,
) -> SquareMatrix<T> {
    assert_eq!(d1.order(), d2.order(), "conformation matrices must agree in order");
    let n = d1.order();
    let mut out = SquareMatrix::new(n, T::zero());
    for (out, (&a, &b)) in out.data.iter_mut().zip(d1.data.iter().zip(&d2.data)) {
        *out = (a - b).abs();
    }
    out
}

fn euclidean<T: Float>(a: &[T; 3], b: &[T; 3]) -> T {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    (dx * dx + dy * dy + dz * dz).sqrt()
}

#[cfg(test)]
mod tests {
    use super::{difference_matrix, distance_matrix, SquareMatrix};

    #[test]
    fn index_roundtrip() {
        let mut mat = SquareMatrix::new(3, 0.0f64);
        mat[[0, 2]] = 1.5;
        mat[[2, 0]] = 2.5;
        assert_eq!(mat[[0, 2]], 1.5);
        assert_eq!(mat[[2, 0]], 2.5);
        assert_eq!(mat.row(0), &[0.0, 0.0, 1.5]);
    }

    #[test]
    fn distances_are_symmetric_and_exact() {
        let coords = [[0.0f64, 0.0, 0.0], [3.0, 4.0, 0.0], [1.0, 1.0, 1.0]];
        let mat = distance_matrix(&coords);
        assert_eq!(mat[[0, 1]], 5.0);
        for i in 0..3 {
            assert_eq!(mat[[i, i]], 0.0);
            for j in 0..3 {
                assert_eq!(mat[[i, j]], mat[[j, i]]);
            }
        }
    }

    #[test]
    fn difference_is_absolute() {
        let coords_1 = [[0.0f64, 0.0, 0.0], [1.0, 0.0, 0.0]];
        let coords_2 = [[0.0f64, 0.0, 0.0], [4.0, 0.0, 0.0]];
        let d1 = distance_matrix(&coords_1);
        let d2 = distance_matrix(&coords_2);
        let diff = difference_matrix(&d1, &d2);
        assert_eq!(diff[[0, 1]], 3.0);
        assert_eq!(diff[[1, 0]], 3.0);
        assert_eq!(diff[[0, 0]], 0.0);
    }

    #[test]
    fn identical_conformations_difference_is_zero() {
        let coords = [[0.0f64, 0.0, 0.0], [1.0, 2.0, 3.0], [4.0, 4.0, 4.0]];
        let d = distance_matrix(&coords);
        let diff = difference_matrix(&d, &d);
        assert!(diff.as_slice().iter().all(|&v| v == 0.0));
    }
}
