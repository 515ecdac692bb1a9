/* ************************************************************************ **
** This file is part of thermint, and is licensed under EITHER the MIT      **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Dense linear algebra at the scale of a handful of reaction coordinates.

#[macro_use]
extern crate failure;
#[cfg(test)]
#[macro_use]
extern crate thermint_assert_close;
extern crate lapacke;
extern crate lapack_src;

use ndarray::{Array2, ArrayView2};

/// Pivots smaller than this (relative to the largest entry of the matrix)
/// are treated as zero.
pub const DEGENERACY_TOL: f64 = 1e-12;

#[derive(Debug, Fail)]
#[fail(display = "matrix is singular or nearly so (pivot {:e} in column {} of a {}x{} matrix)", pivot, column, dim, dim)]
pub struct DegenerateMatrixError {
    pub dim: usize,
    pub column: usize,
    pub pivot: f64,
}

/// Invert a square matrix, using LAPACKe's dgesv against the identity.
pub fn inv(matrix: ArrayView2<'_, f64>) -> Result<Array2<f64>, DegenerateMatrixError> {
    let n = matrix.rows();
    assert_eq!(n, matrix.cols(), "inv: matrix is not square");

    // lapacke hates size-zero arrays.
    if n == 0 {
        return Ok(Array2::zeros((0, 0)));
    }

    let scale = matrix.iter().fold(0.0_f64, |acc, &x| acc.max(x.abs()));
    // row-major copies; dgesv overwrites `lu` with its factors and `b` with the solution
    let mut lu: Vec<f64> = matrix.iter().cloned().collect();
    let mut b: Vec<f64> = Array2::<f64>::eye(n).iter().cloned().collect();
    let mut ipiv = vec![0; n];

    let layout = lapacke::Layout::RowMajor;
    let dim = n as i32;
    match unsafe { lapacke::dgesv(layout, dim, dim, &mut lu, dim, &mut ipiv, &mut b, dim) } {
        0 => { /* okey dokey */ },
        info if info < 0 => panic!("bad arg number {} to dgesv", -info),
        info => {
            let column = info as usize - 1;
            return Err(DegenerateMatrixError { dim: n, column, pivot: lu[column * n + column] });
        },
    }

    // dgesv only refuses exact zeros on the diagonal of U
    let near_zero = (0..n).find(|&c| !(lu[c * n + c].abs() > DEGENERACY_TOL * scale));
    if let Some(column) = near_zero {
        return Err(DegenerateMatrixError { dim: n, column, pivot: lu[column * n + column] });
    }
    Ok(Array2::from_shape_fn((n, n), |(r, c)| b[r * n + c]))
}

/// Compute `J diag(w) J^T` for a row-major `J`.
///
/// With `w` the per-column inverse masses, this is the mass-metric tensor.
pub fn weighted_gram(rows: ArrayView2<'_, f64>, weights: &[f64]) -> Array2<f64> {
    assert_eq!(rows.cols(), weights.len(), "weighted_gram: column/weight mismatch");

    let n = rows.rows();
    let mut out = Array2::<f64>::zeros((n, n));
    for a in 0..n {
        for b in a..n {
            let value: f64 = rows.row(a).iter()
                .zip(rows.row(b).iter())
                .zip(weights)
                .map(|((&x, &y), &w)| x * w * y)
                .sum();
            out[(a, b)] = value;
            out[(b, a)] = value;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn inverse_of_random() {
        let mut rng = rand::thread_rng();
        for _ in 0..50 {
            let n = rng.gen_range(1, 7);
            // diagonally dominant, so always invertible
            let mat = Array2::from_shape_fn((n, n), |(r, c)| {
                let x = 1.0 - 2.0 * rng.gen::<f64>();
                if r == c { x + 2.0 * n as f64 } else { x }
            });
            let inverse = inv(mat.view()).unwrap();
            let prod = inverse.dot(&mat);
            let eye = Array2::<f64>::eye(n);
            assert_close!(abs=1e-10, prod.as_slice().unwrap(), eye.as_slice().unwrap());
        }
    }

    #[test]
    fn needs_pivoting() {
        let mat = ndarray::arr2(&[[0.0, 2.0], [4.0, 0.0]]);
        let inverse = inv(mat.view()).unwrap();
        assert_close!(inverse.as_slice().unwrap(), &[0.0, 0.25, 0.5, 0.0][..]);
    }

    #[test]
    fn singular() {
        let mat = ndarray::arr2(&[[1.0, 2.0], [2.0, 4.0]]);
        let err = inv(mat.view()).unwrap_err();
        assert_eq!(err.dim, 2);
        assert_eq!(err.column, 1);

        assert!(inv(Array2::<f64>::zeros((3, 3)).view()).is_err());

        // not exactly singular, but U has a vanishing pivot
        let mat = ndarray::arr2(&[[1.0, 1.0], [1.0, 1.0 + 1e-14]]);
        let err = inv(mat.view()).unwrap_err();
        assert_eq!(err.column, 1);
    }

    #[test]
    fn empty() {
        assert_eq!(inv(Array2::<f64>::zeros((0, 0)).view()).unwrap().len(), 0);
    }

    #[test]
    fn gram_weights_columns() {
        let rows = ndarray::arr2(&[
            [1.0, 0.0, 0.0, -1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0, 0.0, 0.0],
        ]);
        let w = [0.5, 0.5, 0.5, 0.25, 0.25, 0.25];
        let gram = weighted_gram(rows.view(), &w);
        assert_close!(gram.as_slice().unwrap(), &[0.75, 0.0, 0.0, 0.5][..]);
    }
}
