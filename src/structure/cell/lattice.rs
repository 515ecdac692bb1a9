/* ************************************************************************ **
** This file is part of thermint, and is licensed under EITHER the MIT      **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

use std::sync::Arc;

use crate::SingularLatticeError;

pub type M33 = [[f64; 3]; 3];

/// Defines a vector basis for periodic boundary conditions in three dimensions.
///
/// A `Lattice` is something you multiply "fractional" data against to
/// produce "cartesian" data. Lattice vectors are the rows of the matrix,
/// so a fractional row vector `f` maps to `f . L`.
///
/// The inverse is computed once on construction; construction fails for a
/// singular matrix.
#[derive(Debug, Clone)]
pub struct Lattice {
    matrix: Arc<M33>,
    inverse: Arc<M33>,
}

// Manual impl that doesn't compare the inverse.
impl PartialEq<Lattice> for Lattice {
    fn eq(&self, other: &Lattice) -> bool {
        let Lattice { ref matrix, inverse: _ } = *self;
        matrix == &other.matrix
    }
}

impl Lattice {
    /// Create a lattice from a matrix where the rows are lattice vectors.
    pub fn new(matrix: &M33) -> Result<Self, SingularLatticeError> {
        let inverse = inv3(matrix).ok_or_else(|| SingularLatticeError { matrix: *matrix })?;
        Ok(Lattice { matrix: Arc::new(*matrix), inverse: Arc::new(inverse) })
    }

    /// A cubic lattice ((a, a, a), (90, 90, 90))
    pub fn cubic(a: f64) -> Self { Self::orthorhombic(a, a, a) }

    /// An orthorhombic lattice ((a, b, c), (90, 90, 90))
    ///
    /// # Panics
    ///
    /// Panics if any length is zero.
    pub fn orthorhombic(a: f64, b: f64, c: f64) -> Self {
        assert!(a != 0.0 && b != 0.0 && c != 0.0, "zero-length lattice vector");
        let matrix = [[a, 0., 0.], [0., b, 0.], [0., 0., c]];
        let inverse = [[1. / a, 0., 0.], [0., 1. / b, 0.], [0., 0., 1. / c]];
        Lattice { matrix: Arc::new(matrix), inverse: Arc::new(inverse) }
    }

    /// Matrix where lattice vectors are rows.
    #[inline]
    pub fn matrix(&self) -> &M33
    { &self.matrix }

    /// Get the (precomputed) inverse of the matrix where lattice vectors are rows.
    #[inline]
    pub fn inverse_matrix(&self) -> &M33
    { &self.inverse }

    /// Map one fractional row vector to cartesian space.
    #[inline]
    pub fn frac_to_cart(&self, frac: &[f64; 3]) -> [f64; 3]
    { dot_3_33(frac, &self.matrix) }

    /// Map one cartesian row vector to fractional space.
    #[inline]
    pub fn cart_to_frac(&self, cart: &[f64; 3]) -> [f64; 3]
    { dot_3_33(cart, &self.inverse) }
}

impl Default for Lattice {
    fn default() -> Lattice { Lattice::cubic(1.0) }
}

pub(crate) fn dot_3_33(v: &[f64; 3], m: &M33) -> [f64; 3] {
    let mut out = [0.0; 3];
    for (k, row) in m.iter().enumerate() {
        for c in 0..3 {
            out[c] += v[k] * row[c];
        }
    }
    out
}

fn det3(m: &M33) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

// cofactor inverse; None for a singular matrix (relative to its own scale)
fn inv3(m: &M33) -> Option<M33> {
    let det = det3(m);
    let scale = m.iter().flat_map(|row| row.iter()).fold(0.0_f64, |acc, &x| acc.max(x.abs()));
    if !det.is_finite() || scale == 0.0 || det.abs() <= 1e-12 * scale * scale * scale {
        return None;
    }

    let cof = |r0: usize, r1: usize, c0: usize, c1: usize| {
        m[r0][c0] * m[r1][c1] - m[r0][c1] * m[r1][c0]
    };
    // adjugate, already transposed
    let adj = [
        [ cof(1, 2, 1, 2), -cof(0, 2, 1, 2),  cof(0, 1, 1, 2)],
        [-cof(1, 2, 0, 2),  cof(0, 2, 0, 2), -cof(0, 1, 0, 2)],
        [ cof(1, 2, 0, 1), -cof(0, 2, 0, 1),  cof(0, 1, 0, 1)],
    ];
    let mut out = [[0.0; 3]; 3];
    for r in 0..3 {
        for c in 0..3 {
            out[r][c] = adj[r][c] / det;
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverse_is_inverse() {
        let m = [
            [4.0, 0.5, 0.0],
            [-1.0, 3.0, 0.2],
            [0.3, 0.0, 7.0],
        ];
        let lattice = Lattice::new(&m).unwrap();
        let inv = lattice.inverse_matrix();
        for r in 0..3 {
            let prod = dot_3_33(&m[r], inv);
            for c in 0..3 {
                let expected = if r == c { 1.0 } else { 0.0 };
                assert_close!(abs=1e-12, prod[c], expected);
            }
        }
    }

    #[test]
    fn singular_is_error() {
        let m = [
            [1.0, 2.0, 3.0],
            [2.0, 4.0, 6.0],
            [0.0, 0.0, 1.0],
        ];
        assert!(Lattice::new(&m).is_err());
    }

    // make sure multiplication is done in the correct order
    #[test]
    fn multiplication_order() {
        // a matrix not equal to its transpose
        let lattice = Lattice::new(&[
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [1.0, 0.0, 0.0],
        ]).unwrap();

        assert_eq!(lattice.frac_to_cart(&[1.0, 0.0, 0.0]), [0.0, 1.0, 0.0]);
        assert_eq!(lattice.cart_to_frac(&[1.0, 0.0, 0.0]), [0.0, 0.0, 1.0]);
    }
}
