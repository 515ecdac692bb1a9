/* ************************************************************************ **
** This file is part of thermint, and is licensed under EITHER the MIT      **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

use crate::Lattice;
use crate::cell::lattice::dot_3_33;

/// Wrapper type for coordinates used as input to some APIs.
///
/// VASP writes trajectories in fractional ("direct") coordinates, while
/// reaction coordinates are defined on cartesian geometry; this type lets
/// both flow through the same functions.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordsKind {
    Carts(Vec<[f64; 3]>),
    Fracs(Vec<[f64; 3]>),
}

impl CoordsKind {
    pub fn len(&self) -> usize
    { self.as_slice().len() }

    pub fn is_empty(&self) -> bool
    { self.len() == 0 }

    fn as_slice(&self) -> &[[f64; 3]]
    { match *self {
        CoordsKind::Carts(ref c) => c,
        CoordsKind::Fracs(ref c) => c,
    }}
}

// conversions
impl CoordsKind {
    pub fn into_carts(self, lattice: &Lattice) -> Vec<[f64; 3]>
    { match self {
        CoordsKind::Carts(c) => c,
        CoordsKind::Fracs(c) => dot_n3_33(&c, lattice.matrix()),
    }}

    pub fn into_fracs(self, lattice: &Lattice) -> Vec<[f64; 3]>
    { match self {
        CoordsKind::Carts(c) => dot_n3_33(&c, lattice.inverse_matrix()),
        CoordsKind::Fracs(c) => c,
    }}

    pub fn to_carts(&self, lattice: &Lattice) -> Vec<[f64; 3]>
    { match *self {
        CoordsKind::Carts(ref c) => c.clone(),
        CoordsKind::Fracs(ref c) => dot_n3_33(c, lattice.matrix()),
    }}

    pub fn to_fracs(&self, lattice: &Lattice) -> Vec<[f64; 3]>
    { match *self {
        CoordsKind::Carts(ref c) => dot_n3_33(c, lattice.inverse_matrix()),
        CoordsKind::Fracs(ref c) => c.clone(),
    }}
}

/// Cartesian displacement `(f_i - f_j) . L` between two fractional positions.
///
/// No minimum-image wrapping is applied.
pub fn frac_displacement(lattice: &Lattice, fi: &[f64; 3], fj: &[f64; 3]) -> [f64; 3] {
    let diff = [fi[0] - fj[0], fi[1] - fj[1], fi[2] - fj[2]];
    lattice.frac_to_cart(&diff)
}

fn dot_n3_33(rows: &[[f64; 3]], m: &[[f64; 3]; 3]) -> Vec<[f64; 3]>
{ rows.iter().map(|v| dot_3_33(v, m)).collect() }

#[cfg(test)]
#[deny(unused)]
mod tests {
    use super::*;
    use crate::CoordsKind::{Fracs, Carts};

    // make sure the library correctly chooses whether to use the
    // regular matrix, the inverse matrix, or no matrix
    #[test]
    fn div_vs_mul() {
        let x = |mag| vec![[mag, 0.0, 0.0]];
        let lattice = Lattice::cubic(2.0);

        assert_eq!(x(1.0), Fracs(x(1.0)).to_fracs(&lattice));
        assert_eq!(x(1.0), Fracs(x(1.0)).into_fracs(&lattice));
        assert_eq!(x(2.0), Fracs(x(1.0)).to_carts(&lattice));
        assert_eq!(x(2.0), Fracs(x(1.0)).into_carts(&lattice));

        assert_eq!(x(0.5), Carts(x(1.0)).to_fracs(&lattice));
        assert_eq!(x(0.5), Carts(x(1.0)).into_fracs(&lattice));
        assert_eq!(x(1.0), Carts(x(1.0)).to_carts(&lattice));
        assert_eq!(x(1.0), Carts(x(1.0)).into_carts(&lattice));
    }

    #[test]
    fn displacement_is_antisymmetric() {
        let lattice = Lattice::orthorhombic(10.0, 12.0, 14.0);
        let a = [0.10, 0.25, 0.50];
        let b = [0.30, 0.20, 0.40];
        let d_ab = frac_displacement(&lattice, &a, &b);
        let d_ba = frac_displacement(&lattice, &b, &a);
        assert_close!(d_ab, [-2.0, 0.6, 1.4]);
        assert_close!(d_ab, [-d_ba[0], -d_ba[1], -d_ba[2]]);
    }

    #[test]
    fn displacement_is_not_wrapped() {
        let lattice = Lattice::cubic(10.0);
        let d = frac_displacement(&lattice, &[0.90, 0.0, 0.0], &[0.05, 0.0, 0.0]);
        assert_close!(d, [8.5, 0.0, 0.0]);
    }
}
