/* ************************************************************************ **
** This file is part of thermint, and is licensed under EITHER the MIT      **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Atomic masses and the mass-metric tensor `Z = J M^-1 J^T`.

use std::collections::BTreeMap;

use ndarray::{Array2, ArrayView2};
use thermint_linalg::DegenerateMatrixError;
use thermint_structure::Element;

use crate::FailResult;

/// Masses (amu) of each atom, by symbol.
///
/// `overrides` take precedence over the standard atomic weights, and may
/// name symbols that are not elements at all (e.g. `Pt_surf`).
pub fn atom_masses(symbols: &[String], overrides: &BTreeMap<String, f64>) -> FailResult<Vec<f64>> {
    symbols.iter()
        .map(|symbol| match overrides.get(symbol) {
            Some(&mass) => Ok(mass),
            None => match symbol.parse::<Element>() {
                Ok(element) => Ok(element.standard_mass()),
                Err(_) => bail!("no mass is known for {:?}; give one under 'masses'", symbol),
            },
        })
        .collect()
}

/// Per-column inverse masses for a `3 natoms` Jacobian.
pub fn column_inverse_masses(masses: &[f64]) -> Vec<f64>
{ masses.iter().flat_map(|&m| vec![1.0 / m; 3]).collect() }

/// `Z^-1` for Jacobian `rows` (one per constrained coordinate).
pub fn inverse_mass_metric(rows: ArrayView2<'_, f64>, inv_masses: &[f64]) -> Result<Array2<f64>, DegenerateMatrixError> {
    let z = thermint_linalg::weighted_gram(rows, inv_masses);
    thermint_linalg::inv(z.view())
}

/// `Z^-1 J`, the quantity the estimator differences between steps.
pub fn metric_jacobian(rows: ArrayView2<'_, f64>, inv_masses: &[f64]) -> Result<Array2<f64>, DegenerateMatrixError> {
    let zinv = inverse_mass_metric(rows, inv_masses)?;
    Ok(zinv.dot(&rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    #[test]
    fn masses() {
        let symbols: Vec<String> = vec!["C".into(), "O".into(), "Pt_s".into()];
        assert!(atom_masses(&symbols, &Default::default()).is_err());

        let overrides = vec![("Pt_s".to_string(), 195.0), ("O".to_string(), 16.0)].into_iter().collect();
        let masses = atom_masses(&symbols, &overrides).unwrap();
        assert_close!(rel=1e-3, masses, vec![12.011, 16.0, 195.0]);
        assert_eq!(column_inverse_masses(&[2.0, 4.0]), vec![0.5, 0.5, 0.5, 0.25, 0.25, 0.25]);
    }

    #[test]
    fn single_distance() {
        // unit vector along x between two atoms of mass 1 and 3
        let rows = arr2(&[[1.0, 0.0, 0.0, -1.0, 0.0, 0.0]]);
        let inv_masses = column_inverse_masses(&[1.0, 3.0]);
        let zinv = inverse_mass_metric(rows.view(), &inv_masses).unwrap();
        assert_close!(zinv[(0, 0)], 0.75);

        let mj = metric_jacobian(rows.view(), &inv_masses).unwrap();
        assert_close!(mj.row(0).to_vec(), vec![0.75, 0.0, 0.0, -0.75, 0.0, 0.0]);
    }

    #[test]
    fn collinear_constraints_are_singular() {
        let rows = arr2(&[
            [1.0, 0.0, 0.0, -1.0, 0.0, 0.0],
            [2.0, 0.0, 0.0, -2.0, 0.0, 0.0],
        ]);
        assert!(inverse_mass_metric(rows.view(), &column_inverse_masses(&[1.0, 1.0])).is_err());
    }
}
