/* ************************************************************************ **
** This file is part of thermint, and is licensed under EITHER the MIT      **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Instantaneous thermodynamic force on each constrained coordinate.
//!
//! With `MJ = Z^-1 J` and mass-scaled forces `F/m`, step `n` gives
//!
//! ```text
//! feg1 = -FACT (MJ_n - MJ_{n-1}) . v_n / dt
//! feg2 = -1/4 (MJ_n + MJ_{n-1}) . (F_n/m + F_{n-1}/m)
//! ```
//!
//! and the first step gives zero.

use itertools::Itertools;
use ndarray::{Array1, Array2};

use crate::FailResult;
use crate::check_len;
use crate::stats::RunningStats;

pub mod units {
    /// fs
    pub const UT: f64 = 1e-15;
    /// Angstrom
    pub const UL: f64 = 1e-10;
    pub const AMTOKG: f64 = 1.6605402e-27;
    pub const EVTOJ: f64 = 1.60217733e-19;

    /// Converts `amu * A / fs^2` to `eV / A`.
    pub const FACT: f64 = AMTOKG * UL / (UT * UT) / (EVTOJ / UL);
}

/// The estimate at one step, one entry per constrained coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct Estimate {
    pub feg: Vec<f64>,
    pub feg1: Vec<f64>,
    pub feg2: Vec<f64>,
}

impl Estimate {
    fn zeros(n: usize) -> Self
    { Estimate { feg: vec![0.0; n], feg1: vec![0.0; n], feg2: vec![0.0; n] } }
}

/// What the estimator needs from one MD step.
#[derive(Debug, Clone, Copy)]
pub struct StepInput<'a> {
    /// `Z^-1 J` over the constrained coordinates (`ncons x 3 natoms`).
    pub metric_jacobian: &'a Array2<f64>,
    /// A/fs
    pub velocities: &'a [[f64; 3]],
    /// eV/A
    pub forces: &'a [[f64; 3]],
    /// amu
    pub masses: &'a [f64],
}

#[derive(Debug, Clone)]
struct Previous {
    metric_jacobian: Array2<f64>,
    scaled_forces: Array1<f64>,
}

/// Everything carried from one step to the next.
///
/// It is moved into [`ThermoForceState::step`] and handed back with the
/// estimate.
#[derive(Debug, Clone)]
pub struct ThermoForceState {
    ncons: usize,
    natoms: usize,
    /// POTIM, fs
    timestep: f64,
    previous: Option<Previous>,
    stats: Vec<RunningStats>,
}

impl ThermoForceState {
    pub fn new(ncons: usize, natoms: usize, timestep: f64) -> Self {
        ThermoForceState {
            ncons, natoms, timestep,
            previous: None,
            stats: vec![RunningStats::new(); ncons],
        }
    }

    pub fn step(self, input: StepInput<'_>) -> FailResult<(Self, Estimate)> {
        let ThermoForceState { ncons, natoms, timestep, previous, mut stats } = self;
        let StepInput { metric_jacobian, velocities, forces, masses } = input;

        check_len("constrained coordinates", ncons, metric_jacobian.rows())?;
        check_len("jacobian columns", 3 * natoms, metric_jacobian.cols())?;
        check_len("velocities", natoms, velocities.len())?;
        check_len("forces", natoms, forces.len())?;
        check_len("masses", natoms, masses.len())?;

        let scaled_forces: Array1<f64> = forces.iter().zip_eq(masses)
            .flat_map(|(f, &m)| vec![f[0] / m, f[1] / m, f[2] / m])
            .collect();

        let estimate = match previous {
            None => Estimate::zeros(ncons),
            Some(prev) => {
                let velocities: Array1<f64> = velocities.iter().flat_map(|v| v.to_vec()).collect();

                let diff = metric_jacobian - &prev.metric_jacobian;
                let sum = metric_jacobian + &prev.metric_jacobian;
                let force_sum = &scaled_forces + &prev.scaled_forces;

                let feg1 = diff.dot(&velocities) * (-units::FACT / timestep);
                let feg2 = sum.dot(&force_sum) * -0.25;
                let feg = &feg1 + &feg2;
                for (stats, &x) in stats.iter_mut().zip_eq(&feg) {
                    stats.push(x);
                }
                Estimate { feg: feg.to_vec(), feg1: feg1.to_vec(), feg2: feg2.to_vec() }
            },
        };

        let previous = Some(Previous {
            metric_jacobian: metric_jacobian.clone(),
            scaled_forces,
        });
        Ok((ThermoForceState { ncons, natoms, timestep, previous, stats }, estimate))
    }

    /// Statistics of `feg` over every step after the first.
    pub fn stats(&self) -> &[RunningStats]
    { &self.stats }
}
