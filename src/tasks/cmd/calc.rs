/* ************************************************************************ **
** This file is part of thermint, and is licensed under EITHER the MIT      **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! `thermint-calc`: thermodynamic forces from a `fort.129` trajectory.

use std::io::Write;
use std::path::Path;

use failure::ResultExt;
use thermint_fs_util as fsx;
use thermint_log_io::{TrajectoryStep, read_trajectory};
use thermint_log_io::dat::{self, DatSample};
use thermint_log_io::poscar::{self, Poscar};
use thermint_log_io::tfilog::{self, TfiEntry};
use thermint_tasks_config::ValidatedSettings;

use crate::FailResult;
use crate::coords::{self, RcDef, RcSet};
use crate::estimator::{Estimate, StepInput, ThermoForceState};
use crate::metric;
use crate::stats::RunningStats;

/// One MD step's coordinates and estimate, for the constrained coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct ThermoForceRecord {
    pub step: usize,
    pub values: Vec<f64>,
    pub estimate: Estimate,
}

#[derive(Debug, Clone)]
pub struct CalcRun {
    /// Names of the constrained coordinates, in definition order.
    pub names: Vec<String>,
    pub records: Vec<ThermoForceRecord>,
    /// Per constrained coordinate, over every step after the first.
    pub stats: Vec<RunningStats>,
}

impl CalcRun {
    /// The `(step, value, feg)` series of the `k`th constrained coordinate.
    pub fn samples(&self, k: usize) -> Vec<DatSample> {
        self.records.iter()
            .map(|r| DatSample { step: r.step, coord: r.values[k], gradient: Some(r.estimate.feg[k]) })
            .collect()
    }

    pub fn write_tfilog(&self, mut w: impl Write) -> FailResult<()> {
        for record in &self.records {
            let entries: Vec<_> = self.names.iter().enumerate()
                .map(|(k, name)| TfiEntry {
                    name,
                    value: record.values[k],
                    feg: record.estimate.feg[k],
                    feg1: record.estimate.feg1[k],
                    feg2: record.estimate.feg2[k],
                })
                .collect();
            tfilog::write_step(&mut w, record.step, &entries)?;
        }
        Ok(())
    }

    /// Indices of the coordinates named in `report` (all of them when empty).
    pub fn report_indices(&self, report: &[String]) -> FailResult<Vec<usize>> {
        if report.is_empty() {
            return Ok((0..self.names.len()).collect());
        }
        report.iter()
            .map(|name| match self.names.iter().position(|n| n == name) {
                Some(k) => Ok(k),
                None => bail!("cannot report {:?}: it is part of a combination, so it has no thermodynamic force", name),
            })
            .collect()
    }
}

/// Run the estimator over a trajectory.
pub fn compute_thermo_forces(
    settings: &ValidatedSettings,
    poscar: &Poscar,
    steps: &[TrajectoryStep],
) -> FailResult<CalcRun> {
    let natoms = poscar.num_atoms();
    let defs = settings.reaction_coordinates.iter().map(RcDef::from).collect();
    let rcs = RcSet::new(defs, natoms)?;

    let masses = metric::atom_masses(&poscar.symbols, &settings.masses)?;
    let inv_masses = metric::column_inverse_masses(&masses);

    let names: Vec<String> = rcs.constrained().iter().map(|&i| rcs.name(i).to_string()).collect();
    info!("{} reaction coordinates, {} constrained: {}", rcs.len(), names.len(), names.join(" "));

    let mut state = ThermoForceState::new(names.len(), natoms, settings.timestep);
    let mut records = Vec::with_capacity(steps.len());
    for step in steps {
        let eval = coords::evaluate(&rcs, &poscar.lattice, &step.fracs)
            .with_context(|_| format!("MD step {}", step.step))?;
        let rows = eval.constrained_rows(&rcs);
        let metric_jacobian = metric::metric_jacobian(rows.view(), &inv_masses)
            .with_context(|_| format!("mass metric at MD step {}", step.step))?;

        let (next, estimate) = state.step(StepInput {
            metric_jacobian: &metric_jacobian,
            velocities: &step.velocities,
            forces: &step.forces,
            masses: &masses,
        })?;
        state = next;

        trace!("MD step {}: feg = {:?}", step.step, estimate.feg);
        let values = rcs.constrained().iter().map(|&i| eval.values[i]).collect();
        records.push(ThermoForceRecord { step: step.step, values, estimate });
    }

    Ok(CalcRun { names, records, stats: state.stats().to_vec() })
}

/// Read the inputs, estimate, and write `TFILOG` and `THFO-<rc>.dat` into `outdir`.
pub fn run_calc(
    settings: &ValidatedSettings,
    poscar_path: &Path,
    trajectory_path: &Path,
    max_steps: Option<usize>,
    outdir: &Path,
) -> FailResult<CalcRun> {
    let poscar = poscar::load_txt(fsx::open_text(poscar_path)?)
        .with_context(|_| format!("reading {}", poscar_path.display()))?;
    info!("{} atoms in {}", poscar.num_atoms(), poscar_path.display());

    let series = read_trajectory(fsx::open_text(trajectory_path)?, poscar.num_atoms(), max_steps)
        .with_context(|_| format!("reading {}", trajectory_path.display()))?;
    series.warn_if_short(&trajectory_path.display().to_string());
    info!("Read {} MD steps", series.len());

    let run = compute_thermo_forces(settings, &poscar, &series.steps)?;
    let report = run.report_indices(&settings.report)?;

    run.write_tfilog(fsx::create(outdir.join("TFILOG"))?)?;
    for &k in &report {
        let path = outdir.join(super::thfo_filename(&run.names[k]));
        dat::write_thfo(fsx::create(&path)?, &run.samples(k))?;
        info!("Wrote {}", path.display());
    }

    for (name, stats) in run.names.iter().zip(&run.stats) {
        match (stats.mean(), stats.std()) {
            (Some(mean), Some(std)) => info!("{}: <feg> = {:.8} (std {:.8}, {} steps)", name, mean, std, stats.count()),
            _ => warn!("{}: fewer than two MD steps, so no thermodynamic force", name),
        }
    }
    Ok(run)
}
