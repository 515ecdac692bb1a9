/* ************************************************************************ **
** This file is part of thermint, and is licensed under EITHER the MIT      **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! `thermint-report`: tables from a VASP `REPORT`, or from every window of an
//! umbrella-sampling METADATA file.

use std::path::{Path, PathBuf};

use ansi_term::Colour::Green;
use failure::ResultExt;
use itertools::{Itertools, MinMaxResult};
use rayon::prelude::*;
use thermint_fs_util as fsx;
use thermint_log_io::dat;
use thermint_log_io::report::{self, BlueMoonStep, Report, ReportSteps, UmbrellaStep};

use crate::FailResult;
use crate::stats::{convergence_table, reblock};
use crate::ui::color::paint;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReportOptions {
    pub max_steps: Option<usize>,
    /// Number of coordinates the REPORT must have.
    pub ncons: Option<usize>,
    /// Equilibration steps left out of statistics and `US-drop.dat`.
    pub drop: usize,
    /// Write a convergence table every this many steps.
    pub stat_interval: Option<usize>,
}

/// `(min, max)` of each coordinate.
pub type Ranges = Vec<(f64, f64)>;

pub fn read_report_file(path: &Path, options: &ReportOptions) -> FailResult<Report> {
    let report = report::read_report(fsx::open_text(path)?, options.ncons, options.max_steps)
        .with_context(|_| format!("reading {}", path.display()))?;
    report.warn_if_short(&path.display().to_string());
    info!(
        "{}: MDALGO {} ({:?}), {} coordinates, {} steps",
        path.display(), report.intro.mdalgo, report.intro.sampling, report.ncons, report.num_steps(),
    );
    Ok(report)
}

/// Writes `BM-<k>.dat` (and `BM-STAT-<k>.dat`) or `US.dat` (and
/// `US-drop.dat`) into `outdir`.
pub fn run_report(input: &Path, options: &ReportOptions, outdir: &Path) -> FailResult<Report> {
    let report = read_report_file(input, options)?;
    match report.steps {
        ReportSteps::BlueMoon(ref series) => {
            write_blue_moon(&series.steps, report.ncons, options, outdir)?;
        },
        ReportSteps::Umbrella(ref series) => {
            write_umbrella(&series.steps, report.ncons, options.drop, &outdir.join("US.dat"))?;
        },
    }
    Ok(report)
}

fn write_blue_moon(steps: &[BlueMoonStep], ncons: usize, options: &ReportOptions, outdir: &Path) -> FailResult<()> {
    if options.drop >= steps.len() && !steps.is_empty() {
        warn!("Dropping {} steps leaves nothing of {}", options.drop, steps.len());
    }

    for k in 0..ncons {
        let label = k + 1;
        let path = outdir.join(format!("BM-{}.dat", label));
        dat::write_blue_moon(fsx::create(&path)?, steps, k)?;
        info!("Wrote {}", path.display());

        let rows: Vec<_> = steps.iter().map(|s| s.rows[k]).collect();
        if let Some(interval) = options.stat_interval {
            ensure!(interval > 0, "--stat-interval must be positive");
            let table = convergence_table(&rows, options.drop, interval);
            if let Some(average) = table.last().and_then(|row| row.average) {
                info!("Constraint {}: <|Z|^-1/2 (lambda+GkT)> / <|Z|^-1/2> = {:.8}", label, average);
            }
            let path = outdir.join(format!("BM-STAT-{}.dat", label));
            dat::write_convergence(fsx::create(&path)?, &table)?;
            info!("Wrote {}", path.display());
        }

        let gradients: Vec<f64> = rows.iter().skip(options.drop).filter_map(|r| r.gradient()).collect();
        log_reblocking(label, &gradients);
    }
    Ok(())
}

fn log_reblocking(label: usize, data: &[f64]) {
    let result = reblock(data);
    for level in &result.levels {
        debug!(
            "Constraint {}: blocks of {:>6} ({:>6} blocks): mean {:.8} std err {:.8} +/- {:.8}",
            label, level.block_size, level.num_blocks, level.mean, level.std_err, level.std_err_err,
        );
    }
    match result.optimal_level() {
        Some(level) => info!(
            "Constraint {}: gradient {:.8} +/- {} (blocks of {})",
            label, level.mean, paint(Green.bold(), format!("{:.8}", level.std_err)), level.block_size,
        ),
        None if data.len() < 2 => warn!("Constraint {}: too few gradients for an error estimate", label),
        None => warn!("Constraint {}: no reblocking level is converged; the error estimate is unreliable", label),
    }
}

fn ranges(steps: &[UmbrellaStep], ncons: usize) -> Ranges {
    (0..ncons)
        .map(|k| match steps.iter().map(|s| s.coords[k]).minmax_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal)) {
            MinMaxResult::NoElements => (std::f64::NAN, std::f64::NAN),
            MinMaxResult::OneElement(x) => (x, x),
            MinMaxResult::MinMax(lo, hi) => (lo, hi),
        })
        .collect()
}

/// Write `path` and, with `drop > 0`, `<stem>-drop.<ext>` holding the steps
/// after the first `drop`. Both carry the ranges of the full run.
fn write_umbrella(steps: &[UmbrellaStep], ncons: usize, drop: usize, path: &Path) -> FailResult<Ranges> {
    let ranges = ranges(steps, ncons);
    dat::write_umbrella(fsx::create(path)?, steps, &ranges)?;
    info!("Wrote {}", path.display());

    if drop > 0 {
        let path = drop_path(path);
        let kept = &steps[drop.min(steps.len())..];
        dat::write_umbrella(fsx::create(&path)?, kept, &ranges)?;
        info!("Wrote {} ({} steps)", path.display(), kept.len());
    }
    Ok(ranges)
}

fn drop_path(path: &Path) -> PathBuf {
    let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}-drop.{}", stem, ext.to_string_lossy()),
        None => format!("{}-drop", stem),
    };
    path.with_file_name(name)
}

/// Process the REPORT beside every table listed in an umbrella-sampling
/// METADATA file, writing each table in place. Returns the range of each
/// coordinate over all windows.
pub fn run_metadata(metadata: &Path, options: &ReportOptions) -> FailResult<Ranges> {
    let tables = report::read_metadata(fsx::open_text(metadata)?)
        .with_context(|_| format!("reading {}", metadata.display()))?;
    ensure!(!tables.is_empty(), "{} lists no windows", metadata.display());
    info!("{} windows in {}", tables.len(), metadata.display());

    let results: Vec<FailResult<Ranges>> = tables.par_iter()
        .map(|table| {
            let dir = table.parent().unwrap_or_else(|| Path::new(""));
            let report = read_report_file(&dir.join("REPORT"), options)?;
            match report.steps {
                ReportSteps::Umbrella(ref series) => write_umbrella(&series.steps, report.ncons, options.drop, table),
                ReportSteps::BlueMoon(_) => bail!("{}: METADATA windows must be umbrella-sampling runs", dir.display()),
            }
        })
        .collect();

    let mut overall: Option<Ranges> = None;
    for (table, result) in tables.iter().zip(results) {
        let ranges = result.with_context(|_| format!("window {}", table.display()))?;
        overall = Some(match overall {
            None => ranges,
            Some(acc) => {
                ensure!(
                    acc.len() == ranges.len(),
                    "{} has {} coordinates, but earlier windows have {}", table.display(), ranges.len(), acc.len(),
                );
                acc.into_iter().zip(ranges)
                    .map(|((lo, hi), (a, b))| (lo.min(a), hi.max(b)))
                    .collect()
            },
        });
    }

    let overall = overall.unwrap_or_default();
    for (k, &(lo, hi)) in overall.iter().enumerate() {
        info!("Reaction coordinate {:>4} range {:.4} to {:.4}", k + 1, lo, hi);
    }
    Ok(overall)
}
