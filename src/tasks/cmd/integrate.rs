/* ************************************************************************ **
** This file is part of thermint, and is licensed under EITHER the MIT      **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! `thermint-integrate`: free-energy profile from a gradient table.

use std::path::Path;

use failure::ResultExt;
use thermint_fs_util as fsx;
use thermint_log_io::dat::{self, ColumnSpec};
use thermint_tasks_config::Integration;

use crate::FailResult;
use crate::bins::{self, Profile, Sample};

#[derive(Debug, Clone, PartialEq)]
pub struct IntegrateOptions {
    pub max_rows: Option<usize>,
    pub columns: ColumnSpec,
    pub integration: Integration,
    /// Integrate row by row instead of binning (`TI.dat`).
    pub unbinned: bool,
}

impl Default for IntegrateOptions {
    fn default() -> Self {
        IntegrateOptions {
            max_rows: None,
            columns: ColumnSpec::default(),
            integration: Integration::default(),
            unbinned: false,
        }
    }
}

pub fn read_samples(path: &Path, options: &IntegrateOptions) -> FailResult<Vec<Sample>> {
    let series = dat::read_samples(fsx::open_text(path)?, &options.columns, options.max_rows)
        .with_context(|_| format!("reading {}", path.display()))?;
    series.warn_if_short(&path.display().to_string());
    info!("Read {} samples from {}", series.len(), path.display());
    Ok(series.steps.into_iter().map(Sample::from).collect())
}

/// Writes `THFOI.dat`, or `TI.dat` when unbinned. The profile is returned
/// in the binned case.
pub fn run_integrate(input: &Path, options: &IntegrateOptions, outdir: &Path) -> FailResult<Option<Profile>> {
    options.integration.validate()?;
    let samples = read_samples(input, options)?;

    if options.unbinned {
        let rows = bins::integrate_series(&samples);
        let skipped = samples.len() - rows.len();
        if skipped > 0 {
            warn!("{} rows without a gradient were skipped", skipped);
        }
        let path = outdir.join("TI.dat");
        dat::write_series(fsx::create(&path)?, &rows)?;
        if let Some(&(coord, _, energy)) = rows.last() {
            info!("Free energy change {:.8} at coordinate {:.8}", energy, coord);
        }
        info!("Wrote {}", path.display());
        return Ok(None);
    }

    let Integration { bin_width, region } = options.integration.clone();
    let region = region.map(|[lo, hi]| (lo, hi));
    let profile = bins::integrate_profile(&samples, bin_width, region)?;
    if profile.missing > 0 {
        warn!("{} samples without a gradient were skipped", profile.missing);
    }
    info!("{} non-empty bins of width {}", profile.bins.len(), bin_width);

    let extremum = profile.extremum.map(|e| (e.coord, e.free_energy));
    if let Some((coord, energy)) = extremum {
        info!("Extremum: free energy {:.8} at coordinate {:.8}", energy, coord);
    }

    let path = outdir.join("THFOI.dat");
    dat::write_profile(fsx::create(&path)?, &profile.rows(), extremum, profile.missing)?;
    info!("Wrote {}", path.display());
    Ok(Some(profile))
}
