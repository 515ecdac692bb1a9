/* ************************************************************************ **
** This file is part of thermint, and is licensed under EITHER the MIT      **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! `thermint-tfilog`: split a `TFILOG` into one table per coordinate.

use std::path::{Path, PathBuf};

use failure::ResultExt;
use thermint_fs_util as fsx;
use thermint_log_io::dat::{self, DatSample};
use thermint_log_io::tfilog::{TfiStep, read_tfilog};

use crate::FailResult;

/// The `(step, value, gradient)` series of the `k`th coordinate.
pub fn samples(steps: &[TfiStep], k: usize) -> Vec<DatSample> {
    steps.iter()
        .map(|s| DatSample { step: s.step, coord: s.coords[k], gradient: s.gradients[k] })
        .collect()
}

/// Writes `THFO-<k>.dat` (`k` counting from 1) into `outdir` for every
/// coordinate, and returns the paths written.
pub fn run_tfilog(
    input: &Path,
    ncons: Option<usize>,
    max_steps: Option<usize>,
    outdir: &Path,
) -> FailResult<Vec<PathBuf>> {
    let series = read_tfilog(fsx::open_text(input)?, ncons, max_steps)
        .with_context(|_| format!("reading {}", input.display()))?;
    series.warn_if_short(&input.display().to_string());

    let ncons = match series.steps.first() {
        Some(step) => step.coords.len(),
        None => {
            warn!("{} holds no complete MD step", input.display());
            ncons.unwrap_or(0)
        },
    };
    info!("Read {} MD steps of {} coordinates", series.len(), ncons);

    let mut written = vec![];
    for k in 0..ncons {
        let path = outdir.join(super::thfo_filename(&(k + 1).to_string()));
        let rows = samples(&series.steps, k);
        let missing = rows.iter().filter(|r| r.gradient.is_none()).count();
        if missing > 0 {
            debug!("{}: {} steps without a gradient", path.display(), missing);
        }
        dat::write_thfo(fsx::create(&path)?, &rows)?;
        info!("Wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}
