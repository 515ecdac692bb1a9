/* ************************************************************************ **
** This file is part of thermint, and is licensed under EITHER the MIT      **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! What each binary does once its arguments are parsed.
//!
//! Every `run_*` function reads its inputs, writes its tables into an
//! existing output directory, and returns a summary for the caller to log.

pub mod calc;
pub mod integrate;
pub mod report;
pub mod tfilog;

pub use self::calc::{CalcRun, ThermoForceRecord, compute_thermo_forces, run_calc};
pub use self::integrate::{IntegrateOptions, run_integrate};
pub use self::report::{ReportOptions, run_metadata, run_report};
pub use self::tfilog::run_tfilog;

/// Written into every output directory.
pub const LOGFILE: &str = "thermint.log";

pub(crate) fn thfo_filename(label: &str) -> String
{ format!("THFO-{}.dat", label) }
