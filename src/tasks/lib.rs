/* ************************************************************************ **
** This file is part of thermint, and is licensed under EITHER the MIT      **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! The computational pipeline of thermint and the command line programs
//! built on it.
//!
//! ```text
//! log parser -> reaction coordinates / mass metric -> estimator
//!            -> bins + trapezoid -> .dat tables
//! ```

#[macro_use] extern crate failure;
#[macro_use] extern crate log;
#[macro_use] extern crate lazy_static;
#[macro_use] extern crate thermint_clap;
#[cfg(test)] #[macro_use] extern crate thermint_assert_close;
#[cfg(test)] #[macro_use] extern crate pretty_assertions;

pub type FailResult<T> = Result<T, failure::Error>;

pub mod coords;
pub mod metric;
pub mod estimator;
pub mod bins;
pub mod stats;

pub mod cmd;
pub mod entry_points;

mod ui;
mod util;

/// An array handed to a computation has the wrong length.
#[derive(Debug, Fail)]
#[fail(display = "{}: expected length {}, found {}", what, expected, found)]
pub struct ShapeError {
    pub what: &'static str,
    pub expected: usize,
    pub found: usize,
}

pub(crate) fn check_len(what: &'static str, expected: usize, found: usize) -> Result<(), ShapeError> {
    match expected == found {
        true => Ok(()),
        false => Err(ShapeError { what, expected, found }),
    }
}
