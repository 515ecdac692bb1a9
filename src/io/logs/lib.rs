/* ************************************************************************ **
** This file is part of thermint, and is licensed under EITHER the MIT      **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Readers and writers for the line-oriented files of a constrained MD run.
//!
//! * `fort.129`: per-step positions, velocities and forces ([`trajectory`])
//! * `REPORT`: VASP's blue-moon / metadynamics report ([`report`])
//! * `TFILOG`: the per-step thermodynamic-force log written by `thermint-calc` ([`tfilog`])
//! * `*.dat`: whitespace-delimited tables with `#` comments ([`dat`])
//! * `POSCAR` ([`poscar`])
//!
//! Marker strings are matched byte for byte, leading whitespace included,
//! because that is the only thing that distinguishes e.g. a `REPORT` block
//! header from a line inside it.

#[macro_use] extern crate failure;
#[macro_use] extern crate log;
#[cfg(test)] #[macro_use] extern crate thermint_assert_close;
#[cfg(test)] #[macro_use] extern crate pretty_assertions;

pub type FailResult<T> = Result<T, failure::Error>;

mod error;
mod scan;

pub mod dat;
pub mod poscar;
pub mod report;
pub mod tfilog;
pub mod trajectory;

pub use crate::error::{ParseError, parse_f64, parse_f64_or_missing};
pub use crate::trajectory::{TrajectoryStep, read_trajectory};

/// Why a reader stopped producing steps.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// As many steps as were requested have been read.
    Requested,
    /// The file ended cleanly between steps.
    EndOfFile,
    /// The file ended partway through a step, which was discarded.
    Truncated,
}

/// Complete steps read from a log, and why reading stopped.
///
/// Never holds more steps than were requested.
#[derive(Debug, Clone, PartialEq)]
pub struct StepSeries<T> {
    pub steps: Vec<T>,
    pub requested: Option<usize>,
    pub stop: StopReason,
}

impl<T> StepSeries<T> {
    pub fn len(&self) -> usize
    { self.steps.len() }

    pub fn is_empty(&self) -> bool
    { self.steps.is_empty() }

    /// Were fewer steps read than were requested?
    pub fn is_short(&self) -> bool
    { self.requested.map_or(false, |n| self.steps.len() < n) }

    /// Warn about truncation or a short file. Reading stops cleanly in both
    /// cases, so this is the only place the caller hears about it.
    pub fn warn_if_short(&self, what: &str) {
        if self.stop == StopReason::Truncated {
            warn!("{}: file ends in the middle of step {}; the partial step was discarded", what, self.steps.len() + 1);
        }
        if let Some(requested) = self.requested {
            if self.steps.len() < requested {
                warn!("{}: only {} of {} requested steps were read", what, self.steps.len(), requested);
            }
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> StepSeries<U> {
        let StepSeries { steps, requested, stop } = self;
        StepSeries { steps: steps.into_iter().map(f).collect(), requested, stop }
    }

    /// Bookkeeping shared by the readers: has the step limit been reached?
    pub(crate) fn is_full(&self) -> bool
    { self.requested.map_or(false, |n| self.steps.len() >= n) }

    pub(crate) fn new(requested: Option<usize>) -> Self
    { StepSeries { steps: vec![], requested, stop: StopReason::EndOfFile } }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shortness() {
        let mut series = StepSeries::<u32>::new(Some(3));
        series.steps = vec![1, 2];
        assert!(series.is_short());
        assert!(!series.is_full());
        series.steps.push(3);
        assert!(!series.is_short());
        assert!(series.is_full());

        let unbounded = StepSeries { steps: vec![1], requested: None, stop: StopReason::EndOfFile };
        assert!(!unbounded.is_short());
        assert_eq!(unbounded.map(|x| x * 2).steps, vec![2]);
    }
}
