/* ************************************************************************ **
** This file is part of thermint, and is licensed under EITHER the MIT      **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! `fort.129`, the per-step dump of a blue-moon run.
//!
//! ```text
//! --------------------    MD STEP       1--------------------
//!  -> CURRENT POSITIONS, VELOCITIES AND FORCES
//!   0.1000  0.2000  0.3000   0.0010  0.0000 -0.0020      <- fractional position, velocity
//!   0.5000 -0.2500  1.0000                                <- force
//!   ...                                                   (natoms pairs)
//! ```

use std::io::BufRead;

use crate::{ParseError, StepSeries, StopReason};
use crate::error::{fields, parse_f64};
use crate::scan::LineReader;

pub const MD_STEP: &str = "--------------------    MD STEP";
pub const CURRENT_POSITIONS: &str = " -> CURRENT POSITIONS, ";

/// One MD step of a trajectory.
///
/// All three arrays have `natoms` rows.
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryStep {
    /// 1-based index, counted by `MD STEP` headers.
    pub step: usize,
    pub fracs: Vec<[f64; 3]>,
    pub velocities: Vec<[f64; 3]>,
    pub forces: Vec<[f64; 3]>,
}

impl TrajectoryStep {
    pub fn num_atoms(&self) -> usize
    { self.fracs.len() }
}

/// Read at most `max_steps` complete steps.
pub fn read_trajectory(
    r: impl BufRead,
    natoms: usize,
    max_steps: Option<usize>,
) -> Result<StepSeries<TrajectoryStep>, ParseError> {
    let mut lines = LineReader::new(r);
    let mut series = StepSeries::new(max_steps);

    let mut headers = 0;
    // a header was seen and its positions block has not been read yet
    let mut pending = false;
    loop {
        if series.is_full() {
            series.stop = StopReason::Requested;
            break;
        }

        let line = match lines.next_line()? {
            Some(line) => line,
            None => {
                series.stop = match pending {
                    true => StopReason::Truncated,
                    false => StopReason::EndOfFile,
                };
                break;
            },
        };

        if line.starts_with(MD_STEP) {
            headers += 1;
            pending = true;
        } else if line.starts_with(CURRENT_POSITIONS) {
            if headers == 0 {
                return Err(ParseError::MissingMarker {
                    marker: MD_STEP,
                    context: "before the first positions block".into(),
                    line: lines.line_number(),
                });
            }

            match read_atoms(&mut lines, natoms)? {
                Some((fracs, velocities, forces)) => {
                    trace!("fort.129: read step {} ending at line {}", headers, lines.line_number());
                    series.steps.push(TrajectoryStep { step: headers, fracs, velocities, forces });
                    pending = false;
                },
                None => {
                    series.stop = StopReason::Truncated;
                    break;
                },
            }
        }
    }

    if series.steps.is_empty() && series.stop != StopReason::Requested {
        let (marker, context) = match headers {
            0 => (MD_STEP, "anywhere in the file"),
            _ => (CURRENT_POSITIONS, "after any MD STEP header"),
        };
        return Err(ParseError::MissingMarker { marker, context: context.into(), line: lines.line_number() });
    }
    Ok(series)
}

type AtomArrays = (Vec<[f64; 3]>, Vec<[f64; 3]>, Vec<[f64; 3]>);

// None on EOF, or at a final line that was cut short
fn read_atoms<R: BufRead>(lines: &mut LineReader<R>, natoms: usize) -> Result<Option<AtomArrays>, ParseError> {
    let mut fracs = Vec::with_capacity(natoms);
    let mut velocities = Vec::with_capacity(natoms);
    let mut forces = Vec::with_capacity(natoms);

    let triple = |words: &[&str], line| -> Result<[f64; 3], ParseError> {
        Ok([
            parse_f64(words[0], line, CURRENT_POSITIONS)?,
            parse_f64(words[1], line, CURRENT_POSITIONS)?,
            parse_f64(words[2], line, CURRENT_POSITIONS)?,
        ])
    };

    for _ in 0..natoms {
        let text = match lines.next_line()? {
            Some(text) => text,
            None => return Ok(None),
        };
        let line = lines.line_number();
        let parsed = fields(&text, 6, line, CURRENT_POSITIONS)
            .and_then(|words| Ok((triple(&words[0..3], line)?, triple(&words[3..6], line)?)));
        match lines.unless_cut(line, parsed)? {
            Some((frac, velocity)) => {
                fracs.push(frac);
                velocities.push(velocity);
            },
            None => return Ok(None),
        }

        let text = match lines.next_line()? {
            Some(text) => text,
            None => return Ok(None),
        };
        let line = lines.line_number();
        let parsed = fields(&text, 3, line, CURRENT_POSITIONS)
            .and_then(|words| triple(&words[0..3], line));
        match lines.unless_cut(line, parsed)? {
            Some(force) => forces.push(force),
            None => return Ok(None),
        }
    }
    Ok(Some((fracs, velocities, forces)))
}
