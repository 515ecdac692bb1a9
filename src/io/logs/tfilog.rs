/* ************************************************************************ **
** This file is part of thermint, and is licensed under EITHER the MIT      **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! `TFILOG`, the per-step log of reaction coordinates and instantaneous
//! thermodynamic forces.
//!
//! ```text
//! --------------------    MD STEP       2--------------------
//!
//! -> REACTIVE COORDINATES
//!
//!                   r1    1.2000000000000000
//!
//! -> FREE ENERGY GRADIENT (INSTANTANEOUS FORCE)
//!
//!           RC                   FEG                  FEG1                  FEG2
//!       RC   1  -2.0000000000000000   0.0000000000000000  -2.0000000000000000
//! ```
//!
//! Lines are compared after trimming leading whitespace.

use std::io::{BufRead, Write};

use crate::{FailResult, ParseError, StepSeries, StopReason};
use crate::error::{fields, parse_f64, parse_f64_or_missing};
use crate::scan::LineReader;

pub const MD_STEP: &str = "--------------------    MD STEP";
pub const REACTIVE: &str = "-> REACTIVE";
pub const FREE_ENERGY: &str = "-> FREE ENERGY";

#[derive(Debug, Clone, PartialEq)]
pub struct TfiStep {
    /// 1-based.
    pub step: usize,
    pub coords: Vec<f64>,
    pub gradients: Vec<Option<f64>>,
}

/// Read at most `max_steps` complete steps.
///
/// Without `ncons`, the number of coordinates is taken from the first
/// `-> REACTIVE` block (it ends at the first blank line).
pub fn read_tfilog(
    r: impl BufRead,
    ncons: Option<usize>,
    max_steps: Option<usize>,
) -> Result<StepSeries<TfiStep>, ParseError> {
    let mut lines = LineReader::new(r);
    let mut series = StepSeries::new(max_steps);
    let mut ncons = ncons;

    let mut headers = 0;
    let mut coords: Option<Vec<f64>> = None;
    // inside a step that isn't complete yet
    let mut pending = false;
    'steps: loop {
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
        let trimmed = line.trim();

        if trimmed.starts_with(MD_STEP) {
            headers += 1;
            coords = None;
            pending = true;
        } else if trimmed.starts_with(REACTIVE) {
            let marker_line = lines.line_number();
            // blank line
            if lines.next_line()?.is_none() {
                series.stop = StopReason::Truncated;
                break;
            }
            let block = match read_block(&mut lines, ncons)? {
                Some(block) => block,
                None => {
                    series.stop = StopReason::Truncated;
                    break;
                },
            };
            if ncons.is_none() {
                if block.is_empty() {
                    return Err(ParseError::Inconsistent {
                        line: marker_line,
                        message: "no reaction coordinates in the first REACTIVE block".into(),
                    });
                }
                ncons = Some(block.len());
            }

            let mut values = Vec::with_capacity(block.len());
            for (n, text) in &block {
                let value = fields(text, 2, *n, REACTIVE)
                    .and_then(|words| parse_f64(words[1], *n, REACTIVE));
                match lines.unless_cut(*n, value)? {
                    Some(value) => values.push(value),
                    None => {
                        series.stop = StopReason::Truncated;
                        break 'steps;
                    },
                }
            }
            coords = Some(values);
            pending = true;
        } else if trimmed.starts_with(FREE_ENERGY) {
            let coords = match coords.take() {
                Some(coords) => coords,
                None => return Err(ParseError::MissingMarker {
                    marker: REACTIVE,
                    context: format!("before {:?} in MD step {}", FREE_ENERGY, headers),
                    line: lines.line_number(),
                }),
            };
            // blank line, column headings
            if lines.next_line()?.is_none() || lines.next_line()?.is_none() {
                series.stop = StopReason::Truncated;
                break;
            }
            let block = match read_block(&mut lines, Some(coords.len()))? {
                Some(block) => block,
                None => {
                    series.stop = StopReason::Truncated;
                    break;
                },
            };

            let mut gradients = Vec::with_capacity(block.len());
            for (n, text) in &block {
                let gradient = fields(text, 3, *n, FREE_ENERGY)
                    .and_then(|words| parse_f64_or_missing(words[2], *n, FREE_ENERGY));
                match lines.unless_cut(*n, gradient)? {
                    Some(gradient) => gradients.push(gradient),
                    None => {
                        series.stop = StopReason::Truncated;
                        break 'steps;
                    },
                }
            }
            let step = match headers {
                0 => series.len() + 1,
                n => n,
            };
            series.steps.push(TfiStep { step, coords, gradients });
            pending = false;
        }
    }

    if series.steps.is_empty() && series.stop == StopReason::EndOfFile {
        return Err(ParseError::MissingMarker {
            marker: REACTIVE,
            context: "anywhere in the file".into(),
            line: lines.line_number(),
        });
    }
    Ok(series)
}

// Exactly `count` lines, or everything up to a blank line if the count
// is not known yet. `None` on EOF.
fn read_block<R: BufRead>(
    lines: &mut LineReader<R>,
    count: Option<usize>,
) -> Result<Option<Vec<(usize, String)>>, ParseError> {
    let mut out = vec![];
    loop {
        if count == Some(out.len()) {
            return Ok(Some(out));
        }
        match lines.next_line()? {
            None => return Ok(None),
            Some(line) => {
                if count.is_none() && line.trim().is_empty() {
                    lines.push_back(line);
                    return Ok(Some(out));
                }
                out.push((lines.line_number(), line));
            },
        }
    }
}

/// One reaction coordinate's entry in a step written by [`write_step`].
#[derive(Debug, Clone, PartialEq)]
pub struct TfiEntry<'a> {
    /// A single whitespace-free token.
    pub name: &'a str,
    pub value: f64,
    pub feg: f64,
    pub feg1: f64,
    pub feg2: f64,
}

/// Append one step, in the layout [`read_tfilog`] reads.
pub fn write_step(mut w: impl Write, step: usize, entries: &[TfiEntry<'_>]) -> FailResult<()> {
    writeln!(w, "{}{:>8}--------------------", MD_STEP, step)?;
    writeln!(w)?;
    writeln!(w, "{} COORDINATES", REACTIVE)?;
    writeln!(w)?;
    for entry in entries {
        ensure!(
            !entry.name.is_empty() && !entry.name.contains(char::is_whitespace),
            "reaction coordinate name {:?} cannot be written to a TFILOG", entry.name,
        );
        writeln!(w, "{:>20}  {:>20.16}", entry.name, entry.value)?;
    }
    writeln!(w)?;
    writeln!(w, "{} GRADIENT (INSTANTANEOUS FORCE)", FREE_ENERGY)?;
    writeln!(w)?;
    writeln!(w, "{:>12}  {:>20}  {:>20}  {:>20}", "RC", "FEG", "FEG1", "FEG2")?;
    for (i, entry) in entries.iter().enumerate() {
        writeln!(
            w, "{:>8}{:>4}  {:>20.16}  {:>20.16}  {:>20.16}",
            "RC", i + 1, entry.feg, entry.feg1, entry.feg2,
        )?;
    }
    writeln!(w)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(x: f64, feg: f64) -> Vec<TfiEntry<'static>> {
        vec![
            TfiEntry { name: "r1", value: x, feg, feg1: 0.0, feg2: feg },
            TfiEntry { name: "r2", value: 2.0 * x, feg: -feg, feg1: 0.0, feg2: -feg },
        ]
    }

    fn log(n: usize) -> Vec<u8> {
        let mut buf = vec![];
        for i in 1..=n {
            write_step(&mut buf, i, &entries(i as f64, 0.5 * i as f64)).unwrap();
        }
        buf
    }

    #[test]
    fn writes_what_it_reads() {
        let series = read_tfilog(&log(3)[..], None, None).unwrap();
        assert_eq!(series.stop, StopReason::EndOfFile);
        assert_eq!(series.steps[2], TfiStep {
            step: 3,
            coords: vec![3.0, 6.0],
            gradients: vec![Some(1.5), Some(-1.5)],
        });

        let series = read_tfilog(&log(3)[..], Some(2), Some(2)).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.stop, StopReason::Requested);
    }

    #[test]
    fn nan_gradient_is_missing() {
        let mut buf = vec![];
        let mut e = entries(1.0, 1.0);
        e[1].feg = std::f64::NAN;
        write_step(&mut buf, 1, &e).unwrap();
        let series = read_tfilog(&buf[..], None, None).unwrap();
        assert_eq!(series.steps[0].gradients, vec![Some(1.0), None]);
    }

    #[test]
    fn truncated() {
        let text = String::from_utf8(log(2)).unwrap();
        let cut = text.rfind("-> FREE ENERGY").unwrap();
        let series = read_tfilog(text[..cut].as_bytes(), None, Some(2)).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series.stop, StopReason::Truncated);
        assert!(series.is_short());
    }

    #[test]
    fn cut_mid_row() {
        let text = String::from_utf8(log(2)).unwrap();
        // the last gradient row, with only its label left
        let end = text.rfind("RC   2").unwrap() + "RC   2".len();
        let series = read_tfilog(text[..end].as_bytes(), None, None).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series.stop, StopReason::Truncated);

        // a coordinate row, when the count is already known
        let end = text.rfind("r2").unwrap() + "r2".len();
        let series = read_tfilog(text[..end].as_bytes(), Some(2), None).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series.stop, StopReason::Truncated);

        // inside the file, a short row is still an error
        let row = format!("{:>20}  {:>20.16}", "r2", 2.0);
        let short = text.replacen(&row, &format!("{:>20}", "r2"), 1);
        match read_tfilog(short.as_bytes(), None, None) {
            Err(ParseError::FieldCount { .. }) => {},
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn missing_reactive_block() {
        let text = String::from_utf8(log(1)).unwrap().replace("-> REACTIVE", "-> REACTANT");
        match read_tfilog(text.as_bytes(), None, None) {
            Err(ParseError::MissingMarker { marker, .. }) => assert_eq!(marker, REACTIVE),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn bad_names_are_refused() {
        let e = vec![TfiEntry { name: "two words", value: 0.0, feg: 0.0, feg1: 0.0, feg2: 0.0 }];
        assert!(write_step(vec![], 1, &e).is_err());
    }
}
