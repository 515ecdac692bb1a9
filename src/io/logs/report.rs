/* ************************************************************************ **
** This file is part of thermint, and is licensed under EITHER the MIT      **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! VASP's `REPORT` file for constrained (blue moon) and umbrella-sampling
//! (metadynamics with fictitious particles) runs.
//!
//! The file is read in a single pass:
//!
//! * The intro (first [`INTRO_LINES`] lines) gives `MDALGO` and the DOF
//!   summary, whose second line is the number of constraints.
//! * Each MD step is everything up to and including a `RANDOM_SEED` line.
//!   Blue-moon steps need a `>Const_coord` block and a `>Blue_moon` block;
//!   umbrella steps need a `>Metadynamics` block.
//! * The number of coordinates is fixed by the first step (cross-checked
//!   against the intro for blue moon) and every later step must agree.

use std::io::BufRead;
use std::path::PathBuf;

use crate::{ParseError, StepSeries, StopReason};
use crate::error::{fields, parse_f64, parse_f64_or_missing};
use crate::scan::LineReader;

pub const MDALGO: &str = "                MDALGO";
pub const ATOMIC_DOF: &str = "   original number of atomic DOF";
pub const CONST_COORD: &str = "  >Const_coord";
pub const CONST_COORD_LINE: &str = "   cc>";
pub const BLUE_MOON: &str = "  >Blue_moon";
pub const METADYNAMICS: &str = "  >Metadynamics";
pub const FICTITIOUS_LINE: &str = "   fic_p>";
pub const RANDOM_SEED: &str = "           RANDOM_SEED";

/// The intro must be over within this many lines.
pub const INTRO_LINES: usize = 50;
/// No MD step is longer than this.
pub const MAX_STEP_LINES: usize = 200;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Sampling {
    /// `MDALGO` 2 or 26.
    BlueMoon,
    /// `MDALGO` 21 or 27 (printed as `**` when it overflows its field).
    Umbrella,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportIntro {
    pub mdalgo: u32,
    pub sampling: Sampling,
    pub dof_original: usize,
    pub ncons: usize,
    pub dof_active: usize,
}

/// One constraint's line of a `>Blue_moon` block, with its coordinate.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BlueMoonRow {
    pub coord: f64,
    pub lambda: Option<f64>,
    /// `|Z|^(-1/2)`
    pub zdet: Option<f64>,
    pub gkt: Option<f64>,
    /// `|Z|^(-1/2) (lambda + GkT)`
    pub zg: Option<f64>,
}

impl BlueMoonRow {
    /// The instantaneous free-energy gradient `zg / zdet`.
    pub fn gradient(&self) -> Option<f64> {
        match (self.zg, self.zdet) {
            (Some(zg), Some(zdet)) if zdet != 0.0 => Some(zg / zdet),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlueMoonStep {
    /// 1-based.
    pub step: usize,
    pub rows: Vec<BlueMoonRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UmbrellaStep {
    /// 1-based.
    pub step: usize,
    pub coords: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReportSteps {
    BlueMoon(StepSeries<BlueMoonStep>),
    Umbrella(StepSeries<UmbrellaStep>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub intro: ReportIntro,
    /// Number of coordinates per step.
    pub ncons: usize,
    pub steps: ReportSteps,
}

impl Report {
    pub fn num_steps(&self) -> usize {
        match self.steps {
            ReportSteps::BlueMoon(ref s) => s.len(),
            ReportSteps::Umbrella(ref s) => s.len(),
        }
    }

    pub fn warn_if_short(&self, what: &str) {
        match self.steps {
            ReportSteps::BlueMoon(ref s) => s.warn_if_short(what),
            ReportSteps::Umbrella(ref s) => s.warn_if_short(what),
        }
    }
}

/// Read a REPORT.
///
/// `expected_ncons`, when given, must match the file. At most `max_steps`
/// complete steps are read.
pub fn read_report(
    r: impl BufRead,
    expected_ncons: Option<usize>,
    max_steps: Option<usize>,
) -> Result<Report, ParseError> {
    let mut lines = LineReader::new(r);
    let intro = read_intro(&mut lines)?;
    debug!("REPORT intro: {:?}", intro);

    let mut ncons = match intro.sampling {
        Sampling::BlueMoon => {
            if let Some(expected) = expected_ncons {
                if expected != intro.ncons {
                    return Err(ParseError::Inconsistent {
                        line: lines.line_number(),
                        message: format!("REPORT declares {} constraints, but {} were expected", intro.ncons, expected),
                    });
                }
            }
            Some(intro.ncons)
        },
        // the intro only counts constraints with STATUS=0, not the
        // fictitious-particle coordinates
        Sampling::Umbrella => expected_ncons,
    };

    let steps = match intro.sampling {
        Sampling::BlueMoon => ReportSteps::BlueMoon({
            collect_steps(max_steps, |index| read_blue_moon_step(&mut lines, &mut ncons, index))?
        }),
        Sampling::Umbrella => ReportSteps::Umbrella({
            collect_steps(max_steps, |index| read_umbrella_step(&mut lines, &mut ncons, index))?
        }),
    };

    if intro.sampling == Sampling::Umbrella {
        if let Some(n) = ncons {
            if n != intro.ncons {
                debug!("REPORT: {} umbrella coordinates, intro declares {} constraints", n, intro.ncons);
            }
        }
    }

    let ncons = match ncons {
        Some(n) => n,
        None => return Err(ParseError::MissingMarker {
            marker: METADYNAMICS,
            context: "in any MD step".into(),
            line: lines.line_number(),
        }),
    };
    Ok(Report { intro, ncons, steps })
}

/// Paths listed in an umbrella-sampling METADATA file (first column;
/// `#` comments and blank lines skipped). Each names a `.dat` file whose
/// directory holds a REPORT.
pub fn read_metadata(r: impl BufRead) -> Result<Vec<PathBuf>, ParseError> {
    let mut lines = LineReader::new(r);
    let mut out = vec![];
    while let Some(line) = lines.next_line()? {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(first) = line.split_whitespace().next() {
            out.push(PathBuf::from(first));
        }
    }
    Ok(out)
}

//--------------------------------------------------------------------------------------

fn read_intro<R: BufRead>(lines: &mut LineReader<R>) -> Result<ReportIntro, ParseError> {
    let mut algo: Option<(u32, Sampling)> = None;

    for _ in 0..INTRO_LINES {
        let line = match lines.next_line()? {
            Some(line) => line,
            None => break,
        };

        if line.starts_with(MDALGO) {
            let n = lines.line_number();
            let words = fields(&line, 2, n, MDALGO)?;
            let tag = words[words.len() - 1];
            let mdalgo = match tag {
                "**" => 21,
                _ => tag.parse::<u32>().map_err(|_| ParseError::UnsupportedAlgorithm { line: n, tag: tag.to_string() })?,
            };
            let sampling = match mdalgo {
                2 | 26 => Sampling::BlueMoon,
                21 | 27 => Sampling::Umbrella,
                _ => return Err(ParseError::UnsupportedAlgorithm { line: n, tag: tag.to_string() }),
            };
            algo = Some((mdalgo, sampling));
        }

        if line.starts_with(ATOMIC_DOF) {
            let (mdalgo, sampling) = match algo {
                Some(x) => x,
                None => return Err(ParseError::MissingMarker {
                    marker: MDALGO,
                    context: "before the DOF summary".into(),
                    line: lines.line_number(),
                }),
            };
            let dof_original = last_count(&line, lines.line_number())?;
            let ncons = match lines.next_line()? {
                Some(line) => last_count(&line, lines.line_number())?,
                None => break,
            };
            let dof_active = match lines.next_line()? {
                Some(line) => last_count(&line, lines.line_number())?,
                None => break,
            };
            return Ok(ReportIntro { mdalgo, sampling, dof_original, ncons, dof_active });
        }
    }

    Err(ParseError::MissingMarker {
        marker: ATOMIC_DOF,
        context: format!("within the first {} lines", INTRO_LINES),
        line: lines.line_number(),
    })
}

fn last_count(text: &str, line: usize) -> Result<usize, ParseError> {
    let words = fields(text, 1, line, ATOMIC_DOF)?;
    let token = words[words.len() - 1];
    token.parse().map_err(|_| ParseError::BadNumber { line, marker: ATOMIC_DOF, token: token.to_string() })
}

enum StepOutcome<T> {
    Complete(T),
    EndOfFile,
    Truncated,
}

fn collect_steps<T>(
    max_steps: Option<usize>,
    mut read_step: impl FnMut(usize) -> Result<StepOutcome<T>, ParseError>,
) -> Result<StepSeries<T>, ParseError> {
    let mut series = StepSeries::new(max_steps);
    loop {
        if series.is_full() {
            series.stop = StopReason::Requested;
            return Ok(series);
        }
        match read_step(series.len() + 1)? {
            StepOutcome::Complete(step) => series.steps.push(step),
            StepOutcome::EndOfFile => {
                series.stop = StopReason::EndOfFile;
                return Ok(series);
            },
            StepOutcome::Truncated => {
                series.stop = StopReason::Truncated;
                return Ok(series);
            },
        }
    }
}

// The lines of a block that all start with `prefix`. The first line that
// doesn't is pushed back. `None` on EOF.
fn read_prefixed_block<R: BufRead>(
    lines: &mut LineReader<R>,
    prefix: &str,
) -> Result<Option<Vec<(usize, String)>>, ParseError> {
    let mut out = vec![];
    loop {
        match lines.next_line()? {
            None => return Ok(None),
            Some(line) => {
                if line.starts_with(prefix) {
                    out.push((lines.line_number(), line));
                } else {
                    lines.push_back(line);
                    return Ok(Some(out));
                }
            },
        }
    }
}

// The first block fixes the count; later ones must agree.
fn check_count(
    ncons: &mut Option<usize>,
    found: usize,
    marker: &'static str,
    line: usize,
    index: usize,
) -> Result<(), ParseError> {
    match *ncons {
        None if found == 0 => Err(ParseError::Inconsistent {
            line,
            message: format!("{:?} block of MD step {} is empty", marker, index),
        }),
        None => {
            *ncons = Some(found);
            Ok(())
        },
        Some(n) if n == found => Ok(()),
        Some(n) => Err(ParseError::Inconsistent {
            line,
            message: format!("{:?} block of MD step {} has {} lines, expected {}", marker, index, found, n),
        }),
    }
}

fn step_too_long(index: usize, line: usize) -> ParseError {
    ParseError::MissingMarker {
        marker: RANDOM_SEED,
        context: format!("within {} lines of the start of MD step {}", MAX_STEP_LINES, index),
        line,
    }
}

fn read_blue_moon_step<R: BufRead>(
    lines: &mut LineReader<R>,
    ncons: &mut Option<usize>,
    index: usize,
) -> Result<StepOutcome<BlueMoonStep>, ParseError> {
    let mut coords: Option<Vec<f64>> = None;
    let mut stats: Option<Vec<[Option<f64>; 4]>> = None;
    let mut saw_content = false;

    for _ in 0..MAX_STEP_LINES {
        let line = match lines.next_line()? {
            Some(line) => line,
            None => return Ok(match saw_content {
                true => StepOutcome::Truncated,
                false => StepOutcome::EndOfFile,
            }),
        };
        saw_content |= !line.trim().is_empty();

        if line.starts_with(CONST_COORD) {
            let marker_line = lines.line_number();
            let block = match read_prefixed_block(lines, CONST_COORD_LINE)? {
                Some(block) => block,
                None => return Ok(StepOutcome::Truncated),
            };
            check_count(ncons, block.len(), CONST_COORD, marker_line, index)?;

            let mut values = Vec::with_capacity(block.len());
            for (n, text) in &block {
                // cc>  tag  value  ...
                let words = fields(text, 3, *n, CONST_COORD)?;
                values.push(parse_f64(words[2], *n, CONST_COORD)?);
            }
            coords = Some(values);
        } else if line.starts_with(BLUE_MOON) {
            let count = match *ncons {
                Some(n) => n,
                None => return Err(ParseError::MissingMarker {
                    marker: CONST_COORD,
                    context: format!("before {:?} in MD step {}", BLUE_MOON, index),
                    line: lines.line_number(),
                }),
            };
            // column headings
            if lines.next_line()?.is_none() {
                return Ok(StepOutcome::Truncated);
            }
            let mut values = Vec::with_capacity(count);
            for _ in 0..count {
                let text = match lines.next_line()? {
                    Some(text) => text,
                    None => return Ok(StepOutcome::Truncated),
                };
                let n = lines.line_number();
                // b_m>  lambda  |z|^(-1/2)  GkT  |z|^(-1/2)*(lambda+GkT)
                let row = fields(&text, 5, n, BLUE_MOON).and_then(|words| Ok([
                    parse_f64_or_missing(words[1], n, BLUE_MOON)?,
                    parse_f64_or_missing(words[2], n, BLUE_MOON)?,
                    parse_f64_or_missing(words[3], n, BLUE_MOON)?,
                    parse_f64_or_missing(words[4], n, BLUE_MOON)?,
                ]));
                match lines.unless_cut(n, row)? {
                    Some(row) => values.push(row),
                    None => return Ok(StepOutcome::Truncated),
                }
            }
            stats = Some(values);
        } else if line.starts_with(RANDOM_SEED) {
            let n = lines.line_number();
            let missing = |marker| ParseError::MissingMarker {
                marker,
                context: format!("in MD step {}", index),
                line: n,
            };
            let coords = coords.ok_or_else(|| missing(CONST_COORD))?;
            let stats = stats.ok_or_else(|| missing(BLUE_MOON))?;

            let rows = coords.into_iter().zip(stats)
                .map(|(coord, [lambda, zdet, gkt, zg])| BlueMoonRow { coord, lambda, zdet, gkt, zg })
                .collect();
            trace!("REPORT: blue moon step {} ends at line {}", index, n);
            return Ok(StepOutcome::Complete(BlueMoonStep { step: index, rows }));
        }
    }
    Err(step_too_long(index, lines.line_number()))
}

fn read_umbrella_step<R: BufRead>(
    lines: &mut LineReader<R>,
    ncons: &mut Option<usize>,
    index: usize,
) -> Result<StepOutcome<UmbrellaStep>, ParseError> {
    let mut coords: Option<Vec<f64>> = None;
    let mut saw_content = false;

    for _ in 0..MAX_STEP_LINES {
        let line = match lines.next_line()? {
            Some(line) => line,
            None => return Ok(match saw_content {
                true => StepOutcome::Truncated,
                false => StepOutcome::EndOfFile,
            }),
        };
        saw_content |= !line.trim().is_empty();

        if line.starts_with(METADYNAMICS) {
            let marker_line = lines.line_number();
            let block = match read_prefixed_block(lines, FICTITIOUS_LINE)? {
                Some(block) => block,
                None => return Ok(StepOutcome::Truncated),
            };
            check_count(ncons, block.len(), METADYNAMICS, marker_line, index)?;

            let mut values = Vec::with_capacity(block.len());
            for (n, text) in &block {
                let words = fields(text, 2, *n, METADYNAMICS)?;
                values.push(parse_f64(words[words.len() - 1], *n, METADYNAMICS)?);
            }
            coords = Some(values);
        } else if line.starts_with(RANDOM_SEED) {
            let n = lines.line_number();
            let coords = coords.ok_or_else(|| ParseError::MissingMarker {
                marker: METADYNAMICS,
                context: format!("in MD step {}", index),
                line: n,
            })?;
            trace!("REPORT: umbrella step {} ends at line {}", index, n);
            return Ok(StepOutcome::Complete(UmbrellaStep { step: index, coords }));
        }
    }
    Err(step_too_long(index, lines.line_number()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTRO_BM: &str = "\
 vasp.5.4.4 REPORT
                MDALGO       2
               TEBEG     300.0
   original number of atomic DOF          18
   number of constraints                   2
   active number of atomic DOF            16
";

    fn bm_step(coords: [f64; 2], lambdas: [&str; 2]) -> String {
        format!("\
 ========================================
                MD step No.      1
 ========================================
  >Const_coord
   cc>  R   {:.5}   0.00000
   cc>  R   {:.5}   0.00000
  >Blue_moon
        lambda   |z|^(-1/2)   GkT   |z|^(-1/2)*(lambda-GkT)
  b_m>   {}   2.00000   0.10000   4.00000
  b_m>   {}   0.50000   0.10000   1.00000

           RANDOM_SEED:     688344966        0        0
",
            coords[0], coords[1], lambdas[0], lambdas[1],
        )
    }

    fn bm_report(n: usize) -> String {
        let mut out = INTRO_BM.to_string();
        for i in 0..n {
            out += &bm_step([1.5 + 0.1 * i as f64, 2.0], ["1.20000", "-0.30000"]);
        }
        out
    }

    #[test]
    fn intro() {
        let report = read_report(bm_report(1).as_bytes(), None, None).unwrap();
        assert_eq!(report.intro, ReportIntro {
            mdalgo: 2,
            sampling: Sampling::BlueMoon,
            dof_original: 18,
            ncons: 2,
            dof_active: 16,
        });
        assert_eq!(report.ncons, 2);
    }

    #[test]
    fn blue_moon_steps() {
        let report = read_report(bm_report(3).as_bytes(), None, Some(2)).unwrap();
        let series = match report.steps {
            ReportSteps::BlueMoon(s) => s,
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(series.len(), 2);
        assert_eq!(series.stop, StopReason::Requested);

        let row = series.steps[1].rows[0];
        assert_close!(row.coord, 1.6);
        assert_eq!(row.lambda, Some(1.2));
        assert_eq!(row.gkt, Some(0.1));
        assert_eq!(row.gradient(), Some(2.0));
        assert_eq!(series.steps[1].rows[1].gradient(), Some(2.0));
        assert_eq!(series.steps[1].step, 2);

        let report = read_report(bm_report(3).as_bytes(), Some(2), Some(10)).unwrap();
        assert_eq!(report.num_steps(), 3);
        match report.steps {
            ReportSteps::BlueMoon(ref s) => assert_eq!(s.stop, StopReason::EndOfFile),
            ref other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn overflow_fields_are_missing() {
        let mut text = INTRO_BM.to_string();
        text += &bm_step([1.5, 2.0], ["*********", "NaN"]);
        let report = read_report(text.as_bytes(), None, None).unwrap();
        match report.steps {
            ReportSteps::BlueMoon(s) => {
                assert_eq!(s.steps[0].rows[0].lambda, None);
                assert_eq!(s.steps[0].rows[1].lambda, None);
                // the gradient doesn't depend on lambda directly
                assert_eq!(s.steps[0].rows[0].gradient(), Some(2.0));
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn truncation() {
        let text = bm_report(3);
        let cut = text.rfind("  >Blue_moon").unwrap();
        let report = read_report(text[..cut].as_bytes(), None, Some(3)).unwrap();
        match report.steps {
            ReportSteps::BlueMoon(s) => {
                assert_eq!(s.len(), 2);
                assert_eq!(s.stop, StopReason::Truncated);
                assert!(s.is_short());
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn cut_mid_row() {
        let text = bm_report(3);
        let end = text.rfind("  b_m>   -0.30000").unwrap() + "  b_m>   -0.30000   0.5".len();
        let report = read_report(text[..end].as_bytes(), None, None).unwrap();
        match report.steps {
            ReportSteps::BlueMoon(s) => {
                assert_eq!(s.len(), 2);
                assert_eq!(s.stop, StopReason::Truncated);
            },
            other => panic!("unexpected {:?}", other),
        }

        // the same short row with more log after it
        let text = bm_report(3).replacen("   0.50000   0.10000   1.00000", "   0.5", 1);
        match read_report(text.as_bytes(), None, None) {
            Err(ParseError::FieldCount { expected: 5, found: 3, .. }) => {},
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn missing_blue_moon_block() {
        let text = bm_report(2).replacen("  >Blue_moon", "  >Blue_sun", 1);
        match read_report(text.as_bytes(), None, None) {
            Err(ParseError::MissingMarker { marker, .. }) => assert_eq!(marker, BLUE_MOON),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn missing_random_seed() {
        let mut text = INTRO_BM.to_string();
        text += &bm_step([1.5, 2.0], ["1.0", "1.0"]).replace("RANDOM_SEED", "RANDOM_SEEM");
        for _ in 0..MAX_STEP_LINES {
            text += " filler\n";
        }
        match read_report(text.as_bytes(), None, None) {
            Err(ParseError::MissingMarker { marker, .. }) => assert_eq!(marker, RANDOM_SEED),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn missing_intro() {
        let text = bm_report(1).replace("original number of atomic DOF", "original DOF");
        match read_report(text.as_bytes(), None, None) {
            Err(ParseError::MissingMarker { marker, .. }) => assert_eq!(marker, ATOMIC_DOF),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn unsupported_algorithm() {
        let text = bm_report(1).replace("MDALGO       2", "MDALGO       3");
        match read_report(text.as_bytes(), None, None) {
            Err(ParseError::UnsupportedAlgorithm { ref tag, line: 2 }) => assert_eq!(tag, "3"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn inconsistent_counts() {
        // a step with one cc> line too few
        let text = bm_report(2).replacen("   cc>  R   2.00000   0.00000\n", "", 1);
        match read_report(text.as_bytes(), None, None) {
            Err(ParseError::Inconsistent { .. }) => {},
            other => panic!("unexpected {:?}", other),
        }

        match read_report(bm_report(1).as_bytes(), Some(3), None) {
            Err(ParseError::Inconsistent { .. }) => {},
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn bad_field_count() {
        let text = bm_report(1).replacen("   cc>  R   1.50000   0.00000", "   cc>  R", 1);
        match read_report(text.as_bytes(), None, None) {
            Err(ParseError::FieldCount { marker, expected: 3, found: 2, .. }) => assert_eq!(marker, CONST_COORD),
            other => panic!("unexpected {:?}", other),
        }
    }

    const INTRO_US: &str = " vasp.5.4.4 REPORT
                MDALGO      **
   original number of atomic DOF          18
   number of constraints                   0
   active number of atomic DOF            18
";

    fn us_step(x: f64) -> String {
        format!("  >Metadynamics
   fic_p>  1   {:.5}
   fic_p>  2   {:.5}
           RANDOM_SEED:     1   0   0
", x, -x)
    }

    #[test]
    fn umbrella() {
        let mut text = INTRO_US.to_string();
        text += &us_step(1.0);
        text += &us_step(1.5);
        let report = read_report(text.as_bytes(), None, None).unwrap();
        assert_eq!(report.intro.sampling, Sampling::Umbrella);
        assert_eq!(report.intro.mdalgo, 21);
        assert_eq!(report.ncons, 2);
        match report.steps {
            ReportSteps::Umbrella(s) => {
                assert_eq!(s.steps, vec![
                    UmbrellaStep { step: 1, coords: vec![1.0, -1.0] },
                    UmbrellaStep { step: 2, coords: vec![1.5, -1.5] },
                ]);
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn metadata() {
        let text = "# window list\nus-1/US.dat 1.0 500\n\n  us-2/US.dat\n";
        let paths = read_metadata(text.as_bytes()).unwrap();
        assert_eq!(paths, vec![PathBuf::from("us-1/US.dat"), PathBuf::from("us-2/US.dat")]);
    }
}
