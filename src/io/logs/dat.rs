/* ************************************************************************ **
** This file is part of thermint, and is licensed under EITHER the MIT      **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Whitespace-delimited `.dat` tables with `#` comment lines.
//!
//! Missing values are written as `NaN` and read back as `None`.

use std::io::{BufRead, Write};

use crate::{FailResult, ParseError, StepSeries, StopReason};
use crate::error::{fields, parse_f64, parse_f64_or_missing};
use crate::report::{BlueMoonStep, UmbrellaStep};
use crate::scan::LineReader;

const DATA_ROW: &str = "data row";

/// One (step, coordinate, gradient) row, as in `THFO-<rc>.dat`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DatSample {
    pub step: usize,
    pub coord: f64,
    pub gradient: Option<f64>,
}

/// Which (0-based) columns of a table to read.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    /// `None` numbers the rows from 1.
    pub step: Option<usize>,
    pub coord: usize,
    pub gradient: usize,
}

impl Default for ColumnSpec {
    /// The layout of `THFO-<rc>.dat`: `STEP RC FEG`.
    fn default() -> Self
    { ColumnSpec { step: Some(0), coord: 1, gradient: 2 } }
}

/// Read at most `max_rows` rows.
pub fn read_samples(
    r: impl BufRead,
    cols: &ColumnSpec,
    max_rows: Option<usize>,
) -> Result<StepSeries<DatSample>, ParseError> {
    let min_fields = 1 + [Some(cols.coord), Some(cols.gradient), cols.step]
        .iter().filter_map(|&c| c).max().unwrap_or(0);

    let mut lines = LineReader::new(r);
    let mut series = StepSeries::new(max_rows);
    loop {
        if series.is_full() {
            series.stop = StopReason::Requested;
            return Ok(series);
        }
        let text = match lines.next_line()? {
            Some(text) => text,
            None => {
                series.stop = StopReason::EndOfFile;
                return Ok(series);
            },
        };
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let n = lines.line_number();
        let next_step = series.len() + 1;
        let sample = fields(trimmed, min_fields, n, DATA_ROW).and_then(|words| {
            let step = match cols.step {
                Some(c) => words[c].parse::<usize>()
                    .map_err(|_| ParseError::BadNumber { line: n, marker: DATA_ROW, token: words[c].to_string() })?,
                None => next_step,
            };
            let coord = parse_f64(words[cols.coord], n, DATA_ROW)?;
            let gradient = parse_f64_or_missing(words[cols.gradient], n, DATA_ROW)?;
            Ok(DatSample { step, coord, gradient })
        });
        match lines.unless_cut(n, sample)? {
            Some(sample) => series.steps.push(sample),
            None => {
                series.stop = StopReason::Truncated;
                return Ok(series);
            },
        }
    }
}

fn num(x: Option<f64>, width: usize, prec: usize) -> String {
    match x {
        Some(x) => format!("{:>w$.p$}", x, w = width, p = prec),
        None => format!("{:>w$}", "NaN", w = width),
    }
}

/// `THFO-<rc>.dat`: `# STEP RC FEG`.
pub fn write_thfo(mut w: impl Write, rows: &[DatSample]) -> FailResult<()> {
    writeln!(w, "# STEP RC FEG")?;
    for row in rows {
        writeln!(w, "{:<8}{}{}", row.step, num(Some(row.coord), 16, 8), num(row.gradient, 16, 8))?;
    }
    Ok(())
}

/// One bin of an integrated profile.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ProfileRow {
    pub coord: f64,
    pub gradient: f64,
    pub std: f64,
    pub count: usize,
    pub energy: f64,
}

/// `THFOI.dat`: the binned gradient and its integral.
pub fn write_profile(
    mut w: impl Write,
    rows: &[ProfileRow],
    extremum: Option<(f64, f64)>,
    missing: usize,
) -> FailResult<()> {
    if let Some((coord, energy)) = extremum {
        writeln!(w, "# extremum: coord {:.8} energy {:.8}", coord, energy)?;
    }
    if missing > 0 {
        writeln!(w, "# {} samples without a gradient were skipped", missing)?;
    }
    writeln!(w, "# coord gradient std count energy")?;
    for row in rows {
        writeln!(
            w, "{}{}{}{:>8}{}",
            num(Some(row.coord), 16, 8), num(Some(row.gradient), 16, 8),
            num(Some(row.std), 16, 8), row.count, num(Some(row.energy), 16, 8),
        )?;
    }
    Ok(())
}

/// `TI.dat`: unbinned cumulative integration.
pub fn write_series(mut w: impl Write, rows: &[(f64, f64, f64)]) -> FailResult<()> {
    writeln!(w, "# coord gradient energy")?;
    for &(coord, gradient, energy) in rows {
        writeln!(w, "{}{}{}", num(Some(coord), 16, 8), num(Some(gradient), 16, 8), num(Some(energy), 16, 8))?;
    }
    Ok(())
}

/// `BM-<k>.dat`: the `k`th (0-based) constraint of every blue-moon step.
pub fn write_blue_moon(mut w: impl Write, steps: &[BlueMoonStep], k: usize) -> FailResult<()> {
    writeln!(w, "# STEP CV lamb |z|^(-1/2) GkT |z|^(-1/2)*(lamb+GkT) Gradient")?;
    for step in steps {
        let row = &step.rows[k];
        writeln!(
            w, "{:<8}{}{}{}{}{}{}",
            step.step, num(Some(row.coord), 16, 8), num(row.lambda, 16, 8),
            num(row.zdet, 16, 8), num(row.gkt, 16, 8), num(row.zg, 16, 8), num(row.gradient(), 16, 8),
        )?;
    }
    Ok(())
}

/// `US.dat`: every coordinate of every umbrella step, with per-coordinate
/// range comments. `ranges` is `(min, max)` per coordinate, over the full run.
pub fn write_umbrella(mut w: impl Write, steps: &[UmbrellaStep], ranges: &[(f64, f64)]) -> FailResult<()> {
    writeln!(w, "# step coord")?;
    for (k, &(min, max)) in ranges.iter().enumerate() {
        writeln!(w, "# {} min: {:12.8} max: {:12.8}", k + 1, min, max)?;
    }
    for step in steps {
        write!(w, "{:<8}", step.step)?;
        for &x in &step.coords {
            write!(w, "{}", num(Some(x), 14, 8))?;
        }
        writeln!(w)?;
    }
    Ok(())
}

/// One row of `BM-STAT-<k>.dat`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ConvergenceRow {
    /// Number of steps (after the dropped prefix) averaged over.
    pub steps: usize,
    pub average: Option<f64>,
    pub std: Option<f64>,
}

/// `BM-STAT-<k>.dat`: running average of the gradient and spread of lambda.
pub fn write_convergence(mut w: impl Write, rows: &[ConvergenceRow]) -> FailResult<()> {
    writeln!(w, "# STEP AVG STD")?;
    for row in rows {
        writeln!(w, "{:<8}{}{}", row.steps, num(row.average, 16, 8), num(row.std, 16, 8))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::BlueMoonRow;

    #[test]
    fn thfo_reads_back() {
        let rows = vec![
            DatSample { step: 1, coord: 1.25, gradient: Some(0.0) },
            DatSample { step: 2, coord: 1.5, gradient: None },
            DatSample { step: 3, coord: -0.125, gradient: Some(-2.5) },
        ];
        let mut buf = vec![];
        write_thfo(&mut buf, &rows).unwrap();

        let text = String::from_utf8(buf.clone()).unwrap();
        assert_eq!(text.lines().next(), Some("# STEP RC FEG"));
        assert_eq!(text.lines().nth(2), Some("2           1.50000000             NaN"));

        let series = read_samples(&buf[..], &ColumnSpec::default(), None).unwrap();
        assert_eq!(series.steps, rows);
        assert_eq!(series.stop, StopReason::EndOfFile);

        let series = read_samples(&buf[..], &ColumnSpec::default(), Some(2)).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.stop, StopReason::Requested);
    }

    #[test]
    fn other_columns() {
        let text = "# coord x gradient\n\n0.05 9 1.0\n0.15 9 2.0\n";
        let cols = ColumnSpec { step: None, coord: 0, gradient: 2 };
        let series = read_samples(text.as_bytes(), &cols, None).unwrap();
        assert_eq!(series.steps[1], DatSample { step: 2, coord: 0.15, gradient: Some(2.0) });

        match read_samples("0.05 1.0\n".as_bytes(), &cols, None) {
            Err(ParseError::FieldCount { expected: 3, found: 2, line: 1, .. }) => {},
            other => panic!("unexpected {:?}", other),
        }

        // a table still being written ends partway through a row
        let series = read_samples("0.05 9 1.0\n0.15 9".as_bytes(), &cols, None).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series.stop, StopReason::Truncated);
    }

    #[test]
    fn blue_moon_table() {
        let steps = vec![BlueMoonStep {
            step: 4,
            rows: vec![BlueMoonRow { coord: 1.5, lambda: Some(1.0), zdet: Some(2.0), gkt: None, zg: Some(3.0) }],
        }];
        let mut buf = vec![];
        write_blue_moon(&mut buf, &steps, 0).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let row: Vec<_> = text.lines().nth(1).unwrap().split_whitespace().collect();
        assert_eq!(row, vec!["4", "1.50000000", "1.00000000", "2.00000000", "NaN", "3.00000000", "1.50000000"]);
    }

    #[test]
    fn umbrella_table() {
        let steps = vec![
            UmbrellaStep { step: 1, coords: vec![1.0, 2.0] },
            UmbrellaStep { step: 2, coords: vec![1.5, 2.5] },
        ];
        let mut buf = vec![];
        write_umbrella(&mut buf, &steps, &[(1.0, 1.5), (2.0, 2.5)]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[1], "# 1 min:   1.00000000 max:   1.50000000");
        assert_eq!(lines.len(), 5);
    }
}
