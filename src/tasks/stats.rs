/* ************************************************************************ **
** This file is part of thermint, and is licensed under EITHER the MIT      **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Running averages, the blue-moon convergence table, and reblocking.

use thermint_log_io::dat::ConvergenceRow;
use thermint_log_io::report::BlueMoonRow;

/// Mean and population variance, updated one value at a time (Welford).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RunningStats {
    count: usize,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    pub fn new() -> Self
    { Default::default() }

    pub fn push(&mut self, x: f64) {
        self.count += 1;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (x - self.mean);
    }

    pub fn count(&self) -> usize
    { self.count }

    pub fn mean(&self) -> Option<f64>
    { if self.count == 0 { None } else { Some(self.mean) } }

    pub fn variance(&self) -> Option<f64>
    { if self.count == 0 { None } else { Some(self.m2 / self.count as f64) } }

    pub fn std(&self) -> Option<f64>
    { self.variance().map(f64::sqrt) }
}

impl std::iter::FromIterator<f64> for RunningStats {
    fn from_iter<I: IntoIterator<Item=f64>>(iter: I) -> Self {
        let mut stats = RunningStats::new();
        iter.into_iter().for_each(|x| stats.push(x));
        stats
    }
}

/// Running `<|Z|^-1/2 (lambda + GkT)> / <|Z|^-1/2>` and the spread of lambda,
/// every `interval` steps after dropping the first `ndrop`.
///
/// Missing values are left out of the averages they belong to. The last row
/// always covers every remaining step.
pub fn convergence_table(rows: &[BlueMoonRow], ndrop: usize, interval: usize) -> Vec<ConvergenceRow> {
    assert!(interval > 0, "convergence_table: zero interval");
    let rows = &rows[ndrop.min(rows.len())..];

    let mut zg = RunningStats::new();
    let mut zdet = RunningStats::new();
    let mut lambda = RunningStats::new();
    let mut out = vec![];
    for (i, row) in rows.iter().enumerate() {
        if let Some(x) = row.zg { zg.push(x); }
        if let Some(x) = row.zdet { zdet.push(x); }
        if let Some(x) = row.lambda { lambda.push(x); }

        let steps = i + 1;
        if steps % interval == 0 || steps == rows.len() {
            let average = match (zg.mean(), zdet.mean()) {
                (Some(zg), Some(zdet)) if zdet != 0.0 => Some(zg / zdet),
                _ => None,
            };
            out.push(ConvergenceRow { steps, average, std: lambda.std() });
        }
    }
    out
}

/// One level of a Flyvbjerg-Petersen blocking transformation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockingLevel {
    /// Number of original samples per block (`2^level`).
    pub block_size: usize,
    pub num_blocks: usize,
    pub mean: f64,
    /// Standard error of the mean, assuming the blocks are uncorrelated.
    pub std_err: f64,
    /// Uncertainty of `std_err` itself.
    pub std_err_err: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reblocking {
    pub levels: Vec<BlockingLevel>,
    /// Index into `levels` of the smallest block size satisfying
    /// `B^3 > 2 N (SE_B / SE_0)^4`.
    pub optimal: Option<usize>,
}

impl Reblocking {
    pub fn optimal_level(&self) -> Option<&BlockingLevel>
    { self.optimal.map(|i| &self.levels[i]) }
}

/// Repeatedly average neighboring pairs of samples (dropping an odd one out)
/// while at least two blocks remain.
pub fn reblock(data: &[f64]) -> Reblocking {
    let ndata = data.len();
    let mut levels = vec![];
    let mut blocks = data.to_vec();
    let mut block_size = 1;
    while blocks.len() >= 2 {
        let n = blocks.len() as f64;
        let mean = blocks.iter().sum::<f64>() / n;
        let var = blocks.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / (n - 1.0);
        let std_err = (var / n).sqrt();
        let std_err_err = std_err / (2.0 * (n - 1.0)).sqrt();
        levels.push(BlockingLevel { block_size, num_blocks: blocks.len(), mean, std_err, std_err_err });

        blocks = blocks.chunks(2)
            .filter(|pair| pair.len() == 2)
            .map(|pair| 0.5 * (pair[0] + pair[1]))
            .collect();
        block_size *= 2;
    }

    let optimal = match levels.first() {
        Some(first) if first.std_err > 0.0 => {
            let se0 = first.std_err;
            levels.iter().position(|level| {
                let b = level.block_size as f64;
                b.powi(3) > 2.0 * ndata as f64 * (level.std_err / se0).powi(4)
            })
        },
        _ => None,
    };
    Reblocking { levels, optimal }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_stats() {
        let stats: RunningStats = vec![1.0, 2.0, 3.0, 4.0].into_iter().collect();
        assert_eq!(stats.count(), 4);
        assert_close!(stats.mean().unwrap(), 2.5);
        assert_close!(stats.variance().unwrap(), 1.25);
        assert_eq!(RunningStats::new().mean(), None);
    }

    fn row(lambda: f64, zdet: f64, zg: f64) -> BlueMoonRow {
        BlueMoonRow { coord: 0.0, lambda: Some(lambda), zdet: Some(zdet), gkt: Some(0.0), zg: Some(zg) }
    }

    #[test]
    fn convergence() {
        let rows = vec![
            row(100.0, 100.0, 100.0), // dropped
            row(1.0, 1.0, 2.0),
            row(3.0, 1.0, 4.0),
            row(5.0, 2.0, 6.0),
        ];
        let table = convergence_table(&rows, 1, 2);
        assert_eq!(table.len(), 2);
        assert_eq!(table[0].steps, 2);
        assert_close!(table[0].average.unwrap(), 3.0);
        assert_close!(table[0].std.unwrap(), 1.0);
        assert_eq!(table[1].steps, 3);
        assert_close!(table[1].average.unwrap(), 3.0);

        let mut rows = rows;
        rows[1].zg = None;
        let table = convergence_table(&rows, 1, 1);
        assert_eq!(table[0].average, None);
    }

    #[test]
    fn reblocking_uncorrelated() {
        let data: Vec<f64> = (0..64).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let result = reblock(&data);
        assert_eq!(result.levels.len(), 6);
        assert_eq!(result.levels[0].num_blocks, 64);
        assert_eq!(result.levels[5].block_size, 32);
        assert_close!(abs=1e-12, result.levels[0].mean, 0.0);
        // after one level every block averages to zero
        assert_eq!(result.levels[1].std_err, 0.0);
        assert_eq!(result.optimal, Some(1));
    }

    #[test]
    fn reblocking_correlated() {
        // long runs of equal values: the error estimate grows with block size
        let data: Vec<f64> = (0..256).map(|i| if (i / 16) % 2 == 0 { 1.0 } else { 0.0 }).collect();
        let result = reblock(&data);
        assert!(result.levels[3].std_err > result.levels[0].std_err);
        let optimal = result.optimal_level().unwrap();
        assert!(optimal.block_size >= 16, "{:?}", optimal);
    }
}
