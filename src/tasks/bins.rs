/* ************************************************************************ **
** This file is part of thermint, and is licensed under EITHER the MIT      **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Averaging gradient samples over coordinate bins, and integrating the
//! averages into a free-energy profile.

use std::collections::BTreeMap;

use ordered_float::OrderedFloat;
use thermint_log_io::dat::{DatSample, ProfileRow};

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Gradient {
    Measured(f64),
    /// The log had no usable value (overflowed field or NaN).
    Missing,
}

impl From<Option<f64>> for Gradient {
    fn from(x: Option<f64>) -> Gradient {
        match x {
            Some(x) if x.is_finite() => Gradient::Measured(x),
            _ => Gradient::Missing,
        }
    }
}

/// A free-energy gradient observed at one step.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Sample {
    pub step: usize,
    pub coord: f64,
    pub gradient: Gradient,
}

impl From<DatSample> for Sample {
    fn from(s: DatSample) -> Sample
    { Sample { step: s.step, coord: s.coord, gradient: s.gradient.into() } }
}

#[derive(Debug, Fail, PartialEq)]
pub enum BinningError {
    #[fail(display = "bin width must be positive and finite, got {}", _0)]
    BadWidth(f64),
    #[fail(display = "coordinate at step {} is not finite", step)]
    NonFiniteCoord { step: usize },
    #[fail(display = "no samples with a gradient to integrate")]
    NoSamples,
    #[fail(display = "no bin centers lie inside ({}, {})", low, high)]
    EmptyRegion { low: f64, high: f64 },
}

/// Gradients whose coordinates lie in `[index * width, (index + 1) * width)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Bin {
    pub index: i64,
    pub width: f64,
    // sorted, so that statistics do not depend on input order
    values: Vec<f64>,
}

impl Bin {
    pub fn start(&self) -> f64
    { self.index as f64 * self.width }

    pub fn end(&self) -> f64
    { (self.index + 1) as f64 * self.width }

    pub fn center(&self) -> f64
    { (self.index as f64 + 0.5) * self.width }

    pub fn count(&self) -> usize
    { self.values.len() }

    pub fn mean(&self) -> f64
    { self.values.iter().sum::<f64>() / self.values.len() as f64 }

    /// Population standard deviation.
    pub fn std(&self) -> f64 {
        let mean = self.mean();
        let var = self.values.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / self.values.len() as f64;
        var.sqrt()
    }
}

/// The point of the profile marked as the barrier (or well).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Extremum {
    pub coord: f64,
    pub free_energy: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    /// Non-empty bins, in increasing coordinate order.
    pub bins: Vec<Bin>,
    /// Cumulative integral at each bin center, starting from zero.
    pub energies: Vec<f64>,
    pub extremum: Option<Extremum>,
    /// Samples skipped for lack of a gradient.
    pub missing: usize,
}

impl Profile {
    pub fn rows(&self) -> Vec<ProfileRow> {
        self.bins.iter().zip(&self.energies)
            .map(|(bin, &energy)| ProfileRow {
                coord: bin.center(),
                gradient: bin.mean(),
                std: bin.std(),
                count: bin.count(),
                energy,
            })
            .collect()
    }
}

/// Sort samples into bins of `width`. Empty bins are not returned.
///
/// Returns the bins and the number of samples without a gradient.
pub fn bin_samples(samples: &[Sample], width: f64) -> Result<(Vec<Bin>, usize), BinningError> {
    if !(width.is_finite() && width > 0.0) {
        return Err(BinningError::BadWidth(width));
    }

    let mut missing = 0;
    let mut by_index = BTreeMap::<i64, Vec<f64>>::new();
    for sample in samples {
        if !sample.coord.is_finite() {
            return Err(BinningError::NonFiniteCoord { step: sample.step });
        }
        match sample.gradient {
            Gradient::Missing => missing += 1,
            Gradient::Measured(x) => {
                let index = (sample.coord / width).floor() as i64;
                by_index.entry(index).or_insert_with(Vec::new).push(x);
            },
        }
    }

    let bins = by_index.into_iter()
        .map(|(index, mut values)| {
            values.sort_by_key(|&x| OrderedFloat(x));
            Bin { index, width, values }
        })
        .collect();
    Ok((bins, missing))
}

/// Cumulative trapezoid rule, starting at zero.
pub fn cumulative_trapezoid(xs: &[f64], ys: &[f64]) -> Vec<f64> {
    assert_eq!(xs.len(), ys.len());
    let mut out = Vec::with_capacity(xs.len());
    let mut acc = 0.0;
    for i in 0..xs.len() {
        if i > 0 {
            acc += 0.5 * (ys[i] + ys[i - 1]) * (xs[i] - xs[i - 1]);
        }
        out.push(acc);
    }
    out
}

/// +1 if the coordinate decreases over the run (the extremum is then a
/// maximum), -1 otherwise.
fn direction(samples: &[Sample]) -> f64 {
    let key = |s: &&Sample| (s.step, OrderedFloat(s.coord));
    match (samples.iter().min_by_key(key), samples.iter().max_by_key(key)) {
        (Some(first), Some(last)) if first.coord > last.coord => 1.0,
        _ => -1.0,
    }
}

/// Bin, average and integrate. `region` keeps only bins whose centers
/// satisfy `low < center < high`.
pub fn integrate_profile(
    samples: &[Sample],
    width: f64,
    region: Option<(f64, f64)>,
) -> Result<Profile, BinningError> {
    let (mut bins, missing) = bin_samples(samples, width)?;
    if bins.is_empty() {
        return Err(BinningError::NoSamples);
    }
    if let Some((low, high)) = region {
        bins.retain(|bin| low < bin.center() && bin.center() < high);
        if bins.is_empty() {
            return Err(BinningError::EmptyRegion { low, high });
        }
    }

    let centers: Vec<f64> = bins.iter().map(Bin::center).collect();
    let means: Vec<f64> = bins.iter().map(Bin::mean).collect();
    let energies = cumulative_trapezoid(&centers, &means);

    let sign = direction(samples);
    let mut mark = 0.0;
    let mut at = 0;
    for (i, &energy) in energies.iter().enumerate() {
        if sign * energy >= mark {
            mark = sign * energy;
            at = i;
        }
    }
    let extremum = Some(Extremum { coord: centers[at], free_energy: sign * mark });

    Ok(Profile { bins, energies, extremum, missing })
}

/// Integrate samples in step order without binning, for data that is already
/// one average per window. Samples without a gradient are skipped.
///
/// Returns `(coord, gradient, energy)` rows.
pub fn integrate_series(samples: &[Sample]) -> Vec<(f64, f64, f64)> {
    let mut measured: Vec<(usize, f64, f64)> = samples.iter()
        .filter_map(|s| match s.gradient {
            Gradient::Measured(g) => Some((s.step, s.coord, g)),
            Gradient::Missing => None,
        })
        .collect();
    measured.sort_by_key(|&(step, _, _)| step);

    let xs: Vec<f64> = measured.iter().map(|&(_, x, _)| x).collect();
    let ys: Vec<f64> = measured.iter().map(|&(_, _, y)| y).collect();
    let energies = cumulative_trapezoid(&xs, &ys);
    xs.into_iter().zip(ys).zip(energies).map(|((x, y), e)| (x, y, e)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn samples(coords: &[f64], grads: &[f64]) -> Vec<Sample> {
        coords.iter().zip(grads).enumerate()
            .map(|(i, (&coord, &g))| Sample { step: i + 1, coord, gradient: Gradient::Measured(g) })
            .collect()
    }

    #[test]
    fn three_bins() {
        let profile = integrate_profile(&samples(&[0.05, 0.15, 0.25], &[1.0, 2.0, 3.0]), 0.1, None).unwrap();
        let starts: Vec<f64> = profile.bins.iter().map(Bin::start).collect();
        let means: Vec<f64> = profile.bins.iter().map(Bin::mean).collect();
        assert_close!(abs=1e-12, starts, vec![0.0, 0.1, 0.2]);
        assert_eq!(means, vec![1.0, 2.0, 3.0]);
        assert_close!(abs=1e-12, profile.energies.clone(), vec![0.0, 0.15, 0.4]);

        // increasing coordinate: the minimum, which is the starting point
        let extremum = profile.extremum.unwrap();
        assert_close!(extremum.coord, 0.05);
        assert_eq!(extremum.free_energy, 0.0);
    }

    #[test]
    fn decreasing_coordinate_marks_maximum() {
        let profile = integrate_profile(&samples(&[0.25, 0.15, 0.05], &[-1.0, 1.0, 2.0]), 0.1, None).unwrap();
        // bins in coordinate order: 2.0, 1.0, -1.0
        assert_close!(abs=1e-12, profile.energies.clone(), vec![0.0, 0.15, 0.15]);
        let extremum = profile.extremum.unwrap();
        assert_close!(extremum.coord, 0.25);
        assert_close!(extremum.free_energy, 0.15);
    }

    #[test]
    fn half_open_and_empty_bins() {
        // 0.1 lies in [0.1, 0.2); nothing lies in [0.2, 0.3)
        let (bins, missing) = bin_samples(&samples(&[0.0, 0.1, 0.35, -0.05], &[1.0, 2.0, 3.0, 4.0]), 0.1).unwrap();
        assert_eq!(missing, 0);
        let indices: Vec<i64> = bins.iter().map(|b| b.index).collect();
        assert_eq!(indices, vec![-1, 0, 1, 3]);
        assert_eq!(bins[2].count(), 1);
        assert_eq!(bins[2].mean(), 2.0);
    }

    #[test]
    fn missing_gradients_are_counted() {
        let mut s = samples(&[0.05, 0.06, 0.15], &[1.0, 3.0, 2.0]);
        s[1].gradient = Gradient::Missing;
        let profile = integrate_profile(&s, 0.1, None).unwrap();
        assert_eq!(profile.missing, 1);
        assert_eq!(profile.bins[0].count(), 1);
        assert_eq!(profile.bins[0].std(), 0.0);

        s[0].gradient = Gradient::Missing;
        s[2].gradient = Gradient::Missing;
        assert_eq!(integrate_profile(&s, 0.1, None).unwrap_err(), BinningError::NoSamples);
    }

    #[test]
    fn region() {
        let s = samples(&[0.05, 0.15, 0.25, 0.35], &[1.0, 2.0, 3.0, 4.0]);
        let profile = integrate_profile(&s, 0.1, Some((0.1, 0.3))).unwrap();
        assert_eq!(profile.bins.len(), 2);
        assert_close!(abs=1e-12, profile.energies.clone(), vec![0.0, 0.25]);

        // centers exactly on the edges are excluded
        let profile = integrate_profile(&s, 0.1, Some((0.05, 0.35))).unwrap();
        assert_eq!(profile.bins.len(), 2);

        match integrate_profile(&s, 0.1, Some((0.5, 1.0))) {
            Err(BinningError::EmptyRegion { .. }) => {},
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(integrate_profile(&s, 0.0, None).unwrap_err(), BinningError::BadWidth(0.0));
    }

    #[test]
    fn permutation_invariant() {
        let mut rng = rand::weak_rng();
        let mut s: Vec<Sample> = (0..500)
            .map(|i| Sample {
                step: i,
                coord: 2.0 - i as f64 * 0.004 + rng.gen_range(-0.05, 0.05),
                gradient: Gradient::Measured(rng.gen_range(-1.0, 1.0)),
            })
            .collect();
        let expected = integrate_profile(&s, 0.1, None).unwrap();
        for _ in 0..5 {
            rng.shuffle(&mut s);
            assert_eq!(integrate_profile(&s, 0.1, None).unwrap(), expected);
        }
    }

    #[test]
    fn polynomial_convergence() {
        // gradient 3x^2 integrates to x^3
        let error = |width: f64| {
            let coords: Vec<f64> = (0..2000).map(|i| i as f64 * 0.001 + 0.0005).collect();
            let grads: Vec<f64> = coords.iter().map(|x| 3.0 * x * x).collect();
            let profile = integrate_profile(&samples(&coords, &grads), width, None).unwrap();
            let x0 = profile.bins[0].center();
            let xn = profile.bins.last().unwrap().center();
            let exact = xn.powi(3) - x0.powi(3);
            (profile.energies.last().unwrap() - exact).abs()
        };
        let coarse = error(0.2);
        let fine = error(0.1);
        assert!(fine < coarse, "{} {}", fine, coarse);
        assert!(fine < 0.05, "{}", fine);
    }

    #[test]
    fn series() {
        let mut s = samples(&[0.0, 1.0, 2.0], &[0.0, 2.0, 4.0]);
        s.swap(0, 2);
        assert_eq!(integrate_series(&s), vec![(0.0, 0.0, 0.0), (1.0, 2.0, 1.0), (2.0, 4.0, 4.0)]);
    }
}
