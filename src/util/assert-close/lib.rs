/* ************************************************************************ **
** This file is part of thermint, and is licensed under EITHER the MIT      **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Approximate comparison of floats and float containers, for tests.
//!
//! Free-energy profiles and gradient estimates are sums of many products, so
//! exact equality is only meaningful in a few carefully constructed cases.
//! Everywhere else, tests compare through [`assert_close!`].

#[macro_use]
extern crate failure;

use std::fmt;

/// Relative tolerance used when none is given.
pub const DEFAULT_REL_TOL: f64 = 1e-9;

/// Panics unless two values are close.
///
/// ```
/// # #[macro_use] extern crate thermint_assert_close;
/// # fn main() {
/// assert_close!(1.0, 1.0 + 1e-12);
/// assert_close!(abs=1e-3, 0.0, 1e-4);
/// assert_close!(rel=1e-2, abs=0.0, vec![100.0, 200.0], vec![100.5, 199.0], "profile");
/// # }
/// ```
#[macro_export]
macro_rules! assert_close {
    ($($t:tt)*) => {
        $crate::assert_close_impl!{@opts [$($t)*] (rel=$crate::DEFAULT_REL_TOL) (abs=0.0)}
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! assert_close_impl {
    (@opts [rel=$tol:expr, $($rest:tt)*] (rel=$_old:expr) (abs=$abs:expr)) => {
        $crate::assert_close_impl!{@opts [$($rest)*] (rel=$tol) (abs=$abs)}
    };
    (@opts [abs=$tol:expr, $($rest:tt)*] (rel=$rel:expr) (abs=$_old:expr)) => {
        $crate::assert_close_impl!{@opts [$($rest)*] (rel=$rel) (abs=$tol)}
    };
    (@opts [$a:expr, $b:expr $(,)*] (rel=$rel:expr) (abs=$abs:expr)) => {
        $crate::assert_close_impl!{@check ($a, $b) (rel=$rel) (abs=$abs) ["values are not close"]}
    };
    (@opts [$a:expr, $b:expr, $($fmt:tt)+] (rel=$rel:expr) (abs=$abs:expr)) => {
        $crate::assert_close_impl!{@check ($a, $b) (rel=$rel) (abs=$abs) [$($fmt)+]}
    };
    (@check ($a:expr, $b:expr) (rel=$rel:expr) (abs=$abs:expr) [$($fmt:tt)+]) => {{
        let left = $a;
        let right = $b;
        let tol = $crate::Tolerances { rel: $rel, abs: $abs };
        if let Err(e) = $crate::CheckClose::check_close(&left, &right, tol) {
            panic!(
                "{} (rel={}, abs={})\n left: {:?}\nright: {:?}\n{}",
                format!($($fmt)+), tol.rel, tol.abs, left, right, e,
            );
        }
    }};
}

/// Python's `math.isclose`, with the addition that NaN equals NaN.
///
/// (missing gradient values are stored as NaN in some intermediate
///  tables, and tests need to be able to say "this one is missing")
pub fn is_close(a: f64, b: f64, Tolerances { rel, abs }: Tolerances) -> bool {
    assert!(rel >= 0.0 && abs >= 0.0, "negative tolerance");

    if a == b || (a.is_nan() && b.is_nan()) {
        return true;
    }
    if a.is_infinite() || b.is_infinite() {
        return false;
    }
    (a - b).abs() <= abs.max(rel * a.abs()).max(rel * b.abs())
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Tolerances {
    pub rel: f64,
    pub abs: f64,
}

/// The first pair of scalars that failed the comparison.
#[derive(Debug, Fail)]
pub struct CheckCloseError {
    /// Position of the failing element in a flattened traversal, if any.
    pub index: Option<usize>,
    pub values: (f64, f64),
}

impl fmt::Display for CheckCloseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (left, right) = self.values;
        match self.index {
            Some(i) => write!(f, "first mismatch at element {}: {:?} vs {:?}", i, left, right),
            None => write!(f, "mismatch: {:?} vs {:?}", left, right),
        }
    }
}

pub trait CheckClose<Rhs: ?Sized = Self> {
    fn check_close(&self, other: &Rhs, tol: Tolerances) -> Result<(), CheckCloseError>;
}

impl CheckClose for f64 {
    fn check_close(&self, other: &f64, tol: Tolerances) -> Result<(), CheckCloseError> {
        match is_close(*self, *other, tol) {
            true => Ok(()),
            false => Err(CheckCloseError { index: None, values: (*self, *other) }),
        }
    }
}

impl<'a, T: ?Sized + CheckClose> CheckClose for &'a T {
    fn check_close(&self, other: &&'a T, tol: Tolerances) -> Result<(), CheckCloseError> {
        (**self).check_close(*other, tol)
    }
}

/// `None` only matches `None`.
impl<T: CheckClose> CheckClose for Option<T> {
    fn check_close(&self, other: &Option<T>, tol: Tolerances) -> Result<(), CheckCloseError> {
        match (self, other) {
            (Some(a), Some(b)) => a.check_close(b, tol),
            (None, None) => Ok(()),
            // NaN stands in for the absent side in the error message
            _ => Err(CheckCloseError { index: None, values: (std::f64::NAN, std::f64::NAN) }),
        }
    }
}

impl<T: CheckClose> CheckClose for [T] {
    fn check_close(&self, other: &[T], tol: Tolerances) -> Result<(), CheckCloseError> {
        assert_eq!(self.len(), other.len(), "length mismatch in check_close");
        for (i, (a, b)) in self.iter().zip(other).enumerate() {
            a.check_close(b, tol).map_err(|e| CheckCloseError {
                index: Some(e.index.unwrap_or(i)),
                values: e.values,
            })?;
        }
        Ok(())
    }
}

impl<T: CheckClose> CheckClose for Vec<T> {
    fn check_close(&self, other: &Vec<T>, tol: Tolerances) -> Result<(), CheckCloseError> {
        self[..].check_close(&other[..], tol)
    }
}

impl<T: CheckClose> CheckClose<[T]> for Vec<T> {
    fn check_close(&self, other: &[T], tol: Tolerances) -> Result<(), CheckCloseError> {
        self[..].check_close(other, tol)
    }
}

impl<T: CheckClose> CheckClose for [T; 3] {
    fn check_close(&self, other: &[T; 3], tol: Tolerances) -> Result<(), CheckCloseError> {
        self[..].check_close(&other[..], tol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn macro_forms() {
        assert_close!(1.0, 1.0);
        assert_close!(abs=1e-8, 1.0, 1.0 + 1e-9);
        assert_close!(rel=1e-3, abs=0.0, 1000.0, 1000.5);
        assert_close!(abs=1e-8, 1.0, 1.0,);
        assert_close!(vec![1.0, 2.0], vec![1.0, 2.0], "{} and {}", "one", "two");
        assert_close!(vec![[1.0, 2.0, 3.0]], vec![[1.0, 2.0, 3.0]]);
        assert_close!(Some(1.0), Some(1.0));
    }

    #[test]
    fn nan_matches_nan() {
        assert_close!(std::f64::NAN, std::f64::NAN);
    }

    #[test]
    fn reports_first_mismatch() {
        let tol = Tolerances { rel: 0.0, abs: 1e-12 };
        let err = vec![0.0, 1.0, 2.0].check_close(&vec![0.0, 1.5, 3.0], tol).unwrap_err();
        assert_eq!(err.index, Some(1));
        assert_eq!(err.values, (1.0, 1.5));
    }

    #[test]
    #[should_panic]
    fn not_close() {
        assert_close!(abs=0.0, rel=0.0, 1.0, 1.1);
    }

    #[test]
    #[should_panic]
    fn missing_vs_present() {
        assert_close!(None, Some(1.0));
    }
}
