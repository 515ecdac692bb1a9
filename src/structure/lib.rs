/* ************************************************************************ **
** This file is part of thermint, and is licensed under EITHER the MIT      **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Periodic cells, fractional/cartesian coordinates and element data.

#[macro_use] extern crate failure;
#[macro_use] extern crate lazy_static;
#[cfg(test)] #[macro_use] extern crate thermint_assert_close;

#[derive(Debug, Fail)]
#[fail(display = "lattice matrix is singular: {:?}", matrix)]
pub struct SingularLatticeError {
    pub matrix: [[f64; 3]; 3],
}

mod cell;
mod element;

//---------------------------
// public reexports; API

pub use crate::cell::lattice::Lattice;
pub use crate::cell::coords::{CoordsKind, frac_displacement};

pub use crate::element::{Element, ElementParseError};
pub use crate::element::consts as consts;
