/* ************************************************************************ **
** This file is part of thermint, and is licensed under EITHER the MIT      **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

use std::collections::HashMap;
use std::fmt;
use std::str;

/// Represents a specific atomic number.
///
/// Only elements through radon are known; that covers everything that
/// shows up in the catalysis runs this tool post-processes.
#[derive(Copy, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
pub struct Element(u16);

#[derive(Debug, Fail)]
#[fail(display = "Unable to parse element symbol: {:?}", text)]
pub struct ElementParseError {
    text: String,
}

impl Element {
    pub fn from_atomic_number(n: u32) -> Option<Self> {
        match 1 <= n && n as usize <= TABLE.len() {
            true => Some(Element(n as u16)),
            false => None,
        }
    }

    pub fn from_symbol(s: &str) -> Result<Self, ElementParseError> {
        SYMBOL_TO_NUMBER.get(s)
            .map(|&n| Element(n))
            .ok_or_else(|| ElementParseError { text: s.to_string() })
    }

    pub fn atomic_number(&self) -> u32
    { self.0.into() }

    fn entry(&self) -> &'static (&'static str, f64)
    { &TABLE[self.0 as usize - 1] }

    pub fn symbol(&self) -> &'static str
    { self.entry().0 }

    /// Standard atomic weight, in amu.
    ///
    /// For elements without stable isotopes this is the mass number of the
    /// longest-lived one.
    pub fn standard_mass(&self) -> f64
    { self.entry().1 }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    { fmt::Display::fmt(self.symbol(), f) }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    { fmt::Debug::fmt(self.symbol(), f) }
}

impl str::FromStr for Element {
    type Err = ElementParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    { Element::from_symbol(s.trim()) }
}

lazy_static! {
    static ref SYMBOL_TO_NUMBER: HashMap<&'static str, u16> = {
        TABLE.iter().enumerate()
            .map(|(i, &(sym, _))| (sym, i as u16 + 1))
            .collect()
    };
}

// (symbol, standard atomic weight), indexed by atomic number - 1
static TABLE: &[(&str, f64)] = &[
    ("H", 1.008), ("He", 4.0026), ("Li", 6.94), ("Be", 9.0122),
    ("B", 10.81), ("C", 12.011), ("N", 14.007), ("O", 15.999),
    ("F", 18.998), ("Ne", 20.180), ("Na", 22.990), ("Mg", 24.305),
    ("Al", 26.982), ("Si", 28.085), ("P", 30.974), ("S", 32.06),
    ("Cl", 35.45), ("Ar", 39.948), ("K", 39.098), ("Ca", 40.078),
    ("Sc", 44.956), ("Ti", 47.867), ("V", 50.942), ("Cr", 51.996),
    ("Mn", 54.938), ("Fe", 55.845), ("Co", 58.933), ("Ni", 58.693),
    ("Cu", 63.546), ("Zn", 65.38), ("Ga", 69.723), ("Ge", 72.630),
    ("As", 74.922), ("Se", 78.971), ("Br", 79.904), ("Kr", 83.798),
    ("Rb", 85.468), ("Sr", 87.62), ("Y", 88.906), ("Zr", 91.224),
    ("Nb", 92.906), ("Mo", 95.95), ("Tc", 98.0), ("Ru", 101.07),
    ("Rh", 102.91), ("Pd", 106.42), ("Ag", 107.87), ("Cd", 112.41),
    ("In", 114.82), ("Sn", 118.71), ("Sb", 121.76), ("Te", 127.60),
    ("I", 126.90), ("Xe", 131.29), ("Cs", 132.91), ("Ba", 137.33),
    ("La", 138.91), ("Ce", 140.12), ("Pr", 140.91), ("Nd", 144.24),
    ("Pm", 145.0), ("Sm", 150.36), ("Eu", 151.96), ("Gd", 157.25),
    ("Tb", 158.93), ("Dy", 162.50), ("Ho", 164.93), ("Er", 167.26),
    ("Tm", 168.93), ("Yb", 173.05), ("Lu", 174.97), ("Hf", 178.49),
    ("Ta", 180.95), ("W", 183.84), ("Re", 186.21), ("Os", 190.23),
    ("Ir", 192.22), ("Pt", 195.08), ("Au", 196.97), ("Hg", 200.59),
    ("Tl", 204.38), ("Pb", 207.2), ("Bi", 208.98), ("Po", 209.0),
    ("At", 210.0), ("Rn", 222.0),
];

pub mod consts {
    use super::Element;

    pub const HYDROGEN: Element = Element(1);
    pub const CARBON: Element = Element(6);
    pub const OXYGEN: Element = Element(8);
    pub const SILVER: Element = Element(47);
    pub const PLATINUM: Element = Element(78);
}
