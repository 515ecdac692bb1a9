/* ************************************************************************ **
** This file is part of thermint, and is licensed under EITHER the MIT      **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

use std::io::BufRead;

use thermint_structure::{CoordsKind, Lattice};
use vasp_poscar as imp;

use crate::FailResult;

/// The parts of a POSCAR needed to interpret a trajectory.
#[derive(Debug, Clone, PartialEq)]
pub struct Poscar {
    pub comment: String,
    pub lattice: Lattice,
    pub fracs: Vec<[f64; 3]>,
    /// One symbol per atom.
    pub symbols: Vec<String>,
}

impl Poscar {
    pub fn num_atoms(&self) -> usize
    { self.fracs.len() }
}

/// Reads a POSCAR from an open file.
pub fn load_txt(f: impl BufRead) -> FailResult<Poscar> {
    let poscar = imp::Poscar::from_reader(f).map_err(|e| format_err!("{}", e))?;

    let comment = poscar.comment().to_string();
    let lattice = Lattice::new(&poscar.scaled_lattice_vectors())?;
    let coords = match poscar.scaled_positions() {
        imp::Coords::Cart(p) => CoordsKind::Carts(p.to_vec()),
        imp::Coords::Frac(p) => CoordsKind::Fracs(p.to_vec()),
    };
    let fracs = coords.into_fracs(&lattice);

    let group_symbols: Vec<String> = match poscar.group_symbols() {
        Some(iter) => iter.map(|s| s.to_string()).collect(),
        None => {
            // VASP 4 files only have symbols in the comment, if anywhere
            let symbols: Vec<String> = poscar.comment().split_whitespace().map(|s| s.to_string()).collect();
            ensure!(
                symbols.len() == poscar.group_counts().len(),
                "Symbols must be given either in the standard location or the POSCAR comment."
            );
            symbols
        },
    };

    let symbols: Vec<String> = poscar.group_counts()
        .zip(group_symbols)
        .flat_map(|(count, sym)| std::iter::repeat(sym).take(count))
        .collect();
    ensure!(
        symbols.len() == fracs.len(),
        "POSCAR lists {} symbols for {} atoms", symbols.len(), fracs.len(),
    );

    Ok(Poscar { comment, lattice, fracs, symbols })
}
