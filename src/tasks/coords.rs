/* ************************************************************************ **
** This file is part of thermint, and is licensed under EITHER the MIT      **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Reaction coordinates, their values and their Jacobian rows.
//!
//! Definitions form a DAG (a combination depends on the coordinates it sums),
//! which is validated and sorted once in [`RcSet::new`]. Every step is then a
//! single walk over that order in [`evaluate`].

use std::collections::HashMap;

use ndarray::{Array2, Axis};
use petgraph::prelude::*;
use thermint_structure::{Lattice, frac_displacement};
use thermint_tasks_config::{RcConfig, RcKind as RcConfigKind};

use crate::{FailResult, check_len};

#[derive(Debug, Clone, PartialEq)]
pub enum RcKind {
    /// Distance between atoms `i` and `j` (0-based).
    Distance { atoms: [usize; 2] },
    /// Weighted sum of other reaction coordinates.
    Combination { terms: Vec<(String, f64)> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RcDef {
    pub name: String,
    pub kind: RcKind,
}

impl<'a> From<&'a RcConfig> for RcDef {
    fn from(config: &'a RcConfig) -> RcDef {
        let kind = match config.kind {
            RcConfigKind::Distance { atoms } => RcKind::Distance { atoms },
            RcConfigKind::Combination { ref terms } => RcKind::Combination { terms: terms.clone() },
        };
        RcDef { name: config.name.clone(), kind }
    }
}

#[derive(Debug, Fail, PartialEq)]
pub enum RcGraphError {
    #[fail(display = "reaction coordinate {:?} is defined more than once", _0)]
    Duplicate(String),
    #[fail(display = "{:?} refers to an unknown reaction coordinate {:?}", rc, target)]
    UnknownReference { rc: String, target: String },
    #[fail(display = "{:?} refers to itself", _0)]
    SelfReference(String),
    #[fail(display = "reaction coordinate {:?} is part of a dependency cycle", _0)]
    Cycle(String),
    #[fail(display = "{:?} is an empty combination", _0)]
    EmptyCombination(String),
    #[fail(display = "{:?} is a distance between atom {} and itself", rc, atom)]
    CoincidentAtoms { rc: String, atom: usize },
    #[fail(display = "{:?} uses atom {}, but there are only {} atoms", rc, atom, natoms)]
    AtomOutOfRange { rc: String, atom: usize, natoms: usize },
}

/// Two atoms of a distance coordinate sit on top of each other, so the
/// coordinate has no direction.
#[derive(Debug, Fail)]
#[fail(display = "{:?}: atoms {} and {} are at the same position", rc, i, j)]
pub struct DegenerateGeometryError {
    pub rc: String,
    pub i: usize,
    pub j: usize,
}

/// Validated reaction coordinate definitions for a structure with a fixed
/// number of atoms.
#[derive(Debug, Clone)]
pub struct RcSet {
    defs: Vec<RcDef>,
    natoms: usize,
    // combination terms by index, empty for distances
    terms: Vec<Vec<(usize, f64)>>,
    // dependencies before dependents
    order: Vec<usize>,
    constrained: Vec<usize>,
}

impl RcSet {
    pub fn new(defs: Vec<RcDef>, natoms: usize) -> Result<RcSet, RcGraphError> {
        let mut index_of = HashMap::new();
        for (i, def) in defs.iter().enumerate() {
            if index_of.insert(def.name.as_str(), i).is_some() {
                return Err(RcGraphError::Duplicate(def.name.clone()));
            }
        }

        let mut graph = DiGraph::<usize, f64>::with_capacity(defs.len(), 0);
        let nodes: Vec<NodeIndex> = (0..defs.len()).map(|i| graph.add_node(i)).collect();

        let mut terms = vec![vec![]; defs.len()];
        for (i, def) in defs.iter().enumerate() {
            match def.kind {
                RcKind::Distance { atoms: [a, b] } => {
                    for &atom in &[a, b] {
                        if atom >= natoms {
                            return Err(RcGraphError::AtomOutOfRange { rc: def.name.clone(), atom, natoms });
                        }
                    }
                    if a == b {
                        return Err(RcGraphError::CoincidentAtoms { rc: def.name.clone(), atom: a });
                    }
                },
                RcKind::Combination { terms: ref named } => {
                    if named.is_empty() {
                        return Err(RcGraphError::EmptyCombination(def.name.clone()));
                    }
                    for &(ref target, coeff) in named {
                        let j = match index_of.get(target.as_str()) {
                            Some(&j) => j,
                            None => return Err(RcGraphError::UnknownReference {
                                rc: def.name.clone(),
                                target: target.clone(),
                            }),
                        };
                        if j == i {
                            return Err(RcGraphError::SelfReference(def.name.clone()));
                        }
                        graph.add_edge(nodes[j], nodes[i], coeff);
                        terms[i].push((j, coeff));
                    }
                },
            }
        }

        let order = match petgraph::algo::toposort(&graph, None) {
            Ok(sorted) => sorted.into_iter().map(|node| graph[node]).collect(),
            Err(cycle) => return Err(RcGraphError::Cycle(defs[graph[cycle.node_id()]].name.clone())),
        };

        // anything that feeds a combination is not itself constrained
        let constrained = (0..defs.len())
            .filter(|&i| graph.neighbors_directed(nodes[i], Outgoing).next().is_none())
            .collect();

        Ok(RcSet { defs, natoms, terms, order, constrained })
    }

    pub fn len(&self) -> usize
    { self.defs.len() }

    pub fn is_empty(&self) -> bool
    { self.defs.is_empty() }

    pub fn natoms(&self) -> usize
    { self.natoms }

    pub fn defs(&self) -> &[RcDef]
    { &self.defs }

    pub fn name(&self, index: usize) -> &str
    { &self.defs[index].name }

    pub fn index_of(&self, name: &str) -> Option<usize>
    { self.defs.iter().position(|def| def.name == name) }

    /// Indices of the coordinates that no combination consumes, in
    /// definition order. Only these enter the mass metric.
    pub fn constrained(&self) -> &[usize]
    { &self.constrained }

    /// Evaluation order; every coordinate comes after those it depends on.
    pub fn order(&self) -> &[usize]
    { &self.order }
}

/// Values and Jacobian rows of every coordinate of an [`RcSet`] at one step.
#[derive(Debug, Clone, PartialEq)]
pub struct RcEvaluation {
    pub values: Vec<f64>,
    /// `len x 3 natoms`, row-major by atom then cartesian axis.
    pub rows: Array2<f64>,
}

impl RcEvaluation {
    /// The Jacobian restricted to the constrained coordinates.
    pub fn constrained_rows(&self, rcs: &RcSet) -> Array2<f64>
    { self.rows.select(Axis(0), rcs.constrained()) }
}

/// Compute every coordinate's value and Jacobian row at fractional positions
/// `fracs` in `lattice`.
pub fn evaluate(rcs: &RcSet, lattice: &Lattice, fracs: &[[f64; 3]]) -> FailResult<RcEvaluation> {
    check_len("fractional positions", rcs.natoms, fracs.len())?;

    let mut values = vec![0.0; rcs.len()];
    let mut rows = Array2::<f64>::zeros((rcs.len(), 3 * rcs.natoms));
    for &rc in &rcs.order {
        match rcs.defs[rc].kind {
            RcKind::Distance { atoms: [i, j] } => {
                let d = frac_displacement(lattice, &fracs[i], &fracs[j]);
                let norm = (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt();
                if norm == 0.0 {
                    return Err(DegenerateGeometryError { rc: rcs.defs[rc].name.clone(), i, j }.into());
                }
                values[rc] = norm;
                for k in 0..3 {
                    rows[(rc, 3 * i + k)] = d[k] / norm;
                    rows[(rc, 3 * j + k)] = -d[k] / norm;
                }
            },
            RcKind::Combination { .. } => {
                let mut value = 0.0;
                let mut row = ndarray::Array1::<f64>::zeros(3 * rcs.natoms);
                for &(term, coeff) in &rcs.terms[rc] {
                    value += coeff * values[term];
                    row.scaled_add(coeff, &rows.row(term));
                }
                values[rc] = value;
                rows.row_mut(rc).assign(&row);
            },
        }
    }
    Ok(RcEvaluation { values, rows })
}
