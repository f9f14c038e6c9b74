//! Geometric pruning of candidate jumps.
//!
//! During a jump, one atom of the initial dumbbell travels in a straight line to one end of the
//! final dumbbell. The predicates in this module report `true` when that path brings the moving
//! atom too close to another atom, in which case the jump is discarded.

use std::fmt;

use anyhow::{self, bail};
use itertools::{iproduct, Itertools};
use log;
use nalgebra::Vector3;
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::auxiliary::geometry::point_segment_distance;
use crate::crystal::Crystal;
use crate::representations::{moving_atom_path, DefectState, Jump};

#[cfg(test)]
#[path = "collision_tests.rs"]
mod collision_tests;

// ================
// Enum definitions
// ================

/// The smallest distance the moving atom may approach any other lattice site. In input files this
/// is written either as a bare number or as a list with one number per sublattice.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClosestDistance {
    /// One distance shared by every sublattice.
    Uniform(f64),

    /// One distance per sublattice, in the order of the crystal chemistries.
    PerSublattice(Vec<f64>),
}

impl ClosestDistance {
    /// Resolves the closest approach distance for every chemistry of a crystal.
    ///
    /// # Errors
    ///
    /// Errors if a per-sublattice list does not have one entry per chemistry, or if any distance
    /// is negative.
    pub fn resolve(&self, crys: &Crystal) -> Result<Vec<f64>, anyhow::Error> {
        let nchems = crys.chemistry().len();
        let dists = match self {
            Self::Uniform(d) => vec![*d; nchems],
            Self::PerSublattice(ds) => {
                if ds.len() != nchems {
                    bail!(
                        "{} closest distances were given for a crystal with {} chemistries.",
                        ds.len(),
                        nchems
                    );
                }
                ds.clone()
            }
        };
        if let Some(d) = dists.iter().find(|d| **d < 0.0 || !d.is_finite()) {
            bail!("Invalid closest distance `{d}`.");
        }
        Ok(dists)
    }
}

impl Default for ClosestDistance {
    fn default() -> Self {
        ClosestDistance::Uniform(0.0)
    }
}

impl fmt::Display for ClosestDistance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uniform(d) => write!(f, "{d:.4} (all sublattices)"),
            Self::PerSublattice(ds) => write!(
                f,
                "[{}]",
                ds.iter().map(|d| format!("{d:.4}")).join(", ")
            ),
        }
    }
}

// =========
// Functions
// =========

/// Checks whether the moving atom of a jump passes too close to the two atoms that stay behind.
///
/// Atom 2 is the partner left at the initial site, at $`\mathbf{x}_1 - c_1\mathbf{o}_1/2`$, and
/// atom 3 is the partner already sitting at the final site, at
/// $`\mathbf{x}_2 - c_2\mathbf{o}_2/2`$. Both are held fixed while the moving atom travels in a
/// straight line.
///
/// # Arguments
///
/// * `crys` - The crystal.
/// * `chem` - The sublattice of the jump.
/// * `jump` - The candidate jump.
/// * `cut12` - The minimum allowed separation between the moving atom and atom 2.
/// * `cut13` - The minimum allowed separation between the moving atom and atom 3.
///
/// # Returns
///
/// `true` if the jump collides and must be rejected.
pub fn collision_self<S: DefectState>(
    crys: &Crystal,
    chem: usize,
    jump: &Jump<S>,
    cut12: f64,
    cut13: f64,
) -> Result<bool, anyhow::Error> {
    let (start, end) = moving_atom_path(crys, chem, jump)?;
    let atom2 = start - jump.state1.dumbbell().o * f64::from(jump.c1);
    let atom3 = end - jump.state2.dumbbell().o * f64::from(jump.c2);
    let d12 = point_segment_distance(&atom2, &start, &end);
    let d13 = point_segment_distance(&atom3, &start, &end);
    Ok(d12 < cut12 || d13 < cut13)
}

/// Checks whether the moving atom of a jump passes too close to any lattice site other than the
/// jump's own initial and final sites.
///
/// # Arguments
///
/// * `crys` - The crystal.
/// * `chem` - The sublattice of the jump.
/// * `jump` - The candidate jump.
/// * `closest` - The closest approach distance for each sublattice.
///
/// # Returns
///
/// `true` if the jump collides and must be rejected.
///
/// # Errors
///
/// Errors if `closest` does not match the crystal chemistries.
pub fn collision_others<S: DefectState>(
    crys: &Crystal,
    chem: usize,
    jump: &Jump<S>,
    closest: &ClosestDistance,
) -> Result<bool, anyhow::Error> {
    let dists = closest.resolve(crys)?;
    let (start, end) = moving_atom_path(crys, chem, jump)?;
    let db1 = jump.state1.dumbbell();
    let db2 = jump.state2.dumbbell();

    let dmax = dists.iter().cloned().fold(0.0, f64::max);
    let ustart = crys.invlattice() * start;
    let uend = crys.invlattice() * end;
    let bounds = (0..3)
        .map(|a| {
            let margin = dmax * crys.invlattice().row(a).norm();
            let lo = (ustart[a].min(uend[a]) - margin).floor() - 1.0;
            let hi = (ustart[a].max(uend[a]) + margin).ceil();
            match (lo.to_i32(), hi.to_i32()) {
                (Some(lo), Some(hi)) => Ok(lo..=hi),
                _ => bail!("The path of jump `{jump}` cannot be bounded in the lattice."),
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    for (c, sites) in crys.basis().iter().enumerate() {
        let dist = dists[c];
        if dist <= 0.0 {
            continue;
        }
        for (i, n0, n1, n2) in iproduct!(
            0..sites.len(),
            bounds[0].clone(),
            bounds[1].clone(),
            bounds[2].clone()
        ) {
            let r = Vector3::new(n0, n1, n2);
            if c == chem && ((i == db1.i && r == db1.r) || (i == db2.i && r == db2.r)) {
                continue;
            }
            let x = crys.unit2cart(&r, &sites[i]);
            if point_segment_distance(&x, &start, &end) < dist {
                log::debug!(
                    "Jump `{jump}` rejected: the moving atom passes site ({c}, {i}) at R = ({}).",
                    r.iter().join(", ")
                );
                return Ok(true);
            }
        }
    }
    Ok(false)
}
