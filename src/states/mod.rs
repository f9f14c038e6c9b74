//! Symmetry-distinct dumbbell orientations on a sublattice.
//!
//! A state container expands a user-supplied [`OrientationFamily`] into the complete list of
//! `(site, orientation)` entries of the origin cell (the *iorlist*), partitions it into orbits
//! under the space group (the *symorlist*), and precomputes the permutation that every group
//! operation induces on the list. Two flavours exist:
//!
//! - [`PureDumbbellStates`] for dumbbells made of two solvent atoms, where `(i, o)` and `(i, -o)`
//!   are the same entry, and
//! - [`MixedDumbbellStates`] for solute-solvent dumbbells, where both signs are kept.

use std::error::Error;
use std::fmt;

use anyhow::{self, ensure};
use indexmap::IndexMap;
use itertools::Itertools;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::auxiliary::misc::HASH_ROUNDING_FACTOR;
use crate::crystal::{Crystal, GroupOp};
use crate::representations::Dumbbell;

mod mixed_states;
mod pure_states;

pub use mixed_states::MixedDumbbellStates;
pub use pure_states::PureDumbbellStates;


/// An entry of an orientation list: a basis site index and a Cartesian orientation.
pub type SiteOrientation = (usize, Vector3<f64>);

// ==================
// Error definitions
// ==================

/// Error raised when an orientation family is not structured as one list of three-component
/// vectors per Wyckoff set.
#[derive(Debug, Clone)]
pub struct FamilyShapeError(pub String);

impl fmt::Display for FamilyShapeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Orientation family shape error: {}", self.0)
    }
}

impl Error for FamilyShapeError {}

/// Error raised when the image of a state under a group operation cannot be located where it
/// must be. This always signals a broken orbit construction.
#[derive(Debug, Clone)]
pub struct SymmetryClosureError(pub String);

impl fmt::Display for SymmetryClosureError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Symmetry closure error: {}", self.0)
    }
}

impl Error for SymmetryClosureError {}

// ==================
// Struct definitions
// ==================

// -----------------
// OrientationFamily
// -----------------

/// Seed orientations for every Wyckoff set of a sublattice, in the order given by
/// [`Crystal::sitelist`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<Vec<f64>>>", into = "Vec<Vec<Vec<f64>>>")]
pub struct OrientationFamily {
    seeds: Vec<Vec<Vector3<f64>>>,
}

impl OrientationFamily {
    /// Validates and wraps a list of seed orientations.
    ///
    /// # Errors
    ///
    /// Errors with a [`FamilyShapeError`] if there are no Wyckoff entries, if any entry has no
    /// orientations, or if any orientation is not finite or too short to be told apart from zero
    /// on the hashing grid.
    pub fn new(seeds: Vec<Vec<Vector3<f64>>>) -> Result<Self, anyhow::Error> {
        if seeds.is_empty() {
            return Err(FamilyShapeError("no Wyckoff entries were given.".to_string()).into());
        }
        for (w, orientations) in seeds.iter().enumerate() {
            if orientations.is_empty() {
                return Err(FamilyShapeError(format!(
                    "Wyckoff entry {w} contains no orientations."
                ))
                .into());
            }
            if let Some(o) = orientations
                .iter()
                .find(|o| {
                    o.norm() < 1.0 / HASH_ROUNDING_FACTOR || o.iter().any(|x| !x.is_finite())
                })
            {
                return Err(FamilyShapeError(format!(
                    "Wyckoff entry {w} contains the invalid orientation ({}).",
                    o.iter().join(", ")
                ))
                .into());
            }
        }
        Ok(Self { seeds })
    }

    /// Validates a family given as raw nested lists.
    ///
    /// # Errors
    ///
    /// Errors with a [`FamilyShapeError`] if any innermost list does not have exactly three
    /// components, or if [`Self::new`] rejects the result.
    pub fn from_raw(raw: Vec<Vec<Vec<f64>>>) -> Result<Self, anyhow::Error> {
        let seeds = raw
            .into_iter()
            .enumerate()
            .map(|(w, orientations)| {
                orientations
                    .into_iter()
                    .map(|o| {
                        if o.len() == 3 {
                            Ok(Vector3::new(o[0], o[1], o[2]))
                        } else {
                            Err(FamilyShapeError(format!(
                                "Wyckoff entry {w} contains an orientation with {} components.",
                                o.len()
                            )))
                        }
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(seeds)
    }

    /// Returns the seed orientations of every Wyckoff set.
    pub fn seeds(&self) -> &[Vec<Vector3<f64>>] {
        &self.seeds
    }

    /// Returns the number of Wyckoff sets covered by this family.
    pub fn n_wyckoff_sets(&self) -> usize {
        self.seeds.len()
    }

    /// Checks that this family has one entry per Wyckoff set of `chem`.
    fn check_against(&self, crys: &Crystal, chem: usize) -> Result<Vec<Vec<usize>>, anyhow::Error> {
        let sitelist = crys.sitelist(chem)?;
        if sitelist.len() != self.seeds.len() {
            return Err(FamilyShapeError(format!(
                "sublattice {chem} has {} Wyckoff sets, but {} orientation entries were given.",
                sitelist.len(),
                self.seeds.len()
            ))
            .into());
        }
        Ok(sitelist)
    }
}

impl Default for OrientationFamily {
    /// A single Wyckoff set seeded with a $`\langle 100 \rangle`$ dumbbell of length `0.126`.
    fn default() -> Self {
        Self {
            seeds: vec![vec![Vector3::new(0.126, 0.0, 0.0)]],
        }
    }
}

impl TryFrom<Vec<Vec<Vec<f64>>>> for OrientationFamily {
    type Error = anyhow::Error;

    fn try_from(raw: Vec<Vec<Vec<f64>>>) -> Result<Self, Self::Error> {
        Self::from_raw(raw)
    }
}

impl From<OrientationFamily> for Vec<Vec<Vec<f64>>> {
    fn from(family: OrientationFamily) -> Self {
        family
            .seeds
            .into_iter()
            .map(|orientations| {
                orientations
                    .into_iter()
                    .map(|o| o.iter().cloned().collect_vec())
                    .collect_vec()
            })
            .collect_vec()
    }
}

impl fmt::Display for OrientationFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (w, orientations) in self.seeds.iter().enumerate() {
            writeln!(
                f,
                "Wyckoff set {w}: {}",
                orientations
                    .iter()
                    .map(|o| format!("({})", o.iter().map(|x| format!("{x:+.4}")).join(", ")))
                    .join(", ")
            )?;
        }
        Ok(())
    }
}

// ----------------
// OrientationLists
// ----------------

/// The lists derived from an orientation family that both kinds of container share.
#[derive(Clone, Debug)]
pub struct OrientationLists {
    /// The flat list of `(site, orientation)` entries.
    iorlist: Vec<SiteOrientation>,

    /// The entries of [`Self::iorlist`] grouped into orbits.
    symorlist: Vec<Vec<SiteOrientation>>,

    /// [`Self::symorlist`] with every entry replaced by its index in [`Self::iorlist`].
    indexed_symorlist: Vec<Vec<usize>>,

    /// The orbit index of every entry of [`Self::iorlist`].
    invmap: Vec<usize>,

    /// For every group operation, in the order of [`Crystal::group`], the index of the image of
    /// every entry.
    indexmap: Vec<Vec<usize>>,

    /// The index of every entry, keyed by the corresponding dumbbell in the origin cell.
    iorindex: IndexMap<Dumbbell, usize>,
}

impl OrientationLists {
    /// Derives the orbit decomposition from a flat list and its permutations.
    fn new(
        iorlist: Vec<SiteOrientation>,
        iorindex: IndexMap<Dumbbell, usize>,
        indexmap: Vec<Vec<usize>>,
    ) -> Self {
        let mut invmap = vec![usize::MAX; iorlist.len()];
        let mut indexed_symorlist: Vec<Vec<usize>> = vec![];
        for idx in 0..iorlist.len() {
            if invmap[idx] != usize::MAX {
                continue;
            }
            let orbit = indexmap.iter().map(|perm| perm[idx]).unique().collect_vec();
            orbit.iter().for_each(|&k| invmap[k] = indexed_symorlist.len());
            indexed_symorlist.push(orbit);
        }
        let symorlist = indexed_symorlist
            .iter()
            .map(|orbit| orbit.iter().map(|&k| iorlist[k]).collect_vec())
            .collect_vec();
        Self {
            iorlist,
            symorlist,
            indexed_symorlist,
            invmap,
            indexmap,
            iorindex,
        }
    }
}

// =================
// Trait definitions
// =================

/// Capabilities shared by the pure and mixed state containers.
pub trait DumbbellContainer {
    // ----------------
    // Required methods
    // ----------------

    /// Returns the crystal.
    fn crystal(&self) -> &Crystal;

    /// Returns the sublattice index.
    fn chem(&self) -> usize;

    /// Returns the orientation family the container was built from.
    fn family(&self) -> &OrientationFamily;

    /// Returns the derived orientation lists.
    fn lists(&self) -> &OrientationLists;

    /// Applies a group operation to a dumbbell and expresses the result in the orientation
    /// convention of this container.
    ///
    /// # Returns
    ///
    /// The transformed dumbbell and the multiplier, $`\pm 1`$, recording whether its orientation
    /// had to be reversed. Any jump indicator attached to the dumbbell must be multiplied by it.
    ///
    /// # Errors
    ///
    /// Errors with a [`SymmetryClosureError`] if the image is not in the orientation list.
    fn apply_group_op(&self, g: &GroupOp, db: &Dumbbell) -> Result<(Dumbbell, i8), anyhow::Error>;

    // ----------------
    // Provided methods
    // ----------------

    /// Returns the flat list of `(site, orientation)` entries.
    fn iorlist(&self) -> &[SiteOrientation] {
        &self.lists().iorlist
    }

    /// Returns the entries grouped into orbits.
    fn symorlist(&self) -> &[Vec<SiteOrientation>] {
        &self.lists().symorlist
    }

    /// Returns the orbits as indices into [`Self::iorlist`].
    fn indexed_symorlist(&self) -> &[Vec<usize>] {
        &self.lists().indexed_symorlist
    }

    /// Returns the orbit index of every entry.
    fn invmap(&self) -> &[usize] {
        &self.lists().invmap
    }

    /// Returns the permutation induced on the entries by the group operation at index `gi`.
    fn index_map(&self, gi: usize) -> Option<&[usize]> {
        self.lists().indexmap.get(gi).map(|perm| perm.as_slice())
    }

    /// Returns the orbit containing the entry at `index`.
    fn orbit_of(&self, index: usize) -> Option<usize> {
        self.lists().invmap.get(index).copied()
    }

    /// Returns the index of the exact entry `(site, o)`.
    fn index_of(&self, site: usize, o: &Vector3<f64>) -> Option<usize> {
        self.lists()
            .iorindex
            .get(&Dumbbell::new(site, *o, Vector3::zeros()))
            .copied()
    }
}

// =========
// Functions
// =========

/// Keys every entry of an orientation list by its origin-cell dumbbell.
fn build_iorindex(iorlist: &[SiteOrientation]) -> IndexMap<Dumbbell, usize> {
    iorlist
        .iter()
        .enumerate()
        .map(|(idx, (site, o))| (Dumbbell::new(*site, *o, Vector3::zeros()), idx))
        .collect()
}

/// Returns the site and orientation of the image of an origin-cell entry.
fn entry_image(
    crys: &Crystal,
    chem: usize,
    g: &GroupOp,
    entry: &SiteOrientation,
) -> Result<SiteOrientation, anyhow::Error> {
    let (site, o) = entry;
    let (_, (_, site_new)) = crys.g_pos(g, &Vector3::zeros(), (chem, *site))?;
    Ok((site_new, crys.g_direc(g, o)))
}

/// Computes, for every group operation, the index of the image of every entry.
///
/// # Arguments
///
/// * `crys` - The crystal.
/// * `chem` - The sublattice.
/// * `iorlist` - The orientation list.
/// * `locate` - Resolves an image `(site, orientation)` to its index in `iorlist` under the
/// container's sign convention.
fn build_index_maps<F>(
    crys: &Crystal,
    chem: usize,
    iorlist: &[SiteOrientation],
    locate: F,
) -> Result<Vec<Vec<usize>>, anyhow::Error>
where
    F: Fn(&SiteOrientation) -> Option<usize>,
{
    crys.group()
        .iter()
        .enumerate()
        .map(|(gi, g)| {
            iorlist
                .iter()
                .map(|entry| -> Result<usize, anyhow::Error> {
                    let image = entry_image(crys, chem, g, entry)?;
                    locate(&image).ok_or_else(|| {
                        SymmetryClosureError(format!(
                            "the image of entry (site {}, o = ({})) under operation {gi} is not \
                            in the orientation list.",
                            entry.0,
                            entry.1.iter().join(", ")
                        ))
                        .into()
                    })
                })
                .collect::<Result<Vec<_>, _>>()
        })
        .collect::<Result<Vec<_>, _>>()
}

/// Checks that an index map is a permutation of the orientation list.
fn ensure_permutations(indexmap: &[Vec<usize>], n: usize) -> Result<(), anyhow::Error> {
    for (gi, perm) in indexmap.iter().enumerate() {
        ensure!(
            perm.iter().unique().count() == n,
            SymmetryClosureError(format!(
                "operation {gi} does not permute the orientation list."
            ))
        );
    }
    Ok(())
}
