//! Dumbbells made of one solute and one solvent atom.

use std::fmt;

use anyhow;
use indexmap::IndexMap;
use itertools::Itertools;
use log;
use nalgebra::Vector3;

use crate::crystal::{Crystal, GroupOp};
use crate::io::format::write_subtitle;
use crate::representations::{DefectState, Dumbbell, SdPair};
use crate::states::{
    build_index_maps, ensure_permutations, entry_image, DumbbellContainer,
    OrientationFamily, OrientationLists, SiteOrientation, SymmetryClosureError,
};

#[cfg(test)]
#[path = "mixed_states_tests.rs"]
mod mixed_states_tests;

// ==================
// Struct definitions
// ==================

/// The symmetry-distinct orientations of mixed dumbbells on one sublattice.
///
/// The solute sits at the $`+\mathbf{o}/2`$ end, so `(i, o)` and `(i, -o)` are different states
/// and both are kept whenever the space group generates them.
#[derive(Clone, Debug)]
pub struct MixedDumbbellStates<'a> {
    crys: &'a Crystal,
    chem: usize,
    family: OrientationFamily,
    lists: OrientationLists,
}

impl<'a> MixedDumbbellStates<'a> {
    /// Expands an orientation family on a sublattice.
    ///
    /// # Arguments
    ///
    /// * `crys` - The crystal.
    /// * `chem` - The sublattice hosting the dumbbells.
    /// * `family` - Seed orientations for every Wyckoff set of the sublattice.
    ///
    /// # Errors
    ///
    /// Errors with a [`crate::states::FamilyShapeError`] if the family does not match the
    /// Wyckoff sets of the sublattice.
    pub fn new(
        crys: &'a Crystal,
        chem: usize,
        family: OrientationFamily,
    ) -> Result<Self, anyhow::Error> {
        let sitelist = family.check_against(crys, chem)?;
        let mut iorlist: Vec<SiteOrientation> = vec![];
        let mut iorindex: IndexMap<Dumbbell, usize> = IndexMap::new();
        for (wycksites, orientations) in sitelist.iter().zip(family.seeds().iter()) {
            let site = wycksites[0];
            for o in orientations.iter() {
                for g in crys.group() {
                    let (site_new, o_new) = entry_image(crys, chem, g, &(site, *o))?;
                    let key = Dumbbell::new(site_new, o_new, Vector3::zeros());
                    if !iorindex.contains_key(&key) {
                        iorindex.insert(key, iorlist.len());
                        iorlist.push((site_new, o_new));
                    }
                }
            }
        }
        let locate = |(site, o): &SiteOrientation| {
            iorindex
                .get(&Dumbbell::new(*site, *o, Vector3::zeros()))
                .copied()
        };
        let indexmap = build_index_maps(crys, chem, &iorlist, locate)?;
        ensure_permutations(&indexmap, iorlist.len())?;
        let lists = OrientationLists::new(iorlist, iorindex, indexmap);
        log::debug!(
            "Mixed dumbbells on sublattice {chem}: {} orientations in {} orbits.",
            lists.iorlist.len(),
            lists.symorlist.len()
        );
        Ok(Self {
            crys,
            chem,
            family,
            lists,
        })
    }

    /// Checks whether a mixed dumbbell is one of the listed states, in any cell.
    ///
    /// # Errors
    ///
    /// Errors with a [`SymmetryClosureError`] if `pair` is not a mixed dumbbell.
    pub fn check_in_list(&self, pair: &SdPair) -> Result<bool, anyhow::Error> {
        if !pair.is_mixed() {
            return Err(SymmetryClosureError(format!(
                "`{pair}` was expected to be a mixed dumbbell."
            ))
            .into());
        }
        Ok(self.index_of(pair.db.i, &pair.db.o).is_some())
    }

    /// Returns the listed state at `index` as a mixed dumbbell in the origin cell.
    pub fn pair_at(&self, index: usize) -> Option<SdPair> {
        self.iorlist()
            .get(index)
            .map(|(site, o)| SdPair::mixed(*site, *o))
    }
}

impl<'a> DumbbellContainer for MixedDumbbellStates<'a> {
    fn crystal(&self) -> &Crystal {
        self.crys
    }

    fn chem(&self) -> usize {
        self.chem
    }

    fn family(&self) -> &OrientationFamily {
        &self.family
    }

    fn lists(&self) -> &OrientationLists {
        &self.lists
    }

    fn apply_group_op(&self, g: &GroupOp, db: &Dumbbell) -> Result<(Dumbbell, i8), anyhow::Error> {
        let dbnew = db.gop(self.crys, self.chem, g)?;
        if self.index_of(dbnew.i, &dbnew.o).is_some() {
            Ok((dbnew, 1))
        } else {
            Err(SymmetryClosureError(format!(
                "the image `{dbnew}` of mixed dumbbell `{db}` is not in the orientation list."
            ))
            .into())
        }
    }
}

impl<'a> fmt::Display for MixedDumbbellStates<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_subtitle(f, &format!("Mixed dumbbell states on sublattice {}", self.chem))?;
        writeln!(f, "{:>5}  {:>5}  {:>6}  Orientation", "Index", "Site", "Orbit")?;
        for (idx, ((site, o), orbit)) in self
            .iorlist()
            .iter()
            .zip(self.invmap().iter())
            .enumerate()
        {
            writeln!(
                f,
                "{idx:>5}  {site:>5}  {orbit:>6}  ({})",
                o.iter().map(|x| format!("{x:+.6}")).join(", ")
            )?;
        }
        Ok(())
    }
}
