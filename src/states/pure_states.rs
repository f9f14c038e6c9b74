//! Dumbbells made of two identical solvent atoms.

use std::fmt;

use anyhow;
use itertools::Itertools;
use log;
use nalgebra::Vector3;

use crate::auxiliary::misc::round_vector;
use crate::crystal::{Crystal, GroupOp};
use crate::io::format::write_subtitle;
use crate::representations::{DefectState, Dumbbell};
use crate::states::{
    build_index_maps, build_iorindex, ensure_permutations, entry_image, DumbbellContainer,
    OrientationFamily, OrientationLists, SiteOrientation, SymmetryClosureError,
};

#[cfg(test)]
#[path = "pure_states_tests.rs"]
mod pure_states_tests;

// ==================
// Struct definitions
// ==================

/// The symmetry-distinct orientations of pure dumbbells on one sublattice.
///
/// Reversing a pure dumbbell swaps two identical atoms, so `(i, o)` and `(i, -o)` describe the
/// same state and only one of them is kept. Whenever an orientation and its reverse could both
/// be chosen, the sign already present elsewhere in the list wins, so that equivalent entries on
/// different sites share a sign convention.
#[derive(Clone, Debug)]
pub struct PureDumbbellStates<'a> {
    crys: &'a Crystal,
    chem: usize,
    family: OrientationFamily,
    lists: OrientationLists,
}

impl<'a> PureDumbbellStates<'a> {
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
    /// Wyckoff sets of the sublattice, or with a [`SymmetryClosureError`] if the expanded list is
    /// not closed under the space group.
    pub fn new(
        crys: &'a Crystal,
        chem: usize,
        family: OrientationFamily,
    ) -> Result<Self, anyhow::Error> {
        let sitelist = family.check_against(crys, chem)?;
        let iorlist = Self::build_ior_set(crys, chem, &sitelist, &family)?;
        let iorindex = build_iorindex(&iorlist);
        let locate = |(site, o): &SiteOrientation| {
            iorindex
                .get(&Dumbbell::new(*site, *o, Vector3::zeros()))
                .or_else(|| iorindex.get(&Dumbbell::new(*site, -o, Vector3::zeros())))
                .copied()
        };
        let indexmap = build_index_maps(crys, chem, &iorlist, locate)?;
        ensure_permutations(&indexmap, iorlist.len())?;
        let lists = OrientationLists::new(iorlist, iorindex, indexmap);
        log::debug!(
            "Pure dumbbells on sublattice {chem}: {} orientations in {} orbits.",
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

    /// Generates the flat orientation list, keeping one sign per orientation axis.
    fn build_ior_set(
        crys: &Crystal,
        chem: usize,
        sitelist: &[Vec<usize>],
        family: &OrientationFamily,
    ) -> Result<Vec<SiteOrientation>, anyhow::Error> {
        let mut pairlist: Vec<SiteOrientation> = vec![];
        for (wycksites, orientations) in sitelist.iter().zip(family.seeds().iter()) {
            let site = wycksites[0];
            for o in orientations.iter() {
                for g in crys.group() {
                    let (site_new, o_new) = entry_image(crys, chem, g, &(site, *o))?;
                    let key = round_vector(&o_new);
                    let key_neg = round_vector(&-o_new);
                    if pairlist.iter().any(|(s, existing)| {
                        *s == site_new && {
                            let existing_key = round_vector(existing);
                            existing_key == key || existing_key == key_neg
                        }
                    }) {
                        continue;
                    }
                    let o_new = if pairlist
                        .iter()
                        .any(|(_, existing)| round_vector(existing) == key_neg)
                    {
                        -o_new
                    } else {
                        o_new
                    };
                    pairlist.push((site_new, o_new));
                }
            }
        }
        Ok(pairlist)
    }

    /// Locates an orientation in the list, allowing for a reversal.
    ///
    /// # Returns
    ///
    /// The index of the entry and $`+1`$ if `(site, o)` is listed as is, or $`-1`$ if
    /// `(site, -o)` is listed instead. `None` if neither is.
    pub fn canonical_index(&self, site: usize, o: &Vector3<f64>) -> Option<(usize, i8)> {
        self.index_of(site, o)
            .map(|idx| (idx, 1))
            .or_else(|| self.index_of(site, &-o).map(|idx| (idx, -1)))
    }
}

impl<'a> DumbbellContainer for PureDumbbellStates<'a> {
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
        match self.canonical_index(dbnew.i, &dbnew.o) {
            Some((_, 1)) => Ok((dbnew, 1)),
            Some(_) => Ok((-dbnew, -1)),
            None => Err(SymmetryClosureError(format!(
                "the image `{dbnew}` of pure dumbbell `{db}` is not in the orientation list."
            ))
            .into()),
        }
    }
}

impl<'a> fmt::Display for PureDumbbellStates<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_subtitle(f, &format!("Pure dumbbell states on sublattice {}", self.chem))?;
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
