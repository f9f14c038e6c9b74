//! Orbits of solute-dumbbell states.
//!
//! A [`StarSet`] collects every complex (a solute with a dumbbell on another site) reachable from
//! a solute by a bounded number of bare-dumbbell jumps, together with every mixed dumbbell, and
//! partitions them into orbits under the space group. Complexes are stored with their solute in
//! the origin cell and their dumbbell in the sign convention of the pure orientation list. Mixed
//! dumbbells are stored exactly as listed by the mixed container.

use std::collections::HashMap;
use std::fmt;

use anyhow::{self, format_err};
use itertools::Itertools;
use log;

use crate::crystal::{Crystal, GroupOp};
use crate::io::format::write_subtitle;
use crate::jumpnet::{IndexedJump, IndexedJumpNetwork, JumpNetwork};
use crate::representations::{DefectState, Dumbbell, Jump, SdPair};
use crate::states::{
    DumbbellContainer, MixedDumbbellStates, PureDumbbellStates, SymmetryClosureError,
};

mod omega;

pub use omega::Omega34Networks;

#[cfg(test)]
#[path = "stars_tests.rs"]
mod stars_tests;

// ==================
// Struct definitions
// ==================

/// Complex and mixed-dumbbell states grouped into stars.
#[derive(Clone, Debug)]
pub struct StarSet<'a> {
    /// The container of pure dumbbell orientations.
    pdbcontainer: PureDumbbellStates<'a>,

    /// The container of mixed dumbbell orientations.
    mdbcontainer: MixedDumbbellStates<'a>,

    /// The bare-dumbbell jump network and its indexed form.
    jnet0: (JumpNetwork<Dumbbell>, IndexedJumpNetwork),

    /// The mixed-dumbbell jump network and its indexed form.
    jnet2: (JumpNetwork<SdPair>, IndexedJumpNetwork),

    /// The number of bare-dumbbell jumps used to grow complexes away from the solute.
    nshells: usize,

    /// Every state: complexes first, then mixed dumbbells.
    states: Vec<SdPair>,

    /// The index of every state in [`Self::states`].
    stateindex: HashMap<SdPair, usize>,

    /// The index in [`Self::states`] of the first mixed dumbbell.
    mixedstateindex: usize,

    /// The stars, as indices into [`Self::states`]. The first entry of a star is its
    /// representative.
    stars: Vec<Vec<usize>>,

    /// The star of every state.
    starindex: Vec<usize>,

    /// The index in [`Self::stars`] of the first star of mixed dumbbells.
    mixedstartindex: usize,
}

impl<'a> StarSet<'a> {
    /// Grows complexes around a solute and groups all states into stars.
    ///
    /// The first shell places a solute at the initial site of every bare-dumbbell jump and the
    /// dumbbell at its final state. Every further shell applies every bare-dumbbell jump to the
    /// dumbbells of the previous shell while the solute stays put. Configurations in which the
    /// dumbbell lands on the solute site are not complexes and are discarded.
    ///
    /// # Arguments
    ///
    /// * `pdbcontainer` - The pure dumbbell orientations.
    /// * `mdbcontainer` - The mixed dumbbell orientations on the same sublattice.
    /// * `jnet0` - The bare-dumbbell jump network built from `pdbcontainer`.
    /// * `jnet2` - The mixed-dumbbell jump network built from `mdbcontainer`.
    /// * `nshells` - The number of shells of complexes.
    ///
    /// # Errors
    ///
    /// Errors if the containers do not describe the same sublattice of the same crystal, or with
    /// a [`SymmetryClosureError`] if a state maps outside the set under the space group.
    pub fn new(
        pdbcontainer: PureDumbbellStates<'a>,
        mdbcontainer: MixedDumbbellStates<'a>,
        jnet0: (JumpNetwork<Dumbbell>, IndexedJumpNetwork),
        jnet2: (JumpNetwork<SdPair>, IndexedJumpNetwork),
        nshells: usize,
    ) -> Result<Self, anyhow::Error> {
        if !std::ptr::eq(pdbcontainer.crystal(), mdbcontainer.crystal())
            || pdbcontainer.chem() != mdbcontainer.chem()
        {
            return Err(format_err!(
                "Pure and mixed dumbbell containers must share a crystal and a sublattice."
            ));
        }

        let mut states: Vec<SdPair> = vec![];
        let mut stateindex: HashMap<SdPair, usize> = HashMap::new();
        let mut lastshell: Vec<SdPair> = vec![];
        if nshells > 0 {
            for jump in jnet0.0.iter().flatten() {
                let pair = SdPair::new(jump.state1.i, jump.state1.r, jump.state2.clone());
                if !pair.is_mixed() && !stateindex.contains_key(&pair) {
                    stateindex.insert(pair.clone(), states.len());
                    states.push(pair.clone());
                    lastshell.push(pair);
                }
            }
        }
        for shell in 2..=nshells {
            let mut nextshell: Vec<SdPair> = vec![];
            for pair in lastshell.iter() {
                for jump in jnet0.0.iter().flatten() {
                    if jump.state1.i != pair.db.i {
                        continue;
                    }
                    if let Some((_, db, _)) = transport_dumbbell(&pdbcontainer, &pair.db, jump)? {
                        let pairnew = SdPair::new(pair.i_s, pair.r_s, db);
                        if !pairnew.is_mixed() && !stateindex.contains_key(&pairnew) {
                            stateindex.insert(pairnew.clone(), states.len());
                            states.push(pairnew.clone());
                            nextshell.push(pairnew);
                        }
                    }
                }
            }
            log::debug!("Shell {shell} adds {} complexes.", nextshell.len());
            lastshell = nextshell;
        }

        let mixedstateindex = states.len();
        for idx in 0..mdbcontainer.iorlist().len() {
            let pair = mdbcontainer
                .pair_at(idx)
                .ok_or_else(|| format_err!("Mixed dumbbell entry {idx} is missing."))?;
            stateindex.insert(pair.clone(), states.len());
            states.push(pair);
        }

        let mut starset = Self {
            pdbcontainer,
            mdbcontainer,
            jnet0,
            jnet2,
            nshells,
            states,
            stateindex,
            mixedstateindex,
            stars: vec![],
            starindex: vec![],
            mixedstartindex: 0,
        };
        starset.group_into_stars()?;
        log::debug!(
            "Star set with {} complexes in {} stars and {} mixed dumbbells in {} stars.",
            starset.mixedstateindex,
            starset.mixedstartindex,
            starset.states.len() - starset.mixedstateindex,
            starset.stars.len() - starset.mixedstartindex
        );
        Ok(starset)
    }

    /// Partitions the complexes into orbits, then appends one star per mixed orientation orbit.
    fn group_into_stars(&mut self) -> Result<(), anyhow::Error> {
        let mut starindex = vec![usize::MAX; self.states.len()];
        let mut stars: Vec<Vec<usize>> = vec![];
        for idx in 0..self.mixedstateindex {
            if starindex[idx] != usize::MAX {
                continue;
            }
            let mut star = vec![idx];
            for g in self.crystal().group() {
                let (image, _) = self.apply_group_op(g, &self.states[idx])?;
                let image_idx = self.locate(&image)?;
                if !star.contains(&image_idx) {
                    star.push(image_idx);
                }
            }
            star.iter().for_each(|&k| starindex[k] = stars.len());
            stars.push(star);
        }
        let mixedstartindex = stars.len();
        for orbit in self.mdbcontainer.indexed_symorlist() {
            let star = orbit
                .iter()
                .map(|k| self.mixedstateindex + k)
                .collect_vec();
            star.iter().for_each(|&k| starindex[k] = stars.len());
            stars.push(star);
        }
        self.stars = stars;
        self.starindex = starindex;
        self.mixedstartindex = mixedstartindex;
        Ok(())
    }

    /// Returns the crystal.
    pub fn crystal(&self) -> &Crystal {
        self.pdbcontainer.crystal()
    }

    /// Returns the sublattice of the dumbbells and the solute.
    pub fn chem(&self) -> usize {
        self.pdbcontainer.chem()
    }

    pub fn pdbcontainer(&self) -> &PureDumbbellStates<'a> {
        &self.pdbcontainer
    }

    pub fn mdbcontainer(&self) -> &MixedDumbbellStates<'a> {
        &self.mdbcontainer
    }

    /// Returns the bare-dumbbell jump network.
    pub fn jnet0(&self) -> &(JumpNetwork<Dumbbell>, IndexedJumpNetwork) {
        &self.jnet0
    }

    /// Returns the mixed-dumbbell jump network.
    pub fn jnet2(&self) -> &(JumpNetwork<SdPair>, IndexedJumpNetwork) {
        &self.jnet2
    }

    pub fn nshells(&self) -> usize {
        self.nshells
    }

    /// Returns every state, complexes first.
    pub fn states(&self) -> &[SdPair] {
        &self.states
    }

    pub fn complex_states(&self) -> &[SdPair] {
        &self.states[..self.mixedstateindex]
    }

    pub fn mixed_states(&self) -> &[SdPair] {
        &self.states[self.mixedstateindex..]
    }

    /// Returns the index of the first mixed dumbbell in [`Self::states`].
    pub fn mixedstateindex(&self) -> usize {
        self.mixedstateindex
    }

    /// Returns the stars as lists of indices into [`Self::states`].
    pub fn stars(&self) -> &[Vec<usize>] {
        &self.stars
    }

    /// Returns the index of the first star of mixed dumbbells.
    pub fn mixedstartindex(&self) -> usize {
        self.mixedstartindex
    }

    /// Returns the star containing the state at `index`.
    pub fn star_of(&self, index: usize) -> Option<usize> {
        self.starindex.get(index).copied()
    }

    /// Returns the index of a state. Complexes are also found when given with their dumbbell
    /// reversed.
    pub fn state_index(&self, pair: &SdPair) -> Option<usize> {
        self.stateindex.get(pair).copied().or_else(|| {
            if pair.is_gauge_free() {
                self.stateindex.get(&pair.gauge_flipped()).copied()
            } else {
                None
            }
        })
    }

    /// Applies a group operation to a state and re-expresses it in the conventions of the set:
    /// solute back in the origin cell, complex dumbbells in the pure sign convention.
    ///
    /// # Returns
    ///
    /// The image and the multiplier recording whether the dumbbell of a complex had to be
    /// reversed. Mixed dumbbells are never reversed.
    ///
    /// # Errors
    ///
    /// Errors with a [`SymmetryClosureError`] if the image orientation is not listed.
    pub fn apply_group_op(&self, g: &GroupOp, pair: &SdPair) -> Result<(SdPair, i8), anyhow::Error> {
        let crys = self.crystal();
        let chem = self.chem();
        if pair.is_mixed() {
            let image = pair.gop(crys, chem, g)?;
            let image = image.translated(&-image.r_s);
            if self.mdbcontainer.check_in_list(&image)? {
                Ok((image, 1))
            } else {
                Err(SymmetryClosureError(format!(
                    "the image `{image}` of mixed dumbbell `{pair}` is not listed."
                ))
                .into())
            }
        } else {
            let (r_s, (_, i_s)) = crys.g_pos(g, &pair.r_s, (chem, pair.i_s))?;
            let (db, mult) = self.pdbcontainer.apply_group_op(g, &pair.db)?;
            Ok((SdPair::new(i_s, r_s, db).translated(&-r_s), mult))
        }
    }

    /// Returns the index of a state that must be in the set.
    pub(crate) fn locate(&self, pair: &SdPair) -> Result<usize, anyhow::Error> {
        self.state_index(pair).ok_or_else(|| {
            SymmetryClosureError(format!("state `{pair}` is not in the star set.")).into()
        })
    }

    /// Reduces a jump between states of the set to its indexed form.
    fn index_pair_jump(&self, jump: &Jump<SdPair>) -> Result<IndexedJump, anyhow::Error> {
        Ok((
            (self.locate(&jump.state1)?, self.locate(&jump.state2)?),
            jump.displacement(self.crystal(), self.chem())?,
        ))
    }
}

impl<'a> fmt::Display for StarSet<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_subtitle(f, "Star set")?;
        writeln!(f, "Number of shells: {}", self.nshells)?;
        writeln!(
            f,
            "Complexes: {} in {} stars",
            self.mixedstateindex, self.mixedstartindex
        )?;
        writeln!(
            f,
            "Mixed dumbbells: {} in {} stars",
            self.states.len() - self.mixedstateindex,
            self.stars.len() - self.mixedstartindex
        )?;
        writeln!(f)?;
        writeln!(f, "{:>5}  {:>5}  Representative", "Star", "Size")?;
        for (k, star) in self.stars.iter().enumerate() {
            writeln!(f, "{k:>5}  {:>5}  {}", star.len(), self.states[star[0]])?;
        }
        Ok(())
    }
}

// =========
// Functions
// =========

/// Moves a pure dumbbell along a bare-dumbbell jump.
///
/// The jump is first translated so that it starts in the cell of `db`. It applies if its initial
/// state is `db`, possibly reversed.
///
/// # Returns
///
/// `None` if the jump does not apply. Otherwise the initial indicator expressed in the gauge of
/// `db`, the destination dumbbell in the sign convention of the pure orientation list, and the
/// final indicator in the gauge of that destination.
fn transport_dumbbell(
    pdbcontainer: &PureDumbbellStates,
    db: &Dumbbell,
    jump: &Jump<Dumbbell>,
) -> Result<Option<(i8, Dumbbell, i8)>, anyhow::Error> {
    let jump = jump.translated(&(db.r - jump.state1.r));
    let (c1, c2, db2) = if jump.state1 == *db {
        (jump.c1, jump.c2, jump.state2)
    } else if jump.state1.gauge_flipped() == *db {
        (-jump.c1, -jump.c2, jump.state2.gauge_flipped())
    } else {
        return Ok(None);
    };
    let (idx, sign) = pdbcontainer
        .canonical_index(db2.i, &db2.o)
        .ok_or_else(|| {
            SymmetryClosureError(format!("the destination `{db2}` of a jump is not listed."))
        })?;
    let (_, o) = pdbcontainer.iorlist()[idx];
    Ok(Some((c1, Dumbbell::new(db2.i, o, db2.r), c2 * sign)))
}
