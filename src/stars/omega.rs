use std::collections::HashSet;

use anyhow;
use log;

use crate::collision::{collision_others, collision_self};
use crate::jumpnet::{IndexedJumpNetwork, JumpNetwork, JumpNetworkParams};
use crate::representations::{Jump, SdPair};
use crate::stars::{transport_dumbbell, StarSet};

/// The jump networks connecting complexes with mixed dumbbells.
///
/// The three networks are parallel: orbit `k` of [`Self::omega34`] holds exactly the jumps of
/// orbit `k` of [`Self::omega4`] and of [`Self::omega3`].
#[derive(Clone, Debug)]
pub struct Omega34Networks {
    /// Both directions together.
    pub omega34: (JumpNetwork<SdPair>, IndexedJumpNetwork),

    /// Complex to mixed dumbbell.
    pub omega4: (JumpNetwork<SdPair>, IndexedJumpNetwork),

    /// Mixed dumbbell to complex.
    pub omega3: (JumpNetwork<SdPair>, IndexedJumpNetwork),
}

impl<'a> StarSet<'a> {
    /// Builds the network of jumps between complexes of the set.
    ///
    /// Every bare-dumbbell jump that starts at the dumbbell of a complex moves it to another
    /// complex with the solute left in place. Jumps leaving the set or landing on the solute are
    /// dropped.
    ///
    /// # Returns
    ///
    /// The network with its indexed form, in which states are indexed into [`Self::states`], and
    /// for every orbit the index of the bare-dumbbell orbit it derives from.
    pub fn jumpnetwork_omega1(
        &self,
    ) -> Result<((JumpNetwork<SdPair>, IndexedJumpNetwork), Vec<usize>), anyhow::Error> {
        let mut seen: HashSet<Jump<SdPair>> = HashSet::new();
        let mut jumpnetwork: JumpNetwork<SdPair> = vec![];
        let mut indexed: IndexedJumpNetwork = vec![];
        let mut jumptype: Vec<usize> = vec![];
        for (jt, orbit0) in self.jnet0().0.iter().enumerate() {
            for jump0 in orbit0.iter() {
                for pair in self.complex_states() {
                    if pair.db.i != jump0.state1.i {
                        continue;
                    }
                    let Some((c1, db, c2)) =
                        transport_dumbbell(self.pdbcontainer(), &pair.db, jump0)?
                    else {
                        continue;
                    };
                    let pairnew = SdPair::new(pair.i_s, pair.r_s, db);
                    if pairnew.is_mixed() || self.state_index(&pairnew).is_none() {
                        continue;
                    }
                    let jump = Jump::new(pair.clone(), pairnew, c1, c2)?;
                    if seen.contains(&jump) {
                        continue;
                    }
                    let orbit = self.pair_jump_orbit(&jump, &mut seen, true)?;
                    indexed.push(
                        orbit
                            .iter()
                            .map(|j| self.index_pair_jump(j))
                            .collect::<Result<Vec<_>, _>>()?,
                    );
                    jumpnetwork.push(orbit);
                    jumptype.push(jt);
                }
            }
        }
        log::debug!(
            "{} ω1 orbits derived from {} ω0 orbits.",
            jumpnetwork.len(),
            self.jnet0().0.len()
        );
        Ok(((jumpnetwork, indexed), jumptype))
    }

    /// Builds the networks of jumps in which the solvent atom of a mixed dumbbell leaves for a
    /// complex of the set, and of their reverses.
    ///
    /// The moving atom leaves from the $`-\mathbf{o}/2`$ end of the mixed dumbbell, so every
    /// mixed-to-complex jump carries $`c_1 = -1`$. The path is checked against the solute left
    /// behind with `solt_solv_cut` and against the partner at the destination with
    /// `solv_solv_cut`.
    ///
    /// # Arguments
    ///
    /// * `params` - Cutoffs controlling which jumps are admitted.
    ///
    /// # Errors
    ///
    /// Errors if the parameters are invalid, or with a [`crate::states::SymmetryClosureError`] if an image of an
    /// admitted jump leaves the set.
    pub fn jumpnetwork_omega34(
        &self,
        params: &JumpNetworkParams,
    ) -> Result<Omega34Networks, anyhow::Error> {
        params.validate()?;
        let crys = self.crystal();
        let chem = self.chem();
        let cutoff_sq = params.cutoff * params.cutoff;

        let mut seen: HashSet<Jump<SdPair>> = HashSet::new();
        let mut omega34: JumpNetwork<SdPair> = vec![];
        let mut omega4: JumpNetwork<SdPair> = vec![];
        let mut omega3: JumpNetwork<SdPair> = vec![];
        for mixed in self.mixed_states() {
            for complex in self.complex_states() {
                if complex.i_s != mixed.i_s || complex.r_s != mixed.r_s {
                    continue;
                }
                for c2 in [-1, 1] {
                    let jump = Jump::new(mixed.clone(), complex.clone(), -1, c2)?;
                    if jump.displacement(crys, chem)?.norm_squared() > cutoff_sq
                        || seen.contains(&jump)
                        || collision_self(
                            crys,
                            chem,
                            &jump,
                            params.solt_solv_cut,
                            params.solv_solv_cut,
                        )?
                        || collision_others(crys, chem, &jump, &params.closest_distance)?
                    {
                        continue;
                    }
                    let orbit3 = self.pair_jump_orbit(&jump, &mut seen, false)?;
                    let orbit4 = orbit3.iter().map(|j| j.reversed()).collect::<Vec<_>>();
                    log::debug!("New ω3/ω4 orbit of size {}: {jump}", orbit3.len());
                    omega34.push(
                        orbit3
                            .iter()
                            .zip(orbit4.iter())
                            .flat_map(|(j3, j4)| [j3.clone(), j4.clone()])
                            .collect(),
                    );
                    omega3.push(orbit3);
                    omega4.push(orbit4);
                }
            }
        }
        Ok(Omega34Networks {
            omega34: self.with_indices(omega34)?,
            omega4: self.with_indices(omega4)?,
            omega3: self.with_indices(omega3)?,
        })
    }

    /// Expands a jump between states of the set into its orbit. Both ends must share the solute.
    ///
    /// Each image is recorded in `seen` and must itself join states of the set. With
    /// `reversible`, the reverse of every image joins the orbit too.
    fn pair_jump_orbit(
        &self,
        jump: &Jump<SdPair>,
        seen: &mut HashSet<Jump<SdPair>>,
        reversible: bool,
    ) -> Result<Vec<Jump<SdPair>>, anyhow::Error> {
        let mut orbit = vec![];
        for g in self.crystal().group() {
            let (state1, m1) = self.apply_group_op(g, &jump.state1)?;
            let (state2, m2) = self.apply_group_op(g, &jump.state2)?;
            let jnew = Jump::new(state1, state2, jump.c1 * m1, jump.c2 * m2)?;
            self.index_pair_jump(&jnew)?;
            if !seen.insert(jnew.clone()) {
                continue;
            }
            if reversible {
                let jrev = jnew.reversed();
                orbit.push(jnew);
                if seen.insert(jrev.clone()) {
                    orbit.push(jrev);
                }
            } else {
                orbit.push(jnew);
            }
        }
        Ok(orbit)
    }

    /// Pairs a network with its indexed form.
    fn with_indices(
        &self,
        jumpnetwork: JumpNetwork<SdPair>,
    ) -> Result<(JumpNetwork<SdPair>, IndexedJumpNetwork), anyhow::Error> {
        let indexed = jumpnetwork
            .iter()
            .map(|orbit| {
                orbit
                    .iter()
                    .map(|j| self.index_pair_jump(j))
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok((jumpnetwork, indexed))
    }
}
