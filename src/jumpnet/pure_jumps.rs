use std::collections::HashSet;

use anyhow;
use itertools::{iproduct, Itertools};
use log;
use nalgebra::Vector3;

use crate::collision::{collision_others, collision_self};
use crate::jumpnet::{
    index_jump, translation_shell, IndexedJump, IndexedJumpNetwork, JumpNetwork,
    JumpNetworkParams,
};
use crate::representations::{disp, DefectState, Dumbbell, Jump};
use crate::states::{DumbbellContainer, PureDumbbellStates, SymmetryClosureError};

impl<'a> PureDumbbellStates<'a> {
    /// Enumerates every symmetry-distinct jump between pure dumbbells no longer than the cutoff
    /// and expands each into its full orbit.
    ///
    /// Candidates start at an orientation listed in the origin cell and end at any listed
    /// orientation in a nearby cell. A candidate whose dumbbell centre does not move is a
    /// rotation; the atom that turns is then fixed at the `+1` end of the final dumbbell so that
    /// every rotation is counted once.
    ///
    /// # Arguments
    ///
    /// * `params` - Cutoffs controlling which jumps are admitted.
    ///
    /// # Returns
    ///
    /// The jump network and its indexed form, orbit by orbit.
    ///
    /// # Errors
    ///
    /// Errors if the parameters are invalid, or with a [`SymmetryClosureError`] if an image of an
    /// admitted jump leaves the orientation list.
    pub fn jumpnetwork(
        &self,
        params: &JumpNetworkParams,
    ) -> Result<(JumpNetwork<Dumbbell>, IndexedJumpNetwork), anyhow::Error> {
        params.validate()?;
        let crys = self.crystal();
        let chem = self.chem();
        let cutoff_sq = params.cutoff * params.cutoff;

        let mut seen: HashSet<Jump<Dumbbell>> = HashSet::new();
        let mut jumpnetwork: JumpNetwork<Dumbbell> = vec![];
        let mut indexed: IndexedJumpNetwork = vec![];
        for r in translation_shell(crys, params.cutoff)? {
            for ((i1, o1), (i2, o2)) in iproduct!(self.iorlist().iter(), self.iorlist().iter()) {
                let db1 = Dumbbell::new(*i1, *o1, Vector3::zeros());
                let db2 = Dumbbell::new(*i2, *o2, r);
                if db1 == db2 {
                    continue;
                }
                let dx_sq = disp(crys, chem, &db1, &db2)?.norm_squared();
                if dx_sq > cutoff_sq {
                    continue;
                }
                let indicators = if dx_sq <= crys.threshold() {
                    vec![(-1, 1), (1, 1)]
                } else {
                    iproduct!([-1, 1], [-1, 1]).collect_vec()
                };
                for (c1, c2) in indicators {
                    let jump = Jump::new(db1.clone(), db2.clone(), c1, c2)?;
                    if seen.contains(&jump)
                        || collision_self(
                            crys,
                            chem,
                            &jump,
                            params.solv_solv_cut,
                            params.solv_solv_cut,
                        )?
                        || collision_others(crys, chem, &jump, &params.closest_distance)?
                    {
                        continue;
                    }
                    let (orbit, indexed_orbit) = self.jump_orbit(&jump, &mut seen)?;
                    log::debug!("New pure jump orbit of size {}: {jump}", orbit.len());
                    jumpnetwork.push(orbit);
                    indexed.push(indexed_orbit);
                }
            }
        }
        Ok((jumpnetwork, indexed))
    }

    /// Expands one jump into its orbit, recording every image and its reverse in `seen`.
    fn jump_orbit(
        &self,
        jump: &Jump<Dumbbell>,
        seen: &mut HashSet<Jump<Dumbbell>>,
    ) -> Result<(Vec<Jump<Dumbbell>>, Vec<IndexedJump>), anyhow::Error> {
        let mut orbit = vec![];
        let mut indexed_orbit = vec![];
        for g in self.crystal().group() {
            let (db1, m1) = self.apply_group_op(g, &jump.state1)?;
            let (db2, m2) = self.apply_group_op(g, &jump.state2)?;
            let shift = -db1.r;
            let jnew = Jump::new(
                db1.translated(&shift),
                db2.translated(&shift),
                jump.c1 * m1,
                jump.c2 * m2,
            )?;
            if !seen.insert(jnew.clone()) {
                continue;
            }
            let jrev = jnew.reversed().translated(&-jnew.state2.r);
            if jrev.state1.r != Vector3::zeros() {
                return Err(SymmetryClosureError(format!(
                    "the reverse of `{jnew}` does not start in the origin cell."
                ))
                .into());
            }
            indexed_orbit.push(index_jump(self, &jnew)?);
            orbit.push(jnew);
            if seen.insert(jrev.clone()) {
                indexed_orbit.push(index_jump(self, &jrev)?);
                orbit.push(jrev);
            }
        }
        Ok((orbit, indexed_orbit))
    }
}
