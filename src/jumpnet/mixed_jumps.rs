use std::collections::HashSet;

use anyhow;
use itertools::iproduct;
use log;
use nalgebra::Vector3;

use crate::collision::{collision_others, collision_self};
use crate::jumpnet::{
    index_jump, translation_shell, IndexedJump, IndexedJumpNetwork, JumpNetwork,
    JumpNetworkParams,
};
use crate::representations::{disp, Dumbbell, Jump, SdPair};
use crate::states::{DumbbellContainer, MixedDumbbellStates, SymmetryClosureError};

impl<'a> MixedDumbbellStates<'a> {
    /// Enumerates every symmetry-distinct jump of a mixed dumbbell no longer than the cutoff and
    /// expands each into its full orbit.
    ///
    /// The moving atom is always the solute, which leaves from the `+1` end of the initial
    /// dumbbell and arrives at the `+1` end of the final one, so every jump carries indicators
    /// $`c_1 = c_2 = 1`$ and both of its endpoints are mixed dumbbells.
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
    ) -> Result<(JumpNetwork<SdPair>, IndexedJumpNetwork), anyhow::Error> {
        params.validate()?;
        let crys = self.crystal();
        let chem = self.chem();
        let cutoff_sq = params.cutoff * params.cutoff;

        let mut seen: HashSet<Jump<SdPair>> = HashSet::new();
        let mut jumpnetwork: JumpNetwork<SdPair> = vec![];
        let mut indexed: IndexedJumpNetwork = vec![];
        for r in translation_shell(crys, params.cutoff)? {
            for ((i1, o1), (i2, o2)) in iproduct!(self.iorlist().iter(), self.iorlist().iter()) {
                let p1 = SdPair::mixed(*i1, *o1);
                let p2 = SdPair::new(*i2, r, Dumbbell::new(*i2, *o2, r));
                if p1 == p2 {
                    continue;
                }
                if disp(crys, chem, &p1, &p2)?.norm_squared() > cutoff_sq {
                    continue;
                }
                let jump = Jump::new(p1, p2, 1, 1)?;
                if seen.contains(&jump)
                    || collision_self(
                        crys,
                        chem,
                        &jump,
                        params.solt_solv_cut,
                        params.solt_solv_cut,
                    )?
                    || collision_others(crys, chem, &jump, &params.closest_distance)?
                {
                    continue;
                }
                let (orbit, indexed_orbit) = self.jump_orbit(&jump, &mut seen)?;
                log::debug!("New mixed jump orbit of size {}: {jump}", orbit.len());
                jumpnetwork.push(orbit);
                indexed.push(indexed_orbit);
            }
        }
        Ok((jumpnetwork, indexed))
    }

    /// Expands one mixed jump into its orbit, recording every image and its reverse in `seen`.
    fn jump_orbit(
        &self,
        jump: &Jump<SdPair>,
        seen: &mut HashSet<Jump<SdPair>>,
    ) -> Result<(Vec<Jump<SdPair>>, Vec<IndexedJump>), anyhow::Error> {
        let crys = self.crystal();
        let chem = self.chem();
        let mut orbit = vec![];
        let mut indexed_orbit = vec![];
        for g in crys.group() {
            let jimage = jump.gop(crys, chem, g)?;
            let jnew = jimage.translated(&-jimage.state1.r_s);
            if !self.check_in_list(&jnew.state1)? || !self.check_in_list(&jnew.state2)? {
                return Err(SymmetryClosureError(format!(
                    "the image `{jnew}` of mixed jump `{jump}` leaves the orientation list."
                ))
                .into());
            }
            if !seen.insert(jnew.clone()) {
                continue;
            }
            let jrev = reverse_mixed_jump(&jnew)?;
            if jrev.state1.r_s != Vector3::zeros() {
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

/// Runs a mixed-dumbbell jump backwards, re-anchored so that the reversed jump starts in the cell
/// where the forward one did.
fn reverse_mixed_jump(jump: &Jump<SdPair>) -> Result<Jump<SdPair>, anyhow::Error> {
    let (p1, p2) = (&jump.state1, &jump.state2);
    let p1neg = SdPair::new(
        p2.i_s,
        p1.r_s,
        Dumbbell::new(p2.db.i, p2.db.o, p1.db.r),
    );
    let p2neg = SdPair::new(
        p1.i_s,
        p1.r_s * 2 - p2.r_s,
        Dumbbell::new(p1.db.i, p1.db.o, p1.db.r * 2 - p2.db.r),
    );
    Jump::new(p1neg, p2neg, 1, 1)
}
