//! Symmetry-closed networks of jumps between dumbbell states.
//!
//! A jump network is a list of orbits. Each orbit collects every image of one representative
//! jump under the space group, translated so that the jump starts in the origin cell, together
//! with the reverse of every such image. The indexed form of a network replaces each jump by the
//! indices of its endpoint orientations in the governing state container and its Cartesian
//! displacement.

use std::fmt;

use anyhow::{self, bail, format_err};
use derive_builder::Builder;
use itertools::iproduct;
use nalgebra::Vector3;
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::collision::ClosestDistance;
use crate::crystal::Crystal;
use crate::representations::{disp, DefectState, Jump};
use crate::states::{DumbbellContainer, SymmetryClosureError};

mod mixed_jumps;
mod pure_jumps;


/// A list of jump orbits.
pub type JumpNetwork<S> = Vec<Vec<Jump<S>>>;

/// A jump reduced to the orientation-list indices of its endpoints and its Cartesian
/// displacement.
pub type IndexedJump = ((usize, usize), Vector3<f64>);

/// A list of orbits of indexed jumps, parallel to a [`JumpNetwork`].
pub type IndexedJumpNetwork = Vec<Vec<IndexedJump>>;

// ==================
// Struct definitions
// ==================

/// A structure containing control parameters for jump-network construction.
#[derive(Clone, Builder, Debug, Serialize, Deserialize)]
pub struct JumpNetworkParams {
    /// The largest allowed displacement of the dumbbell centre.
    pub cutoff: f64,

    /// The smallest allowed separation between two solvent atoms along a jump path.
    #[builder(default = "0.0")]
    #[serde(default)]
    pub solv_solv_cut: f64,

    /// The smallest allowed separation between a solute and a solvent atom along a jump path.
    #[builder(default = "0.0")]
    #[serde(default)]
    pub solt_solv_cut: f64,

    /// The smallest allowed approach of the moving atom to any other lattice site.
    #[builder(default = "ClosestDistance::Uniform(0.0)")]
    #[serde(default)]
    pub closest_distance: ClosestDistance,
}

impl JumpNetworkParams {
    /// Returns a builder to construct a [`JumpNetworkParams`] structure.
    pub fn builder() -> JumpNetworkParamsBuilder {
        JumpNetworkParamsBuilder::default()
    }

    /// Checks that the distances are usable.
    pub(crate) fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.cutoff.is_finite() || self.cutoff <= 0.0 {
            bail!("The jump cutoff must be positive, but `{}` was given.", self.cutoff);
        }
        if self.solv_solv_cut < 0.0 || self.solt_solv_cut < 0.0 {
            bail!(
                "Collision cutoffs must not be negative, but `{}` and `{}` were given.",
                self.solv_solv_cut,
                self.solt_solv_cut
            );
        }
        Ok(())
    }
}

impl fmt::Display for JumpNetworkParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Jump cutoff: {:.6}", self.cutoff)?;
        writeln!(f, "Solvent-solvent collision cutoff: {:.6}", self.solv_solv_cut)?;
        writeln!(f, "Solute-solvent collision cutoff: {:.6}", self.solt_solv_cut)?;
        writeln!(f, "Closest approach to other sites: {}", self.closest_distance)?;
        Ok(())
    }
}

// =========
// Functions
// =========

/// Returns every lattice translation that can host the end of a jump no longer than `cutoff`
/// starting in the origin cell.
///
/// Along lattice direction $`a`$ the search extends to
/// $`n_a = \lceil \text{cutoff} / \sqrt{M_{aa}} \rceil + 1`$ cells either side, where
/// $`\mathbf{M}`$ is the metric tensor.
pub(crate) fn translation_shell(
    crys: &Crystal,
    cutoff: f64,
) -> Result<Vec<Vector3<i32>>, anyhow::Error> {
    let nmax = (0..3)
        .map(|a| {
            ((cutoff / crys.metric()[(a, a)].sqrt()).ceil() + 1.0)
                .to_i32()
                .ok_or_else(|| format_err!("Unable to bound the translation shell along axis {a}."))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(iproduct!(
        -nmax[0]..=nmax[0],
        -nmax[1]..=nmax[1],
        -nmax[2]..=nmax[2]
    )
    .map(|(n0, n1, n2)| Vector3::new(n0, n1, n2))
    .collect())
}

/// Reduces a jump to its indexed form against a state container.
///
/// # Errors
///
/// Errors with a [`SymmetryClosureError`] if either endpoint orientation is not listed.
pub(crate) fn index_jump<C, S>(container: &C, jump: &Jump<S>) -> Result<IndexedJump, anyhow::Error>
where
    C: DumbbellContainer,
    S: DefectState,
{
    let locate = |state: &S| {
        let db = state.dumbbell();
        container.index_of(db.i, &db.o).ok_or_else(|| {
            SymmetryClosureError(format!(
                "state `{state}` of jump `{jump}` is not in the orientation list."
            ))
        })
    };
    let dx = disp(container.crystal(), container.chem(), &jump.state1, &jump.state2)?;
    Ok(((locate(&jump.state1)?, locate(&jump.state2)?), dx))
}
