//! Expansions of biases and rates on the vector-star basis.

use anyhow::{self, ensure};
use ndarray::{Array2, Array3};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::auxiliary::geometry::outer;
use crate::jumpnet::{IndexedJumpNetwork, JumpNetwork};
use crate::representations::{DefectState, Jump, SdPair};
use crate::vector_stars::VectorStars;

// ==================
// Struct definitions
// ==================

/// The expansion of one kind of bias, split between the two species.
///
/// Row `i` belongs to a vector star and column `k` to a jump orbit. For rates `w` indexed by
/// jump orbit, the bias of species $`\alpha`$ at the state in position `n` of vector star `i` is
/// $`\sum_i (\mathbf{B}_\alpha \mathbf{w})_i\, \mathbf{v}_{i,n}`$, summed over the vector stars
/// containing that state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BiasExpansion {
    pub solute: Array2<f64>,
    pub solvent: Array2<f64>,
}

impl BiasExpansion {
    fn zeros(shape: (usize, usize)) -> Self {
        Self {
            solute: Array2::zeros(shape),
            solvent: Array2::zeros(shape),
        }
    }

    fn add(&mut self, ij: [usize; 2], solute: f64, solvent: f64) {
        self.solute[ij] += solute;
        self.solvent[ij] += solvent;
    }
}

/// The bias expansions of every jump mechanism.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BiasExpansions {
    /// Bare-dumbbell jumps, on complex vector stars. Columns follow the bare-dumbbell orbits.
    pub bias0: BiasExpansion,

    /// Complex-to-complex jumps, on complex vector stars.
    pub bias1: BiasExpansion,

    /// Mixed-to-mixed jumps, on mixed vector stars.
    pub bias2: BiasExpansion,

    /// Mixed-to-complex jumps, on mixed vector stars. Columns follow the combined ω3/ω4 orbits.
    pub bias3: BiasExpansion,

    /// Complex-to-mixed jumps, on complex vector stars. Columns follow the combined ω3/ω4 orbits.
    pub bias4: BiasExpansion,
}

/// The rate expansions of every jump mechanism. Entry `[i, j, k]` accumulates
/// $`\mathbf{v}_i \cdot \mathbf{v}_j`$ over the jumps of orbit `k` leaving a state of vector
/// star `i` for a state of vector star `j`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RateExpansions {
    /// Complex to complex, by bare-dumbbell orbit.
    pub rate0: Array3<f64>,

    /// Complex to complex, by ω1 orbit.
    pub rate1: Array3<f64>,

    /// Mixed to mixed. Both indices count from the first mixed vector star.
    pub rate2: Array3<f64>,

    /// Mixed to complex. The first index counts from the first mixed vector star.
    pub rate3: Array3<f64>,

    /// Complex to mixed. The second index counts from the first mixed vector star.
    pub rate4: Array3<f64>,
}

impl<'a> VectorStars<'a> {
    /// Expands the bias of every state on the vector-star basis, for every jump mechanism.
    ///
    /// Contributions are collected from the jumps leaving the representative state of each
    /// vector star and scaled by the star size, which undoes the normalisation of the basis
    /// vectors. Where the two species move differently, the displacement of the dumbbell centre
    /// is apportioned with the half-orientation lever arm:
    ///
    /// | Mechanism | Solute                                   | Solvent                                 |
    /// |-----------|------------------------------------------|-----------------------------------------|
    /// | ω0, ω1    | $`0`$                                    | $`\Delta\mathbf{x}`$                    |
    /// | ω2        | $`\Delta\mathbf{x} + (\mathbf{o}_2 - \mathbf{o}_1)/2`$ | $`\Delta\mathbf{x} - (\mathbf{o}_2 - \mathbf{o}_1)/2`$ |
    /// | ω3        | $`-\mathbf{o}_1/2`$                      | $`\Delta\mathbf{x} + \mathbf{o}_1/2`$   |
    /// | ω4        | $`\mathbf{o}_2/2`$                       | $`\Delta\mathbf{x} - \mathbf{o}_2/2`$   |
    ///
    /// # Arguments
    ///
    /// * `jnet1` - The complex-to-complex network.
    /// * `jnet2` - The mixed-to-mixed network.
    /// * `jumptype` - The bare-dumbbell orbit of every orbit of `jnet1`.
    /// * `jnet34` - The combined mixed/complex network.
    pub fn biasexpansion(
        &self,
        jnet1: &JumpNetwork<SdPair>,
        jnet2: &JumpNetwork<SdPair>,
        jumptype: &[usize],
        jnet34: &JumpNetwork<SdPair>,
    ) -> Result<BiasExpansions, anyhow::Error> {
        let n0 = self.check_jumptype(jnet1, jumptype)?;
        let crys = self.starset().crystal();
        let chem = self.starset().chem();
        let nvp = self.nvstars_pure();
        let nvm = self.nvstars() - nvp;

        let mut bias0 = BiasExpansion::zeros((nvp, n0));
        let mut bias1 = BiasExpansion::zeros((nvp, jnet1.len()));
        let mut bias4 = BiasExpansion::zeros((nvp, jnet34.len()));
        for i in 0..nvp {
            let (rep, v0, nstates) = self.representative(i);
            for (k, (orbit, &jt)) in jnet1.iter().zip(jumptype.iter()).enumerate() {
                for jump in orbit.iter().filter(|j| self.starts_at(j, rep)) {
                    let b = v0.dot(&jump.displacement(crys, chem)?) * nstates;
                    bias1.add([i, k], 0.0, b);
                    bias0.add([i, jt], 0.0, b);
                }
            }
            for (k, orbit) in jnet34.iter().enumerate() {
                for jump in orbit
                    .iter()
                    .filter(|j| !j.state1.is_mixed() && self.starts_at(j, rep))
                {
                    let dx = jump.displacement(crys, chem)?;
                    let lever = jump.state2.db.o * 0.5;
                    bias4.add(
                        [i, k],
                        v0.dot(&lever) * nstates,
                        v0.dot(&(dx - lever)) * nstates,
                    );
                }
            }
        }

        let mut bias2 = BiasExpansion::zeros((nvm, jnet2.len()));
        let mut bias3 = BiasExpansion::zeros((nvm, jnet34.len()));
        for i in nvp..self.nvstars() {
            let (rep, v0, nstates) = self.representative(i);
            for (k, orbit) in jnet2.iter().enumerate() {
                for jump in orbit.iter().filter(|j| self.starts_at(j, rep)) {
                    let dx = jump.displacement(crys, chem)?;
                    let lever = (jump.state2.db.o - jump.state1.db.o) * 0.5;
                    bias2.add(
                        [i - nvp, k],
                        v0.dot(&(dx + lever)) * nstates,
                        v0.dot(&(dx - lever)) * nstates,
                    );
                }
            }
            for (k, orbit) in jnet34.iter().enumerate() {
                for jump in orbit
                    .iter()
                    .filter(|j| j.state1.is_mixed() && self.starts_at(j, rep))
                {
                    let dx = jump.displacement(crys, chem)?;
                    let lever = jump.state1.db.o * 0.5;
                    bias3.add(
                        [i - nvp, k],
                        -v0.dot(&lever) * nstates,
                        v0.dot(&(dx + lever)) * nstates,
                    );
                }
            }
        }
        Ok(BiasExpansions {
            bias0,
            bias1,
            bias2,
            bias3,
            bias4,
        })
    }

    /// Expands the rate matrix on the vector-star basis, for every jump mechanism.
    ///
    /// Mixed-to-mixed jumps end in another cell; their final state is brought back to the
    /// origin cell before it is located. The ω3 entries are read off the ω4 jumps, which share
    /// their transition states.
    ///
    /// # Arguments
    ///
    /// * `jnet1` - The complex-to-complex network.
    /// * `jnet2` - The mixed-to-mixed network.
    /// * `jumptype` - The bare-dumbbell orbit of every orbit of `jnet1`.
    /// * `jnet34` - The combined mixed/complex network.
    pub fn rateexpansion(
        &self,
        jnet1: &JumpNetwork<SdPair>,
        jnet2: &JumpNetwork<SdPair>,
        jumptype: &[usize],
        jnet34: &JumpNetwork<SdPair>,
    ) -> Result<RateExpansions, anyhow::Error> {
        let n0 = self.check_jumptype(jnet1, jumptype)?;
        let nvp = self.nvstars_pure();
        let nvm = self.nvstars() - nvp;

        let mut rate0 = Array3::<f64>::zeros((nvp, nvp, n0));
        let mut rate1 = Array3::<f64>::zeros((nvp, nvp, jnet1.len()));
        for (k, (orbit, &jt)) in jnet1.iter().zip(jumptype.iter()).enumerate() {
            for jump in orbit.iter() {
                for (i, j, d) in self.overlaps(&jump.state1, &jump.state2)? {
                    if i < nvp && j < nvp {
                        rate1[[i, j, k]] += d;
                        rate0[[i, j, jt]] += d;
                    }
                }
            }
        }

        let mut rate3 = Array3::<f64>::zeros((nvm, nvp, jnet34.len()));
        let mut rate4 = Array3::<f64>::zeros((nvp, nvm, jnet34.len()));
        for (k, orbit) in jnet34.iter().enumerate() {
            for jump in orbit.iter().filter(|j| !j.state1.is_mixed()) {
                for (i, j, d) in self.overlaps(&jump.state1, &jump.state2)? {
                    if i < nvp && j >= nvp {
                        rate4[[i, j - nvp, k]] += d;
                        rate3[[j - nvp, i, k]] += d;
                    }
                }
            }
        }

        let mut rate2 = Array3::<f64>::zeros((nvm, nvm, jnet2.len()));
        for (k, orbit) in jnet2.iter().enumerate() {
            for jump in orbit.iter() {
                let state2 = jump.state2.translated(&-jump.state2.r_s);
                for (i, j, d) in self.overlaps(&jump.state1, &state2)? {
                    if i >= nvp && j >= nvp {
                        rate2[[i - nvp, j - nvp, k]] += d;
                    }
                }
            }
        }
        Ok(RateExpansions {
            rate0,
            rate1,
            rate2,
            rate3,
            rate4,
        })
    }

    /// Expands the bare diffusivity on the jump orbits.
    ///
    /// # Arguments
    ///
    /// * `jnet1_indexed` - The indexed complex-to-complex network.
    /// * `jumptype` - The bare-dumbbell orbit of every orbit of `jnet1_indexed`.
    ///
    /// # Returns
    ///
    /// The $`3 \times 3`$ contributions $`\sum \tfrac{1}{2}\Delta\mathbf{x}\otimes\Delta\mathbf{x}`$
    /// of every orbit, accumulated by bare-dumbbell orbit and by ω1 orbit along the last axis.
    pub fn bareexpansion(
        &self,
        jnet1_indexed: &IndexedJumpNetwork,
        jumptype: &[usize],
    ) -> Result<(Array3<f64>, Array3<f64>), anyhow::Error> {
        let n0 = self.starset().jnet0().0.len();
        ensure!(
            jnet1_indexed.len() == jumptype.len(),
            "{} jump types were given for {} jump orbits.",
            jumptype.len(),
            jnet1_indexed.len()
        );
        let mut d0 = Array3::<f64>::zeros((3, 3, n0));
        let mut d1 = Array3::<f64>::zeros((3, 3, jnet1_indexed.len()));
        for (k, (orbit, &jt)) in jnet1_indexed.iter().zip(jumptype.iter()).enumerate() {
            ensure!(jt < n0, "Jump type {jt} does not name a bare-dumbbell orbit.");
            let dd = orbit
                .iter()
                .map(|(_, dx)| outer(dx, dx) * 0.5)
                .sum::<nalgebra::Matrix3<f64>>();
            for (a, b) in itertools::iproduct!(0..3, 0..3) {
                d0[[a, b, jt]] += dd[(a, b)];
                d1[[a, b, k]] += dd[(a, b)];
            }
        }
        Ok((d0, d1))
    }

    /// Returns the index of the representative state of a vector star, its basis vector there
    /// and the size of its star.
    fn representative(&self, i: usize) -> (usize, &Vector3<f64>, f64) {
        let states = &self.vecpos()[i];
        (states[0], &self.vecvec()[i][0], states.len() as f64)
    }

    fn starts_at(&self, jump: &Jump<SdPair>, idx: usize) -> bool {
        self.starset().state_index(&jump.state1) == Some(idx)
    }

    /// Returns $`(i, j, \mathbf{v}_{i} \cdot \mathbf{v}_{j})`$ for every pair of vector stars
    /// `i` containing `state1` and `j` containing `state2`.
    fn overlaps(
        &self,
        state1: &SdPair,
        state2: &SdPair,
    ) -> Result<Vec<(usize, usize, f64)>, anyhow::Error> {
        let idx1 = self.starset().locate(state1)?;
        let idx2 = self.starset().locate(state2)?;
        Ok(itertools::iproduct!(
            self.statetovecstar[idx1].iter(),
            self.statetovecstar[idx2].iter()
        )
        .map(|(&(i, p), &(j, q))| (i, j, self.vecvec()[i][p].dot(&self.vecvec()[j][q])))
        .collect())
    }

    /// Checks that every orbit of an ω1 network has a bare-dumbbell type, and returns the number
    /// of bare-dumbbell orbits.
    fn check_jumptype(
        &self,
        jnet1: &JumpNetwork<SdPair>,
        jumptype: &[usize],
    ) -> Result<usize, anyhow::Error> {
        let n0 = self.starset().jnet0().0.len();
        ensure!(
            jnet1.len() == jumptype.len(),
            "{} jump types were given for {} jump orbits.",
            jumptype.len(),
            jnet1.len()
        );
        ensure!(
            jumptype.iter().all(|&jt| jt < n0),
            "Some jump types do not name one of the {n0} bare-dumbbell orbits."
        );
        Ok(n0)
    }
}
