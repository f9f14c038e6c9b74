//! Symmetry-adapted vector bases over the stars of a [`StarSet`].
//!
//! A vector star pairs a star with one Cartesian direction that every operation of the
//! representative state's stabiliser leaves unchanged. The direction is transported to each state
//! of the star by an operation mapping the representative onto that state, so that the vectors of
//! a vector star form one basis function of the bias vector field over the star. Vector fields
//! that share the symmetry of the crystal, such as the bias of every state, expand exactly on
//! these basis functions.

use std::fmt;

use anyhow;
use approx;
use log;
use nalgebra::{Matrix3, SymmetricEigen, Vector3};

use crate::crystal::GroupOp;
use crate::io::format::write_subtitle;
use crate::representations::SdPair;
use crate::stars::StarSet;
use crate::states::SymmetryClosureError;

mod expansions;

pub use expansions::{BiasExpansion, BiasExpansions, RateExpansions};


/// The tolerance within which an eigenvalue of an averaged stabiliser rotation counts as one.
const INVARIANT_THRESHOLD: f64 = 1.0e-6;

// ==================
// Struct definitions
// ==================

/// The vector stars of a star set: those of complexes first, then those of mixed dumbbells.
#[derive(Clone, Debug)]
pub struct VectorStars<'a> {
    starset: &'a StarSet<'a>,

    /// For every vector star, the states of its star as indices into [`StarSet::states`],
    /// representative first.
    vecpos: Vec<Vec<usize>>,

    /// For every vector star, the basis vector at each state of [`Self::vecpos`].
    vecvec: Vec<Vec<Vector3<f64>>>,

    /// The number of vector stars built on complexes.
    nvstars_pure: usize,

    /// For every state, the vector stars it belongs to and its position within each.
    statetovecstar: Vec<Vec<(usize, usize)>>,
}

impl<'a> VectorStars<'a> {
    /// Builds the vector stars of every star in a star set.
    ///
    /// The stabiliser of a complex contains the operations that map it onto itself with its
    /// dumbbell possibly reversed. The stabiliser of a mixed dumbbell contains only the
    /// operations that map it onto itself exactly. Invariant directions are the eigenvectors of
    /// the stabiliser-averaged rotation with eigenvalue one, and are scaled by
    /// $`1/\sqrt{N}`$ for a star of $`N`$ states.
    ///
    /// # Errors
    ///
    /// Errors with a [`SymmetryClosureError`] if some state of a star cannot be reached from its
    /// representative.
    pub fn new(starset: &'a StarSet<'a>) -> Result<Self, anyhow::Error> {
        let mut vecpos: Vec<Vec<usize>> = vec![];
        let mut vecvec: Vec<Vec<Vector3<f64>>> = vec![];
        let (complex_stars, mixed_stars) = starset.stars().split_at(starset.mixedstartindex());
        for star in complex_stars.iter() {
            Self::add_star(starset, star, &mut vecpos, &mut vecvec)?;
        }
        let nvstars_pure = vecpos.len();
        for star in mixed_stars.iter() {
            Self::add_star(starset, star, &mut vecpos, &mut vecvec)?;
        }

        let mut statetovecstar = vec![vec![]; starset.states().len()];
        for (i, states) in vecpos.iter().enumerate() {
            for (p, &idx) in states.iter().enumerate() {
                statetovecstar[idx].push((i, p));
            }
        }
        log::debug!(
            "{} vector stars, {} of which are built on complexes.",
            vecpos.len(),
            nvstars_pure
        );
        Ok(Self {
            starset,
            vecpos,
            vecvec,
            nvstars_pure,
            statetovecstar,
        })
    }

    /// Appends the vector stars of one star.
    fn add_star(
        starset: &StarSet,
        star: &[usize],
        vecpos: &mut Vec<Vec<usize>>,
        vecvec: &mut Vec<Vec<Vector3<f64>>>,
    ) -> Result<(), anyhow::Error> {
        let crys = starset.crystal();
        let rep = &starset.states()[star[0]];
        let mut stabiliser: Vec<&GroupOp> = vec![];
        let mut transport: Vec<Option<&GroupOp>> = vec![None; star.len()];
        for g in crys.group() {
            let (image, _) = starset.apply_group_op(g, rep)?;
            let image_idx = starset.locate(&image)?;
            if image_idx == star[0] {
                stabiliser.push(g);
            }
            if let Some(pos) = star.iter().position(|&idx| idx == image_idx) {
                if transport[pos].is_none() {
                    transport[pos] = Some(g);
                }
            }
        }
        let transport = transport
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| {
                SymmetryClosureError(format!(
                    "some state of the star of `{rep}` cannot be reached from it."
                ))
            })?;

        let scale = 1.0 / (star.len() as f64).sqrt();
        for v in invariant_directions(&stabiliser) {
            let v = v * scale;
            vecpos.push(star.to_vec());
            vecvec.push(transport.iter().map(|g| crys.g_direc(g, &v)).collect());
        }
        Ok(())
    }

    /// Returns the star set the vector stars are built on.
    pub fn starset(&self) -> &StarSet<'a> {
        self.starset
    }

    pub fn vecpos(&self) -> &[Vec<usize>] {
        &self.vecpos
    }

    pub fn vecvec(&self) -> &[Vec<Vector3<f64>>] {
        &self.vecvec
    }

    /// Returns the total number of vector stars.
    pub fn nvstars(&self) -> usize {
        self.vecpos.len()
    }

    /// Returns the number of vector stars built on complexes. These come first.
    pub fn nvstars_pure(&self) -> usize {
        self.nvstars_pure
    }

    /// Returns the vector stars containing a state, each with the position of the state within
    /// it.
    pub fn state_to_vecstar(&self, pair: &SdPair) -> Option<&[(usize, usize)]> {
        self.starset
            .state_index(pair)
            .map(|idx| self.statetovecstar[idx].as_slice())
    }
}

impl<'a> fmt::Display for VectorStars<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_subtitle(f, "Vector stars")?;
        writeln!(
            f,
            "Vector stars on complexes: {}\nVector stars on mixed dumbbells: {}",
            self.nvstars_pure,
            self.nvstars() - self.nvstars_pure
        )?;
        writeln!(f)?;
        writeln!(f, "{:>6}  {:>5}  Representative basis vector", "Vstar", "Size")?;
        for (i, (states, vectors)) in self.vecpos.iter().zip(self.vecvec.iter()).enumerate() {
            writeln!(
                f,
                "{i:>6}  {:>5}  ({:+.6}, {:+.6}, {:+.6})",
                states.len(),
                vectors[0][0],
                vectors[0][1],
                vectors[0][2]
            )?;
        }
        Ok(())
    }
}

// =========
// Functions
// =========

/// Returns an orthonormal basis of the directions left unchanged by every operation of a group.
///
/// The stabiliser average $`\bar{\mathbf{R}} = |H|^{-1}\sum_{h \in H} \mathbf{R}_h`$ is the
/// orthogonal projector onto the invariant subspace, so its eigenvectors of eigenvalue one span
/// that subspace.
fn invariant_directions(stabiliser: &[&GroupOp]) -> Vec<Vector3<f64>> {
    if stabiliser.is_empty() {
        return vec![];
    }
    let avg = stabiliser
        .iter()
        .fold(Matrix3::<f64>::zeros(), |acc, g| acc + g.cartrot())
        / stabiliser.len() as f64;
    let eig = SymmetricEigen::new((avg + avg.transpose()) * 0.5);
    eig.eigenvalues
        .iter()
        .enumerate()
        .filter(|(_, lambda)| {
            approx::relative_eq!(
                **lambda,
                1.0,
                epsilon = INVARIANT_THRESHOLD,
                max_relative = INVARIANT_THRESHOLD
            )
        })
        .map(|(k, _)| eig.eigenvectors.column(k).into_owned())
        .collect()
}
