//! Periodic crystals and their space-group operations.
//!
//! A [`Crystal`] holds a lattice, one or more sublattices ("chemistries") of fractional basis
//! positions, and the full list of space-group operations that map the decorated lattice onto
//! itself. Everything downstream only consumes the position and direction actions of these
//! operations, so no attempt is made at classifying the group.

use std::fmt;

use anyhow::{self, bail, format_err};
use approx;
use itertools::Itertools;
use log;
use nalgebra::{Matrix3, Vector3};
use num_traits::ToPrimitive;

pub mod template_crystals;


// ==================
// Struct definitions
// ==================

/// A structure representing one space-group operation $`\{\mathbf{R} | \mathbf{t}\}`$ of a
/// crystal.
///
/// The operation maps a fractional position $`\mathbf{u}`$ onto
/// $`\mathbf{R}\mathbf{u} + \mathbf{t}`$.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupOp {
    /// The integer rotation matrix acting on fractional coordinates.
    rot: Matrix3<i32>,

    /// The fractional translation, wrapped into the unit cell.
    trans: Vector3<f64>,

    /// The rotation matrix acting on Cartesian vectors.
    cartrot: Matrix3<f64>,

    /// For each chemistry, the image site index of every basis site.
    indexmap: Vec<Vec<usize>>,

    /// For each chemistry, the lattice translation picked up by every basis site under this
    /// operation.
    shifts: Vec<Vec<Vector3<i32>>>,
}

impl GroupOp {
    /// Returns the integer rotation matrix acting on fractional coordinates.
    pub fn rot(&self) -> &Matrix3<i32> {
        &self.rot
    }

    /// Returns the fractional translation.
    pub fn trans(&self) -> &Vector3<f64> {
        &self.trans
    }

    /// Returns the rotation matrix acting on Cartesian vectors.
    pub fn cartrot(&self) -> &Matrix3<f64> {
        &self.cartrot
    }

    /// Returns the site permutation induced on every chemistry.
    pub fn indexmap(&self) -> &Vec<Vec<usize>> {
        &self.indexmap
    }

    /// Returns `true` if this is the identity operation.
    pub fn is_identity(&self, thresh: f64) -> bool {
        self.rot == Matrix3::identity() && self.trans.iter().all(|t| t.abs() < thresh)
    }
}

/// A structure representing a periodic crystal with its space group.
#[derive(Clone, Debug)]
pub struct Crystal {
    /// The lattice vectors, stored as the columns of the matrix.
    lattice: Matrix3<f64>,

    /// The inverse of [`Self::lattice`].
    invlattice: Matrix3<f64>,

    /// The fractional basis positions for each chemistry, wrapped into the unit cell.
    basis: Vec<Vec<Vector3<f64>>>,

    /// The names of the chemistries.
    chemistry: Vec<String>,

    /// The metric tensor $`\mathbf{L}^{\mathsf{T}}\mathbf{L}`$.
    metric: Matrix3<f64>,

    /// A threshold for approximate equality comparisons of fractional coordinates.
    threshold: f64,

    /// The space-group operations, with the identity first.
    group: Vec<GroupOp>,
}

impl Crystal {
    /// Constructs a crystal and determines its space group.
    ///
    /// # Arguments
    ///
    /// * `lattice` - The lattice vectors as the columns of a matrix.
    /// * `basis` - For each chemistry, the fractional coordinates of its basis sites.
    /// * `chemistry` - The names of the chemistries, parallel to `basis`.
    /// * `threshold` - A threshold for approximate equality comparisons.
    ///
    /// # Returns
    ///
    /// The constructed crystal, or an error if the inputs are inconsistent.
    pub fn new(
        lattice: Matrix3<f64>,
        basis: Vec<Vec<Vector3<f64>>>,
        chemistry: Vec<String>,
        threshold: f64,
    ) -> Result<Self, anyhow::Error> {
        if threshold <= 0.0 {
            bail!("The crystal threshold must be positive, but `{threshold}` was given.");
        }
        if basis.is_empty() || basis.iter().any(|sites| sites.is_empty()) {
            bail!("Every chemistry of a crystal must contain at least one basis site.");
        }
        if basis.len() != chemistry.len() {
            bail!(
                "Mismatched numbers of chemistries ({}) and basis lists ({}).",
                chemistry.len(),
                basis.len()
            );
        }
        let invlattice = lattice
            .try_inverse()
            .filter(|_| lattice.determinant().abs() > threshold)
            .ok_or_else(|| format_err!("The lattice vectors are linearly dependent."))?;
        let basis = basis
            .into_iter()
            .map(|sites| {
                sites
                    .into_iter()
                    .map(|u| wrap_fractional(&u, threshold))
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();
        for (chem, sites) in basis.iter().enumerate() {
            if sites
                .iter()
                .tuple_combinations()
                .any(|(u1, u2)| lattice_shift(u1, u2, threshold).is_some())
            {
                bail!("Chemistry `{}` contains coincident basis sites.", chemistry[chem]);
            }
        }
        let metric = lattice.transpose() * lattice;

        let mut crys = Crystal {
            lattice,
            invlattice,
            basis,
            chemistry,
            metric,
            threshold,
            group: vec![],
        };
        crys.group = crys.generate_group()?;
        log::debug!(
            "Crystal with {} chemistries has a space group of order {}.",
            crys.basis.len(),
            crys.group.len()
        );
        Ok(crys)
    }

    /// Returns the lattice vectors as matrix columns.
    pub fn lattice(&self) -> &Matrix3<f64> {
        &self.lattice
    }

    /// Returns the inverse of the lattice matrix, mapping Cartesian positions onto fractional ones.
    pub fn invlattice(&self) -> &Matrix3<f64> {
        &self.invlattice
    }

    /// Returns the fractional basis positions of every chemistry.
    pub fn basis(&self) -> &Vec<Vec<Vector3<f64>>> {
        &self.basis
    }

    /// Returns the chemistry names.
    pub fn chemistry(&self) -> &Vec<String> {
        &self.chemistry
    }

    /// Returns the metric tensor.
    pub fn metric(&self) -> &Matrix3<f64> {
        &self.metric
    }

    /// Returns the comparison threshold.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Returns the space-group operations.
    pub fn group(&self) -> &[GroupOp] {
        &self.group
    }

    /// Converts a lattice translation plus a fractional offset into a Cartesian position.
    pub fn unit2cart(&self, r: &Vector3<i32>, u: &Vector3<f64>) -> Vector3<f64> {
        self.lattice * (r.cast::<f64>() + u)
    }

    /// Returns the Cartesian position of a basis site in the cell at lattice translation `r`.
    pub fn site_position(
        &self,
        chem: usize,
        site: usize,
        r: &Vector3<i32>,
    ) -> Result<Vector3<f64>, anyhow::Error> {
        let u = self
            .basis
            .get(chem)
            .and_then(|sites| sites.get(site))
            .ok_or_else(|| format_err!("Basis site ({chem}, {site}) does not exist."))?;
        Ok(self.unit2cart(r, u))
    }

    /// Applies a group operation to a site in the cell at lattice translation `r`.
    ///
    /// # Arguments
    ///
    /// * `g` - The group operation.
    /// * `r` - The lattice translation of the site.
    /// * `ci` - The chemistry and site indices.
    ///
    /// # Returns
    ///
    /// The new lattice translation together with the chemistry and new site indices.
    pub fn g_pos(
        &self,
        g: &GroupOp,
        r: &Vector3<i32>,
        ci: (usize, usize),
    ) -> Result<(Vector3<i32>, (usize, usize)), anyhow::Error> {
        let (chem, site) = ci;
        let site_new = *g
            .indexmap
            .get(chem)
            .and_then(|images| images.get(site))
            .ok_or_else(|| format_err!("Basis site ({chem}, {site}) does not exist."))?;
        let r_new = g.rot * r + g.shifts[chem][site];
        Ok((r_new, (chem, site_new)))
    }

    /// Applies the rotational part of a group operation to a Cartesian direction.
    pub fn g_direc(&self, g: &GroupOp, vec: &Vector3<f64>) -> Vector3<f64> {
        g.cartrot * vec
    }

    /// Groups the sites of a chemistry into Wyckoff sets, *i.e.* orbits of sites under the space
    /// group.
    ///
    /// # Arguments
    ///
    /// * `chem` - The chemistry index.
    ///
    /// # Returns
    ///
    /// The Wyckoff sets, ordered by their lowest site index.
    pub fn sitelist(&self, chem: usize) -> Result<Vec<Vec<usize>>, anyhow::Error> {
        let nsites = self
            .basis
            .get(chem)
            .ok_or_else(|| format_err!("Chemistry `{chem}` does not exist."))?
            .len();
        let mut assigned = vec![false; nsites];
        let mut wyckoff_sets = vec![];
        for site in 0..nsites {
            if assigned[site] {
                continue;
            }
            let orbit = self
                .group
                .iter()
                .map(|g| g.indexmap[chem][site])
                .unique()
                .sorted()
                .collect_vec();
            orbit.iter().for_each(|&i| assigned[i] = true);
            wyckoff_sets.push(orbit);
        }
        Ok(wyckoff_sets)
    }

    /// Finds every space-group operation of the decorated lattice.
    ///
    /// Candidate rotations are the integer matrices with entries in $`\{-1, 0, 1\}`$ that
    /// preserve the metric. For each, candidate translations map the first site of the smallest
    /// chemistry onto each site of the same chemistry and are kept only if every site of every
    /// chemistry is mapped onto a site of its own chemistry.
    fn generate_group(&self) -> Result<Vec<GroupOp>, anyhow::Error> {
        let thresh = self.threshold;
        let metric_scale = self.metric.amax();
        let rotations = (0..9)
            .map(|_| -1..=1)
            .multi_cartesian_product()
            .map(|entries| Matrix3::<i32>::from_row_slice(&entries))
            .filter(|rot| {
                let det = rot.cast::<f64>().determinant();
                if !approx::relative_eq!(det.abs(), 1.0, epsilon = thresh) {
                    return false;
                }
                let rotf = rot.cast::<f64>();
                approx::relative_eq!(
                    rotf.transpose() * self.metric * rotf,
                    self.metric,
                    epsilon = thresh * metric_scale,
                    max_relative = thresh
                )
            })
            .collect_vec();
        log::debug!("Found {} lattice point operations.", rotations.len());

        let (ref_chem, ref_sites) = self
            .basis
            .iter()
            .enumerate()
            .min_by_key(|(_, sites)| sites.len())
            .ok_or_else(|| format_err!("The crystal has no chemistries."))?;
        let u0 = ref_sites[0];

        let mut group = vec![];
        for rot in rotations.iter() {
            let rotf = rot.cast::<f64>();
            for uj in ref_sites.iter() {
                let trans = wrap_fractional(&(uj - rotf * u0), thresh);
                if let Some((indexmap, shifts)) = self.map_sites(&rotf, &trans) {
                    let cartrot = self.lattice * rotf * self.invlattice;
                    group.push(GroupOp {
                        rot: *rot,
                        trans,
                        cartrot,
                        indexmap,
                        shifts,
                    });
                }
            }
        }
        log::debug!(
            "Reference chemistry `{}` yields {} space-group operations.",
            self.chemistry[ref_chem],
            group.len()
        );
        group.sort_by_key(|g| !g.is_identity(thresh));
        if group.first().map(|g| g.is_identity(thresh)) != Some(true) {
            bail!("The identity operation is missing from the space group.");
        }
        Ok(group)
    }

    /// Computes the site permutation and lattice shifts induced by a candidate operation, if the
    /// candidate is a symmetry of the decorated lattice.
    fn map_sites(
        &self,
        rotf: &Matrix3<f64>,
        trans: &Vector3<f64>,
    ) -> Option<(Vec<Vec<usize>>, Vec<Vec<Vector3<i32>>>)> {
        let mut indexmap = Vec::with_capacity(self.basis.len());
        let mut shifts = Vec::with_capacity(self.basis.len());
        for sites in self.basis.iter() {
            let mut chem_map = Vec::with_capacity(sites.len());
            let mut chem_shifts = Vec::with_capacity(sites.len());
            for u in sites.iter() {
                let image = rotf * u + trans;
                let (k, shift) = sites.iter().enumerate().find_map(|(k, uk)| {
                    lattice_shift(&image, uk, self.threshold).map(|shift| (k, shift))
                })?;
                chem_map.push(k);
                chem_shifts.push(shift);
            }
            indexmap.push(chem_map);
            shifts.push(chem_shifts);
        }
        Some((indexmap, shifts))
    }
}

impl fmt::Display for Crystal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Lattice vectors (columns):")?;
        for row in self.lattice.row_iter() {
            writeln!(
                f,
                "  {}",
                row.iter().map(|x| format!("{x:+.6}")).join("  ")
            )?;
        }
        writeln!(f, "Basis (fractional):")?;
        for (name, sites) in self.chemistry.iter().zip(self.basis.iter()) {
            for (i, u) in sites.iter().enumerate() {
                writeln!(
                    f,
                    "  {name:>6} #{i:<3} ({})",
                    u.iter().map(|x| format!("{x:.6}")).join(", ")
                )?;
            }
        }
        writeln!(f, "Space-group order: {}", self.group.len())?;
        Ok(())
    }
}

// =========
// Functions
// =========

/// Wraps a fractional position into $`[0, 1)^3`$, snapping components within `thresh` of one
/// onto zero.
fn wrap_fractional(u: &Vector3<f64>, thresh: f64) -> Vector3<f64> {
    u.map(|x| {
        let w = x - x.floor();
        if (1.0 - w).abs() < thresh || w.abs() < thresh {
            0.0
        } else {
            w
        }
    })
}

/// Returns the integer lattice vector $`\mathbf{n}`$ with $`\mathbf{u}_1 = \mathbf{u}_2 +
/// \mathbf{n}`$, if one exists within `thresh`.
fn lattice_shift(u1: &Vector3<f64>, u2: &Vector3<f64>, thresh: f64) -> Option<Vector3<i32>> {
    let diff = u1 - u2;
    let rounded = diff.map(|x| x.round());
    if (diff - rounded).amax() < thresh {
        Some(Vector3::new(
            rounded[0].to_i32()?,
            rounded[1].to_i32()?,
            rounded[2].to_i32()?,
        ))
    } else {
        None
    }
}
