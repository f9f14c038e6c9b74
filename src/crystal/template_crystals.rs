//! A handful of common crystals for tests and quick experiments.

use anyhow;
use nalgebra::{Matrix3, Vector3};

use crate::crystal::Crystal;

const TEMPLATE_THRESHOLD: f64 = 1.0e-8;

/// Returns a simple cubic crystal with one site per cell.
pub fn simple_cubic(a: f64) -> Result<Crystal, anyhow::Error> {
    Crystal::new(
        Matrix3::identity() * a,
        vec![vec![Vector3::zeros()]],
        vec!["A".to_string()],
        TEMPLATE_THRESHOLD,
    )
}

/// Returns a simple tetragonal crystal with one site per cell.
pub fn tetragonal(a: f64, c: f64) -> Result<Crystal, anyhow::Error> {
    Crystal::new(
        Matrix3::from_diagonal(&Vector3::new(a, a, c)),
        vec![vec![Vector3::zeros()]],
        vec!["A".to_string()],
        TEMPLATE_THRESHOLD,
    )
}

/// Returns a face-centred cubic crystal in its primitive setting.
pub fn fcc(a: f64) -> Result<Crystal, anyhow::Error> {
    Crystal::new(
        Matrix3::new(0.0, 0.5, 0.5, 0.5, 0.0, 0.5, 0.5, 0.5, 0.0) * a,
        vec![vec![Vector3::zeros()]],
        vec!["A".to_string()],
        TEMPLATE_THRESHOLD,
    )
}

/// Returns a diamond crystal in its primitive setting.
pub fn diamond(a: f64) -> Result<Crystal, anyhow::Error> {
    Crystal::new(
        Matrix3::new(0.0, 0.5, 0.5, 0.5, 0.0, 0.5, 0.5, 0.5, 0.0) * a,
        vec![vec![Vector3::zeros(), Vector3::new(0.25, 0.25, 0.25)]],
        vec!["Si".to_string()],
        TEMPLATE_THRESHOLD,
    )
}

/// Returns a tetragonal crystal with two sublattices: a body-centred `B` sublattice inside a
/// primitive `A` framework.
pub fn tetragonal_two_sublattices(a: f64, c: f64) -> Result<Crystal, anyhow::Error> {
    Crystal::new(
        Matrix3::from_diagonal(&Vector3::new(a, a, c)),
        vec![vec![Vector3::zeros()], vec![Vector3::new(0.5, 0.5, 0.5)]],
        vec!["A".to_string(), "B".to_string()],
        TEMPLATE_THRESHOLD,
    )
}

/// Returns a tetragonal crystal whose single chemistry splits into two Wyckoff sets: one site at
/// the cell origin and a pair of sites at $`\pm c/4`$ along the fourfold axis.
pub fn tetragonal_split_sites(a: f64, c: f64) -> Result<Crystal, anyhow::Error> {
    Crystal::new(
        Matrix3::from_diagonal(&Vector3::new(a, a, c)),
        vec![vec![
            Vector3::zeros(),
            Vector3::new(0.0, 0.0, 0.25),
            Vector3::new(0.0, 0.0, 0.75),
        ]],
        vec!["A".to_string()],
        TEMPLATE_THRESHOLD,
    )
}
