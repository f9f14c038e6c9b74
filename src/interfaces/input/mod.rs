use std::path::PathBuf;

use anyhow::{self, format_err};
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::crystal::Crystal;
use crate::drivers::jump_network::JumpNetworkDriver;
use crate::drivers::DbnetDriver;
use crate::interfaces::InputHandle;
use crate::jumpnet::JumpNetworkParams;
use crate::states::OrientationFamily;


fn default_threshold() -> f64 {
    1.0e-8
}

fn default_nshells() -> usize {
    1
}

/// A crystal specification which can be serialised into and deserialised from a YAML input file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CrystalInput {
    /// The three lattice vectors in Cartesian coordinates, one per entry.
    pub lattice: [[f64; 3]; 3],

    /// For each chemistry, the fractional coordinates of its basis sites.
    pub basis: Vec<Vec<[f64; 3]>>,

    /// The names of the chemistries, parallel to [`Self::basis`].
    pub chemistry: Vec<String>,

    /// A threshold for approximate equality comparisons.
    ///
    /// # Default
    ///
    /// If not specified, this will be taken to be `1e-8`.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

impl CrystalInput {
    /// Builds the crystal described by this input.
    pub fn to_crystal(&self) -> Result<Crystal, anyhow::Error> {
        let lattice = Matrix3::from_columns(&self.lattice.map(Vector3::from));
        let basis = self
            .basis
            .iter()
            .map(|sites| sites.iter().map(|&u| Vector3::from(u)).collect::<Vec<_>>())
            .collect::<Vec<_>>();
        Crystal::new(lattice, basis, self.chemistry.clone(), self.threshold)
    }
}

impl Default for CrystalInput {
    fn default() -> Self {
        CrystalInput {
            lattice: [[0.28, 0.0, 0.0], [0.0, 0.28, 0.0], [0.0, 0.0, 0.28]],
            basis: vec![vec![[0.0, 0.0, 0.0]]],
            chemistry: vec!["A".to_string()],
            threshold: default_threshold(),
        }
    }
}

/// A structure containing `dbnet` input parameters which can be serialised into and deserialised
/// from a YAML input file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Input {
    /// The crystal hosting the dumbbells.
    pub crystal: CrystalInput,

    /// The sublattice hosting the dumbbells.
    ///
    /// # Default
    ///
    /// If not specified, this will be taken to be `0`.
    #[serde(default)]
    pub chem: usize,

    /// Seed orientations of pure dumbbells, one list per Wyckoff set of [`Self::chem`].
    pub pure_family: OrientationFamily,

    /// Seed orientations of mixed dumbbells.
    ///
    /// # Default
    ///
    /// If not specified, [`Self::pure_family`] is used.
    #[serde(default)]
    pub mixed_family: Option<OrientationFamily>,

    /// Control parameters for the bare-dumbbell and mixed-dumbbell networks.
    pub jump_network: JumpNetworkParams,

    /// Control parameters for the networks joining mixed dumbbells and complexes.
    ///
    /// # Default
    ///
    /// If not specified, [`Self::jump_network`] is used.
    #[serde(default)]
    pub omega34: Option<JumpNetworkParams>,

    /// The number of shells of complexes around the solute.
    ///
    /// # Default
    ///
    /// If not specified, this will be taken to be `1`.
    #[serde(default = "default_nshells")]
    pub nshells: usize,

    /// The name of a YAML file, without extension, to which the expansions are saved.
    ///
    /// # Default
    ///
    /// If not specified, nothing is saved.
    #[serde(default)]
    pub result_save_name: Option<PathBuf>,
}

impl Default for Input {
    fn default() -> Self {
        Input {
            crystal: CrystalInput::default(),
            chem: 0,
            pure_family: OrientationFamily::default(),
            mixed_family: None,
            jump_network: JumpNetworkParams {
                cutoff: 0.3,
                solv_solv_cut: 0.01,
                solt_solv_cut: 0.01,
                closest_distance: Default::default(),
            },
            omega34: None,
            nshells: default_nshells(),
            result_save_name: None,
        }
    }
}

impl InputHandle for Input {
    /// Builds the crystal and runs the jump-network driver.
    fn handle(&self) -> Result<(), anyhow::Error> {
        let crys = self.crystal.to_crystal()?;
        let mut driver = JumpNetworkDriver::builder()
            .parameters(&self.jump_network)
            .omega34_parameters(self.omega34.as_ref())
            .nshells(self.nshells)
            .crystal(&crys)
            .chem(self.chem)
            .pure_family(&self.pure_family)
            .mixed_family(self.mixed_family.as_ref())
            .result_save_name(self.result_save_name.clone())
            .build()
            .map_err(|_| format_err!("Cannot construct a jump-network driver."))?;
        driver.run()
    }
}
