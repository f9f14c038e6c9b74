use std::fmt;
use std::path::PathBuf;

use anyhow::{self, format_err};
use derive_builder::Builder;
use log;
use ndarray::Array3;
use serde::Serialize;

use crate::crystal::Crystal;
use crate::drivers::DbnetDriver;
use crate::io::format::{
    dbnet_output, dbnet_warn, log_subtitle, log_title, write_subtitle, ReportSection,
};
use crate::io::write_dbnet_yaml;
use crate::jumpnet::{IndexedJumpNetwork, JumpNetwork, JumpNetworkParams};
use crate::representations::SdPair;
use crate::stars::{Omega34Networks, StarSet};
use crate::states::{MixedDumbbellStates, OrientationFamily, PureDumbbellStates};
use crate::vector_stars::{BiasExpansions, RateExpansions, VectorStars};

#[cfg(test)]
#[path = "jump_network_tests.rs"]
mod jump_network_tests;

// ==================
// Struct definitions
// ==================

// ------
// Result
// ------

/// A structure to contain the jump networks of a solute-dumbbell system and their expansions on
/// the vector-star basis.
#[derive(Clone, Builder, Debug)]
pub struct JumpNetworkResult<'a> {
    /// The star set, which also owns the bare-dumbbell and mixed-dumbbell networks.
    pub starset: StarSet<'a>,

    /// The complex-to-complex network and its indexed form.
    pub omega1: (JumpNetwork<SdPair>, IndexedJumpNetwork),

    /// The bare-dumbbell orbit underlying every orbit of [`Self::omega1`].
    pub jumptype: Vec<usize>,

    /// The networks joining mixed dumbbells and complexes.
    pub omega34: Omega34Networks,

    /// The total number of vector stars.
    pub nvstars: usize,

    /// The number of vector stars built on complexes.
    pub nvstars_pure: usize,

    /// The bias expansions.
    pub biases: BiasExpansions,

    /// The rate expansions.
    pub rates: RateExpansions,

    /// The bare diffusivity expansions, by bare-dumbbell orbit and by ω1 orbit.
    pub bare: (Array3<f64>, Array3<f64>),
}

impl<'a> JumpNetworkResult<'a> {
    /// Returns a builder to construct a [`JumpNetworkResult`] structure.
    fn builder() -> JumpNetworkResultBuilder<'a> {
        JumpNetworkResultBuilder::default()
    }

    /// Writes the number and sizes of the orbits of every network.
    fn write_network_summary(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summarise = |sizes: Vec<usize>| {
            let total = sizes.iter().sum::<usize>();
            let sizes = sizes.iter().map(|n| n.to_string()).collect::<Vec<_>>().join(", ");
            (total, sizes)
        };
        let rows: [(&str, Vec<usize>); 5] = [
            ("ω0", self.starset.jnet0().0.iter().map(|o| o.len()).collect()),
            ("ω1", self.omega1.0.iter().map(|o| o.len()).collect()),
            ("ω2", self.starset.jnet2().0.iter().map(|o| o.len()).collect()),
            ("ω3", self.omega34.omega3.0.iter().map(|o| o.len()).collect()),
            ("ω4", self.omega34.omega4.0.iter().map(|o| o.len()).collect()),
        ];
        writeln!(f, "{:>7}  {:>6}  {:>6}  Orbit sizes", "Network", "Orbits", "Jumps")?;
        for (name, sizes) in rows {
            let norbits = sizes.len();
            let (total, sizes) = summarise(sizes);
            writeln!(f, "{name:>7}  {norbits:>6}  {total:>6}  {sizes}")?;
        }
        Ok(())
    }
}

impl<'a> fmt::Display for JumpNetworkResult<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.starset)?;
        writeln!(f)?;
        write_subtitle(f, "Jump networks")?;
        self.write_network_summary(f)?;
        writeln!(f)?;
        write_subtitle(f, "Expansions")?;
        writeln!(
            f,
            "Vector stars: {} ({} on complexes, {} on mixed dumbbells)",
            self.nvstars,
            self.nvstars_pure,
            self.nvstars - self.nvstars_pure
        )?;
        writeln!(
            f,
            "Bias expansions (ω0, ω1, ω2, ω3, ω4): {:?}, {:?}, {:?}, {:?}, {:?}",
            self.biases.bias0.solvent.dim(),
            self.biases.bias1.solvent.dim(),
            self.biases.bias2.solvent.dim(),
            self.biases.bias3.solvent.dim(),
            self.biases.bias4.solvent.dim(),
        )?;
        writeln!(
            f,
            "Rate expansions (ω0, ω1, ω2, ω3, ω4): {:?}, {:?}, {:?}, {:?}, {:?}",
            self.rates.rate0.dim(),
            self.rates.rate1.dim(),
            self.rates.rate2.dim(),
            self.rates.rate3.dim(),
            self.rates.rate4.dim(),
        )?;
        writeln!(
            f,
            "Bare expansions (ω0, ω1): {:?}, {:?}",
            self.bare.0.dim(),
            self.bare.1.dim()
        )?;
        Ok(())
    }
}

/// The expansions of a [`JumpNetworkResult`] in the form written to disk.
#[derive(Serialize)]
struct SavedExpansions<'r> {
    nvstars: usize,
    nvstars_pure: usize,
    jumptype: &'r [usize],
    biases: &'r BiasExpansions,
    rates: &'r RateExpansions,
    bare0: &'r Array3<f64>,
    bare1: &'r Array3<f64>,
}

// ------
// Driver
// ------

/// A driver that builds every jump network of a solute-dumbbell system and expands biases and
/// rates on the vector-star basis.
#[derive(Clone, Builder)]
pub struct JumpNetworkDriver<'a> {
    /// The control parameters for the bare-dumbbell and mixed-dumbbell networks.
    parameters: &'a JumpNetworkParams,

    /// The control parameters for the networks joining mixed dumbbells and complexes. If `None`,
    /// [`Self::parameters`] is used.
    #[builder(default = "None")]
    omega34_parameters: Option<&'a JumpNetworkParams>,

    /// The number of shells of complexes around the solute.
    nshells: usize,

    /// The crystal hosting the dumbbells.
    crystal: &'a Crystal,

    /// The sublattice hosting the dumbbells.
    #[builder(default = "0")]
    chem: usize,

    /// Seed orientations of pure dumbbells.
    pure_family: &'a OrientationFamily,

    /// Seed orientations of mixed dumbbells. If `None`, [`Self::pure_family`] is used.
    #[builder(default = "None")]
    mixed_family: Option<&'a OrientationFamily>,

    /// A path to which the expansions are saved as YAML, if given.
    #[builder(default = "None")]
    result_save_name: Option<PathBuf>,

    /// The result of the construction.
    #[builder(setter(skip), default = "None")]
    result: Option<JumpNetworkResult<'a>>,
}

impl<'a> JumpNetworkDriver<'a> {
    /// Returns a builder to construct a [`JumpNetworkDriver`] structure.
    pub fn builder() -> JumpNetworkDriverBuilder<'a> {
        JumpNetworkDriverBuilder::default()
    }

    /// Builds the networks, the star set, and the expansions.
    fn build_networks(&mut self) -> Result<(), anyhow::Error> {
        log_title("Dumbbell Jump Networks");
        log::info!(target: "dbnet-output", "");
        let params = self.parameters;
        let omega34_params = self.omega34_parameters.unwrap_or(params);
        dbnet_output!("Shells of complexes: {}", self.nshells);
        let omega34_source = if self.omega34_parameters.is_some() {
            "separate"
        } else {
            "shared with mixed-dumbbell jumps"
        };
        dbnet_output!("Mixed-dumbbell dissociation cutoffs: {omega34_source}");
        log::info!(target: "dbnet-output", "");
        log_subtitle("Bare and mixed-dumbbell jumps");
        log::info!(target: "dbnet-output", "");
        params.log_report();
        log::info!(target: "dbnet-output", "");
        if self.omega34_parameters.is_some() {
            log_subtitle("Mixed-dumbbell dissociation jumps");
            log::info!(target: "dbnet-output", "");
            omega34_params.log_report();
            log::info!(target: "dbnet-output", "");
        }

        let pdbcontainer =
            PureDumbbellStates::new(self.crystal, self.chem, self.pure_family.clone())?;
        let mdbcontainer = MixedDumbbellStates::new(
            self.crystal,
            self.chem,
            self.mixed_family.unwrap_or(self.pure_family).clone(),
        )?;
        let jnet0 = pdbcontainer.jumpnetwork(params)?;
        let jnet2 = mdbcontainer.jumpnetwork(params)?;
        if jnet0.0.is_empty() {
            dbnet_warn!("No bare-dumbbell jumps survive the cutoffs. Only mixed dumbbells form stars.");
        }
        let starset = StarSet::new(pdbcontainer, mdbcontainer, jnet0, jnet2, self.nshells)?;
        let (omega1, jumptype) = starset.jumpnetwork_omega1()?;
        let omega34 = starset.jumpnetwork_omega34(omega34_params)?;

        let (nvstars, nvstars_pure, biases, rates, bare) = {
            let vstars = VectorStars::new(&starset)?;
            let biases = vstars.biasexpansion(
                &omega1.0,
                &starset.jnet2().0,
                &jumptype,
                &omega34.omega34.0,
            )?;
            let rates = vstars.rateexpansion(
                &omega1.0,
                &starset.jnet2().0,
                &jumptype,
                &omega34.omega34.0,
            )?;
            let bare = vstars.bareexpansion(&omega1.1, &jumptype)?;
            (vstars.nvstars(), vstars.nvstars_pure(), biases, rates, bare)
        };

        self.result = JumpNetworkResult::builder()
            .starset(starset)
            .omega1(omega1)
            .jumptype(jumptype)
            .omega34(omega34)
            .nvstars(nvstars)
            .nvstars_pure(nvstars_pure)
            .biases(biases)
            .rates(rates)
            .bare(bare)
            .build()
            .ok();

        if let Some(res) = self.result.as_ref() {
            res.log_report();
            log::info!(target: "dbnet-output", "");
            if let Some(name) = self.result_save_name.as_ref() {
                let saved = SavedExpansions {
                    nvstars: res.nvstars,
                    nvstars_pure: res.nvstars_pure,
                    jumptype: &res.jumptype,
                    biases: &res.biases,
                    rates: &res.rates,
                    bare0: &res.bare.0,
                    bare1: &res.bare.1,
                };
                write_dbnet_yaml(name, &saved)?;
                log::info!(
                    target: "dbnet-output",
                    "Expansions saved as {}.",
                    name.with_extension("yml").display()
                );
                log::info!(target: "dbnet-output", "");
            }
        }
        Ok(())
    }
}

impl<'a> DbnetDriver for JumpNetworkDriver<'a> {
    type Params = JumpNetworkParams;

    type Outcome = JumpNetworkResult<'a>;

    fn result(&self) -> Result<&Self::Outcome, anyhow::Error> {
        self.result
            .as_ref()
            .ok_or_else(|| format_err!("No jump-network results found."))
    }

    fn run(&mut self) -> Result<(), anyhow::Error> {
        self.build_networks()
    }
}
