//! # dbnet: symmetry-reduced jump networks for dumbbell-mediated diffusion
//!
//! `dbnet` enumerates the states and jumps of split (dumbbell) interstitials in a crystal, both
//! on their own and paired with a substitutional solute, and reduces them by the space group of
//! the crystal:
//! - pure and mixed dumbbell orientations are listed per site
//!   ([`states::PureDumbbellStates`], [`states::MixedDumbbellStates`]),
//! - jumps are grouped into symmetry orbits with collision screening
//!   ([`jumpnet`], [`collision`]),
//! - solute-dumbbell complexes are grown shell by shell and grouped into stars ([`stars`]),
//! - biases and rates are expanded on the vector-star basis ([`vector_stars`]).
//!
//! The [`drivers::jump_network::JumpNetworkDriver`] runs the whole pipeline, and the `dbnet`
//! binary runs it from a YAML configuration file (see [`interfaces::input::Input`]).
//!
//! ## Units and conventions
//!
//! Lattice vectors are the columns of the lattice matrix and basis sites are given in fractional
//! coordinates. Orientations and distances are Cartesian, in the length unit of the lattice.
//!
//! ## Logging
//!
//! Diagnostics go through the [`log`](https://docs.rs/log) facade. Human-readable reports are
//! logged at the `info` level to the `dbnet-output` target, which the binary routes to the
//! terminal and optionally to a file.

pub mod auxiliary;
pub mod collision;
pub mod crystal;
pub mod drivers;
pub mod interfaces;
pub mod io;
pub mod jumpnet;
pub mod representations;
pub mod stars;
pub mod states;
pub mod vector_stars;
