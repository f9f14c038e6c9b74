//! Drivers to carry out dbnet functionalities.

use anyhow;

pub mod jump_network;

// =================
// Trait definitions
// =================

/// Trait defining behaviours of `dbnet` drivers.
pub trait DbnetDriver {
    /// The type of the parameter structure controlling the driver.
    type Params;

    /// The type of the successful outcome when executing the driver.
    type Outcome;

    /// Executes the driver and stores the result internally.
    fn run(&mut self) -> Result<(), anyhow::Error>;

    /// Returns the result of the driver execution.
    fn result(&self) -> Result<&Self::Outcome, anyhow::Error>;
}
