//! redtree SIM - reference cycle model
//!
//! Flattens an elaborated design and evaluates it one clock edge at a time.
//! Used to check generated trees against their behavioral model; it is not a
//! waveform or netlist backend.

mod eval;
mod flatten;
pub mod simulator;

pub use flatten::MAX_WIDTH;
pub use simulator::{SimulationError, SimulationResult, Simulator};
